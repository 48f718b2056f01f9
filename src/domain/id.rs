//! Identifiers for departments, services, roles and requests
//!
//! IDs are opaque strings: anything non-empty without whitespace parses.
//! Freshly generated IDs use the format `{prefix}-{7-char-hash}`:
//! - Departments: `d-7f2b4c1`
//! - Services: `s-9d3e5f2`
//! - Roles: `r-1a2b3c4`
//! - Requests: `q-0e9d8c7`
//!
//! Hash is derived from the seed text + creation timestamp, so the same
//! name created at different times produces different IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("ID must not be empty")]
    Empty,

    #[error("ID must not contain whitespace: '{0}'")]
    Whitespace(String),
}

/// Generates a 7-character hash from seed text and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

fn validate(s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.chars().any(char::is_whitespace) {
        return Err(IdError::Whitespace(s.to_string()));
    }
    Ok(())
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Prefix used for generated IDs
            pub const PREFIX: &'static str = $prefix;

            /// Generates a new ID from seed text and timestamp
            pub fn generate(seed: &str, timestamp: DateTime<Utc>) -> Self {
                Self(format!("{}-{}", $prefix, generate_hash(seed, timestamp)))
            }

            /// Returns the ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                validate(s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Department (tree node) ID
    DepartmentId,
    "d"
);

opaque_id!(
    /// Service ID
    ServiceId,
    "s"
);

opaque_id!(
    /// Role ID
    RoleId,
    "r"
);

opaque_id!(
    /// Permission request ID
    RequestId,
    "q"
);
