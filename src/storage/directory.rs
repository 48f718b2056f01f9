//! SQLite directory of departments, services and roles
//!
//! The directory sits in `.permit/directory.db`. Departments are stored flat
//! (`id`, `name`, `parent_id`) with an explicit position so sibling order
//! survives round trips; the nested [`Forest`] is built on load.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{Department, Forest, IdError, Role, Service};

/// SQLite-backed directory store
pub struct DirectoryStore {
    /// Path to the SQLite database
    db_path: PathBuf,

    /// Database connection
    conn: Connection,
}

/// Parses an ID column, surfacing bad values as conversion errors
fn parse_id<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = IdError>,
{
    value
        .parse()
        .map_err(|e: IdError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl DirectoryStore {
    /// Schema version - bump when schema changes to force rebuild
    const SCHEMA_VERSION: i32 = 1;

    /// Creates or opens the directory for a project
    pub fn open(project_root: &Path) -> Result<Self> {
        let permit_dir = project_root.join(".permit");
        fs::create_dir_all(&permit_dir).with_context(|| {
            format!("Failed to create directory: {}", permit_dir.display())
        })?;

        Self::open_at(permit_dir.join("directory.db"))
    }

    /// Opens a directory database at an explicit path
    pub fn open_at(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open directory database: {}", db_path.display()))?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let mut store = Self { db_path, conn };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Returns the database path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<()> {
        if self.get_schema_version()? != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }
        Ok(())
    }

    /// Gets the current schema version
    fn get_schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    /// Creates the schema from scratch
    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS departments;
            DROP TABLE IF EXISTS services;
            DROP TABLE IF EXISTS roles;

            CREATE TABLE departments (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                position INTEGER NOT NULL
            );

            CREATE TABLE services (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE roles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE INDEX idx_departments_parent ON departments(parent_id);
            CREATE INDEX idx_departments_position ON departments(position);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Replaces every department in one transaction, keeping slice order
    pub fn replace_departments(&mut self, departments: &[Department]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM departments", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO departments (id, name, parent_id, position) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, dept) in departments.iter().enumerate() {
                stmt.execute(params![
                    dept.id.as_str(),
                    dept.name,
                    dept.parent_id.as_ref().map(|p| p.as_str()),
                    position as i64,
                ])
                .with_context(|| format!("Failed to insert department {}", dept.id))?;
            }
        }

        tx.commit()?;
        Ok(departments.len())
    }

    /// Appends a department after all existing ones
    pub fn insert_department(&self, dept: &Department) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO departments (id, name, parent_id, position)
                 VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(position), -1) + 1 FROM departments))",
                params![
                    dept.id.as_str(),
                    dept.name,
                    dept.parent_id.as_ref().map(|p| p.as_str()),
                ],
            )
            .with_context(|| format!("Failed to insert department {}", dept.id))?;
        Ok(())
    }

    /// Lists departments in stored order
    pub fn list_departments(&self) -> Result<Vec<Department>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, parent_id FROM departments ORDER BY position, rowid")?;

        let departments = stmt
            .query_map([], |row| {
                let parent: Option<String> = row.get(2)?;
                Ok(Department {
                    id: parse_id(0, row.get(0)?)?,
                    name: row.get(1)?,
                    parent_id: parent.map(|p| parse_id(2, p)).transpose()?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(departments)
    }

    /// Loads the department hierarchy
    pub fn load_forest(&self) -> Result<Forest> {
        let records = self.list_departments()?;
        Forest::from_records(&records).context("Department hierarchy in directory is malformed")
    }

    /// Finds a service by name
    pub fn service_by_name(&self, name: &str) -> Result<Option<Service>> {
        let service = self
            .conn
            .query_row(
                "SELECT id, name, description FROM services WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Service {
                        id: parse_id(0, row.get(0)?)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(service)
    }

    /// Inserts a service unless one with the same name exists.
    ///
    /// Returns the stored service and whether it was created.
    pub fn upsert_service(&self, name: &str, description: &str) -> Result<(Service, bool)> {
        if let Some(existing) = self.service_by_name(name)? {
            return Ok((existing, false));
        }

        let service = Service::new(name, description);
        self.conn.execute(
            "INSERT INTO services (id, name, description) VALUES (?1, ?2, ?3)",
            params![service.id.as_str(), service.name, service.description],
        )?;
        Ok((service, true))
    }

    /// Lists services in insertion order
    pub fn list_services(&self) -> Result<Vec<Service>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM services ORDER BY rowid")?;

        let services = stmt
            .query_map([], |row| {
                Ok(Service {
                    id: parse_id(0, row.get(0)?)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(services)
    }

    /// Finds a role by name
    pub fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = self
            .conn
            .query_row(
                "SELECT id, name FROM roles WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Role {
                        id: parse_id(0, row.get(0)?)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(role)
    }

    /// Inserts a role unless one with the same name exists
    pub fn upsert_role(&self, name: &str) -> Result<(Role, bool)> {
        if let Some(existing) = self.role_by_name(name)? {
            return Ok((existing, false));
        }

        let role = Role::new(name);
        self.conn.execute(
            "INSERT INTO roles (id, name) VALUES (?1, ?2)",
            params![role.id.as_str(), role.name],
        )?;
        Ok((role, true))
    }

    /// Lists roles in insertion order
    pub fn list_roles(&self) -> Result<Vec<Role>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM roles ORDER BY rowid")?;

        let roles = stmt
            .query_map([], |row| {
                Ok(Role {
                    id: parse_id(0, row.get(0)?)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(roles)
    }
}
