//! JSONL storage for permission requests
//!
//! Requests are stored in `.permit/requests.jsonl` with one JSON object per line.
//! Uses file locking for concurrent access safety.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{PermissionRequest, RequestId, ServiceId};

/// Store for request data in JSONL format
pub struct RequestStore {
    path: PathBuf,
}

impl RequestStore {
    /// Creates a new request store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".permit").join("requests.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all requests from the store (later lines win)
    pub fn read_all(&self) -> Result<HashMap<RequestId, PermissionRequest>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open request store: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on request store")?;

        let reader = BufReader::new(&file);
        let mut requests = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let request: PermissionRequest = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse request at line {}", line_num + 1))?;

            requests.insert(request.id.clone(), request);
        }

        Ok(requests)
    }

    /// Reads all requests, oldest first
    pub fn read_sorted(&self) -> Result<Vec<PermissionRequest>> {
        let mut requests: Vec<_> = self.read_all()?.into_values().collect();
        requests.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(requests)
    }

    /// Returns the services with a pending request by `requester`
    pub fn pending_service_ids(&self, requester: &str) -> Result<HashSet<ServiceId>> {
        Ok(self
            .read_all()?
            .into_values()
            .filter(|r| r.status.is_pending() && r.requester == requester)
            .map(|r| r.service_id)
            .collect())
    }

    /// Appends a single request
    pub fn append(&self, request: &PermissionRequest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open request store: {}", self.path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire write lock on request store")?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(request).context("Failed to serialize request")?;
        writeln!(writer, "{}", line).context("Failed to write request")?;

        writer.flush().context("Failed to flush request store")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;
    use tempfile::TempDir;

    fn make_request(requester: &str, service: &str) -> PermissionRequest {
        PermissionRequest::new(
            requester,
            service.parse().unwrap(),
            "r-1".parse().unwrap(),
            Some("d-1".parse().unwrap()),
        )
    }

    #[test]
    fn read_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = RequestStore::new(dir.path().join("requests.jsonl"));

        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn append_and_read() {
        let dir = TempDir::new().unwrap();
        let store = RequestStore::new(dir.path().join("requests.jsonl"));

        let first = make_request("alice", "s-1");
        let second = make_request("alice", "s-2");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let loaded = store.read_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(&first.id).unwrap().service_id, first.service_id);
    }

    #[test]
    fn later_lines_win() {
        let dir = TempDir::new().unwrap();
        let store = RequestStore::new(dir.path().join("requests.jsonl"));

        let mut request = make_request("alice", "s-1");
        store.append(&request).unwrap();
        request.status = RequestStatus::Rejected;
        store.append(&request).unwrap();

        let loaded = store.read_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&request.id).unwrap().status, RequestStatus::Rejected);
    }

    #[test]
    fn pending_services_are_per_requester() {
        let dir = TempDir::new().unwrap();
        let store = RequestStore::new(dir.path().join("requests.jsonl"));

        store.append(&make_request("alice", "s-1")).unwrap();
        store.append(&make_request("bob", "s-2")).unwrap();
        let mut decided = make_request("alice", "s-3");
        decided.status = RequestStatus::Approved;
        store.append(&decided).unwrap();

        let pending = store.pending_service_ids("alice").unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(&"s-1".parse::<ServiceId>().unwrap()));
    }

    #[test]
    fn corrupt_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requests.jsonl");
        fs::write(&path, "\n{not json}\n").unwrap();

        let err = RequestStore::new(&path).read_all().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = RequestStore::new(dir.path().join("nested").join("requests.jsonl"));

        store.append(&make_request("alice", "s-1")).unwrap();

        assert!(store.path().exists());
    }
}
