//! localStorage-backed persistence for the report collection.
//!
//! The whole collection lives under one key as a JSON string, so plain
//! localStorage is the right shape here (binary blobs would want
//! IndexedDB instead).

use sitereport_core::{ReportError, StorageBackend};
use web_sys::Storage;

pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn new() -> Result<Self, ReportError> {
        let window = web_sys::window()
            .ok_or_else(|| ReportError::Storage("no window object available".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|_| ReportError::Storage("localStorage unavailable".to_string()))?
            .ok_or_else(|| ReportError::Storage("localStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl StorageBackend for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ReportError> {
        self.storage
            .get_item(key)
            .map_err(|_| ReportError::Storage("localStorage read failed".to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ReportError> {
        // Fails when the quota is exhausted; surfaced to the user, the
        // in-memory collection stays the working copy.
        self.storage
            .set_item(key, value)
            .map_err(|_| ReportError::Storage("localStorage write failed (quota?)".to_string()))
    }
}

// Storage requires a browser; exercised by wasm_tests in app.rs.
