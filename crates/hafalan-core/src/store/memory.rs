//! In-process store for tests and dry runs.

use std::sync::{Arc, Mutex};

use super::{StoreSnapshot, StudentStore};
use crate::error::{HafalanError, Result};

/// Snapshot held in memory. Clones share the same backing table, so two
/// clones behave like two handles on one file.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Option<StoreSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(snapshot))),
        }
    }
}

impl StudentStore for MemoryStore {
    fn load(&self) -> Result<StoreSnapshot> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| HafalanError::Storage("memory store poisoned".to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| HafalanError::Storage("memory store poisoned".to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.inner.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
