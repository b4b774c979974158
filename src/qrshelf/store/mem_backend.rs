use super::KvBackend;
use crate::error::{QrError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// In-memory key-value backend for testing.
///
/// Clones share the same map, so a test can hand one clone to a store and keep
/// another to inspect or reload from. `Rc` + `RefCell` since every store is owned by
/// a single thread.
#[derive(Clone, Default)]
pub struct MemBackend {
    blobs: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    simulate_write_error: Rc<Cell<bool>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Store raw bytes, bypassing the error switch. Used to seed corrupt or legacy blobs.
    pub fn put_raw(&self, key: &str, bytes: &[u8]) {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.borrow().get(key).cloned()
    }
}

impl KvBackend for MemBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(QrError::Store("Simulated write error".to_string()));
        }
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
