//! Lock-guarded handle for redacting several fields of one turn in parallel

use crate::entity::EntityType;
use crate::state::{PlaceholderAllocator, RedactionMap, RedactionState};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to one [`RedactionState`].
///
/// Every clone allocates from the same numbering. Only allocation takes the
/// lock; matching runs outside it.
#[derive(Debug, Clone, Default)]
pub struct SharedRedactionState {
    inner: Arc<Mutex<RedactionState>>,
}

impl SharedRedactionState {
    pub fn new(state: RedactionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> RedactionMap {
        self.lock().snapshot()
    }

    /// Take the state back once every other handle is gone.
    ///
    /// Returns `self` unchanged if another clone is still alive.
    pub fn try_into_inner(self) -> Result<RedactionState, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RedactionState> {
        // Allocation has no partially-applied states; a poisoned lock is still consistent.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<RedactionState> for SharedRedactionState {
    fn from(state: RedactionState) -> Self {
        Self::new(state)
    }
}

impl PlaceholderAllocator for SharedRedactionState {
    fn allocate_placeholder(&mut self, entity: EntityType, value: &str) -> String {
        self.lock().allocate_placeholder(entity, value)
    }
}
