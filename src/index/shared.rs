use std::sync::Arc;

use parking_lot::RwLock;

use super::{IndexNotBuiltError, VectorIndex};

/// Handle to the currently published index.
///
/// Readers take an `Arc` snapshot and release the lock immediately, so a
/// rebuild that calls [`SharedIndex::replace`] never disturbs a query that is
/// already running.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    current: Arc<RwLock<Option<Arc<VectorIndex>>>>,
}

impl SharedIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn snapshot(&self) -> Result<Arc<VectorIndex>, IndexNotBuiltError> {
        self.current.read().clone().ok_or(IndexNotBuiltError)
    }

    /// Publish a new index, returning the one it replaced
    #[inline]
    pub fn replace(&self, index: VectorIndex) -> Option<Arc<VectorIndex>> {
        self.current.write().replace(Arc::new(index))
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    #[inline]
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
