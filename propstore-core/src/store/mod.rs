//! Port to the document store.

use async_trait::async_trait;
use propstore_model::{ModelError, ObjectId};
use serde_json::Value;

use crate::error::StoreResult;
use crate::pipeline::Pipeline;

#[cfg(feature = "memory-store")]
pub mod memory;

#[cfg(feature = "memory-store")]
pub use memory::InMemoryStore;

/// Raw output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBatch {
    pub documents: Vec<Value>,
    /// Documents excluded by a size guard stage, when the store can tell.
    pub oversize_dropped: Option<u64>,
}

impl AggregateBatch {
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents,
            oversize_dropped: None,
        }
    }

    pub fn with_oversize_dropped(mut self, dropped: u64) -> Self {
        self.oversize_dropped = Some(dropped);
        self
    }
}

/// Read-only aggregation access to a document store.
///
/// Implementations run the pipeline against `pipeline.collection()` and
/// return the resulting documents unchanged. Connectivity failures and
/// timeouts are reported as-is; no retries happen at this layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<AggregateBatch>;

    /// Parse a caller-supplied store identity.
    fn parse_id(&self, raw: &str) -> Result<ObjectId, ModelError> {
        ObjectId::parse_str(raw)
    }
}
