use std::fmt;
use std::sync::Arc;

use propstore_model::fields;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DecodeFailure, QueryError, Result};
use crate::metrics::QueryMetrics;
use crate::page::{Decoded, Tally};
use crate::pipeline::{COUNT_FIELD, Pipeline};
use crate::store::{AggregateBatch, DocumentStore};

/// Runs pipelines against a [`DocumentStore`] and maps the raw documents.
#[derive(Clone)]
pub struct PipelineExecutor {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<QueryMetrics>,
}

impl fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("store", &std::any::type_name_of_val(self.store.as_ref()))
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl PipelineExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Arc<QueryMetrics>) -> Self {
        Self { store, metrics }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    /// Decode every returned document into `T`. Documents that fail to
    /// decode are skipped and reported in [`Decoded::failures`].
    ///
    /// Oversize drops are returned but not recorded; a paged run is always
    /// paired with a count run over the same stages, which records them.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        pipeline: &Pipeline,
    ) -> Result<Decoded<T>> {
        let batch = self.aggregate(pipeline).await?;
        self.metrics.record_data_run();

        let oversize_dropped = batch.oversize_dropped.unwrap_or(0);
        let mut decoded = Decoded {
            records: Vec::with_capacity(batch.documents.len()),
            failures: Vec::new(),
            oversize_dropped,
        };

        for document in batch.documents {
            match decode::<T>(document) {
                Ok(record) => decoded.records.push(record),
                Err(failure) => {
                    warn!(
                        "Skipping undecodable document from {}: {}",
                        pipeline.collection(),
                        failure
                    );
                    decoded.failures.push(failure);
                }
            }
        }

        self.metrics
            .record_decode_failures(decoded.failures.len() as u64);
        Ok(decoded)
    }

    /// Single-record run: `Ok(None)` when nothing matched, and a decode
    /// failure is an error rather than a skip.
    pub async fn fetch_single<T: DeserializeOwned>(
        &self,
        pipeline: &Pipeline,
    ) -> Result<Option<T>> {
        let batch = self.aggregate(pipeline).await?;
        self.metrics.record_data_run();
        self.note_oversize(pipeline, batch.oversize_dropped);

        let Some(document) = batch.documents.into_iter().next() else {
            return Ok(None);
        };

        match decode::<T>(document) {
            Ok(record) => Ok(Some(record)),
            Err(failure) => {
                self.metrics.record_decode_failures(1);
                warn!(
                    "Undecodable document from {}: {}",
                    pipeline.collection(),
                    failure
                );
                Err(QueryError::Decode(failure))
            }
        }
    }

    /// Read the scalar produced by a count pipeline. No count document means
    /// nothing matched.
    pub async fn count(&self, pipeline: &Pipeline) -> Result<Tally> {
        let batch = self.aggregate(pipeline).await?;
        self.metrics.record_count_run();
        self.note_oversize(pipeline, batch.oversize_dropped);

        let output = pipeline
            .count_stage()
            .map_or(COUNT_FIELD, |stage| stage.output);

        let total = match batch.documents.first() {
            None => 0,
            Some(document) => document
                .get(output)
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    QueryError::Internal(format!(
                        "count document from {} has no integer `{output}`",
                        pipeline.collection()
                    ))
                })?,
        };

        Ok(Tally {
            total,
            oversize_dropped: batch.oversize_dropped.unwrap_or(0),
        })
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<AggregateBatch> {
        debug!(
            "Aggregating {} with {} stages: {}",
            pipeline.collection(),
            pipeline.len(),
            pipeline.to_native_string()
        );

        self.store.aggregate(pipeline).await.map_err(|err| {
            self.metrics.record_store_failure();
            warn!("Aggregation on {} failed: {}", pipeline.collection(), err);
            QueryError::from(err)
        })
    }

    fn note_oversize(&self, pipeline: &Pipeline, dropped: Option<u64>) {
        let Some(dropped) = dropped.filter(|n| *n > 0) else {
            return;
        };
        self.metrics.record_oversize_dropped(dropped);
        warn!(
            "Size guard on {} dropped {} composed document(s)",
            pipeline.collection(),
            dropped
        );
    }
}

fn decode<T: DeserializeOwned>(
    document: Value,
) -> std::result::Result<T, DecodeFailure> {
    let record_id = record_id_of(&document);
    serde_json::from_value(document).map_err(|err| DecodeFailure {
        record_id,
        reason: err.to_string(),
    })
}

fn record_id_of(document: &Value) -> Option<String> {
    match document.get(fields::ID)? {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => map.get("$oid")?.as_str().map(str::to_string),
        other => Some(other.to_string()),
    }
}
