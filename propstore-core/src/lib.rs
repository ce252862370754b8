//! PropStore query core.
//!
//! Builds and runs the read pipelines behind listing pages: optional filter
//! criteria compile into a single match stage, listings are joined to their
//! owner, enabled images and sale traces with bounded fan-out, oversized
//! composed documents are dropped by a size guard, and every page is paired
//! with a count pipeline derived from the same stages minus pagination.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use propstore_core::{
//!     config::QueryLimits, pipeline::ListingFilter, service::QueryService,
//!     store::InMemoryStore,
//! };
//!
//! # async fn demo() -> propstore_core::error::Result<()> {
//! let service =
//!     QueryService::new(Arc::new(InMemoryStore::new()), QueryLimits::default());
//!
//! let filter = ListingFilter::new().name("casa");
//! let page = service.filtered_list_with_details(&filter, 1, 10).await?;
//! println!("{} of {}", page.items.len(), page.total_count);
//! # Ok(())
//! # }
//! ```
#![allow(missing_docs)]

pub use propstore_model as model;

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod page;
pub mod pipeline;
pub mod service;
pub mod store;

pub use cache::{CacheKeys, CachedQueryService, ResponseCache};
pub use config::{CacheLimits, CollectionNames, LimitsError, QueryLimits};
pub use error::{DecodeFailure, QueryError, Result, StoreError, StoreResult};
pub use executor::PipelineExecutor;
pub use metrics::{MetricsSnapshot, QueryMetrics};
pub use page::{Decoded, PageRequest, Paged, Tally};
pub use pipeline::{
    FilterCompiler, JoinTopology, ListingFilter, Pipeline, PipelineAssembler,
    Stage, StageFactory,
};
pub use service::QueryService;
pub use store::{AggregateBatch, DocumentStore};

#[cfg(feature = "memory-store")]
pub use store::InMemoryStore;
