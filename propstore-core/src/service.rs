use std::fmt;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use propstore_model::{
    Listing, ListingImage, ListingKey, ListingTrace, ListingWithDetails,
    ObjectId, Owner, OwnerKey, fields,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::QueryLimits;
use crate::error::{QueryError, Result, StoreError};
use crate::executor::PipelineExecutor;
use crate::metrics::{MetricsSnapshot, QueryMetrics};
use crate::page::{PageRequest, Paged};
use crate::pipeline::{FilterCompiler, ListingFilter, PipelineAssembler};
use crate::store::DocumentStore;

/// Read operations over listings and their related records.
///
/// Stateless between calls: every operation builds its pipelines from the
/// request and the immutable limits, runs them and returns. List operations
/// run the data and count pipelines concurrently; dropping the returned
/// future cancels both.
#[derive(Clone)]
pub struct QueryService {
    executor: PipelineExecutor,
    limits: Arc<QueryLimits>,
    details: PipelineAssembler,
    plain: PipelineAssembler,
}

impl fmt::Debug for QueryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryService")
            .field("executor", &self.executor)
            .field("collection", &self.details.collection())
            .field("query_timeout", &self.limits.query_timeout)
            .finish()
    }
}

impl QueryService {
    /// `limits` are expected to be validated already; see
    /// [`QueryLimits::validate`].
    pub fn new(store: Arc<dyn DocumentStore>, limits: QueryLimits) -> Self {
        Self::with_metrics(store, limits, Arc::new(QueryMetrics::new()))
    }

    pub fn with_metrics(
        store: Arc<dyn DocumentStore>,
        limits: QueryLimits,
        metrics: Arc<QueryMetrics>,
    ) -> Self {
        let details = PipelineAssembler::listing_details(&limits);
        let plain = PipelineAssembler::listings(&limits);
        Self {
            executor: PipelineExecutor::new(store, metrics),
            limits: Arc::new(limits),
            details,
            plain,
        }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.executor.metrics().snapshot()
    }

    /// Validate page coordinates against the configured maximum page size.
    pub fn page_request(&self, page: u32, page_size: u32) -> Result<PageRequest> {
        PageRequest::bounded(page, page_size, self.limits.max_page_size)
    }

    /// First page using the configured default page size.
    pub fn default_page(&self) -> PageRequest {
        PageRequest::first(self.limits.default_page_size)
    }

    pub async fn list_with_details(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Paged<ListingWithDetails>> {
        self.filtered_list_with_details(&ListingFilter::default(), page, page_size)
            .await
    }

    pub async fn filtered_list_with_details(
        &self,
        filter: &ListingFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Paged<ListingWithDetails>> {
        self.paged(&self.details, filter, page, page_size).await
    }

    /// `Ok(None)` for a well-formed identifier that matches nothing.
    pub async fn get_one_with_details(
        &self,
        id: &str,
    ) -> Result<Option<ListingWithDetails>> {
        let id = self.parse_id(id)?;
        self.single(&self.details, id).await
    }

    pub async fn list_listings(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Paged<Listing>> {
        self.filtered_list_listings(&ListingFilter::default(), page, page_size)
            .await
    }

    pub async fn filtered_list_listings(
        &self,
        filter: &ListingFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Paged<Listing>> {
        self.paged(&self.plain, filter, page, page_size).await
    }

    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let id = self.parse_id(id)?;
        self.single(&self.plain, id).await
    }

    pub async fn owner_by_key(&self, key: &OwnerKey) -> Result<Option<Owner>> {
        let pipeline = PipelineAssembler::related_pipeline(
            self.limits.collections.owners.clone(),
            fields::owner::KEY,
            key.as_str(),
            NonZeroU32::MIN,
        );
        self.bounded(self.executor.fetch_single(&pipeline)).await?
    }

    /// Every stored image of a listing, enabled or not, up to the image join
    /// cap.
    pub async fn images_for_listing(
        &self,
        key: &ListingKey,
    ) -> Result<Vec<ListingImage>> {
        self.related(
            &self.limits.collections.images,
            fields::image::LISTING_KEY,
            key.as_str(),
            self.limits.image_join_cap,
        )
        .await
    }

    pub async fn traces_for_listing(
        &self,
        key: &ListingKey,
    ) -> Result<Vec<ListingTrace>> {
        self.related(
            &self.limits.collections.traces,
            fields::trace::LISTING_KEY,
            key.as_str(),
            self.limits.trace_join_cap,
        )
        .await
    }

    async fn paged<T: DeserializeOwned>(
        &self,
        assembler: &PipelineAssembler,
        filter: &ListingFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Paged<T>> {
        let request = self.page_request(page, page_size)?;
        let predicate = FilterCompiler::compile(filter);
        let data = assembler.data_pipeline(&predicate, request);
        let count = PipelineAssembler::count_pipeline(&data);

        // Both runs complete before either error surfaces; data wins.
        let (decoded, tally) = self
            .bounded(async {
                tokio::join!(
                    self.executor.fetch::<T>(&data),
                    self.executor.count(&count)
                )
            })
            .await?;
        let decoded = decoded?;
        let tally = tally?;

        debug!(
            "Page {} of {} ({} per page): {} items, {} total",
            request.page(),
            assembler.collection(),
            request.page_size(),
            decoded.records.len(),
            tally.total
        );

        Ok(Paged {
            items: decoded.records,
            total_count: tally.total,
            page: request.page(),
            page_size: request.page_size(),
            oversize_dropped: tally.oversize_dropped,
            skipped: decoded.failures,
        })
    }

    async fn single<T: DeserializeOwned>(
        &self,
        assembler: &PipelineAssembler,
        id: ObjectId,
    ) -> Result<Option<T>> {
        let pipeline = assembler.single_pipeline(id);
        let found = self.bounded(self.executor.fetch_single(&pipeline)).await??;
        if found.is_none() {
            debug!("No {} record with _id {}", assembler.collection(), id);
        }
        Ok(found)
    }

    async fn related<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
        cap: NonZeroU32,
    ) -> Result<Vec<T>> {
        let pipeline =
            PipelineAssembler::related_pipeline(collection, field, value, cap);
        let decoded = self.bounded(self.executor.fetch::<T>(&pipeline)).await??;
        Ok(decoded.records)
    }

    fn parse_id(&self, raw: &str) -> Result<ObjectId> {
        self.executor.store().parse_id(raw).map_err(|source| {
            QueryError::InvalidIdentifier {
                raw: raw.to_string(),
                source,
            }
        })
    }

    /// Apply the configured per-operation timeout, if any.
    async fn bounded<F: Future>(&self, operation: F) -> Result<F::Output> {
        let Some(limit) = self.limits.query_timeout else {
            return Ok(operation.await);
        };

        tokio::time::timeout(limit, operation).await.map_err(|_| {
            warn!("Query exceeded {:?} and was cancelled", limit);
            self.executor.metrics().record_store_failure();
            QueryError::StoreUnavailable(StoreError::Timeout(limit))
        })
    }
}
