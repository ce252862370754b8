//! Optional response cache wrapped around [`QueryService`].
//!
//! The query core itself never caches. Entries expire after a fixed TTL and
//! are never refreshed in place; anything that writes to the store is
//! expected to call [`CachedQueryService::invalidate_all`].

use std::time::{Duration, Instant};

use dashmap::DashMap;
use propstore_model::{Listing, ListingWithDetails};
use tracing::debug;

use crate::config::CacheLimits;
use crate::error::Result;
use crate::page::Paged;
use crate::pipeline::ListingFilter;
use crate::service::QueryService;

/// Cache key generation
#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// Key for one page of a listing operation. Filters are normalized
    /// first so `" casa "` and `"casa"` share an entry; every criterion is
    /// spelled out so distinct queries never share a key.
    pub fn listing_page(
        family: &str,
        filter: &ListingFilter,
        page: u32,
        page_size: u32,
    ) -> String {
        let filter = filter.normalized();
        format!(
            "query:{family}:v1:page={page}:size={page_size}:name={:?}:address={:?}:min={:?}:max={:?}",
            filter.name, filter.address, filter.min_price, filter.max_price
        )
    }

    /// Keyed on the identifier exactly as given; anything that does not
    /// parse is rejected by the service and never cached.
    pub fn listing(family: &str, id: &str) -> String {
        format!("query:{family}:v1:id:{id}")
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted: Instant,
}

/// Bounded TTL map of responses.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, Entry<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(limits: &CacheLimits) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: limits.capacity,
            ttl: limits.ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted.elapsed() < self.ttl {
                debug!("Cache HIT for {}", key);
                return Some(entry.value.clone());
            }
        } else {
            debug!("Cache MISS for {}", key);
            return None;
        }

        debug!("Cache EXPIRED for {}", key);
        self.entries
            .remove_if(key, |_, entry| entry.inserted.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: String, value: V) {
        if self.capacity == 0 || self.ttl.is_zero() {
            return;
        }

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key)
        {
            self.evict();
        }

        self.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, then the oldest one if still at capacity.
    fn evict(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted.elapsed() < ttl);
        if self.entries.len() < self.capacity {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// [`QueryService`] with per-operation response caches in front of it.
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachedQueryService {
    inner: QueryService,
    detail_pages: ResponseCache<Paged<ListingWithDetails>>,
    detail_records: ResponseCache<Option<ListingWithDetails>>,
    listing_pages: ResponseCache<Paged<Listing>>,
    listing_records: ResponseCache<Option<Listing>>,
}

impl CachedQueryService {
    pub fn new(inner: QueryService) -> Self {
        let limits = inner.limits().cache.clone();
        Self {
            inner,
            detail_pages: ResponseCache::new(&limits),
            detail_records: ResponseCache::new(&limits),
            listing_pages: ResponseCache::new(&limits),
            listing_records: ResponseCache::new(&limits),
        }
    }

    pub fn inner(&self) -> &QueryService {
        &self.inner
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
        let key = CacheKeys::listing_page("details", filter, page, page_size);
        if let Some(hit) = self.detail_pages.get(&key) {
            return Ok(hit);
        }

        let fresh = self
            .inner
            .filtered_list_with_details(filter, page, page_size)
            .await?;
        self.detail_pages.insert(key, fresh.clone());
        Ok(fresh)
    }

    pub async fn get_one_with_details(
        &self,
        id: &str,
    ) -> Result<Option<ListingWithDetails>> {
        let key = CacheKeys::listing("details", id);
        if let Some(hit) = self.detail_records.get(&key) {
            return Ok(hit);
        }

        let fresh = self.inner.get_one_with_details(id).await?;
        self.detail_records.insert(key, fresh.clone());
        Ok(fresh)
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
        let key = CacheKeys::listing_page("listings", filter, page, page_size);
        if let Some(hit) = self.listing_pages.get(&key) {
            return Ok(hit);
        }

        let fresh = self
            .inner
            .filtered_list_listings(filter, page, page_size)
            .await?;
        self.listing_pages.insert(key, fresh.clone());
        Ok(fresh)
    }

    pub async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        let key = CacheKeys::listing("listings", id);
        if let Some(hit) = self.listing_records.get(&key) {
            return Ok(hit);
        }

        let fresh = self.inner.get_listing(id).await?;
        self.listing_records.insert(key, fresh.clone());
        Ok(fresh)
    }

    pub fn invalidate_all(&self) {
        self.detail_pages.invalidate_all();
        self.detail_records.invalidate_all();
        self.listing_pages.invalidate_all();
        self.listing_records.invalidate_all();
        debug!("Response caches invalidated");
    }
}
