use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeFailure, QueryError, Result};

/// Validated 1-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: NonZeroU32,
    page_size: NonZeroU32,
}

impl PageRequest {
    /// Rejects a zero page or page size.
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        match (NonZeroU32::new(page), NonZeroU32::new(page_size)) {
            (Some(page), Some(page_size)) => Ok(Self { page, page_size }),
            _ => Err(QueryError::InvalidPagination {
                page,
                page_size,
                max_page_size: u32::MAX,
            }),
        }
    }

    /// Like [`PageRequest::new`] but also caps the page size.
    pub fn bounded(
        page: u32,
        page_size: u32,
        max_page_size: NonZeroU32,
    ) -> Result<Self> {
        let invalid = || QueryError::InvalidPagination {
            page,
            page_size,
            max_page_size: max_page_size.get(),
        };

        if page_size > max_page_size.get() {
            return Err(invalid());
        }
        Self::new(page, page_size).map_err(|_| invalid())
    }

    pub fn first(page_size: NonZeroU32) -> Self {
        Self {
            page: NonZeroU32::MIN,
            page_size,
        }
    }

    pub fn page(&self) -> u32 {
        self.page.get()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    /// Records preceding this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.page_size.get())
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size.get())
    }
}

/// One page of results together with the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Matching records before pagination.
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    /// Composed documents excluded by the size guard across the filtered set.
    #[serde(default)]
    pub oversize_dropped: u64,
    /// Records on this page that could not be decoded.
    #[serde(skip)]
    pub skipped: Vec<DecodeFailure>,
}

impl<T> Paged<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            oversize_dropped: self.oversize_dropped,
            skipped: self.skipped,
        }
    }
}

/// Typed records of one data run.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub failures: Vec<DecodeFailure>,
    pub oversize_dropped: u64,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
            oversize_dropped: 0,
        }
    }
}

/// Result of one count run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: u64,
    pub oversize_dropped: u64,
}
