use std::fmt;
use std::time::Duration;

use propstore_model::ModelError;
use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore)
/// adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unavailable(String),

    #[error("store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("store rejected pipeline: {0}")]
    Rejected(String),
}

/// A matched record that could not be mapped into its typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    /// Store identity of the offending record when it could be read.
    pub record_id: Option<String>,
    pub reason: String,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "record {id}: {}", self.reason),
            None => write!(f, "record without _id: {}", self.reason),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum QueryError {
    #[error("invalid identifier {raw:?}: {source}")]
    InvalidIdentifier {
        raw: String,
        #[source]
        source: ModelError,
    },

    #[error(
        "invalid pagination: page={page}, page_size={page_size} (page >= 1, 1 <= page_size <= {max_page_size})"
    )]
    InvalidPagination {
        page: u32,
        page_size: u32,
        max_page_size: u32,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("store rejected query: {0}")]
    StoreRejected(String),

    #[error("decode error: {0}")]
    Decode(DecodeFailure),

    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// True when the store could not be reached or timed out.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, QueryError::StoreUnavailable(_))
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(reason) => QueryError::StoreRejected(reason),
            other => QueryError::StoreUnavailable(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
