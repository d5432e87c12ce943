//! Error taxonomy for fetching, extraction, and the cache.

use thiserror::Error;

/// A page fetch failed. Nothing is persisted when this is returned.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request itself failed (DNS, connect, timeout, body read).
    #[error("request for {url} failed: {source}")]
    Request {
        /// The URL that was being fetched.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// The URL that was being fetched.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// A cache read or write failed.
#[derive(Debug, Error)]
#[error("selector store {operation} failed: {source}")]
pub struct StoreError {
    pub(crate) operation: &'static str,
    #[source]
    pub(crate) source: sqlx::Error,
}

impl StoreError {
    pub(crate) fn new(operation: &'static str, source: sqlx::Error) -> Self {
        Self { operation, source }
    }
}

/// An extraction cycle failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cache could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The cleaned document contains no selectable elements. Almost always
    /// an ignore-list misconfiguration, so it is an error rather than an
    /// empty success.
    #[error("no selectors found in {url} after removing ignored elements")]
    NoSelectors {
        /// The URL whose page came up empty.
        url: String,
    },
}
