use thiserror::Error;

/// Errors raised by the spider.
///
/// Only the listing-page variants are fatal to a run; everything raised while extracting a single
/// filing is caught at the filing boundary and logged as a skip.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no table found on listing page {0}")]
    MissingListingTable(String),

    #[error("no aggregated holdings table found in {0}")]
    MissingHoldingsTable(String),

    #[error("no data-url found in table at {0}")]
    MissingDataUrl(String),

    #[error("malformed dataset from {url}: {source}")]
    MalformedDataset {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed series file: {0}")]
    MalformedSeries(String),

    #[error("invalid watchlist: {0}")]
    Watchlist(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a failed GET request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Transient failures (timeouts, connection resets, 429 and 5xx) are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            FetchError::Transport { .. } => true,
        }
    }
}
