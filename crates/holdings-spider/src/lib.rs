pub mod analysis;
pub mod error;
pub mod fetch;
pub mod fs;
pub mod series;
pub mod thirteenf;
pub mod watchlist;

pub(crate) mod common;
pub(crate) mod tui;

pub use error::{FetchError, SpiderError};

/// Shortcut for required API elements.
pub mod http {
    pub use crate::fetch::{Fetch, HttpFetcher};
    pub use dotenv::var;
    pub use reqwest::Client as HttpClient;
}

/// Default user agent; the aggregator rejects requests without a browser-like one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Build the standard http client, with the `USER_AGENT` environment variable (if set) and a
/// per-request timeout.
pub fn std_client_build(timeout: std::time::Duration) -> Result<http::HttpClient, SpiderError> {
    let user_agent = http::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    reqwest::ClientBuilder::new()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|err| SpiderError::Client(err.to_string()))
}

/// Formats the time elapsed since `time`, for log lines.
pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:.2}s", time.elapsed().as_secs_f64())
}
