use crate::error::FetchError;
use crate::http::HttpClient;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{trace, warn};

/// First backoff delay; doubled after every failed attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Ceiling on a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Source of raw documents, keyed by absolute URL.
///
/// The spider never talks to [`reqwest`] directly, so the pipeline can be driven by any
/// implementation (the integration tests use an in-memory one).
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and return the response body; any non-success status is an error.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetch`] over http, with bounded retry & exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
    retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    pub fn new(client: HttpClient, retries: u32) -> Self {
        Self {
            client,
            retries,
            backoff: BASE_BACKOFF,
        }
    }

    /// Override the initial backoff delay.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut delay = self.backoff.min(MAX_BACKOFF);
        let mut attempt = 0;
        loop {
            trace!("GET {url} (attempt {})", attempt + 1);
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "transient failure, retrying in {delay:?} ({attempt}/{}), error({err})",
                        self.retries
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_backoff(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// Doubled, but never past the ceiling.
fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

/// GET `url` and deserialize the body as JSON.
pub async fn fetch_json<T, F>(fetcher: &F, url: &str) -> Result<T, crate::SpiderError>
where
    T: serde::de::DeserializeOwned,
    F: Fetch + ?Sized,
{
    let body = fetcher.get_text(url).await?;
    serde_json::from_str(&body).map_err(|source| crate::SpiderError::MalformedDataset {
        url: url.to_string(),
        source,
    })
}

/// Join a site-relative path (e.g. `/13f/000...-q4-2023`) onto the base url.
///
/// ```rust
/// use holdings_spider::fetch::join_url;
///
/// assert_eq!(join_url("https://13f.info/", "/manager/x"), "https://13f.info/manager/x");
/// assert_eq!(join_url("https://13f.info", "manager/x"), "https://13f.info/manager/x");
/// assert_eq!(join_url("https://13f.info", "https://other.site/a"), "https://other.site/a");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        assert_eq!(next_backoff(BASE_BACKOFF), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(20)), MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::MAX), MAX_BACKOFF);

        let mut delay = BASE_BACKOFF;
        for _ in 0..100 {
            delay = next_backoff(delay);
        }
        assert_eq!(delay, MAX_BACKOFF);
    }
}
