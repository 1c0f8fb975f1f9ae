#![allow(dead_code)]

use async_trait::async_trait;
use holdings_spider::http::Fetch;
use holdings_spider::FetchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BASE: &str = "https://13f.test";

/// In-memory site: url → body, or url → http status. Anything else is a 404.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, Result<String, u16>>,
    pub requests: AtomicUsize,
}

impl FakeSite {
    pub fn page(mut self, path: &str, body: impl Into<String>) -> Self {
        self.pages.insert(format!("{BASE}{path}"), Ok(body.into()));
        self
    }

    /// Serve `body` at an absolute url (query string included).
    pub fn url(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.pages.insert(format!("{BASE}{path}"), Err(status));
        self
    }
}

#[async_trait]
impl Fetch for FakeSite {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Listing page with the aggregator's column layout.
pub fn listing(rows: &[(&str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><table>\
         <thead><tr><th>Quarter</th><th>Holdings</th><th>Value ($000)</th>\
         <th>Top Holdings</th><th>Form Type</th><th>Date Filed</th><th>Filing ID</th></tr></thead><tbody>",
    );
    for (quarter, href, date) in rows {
        html.push_str(&format!(
            "<tr><td><a href=\"{href}\">{quarter}</a></td><td>10</td><td>1,000</td>\
             <td>AAPL, MSFT</td><td>13F-HR</td><td>{date}</td><td>000123</td></tr>"
        ));
    }
    html.push_str("</tbody></table></body></html>");
    html
}

/// Filing page pointing at a dataset.
pub fn filing_page(data_url: &str) -> String {
    format!(
        "<html><body><h1>Filing</h1>\
         <table id=\"filingAggregated\" data-url=\"{data_url}\"><thead><tr><th>Sym</th></tr></thead></table>\
         </body></html>"
    )
}

/// Dataset of `(symbol, percentage)` pairs, other fields filled in.
pub fn dataset(holdings: &[(&str, f64)]) -> String {
    let rows: Vec<String> = holdings
        .iter()
        .map(|(symbol, pct)| {
            format!(
                "[\"{symbol}\", \"ISSUER\", \"COM\", \"000000000\", 1000, {pct}, 500, null, null]"
            )
        })
        .collect();
    format!("{{\"data\": [{}]}}", rows.join(","))
}
