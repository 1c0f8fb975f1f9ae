use crate::fetch::{fetch_json, join_url, Fetch};
use chrono::{NaiveDate, TimeDelta};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{error, trace};

/// Yahoo Finance chart api host.
pub const YAHOO_FINANCE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily open & close for one ticker.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DailyPrices(HashMap<NaiveDate, Bar>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open: Option<f64>,
    pub close: Option<f64>,
}

impl DailyPrices {
    pub fn insert(&mut self, date: NaiveDate, bar: Bar) {
        self.0.insert(date, bar);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percentage move from the open of the day before `date` to the close of the day after.
    ///
    /// `None` when either day is missing from the series.
    pub fn filing_move(&self, date: NaiveDate) -> Option<f64> {
        let open = self.0.get(&(date - TimeDelta::days(1)))?.open?;
        let close = self.0.get(&(date + TimeDelta::days(1)))?.close?;
        if open == 0.0 {
            return None;
        }
        Some((close - open) / open * 100.0)
    }
}

/// Chart api url for daily bars of `ticker` between two dates (inclusive).
pub fn chart_url(base_url: &str, ticker: &str, from: NaiveDate, to: NaiveDate) -> String {
    let period1 = from.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
    let period2 = to
        .succ_opt()
        .unwrap_or(to)
        .and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp());
    join_url(
        base_url,
        &format!("/v8/finance/chart/{ticker}?period1={period1}&period2={period2}&interval=1d"),
    )
}

/// Fetch daily prices for `ticker`; failures are logged and yield `None`.
pub async fn fetch_daily<F>(
    fetcher: &F,
    base_url: &str,
    ticker: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<DailyPrices>
where
    F: Fetch + ?Sized,
{
    let url = chart_url(base_url, ticker, from, to);
    let response: PriceResponse = match fetch_json(fetcher, &url).await {
        Ok(json) => json,
        Err(err) => {
            error!("failed to fetch Yahoo Finance prices for [{ticker}], error({err})");
            return None;
        }
    };

    let prices = response.into_daily();
    if prices.is_none() {
        error!(
            "failed to parse Yahoo Finance prices for [{ticker}], error(no results found within http response)"
        );
    } else {
        trace!("price data transformation succesful for [{ticker}]");
    }
    prices
}

// de
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct PriceResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

// the api pads non-trading intervals with nulls
#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl PriceResponse {
    pub(crate) fn into_daily(self) -> Option<DailyPrices> {
        let base = self.chart.result?.into_iter().next()?;
        let quote = base.indicators.quote.into_iter().next()?;

        let mut prices = DailyPrices::default();
        for ((timestamp, open), close) in base
            .timestamp
            .iter()
            .zip(quote.open.iter())
            .zip(quote.close.iter())
        {
            let Some(time) = chrono::DateTime::from_timestamp(*timestamp, 0) else {
                continue;
            };
            prices.insert(
                time.date_naive(),
                Bar {
                    open: *open,
                    close: *close,
                },
            );
        }
        Some(prices)
    }
}
