//! Regression of each ticker's post-filing price move against the change in its disclosed
//! holding percentage; a batch consumer of a series file.

/// Daily prices from the Yahoo Finance chart api.
pub mod prices;

/// Least squares & the series transformations feeding it.
pub mod regression;

use crate::fetch::Fetch;
use crate::series::SeriesTable;
use chrono::{NaiveDate, TimeDelta};
use futures::{stream, StreamExt};
use regression::{fill_mean, log_changes, ols, Regression};
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Regression outcome for one watchlist ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerRegression {
    pub ticker: String,
    /// `None` when there was too little usable data to fit.
    pub fit: Option<Regression>,
}

/// Settings of an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub price_base_url: String,
    /// Tickers priced at once.
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            price_base_url: prices::YAHOO_FINANCE_URL.to_string(),
            concurrency: 8,
        }
    }
}

/// Fit `price_move ~ const + holding_change` for one ticker, filling gaps with column means.
pub fn regress_ticker(holdings: &[Option<f64>], moves: &[Option<f64>]) -> Option<Regression> {
    let x = fill_mean(&log_changes(holdings))?;
    let y = fill_mean(moves)?;
    ols(&x, &y)
}

/// Regress every ticker column of `table`. Undated rows are ignored.
pub async fn analyze<F>(
    fetcher: &F,
    table: &SeriesTable,
    config: &AnalysisConfig,
) -> Vec<TickerRegression>
where
    F: Fetch + ?Sized,
{
    let mut rows: Vec<_> = table
        .rows()
        .iter()
        .filter_map(|row| row.filing_date.map(|date| (date, row)))
        .collect();
    rows.sort_by_key(|(date, _)| *date);

    let dates: Vec<NaiveDate> = rows.iter().map(|(date, _)| *date).collect();
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        warn!("no dated rows to analyse");
        return table
            .tickers()
            .iter()
            .map(|ticker| TickerRegression {
                ticker: ticker.clone(),
                fit: None,
            })
            .collect();
    };
    let from = *first - TimeDelta::days(2);
    let to = *last + TimeDelta::days(2);

    info!("fetching prices for {} tickers ...", table.tickers().len());
    let results = Mutex::new(Vec::with_capacity(table.tickers().len()));
    stream::iter(table.tickers())
        .for_each_concurrent(config.concurrency.max(1), |ticker| {
            let results = &results;
            let rows = &rows;
            let dates = &dates;
            async move {
                let holdings: Vec<Option<f64>> = rows
                    .iter()
                    .map(|(_, row)| table.cell(row, ticker))
                    .collect();

                let moves: Vec<Option<f64>> = match prices::fetch_daily(
                    fetcher,
                    &config.price_base_url,
                    ticker,
                    from,
                    to,
                )
                .await
                {
                    Some(prices) => dates.iter().map(|date| prices.filing_move(*date)).collect(),
                    None => vec![None; dates.len()],
                };

                let fit = regress_ticker(&holdings, &moves);
                if fit.is_none() {
                    debug!("[{ticker}] has too little data to regress");
                }
                results.lock().await.push(TickerRegression {
                    ticker: ticker.clone(),
                    fit,
                });
            }
        })
        .await;

    let mut results = results.into_inner();
    results.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    results
}

/// Read a series file and analyse it.
pub async fn analyze_file<F>(
    fetcher: &F,
    input: &Path,
    config: &AnalysisConfig,
) -> anyhow::Result<Vec<TickerRegression>>
where
    F: Fetch + ?Sized,
{
    let file = std::fs::File::open(input)
        .map_err(|err| anyhow::anyhow!("failed to open {}: {err}", input.display()))?;
    let table = SeriesTable::read_csv(file)?;
    debug!(
        "{} rows, {} tickers read from {}",
        table.len(),
        table.tickers().len(),
        input.display()
    );
    Ok(analyze(fetcher, &table, config).await)
}

/// Write regression results as CSV; unfit tickers have empty statistics.
pub fn write_report<W: std::io::Write>(
    results: &[TickerRegression],
    writer: W,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "ticker",
        "n",
        "intercept",
        "slope",
        "slope_std_err",
        "t_stat",
        "p_value",
        "r_squared",
    ])?;

    let opt = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for result in results {
        let record = match &result.fit {
            Some(fit) => vec![
                result.ticker.clone(),
                fit.n.to_string(),
                fit.intercept.to_string(),
                fit.slope.to_string(),
                opt(fit.slope_std_err),
                opt(fit.t_stat),
                opt(fit.p_value),
                opt(fit.r_squared),
            ],
            None => {
                let mut record = vec![result.ticker.clone()];
                record.resize(8, String::new());
                record
            }
        };
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Plain-text table of regression results.
pub struct Report<'a>(pub &'a [TickerRegression]);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |value: Option<f64>| match value {
            Some(v) => format!("{v:>10.4}"),
            None => format!("{:>10}", "-"),
        };

        writeln!(
            f,
            "{:<8} {:>4} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "ticker", "n", "intercept", "slope", "std err", "t", "p", "r2"
        )?;
        for result in self.0 {
            match &result.fit {
                Some(fit) => writeln!(
                    f,
                    "{:<8} {:>4} {} {} {} {} {} {}",
                    result.ticker,
                    fit.n,
                    cell(Some(fit.intercept)),
                    cell(Some(fit.slope)),
                    cell(fit.slope_std_err),
                    cell(fit.t_stat),
                    cell(fit.p_value),
                    cell(fit.r_squared),
                )?,
                None => writeln!(f, "{:<8} skipped (insufficient data)", result.ticker)?,
            }
        }
        Ok(())
    }
}
