use crate::error::SpiderError;
use crate::fetch::Fetch;
use crate::thirteenf::holdings;
use crate::thirteenf::index::{self, ListingFilter};
use crate::thirteenf::{FilingDescriptor, BASE_URL};
use crate::tui::FilingProgress;
use crate::watchlist::{DuplicatePolicy, Percentages, Watchlist};
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Leading columns of every series file.
pub const FILING_DATE: &str = "filing_date";
pub const QUARTER: &str = "quarter";

/// Date format of the series file.
pub const SERIES_DATE_FORMAT: &str = "%Y-%m-%d";

// table
// ----------------------------------------------------------------------------

/// A filing that disclosed at least one watchlist ticker.
#[derive(Clone, Debug, PartialEq)]
pub struct WatchlistRow {
    pub filing_date: Option<NaiveDate>,
    pub quarter: String,
    pub percentages: Percentages,
}

/// Wide-format time series: `filing_date, quarter, <tickers...>`.
///
/// The ticker columns are fixed by the watchlist, never by what the filings happened to contain.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesTable {
    tickers: Vec<String>,
    rows: Vec<WatchlistRow>,
}

impl SeriesTable {
    pub fn new(watchlist: &Watchlist) -> Self {
        Self::with_tickers(watchlist.tickers().map(String::from))
    }

    /// Table over an arbitrary ticker set; columns are sorted and deduplicated.
    pub fn with_tickers<I: IntoIterator<Item = String>>(tickers: I) -> Self {
        let mut tickers: Vec<String> = tickers.into_iter().collect();
        tickers.sort();
        tickers.dedup();
        Self {
            tickers,
            rows: vec![],
        }
    }

    pub fn push(&mut self, row: WatchlistRow) {
        self.rows.push(row);
    }

    /// Stable sort, ascending by filing date; undated rows go last, in their existing order.
    pub fn sort_by_filing_date(&mut self) {
        self.rows
            .sort_by_key(|row| (row.filing_date.is_none(), row.filing_date));
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[WatchlistRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names, in output order.
    pub fn header(&self) -> Vec<String> {
        [FILING_DATE, QUARTER]
            .into_iter()
            .map(String::from)
            .chain(self.tickers.iter().cloned())
            .collect()
    }

    /// Percentage of `ticker` in `row`, `None` if absent or not a column.
    pub fn cell(&self, row: &WatchlistRow, ticker: &str) -> Option<f64> {
        row.percentages.get(ticker).copied().flatten()
    }

    /// Write as CSV, with a header row and no index column. An empty table is headers only.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), SpiderError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(self.tickers.len() + 2);
            record.push(
                row.filing_date
                    .map(|date| date.format(SERIES_DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            );
            record.push(row.quarter.clone());
            for ticker in &self.tickers {
                record.push(
                    self.cell(row, ticker)
                        .map(|pct| pct.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write to `path`, creating parent directories as necessary.
    pub fn save(&self, path: &Path) -> Result<(), SpiderError> {
        crate::fs::ensure_parent(path)?;
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Read a series file written by [`SeriesTable::write_csv`].
    pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Self, SpiderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.get(0) != Some(FILING_DATE) || headers.get(1) != Some(QUARTER) {
            return Err(SpiderError::MalformedSeries(format!(
                "expected leading columns '{FILING_DATE},{QUARTER}'"
            )));
        }
        let tickers: Vec<String> = headers.iter().skip(2).map(String::from).collect();

        let mut table = Self {
            tickers: tickers.clone(),
            rows: vec![],
        };
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let filing_date = match record.get(0).unwrap_or_default().trim() {
                "" => None,
                date => Some(
                    NaiveDate::parse_from_str(date, SERIES_DATE_FORMAT).map_err(|err| {
                        SpiderError::MalformedSeries(format!("row {}: date '{date}': {err}", line + 1))
                    })?,
                ),
            };

            let mut percentages = Percentages::new();
            for (ticker, cell) in tickers.iter().zip(record.iter().skip(2)) {
                let pct = match cell.trim() {
                    "" => None,
                    pct => Some(pct.parse::<f64>().map_err(|err| {
                        SpiderError::MalformedSeries(format!(
                            "row {}: {ticker} '{pct}': {err}",
                            line + 1
                        ))
                    })?),
                };
                percentages.insert(ticker.clone(), pct);
            }

            table.push(WatchlistRow {
                filing_date,
                quarter: record.get(1).unwrap_or_default().to_string(),
                percentages,
            });
        }
        table.tickers.sort();

        Ok(table)
    }
}

// assemble
// ----------------------------------------------------------------------------

/// Parameters of one pipeline run.
#[derive(Clone, Debug)]
pub struct SeriesConfig {
    pub base_url: String,
    pub manager: String,
    pub watchlist: Watchlist,
    pub filter: ListingFilter,
    pub duplicates: DuplicatePolicy,
    /// Filings fetched at once.
    pub concurrency: usize,
}

impl SeriesConfig {
    pub fn new(manager: impl Into<String>, watchlist: Watchlist) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            manager: manager.into(),
            watchlist,
            filter: ListingFilter::default(),
            duplicates: DuplicatePolicy::default(),
            concurrency: 4,
        }
    }
}

/// What became of a single filing.
#[derive(Debug)]
pub enum FilingOutcome {
    Row(WatchlistRow),
    /// Extracted, but none of the watchlist tickers were disclosed.
    NoMatch,
    Skipped(SpiderError),
}

/// Extract & project one filing. Never fails: errors become [`FilingOutcome::Skipped`].
pub async fn process_filing<F>(
    fetcher: &F,
    base_url: &str,
    filing: &FilingDescriptor,
    watchlist: &Watchlist,
    duplicates: DuplicatePolicy,
) -> FilingOutcome
where
    F: Fetch + ?Sized,
{
    let records = match holdings::extract(fetcher, base_url, &filing.link).await {
        Ok(records) => records,
        Err(err) => {
            error!("skipping filing {}, error({err})", filing.link);
            return FilingOutcome::Skipped(err);
        }
    };

    match watchlist.project(&records, duplicates) {
        Some(percentages) => FilingOutcome::Row(WatchlistRow {
            filing_date: filing.filing_date,
            quarter: filing.quarter_label.clone(),
            percentages,
        }),
        None => {
            warn!("none of the watchlist symbols found in {}", filing.link);
            FilingOutcome::NoMatch
        }
    }
}

/// A sorted table, plus what happened to the filings that did not make it in.
#[derive(Debug)]
pub struct Assembly {
    pub table: SeriesTable,
    pub discovered: usize,
    pub no_match: usize,
    pub skipped: usize,
}

/// Drive every filing through extraction & projection, concurrently, then sort the rows.
pub async fn assemble<F>(
    fetcher: &F,
    filings: &[FilingDescriptor],
    config: &SeriesConfig,
    tui: bool,
) -> Assembly
where
    F: Fetch + ?Sized,
{
    let progress = FilingProgress::new(filings.len(), tui);
    let outcomes = Mutex::new(Vec::with_capacity(filings.len()));

    stream::iter(filings.iter().enumerate())
        .for_each_concurrent(config.concurrency.max(1), |(index, filing)| {
            let outcomes = &outcomes;
            let progress = &progress;
            async move {
                let outcome = process_filing(
                    fetcher,
                    &config.base_url,
                    filing,
                    &config.watchlist,
                    config.duplicates,
                )
                .await;

                progress.total.inc(1);
                match &outcome {
                    FilingOutcome::Row(_) => progress.success.inc(1),
                    FilingOutcome::Skipped(_) => progress.fails.inc(1),
                    FilingOutcome::NoMatch => {}
                }
                outcomes.lock().await.push((index, outcome));
            }
        })
        .await;
    progress.finish();

    // restore listing order, so undated rows keep their relative position
    let mut outcomes = outcomes.into_inner();
    outcomes.sort_by_key(|(index, _)| *index);

    let mut assembly = Assembly {
        table: SeriesTable::new(&config.watchlist),
        discovered: filings.len(),
        no_match: 0,
        skipped: 0,
    };
    for (_, outcome) in outcomes {
        match outcome {
            FilingOutcome::Row(row) => assembly.table.push(row),
            FilingOutcome::NoMatch => assembly.no_match += 1,
            FilingOutcome::Skipped(_) => assembly.skipped += 1,
        }
    }
    assembly.table.sort_by_filing_date();

    assembly
}

/// Completion report of [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub discovered: usize,
    pub rows: usize,
    pub no_match: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Data pull completed in {:.2} seconds.",
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "{} filings found: {} rows, {} without watchlist symbols, {} skipped.",
            self.discovered, self.rows, self.no_match, self.skipped
        )?;
        write!(f, "Data saved to {}", self.output.display())
    }
}

/// Resolve a manager's filings, assemble the series, and write it to `output`.
///
/// Only a listing-page failure (or failing to write the file) is an error; the file is written
/// even when every filing was skipped.
pub async fn run<F>(
    fetcher: &F,
    config: &SeriesConfig,
    output: &Path,
    tui: bool,
) -> Result<RunSummary, SpiderError>
where
    F: Fetch + ?Sized,
{
    let time = std::time::Instant::now();

    let filings = index::resolve(fetcher, &config.base_url, &config.manager, config.filter).await?;
    if tui {
        println!("{} filings found for {}", filings.len(), config.manager);
    }

    let assembly = assemble(fetcher, &filings, config, tui).await;
    debug!("series assembled. {}", crate::time_elapsed(time));

    assembly.table.save(output).map_err(|err| {
        error!("failed to write {}, error({err})", output.display());
        err
    })?;

    let summary = RunSummary {
        output: output.to_path_buf(),
        discovered: assembly.discovered,
        rows: assembly.table.len(),
        no_match: assembly.no_match,
        skipped: assembly.skipped,
        elapsed: time.elapsed(),
    };
    info!(
        "{} rows written to {}. {}",
        summary.rows,
        output.display(),
        crate::time_elapsed(time)
    );

    Ok(summary)
}
