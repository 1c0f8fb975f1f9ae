use crate::error::SpiderError;
use crate::thirteenf::holdings::HoldingRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;
use tracing::trace;

/// Ticker → disclosed percentage for one filing; `None` means "not disclosed this quarter".
///
/// Keys iterate in case-sensitive alphabetical order.
pub type Percentages = BTreeMap<String, Option<f64>>;

/// The tickers tracked across filings, held in case-sensitive alphabetical order regardless of
/// the order they were declared in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Watchlist(BTreeSet<String>);

impl Watchlist {
    /// Build a watchlist; tickers are trimmed and blanks ignored. At least one ticker is required.
    pub fn new<I, S>(tickers: I) -> Result<Self, SpiderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tickers: BTreeSet<String> = tickers
            .into_iter()
            .map(|ticker| ticker.as_ref().trim().to_string())
            .filter(|ticker| !ticker.is_empty())
            .collect();

        if tickers.is_empty() {
            return Err(SpiderError::Watchlist("no tickers given".to_string()));
        }
        Ok(Self(tickers))
    }

    /// Read a watchlist file: one ticker per line, `#` starts a comment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SpiderError> {
        let contents = std::fs::read_to_string(path)?;
        Self::new(
            contents
                .lines()
                .map(|line| line.split('#').next().unwrap_or_default()),
        )
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains(ticker)
    }

    /// Tickers, sorted.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Project a filing's holdings onto the watchlist.
    ///
    /// Option rows (PUT/CALL) are not ownership of the security and are left out. Returns `None`
    /// when no watchlist ticker was disclosed, so the caller can drop the filing.
    pub fn project(&self, records: &[HoldingRecord], policy: DuplicatePolicy) -> Option<Percentages> {
        let mut row: Percentages = self.tickers().map(|ticker| (ticker.to_string(), None)).collect();
        let mut matched = false;

        for record in records
            .iter()
            .filter(|record| record.option_type.is_empty() && self.contains(&record.symbol))
        {
            matched = true;
            let slot = row.entry(record.symbol.clone()).or_default();
            *slot = match (*slot, policy) {
                (None, _) => Some(record.percentage),
                (Some(total), DuplicatePolicy::Sum) => {
                    trace!("summing duplicate disclosure of {}", record.symbol);
                    Some(total + record.percentage)
                }
                (Some(first), DuplicatePolicy::First) => Some(first),
            };
        }

        matched.then_some(row)
    }
}

/// Comma-separated tickers, e.g. `"AAPL,MSFT"`.
impl FromStr for Watchlist {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(','))
    }
}

/// How to combine several rows disclosing the same symbol in one filing (e.g. share classes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Add the percentages together.
    #[default]
    Sum,
    /// Keep the first row's percentage.
    First,
}
