use crate::common::Lenient;
use crate::error::SpiderError;
use crate::fetch::{fetch_json, join_url, Fetch};
use scraper::{Html, Selector};
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, trace};

/// Id of the aggregated holdings table on a filing page.
pub const AGGREGATED_TABLE_ID: &str = "filingAggregated";

/// Number of positional fields in a dataset record.
pub const RECORD_ARITY: usize = 9;

lazy_static::lazy_static! {
    static ref AGGREGATED_TABLE: Selector =
        Selector::parse(&format!("table#{AGGREGATED_TABLE_ID}")).expect("aggregated table selector");
}

// extract
// ----------------------------------------------------------------------------

/// Fetch the filing page at `link`, follow its `data-url`, and decode the holdings dataset.
pub async fn extract<F>(
    fetcher: &F,
    base_url: &str,
    link: &str,
) -> Result<Vec<HoldingRecord>, SpiderError>
where
    F: Fetch + ?Sized,
{
    let page_url = join_url(base_url, link);
    trace!("fetching filing page {page_url}");
    let html = fetcher.get_text(&page_url).await?;

    let data_url = join_url(base_url, &parse_data_url(&html, &page_url)?);
    trace!("fetching holdings dataset {data_url}");
    let dataset: Dataset = fetch_json(fetcher, &data_url).await?;

    debug!("{} holdings decoded from {data_url}", dataset.data.len());
    Ok(dataset.data)
}

/// Read the `data-url` attribute of the aggregated holdings table.
pub fn parse_data_url(html: &str, page_url: &str) -> Result<String, SpiderError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&AGGREGATED_TABLE)
        .next()
        .ok_or_else(|| SpiderError::MissingHoldingsTable(page_url.to_string()))?;

    table
        .value()
        .attr("data-url")
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .ok_or_else(|| SpiderError::MissingDataUrl(page_url.to_string()))
}

/// Decode a raw holdings dataset, `{"data": [[symbol, issuer, ...], ...]}`.
pub fn decode_dataset(json: &str) -> Result<Vec<HoldingRecord>, serde_json::Error> {
    serde_json::from_str::<Dataset>(json).map(|dataset| dataset.data)
}

// de
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Dataset {
    data: Vec<HoldingRecord>,
}

/// One disclosed security of a filing.
#[derive(Clone, Debug, PartialEq)]
pub struct HoldingRecord {
    /// Ticker, trimmed; empty when the aggregator has no symbol for the security.
    pub symbol: String,
    pub issuer_name: String,
    pub class: String,
    pub cusip: String,
    /// Market value, in thousands of dollars.
    pub value: Option<f64>,
    /// Share of the reported portfolio.
    pub percentage: f64,
    pub shares: Option<f64>,
    pub principal: Option<f64>,
    /// "PUT", "CALL" or empty.
    pub option_type: String,
}

struct HoldingVisitor;

impl HoldingVisitor {
    fn field<'de, T, A>(seq: &mut A, index: usize) -> Result<T, A::Error>
    where
        T: Deserialize<'de>,
        A: SeqAccess<'de>,
    {
        seq.next_element::<T>()?
            .ok_or_else(|| de::Error::invalid_length(index, &HoldingVisitor))
    }

    fn text<'de, A: SeqAccess<'de>>(seq: &mut A, index: usize) -> Result<String, A::Error> {
        Ok(Self::field::<Option<String>, A>(seq, index)?
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }
}

impl<'de> Visitor<'de> for HoldingVisitor {
    type Value = HoldingRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a holding record of exactly {RECORD_ARITY} fields")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        // each record is positional:
        // `[symbol, issuer_name, class, cusip, value, percentage, shares, principal, option_type]`
        let symbol = Self::text(&mut seq, 0)?;
        let issuer_name = Self::text(&mut seq, 1)?;
        let class = Self::text(&mut seq, 2)?;
        let cusip = Self::text(&mut seq, 3)?;
        let Lenient(value): Lenient = Self::field(&mut seq, 4)?;
        let Lenient(percentage): Lenient = Self::field(&mut seq, 5)?;
        let Lenient(shares): Lenient = Self::field(&mut seq, 6)?;
        let Lenient(principal): Lenient = Self::field(&mut seq, 7)?;
        let option_type = Self::text(&mut seq, 8)?;

        // a longer tuple means the columns have shifted; refuse rather than misalign
        if seq.next_element::<IgnoredAny>()?.is_some() {
            let mut len = RECORD_ARITY + 1;
            while seq.next_element::<IgnoredAny>()?.is_some() {
                len += 1;
            }
            return Err(de::Error::invalid_length(len, &self));
        }

        let percentage = percentage.ok_or_else(|| {
            de::Error::custom(format!("non-numeric percentage for symbol '{symbol}'"))
        })?;

        Ok(HoldingRecord {
            symbol,
            issuer_name,
            class,
            cusip,
            value,
            percentage,
            shares,
            principal,
            option_type,
        })
    }
}

impl<'de> Deserialize<'de> for HoldingRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(HoldingVisitor)
    }
}
