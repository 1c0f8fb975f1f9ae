use super::FilingDescriptor;
use crate::common::{cell_text, convert_date_type};
use crate::error::SpiderError;
use crate::fetch::{join_url, Fetch};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, trace, warn};

/// Header text of the listing column carrying the filing date.
pub const DATE_FILED_HEADER: &str = "date filed";

/// Position of the filing date column when the header cannot be matched.
pub const DATE_FILED_FALLBACK: usize = 5;

lazy_static::lazy_static! {
    static ref TABLE: Selector = Selector::parse("table").expect("table selector");
    static ref ROW: Selector = Selector::parse("tr").expect("tr selector");
    static ref HEADER_CELL: Selector = Selector::parse("th, td").expect("th selector");
    static ref CELL: Selector = Selector::parse("td").expect("td selector");
    static ref LINK: Selector = Selector::parse("a[href]").expect("a selector");
}

/// Which listing rows are not comparable holdings snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingFilter {
    /// Also drop amendment ("restatement") filings.
    pub exclude_restatements: bool,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self {
            exclude_restatements: true,
        }
    }
}

impl ListingFilter {
    /// ```rust
    /// use holdings_spider::thirteenf::index::ListingFilter;
    ///
    /// let filter = ListingFilter::default();
    /// assert!(filter.excludes("/13f/000-new-holdings-q1-2024"));
    /// assert!(filter.excludes("/13f/000-Restatement-q1-2024"));
    /// assert!(!filter.excludes("/13f/000-q1-2024"));
    /// ```
    pub fn excludes(&self, href: &str) -> bool {
        let href = href.to_lowercase();
        href.contains("new-holdings") || (self.exclude_restatements && href.contains("restatement"))
    }
}

/// Listing page for a manager, e.g. `0001067983-berkshire-hathaway-inc`.
pub fn listing_url(base_url: &str, manager: &str) -> String {
    join_url(base_url, &format!("/manager/{manager}"))
}

/// Fetch a manager's listing page and resolve its filings, in page order.
///
/// Fatal if the page cannot be fetched or holds no table.
pub async fn resolve<F>(
    fetcher: &F,
    base_url: &str,
    manager: &str,
    filter: ListingFilter,
) -> Result<Vec<FilingDescriptor>, SpiderError>
where
    F: Fetch + ?Sized,
{
    let url = listing_url(base_url, manager);
    info!("fetching filing index from {url} ...");
    let html = fetcher.get_text(&url).await.map_err(|err| {
        error!("failed to fetch listing page, error({err})");
        err
    })?;

    let filings = parse_listing(&html, &url, filter)?;
    debug!("{} filings resolved for {manager}", filings.len());
    Ok(filings)
}

/// Parse a listing page; `url` is only used for diagnostics.
pub fn parse_listing(
    html: &str,
    url: &str,
    filter: ListingFilter,
) -> Result<Vec<FilingDescriptor>, SpiderError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .next()
        .ok_or_else(|| SpiderError::MissingListingTable(url.to_string()))?;

    let mut rows = table.select(&ROW);
    let date_column = match rows.next() {
        Some(header) => date_column(header),
        None => DATE_FILED_FALLBACK,
    };

    let mut filings = vec![];
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        let Some(first) = cells.first() else {
            trace!("skipping listing row without cells");
            continue;
        };

        let Some(href) = first
            .select(&LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
        else {
            trace!("skipping listing row without a filing link");
            continue;
        };

        if filter.excludes(href) {
            trace!("excluding non-holdings filing {href}");
            continue;
        }

        let date_text = cells
            .get(date_column)
            .map(|cell| cell_text(*cell))
            .unwrap_or_default();
        let filing_date = convert_date_type(&date_text);
        if filing_date.is_none() {
            warn!("could not parse date string '{date_text}' for {href}; setting to null");
        }

        filings.push(FilingDescriptor {
            quarter_label: cell_text(*first),
            link: href.to_string(),
            filing_date,
        });
    }

    Ok(filings)
}

// Locate the "Date Filed" column from the header row, falling back to the known position.
fn date_column(header: ElementRef) -> usize {
    let position = header.select(&HEADER_CELL).position(|cell| {
        cell_text(cell)
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ")
            .eq_ignore_ascii_case(DATE_FILED_HEADER)
    });

    match position {
        Some(column) => column,
        None => {
            warn!(
                "no '{DATE_FILED_HEADER}' header on listing page; assuming column {DATE_FILED_FALLBACK}"
            );
            DATE_FILED_FALLBACK
        }
    }
}
