use chrono::NaiveDate;

/// Holdings extraction from a single filing page & its aggregated dataset.
pub mod holdings;

/// Discovery of a manager's filings from the listing page.
pub mod index;

/// Default aggregator site; every path the spider follows is relative to it.
pub const BASE_URL: &str = "https://13f.info";

/// One row of a manager's listing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilingDescriptor {
    /// e.g. "Q4 2023"
    pub quarter_label: String,
    /// Site-relative path to the filing page.
    pub link: String,
    /// `None` if the listing's date string did not parse.
    pub filing_date: Option<NaiveDate>,
}
