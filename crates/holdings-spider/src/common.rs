use chrono::NaiveDate;
use scraper::ElementRef;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// Date format of the listing page's "Date Filed" column.
pub(crate) const LISTING_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse a `MM/DD/YYYY` date string; `None` if it is not a valid calendar date.
pub(crate) fn convert_date_type(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), LISTING_DATE_FORMAT).ok()
}

/// Text content of an element, each text node trimmed, joined by single spaces.
pub(crate) fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// A number that the dataset may encode as a JSON number, a numeric string, or `null`.
///
/// Anything non-numeric collapses to `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Lenient(pub(crate) Option<f64>);

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Lenient;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, a numeric string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Lenient(Some(v).filter(|v| v.is_finite())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Lenient(Some(v as f64)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Lenient(Some(v as f64)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        // thousands separators are common in the aggregator's string-encoded figures
        let cleaned: String = v.trim().chars().filter(|c| *c != ',').collect();
        // `f64::from_str` accepts "NaN" and "inf"
        Ok(Lenient(cleaned.parse::<f64>().ok().filter(|v| v.is_finite())))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(Lenient(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Lenient(None))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Lenient(None))
    }
}

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientVisitor)
    }
}
