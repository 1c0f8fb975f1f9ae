mod common;

use chrono::NaiveDate;
use common::{dataset, filing_page, listing, FakeSite, BASE};
use holdings_spider::series::{run, SeriesConfig, SeriesTable, WatchlistRow};
use holdings_spider::watchlist::{Percentages, Watchlist};
use holdings_spider::SpiderError;

const MANAGER: &str = "0001037389-test-fund";

fn config(tickers: &[&str]) -> SeriesConfig {
    let mut config = SeriesConfig::new(MANAGER, Watchlist::new(tickers).unwrap());
    config.base_url = BASE.to_string();
    config
}

fn filing(site: FakeSite, slug: &str, holdings: &[(&str, f64)]) -> FakeSite {
    site.page(&format!("/13f/{slug}"), filing_page(&format!("/data/{slug}")))
        .page(&format!("/data/{slug}"), dataset(holdings))
}

fn read(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn failing_filings_are_skipped_and_rows_sorted() {
    let site = FakeSite::default().page(
        &format!("/manager/{MANAGER}"),
        listing(&[
            ("Q4 2023", "/13f/q4-2023", "02/14/2024"),
            ("Q4 2023", "/13f/new-holdings-q4-2023", "02/14/2024"),
            ("Q3 2023", "/13f/q3-2023", "11/14/2023"),
            ("Q2 2023", "/13f/q2-2023", "08/14/2023"),
            ("Q1 2023", "/13f/q1-2023", "05/15/2023"),
            ("Q4 2022", "/13f/q4-2022", "13/40/2020"),
        ]),
    );
    let site = filing(site, "q4-2023", &[(" AAPL ", 5.1), ("KO", 1.0)]);
    let site = site.status("/13f/q3-2023", 500);
    let site = filing(site, "q2-2023", &[("KO", 2.0)]);
    let site = filing(site, "q1-2023", &[("MSFT", 3.5), ("AAPL", 4.0)]);
    let site = filing(site, "q4-2022", &[("MSFT", 3.0)]);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out").join("series.csv");
    let summary = run(&site, &config(&["MSFT", "AAPL"]), &output, false)
        .await
        .unwrap();

    assert_eq!(summary.discovered, 5);
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.no_match, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.output, output);

    assert_eq!(
        read(&output),
        vec![
            "filing_date,quarter,AAPL,MSFT",
            "2023-05-15,Q1 2023,4,3.5",
            "2024-02-14,Q4 2023,5.1,",
            ",Q4 2022,,3",
        ]
    );
}

#[tokio::test]
async fn every_filing_failing_still_writes_headers() {
    let site = FakeSite::default()
        .page(
            &format!("/manager/{MANAGER}"),
            listing(&[("Q4 2023", "/13f/q4-2023", "02/14/2024")]),
        )
        .status("/13f/q4-2023", 500);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("series.csv");
    let summary = run(&site, &config(&["NVDA", "AAPL"]), &output, false)
        .await
        .unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(read(&output), vec!["filing_date,quarter,AAPL,NVDA"]);
}

#[tokio::test]
async fn listing_failure_produces_no_file() {
    let site = FakeSite::default().status(&format!("/manager/{MANAGER}"), 500);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("series.csv");
    let result = run(&site, &config(&["AAPL"]), &output, false).await;

    assert!(matches!(result, Err(SpiderError::Fetch(_))));
    assert!(!output.exists());
}

#[test]
fn header_is_the_full_watchlist() {
    let table = SeriesTable::new(&Watchlist::new(["ZM", "CVX", "AAPL"]).unwrap());
    assert_eq!(
        table.header(),
        vec!["filing_date", "quarter", "AAPL", "CVX", "ZM"]
    );
}

#[test]
fn undated_rows_sort_last_in_original_order() {
    let row = |date: Option<(i32, u32, u32)>, quarter: &str| WatchlistRow {
        filing_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        quarter: quarter.to_string(),
        percentages: Percentages::from([("AAPL".to_string(), Some(1.0))]),
    };

    let mut table = SeriesTable::with_tickers(["AAPL".to_string()]);
    table.push(row(None, "a"));
    table.push(row(Some((2024, 2, 14)), "b"));
    table.push(row(None, "c"));
    table.push(row(Some((2023, 2, 14)), "d"));
    table.push(row(Some((2023, 2, 14)), "e"));
    table.sort_by_filing_date();

    let quarters: Vec<&str> = table.rows().iter().map(|row| row.quarter.as_str()).collect();
    assert_eq!(quarters, vec!["d", "e", "b", "a", "c"]);
}

#[test]
fn series_file_reads_back() {
    let csv = "filing_date,quarter,AAPL,MSFT\n2023-05-15,Q1 2023,4,3.5\n,Q4 2022,,3\n";
    let table = SeriesTable::read_csv(csv.as_bytes()).unwrap();

    assert_eq!(table.tickers(), &["AAPL", "MSFT"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].filing_date, NaiveDate::from_ymd_opt(2023, 5, 15));
    assert_eq!(table.cell(&table.rows()[0], "MSFT"), Some(3.5));
    assert_eq!(table.cell(&table.rows()[1], "AAPL"), None);

    let mut written = vec![];
    table.write_csv(&mut written).unwrap();
    assert_eq!(String::from_utf8(written).unwrap(), csv);

    assert!(SeriesTable::read_csv("date,quarter\n".as_bytes()).is_err());
}
