mod common;

use chrono::{NaiveDate, TimeDelta};
use common::{FakeSite, BASE};
use holdings_spider::analysis::prices::chart_url;
use holdings_spider::analysis::{analyze, regress_ticker, write_report, AnalysisConfig, Report};
use holdings_spider::series::SeriesTable;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(14, 30, 0).unwrap().and_utc().timestamp()
}

// Tuesday open 100, Thursday close as given, around each Wednesday filing.
fn chart(filings: &[(NaiveDate, f64)]) -> String {
    let mut timestamps = vec![];
    let mut opens = vec![];
    let mut closes = vec![];
    for (filed, close) in filings {
        timestamps.push(timestamp(*filed - TimeDelta::days(1)));
        opens.push("100.0".to_string());
        closes.push("100.0".to_string());
        timestamps.push(timestamp(*filed + TimeDelta::days(1)));
        opens.push("null".to_string());
        closes.push(close.to_string());
    }
    format!(
        r#"{{"chart":{{"result":[{{"timestamp":[{}],"indicators":{{"quote":[{{"open":[{}],"close":[{}]}}]}}}}],"error":null}}}}"#,
        timestamps
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(","),
        opens.join(","),
        closes.join(",")
    )
}

#[test]
fn regression_needs_holding_changes_and_moves() {
    let holdings = [Some(1.0), Some(2.0), Some(4.0), Some(2.0)];
    let moves = [Some(1.0), Some(10.0), Some(12.0), Some(-5.0)];
    let fit = regress_ticker(&holdings, &moves).unwrap();
    assert_eq!(fit.n, 4);
    assert!(fit.slope > 0.0);

    assert_eq!(regress_ticker(&holdings, &[None, None, None, None]), None);
    assert_eq!(regress_ticker(&[Some(1.0), None, None, None], &moves), None);
}

#[tokio::test]
async fn analyze_regresses_each_ticker() {
    let filed = [date(2024, 1, 3), date(2024, 1, 10), date(2024, 1, 17), date(2024, 1, 24)];
    let csv = "filing_date,quarter,AAPL,MSFT\n\
               2024-01-03,Q1,1,\n\
               2024-01-10,Q2,2,\n\
               2024-01-17,Q3,4,\n\
               2024-01-24,Q4,2,\n\
               ,Q5,9,\n";
    let table = SeriesTable::read_csv(csv.as_bytes()).unwrap();

    let from = filed[0] - TimeDelta::days(2);
    let to = filed[3] + TimeDelta::days(2);
    let site = FakeSite::default().url(
        &chart_url(BASE, "AAPL", from, to),
        chart(&[
            (filed[0], 101.0),
            (filed[1], 110.0),
            (filed[2], 112.0),
            (filed[3], 95.0),
        ]),
    );
    let config = AnalysisConfig {
        price_base_url: BASE.to_string(),
        concurrency: 2,
    };

    let results = analyze(&site, &table, &config).await;
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].ticker, "AAPL");
    let fit = results[0].fit.unwrap();
    assert_eq!(fit.n, 4);
    assert!(fit.slope > 0.0);
    let p = fit.p_value.unwrap();
    assert!(p > 0.0 && p < 1.0);

    // MSFT never held and never priced
    assert_eq!(results[1].ticker, "MSFT");
    assert_eq!(results[1].fit, None);

    let report = Report(&results).to_string();
    assert!(report.contains("MSFT     skipped"));

    let mut written = vec![];
    write_report(&results, &mut written).unwrap();
    let written = String::from_utf8(written).unwrap();
    assert!(written.starts_with("ticker,n,intercept,slope,slope_std_err,t_stat,p_value,r_squared\nAAPL,4,"));
    assert!(written.ends_with("MSFT,,,,,,,\n"));
}
