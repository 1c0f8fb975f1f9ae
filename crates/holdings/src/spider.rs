use crate::cli::{AnalyzeArgs, Duplicates, HttpArgs, SpiderArgs};
use holdings_spider::analysis::{self, AnalysisConfig, Report};
use holdings_spider::http::HttpFetcher;
use holdings_spider::series::{self, SeriesConfig};
use holdings_spider::thirteenf::index::ListingFilter;
use holdings_spider::watchlist::{DuplicatePolicy, Watchlist};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, trace};

fn build_fetcher(http: &HttpArgs) -> anyhow::Result<HttpFetcher> {
    let client = holdings_spider::std_client_build(Duration::from_secs(http.timeout))?;
    Ok(HttpFetcher::new(client, http.retries))
}

/// Merge `--watchlist` and `--watchlist-file`.
fn watchlist(args: &SpiderArgs) -> anyhow::Result<Watchlist> {
    let mut tickers = args.watchlist.clone();
    if let Some(path) = &args.watchlist_file {
        trace!("reading watchlist file {}", path.display());
        tickers.extend(Watchlist::from_file(path)?.tickers().map(String::from));
    }
    Ok(Watchlist::new(tickers)?)
}

/// Scrape a manager's filings into a series file.
pub(crate) async fn run(args: SpiderArgs, tui: bool) -> anyhow::Result<()> {
    let watchlist = watchlist(&args)?;
    debug!("watchlist of {} tickers", watchlist.tickers().count());

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_percentages.csv", args.manager)));
    let output = holdings_spider::fs::resolve_output_path(&output)?;

    let config = SeriesConfig {
        base_url: args.base_url,
        manager: args.manager,
        watchlist,
        filter: ListingFilter {
            exclude_restatements: !args.keep_restatements,
        },
        duplicates: match args.duplicates {
            Duplicates::Sum => DuplicatePolicy::Sum,
            Duplicates::First => DuplicatePolicy::First,
        },
        concurrency: args.http.concurrency,
    };

    let fetcher = build_fetcher(&args.http)?;
    let summary = series::run(&fetcher, &config, &output, tui).await?;
    println!("{summary}");

    Ok(())
}

/// Regress a series file against post-filing price moves.
pub(crate) async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let config = AnalysisConfig {
        price_base_url: args.price_url,
        concurrency: args.http.concurrency,
    };

    let fetcher = build_fetcher(&args.http)?;
    let results = analysis::analyze_file(&fetcher, &args.input, &config).await?;
    print!("{}", Report(&results));

    if let Some(output) = args.output {
        let output = holdings_spider::fs::resolve_output_path(&output)?;
        let file = std::fs::File::create(&output)?;
        analysis::write_report(&results, file)?;
        println!("Regression results saved to {}", output.display());
    }

    info!("analysis finished, time elapsed: {:?}", time.elapsed());

    Ok(())
}
