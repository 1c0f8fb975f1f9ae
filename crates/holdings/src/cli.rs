use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Webscrape a manager's 13F filings into a watchlist percentage time series (csv).
    Spider(SpiderArgs),

    /// Regress post-filing price moves against holding changes in a series file.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
pub struct SpiderArgs {
    /// Manager identifier, as in the listing url, e.g. `0001067983-berkshire-hathaway-inc`.
    #[arg(short, long)]
    pub manager: String,

    /// Tickers to track, comma separated.
    #[arg(short, long, value_delimiter = ',')]
    pub watchlist: Vec<String>,

    /// File of tickers to track, one per line.
    #[arg(long)]
    pub watchlist_file: Option<PathBuf>,

    /// Output csv; relative paths are resolved against the executable's directory.
    ///
    /// Defaults to `<manager>_percentages.csv`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Aggregator site.
    #[arg(long, default_value = holdings_spider::thirteenf::BASE_URL)]
    pub base_url: String,

    /// Keep amendment (restatement) filings.
    #[arg(long)]
    pub keep_restatements: bool,

    /// How to combine a symbol disclosed more than once in a filing.
    #[arg(long, value_enum, default_value_t = Duplicates::Sum)]
    pub duplicates: Duplicates,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Series csv written by `spider`.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the regression table as csv.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Price api host.
    #[arg(long, default_value = holdings_spider::analysis::prices::YAHOO_FINANCE_URL)]
    pub price_url: String,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Args, Debug)]
pub struct HttpArgs {
    /// Requests in flight at once.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Retries of a transient failure, per request.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Duplicates {
    /// Add the percentages together.
    Sum,

    /// Keep the first disclosure.
    First,
}
