mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, TraceLevel};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preproccess the trace level
fn preprocess(trace_level: Level) {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        });
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `holdings spider --manager <ID> --watchlist <T,...>`: scrape a manager's filings
        Spider(args) => spider::run(args, tui).await?,

        // `holdings analyze --input <CSV>`: regress a series file
        Analyze(args) => spider::analyze(args).await?,
    }

    Ok(())
}
