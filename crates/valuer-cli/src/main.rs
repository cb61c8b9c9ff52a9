//! Command-line interface for valuer
//!
//! ```bash
//! export FMP_API_KEY=...
//! valuer AAPL                       # single ticker, fails on error
//! valuer AAPL MSFT -o out.csv       # batch, skips failures
//! valuer -f stock_list.txt -o out.csv --append
//! ```

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use valuer_stock::api::provider_from_config;
use valuer_stock::output::{CsvSink, DiscardSink, Formatter, PlainFormatter, RecordSink, TableFormatter};
use valuer_stock::tickers::read_ticker_file;
use valuer_stock::{DataProviderKind, RetryPolicy, ValuationConfig, ValuationRunner};

#[derive(Parser, Debug)]
#[command(name = "valuer", version)]
#[command(about = "Graham and exponential-growth valuations for stock tickers", long_about = None)]
struct Args {
    /// Ticker symbols to value
    tickers: Vec<String>,

    /// Read newline-delimited tickers from a file
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Write results to this CSV file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Append to the CSV file instead of truncating it
    #[arg(long, requires = "output")]
    append: bool,

    /// Market data provider (fmp, alpha-vantage)
    #[arg(short, long, default_value = "fmp")]
    provider: DataProviderKind,

    /// Provider API key; defaults to FMP_API_KEY or ALPHA_VANTAGE_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Override the provider base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Extra attempts for transient network failures
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Also fetch company profile and key ratios (console only)
    #[arg(long)]
    profile: bool,

    /// Plain fixed-width columns instead of a table
    #[arg(long, conflicts_with = "no_table")]
    plain: bool,

    /// Do not print results to stdout
    #[arg(long)]
    no_table: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    /// Exactly one ticker on the command line: errors are fatal
    Single(String),
    /// Everything else: errors skip the ticker
    Batch(Vec<String>),
}

impl Args {
    fn mode(&self) -> anyhow::Result<Option<Mode>> {
        if self.file.is_none() && self.tickers.len() == 1 {
            return Ok(Some(Mode::Single(self.tickers[0].clone())));
        }

        let mut tickers = self.tickers.clone();
        if let Some(path) = &self.file {
            let from_file = read_ticker_file(path)
                .with_context(|| format!("reading tickers from {}", path.display()))?;
            tickers.extend(from_file);
        }

        Ok((!tickers.is_empty()).then_some(Mode::Batch(tickers)))
    }

    fn config(&self) -> anyhow::Result<ValuationConfig> {
        let mut builder = ValuationConfig::builder()
            .provider(self.provider)
            .request_timeout(Duration::from_secs(self.timeout))
            .retry(RetryPolicy::with_retries(self.retries))
            .fetch_profile(self.profile);

        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }

        Ok(builder.with_env_api_key().build()?)
    }

    fn formatter(&self) -> Option<Box<dyn Formatter>> {
        if self.no_table {
            None
        } else if self.plain {
            Some(Box::new(PlainFormatter))
        } else {
            Some(Box::new(TableFormatter))
        }
    }
}

fn open_sink(output: Option<&Path>, append: bool) -> anyhow::Result<Box<dyn RecordSink>> {
    let sink: Box<dyn RecordSink> = match output {
        Some(path) if append => Box::new(
            CsvSink::append(path).with_context(|| format!("opening {}", path.display()))?,
        ),
        Some(path) => Box::new(
            CsvSink::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(DiscardSink),
    };
    Ok(sink)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    valuer_utils::init_tracing(args.verbose);

    let Some(mode) = args.mode()? else {
        Args::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "no ticker supplied: pass one or more TICKERS or --file",
            )
            .exit();
    };

    let config = args.config()?;
    let provider = provider_from_config(&config)?;
    info!(provider = provider.name(), "Starting valuer");

    let runner = ValuationRunner::from_config(provider, &config);
    let mut sink = open_sink(args.output.as_deref(), args.append)?;
    let formatter = args.formatter();

    match mode {
        Mode::Single(ticker) => {
            let record = runner
                .run_single(&ticker, sink.as_mut())
                .await
                .with_context(|| format!("valuing {}", ticker.trim().to_uppercase()))?;
            if let Some(formatter) = formatter {
                println!("{}", formatter.format_records(std::slice::from_ref(&record)));
            }
        }
        Mode::Batch(tickers) => {
            let report = runner.run_batch(&tickers, sink.as_mut()).await?;
            if let Some(formatter) = &formatter {
                println!("{}", formatter.format_report(&report));
            }
            let notices = formatter.unwrap_or_else(|| Box::new(PlainFormatter));
            for skipped in &report.skipped {
                eprintln!("{}", notices.format_skipped(skipped));
            }
        }
    }

    Ok(())
}
