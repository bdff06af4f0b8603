//! Mara CLI binary.
//!
//! Fetches reconciled financial indicators for the securities matching the
//! given keywords and prints them as delimited tables.

mod plugins;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mara::{
    AggregateMethod, Config, DateRange, FetchOptions, IndicatorFetcher, IndicatorRegistry,
    build_output_tables, load_plugins, select_securities, sort_tables,
};
use mara_data::tushare::{RetryPolicy, TushareClient};
use mara_output::{
    ExportFormat, RenderOptions, Section, TableExport, export_to_dir, render_sections,
};
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "mara")]
#[command(about = "Mara: reconciled Tushare financial indicators", long_about = None)]
#[command(version)]
struct Cli {
    /// Keywords matched against industry, code and name (empty: all securities)
    keywords: Vec<String>,

    /// Indicators to fetch, comma separated
    #[arg(short, long, value_delimiter = ',')]
    indicators: Vec<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(short, long)]
    start_date: Option<String>,

    /// End date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    end_date: Option<String>,

    /// Fiscal quarter to keep, 1-4 (0 keeps every period)
    #[arg(long, default_value = "4")]
    season: u8,

    /// Convert cumulative statement values to single-quarter values
    #[arg(long)]
    single: bool,

    /// Keep only the most recent report per security
    #[arg(long)]
    latest: bool,

    /// Aggregate across periods (mean or median)
    #[arg(short, long)]
    aggregate: Option<String>,

    /// Column used to sort tables without a period
    #[arg(short = 't', long)]
    sort_by: Option<String>,

    /// Sort direction
    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    sort_order: SortOrder,

    /// Omit the header row
    #[arg(long)]
    no_header: bool,

    /// Field delimiter, a single character (`\t` for tab)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Also write one file per indicator into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export file format (csv, json, pretty-json)
    #[arg(long, default_value = "csv")]
    export_format: String,

    /// Configuration file (defaults to ~/.mararc)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List every known indicator and exit
    #[arg(long)]
    list_indicators: bool,

    /// Log level (error, warn, info, debug)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long)]
    debug: bool,

    /// Attempts per provider request
    #[arg(long, default_value = "3")]
    retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value = "60")]
    backoff_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortOrder {
    Asc,
    Desc,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(if cli.debug { "debug" } else { cli.log_level.as_str() })?;

    let mut registry = IndicatorRegistry::builtin();
    let loaded = load_plugins(&mut registry, plugins::builtin_plugins())?;
    debug!(plugins = ?loaded, indicators = registry.len(), "registry ready");

    if cli.list_indicators {
        let mut stdout = std::io::stdout().lock();
        for name in registry.indicator_names() {
            let source = registry.get_api(name).unwrap_or("custom");
            writeln!(stdout, "{}\t{}", name, source)?;
        }
        return Ok(());
    }

    // Every user-input problem surfaces before the first request.
    let options = fetch_options(&cli)?;
    let export_format: ExportFormat = cli.export_format.parse()?;
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let client = TushareClient::new(config.token)?.with_retry_policy(RetryPolicy::new(
        cli.retries,
        Duration::from_secs(cli.backoff_secs),
    ));

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Selecting securities...");

    let selection = match select_securities(&client, &cli.keywords).await {
        Ok(selection) => selection,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    if selection.is_empty() {
        pb.finish_and_clear();
        info!(keywords = ?cli.keywords, "no securities matched");
        return Ok(());
    }

    pb.set_message(format!(
        "Fetching {} indicators for {} securities...",
        options.indicators.len(),
        selection.ts_codes.len()
    ));
    let fetcher = IndicatorFetcher::new(&client, &registry);
    let results = match fetcher.fetch_indicators(&selection.ts_codes, &options).await {
        Ok(results) => results,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };
    pb.finish_and_clear();

    let descending = cli.sort_order == SortOrder::Desc;
    let mut tables = build_output_tables(&selection.basic_info, &results)?;
    if let Some(column) = &cli.sort_by {
        sort_tables(&mut tables, column, descending)?;
    }

    let sections: Vec<Section<'_>> = tables
        .iter()
        .map(|table| Section {
            label: table.frequency.as_str(),
            data: &table.data,
        })
        .collect();
    let render = RenderOptions {
        delimiter: cli.delimiter,
        header: !cli.no_header,
    };
    render_sections(&mut std::io::stdout().lock(), &sections, render)?;

    if let Some(dir) = &cli.export {
        let mut exports = Vec::with_capacity(results.len());
        for result in &results {
            let mut tables =
                build_output_tables(&selection.basic_info, std::slice::from_ref(result))?;
            if let Some(column) = &cli.sort_by {
                sort_tables(&mut tables, column, descending)?;
            }
            if let Some(table) = tables.into_iter().next() {
                exports.push(TableExport::new(&result.name, table.data));
            }
        }
        let written = export_to_dir(dir, &exports, export_format)?;
        for path in written {
            eprintln!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!(
            "mara={level},mara_data={level},mara_indicators={level},mara_output={level}"
        )),
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn fetch_options(cli: &Cli) -> Result<FetchOptions, Box<dyn std::error::Error>> {
    let aggregate = cli
        .aggregate
        .as_deref()
        .map(str::parse::<AggregateMethod>)
        .transpose()?;

    let mut options = FetchOptions::new(cli.indicators.iter().map(String::as_str))
        .season(cli.season)
        .single(cli.single)
        .latest(cli.latest)
        .aggregate(aggregate);
    if !cli.latest {
        options = options.date_range(DateRange::from_cli(
            cli.start_date.as_deref(),
            cli.end_date.as_deref(),
        )?);
    }
    options.validate()?;
    Ok(options)
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(format!("delimiter must be a single ASCII character, got {:?}", value)),
        },
    }
}
