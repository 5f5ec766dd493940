use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use goose_q5::{
    execute_tpch_q5, writer, ParquetSource, QueryParams, RecordSource, Tables, TblSource,
};

/// TPC-H Query 5 (local supplier volume)
#[derive(Parser, Debug)]
#[command(name = "goose-q5")]
#[command(version)]
#[command(about = "Revenue per nation for one region and order-date interval")]
struct Args {
    /// Region name, matched exactly (e.g. ASIA)
    #[arg(long = "r_name")]
    region_name: String,

    /// First order date included, YYYY-MM-DD
    #[arg(long = "start_date")]
    start_date: String,

    /// First order date excluded, YYYY-MM-DD
    #[arg(long = "end_date")]
    end_date: String,

    /// Number of lineitem scan workers
    #[arg(long = "threads")]
    threads: usize,

    /// Directory holding the six tables
    #[arg(long = "table_path")]
    table_path: PathBuf,

    /// Output CSV file
    #[arg(long = "result_path")]
    result_path: PathBuf,

    /// Table file format
    #[arg(long, value_enum, default_value_t = Format::Tbl)]
    format: Format,

    /// `.tbl` lines do not end with a trailing `|`
    #[arg(long = "no-trailing-delimiter")]
    no_trailing_delimiter: bool,

    /// Evaluate the query this many times and log timing statistics
    #[arg(long, default_value_t = 1)]
    runs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Tbl,
    Parquet,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("query failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> goose_q5::Result<()> {
    let params = QueryParams::new(
        args.region_name.as_str(),
        args.start_date.as_str(),
        args.end_date.as_str(),
        args.threads,
    )?;
    let runs = args.runs.max(1);

    let source: Box<dyn RecordSource> = match args.format {
        Format::Tbl => Box::new(
            TblSource::new(&args.table_path).with_trailing_delimiter(!args.no_trailing_delimiter),
        ),
        Format::Parquet => Box::new(ParquetSource::new(&args.table_path)),
    };

    info!(
        region = %params.region_name,
        start_date = %params.start_date,
        end_date = %params.end_date,
        workers = params.workers.get(),
        table_path = %args.table_path.display(),
        "starting query 5"
    );
    let tables = Tables::load(source.as_ref())?;

    let mut times = Vec::with_capacity(runs);
    let mut results = Vec::new();
    for _ in 0..runs {
        let start = Instant::now();
        results = execute_tpch_q5(&tables, &params)?;
        times.push(start.elapsed().as_secs_f64() * 1000.0);
    }

    if runs > 1 {
        let stats = RunStats::from_times(&times);
        info!(
            runs,
            mean_ms = stats.mean,
            stddev_ms = stats.stddev,
            min_ms = stats.min,
            max_ms = stats.max,
            "timing"
        );
    }

    writer::write_results(&args.result_path, &results)?;
    info!(
        rows = results.len(),
        result_path = %args.result_path.display(),
        "results written"
    );
    Ok(())
}

/// Summary of per-run wall times in milliseconds
struct RunStats {
    mean: f64,
    stddev: f64,
    min: f64,
    max: f64,
}

impl RunStats {
    fn from_times(times: &[f64]) -> Self {
        let mean = times.iter().sum::<f64>() / times.len() as f64;
        let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64;
        Self {
            mean,
            stddev: variance.sqrt(),
            min: times.iter().cloned().fold(f64::INFINITY, f64::min),
            max: times.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
