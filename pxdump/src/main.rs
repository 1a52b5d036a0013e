//! pxdump - print the rows of a Paradox table
//!
//! Rows come out in physical order, or in primary-key order when a key range
//! is given and the table has a primary index.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use paradox_engine::{Condition, ParadoxResult, ParadoxTable, Record};
use paradox_reader::DataReader;

mod config;
mod output;

use config::{Config, OutputFormat, Settings};

/// Dump a Paradox table
#[derive(Parser, Debug)]
#[command(name = "pxdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .DB file
    table: PathBuf,

    /// Lowest key to print (inclusive)
    #[arg(long)]
    min: Option<String>,

    /// Highest key to print (inclusive)
    #[arg(long)]
    max: Option<String>,

    /// Column the key range applies to
    #[arg(short, long, default_value_t = 0)]
    field: usize,

    /// Stop after this many rows
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the table schema before the rows
    #[arg(long)]
    header: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: &str) -> Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Condition for `--min`/`--max`, or `None` when no range was given
fn key_range(args: &Args, table: &ParadoxTable) -> Result<Option<Condition>> {
    if args.min.is_none() && args.max.is_none() {
        return Ok(None);
    }
    let field = table
        .header()
        .fields
        .get(args.field)
        .with_context(|| format!("table has no column {}", args.field))?;

    let mut bounds = Vec::new();
    if let Some(min) = &args.min {
        bounds.push(Condition::ge(args.field, output::parse_literal(field.field_type, min)?));
    }
    if let Some(max) = &args.max {
        bounds.push(Condition::le(args.field, output::parse_literal(field.field_type, max)?));
    }
    Ok(Some(Condition::and(bounds)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = Settings::merge(file_config, args.log_level.clone(), args.limit, args.format);
    init_logging(&settings.log_level)?;

    let table = ParadoxTable::open_path(&args.table)
        .with_context(|| format!("opening {}", args.table.display()))?;
    info!(
        "Opened {} ({} records, {} blocks)",
        table.header().table_name,
        table.header().record_count,
        table.header().file_blocks
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.header {
        write!(out, "{}", output::describe_header(table.header()))?;
        writeln!(out)?;
    }

    let all = Condition::And(Vec::new());
    let range = key_range(&args, &table)?;
    let rows: Box<dyn Iterator<Item = ParadoxResult<Record>> + '_> = match &range {
        Some(cond) if args.field == 0 && table.primary_index().is_some() => {
            debug!("Scanning primary index for {}", cond);
            Box::new(table.scan_index(cond)?)
        }
        Some(cond) => {
            debug!("Filtering sequential scan with {}", cond);
            Box::new(table.records_where(cond))
        }
        None => Box::new(table.records_where(&all)),
    };

    let mut reader = DataReader::new(table.header(), rows);
    let names: Vec<String> = (0..reader.field_count())
        .map(|i| reader.name(i).map(str::to_string))
        .collect::<ParadoxResult<_>>()?;

    let mut printed = 0usize;
    while settings.limit.map_or(true, |limit| printed < limit) && reader.read()? {
        let record = reader.record()?;
        let values = &record.values()[..reader.field_count().min(record.values().len())];
        match settings.format {
            OutputFormat::Text => writeln!(out, "{}", output::format_text(values))?,
            OutputFormat::Json => writeln!(out, "{}", output::format_json(&names, values)?)?,
        }
        printed += 1;
    }
    out.flush()?;

    info!("Printed {} rows", printed);
    Ok(())
}
