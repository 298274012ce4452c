//! ingot-extract: Convert a JSON array of objects into typed rows
//!
//! Runs two passes over the input: the first infers the schema, the second
//! coerces every row into it and writes one JSON object per line.
//!
//! Usage:
//!   # Write typed rows to stdout
//!   ingot-extract data.json
//!
//!   # Write to a file, typing null-only columns as text
//!   ingot-extract data.json --output rows.jsonl --unresolved-as text
//!
//!   # Refuse to write anything if a date-like string failed to parse
//!   ingot-extract --strict data.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ingot::table::{load_rows, JsonLinesSink, TableDefinition};
use ingot::{infer_schema_from_path, DecoderConfig, FieldType, RowDecoder, UnresolvedPolicy};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ingot-extract")]
#[command(about = "Infer a schema and write typed rows as JSON Lines", long_about = None)]
struct Args {
    /// Input file holding one top-level JSON array
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Recognize bare HH:MM and HH:MM:SS strings as times
    #[arg(long)]
    parse_times: bool,

    /// Parse the time of day in YYYY-MM-DDT... strings instead of keeping only the date
    #[arg(long)]
    full_date_times: bool,

    /// Column type for fields that were null in every row
    #[arg(long, value_name = "TYPE", default_value = "boolean")]
    unresolved_as: FieldType,

    /// Leave null columns out of each output line
    #[arg(long)]
    skip_nulls: bool,

    /// Abort before writing if any value failed a strict date/time parse
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = DecoderConfig::default()
        .with_parse_times(args.parse_times)
        .with_full_date_times(args.full_date_times);
    let Some(policy) = UnresolvedPolicy::new(args.unresolved_as) else {
        bail!("--unresolved-as needs a concrete type");
    };

    tracing::info!(input = %args.input.display(), "creating field map");
    let pass = infer_schema_from_path(&args.input, config.clone());
    if let Some(error) = pass.report.error {
        bail!("failed to create field map: {}", error);
    }
    for warning in &pass.report.warnings {
        tracing::warn!("{}", warning);
    }
    if args.strict && !pass.report.warnings.is_empty() {
        bail!(
            "{} value(s) failed strict date/time parsing",
            pass.report.warnings.len()
        );
    }

    let table = TableDefinition::from_schema(&pass.schema, policy);
    for name in pass.schema.unresolved() {
        tracing::info!(field = name, fallback = %policy.fallback(), "field was null in every row");
    }
    tracing::info!(columns = table.len(), rows = pass.schema.rows_observed(), "creating table");

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = JsonLinesSink::new(writer).skip_nulls(args.skip_nulls);

    tracing::info!("loading table data");
    let mut decoder = RowDecoder::open(&args.input, config);
    let written = load_rows(&mut decoder, &table, &mut sink)?;
    tracing::info!(rows = written, "rows written");

    if let Some(error) = decoder.take_error() {
        bail!("error loading data: {}", error);
    }

    Ok(())
}
