//! ingot-schema: Infer a tabular schema from a JSON array of objects
//!
//! Usage:
//!   # Print the unified field types
//!   ingot-schema data.json
//!
//!   # Recognize HH:MM[:SS] strings as times, compact output
//!   ingot-schema --parse-times --compact data.json
//!
//!   # Unify several files in parallel into one schema
//!   ingot-schema part1.json part2.json part3.json

use anyhow::{bail, Result};
use clap::Parser;
use ingot::{infer_schema_from_path, infer_schema_sharded, DecoderConfig, FieldType, UnresolvedPolicy};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ingot-schema")]
#[command(about = "Infer column types from a JSON array of objects", long_about = None)]
struct Args {
    /// Input files, each holding one top-level JSON array
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Recognize bare HH:MM and HH:MM:SS strings as times
    #[arg(long)]
    parse_times: bool,

    /// Parse the time of day in YYYY-MM-DDT... strings instead of keeping only the date
    #[arg(long)]
    full_date_times: bool,

    /// Report null-only fields with this type instead of "unresolved"
    #[arg(long, value_name = "TYPE")]
    unresolved_as: Option<FieldType>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = DecoderConfig::default()
        .with_parse_times(args.parse_times)
        .with_full_date_times(args.full_date_times);

    let policy = match args.unresolved_as {
        Some(fallback) => match UnresolvedPolicy::new(fallback) {
            Some(policy) => Some(policy),
            None => bail!("--unresolved-as needs a concrete type"),
        },
        None => None,
    };

    let (schema, warnings, errors) = if let [input] = args.inputs.as_slice() {
        tracing::info!(input = %input.display(), "inferring schema");
        let pass = infer_schema_from_path(input, config);
        (pass.schema, pass.report.warnings, pass.report.error.into_iter().collect())
    } else {
        tracing::info!(files = args.inputs.len(), "inferring schema across files");
        let pass = infer_schema_sharded(&args.inputs, &config);
        (pass.schema, pass.warnings, pass.errors)
    };

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!(error = %error, "failed to read input");
        }
        bail!("schema inference failed for {} input(s)", errors.len());
    }

    let mut fields = Map::new();
    for (name, field_type) in schema.iter() {
        let field_type = policy.map_or(field_type, |p| p.resolve(field_type));
        fields.insert(name.to_string(), Value::String(field_type.to_string()));
    }

    let output = json!({
        "rows": schema.rows_observed(),
        "fields": fields,
        "warnings": warnings.len(),
    });

    let output = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };

    println!("{}", output);

    Ok(())
}
