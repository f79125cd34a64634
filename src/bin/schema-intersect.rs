//! Schema Intersect CLI
//!
//! Command-line interface for intersecting JSON Schemas and flattening
//! combinators in OpenAPI documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use schema_intersect::{
    load_document_auto, Combinator, Intersector, MergeCombinator, MergeSubschemas,
    SchemaTransformer, DEFAULT_MAX_DEPTH,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "SCHEMA_INTERSECT_LOG";

#[derive(Parser)]
#[command(name = "schema-intersect")]
#[command(about = "Intersect JSON Schemas and flatten allOf/anyOf/oneOf")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Intersect two or more schemas into one
    Intersect {
        /// Schema sources: file paths, URLs (http:// or https://), or - for stdin
        #[arg(required = true, num_args = 2..)]
        schemas: Vec<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Maximum schema nesting followed while intersecting
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Flatten combinators in an OpenAPI document or JSON Schema
    Flatten {
        /// Document source: file path, URL (http:// or https://), or - for stdin
        document: String,

        /// Combinator to flatten; `all` keeps unmergeable nodes instead of failing
        #[arg(long, value_enum, default_value_t = CombinatorArg::All)]
        combinator: CombinatorArg,

        /// Leave allOf in place (with --combinator all)
        #[arg(long)]
        skip_all_of: bool,

        /// Leave anyOf in place (with --combinator all)
        #[arg(long)]
        skip_any_of: bool,

        /// Leave oneOf in place (with --combinator all)
        #[arg(long)]
        skip_one_of: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Maximum schema nesting followed while intersecting
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CombinatorArg {
    AllOf,
    AnyOf,
    OneOf,
    All,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Intersect {
            schemas,
            output,
            pretty,
            max_depth,
        } => run_intersect(&schemas, output, pretty, max_depth),

        Commands::Flatten {
            document,
            combinator,
            skip_all_of,
            skip_any_of,
            skip_one_of,
            output,
            pretty,
            max_depth,
        } => run_flatten(FlattenArgs {
            document,
            combinator,
            skips: [skip_all_of, skip_any_of, skip_one_of],
            output,
            pretty,
            max_depth,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_intersect(
    sources: &[String],
    output: Option<PathBuf>,
    pretty: bool,
    max_depth: usize,
) -> Result<(), u8> {
    let schemas = sources
        .iter()
        .map(|source| {
            load_document_auto(source).map_err(|e| {
                eprintln!("Error loading {}: {}", source, e);
                e.exit_code() as u8
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let merged = Intersector::new()
        .max_depth(max_depth)
        .intersect_all(&schemas)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    write_output(&merged, output, pretty)
}

struct FlattenArgs {
    document: String,
    combinator: CombinatorArg,
    skips: [bool; 3],
    output: Option<PathBuf>,
    pretty: bool,
    max_depth: usize,
}

fn run_flatten(args: FlattenArgs) -> Result<(), u8> {
    let FlattenArgs {
        document: source,
        combinator,
        skips: [skip_all_of, skip_any_of, skip_one_of],
        output,
        pretty,
        max_depth,
    } = args;

    let document = load_document_auto(&source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let intersector = Intersector::new().max_depth(max_depth);
    let transformer: Box<dyn SchemaTransformer> = match combinator {
        CombinatorArg::AllOf => Box::new(single(Combinator::AllOf, intersector)),
        CombinatorArg::AnyOf => Box::new(single(Combinator::AnyOf, intersector)),
        CombinatorArg::OneOf => Box::new(single(Combinator::OneOf, intersector)),
        CombinatorArg::All => Box::new(
            MergeSubschemas::new()
                .skip_all_of(skip_all_of)
                .skip_any_of(skip_any_of)
                .skip_one_of(skip_one_of)
                .with_intersector(intersector),
        ),
    };

    let flattened = transformer.transform(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_output(&flattened, output, pretty)
}

fn single(combinator: Combinator, intersector: Intersector) -> MergeCombinator {
    MergeCombinator::new(combinator).with_intersector(intersector)
}

fn write_output(value: &Value, output: Option<PathBuf>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
