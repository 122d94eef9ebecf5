//! dapview CLI - Compute and inspect constraint views over dataset descriptions

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{filter, schema, view};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dapview")]
#[command(about = "Constraint views over hierarchical dataset descriptions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log finalization passes and filter decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a view from a request and print it
    View {
        /// Path to the dataset description (TOML)
        #[arg(long)]
        dataset: String,

        /// Path to the view request (TOML)
        #[arg(long)]
        request: String,

        /// Output format (display, constraint, or json)
        #[arg(long, default_value = "display", value_parser = parse_format)]
        format: String,
    },

    /// Stream the records of a sequence through the view's filter
    Filter {
        /// Path to the dataset description (TOML)
        #[arg(long)]
        dataset: String,

        /// Path to the view request (TOML)
        #[arg(long)]
        request: String,

        /// Fully-qualified name of the sequence
        #[arg(long)]
        sequence: String,

        /// Path to the record data (TOML `[[record]]` tables)
        #[arg(long)]
        records: String,
    },

    /// Print the dataset tree
    Schema {
        /// Path to the dataset description (TOML)
        #[arg(long)]
        dataset: String,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "display" | "constraint" | "json" => Ok(s.to_string()),
        _ => Err(format!(
            "unknown format '{}'; valid values: display, constraint, json",
            s
        )),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::View {
            dataset,
            request,
            format,
        } => view::run(&dataset, &request, &format),
        Commands::Filter {
            dataset,
            request,
            sequence,
            records,
        } => filter::run(filter::FilterArgs {
            dataset,
            request,
            sequence,
            records,
        }),
        Commands::Schema { dataset } => schema::run(&dataset),
    }
}
