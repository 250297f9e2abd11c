//! qail-typemap — inspect and exercise a category type map
//!
//! # Usage
//!
//! ```bash
//! # List category names
//! qail-typemap categories
//!
//! # Show what a configuration assigns
//! qail-typemap show --config typemap.toml
//!
//! # Cast JSON values as query parameters
//! qail-typemap dispatch --config typemap.toml 42 '"abc"' '[1,2,3]'
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_typemap::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qail-typemap")]
#[command(version)]
#[command(about = "🪝 Category-keyed encoder dispatch for QAIL", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-typemap categories
    qail-typemap show --config typemap.toml
    qail-typemap dispatch --config typemap.toml 42 '\"abc\"' '[1,2,3]'")]
struct Cli {
    /// Type map configuration file (defaults to <config dir>/qail/typemap.toml)
    #[arg(short, long, env = "QAIL_TYPEMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the canonical category names
    Categories,
    /// Show every category and its assigned coder
    Show,
    /// Cast values (JSON literals) as query parameters
    Dispatch {
        /// Parameter values, one JSON literal each
        #[arg(required = true)]
        values: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
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

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Categories => {
            for category in Category::ALL {
                println!("{}", category.name().cyan());
            }
            Ok(())
        }
        Commands::Show => {
            let map = load_map(cli)?;
            show_assignments(&map.all_assignments(), &cli.format);
            Ok(())
        }
        Commands::Dispatch { values } => {
            let map = load_map(cli)?;
            let params = values
                .iter()
                .map(|raw| {
                    serde_json::from_str::<serde_json::Value>(raw)
                        .map(Value::from)
                        .with_context(|| format!("invalid JSON value: {}", raw))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let encoded = typecast_params(&map, &params)?;
            show_params(&params, &encoded, &cli.format);
            Ok(())
        }
    }
}

fn load_map(cli: &Cli) -> anyhow::Result<TypeMapByCategory<RegistryMethods>> {
    let registry = CoderRegistry::builtin();
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => match TypeMapConfig::default_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => {
                if cli.verbose {
                    eprintln!("{}", "No configuration found, using an empty type map".dimmed());
                }
                return Ok(TypeMapByCategory::with_methods(RegistryMethods::new(registry)));
            }
        },
    };

    if cli.verbose {
        eprintln!("{} {}", "Config:".dimmed(), path.display());
    }
    let config = TypeMapConfig::load(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(config.build_with_registry(&registry)?)
}

fn show_assignments(assignments: &Assignments, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = assignments
                .iter()
                .map(|(name, slot)| {
                    let value = match slot {
                        Slot::Empty => serde_json::Value::Null,
                        other => serde_json::Value::String(other.describe()),
                    };
                    (name.to_string(), value)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&map).unwrap_or_default());
        }
        OutputFormat::Table => {
            println!("{:12} {}", "Category".white().bold(), "Coder".white().bold());
            println!("{}", "─".repeat(32).dimmed());
            for (name, slot) in assignments.iter() {
                let coder = match slot {
                    Slot::Empty => "nil".dimmed(),
                    Slot::Static(_) => slot.describe().green(),
                    Slot::Dynamic(_) => slot.describe().yellow(),
                };
                println!("{:12} {}", name.cyan(), coder);
            }
        }
    }
}

fn show_params(params: &[Value], encoded: &[Param], format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = params
                .iter()
                .zip(encoded)
                .enumerate()
                .map(|(i, (value, param))| {
                    serde_json::json!({
                        "position": i + 1,
                        "value": value.to_json(),
                        "category": value.category().map(Category::name),
                        "coder": param.coder,
                        "oid": param.oid,
                        "format": param.format,
                        "bytes": param.value.as_deref().map(hex),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        }
        OutputFormat::Table => {
            println!(
                "{:4} {:12} {:8} {:6} {}",
                "#".white().bold(),
                "Category".white().bold(),
                "Coder".white().bold(),
                "OID".white().bold(),
                "Bytes".white().bold()
            );
            println!("{}", "─".repeat(60).dimmed());
            for (i, (value, param)) in params.iter().zip(encoded).enumerate() {
                let category = value.category().map(Category::name).unwrap_or("-");
                let coder = match &param.coder {
                    Some(name) => name.green(),
                    None => "(text)".dimmed(),
                };
                let bytes = match &param.value {
                    Some(bytes) => hex(bytes),
                    None => "NULL".to_string(),
                };
                println!(
                    "{:4} {:12} {:8} {:6} {}",
                    i + 1,
                    category.cyan(),
                    coder,
                    param.oid,
                    bytes.yellow()
                );
            }
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
