mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::pool::{Family, RegistryResolver};
use config::{load_config, ConfigSource};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stave")]
#[command(about = "Stave constant pool and hydration marker tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: Stave.toml found upward from the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect an exported constant pool
    Pool {
        #[command(subcommand)]
        action: PoolAction,
    },

    /// Run a render script through the marker encoder and print HTML
    Render {
        /// Path to a JSON array of render ops
        script: PathBuf,

        /// Coalesce adjacent text nodes before printing
        #[arg(long)]
        normalize: bool,

        /// Tag of remote insertion anchors
        #[arg(long)]
        anchor_tag: Option<String>,

        /// Attribute carrying the cursor id on remote insertion anchors
        #[arg(long)]
        anchor_attribute: Option<String>,
    },
}

#[derive(Subcommand)]
enum PoolAction {
    /// Print entry counts per family
    Inspect {
        /// Pool JSON file
        pool: PathBuf,
    },

    /// Print one entry as JSON
    Get {
        /// Pool JSON file
        pool: PathBuf,

        #[arg(value_enum)]
        family: Family,

        /// Operand value (handles and negatives start at 1)
        index: u32,
    },

    /// Resolve handle slots through a registry
    Resolve {
        /// Pool JSON file
        pool: PathBuf,

        /// JSON object mapping raw handles to values
        #[arg(short, long)]
        registry: PathBuf,

        /// Handle slots to resolve, in order
        #[arg(required = true)]
        handles: Vec<u32>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pool { action } => match action {
            PoolAction::Inspect { pool } => {
                let pool = commands::pool::load_pool(&pool)?;
                let stats = commands::pool::inspect(&pool);
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            PoolAction::Get { pool, family, index } => {
                let pool = commands::pool::load_pool(&pool)?;
                let value = commands::pool::get(&pool, family, index)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            PoolAction::Resolve {
                pool,
                registry,
                handles,
            } => {
                let pool = commands::pool::load_pool(&pool)?;
                let resolver = RegistryResolver::load(&registry)?;
                let report = commands::pool::resolve(pool, resolver, &handles)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        },
        Commands::Render {
            script,
            normalize,
            anchor_tag,
            anchor_attribute,
        } => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            let loaded = load_config(cli.config.as_deref(), &cwd)?;
            if let ConfigSource::File(path) = &loaded.source {
                log::info!("Using config {}", path.display());
            }

            let mut markers = loaded.config.markers;
            if let Some(tag) = anchor_tag {
                markers.anchor_tag = tag;
            }
            if let Some(attribute) = anchor_attribute {
                markers.anchor_attribute = attribute;
            }
            let normalize = normalize || loaded.config.render.normalize;

            let ops = commands::render::load_script(&script)?;
            let html = commands::render::render_ops(&ops, &markers, normalize)?;
            println!("{html}");
        }
    }

    Ok(())
}
