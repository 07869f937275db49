use actas_core::config::Config;
use actas_core::extract::{PdfExtractor, TextExtractor};
use actas_core::source::{CachingSource, HttpSource};
use actas_core::{Controller, YearStore, parser};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "actas")]
#[command(about = "Senate voting record scraper", long_about = None)]
struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch voting records in id order and append them to the yearly JSON files
    Run {
        /// First identifier to attempt
        #[arg(long)]
        start_id: Option<u64>,

        /// Last identifier to attempt
        #[arg(long)]
        end_id: Option<u64>,

        /// Consecutive failures before stopping
        #[arg(long)]
        threshold: Option<u32>,

        /// Directory holding the yearly JSON files
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Parse one local record (.pdf or plain text) and print it as JSON
    Parse {
        file: PathBuf,
    },
    /// Report reconciliation mismatches for every stored record
    Check,
    /// Export canonical JSON Schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for the stored record types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Run {
            start_id,
            end_id,
            threshold,
            output_dir,
        } => {
            if let Some(start_id) = start_id {
                config.run.start_id = start_id;
            }
            if end_id.is_some() {
                config.run.end_id = end_id;
            }
            if let Some(threshold) = threshold {
                config.run.failure_threshold = threshold;
            }
            if let Some(output_dir) = output_dir {
                config.store.output_dir = output_dir;
            }
            config.validate()?;
            run(&config)
        }
        Commands::Parse { file } => parse_file(&file),
        Commands::Check => check(&config),
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
    }
}

fn run(config: &Config) -> Result<()> {
    let store = YearStore::load(config.store.clone(), config.run.year_range());
    info!(
        loaded = store.len(),
        discarded_years = ?store.discarded_years(),
        "year store ready"
    );

    let http = HttpSource::new(&config.source).context("building HTTP client")?;
    let source = CachingSource::new(http, &config.source.cache_dir, config.source.reuse_cache);
    let mut controller = Controller::new(source, PdfExtractor, store, &config.run);

    let summary = controller.run();
    println!(
        "halted at {}: stored {}, unavailable {}, no text {}, missing date {}, mismatched {}, persist faults {}",
        summary.final_cursor,
        summary.stored,
        summary.unavailable,
        summary.no_text,
        summary.missing_date,
        summary.mismatched,
        summary.persist_faults,
    );
    Ok(())
}

fn parse_file(path: &Path) -> Result<()> {
    let text = if is_pdf(path) {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        PdfExtractor.extract(&bytes)?
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };

    let act = parser::parse(&text);
    for mismatch in parser::reconcile(&act) {
        warn!(%mismatch, "reconciliation mismatch");
    }
    println!("{}", serde_json::to_string_pretty(&act)?);
    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn check(config: &Config) -> Result<()> {
    let store = YearStore::load(config.store.clone(), config.run.year_range());
    let mut flagged = 0usize;
    for (year, acts) in store.years() {
        for act in acts {
            for mismatch in parser::reconcile(act) {
                println!("{year} act {}: {mismatch}", act.act_id);
                flagged += 1;
            }
        }
    }
    println!(
        "checked {} records, {} mismatches, {} unreadable year files",
        store.len(),
        flagged,
        store.discarded_years().len()
    );
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let act_schema = schema_for!(actas_core::schema::VotingAct);
    let act_json = serde_json::to_string_pretty(&act_schema)?;
    fs::write(out_dir.join("VotingAct.schema.json"), act_json)?;

    let entry_schema = schema_for!(actas_core::schema::VoteEntry);
    let entry_json = serde_json::to_string_pretty(&entry_schema)?;
    fs::write(out_dir.join("VoteEntry.schema.json"), entry_json)?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
