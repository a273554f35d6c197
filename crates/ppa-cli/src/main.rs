//! PPA CLI - Command-line interface
//!
//! Usage:
//!   ppa extract <document.json> [--config ppa.toml] [--disable RULE]...
//!   ppa rules

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ppa_core::{AnnotatedDocument, AppConfig, Document, LoggingConfig};
use ppa_extractor::{RelationExtractor, SubsumptionExtractor};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ppa")]
#[command(about = "Subsumption extraction for annotated privacy policies")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract subsumption relations from an annotated document
    Extract {
        /// Annotated document (JSON)
        path: PathBuf,
        /// Skip a built-in rule (repeatable)
        #[arg(long = "disable")]
        disabled: Vec<String>,
    },
    /// List the active extraction rules
    Rules,
}

/// One output line per extracted edge
#[derive(Serialize)]
struct EdgeRecord<'a> {
    relation: &'a str,
    source: usize,
    target: usize,
    source_text: String,
    target_text: String,
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_override()?)
}

fn entity_text(document: &Document, position: usize) -> String {
    document
        .entity_of_token(position)
        .and_then(|id| document.entity_text(id))
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Extract { path, disabled } => {
            config.extractor.disabled_rules.extend(disabled);
            let extractor = SubsumptionExtractor::from_config(&config.extractor)?;

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let annotated: AnnotatedDocument = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            let mut document = Document::from_annotated(annotated)?;

            tracing::info!(
                path = %path.display(),
                sentences = document.sentences().len(),
                entities = document.entities().len(),
                "Extracting relations"
            );
            extractor.annotate(&mut document);

            for edge in document.relations().edges() {
                let record = EdgeRecord {
                    relation: edge.relation.as_str(),
                    source: edge.source,
                    target: edge.target,
                    source_text: entity_text(&document, edge.source),
                    target_text: entity_text(&document, edge.target),
                };
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Rules => {
            let extractor = SubsumptionExtractor::from_config(&config.extractor)?;
            for name in extractor.rule_names() {
                println!("{name}");
            }
        }
    }

    Ok(())
}
