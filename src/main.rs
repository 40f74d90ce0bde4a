use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use metronome_core::{Meter, MetricalDuration, Structure, Tempo};
use metronome_score::{Node, ParserOptions, ScoreParser};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

mod clicks;

#[derive(Parser)]
#[command(name = "metronome")]
#[command(about = "Meters, tempo changes and click times of a score", long_about = None)]
struct Cli {
    /// Quarter notes per minute until the score sets a tempo
    #[arg(long, global = true, default_value = "60")]
    default_tempo: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a score parses
    Validate {
        /// Path to a .yaml or .json score
        score: PathBuf,
    },
    /// List the meters of a score with their offsets
    Meters {
        /// Path to a .yaml or .json score
        score: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show when every beat of a score sounds
    Clicks {
        /// Path to a .yaml or .json score
        score: PathBuf,

        /// Show at most this many clicks
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Serialize)]
struct MeterRow<'a> {
    bar: usize,
    offset: MetricalDuration,
    meter: &'a Meter,
    seconds: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let default_tempo = Tempo::try_new(cli.default_tempo, 4)
        .filter(Tempo::is_respellable)
        .with_context(|| format!("Default tempo out of range: {}", cli.default_tempo))?;
    let options = ParserOptions { default_tempo };

    match cli.command {
        Commands::Validate { score } => {
            let structure = parse_file(&score, options)?;
            println!(
                "✓ Score is valid: {} meters, {} tempo events, {:.3}s",
                structure.meters().len(),
                structure.tempi().len(),
                structure.seconds_at(structure.total_duration())
            );
            Ok(())
        }
        Commands::Meters { score, format } => {
            let structure = parse_file(&score, options)?;
            let rows: Vec<MeterRow> = structure
                .meter_offsets()
                .enumerate()
                .map(|(index, (offset, meter))| MeterRow {
                    bar: index + 1,
                    offset,
                    meter,
                    seconds: structure.seconds_at(offset),
                })
                .collect();

            match format.as_str() {
                "json" => {
                    let json = serde_json::to_string_pretty(&rows)?;
                    println!("{}", json);
                }
                _ => {
                    println!("Meters: {}", rows.len());
                    for row in &rows {
                        println!(
                            "  [{}] {:>8} at {} ({:.3}s)",
                            row.bar,
                            row.meter.to_string(),
                            row.offset,
                            row.seconds
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Clicks { score, limit, format } => {
            let structure = parse_file(&score, options)?;
            let clicks: Vec<clicks::Click> = clicks::schedule(&structure)
                .take(limit.unwrap_or(usize::MAX))
                .collect();

            match format.as_str() {
                "json" => {
                    let json = serde_json::to_string_pretty(&clicks)?;
                    println!("{}", json);
                }
                _ => {
                    println!("Clicks: {}", clicks.len());
                    for click in &clicks {
                        println!("{}", click);
                    }
                }
            }
            Ok(())
        }
    }
}

/// Read a score file, decoding it as JSON or YAML by extension
fn load_score(path: &Path) -> Result<Node> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read score '{}'", path.display()))?;

    let node = match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => {
            let value: serde_json::Value = serde_json::from_str(&source)
                .with_context(|| format!("'{}' is not valid JSON", path.display()))?;
            Node::from(value)
        }
        _ => {
            let value: serde_yaml::Value = serde_yaml::from_str(&source)
                .with_context(|| format!("'{}' is not valid YAML", path.display()))?;
            Node::from(value)
        }
    };
    debug!("Loaded {}: {}", path.display(), node);
    Ok(node)
}

fn parse_file(path: &Path, options: ParserOptions) -> Result<Structure> {
    let document = load_score(path)?;
    let parsed = ScoreParser::new(document).and_then(|parser| parser.with_options(options).parse());

    match parsed {
        Ok(structure) => {
            info!(
                "Parsed {}: {} meters, {} tempo events",
                path.display(),
                structure.meters().len(),
                structure.tempi().len()
            );
            Ok(structure)
        }
        Err(e) => {
            eprintln!("✗ Parse error: {}", e);
            std::process::exit(1);
        }
    }
}
