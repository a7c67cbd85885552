//! Veilguard CLI
//!
//! Command-line access to PII redaction and placeholder restoration

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use veilguard_guardrails::{Guardrails, GuardrailsConfig, RedactionMap, restore_output};
use veilguard_pii::{RedactionState, RedactionStrategy};

#[derive(Parser)]
#[command(name = "veilguard")]
#[command(about = "Veilguard - keep PII out of LLM prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "VEILGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact every string in a JSON prompt-variable file
    Redact {
        /// JSON file with prompt variables
        #[arg(long)]
        input: PathBuf,

        /// Write the placeholder map to this file
        #[arg(long)]
        map_out: Option<PathBuf>,

        /// How detected spans are rewritten
        #[arg(long, value_enum, default_value_t = Strategy::Placeholder)]
        strategy: Strategy,

        /// Trailing characters left visible by the partial strategy
        #[arg(long, default_value = "4")]
        visible: usize,
    },
    /// List detected entity spans in a text file (values are not printed)
    Scan {
        #[arg(long)]
        input: PathBuf,
    },
    /// Restore placeholders in a text file from a saved map
    Restore {
        /// Placeholder map written by `redact --map-out`
        #[arg(long)]
        map: PathBuf,

        /// Text file with model output
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Placeholder,
    Mask,
    Partial,
}

impl Strategy {
    fn with_visible(self, visible: usize) -> RedactionStrategy {
        match self {
            Strategy::Placeholder => RedactionStrategy::Placeholder,
            Strategy::Mask => RedactionStrategy::Mask,
            Strategy::Partial => RedactionStrategy::Partial { visible },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let output = run(cli)?;
    println!("{}", output);

    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let config = load_config(cli.config.as_deref())?;
    let guardrails = Guardrails::from_config(&config)?;

    match cli.command {
        Commands::Redact {
            input,
            map_out,
            strategy,
            visible,
        } => {
            let contents = read(&input)?;
            let variables: serde_json::Value = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not valid JSON", input.display()))?;

            let mut state = RedactionState::new();
            let redacted = guardrails.engine().redact_tree_with(
                &variables,
                &mut state,
                strategy.with_visible(visible),
            )?;

            if let Some(path) = map_out {
                let map = serde_json::to_string_pretty(state.redaction_map())?;
                std::fs::write(&path, map)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(path = %path.display(), entries = state.redaction_map().len(), "Wrote redaction map");
            }

            Ok(serde_json::to_string_pretty(&redacted.value)?)
        }
        Commands::Scan { input } => {
            let text = read(&input)?;
            let lines: Vec<String> = guardrails
                .engine()
                .detect(&text)
                .iter()
                .map(|m| format!("{}\t{}..{}", m.entity, m.start, m.end))
                .collect();
            Ok(lines.join("\n"))
        }
        Commands::Restore { map, input } => {
            let map: RedactionMap = serde_json::from_str(&read(&map)?)
                .with_context(|| format!("{} is not a redaction map", map.display()))?;
            let text = read(&input)?;
            Ok(restore_output(&text, &map))
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GuardrailsConfig> {
    let mut config = match path {
        Some(path) => GuardrailsConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => GuardrailsConfig::default(),
    };
    config.merge_env();
    Ok(config)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
