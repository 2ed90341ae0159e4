//! Glycorisk: explainable diabetes risk assessment.
//!
//! Command-line entry point. Reports go to stdout as JSON, logs to stderr
//! or a file.

mod cli;

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glycorisk::adapters::sanitize::SanitizingMakeWriter;
use glycorisk::config::LogMode;
use glycorisk::domain::{risk_profiles, ImportanceTable, DISCLAIMER};
use glycorisk::{EngineConfig, EngineError, RawPatientInput, RiskEngine};

use cli::{Cli, Commands};

const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_UNAVAILABLE: u8 = 3;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs never go to stdout, which carries the report.
    let (writer, _guard) = match LogMode::from_env() {
        LogMode::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let config = EngineConfig::from_env();

    match cli.command {
        Commands::Assess {
            input,
            model,
            pretty,
        } => {
            let config = match model {
                Some(path) => config.with_model_path(path),
                None => config,
            };
            assess(&config, input.as_deref(), pretty)
        }
        Commands::Importance => {
            let table = match &config.importance_path {
                Some(path) => ImportanceTable::from_json_file(path),
                None => ImportanceTable::bundled(),
            }
            .context("loading importance table")?;

            let rows: Vec<_> = table
                .entries()
                .iter()
                .map(|e| json!({ "feature": e.name(), "label": e.label(), "score": e.score }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Profiles => {
            println!("{}", serde_json::to_string_pretty(&risk_profiles())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading input {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn assess(config: &EngineConfig, input: Option<&std::path::Path>, pretty: bool) -> Result<ExitCode> {
    let text = read_input(input)?;
    let raw: RawPatientInput = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Input must be a JSON object of patient fields: {e}");
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let result = RiskEngine::from_config(config).and_then(|engine| engine.assess(&raw));
    match result {
        Ok(report) => {
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");
            eprintln!("{DISCLAIMER}");
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::Validation(e)) => {
            eprintln!("Invalid patient input:");
            for violation in e.violations() {
                eprintln!("  - {violation}");
            }
            Ok(ExitCode::from(EXIT_INVALID_INPUT))
        }
        Err(e) => {
            tracing::error!("Assessment failed: {}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::from(EXIT_UNAVAILABLE))
        }
    }
}
