//! The `stencil` command line.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use stencil::logger::{init_tracing, Logger};
use stencil::{load_manifest, render_error, run_manifest, RunConfig};

/// Run template manifests against a project.
#[derive(Parser)]
#[command(name = "stencil", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory the template applies to.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Ask for missing values on the terminal.
    #[arg(long, global = true, env = "STENCIL_INTERACTIVE")]
    interactive: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "STENCIL_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a manifest.
    Run {
        /// Path or URL of the manifest.
        manifest: String,

        /// Option value, as `name=value`. Repeatable.
        #[arg(short, long = "option", value_name = "NAME=VALUE")]
        options: Vec<String>,
    },

    /// Parse a manifest and list its options and steps without running it.
    Check {
        /// Path or URL of the manifest.
        manifest: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = RunConfig::for_project(&cli.project)?
        .with_interactive(cli.interactive)
        .with_json_logs(cli.json_logs);
    init_tracing(config.json_logs);

    let logger = Logger::new();

    let outcome = match &cli.command {
        Commands::Run { manifest, options } => {
            let values = parse_options(options)?;
            logger.info(&format!("running {manifest}"));
            run_manifest(&config, manifest, &values).await
        }
        Commands::Check { manifest } => check(&config, manifest).await,
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            logger.log_failure(&error);
            eprint!("{}", render_error(&error));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn parse_options(raw: &[String]) -> Result<Map<String, Value>> {
    let mut values = Map::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once('=') else {
            bail!("option `{entry}` must be written as NAME=VALUE");
        };
        values.insert(name.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(values)
}

async fn check(config: &RunConfig, reference: &str) -> stencil::context::Result<()> {
    let manifest = load_manifest(config, reference).await?;
    let document = &manifest.value;

    println!("{}", document.title.as_deref().unwrap_or(manifest.url.as_str()));
    if let Some(description) = &document.description {
        println!("{description}");
    }

    if !document.options.is_empty() {
        println!("\noptions:");
        for (name, option) in &document.options {
            let marker = if option.required { " (required)" } else { "" };
            let description = option.description.as_deref().unwrap_or("");
            println!("  {name}: {}{marker} {description}", option.kind);
        }
    }

    println!("\nsteps:");
    for (index, action) in document.actions.iter().enumerate() {
        match &action.source {
            Some(location) => println!("  {}. {} (line {})", index + 1, action.name, location.start.line),
            None => println!("  {}. {}", index + 1, action.name),
        }
    }

    Ok(())
}
