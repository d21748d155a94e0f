//! ddl-sync CLI - mirror an Oracle catalog into SQL script files.

use clap::{Parser, Subcommand};
use ddl_sync::{
    Config, ConnectionManager, FileLogLayer, LocalFileStore, OdbcDriver, RunSummary, SyncEngine,
    SyncError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "ddl-sync")]
#[command(about = "Mirror Oracle schema DDL and sample data into SQL script files")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the script tree with the database
    Run,

    /// Test the database connection
    HealthCheck,

    /// Write a starter configuration file
    Init {
        /// Output path for configuration file [default: config.yaml]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();

    // Handle init command separately (doesn't need existing config)
    if let Commands::Init { output, force } = cli.command {
        let output_path = output.unwrap_or_else(|| PathBuf::from("config.yaml"));
        write_template(&output_path, force)?;
        println!("Configuration written to {}", output_path.display());
        return Ok(());
    }

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above
        Commands::Run => {
            let (file_layer, guard) = FileLogLayer::open(&config.log)?;
            setup_logging(&cli.verbosity, &cli.log_format, Some(file_layer))?;
            info!("Loaded configuration from {:?}", cli.config);

            info!("APP START");
            let result = sync(&config).await;
            if let Err(ref e) = result {
                error!(detail = %e.format_detailed(), "run failed");
            }
            info!("APP STOP");
            guard.finish()?;

            let summary = result?;
            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                print_summary(&summary);
            }
        }

        Commands::HealthCheck => {
            setup_logging(&cli.verbosity, &cli.log_format, None)?;
            let started = Instant::now();
            let conn = ConnectionManager::new(OdbcDriver::new());
            let result = match conn.open(config.connection.clone(), None).await {
                Ok(()) => conn.exec("SELECT 1 FROM DUAL").await.map(|_| ()),
                Err(e) => Err(e),
            };
            let latency_ms = started.elapsed().as_millis();
            conn.close().await?;

            if cli.output_json {
                let report = serde_json::json!({
                    "address": config.connection.address(),
                    "connected": result.is_ok(),
                    "latency_ms": latency_ms,
                    "error": result.as_ref().err().map(|e| e.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Oracle {}: {} ({}ms)",
                    config.connection.address(),
                    if result.is_ok() { "OK" } else { "FAILED" },
                    latency_ms
                );
                if let Err(ref e) = result {
                    println!("    Error: {}", e);
                }
            }
            result?;
        }
    }

    Ok(())
}

/// One sync run over a fresh connection.
async fn sync(config: &Config) -> Result<RunSummary, SyncError> {
    let conn = ConnectionManager::new(OdbcDriver::new());
    conn.open(config.connection.clone(), Some(config.session_init_script()))
        .await?;
    let result = SyncEngine::new(&conn, config, LocalFileStore).run().await;
    conn.close().await?;
    result
}

fn write_template(path: &Path, force: bool) -> Result<(), SyncError> {
    if path.exists() && !force {
        return Err(SyncError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, Config::template())?;
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\nSync completed!");
    println!("  Duration: {:.2}s", summary.duration_seconds);
    println!("  Schemas: {}", summary.schemas);
    println!("  Processed: {}", summary.processed);
    println!("  Created: {}", summary.inserted);
    println!("  Updated: {}", summary.updated);
    println!("  No changes: {}", summary.unchanged);
    println!("  Ignored: {}", summary.ignored);
    if summary.errors > 0 {
        println!("  Errors: {} (see the error log)", summary.errors);
    }
}

fn setup_logging(
    verbosity: &str,
    format: &str,
    file_layer: Option<FileLogLayer>,
) -> Result<(), SyncError> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let registry = tracing_subscriber::registry().with(level).with(file_layer);
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if format == "json" {
        registry.with(console.json()).try_init()
    } else {
        registry.with(console).try_init()
    };
    installed.map_err(|e| SyncError::Logging(e.to_string()))
}
