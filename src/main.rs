//! fipe-export main entry point
//!
//! This is the command-line interface for the FIPE price table exporter.

use clap::Parser;
use fipe_export::api::{parse_vehicle_type, KNOWN_VEHICLE_TYPES};
use fipe_export::config::{default_config, load_config_with_hash, Config};
use fipe_export::walker::{export, print_summary};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// fipe-export: FIPE price table exporter
///
/// Walks every brand, model and year of a vehicle type in the FIPE API and
/// writes the prices to one spreadsheet per brand/model.
#[derive(Parser, Debug)]
#[command(name = "fipe-export")]
#[command(version)]
#[command(about = "Exports FIPE vehicle prices to spreadsheets", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Vehicle type to export (carros, motos or caminhoes); prompted if absent
    #[arg(short = 't', long, value_name = "TYPE")]
    vehicle_type: Option<String>,

    /// Directory to write spreadsheets to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration without contacting the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => default_config()?,
    };

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }

    let raw_vehicle_type = match cli
        .vehicle_type
        .clone()
        .or_else(|| config.walker.vehicle_type.clone())
    {
        Some(value) => value,
        None if cli.dry_run => "<prompt>".to_string(),
        None => prompt_vehicle_type()?,
    };

    if cli.dry_run {
        handle_dry_run(&config, &raw_vehicle_type);
        return Ok(());
    }

    let vehicle_type = parse_vehicle_type(&raw_vehicle_type)?;
    handle_export(&config, &vehicle_type, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fipe_export=info,warn"),
            1 => EnvFilter::new("fipe_export=debug,info"),
            2 => EnvFilter::new("fipe_export=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Asks the operator for the vehicle type on stdin
fn prompt_vehicle_type() -> std::io::Result<String> {
    print!("Vehicle type ({}): ", KNOWN_VEHICLE_TYPES.join(", "));
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Handles the --dry-run mode: prints what would be exported
fn handle_dry_run(config: &Config, vehicle_type: &str) {
    println!("=== fipe-export Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  User agent: {}", config.api.user_agent);
    println!(
        "  Timeout: {}s (connect {}s)",
        config.api.timeout_secs, config.api.connect_timeout_secs
    );
    println!(
        "  Retries: {} ({}ms apart)",
        config.api.max_retries, config.api.retry_delay_ms
    );

    println!("\nWalker:");
    println!("  Vehicle type: {}", vehicle_type);
    println!(
        "  Max concurrent brands: {}",
        config.walker.max_concurrent_brands
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Handles the main export operation
async fn handle_export(
    config: &Config,
    vehicle_type: &str,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Exporting '{}' from {} into {}",
        vehicle_type,
        config.api.base_url,
        config.output.directory
    );

    match export(config, vehicle_type).await {
        Ok(summary) => {
            if !quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            Err(e.into())
        }
    }
}
