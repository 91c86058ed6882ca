mod cli;
mod error_fmt;
mod monitor;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use sonar_core::AggregatedDistance;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

/// Config file missing, unreadable, or rejected by validation.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = real_main(cli) {
        tracing::error!(error = %e, "exiting with error");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // Health needs neither config nor hardware.
    if matches!(cli.cmd, Commands::Health) {
        if cli.json {
            println!("{}", serde_json::json!({ "status": "ok" }));
        } else {
            println!("ok");
        }
        return Ok(());
    }

    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run { iterations, stats } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let run_stats = monitor::run_monitor(&cfg, iterations, shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "iterations": run_stats.iterations,
                        "transitions": run_stats.transitions,
                        "notify_failures": run_stats.notify_failures,
                        "undetermined": run_stats.undetermined,
                        "final_state": run_stats.final_state.as_str(),
                    })
                );
            } else if stats {
                monitor::print_stats(&run_stats);
            }
        }
        Commands::Measure { count } => {
            let reading = monitor::measure(&cfg, count)?;
            match (cli.json, reading) {
                (true, AggregatedDistance::Cm(cm)) => {
                    println!("{}", serde_json::json!({ "distance_cm": cm }));
                }
                (true, AggregatedDistance::Undetermined) => {
                    println!("{}", serde_json::json!({ "distance_cm": null }));
                }
                (false, AggregatedDistance::Cm(cm)) => println!("distance_cm: {cm:.1}"),
                (false, AggregatedDistance::Undetermined) => println!("undetermined"),
            }
        }
        Commands::SelfCheck => {
            monitor::self_check(&cfg)?;
            println!("OK");
        }
        Commands::Health => {}
    }
    Ok(())
}

fn load_config(path: &Path) -> eyre::Result<sonar_config::Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("read {}: {e}", path.display())))?;
    let cfg = sonar_config::load_toml(&text)
        .map_err(|e| ConfigError(format!("parse {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| ConfigError(e.to_string()))?;
    Ok(cfg)
}

/// Console layer on stderr (pretty or JSON), plus an optional JSON-lines file.
///
/// Level precedence: `RUST_LOG`, then `--log-level`, then `[logging].level`.
fn init_tracing(
    json: bool,
    level: Option<&str>,
    logging: &sonar_config::Logging,
) -> eyre::Result<()> {
    let level = level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let pretty_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| ConfigError(format!("logging.file has no file name: {file}")))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    // A global subscriber may already be set (e.g. by a test harness).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}
