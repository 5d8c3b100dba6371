#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use clap::Parser;
use eframe::egui;
use idrac_dashboard::app::IdracDashboard;
use idrac_dashboard::config::default_config_path;
use idrac_dashboard::{Config, load_config};
use std::path::PathBuf;
use tr::{tr, tr_init};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Dell iDRAC server monitoring dashboard")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the monitoring backend
    #[arg(long)]
    api_url: Option<String>,

    /// Seconds between automatic refreshes
    #[arg(long)]
    refresh_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

/// Picks the explicit config file, then the per-user one, then defaults,
/// and applies command-line overrides on top.
fn resolve_config(args: &Args) -> idrac_dashboard::Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_config(&path)?,
            _ => Config::default(),
        },
    };

    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(secs) = args.refresh_interval {
        config.refresh_interval_seconds = secs;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = resolve_config(&args)?;
    tracing::info!("Using backend {}", config.api_url);

    tr_init!("./locales");

    let app = IdracDashboard::spawn(&config)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(tr!("Dell iDRAC Monitoring"))
            .with_inner_size([1200.0, 800.0])
            .with_resizable(true),
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    eframe::run_native(
        "idrac_dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from([
            "idrac_dashboard",
            "--config",
            "/nonexistent/but/unused.json",
            "--api-url",
            "http://backend:9000",
        ]);
        assert_eq!(args.api_url.as_deref(), Some("http://backend:9000"));
        assert_eq!(args.log_level, tracing::Level::INFO);
        // An explicit config path must exist
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_resolve_config_from_file_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_url": "http://from-file:8000"}"#).unwrap();

        let args = Args::parse_from([
            "idrac_dashboard",
            "--config",
            path.to_str().unwrap(),
            "--refresh-interval",
            "15",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.api_url, "http://from-file:8000");
        assert_eq!(config.refresh_interval_seconds, 15);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args = Args::parse_from([
            "idrac_dashboard",
            "--api-url",
            "http://127.0.0.1:8000",
            "--refresh-interval",
            "0",
        ]);
        assert!(resolve_config(&args).is_err());
    }
}
