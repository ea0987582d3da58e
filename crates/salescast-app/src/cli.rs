//! CLI argument definitions for the Salescast client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use salescast_core::types::DateRange;

/// Salescast: sales forecast reports and an assistant to question them.
#[derive(Parser, Debug)]
#[command(name = "salescast", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the forecast service.
    #[arg(short = 'u', long = "api-url")]
    pub api_url: Option<String>,

    /// Directory for downloaded reports.
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the products the service can forecast.
    Products,
    /// Show the span of available historical data.
    Dates,
    /// Generate a report and optionally ask questions about it.
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Product to report on; must be one the service lists. Defaults to the first listed.
    #[arg(short = 'p', long = "product")]
    pub product: Option<String>,

    /// Start of the historical summary range (YYYY-MM-DD).
    #[arg(long = "from")]
    pub from: Option<NaiveDate>,

    /// End of the historical summary range (YYYY-MM-DD).
    #[arg(long = "to")]
    pub to: Option<NaiveDate>,

    /// Start of the custom forecast range (YYYY-MM-DD).
    #[arg(long = "forecast-from")]
    pub forecast_from: Option<NaiveDate>,

    /// End of the custom forecast range (YYYY-MM-DD).
    #[arg(long = "forecast-to")]
    pub forecast_to: Option<NaiveDate>,

    /// Write the report archive and custom forecast CSV to the output directory.
    #[arg(long = "save")]
    pub save: bool,

    /// Ask questions about the report interactively afterwards.
    #[arg(long = "chat")]
    pub chat: bool,
}

impl ReportArgs {
    pub fn summary_range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }

    pub fn forecast_range(&self) -> DateRange {
        DateRange::new(self.forecast_from, self.forecast_to)
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SALESCAST_CONFIG env var > ~/.salescast/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SALESCAST_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL.
    ///
    /// Priority: --api-url flag > SALESCAST_API_URL env var > config file value.
    pub fn resolve_api_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.api_url {
            return url.clone();
        }
        match std::env::var("SALESCAST_API_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => config_url.to_string(),
        }
    }

    /// Resolve the download directory.
    ///
    /// Priority: --output-dir flag > config file value.
    pub fn resolve_output_dir(&self, config_dir: &str) -> PathBuf {
        match self.output_dir {
            Some(ref dir) => dir.clone(),
            None => PathBuf::from(config_dir),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value. `RUST_LOG`, when set,
    /// takes precedence over both in the subscriber.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".salescast").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".salescast").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_with_ranges() {
        let args = CliArgs::try_parse_from([
            "salescast",
            "report",
            "--product",
            "M01AB",
            "--from",
            "2018-01-01",
            "--to",
            "2018-12-31",
            "--forecast-from",
            "2020-01-01",
            "--chat",
        ])
        .unwrap();

        let Command::Report(report) = args.command else {
            panic!("expected report command");
        };
        assert_eq!(report.product.as_deref(), Some("M01AB"));
        assert!(report.summary_range().bounds().is_some());
        // Only one forecast endpoint: the range is not sent.
        assert!(report.forecast_range().bounds().is_none());
        assert!(report.chat);
        assert!(!report.save);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let result = CliArgs::try_parse_from(["salescast", "report", "--from", "01/02/2018"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["salescast"]).is_err());
        assert!(matches!(
            CliArgs::try_parse_from(["salescast", "products"]).unwrap().command,
            Command::Products
        ));
    }

    #[test]
    fn test_flags_take_priority() {
        let args = CliArgs::try_parse_from([
            "salescast",
            "--config",
            "/tmp/salescast.toml",
            "--api-url",
            "http://localhost:8000",
            "--output-dir",
            "/tmp/out",
            "dates",
        ])
        .unwrap();

        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/salescast.toml"));
        assert_eq!(
            args.resolve_api_url("https://example.com"),
            "http://localhost:8000"
        );
        assert_eq!(args.resolve_output_dir("reports"), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_output_dir_falls_back_to_config() {
        let args = CliArgs::try_parse_from(["salescast", "dates"]).unwrap();
        assert_eq!(args.resolve_output_dir("reports"), PathBuf::from("reports"));
        assert!(args.resolve_log_level().is_none());
    }
}
