mod list;
mod series;

use std::time::Duration;

use ferromacro_core::{AcquisitionConfig, IndicatorService, ProviderCode, SeriesPoint};
use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Command output handed to the renderer.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Indicators { indicators: Vec<IndicatorRow> },
    Series { series: Vec<SeriesReport> },
}

/// One registry entry as listed by `ferromacro list`.
#[derive(Debug, Serialize)]
pub struct IndicatorRow {
    pub name: String,
    pub source: &'static str,
    pub source_label: &'static str,
    pub code: ProviderCode,
    pub unit: String,
}

/// One fetched indicator as printed by `ferromacro series`.
#[derive(Debug, Serialize)]
pub struct SeriesReport {
    pub name: String,
    pub unit: String,
    pub source_label: &'static str,
    /// RFC 3339 acquisition instant in UTC.
    pub fetched_at: String,
    /// `dd/mm/yyyy HH:MM:SS` in São Paulo civil time.
    pub last_updated: String,
    pub available: bool,
    pub len: usize,
    pub period: Option<Period>,
    pub last: Option<SeriesPoint>,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let service = build_service(cli)?;

    match &cli.command {
        Command::List => Ok(list::run(&service)),
        Command::Series(args) => series::run(args, service).await,
    }
}

fn build_service(cli: &Cli) -> Result<IndicatorService, CliError> {
    let mut config = AcquisitionConfig::from_env()?;
    if let Some(ttl_secs) = cli.ttl_secs {
        config = config.with_cache_ttl(Duration::from_secs(ttl_secs));
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_fetch_timeout(Duration::from_millis(timeout_ms));
    }

    Ok(IndicatorService::builder()
        .with_config(config)
        .with_default_sources()
        .build()?)
}
