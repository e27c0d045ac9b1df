use std::sync::Arc;

use ferromacro_core::{CacheEntry, CacheMode, IndicatorDefinition, IndicatorService};
use tokio::task::JoinSet;

use crate::cli::SeriesArgs;
use crate::error::CliError;
use crate::output::sao_paulo_timestamp;

use super::{Period, Report, SeriesReport};

pub async fn run(args: &SeriesArgs, service: IndicatorService) -> Result<Report, CliError> {
    // unknown names fail before any request goes out
    let definitions = args
        .names
        .iter()
        .map(|name| service.definition(name).cloned())
        .collect::<Result<Vec<_>, _>>()?;

    let mode = if args.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    };

    let service = Arc::new(service);
    let mut fetches = JoinSet::new();
    for (position, definition) in definitions.iter().enumerate() {
        let service = Arc::clone(&service);
        let name = definition.name.clone();
        fetches.spawn(async move { (position, service.acquire(&name, mode).await) });
    }

    let mut entries: Vec<Option<CacheEntry>> = vec![None; definitions.len()];
    while let Some(joined) = fetches.join_next().await {
        let (position, entry) =
            joined.map_err(|error| CliError::Command(format!("fetch task failed: {error}")))?;
        entries[position] = Some(entry?);
    }

    let series = definitions
        .iter()
        .zip(entries)
        .map(|(definition, entry)| {
            entry
                .map(|entry| build_report(definition, entry, args.tail))
                .ok_or_else(|| {
                    CliError::Command(format!("no result for indicator '{}'", definition.name))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Report::Series { series })
}

fn build_report(
    definition: &IndicatorDefinition,
    entry: CacheEntry,
    tail: Option<usize>,
) -> SeriesReport {
    let series = entry.series;
    let points = match tail {
        Some(count) => series.tail(count).to_vec(),
        None => series.points().to_vec(),
    };

    SeriesReport {
        name: definition.name.clone(),
        unit: definition.unit.clone(),
        source_label: definition.source_kind.provider_label(),
        fetched_at: entry.fetched_at.format_rfc3339(),
        last_updated: sao_paulo_timestamp(entry.fetched_at),
        available: !series.is_empty(),
        len: series.len(),
        period: series.period().map(|(start, end)| Period {
            start: start.to_string(),
            end: end.to_string(),
        }),
        last: series.last().copied(),
        points,
    }
}
