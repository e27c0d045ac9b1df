//! Rendering of command reports to stdout.

use std::io::{self, Write};

use ferromacro_core::UtcDateTime;
use time::macros::{format_description, offset};
use time::UtcOffset;

use crate::cli::OutputFormat;
use crate::commands::{IndicatorRow, Report, SeriesReport};
use crate::error::CliError;

/// America/Sao_Paulo has stayed on UTC−03:00 since DST ended in 2019.
const SAO_PAULO: UtcOffset = offset!(-3);

/// `dd/mm/yyyy HH:MM:SS` in São Paulo civil time.
pub fn sao_paulo_timestamp(at: UtcDateTime) -> String {
    at.to_offset(SAO_PAULO)
        .format(format_description!(
            "[day]/[month]/[year] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| at.format_rfc3339())
}

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut out, report)?;
            } else {
                serde_json::to_writer(&mut out, report)?;
            }
            writeln!(out)?;
        }
        OutputFormat::Table => write_table(&mut out, report)?,
    }
    out.flush()?;
    Ok(())
}

fn write_table(out: &mut impl Write, report: &Report) -> io::Result<()> {
    match report {
        Report::Indicators { indicators } => write_indicators(out, indicators),
        Report::Series { series } => {
            for (position, report) in series.iter().enumerate() {
                if position > 0 {
                    writeln!(out)?;
                }
                write_series(out, report)?;
            }
            Ok(())
        }
    }
}

fn write_indicators(out: &mut impl Write, rows: &[IndicatorRow]) -> io::Result<()> {
    let name_width = rows
        .iter()
        .map(|row| row.name.chars().count())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or_default();
    let label_width = rows
        .iter()
        .map(|row| row.source_label.chars().count())
        .chain(std::iter::once("SOURCE".len()))
        .max()
        .unwrap_or_default();

    writeln!(out, "{:name_width$}  {:label_width$}  {:>8}  UNIT", "NAME", "SOURCE", "CODE")?;
    for row in rows {
        writeln!(
            out,
            "{:name_width$}  {:label_width$}  {:>8}  {}",
            row.name,
            row.source_label,
            row.code.to_string(),
            row.unit
        )?;
    }
    Ok(())
}

fn write_series(out: &mut impl Write, report: &SeriesReport) -> io::Result<()> {
    writeln!(out, "{} ({})", report.name, report.unit)?;
    writeln!(out, "  source:       {}", report.source_label)?;
    writeln!(out, "  last updated: {}", report.last_updated)?;

    if !report.available {
        writeln!(out, "  data unavailable")?;
        return Ok(());
    }

    if let Some(period) = &report.period {
        writeln!(out, "  period:       {} → {}", period.start, period.end)?;
    }
    if let Some(last) = &report.last {
        writeln!(out, "  last value:   {} ({})", format_value(last.value), last.date)?;
    }
    writeln!(out, "  points:       {}", report.len)?;

    for point in &report.points {
        writeln!(out, "    {}  {:>14}", point.date, format_value(point.value))?;
    }
    Ok(())
}

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}
