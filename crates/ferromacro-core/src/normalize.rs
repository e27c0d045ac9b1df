//! Raw adapter output → canonical [`TimeSeries`].

use crate::data_source::RawSeries;
use crate::domain::{SeriesPoint, TimeSeries};
use crate::NormalizationError;

/// Shapes `raw` into a series named `name`.
///
/// Keeps only the adapter's designated value column, drops rows whose value
/// is missing or non-finite and sorts by date. When a date repeats, the row
/// appearing last in `raw` wins.
///
/// # Errors
///
/// Returns [`NormalizationError`] when the designated column does not exist
/// or a row's width disagrees with the column list.
pub fn normalize(raw: &RawSeries, name: &str) -> Result<TimeSeries, NormalizationError> {
    let column = raw
        .columns()
        .iter()
        .position(|column| column == raw.value_column())
        .ok_or_else(|| NormalizationError::MissingColumn {
            column: raw.value_column().to_owned(),
        })?;

    let width = raw.columns().len();
    let mut points = Vec::with_capacity(raw.rows().len());
    for (index, row) in raw.rows().iter().enumerate() {
        if row.values.len() != width {
            return Err(NormalizationError::RowWidth {
                index,
                expected: width,
                found: row.values.len(),
            });
        }
        if let Some(value) = row.values[column].filter(|value| value.is_finite()) {
            points.push(SeriesPoint::new(row.date, value));
        }
    }

    // stable, so equal dates keep input order and the dedup below keeps the last
    points.sort_by_key(|point| point.date);
    let mut deduped: Vec<SeriesPoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(previous) if previous.date == point.date => *previous = point,
            _ => deduped.push(point),
        }
    }

    Ok(TimeSeries::from_normalized(name, deduped))
}
