use serde::Serialize;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// One dated observation of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub value: f64,
}

impl SeriesPoint {
    pub const fn new(date: Date, value: f64) -> Self {
        Self { date, value }
    }
}

/// Canonical indicator series.
///
/// Points are strictly increasing by date and every value is finite. An empty
/// series means "no data currently available" and is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Caller guarantees the ordering and finiteness invariants.
    pub(crate) fn from_normalized(name: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.windows(2).all(|pair| pair[0].date < pair[1].date));
        debug_assert!(points.iter().all(|point| point.value.is_finite()));
        Self {
            name: name.into(),
            points,
        }
    }

    pub(crate) fn empty(name: impl Into<String>) -> Self {
        Self::from_normalized(name, Vec::new())
    }

    /// Indicator name the value column was renamed to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// First and last observation dates, `None` when empty.
    pub fn period(&self) -> Option<(Date, Date)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// The most recent `count` points.
    pub fn tail(&self, count: usize) -> &[SeriesPoint] {
        let skip = self.points.len().saturating_sub(count);
        &self.points[skip..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample() -> TimeSeries {
        TimeSeries::from_normalized(
            "Taxa Selic",
            vec![
                SeriesPoint::new(date!(2024 - 01 - 02), 11.65),
                SeriesPoint::new(date!(2024 - 01 - 03), 11.65),
                SeriesPoint::new(date!(2024 - 01 - 04), 11.40),
            ],
        )
    }

    #[test]
    fn summary_accessors_follow_point_order() {
        let series = sample();

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.period(),
            Some((date!(2024 - 01 - 02), date!(2024 - 01 - 04)))
        );
        assert_eq!(series.last().map(|point| point.value), Some(11.40));
        assert_eq!(series.tail(2).len(), 2);
        assert_eq!(series.tail(10).len(), 3);
    }

    #[test]
    fn empty_series_has_no_period() {
        let series = TimeSeries::empty("Ibovespa");
        assert!(series.is_empty());
        assert_eq!(series.period(), None);
        assert!(series.tail(5).is_empty());
    }

    #[test]
    fn serializes_dates_as_iso_strings() {
        let json = serde_json::to_value(sample()).expect("series serializes");
        assert_eq!(json["name"], "Taxa Selic");
        assert_eq!(json["points"][0]["date"], "2024-01-02");
        assert_eq!(json["points"][2]["value"], 11.40);
    }
}
