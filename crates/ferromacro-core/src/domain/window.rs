use std::fmt::{Display, Formatter};

use time::macros::date;
use time::{Date, Month};

use crate::ValidationError;

/// Default first date requested from every source (Plano Real).
pub const HISTORICAL_EPOCH: Date = date!(1994-07-01);

/// Inclusive calendar-date range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: Date,
    end: Date,
}

impl DateWindow {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Resolves optional bounds against `today`.
    ///
    /// A missing end defaults to the day after `today` so a source running
    /// ahead of the local calendar still returns its latest observation.
    pub fn resolve(
        start: Option<Date>,
        end: Option<Date>,
        today: Date,
    ) -> Result<Self, ValidationError> {
        let start = start.unwrap_or(HISTORICAL_EPOCH);
        let end = end.unwrap_or_else(|| today.next_day().unwrap_or(today));
        Self::new(start, end)
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    /// Splits the window into consecutive sub-windows spanning at most
    /// `max_years` calendar years each.
    pub fn chunks(&self, max_years: i32) -> Vec<DateWindow> {
        let max_years = max_years.max(1);
        let mut chunks = Vec::new();
        let mut cursor = self.start;

        loop {
            let next = add_years(cursor, max_years);
            let chunk_end = match next.and_then(Date::previous_day) {
                Some(last) if last < self.end => last,
                _ => self.end,
            };
            chunks.push(DateWindow {
                start: cursor,
                end: chunk_end,
            });

            match next {
                Some(next) if chunk_end < self.end => cursor = next,
                _ => break,
            }
        }

        chunks
    }
}

impl Display for DateWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

fn add_years(date: Date, years: i32) -> Option<Date> {
    let year = date.year().checked_add(years)?;
    date.replace_year(year)
        .ok()
        .or_else(|| Date::from_calendar_date(year, Month::March, 1).ok())
}
