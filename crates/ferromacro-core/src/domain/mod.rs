//! # Domain Models
//!
//! Canonical domain types for ferromacro indicator data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TimeSeries`] | Date-indexed, null-free series produced by the normalizer |
//! | [`SeriesPoint`] | One dated observation |
//! | [`DateWindow`] | Inclusive calendar-date range requested from a source |
//! | [`UtcDateTime`] | UTC acquisition timestamp |
//!
//! A [`TimeSeries`] can only be built inside this crate, by
//! [`normalize`](crate::normalize::normalize). Callers receive it read-only.

mod series;
mod timestamp;
mod window;

pub use series::{SeriesPoint, TimeSeries};
pub use timestamp::UtcDateTime;
pub use window::{DateWindow, HISTORICAL_EPOCH};
