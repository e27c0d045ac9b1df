//! Source adapter contract and raw request/response types.
//!
//! Each upstream provider implements [`SeriesSource`]. Adapters resolve
//! transport faults themselves: a timeout, a bad status or an unparseable body
//! comes back as an empty [`RawSeries`], never as an error. The `Err` arm is
//! reserved for faults the adapter did not expect (a provider code of the
//! wrong shape, a bug), which the facade logs and caches as empty.
//!
//! # Example
//!
//! ```rust,ignore
//! use ferromacro_core::{DateWindow, ProviderCode, SeriesRequest, SeriesSource, CentralBankAdapter};
//!
//! async fn selic(adapter: &CentralBankAdapter) {
//!     let window = DateWindow::resolve(None, None, time::OffsetDateTime::now_utc().date())?;
//!     let request = SeriesRequest::new(ProviderCode::SeriesCode(4189), window);
//!     let raw = adapter.fetch(request).await?;
//!     println!("{} rows", raw.rows().len());
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{DateWindow, ProviderCode, SourceKind};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    Malformed,
    InvalidRequest,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Faults an adapter answers with "no data" instead of an error.
    pub const fn is_degradable(&self) -> bool {
        matches!(
            self.kind,
            SourceErrorKind::Unavailable
                | SourceErrorKind::RateLimited
                | SourceErrorKind::Timeout
                | SourceErrorKind::Malformed
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload handed to a source adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub code: ProviderCode,
    pub window: DateWindow,
}

impl SeriesRequest {
    pub fn new(code: ProviderCode, window: DateWindow) -> Self {
        Self { code, window }
    }
}

/// One raw row; `values` lines up with [`RawSeries::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: Date,
    pub values: Vec<Option<f64>>,
}

/// Provider-shaped table before normalization.
///
/// Rows may be unsorted, repeat dates or hold missing values. The adapter
/// names the column that carries the indicator value.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    columns: Vec<String>,
    value_column: String,
    rows: Vec<RawRow>,
}

impl RawSeries {
    pub fn new<I, S>(columns: I, value_column: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            value_column: value_column.into(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, date: Date, values: Vec<Option<f64>>) {
        self.rows.push(RawRow { date, values });
    }

    pub fn with_row(mut self, date: Date, values: Vec<Option<f64>>) -> Self {
        self.push_row(date, values);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn extend(&mut self, other: RawSeries) {
        self.rows.extend(other.rows);
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<RawSeries, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the facade shares one instance per
/// [`SourceKind`] across concurrent requests and runs each fetch on its own
/// task.
pub trait SeriesSource: Send + Sync {
    /// Provider family this adapter serves.
    fn kind(&self) -> SourceKind;

    /// Fetches the raw series for `req.code` over `req.window`.
    ///
    /// # Errors
    ///
    /// Only for faults outside the adapter's contract, e.g. a
    /// [`ProviderCode`] variant the adapter does not understand. Transport,
    /// status and parse failures resolve to an empty [`RawSeries`].
    fn fetch<'a>(&'a self, req: SeriesRequest) -> FetchFuture<'a>;
}

/// Folds degradable failures into an empty series and logs them.
pub(crate) fn degrade_to_empty(
    kind: SourceKind,
    code: &ProviderCode,
    result: Result<RawSeries, SourceError>,
    empty: impl FnOnce() -> RawSeries,
) -> Result<RawSeries, SourceError> {
    match result {
        Err(error) if error.is_degradable() => {
            tracing::warn!(
                source = %kind,
                code = %code,
                error = %error,
                "source returned no data"
            );
            Ok(empty())
        }
        other => other,
    }
}
