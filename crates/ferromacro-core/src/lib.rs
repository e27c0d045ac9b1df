//! # Ferromacro Core
//!
//! Acquisition of Brazilian economic indicator series from public data
//! providers.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Indicator registry** mapping display names to a provider and code
//! - **Source adapters** for Yahoo Finance market data and the Banco Central
//!   do Brasil SGS API
//! - **Normalizer** shaping provider rows into a canonical [`TimeSeries`]
//! - **TTL cache** with at most one in-flight fetch per indicator
//! - **Acquisition facade** ([`IndicatorService`]) tying the above together
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance and BCB SGS adapters |
//! | [`cache`] | Per-indicator TTL cache and cache modes |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`clock`] | System and manual time sources |
//! | [`config`] | Acquisition settings and env overrides |
//! | [`data_source`] | Adapter trait and raw request/response types |
//! | [`domain`] | Time series, date windows, timestamps |
//! | [`error`] | Core error types |
//! | [`facade`] | `IndicatorService`, the public entry point |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Raw rows to canonical series |
//! | [`registry`] | Indicator definitions |
//! | [`retry`] | Retry and backoff for transient HTTP failures |
//! | [`source`] | Source kinds |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferromacro_core::{AcquisitionConfig, IndicatorService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = IndicatorService::builder()
//!         .with_config(AcquisitionConfig::from_env()?)
//!         .with_default_sources()
//!         .build()?;
//!
//!     let selic = service.get_indicator_series("Taxa Selic").await?;
//!     match selic.last() {
//!         Some(point) => println!("Selic {}: {:.2}", point.date, point.value),
//!         None => println!("Selic: data unavailable"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ IndicatorService│────▶│ Registry / Cache │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SeriesSource    │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ + retry/breaker  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Normalizer      │
//! │ (TimeSeries)    │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! The only error crossing the facade is
//! [`AcquisitionError::UnknownIndicator`]. Upstream faults are classified
//! inside the adapters and surface to callers as an empty series:
//!
//! ```rust
//! use ferromacro_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited | SourceErrorKind::Timeout => "try again later",
//!         SourceErrorKind::Unavailable | SourceErrorKind::Malformed => "data unavailable",
//!         SourceErrorKind::InvalidRequest | SourceErrorKind::Internal => "bug",
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod facade;
pub mod http_client;
pub mod normalize;
pub mod registry;
pub mod retry;
pub mod source;

// Adapter implementations
pub use adapters::{CentralBankAdapter, YahooAdapter};

// Caching
pub use cache::{CacheEntry, CacheLease, CacheMode, SeriesCache};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Time sources
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::AcquisitionConfig;

// Data source trait and types
pub use data_source::{RawRow, RawSeries, SeriesRequest, SeriesSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{DateWindow, SeriesPoint, TimeSeries, UtcDateTime, HISTORICAL_EPOCH};

// Error types
pub use error::{AcquisitionError, NormalizationError, ValidationError};

// Facade
pub use facade::{IndicatorService, IndicatorServiceBuilder};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Registry
pub use registry::{IndicatorDefinition, IndicatorRegistry, ProviderCode};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Source identifiers
pub use source::SourceKind;
