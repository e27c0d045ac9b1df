//! Acquisition facade: the single entry point presentation code calls.
//!
//! ```text
//! name ─▶ registry ─▶ cache lease ─┬─ fresh ──────────────────────────────▶ series
//!                                  └─ stale/missing ─▶ fetch task (owns lease)
//!                                       adapter (timeout) ─▶ normalize ─▶ store ─▶ series
//! ```
//!
//! Upstream faults never reach the caller. A timeout, an adapter error, a
//! panicking adapter task or a normalization failure all produce an empty
//! series that is cached like any other result.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::{CentralBankAdapter, YahooAdapter};
use crate::cache::{CacheEntry, CacheLease, CacheMode, SeriesCache};
use crate::clock::{Clock, SystemClock};
use crate::config::AcquisitionConfig;
use crate::data_source::{RawSeries, SeriesRequest, SeriesSource, SourceError};
use crate::normalize::normalize;
use crate::registry::{IndicatorDefinition, IndicatorRegistry};
use crate::{AcquisitionError, DateWindow, SourceKind, TimeSeries, ValidationError};

/// Registry-driven, cached access to indicator series.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self` and callers
/// for different indicators never wait on each other.
pub struct IndicatorService {
    registry: IndicatorRegistry,
    sources: HashMap<SourceKind, Arc<dyn SeriesSource>>,
    cache: SeriesCache,
    clock: Arc<dyn Clock>,
    config: AcquisitionConfig,
}

impl IndicatorService {
    pub fn builder() -> IndicatorServiceBuilder {
        IndicatorServiceBuilder::new()
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn indicators(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.registry.iter()
    }

    /// Definition for `name`, exposing its unit and source kind.
    pub fn definition(&self, name: &str) -> Result<&IndicatorDefinition, AcquisitionError> {
        self.registry
            .get(name)
            .ok_or_else(|| AcquisitionError::UnknownIndicator {
                name: name.to_owned(),
            })
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Series for `name`, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// [`AcquisitionError::UnknownIndicator`] when `name` is not registered.
    /// No I/O happens in that case.
    pub async fn get_indicator_series(&self, name: &str) -> Result<TimeSeries, AcquisitionError> {
        self.get_indicator_series_with(name, CacheMode::Use).await
    }

    /// Like [`get_indicator_series`](Self::get_indicator_series) with an
    /// explicit cache mode.
    pub async fn get_indicator_series_with(
        &self,
        name: &str,
        mode: CacheMode,
    ) -> Result<TimeSeries, AcquisitionError> {
        self.acquire(name, mode).await.map(|entry| entry.series)
    }

    /// Series together with the instant it was fetched.
    ///
    /// Holds the indicator's cache lease from the freshness check until the
    /// result is stored, so concurrent callers share one upstream fetch.
    pub async fn acquire(&self, name: &str, mode: CacheMode) -> Result<CacheEntry, AcquisitionError> {
        let definition = self.definition(name)?;
        let lease = self.cache.lease(&definition.name).await;

        if mode == CacheMode::Use {
            if let Some(entry) = lease.fresh_entry(self.clock.now(), self.config.cache_ttl) {
                tracing::debug!(
                    indicator = %definition.name,
                    fetched_at = %entry.fetched_at,
                    "serving cached series"
                );
                return Ok(entry.clone());
            }
        }

        let job = FetchJob {
            definition: definition.clone(),
            source: self.sources.get(&definition.source_kind).cloned(),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        };

        // the task owns the lease until the result is stored, even if this
        // caller is dropped mid-fetch
        match tokio::spawn(job.run(lease, mode)).await {
            Ok(entry) => Ok(entry),
            Err(join_error) => {
                tracing::error!(
                    indicator = %definition.name,
                    error = %join_error,
                    "acquisition task failed"
                );
                Ok(CacheEntry {
                    series: TimeSeries::empty(&definition.name),
                    fetched_at: self.clock.now(),
                })
            }
        }
    }
}

/// Fetch, normalize and store for one indicator, detached from the caller
/// that started it.
struct FetchJob {
    definition: IndicatorDefinition,
    source: Option<Arc<dyn SeriesSource>>,
    clock: Arc<dyn Clock>,
    config: AcquisitionConfig,
}

impl FetchJob {
    async fn run(self, mut lease: CacheLease, mode: CacheMode) -> CacheEntry {
        let series = self.fetch_series().await;
        let fetched_at = self.clock.now();

        if mode == CacheMode::Bypass {
            return CacheEntry { series, fetched_at };
        }

        tracing::debug!(
            indicator = %self.definition.name,
            points = series.len(),
            fetched_at = %fetched_at,
            "cached series"
        );
        lease.store(series, fetched_at).clone()
    }

    async fn fetch_series(&self) -> TimeSeries {
        let definition = &self.definition;
        let name = definition.name.as_str();

        let Some(source) = self.source.clone() else {
            tracing::warn!(
                indicator = name,
                source = %definition.source_kind,
                "no adapter registered for source"
            );
            return TimeSeries::empty(name);
        };

        let window = match DateWindow::resolve(
            Some(self.config.start_date),
            self.config.end_date,
            self.clock.today(),
        ) {
            Ok(window) => window,
            Err(error) => {
                tracing::warn!(indicator = name, error = %error, "cannot resolve date window");
                return TimeSeries::empty(name);
            }
        };

        let request = SeriesRequest::new(definition.provider_code.clone(), window);
        tracing::debug!(
            indicator = name,
            source = %definition.source_kind,
            code = %definition.provider_code,
            window = %window,
            "fetching series"
        );

        let raw = match self.run_fetch(source, request).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(
                    indicator = name,
                    source = %definition.source_kind,
                    code = %definition.provider_code,
                    error = %error,
                    "fetch failed, caching empty series"
                );
                return TimeSeries::empty(name);
            }
        };

        match normalize(&raw, name) {
            Ok(series) => {
                tracing::info!(
                    indicator = name,
                    source = %definition.source_kind,
                    points = series.len(),
                    "series acquired"
                );
                series
            }
            Err(error) => {
                tracing::warn!(
                    indicator = name,
                    error = %error,
                    "normalization failed, caching empty series"
                );
                TimeSeries::empty(name)
            }
        }
    }

    /// Runs one adapter call on its own task under the configured timeout.
    async fn run_fetch(
        &self,
        source: Arc<dyn SeriesSource>,
        request: SeriesRequest,
    ) -> Result<RawSeries, SourceError> {
        let mut handle = tokio::spawn(async move { source.fetch(request).await });

        match tokio::time::timeout(self.config.fetch_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "adapter task failed");
                Err(SourceError::internal(format!(
                    "adapter task failed: {join_error}"
                )))
            }
            Err(_) => {
                handle.abort();
                Err(SourceError::timeout(format!(
                    "adapter did not answer within {} ms",
                    self.config.fetch_timeout_ms()
                )))
            }
        }
    }
}

/// Builder for [`IndicatorService`].
///
/// # Example
///
/// ```rust,ignore
/// use ferromacro_core::{AcquisitionConfig, IndicatorService};
///
/// let service = IndicatorService::builder()
///     .with_config(AcquisitionConfig::from_env()?)
///     .with_default_sources()
///     .build()?;
/// let selic = service.get_indicator_series("Taxa Selic").await?;
/// ```
#[derive(Default)]
pub struct IndicatorServiceBuilder {
    registry: Option<IndicatorRegistry>,
    sources: HashMap<SourceKind, Arc<dyn SeriesSource>>,
    default_sources: bool,
    cache: Option<SeriesCache>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<AcquisitionConfig>,
}

impl IndicatorServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: IndicatorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Registers `source` for its own [`SourceKind`], replacing any earlier one.
    pub fn with_source(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    /// Fills every kind without an explicit source with the HTTP adapter,
    /// configured from the final [`AcquisitionConfig`].
    pub fn with_default_sources(mut self) -> Self {
        self.default_sources = true;
        self
    }

    pub fn with_cache(mut self, cache: SeriesCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, config: AcquisitionConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<IndicatorService, ValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let mut sources = self.sources;
        if self.default_sources {
            for kind in SourceKind::ALL {
                sources
                    .entry(kind)
                    .or_insert_with(|| default_source(kind, &config));
            }
        }

        Ok(IndicatorService {
            registry: self.registry.unwrap_or_default(),
            sources,
            cache: self.cache.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config,
        })
    }
}

fn default_source(kind: SourceKind, config: &AcquisitionConfig) -> Arc<dyn SeriesSource> {
    match kind {
        SourceKind::MarketData => Arc::new(
            YahooAdapter::default()
                .with_retry(config.retry.clone())
                .with_timeout_ms(config.fetch_timeout_ms()),
        ),
        SourceKind::CentralBank => Arc::new(
            CentralBankAdapter::default()
                .with_retry(config.retry.clone())
                .with_timeout_ms(config.fetch_timeout_ms()),
        ),
    }
}
