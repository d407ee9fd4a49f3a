//! One-shot location lookup

use async_trait::async_trait;
use geomark_core::{
    performance, with_timeout, ErrorContext, GeomarkError, GeomarkResult, LocationConfig,
    LocationProvider, Position,
};
use tracing::{info, warn};

/// Reports the same position every time
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    position: Position,
}

impl FixedLocationProvider {
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self) -> GeomarkResult<Position> {
        Ok(self.position)
    }
}

/// Used when no location source is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn current_position(&self) -> GeomarkResult<Position> {
        Err(GeomarkError::Location {
            message: "no location source is configured".to_string(),
            context: ErrorContext::new("location")
                .with_operation("current_position")
                .with_suggestion("Set location.fixed_position in the config file"),
        })
    }
}

pub fn provider_from_config(config: &LocationConfig) -> Box<dyn LocationProvider> {
    match config.fixed_position {
        Some(position) => Box::new(FixedLocationProvider::new(position)),
        None => Box::new(UnavailableLocationProvider),
    }
}

/// Ask `provider` for the current position once, giving up after `timeout_ms`.
/// Failures are returned to the caller and never retried.
pub async fn locate(provider: &dyn LocationProvider, timeout_ms: u64) -> GeomarkResult<Position> {
    let result = with_timeout(
        performance::measure_async("locate", provider.current_position()),
        timeout_ms,
        "locate",
    )
    .await
    .and_then(|inner| inner)
    .and_then(|position| position.validate().map(|_| position));

    match &result {
        Ok(position) => info!(position = %position, "Location found"),
        Err(e) => warn!(error = %e, "Location unavailable"),
    }
    result
}
