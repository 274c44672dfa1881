use crate::geo::{haversine_km, Coordinates};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Multiplier applied to great-circle distance to approximate real road
/// distance.
pub const ROAD_FACTOR: f64 = 1.3;

/// Assumed average urban speed for the duration estimate.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteSource {
    #[serde(rename = "live-routing")]
    Live,
    #[serde(rename = "haversine-fallback")]
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_min: u32,
    pub source: RouteSource,
}

/// External road-routing service. Implementations adapt a live provider;
/// the engine only ever consumes this contract.
#[async_trait]
pub trait RoutingGateway: Send + Sync {
    async fn get_route(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<RouteEstimate, Box<dyn std::error::Error + Send + Sync>>;
}

/// Deterministic offline estimate: haversine distance times the road
/// factor, rounded to 2 decimals; duration from the rounded distance at the
/// average urban speed.
pub fn fallback_route(from: Coordinates, to: Coordinates) -> RouteEstimate {
    let road_km = haversine_km(from, to) * ROAD_FACTOR;
    let distance_km = (road_km * 100.0).round() / 100.0;
    let duration_min = (distance_km / AVERAGE_SPEED_KMH * 60.0).round() as u32;

    RouteEstimate {
        distance_km,
        duration_min,
        source: RouteSource::Fallback,
    }
}

/// Resolves a route through the live gateway when one is configured,
/// degrading to the deterministic fallback on any error or timeout. At most
/// one live attempt is made per estimate and the caller never sees a
/// routing failure.
pub struct RoutePlanner {
    gateway: Option<Arc<dyn RoutingGateway>>,
    timeout: Duration,
}

impl RoutePlanner {
    pub fn new(gateway: Option<Arc<dyn RoutingGateway>>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Planner with no live gateway configured.
    pub fn fallback_only() -> Self {
        Self::new(None, Duration::from_secs(3))
    }

    pub async fn estimate(&self, from: Coordinates, to: Coordinates) -> RouteEstimate {
        if let Some(gateway) = &self.gateway {
            match tokio::time::timeout(self.timeout, gateway.get_route(from, to)).await {
                Ok(Ok(route)) => return route,
                Ok(Err(err)) => {
                    tracing::warn!("routing gateway failed, degrading to fallback: {}", err);
                }
                Err(_) => {
                    tracing::warn!(
                        "routing gateway timed out after {:?}, degrading to fallback",
                        self.timeout
                    );
                }
            }
        }

        fallback_route(from, to)
    }
}
