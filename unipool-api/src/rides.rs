use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unipool_core::directory::UserProfile;
use unipool_core::geo::Coordinates;
use unipool_core::routing::RouteSource;
use unipool_fare::{estimate_fare, FareBreakdown, VehicleClass};
use unipool_ride::models::{NewRide, PassengerStatus, Ride};
use unipool_ride::{Decision, EarningsAggregator};
use unipool_shared::models::events::{
    RequestAcceptedEvent, RequestRejectedEvent, RideDeletedEvent, RideEvent, RideRequestedEvent,
    RiderOnboardEvent,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{internal, AppError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub source_lat: Option<f64>,
    pub source_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
    pub vehicle_class: Option<VehicleClass>,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub distance_km: f64,
    pub duration_min: u32,
    pub routing_source: RouteSource,
    pub rider_cost: i32,
    pub driver_earnings: i32,
    pub breakdown: FareBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub source: String,
    pub destination: String,
    pub date: NaiveDate,
    pub time: String,
    pub available_seats: u32,
    pub vehicle_class: VehicleClass,
    pub source_lat: Option<f64>,
    pub source_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListRidesQuery {
    #[serde(default)]
    pub active_only: bool,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub rider_id: Uuid,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub rider_id: Uuid,
    pub ride: RideResponse,
}

#[derive(Debug, Serialize)]
pub struct DeleteRideResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DriverStatsQuery {
    #[serde(default)]
    pub include_rides: bool,
}

#[derive(Debug, Serialize)]
pub struct DriverStatsResponse {
    pub total_rides: usize,
    pub total_earnings: i64,
    pub daily_totals: BTreeMap<String, i64>,
    pub weekly_totals: BTreeMap<String, i64>,
    pub monthly_totals: BTreeMap<String, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rides: Option<Vec<RideResponse>>,
}

/// Strongly typed user reference: the id plus, when the directory knows the
/// user, a display projection resolved once at this boundary.
#[derive(Debug, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

/// Passenger as shown to API consumers. There is deliberately no OTP field
/// here: codes travel only inside the rider's own notification.
#[derive(Debug, Serialize)]
pub struct PassengerView {
    pub rider: UserRef,
    pub status: PassengerStatus,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub dropped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub source: String,
    pub destination: String,
    pub source_coords: Option<Coordinates>,
    pub dest_coords: Option<Coordinates>,
    pub date: NaiveDate,
    pub time: String,
    pub available_seats: u32,
    pub vehicle_class: VehicleClass,
    pub created_by: UserRef,
    pub pending_riders: Vec<UserRef>,
    pub riders: Vec<UserRef>,
    pub passengers: Vec<PassengerView>,
    pub distance_km: f64,
    pub duration_min: u32,
    pub price: i32,
    pub driver_earnings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/rides/estimate
/// Quote a trip before posting it. Routing degradation is invisible here:
/// the response only reports which source produced the numbers.
pub async fn estimate(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let (from, to) = require_coords(
        req.source_lat,
        req.source_lng,
        req.dest_lat,
        req.dest_lng,
    )?;
    let vehicle_class = req.vehicle_class.unwrap_or(VehicleClass::Car);

    let route = state.planner.estimate(from, to).await;
    let quote = estimate_fare(route.distance_km, route.duration_min, vehicle_class)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(EstimateResponse {
        distance_km: route.distance_km,
        duration_min: route.duration_min,
        routing_source: route.source,
        rider_cost: quote.rider_cost,
        driver_earnings: quote.driver_earnings,
        breakdown: quote.breakdown,
    }))
}

/// POST /v1/rides
/// Post a ride. The fare snapshot is computed here, once, when all four
/// coordinates are present; it is never recomputed afterwards.
pub async fn create_ride(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), AppError> {
    if req.source.trim().is_empty() || req.destination.trim().is_empty() {
        return Err(AppError::Validation(
            "source and destination are required".to_string(),
        ));
    }
    if NaiveTime::parse_from_str(&req.time, "%H:%M").is_err() {
        return Err(AppError::Validation("time must be HH:MM".to_string()));
    }
    if req.available_seats == 0 {
        return Err(AppError::Validation(
            "a ride must offer at least one seat".to_string(),
        ));
    }
    if req.available_seats > req.vehicle_class.max_seats() {
        return Err(AppError::Validation(format!(
            "a {} ride can offer at most {} seats",
            req.vehicle_class,
            req.vehicle_class.max_seats()
        )));
    }

    // Driver verification lives in the identity service; unverified users
    // may ride but not post.
    let verified = state
        .directory
        .is_verified_driver(user_id)
        .await
        .map_err(internal)?;
    if !verified {
        return Err(AppError::Forbidden(
            "driver verification required before posting rides".to_string(),
        ));
    }

    let coords = match (req.source_lat, req.source_lng, req.dest_lat, req.dest_lng) {
        (Some(a), Some(b), Some(c), Some(d)) => {
            Some((Coordinates::new(a, b), Coordinates::new(c, d)))
        }
        _ => None,
    };

    let (distance_km, duration_min, price, driver_earnings) = match coords {
        Some((from, to)) => {
            let route = state.planner.estimate(from, to).await;
            let quote = estimate_fare(route.distance_km, route.duration_min, req.vehicle_class)
                .map_err(|e| AppError::Validation(e.to_string()))?;
            // Stored to one decimal; the finer-grained figure only matters
            // for the quote itself.
            let stored_km = (route.distance_km * 10.0).round() / 10.0;
            (
                stored_km,
                route.duration_min,
                quote.rider_cost,
                quote.driver_earnings,
            )
        }
        None => (0.0, 0, 0, 0),
    };

    let ride = Ride::new(NewRide {
        source: req.source,
        destination: req.destination,
        source_coords: coords.map(|(from, _)| from),
        dest_coords: coords.map(|(_, to)| to),
        date: req.date,
        time: req.time,
        available_seats: req.available_seats,
        vehicle_class: req.vehicle_class,
        created_by: user_id,
        distance_km,
        duration_min,
        price,
        driver_earnings,
    });

    state.rides.create_ride(&ride).await.map_err(internal)?;

    let response = resolve_ride(&state, ride).await;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/rides
pub async fn list_rides(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListRidesQuery>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let rides = state.rides.list_rides().await.map_err(internal)?;

    let today = Utc::now().date_naive();
    let needle = query.q.as_ref().map(|q| q.to_lowercase());

    let mut responses = Vec::new();
    for ride in rides {
        if query.active_only && (ride.available_seats == 0 || ride.date < today) {
            continue;
        }
        if let Some(needle) = &needle {
            let matches = ride.source.to_lowercase().contains(needle)
                || ride.destination.to_lowercase().contains(needle);
            if !matches {
                continue;
            }
        }
        responses.push(resolve_ride(&state, ride).await);
    }

    Ok(Json(responses))
}

/// GET /v1/rides/:id
pub async fn get_ride(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state
        .rides
        .get_ride(ride_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    Ok(Json(resolve_ride(&state, ride).await))
}

/// POST /v1/rides/:id/join
pub async fn join_ride(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.lifecycle.request_to_join(ride_id, user_id).await?;

    publish(
        &state,
        RideEvent::RideRequested(RideRequestedEvent {
            ride_id: ride.id,
            rider_id: user_id,
            driver_id: ride.created_by,
            requested_at: Utc::now().timestamp(),
        }),
    );

    Ok(Json(resolve_ride(&state, ride).await))
}

/// POST /v1/rides/:id/respond
/// Owner accepts or rejects a pending request. The OTP issued on acceptance
/// reaches the rider out-of-band via their notification, never this
/// response.
pub async fn respond_to_request(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ride_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state
        .lifecycle
        .respond_to_request(ride_id, user_id, req.rider_id, req.decision)
        .await?;

    let event = match req.decision {
        Decision::Accept => RideEvent::RequestAccepted(RequestAcceptedEvent {
            ride_id: ride.id,
            rider_id: req.rider_id,
            seats_left: ride.available_seats,
            accepted_at: Utc::now().timestamp(),
        }),
        Decision::Reject => RideEvent::RequestRejected(RequestRejectedEvent {
            ride_id: ride.id,
            rider_id: req.rider_id,
            rejected_at: Utc::now().timestamp(),
        }),
    };
    publish(&state, event);

    Ok(Json(resolve_ride(&state, ride).await))
}

/// POST /v1/rides/:id/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ride_id): Path<Uuid>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    let (rider_id, ride) = state
        .lifecycle
        .verify_otp(ride_id, user_id, &req.otp)
        .await?;

    publish(
        &state,
        RideEvent::RiderOnboard(RiderOnboardEvent {
            ride_id: ride.id,
            rider_id,
            picked_up_at: Utc::now().timestamp(),
        }),
    );

    Ok(Json(VerifyOtpResponse {
        message: "Pickup confirmed".to_string(),
        rider_id,
        ride: resolve_ride(&state, ride).await,
    }))
}

/// DELETE /v1/rides/:id
pub async fn delete_ride(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<DeleteRideResponse>, AppError> {
    state.lifecycle.delete_ride(ride_id, user_id).await?;

    publish(
        &state,
        RideEvent::RideDeleted(RideDeletedEvent {
            ride_id,
            driver_id: user_id,
            deleted_at: Utc::now().timestamp(),
        }),
    );

    Ok(Json(DeleteRideResponse { id: ride_id }))
}

/// GET /v1/rides/stats
/// Driver earnings summary. The detail listing is capped for payload size;
/// the totals always cover the driver's entire ride set.
pub async fn driver_stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DriverStatsQuery>,
) -> Result<Json<DriverStatsResponse>, AppError> {
    let rides = state.rides.list_by_driver(user_id).await.map_err(internal)?;

    let stats = EarningsAggregator::new().summarize(user_id, &rides);

    let listed = if query.include_rides {
        let cap = state.business_rules.stats_ride_list_cap;
        let mut views = Vec::new();
        for ride in rides.into_iter().take(cap) {
            views.push(resolve_ride(&state, ride).await);
        }
        Some(views)
    } else {
        None
    };

    Ok(Json(DriverStatsResponse {
        total_rides: stats.total_rides,
        total_earnings: stats.total_earnings,
        daily_totals: stats.daily_totals,
        weekly_totals: stats.weekly_totals,
        monthly_totals: stats.monthly_totals,
        rides: listed,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn require_coords(
    source_lat: Option<f64>,
    source_lng: Option<f64>,
    dest_lat: Option<f64>,
    dest_lng: Option<f64>,
) -> Result<(Coordinates, Coordinates), AppError> {
    match (source_lat, source_lng, dest_lat, dest_lng) {
        (Some(a), Some(b), Some(c), Some(d)) => {
            Ok((Coordinates::new(a, b), Coordinates::new(c, d)))
        }
        _ => Err(AppError::Validation("GPS coordinates required".to_string())),
    }
}

/// Display lookup failures only degrade the projection, never the request.
async fn lookup_user(state: &AppState, id: Uuid) -> UserRef {
    let profile = match state.directory.get_profile(id).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!("profile lookup failed for {}: {}", id, err);
            None
        }
    };
    UserRef { id, profile }
}

async fn resolve_ride(state: &AppState, ride: Ride) -> RideResponse {
    let created_by = lookup_user(state, ride.created_by).await;

    let mut pending_riders = Vec::with_capacity(ride.pending_riders.len());
    for id in &ride.pending_riders {
        pending_riders.push(lookup_user(state, *id).await);
    }

    let mut riders = Vec::with_capacity(ride.riders.len());
    for id in &ride.riders {
        riders.push(lookup_user(state, *id).await);
    }

    let mut passengers = Vec::with_capacity(ride.passengers.len());
    for passenger in &ride.passengers {
        passengers.push(PassengerView {
            rider: lookup_user(state, passenger.rider_id).await,
            status: passenger.status,
            picked_up_at: passenger.picked_up_at,
            dropped_at: passenger.dropped_at,
        });
    }

    RideResponse {
        id: ride.id,
        source: ride.source,
        destination: ride.destination,
        source_coords: ride.source_coords,
        dest_coords: ride.dest_coords,
        date: ride.date,
        time: ride.time,
        available_seats: ride.available_seats,
        vehicle_class: ride.vehicle_class,
        created_by,
        pending_riders,
        riders,
        passengers,
        distance_km: ride.distance_km,
        duration_min: ride.duration_min,
        price: ride.price,
        driver_earnings: ride.driver_earnings,
        created_at: ride.created_at,
        updated_at: ride.updated_at,
    }
}

fn publish(state: &AppState, event: RideEvent) {
    // No subscribers is fine; the stream is best-effort.
    let _ = state.events_tx.send(event);
}
