use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RideRequestedEvent {
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub requested_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequestAcceptedEvent {
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub seats_left: u32,
    pub accepted_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RequestRejectedEvent {
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub rejected_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RiderOnboardEvent {
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub picked_up_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RideDeletedEvent {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub deleted_at: i64,
}

/// Lifecycle events fanned out over the in-process broadcast channel and the
/// SSE stream. Payloads carry ids and timestamps only; OTPs travel solely in
/// the rider's own notification.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RideEvent {
    RideRequested(RideRequestedEvent),
    RequestAccepted(RequestAcceptedEvent),
    RequestRejected(RequestRejectedEvent),
    RiderOnboard(RiderOnboardEvent),
    RideDeleted(RideDeletedEvent),
}

impl RideEvent {
    /// SSE event name for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            RideEvent::RideRequested(_) => "ride_requested",
            RideEvent::RequestAccepted(_) => "request_accepted",
            RideEvent::RequestRejected(_) => "request_rejected",
            RideEvent::RiderOnboard(_) => "rider_onboard",
            RideEvent::RideDeleted(_) => "ride_deleted",
        }
    }
}
