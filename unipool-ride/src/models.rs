use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use unipool_core::geo::Coordinates;
use unipool_fare::VehicleClass;
use unipool_shared::redact::Redacted;
use uuid::Uuid;

/// Pickup progress of an accepted rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerStatus {
    Confirmed,
    Onboard,
    Dropped,
    Cancelled,
}

/// Sub-record of a ride, one per accepted rider. Created at accept time
/// with a fresh OTP; the OTP is compared at pickup and never reused across
/// rides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub rider_id: Uuid,
    pub otp: Redacted<String>,
    pub status: PassengerStatus,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub dropped_at: Option<DateTime<Utc>>,
}

impl Passenger {
    pub fn new(rider_id: Uuid, otp: String) -> Self {
        Self {
            rider_id,
            otp: Redacted::new(otp),
            status: PassengerStatus::Confirmed,
            picked_up_at: None,
            dropped_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RideError {
    #[error("you cannot join your own ride")]
    CannotJoinOwnRide,

    #[error("you have already requested or joined this ride")]
    AlreadyRequested,

    #[error("no seats available")]
    NoSeatsAvailable,

    #[error("rider request not found")]
    RequestNotFound,

    #[error("invalid OTP or rider already onboard")]
    OtpNotFound,
}

/// Creation parameters for a ride; identity, membership and concurrency
/// bookkeeping are filled in by `Ride::new`.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub source: String,
    pub destination: String,
    pub source_coords: Option<Coordinates>,
    pub dest_coords: Option<Coordinates>,
    pub date: NaiveDate,
    pub time: String,
    pub available_seats: u32,
    pub vehicle_class: VehicleClass,
    pub created_by: Uuid,
    pub distance_km: f64,
    pub duration_min: u32,
    pub price: i32,
    pub driver_earnings: i32,
}

/// The central aggregate: one driver-posted trip offer with fixed capacity
/// and schedule. All seat/membership invariants are enforced here; no other
/// component mutates these fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub source: String,
    pub destination: String,
    pub source_coords: Option<Coordinates>,
    pub dest_coords: Option<Coordinates>,
    pub date: NaiveDate,
    /// Wall-clock departure, `HH:MM`.
    pub time: String,
    /// Seats not yet allocated to an accepted rider. Never negative.
    pub available_seats: u32,
    pub vehicle_class: VehicleClass,
    /// The posting driver. Immutable after creation.
    pub created_by: Uuid,
    pub pending_riders: Vec<Uuid>,
    pub riders: Vec<Uuid>,
    pub passengers: Vec<Passenger>,
    /// Pricing snapshot, computed once at creation and never recomputed.
    pub distance_km: f64,
    pub duration_min: u32,
    pub price: i32,
    pub driver_earnings: i32,
    /// Optimistic-concurrency token; bumped by the repository on every
    /// conditional save.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn new(new: NewRide) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: new.source,
            destination: new.destination,
            source_coords: new.source_coords,
            dest_coords: new.dest_coords,
            date: new.date,
            time: new.time,
            available_seats: new.available_seats,
            vehicle_class: new.vehicle_class,
            created_by: new.created_by,
            pending_riders: Vec::new(),
            riders: Vec::new(),
            passengers: Vec::new(),
            distance_km: new.distance_km,
            duration_min: new.duration_min,
            price: new.price,
            driver_earnings: new.driver_earnings,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    /// Whether the user already appears in either membership set.
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.pending_riders.contains(&user_id) || self.riders.contains(&user_id)
    }

    /// Request to join. The seat check here is advisory; the authoritative
    /// gate runs at accept time, because seats may be consumed by other
    /// acceptances between request and response.
    pub fn request_join(&mut self, rider_id: Uuid) -> Result<(), RideError> {
        if self.is_owner(rider_id) {
            return Err(RideError::CannotJoinOwnRide);
        }
        if self.has_member(rider_id) {
            return Err(RideError::AlreadyRequested);
        }
        if self.available_seats == 0 {
            return Err(RideError::NoSeatsAvailable);
        }

        self.pending_riders.push(rider_id);
        self.touch();
        Ok(())
    }

    /// Accept a pending request: authoritative seat gate, pending -> riders
    /// move, seat decrement and passenger record appended as one unit. The
    /// caller supplies an OTP unique among currently confirmed passengers.
    pub fn accept_rider(&mut self, rider_id: Uuid, otp: String) -> Result<(), RideError> {
        if !self.pending_riders.contains(&rider_id) {
            return Err(RideError::RequestNotFound);
        }
        if self.available_seats == 0 {
            return Err(RideError::NoSeatsAvailable);
        }

        self.pending_riders.retain(|id| *id != rider_id);
        self.riders.push(rider_id);
        self.available_seats -= 1;
        self.passengers.push(Passenger::new(rider_id, otp));
        self.touch();
        Ok(())
    }

    /// Reject a pending request. Seats are unchanged.
    pub fn reject_rider(&mut self, rider_id: Uuid) -> Result<(), RideError> {
        if !self.pending_riders.contains(&rider_id) {
            return Err(RideError::RequestNotFound);
        }

        self.pending_riders.retain(|id| *id != rider_id);
        self.touch();
        Ok(())
    }

    /// Match a submitted OTP against the confirmed passengers. A passenger
    /// already onboard no longer matches, so a second submission of the
    /// same code fails.
    pub fn confirm_pickup(&mut self, submitted_otp: &str) -> Result<Uuid, RideError> {
        let passenger = self
            .passengers
            .iter_mut()
            .find(|p| p.status == PassengerStatus::Confirmed && p.otp.expose() == submitted_otp)
            .ok_or(RideError::OtpNotFound)?;

        passenger.status = PassengerStatus::Onboard;
        passenger.picked_up_at = Some(Utc::now());
        let rider_id = passenger.rider_id;
        self.touch();
        Ok(rider_id)
    }

    /// OTP collision check used when issuing a fresh code. Codes only need
    /// to be unique among this ride's currently confirmed passengers.
    pub fn has_confirmed_otp(&self, otp: &str) -> bool {
        self.passengers
            .iter()
            .any(|p| p.status == PassengerStatus::Confirmed && p.otp.expose() == otp)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ride(driver: Uuid, seats: u32) -> Ride {
        Ride::new(NewRide {
            source: "Campus Gate 2".to_string(),
            destination: "Hitec City".to_string(),
            source_coords: None,
            dest_coords: None,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            time: "08:30".to_string(),
            available_seats: seats,
            vehicle_class: VehicleClass::Car,
            created_by: driver,
            distance_km: 10.0,
            duration_min: 20,
            price: 240,
            driver_earnings: 192,
        })
    }

    #[test]
    fn test_owner_cannot_join_own_ride() {
        let driver = Uuid::new_v4();
        let mut ride = sample_ride(driver, 2);

        assert_eq!(ride.request_join(driver), Err(RideError::CannotJoinOwnRide));
        assert!(ride.pending_riders.is_empty());
    }

    #[test]
    fn test_duplicate_request_rejected() {
        let mut ride = sample_ride(Uuid::new_v4(), 2);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        assert_eq!(ride.request_join(rider), Err(RideError::AlreadyRequested));

        // Still rejected once accepted.
        ride.accept_rider(rider, "1234".to_string()).unwrap();
        assert_eq!(ride.request_join(rider), Err(RideError::AlreadyRequested));
    }

    #[test]
    fn test_request_blocked_when_full() {
        let mut ride = sample_ride(Uuid::new_v4(), 0);
        let rider = Uuid::new_v4();

        assert_eq!(ride.request_join(rider), Err(RideError::NoSeatsAvailable));
    }

    #[test]
    fn test_accept_moves_rider_and_decrements_seat() {
        let mut ride = sample_ride(Uuid::new_v4(), 2);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        ride.accept_rider(rider, "4821".to_string()).unwrap();

        assert!(ride.pending_riders.is_empty());
        assert_eq!(ride.riders, vec![rider]);
        assert_eq!(ride.available_seats, 1);
        assert_eq!(ride.riders.len(), ride.passengers.len());
        assert_eq!(ride.passengers[0].status, PassengerStatus::Confirmed);
        assert!(ride.passengers[0].picked_up_at.is_none());
    }

    #[test]
    fn test_accept_without_request_fails() {
        let mut ride = sample_ride(Uuid::new_v4(), 2);
        let stranger = Uuid::new_v4();

        assert_eq!(
            ride.accept_rider(stranger, "0000".to_string()),
            Err(RideError::RequestNotFound)
        );
    }

    #[test]
    fn test_accept_with_no_seats_fails() {
        let mut ride = sample_ride(Uuid::new_v4(), 1);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        ride.request_join(first).unwrap();
        ride.request_join(second).unwrap();
        ride.accept_rider(first, "1111".to_string()).unwrap();

        assert_eq!(
            ride.accept_rider(second, "2222".to_string()),
            Err(RideError::NoSeatsAvailable)
        );
        // The losing rider stays pending; seats never go negative.
        assert_eq!(ride.pending_riders, vec![second]);
        assert_eq!(ride.available_seats, 0);
    }

    #[test]
    fn test_reject_leaves_seats_untouched() {
        let mut ride = sample_ride(Uuid::new_v4(), 3);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        ride.reject_rider(rider).unwrap();

        assert!(ride.pending_riders.is_empty());
        assert!(ride.riders.is_empty());
        assert!(ride.passengers.is_empty());
        assert_eq!(ride.available_seats, 3);
    }

    #[test]
    fn test_member_never_in_both_sets() {
        let mut ride = sample_ride(Uuid::new_v4(), 2);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        ride.accept_rider(rider, "7777".to_string()).unwrap();

        assert!(!ride.pending_riders.contains(&rider));
        assert!(ride.riders.contains(&rider));
    }

    #[test]
    fn test_otp_round_trip() {
        let mut ride = sample_ride(Uuid::new_v4(), 1);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        ride.accept_rider(rider, "4821".to_string()).unwrap();

        let boarded = ride.confirm_pickup("4821").unwrap();
        assert_eq!(boarded, rider);
        assert_eq!(ride.passengers[0].status, PassengerStatus::Onboard);
        assert!(ride.passengers[0].picked_up_at.is_some());

        // Same code again: the passenger is onboard, nothing matches.
        assert_eq!(ride.confirm_pickup("4821"), Err(RideError::OtpNotFound));
    }

    #[test]
    fn test_wrong_otp_rejected() {
        let mut ride = sample_ride(Uuid::new_v4(), 1);
        let rider = Uuid::new_v4();

        ride.request_join(rider).unwrap();
        ride.accept_rider(rider, "4821".to_string()).unwrap();

        assert_eq!(ride.confirm_pickup("0000"), Err(RideError::OtpNotFound));
        assert_eq!(ride.passengers[0].status, PassengerStatus::Confirmed);
    }

    #[test]
    fn test_confirmed_otp_collision_check() {
        let mut ride = sample_ride(Uuid::new_v4(), 2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        ride.request_join(a).unwrap();
        ride.request_join(b).unwrap();
        ride.accept_rider(a, "1234".to_string()).unwrap();

        assert!(ride.has_confirmed_otp("1234"));
        assert!(!ride.has_confirmed_otp("9999"));

        // Once onboard, the code is free again for uniqueness purposes.
        ride.confirm_pickup("1234").unwrap();
        assert!(!ride.has_confirmed_otp("1234"));
    }
}
