use crate::models::{Ride, RideError};
use crate::otp::generate_otp;
use crate::repository::{RideRepository, SaveOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use unipool_core::notify::{Notification, NotificationKind, NotificationSink};
use uuid::Uuid;

/// Attempts before a conditional save gives up under contention.
const MAX_SAVE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("ride not found")]
    RideNotFound,

    #[error("{0}")]
    NotAuthorized(&'static str),

    #[error(transparent)]
    Ride(#[from] RideError),

    #[error("ride is being updated concurrently, please retry")]
    Contention,

    #[error("storage failure: {0}")]
    Storage(String),
}

/// The sole mutation path for a ride's seats and membership. Every
/// operation is load -> mutate aggregate -> conditional save keyed on the
/// ride version, reloading and reapplying on conflict, so read-modify-write
/// sequences are atomic relative to other writers of the same ride.
pub struct RideLifecycle {
    repo: Arc<dyn RideRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl RideLifecycle {
    pub fn new(repo: Arc<dyn RideRepository>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { repo, notifier }
    }

    /// A rider asks to join. The seat check here is advisory; acceptance
    /// re-checks authoritatively.
    pub async fn request_to_join(
        &self,
        ride_id: Uuid,
        requester: Uuid,
    ) -> Result<Ride, LifecycleError> {
        let (_, ride) = self
            .mutate(ride_id, |ride| {
                ride.request_join(requester)?;
                Ok(())
            })
            .await?;

        self.notify(
            ride.created_by,
            NotificationKind::Request,
            format!(
                "A rider has requested to join your ride from {} to {}",
                ride.source, ride.destination
            ),
            ride.id,
        )
        .await;

        Ok(ride)
    }

    /// The owner accepts or rejects a pending request. Accepting runs the
    /// authoritative seat gate, issues a fresh OTP unique among the ride's
    /// currently confirmed passengers and delivers it to the rider only.
    pub async fn respond_to_request(
        &self,
        ride_id: Uuid,
        acting_user: Uuid,
        target_rider: Uuid,
        decision: Decision,
    ) -> Result<Ride, LifecycleError> {
        match decision {
            Decision::Accept => {
                let (otp, ride) = self
                    .mutate(ride_id, |ride| {
                        if !ride.is_owner(acting_user) {
                            return Err(LifecycleError::NotAuthorized(
                                "only the ride owner can respond to requests",
                            ));
                        }

                        let mut otp = generate_otp();
                        while ride.has_confirmed_otp(&otp) {
                            otp = generate_otp();
                        }

                        ride.accept_rider(target_rider, otp.clone())?;
                        Ok(otp)
                    })
                    .await?;

                self.notify(
                    target_rider,
                    NotificationKind::Booking,
                    format!(
                        "Your ride request for {} to {} was ACCEPTED! Share OTP {} with your driver at pickup.",
                        ride.source, ride.destination, otp
                    ),
                    ride.id,
                )
                .await;

                Ok(ride)
            }
            Decision::Reject => {
                let (_, ride) = self
                    .mutate(ride_id, |ride| {
                        if !ride.is_owner(acting_user) {
                            return Err(LifecycleError::NotAuthorized(
                                "only the ride owner can respond to requests",
                            ));
                        }
                        ride.reject_rider(target_rider)?;
                        Ok(())
                    })
                    .await?;

                self.notify(
                    target_rider,
                    NotificationKind::System,
                    format!(
                        "Your ride request for {} to {} was REJECTED.",
                        ride.source, ride.destination
                    ),
                    ride.id,
                )
                .await;

                Ok(ride)
            }
        }
    }

    /// The driver submits the code a rider shared at pickup. Returns the
    /// boarded rider along with the updated ride.
    pub async fn verify_otp(
        &self,
        ride_id: Uuid,
        acting_user: Uuid,
        submitted_otp: &str,
    ) -> Result<(Uuid, Ride), LifecycleError> {
        let (rider_id, ride) = self
            .mutate(ride_id, |ride| {
                if !ride.is_owner(acting_user) {
                    return Err(LifecycleError::NotAuthorized(
                        "only the driver can verify pickup OTPs",
                    ));
                }
                Ok(ride.confirm_pickup(submitted_otp)?)
            })
            .await?;

        self.notify(
            rider_id,
            NotificationKind::Booking,
            format!(
                "Pickup confirmed for your ride from {} to {}. Have a safe trip!",
                ride.source, ride.destination
            ),
            ride.id,
        )
        .await;

        Ok((rider_id, ride))
    }

    /// Hard delete by the owner. A missing ride reports not-found, so a
    /// repeated delete is an idempotent 404 for the caller.
    pub async fn delete_ride(&self, ride_id: Uuid, acting_user: Uuid) -> Result<(), LifecycleError> {
        let ride = self
            .repo
            .get_ride(ride_id)
            .await
            .map_err(|e| LifecycleError::Storage(e.to_string()))?
            .ok_or(LifecycleError::RideNotFound)?;

        if !ride.is_owner(acting_user) {
            return Err(LifecycleError::NotAuthorized(
                "only the ride owner can delete this ride",
            ));
        }

        let deleted = self
            .repo
            .delete_ride(ride_id)
            .await
            .map_err(|e| LifecycleError::Storage(e.to_string()))?;
        if !deleted {
            return Err(LifecycleError::RideNotFound);
        }

        Ok(())
    }

    /// Load-mutate-save loop with a version precondition. On a conflict the
    /// ride is reloaded and the operation reapplied against fresh state, so
    /// an accept that lost the race sees the decremented seat count.
    async fn mutate<T, F>(&self, ride_id: Uuid, mut op: F) -> Result<(T, Ride), LifecycleError>
    where
        F: FnMut(&mut Ride) -> Result<T, LifecycleError>,
    {
        for attempt in 0..MAX_SAVE_ATTEMPTS {
            let mut ride = self
                .repo
                .get_ride(ride_id)
                .await
                .map_err(|e| LifecycleError::Storage(e.to_string()))?
                .ok_or(LifecycleError::RideNotFound)?;

            let value = op(&mut ride)?;

            match self
                .repo
                .save_ride(&ride)
                .await
                .map_err(|e| LifecycleError::Storage(e.to_string()))?
            {
                SaveOutcome::Applied => {
                    ride.version += 1;
                    return Ok((value, ride));
                }
                SaveOutcome::VersionConflict => {
                    tracing::debug!(
                        ride_id = %ride_id,
                        attempt,
                        "version conflict on ride save, reloading"
                    );
                }
            }
        }

        Err(LifecycleError::Contention)
    }

    /// Fire-and-forget: a failed delivery is logged and swallowed, never
    /// failing the primary operation.
    async fn notify(&self, user_id: Uuid, kind: NotificationKind, message: String, ride_id: Uuid) {
        let notification = Notification::new(user_id, kind, message, ride_id);
        if let Err(err) = self.notifier.deliver(notification).await {
            tracing::warn!("notification delivery failed (ignored): {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRide, PassengerStatus};
    use crate::repository::InMemoryRideRepository;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tokio::sync::Barrier;
    use tokio::sync::Mutex;
    use unipool_fare::VehicleClass;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(
            &self,
            notification: Notification,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.delivered.lock().await.push(notification);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn deliver(
            &self,
            _notification: Notification,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("notification channel down".into())
        }
    }

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

    async fn setup(
        seats: u32,
    ) -> (
        Arc<InMemoryRideRepository>,
        Arc<RecordingSink>,
        RideLifecycle,
        Uuid,
        Uuid,
    ) {
        let repo = Arc::new(InMemoryRideRepository::new());
        let sink = Arc::new(RecordingSink::default());
        let lifecycle = RideLifecycle::new(repo.clone(), sink.clone());

        let driver = Uuid::new_v4();
        let ride = sample_ride(driver, seats);
        let ride_id = ride.id;
        repo.create_ride(&ride).await.unwrap();

        (repo, sink, lifecycle, driver, ride_id)
    }

    #[tokio::test]
    async fn test_request_then_accept_flow() {
        let (repo, sink, lifecycle, driver, ride_id) = setup(2).await;
        let rider = Uuid::new_v4();

        lifecycle.request_to_join(ride_id, rider).await.unwrap();
        let ride = lifecycle
            .respond_to_request(ride_id, driver, rider, Decision::Accept)
            .await
            .unwrap();

        assert_eq!(ride.available_seats, 1);
        assert_eq!(ride.riders, vec![rider]);
        assert_eq!(ride.passengers.len(), 1);

        // The rider's acceptance notification carries the issued OTP.
        let stored = repo.get_ride(ride_id).await.unwrap().unwrap();
        let otp = stored.passengers[0].otp.expose().clone();
        let delivered = sink.delivered.lock().await;
        let accept_msg = delivered
            .iter()
            .find(|n| n.user_id == rider && n.kind == NotificationKind::Booking)
            .expect("rider was not notified");
        assert!(accept_msg.message.contains(&otp));
    }

    #[tokio::test]
    async fn test_reject_notifies_and_keeps_seats() {
        let (repo, sink, lifecycle, driver, ride_id) = setup(2).await;
        let rider = Uuid::new_v4();

        lifecycle.request_to_join(ride_id, rider).await.unwrap();
        let ride = lifecycle
            .respond_to_request(ride_id, driver, rider, Decision::Reject)
            .await
            .unwrap();

        assert_eq!(ride.available_seats, 2);
        assert!(ride.pending_riders.is_empty());
        assert!(ride.passengers.is_empty());

        let delivered = sink.delivered.lock().await;
        assert!(delivered
            .iter()
            .any(|n| n.user_id == rider && n.message.contains("REJECTED")));

        let stored = repo.get_ride(ride_id).await.unwrap().unwrap();
        assert_eq!(stored.available_seats, 2);
    }

    #[tokio::test]
    async fn test_only_owner_can_respond() {
        let (_repo, _sink, lifecycle, _driver, ride_id) = setup(2).await;
        let rider = Uuid::new_v4();
        let impostor = Uuid::new_v4();

        lifecycle.request_to_join(ride_id, rider).await.unwrap();
        let err = lifecycle
            .respond_to_request(ride_id, impostor, rider, Decision::Accept)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_respond_to_unknown_request() {
        let (_repo, _sink, lifecycle, driver, ride_id) = setup(2).await;
        let stranger = Uuid::new_v4();

        let err = lifecycle
            .respond_to_request(ride_id, driver, stranger, Decision::Accept)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Ride(RideError::RequestNotFound)
        ));
    }

    #[tokio::test]
    async fn test_otp_verify_round_trip() {
        let (repo, _sink, lifecycle, driver, ride_id) = setup(1).await;
        let rider = Uuid::new_v4();

        lifecycle.request_to_join(ride_id, rider).await.unwrap();
        lifecycle
            .respond_to_request(ride_id, driver, rider, Decision::Accept)
            .await
            .unwrap();

        let stored = repo.get_ride(ride_id).await.unwrap().unwrap();
        let otp = stored.passengers[0].otp.expose().clone();

        let (boarded, ride) = lifecycle.verify_otp(ride_id, driver, &otp).await.unwrap();
        assert_eq!(boarded, rider);
        assert_eq!(ride.passengers[0].status, PassengerStatus::Onboard);

        // Replaying the same code fails once the rider is onboard.
        let err = lifecycle.verify_otp(ride_id, driver, &otp).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Ride(RideError::OtpNotFound)));
    }

    #[tokio::test]
    async fn test_verify_requires_owner() {
        let (_repo, _sink, lifecycle, _driver, ride_id) = setup(1).await;
        let impostor = Uuid::new_v4();

        let err = lifecycle
            .verify_otp(ride_id, impostor, "1234")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_accept() {
        let repo = Arc::new(InMemoryRideRepository::new());
        let lifecycle = RideLifecycle::new(repo.clone(), Arc::new(FailingSink));

        let driver = Uuid::new_v4();
        let ride = sample_ride(driver, 1);
        let ride_id = ride.id;
        repo.create_ride(&ride).await.unwrap();

        let rider = Uuid::new_v4();
        lifecycle.request_to_join(ride_id, rider).await.unwrap();
        let ride = lifecycle
            .respond_to_request(ride_id, driver, rider, Decision::Accept)
            .await
            .unwrap();

        assert_eq!(ride.available_seats, 0);
        assert_eq!(ride.riders, vec![rider]);
    }

    #[tokio::test]
    async fn test_delete_owner_only_and_idempotent_404() {
        let (_repo, _sink, lifecycle, driver, ride_id) = setup(2).await;
        let impostor = Uuid::new_v4();

        let err = lifecycle.delete_ride(ride_id, impostor).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotAuthorized(_)));

        lifecycle.delete_ride(ride_id, driver).await.unwrap();

        let err = lifecycle.delete_ride(ride_id, driver).await.unwrap_err();
        assert!(matches!(err, LifecycleError::RideNotFound));
    }

    #[tokio::test]
    async fn test_concurrent_accepts_never_oversell() {
        let (repo, _sink, lifecycle, driver, ride_id) = setup(1).await;
        let lifecycle = Arc::new(lifecycle);
        let rider_a = Uuid::new_v4();
        let rider_b = Uuid::new_v4();

        lifecycle.request_to_join(ride_id, rider_a).await.unwrap();
        lifecycle.request_to_join(ride_id, rider_b).await.unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for rider in [rider_a, rider_b] {
            let lifecycle = lifecycle.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                lifecycle
                    .respond_to_request(ride_id, driver, rider, Decision::Accept)
                    .await
            }));
        }

        let mut successes = 0;
        let mut seat_conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(LifecycleError::Ride(RideError::NoSeatsAvailable)) => seat_conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(seat_conflicts, 1);

        let stored = repo.get_ride(ride_id).await.unwrap().unwrap();
        assert_eq!(stored.available_seats, 0);
        assert_eq!(stored.riders.len(), 1);
        assert_eq!(stored.passengers.len(), 1);
        // The losing rider is still pending, not silently dropped.
        assert_eq!(stored.pending_riders.len(), 1);
    }
}
