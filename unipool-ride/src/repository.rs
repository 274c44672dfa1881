use crate::models::Ride;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Result of a conditional save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Applied,
    /// Another writer saved the ride since it was loaded; the caller must
    /// reload and reapply.
    VersionConflict,
}

/// Repository trait for ride persistence.
///
/// `save_ride` is the concurrency-control point: implementations persist
/// the document only if the stored version still equals `ride.version`,
/// bumping the stored version by one on success.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create_ride(
        &self,
        ride: &Ride,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_ride(
        &self,
        id: Uuid,
    ) -> Result<Option<Ride>, Box<dyn std::error::Error + Send + Sync>>;

    async fn save_ride(
        &self,
        ride: &Ride,
    ) -> Result<SaveOutcome, Box<dyn std::error::Error + Send + Sync>>;

    /// Hard delete. Returns false when the ride no longer exists.
    async fn delete_ride(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// All rides, newest first.
    async fn list_rides(&self) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>>;

    /// Rides posted by one driver, newest first.
    async fn list_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory repository with the same conditional-save semantics as the
/// Postgres implementation in `unipool-store`. Backs unit and integration
/// tests.
pub struct InMemoryRideRepository {
    rides: Mutex<HashMap<Uuid, Ride>>,
}

impl InMemoryRideRepository {
    pub fn new() -> Self {
        Self {
            rides: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRideRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideRepository for InMemoryRideRepository {
    async fn create_ride(
        &self,
        ride: &Ride,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut rides = self.rides.lock().await;
        rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn get_ride(
        &self,
        id: Uuid,
    ) -> Result<Option<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let rides = self.rides.lock().await;
        Ok(rides.get(&id).cloned())
    }

    async fn save_ride(
        &self,
        ride: &Ride,
    ) -> Result<SaveOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut rides = self.rides.lock().await;
        match rides.get_mut(&ride.id) {
            Some(stored) if stored.version == ride.version => {
                let mut updated = ride.clone();
                updated.version += 1;
                *stored = updated;
                Ok(SaveOutcome::Applied)
            }
            Some(_) => Ok(SaveOutcome::VersionConflict),
            None => Err(format!("ride {} vanished during save", ride.id).into()),
        }
    }

    async fn delete_ride(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut rides = self.rides.lock().await;
        Ok(rides.remove(&id).is_some())
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let rides = self.rides.lock().await;
        let mut all: Vec<Ride> = rides.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let rides = self.rides.lock().await;
        let mut mine: Vec<Ride> = rides
            .values()
            .filter(|r| r.created_by == driver_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }
}
