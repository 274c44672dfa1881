use async_trait::async_trait;
use sqlx::{PgPool, Row};
use unipool_ride::models::Ride;
use unipool_ride::repository::{RideRepository, SaveOutcome};
use uuid::Uuid;

/// Document-per-ride persistence: the serialized aggregate lives in one
/// column, with `version` duplicated alongside as the conditional-update
/// precondition. `save_ride` is `UPDATE ... WHERE id = $1 AND version = $2`,
/// so two writers racing on the same ride resolve to exactly one applied
/// save and one conflict.
pub struct PostgresRideRepository {
    pool: PgPool,
}

impl PostgresRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(doc: &str) -> Result<Ride, serde_json::Error> {
        serde_json::from_str(doc)
    }
}

#[async_trait]
impl RideRepository for PostgresRideRepository {
    async fn create_ride(
        &self,
        ride: &Ride,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let doc = serde_json::to_string(ride)?;

        sqlx::query(
            r#"
            INSERT INTO rides (id, created_by, doc, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ride.id)
        .bind(ride.created_by)
        .bind(&doc)
        .bind(ride.version as i64)
        .bind(ride.created_at)
        .bind(ride.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_ride(
        &self,
        id: Uuid,
    ) -> Result<Option<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query("SELECT doc FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let doc: String = row.try_get("doc")?;
                Ok(Some(Self::decode(&doc)?))
            }
            None => Ok(None),
        }
    }

    async fn save_ride(
        &self,
        ride: &Ride,
    ) -> Result<SaveOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // Persist the document with the bumped version so the embedded copy
        // stays consistent with the column.
        let mut next = ride.clone();
        next.version += 1;
        let doc = serde_json::to_string(&next)?;

        let result = sqlx::query(
            r#"
            UPDATE rides
            SET doc = $3, version = $4, updated_at = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(ride.id)
        .bind(ride.version as i64)
        .bind(&doc)
        .bind(next.version as i64)
        .bind(next.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(SaveOutcome::VersionConflict)
        } else {
            Ok(SaveOutcome::Applied)
        }
    }

    async fn delete_ride(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query("SELECT doc FROM rides ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut rides = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: String = row.try_get("doc")?;
            rides.push(Self::decode(&doc)?);
        }
        Ok(rides)
    }

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<Ride>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query("SELECT doc FROM rides WHERE created_by = $1 ORDER BY created_at DESC")
            .bind(driver_id)
            .fetch_all(&self.pool)
            .await?;

        let mut rides = Vec::with_capacity(rows.len());
        for row in rows {
            let doc: String = row.try_get("doc")?;
            rides.push(Self::decode(&doc)?);
        }
        Ok(rides)
    }
}
