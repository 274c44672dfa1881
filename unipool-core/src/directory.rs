use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display projection of a campus user, resolved at the API boundary.
/// Account management itself lives in the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Lookup side of the external identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, Box<dyn std::error::Error + Send + Sync>>;

    /// Whether the user has completed driver verification (license and
    /// vehicle documents reviewed upstream).
    async fn is_verified_driver(
        &self,
        user_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
