use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use unipool_core::directory::{UserDirectory, UserProfile};
use uuid::Uuid;

/// Fixed user table seeded at startup. Stands in for the campus identity
/// service in tests and demos.
pub struct StaticUserDirectory {
    profiles: HashMap<Uuid, UserProfile>,
    verified_drivers: HashSet<Uuid>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            verified_drivers: HashSet::new(),
        }
    }

    pub fn with_user(mut self, profile: UserProfile, verified_driver: bool) -> Self {
        if verified_driver {
            self.verified_drivers.insert(profile.id);
        }
        self.profiles.insert(profile.id, profile);
        self
    }
}

impl Default for StaticUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn get_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.profiles.get(&user_id).cloned())
    }

    async fn is_verified_driver(
        &self,
        user_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.verified_drivers.contains(&user_id))
    }
}

/// Development directory that accepts any authenticated user as a verified
/// driver and synthesizes a display profile from the id. Replaced by the
/// real identity-service adapter in deployment.
pub struct PermissiveUserDirectory;

#[async_trait]
impl UserDirectory for PermissiveUserDirectory {
    async fn get_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserProfile>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Some(UserProfile {
            id: user_id,
            name: format!("Campus user {}", &user_id.to_string()[..8]),
            email: format!("{}@campus.example", user_id.simple()),
            phone_number: None,
        }))
    }

    async fn is_verified_driver(
        &self,
        _user_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();

        let directory = StaticUserDirectory::new()
            .with_user(
                UserProfile {
                    id: driver,
                    name: "Asha".to_string(),
                    email: "asha@campus.example".to_string(),
                    phone_number: Some("9000000001".to_string()),
                },
                true,
            )
            .with_user(
                UserProfile {
                    id: rider,
                    name: "Ravi".to_string(),
                    email: "ravi@campus.example".to_string(),
                    phone_number: None,
                },
                false,
            );

        assert!(directory.is_verified_driver(driver).await.unwrap());
        assert!(!directory.is_verified_driver(rider).await.unwrap());
        assert!(directory.get_profile(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(
            directory.get_profile(rider).await.unwrap().unwrap().name,
            "Ravi"
        );
    }
}
