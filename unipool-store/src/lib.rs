pub mod app_config;
pub mod database;
pub mod directory;
pub mod notifications;
pub mod ride_repo;

pub use database::DbClient;
pub use directory::{PermissiveUserDirectory, StaticUserDirectory};
pub use notifications::InMemoryNotificationStore;
pub use ride_repo::PostgresRideRepository;
