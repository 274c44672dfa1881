use std::sync::Arc;
use tokio::sync::broadcast;
use unipool_core::directory::UserDirectory;
use unipool_core::routing::RoutePlanner;
use unipool_ride::{RideLifecycle, RideRepository};
use unipool_shared::models::events::RideEvent;
use unipool_store::app_config::BusinessRules;
use unipool_store::InMemoryNotificationStore;

#[derive(Clone)]
pub struct AppState {
    pub rides: Arc<dyn RideRepository>,
    pub lifecycle: Arc<RideLifecycle>,
    pub planner: Arc<RoutePlanner>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub events_tx: broadcast::Sender<RideEvent>,
    pub business_rules: BusinessRules,
}
