pub mod earnings;
pub mod lifecycle;
pub mod models;
pub mod otp;
pub mod repository;

pub use earnings::{DriverStats, EarningsAggregator};
pub use lifecycle::{Decision, LifecycleError, RideLifecycle};
pub use models::{NewRide, Passenger, PassengerStatus, Ride, RideError};
pub use repository::{InMemoryRideRepository, RideRepository, SaveOutcome};
