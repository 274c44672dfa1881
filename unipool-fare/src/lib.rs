pub mod estimator;
pub mod rates;

pub use estimator::{estimate_fare, FareBreakdown, FareError, FareQuote};
pub use rates::{RateCard, VehicleClass, COMMISSION_RATE};
