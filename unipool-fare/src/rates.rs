use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform commission withheld from the rider cost.
pub const COMMISSION_RATE: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleClass {
    Car,
    Bike,
}

impl VehicleClass {
    /// Most seats a driver may offer for this class (driver excluded).
    pub fn max_seats(&self) -> u32 {
        match self {
            VehicleClass::Car => 6,
            VehicleClass::Bike => 1,
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Car => write!(f, "Car"),
            VehicleClass::Bike => write!(f, "Bike"),
        }
    }
}

/// Fixed per-class tariff. Metro-city estimates, INR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCard {
    pub base_fare: f64,
    pub cost_per_km: f64,
    pub cost_per_min: f64,
    pub booking_fee: f64,
    pub minimum_fare: f64,
}

impl RateCard {
    pub fn for_class(class: VehicleClass) -> Self {
        match class {
            VehicleClass::Car => Self {
                base_fare: 50.0,
                cost_per_km: 15.0,
                cost_per_min: 2.0,
                booking_fee: 0.0,
                minimum_fare: 85.0,
            },
            VehicleClass::Bike => Self {
                base_fare: 25.0,
                cost_per_km: 8.0,
                cost_per_min: 1.0,
                booking_fee: 0.0,
                minimum_fare: 30.0,
            },
        }
    }
}
