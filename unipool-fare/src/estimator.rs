use crate::rates::{RateCard, VehicleClass, COMMISSION_RATE};
use serde::{Deserialize, Serialize};

/// Component-level audit trail for a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: i32,
    pub distance_fare: i32,
    pub time_fare: i32,
    pub minimum_fare_applied: bool,
    pub platform_fee: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareQuote {
    pub rider_cost: i32,
    pub driver_earnings: i32,
    pub breakdown: FareBreakdown,
}

#[derive(Debug, thiserror::Error)]
pub enum FareError {
    #[error("distance must be a finite, non-negative number")]
    InvalidDistance,
}

/// Quote a trip: tariff components summed, clamped up to the class minimum,
/// rounded to whole rupees, commission withheld. Deterministic for a given
/// input; the result is snapshotted onto the ride at creation and never
/// recomputed.
pub fn estimate_fare(
    distance_km: f64,
    duration_min: u32,
    class: VehicleClass,
) -> Result<FareQuote, FareError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(FareError::InvalidDistance);
    }

    let card = RateCard::for_class(class);

    let distance_cost = distance_km * card.cost_per_km;
    let time_cost = duration_min as f64 * card.cost_per_min;

    let raw_total = card.base_fare + distance_cost + time_cost + card.booking_fee;

    let minimum_fare_applied = raw_total <= card.minimum_fare;
    let total = if minimum_fare_applied {
        card.minimum_fare
    } else {
        raw_total
    };

    let rider_cost = total.round() as i32;
    let platform_fee = (rider_cost as f64 * COMMISSION_RATE).round() as i32;
    let driver_earnings = rider_cost - platform_fee;

    Ok(FareQuote {
        rider_cost,
        driver_earnings,
        breakdown: FareBreakdown {
            base_fare: card.base_fare.round() as i32,
            distance_fare: distance_cost.round() as i32,
            time_fare: time_cost.round() as i32,
            minimum_fare_applied,
            platform_fee,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_fare_floor_car() {
        let quote = estimate_fare(0.0, 0, VehicleClass::Car).unwrap();

        assert_eq!(quote.rider_cost, 85);
        assert_eq!(quote.breakdown.platform_fee, 17);
        assert_eq!(quote.driver_earnings, 68);
        assert!(quote.breakdown.minimum_fare_applied);
    }

    #[test]
    fn test_minimum_fare_floor_bike() {
        let quote = estimate_fare(0.0, 0, VehicleClass::Bike).unwrap();

        assert_eq!(quote.rider_cost, 30);
        assert_eq!(quote.driver_earnings, 24);
        assert!(quote.breakdown.minimum_fare_applied);
    }

    #[test]
    fn test_standard_car_trip() {
        // 50 base + 10km * 15 + 20min * 2 = 240, well above the floor.
        let quote = estimate_fare(10.0, 20, VehicleClass::Car).unwrap();

        assert_eq!(quote.rider_cost, 240);
        assert_eq!(quote.breakdown.distance_fare, 150);
        assert_eq!(quote.breakdown.time_fare, 40);
        assert_eq!(quote.breakdown.platform_fee, 48);
        assert_eq!(quote.driver_earnings, 192);
        assert!(!quote.breakdown.minimum_fare_applied);
    }

    #[test]
    fn test_fractional_distance_rounding() {
        // 50 + 3.33 * 15 + 7 * 2 = 113.95 -> 114
        let quote = estimate_fare(3.33, 7, VehicleClass::Car).unwrap();
        assert_eq!(quote.rider_cost, 114);
        assert_eq!(quote.driver_earnings, 114 - 23);
    }

    #[test]
    fn test_rejects_negative_distance() {
        assert!(estimate_fare(-0.1, 5, VehicleClass::Car).is_err());
        assert!(estimate_fare(f64::NAN, 5, VehicleClass::Car).is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = estimate_fare(12.75, 31, VehicleClass::Bike).unwrap();
        let b = estimate_fare(12.75, 31, VehicleClass::Bike).unwrap();
        assert_eq!(a, b);
    }
}
