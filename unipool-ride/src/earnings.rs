use crate::models::Ride;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Read-side totals for a driver. Period sums always cover the entire
/// matching ride set; any cap applied to a detail listing must not leak
/// into these numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub total_rides: usize,
    pub total_earnings: i64,
    pub daily_totals: BTreeMap<String, i64>,
    pub weekly_totals: BTreeMap<String, i64>,
    pub monthly_totals: BTreeMap<String, i64>,
}

/// Summarizes completed postings into daily/weekly/monthly earnings.
pub struct EarningsAggregator;

impl EarningsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Grouping key for the day the ride is scheduled (not when it was
    /// posted): `YYYY-MM-DD`.
    pub fn day_key(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// ISO week-year plus two-digit ISO week: `YYYY-Www`. Around new year
    /// the week-year differs from the calendar year on purpose.
    pub fn week_key(date: NaiveDate) -> String {
        let iso = date.iso_week();
        format!("{}-W{:02}", iso.year(), iso.week())
    }

    pub fn summarize(&self, driver_id: Uuid, rides: &[Ride]) -> DriverStats {
        let mut stats = DriverStats::default();

        for ride in rides.iter().filter(|r| r.created_by == driver_id) {
            let earnings = i64::from(ride.driver_earnings);
            stats.total_rides += 1;
            stats.total_earnings += earnings;

            let day = Self::day_key(ride.date);
            let month = day[..7].to_string();
            let week = Self::week_key(ride.date);

            *stats.daily_totals.entry(day).or_insert(0) += earnings;
            *stats.weekly_totals.entry(week).or_insert(0) += earnings;
            *stats.monthly_totals.entry(month).or_insert(0) += earnings;
        }

        stats
    }
}

impl Default for EarningsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRide;
    use unipool_fare::VehicleClass;

    fn ride_on(driver: Uuid, date: NaiveDate, earnings: i32) -> Ride {
        Ride::new(NewRide {
            source: "Campus".to_string(),
            destination: "City Centre".to_string(),
            source_coords: None,
            dest_coords: None,
            date,
            time: "09:00".to_string(),
            available_seats: 3,
            vehicle_class: VehicleClass::Car,
            created_by: driver,
            distance_km: 8.0,
            duration_min: 16,
            price: earnings * 5 / 4,
            driver_earnings: earnings,
        })
    }

    #[test]
    fn test_totals_and_grouping() {
        let driver = Uuid::new_v4();
        let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();

        let rides = vec![
            ride_on(driver, d1, 100),
            ride_on(driver, d2, 150),
            ride_on(driver, d3, 200),
        ];

        let stats = EarningsAggregator::new().summarize(driver, &rides);

        assert_eq!(stats.total_rides, 3);
        assert_eq!(stats.total_earnings, 450);
        assert_eq!(stats.daily_totals["2026-03-02"], 250);
        assert_eq!(stats.daily_totals["2026-04-10"], 200);
        assert_eq!(stats.monthly_totals["2026-03"], 250);
        assert_eq!(stats.monthly_totals["2026-04"], 200);
    }

    #[test]
    fn test_other_drivers_excluded() {
        let driver = Uuid::new_v4();
        let other = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        let rides = vec![
            ride_on(driver, date, 120),
            ride_on(other, date, 999),
        ];

        let stats = EarningsAggregator::new().summarize(driver, &rides);
        assert_eq!(stats.total_rides, 1);
        assert_eq!(stats.total_earnings, 120);
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2024-12-30 falls in ISO week 1 of 2025.
        let cross = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(EarningsAggregator::week_key(cross), "2025-W01");

        // 2021-01-01 falls in ISO week 53 of 2020.
        let late = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(EarningsAggregator::week_key(late), "2020-W53");

        let plain = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert_eq!(EarningsAggregator::week_key(plain), "2026-W25");
    }

    #[test]
    fn test_weekly_totals_accumulate_within_week() {
        let driver = Uuid::new_v4();
        // Monday and Friday of the same ISO week.
        let mon = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let fri = NaiveDate::from_ymd_opt(2026, 6, 19).unwrap();

        let rides = vec![ride_on(driver, mon, 80), ride_on(driver, fri, 70)];
        let stats = EarningsAggregator::new().summarize(driver, &rides);

        assert_eq!(stats.weekly_totals.len(), 1);
        assert_eq!(stats.weekly_totals["2026-W25"], 150);
    }

    #[test]
    fn test_totals_reconcile_with_full_set() {
        let driver = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();

        let rides: Vec<Ride> = (0..50).map(|_| ride_on(driver, date, 10)).collect();
        let stats = EarningsAggregator::new().summarize(driver, &rides);

        // A caller capping the detail list must still see full-set totals.
        let capped: Vec<&Ride> = rides.iter().take(20).collect();
        assert_eq!(capped.len(), 20);
        assert_eq!(stats.total_earnings, 500);
        assert_eq!(stats.total_rides, 50);
    }
}
