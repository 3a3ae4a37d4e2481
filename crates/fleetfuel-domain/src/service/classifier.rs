//! Status classification

use fleetfuel_types::VehicleStatus;

use crate::model::ConsumptionMetrics;

/// Below this share of the theoretical rate consumption is implausible
pub const SUSPICIOUS_FACTOR: f64 = 0.85;

/// Assign exactly one status. Rules are checked in order; first match wins.
pub fn classify(
    distance_km: f64,
    liters: f64,
    theoretical_rate: Option<f64>,
    metrics: &ConsumptionMetrics,
) -> VehicleStatus {
    if distance_km == 0.0 && liters == 0.0 {
        return VehicleStatus::NoMovement;
    }
    if distance_km > 0.0 && liters == 0.0 {
        return VehicleStatus::MissingFuelLoad;
    }
    if distance_km == 0.0 && liters > 0.0 {
        return VehicleStatus::DistanceError;
    }

    let (actual, theoretical) = match (metrics.actual_rate, theoretical_rate) {
        (Some(actual), Some(theoretical)) => (actual, theoretical),
        _ => return VehicleStatus::NoData,
    };
    let (low, high) = match (metrics.tolerance_low, metrics.tolerance_high) {
        (Some(low), Some(high)) => (low, high),
        _ => return VehicleStatus::NoData,
    };
    let floor = theoretical * SUSPICIOUS_FACTOR;

    if actual < floor {
        VehicleStatus::Suspicious
    } else if low <= actual && actual <= high {
        VehicleStatus::Normal
    } else if floor <= actual && actual < low {
        // better than expected but still plausible
        VehicleStatus::Normal
    } else if actual > high {
        VehicleStatus::NeedsAudit
    } else {
        VehicleStatus::NoData
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::calculator::{compute_metrics, DEFAULT_TOLERANCE};

    /// Classify a vehicle whose observed rate is exactly `actual`
    fn at_rate(actual: f64, theoretical: f64) -> VehicleStatus {
        let mut metrics = compute_metrics(100.0, actual, Some(theoretical), DEFAULT_TOLERANCE);
        metrics.actual_rate = Some(actual);
        classify(100.0, actual, Some(theoretical), &metrics)
    }

    fn status(distance: f64, liters: f64, theoretical: Option<f64>) -> VehicleStatus {
        let metrics = compute_metrics(distance, liters, theoretical, DEFAULT_TOLERANCE);
        classify(distance, liters, theoretical, &metrics)
    }

    #[test]
    fn test_movement_rules_come_first() {
        assert_eq!(status(0.0, 0.0, Some(30.0)), VehicleStatus::NoMovement);
        assert_eq!(status(0.0, 0.0, None), VehicleStatus::NoMovement);
        assert_eq!(status(100.0, 0.0, Some(30.0)), VehicleStatus::MissingFuelLoad);
        assert_eq!(status(100.0, 0.0, None), VehicleStatus::MissingFuelLoad);
        assert_eq!(status(0.0, 50.0, Some(30.0)), VehicleStatus::DistanceError);
    }

    #[test]
    fn test_missing_reference_is_no_data() {
        assert_eq!(status(100.0, 30.0, None), VehicleStatus::NoData);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(at_rate(27.0, 30.0), VehicleStatus::Normal);
        assert_eq!(at_rate(33.0, 30.0), VehicleStatus::Normal);
        assert_eq!(at_rate(33.01, 30.0), VehicleStatus::NeedsAudit);
        assert_eq!(at_rate(25.49, 30.0), VehicleStatus::Suspicious);
        assert_eq!(at_rate(25.5, 30.0), VehicleStatus::Normal);
        assert_eq!(at_rate(26.0, 30.0), VehicleStatus::Normal);
    }

    #[test]
    fn test_zero_theoretical_rate() {
        assert_eq!(at_rate(10.0, 0.0), VehicleStatus::NeedsAudit);
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(status(200.0, 30.0, Some(12.0)), VehicleStatus::NeedsAudit);
        }
    }
}
