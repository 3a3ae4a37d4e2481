//! Consumption metrics for one vehicle

use crate::model::ConsumptionMetrics;

/// Default symmetric tolerance around the theoretical rate
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Derive rate, expectation, deviation and tolerance band.
///
/// Every quantity that depends on missing or zero data is None rather
/// than a sentinel number.
pub fn compute_metrics(
    distance_km: f64,
    liters: f64,
    theoretical_rate: Option<f64>,
    tolerance: f64,
) -> ConsumptionMetrics {
    let actual_rate = if distance_km > 0.0 {
        Some(liters / distance_km * 100.0)
    } else {
        None
    };

    let expected_liters = theoretical_rate.map(|t| distance_km * t / 100.0);
    let deviation_liters = expected_liters.map(|expected| liters - expected);
    let deviation_ratio = match (deviation_liters, expected_liters) {
        (Some(deviation), Some(expected)) if expected > 0.0 => Some(deviation / expected),
        _ => None,
    };

    ConsumptionMetrics {
        actual_rate,
        expected_liters,
        deviation_liters,
        deviation_ratio,
        tolerance_low: theoretical_rate.map(|t| t * (1.0 - tolerance)),
        tolerance_high: theoretical_rate.map(|t| t * (1.0 + tolerance)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_metrics_for_high_consumer() {
        let m = compute_metrics(200.0, 30.0, Some(12.0), DEFAULT_TOLERANCE);
        assert!(close(m.actual_rate, 15.0));
        assert!(close(m.expected_liters, 24.0));
        assert!(close(m.deviation_liters, 6.0));
        assert!(close(m.deviation_ratio, 0.25));
        assert!(close(m.tolerance_low, 10.8));
        assert!(close(m.tolerance_high, 13.2));
    }

    #[test]
    fn test_zero_distance_leaves_rate_undefined() {
        let m = compute_metrics(0.0, 50.0, Some(30.0), DEFAULT_TOLERANCE);
        assert_eq!(m.actual_rate, None);
        assert!(close(m.expected_liters, 0.0));
        assert!(close(m.deviation_liters, 50.0));
        assert_eq!(m.deviation_ratio, None);
    }

    #[test]
    fn test_missing_reference_propagates() {
        let m = compute_metrics(100.0, 30.0, None, DEFAULT_TOLERANCE);
        assert!(close(m.actual_rate, 30.0));
        assert_eq!(m.expected_liters, None);
        assert_eq!(m.deviation_liters, None);
        assert_eq!(m.deviation_ratio, None);
        assert_eq!(m.tolerance_low, None);
        assert_eq!(m.tolerance_high, None);
    }

    #[test]
    fn test_zero_tolerance_collapses_band() {
        let m = compute_metrics(100.0, 30.0, Some(30.0), 0.0);
        assert_eq!(m.tolerance_low, Some(30.0));
        assert_eq!(m.tolerance_high, Some(30.0));
    }
}
