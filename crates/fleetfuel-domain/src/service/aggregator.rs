//! Per-identifier aggregation

use std::collections::BTreeMap;

use crate::model::{DistanceRow, FuelLoadRow, VehicleTotal};

/// Sum `(identifier, measure)` pairs into one total per identifier.
///
/// Missing measures contribute 0 but still make the identifier present.
/// Output is ordered by identifier.
pub fn sum_by_identifier<'a, I>(rows: I) -> Vec<VehicleTotal>
where
    I: IntoIterator<Item = (&'a str, Option<f64>)>,
{
    let mut groups: BTreeMap<&'a str, (f64, usize)> = BTreeMap::new();
    for (identifier, value) in rows {
        let entry = groups.entry(identifier).or_insert((0.0, 0));
        entry.0 += value.unwrap_or(0.0);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(identifier, (total, row_count))| VehicleTotal {
            identifier: identifier.to_string(),
            total,
            row_count,
        })
        .collect()
}

/// Total liters loaded per identifier
pub fn aggregate_liters(rows: &[FuelLoadRow]) -> Vec<VehicleTotal> {
    sum_by_identifier(rows.iter().map(|r| (r.identifier.as_str(), r.liters)))
}

/// Total kilometers driven per identifier
pub fn aggregate_distance(rows: &[DistanceRow]) -> Vec<VehicleTotal> {
    sum_by_identifier(rows.iter().map(|r| (r.identifier.as_str(), r.distance_km)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(id: &str, liters: Option<f64>) -> FuelLoadRow {
        FuelLoadRow {
            identifier: id.to_string(),
            liters,
        }
    }

    #[test]
    fn test_sums_repeated_identifier() {
        let totals = aggregate_liters(&[load("ABC123", Some(10.0)), load("ABC123", Some(5.0))]);
        assert_eq!(totals.len(), 1);
        assert!((totals[0].total - 15.0).abs() < 1e-9);
        assert_eq!(totals[0].row_count, 2);
    }

    #[test]
    fn test_one_row_per_identifier_sorted() {
        let totals = aggregate_liters(&[
            load("AB123CD", Some(1.0)),
            load("ABC123", Some(2.0)),
            load("AB123CD", Some(3.0)),
        ]);
        let ids: Vec<&str> = totals.iter().map(|t| t.identifier.as_str()).collect();
        assert_eq!(ids, vec!["AB123CD", "ABC123"]);
        assert!((totals[0].total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_measure_keeps_identifier() {
        let totals = aggregate_distance(&[DistanceRow {
            identifier: "ABC123".to_string(),
            distance_km: None,
        }]);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].total, 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_liters(&[]).is_empty());
    }
}
