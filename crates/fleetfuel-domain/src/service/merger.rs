//! Full outer join of the three sources on identifier

use std::collections::{BTreeMap, HashSet};

use crate::model::{MergedVehicle, ReferenceRow, VehicleTotal};

/// Join aggregated distance, aggregated liters and the reference table.
///
/// Every identifier present in any source appears exactly once, ordered by
/// identifier. Absent distance or liters read as 0; an absent reference
/// leaves model and theoretical rate empty. For repeated reference rows the
/// first one wins.
pub fn merge_sources(
    distance: &[VehicleTotal],
    liters: &[VehicleTotal],
    reference: &[ReferenceRow],
) -> Vec<MergedVehicle> {
    let mut merged: BTreeMap<&str, MergedVehicle> = BTreeMap::new();

    let slot = |identifier: &str| -> MergedVehicle {
        MergedVehicle {
            identifier: identifier.to_string(),
            model: None,
            distance_km: 0.0,
            liters: 0.0,
            theoretical_rate: None,
        }
    };

    for total in distance {
        let vehicle = merged
            .entry(total.identifier.as_str())
            .or_insert_with(|| slot(&total.identifier));
        vehicle.distance_km += total.total.max(0.0);
    }

    for total in liters {
        let vehicle = merged
            .entry(total.identifier.as_str())
            .or_insert_with(|| slot(&total.identifier));
        vehicle.liters += total.total.max(0.0);
    }

    let mut referenced = HashSet::new();
    for row in reference {
        if !referenced.insert(row.identifier.as_str()) {
            continue;
        }
        let vehicle = merged
            .entry(row.identifier.as_str())
            .or_insert_with(|| slot(&row.identifier));
        vehicle.model = row.model.clone();
        vehicle.theoretical_rate = row.theoretical_rate;
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(id: &str, value: f64) -> VehicleTotal {
        VehicleTotal {
            identifier: id.to_string(),
            total: value,
            row_count: 1,
        }
    }

    fn reference(id: &str, model: &str, rate: Option<f64>) -> ReferenceRow {
        ReferenceRow {
            identifier: id.to_string(),
            model: Some(model.to_string()),
            theoretical_rate: rate,
        }
    }

    #[test]
    fn test_outer_join_keeps_every_identifier() {
        let merged = merge_sources(
            &[total("ABC123", 200.0)],
            &[total("AB123CD", 40.0)],
            &[reference("XYZ999", "IVECO", Some(30.0))],
        );
        let ids: Vec<&str> = merged.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(ids, vec!["AB123CD", "ABC123", "XYZ999"]);

        assert_eq!(merged[0].distance_km, 0.0);
        assert_eq!(merged[0].liters, 40.0);
        assert_eq!(merged[0].theoretical_rate, None);

        assert_eq!(merged[1].distance_km, 200.0);
        assert_eq!(merged[1].liters, 0.0);

        assert_eq!(merged[2].model.as_deref(), Some("IVECO"));
        assert_eq!(merged[2].distance_km, 0.0);
        assert_eq!(merged[2].liters, 0.0);
    }

    #[test]
    fn test_first_reference_wins() {
        let merged = merge_sources(
            &[],
            &[],
            &[
                reference("ABC123", "SCANIA", Some(32.0)),
                reference("ABC123", "OTRO", Some(99.0)),
            ],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].model.as_deref(), Some("SCANIA"));
        assert_eq!(merged[0].theoretical_rate, Some(32.0));
    }

    #[test]
    fn test_merged_measures_never_negative() {
        let merged = merge_sources(&[total("ABC123", -5.0)], &[total("ABC123", -1.0)], &[]);
        assert!(merged[0].distance_km >= 0.0);
        assert!(merged[0].liters >= 0.0);
    }
}
