//! Consumption reconciliation pipeline
//!
//! normalize -> clean -> aggregate -> merge -> metrics -> classify.
//! Pure: tables in, run out.

use fleetfuel_types::{InputSource, Result};

use crate::model::{ConsumptionRun, Table, VehicleRecord};
use crate::service::aggregator::{aggregate_distance, aggregate_liters};
use crate::service::calculator::compute_metrics;
use crate::service::classifier::classify;
use crate::service::cleaner::{clean_consumption, clean_distance, clean_reference};
use crate::service::merger::merge_sources;
use crate::service::normalizer::{
    normalize_columns, CONSUMPTION_ALIASES, DISTANCE_ALIASES, REFERENCE_ALIASES,
};

/// The three raw tables one run reconciles
#[derive(Debug, Clone, Default)]
pub struct ConsumptionInputs {
    pub consumption: Table,
    pub distance: Table,
    pub reference: Table,
}

pub fn run_consumption_pipeline(inputs: ConsumptionInputs, tolerance: f64) -> Result<ConsumptionRun> {
    let consumption = normalize_columns(inputs.consumption, &CONSUMPTION_ALIASES)?;
    let distance = normalize_columns(inputs.distance, &DISTANCE_ALIASES)?;
    let reference = normalize_columns(inputs.reference, &REFERENCE_ALIASES)?;

    let loads = clean_consumption(&consumption)?;
    let trips = clean_distance(&distance)?;
    let nomenclature = clean_reference(&reference)?;

    let mut empty_inputs = Vec::new();
    for (input, valid) in [
        (InputSource::Consumption, loads.valid.len()),
        (InputSource::Distance, trips.valid.len()),
        (InputSource::Reference, nomenclature.valid.len()),
    ] {
        if valid == 0 {
            empty_inputs.push(input);
        }
    }

    let merged = merge_sources(
        &aggregate_distance(&trips.valid),
        &aggregate_liters(&loads.valid),
        &nomenclature.valid,
    );

    let records = merged
        .into_iter()
        .map(|vehicle| {
            let metrics = compute_metrics(
                vehicle.distance_km,
                vehicle.liters,
                vehicle.theoretical_rate,
                tolerance,
            );
            let status = classify(
                vehicle.distance_km,
                vehicle.liters,
                vehicle.theoretical_rate,
                &metrics,
            );
            VehicleRecord {
                identifier: vehicle.identifier,
                model: vehicle.model,
                distance_km: vehicle.distance_km,
                liters: vehicle.liters,
                theoretical_rate: vehicle.theoretical_rate,
                metrics,
                status,
            }
        })
        .collect();

    let mut rejected = loads.rejected;
    rejected.extend(trips.rejected);
    rejected.extend(nomenclature.rejected);

    Ok(ConsumptionRun {
        tolerance,
        records,
        rejected,
        quality: vec![loads.quality, trips.quality, nomenclature.quality],
        empty_inputs,
    })
}
