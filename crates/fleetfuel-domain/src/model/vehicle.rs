//! Vehicle consumption records, from raw rows to classified output

use fleetfuel_types::{InputSource, VehicleStatus};
use serde::{Deserialize, Serialize};

/// One fuel card transaction after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelLoadRow {
    pub identifier: String,
    /// None when the liters cell could not be read as a number
    pub liters: Option<f64>,
}

/// One trip-distance entry after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRow {
    pub identifier: String,
    pub distance_km: Option<f64>,
}

/// One nomenclature entry after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub identifier: String,
    pub model: Option<String>,
    /// Theoretical consumption in L/100km
    pub theoretical_rate: Option<f64>,
}

/// A row set aside because its identifier failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub input: InputSource,
    /// Spreadsheet row number (header is row 1)
    pub row_number: usize,
    /// Identifier after trim/uppercase (may be empty)
    pub identifier: String,
    /// Measure carried by the row, if any
    pub value: Option<f64>,
}

/// Per-source data quality counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuality {
    pub input: InputSource,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rejected_rows: usize,
    /// Valid rows whose measure was unreadable or negative
    pub missing_values: usize,
    /// Repeated identifiers ignored after the first (reference only)
    #[serde(default)]
    pub duplicate_rows: usize,
}

/// Sum of one measure for one identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTotal {
    pub identifier: String,
    pub total: f64,
    pub row_count: usize,
}

/// Outer-join result before metrics are derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedVehicle {
    pub identifier: String,
    pub model: Option<String>,
    pub distance_km: f64,
    pub liters: f64,
    pub theoretical_rate: Option<f64>,
}

/// Derived consumption figures; None means "insufficient data"
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsumptionMetrics {
    /// Observed L/100km
    pub actual_rate: Option<f64>,
    pub expected_liters: Option<f64>,
    pub deviation_liters: Option<f64>,
    /// deviation_liters / expected_liters
    pub deviation_ratio: Option<f64>,
    pub tolerance_low: Option<f64>,
    pub tolerance_high: Option<f64>,
}

/// Final per-vehicle output of the consumption pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub identifier: String,
    pub model: Option<String>,
    pub distance_km: f64,
    pub liters: f64,
    pub theoretical_rate: Option<f64>,
    pub metrics: ConsumptionMetrics,
    pub status: VehicleStatus,
}

/// Everything one pipeline run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRun {
    pub tolerance: f64,
    pub records: Vec<VehicleRecord>,
    pub rejected: Vec<RejectedRow>,
    pub quality: Vec<SourceQuality>,
    /// Inputs with zero valid rows after cleaning
    pub empty_inputs: Vec<InputSource>,
}

impl ConsumptionRun {
    pub fn count_status(&self, status: VehicleStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}
