//! Core types for fleet fuel consumption control

mod error;

pub use error::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Which spreadsheet a table or row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Fuel card transactions (consumo real)
    Consumption,
    /// Trip distances (distancias)
    Distance,
    /// Vehicle nomenclature with theoretical consumption (nomina)
    Reference,
    /// Logistics settlement sheet (liq_comb)
    Logistics,
}

impl InputSource {
    pub fn label(&self) -> &'static str {
        match self {
            InputSource::Consumption => "consumption",
            InputSource::Distance => "distance",
            InputSource::Reference => "reference",
            InputSource::Logistics => "logistics",
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operational status assigned to each vehicle.
///
/// Declaration order is the order used in status summaries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    /// Consumption above the tolerance band
    NeedsAudit,
    /// Consumption implausibly low (suspected bad data)
    Suspicious,
    /// Within the tolerance band or the better-than-expected band
    Normal,
    /// Distance recorded but no fuel loaded
    MissingFuelLoad,
    /// Fuel loaded but no distance recorded
    DistanceError,
    /// Neither distance nor fuel
    NoMovement,
    /// Missing reference or rate data
    NoData,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 7] = [
        VehicleStatus::NeedsAudit,
        VehicleStatus::Suspicious,
        VehicleStatus::Normal,
        VehicleStatus::MissingFuelLoad,
        VehicleStatus::DistanceError,
        VehicleStatus::NoMovement,
        VehicleStatus::NoData,
    ];

    /// Operator-facing label (Spanish, as used on the fleet dashboards)
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::NeedsAudit => "A AUDITAR",
            VehicleStatus::Suspicious => "DUDOSO",
            VehicleStatus::Normal => "NORMAL",
            VehicleStatus::MissingFuelLoad => "FALTA CARGA",
            VehicleStatus::DistanceError => "ERROR DE KM",
            VehicleStatus::NoMovement => "SIN MOVIMIENTO",
            VehicleStatus::NoData => "SIN DATOS",
        }
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            VehicleStatus::NeedsAudit => "needs_audit",
            VehicleStatus::Suspicious => "suspicious",
            VehicleStatus::Normal => "normal",
            VehicleStatus::MissingFuelLoad => "missing_fuel_load",
            VehicleStatus::DistanceError => "distance_error",
            VehicleStatus::NoMovement => "no_movement",
            VehicleStatus::NoData => "no_data",
        }
    }

    /// Color marker shown next to the status in tables
    pub fn marker(&self) -> &'static str {
        match self {
            VehicleStatus::NeedsAudit => "🔴",
            VehicleStatus::Suspicious => "🔵",
            VehicleStatus::Normal => "🟢",
            VehicleStatus::MissingFuelLoad => "🟣",
            VehicleStatus::DistanceError => "⚠️",
            VehicleStatus::NoMovement => "⚪",
            VehicleStatus::NoData => "🟡",
        }
    }

    /// Solid color (0xRRGGBB) for document swatches
    pub fn color_rgb(&self) -> u32 {
        match self {
            VehicleStatus::NeedsAudit => 0xF44336,
            VehicleStatus::Suspicious => 0x1E88E5,
            VehicleStatus::Normal => 0x4CAF50,
            VehicleStatus::MissingFuelLoad => 0x8E24AA,
            VehicleStatus::DistanceError => 0xFB8C00,
            VehicleStatus::NoMovement => 0x9E9E9E,
            VehicleStatus::NoData => 0xFFEB3B,
        }
    }

    /// Soft row background (0xRRGGBB) for spreadsheet rows
    pub fn row_fill_rgb(&self) -> u32 {
        match self {
            VehicleStatus::Normal => 0xDCEDC8,
            VehicleStatus::NeedsAudit => 0xFFCDD2,
            VehicleStatus::Suspicious => 0xBBDEFB,
            _ => 0xFFF9C4,
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order_matches_summary_order() {
        let mut sorted = VehicleStatus::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, VehicleStatus::ALL.to_vec());
        assert_eq!(VehicleStatus::ALL[0], VehicleStatus::NeedsAudit);
        assert_eq!(VehicleStatus::ALL[6], VehicleStatus::NoData);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&VehicleStatus::MissingFuelLoad).unwrap();
        assert_eq!(json, "\"MISSING_FUEL_LOAD\"");
        let back: VehicleStatus = serde_json::from_str("\"NEEDS_AUDIT\"").unwrap();
        assert_eq!(back, VehicleStatus::NeedsAudit);
    }

    #[test]
    fn test_missing_column_message_names_source_and_column() {
        let err = Error::MissingColumn {
            input: InputSource::Distance,
            column: "KM_RECORRIDOS".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("KM_RECORRIDOS"));
        assert!(msg.contains("distance"));
    }
}
