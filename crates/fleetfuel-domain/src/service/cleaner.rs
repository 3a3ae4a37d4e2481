//! Field cleaning: locale numbers, plate canonicalization and validation
//!
//! Rows whose identifier fails validation are partitioned into a rejected
//! set instead of being dropped, so the operator can inspect them.

use std::collections::HashSet;

use fleetfuel_types::{Error, InputSource, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    Cell, DistanceRow, FuelLoadRow, ReferenceRow, RejectedRow, SourceQuality, Table,
};
use crate::service::normalizer::{
    COL_DISTANCE, COL_IDENTIFIER, COL_LITERS, COL_MODEL, COL_THEORETICAL_RATE,
};

/// Old Argentine format: ABC123
static OLD_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{3}$").expect("plate pattern is valid"));

/// Mercosur format: AB123CD
static MERCOSUR_PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[0-9]{3}[A-Z]{2}$").expect("plate pattern is valid"));

/// Valid and rejected rows of one source, plus its quality counters
#[derive(Debug, Clone)]
pub struct CleanedRows<T> {
    pub valid: Vec<T>,
    pub rejected: Vec<RejectedRow>,
    pub quality: SourceQuality,
}

/// Parse a numeric cell, accepting a decimal comma ("12,5" -> 12.5).
///
/// Returns None for anything unparsable. Zero is a real value, so missing
/// data must never collapse into 0.0 here.
pub fn parse_locale_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Trim and uppercase an identifier cell
pub fn normalize_identifier(cell: &Cell) -> String {
    cell.as_text().trim().to_uppercase()
}

/// True iff the (already normalized) text is a valid plate
pub fn is_valid_identifier(identifier: &str) -> bool {
    OLD_PLATE.is_match(identifier) || MERCOSUR_PLATE.is_match(identifier)
}

fn require_column(table: &Table, input: InputSource, column: &str) -> Result<usize> {
    table.column_index(column).ok_or_else(|| Error::MissingColumn {
        input,
        column: column.to_string(),
    })
}

/// Shared loop for sources carrying one non-negative measure per row
fn clean_measured<T>(
    table: &Table,
    input: InputSource,
    measure_column: &str,
    build: impl Fn(String, Option<f64>) -> T,
) -> Result<CleanedRows<T>> {
    let id_col = require_column(table, input, COL_IDENTIFIER)?;
    let value_col = require_column(table, input, measure_column)?;

    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    let mut missing_values = 0;

    for row_idx in 0..table.len() {
        let identifier = normalize_identifier(table.cell(row_idx, id_col));
        let value = parse_locale_number(table.cell(row_idx, value_col)).filter(|v| *v >= 0.0);

        if !is_valid_identifier(&identifier) {
            rejected.push(RejectedRow {
                input,
                row_number: Table::sheet_row_number(row_idx),
                identifier,
                value,
            });
            continue;
        }

        if value.is_none() {
            missing_values += 1;
        }
        valid.push(build(identifier, value));
    }

    let quality = SourceQuality {
        input,
        total_rows: table.len(),
        valid_rows: valid.len(),
        rejected_rows: rejected.len(),
        missing_values,
        duplicate_rows: 0,
    };

    Ok(CleanedRows {
        valid,
        rejected,
        quality,
    })
}

/// Clean a normalized consumption table into fuel load rows
pub fn clean_consumption(table: &Table) -> Result<CleanedRows<FuelLoadRow>> {
    clean_measured(table, InputSource::Consumption, COL_LITERS, |identifier, liters| {
        FuelLoadRow { identifier, liters }
    })
}

/// Clean a normalized distance table into distance rows
pub fn clean_distance(table: &Table) -> Result<CleanedRows<DistanceRow>> {
    clean_measured(table, InputSource::Distance, COL_DISTANCE, |identifier, distance_km| {
        DistanceRow {
            identifier,
            distance_km,
        }
    })
}

/// Clean a normalized reference table.
///
/// The first row for each identifier wins; later repeats are counted as
/// duplicates and ignored.
pub fn clean_reference(table: &Table) -> Result<CleanedRows<ReferenceRow>> {
    let model_col = table.column_index(COL_MODEL);
    let mut cleaned = clean_measured(
        table,
        InputSource::Reference,
        COL_THEORETICAL_RATE,
        |identifier, theoretical_rate| ReferenceRow {
            identifier,
            model: None,
            theoretical_rate,
        },
    )?;

    // Re-attach models: valid rows keep source order, so walk the table again
    if let Some(model_col) = model_col {
        let id_col = require_column(table, InputSource::Reference, COL_IDENTIFIER)?;
        let models = (0..table.len())
            .filter(|&row| is_valid_identifier(&normalize_identifier(table.cell(row, id_col))))
            .map(|row| {
                let text = table.cell(row, model_col).as_text().trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            });
        for (reference, model) in cleaned.valid.iter_mut().zip(models) {
            reference.model = model;
        }
    }

    let mut seen = HashSet::new();
    let before = cleaned.valid.len();
    cleaned.valid.retain(|r| seen.insert(r.identifier.clone()));
    cleaned.quality.duplicate_rows = before - cleaned.valid.len();

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_grammar() {
        assert!(is_valid_identifier("ABC123"));
        assert!(is_valid_identifier("AB123CD"));
        assert!(!is_valid_identifier("AB1C23"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("   "));
        assert!(!is_valid_identifier("abc123"));
        assert!(!is_valid_identifier("ABC1234"));
        assert!(!is_valid_identifier("ABC 123"));
    }

    #[test]
    fn test_lowercase_valid_after_normalization() {
        let cell = Cell::Text(" abc123 ".to_string());
        let id = normalize_identifier(&cell);
        assert_eq!(id, "ABC123");
        assert!(is_valid_identifier(&id));
    }

    #[test]
    fn test_blank_cell_never_valid() {
        assert!(!is_valid_identifier(&normalize_identifier(&Cell::Empty)));
    }

    #[test]
    fn test_parse_locale_number() {
        assert_eq!(parse_locale_number(&Cell::Text("12,5".into())), Some(12.5));
        assert_eq!(parse_locale_number(&Cell::Text(" 40.25 ".into())), Some(40.25));
        assert_eq!(parse_locale_number(&Cell::Number(7.0)), Some(7.0));
        assert_eq!(parse_locale_number(&Cell::Text("0".into())), Some(0.0));
    }

    #[test]
    fn test_unparsable_is_missing_not_zero() {
        assert_eq!(parse_locale_number(&Cell::Text("n/a".into())), None);
        assert_eq!(parse_locale_number(&Cell::Empty), None);
        assert_eq!(parse_locale_number(&Cell::Text("1.234,5".into())), None);
        assert_eq!(parse_locale_number(&Cell::Number(f64::NAN)), None);
    }

    #[test]
    fn test_clean_consumption_partitions_invalid_rows() {
        let table = Table::from_strings(
            &["PATENTE", "LITROS"],
            &[
                &["abc123", "10,5"],
                &["AB1C23", "4"],
                &["", "3"],
                &["AB123CD", "x"],
            ],
        );
        let cleaned = clean_consumption(&table).unwrap();

        assert_eq!(cleaned.valid.len(), 2);
        assert_eq!(cleaned.valid[0].identifier, "ABC123");
        assert_eq!(cleaned.valid[0].liters, Some(10.5));
        assert_eq!(cleaned.valid[1].liters, None);

        assert_eq!(cleaned.rejected.len(), 2);
        assert_eq!(cleaned.rejected[0].row_number, 3);
        assert_eq!(cleaned.rejected[0].identifier, "AB1C23");
        assert_eq!(cleaned.rejected[1].identifier, "");

        assert_eq!(cleaned.quality.total_rows, 4);
        assert_eq!(cleaned.quality.rejected_rows, 2);
        assert_eq!(cleaned.quality.missing_values, 1);
    }

    #[test]
    fn test_negative_distance_is_missing() {
        let table = Table::from_strings(&["PATENTE", "KM_RECORRIDOS"], &[&["ABC123", "-50"]]);
        let cleaned = clean_distance(&table).unwrap();
        assert_eq!(cleaned.valid[0].distance_km, None);
        assert_eq!(cleaned.quality.missing_values, 1);
    }

    #[test]
    fn test_clean_reference_models_and_duplicates() {
        let table = Table::from_strings(
            &["PATENTE", "LITROS_100KM", "MODELO"],
            &[
                &["XX", "30", "IVECO"],
                &["ABC123", "32,5", " SCANIA G410 "],
                &["AB123CD", "", ""],
                &["ABC123", "99", "OTRO"],
            ],
        );
        let cleaned = clean_reference(&table).unwrap();

        assert_eq!(cleaned.valid.len(), 2);
        assert_eq!(cleaned.valid[0].model.as_deref(), Some("SCANIA G410"));
        assert_eq!(cleaned.valid[0].theoretical_rate, Some(32.5));
        assert_eq!(cleaned.valid[1].model, None);
        assert_eq!(cleaned.valid[1].theoretical_rate, None);
        assert_eq!(cleaned.quality.duplicate_rows, 1);
        assert_eq!(cleaned.rejected.len(), 1);
    }

    #[test]
    fn test_unnormalized_table_reports_missing_column() {
        let table = Table::from_strings(&["Placa", "Litros"], &[]);
        assert!(matches!(
            clean_consumption(&table),
            Err(Error::MissingColumn { .. })
        ));
    }
}
