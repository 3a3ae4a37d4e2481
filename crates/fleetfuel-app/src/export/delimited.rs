//! Semicolon-separated export with decimal comma

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fleetfuel_domain::model::VehicleRecord;
use fleetfuel_types::Result;
use tracing::info;

use super::DETAIL_HEADERS;

/// Locale number: decimal comma, undefined as an empty field
fn locale_number(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string().replace('.', ","))
        .unwrap_or_default()
}

/// Write the detail table to any writer
pub fn write_consumption_delimited<W: Write>(records: &[VehicleRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    csv_writer.write_record(DETAIL_HEADERS)?;
    for record in records {
        let metrics = &record.metrics;
        csv_writer.write_record([
            record.identifier.clone(),
            record.model.clone().unwrap_or_default(),
            locale_number(Some(record.distance_km)),
            locale_number(Some(record.liters)),
            locale_number(metrics.actual_rate),
            locale_number(record.theoretical_rate),
            locale_number(metrics.expected_liters),
            locale_number(metrics.deviation_liters),
            locale_number(metrics.deviation_ratio.map(|r| r * 100.0)),
            record.status.label().to_string(),
        ])?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Export the detail table to a `.csv` file
pub fn export_consumption_csv(records: &[VehicleRecord], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    write_consumption_delimited(records, file)?;
    info!(path = %output_path.display(), rows = records.len(), "delimited export written");
    Ok(())
}
