//! Excel export functionality

use std::path::Path;

use fleetfuel_domain::model::{AuditFinding, RejectedRow, VehicleRecord};
use fleetfuel_types::{Error, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use tracing::info;

use super::DETAIL_HEADERS;
use crate::report::ReportSummary;

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export the consumption detail, summary and rejected rows to one workbook
pub fn export_consumption_xlsx(
    records: &[VehicleRecord],
    summary: &ReportSummary,
    rejected: &[RejectedRow],
    output_path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let detail_sheet = workbook.add_worksheet();
    write_detail_sheet(detail_sheet, records)?;

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, summary)?;

    let rejected_sheet = workbook.add_worksheet();
    write_rejected_sheet(rejected_sheet, rejected)?;

    workbook.save(output_path).map_err(xlsx_err)?;
    info!(path = %output_path.display(), rows = records.len(), "consumption workbook written");

    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(xlsx_err)?;
    }
    sheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    Ok(())
}

/// Numeric cell, or a filled blank when the value is undefined
fn write_optional_number(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
    format: &Format,
) -> Result<()> {
    let written = match value {
        Some(v) => sheet.write_number_with_format(row, col, v, format),
        None => sheet.write_blank(row, col, format),
    };
    written.map_err(xlsx_err)?;
    Ok(())
}

fn write_detail_sheet(sheet: &mut Worksheet, records: &[VehicleRecord]) -> Result<()> {
    sheet.set_name("Consumo").map_err(xlsx_err)?;
    write_header_row(sheet, &DETAIL_HEADERS)?;

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        let fill = Color::RGB(record.status.row_fill_rgb());
        let text = Format::new().set_background_color(fill);
        let number = Format::new()
            .set_num_format("0.00")
            .set_background_color(fill);
        let percent = Format::new()
            .set_num_format("0.0%")
            .set_background_color(fill);
        let metrics = &record.metrics;

        sheet
            .write_string_with_format(row, 0, &record.identifier, &text)
            .map_err(xlsx_err)?;
        sheet
            .write_string_with_format(row, 1, record.model.as_deref().unwrap_or(""), &text)
            .map_err(xlsx_err)?;
        write_optional_number(sheet, row, 2, Some(record.distance_km), &number)?;
        write_optional_number(sheet, row, 3, Some(record.liters), &number)?;
        write_optional_number(sheet, row, 4, metrics.actual_rate, &number)?;
        write_optional_number(sheet, row, 5, record.theoretical_rate, &number)?;
        write_optional_number(sheet, row, 6, metrics.expected_liters, &number)?;
        write_optional_number(sheet, row, 7, metrics.deviation_liters, &number)?;
        write_optional_number(sheet, row, 8, metrics.deviation_ratio, &percent)?;
        sheet
            .write_string_with_format(row, 9, record.status.label(), &text)
            .map_err(xlsx_err)?;
    }

    sheet.set_column_width(0, 12).map_err(xlsx_err)?;
    sheet.set_column_width(1, 24).map_err(xlsx_err)?;
    for col in 2..=8 {
        sheet.set_column_width(col, 16).map_err(xlsx_err)?;
    }
    sheet.set_column_width(9, 18).map_err(xlsx_err)?;

    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summary: &ReportSummary) -> Result<()> {
    sheet.set_name("Resumen").map_err(xlsx_err)?;

    let header_format = Format::new().set_bold();
    let percent = Format::new().set_num_format("0.0%");

    sheet
        .write_string_with_format(0, 0, "Control de consumo de combustible", &header_format)
        .map_err(xlsx_err)?;

    sheet.write_string(2, 0, "Generado:").map_err(xlsx_err)?;
    sheet
        .write_string(2, 1, summary.generated_at.format("%Y-%m-%d %H:%M").to_string())
        .map_err(xlsx_err)?;
    sheet.write_string(3, 0, "Usuario:").map_err(xlsx_err)?;
    sheet
        .write_string(3, 1, &summary.generated_by)
        .map_err(xlsx_err)?;
    sheet.write_string(4, 0, "Tolerancia:").map_err(xlsx_err)?;
    sheet
        .write_number_with_format(4, 1, summary.tolerance, &percent)
        .map_err(xlsx_err)?;

    let kpis = &summary.kpis;
    let kpi_rows = [
        ("Vehículos analizados", kpis.total),
        ("NORMAL", kpis.normal),
        ("A AUDITAR", kpis.needs_audit),
        ("DUDOSO", kpis.suspicious),
        ("SIN DATOS", kpis.no_data),
    ];
    sheet
        .write_string_with_format(6, 0, "Indicadores", &header_format)
        .map_err(xlsx_err)?;
    let mut row = 7;
    for (label, count) in kpi_rows {
        sheet.write_string(row, 0, label).map_err(xlsx_err)?;
        sheet.write_number(row, 1, count as f64).map_err(xlsx_err)?;
        row += 1;
    }
    sheet.write_string(row, 0, "% NORMAL").map_err(xlsx_err)?;
    sheet
        .write_number_with_format(row, 1, kpis.pct_normal / 100.0, &percent)
        .map_err(xlsx_err)?;
    row += 2;

    sheet
        .write_string_with_format(row, 0, "Estado", &header_format)
        .map_err(xlsx_err)?;
    sheet
        .write_string_with_format(row, 1, "Cantidad", &header_format)
        .map_err(xlsx_err)?;
    row += 1;
    for entry in &summary.status_summary {
        sheet
            .write_string(row, 0, entry.status.label())
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 1, entry.count as f64)
            .map_err(xlsx_err)?;
        row += 1;
    }
    row += 1;

    sheet
        .write_string_with_format(row, 0, "Recomendaciones", &header_format)
        .map_err(xlsx_err)?;
    row += 1;
    for recommendation in &summary.recommendations {
        sheet.write_string(row, 0, recommendation).map_err(xlsx_err)?;
        row += 1;
    }

    sheet.set_column_width(0, 24).map_err(xlsx_err)?;
    sheet.set_column_width(1, 20).map_err(xlsx_err)?;

    Ok(())
}

fn write_rejected_sheet(sheet: &mut Worksheet, rejected: &[RejectedRow]) -> Result<()> {
    sheet.set_name("Rechazados").map_err(xlsx_err)?;
    write_header_row(sheet, &["Origen", "Fila", "Patente", "Valor"])?;

    for (row_idx, entry) in rejected.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet
            .write_string(row, 0, entry.input.label())
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 1, entry.row_number as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 2, &entry.identifier)
            .map_err(xlsx_err)?;
        if let Some(value) = entry.value {
            sheet.write_number(row, 3, value).map_err(xlsx_err)?;
        }
    }

    sheet.set_column_width(0, 14).map_err(xlsx_err)?;
    sheet.set_column_width(2, 14).map_err(xlsx_err)?;

    Ok(())
}

const AUDIT_HEADERS: [&str; 14] = [
    "Fila",
    "Salida",
    "Cliente",
    "Material",
    "Fletero",
    "Remito",
    "Cumplido",
    "Rendido",
    "TnFactu",
    "Valorización",
    "U.Negocio",
    "Comp.Compra",
    "CompVenta",
    "OrdServicio",
];

/// Export audit findings, one worksheet per rule
pub fn export_audit_xlsx(findings: &[AuditFinding], output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let number = Format::new().set_num_format("0.00");

    for finding in findings {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(finding.rule.sheet_name())
            .map_err(xlsx_err)?;
        write_header_row(sheet, &AUDIT_HEADERS)?;

        for (row_idx, trip) in finding.trips.iter().enumerate() {
            let row = (row_idx + 1) as u32;
            let departure = trip
                .departure
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default();
            let texts = [
                (1, departure.as_str()),
                (2, trip.client.as_str()),
                (3, trip.material.as_str()),
                (4, trip.carrier.as_str()),
                (5, trip.delivery_note.as_str()),
                (6, trip.fulfilled.as_str()),
                (10, trip.business_unit.as_str()),
                (11, trip.purchase_voucher.as_str()),
                (12, trip.sales_voucher.as_str()),
                (13, trip.service_order.as_str()),
            ];

            sheet
                .write_number(row, 0, trip.row_number as f64)
                .map_err(xlsx_err)?;
            for (col, value) in texts {
                sheet.write_string(row, col, value).map_err(xlsx_err)?;
            }
            sheet
                .write_number(row, 7, trip.settled as f64)
                .map_err(xlsx_err)?;
            sheet
                .write_number_with_format(row, 8, trip.tonnes, &number)
                .map_err(xlsx_err)?;
            sheet
                .write_number_with_format(row, 9, trip.valuation, &number)
                .map_err(xlsx_err)?;
        }

        sheet.set_column_width(2, 28).map_err(xlsx_err)?;
        sheet.set_column_width(4, 22).map_err(xlsx_err)?;
    }

    workbook.save(output_path).map_err(xlsx_err)?;
    info!(path = %output_path.display(), sheets = findings.len(), "audit workbook written");

    Ok(())
}
