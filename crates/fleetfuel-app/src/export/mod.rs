//! Report exporters: spreadsheet, delimited text and paginated document
//!
//! Exporters only format. Records arrive already filtered and sorted, and
//! the summary already holds KPIs, recommendations and narrative.

pub mod delimited;
pub mod excel;
pub mod pdf;

pub use delimited::{export_consumption_csv, write_consumption_delimited};
pub use excel::{export_audit_xlsx, export_consumption_xlsx};
pub use pdf::{export_consumption_pdf, render_consumption_pdf};

/// Detail columns shared by the spreadsheet and delimited exports
pub const DETAIL_HEADERS: [&str; 10] = [
    "Patente",
    "Modelo",
    "Km recorridos",
    "Litros",
    "Consumo real (L/100km)",
    "Consumo teórico (L/100km)",
    "Litros esperados",
    "Desvío (L)",
    "Desvío %",
    "Estado",
];
