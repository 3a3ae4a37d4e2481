//! Logistics settlement trips (liquidación de viajes)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trip row after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Spreadsheet row number (header is row 1)
    pub row_number: usize,
    pub departure: Option<NaiveDate>,   // Salida
    pub client: String,                 // Cliente
    pub material: String,               // Carga/Material
    pub carrier: String,                // Fletero
    pub delivery_note: String,          // Remito
    pub fulfilled: String,              // Cumplido
    pub settled: i64,                   // Rendido
    pub tonnes: f64,                    // TnFactu
    pub valuation: f64,                 // Total Val. Clientes
    pub business_unit: String,          // U.Negocio
    pub purchase_voucher: String,       // Comp.Compra
    pub sales_voucher: String,          // CompVenta
    pub service_order: String,          // OrdServicio
    pub service_order_number: f64,
}

/// Audit rules applied to the logistics sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditRule {
    /// A) trips of tracked materials without delivery note
    MissingDeliveryNote,
    /// B) trips not settled
    NotSettled,
    /// C) trips not fulfilled
    NotFulfilled,
    /// D) billed tonnes with placeholder values
    InvalidTonnes,
    /// E) no purchase voucher (net product missing)
    MissingPurchaseVoucher,
    /// F) invoice not associated
    MissingSalesVoucher,
    /// G) service order pending settlement
    PendingServiceOrder,
}

impl AuditRule {
    pub const ALL: [AuditRule; 7] = [
        AuditRule::MissingDeliveryNote,
        AuditRule::NotSettled,
        AuditRule::NotFulfilled,
        AuditRule::InvalidTonnes,
        AuditRule::MissingPurchaseVoucher,
        AuditRule::MissingSalesVoucher,
        AuditRule::PendingServiceOrder,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AuditRule::MissingDeliveryNote => "A) Viajes sin remito",
            AuditRule::NotSettled => "B) Viajes no rendidos",
            AuditRule::NotFulfilled => "C) Viajes no cumplidos",
            AuditRule::InvalidTonnes => "D) Toneladas inválidas",
            AuditRule::MissingPurchaseVoucher => "E) Sin líquido producto",
            AuditRule::MissingSalesVoucher => "F) Factura sin asociar",
            AuditRule::PendingServiceOrder => "G) OS pendiente",
        }
    }

    /// Worksheet name in the audit workbook (31-char limit)
    pub fn sheet_name(&self) -> &'static str {
        match self {
            AuditRule::MissingDeliveryNote => "A_Sin_remito",
            AuditRule::NotSettled => "B_No_rendidos",
            AuditRule::NotFulfilled => "C_No_cumplidos",
            AuditRule::InvalidTonnes => "D_Tn_invalidas",
            AuditRule::MissingPurchaseVoucher => "E_Sin_liquido",
            AuditRule::MissingSalesVoucher => "F_Fact_sin_asoc",
            AuditRule::PendingServiceOrder => "G_OS_pendiente",
        }
    }
}

/// Trips flagged by one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub rule: AuditRule,
    pub trips: Vec<TripRecord>,
}

/// Headline numbers of the logistics dashboard
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogisticsKpis {
    pub trips: usize,
    pub tonnes: f64,
    pub valuation: f64,
}

/// Aggregated figures for one grouping key (client, carrier, material)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotals {
    pub key: String,
    pub trips: usize,
    pub tonnes: f64,
    pub valuation: f64,
}

/// Per-material block: headline totals plus client breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialBreakdown {
    pub material: String,
    pub totals: LogisticsKpis,
    pub by_client: Vec<GroupTotals>,
}

/// Trip count for one day and material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrips {
    pub date: NaiveDate,
    pub material: String,
    pub trips: usize,
}
