//! Logistics settlement dashboard: trip cleaning, filters, KPIs and audit rules

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use fleetfuel_types::{Error, InputSource, Result};
use serde::{Deserialize, Serialize};

use crate::model::{
    AuditFinding, AuditRule, Cell, DailyTrips, GroupTotals, LogisticsKpis, MaterialBreakdown,
    Table, TripRecord,
};
use crate::service::cleaner::parse_locale_number;
use crate::service::normalizer::{
    normalize_columns, COL_BUSINESS_UNIT, COL_CARRIER, COL_CLIENT, COL_DELIVERY_NOTE,
    COL_DEPARTURE, COL_FULFILLED, COL_MATERIAL, COL_PURCHASE_VOUCHER, COL_SALES_VOUCHER,
    COL_SERVICE_ORDER, COL_SETTLED, COL_TONNES, COL_VALUATION, LOGISTICS_ALIASES,
};

/// Client left out of KPIs and audit rules (internal movements)
pub const KPI_EXCLUDED_CLIENT: &str = "QUEBRACHO BLANCO SRL";

/// Clients never expected to carry purchase or sales vouchers
pub const VOUCHER_EXEMPT_CLIENTS: [&str; 2] = ["QUEBRACHO BLANCO SRL", "QUEBRACHO BLANDO SRL"];

/// Own fleet: no carrier settlement is issued
pub const OWN_FLEET: &str = "EMPRESA PROPIA";

/// Materials with their own dashboard block
pub const TRACKED_MATERIALS: [&str; 3] = ["ARENA", "PIEDRA", "YESO"];

/// Materials plotted in the daily trip series
pub const DAILY_MATERIALS: [&str; 2] = ["ARENA", "PIEDRA"];

/// Values that mean "not filled in" for voucher and delivery note fields
const BLANK_MARKERS: [&str; 5] = ["", ".", "NAN", "NONE", "0"];

/// Fulfilled-column values meaning "not fulfilled"
const NOT_FULFILLED: [&str; 5] = ["", "NO", "0", "FALSE", "N"];

/// Billed tonnes that are placeholders rather than weighed values
const PLACEHOLDER_TONNES: [f64; 3] = [0.0, 33.0, 33.33];

const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d/%m/%y",
    "%Y/%m/%d",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

fn is_blank_marker(value: &str) -> bool {
    BLANK_MARKERS.contains(&value)
}

/// Uppercased, trimmed text with NAN/NONE read as empty
fn clean_text(cell: &Cell) -> String {
    let text = cell.as_text().trim().to_uppercase();
    match text.as_str() {
        "NAN" | "NONE" => String::new(),
        _ => text,
    }
}

/// Parse a departure cell, day first. Unparsable values give None.
pub fn parse_day_first_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(dt) => Some(dt.date()),
        Cell::Number(serial) if *serial > 0.0 && serial.is_finite() => {
            // spreadsheet serial day, 1900 date system
            NaiveDate::from_ymd_opt(1899, 12, 30)
                .and_then(|epoch| epoch.checked_add_days(Days::new(serial.trunc() as u64)))
        }
        Cell::Text(text) => {
            let text = text.trim();
            // %Y also accepts two digits ("25" -> year 25); let %y take those
            DATE_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .find(|d| d.year() >= 100)
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                        .map(|dt| dt.date())
                        .filter(|d| d.year() >= 100)
                })
        }
        _ => None,
    }
}

/// Service order number with thousands dots removed ("1.234" -> 1234)
fn parse_service_order(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Text(s) => s
            .trim()
            .replace('.', "")
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Turn a normalized logistics table into trip records
pub fn clean_trips(table: &Table) -> Result<Vec<TripRecord>> {
    let required = |column: &str| {
        table.column_index(column).ok_or_else(|| Error::MissingColumn {
            input: InputSource::Logistics,
            column: column.to_string(),
        })
    };
    let departure = required(COL_DEPARTURE)?;
    let client = required(COL_CLIENT)?;
    let material = required(COL_MATERIAL)?;
    let carrier = required(COL_CARRIER)?;
    let delivery_note = required(COL_DELIVERY_NOTE)?;
    let fulfilled = required(COL_FULFILLED)?;
    let settled = required(COL_SETTLED)?;
    let tonnes = required(COL_TONNES)?;
    let valuation = required(COL_VALUATION)?;

    let business_unit = table.column_index(COL_BUSINESS_UNIT);
    let purchase_voucher = table.column_index(COL_PURCHASE_VOUCHER);
    let sales_voucher = table.column_index(COL_SALES_VOUCHER);
    let service_order = table.column_index(COL_SERVICE_ORDER);

    let optional_text = |row: usize, col: Option<usize>| {
        col.map(|c| clean_text(table.cell(row, c))).unwrap_or_default()
    };

    let trips = (0..table.len())
        .map(|row| TripRecord {
            row_number: Table::sheet_row_number(row),
            departure: parse_day_first_date(table.cell(row, departure)),
            client: clean_text(table.cell(row, client)),
            material: clean_text(table.cell(row, material)),
            carrier: clean_text(table.cell(row, carrier)),
            delivery_note: clean_text(table.cell(row, delivery_note)),
            fulfilled: clean_text(table.cell(row, fulfilled)),
            settled: parse_locale_number(table.cell(row, settled))
                .map(|v| v.trunc() as i64)
                .unwrap_or(0),
            tonnes: parse_locale_number(table.cell(row, tonnes)).unwrap_or(0.0),
            valuation: parse_locale_number(table.cell(row, valuation)).unwrap_or(0.0),
            business_unit: optional_text(row, business_unit),
            purchase_voucher: optional_text(row, purchase_voucher),
            sales_voucher: optional_text(row, sales_voucher),
            service_order: optional_text(row, service_order),
            service_order_number: service_order
                .map(|c| parse_service_order(table.cell(row, c)))
                .unwrap_or(0.0),
        })
        .collect();

    Ok(trips)
}

/// Normalize headers and clean in one step
pub fn prepare_trips(table: Table) -> Result<Vec<TripRecord>> {
    let table = normalize_columns(table, &LOGISTICS_ALIASES)?;
    clean_trips(&table)
}

/// Dashboard selections; an empty list selects everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub clients: Vec<String>,
    pub materials: Vec<String>,
    pub business_units: Vec<String>,
}

impl TripFilter {
    /// Fill unset bounds with the earliest/latest departure present
    pub fn with_default_range(mut self, trips: &[TripRecord]) -> Self {
        if let Some((min, max)) = date_range(trips) {
            self.from.get_or_insert(min);
            self.to.get_or_insert(max);
        }
        self
    }

    pub fn matches(&self, trip: &TripRecord) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let Some(date) = trip.departure else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        selected(&self.clients, &trip.client)
            && selected(&self.materials, &trip.material)
            && selected(&self.business_units, &trip.business_unit)
    }

    pub fn apply(&self, trips: &[TripRecord]) -> Vec<TripRecord> {
        trips.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

fn selected(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|c| c.trim().to_uppercase() == value)
}

/// Earliest and latest departure date, ignoring undated trips
pub fn date_range(trips: &[TripRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = trips.iter().filter_map(|t| t.departure);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(min, max), d| (min.min(d), max.max(d))))
}

/// Distinct non-empty values offered by the dashboard filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub materials: Vec<String>,
    pub business_units: Vec<String>,
}

pub fn filter_options(trips: &[TripRecord]) -> FilterOptions {
    FilterOptions {
        clients: distinct_values(trips, |t| &t.client),
        materials: distinct_values(trips, |t| &t.material),
        business_units: distinct_values(trips, |t| &t.business_unit),
    }
}

fn distinct_values(trips: &[TripRecord], field: impl Fn(&TripRecord) -> &str) -> Vec<String> {
    trips
        .iter()
        .map(field)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn totals<'a>(trips: impl IntoIterator<Item = &'a TripRecord>) -> LogisticsKpis {
    trips.into_iter().fold(LogisticsKpis::default(), |mut acc, trip| {
        acc.trips += 1;
        acc.tonnes += trip.tonnes;
        acc.valuation += trip.valuation;
        acc
    })
}

/// Group trips by key and sort by tonnes descending (key breaks ties)
fn group_by_tonnes<'a>(
    trips: impl IntoIterator<Item = &'a TripRecord>,
    key: impl Fn(&TripRecord) -> &str,
) -> Vec<GroupTotals> {
    let mut groups: BTreeMap<String, LogisticsKpis> = BTreeMap::new();
    for trip in trips {
        let entry = groups.entry(key(trip).to_string()).or_default();
        entry.trips += 1;
        entry.tonnes += trip.tonnes;
        entry.valuation += trip.valuation;
    }

    let mut rows: Vec<GroupTotals> = groups
        .into_iter()
        .map(|(key, t)| GroupTotals {
            key,
            trips: t.trips,
            tonnes: t.tonnes,
            valuation: t.valuation,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.tonnes
            .total_cmp(&a.tonnes)
            .then_with(|| a.key.cmp(&b.key))
    });
    rows
}

fn audited(trips: &[TripRecord]) -> impl Iterator<Item = &TripRecord> {
    trips.iter().filter(|t| t.client != KPI_EXCLUDED_CLIENT)
}

/// Trips, tonnes and valuation, excluding the internal client
pub fn compute_kpis(trips: &[TripRecord]) -> LogisticsKpis {
    totals(audited(trips))
}

/// Per-material totals with a client table, for tracked materials present
pub fn material_breakdown(trips: &[TripRecord]) -> Vec<MaterialBreakdown> {
    TRACKED_MATERIALS
        .iter()
        .filter_map(|&material| {
            let rows: Vec<&TripRecord> = trips.iter().filter(|t| t.material == material).collect();
            if rows.is_empty() {
                return None;
            }
            Some(MaterialBreakdown {
                material: material.to_string(),
                totals: totals(rows.iter().copied()),
                by_client: group_by_tonnes(rows.iter().copied(), |t| &t.client),
            })
        })
        .collect()
}

/// Trip counts per day for the plotted materials, ordered by date then material
pub fn daily_trips(trips: &[TripRecord]) -> Vec<DailyTrips> {
    let mut counts: BTreeMap<(NaiveDate, String), usize> = BTreeMap::new();
    for trip in trips {
        let Some(date) = trip.departure else { continue };
        if DAILY_MATERIALS.contains(&trip.material.as_str()) {
            *counts.entry((date, trip.material.clone())).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((date, material), trips)| DailyTrips {
            date,
            material,
            trips,
        })
        .collect()
}

/// Carriers ranked by billed tonnes
pub fn carrier_ranking(trips: &[TripRecord]) -> Vec<GroupTotals> {
    group_by_tonnes(trips, |t| &t.carrier)
}

impl AuditRule {
    /// True when the trip violates this rule
    pub fn flags(&self, trip: &TripRecord) -> bool {
        let voucher_exempt = VOUCHER_EXEMPT_CLIENTS.contains(&trip.client.as_str());
        let own_fleet = trip.carrier == OWN_FLEET;
        match self {
            AuditRule::MissingDeliveryNote => {
                is_blank_marker(&trip.delivery_note)
                    && TRACKED_MATERIALS.contains(&trip.material.as_str())
            }
            AuditRule::NotSettled => trip.settled == 0,
            AuditRule::NotFulfilled => NOT_FULFILLED.contains(&trip.fulfilled.as_str()),
            AuditRule::InvalidTonnes => PLACEHOLDER_TONNES
                .iter()
                .any(|p| (trip.tonnes - p).abs() < 1e-9),
            AuditRule::MissingPurchaseVoucher => {
                is_blank_marker(&trip.purchase_voucher) && !voucher_exempt && !own_fleet
            }
            AuditRule::MissingSalesVoucher => {
                is_blank_marker(&trip.sales_voucher) && !voucher_exempt
            }
            AuditRule::PendingServiceOrder => {
                trip.service_order_number != 0.0
                    && is_blank_marker(&trip.purchase_voucher)
                    && !own_fleet
            }
        }
    }
}

/// Apply every audit rule, in rule order, to the non-excluded trips
pub fn run_audit(trips: &[TripRecord]) -> Vec<AuditFinding> {
    AuditRule::ALL
        .iter()
        .map(|&rule| AuditFinding {
            rule,
            trips: audited(trips).filter(|t| rule.flags(t)).cloned().collect(),
        })
        .collect()
}
