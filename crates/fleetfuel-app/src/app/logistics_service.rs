//! Logistics Service - trip settlement dashboard and audit use case

use std::path::Path;

use fleetfuel_domain::model::{
    AuditFinding, DailyTrips, GroupTotals, LogisticsKpis, MaterialBreakdown, TripRecord,
};
use fleetfuel_domain::service::logistics_audit::{
    carrier_ranking, compute_kpis, daily_trips, filter_options, material_breakdown,
    FilterOptions,
};
use fleetfuel_domain::service::{prepare_trips, run_audit, TripFilter};
use fleetfuel_infra::load_table;
use fleetfuel_types::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;

/// Everything the logistics dashboard shows for one filter selection
#[derive(Debug, Clone, Serialize)]
pub struct LogisticsDashboard {
    /// Values offered by the filters (computed over every trip)
    pub options: FilterOptions,
    /// Filter actually applied, with the default date range filled in
    pub filter: TripFilter,
    pub total_trips: usize,
    pub selected_trips: usize,
    pub kpis: LogisticsKpis,
    pub materials: Vec<MaterialBreakdown>,
    pub daily: Vec<DailyTrips>,
    pub carriers: Vec<GroupTotals>,
    pub findings: Vec<AuditFinding>,
}

impl LogisticsDashboard {
    /// Number of trips flagged by any rule (a trip may count more than once)
    pub fn flagged_count(&self) -> usize {
        self.findings.iter().map(|f| f.trips.len()).sum()
    }
}

/// Load and clean the logistics settlement sheet
pub fn load_trips(path: &Path) -> Result<Vec<TripRecord>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let trips = prepare_trips(load_table(path)?)?;
    debug!(path = %path.display(), trips = trips.len(), "logistics sheet loaded");
    Ok(trips)
}

/// Filter the trips and compute every dashboard block
pub fn build_dashboard(trips: &[TripRecord], filter: TripFilter) -> LogisticsDashboard {
    let filter = filter.with_default_range(trips);
    let selected = filter.apply(trips);

    // choices offered for the selected period, before the other selections narrow it
    let in_period = TripFilter {
        from: filter.from,
        to: filter.to,
        ..TripFilter::default()
    }
    .apply(trips);

    LogisticsDashboard {
        options: filter_options(&in_period),
        total_trips: trips.len(),
        selected_trips: selected.len(),
        kpis: compute_kpis(&selected),
        materials: material_breakdown(&selected),
        daily: daily_trips(&selected),
        carriers: carrier_ranking(&selected),
        findings: run_audit(&selected),
        filter,
    }
}

/// Main entry point: load the configured sheet and build the dashboard
pub fn run_logistics(
    config: &Config,
    dir_override: Option<&Path>,
    filter: TripFilter,
) -> Result<LogisticsDashboard> {
    let path = config.logistics_path(dir_override);
    let trips = load_trips(&path)?;
    let dashboard = build_dashboard(&trips, filter);
    info!(
        selected = dashboard.selected_trips,
        flagged = dashboard.flagged_count(),
        "logistics audit complete"
    );
    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fleetfuel_domain::model::{AuditRule, Table};

    fn sheet() -> Table {
        Table::from_strings(
            &[
                "Salida", "Cliente", "Carga/Material", "Fletero", "Remito", "Cumplido",
                "Rendido", "TnFactu", "Total Val. Clientes",
            ],
            &[
                &["01/03/2025", "ACME", "ARENA", "TRANSPORTES SUR", "R-1", "SI", "1", "30", "1000"],
                &["02/03/2025", "ACME", "PIEDRA", "TRANSPORTES SUR", "", "SI", "0", "28,5", "900"],
                &["03/03/2025", "QUEBRACHO BLANCO SRL", "ARENA", "EMPRESA PROPIA", "R-2", "SI", "1", "20", "500"],
                &["", "OTRO", "YESO", "FLETES NORTE", "R-3", "NO", "1", "33", "100"],
            ],
        )
    }

    #[test]
    fn test_dashboard_default_range_drops_undated_trips() {
        let trips = prepare_trips(sheet()).unwrap();
        let dashboard = build_dashboard(&trips, TripFilter::default());

        assert_eq!(dashboard.total_trips, 4);
        assert_eq!(dashboard.selected_trips, 3);
        assert_eq!(dashboard.filter.from, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(dashboard.filter.to, NaiveDate::from_ymd_opt(2025, 3, 3));
        // internal client excluded from the KPIs
        assert_eq!(dashboard.kpis.trips, 2);
        assert!((dashboard.kpis.tonnes - 58.5).abs() < 1e-9);
        // undated trip is outside the period, so its client is not offered
        assert_eq!(dashboard.options.clients, vec!["ACME", "QUEBRACHO BLANCO SRL"]);
    }

    #[test]
    fn test_filter_options_follow_period_only() {
        let trips = prepare_trips(sheet()).unwrap();

        let filter = TripFilter {
            from: NaiveDate::from_ymd_opt(2025, 3, 2),
            clients: vec!["ACME".to_string()],
            ..TripFilter::default()
        };
        let dashboard = build_dashboard(&trips, filter);

        assert_eq!(dashboard.selected_trips, 1);
        assert_eq!(dashboard.options.clients, vec!["ACME", "QUEBRACHO BLANCO SRL"]);
        assert_eq!(dashboard.options.materials, vec!["ARENA", "PIEDRA"]);
    }

    #[test]
    fn test_dashboard_findings_follow_rule_order() {
        let trips = prepare_trips(sheet()).unwrap();
        let dashboard = build_dashboard(&trips, TripFilter::default());

        let rules: Vec<AuditRule> = dashboard.findings.iter().map(|f| f.rule).collect();
        assert_eq!(rules, AuditRule::ALL.to_vec());
        let missing_note = &dashboard.findings[0];
        assert_eq!(missing_note.trips.len(), 1);
        assert_eq!(missing_note.trips[0].material, "PIEDRA");
        let not_settled = &dashboard.findings[1];
        assert_eq!(not_settled.trips.len(), 1);
    }

    #[test]
    fn test_missing_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_trips(&dir.path().join("liq_comb.xlsx")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
