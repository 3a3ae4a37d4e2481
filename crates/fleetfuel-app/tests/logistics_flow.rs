//! Logistics sheet through the dashboard service and the audit workbook

use std::fs;

use calamine::{open_workbook, Reader, Xlsx};
use fleetfuel_app::app::run_logistics;
use fleetfuel_app::export::export_audit_xlsx;
use fleetfuel_app::Config;
use fleetfuel_domain::model::AuditRule;
use fleetfuel_domain::service::TripFilter;

const SHEET: &str = "\
Salida;Cliente;Carga/Material;Transporte/Fletero;Remitos;Cumplido;Rendido;TnFactu;Total Val. Clientes;Comp.Compra;CompVenta;OrdServicio
01/03/2025;ACME;ARENA;TRANSPORTES SUR;R-1;SI;1;30;1000;FC-1;FV-1;0
02/03/2025;ACME;PIEDRA;TRANSPORTES SUR;;SI;0;28,5;900;;FV-2;1.234
05/03/2025;OBRAS SA;YESO;FLETES NORTE;R-3;NO;1;33;100;FC-3;;0
06/03/2025;QUEBRACHO BLANCO SRL;ARENA;EMPRESA PROPIA;;;0;0;0;;;0
";

fn config_for(dir: &tempfile::TempDir) -> Config {
    Config {
        input_dir: Some(dir.path().to_path_buf()),
        logistics_file: "liq_comb.csv".to_string(),
        ..Config::default()
    }
}

#[test]
fn test_audit_workbook_has_one_sheet_per_rule() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("liq_comb.csv"), SHEET).unwrap();
    let config = config_for(&dir);

    let dashboard = run_logistics(&config, None, TripFilter::default()).unwrap();
    assert_eq!(dashboard.selected_trips, 4);
    assert_eq!(dashboard.kpis.trips, 3);

    let count = |rule: AuditRule| {
        dashboard
            .findings
            .iter()
            .find(|f| f.rule == rule)
            .map(|f| f.trips.len())
            .unwrap()
    };
    assert_eq!(count(AuditRule::MissingDeliveryNote), 1);
    assert_eq!(count(AuditRule::NotSettled), 1);
    assert_eq!(count(AuditRule::NotFulfilled), 1);
    assert_eq!(count(AuditRule::InvalidTonnes), 1);
    assert_eq!(count(AuditRule::MissingPurchaseVoucher), 1);
    assert_eq!(count(AuditRule::MissingSalesVoucher), 1);
    assert_eq!(count(AuditRule::PendingServiceOrder), 1);

    let output = dir.path().join("auditoria.xlsx");
    export_audit_xlsx(&dashboard.findings, &output).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&output).unwrap();
    let expected: Vec<&str> = AuditRule::ALL.iter().map(|r| r.sheet_name()).collect();
    assert_eq!(workbook.sheet_names(), expected);
    let missing_note = workbook.worksheet_range("A_Sin_remito").unwrap();
    assert_eq!(missing_note.rows().count(), 2);
}

#[test]
fn test_filter_by_client_and_date() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("liq_comb.csv"), SHEET).unwrap();
    let config = config_for(&dir);

    let filter = TripFilter {
        to: chrono::NaiveDate::from_ymd_opt(2025, 3, 2),
        clients: vec!["acme".to_string()],
        ..Default::default()
    };
    let dashboard = run_logistics(&config, None, filter).unwrap();
    assert_eq!(dashboard.selected_trips, 2);
    assert!((dashboard.kpis.tonnes - 58.5).abs() < 1e-9);
    assert_eq!(dashboard.carriers.len(), 1);
    assert_eq!(dashboard.carriers[0].key, "TRANSPORTES SUR");
    assert_eq!(dashboard.daily.len(), 2);
}
