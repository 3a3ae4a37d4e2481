//! Reporting surface: filtering, KPIs, summaries, recommendations, narrative
//!
//! Everything here works on an already computed run; nothing re-runs the
//! pipeline.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use fleetfuel_domain::model::VehicleRecord;
use fleetfuel_types::VehicleStatus;
use serde::{Deserialize, Serialize};

/// Column to order the detail table by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Identifier,
    Model,
    Distance,
    Liters,
    ActualRate,
    TheoreticalRate,
    ExpectedLiters,
    DeviationLiters,
    DeviationRatio,
    Status,
}

/// Dashboard filter selections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionFilter {
    /// Exact model; None means every model
    pub model: Option<String>,
    /// Statuses to keep; empty keeps all
    pub statuses: Vec<VehicleStatus>,
    /// Explicit ordering; None orders by model then identifier
    pub sort: Option<SortColumn>,
    pub descending: bool,
}

impl ConsumptionFilter {
    pub fn matches(&self, record: &VehicleRecord) -> bool {
        let model_ok = match &self.model {
            Some(model) => record.model.as_deref() == Some(model.as_str()),
            None => true,
        };
        model_ok && (self.statuses.is_empty() || self.statuses.contains(&record.status))
    }

    /// Filter then sort. Undefined values always sort last.
    pub fn apply(&self, records: &[VehicleRecord]) -> Vec<VehicleRecord> {
        let mut kept: Vec<VehicleRecord> =
            records.iter().filter(|r| self.matches(r)).cloned().collect();

        match self.sort {
            None => kept.sort_by(default_order),
            Some(column) => kept.sort_by(|a, b| {
                compare_by(column, a, b, self.descending)
                    .then_with(|| a.identifier.cmp(&b.identifier))
            }),
        }
        kept
    }
}

/// Model then identifier, vehicles without model last
pub fn default_order(a: &VehicleRecord, b: &VehicleRecord) -> Ordering {
    none_last(a.model.as_ref(), b.model.as_ref(), |x, y| x.cmp(y), false)
        .then_with(|| a.identifier.cmp(&b.identifier))
}

fn none_last<T>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl Fn(&T, &T) -> Ordering,
    descending: bool,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = cmp(&x, &y);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_by(column: SortColumn, a: &VehicleRecord, b: &VehicleRecord, descending: bool) -> Ordering {
    let number = |x: Option<f64>, y: Option<f64>| none_last(x, y, |p, q| p.total_cmp(q), descending);
    match column {
        SortColumn::Identifier => none_last(
            Some(&a.identifier),
            Some(&b.identifier),
            |x, y| x.cmp(y),
            descending,
        ),
        SortColumn::Model => none_last(a.model.as_ref(), b.model.as_ref(), |x, y| x.cmp(y), descending),
        SortColumn::Distance => number(Some(a.distance_km), Some(b.distance_km)),
        SortColumn::Liters => number(Some(a.liters), Some(b.liters)),
        SortColumn::ActualRate => number(a.metrics.actual_rate, b.metrics.actual_rate),
        SortColumn::TheoreticalRate => number(a.theoretical_rate, b.theoretical_rate),
        SortColumn::ExpectedLiters => number(a.metrics.expected_liters, b.metrics.expected_liters),
        SortColumn::DeviationLiters => number(a.metrics.deviation_liters, b.metrics.deviation_liters),
        SortColumn::DeviationRatio => number(a.metrics.deviation_ratio, b.metrics.deviation_ratio),
        SortColumn::Status => none_last(Some(a.status), Some(b.status), |x, y| x.cmp(y), descending),
    }
}

/// Headline counts of the filtered set
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kpis {
    pub total: usize,
    pub normal: usize,
    pub needs_audit: usize,
    pub suspicious: usize,
    pub no_data: usize,
    pub pct_normal: f64,
}

impl Kpis {
    /// Share of `count` in the total, as a percentage (0 when empty)
    pub fn pct(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn compute_kpis(records: &[VehicleRecord]) -> Kpis {
    let count = |status| records.iter().filter(|r| r.status == status).count();
    let mut kpis = Kpis {
        total: records.len(),
        normal: count(VehicleStatus::Normal),
        needs_audit: count(VehicleStatus::NeedsAudit),
        suspicious: count(VehicleStatus::Suspicious),
        no_data: count(VehicleStatus::NoData),
        pct_normal: 0.0,
    };
    kpis.pct_normal = kpis.pct(kpis.normal);
    kpis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: VehicleStatus,
    pub count: usize,
}

fn count_statuses(records: &[VehicleRecord]) -> BTreeMap<VehicleStatus, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

/// Non-zero counts in the fixed status order
pub fn status_summary(records: &[VehicleRecord]) -> Vec<StatusCount> {
    count_statuses(records)
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

/// Non-zero counts by descending count (chart order)
pub fn status_distribution(records: &[VehicleRecord]) -> Vec<StatusCount> {
    let mut counts = status_summary(records);
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    counts
}

/// Recommendation templates chosen by status shares
pub fn recommendations(kpis: &Kpis) -> Vec<String> {
    if kpis.total == 0 {
        return vec![
            "No data available for the analysed period. Check the input files.".to_string(),
        ];
    }

    let mut recs = Vec::new();

    if kpis.pct(kpis.needs_audit) > 20.0 {
        recs.push(
            "High share of vehicles in A AUDITAR. Prioritise reviewing these units, \
             checking consumption, routes and operating conditions."
                .to_string(),
        );
    }
    if kpis.pct(kpis.suspicious) > 10.0 {
        recs.push(
            "A relevant number of vehicles are DUDOSO, with unusually low consumption. \
             Review distance records, odometer integrity and GPS logs."
                .to_string(),
        );
    }
    if kpis.pct_normal >= 70.0 {
        recs.push(
            "Most vehicles are NORMAL. Keep the current operating and monitoring procedures."
                .to_string(),
        );
    }
    if kpis.pct(kpis.no_data) > 0.0 {
        recs.push(
            "Some vehicles are SIN DATOS. Review consumption and distance records \
             to complete the information."
                .to_string(),
        );
    }

    if recs.is_empty() {
        recs.push(
            "The overall situation is intermediate. Monitor weekly and review \
             vehicles with deviations individually."
                .to_string(),
        );
    }
    recs
}

/// NEEDS_AUDIT vehicles with the largest positive deviation in liters
pub fn top_deviations(records: &[VehicleRecord], n: usize) -> Vec<VehicleRecord> {
    let mut critical: Vec<VehicleRecord> = records
        .iter()
        .filter(|r| r.status == VehicleStatus::NeedsAudit)
        .cloned()
        .collect();
    critical.sort_by(|a, b| {
        none_last(
            a.metrics.deviation_liters,
            b.metrics.deviation_liters,
            |x, y| x.total_cmp(y),
            true,
        )
        .then_with(|| default_order(a, b))
    });
    critical.truncate(n);
    critical
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn fmt_rate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Most frequent model within one status (alphabetical on ties)
fn dominant_model(records: &[VehicleRecord], status: VehicleStatus) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.status == status) {
        if let Some(model) = record.model.as_deref() {
            *counts.entry(model).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (model, n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((model, n)),
        })
        .map(|(model, _)| model.to_string())
}

/// Four-paragraph executive analysis of the filtered set
pub fn executive_narrative(records: &[VehicleRecord], kpis: &Kpis) -> Vec<String> {
    if kpis.total == 0 {
        return vec![
            "No technical analysis was generated because the filtered set is empty.".to_string(),
        ];
    }

    let pct_audit = kpis.pct(kpis.needs_audit);
    let pct_suspicious = kpis.pct(kpis.suspicious);
    let pct_no_data = kpis.pct(kpis.no_data);

    let group_means = |status: VehicleStatus| {
        let group = || records.iter().filter(move |r| r.status == status);
        (
            mean(group().filter_map(|r| r.metrics.actual_rate)),
            mean(group().filter_map(|r| r.theoretical_rate)),
        )
    };
    let (normal_actual, normal_theoretical) = group_means(VehicleStatus::Normal);
    let (audit_actual, audit_theoretical) = group_means(VehicleStatus::NeedsAudit);

    let no_model = || "no predominant model".to_string();
    let audit_model = dominant_model(records, VehicleStatus::NeedsAudit).unwrap_or_else(no_model);
    let suspicious_model =
        dominant_model(records, VehicleStatus::Suspicious).unwrap_or_else(no_model);

    let distribution = format!(
        "The analysed set shows {:.1}% of vehicles in NORMAL status, while {:.1}% are \
         A AUDITAR and {:.1}% are DUDOSO. The fleet has a stable performance core, with a \
         relevant group of vehicles exceeding expected consumption.",
        kpis.pct_normal, pct_audit, pct_suspicious
    );

    let averages = format!(
        "In the NORMAL group average consumption is about {} L/100km against a theoretical \
         {} L/100km, in line with the reference values. Vehicles in A AUDITAR average {} \
         L/100km against {} L/100km theoretical, a systematic deviation that warrants \
         operational investigation.",
        fmt_rate(normal_actual),
        fmt_rate(normal_theoretical),
        fmt_rate(audit_actual),
        fmt_rate(audit_theoretical)
    );

    let models = format!(
        "Deviations concentrate in model {} within A AUDITAR; review calibration, load \
         conditions and driving habits for it. DUDOSO ({:.1}% of vehicles) concentrates in \
         model {}, pointing to under-recorded distance or incomplete GPS data.",
        audit_model, pct_suspicious, suspicious_model
    );

    let data_quality = if pct_no_data > 0.0 {
        format!(
            "{:.1}% of vehicles are SIN DATOS, which limits the analysis. As more operating \
             days with complete distance and fuel records are added, indicators will \
             stabilise and allow a finer efficiency assessment per route and model.",
            pct_no_data
        )
    } else {
        "No vehicles are currently SIN DATOS, which supports the quality of the data base. \
         Adding more operating days will allow a finer efficiency assessment per route and \
         model."
            .to_string()
    };

    vec![distribution, averages, models, data_quality]
}

/// Distinct models, sorted, for the model filter
pub fn models(records: &[VehicleRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.model.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Everything an exporter prints besides the detail rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Local>,
    pub generated_by: String,
    pub tolerance: f64,
    pub kpis: Kpis,
    pub status_summary: Vec<StatusCount>,
    pub status_distribution: Vec<StatusCount>,
    pub recommendations: Vec<String>,
    pub narrative: Vec<String>,
    pub top_deviations: Vec<VehicleRecord>,
}

pub fn build_summary(
    records: &[VehicleRecord],
    tolerance: f64,
    top_n: usize,
    generated_by: &str,
) -> ReportSummary {
    let kpis = compute_kpis(records);
    ReportSummary {
        generated_at: Local::now(),
        generated_by: generated_by.to_string(),
        tolerance,
        kpis,
        status_summary: status_summary(records),
        status_distribution: status_distribution(records),
        recommendations: recommendations(&kpis),
        narrative: executive_narrative(records, &kpis),
        top_deviations: top_deviations(records, top_n),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fleetfuel_domain::model::ConsumptionMetrics;
    use fleetfuel_domain::service::{classify, compute_metrics, DEFAULT_TOLERANCE};

    pub(crate) fn record(id: &str, model: Option<&str>, d: f64, l: f64, t: Option<f64>) -> VehicleRecord {
        let metrics = compute_metrics(d, l, t, DEFAULT_TOLERANCE);
        VehicleRecord {
            identifier: id.to_string(),
            model: model.map(str::to_string),
            distance_km: d,
            liters: l,
            theoretical_rate: t,
            metrics,
            status: classify(d, l, t, &metrics),
        }
    }

    pub(crate) fn fleet() -> Vec<VehicleRecord> {
        vec![
            record("ABC123", Some("IVECO"), 200.0, 30.0, Some(12.0)), // needs audit, +6 L
            record("AB123CD", Some("SCANIA"), 100.0, 30.0, Some(30.0)), // normal
            record("XYZ789", None, 100.0, 20.0, Some(30.0)),          // suspicious
            record("BCD234", Some("IVECO"), 100.0, 40.0, Some(30.0)), // needs audit, +10 L
            record("CDE345", Some("SCANIA"), 100.0, 30.0, None),      // no data
            record("DEF456", None, 0.0, 0.0, None),                   // no movement
        ]
    }

    #[test]
    fn test_default_order_model_then_identifier() {
        let sorted = ConsumptionFilter::default().apply(&fleet());
        let ids: Vec<&str> = sorted.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec!["ABC123", "BCD234", "AB123CD", "CDE345", "DEF456", "XYZ789"]
        );
    }

    #[test]
    fn test_filter_model_and_status() {
        let filter = ConsumptionFilter {
            model: Some("IVECO".to_string()),
            statuses: vec![VehicleStatus::NeedsAudit],
            ..Default::default()
        };
        assert_eq!(filter.apply(&fleet()).len(), 2);

        let filter = ConsumptionFilter {
            statuses: vec![VehicleStatus::Normal, VehicleStatus::Suspicious],
            ..Default::default()
        };
        assert_eq!(filter.apply(&fleet()).len(), 2);
    }

    #[test]
    fn test_explicit_sort_puts_undefined_last() {
        for descending in [false, true] {
            let filter = ConsumptionFilter {
                sort: Some(SortColumn::ActualRate),
                descending,
                ..Default::default()
            };
            let sorted = filter.apply(&fleet());
            assert_eq!(sorted.last().unwrap().identifier, "DEF456");
            let first = sorted[0].metrics.actual_rate.unwrap();
            if descending {
                assert!((first - 40.0).abs() < 1e-9);
            } else {
                assert!((first - 15.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_kpis() {
        let kpis = compute_kpis(&fleet());
        assert_eq!(kpis.total, 6);
        assert_eq!(kpis.needs_audit, 2);
        assert_eq!(kpis.normal, 1);
        assert_eq!(kpis.suspicious, 1);
        assert_eq!(kpis.no_data, 1);
        assert!((kpis.pct_normal - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_kpis() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis.total, 0);
        assert_eq!(kpis.pct_normal, 0.0);
        let recs = recommendations(&kpis);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("No data available"));
        assert_eq!(executive_narrative(&[], &kpis).len(), 1);
    }

    #[test]
    fn test_summary_and_distribution_orders() {
        let summary = status_summary(&fleet());
        let order: Vec<VehicleStatus> = summary.iter().map(|s| s.status).collect();
        assert_eq!(
            order,
            vec![
                VehicleStatus::NeedsAudit,
                VehicleStatus::Suspicious,
                VehicleStatus::Normal,
                VehicleStatus::NoMovement,
                VehicleStatus::NoData,
            ]
        );

        let distribution = status_distribution(&fleet());
        assert_eq!(distribution[0].status, VehicleStatus::NeedsAudit);
        assert_eq!(distribution[0].count, 2);
    }

    #[test]
    fn test_recommendation_thresholds() {
        let kpis = Kpis {
            total: 10,
            normal: 7,
            needs_audit: 3,
            suspicious: 0,
            no_data: 0,
            pct_normal: 70.0,
        };
        let recs = recommendations(&kpis);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("A AUDITAR"));
        assert!(recs[1].contains("NORMAL"));

        let intermediate = Kpis {
            total: 10,
            normal: 6,
            needs_audit: 2,
            suspicious: 1,
            no_data: 0,
            pct_normal: 60.0,
        };
        let recs = recommendations(&intermediate);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("intermediate"));
    }

    #[test]
    fn test_top_deviations() {
        let top = top_deviations(&fleet(), 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].identifier, "BCD234");
        assert_eq!(top[1].identifier, "ABC123");
        assert_eq!(top_deviations(&fleet(), 1).len(), 1);
    }

    #[test]
    fn test_narrative_paragraphs() {
        let records = fleet();
        let kpis = compute_kpis(&records);
        let narrative = executive_narrative(&records, &kpis);
        assert_eq!(narrative.len(), 4);
        assert!(narrative[2].contains("model IVECO"));
        assert!(narrative[2].contains("no predominant model"));
        assert!(narrative[3].contains("SIN DATOS"));
        assert!(narrative[1].contains("30.0 L/100km"));
    }

    #[test]
    fn test_models() {
        assert_eq!(models(&fleet()), vec!["IVECO", "SCANIA"]);
    }

    #[test]
    fn test_metrics_default_is_undefined() {
        let metrics = ConsumptionMetrics::default();
        assert!(metrics.actual_rate.is_none());
    }
}
