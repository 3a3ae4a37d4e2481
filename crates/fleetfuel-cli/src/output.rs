//! Output formatting module

use fleetfuel_app::app::LogisticsDashboard;
use fleetfuel_app::report::ReportSummary;
use fleetfuel_domain::model::{ConsumptionRun, VehicleRecord};
use fleetfuel_types::{OutputFormat, Result};
use serde_json::json;

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_row(record: &VehicleRecord) -> String {
    let metrics = &record.metrics;
    format!(
        "{:<8} {:<18} {:>10} {:>9} {:>8} {:>8} {:>9} {:>9} {:>7} {} {}",
        record.identifier,
        truncate(record.model.as_deref().unwrap_or("-"), 18),
        format!("{:.2}", record.distance_km),
        format!("{:.2}", record.liters),
        fmt_opt(metrics.actual_rate, 2),
        fmt_opt(record.theoretical_rate, 2),
        fmt_opt(metrics.expected_liters, 2),
        fmt_opt(metrics.deviation_liters, 2),
        fmt_opt(metrics.deviation_ratio.map(|r| r * 100.0), 1),
        record.status.marker(),
        record.status.label(),
    )
}

pub fn output_consumption(
    output_format: OutputFormat,
    records: &[VehicleRecord],
    summary: &ReportSummary,
    run: &ConsumptionRun,
    from_cache: bool,
    show_rejected: bool,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let mut content = json!({
            "from_cache": from_cache,
            "summary": summary,
            "quality": run.quality,
            "empty_inputs": run.empty_inputs,
            "records": records,
        });
        if show_rejected {
            content["rejected"] = serde_json::to_value(&run.rejected)?;
        }
        println!("{}", serde_json::to_string_pretty(&content)?);
        return Ok(());
    }

    println!("\nFuel Consumption Control");
    println!("========================");
    println!(
        "Tolerance: +/-{:.0}%{}",
        run.tolerance * 100.0,
        if from_cache { "  (cached)" } else { "" }
    );
    println!("User:      {}", summary.generated_by);

    println!("\n--- Data quality ---");
    for quality in &run.quality {
        println!(
            "{:<12} rows: {:>5}  valid: {:>5}  rejected: {:>4}  missing values: {:>4}{}",
            quality.input.label(),
            quality.total_rows,
            quality.valid_rows,
            quality.rejected_rows,
            quality.missing_values,
            if quality.duplicate_rows > 0 {
                format!("  duplicates: {}", quality.duplicate_rows)
            } else {
                String::new()
            }
        );
    }
    for input in &run.empty_inputs {
        println!("Warning: {} input has no valid rows", input);
    }

    let kpis = &summary.kpis;
    println!("\n--- Indicators ---");
    println!("Vehicles:        {}", kpis.total);
    println!("NORMAL:          {} ({:.1}%)", kpis.normal, kpis.pct_normal);
    println!(
        "A AUDITAR:       {} ({:.1}%)",
        kpis.needs_audit,
        kpis.pct(kpis.needs_audit)
    );
    println!(
        "DUDOSO:          {} ({:.1}%)",
        kpis.suspicious,
        kpis.pct(kpis.suspicious)
    );
    println!(
        "SIN DATOS:       {} ({:.1}%)",
        kpis.no_data,
        kpis.pct(kpis.no_data)
    );

    if !summary.status_summary.is_empty() {
        println!("\n--- Status summary ---");
        for entry in &summary.status_summary {
            println!(
                "{} {:<16} {:>5}",
                entry.status.marker(),
                entry.status.label(),
                entry.count
            );
        }
    }

    println!();
    println!(
        "{:<8} {:<18} {:>10} {:>9} {:>8} {:>8} {:>9} {:>9} {:>7} Status",
        "Plate", "Model", "Km", "Liters", "Actual", "Theor.", "Expected", "Dev. L", "Dev. %"
    );
    println!("{}", "-".repeat(110));
    for record in records {
        println!("{}", format_row(record));
    }

    if !summary.top_deviations.is_empty() {
        println!("\n--- Top deviations (A AUDITAR) ---");
        for (idx, record) in summary.top_deviations.iter().enumerate() {
            println!(
                "{}. {} ({}) - deviation {} liters ({} / {} L/100km)",
                idx + 1,
                record.identifier,
                record.model.as_deref().unwrap_or("-"),
                fmt_opt(record.metrics.deviation_liters, 1),
                fmt_opt(record.metrics.actual_rate, 1),
                fmt_opt(record.theoretical_rate, 1)
            );
        }
    }

    println!("\n--- Recommendations ---");
    for recommendation in &summary.recommendations {
        println!("- {}", recommendation);
    }

    if show_rejected {
        println!("\n--- Rejected rows ({}) ---", run.rejected.len());
        for row in &run.rejected {
            println!(
                "{:<12} row {:>5}  plate: {:<12} value: {}",
                row.input.label(),
                row.row_number,
                if row.identifier.is_empty() {
                    "(blank)"
                } else {
                    row.identifier.as_str()
                },
                fmt_opt(row.value, 2)
            );
        }
    }

    Ok(())
}

pub fn output_audit(
    output_format: OutputFormat,
    dashboard: &LogisticsDashboard,
    show_trips: bool,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(dashboard)?);
        return Ok(());
    }

    println!("\nLogistics Audit");
    println!("===============");
    if let (Some(from), Some(to)) = (dashboard.filter.from, dashboard.filter.to) {
        println!("Period: {} - {}", from.format("%d/%m/%Y"), to.format("%d/%m/%Y"));
    }
    println!(
        "Trips:  {} selected of {}",
        dashboard.selected_trips, dashboard.total_trips
    );

    let kpis = &dashboard.kpis;
    println!("\n--- Indicators ---");
    println!("Trips:     {}", kpis.trips);
    println!("Tonnes:    {:.2}", kpis.tonnes);
    println!("Valuation: {:.2}", kpis.valuation);

    for block in &dashboard.materials {
        println!(
            "\n--- {} --- trips: {}  tonnes: {:.2}  valuation: {:.2}",
            block.material, block.totals.trips, block.totals.tonnes, block.totals.valuation
        );
        for client in &block.by_client {
            println!(
                "  {:<30} {:>5} {:>12.2} {:>14.2}",
                truncate(&client.key, 30),
                client.trips,
                client.tonnes,
                client.valuation
            );
        }
    }

    if !dashboard.daily.is_empty() {
        println!("\n--- Daily trips ---");
        for day in &dashboard.daily {
            println!(
                "{}  {:<8} {:>4}",
                day.date.format("%d/%m/%Y"),
                day.material,
                day.trips
            );
        }
    }

    if !dashboard.carriers.is_empty() {
        println!("\n--- Carriers by tonnes ---");
        for carrier in &dashboard.carriers {
            println!(
                "  {:<30} {:>5} {:>12.2}",
                truncate(&carrier.key, 30),
                carrier.trips,
                carrier.tonnes
            );
        }
    }

    println!("\n--- Audit ---");
    for finding in &dashboard.findings {
        println!("{:<28} {:>5}", finding.rule.title(), finding.trips.len());
        if show_trips {
            for trip in &finding.trips {
                println!(
                    "    row {:>5}  {}  {:<24} {:<8} {:<20} remito: {}",
                    trip.row_number,
                    trip.departure
                        .map(|d| d.format("%d/%m/%Y").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    truncate(&trip.client, 24),
                    trip.material,
                    truncate(&trip.carrier, 20),
                    trip.delivery_note
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(15.0), 2), "15.00");
        assert_eq!(fmt_opt(Some(25.0), 1), "25.0");
        assert_eq!(fmt_opt(None, 2), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("IVECO", 18), "IVECO");
        assert_eq!(truncate("MERCEDES BENZ ATEGO 1726", 10), "MERCEDE...");
    }
}
