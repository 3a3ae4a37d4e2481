//! Command handlers

use std::path::PathBuf;
use std::time::Duration;

use fleetfuel_app::app::{
    report_view, run_consumption, run_logistics, ConsumptionOptions, ProgressCallback,
};
use fleetfuel_app::export::{
    export_audit_xlsx, export_consumption_csv, export_consumption_pdf, export_consumption_xlsx,
};
use fleetfuel_app::report::ConsumptionFilter;
use fleetfuel_app::{Config, Session};
use fleetfuel_domain::service::TripFilter;
use fleetfuel_infra::RunCache;
use fleetfuel_types::{CacheError, Error, OutputFormat, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{Cli, Commands, ConfigArgs};
use crate::output::{output_audit, output_consumption};

pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let config = Config::load()?;
    debug!(config = ?config, "configuration loaded");

    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Consumption {
            model,
            statuses,
            sort,
            desc,
            tolerance,
            no_cache,
            show_rejected,
            xlsx,
            csv,
            pdf,
        } => {
            let session = open_session(&cli, &config)?.with_filter(ConsumptionFilter {
                model: model.clone(),
                statuses: statuses.clone(),
                sort: *sort,
                descending: *desc,
            });

            // Cache disabled if: --no-cache OR config.cache_enabled=false
            let mut options = ConsumptionOptions::new().with_cache(!no_cache && config.cache_enabled);
            if let Some(tolerance) = tolerance {
                options = options.with_tolerance(*tolerance);
            }
            if let Some(dir) = &cli.dir {
                options = options.with_input_dir(dir.clone());
            }

            let exports = Exports {
                xlsx: xlsx.clone(),
                csv: csv.clone(),
                pdf: pdf.clone(),
            };
            cmd_consumption(&config, &session, &options, output_format, *show_rejected, &exports)
        }

        Commands::Audit {
            from,
            to,
            clients,
            materials,
            business_units,
            show_trips,
            xlsx,
        } => {
            open_session(&cli, &config)?;
            let filter = TripFilter {
                from: *from,
                to: *to,
                clients: clients.clone(),
                materials: materials.clone(),
                business_units: business_units.clone(),
            };
            cmd_audit(&cli, &config, filter, output_format, *show_trips, xlsx.as_ref())
        }

        Commands::Config(args) => cmd_config(args),

        Commands::Cache { clear, stats } => cmd_cache(&config, *clear, *stats),
    }
}

fn open_session(cli: &Cli, config: &Config) -> Result<Session> {
    Session::open(config, cli.user.as_deref(), cli.code.as_deref())
}

struct Exports {
    xlsx: Option<PathBuf>,
    csv: Option<PathBuf>,
    pdf: Option<PathBuf>,
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_consumption(
    config: &Config,
    session: &Session,
    options: &ConsumptionOptions,
    output_format: OutputFormat,
    show_rejected: bool,
    exports: &Exports,
) -> Result<()> {
    let pb = spinner();
    let pb_progress = pb.clone();
    let progress: ProgressCallback = Box::new(move |msg: &str| {
        pb_progress.set_message(msg.to_string());
    });

    let result = run_consumption(config, options, Some(progress));
    pb.finish_and_clear();
    let result = result?;

    let (records, summary) = report_view(&result.run, session, config.top_n);
    output_consumption(
        output_format,
        &records,
        &summary,
        &result.run,
        result.from_cache,
        show_rejected,
    )?;

    if let Some(path) = &exports.xlsx {
        export_consumption_xlsx(&records, &summary, &result.run.rejected, path)?;
        eprintln!("Exported to {}", path.display());
    }
    if let Some(path) = &exports.csv {
        export_consumption_csv(&records, path)?;
        eprintln!("Exported to {}", path.display());
    }
    if let Some(path) = &exports.pdf {
        export_consumption_pdf(&records, &summary, path)?;
        eprintln!("Exported to {}", path.display());
    }

    Ok(())
}

fn cmd_audit(
    cli: &Cli,
    config: &Config,
    filter: TripFilter,
    output_format: OutputFormat,
    show_trips: bool,
    xlsx: Option<&PathBuf>,
) -> Result<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(Error::InvalidArgument(format!(
                "--from {} is after --to {}",
                from, to
            )));
        }
    }

    let pb = spinner();
    pb.set_message(format!(
        "Loading {}",
        config.logistics_path(cli.dir.as_deref()).display()
    ));
    let dashboard = run_logistics(config, cli.dir.as_deref(), filter);
    pb.finish_and_clear();
    let dashboard = dashboard?;

    output_audit(output_format, &dashboard, show_trips)?;

    if let Some(path) = xlsx {
        export_audit_xlsx(&dashboard.findings, path)?;
        eprintln!("Exported to {}", path.display());
    }

    Ok(())
}

fn cmd_config(args: &ConfigArgs) -> Result<()> {
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(tolerance) = args.set_tolerance {
        config.tolerance = tolerance;
        modified = true;
    }

    if let Some(ref dir) = args.set_input_dir {
        config.input_dir = Some(dir.clone());
        modified = true;
    }

    if let Some(ref file) = args.set_consumption_file {
        config.consumption_file = file.clone();
        modified = true;
    }

    if let Some(ref file) = args.set_distance_file {
        config.distance_file = file.clone();
        modified = true;
    }

    if let Some(ref file) = args.set_reference_file {
        config.reference_file = file.clone();
        modified = true;
    }

    if let Some(ref file) = args.set_logistics_file {
        config.logistics_file = file.clone();
        modified = true;
    }

    if let Some(cache_enabled) = args.set_cache {
        config.cache_enabled = cache_enabled;
        modified = true;
    }

    if let Some(ref dir) = args.set_cache_dir {
        config.cache_dir = Some(dir.clone());
        modified = true;
    }

    if let Some(output_format) = args.set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(top_n) = args.set_top_n {
        config.top_n = top_n;
        modified = true;
    }

    if let Some(ref file) = args.set_access_file {
        config.access_file = Some(file.clone());
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if args.show || !modified {
        println!("{}", config);
    }

    Ok(())
}

fn cmd_cache(config: &Config, clear: bool, stats: bool) -> Result<()> {
    if !config.cache_enabled {
        return Err(CacheError::Disabled.into());
    }

    let cache = RunCache::new(config.cache_dir()?)?;

    if clear {
        let count = cache.clear()?;
        println!("Cleared {} cached entries", count);
    }

    if stats || !clear {
        let stats = cache.stats()?;
        println!("{}", stats.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_command_rejected_when_disabled() {
        let config = Config {
            cache_enabled: false,
            ..Config::default()
        };
        assert!(matches!(
            cmd_cache(&config, true, false),
            Err(Error::Cache(CacheError::Disabled))
        ));
    }
}
