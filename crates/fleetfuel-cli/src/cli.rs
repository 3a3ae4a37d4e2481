//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use fleetfuel_app::report::SortColumn;
use fleetfuel_types::{OutputFormat, VehicleStatus};

#[derive(Parser)]
#[command(name = "fleetfuel-checker")]
#[command(version)]
#[command(about = "Fleet fuel consumption control and logistics audit")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging to stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// E-mail for the access list (when one is configured)
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,

    /// Access code for --user
    #[arg(long, global = true)]
    pub code: Option<String>,

    /// Input directory (overrides config)
    #[arg(long, short = 'd', global = true)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile fuel loads against distances and theoretical consumption
    Consumption {
        /// Show only this model
        #[arg(long, short = 'm')]
        model: Option<String>,

        /// Show only these statuses (repeatable)
        #[arg(long = "status", short = 's', value_enum)]
        statuses: Vec<VehicleStatus>,

        /// Sort the detail table by this column (default: model, plate)
        #[arg(long, value_enum)]
        sort: Option<SortColumn>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Tolerance around the theoretical rate (e.g. 0.10). Uses config value if not specified.
        #[arg(long, short = 't')]
        tolerance: Option<f64>,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,

        /// List rows rejected for an invalid plate
        #[arg(long)]
        show_rejected: bool,

        /// Export the detail to an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Export the detail to a semicolon-separated file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Export the full report to PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Audit the logistics settlement sheet
    Audit {
        /// First departure date (YYYY-MM-DD). Defaults to the earliest in the sheet.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last departure date (YYYY-MM-DD). Defaults to the latest in the sheet.
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Client filter (repeatable)
        #[arg(long = "client")]
        clients: Vec<String>,

        /// Material filter (repeatable)
        #[arg(long = "material")]
        materials: Vec<String>,

        /// Business unit filter (repeatable)
        #[arg(long = "business-unit")]
        business_units: Vec<String>,

        /// List the flagged trips of every rule
        #[arg(long)]
        show_trips: bool,

        /// Export findings to an Excel workbook (one sheet per rule)
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Show or modify configuration
    Config(ConfigArgs),

    /// Manage the run cache
    Cache {
        /// Clear all cached runs
        #[arg(long)]
        clear: bool,

        /// Show cache statistics
        #[arg(long)]
        stats: bool,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Set default tolerance
    #[arg(long)]
    pub set_tolerance: Option<f64>,

    /// Set default input directory
    #[arg(long)]
    pub set_input_dir: Option<PathBuf>,

    /// Set consumption file name
    #[arg(long)]
    pub set_consumption_file: Option<String>,

    /// Set distance file name
    #[arg(long)]
    pub set_distance_file: Option<String>,

    /// Set reference (nomenclature) file name
    #[arg(long)]
    pub set_reference_file: Option<String>,

    /// Set logistics file name
    #[arg(long)]
    pub set_logistics_file: Option<String>,

    /// Enable or disable the run cache
    #[arg(long)]
    pub set_cache: Option<bool>,

    /// Set cache directory
    #[arg(long)]
    pub set_cache_dir: Option<PathBuf>,

    /// Set default output format
    #[arg(long)]
    pub set_output: Option<OutputFormat>,

    /// Set how many worst deviations the report lists
    #[arg(long)]
    pub set_top_n: Option<usize>,

    /// Set the access list file (TOML)
    #[arg(long)]
    pub set_access_file: Option<PathBuf>,

    /// Reset to defaults
    #[arg(long)]
    pub reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_consumption_filters_parse() {
        let cli = Cli::try_parse_from([
            "fleetfuel-checker",
            "consumption",
            "--status",
            "needs-audit",
            "--status",
            "suspicious",
            "--sort",
            "deviation-liters",
            "--desc",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Consumption {
                statuses,
                sort,
                desc,
                ..
            } => {
                assert_eq!(
                    statuses,
                    vec![VehicleStatus::NeedsAudit, VehicleStatus::Suspicious]
                );
                assert_eq!(sort, Some(SortColumn::DeviationLiters));
                assert!(desc);
            }
            _ => panic!("expected consumption command"),
        }
    }

    #[test]
    fn test_audit_dates_parse() {
        let cli = Cli::try_parse_from([
            "fleetfuel-checker",
            "audit",
            "--from",
            "2025-03-01",
            "--client",
            "ACME",
            "--client",
            "OBRAS SA",
        ])
        .unwrap();

        match cli.command {
            Commands::Audit { from, clients, .. } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 3, 1));
                assert_eq!(clients.len(), 2);
            }
            _ => panic!("expected audit command"),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["fleetfuel-checker", "audit", "--from", "01/03/2025"]).is_err());
    }
}
