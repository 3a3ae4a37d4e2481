//! Consumption Service - fuel reconciliation use case
//!
//! Orchestrates one run:
//! 1. Resolve the three input paths
//! 2. Check the run cache (keyed on input bytes and tolerance)
//! 3. Load each spreadsheet
//! 4. Run the pure reconciliation pipeline
//! 5. Store the run back in the cache

use std::path::PathBuf;

use fleetfuel_domain::model::{ConsumptionRun, VehicleRecord};
use fleetfuel_domain::service::{run_consumption_pipeline, ConsumptionInputs};
use fleetfuel_infra::{load_table, RunCache};
use fleetfuel_types::{Error, InputSource, Result};
use tracing::{info, warn};

use crate::config::{Config, ConsumptionPaths};
use crate::report::{build_summary, ReportSummary};
use crate::session::Session;

/// Progress callback for user-facing output
pub type ProgressCallback = Box<dyn Fn(&str) + Send>;

/// Options for one consumption run
#[derive(Debug, Clone, Default)]
pub struct ConsumptionOptions {
    /// Overrides the configured tolerance
    pub tolerance: Option<f64>,

    /// Whether to use the run cache
    pub use_cache: bool,

    /// Overrides the configured input directory
    pub input_dir: Option<PathBuf>,
}

impl ConsumptionOptions {
    pub fn new() -> Self {
        Self {
            use_cache: true,
            ..Default::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    pub fn with_input_dir(mut self, dir: PathBuf) -> Self {
        self.input_dir = Some(dir);
        self
    }
}

/// A computed run plus where it came from
#[derive(Debug, Clone)]
pub struct ConsumptionResult {
    pub run: ConsumptionRun,
    pub paths: ConsumptionPaths,
    /// Whether the run came from cache
    pub from_cache: bool,
}

fn open_cache(config: &Config, options: &ConsumptionOptions) -> Option<RunCache> {
    if !options.use_cache || !config.cache_enabled {
        return None;
    }
    match config.cache_dir().and_then(RunCache::new) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!(error = %e, "run cache unavailable, continuing without it");
            None
        }
    }
}

/// Main entry point: reconcile the three consumption inputs
pub fn run_consumption(
    config: &Config,
    options: &ConsumptionOptions,
    progress: Option<ProgressCallback>,
) -> Result<ConsumptionResult> {
    let report = |msg: &str| {
        if let Some(ref cb) = progress {
            cb(msg);
        }
    };

    let tolerance = options.tolerance.unwrap_or(config.tolerance);
    if !(0.0..1.0).contains(&tolerance) {
        return Err(Error::InvalidArgument(format!(
            "tolerance must be in [0, 1), got {}",
            tolerance
        )));
    }

    // Step 1: Resolve inputs
    let paths = config.consumption_paths(options.input_dir.as_deref());
    for path in paths.as_array() {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
    }

    // Step 2: Check cache
    let cache = open_cache(config, options);
    let key = match cache {
        Some(_) => Some(RunCache::fingerprint(&paths.as_array(), tolerance)?),
        None => None,
    };

    if let (Some(cache), Some(key)) = (&cache, &key) {
        match cache.get(key) {
            Ok(Some(run)) => {
                info!(key = %key, "run cache hit");
                report("Using cached results");
                return Ok(ConsumptionResult {
                    run,
                    paths,
                    from_cache: true,
                });
            }
            Ok(None) => info!(key = %key, "run cache miss"),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cache entry");
                cache.remove(key)?;
            }
        }
    }

    // Step 3: Load inputs
    report(&format!("Loading consumption: {}", paths.consumption.display()));
    let consumption = load_table(&paths.consumption)?;
    report(&format!("Loading distance: {}", paths.distance.display()));
    let distance = load_table(&paths.distance)?;
    report(&format!("Loading reference: {}", paths.reference.display()));
    let reference = load_table(&paths.reference)?;

    // Step 4: Reconcile
    report("Reconciling vehicles");
    let run = run_consumption_pipeline(
        ConsumptionInputs {
            consumption,
            distance,
            reference,
        },
        tolerance,
    )?;
    log_data_quality(&run);

    // Step 5: Store in cache
    if let (Some(cache), Some(key)) = (&cache, &key) {
        if let Err(e) = cache.set(key, &run) {
            warn!(error = %e, "failed to store run in cache");
        }
    }

    Ok(ConsumptionResult {
        run,
        paths,
        from_cache: false,
    })
}

fn log_data_quality(run: &ConsumptionRun) {
    for input in &run.empty_inputs {
        warn!(input = %input, "input has no valid rows");
    }
    for quality in &run.quality {
        if quality.rejected_rows > 0 {
            warn!(
                input = %quality.input,
                rejected = quality.rejected_rows,
                "rows rejected for invalid identifier"
            );
        }
        if quality.input == InputSource::Reference && quality.duplicate_rows > 0 {
            warn!(
                duplicates = quality.duplicate_rows,
                "repeated identifiers in reference, first occurrence kept"
            );
        }
    }
    info!(vehicles = run.records.len(), "consumption run complete");
}

/// Apply the session filter and summarise what remains
pub fn report_view(
    run: &ConsumptionRun,
    session: &Session,
    top_n: usize,
) -> (Vec<VehicleRecord>, ReportSummary) {
    let records = session.filter.apply(&run.records);
    let summary = build_summary(&records, run.tolerance, top_n, session.identity_label());
    (records, summary)
}
