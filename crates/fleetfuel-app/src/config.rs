//! Configuration management for fleetfuel-checker
//!
//! Config stored at: ~/.config/fleetfuel-checker/config.json

use std::path::{Path, PathBuf};

use fleetfuel_domain::service::DEFAULT_TOLERANCE;
use fleetfuel_types::{ConfigError, OutputFormat, Result};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "fleetfuel-checker";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Symmetric tolerance around the theoretical rate (0.10 = ±10%)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Directory holding the input spreadsheets (working directory if unset)
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    #[serde(default = "default_consumption_file")]
    pub consumption_file: String,

    #[serde(default = "default_distance_file")]
    pub distance_file: String,

    #[serde(default = "default_reference_file")]
    pub reference_file: String,

    #[serde(default = "default_logistics_file")]
    pub logistics_file: String,

    /// Enable the run cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache directory override
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// How many worst deviations the report lists
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// TOML access list; the credential gate is off when unset
    #[serde(default)]
    pub access_file: Option<PathBuf>,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_consumption_file() -> String {
    "consumo_real.xlsx".to_string()
}

fn default_distance_file() -> String {
    "distancias.xlsx".to_string()
}

fn default_reference_file() -> String {
    "Nomina_consumo_camion.xlsx".to_string()
}

fn default_logistics_file() -> String {
    "liq_comb.xlsx".to_string()
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            input_dir: None,
            consumption_file: default_consumption_file(),
            distance_file: default_distance_file(),
            reference_file: default_reference_file(),
            logistics_file: default_logistics_file(),
            cache_enabled: true,
            cache_dir: None,
            output_format: default_output_format(),
            top_n: default_top_n(),
            access_file: None,
        }
    }
}

/// Paths of the three consumption inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionPaths {
    pub consumption: PathBuf,
    pub distance: PathBuf,
    pub reference: PathBuf,
}

impl ConsumptionPaths {
    pub fn as_array(&self) -> [&Path; 3] {
        [&self.consumption, &self.distance, &self.reference]
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(cache_dir)
    }

    /// Load config from the default location, or defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a file, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.tolerance) {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be in [0, 1), got {}",
                self.tolerance
            ))
            .into());
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()).into());
        }
        Ok(())
    }

    fn input_path(&self, file: &str, dir_override: Option<&Path>) -> PathBuf {
        match dir_override.or(self.input_dir.as_deref()) {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    /// Resolve the three consumption inputs against the input directory
    pub fn consumption_paths(&self, dir_override: Option<&Path>) -> ConsumptionPaths {
        ConsumptionPaths {
            consumption: self.input_path(&self.consumption_file, dir_override),
            distance: self.input_path(&self.distance_file, dir_override),
            reference: self.input_path(&self.reference_file, dir_override),
        }
    }

    pub fn logistics_path(&self, dir_override: Option<&Path>) -> PathBuf {
        self.input_path(&self.logistics_file, dir_override)
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fleet Fuel Checker Configuration")?;
        writeln!(f, "================================")?;
        writeln!(f)?;
        writeln!(f, "Tolerance:        ±{:.1}%", self.tolerance * 100.0)?;
        writeln!(
            f,
            "Input dir:        {}",
            self.input_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(working directory)".to_string())
        )?;
        writeln!(f, "Consumption file: {}", self.consumption_file)?;
        writeln!(f, "Distance file:    {}", self.distance_file)?;
        writeln!(f, "Reference file:   {}", self.reference_file)?;
        writeln!(f, "Logistics file:   {}", self.logistics_file)?;
        writeln!(f, "Cache enabled:    {}", self.cache_enabled)?;
        writeln!(
            f,
            "Cache dir:        {}",
            self.cache_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;
        writeln!(f, "Top N:            {}", self.top_n)?;
        writeln!(
            f,
            "Access file:      {}",
            self.access_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(gate disabled)".to_string())
        )?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetfuel_types::Error;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!((config.tolerance - 0.10).abs() < 1e-12);
        assert_eq!(config.top_n, 5);
        assert!(config.cache_enabled);
        assert_eq!(config.reference_file, "Nomina_consumo_camion.xlsx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"tolerance": 0.15}"#).unwrap();
        assert!((config.tolerance - 0.15).abs() < 1e-12);
        assert_eq!(config.consumption_file, "consumo_real.xlsx");
        assert_eq!(config.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.tolerance = 1.0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));

        config.tolerance = -0.1;
        assert!(config.validate().is_err());

        let config = Config {
            top_n: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            tolerance: 0.2,
            input_dir: Some(PathBuf::from("/data/fleet")),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_input_paths() {
        let config = Config {
            input_dir: Some(PathBuf::from("/data")),
            ..Config::default()
        };
        let paths = config.consumption_paths(None);
        assert_eq!(paths.distance, PathBuf::from("/data/distancias.xlsx"));

        let paths = config.consumption_paths(Some(Path::new("/other")));
        assert_eq!(paths.reference, PathBuf::from("/other/Nomina_consumo_camion.xlsx"));

        let config = Config::default();
        assert_eq!(config.logistics_path(None), PathBuf::from("liq_comb.xlsx"));
    }

    #[test]
    fn test_display_mentions_tolerance() {
        let text = Config::default().to_string();
        assert!(text.contains("±10.0%"));
        assert!(text.contains("(gate disabled)"));
    }
}
