//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::billing::rates::{
    HourlyRates, RateSchedule, DEFAULT_BASE_FEE, DEFAULT_BASE_WINDOW_HOURS,
    DEFAULT_CONTINUOUS_GAP_MAX_HOURS, DEFAULT_DAILY_FEE, DEFAULT_HOURS_PER_DAY,
};
use crate::domain::types::SlotSize;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Facility identifier written into every receipt
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "parking".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    #[serde(default = "default_base_fee")]
    pub base_fee: u64,
    #[serde(default = "default_base_window_hours")]
    pub base_window_hours: u64,
    #[serde(default = "default_daily_fee")]
    pub daily_fee: u64,
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u64,
    /// Longest exit-to-entry gap (hours) still billed as one continuous stay
    #[serde(default = "default_continuous_gap_max_hours")]
    pub continuous_gap_max_hours: u64,
    #[serde(default)]
    pub hourly: HourlyRates,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            base_window_hours: default_base_window_hours(),
            daily_fee: default_daily_fee(),
            hours_per_day: default_hours_per_day(),
            continuous_gap_max_hours: default_continuous_gap_max_hours(),
            hourly: HourlyRates::default(),
        }
    }
}

fn default_base_fee() -> u64 {
    DEFAULT_BASE_FEE
}

fn default_base_window_hours() -> u64 {
    DEFAULT_BASE_WINDOW_HOURS
}

fn default_daily_fee() -> u64 {
    DEFAULT_DAILY_FEE
}

fn default_hours_per_day() -> u64 {
    DEFAULT_HOURS_PER_DAY
}

fn default_continuous_gap_max_hours() -> u64 {
    DEFAULT_CONTINUOUS_GAP_MAX_HOURS
}

/// One slot of the layout: its size and its distance to each entry point
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotSpec {
    pub size: SlotSize,
    pub distances: Vec<u32>,
}

impl SlotSpec {
    pub fn new(size: SlotSize, distances: Vec<u32>) -> Self {
        Self { size, distances }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_min_entry_points")]
    pub min_entry_points: usize,
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotSpec>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { min_entry_points: default_min_entry_points(), slots: default_slots() }
    }
}

fn default_min_entry_points() -> usize {
    3
}

fn default_slots() -> Vec<SlotSpec> {
    vec![
        SlotSpec::new(SlotSize::Small, vec![1, 4, 5]),
        SlotSpec::new(SlotSize::Small, vec![2, 3, 4]),
        SlotSpec::new(SlotSize::Medium, vec![3, 2, 3]),
        SlotSpec::new(SlotSize::Medium, vec![4, 1, 2]),
        SlotSpec::new(SlotSize::Large, vec![5, 3, 1]),
        SlotSpec::new(SlotSize::Large, vec![2, 5, 4]),
        SlotSpec::new(SlotSize::Small, vec![6, 6, 2]),
        SlotSpec::new(SlotSize::Medium, vec![5, 5, 5]),
        SlotSpec::new(SlotSize::Large, vec![4, 4, 3]),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for receipt egress (JSONL format); empty disables egress
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "receipts.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Log a metrics summary when the command stream ends
    #[serde(default = "default_log_on_exit")]
    pub log_on_exit: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { log_on_exit: default_log_on_exit() }
    }
}

fn default_log_on_exit() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    rate_schedule: RateSchedule,
    min_entry_points: usize,
    slots: Vec<SlotSpec>,
    egress_file: String,
    metrics_log_on_exit: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            rate_schedule: RateSchedule::default(),
            min_entry_points: default_min_entry_points(),
            slots: default_slots(),
            egress_file: default_egress_file(),
            metrics_log_on_exit: default_log_on_exit(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let rates = toml_config.rates;
        let rate_schedule = RateSchedule::new(
            rates.base_fee,
            rates.base_window_hours,
            rates.hourly,
            rates.daily_fee,
            rates.hours_per_day,
            rates.continuous_gap_max_hours,
        )
        .with_context(|| format!("Invalid [rates] in {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            rate_schedule,
            min_entry_points: toml_config.layout.min_entry_points,
            slots: toml_config.layout.slots,
            egress_file: toml_config.egress.file,
            metrics_log_on_exit: toml_config.metrics.log_on_exit,
            config_file: path.display().to_string(),
        })
    }

    /// Load from an explicit path, falling back to defaults on any error
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn rate_schedule(&self) -> &RateSchedule {
        &self.rate_schedule
    }

    pub fn min_entry_points(&self) -> usize {
        self.min_entry_points
    }

    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn metrics_log_on_exit(&self) -> bool {
        self.metrics_log_on_exit
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to replace the layout
    pub fn with_slots(mut self, slots: Vec<SlotSpec>) -> Self {
        self.slots = slots;
        self
    }

    /// Builder method for tests to disable or redirect egress
    pub fn with_egress_file(mut self, file: &str) -> Self {
        self.egress_file = file.to_string();
        self
    }
}
