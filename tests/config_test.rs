//! Integration tests for configuration loading

use parking_facility::billing::HourlyRates;
use parking_facility::domain::types::SlotSize;
use parking_facility::infra::{Config, SlotSpec};
use parking_facility::services::{Facility, FacilityError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let temp_file = write_config(
        r#"
[site]
id = "airport-p2"

[rates]
base_fee = 50
base_window_hours = 2
daily_fee = 6000
hours_per_day = 24
continuous_gap_max_hours = 2

[rates.hourly]
small = 30
medium = 70
large = 120

[layout]
min_entry_points = 2

[[layout.slots]]
size = "small"
distances = [1, 9]

[[layout.slots]]
size = "large"
distances = [9, 1]

[egress]
file = ""

[metrics]
log_on_exit = false
"#,
    );

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "airport-p2");
    assert_eq!(config.rate_schedule().base_fee(), 50);
    assert_eq!(config.rate_schedule().base_window_hours(), 2);
    assert_eq!(config.rate_schedule().daily_fee(), 6000);
    assert_eq!(config.rate_schedule().continuous_gap_max_hours(), 2);
    assert_eq!(
        config.rate_schedule().hourly(),
        &HourlyRates { small: 30, medium: 70, large: 120 }
    );
    assert_eq!(config.min_entry_points(), 2);
    assert_eq!(
        config.slots(),
        &[SlotSpec::new(SlotSize::Small, vec![1, 9]), SlotSpec::new(SlotSize::Large, vec![9, 1])]
    );
    assert_eq!(config.egress_file(), "");
    assert!(!config.metrics_log_on_exit());
    assert_eq!(config.config_file(), temp_file.path().display().to_string());

    let facility = Facility::from_config(&config).unwrap();
    assert_eq!(facility.entry_points(), 2);
}

#[test]
fn test_shipped_dev_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml");
    let config = Config::from_file(path).unwrap();

    assert_eq!(config.site_id(), "dev-lot");
    let facility = Facility::from_config(&config).unwrap();
    assert_eq!(facility.entry_points(), 3);
    assert_eq!(facility.slots().len(), 9);
}

#[test]
fn test_invalid_rates_rejected() {
    let temp_file = write_config(
        r#"
[rates]
hours_per_day = 0
"#,
    );
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Invalid [rates]"));
}

#[test]
fn test_out_of_range_gap_rejected() {
    let temp_file = write_config(
        r#"
[rates]
continuous_gap_max_hours = 9223372036854775807
"#,
    );
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("out of range"));
}

#[test]
fn test_unknown_slot_size_rejected() {
    let temp_file = write_config(
        r#"
[[layout.slots]]
size = "huge"
distances = [1, 2, 3]
"#,
    );
    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_layout_with_too_few_entry_points() {
    let temp_file = write_config(
        r#"
[[layout.slots]]
size = "small"
distances = [1, 2]
"#,
    );
    let config = Config::from_file(temp_file.path()).unwrap();
    let err = Facility::from_config(&config).err().unwrap();
    assert!(matches!(err, FacilityError::TooFewEntryPoints { found: 2, min: 3 }));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.site_id(), "parking");
    assert_eq!(config.rate_schedule().base_fee(), 40);
    assert_eq!(config.slots().len(), 9);
    assert_eq!(config.config_file(), "default");
}
