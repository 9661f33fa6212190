//! End-to-end tests: config file -> facility -> console commands -> receipts

use parking_facility::infra::{Config, Metrics};
use parking_facility::io::{Console, Egress, Step};
use parking_facility::services::Facility;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::{tempdir, NamedTempFile};

const LAYOUT: &str = r#"
[site]
id = "e2e"

[[layout.slots]]
size = "small"
distances = [1, 3, 5]

[[layout.slots]]
size = "medium"
distances = [2, 2, 4]

[[layout.slots]]
size = "large"
distances = [4, 3, 1]
"#;

struct Harness {
    console: Console,
    metrics: Arc<Metrics>,
    receipts: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file.write_all(LAYOUT.as_bytes()).unwrap();
    config_file.flush().unwrap();

    let dir = tempdir().unwrap();
    let receipts = dir.path().join("out").join("receipts.jsonl");

    let config = Config::from_file(config_file.path())
        .unwrap()
        .with_egress_file(receipts.to_str().unwrap());
    let metrics = Arc::new(Metrics::new());
    let facility = Facility::from_config(&config).unwrap().with_metrics(metrics.clone());
    let egress = Egress::from_config(config.egress_file(), config.site_id());

    Harness { console: Console::new(facility, egress), metrics, receipts, _dir: dir }
}

fn run(console: &mut Console, script: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in script.lines() {
        match console.run_line(line) {
            Step::Output(text) => out.push(text),
            Step::Skip => {}
            Step::Quit => break,
        }
    }
    out
}

#[test]
fn test_day_of_operations() {
    let mut h = harness();
    let out = run(
        &mut h.console,
        "\
# opening
park CAR-S s 0 2024-05-01T08:00:00Z
park CAR-L l 0 2024-05-01T08:00:00Z
park CAR-M2 m 0 2024-05-01T08:01:00Z
park CAR-M3 m 0 2024-05-01T08:02:00Z
unpark CAR-S 2024-05-01T10:00:00Z
park CAR-S s 1 2024-05-01T10:45:00Z
unpark CAR-S 2024-05-01T15:45:00Z
unpark CAR-L 2024-05-02T08:00:01Z
audit CAR-S
quit
status",
    );

    assert!(out[0].contains("CAR-S small in slot 0 (small)"));
    assert!(out[1].contains("CAR-L large in slot 2 (large)"));
    assert!(out[2].contains("CAR-M2 medium in slot 1 (medium)"));
    assert!(out[3].starts_with("error: no free slot fits a medium vehicle"));

    // 2h then 5h of small time: one 7h stay = 40 + 4 * 20 = 120, 40 already paid
    assert!(out[4].ends_with("due 40"));
    assert!(out[5].contains("continues"));
    assert!(out[6].contains("total 120 already paid 40"));
    assert!(out[6].ends_with("due 80"));

    // 24h + 1s in a large slot
    assert!(out[7].ends_with("due 5040"));

    assert!(out[8].contains("segment 1: 2 ticket(s), 7h billed"));
    assert!(out[8].ends_with("total 120 charged 120"));

    // Nothing after quit runs
    assert_eq!(out.len(), 9);

    assert_eq!(h.metrics.parked_total(), 4);
    assert_eq!(h.metrics.unparked_total(), 3);
    assert_eq!(h.metrics.revenue_total(), 40 + 80 + 5040);
    assert_eq!(h.metrics.rejected_total(), 1);
    assert_eq!(h.metrics.continuous_links_total(), 1);

    let receipts = fs::read_to_string(&h.receipts).unwrap();
    let lines: Vec<serde_json::Value> =
        receipts.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l["site"] == "e2e"));
    let charged: u64 = lines.iter().map(|l| l["charged"].as_u64().unwrap()).sum();
    assert_eq!(charged, 5160);
}

#[test]
fn test_rejections_leave_state_untouched() {
    let mut h = harness();
    let out = run(
        &mut h.console,
        "\
park CAR-1 s 9 2024-05-01T08:00:00Z
park CAR-1 s 0 not-a-time
park CAR-1 s 0 2024-05-01T08:00:00Z
park CAR-1 s 0 2024-05-01T08:30:00Z
unpark CAR-1 2024-05-01T07:00:00Z
unpark CAR-2 2024-05-01T09:00:00Z
history CAR-1",
    );

    assert_eq!(out[0], "error: unknown entry point 9");
    assert!(out[1].starts_with("error: invalid timestamp 'not-a-time'"));
    assert!(out[3].starts_with("error: vehicle CAR-1 is already parked"));
    assert!(out[4].starts_with("error: exit"));
    assert_eq!(out[5], "error: vehicle CAR-2 is not parked");
    assert_eq!(out[6].lines().count(), 1);
    assert!(!out[6].contains("until"));

    assert_eq!(h.console.facility().active_tickets(), 1);
    assert!(!h.receipts.exists());
}

#[test]
fn test_new_entry_point_changes_allocation() {
    let mut h = harness();
    let out = run(
        &mut h.console,
        "\
add-entry 9,9,0
park CAR-1 s 3 2024-05-01T08:00:00Z",
    );

    assert_eq!(out[0], "entry point 3 added");
    assert!(out[1].contains("in slot 2 (large) via entry 3"));
}
