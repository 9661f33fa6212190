//! Operator console: executes parsed commands against a facility

use crate::io::command::{parse_line, Command};
use crate::io::egress::Egress;
use crate::io::formatter;
use crate::services::facility::Facility;
use tracing::warn;

/// What the caller should do after a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print this text
    Output(String),
    /// Nothing to print (blank line or comment)
    Skip,
    /// Stop reading input
    Quit,
}

pub struct Console {
    facility: Facility,
    egress: Option<Egress>,
}

impl Console {
    pub fn new(facility: Facility, egress: Option<Egress>) -> Self {
        Self { facility, egress }
    }

    pub fn facility(&self) -> &Facility {
        &self.facility
    }

    /// Run one input line. Errors are rendered as `error: ...` output.
    pub fn run_line(&mut self, line: &str) -> Step {
        match parse_line(line) {
            Ok(None) => Step::Skip,
            Ok(Some(Command::Quit)) => Step::Quit,
            Ok(Some(command)) => Step::Output(self.execute(command)),
            Err(e) => {
                warn!(line = %line.trim(), error = %e, "command_rejected");
                Step::Output(format!("error: {e}"))
            }
        }
    }

    fn execute(&mut self, command: Command) -> String {
        let result = match command {
            Command::Park { plate, size, entry, at } => {
                self.facility.park(&plate, size, entry, at).map(|s| formatter::format_ticket(&s))
            }
            Command::Unpark { plate, at } => self.facility.unpark(&plate, at).map(|receipt| {
                if let Some(ref egress) = self.egress {
                    egress.write_receipt(&receipt);
                }
                formatter::format_receipt(&receipt)
            }),
            Command::AddEntry { distances } => {
                self.facility.add_entry_point(distances).map(|id| format!("entry point {id} added"))
            }
            Command::Status => Ok(formatter::format_slot_map(
                self.facility.slots(),
                self.facility.entry_points(),
            )),
            Command::History { plate } => {
                Ok(formatter::format_history(&plate, &self.facility.history(&plate)))
            }
            Command::Audit { plate } => self.facility.audit(&plate).map(|a| formatter::format_audit(&a)),
            Command::Help => Ok(formatter::HELP.to_string()),
            Command::Quit => Ok(String::new()),
        };
        result.unwrap_or_else(|e| format!("error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::RateSchedule;
    use crate::domain::types::SlotSize;
    use crate::infra::config::SlotSpec;
    use std::fs;
    use tempfile::tempdir;

    fn console(egress: Option<Egress>) -> Console {
        let layout = vec![
            SlotSpec::new(SlotSize::Small, vec![1, 2, 3]),
            SlotSpec::new(SlotSize::Medium, vec![2, 2, 2]),
            SlotSpec::new(SlotSize::Large, vec![3, 2, 1]),
        ];
        let facility = Facility::new("mall", &layout, 3, RateSchedule::default()).unwrap();
        Console::new(facility, egress)
    }

    fn output(step: Step) -> String {
        match step {
            Step::Output(text) => text,
            other => panic!("expected output, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_and_quit() {
        let mut console = console(None);
        assert_eq!(console.run_line("# comment"), Step::Skip);
        assert_eq!(console.run_line(""), Step::Skip);
        assert_eq!(console.run_line("quit"), Step::Quit);
    }

    #[test]
    fn test_park_and_unpark_roundtrip() {
        let mut console = console(None);
        let parked = output(console.run_line("park CAR-1 L 2 2024-01-01T08:00:00Z"));
        assert!(parked.contains("CAR-1 large in slot 2 (large)"));

        let receipt = output(console.run_line("unpark CAR-1 2024-01-01T13:00:00Z"));
        assert!(receipt.ends_with("due 240"));
        assert_eq!(console.facility().free_slots(), 3);
    }

    #[test]
    fn test_errors_rendered_as_output() {
        let mut console = console(None);
        assert!(output(console.run_line("jump")).starts_with("error: unknown command"));
        assert_eq!(
            output(console.run_line("unpark NOBODY 2024-01-01T08:00:00Z")),
            "error: vehicle NOBODY is not parked"
        );
    }

    #[test]
    fn test_add_entry_and_status() {
        let mut console = console(None);
        assert_eq!(output(console.run_line("add-entry 5,5,5")), "entry point 3 added");
        let status = output(console.run_line("status"));
        assert!(status.starts_with("3 slot(s), 3 free, 4 entry point(s)"));
    }

    #[test]
    fn test_unpark_writes_egress() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receipts.jsonl");
        let mut console = console(Some(Egress::new(path.to_str().unwrap(), "mall")));

        console.run_line("park CAR-1 S 0 2024-01-01T08:00:00Z");
        console.run_line("unpark CAR-1 2024-01-01T09:00:00Z");
        console.run_line("park CAR-1 S 0 2024-01-01T09:30:00Z");
        console.run_line("unpark CAR-1 2024-01-01T12:30:00Z");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> =
            content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["charged"], 40);
        // 1h + 3h small = 4h: 60 in total, 20 still due
        assert_eq!(lines[1]["segment_total"], 60);
        assert_eq!(lines[1]["charged"], 20);
    }
}
