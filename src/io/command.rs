//! Line-oriented command parser for the operator console
//!
//! One command per line, whitespace separated. Blank lines and lines starting
//! with `#` are skipped.

use crate::domain::types::{EntryPointId, UnknownSize, VehicleSize};
use chrono::{DateTime, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Park { plate: String, size: VehicleSize, entry: EntryPointId, at: DateTime<Utc> },
    Unpark { plate: String, at: DateTime<Utc> },
    AddEntry { distances: Vec<u32> },
    Status,
    History { plate: String },
    Audit { plate: String },
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Size(#[from] UnknownSize),

    #[error("invalid entry point '{0}'")]
    EntryPoint(String),

    #[error("invalid timestamp '{value}': {source}")]
    Timestamp { value: String, source: chrono::ParseError },

    #[error("invalid distance '{0}'")]
    Distance(String),
}

const PARK_USAGE: &str = "park <plate> <size> <entry> <rfc3339>";
const UNPARK_USAGE: &str = "unpark <plate> <rfc3339>";
const ADD_ENTRY_USAGE: &str = "add-entry <d1,d2,...>";
const HISTORY_USAGE: &str = "history <plate>";
const AUDIT_USAGE: &str = "audit <plate>";

/// Parse one input line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    line.parse().map(Some)
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let args: Vec<&str> = words.collect();

        match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("park", [plate, size, entry, at]) => Ok(Command::Park {
                plate: plate.to_string(),
                size: size.parse()?,
                entry: parse_entry_point(entry)?,
                at: parse_timestamp(at)?,
            }),
            ("park", _) => Err(CommandError::Usage(PARK_USAGE)),
            ("unpark", [plate, at]) => {
                Ok(Command::Unpark { plate: plate.to_string(), at: parse_timestamp(at)? })
            }
            ("unpark", _) => Err(CommandError::Usage(UNPARK_USAGE)),
            ("add-entry", [list]) => Ok(Command::AddEntry { distances: parse_distances(list)? }),
            ("add-entry", _) => Err(CommandError::Usage(ADD_ENTRY_USAGE)),
            ("status", []) => Ok(Command::Status),
            ("history", [plate]) => Ok(Command::History { plate: plate.to_string() }),
            ("history", _) => Err(CommandError::Usage(HISTORY_USAGE)),
            ("audit", [plate]) => Ok(Command::Audit { plate: plate.to_string() }),
            ("audit", _) => Err(CommandError::Usage(AUDIT_USAGE)),
            ("help", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

fn parse_entry_point(s: &str) -> Result<EntryPointId, CommandError> {
    s.parse::<usize>().map(EntryPointId).map_err(|_| CommandError::EntryPoint(s.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CommandError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| CommandError::Timestamp { value: s.to_string(), source })
}

fn parse_distances(s: &str) -> Result<Vec<u32>, CommandError> {
    s.split(',')
        .map(|d| d.trim().parse::<u32>().map_err(|_| CommandError::Distance(d.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_park_command() {
        let cmd = parse_line("park ABC-123 m 2 2024-01-01T08:00:00Z").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Park {
                plate: "ABC-123".to_string(),
                size: VehicleSize::Medium,
                entry: EntryPointId(2),
                at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_offset_timestamp_normalized_to_utc() {
        let cmd = parse_line("unpark ABC-123 2024-01-01T10:30:00+02:00").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Unpark {
                plate: "ABC-123".to_string(),
                at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# morning rush").unwrap().is_none());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_line("status").unwrap(), Some(Command::Status));
        assert_eq!(parse_line("HELP").unwrap(), Some(Command::Help));
        assert_eq!(parse_line("quit").unwrap(), Some(Command::Quit));
        assert_eq!(
            parse_line("audit XYZ").unwrap(),
            Some(Command::Audit { plate: "XYZ".to_string() })
        );
    }

    #[test]
    fn test_add_entry_distances() {
        // Whitespace splits arguments, so the list must be written without spaces
        assert!(matches!(parse_line("add-entry 4, 2,7"), Err(CommandError::Usage(_))));
        assert_eq!(
            parse_line("add-entry 4,2,7").unwrap(),
            Some(Command::AddEntry { distances: vec![4, 2, 7] })
        );
        assert!(matches!(parse_line("add-entry 4,x"), Err(CommandError::Distance(_))));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_line("fly away"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse_line("park ABC"), Err(CommandError::Usage(_))));
        assert!(matches!(
            parse_line("park ABC huge 0 2024-01-01T08:00:00Z"),
            Err(CommandError::Size(_))
        ));
        assert!(matches!(
            parse_line("park ABC s -1 2024-01-01T08:00:00Z"),
            Err(CommandError::EntryPoint(_))
        ));
        assert!(matches!(parse_line("unpark ABC yesterday"), Err(CommandError::Timestamp { .. })));
    }
}
