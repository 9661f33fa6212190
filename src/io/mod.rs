//! IO modules - operator-facing interfaces
//!
//! - `command` - Line command parser
//! - `formatter` - Plain-text rendering of tickets, receipts and audits
//! - `console` - Executes commands against a facility
//! - `egress` - Receipt output to file (JSONL format)

pub mod command;
pub mod console;
pub mod egress;
pub mod formatter;

// Re-export commonly used types
pub use command::{parse_line, Command, CommandError};
pub use console::{Console, Step};
pub use egress::Egress;
