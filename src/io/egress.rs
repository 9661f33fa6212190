//! Receipt egress - appends closed tickets to a file
//!
//! Receipts are written in JSONL format (one JSON object per line) to the
//! file named in config. A failed write is logged and never stops the facility.

use crate::services::facility::Receipt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for receipts
pub struct Egress {
    file_path: String,
    site_id: String,
}

impl Egress {
    pub fn new(file_path: &str, site_id: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string(), site_id: site_id.to_string() }
    }

    /// Build an egress from config; None when egress is disabled
    pub fn from_config(file_path: &str, site_id: &str) -> Option<Self> {
        if file_path.is_empty() {
            info!("egress_disabled");
            return None;
        }
        Some(Self::new(file_path, site_id))
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// One JSON line: the ticket fields plus the segment accounting
    pub fn receipt_json(&self, receipt: &Receipt) -> String {
        let mut obj = receipt.session.to_json_map(&self.site_id);
        obj.insert("segment_total".to_string(), receipt.segment_total.into());
        obj.insert("prev_charged".to_string(), receipt.previously_charged.into());
        obj.insert("chain".to_string(), receipt.chain_len.into());
        serde_json::Value::Object(obj).to_string()
    }

    /// Write a receipt to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_receipt(&self, receipt: &Receipt) -> bool {
        let json = self.receipt_json(receipt);

        match self.append_line(&json) {
            Ok(()) => {
                info!(
                    ticket = %receipt.session.ticket,
                    plate = %receipt.session.vehicle,
                    charged = %receipt.charged,
                    "receipt_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    ticket = %receipt.session.ticket,
                    error = %e,
                    "receipt_egress_failed"
                );
                false
            }
        }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}
