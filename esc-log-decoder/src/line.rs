//! Output line assembly
//!
//! `<subject> <OP> reg:0x<addr>(<name>), data:0x<data>(<decoded>)[, when <event>]`

use crate::catalog::RegisterDescriptor;
use crate::types::LogicalRecord;

/// Builds the text line for one logical record
#[derive(Debug, Clone)]
pub struct LineFormatter {
    subject: String,
}

impl LineFormatter {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn format(
        &self,
        record: &LogicalRecord,
        descriptor: Option<&RegisterDescriptor>,
        decoded: &str,
        event: Option<&str>,
    ) -> String {
        let mut line = format!("{} {} reg:0x{:x}", self.subject, record.op, record.address);
        if let Some(descriptor) = descriptor {
            line.push_str(&format!("({})", descriptor.name));
        }

        let digits = descriptor.map_or(1, |d| d.hex_digits());
        line.push_str(&format!(", data:0x{:0width$x}({})", record.data, decoded, width = digits));

        if let Some(event) = event.filter(|e| !e.is_empty()) {
            line.push_str(", when ");
            line.push_str(event);
        }
        line
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new("mcu")
    }
}
