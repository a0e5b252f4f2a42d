//! Address filtering
//!
//! Applied to the collapsed record stream, so a filtered-out register never
//! breaks a poll run of a register that stays visible.

use crate::config::{AddressRange, DecoderConfig};
use crate::types::LogicalRecord;
use std::collections::BTreeSet;

/// Inclusive address window plus a set of ignored registers
#[derive(Debug, Clone, Default)]
pub struct AddressFilter {
    range: Option<AddressRange>,
    ignored: BTreeSet<u16>,
}

impl AddressFilter {
    pub fn new(range: Option<AddressRange>, ignored: BTreeSet<u16>) -> Self {
        Self { range, ignored }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.address_range, config.ignore_addresses.clone())
    }

    /// True if the record should appear in the output
    pub fn keep(&self, record: &LogicalRecord) -> bool {
        self.keep_address(record.address)
    }

    pub fn keep_address(&self, address: u16) -> bool {
        let in_range = self.range.map_or(true, |range| range.contains(address));
        in_range && !self.ignored.contains(&address)
    }
}
