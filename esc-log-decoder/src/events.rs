//! AL event correlation
//!
//! Tracks the last value written to the control/status registers that can
//! raise AL Event Request bits, and turns writes into an `AL event(...)`
//! clause. The clause sticks to every following line until the next write
//! to a tracked register replaces it.

use crate::catalog::{al_event_label, AL_CONTROL, SYNC_MANAGER};
use crate::types::LogicalRecord;
use std::collections::HashMap;

/// What makes a tracked write raise an AL event bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Any write to the register
    Written,
    /// A write whose masked bits differ from the previous value
    Changed(u64),
}

/// One AL Event Request bit a tracked register can raise
#[derive(Debug, Clone, Copy)]
pub struct EventCondition {
    /// Bit index in the AL Event Request register
    pub bit: u32,
    pub trigger: Trigger,
}

const fn written(bit: u32) -> EventCondition {
    EventCondition { bit, trigger: Trigger::Written }
}

const fn changed(bit: u32, mask: u64) -> EventCondition {
    EventCondition { bit, trigger: Trigger::Changed(mask) }
}

/// Registers participating in AL event detection
const TRACKED: &[(u16, &[EventCondition])] = &[
    (
        AL_CONTROL,
        // A requested state change reconfigures the SyncManagers
        &[written(0), changed(4, 0x000F)],
    ),
    (
        SYNC_MANAGER,
        &[
            changed(4, 0xFF),
            changed(8, 1 << 0),
            changed(9, 1 << 1),
            changed(10, 1 << 2),
            changed(11, 1 << 3),
            changed(12, 1 << 4),
            changed(13, 1 << 5),
            changed(14, 1 << 6),
            changed(15, 1 << 7),
        ],
    ),
];

/// Correlation state of one tracked register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventWatch {
    /// Last written value, `None` until the first write is seen
    pub last_value: Option<u64>,
}

impl EventWatch {
    /// AL Event Request bits raised by writing `data`, given this history
    fn raised(&self, conditions: &[EventCondition], data: u64) -> u32 {
        conditions
            .iter()
            .filter(|c| match (c.trigger, self.last_value) {
                (Trigger::Written, _) => true,
                (Trigger::Changed(_), None) => true,
                (Trigger::Changed(mask), Some(old)) => (old ^ data) & mask != 0,
            })
            .fold(0, |bits, c| bits | (1 << c.bit))
    }
}

/// Stateful AL event correlator, scoped to one decode run
#[derive(Debug, Default)]
pub struct EventCorrelator {
    watches: HashMap<u16, EventWatch>,
    /// Clause produced by the most recent tracked write
    current: Option<String>,
}

impl EventCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if writes to `address` take part in event detection
    pub fn is_tracked(address: u16) -> bool {
        Self::conditions(address).is_some()
    }

    fn conditions(address: u16) -> Option<&'static [EventCondition]> {
        TRACKED
            .iter()
            .find(|(tracked, _)| *tracked == address)
            .map(|(_, conditions)| *conditions)
    }

    /// Observe one record and return the event clause annotating it
    ///
    /// Only writes to tracked registers change the clause; every other
    /// record gets the clause of the latest tracked write, if any.
    pub fn observe(&mut self, record: &LogicalRecord) -> Option<&str> {
        if record.is_write() {
            if let Some(conditions) = Self::conditions(record.address) {
                let watch = self.watches.entry(record.address).or_default();
                // Evaluate against history before overwriting it
                let bits = watch.raised(conditions, record.data);
                watch.last_value = Some(record.data);

                self.current = al_event_clause(bits);
                log::trace!(
                    "Tracked write to 0x{:04X}: raised bits 0x{:X}",
                    record.address,
                    bits
                );
            }
        }
        self.current.as_deref()
    }

    /// Watch state of a tracked register
    pub fn watch(&self, address: u16) -> Option<&EventWatch> {
        self.watches.get(&address)
    }
}

/// Build `AL event(c1, c2, )` from AL Event Request bits, in bit order
///
/// Returns `None` when no labelled bit is set.
pub fn al_event_clause(bits: u32) -> Option<String> {
    let labels: Vec<&str> = (0..32)
        .filter(|bit| bits & (1 << bit) != 0)
        .filter_map(al_event_label)
        .collect();
    if labels.is_empty() {
        return None;
    }
    let mut clause = String::from("AL event(");
    for label in labels {
        clause.push_str(label);
        clause.push_str(", ");
    }
    clause.push(')');
    Some(clause)
}
