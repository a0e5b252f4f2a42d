//! Poll collapsing
//!
//! Firmware waiting on the ESC reads the same register over and over. The
//! collapser folds runs of identical reads (same address and data) into a
//! single `READ_WAIT` record, re-emitting every `threshold` reads so long
//! waits stay visible.

use crate::types::{AccessRecord, LogicalOp, LogicalRecord, Operation};
use std::collections::VecDeque;

/// A run of identical consecutive reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRun {
    pub address: u16,
    pub data: u64,
    pub count: usize,
    pub first_timestamp: u64,
    pub last_timestamp: u64,
    /// Started because the previous sub-run hit the threshold
    pub continued: bool,
    pub al_event: Option<u32>,
}

impl PollRun {
    fn start(record: &AccessRecord, continued: bool) -> Self {
        Self {
            address: record.address,
            data: record.data,
            count: 1,
            first_timestamp: record.timestamp,
            last_timestamp: record.timestamp,
            continued,
            al_event: record.al_event,
        }
    }

    fn matches(&self, record: &AccessRecord) -> bool {
        record.operation == Operation::Read
            && record.address == self.address
            && record.data == self.data
            && record.al_event == self.al_event
    }

    fn into_record(self, op: LogicalOp) -> LogicalRecord {
        LogicalRecord {
            timestamp: self.first_timestamp,
            op,
            address: self.address,
            data: self.data,
            count: self.count,
            al_event: self.al_event,
        }
    }

    /// Close the run; folded and split runs are tagged as waits
    fn flush(self) -> LogicalRecord {
        let op = if self.count > 1 || self.continued {
            LogicalOp::ReadWait
        } else {
            LogicalOp::Read
        };
        self.into_record(op)
    }
}

/// Collapser state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollapseState {
    #[default]
    Idle,
    Collecting(PollRun),
}

/// Streaming poll collapser
#[derive(Debug)]
pub struct PollCollapser {
    threshold: usize,
    state: CollapseState,
}

impl PollCollapser {
    /// `threshold` must be at least 1 (checked by `DecoderConfig::validate`)
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            state: CollapseState::Idle,
        }
    }

    pub fn state(&self) -> &CollapseState {
        &self.state
    }

    /// Feed one access; completed logical records are appended to `out`
    pub fn push(&mut self, record: AccessRecord, out: &mut VecDeque<LogicalRecord>) {
        match std::mem::take(&mut self.state) {
            CollapseState::Collecting(mut run) if run.matches(&record) => {
                if run.count < self.threshold {
                    run.count += 1;
                    run.last_timestamp = record.timestamp;
                    self.state = CollapseState::Collecting(run);
                } else {
                    log::trace!(
                        "Poll run on 0x{:04X} reached threshold {}, splitting",
                        run.address,
                        self.threshold
                    );
                    out.push_back(run.into_record(LogicalOp::ReadWait));
                    self.state = CollapseState::Collecting(PollRun::start(&record, true));
                }
            }
            CollapseState::Collecting(run) => {
                out.push_back(run.flush());
                self.start(record, out);
            }
            CollapseState::Idle => self.start(record, out),
        }
    }

    /// Flush the pending run at end of input
    pub fn finish(&mut self) -> Option<LogicalRecord> {
        match std::mem::take(&mut self.state) {
            CollapseState::Collecting(run) => Some(run.flush()),
            CollapseState::Idle => None,
        }
    }

    /// Process a record from the idle state
    fn start(&mut self, record: AccessRecord, out: &mut VecDeque<LogicalRecord>) {
        match record.operation {
            Operation::Read => self.state = CollapseState::Collecting(PollRun::start(&record, false)),
            Operation::Write => out.push_back(record.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapse(records: &[AccessRecord], threshold: usize) -> Vec<LogicalRecord> {
        let mut collapser = PollCollapser::new(threshold);
        let mut out = VecDeque::new();
        for record in records {
            collapser.push(*record, &mut out);
        }
        out.extend(collapser.finish());
        out.into_iter().collect()
    }

    fn polls(n: usize, address: u16, data: u64) -> Vec<AccessRecord> {
        (0..n as u64).map(|t| AccessRecord::read(t, address, data)).collect()
    }

    #[test]
    fn test_idle_to_collecting_and_back() {
        let mut collapser = PollCollapser::new(10);
        let mut out = VecDeque::new();
        assert_eq!(collapser.state(), &CollapseState::Idle);

        collapser.push(AccessRecord::read(1, 0x0130, 0x01), &mut out);
        collapser.push(AccessRecord::read(2, 0x0130, 0x01), &mut out);
        match collapser.state() {
            CollapseState::Collecting(run) => {
                assert_eq!(run.count, 2);
                assert_eq!(run.first_timestamp, 1);
                assert_eq!(run.last_timestamp, 2);
            }
            CollapseState::Idle => panic!("expected a pending run"),
        }
        assert!(out.is_empty());

        assert!(collapser.finish().is_some());
        assert_eq!(collapser.state(), &CollapseState::Idle);
        assert!(collapser.finish().is_none());
    }

    #[test]
    fn test_flush_on_mismatch() {
        let out = collapse(
            &[
                AccessRecord::read(1, 0x0130, 0x01),
                AccessRecord::read(2, 0x0130, 0x01),
                AccessRecord::read(3, 0x0130, 0x02),
                AccessRecord::write(4, 0x0120, 0x02),
                AccessRecord::read(5, 0x0130, 0x02),
            ],
            10,
        );
        let ops: Vec<_> = out.iter().map(|r| (r.op, r.timestamp, r.count)).collect();
        assert_eq!(
            ops,
            vec![
                (LogicalOp::ReadWait, 1, 2),
                (LogicalOp::Read, 3, 1),
                (LogicalOp::Write, 4, 1),
                (LogicalOp::Read, 5, 1),
            ]
        );
    }

    #[test]
    fn test_writes_never_collapse() {
        let writes: Vec<_> = (0..3).map(|t| AccessRecord::write(t, 0x0120, 0x01)).collect();
        let out = collapse(&writes, 10);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.op == LogicalOp::Write));
    }

    #[test]
    fn test_wait_count_is_ceil_n_over_t() {
        for threshold in 1..=5 {
            for n in 2..=17 {
                let out = collapse(&polls(n, 0x0110, 0x3), threshold);
                let expected = (n + threshold - 1) / threshold;
                assert_eq!(out.len(), expected, "n={} t={}", n, threshold);
                assert!(out.iter().all(|r| r.op == LogicalOp::ReadWait), "n={} t={}", n, threshold);
                // Each sub-run carries the timestamp of its first read
                for (i, record) in out.iter().enumerate() {
                    assert_eq!(record.timestamp, (i * threshold) as u64);
                }
                assert_eq!(out.iter().map(|r| r.count).sum::<usize>(), n);
            }
        }
    }

    #[test]
    fn test_event_change_breaks_run() {
        let out = collapse(
            &[
                AccessRecord::read(1, 0x0130, 0x01).with_al_event(0x0000),
                AccessRecord::read(2, 0x0130, 0x01).with_al_event(0x0000),
                AccessRecord::read(3, 0x0130, 0x01).with_al_event(0x0100),
            ],
            10,
        );
        let runs: Vec<_> = out.iter().map(|r| (r.op, r.count, r.al_event)).collect();
        assert_eq!(
            runs,
            vec![
                (LogicalOp::ReadWait, 2, Some(0x0000)),
                (LogicalOp::Read, 1, Some(0x0100)),
            ]
        );
    }

    #[test]
    fn test_single_read_stays_plain() {
        let out = collapse(&polls(1, 0x0110, 0x3), 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].op, LogicalOp::Read);
    }
}
