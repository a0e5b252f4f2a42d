//! Core types for the ESC log decoder library
//!
//! This module defines the records flowing through the decode pipeline: raw
//! accesses as read from a trace, and the logical records emitted once
//! polling loops have been collapsed.

use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Direction of a register access as seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "READ"),
            Operation::Write => write!(f, "WRITE"),
        }
    }
}

/// One register access from the trace
///
/// This represents a single access as read from the capture, before any
/// collapsing or annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    /// Ordering key; non-decreasing across the trace but otherwise opaque
    pub timestamp: u64,
    /// Read or write
    pub operation: Operation,
    /// ESC register address
    pub address: u16,
    /// Value read or written
    pub data: u64,
    /// AL Event Request bits the ESC shifted out during the command header
    /// (SPI captures only)
    pub al_event: Option<u32>,
}

impl AccessRecord {
    pub fn new(timestamp: u64, operation: Operation, address: u16, data: u64) -> Self {
        Self {
            timestamp,
            operation,
            address,
            data,
            al_event: None,
        }
    }

    /// Builder method: attach the sampled AL Event Request bits
    pub fn with_al_event(mut self, bits: u32) -> Self {
        self.al_event = Some(bits);
        self
    }

    pub fn read(timestamp: u64, address: u16, data: u64) -> Self {
        Self::new(timestamp, Operation::Read, address, data)
    }

    pub fn write(timestamp: u64, address: u16, data: u64) -> Self {
        Self::new(timestamp, Operation::Write, address, data)
    }

    /// True if `other` repeats the same read (same address, data and
    /// sampled AL event)
    pub fn same_read(&self, other: &AccessRecord) -> bool {
        self.operation == Operation::Read
            && other.operation == Operation::Read
            && self.address == other.address
            && self.data == other.data
            && self.al_event == other.al_event
    }
}

/// Operation label of a record after poll collapsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    Read,
    /// One or more identical reads folded together (a busy-wait poll)
    ReadWait,
    Write,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::Read => write!(f, "READ"),
            LogicalOp::ReadWait => write!(f, "READ_WAIT"),
            LogicalOp::Write => write!(f, "WRITE"),
        }
    }
}

/// A (possibly collapsed) access emitted by the poll collapser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalRecord {
    /// Timestamp of the first access folded into this record
    pub timestamp: u64,
    pub op: LogicalOp,
    pub address: u16,
    pub data: u64,
    /// Number of raw accesses folded into this record
    pub count: usize,
    /// Sampled AL Event Request bits, shared by every folded access
    pub al_event: Option<u32>,
}

impl LogicalRecord {
    pub fn is_write(&self) -> bool {
        self.op == LogicalOp::Write
    }
}

impl From<AccessRecord> for LogicalRecord {
    fn from(record: AccessRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            op: match record.operation {
                Operation::Read => LogicalOp::Read,
                Operation::Write => LogicalOp::Write,
            },
            address: record.address,
            data: record.data,
            count: 1,
            al_event: record.al_event,
        }
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed trace at line {line}: {reason}")]
    TraceFormat { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecoderError {
    pub(crate) fn trace(line: usize, reason: impl Into<String>) -> Self {
        DecoderError::TraceFormat {
            line,
            reason: reason.into(),
        }
    }
}
