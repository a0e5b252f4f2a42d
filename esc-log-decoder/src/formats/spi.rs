//! Raw SPI capture reader
//!
//! Reads logic-analyzer SPI exports with one byte per row:
//!
//! ```text
//! Id,Time[ns],0:SPI: MOSI data,0:SPI: MISO data
//! 1,1000.00,0x09,0x00
//! 2,1400.00,0x02,0x00
//! ```
//!
//! Consecutive bytes closer than the frame gap form one ESC SPI
//! transaction. The first two MOSI bytes carry the command header
//! (`address << 3 | command`, big-endian) while the ESC shifts out its AL
//! Event Request on MISO (little-endian). Data follows in little-endian
//! order: on MISO for reads, on MOSI for writes.

use super::{cell, parse_hex_byte, parse_timestamp, split_row, CsvHeader, CsvRows, TraceParser};
use crate::config::DecoderConfig;
use crate::types::{AccessRecord, DecoderError, Operation, Result};
use std::io::BufRead;

const CMD_READ: u8 = 0x2;
const CMD_READ_WAIT: u8 = 0x3;
const CMD_WRITE: u8 = 0x4;

/// Payload bytes kept in an `AccessRecord`; longer bursts are truncated
const MAX_DATA_BYTES: usize = 8;

/// One sampled SPI byte
#[derive(Debug, Clone, Copy)]
struct SpiByte {
    time: u64,
    mosi: u8,
    miso: u8,
}

/// Bytes of one chip-select window
#[derive(Debug, Default)]
struct Transaction {
    /// Line of the first byte, for error reporting
    line: usize,
    bytes: Vec<SpiByte>,
}

impl Transaction {
    fn decode(&self) -> Result<AccessRecord> {
        let line = self.line;
        if self.bytes.len() < 2 {
            return Err(DecoderError::trace(
                line,
                format!(
                    "SPI transaction of {} byte(s) is too short, bytes may have been lost during sampling",
                    self.bytes.len()
                ),
            ));
        }

        let header = u16::from_be_bytes([self.bytes[0].mosi, self.bytes[1].mosi]);
        let address = header >> 3;
        let command = self.bytes[1].mosi & 0b111;

        let (operation, payload): (Operation, Vec<u8>) = match command {
            CMD_READ => (Operation::Read, self.bytes[2..].iter().map(|b| b.miso).collect()),
            CMD_READ_WAIT => (
                Operation::Read,
                self.bytes.iter().skip(3).map(|b| b.miso).collect(),
            ),
            CMD_WRITE => (Operation::Write, self.bytes[2..].iter().map(|b| b.mosi).collect()),
            other => {
                return Err(DecoderError::trace(
                    line,
                    format!("unsupported ESC SPI command 0x{:X}", other),
                ))
            }
        };

        if payload.is_empty() {
            return Err(DecoderError::trace(line, "SPI transaction carries no data bytes"));
        }
        if payload.len() > MAX_DATA_BYTES {
            log::warn!(
                "SPI transaction at line {} carries {} data bytes for 0x{:04X}, keeping the first {}",
                line,
                payload.len(),
                address,
                MAX_DATA_BYTES
            );
        }

        let data = payload[..payload.len().min(MAX_DATA_BYTES)]
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        let al_event = u16::from_le_bytes([self.bytes[0].miso, self.bytes[1].miso]);

        Ok(AccessRecord::new(self.bytes[0].time, operation, address, data)
            .with_al_event(u32::from(al_event)))
    }
}

/// Iterator over access records framed from raw SPI bytes
pub struct SpiCsvReader<R> {
    rows: CsvRows<R>,
    time: usize,
    mosi: usize,
    miso: usize,
    frame_gap_ns: u64,
    pending: Transaction,
    last_time: Option<u64>,
    done: bool,
}

impl<R: BufRead> TraceParser<R> for SpiCsvReader<R> {
    fn with_header(header: &CsvHeader, rows: CsvRows<R>, config: &DecoderConfig) -> Result<Self> {
        let find = |needle: &str| {
            header
                .find_containing(needle)
                .ok_or_else(|| DecoderError::trace(1, format!("missing column '{}'", needle)))
        };
        Ok(Self {
            rows,
            time: header.require(&["time[ns]", "time [ns]", "time", "timestamp"])?,
            mosi: find("mosi")?,
            miso: find("miso")?,
            frame_gap_ns: config.frame_gap_ns,
            pending: Transaction::default(),
            last_time: None,
            done: false,
        })
    }
}

impl<R: BufRead> SpiCsvReader<R> {
    fn parse_row(&self, line: usize, text: &str) -> Result<SpiByte> {
        let cells = split_row(text);

        let time = cell(&cells, self.time, line, "time")?;
        let time = parse_timestamp(time)
            .ok_or_else(|| DecoderError::trace(line, format!("invalid timestamp '{}'", time)))?;

        let mosi = cell(&cells, self.mosi, line, "MOSI")?;
        let mosi = parse_hex_byte(mosi)
            .ok_or_else(|| DecoderError::trace(line, format!("invalid MOSI byte '{}'", mosi)))?;

        let miso = cell(&cells, self.miso, line, "MISO")?;
        let miso = parse_hex_byte(miso)
            .ok_or_else(|| DecoderError::trace(line, format!("invalid MISO byte '{}'", miso)))?;

        Ok(SpiByte { time, mosi, miso })
    }

    /// Hand out the pending transaction and start a new one at `line`
    fn take_pending(&mut self, line: usize) -> Transaction {
        std::mem::replace(
            &mut self.pending,
            Transaction {
                line,
                bytes: Vec::new(),
            },
        )
    }
}

impl<R: BufRead> Iterator for SpiCsvReader<R> {
    type Item = Result<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (line, text) = match self.rows.next() {
                Some(Ok(row)) => row,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    if self.pending.bytes.is_empty() {
                        return None;
                    }
                    return Some(self.take_pending(0).decode());
                }
            };

            let byte = match self.parse_row(line, &text) {
                Ok(byte) => byte,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let gap_exceeded = match self.last_time {
                Some(last) => byte.time.saturating_sub(last) > self.frame_gap_ns,
                None => false,
            };
            self.last_time = Some(byte.time);

            if self.pending.bytes.is_empty() {
                self.pending.line = line;
                self.pending.bytes.push(byte);
            } else if gap_exceeded {
                let transaction = self.take_pending(line);
                self.pending.bytes.push(byte);
                let record = transaction.decode();
                if let Ok(record) = &record {
                    log::trace!("SPI transaction at line {}: {:?}", transaction.line, record);
                }
                return Some(record);
            } else {
                self.pending.bytes.push(byte);
            }
        }
    }
}
