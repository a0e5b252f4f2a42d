//! Decoded access table reader
//!
//! Reads CSV traces with one register access per row:
//!
//! ```text
//! time,op,addr,data
//! 1,READ,0x0000,0xc8
//! 3,WRITE,0x0120,0x01
//! ```

use super::{cell, parse_number, parse_timestamp, split_row, CsvHeader, CsvRows, TraceParser};
use crate::config::DecoderConfig;
use crate::types::{AccessRecord, DecoderError, Operation, Result};
use std::io::BufRead;

const TIME_COLUMNS: &[&str] = &["time", "timestamp", "time[ns]", "time [ns]"];
const OP_COLUMNS: &[&str] = &["op", "operation", "action", "access"];
const ADDRESS_COLUMNS: &[&str] = &["addr", "address"];
const DATA_COLUMNS: &[&str] = &["data", "value"];

/// Iterator over access records from a decoded access table
pub struct AccessCsvReader<R> {
    rows: CsvRows<R>,
    time: usize,
    op: usize,
    address: usize,
    data: usize,
}

impl<R: BufRead> TraceParser<R> for AccessCsvReader<R> {
    fn with_header(header: &CsvHeader, rows: CsvRows<R>, _config: &DecoderConfig) -> Result<Self> {
        Ok(Self {
            rows,
            time: header.require(TIME_COLUMNS)?,
            op: header.require(OP_COLUMNS)?,
            address: header.require(ADDRESS_COLUMNS)?,
            data: header.require(DATA_COLUMNS)?,
        })
    }
}

impl<R: BufRead> AccessCsvReader<R> {
    fn parse_row(&self, line: usize, text: &str) -> Result<AccessRecord> {
        let cells = split_row(text);

        let time = cell(&cells, self.time, line, "time")?;
        let timestamp = parse_timestamp(time)
            .ok_or_else(|| DecoderError::trace(line, format!("invalid timestamp '{}'", time)))?;

        let op = cell(&cells, self.op, line, "operation")?;
        let operation = parse_operation(op)
            .ok_or_else(|| DecoderError::trace(line, format!("unknown operation '{}'", op)))?;

        let addr = cell(&cells, self.address, line, "address")?;
        let address = parse_number(addr)
            .and_then(|a| u16::try_from(a).ok())
            .ok_or_else(|| DecoderError::trace(line, format!("invalid register address '{}'", addr)))?;

        let value = cell(&cells, self.data, line, "data")?;
        let data = parse_number(value)
            .ok_or_else(|| DecoderError::trace(line, format!("invalid data value '{}'", value)))?;

        Ok(AccessRecord::new(timestamp, operation, address, data))
    }
}

fn parse_operation(text: &str) -> Option<Operation> {
    match text.to_ascii_uppercase().as_str() {
        "READ" | "R" | "RD" | "READ_WAIT" => Some(Operation::Read),
        "WRITE" | "W" | "WR" => Some(Operation::Write),
        _ => None,
    }
}

impl<R: BufRead> Iterator for AccessCsvReader<R> {
    type Item = Result<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, text) = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let record = self.parse_row(line, &text);
        if let Ok(record) = &record {
            log::trace!("line {}: {:?}", line, record);
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(input: &str) -> Result<AccessCsvReader<&[u8]>> {
        let mut rows = CsvRows::new(input.as_bytes());
        let (_, header) = rows.next().unwrap().unwrap();
        AccessCsvReader::with_header(&CsvHeader::parse(&header), rows, &DecoderConfig::default())
    }

    #[test]
    fn test_reads_rows_in_order() {
        let input = "time,op,addr,data\n1,READ,0x0,0xc8\n2,read,0,200\n3,W,0x120,0x01\n";
        let records: Vec<_> = reader(input).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(
            records,
            vec![
                AccessRecord::read(1, 0x0000, 0xc8),
                AccessRecord::read(2, 0x0000, 0xc8),
                AccessRecord::write(3, 0x0120, 0x01),
            ]
        );
    }

    #[test]
    fn test_column_order_and_aliases() {
        let input = "Address,Value,Operation,Timestamp\n0x130,0x2,WR,10.7\n";
        let records: Vec<_> = reader(input).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records, vec![AccessRecord::write(10, 0x0130, 0x2)]);
    }

    #[test]
    fn test_missing_column() {
        let err = reader("time,op,addr\n").err().unwrap();
        assert_eq!(err.to_string(), "Malformed trace at line 1: missing column 'data' or 'value'");
    }

    #[test]
    fn test_malformed_rows_are_fatal() {
        let input = "time,op,addr,data\n1,READ,0x0,0xc8\n2,PEEK,0x0,0xc8\n";
        let mut records = reader(input).unwrap();
        assert!(records.next().unwrap().is_ok());
        match records.next().unwrap() {
            Err(DecoderError::TraceFormat { line, reason }) => {
                assert_eq!(line, 3);
                assert_eq!(reason, "unknown operation 'PEEK'");
            }
            other => panic!("expected a trace format error, got {:?}", other),
        }

        let mut records = reader("time,op,addr,data\n1,READ,0x10000,0\n").unwrap();
        assert!(records.next().unwrap().is_err());

        let mut records = reader("time,op,addr,data\n1,READ,0x10\n").unwrap();
        let err = records.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Malformed trace at line 2: empty or missing data value");
    }
}
