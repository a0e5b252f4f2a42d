//! Trace file readers (decoded access tables, raw SPI captures)
//!
//! Both layouts are CSV with a header row, as exported by logic analyzers.
//! The layout is picked from the header; each reader then yields
//! `AccessRecord`s lazily, one row (or one SPI transaction) at a time.

use crate::config::DecoderConfig;
use crate::types::{AccessRecord, DecoderError, Result};
use std::io::BufRead;

pub mod access;
pub mod spi;

pub use access::AccessCsvReader;
pub use spi::SpiCsvReader;

/// Common trait for all trace readers
///
/// A reader is built from an already parsed header and the remaining rows,
/// and iterates over the access records they describe.
pub trait TraceParser<R: BufRead>: Iterator<Item = Result<AccessRecord>> + Sized {
    fn with_header(header: &CsvHeader, rows: CsvRows<R>, config: &DecoderConfig) -> Result<Self>;
}

/// CSV layouts the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLayout {
    /// One decoded access per row (time, operation, address, data)
    Access,
    /// One SPI byte per row (time, MOSI, MISO), framed into transactions
    Spi,
}

impl TraceLayout {
    pub fn detect(header: &CsvHeader) -> Self {
        if header.find_containing("mosi").is_some() {
            TraceLayout::Spi
        } else {
            TraceLayout::Access
        }
    }
}

/// Non-empty CSV lines with their 1-based line numbers
pub struct CsvRows<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> CsvRows<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for CsvRows<R> {
    type Item = Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if !text.trim().is_empty() {
                return Some(Ok((self.line, text)));
            }
        }
    }
}

/// Column names of a CSV trace
#[derive(Debug, Clone)]
pub struct CsvHeader {
    columns: Vec<String>,
}

impl CsvHeader {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start_matches('\u{feff}');
        Self {
            columns: split_row(line).into_iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Index of the first column named like one of `names` (case-insensitive)
    pub fn find(&self, names: &[&str]) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| names.iter().any(|name| column == &name.to_lowercase()))
    }

    /// Index of the first column whose name contains `needle`
    pub fn find_containing(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.columns.iter().position(|column| column.contains(&needle))
    }

    /// Like [`find`](Self::find), but a missing column is a format error
    pub(crate) fn require(&self, names: &[&str]) -> Result<usize> {
        self.find(names).ok_or_else(|| {
            DecoderError::trace(1, format!("missing column '{}'", names.join("' or '")))
        })
    }
}

/// Split one CSV line into trimmed cells, dropping surrounding quotes
pub(crate) fn split_row(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').trim())
        .collect()
}

/// Fetch a cell or fail with a descriptive error
pub(crate) fn cell<'a>(cells: &[&'a str], index: usize, line: usize, what: &str) -> Result<&'a str> {
    match cells.get(index) {
        Some(text) if !text.is_empty() => Ok(*text),
        _ => Err(DecoderError::trace(line, format!("empty or missing {} value", what))),
    }
}

/// Parse an unsigned integer given as `0x`-prefixed hex or decimal
pub(crate) fn parse_number(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse a hex byte, with or without `0x` prefix
pub(crate) fn parse_hex_byte(text: &str) -> Option<u8> {
    let text = text.trim();
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u8::from_str_radix(hex, 16).ok()
}

/// Parse a timestamp; fractional values are truncated
pub(crate) fn parse_timestamp(text: &str) -> Option<u64> {
    if let Some(value) = parse_number(text) {
        return Some(value);
    }
    let value: f64 = text.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

/// Reader over either supported layout
pub enum TraceReader<R: BufRead> {
    Access(AccessCsvReader<R>),
    Spi(SpiCsvReader<R>),
}

impl<R: BufRead> TraceReader<R> {
    /// Read the header row, detect the layout and build the matching reader
    pub fn open(reader: R, config: &DecoderConfig) -> Result<Self> {
        let mut rows = CsvRows::new(reader);
        let (_, text) = match rows.next() {
            Some(row) => row?,
            None => return Err(DecoderError::trace(1, "empty trace, no header row")),
        };
        let header = CsvHeader::parse(&text);
        let layout = TraceLayout::detect(&header);
        log::debug!("Detected {:?} trace layout", layout);

        match layout {
            TraceLayout::Access => Ok(TraceReader::Access(AccessCsvReader::with_header(&header, rows, config)?)),
            TraceLayout::Spi => Ok(TraceReader::Spi(SpiCsvReader::with_header(&header, rows, config)?)),
        }
    }

    pub fn layout(&self) -> TraceLayout {
        match self {
            TraceReader::Access(_) => TraceLayout::Access,
            TraceReader::Spi(_) => TraceLayout::Spi,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            TraceReader::Access(reader) => reader.next(),
            TraceReader::Spi(reader) => reader.next(),
        }
    }
}
