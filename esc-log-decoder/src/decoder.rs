//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct owns the register catalog; each call to one of the
//! `decode_*` methods starts an independent run with its own poll collapser
//! and event history.

use crate::bitfield::BitfieldDecoder;
use crate::catalog::RegisterCatalog;
use crate::collapse::PollCollapser;
use crate::config::DecoderConfig;
use crate::events::{al_event_clause, EventCorrelator};
use crate::filter::AddressFilter;
use crate::formats::TraceReader;
use crate::line::LineFormatter;
use crate::types::{AccessRecord, LogicalRecord, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    catalog: RegisterCatalog,
}

impl Decoder {
    /// Create a decoder over the ESC register map
    pub fn new() -> Self {
        Self::with_catalog(RegisterCatalog::esc())
    }

    pub fn with_catalog(catalog: RegisterCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RegisterCatalog {
        &self.catalog
    }

    /// Decode a CSV trace file and return an iterator of output lines
    ///
    /// # Example
    /// ```no_run
    /// use esc_log_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new();
    /// let config = DecoderConfig::new().with_address_range(0x0000, 0x0220);
    /// for line in decoder.decode_file(Path::new("capture.csv"), config).unwrap() {
    ///     match line {
    ///         Ok(line) => println!("{}", line),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(
        &self,
        path: &Path,
        config: DecoderConfig,
    ) -> Result<DecodeStream<'_, TraceReader<BufReader<File>>>> {
        config.validate()?;
        log::info!("Decoding trace file: {:?}", path);
        let file = File::open(path)?;
        self.decode_reader(BufReader::new(file), config)
    }

    /// Decode a CSV trace from any buffered reader
    ///
    /// The configuration is validated and the header row parsed before
    /// this returns; rows are then read lazily as lines are pulled.
    pub fn decode_reader<R: BufRead>(
        &self,
        reader: R,
        config: DecoderConfig,
    ) -> Result<DecodeStream<'_, TraceReader<R>>> {
        config.validate()?;
        let records = TraceReader::open(reader, &config)?;
        DecodeStream::new(records, &self.catalog, &config)
    }

    /// Decode access records that were already parsed
    pub fn decode_records<I>(
        &self,
        records: I,
        config: DecoderConfig,
    ) -> Result<DecodeStream<'_, impl Iterator<Item = Result<AccessRecord>>>>
    where
        I: IntoIterator<Item = AccessRecord>,
    {
        DecodeStream::new(records.into_iter().map(Ok), &self.catalog, &config)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that turns access records into decoded lines
///
/// Each access goes through:
/// 1. Poll collapsing
/// 2. Address filtering
/// 3. Bitfield decoding and event correlation
/// 4. Line formatting
///
/// The first error ends the stream.
pub struct DecodeStream<'a, I>
where
    I: Iterator<Item = Result<AccessRecord>>,
{
    records: I,
    catalog: &'a RegisterCatalog,
    collapser: PollCollapser,
    filter: AddressFilter,
    correlator: EventCorrelator,
    formatter: LineFormatter,
    pending: VecDeque<LogicalRecord>,
    finished: bool,
    emitted: usize,
}

impl<'a, I> DecodeStream<'a, I>
where
    I: Iterator<Item = Result<AccessRecord>>,
{
    pub fn new(records: I, catalog: &'a RegisterCatalog, config: &DecoderConfig) -> Result<Self> {
        let threshold = config.threshold()?;
        log::debug!(
            "Decode run: threshold={}, range={:?}, ignored={:?}",
            threshold,
            config.address_range,
            config.ignore_addresses
        );
        Ok(Self {
            records,
            catalog,
            collapser: PollCollapser::new(threshold),
            filter: AddressFilter::from_config(config),
            correlator: EventCorrelator::new(),
            formatter: LineFormatter::new(config.subject.clone()),
            pending: VecDeque::new(),
            finished: false,
            emitted: 0,
        })
    }

    /// Decode, annotate and format one logical record
    ///
    /// An AL event sampled on the bus takes precedence over the correlated
    /// one for this line; the correlator still sees every record.
    fn render(&mut self, record: &LogicalRecord) -> String {
        let descriptor = self.catalog.lookup(record.address);
        let decoded = BitfieldDecoder::decode(descriptor, record.data);
        let correlated = self.correlator.observe(record);
        let sampled = record.al_event.map(al_event_clause);
        let event = match &sampled {
            Some(clause) => clause.as_deref(),
            None => correlated,
        };
        self.formatter.format(record, descriptor, &decoded, event)
    }
}

impl<'a, I> Iterator for DecodeStream<'a, I>
where
    I: Iterator<Item = Result<AccessRecord>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // First, drain records the collapser has completed
            if let Some(record) = self.pending.pop_front() {
                if !self.filter.keep(&record) {
                    log::trace!("Filtered out access to 0x{:04X}", record.address);
                    continue;
                }
                self.emitted += 1;
                return Some(Ok(self.render(&record)));
            }

            if self.finished {
                return None;
            }

            match self.records.next() {
                Some(Ok(access)) => self.collapser.push(access, &mut self.pending),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.collapser.finish());
                    log::info!(
                        "End of trace reached after {} line(s), {} pending",
                        self.emitted,
                        self.pending.len()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DecoderError;

    fn lines(records: Vec<AccessRecord>, config: DecoderConfig) -> Vec<String> {
        Decoder::new()
            .decode_records(records, config)
            .unwrap()
            .map(|line| line.unwrap())
            .collect()
    }

    #[test]
    fn test_poll_then_state_request() {
        let output = lines(
            vec![
                AccessRecord::read(1, 0x0000, 0xc8),
                AccessRecord::read(2, 0x0000, 0xc8),
                AccessRecord::write(3, 0x0120, 0x01),
            ],
            DecoderConfig::new().with_poll_threshold(10).with_address_range(0x0000, 0x0220),
        );
        assert_eq!(
            output,
            vec![
                "mcu READ_WAIT reg:0x0(Type), data:0x000000c8(Identification Register: \
                 Type=0xC8, Revision=0x00, Build=0x0000)"
                    .to_string(),
                "mcu WRITE reg:0x120(AL Control (low)), data:0x0001(AL Control: req state=Init (0x1), \
                 Error Ind Ack=0, Device ID req=0), when AL event(AL Control Register has been written, \
                 At least one SyncManager changed, )"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_out_of_range_address_is_absent() {
        let output = lines(
            vec![
                AccessRecord::read(1, 0x0800, 0x01),
                AccessRecord::read(2, 0x0130, 0x01),
                AccessRecord::read(3, 0x0800, 0x01),
                AccessRecord::read(4, 0x0800, 0x01),
            ],
            DecoderConfig::new().with_address_range(0x0000, 0x0220),
        );
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with("mcu READ reg:0x130(AL Status (low))"));
    }

    #[test]
    fn test_event_clause_follows_later_lines() {
        let output = lines(
            vec![
                AccessRecord::read(1, 0x0130, 0x01),
                AccessRecord::write(2, 0x0120, 0x02),
                AccessRecord::read(3, 0x0130, 0x02),
            ],
            DecoderConfig::new(),
        );
        assert!(!output[0].contains("when"));
        let clause = ", when AL event(AL Control Register has been written, At least one SyncManager changed, )";
        assert!(output[1].ends_with(clause));
        assert!(output[2].ends_with(clause));
    }

    #[test]
    fn test_sampled_event_overrides_correlated_clause() {
        let output = lines(
            vec![
                AccessRecord::write(1, 0x0120, 0x02),
                AccessRecord::read(2, 0x0130, 0x02).with_al_event(0x0101),
                AccessRecord::read(3, 0x0130, 0x04).with_al_event(0x0000),
                AccessRecord::read(4, 0x0130, 0x04),
            ],
            DecoderConfig::new(),
        );
        let correlated = ", when AL event(AL Control Register has been written, At least one SyncManager changed, )";
        assert!(output[0].ends_with(correlated));
        assert!(output[1].ends_with(
            ", when AL event(AL Control Register has been written, SyncManager 0 interrupt pending, )"
        ));
        // No bits pending on the bus: no clause
        assert!(!output[2].contains("when"));
        assert!(output[3].ends_with(correlated));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let decoder = Decoder::new();
        let result = decoder.decode_records(Vec::new(), DecoderConfig::new().with_poll_threshold(-3));
        assert!(matches!(result, Err(DecoderError::InvalidConfig(_))));

        let result = decoder.decode_reader(
            "not,a,trace\n".as_bytes(),
            DecoderConfig::new().with_address_range(0x10, 0x0),
        );
        assert!(matches!(result, Err(DecoderError::InvalidConfig(_))));
    }

    #[test]
    fn test_stream_stops_after_first_error() {
        let decoder = Decoder::new();
        let input = "time,op,addr,data\n1,WRITE,0x120,0x1\n2,READ,oops,0\n3,READ,0x130,0x1\n";
        let results: Vec<_> = decoder
            .decode_reader(input.as_bytes(), DecoderConfig::new())
            .unwrap()
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DecoderError::TraceFormat { line: 3, .. })));
    }
}
