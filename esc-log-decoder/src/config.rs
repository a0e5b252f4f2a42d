//! Decoder configuration types
//!
//! This module defines the parameters of one decode run: the poll-collapse
//! threshold, the address window, ignored addresses and SPI framing. The
//! CLI fills them from flags or a TOML file; the library only validates.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for one decode run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Identical consecutive reads folded into one line before re-emitting
    #[serde(default = "default_poll_threshold")]
    pub poll_threshold: i64,

    /// Optional: only show registers inside this inclusive window
    #[serde(default)]
    pub address_range: Option<AddressRange>,

    /// Registers never shown, whatever the range
    #[serde(default)]
    pub ignore_addresses: BTreeSet<u16>,

    /// Silence between SPI bytes that ends a transaction, in nanoseconds
    #[serde(default = "default_frame_gap_ns")]
    pub frame_gap_ns: u64,

    /// Label at the start of every line (the bus master, usually the MCU)
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_poll_threshold() -> i64 {
    10
}

fn default_frame_gap_ns() -> u64 {
    10_000
}

fn default_subject() -> String {
    "mcu".to_string()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            poll_threshold: default_poll_threshold(),
            address_range: None,
            ignore_addresses: BTreeSet::new(),
            frame_gap_ns: default_frame_gap_ns(),
            subject: default_subject(),
        }
    }
}

/// Inclusive register address window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub lower: u16,
    pub upper: u16,
}

impl AddressRange {
    pub fn new(lower: u16, upper: u16) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, address: u16) -> bool {
        self.lower <= address && address <= self.upper
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the poll-collapse threshold
    pub fn with_poll_threshold(mut self, threshold: i64) -> Self {
        self.poll_threshold = threshold;
        self
    }

    /// Builder method: restrict output to an inclusive address window
    pub fn with_address_range(mut self, lower: u16, upper: u16) -> Self {
        self.address_range = Some(AddressRange::new(lower, upper));
        self
    }

    /// Builder method: never show this register
    pub fn ignore_address(mut self, address: u16) -> Self {
        self.ignore_addresses.insert(address);
        self
    }

    /// Builder method: set the SPI transaction gap
    pub fn with_frame_gap_ns(mut self, gap_ns: u64) -> Self {
        self.frame_gap_ns = gap_ns;
        self
    }

    /// Builder method: set the line prefix
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Check the configuration before any trace is read
    pub fn validate(&self) -> Result<()> {
        if self.poll_threshold < 1 {
            return Err(DecoderError::InvalidConfig(format!(
                "poll threshold must be at least 1, got {}",
                self.poll_threshold
            )));
        }
        if let Some(range) = &self.address_range {
            if range.lower > range.upper {
                return Err(DecoderError::InvalidConfig(format!(
                    "address range is inverted: 0x{:X} > 0x{:X}",
                    range.lower, range.upper
                )));
            }
        }
        if self.frame_gap_ns == 0 {
            return Err(DecoderError::InvalidConfig(
                "SPI frame gap must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Validated poll threshold
    pub(crate) fn threshold(&self) -> Result<usize> {
        self.validate()?;
        usize::try_from(self.poll_threshold).map_err(|_| {
            DecoderError::InvalidConfig(format!("poll threshold {} is too large", self.poll_threshold))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_poll_threshold(4)
            .with_address_range(0x0000, 0x0220)
            .ignore_address(0x0220)
            .with_frame_gap_ns(4_000)
            .with_subject("dsp");

        assert_eq!(config.poll_threshold, 4);
        assert_eq!(config.address_range, Some(AddressRange::new(0x0000, 0x0220)));
        assert!(config.ignore_addresses.contains(&0x0220));
        assert_eq!(config.frame_gap_ns, 4_000);
        assert_eq!(config.subject, "dsp");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.poll_threshold, 10);
        assert_eq!(config.address_range, None);
        assert_eq!(config.frame_gap_ns, 10_000);
        assert_eq!(config.subject, "mcu");
        assert_eq!(config.threshold().unwrap(), 10);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            DecoderConfig::new().with_poll_threshold(-1).validate(),
            Err(DecoderError::InvalidConfig(_))
        ));
        assert!(DecoderConfig::new().with_poll_threshold(0).validate().is_err());
        assert!(DecoderConfig::new().with_address_range(0x220, 0x0).validate().is_err());
        assert!(DecoderConfig::new().with_frame_gap_ns(0).validate().is_err());
        // A single-address window is fine
        assert!(DecoderConfig::new().with_address_range(0x120, 0x120).validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{ "address_range": { "lower": 0, "upper": 544 } }"#).unwrap();
        assert_eq!(config.poll_threshold, 10);
        assert_eq!(config.address_range, Some(AddressRange::new(0, 0x220)));
        assert_eq!(config.subject, "mcu");
    }

    #[test]
    fn test_range_contains_bounds() {
        let range = AddressRange::new(0x10, 0x20);
        assert!(range.contains(0x10));
        assert!(range.contains(0x20));
        assert!(!range.contains(0x0F));
        assert!(!range.contains(0x21));
    }
}
