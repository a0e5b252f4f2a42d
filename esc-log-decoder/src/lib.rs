//! ESC Log Decoder Library
//!
//! Decodes bus traces of register accesses against an EtherCAT Slave
//! Controller (ESC) into human-readable lines. Each access is annotated with
//! the register name, the meaning of its bit-fields and the AL events implied
//! by writes to control/status registers.
//!
//! # Architecture
//!
//! Traces are processed as a single ordered stream:
//! - CSV rows (decoded accesses, or raw SPI bytes framed into transactions)
//!   become `AccessRecord`s
//! - runs of identical reads (busy-wait polling) collapse into `READ_WAIT`
//! - records outside the configured address window are dropped
//! - the survivors are decoded, correlated with AL events and formatted
//!
//! # Example Usage
//!
//! ```
//! use esc_log_decoder::{Decoder, DecoderConfig};
//!
//! let trace = "time,op,addr,data\n1,READ,0x0,0xc8\n2,READ,0x0,0xc8\n3,WRITE,0x120,0x01\n";
//! let decoder = Decoder::new();
//! let config = DecoderConfig::new().with_address_range(0x0000, 0x0220);
//!
//! for line in decoder.decode_reader(trace.as_bytes(), config).unwrap() {
//!     println!("{}", line.unwrap());
//! }
//! ```

// Public modules
pub mod bitfield;
pub mod catalog;
pub mod collapse;
pub mod config;
pub mod decoder;
pub mod events;
pub mod filter;
pub mod formats;
pub mod line;
pub mod types;

// Re-export main types for convenience
pub use catalog::{RegisterCatalog, RegisterDescriptor};
pub use config::{AddressRange, DecoderConfig};
pub use decoder::{DecodeStream, Decoder};
pub use types::{AccessRecord, DecoderError, LogicalOp, LogicalRecord, Operation, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::new();
        assert!(!decoder.catalog().is_empty());
        assert!(decoder.catalog().lookup(0x0120).is_some());
    }
}
