//! Register catalog
//!
//! Static descriptions of the ESC register map: one descriptor per address,
//! holding the display name, the register width and the rules used to
//! decode its bit-fields.

mod esc;

use std::collections::HashMap;

/// How the bits of one field are turned into text
#[derive(Clone, Copy)]
pub enum DecodeRule {
    /// Known values map to a name, anything else is reported as unknown
    Enum(&'static [(u64, &'static str)]),
    /// Single bit rendered as 0/1
    Bit,
    /// Raw value in hex, padded to the field length
    Hex,
    /// Raw value in decimal
    Decimal,
    /// One name per set bit (bit index relative to the field)
    Flags(&'static [(u32, &'static str)]),
    /// Free-form formatter for fields the other rules cannot express
    Text(fn(u64) -> String),
}

impl std::fmt::Debug for DecodeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeRule::Enum(values) => write!(f, "Enum({} values)", values.len()),
            DecodeRule::Bit => write!(f, "Bit"),
            DecodeRule::Hex => write!(f, "Hex"),
            DecodeRule::Decimal => write!(f, "Decimal"),
            DecodeRule::Flags(flags) => write!(f, "Flags({} bits)", flags.len()),
            DecodeRule::Text(_) => write!(f, "Text"),
        }
    }
}

/// One bit-field within a register
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Least significant bit of the field
    pub lsb: u32,
    /// Length in bits
    pub len: u32,
    /// Label printed before the value (may be empty)
    pub label: &'static str,
    pub rule: DecodeRule,
}

impl FieldRule {
    pub const fn new(lsb: u32, len: u32, label: &'static str, rule: DecodeRule) -> Self {
        Self { lsb, len, label, rule }
    }

    /// Extract the raw bits of this field from a register value
    pub fn extract(&self, value: u64) -> u64 {
        let mask = if self.len >= 64 { u64::MAX } else { (1u64 << self.len) - 1 };
        (value >> self.lsb) & mask
    }
}

/// Static metadata describing one register
#[derive(Debug, Clone, Copy)]
pub struct RegisterDescriptor {
    pub address: u16,
    /// Display name, e.g. "AL Control (low)"
    pub name: &'static str,
    /// Width in bits, used for hex rendering and bounds checking
    pub width: u32,
    /// Prefix of the decoded text, e.g. "AL Control"
    pub caption: Option<&'static str>,
    /// Field rules, in rendering order
    pub fields: &'static [FieldRule],
}

impl RegisterDescriptor {
    /// Byte register known by name only
    pub const fn named(address: u16, name: &'static str) -> Self {
        Self {
            address,
            name,
            width: 8,
            caption: None,
            fields: &[],
        }
    }

    /// Number of hex digits used when rendering a value of this register
    pub fn hex_digits(&self) -> usize {
        ((self.width + 3) / 4) as usize
    }

    /// True if every field lies within the register width
    pub fn fields_in_bounds(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.len > 0 && field.lsb + field.len <= self.width)
    }
}

/// Immutable address → descriptor map
pub struct RegisterCatalog {
    registers: HashMap<u16, &'static RegisterDescriptor>,
}

impl RegisterCatalog {
    /// Build a catalog from a static descriptor table
    ///
    /// Later entries win if the table repeats an address.
    pub fn from_table(table: &'static [RegisterDescriptor]) -> Self {
        let mut registers = HashMap::with_capacity(table.len());
        for descriptor in table {
            if registers.insert(descriptor.address, descriptor).is_some() {
                log::warn!("Duplicate register descriptor for 0x{:04X}", descriptor.address);
            }
        }
        Self { registers }
    }

    /// The ESC register map
    pub fn esc() -> Self {
        Self::from_table(esc::REGISTERS)
    }

    /// Look up a register; `None` means an unknown register, not an error
    pub fn lookup(&self, address: u16) -> Option<&'static RegisterDescriptor> {
        self.registers.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterDescriptor> + '_ {
        self.registers.values().copied()
    }
}

impl Default for RegisterCatalog {
    fn default() -> Self {
        Self::esc()
    }
}

/// Label of an AL Event Request bit
pub fn al_event_label(bit: u32) -> Option<&'static str> {
    esc::AL_EVENT_FLAGS
        .iter()
        .find(|(flag, _)| *flag == bit)
        .map(|(_, label)| *label)
}

pub use esc::{AL_CONTROL, AL_EVENT_REQUEST, AL_STATUS, IDENTIFICATION, SYNC_MANAGER};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let catalog = RegisterCatalog::esc();
        let al_control = catalog.lookup(AL_CONTROL).unwrap();
        assert_eq!(al_control.name, "AL Control (low)");
        assert_eq!(al_control.width, 16);
        assert!(catalog.lookup(0x0123).is_none());
    }

    #[test]
    fn test_all_fields_within_width() {
        let catalog = RegisterCatalog::esc();
        for descriptor in catalog.iter() {
            assert!(
                descriptor.fields_in_bounds(),
                "register 0x{:04X} has a field outside its width",
                descriptor.address
            );
        }
    }

    #[test]
    fn test_catalog_has_one_entry_per_address() {
        let catalog = RegisterCatalog::esc();
        assert_eq!(catalog.len(), esc::REGISTERS.len());
    }

    #[test]
    fn test_field_extract() {
        let field = FieldRule::new(4, 2, "x", DecodeRule::Hex);
        assert_eq!(field.extract(0b11_0000), 0b11);
        assert_eq!(field.extract(0b100_0000), 0);
    }
}
