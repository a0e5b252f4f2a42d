//! Bitfield decoding engine
//!
//! Renders a raw register value into text using the field rules of its
//! descriptor. Decoding never fails: values the catalog does not know are
//! tagged "unknown" instead.

use crate::catalog::{DecodeRule, FieldRule, RegisterDescriptor};

/// Bitfield decoder - turns register values into human-readable text
pub struct BitfieldDecoder;

impl BitfieldDecoder {
    /// Decode `data` against an optional register descriptor
    ///
    /// # Returns
    /// * `"<caption>: f1, f2, ..."` for registers with field rules
    /// * the bare hex value (`0x...`) for unknown or name-only registers
    pub fn decode(descriptor: Option<&RegisterDescriptor>, data: u64) -> String {
        let descriptor = match descriptor {
            Some(d) if !d.fields.is_empty() => d,
            _ => return format!("0x{:X}", data),
        };

        if descriptor.width < 64 && data >> descriptor.width != 0 {
            log::warn!(
                "Value 0x{:X} exceeds the {}-bit width of register 0x{:04X} ({})",
                data,
                descriptor.width,
                descriptor.address,
                descriptor.name
            );
        }

        let fragments: Vec<String> = descriptor
            .fields
            .iter()
            .map(|field| Self::decode_field(field, field.extract(data)))
            .collect();
        let body = fragments.join(", ");

        match descriptor.caption {
            Some(caption) => format!("{}: {}", caption, body),
            None => body,
        }
    }

    /// Render a single field value according to its rule
    fn decode_field(field: &FieldRule, value: u64) -> String {
        let text = match field.rule {
            DecodeRule::Enum(values) => match values.iter().find(|(v, _)| *v == value) {
                Some((_, name)) => format!("{} (0x{:X})", name, value),
                None => format!("0x{:X} (unknown)", value),
            },
            DecodeRule::Bit => format!("{}", value & 1),
            DecodeRule::Hex => {
                let digits = ((field.len + 3) / 4) as usize;
                format!("0x{:0width$X}", value, width = digits)
            }
            DecodeRule::Decimal => format!("{}", value),
            DecodeRule::Flags(flags) => {
                let set: Vec<&str> = flags
                    .iter()
                    .filter(|(bit, _)| value & (1u64 << bit) != 0)
                    .map(|(_, name)| *name)
                    .collect();
                if set.is_empty() {
                    "none".to_string()
                } else {
                    // Flag names carry their own meaning; no label prefix
                    return set.join(", ");
                }
            }
            DecodeRule::Text(render) => render(value),
        };

        if field.label.is_empty() {
            text
        } else {
            format!("{}={}", field.label, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RegisterCatalog, AL_CONTROL, AL_EVENT_REQUEST, IDENTIFICATION, SYNC_MANAGER};

    fn decode(address: u16, data: u64) -> String {
        let catalog = RegisterCatalog::esc();
        BitfieldDecoder::decode(catalog.lookup(address), data)
    }

    #[test]
    fn test_al_control_fields_in_order() {
        assert_eq!(
            decode(AL_CONTROL, 0x0001),
            "AL Control: req state=Init (0x1), Error Ind Ack=0, Device ID req=0"
        );
        assert_eq!(
            decode(AL_CONTROL, 0x0038),
            "AL Control: req state=Operational (0x8), Error Ind Ack=1, Device ID req=1"
        );
    }

    #[test]
    fn test_unknown_enum_value() {
        assert_eq!(
            decode(AL_CONTROL, 0x0006),
            "AL Control: req state=0x6 (unknown), Error Ind Ack=0, Device ID req=0"
        );
    }

    #[test]
    fn test_identification_register() {
        assert_eq!(
            decode(IDENTIFICATION, 0xc8),
            "Identification Register: Type=0xC8, Revision=0x00, Build=0x0000"
        );
    }

    #[test]
    fn test_flag_registers() {
        assert_eq!(
            decode(AL_EVENT_REQUEST, 0x0000_0111),
            "AL Event Request: AL Control Register has been written, \
             At least one SyncManager changed, SyncManager 0 interrupt pending"
        );
        assert_eq!(decode(SYNC_MANAGER, 0x00), "Sync Manager Status: none");
        assert_eq!(decode(SYNC_MANAGER, 0x05), "Sync Manager Status: SM0 Active, SM2 Active");
    }

    #[test]
    fn test_led_override() {
        assert_eq!(
            decode(0x0138, 0x1D),
            "RUN LED Override: LED code=0xD (Blinking (PreOp)), Override=Enabled (0x1)"
        );
    }

    #[test]
    fn test_status_code_and_watchdog() {
        assert_eq!(
            decode(0x0134, 0x001B),
            "AL Status Code: code=Sync manager watchdog (0x1B)"
        );
        assert_eq!(decode(0x0440, 0x07), "Watchdog Status: 0x7 (unknown)");
    }

    #[test]
    fn test_unknown_and_name_only_registers() {
        assert_eq!(decode(0x0123, 0xBEEF), "0xBEEF");
        // Known by name, no field rules
        assert_eq!(decode(0x0010, 0x12), "0x12");
    }

    #[test]
    fn test_oversized_value_still_decodes() {
        assert_eq!(
            decode(AL_CONTROL, 0x1_0002),
            "AL Control: req state=Pre-Operational (0x2), Error Ind Ack=0, Device ID req=0"
        );
    }
}
