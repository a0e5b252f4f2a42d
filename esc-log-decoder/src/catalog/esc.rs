//! ESC register map
//!
//! Addresses and names follow the ESC register description (Section II,
//! chapter 2). Registers wider than a byte are described at their lowest
//! address, with the remaining bytes listed by name only.

use super::{DecodeRule, FieldRule, RegisterDescriptor};

pub const IDENTIFICATION: u16 = 0x0000;
pub const AL_CONTROL: u16 = 0x0120;
pub const AL_STATUS: u16 = 0x0130;
pub const AL_EVENT_REQUEST: u16 = 0x0220;
pub const SYNC_MANAGER: u16 = 0x0800;

/// AL state encoding shared by AL Control and AL Status
const AL_STATES: &[(u64, &str)] = &[
    (0x1, "Init"),
    (0x2, "Pre-Operational"),
    (0x3, "Bootstrap"),
    (0x4, "Safe-Operational"),
    (0x8, "Operational"),
];

const ENABLED: &[(u64, &str)] = &[(0, "Disabled"), (1, "Enabled")];

const AL_STATUS_CODES: &[(u64, &str)] = &[
    (0x0000, "No error"),
    (0x0001, "Unspecified error"),
    (0x0002, "No Memory"),
    (0x0003, "Invalid Device Setup"),
    (0x0011, "Invalid requested state change"),
    (0x0012, "Unknown requested state"),
    (0x0013, "Bootstrap not supported"),
    (0x0014, "No valid firmware"),
    (0x0015, "Invalid mailbox configuration (Bootstrap)"),
    (0x0016, "Invalid mailbox configuration (PreOp)"),
    (0x0017, "Invalid sync manager configuration"),
    (0x0018, "No valid inputs available"),
    (0x0019, "No valid outputs"),
    (0x001A, "Synchronization error"),
    (0x001B, "Sync manager watchdog"),
    (0x001C, "Invalid Sync Manager Types"),
    (0x001D, "Invalid Output Configuration"),
    (0x001E, "Invalid Input Configuration"),
    (0x001F, "Invalid Watchdog Configuration"),
    (0x0020, "Slave needs cold start"),
    (0x0021, "Slave needs INIT"),
    (0x0022, "Slave needs PREOP"),
    (0x0023, "Slave needs SAFEOP"),
];

const PDI_TYPES: &[(u64, &str)] = &[
    (0x00, "Interface deactivated"),
    (0x01, "4 Digital Input/12 Digital Output"),
    (0x02, "8 Digital Input/8 Digital Output"),
    (0x03, "12 Digital Input/4 Digital Output"),
    (0x04, "Digital I/O"),
    (0x05, "SPI Slave"),
    (0x06, "Oversampling I/O"),
    (0x07, "EtherCAT Bridge"),
    (0x08, "16 Bit asynchronous Microcontroller interface"),
    (0x09, "8 Bit asynchronous Microcontroller interface"),
    (0x0A, "16 Bit synchronous Microcontroller interface"),
    (0x0B, "8 Bit synchronous Microcontroller interface"),
    (0x80, "On-chip bus"),
];

const WATCHDOG_STATUS: &[(u64, &str)] = &[
    (0x0, "No Error"),
    (0x1, "PDI Watchdog Triggered"),
    (0x2, "Sync Manager Watchdog Triggered"),
];

/// AL Event Request / AL Event Mask bits, in register bit order
pub(crate) const AL_EVENT_FLAGS: &[(u32, &str)] = &[
    (0, "AL Control Register has been written"),
    (1, "At least one change on DC Latch Inputs"),
    (2, "DC SYNC0"),
    (3, "DC SYNC1"),
    (4, "At least one SyncManager changed"),
    (5, "EEPROM command pending"),
    (6, "Has expired"),
    (7, "reserved bit set"),
    (8, "SyncManager 0 interrupt pending"),
    (9, "SyncManager 1 interrupt pending"),
    (10, "SyncManager 2 interrupt pending"),
    (11, "SyncManager 3 interrupt pending"),
    (12, "SyncManager 4 interrupt pending"),
    (13, "SyncManager 5 interrupt pending"),
    (14, "SyncManager 6 interrupt pending"),
    (15, "SyncManager 7 interrupt pending"),
    (16, "SyncManager 8 interrupt pending"),
    (17, "SyncManager 9 interrupt pending"),
    (18, "SyncManager 10 interrupt pending"),
    (19, "SyncManager 11 interrupt pending"),
    (20, "SyncManager 12 interrupt pending"),
    (21, "SyncManager 13 interrupt pending"),
    (22, "SyncManager 14 interrupt pending"),
    (23, "SyncManager 15 interrupt pending"),
];

const SM_ACTIVE: &[(u32, &str)] = &[
    (0, "SM0 Active"),
    (1, "SM1 Active"),
    (2, "SM2 Active"),
    (3, "SM3 Active"),
    (4, "SM4 Active"),
    (5, "SM5 Active"),
    (6, "SM6 Active"),
    (7, "SM7 Active"),
];

fn run_led_code(code: u64) -> String {
    match code {
        0x0 => "0x0 (Off (Init))".to_string(),
        0x1 => "0x1 (Flash 1x (SafeOp))".to_string(),
        _ => led_code(code),
    }
}

fn led_code(code: u64) -> String {
    let meaning = match code {
        0x0 => "Off".to_string(),
        0x1 => "Flash 1x".to_string(),
        0x2..=0xC => format!("Flash {}x", code),
        0xD => "Blinking (PreOp)".to_string(),
        0xE => "Flickering (Bootstrap)".to_string(),
        0xF => "On (Operational)".to_string(),
        _ => "Unknown".to_string(),
    };
    format!("0x{:X} ({})", code, meaning)
}

fn ram_size(kbytes: u64) -> String {
    format!("{} KB", kbytes)
}

pub(super) static REGISTERS: &[RegisterDescriptor] = &[
    RegisterDescriptor {
        address: IDENTIFICATION,
        name: "Type",
        width: 32,
        caption: Some("Identification Register"),
        fields: &[
            FieldRule::new(0, 8, "Type", DecodeRule::Hex),
            FieldRule::new(8, 8, "Revision", DecodeRule::Hex),
            FieldRule::new(16, 16, "Build", DecodeRule::Hex),
        ],
    },
    RegisterDescriptor::named(0x0001, "Revision"),
    RegisterDescriptor::named(0x0002, "Build (low)"),
    RegisterDescriptor::named(0x0003, "Build (high)"),
    RegisterDescriptor {
        address: 0x0004,
        name: "FMMUs supported",
        width: 32,
        caption: Some("ESC Capabilities"),
        fields: &[
            FieldRule::new(0, 8, "FMMUs", DecodeRule::Decimal),
            FieldRule::new(8, 8, "SyncManagers", DecodeRule::Decimal),
            FieldRule::new(16, 8, "RAM", DecodeRule::Text(ram_size)),
            FieldRule::new(24, 8, "Port Descriptor", DecodeRule::Hex),
        ],
    },
    RegisterDescriptor::named(0x0005, "SyncManagers supported"),
    RegisterDescriptor::named(0x0006, "RAM Size"),
    RegisterDescriptor::named(0x0007, "Port Descriptor"),
    RegisterDescriptor::named(0x0008, "ESC Features supported (low)"),
    RegisterDescriptor::named(0x0009, "ESC Features supported (high)"),
    RegisterDescriptor::named(0x0010, "Configured Station Address (low)"),
    RegisterDescriptor::named(0x0011, "Configured Station Address (high)"),
    RegisterDescriptor::named(0x0012, "Configured Station Alias (low)"),
    RegisterDescriptor::named(0x0013, "Configured Station Alias (high)"),
    RegisterDescriptor::named(0x0020, "Register Write Enable"),
    RegisterDescriptor::named(0x0021, "Register Write Protection"),
    RegisterDescriptor::named(0x0030, "ESC Write Enable"),
    RegisterDescriptor::named(0x0031, "ESC Write Protection"),
    RegisterDescriptor::named(0x0040, "ESC Reset ECAT"),
    RegisterDescriptor::named(0x0041, "ESC Reset PDI"),
    RegisterDescriptor::named(0x0100, "ESC DL Control (low)"),
    RegisterDescriptor::named(0x0101, "ESC DL Control"),
    RegisterDescriptor::named(0x0102, "ESC DL Control"),
    RegisterDescriptor::named(0x0103, "ESC DL Control (high)"),
    RegisterDescriptor::named(0x0108, "Physical Read/Write Offset (low)"),
    RegisterDescriptor::named(0x0109, "Physical Read/Write Offset (high)"),
    RegisterDescriptor::named(0x0110, "ESC DL Status (low)"),
    RegisterDescriptor::named(0x0111, "ESC DL Status (high)"),
    RegisterDescriptor {
        address: AL_CONTROL,
        name: "AL Control (low)",
        width: 16,
        caption: Some("AL Control"),
        fields: &[
            FieldRule::new(0, 4, "req state", DecodeRule::Enum(AL_STATES)),
            FieldRule::new(4, 1, "Error Ind Ack", DecodeRule::Bit),
            FieldRule::new(5, 1, "Device ID req", DecodeRule::Bit),
        ],
    },
    RegisterDescriptor::named(0x0121, "AL Control (high)"),
    RegisterDescriptor {
        address: AL_STATUS,
        name: "AL Status (low)",
        width: 16,
        caption: Some("AL Status"),
        fields: &[
            FieldRule::new(0, 4, "State", DecodeRule::Enum(AL_STATES)),
            FieldRule::new(4, 1, "Error Ind", DecodeRule::Bit),
            FieldRule::new(5, 1, "Device ID loaded", DecodeRule::Bit),
        ],
    },
    RegisterDescriptor::named(0x0131, "AL Status (high)"),
    RegisterDescriptor {
        address: 0x0134,
        name: "AL Status Code (low)",
        width: 16,
        caption: Some("AL Status Code"),
        fields: &[FieldRule::new(0, 16, "code", DecodeRule::Enum(AL_STATUS_CODES))],
    },
    RegisterDescriptor::named(0x0135, "AL Status Code (high)"),
    RegisterDescriptor {
        address: 0x0138,
        name: "RUN LED Override",
        width: 8,
        caption: Some("RUN LED Override"),
        fields: &[
            FieldRule::new(0, 4, "LED code", DecodeRule::Text(run_led_code)),
            FieldRule::new(4, 1, "Override", DecodeRule::Enum(ENABLED)),
        ],
    },
    RegisterDescriptor {
        address: 0x0139,
        name: "ERR LED Override",
        width: 8,
        caption: Some("ERR LED Override"),
        fields: &[
            FieldRule::new(0, 4, "LED code", DecodeRule::Text(led_code)),
            FieldRule::new(4, 1, "Override", DecodeRule::Enum(ENABLED)),
        ],
    },
    RegisterDescriptor {
        address: 0x0140,
        name: "PDI Control",
        width: 16,
        caption: Some("PDI Control"),
        fields: &[
            FieldRule::new(0, 8, "Mode", DecodeRule::Enum(PDI_TYPES)),
            FieldRule::new(8, 1, "Device Emulation", DecodeRule::Bit),
            FieldRule::new(9, 1, "Enhanced Link Detection", DecodeRule::Bit),
        ],
    },
    RegisterDescriptor::named(0x0141, "ESC Configuration"),
    RegisterDescriptor::named(0x014E, "PDI Information (low)"),
    RegisterDescriptor::named(0x014F, "PDI Information (high)"),
    RegisterDescriptor::named(0x0150, "PDI Configuration (low)"),
    RegisterDescriptor::named(0x0151, "PDI Configuration"),
    RegisterDescriptor::named(0x0152, "PDI Configuration"),
    RegisterDescriptor::named(0x0153, "PDI Configuration (high)"),
    RegisterDescriptor::named(0x0200, "ECAT Event Mask (low)"),
    RegisterDescriptor::named(0x0201, "ECAT Event Mask (high)"),
    RegisterDescriptor {
        address: 0x0204,
        name: "PDI AL Event Mask (low)",
        width: 32,
        caption: Some("PDI AL Event Mask"),
        fields: &[FieldRule::new(0, 32, "", DecodeRule::Flags(AL_EVENT_FLAGS))],
    },
    RegisterDescriptor::named(0x0205, "PDI AL Event Mask"),
    RegisterDescriptor::named(0x0206, "PDI AL Event Mask"),
    RegisterDescriptor::named(0x0207, "PDI AL Event Mask (high)"),
    RegisterDescriptor::named(0x0210, "ECAT Event Request (low)"),
    RegisterDescriptor::named(0x0211, "ECAT Event Request (high)"),
    RegisterDescriptor {
        address: AL_EVENT_REQUEST,
        name: "AL Event Request (low)",
        width: 32,
        caption: Some("AL Event Request"),
        fields: &[FieldRule::new(0, 32, "", DecodeRule::Flags(AL_EVENT_FLAGS))],
    },
    RegisterDescriptor::named(0x0221, "AL Event Request"),
    RegisterDescriptor::named(0x0222, "AL Event Request"),
    RegisterDescriptor::named(0x0223, "AL Event Request (high)"),
    RegisterDescriptor::named(0x0300, "RX Error Counter (0)"),
    RegisterDescriptor::named(0x0301, "RX Error Counter (1)"),
    RegisterDescriptor::named(0x0302, "RX Error Counter (2)"),
    RegisterDescriptor::named(0x0303, "RX Error Counter (3)"),
    RegisterDescriptor::named(0x0304, "RX Error Counter (4)"),
    RegisterDescriptor::named(0x0305, "RX Error Counter (5)"),
    RegisterDescriptor::named(0x0306, "RX Error Counter (6)"),
    RegisterDescriptor::named(0x0307, "RX Error Counter (7)"),
    RegisterDescriptor::named(0x0308, "Forwarded RX Error Counter (0)"),
    RegisterDescriptor::named(0x0309, "Forwarded RX Error Counter (1)"),
    RegisterDescriptor::named(0x030A, "Forwarded RX Error Counter (2)"),
    RegisterDescriptor::named(0x030B, "Forwarded RX Error Counter (3)"),
    RegisterDescriptor::named(0x030C, "ECAT Processing Unit Error Counter"),
    RegisterDescriptor::named(0x030D, "PDI Error Counter"),
    RegisterDescriptor::named(0x030E, "PDI Error Code (low)"),
    RegisterDescriptor::named(0x030F, "PDI Error Code (high)"),
    RegisterDescriptor::named(0x0310, "Lost Link Counter (0)"),
    RegisterDescriptor::named(0x0311, "Lost Link Counter (1)"),
    RegisterDescriptor::named(0x0312, "Lost Link Counter (2)"),
    RegisterDescriptor::named(0x0313, "Lost Link Counter (3)"),
    RegisterDescriptor::named(0x0400, "Watchdog Divider (low)"),
    RegisterDescriptor::named(0x0401, "Watchdog Divider (high)"),
    RegisterDescriptor::named(0x0410, "Watchdog Time PDI (low)"),
    RegisterDescriptor::named(0x0411, "Watchdog Time PDI (high)"),
    RegisterDescriptor::named(0x0420, "Watchdog Time Process Data (low)"),
    RegisterDescriptor::named(0x0421, "Watchdog Time Process Data (high)"),
    RegisterDescriptor {
        address: 0x0440,
        name: "Watchdog Status Process Data (low)",
        width: 8,
        caption: Some("Watchdog Status"),
        fields: &[FieldRule::new(0, 8, "", DecodeRule::Enum(WATCHDOG_STATUS))],
    },
    RegisterDescriptor::named(0x0441, "Watchdog Status Process Data (high)"),
    RegisterDescriptor::named(0x0442, "Watchdog Counter Process Data"),
    RegisterDescriptor::named(0x0443, "Watchdog Counter PDI"),
    RegisterDescriptor::named(0x0500, "SII EEPROM Interface (0)"),
    RegisterDescriptor::named(0x0501, "SII EEPROM Interface (1)"),
    RegisterDescriptor::named(0x0502, "SII EEPROM Interface (2)"),
    RegisterDescriptor::named(0x0503, "SII EEPROM Interface (3)"),
    RegisterDescriptor::named(0x0504, "SII EEPROM Interface (4)"),
    RegisterDescriptor::named(0x0505, "SII EEPROM Interface (5)"),
    RegisterDescriptor::named(0x0506, "SII EEPROM Interface (6)"),
    RegisterDescriptor::named(0x0507, "SII EEPROM Interface (7)"),
    RegisterDescriptor::named(0x0508, "SII EEPROM Interface (8)"),
    RegisterDescriptor::named(0x0509, "SII EEPROM Interface (9)"),
    RegisterDescriptor::named(0x050A, "SII EEPROM Interface (10)"),
    RegisterDescriptor::named(0x050B, "SII EEPROM Interface (11)"),
    RegisterDescriptor::named(0x050C, "SII EEPROM Interface (12)"),
    RegisterDescriptor::named(0x050D, "SII EEPROM Interface (13)"),
    RegisterDescriptor::named(0x050E, "SII EEPROM Interface (14)"),
    RegisterDescriptor::named(0x050F, "SII EEPROM Interface (15)"),
    RegisterDescriptor::named(0x0510, "MII Management Interface (0)"),
    RegisterDescriptor::named(0x0511, "MII Management Interface (1)"),
    RegisterDescriptor::named(0x0512, "MII Management Interface (2)"),
    RegisterDescriptor::named(0x0513, "MII Management Interface (3)"),
    RegisterDescriptor::named(0x0514, "MII Management Interface (4)"),
    RegisterDescriptor::named(0x0515, "MII Management Interface (5)"),
    RegisterDescriptor::named(0x0516, "MII Management Interface (6)"),
    RegisterDescriptor::named(0x0517, "MII Management Interface (7)"),
    RegisterDescriptor::named(0x0518, "MII Management Interface (8)"),
    RegisterDescriptor::named(0x0519, "MII Management Interface (9)"),
    RegisterDescriptor::named(0x051A, "MII Management Interface (10)"),
    RegisterDescriptor::named(0x051B, "MII Management Interface (11)"),
    RegisterDescriptor::named(0x0600, "FMMU"),
    RegisterDescriptor {
        address: SYNC_MANAGER,
        name: "SyncManager",
        width: 8,
        caption: Some("Sync Manager Status"),
        fields: &[FieldRule::new(0, 8, "", DecodeRule::Flags(SM_ACTIVE))],
    },
    RegisterDescriptor::named(0x0900, "Distributed Clocks"),
    RegisterDescriptor::named(0x0E00, "ESC-specific registers"),
    RegisterDescriptor::named(0x0F00, "Digital I/O Output Data (0)"),
    RegisterDescriptor::named(0x0F01, "Digital I/O Output Data (1)"),
    RegisterDescriptor::named(0x0F02, "Digital I/O Output Data (2)"),
    RegisterDescriptor::named(0x0F03, "Digital I/O Output Data (3)"),
    RegisterDescriptor::named(0x0F10, "General Purpose Outputs (0)"),
    RegisterDescriptor::named(0x0F11, "General Purpose Outputs (1)"),
    RegisterDescriptor::named(0x0F12, "General Purpose Outputs (2)"),
    RegisterDescriptor::named(0x0F13, "General Purpose Outputs (3)"),
    RegisterDescriptor::named(0x0F14, "General Purpose Outputs (4)"),
    RegisterDescriptor::named(0x0F15, "General Purpose Outputs (5)"),
    RegisterDescriptor::named(0x0F16, "General Purpose Outputs (6)"),
    RegisterDescriptor::named(0x0F17, "General Purpose Outputs (7)"),
    RegisterDescriptor::named(0x0F18, "General Purpose Inputs (0)"),
    RegisterDescriptor::named(0x0F19, "General Purpose Inputs (1)"),
    RegisterDescriptor::named(0x0F1A, "General Purpose Inputs (2)"),
    RegisterDescriptor::named(0x0F1B, "General Purpose Inputs (3)"),
    RegisterDescriptor::named(0x0F1C, "General Purpose Inputs (4)"),
    RegisterDescriptor::named(0x0F1D, "General Purpose Inputs (5)"),
    RegisterDescriptor::named(0x0F1E, "General Purpose Inputs (6)"),
    RegisterDescriptor::named(0x0F1F, "General Purpose Inputs (7)"),
    RegisterDescriptor::named(0x0F80, "User RAM (start)"),
    RegisterDescriptor::named(0x0FFF, "User RAM (end)"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_codes() {
        assert_eq!(led_code(0x0), "0x0 (Off)");
        assert_eq!(led_code(0x3), "0x3 (Flash 3x)");
        assert_eq!(led_code(0xD), "0xD (Blinking (PreOp))");
        assert_eq!(run_led_code(0x0), "0x0 (Off (Init))");
        assert_eq!(run_led_code(0xF), "0xF (On (Operational))");
    }

    #[test]
    fn test_al_event_flags_in_bit_order() {
        for (i, (bit, _)) in AL_EVENT_FLAGS.iter().enumerate() {
            assert_eq!(*bit as usize, i);
        }
    }
}
