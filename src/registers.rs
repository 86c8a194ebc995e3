//! Chip-select / address decode of the ATA register space.

use std::fmt;

/// One addressable task-file or control-block register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    Data,
    /// Features on write, Error on read (same address)
    Features,
    Error,
    SectorCount,
    Lba0,
    Lba1,
    Lba2,
    Device,
    /// Command on write, Status on read (same address)
    Command,
    Status,
    DeviceControl,
    AltStatus,
    DriveAddress,
}

impl RegisterId {
    /// Canonical lowercase name, as used in annotation text.
    pub fn name(self) -> &'static str {
        match self {
            RegisterId::Data => "data",
            RegisterId::Features => "features",
            RegisterId::Error => "error",
            RegisterId::SectorCount => "sector_count",
            RegisterId::Lba0 => "lba0",
            RegisterId::Lba1 => "lba1",
            RegisterId::Lba2 => "lba2",
            RegisterId::Device => "device",
            RegisterId::Command => "command",
            RegisterId::Status => "status",
            RegisterId::DeviceControl => "devctl",
            RegisterId::AltStatus => "altstatus",
            RegisterId::DriveAddress => "drive_addr",
        }
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve which register a bus cycle addresses.
///
/// `cs0_active`/`cs1_active` carry the select lines with the active-low
/// convention already applied. Exactly one select must be asserted for a
/// valid register cycle; both or neither yields `None`, as does any address
/// outside the decoded part of a block. Pure function of its four inputs.
pub fn classify(cs0_active: bool, cs1_active: bool, address: u8, is_write: bool) -> Option<RegisterId> {
    if cs0_active && !cs1_active {
        // Task-file block
        match address {
            0 => Some(RegisterId::Data),
            1 => Some(if is_write { RegisterId::Features } else { RegisterId::Error }),
            2 => Some(RegisterId::SectorCount),
            3 => Some(RegisterId::Lba0),
            4 => Some(RegisterId::Lba1),
            5 => Some(RegisterId::Lba2),
            6 => Some(RegisterId::Device),
            7 => Some(if is_write { RegisterId::Command } else { RegisterId::Status }),
            _ => None,
        }
    } else if cs1_active && !cs0_active {
        // Control block
        match address {
            6 => Some(if is_write { RegisterId::DeviceControl } else { RegisterId::AltStatus }),
            7 => Some(RegisterId::DriveAddress),
            _ => None,
        }
    } else {
        None
    }
}
