//! Opcode-to-mnemonic tables for ATA commands and ATAPI/SCSI CDBs.
//!
//! Two-tier lookup: a runtime override map is consulted first, then the
//! built-in tables. The built-in coverage is best-effort and extensible, not
//! exhaustive.

use std::collections::HashMap;

use crate::DecodeError;

/// Standard ATA/ATAPI command set, sorted by opcode.
pub static ATA_COMMANDS: &[(u8, &str)] = &[
    (0x00, "NOP"),
    (0x06, "DATA SET MANAGEMENT"),
    (0x07, "DATA SET MANAGEMENT XL"),
    (0x08, "DEVICE RESET"),
    (0x0B, "REQUEST SENSE DATA EXT"),
    (0x10, "RECALIBRATE"),
    (0x20, "READ SECTORS"),
    (0x21, "READ SECTORS (no retry)"),
    (0x22, "READ LONG"),
    (0x23, "READ LONG (no retry)"),
    (0x24, "READ SECTORS EXT"),
    (0x25, "READ DMA EXT"),
    (0x26, "READ DMA QUEUED EXT"),
    (0x27, "READ NATIVE MAX ADDRESS EXT"),
    (0x29, "READ MULTIPLE EXT"),
    (0x2A, "READ STREAM DMA EXT"),
    (0x2B, "READ STREAM EXT"),
    (0x2F, "READ LOG EXT"),
    (0x30, "WRITE SECTORS"),
    (0x31, "WRITE SECTORS (no retry)"),
    (0x32, "WRITE LONG"),
    (0x33, "WRITE LONG (no retry)"),
    (0x34, "WRITE SECTORS EXT"),
    (0x35, "WRITE DMA EXT"),
    (0x36, "WRITE DMA QUEUED EXT"),
    (0x39, "WRITE MULTIPLE EXT"),
    (0x3A, "WRITE STREAM DMA EXT"),
    (0x3B, "WRITE STREAM EXT"),
    (0x3C, "WRITE VERIFY"),
    (0x3D, "WRITE DMA FUA EXT"),
    (0x3E, "WRITE DMA QUEUED FUA EXT"),
    (0x3F, "WRITE LOG EXT"),
    (0x40, "READ VERIFY SECTORS"),
    (0x41, "READ VERIFY SECTORS (no retry)"),
    (0x42, "READ VERIFY SECTORS EXT"),
    (0x44, "ZERO EXT"),
    (0x45, "WRITE UNCORRECTABLE EXT"),
    (0x47, "READ LOG DMA EXT"),
    (0x4A, "ZAC MANAGEMENT IN"),
    (0x50, "FORMAT TRACK"),
    (0x51, "CONFIGURE STREAM"),
    (0x5B, "TRUSTED NON-DATA"),
    (0x5C, "TRUSTED RECEIVE"),
    (0x5D, "TRUSTED RECEIVE DMA"),
    (0x5E, "TRUSTED SEND"),
    (0x5F, "TRUSTED SEND DMA"),
    (0x60, "READ FPDMA QUEUED"),
    (0x61, "WRITE FPDMA QUEUED"),
    (0x63, "NCQ NON-DATA"),
    (0x64, "SEND FPDMA QUEUED"),
    (0x65, "RECEIVE FPDMA QUEUED"),
    (0x70, "SEEK"),
    (0x77, "SET DATE & TIME EXT"),
    (0x78, "ACCESSIBLE MAX ADDRESS CONFIGURATION"),
    (0x7C, "REMOVE ELEMENT AND TRUNCATE"),
    (0x7D, "RESTORE ELEMENTS AND REBUILD"),
    (0x87, "CFA TRANSLATE SECTOR"),
    (0x90, "EXECUTE DEVICE DIAGNOSTIC"),
    (0x91, "INITIALIZE DEVICE PARAMETERS"),
    (0x92, "DOWNLOAD MICROCODE"),
    (0x93, "DOWNLOAD MICROCODE DMA"),
    (0x9F, "ZAC MANAGEMENT OUT"),
    (0xA0, "PACKET"),
    (0xA1, "IDENTIFY PACKET DEVICE"),
    (0xA2, "SERVICE"),
    (0xB0, "SMART"),
    (0xB1, "DEVICE CONFIGURATION OVERLAY"),
    (0xB2, "SET SECTOR CONFIGURATION EXT"),
    (0xB4, "SANITIZE DEVICE"),
    (0xB6, "NV CACHE"),
    (0xC0, "CFA ERASE SECTORS"),
    (0xC4, "READ MULTIPLE"),
    (0xC5, "WRITE MULTIPLE"),
    (0xC6, "SET MULTIPLE MODE"),
    (0xC7, "READ DMA QUEUED"),
    (0xC8, "READ DMA"),
    (0xC9, "READ DMA (no retry)"),
    (0xCA, "WRITE DMA"),
    (0xCB, "WRITE DMA (no retry)"),
    (0xCC, "WRITE DMA QUEUED"),
    (0xCD, "CFA WRITE MULTIPLE WITHOUT ERASE"),
    (0xCE, "WRITE MULTIPLE FUA EXT"),
    (0xD1, "CHECK MEDIA CARD TYPE"),
    (0xDA, "GET MEDIA STATUS"),
    (0xDB, "ACKNOWLEDGE MEDIA CHANGE"),
    (0xDE, "MEDIA LOCK"),
    (0xDF, "MEDIA UNLOCK"),
    (0xE0, "STANDBY IMMEDIATE"),
    (0xE1, "IDLE IMMEDIATE"),
    (0xE2, "STANDBY"),
    (0xE3, "IDLE"),
    (0xE4, "READ BUFFER"),
    (0xE5, "CHECK POWER MODE"),
    (0xE6, "SLEEP"),
    (0xE7, "FLUSH CACHE"),
    (0xE8, "WRITE BUFFER"),
    (0xE9, "READ BUFFER DMA"),
    (0xEA, "FLUSH CACHE EXT"),
    (0xEB, "WRITE BUFFER DMA"),
    (0xEC, "IDENTIFY DEVICE"),
    (0xED, "MEDIA EJECT"),
    (0xEE, "IDENTIFY DEVICE DMA"),
    (0xEF, "SET FEATURES"),
    (0xF1, "SECURITY SET PASSWORD"),
    (0xF2, "SECURITY UNLOCK"),
    (0xF3, "SECURITY ERASE PREPARE"),
    (0xF4, "SECURITY ERASE UNIT"),
    (0xF5, "SECURITY FREEZE LOCK"),
    (0xF6, "SECURITY DISABLE PASSWORD"),
    (0xF8, "READ NATIVE MAX ADDRESS"),
    (0xF9, "SET MAX ADDRESS"),
];

/// Common ATAPI/SCSI CDB mnemonics, sorted by opcode.
pub static ATAPI_CDB: &[(u8, &str)] = &[
    (0x00, "TEST UNIT READY"),
    (0x03, "REQUEST SENSE"),
    (0x12, "INQUIRY"),
    (0x1A, "MODE SENSE(6)"),
    (0x1B, "START STOP UNIT"),
    (0x23, "READ FORMAT CAPACITIES"),
    (0x25, "READ CAPACITY(10)"),
    (0x28, "READ(10)"),
    (0x2A, "WRITE(10)"),
    (0x2B, "SEEK(10)"),
    (0x2F, "VERIFY(10)"),
    (0x35, "SYNCHRONIZE CACHE(10)"),
    (0x43, "READ TOC/PMA/ATIP"),
    (0x44, "READ HEADER"),
    (0x45, "PLAY AUDIO(10)"),
    (0x47, "PLAY AUDIO MSF"),
    (0x48, "PLAY AUDIO TRACK/INDEX"),
    (0x4A, "GET EVENT STATUS NOTIFICATION"),
    (0x5A, "MODE SENSE(10)"),
    (0xA1, "BLANK (MMC)"),
    (0xBB, "SET CD SPEED (MMC)"),
];

/// Classic Sony vendor CDBs; consulted before [`ATAPI_CDB`].
pub static VENDOR_CDB: &[(u8, &str)] = &[
    (0xC1, "SONY: READ TOC"),
    (0xC2, "SONY: READ SUB-CHANNEL"),
    (0xC3, "SONY: READ HEADER"),
    (0xC4, "SONY: PLAYBACK STATUS"),
    (0xC5, "SONY: PAUSE"),
    (0xC6, "SONY: PLAY TRACK"),
    (0xC7, "SONY: PLAY MSF"),
    (0xC8, "SONY: PLAY AUDIO (LBA+len)"),
    (0xC9, "SONY: PLAYBACK CONTROL"),
];

/// Inclusive ATA opcode ranges reserved for vendor-specific commands.
/// Labeling hint only.
pub static VENDOR_RANGES: &[(u8, u8)] = &[
    (0x80, 0x8F),
    (0x9A, 0x9E),
    (0xC1, 0xC3),
    (0xF0, 0xF0),
    (0xFA, 0xFF),
];

/// Whether an ATA opcode falls in a vendor-reserved range.
pub fn is_vendor_opcode(opcode: u8) -> bool {
    VENDOR_RANGES.iter().any(|&(lo, hi)| opcode >= lo && opcode <= hi)
}

fn lookup(table: &'static [(u8, &'static str)], opcode: u8) -> Option<&'static str> {
    table
        .binary_search_by_key(&opcode, |&(op, _)| op)
        .ok()
        .map(|i| table[i].1)
}

/// Mnemonic resolution with a user-override layer on top of the built-in
/// tables, separately for ATA commands and ATAPI CDB opcodes.
#[derive(Debug, Default, Clone)]
pub struct CommandTables {
    /// Overrides for ATA command opcodes; takes precedence over [`ATA_COMMANDS`]
    pub custom_commands: HashMap<u8, String>,
    /// Overrides for CDB opcodes; takes precedence over the built-in CDB tables
    pub custom_cdb: HashMap<u8, String>,
}

impl CommandTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an ATA command opcode to a mnemonic, override layer first.
    pub fn resolve_command(&self, opcode: u8) -> Option<&str> {
        self.custom_commands
            .get(&opcode)
            .map(String::as_str)
            .or_else(|| lookup(ATA_COMMANDS, opcode))
    }

    /// Resolve a CDB opcode to a mnemonic, override layer first.
    pub fn resolve_cdb(&self, opcode: u8) -> Option<&str> {
        self.custom_cdb
            .get(&opcode)
            .map(String::as_str)
            .or_else(|| lookup(VENDOR_CDB, opcode))
            .or_else(|| lookup(ATAPI_CDB, opcode))
    }
}

/// Parse a JSON override table: an object mapping opcodes (decimal, or hex
/// with an `0x` prefix) to mnemonic strings.
pub fn parse_overrides(json: &str) -> Result<HashMap<u8, String>, DecodeError> {
    let raw: HashMap<String, String> = serde_json::from_str(json)
        .map_err(|e| DecodeError::InvalidOverride(e.to_string()))?;
    let mut table = HashMap::with_capacity(raw.len());
    for (key, name) in raw {
        let opcode = parse_opcode(&key)
            .ok_or_else(|| DecodeError::InvalidOverride(format!("bad opcode key '{}'", key)))?;
        table.insert(opcode, name);
    }
    Ok(table)
}

fn parse_opcode(key: &str) -> Option<u8> {
    if let Some(hex) = key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        key.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_sorted_for_binary_search() {
        for table in [ATA_COMMANDS, ATAPI_CDB, VENDOR_CDB] {
            for pair in table.windows(2) {
                assert!(pair[0].0 < pair[1].0, "table not sorted at 0x{:02X}", pair[1].0);
            }
        }
    }

    #[test]
    fn test_standard_lookups() {
        let tables = CommandTables::new();
        assert_eq!(tables.resolve_command(0x20), Some("READ SECTORS"));
        assert_eq!(tables.resolve_command(0xA0), Some("PACKET"));
        assert_eq!(tables.resolve_command(0xEC), Some("IDENTIFY DEVICE"));
        assert_eq!(tables.resolve_command(0xFF), None);

        assert_eq!(tables.resolve_cdb(0x12), Some("INQUIRY"));
        assert_eq!(tables.resolve_cdb(0xC1), Some("SONY: READ TOC"));
        assert_eq!(tables.resolve_cdb(0xFE), None);
    }

    #[test]
    fn test_override_precedence() {
        let mut tables = CommandTables::new();
        tables.custom_commands.insert(0x20, "VENDOR READ".to_string());
        tables.custom_cdb.insert(0x12, "VENDOR INQUIRY".to_string());

        assert_eq!(tables.resolve_command(0x20), Some("VENDOR READ"));
        assert_eq!(tables.resolve_cdb(0x12), Some("VENDOR INQUIRY"));
        // Untouched opcodes still resolve from the built-in tables.
        assert_eq!(tables.resolve_command(0x30), Some("WRITE SECTORS"));
    }

    #[test]
    fn test_vendor_ranges() {
        assert!(is_vendor_opcode(0x80));
        assert!(is_vendor_opcode(0x8F));
        assert!(is_vendor_opcode(0xF0));
        assert!(is_vendor_opcode(0xFF));
        assert!(!is_vendor_opcode(0x20));
        assert!(!is_vendor_opcode(0x9F));
    }

    #[test]
    fn test_parse_overrides() {
        let table = parse_overrides(r#"{"0x85": "MY VENDOR OP", "32": "DEC READ"}"#).unwrap();
        assert_eq!(table.get(&0x85).map(String::as_str), Some("MY VENDOR OP"));
        assert_eq!(table.get(&0x20).map(String::as_str), Some("DEC READ"));
    }

    #[test]
    fn test_parse_overrides_rejects_bad_input() {
        assert!(matches!(parse_overrides("not json"), Err(DecodeError::InvalidOverride(_))));
        assert!(matches!(
            parse_overrides(r#"{"0xZZ": "X"}"#),
            Err(DecodeError::InvalidOverride(_))
        ));
        assert!(matches!(
            parse_overrides(r#"{"300": "X"}"#),
            Err(DecodeError::InvalidOverride(_))
        ));
    }
}
