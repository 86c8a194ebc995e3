//! The streaming cycle-decode engine.
//!
//! One iteration per bus cycle: wait for a read/write strobe, snapshot the
//! bus, classify the addressed register, update the shadow task-file state,
//! and emit annotations. The ATAPI PACKET command opens a CDB capture window
//! that spans the following Data register writes.

use crate::registers::{classify, RegisterId};
use crate::sampler::{BusSampler, ChannelId, LogicSample};
use crate::tables::{is_vendor_opcode, CommandTables};
use crate::taskfile::TaskFileShadow;
use crate::{Annotation, AnnotationKind, AnnotationSink, SampleIndex};

/// The ATA command opcode that starts an ATAPI packet transfer.
pub const CMD_PACKET: u8 = 0xA0;

/// Bytes in an ATAPI PACKET CDB. MMC devices use 12; 16-byte CDBs exist but
/// are not recognized here.
pub const CDB_LENGTH: usize = 12;

const STROBES: [ChannelId; 2] = [ChannelId::Diow, ChannelId::Dior];

/// Recognized decode options and their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Decode ATAPI PACKET CDB bytes into mnemonics
    pub parse_cdb: bool,
    /// Suppress Data register annotations outside a CDB window
    pub ignore_data: bool,
    /// Drop cycles observed while DMARQ is asserted
    pub squelch_dma: bool,
    /// Annotate ordinary register reads beyond Status/AltStatus
    pub emit_reads: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self { parse_cdb: true, ignore_data: true, squelch_dma: true, emit_reads: false }
    }
}

/// CDB sub-protocol state. At most one capture is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CdbState {
    Idle,
    Capturing { expected: usize, buf: Vec<u8> },
}

/// Streaming decoder for one capture session.
///
/// Owns the shadow task-file state and the CDB capture window; both are
/// reset only at session (re)initialization.
#[derive(Debug, Clone)]
pub struct CycleDecoder {
    options: DecoderOptions,
    tables: CommandTables,
    tf: TaskFileShadow,
    cdb: CdbState,
}

impl CycleDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self::with_tables(options, CommandTables::new())
    }

    /// A decoder with user mnemonic overrides installed.
    pub fn with_tables(options: DecoderOptions, tables: CommandTables) -> Self {
        Self { options, tables, tf: TaskFileShadow::new(), cdb: CdbState::Idle }
    }

    /// Clear all session state (shadow registers, HOB latch, CDB window).
    pub fn reset(&mut self) {
        self.tf = TaskFileShadow::new();
        self.cdb = CdbState::Idle;
    }

    /// The tracked task-file state.
    pub fn task_file(&self) -> &TaskFileShadow {
        &self.tf
    }

    /// Decode the whole trace, one completed bus cycle at a time, emitting
    /// annotations in strict sample order. Returns when the sampler reports
    /// end of stream.
    pub fn run<S: BusSampler, K: AnnotationSink>(&mut self, sampler: &mut S, sink: &mut K) {
        while let Some((strobe, start)) = sampler.wait_edge(&STROBES) {
            let snapshot = sampler.snapshot();
            let is_write = strobe == ChannelId::Diow;

            // Hide chatter during DMA data phases.
            if self.options.squelch_dma
                && sampler.is_wired(ChannelId::Dmarq)
                && snapshot.level(ChannelId::Dmarq)
            {
                continue;
            }

            let intrq_wired = sampler.is_wired(ChannelId::Intrq);
            self.process_cycle(is_write, start, &snapshot, intrq_wired, sink);
        }
        log::debug!("trace exhausted; final task file: {:?}", self.tf);
    }

    /// Classify and dispatch one strobed bus cycle.
    fn process_cycle<K: AnnotationSink>(
        &mut self,
        is_write: bool,
        start: SampleIndex,
        snapshot: &LogicSample,
        intrq_wired: bool,
        sink: &mut K,
    ) {
        let (cs0, cs1) = snapshot.selects();
        let address = snapshot.address();

        // Idle or unrelated traffic decodes to no register; drop silently.
        let Some(reg) = classify(cs0, cs1, address, is_write) else {
            return;
        };

        let value = snapshot.data_bus();
        let end = snapshot.index;
        log::debug!(
            "cycle @{}: {} {} value=0x{:02X}",
            start,
            if is_write { "write" } else { "read" },
            reg,
            value
        );

        // Device Control carries the HOB latch.
        if reg == RegisterId::DeviceControl && is_write {
            let bits = self.tf.write_device_control(value);
            let text = format!(
                "DEVCTL write: SRST={} nIEN={} HOB={}",
                bits.srst as u8, bits.nien as u8, bits.hob as u8
            );
            sink.emit(Annotation::new(start, end, AnnotationKind::DeviceControl, text));
            return;
        }

        // Status/AltStatus reads are always annotated; every other read only
        // under the emit_reads option. A Status read can clear INTRQ on the
        // device, so report the line when it is wired and low here.
        if !is_write {
            let is_status = matches!(reg, RegisterId::Status | RegisterId::AltStatus);
            if is_status || self.options.emit_reads {
                let kind = if is_status { AnnotationKind::Status } else { AnnotationKind::RegisterRead };
                let text = format!("{} read: 0x{:02X}", reg.name().to_uppercase(), value);
                sink.emit(Annotation::new(start, end, kind, text));
                if intrq_wired && !snapshot.level(ChannelId::Intrq) {
                    sink.emit(Annotation::new(
                        start,
                        end,
                        AnnotationKind::Interrupt,
                        "INTRQ cleared".to_string(),
                    ));
                }
                return;
            }
            // Of the unannotated reads, only Data can still produce output
            // (a raw access annotation, subject to the ignore_data policy).
            if reg != RegisterId::Data {
                return;
            }
        }

        // Task-file parameter writes, HOB-aware.
        if is_write
            && matches!(
                reg,
                RegisterId::Features
                    | RegisterId::SectorCount
                    | RegisterId::Lba0
                    | RegisterId::Lba1
                    | RegisterId::Lba2
                    | RegisterId::Device
            )
        {
            let field = self.tf.write_register(reg, value);
            let text = format!("{} = 0x{:02X}", field, value);
            sink.emit(Annotation::new(start, end, AnnotationKind::RegisterWrite, text));
            return;
        }

        // Data register: CDB window first, then the ignore/raw policy.
        if reg == RegisterId::Data {
            if is_write {
                if let CdbState::Capturing { expected, buf } = &mut self.cdb {
                    if self.options.parse_cdb {
                        buf.push(value);
                        if buf.len() == 1 {
                            let name = self.tables.resolve_cdb(value).unwrap_or("SCSI CDB");
                            let text = format!("ATAPI CDB[0]=0x{:02X} {}", value, name);
                            sink.emit(Annotation::new(start, end, AnnotationKind::Cdb, text));
                        }
                        let collected = buf.len();
                        if collected >= *expected {
                            self.cdb = CdbState::Idle;
                            let text = format!("CDB complete ({} bytes)", collected);
                            sink.emit(Annotation::new(start, end, AnnotationKind::Cdb, text));
                        }
                    } else {
                        sink.emit(Annotation::new(
                            start,
                            end,
                            AnnotationKind::Cdb,
                            "ATAPI CDB byte".to_string(),
                        ));
                    }
                    return;
                }
            }
            if self.options.ignore_data {
                return;
            }
            let (kind, op) = if is_write {
                (AnnotationKind::RegisterWrite, "WRITE")
            } else {
                (AnnotationKind::RegisterRead, "READ")
            };
            let text = format!("DATA {}: 0x{:02X}", op, value);
            sink.emit(Annotation::new(start, end, kind, text));
            return;
        }

        // Command write: the composite annotation.
        if reg == RegisterId::Command && is_write {
            let resolved = self.tables.resolve_command(value);
            let name = resolved.unwrap_or("UNKNOWN");

            // PACKET opens (or restarts) the CDB window.
            if value == CMD_PACKET {
                if let CdbState::Capturing { buf, .. } = &self.cdb {
                    let text = format!(
                        "PACKET while CDB capture active; {} byte(s) discarded",
                        buf.len()
                    );
                    sink.emit(Annotation::new(start, end, AnnotationKind::Warning, text));
                }
                self.cdb = CdbState::Capturing {
                    expected: CDB_LENGTH,
                    buf: Vec::with_capacity(CDB_LENGTH),
                };
            }

            let addressing = self.tf.addressing();
            let lba_text = if addressing.extended {
                format!("LBA48=0x{:012X}", addressing.lba)
            } else {
                format!("LBA28=0x{:08X}", addressing.lba)
            };
            let text = format!(
                "CMD 0x{:02X} {} SC={} {} DEV=0x{:02X}({})",
                value, name, addressing.sector_count, lba_text, self.tf.device, addressing.mode
            );
            sink.emit(Annotation::new(start, end, AnnotationKind::Command, text));

            if resolved.is_none() && is_vendor_opcode(value) {
                let text = format!("opcode 0x{:02X} in vendor-reserved range", value);
                sink.emit(Annotation::new(start, end, AnnotationKind::Warning, text));
            }
        }
    }
}

impl Default for CycleDecoder {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::TraceBuilder;

    fn decode(trace: TraceBuilder, options: DecoderOptions) -> Vec<Annotation> {
        let mut sampler = trace.build();
        let mut decoder = CycleDecoder::new(options);
        let mut annotations = Vec::new();
        decoder.run(&mut sampler, &mut annotations);
        annotations
    }

    #[test]
    fn test_command_write_annotation() {
        let mut trace = TraceBuilder::new();
        trace.bus_write(true, false, 7, 0xEC);
        let annotations = decode(trace, DecoderOptions::default());

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::Command);
        assert_eq!(
            annotations[0].text,
            "CMD 0xEC IDENTIFY DEVICE SC=0 LBA28=0x00000000 DEV=0x00(CHS)"
        );
    }

    #[test]
    fn test_unknown_opcode_falls_back() {
        let mut trace = TraceBuilder::new();
        trace.bus_write(true, false, 7, 0x9B);
        let annotations = decode(trace, DecoderOptions::default());

        assert_eq!(annotations.len(), 2);
        assert!(annotations[0].text.starts_with("CMD 0x9B UNKNOWN"));
        assert_eq!(annotations[1].kind, AnnotationKind::Warning);
        assert_eq!(annotations[1].text, "opcode 0x9B in vendor-reserved range");
    }

    #[test]
    fn test_unknown_opcode_outside_vendor_range() {
        let mut trace = TraceBuilder::new();
        trace.bus_write(true, false, 7, 0x02);
        let annotations = decode(trace, DecoderOptions::default());

        assert_eq!(annotations.len(), 1);
        assert!(annotations[0].text.starts_with("CMD 0x02 UNKNOWN"));
    }

    #[test]
    fn test_devctl_write_sets_latch_and_annotates() {
        let mut trace = TraceBuilder::new();
        trace.bus_write(false, true, 6, 0x82);
        let mut sampler = trace.build();
        let mut decoder = CycleDecoder::default();
        let mut annotations = Vec::new();
        decoder.run(&mut sampler, &mut annotations);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::DeviceControl);
        assert_eq!(annotations[0].text, "DEVCTL write: SRST=0 nIEN=1 HOB=1");
        assert!(decoder.task_file().hob_active);
    }

    #[test]
    fn test_invalid_cycles_are_silent() {
        let mut trace = TraceBuilder::new();
        // Neither select asserted, then a control-block address that does not
        // decode to a register.
        trace.bus_write(false, false, 7, 0x20);
        trace.bus_write(false, true, 2, 0x20);
        let annotations = decode(trace, DecoderOptions::default());
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_status_read_annotated_without_emit_reads() {
        let mut trace = TraceBuilder::new();
        trace.bus_read(true, false, 7, 0x58);
        trace.bus_read(false, true, 6, 0x50);
        let annotations = decode(trace, DecoderOptions::default());

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].kind, AnnotationKind::Status);
        assert_eq!(annotations[0].text, "STATUS read: 0x58");
        assert_eq!(annotations[1].text, "ALTSTATUS read: 0x50");
    }

    #[test]
    fn test_ordinary_reads_require_emit_reads() {
        let mut trace = TraceBuilder::new();
        trace.bus_read(true, false, 1, 0x04);
        assert!(decode(trace, DecoderOptions::default()).is_empty());

        let mut trace = TraceBuilder::new();
        trace.bus_read(true, false, 1, 0x04);
        let options = DecoderOptions { emit_reads: true, ..Default::default() };
        let annotations = decode(trace, options);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::RegisterRead);
        assert_eq!(annotations[0].text, "ERROR read: 0x04");
    }

    #[test]
    fn test_intrq_cleared_on_status_read() {
        use crate::sampler::ChannelId;

        let mut trace = TraceBuilder::with_optional(&[ChannelId::Intrq]);
        trace.bus_read(true, false, 7, 0x50);
        let annotations = decode(trace, DecoderOptions::default());
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[1].kind, AnnotationKind::Interrupt);
        assert_eq!(annotations[1].text, "INTRQ cleared");

        // Line held high: no interrupt annotation.
        let mut trace = TraceBuilder::new();
        trace.set_level(ChannelId::Intrq, true);
        trace.bus_read(true, false, 7, 0x50);
        let annotations = decode(trace, DecoderOptions::default());
        assert_eq!(annotations.len(), 1);

        // Line not wired at all: no interrupt annotation either.
        let mut trace = TraceBuilder::new();
        trace.bus_read(true, false, 7, 0x50);
        let annotations = decode(trace, DecoderOptions::default());
        assert_eq!(annotations.len(), 1);
    }

    #[test]
    fn test_data_register_policy() {
        // Ignored by default outside a CDB window.
        let mut trace = TraceBuilder::new();
        trace.bus_write(true, false, 0, 0x55);
        trace.bus_read(true, false, 0, 0xAA);
        assert!(decode(trace, DecoderOptions::default()).is_empty());

        // Raw annotations when not ignoring.
        let mut trace = TraceBuilder::new();
        trace.bus_write(true, false, 0, 0x55);
        trace.bus_read(true, false, 0, 0xAA);
        let options = DecoderOptions { ignore_data: false, ..Default::default() };
        let annotations = decode(trace, options);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].kind, AnnotationKind::RegisterWrite);
        assert_eq!(annotations[0].text, "DATA WRITE: 0x55");
        assert_eq!(annotations[1].kind, AnnotationKind::RegisterRead);
        assert_eq!(annotations[1].text, "DATA READ: 0xAA");
    }

    #[test]
    fn test_dma_squelch_drops_cycle_and_state() {
        use crate::sampler::ChannelId;

        let mut trace = TraceBuilder::new();
        trace.set_level(ChannelId::Dmarq, true);
        trace.bus_write(true, false, 2, 0x42);
        let mut sampler = trace.build();
        let mut decoder = CycleDecoder::default();
        let mut annotations = Vec::new();
        decoder.run(&mut sampler, &mut annotations);

        assert!(annotations.is_empty());
        assert_eq!(decoder.task_file().sector_count, 0);

        // Same cycle with squelching disabled is decoded.
        let mut trace = TraceBuilder::new();
        trace.set_level(ChannelId::Dmarq, true);
        trace.bus_write(true, false, 2, 0x42);
        let options = DecoderOptions { squelch_dma: false, ..Default::default() };
        let annotations = decode(trace, options);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text, "sector_count = 0x42");
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut trace = TraceBuilder::new();
        trace.bus_write(false, true, 6, 0x80);
        trace.bus_write(true, false, 2, 0x10);
        trace.bus_write(true, false, 7, CMD_PACKET);
        let mut sampler = trace.build();
        let mut decoder = CycleDecoder::default();
        let mut annotations = Vec::new();
        decoder.run(&mut sampler, &mut annotations);

        assert!(decoder.task_file().hob_active);
        decoder.reset();
        assert_eq!(decoder.task_file(), &TaskFileShadow::new());
        assert_eq!(decoder.cdb, CdbState::Idle);
    }
}
