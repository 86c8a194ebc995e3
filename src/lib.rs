//! Core IR, traits, and errors for the pata_taskfile decoder.
//!
//! This library decodes register-level traffic on the parallel ATA (PATA/IDE)
//! bus from a sampled multi-channel logic trace: task-file parameter writes,
//! command writes, status reads, Device Control writes (including the HOB
//! high-order-byte latch used by 48-bit addressing), and the ATAPI PACKET
//! Command Descriptor Block written to the Data register.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use pata_taskfile::{
//!     decoder::{CycleDecoder, DecoderOptions},
//!     sampler::TraceBuilder,
//!     Annotation,
//! };
//!
//! // Build a synthetic trace: select the task file (CS0-) and write the
//! // Command register (DA=7) with READ SECTORS (0x20).
//! let mut trace = TraceBuilder::new();
//! trace.bus_write(true, false, 7, 0x20);
//! let mut sampler = trace.build();
//!
//! // Run the decoder and collect annotations.
//! let mut decoder = CycleDecoder::new(DecoderOptions::default());
//! let mut annotations: Vec<Annotation> = Vec::new();
//! decoder.run(&mut sampler, &mut annotations);
//!
//! for ann in &annotations {
//!     println!("{}", ann);
//! }
//! ```

pub mod tables;
pub mod sampler;
pub mod registers;
pub mod taskfile;
pub mod decoder;
pub mod capture;
pub mod format;
#[cfg(feature = "extension-module")]
pub mod python;

use std::fmt;

/// Time coordinate of the trace: a monotonically increasing sample number.
pub type SampleIndex = u64;

/// Annotation classes produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// Task-file or Data register write
    RegisterWrite,
    /// Register read
    RegisterRead,
    /// ATA command (composite: opcode, mnemonic, addressing)
    Command,
    /// ATAPI CDB byte stream
    Cdb,
    /// Status/AltStatus read
    Status,
    /// Device Control write
    DeviceControl,
    /// Interrupt line activity
    Interrupt,
    /// Warning / note
    Warning,
}

impl AnnotationKind {
    /// Short tag used in structured output.
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::RegisterWrite => "regw",
            AnnotationKind::RegisterRead => "regr",
            AnnotationKind::Command => "cmd",
            AnnotationKind::Cdb => "cdb",
            AnnotationKind::Status => "status",
            AnnotationKind::DeviceControl => "devctl",
            AnnotationKind::Interrupt => "intrq",
            AnnotationKind::Warning => "warn",
        }
    }

    /// The display row this class belongs to.
    pub fn row(&self) -> AnnotationRow {
        match self {
            AnnotationKind::Command | AnnotationKind::Cdb => AnnotationRow::Commands,
            AnnotationKind::RegisterWrite
            | AnnotationKind::RegisterRead
            | AnnotationKind::Status
            | AnnotationKind::DeviceControl => AnnotationRow::Registers,
            AnnotationKind::Interrupt | AnnotationKind::Warning => AnnotationRow::Signals,
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Logical grouping of annotation classes for downstream renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationRow {
    /// Commands and CDBs
    Commands,
    /// Register traffic
    Registers,
    /// Interrupts and warnings
    Signals,
}

impl AnnotationRow {
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationRow::Commands => "cmds",
            AnnotationRow::Registers => "regs",
            AnnotationRow::Signals => "ints",
        }
    }
}

impl fmt::Display for AnnotationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Sample index at which the bus cycle started
    pub start: SampleIndex,
    /// Sample index at which the bus cycle ended
    pub end: SampleIndex,
    /// Annotation class
    pub kind: AnnotationKind,
    /// Human-readable text
    pub text: String,
}

impl Annotation {
    pub fn new(start: SampleIndex, end: SampleIndex, kind: AnnotationKind, text: String) -> Self {
        Self { start, end, kind, text }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}] {}: {}", self.start, self.end, self.kind, self.text)
    }
}

/// Output boundary: receives annotations in strict cycle order.
pub trait AnnotationSink {
    fn emit(&mut self, annotation: Annotation);
}

impl AnnotationSink for Vec<Annotation> {
    fn emit(&mut self, annotation: Annotation) {
        self.push(annotation);
    }
}

/// Error type for decode and capture operations
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Malformed capture input
    #[error("Failed to parse capture: {0}")]
    CaptureError(String),

    /// A mandatory channel is not wired in the capture
    #[error("Missing mandatory channel: {0}")]
    MissingChannel(sampler::ChannelId),

    /// Malformed mnemonic override table
    #[error("Invalid command table override: {0}")]
    InvalidOverride(String),

    /// CSV-level error while reading a capture
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AnnotationKind::RegisterWrite.label(), "regw");
        assert_eq!(AnnotationKind::Command.to_string(), "cmd");
        assert_eq!(AnnotationKind::Warning.to_string(), "warn");
    }

    #[test]
    fn test_row_grouping() {
        assert_eq!(AnnotationKind::Command.row(), AnnotationRow::Commands);
        assert_eq!(AnnotationKind::Cdb.row(), AnnotationRow::Commands);
        assert_eq!(AnnotationKind::RegisterWrite.row(), AnnotationRow::Registers);
        assert_eq!(AnnotationKind::Status.row(), AnnotationRow::Registers);
        assert_eq!(AnnotationKind::DeviceControl.row(), AnnotationRow::Registers);
        assert_eq!(AnnotationKind::Interrupt.row(), AnnotationRow::Signals);
        assert_eq!(AnnotationKind::Warning.row(), AnnotationRow::Signals);
    }

    #[test]
    fn test_annotation_display() {
        let ann = Annotation::new(10, 10, AnnotationKind::Status, "STATUS read: 0x50".to_string());
        assert_eq!(ann.to_string(), "[10..10] status: STATUS read: 0x50");
    }

    #[test]
    fn test_vec_sink_preserves_order() {
        let mut sink: Vec<Annotation> = Vec::new();
        sink.emit(Annotation::new(1, 1, AnnotationKind::RegisterWrite, "a".to_string()));
        sink.emit(Annotation::new(2, 2, AnnotationKind::Command, "b".to_string()));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].start, 1);
        assert_eq!(sink[1].start, 2);
    }
}
