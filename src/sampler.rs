//! Bus sampler abstraction over the raw multi-channel logic trace.
//!
//! Channels are identified by a fixed enumerated space rather than by name so
//! the hot decode loop never performs string lookups; optional channels that
//! are not wired in a capture read as logical false.

use std::fmt;

use crate::SampleIndex;

/// Logical channels of the PATA bus.
///
/// `D0..D7` plus the seven control/address lines are mandatory; everything
/// else is optional. Enum order fixes the per-sample storage index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ChannelId {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    /// I/O write strobe (active low)
    Diow,
    /// I/O read strobe (active low)
    Dior,
    /// Chip select 0 (active low, task-file block)
    Cs0,
    /// Chip select 1 (active low, control block)
    Cs1,
    Da0,
    Da1,
    Da2,
    /// Interrupt request
    Intrq,
    /// Reset (active low)
    Reset,
    /// I/O ready
    Iordy,
    /// DMA request
    Dmarq,
    /// DMA acknowledge (active low)
    Dmack,
    /// Drive active / slave present
    Dasp,
    /// Passed diagnostics
    Pdiag,
    /// 16-bit I/O indicator
    Iocs16,
    D8,
    D9,
    D10,
    D11,
    D12,
    D13,
    D14,
    D15,
}

impl ChannelId {
    /// Number of channels in the fixed space.
    pub const COUNT: usize = 31;

    /// Every channel, in storage order.
    pub const ALL: [ChannelId; ChannelId::COUNT] = [
        ChannelId::D0,
        ChannelId::D1,
        ChannelId::D2,
        ChannelId::D3,
        ChannelId::D4,
        ChannelId::D5,
        ChannelId::D6,
        ChannelId::D7,
        ChannelId::Diow,
        ChannelId::Dior,
        ChannelId::Cs0,
        ChannelId::Cs1,
        ChannelId::Da0,
        ChannelId::Da1,
        ChannelId::Da2,
        ChannelId::Intrq,
        ChannelId::Reset,
        ChannelId::Iordy,
        ChannelId::Dmarq,
        ChannelId::Dmack,
        ChannelId::Dasp,
        ChannelId::Pdiag,
        ChannelId::Iocs16,
        ChannelId::D8,
        ChannelId::D9,
        ChannelId::D10,
        ChannelId::D11,
        ChannelId::D12,
        ChannelId::D13,
        ChannelId::D14,
        ChannelId::D15,
    ];

    /// Channels a capture must wire for control-plane decoding.
    pub const MANDATORY: [ChannelId; 15] = [
        ChannelId::D0,
        ChannelId::D1,
        ChannelId::D2,
        ChannelId::D3,
        ChannelId::D4,
        ChannelId::D5,
        ChannelId::D6,
        ChannelId::D7,
        ChannelId::Diow,
        ChannelId::Dior,
        ChannelId::Cs0,
        ChannelId::Cs1,
        ChannelId::Da0,
        ChannelId::Da1,
        ChannelId::Da2,
    ];

    /// Storage index into a [`LogicSample`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase name, matching capture-file column headers.
    pub fn name(self) -> &'static str {
        match self {
            ChannelId::D0 => "d0",
            ChannelId::D1 => "d1",
            ChannelId::D2 => "d2",
            ChannelId::D3 => "d3",
            ChannelId::D4 => "d4",
            ChannelId::D5 => "d5",
            ChannelId::D6 => "d6",
            ChannelId::D7 => "d7",
            ChannelId::Diow => "diow",
            ChannelId::Dior => "dior",
            ChannelId::Cs0 => "cs0",
            ChannelId::Cs1 => "cs1",
            ChannelId::Da0 => "da0",
            ChannelId::Da1 => "da1",
            ChannelId::Da2 => "da2",
            ChannelId::Intrq => "intrq",
            ChannelId::Reset => "reset",
            ChannelId::Iordy => "iordy",
            ChannelId::Dmarq => "dmarq",
            ChannelId::Dmack => "dmack",
            ChannelId::Dasp => "dasp",
            ChannelId::Pdiag => "pdiag",
            ChannelId::Iocs16 => "iocs16",
            ChannelId::D8 => "d8",
            ChannelId::D9 => "d9",
            ChannelId::D10 => "d10",
            ChannelId::D11 => "d11",
            ChannelId::D12 => "d12",
            ChannelId::D13 => "d13",
            ChannelId::D14 => "d14",
            ChannelId::D15 => "d15",
        }
    }

    /// Resolve a channel from its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<ChannelId> {
        let lower = name.to_ascii_lowercase();
        ChannelId::ALL.iter().copied().find(|ch| ch.name() == lower)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One instant of the multi-channel trace. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSample {
    /// Monotonically increasing time coordinate
    pub index: SampleIndex,
    levels: [bool; ChannelId::COUNT],
}

impl LogicSample {
    pub fn new(index: SampleIndex, levels: [bool; ChannelId::COUNT]) -> Self {
        Self { index, levels }
    }

    /// Instantaneous level of a channel.
    pub fn level(&self, ch: ChannelId) -> bool {
        self.levels[ch.index()]
    }

    /// 8-bit value on the low data lines (D0..D7).
    pub fn data_bus(&self) -> u8 {
        let mut v = 0u8;
        for (bit, ch) in [
            ChannelId::D0,
            ChannelId::D1,
            ChannelId::D2,
            ChannelId::D3,
            ChannelId::D4,
            ChannelId::D5,
            ChannelId::D6,
            ChannelId::D7,
        ]
        .into_iter()
        .enumerate()
        {
            if self.level(ch) {
                v |= 1 << bit;
            }
        }
        v
    }

    /// 3-bit register address on DA0..DA2.
    pub fn address(&self) -> u8 {
        (self.level(ChannelId::Da0) as u8)
            | ((self.level(ChannelId::Da1) as u8) << 1)
            | ((self.level(ChannelId::Da2) as u8) << 2)
    }

    /// Chip-select assertion, with the active-low convention applied:
    /// `(cs0_active, cs1_active)`.
    pub fn selects(&self) -> (bool, bool) {
        (!self.level(ChannelId::Cs0), !self.level(ChannelId::Cs1))
    }
}

/// Abstraction over the acquisition side: edge waits and level snapshots.
pub trait BusSampler {
    /// Suspend until any channel in `strobes` transitions high-to-low.
    /// Returns the channel that fired and the sample index of the edge, or
    /// `None` once the trace is exhausted.
    fn wait_edge(&mut self, strobes: &[ChannelId]) -> Option<(ChannelId, SampleIndex)>;

    /// Level of `ch` at the most recent snapshot; false if not wired.
    fn level(&self, ch: ChannelId) -> bool;

    /// Whether the capture wires this channel at all.
    fn is_wired(&self, ch: ChannelId) -> bool;

    /// All channel levels at the current position.
    fn snapshot(&self) -> LogicSample;
}

/// A [`BusSampler`] over an in-memory captured trace.
#[derive(Debug, Clone)]
pub struct TraceSampler {
    samples: Vec<LogicSample>,
    present: [bool; ChannelId::COUNT],
    cursor: usize,
}

impl TraceSampler {
    /// Wrap a captured trace. Levels of channels not marked present are
    /// normalized to false so unwired optional signals read as the defined
    /// default everywhere.
    pub fn new(mut samples: Vec<LogicSample>, present: [bool; ChannelId::COUNT]) -> Self {
        for sample in &mut samples {
            for ch in ChannelId::ALL {
                if !present[ch.index()] {
                    sample.levels[ch.index()] = false;
                }
            }
        }
        Self { samples, present, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl BusSampler for TraceSampler {
    fn wait_edge(&mut self, strobes: &[ChannelId]) -> Option<(ChannelId, SampleIndex)> {
        while self.cursor + 1 < self.samples.len() {
            let prev = &self.samples[self.cursor];
            let cur = &self.samples[self.cursor + 1];
            self.cursor += 1;
            for &ch in strobes {
                if prev.level(ch) && !cur.level(ch) {
                    return Some((ch, cur.index));
                }
            }
        }
        None
    }

    fn level(&self, ch: ChannelId) -> bool {
        self.samples.get(self.cursor).map(|s| s.level(ch)).unwrap_or(false)
    }

    fn is_wired(&self, ch: ChannelId) -> bool {
        self.present[ch.index()]
    }

    fn snapshot(&self) -> LogicSample {
        match self.samples.get(self.cursor) {
            Some(sample) => sample.clone(),
            None => LogicSample::new(0, [false; ChannelId::COUNT]),
        }
    }
}

/// Builder for synthetic traces, used by tests and examples.
///
/// Idle state keeps both strobes and both chip selects deasserted (high);
/// every bus cycle contributes a setup sample, the strobe-edge sample the
/// decoder observes, and a release sample back to idle.
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    samples: Vec<LogicSample>,
    present: [bool; ChannelId::COUNT],
    idle: [bool; ChannelId::COUNT],
    next_index: SampleIndex,
}

impl TraceBuilder {
    /// A builder wiring only the mandatory channels.
    pub fn new() -> Self {
        Self::with_optional(&[])
    }

    /// A builder wiring the mandatory channels plus `extra`.
    pub fn with_optional(extra: &[ChannelId]) -> Self {
        let mut present = [false; ChannelId::COUNT];
        for ch in ChannelId::MANDATORY {
            present[ch.index()] = true;
        }
        for &ch in extra {
            present[ch.index()] = true;
        }
        // Strobes and chip selects rest high (deasserted).
        let mut idle = [false; ChannelId::COUNT];
        idle[ChannelId::Diow.index()] = true;
        idle[ChannelId::Dior.index()] = true;
        idle[ChannelId::Cs0.index()] = true;
        idle[ChannelId::Cs1.index()] = true;
        let mut builder = Self { samples: Vec::new(), present, idle, next_index: 0 };
        // Seed one idle sample so the first cycle has a predecessor to edge from.
        builder.push(builder.idle);
        builder
    }

    fn push(&mut self, levels: [bool; ChannelId::COUNT]) {
        self.samples.push(LogicSample::new(self.next_index, levels));
        self.next_index += 1;
    }

    /// Persistently drive an optional side-band level (e.g. DMARQ or INTRQ)
    /// from this point on. Marks the channel wired.
    pub fn set_level(&mut self, ch: ChannelId, level: bool) -> &mut Self {
        self.present[ch.index()] = true;
        self.idle[ch.index()] = level;
        self
    }

    /// Append `n` idle samples.
    pub fn idle(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.push(self.idle);
        }
        self
    }

    /// One register write cycle: select lines, address, and data value are
    /// driven, then DIOW- falls.
    pub fn bus_write(&mut self, cs0: bool, cs1: bool, address: u8, value: u8) -> &mut Self {
        self.bus_cycle(ChannelId::Diow, cs0, cs1, address, value)
    }

    /// One register read cycle: `value` is what the device drives onto the
    /// data lines while DIOR- is low.
    pub fn bus_read(&mut self, cs0: bool, cs1: bool, address: u8, value: u8) -> &mut Self {
        self.bus_cycle(ChannelId::Dior, cs0, cs1, address, value)
    }

    fn bus_cycle(&mut self, strobe: ChannelId, cs0: bool, cs1: bool, address: u8, value: u8) -> &mut Self {
        let mut levels = self.idle;
        levels[ChannelId::Cs0.index()] = !cs0;
        levels[ChannelId::Cs1.index()] = !cs1;
        levels[ChannelId::Da0.index()] = address & 0x01 != 0;
        levels[ChannelId::Da1.index()] = address & 0x02 != 0;
        levels[ChannelId::Da2.index()] = address & 0x04 != 0;
        for bit in 0..8 {
            levels[ChannelId::ALL[bit].index()] = value & (1 << bit) != 0;
        }
        // Setup, falling edge, release.
        self.push(levels);
        levels[strobe.index()] = false;
        self.push(levels);
        self.push(self.idle);
        self
    }

    pub fn build(self) -> TraceSampler {
        TraceSampler::new(self.samples, self.present)
    }
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
