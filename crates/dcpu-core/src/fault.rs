use thiserror::Error;

use crate::memory::Word;

/// Fault classes used for propagation policy and host-facing reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Instruction stream could not be decoded.
    Decode,
    /// Device mapping rejected at setup time.
    Configuration,
    /// Persistent sequence accessed outside its length.
    Bounds,
    /// Binary image could not be loaded.
    Load,
}

/// Instruction decode failures. These halt the execution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeError {
    /// Primary opcode field (bits 0..=3) has no assigned operation.
    #[error("unknown primary opcode {0:#03x}")]
    UnknownOpcode(u8),
    /// Non-basic opcode field (bits 4..=9) has no assigned operation.
    #[error("unknown non-basic opcode {0:#04x}")]
    UnknownNonBasicOpcode(u8),
    /// Operand code outside `0x00..=0x3f`.
    #[error("invalid operand code {0:#04x}")]
    InvalidOperand(u8),
}

/// Address-range mapping failures raised by [`crate::AddressRangeTable::map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MapError {
    /// Requested range overlaps a range that is already bound.
    #[error(
        "cannot map [{start:#06x}..={end:#06x}] to {device}: \
         [{existing_start:#06x}..={existing_end:#06x}] is already mapped to {existing}"
    )]
    Overlap {
        /// Requested inclusive start.
        start: Word,
        /// Requested inclusive end.
        end: Word,
        /// Device the caller tried to bind.
        device: crate::DeviceId,
        /// Start of the conflicting range.
        existing_start: Word,
        /// End of the conflicting range.
        existing_end: Word,
        /// Device already bound to the conflicting range.
        existing: crate::DeviceId,
    },
    /// Range start lies after its end.
    #[error("range start {start:#06x} is after end {end:#06x}")]
    InvertedRange {
        /// Requested inclusive start.
        start: Word,
        /// Requested inclusive end.
        end: Word,
    },
    /// A device with the same identity is already bound.
    #[error("device {0} is already mapped")]
    DuplicateDevice(crate::DeviceId),
}

/// Out-of-range access on a [`crate::PersistentSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("index {index} out of bounds for sequence of length {len}")]
pub struct SequenceError {
    /// Offending index.
    pub index: usize,
    /// Sequence length.
    pub len: usize,
}

/// Binary image loading failures.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Image holds more words than the address space.
    #[error("image of {words} words exceeds the {capacity}-word address space")]
    TooLarge {
        /// Whole words in the image.
        words: usize,
        /// Address-space capacity in words.
        capacity: usize,
    },
    /// Underlying file could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Execution-engine control failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operation requires a stopped engine.
    #[error("engine is running")]
    Running,
    /// The engine that owned the event queue has been dropped.
    #[error("engine is gone; event queue closed")]
    Closed,
    /// No retained snapshot precedes the requested step.
    #[error("no snapshot at or before step {0}")]
    NoSnapshot(u64),
    /// The execution thread could not be spawned.
    #[error("failed to spawn execution thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Umbrella fault type surfaced by setup code and the execution engine.
#[derive(Debug, Error)]
pub enum Fault {
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`MapError`].
    #[error(transparent)]
    Configuration(#[from] MapError),
    /// See [`SequenceError`].
    #[error(transparent)]
    Bounds(#[from] SequenceError),
    /// See [`ImageError`].
    #[error(transparent)]
    Load(#[from] ImageError),
}

impl Fault {
    /// Returns the class of this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Decode(_) => FaultClass::Decode,
            Self::Configuration(_) => FaultClass::Configuration,
            Self::Bounds(_) => FaultClass::Bounds,
            Self::Load(_) => FaultClass::Load,
        }
    }

    /// Faults that stop the instruction stream rather than failing a setup call.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Bounds(_))
    }
}
