//! Core emulator crate for a 16-bit word-addressed DCPU-style machine.

/// Fault taxonomy for decode, configuration, bounds and load failures.
pub mod fault;
pub use fault::{DecodeError, EngineError, Fault, FaultClass, ImageError, MapError, SequenceError};

/// Immutable fixed-length sequence with structural-sharing updates.
pub mod sequence;
pub use sequence::PersistentSequence;

/// Word-addressed memory model, device ranges and image loading.
pub mod memory;
pub use memory::{
    load_image, load_image_file, new_address_space, AddressRangeTable, DeviceId, MappedRange,
    Word, ADDRESS_SPACE_WORDS, MAX_ADDRESS,
};

/// Memory-mapped device contract, dispatch and exemplar devices.
pub mod peripherals;
pub use peripherals::{
    Device, DeviceBus, DeviceWrite, Display, InputEvent, Keyboard, WriteObservers, DISPLAY_ID,
    KEYBOARD_ID,
};

/// Machine state contract and its mutable and persistent realizations.
pub mod state;
pub use state::{
    MutableState, PersistentState, Register, RegisterFile, RunState, State,
    GENERAL_REGISTER_COUNT, REGISTER_COUNT,
};

/// Opcode tables and instruction-word field splitting.
pub mod encoding;
pub use encoding::{encode_basic, encode_non_basic, BasicOpcode, NonBasicOpcode, WordFields};

/// Operand addressing modes and resolution.
pub mod operand;
pub use operand::{AddressingMode, Cursor, Operand};

/// Instruction decoder.
pub mod decoder;
pub use decoder::Decoder;

/// Operation semantics and the fetch/decode/apply pipeline.
pub mod execute;
pub use execute::{fetch_decode, step, Operation, StepOutcome};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_one, DisassemblyRow};

/// Bounded snapshot retention for rewind.
pub mod history;
pub use history::{Snapshot, SnapshotHistory};

/// Boot-time configuration and machine construction.
pub mod api;
pub use api::{boot, boot_from_bytes, boot_from_file, CoreConfig, DEFAULT_HISTORY_INTERVAL};

/// Background execution loop and event queue.
pub mod engine;
pub use engine::{EventSender, ExecutionEngine};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
