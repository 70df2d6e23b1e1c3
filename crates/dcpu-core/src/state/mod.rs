//! Machine state contract and its two realizations.
//!
//! [`MutableState`] updates one register file and one backing array in
//! place. [`PersistentState`] stores both in [`crate::PersistentSequence`]s,
//! so every clone is an O(1) snapshot that later updates never disturb.
//! Execution code is generic over [`State`] and never mixes the two.

use std::fmt;
use std::sync::Arc;

use crate::fault::MapError;
use crate::memory::{AddressRangeTable, DeviceId, Word};
use crate::peripherals::{Device, InputEvent};

/// In-place realization.
pub mod mutable;
/// Structurally shared realization.
pub mod persistent;
/// Register identifiers and plain register storage.
pub mod registers;
/// Engine lifecycle states.
pub mod run_state;

pub use mutable::MutableState;
pub use persistent::PersistentState;
pub use registers::{Register, RegisterFile, GENERAL_REGISTER_COUNT, REGISTER_COUNT};
pub use run_state::RunState;

/// Register file, address space and device dispatch behind one contract.
///
/// Reads and writes to an address inside a mapped range go to the bound
/// device; every other address is plain backing memory. Cloning yields an
/// independent value that is safe to hand to another thread.
pub trait State: Clone + Send + Sync + fmt::Debug {
    /// Reads a register.
    fn register(&self, reg: Register) -> Word;

    /// Writes a register.
    fn set_register(&mut self, reg: Register, value: Word);

    /// Reads the word at `addr`.
    fn read(&self, addr: Word) -> Word;

    /// Writes the word at `addr`.
    fn write(&mut self, addr: Word, value: Word);

    /// Binds `device` into the address space.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] when the device's range is invalid, overlaps an
    /// existing mapping, or the device id is already bound. The state is
    /// unchanged on error.
    fn map_device(&mut self, device: Arc<dyn Device>) -> Result<(), MapError>;

    /// Current value of the device bound under `id`.
    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>>;

    /// Address-range bindings of mapped devices.
    fn address_map(&self) -> &AddressRangeTable;

    /// Offers `event` to the mapped devices; returns the id of the device
    /// that accepted it.
    fn handle_event(&mut self, event: &InputEvent) -> Option<DeviceId>;

    /// Copies `words` into backing memory starting at address 0, bypassing
    /// device dispatch. Extra words beyond the address space are ignored.
    fn load_words(&mut self, words: &[Word]);

    /// Program counter.
    fn pc(&self) -> Word {
        self.register(Register::PC)
    }

    /// Sets the program counter.
    fn set_pc(&mut self, value: Word) {
        self.set_register(Register::PC, value);
    }

    /// Stack pointer.
    fn sp(&self) -> Word {
        self.register(Register::SP)
    }

    /// Sets the stack pointer.
    fn set_sp(&mut self, value: Word) {
        self.set_register(Register::SP, value);
    }

    /// Overflow register.
    fn overflow(&self) -> Word {
        self.register(Register::O)
    }

    /// Sets the overflow register.
    fn set_overflow(&mut self, value: Word) {
        self.set_register(Register::O, value);
    }
}
