use std::sync::Arc;

use crate::fault::MapError;
use crate::memory::{AddressRangeTable, DeviceId, Word, ADDRESS_SPACE_WORDS};
use crate::peripherals::{Device, DeviceBus, InputEvent};
use crate::sequence::PersistentSequence;

use super::{Register, State, REGISTER_COUNT};

/// State whose clones are snapshots.
///
/// Registers and memory live in [`PersistentSequence`]s and the device bus
/// sits behind an [`Arc`]. A write path-copies O(log n) nodes and leaves
/// every earlier clone untouched, so callers may retain as many prior states
/// as they like and read them from any thread.
#[derive(Debug, Clone)]
pub struct PersistentState {
    registers: PersistentSequence<Word>,
    memory: PersistentSequence<Word>,
    bus: Arc<DeviceBus>,
}

impl PersistentState {
    /// Creates a zeroed machine with nothing mapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: PersistentSequence::new(REGISTER_COUNT),
            memory: PersistentSequence::new(ADDRESS_SPACE_WORDS),
            bus: Arc::new(DeviceBus::new()),
        }
    }

    /// Backing memory as a persistent sequence, without device overlays.
    #[must_use]
    pub const fn memory(&self) -> &PersistentSequence<Word> {
        &self.memory
    }

    /// Returns `true` when both states share the same memory tree.
    #[must_use]
    pub fn shares_memory_with(&self, other: &Self) -> bool {
        self.memory.ptr_eq(&other.memory)
    }
}

impl Default for PersistentState {
    fn default() -> Self {
        Self::new()
    }
}

// Both sequences are built with fixed lengths covering every register index
// and every `Word` address, so indexed access cannot go out of bounds.
fn word_at(sequence: &PersistentSequence<Word>, index: usize) -> Word {
    sequence.get(index).map_or(0, |word| *word)
}

fn with_word(sequence: &mut PersistentSequence<Word>, index: usize, value: Word) {
    if let Ok(next) = sequence.set(index, value) {
        *sequence = next;
    }
}

impl State for PersistentState {
    fn register(&self, reg: Register) -> Word {
        word_at(&self.registers, reg.index())
    }

    fn set_register(&mut self, reg: Register, value: Word) {
        with_word(&mut self.registers, reg.index(), value);
    }

    fn read(&self, addr: Word) -> Word {
        self.bus
            .read(addr)
            .unwrap_or_else(|| word_at(&self.memory, usize::from(addr)))
    }

    fn write(&mut self, addr: Word, value: Word) {
        if self.bus.table().lookup(addr).is_some() {
            Arc::make_mut(&mut self.bus).write(addr, value);
        } else {
            with_word(&mut self.memory, usize::from(addr), value);
        }
    }

    fn map_device(&mut self, device: Arc<dyn Device>) -> Result<(), MapError> {
        let mut bus = DeviceBus::clone(&self.bus);
        bus.map(device)?;
        self.bus = Arc::new(bus);
        Ok(())
    }

    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        self.bus.get(id).cloned()
    }

    fn address_map(&self) -> &AddressRangeTable {
        self.bus.table()
    }

    fn handle_event(&mut self, event: &InputEvent) -> Option<DeviceId> {
        let mut bus = DeviceBus::clone(&self.bus);
        let handled = bus.handle(event)?;
        self.bus = Arc::new(bus);
        Some(handled)
    }

    fn load_words(&mut self, words: &[Word]) {
        if words.is_empty() {
            return;
        }
        let mut flat = self.memory.to_vec();
        let len = words.len().min(flat.len());
        flat[..len].copy_from_slice(&words[..len]);
        self.memory = PersistentSequence::from_slice(&flat);
    }
}
