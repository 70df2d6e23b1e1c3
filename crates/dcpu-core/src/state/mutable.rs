use std::sync::Arc;

use crate::fault::MapError;
use crate::memory::{new_address_space, AddressRangeTable, DeviceId, Word};
use crate::peripherals::{Device, DeviceBus, InputEvent};

use super::{Register, RegisterFile, State};

/// State updated in place: one register file, one flat backing array.
///
/// Cloning copies the whole address space, so the engine only clones this
/// realization when a reader asks for a snapshot.
#[derive(Debug, Clone)]
pub struct MutableState {
    registers: RegisterFile,
    memory: Box<[Word]>,
    bus: DeviceBus,
}

impl MutableState {
    /// Creates a zeroed machine with nothing mapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: RegisterFile::default(),
            memory: new_address_space(),
            bus: DeviceBus::new(),
        }
    }

    /// Snapshot of all register values.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }
}

impl Default for MutableState {
    fn default() -> Self {
        Self::new()
    }
}

impl State for MutableState {
    fn register(&self, reg: Register) -> Word {
        self.registers.get(reg)
    }

    fn set_register(&mut self, reg: Register, value: Word) {
        self.registers.set(reg, value);
    }

    fn read(&self, addr: Word) -> Word {
        self.bus
            .read(addr)
            .unwrap_or(self.memory[usize::from(addr)])
    }

    fn write(&mut self, addr: Word, value: Word) {
        if !self.bus.write(addr, value) {
            self.memory[usize::from(addr)] = value;
        }
    }

    fn map_device(&mut self, device: Arc<dyn Device>) -> Result<(), MapError> {
        self.bus.map(device)
    }

    fn device(&self, id: DeviceId) -> Option<Arc<dyn Device>> {
        self.bus.get(id).cloned()
    }

    fn address_map(&self) -> &AddressRangeTable {
        self.bus.table()
    }

    fn handle_event(&mut self, event: &InputEvent) -> Option<DeviceId> {
        self.bus.handle(event)
    }

    fn load_words(&mut self, words: &[Word]) {
        let len = words.len().min(self.memory.len());
        self.memory[..len].copy_from_slice(&words[..len]);
    }
}
