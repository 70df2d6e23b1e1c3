//! Memory-mapped device contract and dispatch.
//!
//! Devices are immutable values: a write or an input event produces a new
//! device value that replaces the old one on the [`DeviceBus`]. This lets the
//! persistent state share device contents between snapshots exactly as it
//! shares plain memory.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::fault::MapError;
use crate::memory::{AddressRangeTable, DeviceId, Word};

/// Text display exemplar.
pub mod display;
/// Keyboard ring-buffer exemplar.
pub mod keyboard;

pub use display::{
    Cell, Display, DISPLAY_COLUMNS, DISPLAY_DEFAULT_BASE, DISPLAY_ID, DISPLAY_ROWS, DISPLAY_WORDS,
};
pub use keyboard::{Keyboard, KEYBOARD_BUFFER_WORDS, KEYBOARD_DEFAULT_BASE, KEYBOARD_ID};

/// Asynchronous input delivered to devices through the engine's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InputEvent {
    /// A key press carrying its character code.
    Key(Word),
}

/// Notification sent to observers after a successful device write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceWrite {
    /// Device that accepted the write.
    pub device: DeviceId,
    /// Written address.
    pub addr: Word,
    /// Value before the write.
    pub old: Word,
    /// Value after the write.
    pub new: Word,
}

/// Subscription list for device write notifications.
///
/// Clones share the same list, so a device carries its observers across the
/// new values produced by writes. Delivery never blocks: every observer owns
/// an unbounded channel and drains it on its own thread.
#[derive(Clone, Default)]
pub struct WriteObservers {
    senders: Arc<Mutex<Vec<Sender<DeviceWrite>>>>,
}

impl WriteObservers {
    /// Creates an empty subscription list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer and returns its receiving end.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<DeviceWrite> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.senders.lock().push(tx);
        rx
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    /// Returns `true` when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.lock().is_empty()
    }

    /// Delivers `write` to every observer, dropping disconnected ones.
    pub fn notify(&self, write: DeviceWrite) {
        let mut senders = self.senders.lock();
        let before = senders.len();
        senders.retain(|tx| tx.send(write).is_ok());
        let dropped = before - senders.len();
        if dropped > 0 {
            tracing::warn!(device = %write.device, dropped, "pruned disconnected write observers");
        }
    }
}

impl fmt::Debug for WriteObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteObservers")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// Capability implemented by every memory-mapped peripheral.
pub trait Device: Send + Sync + fmt::Debug {
    /// Stable identity used for mapping and retrieval.
    fn id(&self) -> DeviceId;

    /// Inclusive address range owned by the device.
    fn range(&self) -> (Word, Word);

    /// Reads the word at `addr`, which lies inside [`Device::range`].
    fn read(&self, addr: Word) -> Word;

    /// Returns the device value that results from writing `value` at `addr`.
    fn write(&self, addr: Word, value: Word) -> Arc<dyn Device>;

    /// Applies an input event, returning the new device value when the event
    /// is accepted.
    fn handle(&self, _event: &InputEvent) -> Option<Arc<dyn Device>> {
        None
    }

    /// Write-notification subscriptions, for devices that expose them.
    fn observers(&self) -> Option<&WriteObservers> {
        None
    }

    /// Registers this device's range in `table`.
    ///
    /// # Errors
    ///
    /// Propagates [`MapError`] from [`AddressRangeTable::map`].
    fn map_into(&self, table: &mut AddressRangeTable) -> Result<(), MapError> {
        let (start, end) = self.range();
        table.map(start, end, self.id())
    }

    /// Copies out every word of the device sub-space in address order.
    fn contents(&self) -> Vec<Word> {
        let (start, end) = self.range();
        (start..=end).map(|addr| self.read(addr)).collect()
    }
}

/// Address-range table plus the devices bound into it.
#[derive(Debug, Clone, Default)]
pub struct DeviceBus {
    table: AddressRangeTable,
    devices: Vec<Arc<dyn Device>>,
}

impl DeviceBus {
    /// Creates a bus with nothing mapped.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            table: AddressRangeTable::new(),
            devices: Vec::new(),
        }
    }

    /// Binds `device` into the address space.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::DuplicateDevice`] if a device with the same id is
    /// already bound, or the table's error if the range is invalid or
    /// overlapping. The bus is unchanged on error.
    pub fn map(&mut self, device: Arc<dyn Device>) -> Result<(), MapError> {
        let id = device.id();
        if self.get(id).is_some() {
            return Err(MapError::DuplicateDevice(id));
        }
        device.map_into(&mut self.table)?;
        let (start, end) = device.range();
        tracing::debug!(device = %id, start, end, "device mapped");
        self.devices.push(device);
        Ok(())
    }

    /// Address-range bindings.
    #[must_use]
    pub const fn table(&self) -> &AddressRangeTable {
        &self.table
    }

    /// Looks up a bound device by id.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&Arc<dyn Device>> {
        self.devices.iter().find(|device| device.id() == id)
    }

    /// Bound devices in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Device>> {
        self.devices.iter()
    }

    /// Reads through the device bound at `addr`, or `None` for plain memory.
    #[must_use]
    pub fn read(&self, addr: Word) -> Option<Word> {
        let id = self.table.lookup(addr)?;
        self.get(id).map(|device| device.read(addr))
    }

    /// Writes through the device bound at `addr`.
    ///
    /// Returns `false` when `addr` is plain memory. Observers are notified
    /// after the new device value is installed.
    pub fn write(&mut self, addr: Word, value: Word) -> bool {
        let Some(id) = self.table.lookup(addr) else {
            return false;
        };
        let Some(slot) = self.devices.iter_mut().find(|device| device.id() == id) else {
            return false;
        };

        let old = slot.read(addr);
        *slot = slot.write(addr, value);
        if let Some(observers) = slot.observers() {
            observers.notify(DeviceWrite {
                device: id,
                addr,
                old,
                new: value,
            });
        }
        true
    }

    /// Offers `event` to each device in mapping order until one accepts it.
    pub fn handle(&mut self, event: &InputEvent) -> Option<DeviceId> {
        self.devices.iter_mut().find_map(|slot| {
            let next = slot.handle(event)?;
            *slot = next;
            Some(slot.id())
        })
    }
}
