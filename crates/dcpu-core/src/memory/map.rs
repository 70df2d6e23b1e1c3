//! Ordered, non-overlapping address-range bindings used for device dispatch.

use std::fmt;

use crate::fault::MapError;
use crate::memory::Word;

/// Stable identity of a memory-mapped device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(&'static str);

impl DeviceId {
    /// Creates a device identity from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the device name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Inclusive `[start, end]` address range bound to one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappedRange {
    /// Inclusive start address.
    pub start: Word,
    /// Inclusive end address.
    pub end: Word,
    /// Device bound to the range.
    pub device: DeviceId,
}

impl MappedRange {
    /// Returns `true` when `addr` falls inside this range.
    #[must_use]
    pub const fn contains(&self, addr: Word) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Number of words covered by the range.
    #[must_use]
    pub const fn len_words(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

/// Set of device ranges kept sorted by start and pairwise disjoint.
///
/// Cloning produces an independent table, so a persistent state can share
/// one table between snapshots and copy it only when a mapping changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRangeTable {
    ranges: Vec<MappedRange>,
}

impl AddressRangeTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Binds the inclusive range `[start, end]` to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvertedRange`] when `start > end` and
    /// [`MapError::Overlap`] when the range intersects an existing binding.
    /// The table is unchanged on error.
    pub fn map(&mut self, start: Word, end: Word, device: DeviceId) -> Result<(), MapError> {
        if start > end {
            return Err(MapError::InvertedRange { start, end });
        }

        let index = self.ranges.partition_point(|range| range.end < start);
        if let Some(existing) = self.ranges.get(index) {
            if existing.start <= end {
                return Err(MapError::Overlap {
                    start,
                    end,
                    device,
                    existing_start: existing.start,
                    existing_end: existing.end,
                    existing: existing.device,
                });
            }
        }

        self.ranges.insert(index, MappedRange { start, end, device });
        Ok(())
    }

    /// Returns the device bound to `addr`, or `None` for plain memory.
    #[must_use]
    pub fn lookup(&self, addr: Word) -> Option<DeviceId> {
        self.range_of(addr).map(|range| range.device)
    }

    /// Returns the range containing `addr`, if any.
    #[must_use]
    pub fn range_of(&self, addr: Word) -> Option<&MappedRange> {
        let index = self.ranges.partition_point(|range| range.end < addr);
        self.ranges.get(index).filter(|range| range.contains(addr))
    }

    /// Bound ranges in ascending address order.
    #[must_use]
    pub fn ranges(&self) -> &[MappedRange] {
        &self.ranges
    }

    /// Number of bound ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
