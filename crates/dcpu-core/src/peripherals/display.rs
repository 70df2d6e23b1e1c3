//! Text display exemplar: a 32x12 grid of character cells.

use std::sync::Arc;

use crate::memory::{DeviceId, Word};
use crate::sequence::PersistentSequence;

use super::{Device, WriteObservers};

/// Identity under which the display is mapped.
pub const DISPLAY_ID: DeviceId = DeviceId::new("display");

/// Columns per row.
pub const DISPLAY_COLUMNS: usize = 32;

/// Number of rows.
pub const DISPLAY_ROWS: usize = 12;

/// Words of video memory.
pub const DISPLAY_WORDS: usize = DISPLAY_COLUMNS * DISPLAY_ROWS;

/// Default base address of video memory.
pub const DISPLAY_DEFAULT_BASE: Word = 0x8000;

/// One decoded display cell.
///
/// Word layout: bits 12..=15 foreground colour, bits 8..=11 background
/// colour, bits 0..=6 glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Glyph index (7-bit ASCII).
    pub glyph: u8,
    /// Foreground colour nibble.
    pub foreground: u8,
    /// Background colour nibble.
    pub background: u8,
}

impl Cell {
    /// Splits a video-memory word into its fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_word(word: Word) -> Self {
        Self {
            glyph: (word & 0x007F) as u8,
            foreground: ((word >> 12) & 0x0F) as u8,
            background: ((word >> 8) & 0x0F) as u8,
        }
    }
}

/// Memory-mapped text display.
#[derive(Debug, Clone)]
pub struct Display {
    base: Word,
    cells: PersistentSequence<Word>,
    observers: WriteObservers,
}

impl Display {
    /// Creates a blank display at `base`.
    #[must_use]
    pub fn new(base: Word) -> Self {
        Self {
            base,
            cells: PersistentSequence::new(DISPLAY_WORDS),
            observers: WriteObservers::new(),
        }
    }

    /// Base address of video memory.
    #[must_use]
    pub const fn base(&self) -> Word {
        self.base
    }

    /// Decoded cell at `(column, row)`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, column: usize, row: usize) -> Option<Cell> {
        if column >= DISPLAY_COLUMNS || row >= DISPLAY_ROWS {
            return None;
        }
        self.cells
            .get(row * DISPLAY_COLUMNS + column)
            .ok()
            .map(|word| Cell::from_word(*word))
    }

    /// Glyphs of one row as text; non-printable glyphs render as spaces.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        (0..DISPLAY_COLUMNS)
            .filter_map(|column| self.cell(column, row))
            .map(|cell| {
                let ch = char::from(cell.glyph);
                if ch.is_ascii_graphic() {
                    ch
                } else {
                    ' '
                }
            })
            .collect()
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(DISPLAY_DEFAULT_BASE)
    }
}

impl Device for Display {
    fn id(&self) -> DeviceId {
        DISPLAY_ID
    }

    #[allow(clippy::cast_possible_truncation)]
    fn range(&self) -> (Word, Word) {
        (
            self.base,
            self.base.wrapping_add((DISPLAY_WORDS - 1) as Word),
        )
    }

    fn read(&self, addr: Word) -> Word {
        self.cells
            .get(usize::from(addr.wrapping_sub(self.base)))
            .map_or(0, |word| *word)
    }

    fn write(&self, addr: Word, value: Word) -> Arc<dyn Device> {
        let cells = self
            .cells
            .set(usize::from(addr.wrapping_sub(self.base)), value)
            .unwrap_or_else(|_| self.cells.clone());
        Arc::new(Self {
            base: self.base,
            cells,
            observers: self.observers.clone(),
        })
    }

    fn observers(&self) -> Option<&WriteObservers> {
        Some(&self.observers)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Display, DISPLAY_COLUMNS, DISPLAY_ID, DISPLAY_ROWS};
    use crate::peripherals::{Device, InputEvent, WriteObservers};

    #[test]
    fn range_covers_the_whole_grid() {
        let display = Display::default();
        assert_eq!(display.range(), (0x8000, 0x817F));
        assert_eq!(display.id(), DISPLAY_ID);
    }

    #[test]
    fn cells_are_row_major() {
        let display = Display::new(0x8000);
        let device = display.write(0x8000 + 32 + 2, 0xF148);
        assert_eq!(device.read(0x8022), 0xF148);
        assert_eq!(display.read(0x8022), 0, "writes produce a new device value");
        assert_eq!(
            Cell::from_word(0xF148),
            Cell {
                glyph: b'H',
                foreground: 0xF,
                background: 0x1
            }
        );
    }

    #[test]
    fn contents_lists_every_cell() {
        let display = Display::new(0x8000);
        let mut device = display.write(0x8000, u16::from(b'H'));
        device = device.write(0x8001, 0x7000 | u16::from(b'i'));
        let words = device.contents();
        assert_eq!(words.len(), DISPLAY_COLUMNS * DISPLAY_ROWS);
        assert_eq!(words[1], 0x7069);
    }

    #[test]
    fn cell_lookup_rejects_out_of_grid_coordinates() {
        let display = Display::default();
        assert!(display.cell(DISPLAY_COLUMNS, 0).is_none());
        assert!(display.cell(0, DISPLAY_ROWS).is_none());
        assert_eq!(display.row_text(0), " ".repeat(DISPLAY_COLUMNS));
    }

    #[test]
    fn display_ignores_input_events() {
        assert!(Display::default().handle(&InputEvent::Key(1)).is_none());
    }

    #[test]
    fn observers_survive_writes() {
        let display = Display::default();
        let rx = display.observers().expect("observers").subscribe();
        let device = display.write(0x8000, 1);
        assert_eq!(device.observers().map(WriteObservers::len), Some(1));
        drop(rx);
    }
}
