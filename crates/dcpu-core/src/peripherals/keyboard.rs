//! Keyboard exemplar: a 16-word ring buffer fed by key events.
//!
//! The device occupies `BUFFER + 1` words. The extra word at
//! `base + KEYBOARD_BUFFER_WORDS` holds the write cursor, so a program can
//! poll the cursor to find out how far input has advanced.

use std::sync::Arc;

use crate::memory::{DeviceId, Word};
use crate::sequence::PersistentSequence;

use super::{Device, InputEvent};

/// Identity under which the keyboard is mapped.
pub const KEYBOARD_ID: DeviceId = DeviceId::new("keyboard");

/// Ring-buffer capacity in words.
pub const KEYBOARD_BUFFER_WORDS: usize = 16;

/// Default base address of the ring buffer.
pub const KEYBOARD_DEFAULT_BASE: Word = 0x9000;

#[allow(clippy::cast_possible_truncation)]
const CURSOR_OFFSET: Word = KEYBOARD_BUFFER_WORDS as Word;

/// Keyboard ring-buffer device.
#[derive(Debug, Clone)]
pub struct Keyboard {
    base: Word,
    words: PersistentSequence<Word>,
}

impl Keyboard {
    /// Creates an empty keyboard buffer at `base`.
    ///
    /// A base too close to the top of memory yields an inverted range, which
    /// mapping rejects.
    #[must_use]
    pub fn new(base: Word) -> Self {
        Self {
            base,
            words: PersistentSequence::new(KEYBOARD_BUFFER_WORDS + 1),
        }
    }

    /// Base address of the buffer.
    #[must_use]
    pub const fn base(&self) -> Word {
        self.base
    }

    /// Current write cursor, always below [`KEYBOARD_BUFFER_WORDS`].
    #[must_use]
    pub fn cursor(&self) -> usize {
        usize::from(self.word(KEYBOARD_BUFFER_WORDS)) % KEYBOARD_BUFFER_WORDS
    }

    /// Buffered key codes in slot order (not arrival order).
    #[must_use]
    pub fn buffer(&self) -> Vec<Word> {
        self.words.iter().take(KEYBOARD_BUFFER_WORDS).copied().collect()
    }

    fn word(&self, offset: usize) -> Word {
        self.words.get(offset).map_or(0, |word| *word)
    }

    fn with_words(&self, words: PersistentSequence<Word>) -> Arc<dyn Device> {
        Arc::new(Self {
            base: self.base,
            words,
        })
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new(KEYBOARD_DEFAULT_BASE)
    }
}

impl Device for Keyboard {
    fn id(&self) -> DeviceId {
        KEYBOARD_ID
    }

    fn range(&self) -> (Word, Word) {
        (self.base, self.base.wrapping_add(CURSOR_OFFSET))
    }

    fn read(&self, addr: Word) -> Word {
        self.word(usize::from(addr.wrapping_sub(self.base)))
    }

    fn write(&self, addr: Word, value: Word) -> Arc<dyn Device> {
        let offset = usize::from(addr.wrapping_sub(self.base));
        let words = self
            .words
            .set(offset, value)
            .unwrap_or_else(|_| self.words.clone());
        self.with_words(words)
    }

    fn handle(&self, event: &InputEvent) -> Option<Arc<dyn Device>> {
        let InputEvent::Key(code) = *event;
        let cursor = self.cursor();
        let next = (cursor + 1) % KEYBOARD_BUFFER_WORDS;
        #[allow(clippy::cast_possible_truncation)]
        let words = self
            .words
            .set(cursor, code)
            .and_then(|words| words.set(KEYBOARD_BUFFER_WORDS, next as Word))
            .ok()?;
        Some(self.with_words(words))
    }
}
