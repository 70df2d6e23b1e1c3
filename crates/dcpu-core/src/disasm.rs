//! Instruction disassembly.
//!
//! Rows are produced by decoding against a scratch cursor, so disassembling
//! never changes the inspected state. Operands are shown resolved: trailing
//! words appear as values and stack modes as `POP`, `PEEK` or `PUSH`.

use std::fmt;

use crate::decoder::Decoder;
use crate::memory::Word;
use crate::operand::Cursor;
use crate::state::State;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction word.
    pub addr: Word,
    /// Instruction word followed by its trailing words.
    pub words: Vec<Word>,
    /// Assembly text, or `DAT 0xNNNN` for an undecodable word.
    pub text: String,
    /// Whether the word failed to decode.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Instruction length in words.
    #[must_use]
    pub fn len_words(&self) -> usize {
        self.words.len()
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:", self.addr)?;
        for word in &self.words {
            write!(f, " {word:04x}")?;
        }
        for _ in self.words.len()..3 {
            f.write_str("     ")?;
        }
        write!(f, "  {}", self.text)
    }
}

/// Disassembles the instruction starting at `addr`.
#[must_use]
pub fn disassemble_one<S: State>(state: &S, addr: Word) -> DisassemblyRow {
    let word = state.read(addr);
    let mut cursor = Cursor::new(addr.wrapping_add(1), state.sp());

    match Decoder::decode(word, state, &mut cursor) {
        Ok(operation) => {
            let len = cursor.pc.wrapping_sub(addr);
            DisassemblyRow {
                addr,
                words: (0..len).map(|i| state.read(addr.wrapping_add(i))).collect(),
                text: operation.to_string(),
                is_illegal: false,
            }
        }
        Err(_) => DisassemblyRow {
            addr,
            words: vec![word],
            text: format!("DAT {word:#06x}"),
            is_illegal: true,
        },
    }
}

/// Disassembles `count` consecutive instructions starting at `addr`.
#[must_use]
pub fn disassemble<S: State>(state: &S, addr: Word, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut pc = addr;
    for _ in 0..count {
        let row = disassemble_one(state, pc);
        #[allow(clippy::cast_possible_truncation)]
        let len = row.len_words() as Word;
        pc = pc.wrapping_add(len);
        rows.push(row);
    }
    rows
}
