//! Operand addressing modes and their resolution against a decode cursor.
//!
//! Resolution happens at decode time: modes that consume a trailing word
//! advance the cursor's PC and stack modes move its SP before any value is
//! read or written. The resulting [`Operand`] is a value source/sink that
//! [`crate::Operation::apply`] reads and writes afterwards.

use std::fmt;

use crate::fault::DecodeError;
use crate::memory::Word;
use crate::state::{Register, State};

/// First inline literal operand code.
pub const LITERAL_BASE: u8 = 0x20;

/// Highest valid operand code.
pub const MAX_OPERAND_CODE: u8 = 0x3F;

/// Decode-time view of the registers that resolution may advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Program counter; points at the next unread instruction word.
    pub pc: Word,
    /// Stack pointer.
    pub sp: Word,
}

impl Cursor {
    /// Creates a cursor at explicit `pc` and `sp` values.
    #[must_use]
    pub const fn new(pc: Word, sp: Word) -> Self {
        Self { pc, sp }
    }

    /// Captures the current PC and SP of `state`.
    #[must_use]
    pub fn of<S: State>(state: &S) -> Self {
        Self::new(state.pc(), state.sp())
    }

    /// Reads the word at PC and advances PC past it.
    pub fn next_word<S: State>(&mut self, state: &S) -> Word {
        let word = state.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        word
    }

    /// Stores PC and SP back into `state`.
    pub fn commit<S: State>(self, state: &mut S) {
        state.set_pc(self.pc);
        state.set_sp(self.sp);
    }
}

/// Addressing mode selected by a 6-bit operand code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// `0x00..=0x07`: register.
    Register(Register),
    /// `0x08..=0x0f`: `[register]`.
    RegisterIndirect(Register),
    /// `0x10..=0x17`: `[next word + register]`.
    RegisterIndirectOffset(Register),
    /// `0x18`: `[SP++]`.
    Pop,
    /// `0x19`: `[SP]`.
    Peek,
    /// `0x1a`: `[--SP]`.
    Push,
    /// `0x1b`: `SP`.
    StackPointer,
    /// `0x1c`: `PC`.
    ProgramCounter,
    /// `0x1d`: `O`.
    Overflow,
    /// `0x1e`: `[next word]`.
    NextWordIndirect,
    /// `0x1f`: next word as a literal.
    NextWordLiteral,
    /// `0x20..=0x3f`: inline literal `code - 0x20`.
    Literal(Word),
}

impl AddressingMode {
    /// Classifies an operand code; `None` outside `0x00..=0x3f`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        let Some(reg) = Register::from_u3(code & 0x07) else {
            return None;
        };
        Some(match code {
            0x00..=0x07 => Self::Register(reg),
            0x08..=0x0F => Self::RegisterIndirect(reg),
            0x10..=0x17 => Self::RegisterIndirectOffset(reg),
            0x18 => Self::Pop,
            0x19 => Self::Peek,
            0x1A => Self::Push,
            0x1B => Self::StackPointer,
            0x1C => Self::ProgramCounter,
            0x1D => Self::Overflow,
            0x1E => Self::NextWordIndirect,
            0x1F => Self::NextWordLiteral,
            0x20..=0x3F => Self::Literal((code - LITERAL_BASE) as Word),
            _ => return None,
        })
    }

    /// Number of instruction words consumed after the instruction word.
    #[must_use]
    pub const fn trailing_words(self) -> Word {
        match self {
            Self::RegisterIndirectOffset(_) | Self::NextWordIndirect | Self::NextWordLiteral => 1,
            Self::Register(_)
            | Self::RegisterIndirect(_)
            | Self::Pop
            | Self::Peek
            | Self::Push
            | Self::StackPointer
            | Self::ProgramCounter
            | Self::Overflow
            | Self::Literal(_) => 0,
        }
    }

    /// Resolves this mode into an operand, advancing `cursor` as required.
    pub fn resolve<S: State>(self, state: &S, cursor: &mut Cursor) -> Operand {
        match self {
            Self::Register(reg) => Operand::Register(reg),
            Self::RegisterIndirect(reg) => Operand::RegisterIndirect(reg),
            Self::RegisterIndirectOffset(reg) => Operand::RegisterIndirectOffset {
                reg,
                offset: cursor.next_word(state),
            },
            Self::Pop => {
                let addr = cursor.sp;
                cursor.sp = cursor.sp.wrapping_add(1);
                Operand::Pop(addr)
            }
            Self::Peek => Operand::Peek(cursor.sp),
            Self::Push => {
                cursor.sp = cursor.sp.wrapping_sub(1);
                Operand::Push(cursor.sp)
            }
            Self::StackPointer => Operand::SpecialRegister(Register::SP),
            Self::ProgramCounter => Operand::SpecialRegister(Register::PC),
            Self::Overflow => Operand::SpecialRegister(Register::O),
            Self::NextWordIndirect => Operand::Address(cursor.next_word(state)),
            Self::NextWordLiteral => Operand::NextWordLiteral(cursor.next_word(state)),
            Self::Literal(value) => Operand::Literal(value),
        }
    }
}

/// Resolves the operand `code` against `state`, advancing `cursor`.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidOperand`] for codes above `0x3f`.
pub fn resolve<S: State>(code: u8, state: &S, cursor: &mut Cursor) -> Result<Operand, DecodeError> {
    AddressingMode::from_code(code)
        .map(|mode| mode.resolve(state, cursor))
        .ok_or(DecodeError::InvalidOperand(code))
}

/// A resolved value source/sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// General-purpose register.
    Register(Register),
    /// Memory at the register's value, read when accessed.
    RegisterIndirect(Register),
    /// Memory at the register's value plus a decode-time offset.
    RegisterIndirectOffset {
        /// Base register.
        reg: Register,
        /// Offset consumed from the instruction stream.
        offset: Word,
    },
    /// Inline literal; writes are ignored.
    Literal(Word),
    /// Literal consumed from the instruction stream; writes are ignored.
    NextWordLiteral(Word),
    /// Memory at a fixed address consumed from the instruction stream.
    Address(Word),
    /// Stack slot read by `POP`; SP was already incremented past it.
    Pop(Word),
    /// Stack slot at SP.
    Peek(Word),
    /// Stack slot written by `PUSH`; SP was already decremented onto it.
    Push(Word),
    /// `SP`, `PC` or `O`.
    SpecialRegister(Register),
}

impl Operand {
    /// Memory address this operand designates, if it designates memory.
    #[must_use]
    pub fn address<S: State>(&self, state: &S) -> Option<Word> {
        match *self {
            Self::RegisterIndirect(reg) => Some(state.register(reg)),
            Self::RegisterIndirectOffset { reg, offset } => {
                Some(state.register(reg).wrapping_add(offset))
            }
            Self::Address(addr) | Self::Pop(addr) | Self::Peek(addr) | Self::Push(addr) => {
                Some(addr)
            }
            Self::Register(_)
            | Self::Literal(_)
            | Self::NextWordLiteral(_)
            | Self::SpecialRegister(_) => None,
        }
    }

    /// Reads the operand's current value.
    pub fn get<S: State>(&self, state: &S) -> Word {
        match *self {
            Self::Register(reg) | Self::SpecialRegister(reg) => state.register(reg),
            Self::Literal(value) | Self::NextWordLiteral(value) => value,
            _ => self.address(state).map_or(0, |addr| state.read(addr)),
        }
    }

    /// Writes `value` through the operand. Literals ignore the write.
    pub fn set<S: State>(&self, state: &mut S, value: Word) {
        match *self {
            Self::Register(reg) | Self::SpecialRegister(reg) => state.set_register(reg, value),
            Self::Literal(_) | Self::NextWordLiteral(_) => {}
            _ => {
                if let Some(addr) = self.address(state) {
                    state.write(addr, value);
                }
            }
        }
    }

    /// Returns `true` for operands whose writes are discarded.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_) | Self::NextWordLiteral(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register(reg) | Self::SpecialRegister(reg) => write!(f, "{reg}"),
            Self::RegisterIndirect(reg) => write!(f, "[{reg}]"),
            Self::RegisterIndirectOffset { reg, offset } => write!(f, "[{offset:#06x}+{reg}]"),
            Self::Literal(value) => write!(f, "{value:#x}"),
            Self::NextWordLiteral(value) => write!(f, "{value:#06x}"),
            Self::Address(addr) => write!(f, "[{addr:#06x}]"),
            Self::Pop(_) => f.write_str("POP"),
            Self::Peek(_) => f.write_str("PEEK"),
            Self::Push(_) => f.write_str("PUSH"),
        }
    }
}
