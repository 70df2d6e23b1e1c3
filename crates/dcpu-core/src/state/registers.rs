use std::fmt;

use crate::memory::Word;

/// Number of general-purpose registers (`A`..`J`).
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// Total register count: general registers plus `PC`, `SP` and `O`.
pub const REGISTER_COUNT: usize = 11;

/// Architecturally visible register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    A = 0,
    B = 1,
    C = 2,
    X = 3,
    Y = 4,
    Z = 5,
    I = 6,
    J = 7,
    /// Program counter.
    PC = 8,
    /// Stack pointer.
    SP = 9,
    /// Overflow register.
    O = 10,
}

impl Register {
    /// Every register in index order.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::A,
        Self::B,
        Self::C,
        Self::X,
        Self::Y,
        Self::Z,
        Self::I,
        Self::J,
        Self::PC,
        Self::SP,
        Self::O,
    ];

    /// General-purpose registers in operand-encoding order.
    pub const GENERAL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::A,
        Self::B,
        Self::C,
        Self::X,
        Self::Y,
        Self::Z,
        Self::I,
        Self::J,
    ];

    /// Returns the storage index for this register (`0..=10`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes the 3-bit register field of an operand code.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::X),
            4 => Some(Self::Y),
            5 => Some(Self::Z),
            6 => Some(Self::I),
            7 => Some(Self::J),
            _ => None,
        }
    }

    /// Assembly name of the register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::I => "I",
            Self::J => "J",
            Self::PC => "PC",
            Self::SP => "SP",
            Self::O => "O",
        }
    }

    /// Returns `true` for `A`..`J`.
    #[must_use]
    pub const fn is_general(self) -> bool {
        self.index() < GENERAL_REGISTER_COUNT
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plain register storage used by the mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    words: [Word; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a register.
    #[must_use]
    pub const fn get(&self, reg: Register) -> Word {
        self.words[reg.index()]
    }

    /// Writes a register.
    pub const fn set(&mut self, reg: Register, value: Word) {
        self.words[reg.index()] = value;
    }

    /// Raw register words in index order.
    #[must_use]
    pub const fn as_words(&self) -> &[Word; REGISTER_COUNT] {
        &self.words
    }
}
