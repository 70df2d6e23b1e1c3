use std::fmt;

use crate::memory::Word;

/// Primary (two-operand) opcodes, assigned from the 4-bit `o` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum BasicOpcode {
    Set = 0x1,
    Add = 0x2,
    Sub = 0x3,
    Mul = 0x4,
    Div = 0x5,
    Mod = 0x6,
    Shl = 0x7,
    Shr = 0x8,
    And = 0x9,
    Bor = 0xA,
    Xor = 0xB,
    Ife = 0xC,
    Ifn = 0xD,
    Ifg = 0xE,
    Ifb = 0xF,
}

impl BasicOpcode {
    /// Every assigned primary opcode in encoding order.
    pub const ALL: [Self; 15] = [
        Self::Set,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Shl,
        Self::Shr,
        Self::And,
        Self::Bor,
        Self::Xor,
        Self::Ife,
        Self::Ifn,
        Self::Ifg,
        Self::Ifb,
    ];

    /// Converts a 4-bit opcode field. `0x0` selects the non-basic family and
    /// is therefore not a basic opcode.
    #[must_use]
    pub const fn from_u4(op: u8) -> Option<Self> {
        match op {
            0x1 => Some(Self::Set),
            0x2 => Some(Self::Add),
            0x3 => Some(Self::Sub),
            0x4 => Some(Self::Mul),
            0x5 => Some(Self::Div),
            0x6 => Some(Self::Mod),
            0x7 => Some(Self::Shl),
            0x8 => Some(Self::Shr),
            0x9 => Some(Self::And),
            0xA => Some(Self::Bor),
            0xB => Some(Self::Xor),
            0xC => Some(Self::Ife),
            0xD => Some(Self::Ifn),
            0xE => Some(Self::Ifg),
            0xF => Some(Self::Ifb),
            _ => None,
        }
    }

    /// Raw opcode field value.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
            Self::And => "AND",
            Self::Bor => "BOR",
            Self::Xor => "XOR",
            Self::Ife => "IFE",
            Self::Ifn => "IFN",
            Self::Ifg => "IFG",
            Self::Ifb => "IFB",
        }
    }

    /// Conditional-skip opcodes (`IFE`, `IFN`, `IFG`, `IFB`).
    #[must_use]
    pub const fn is_conditional(self) -> bool {
        matches!(self, Self::Ife | Self::Ifn | Self::Ifg | Self::Ifb)
    }
}

impl fmt::Display for BasicOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Single-operand opcodes selected by the 6-bit field when `o == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum NonBasicOpcode {
    /// Jump to subroutine, pushing the return address.
    Jsr = 0x01,
}

impl NonBasicOpcode {
    /// Converts a 6-bit non-basic opcode field.
    #[must_use]
    pub const fn from_u6(op: u8) -> Option<Self> {
        match op {
            0x01 => Some(Self::Jsr),
            _ => None,
        }
    }

    /// Raw opcode field value.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Jsr => "JSR",
        }
    }
}

impl fmt::Display for NonBasicOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Raw fields of an instruction word: `bbbbbb aaaaaa oooo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordFields {
    /// Primary opcode, bits 0..=3.
    pub opcode: u8,
    /// Operand A code (or non-basic opcode when `opcode == 0`), bits 4..=9.
    pub a: u8,
    /// Operand B code (or the non-basic operand), bits 10..=15.
    pub b: u8,
}

impl WordFields {
    /// Splits an instruction word into its fields.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn split(word: Word) -> Self {
        Self {
            opcode: (word & 0x000F) as u8,
            a: ((word >> 4) & 0x003F) as u8,
            b: ((word >> 10) & 0x003F) as u8,
        }
    }

    /// Returns `true` when the word belongs to the non-basic family.
    #[must_use]
    pub const fn is_non_basic(self) -> bool {
        self.opcode == 0
    }
}

/// Assembles a basic instruction word from its opcode and operand codes.
#[must_use]
pub const fn encode_basic(op: BasicOpcode, a: u8, b: u8) -> Word {
    (op.code() as Word) | (((a & 0x3F) as Word) << 4) | (((b & 0x3F) as Word) << 10)
}

/// Assembles a non-basic instruction word from its opcode and operand code.
#[must_use]
pub const fn encode_non_basic(op: NonBasicOpcode, a: u8) -> Word {
    (((op.code() & 0x3F) as Word) << 4) | (((a & 0x3F) as Word) << 10)
}
