//! Operation semantics and the fetch/decode/apply pipeline.
//!
//! One step is: fetch the word at PC, decode it (resolving operand A, then
//! B, with their PC/SP side effects), store the advanced PC/SP, then apply
//! the operation. A decode fault leaves the state untouched.

/// Arithmetic primitives with overflow-register results.
pub mod arith;

use std::fmt;

use crate::decoder::Decoder;
use crate::encoding::{BasicOpcode, NonBasicOpcode};
use crate::fault::DecodeError;
use crate::memory::Word;
use crate::operand::{Cursor, Operand};
use crate::state::State;

/// A decoded instruction with resolved operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Two-operand operation; `a` is the destination.
    Basic {
        /// Opcode.
        op: BasicOpcode,
        /// Destination (and first source).
        a: Operand,
        /// Second source.
        b: Operand,
    },
    /// Single-operand operation.
    NonBasic {
        /// Opcode.
        op: NonBasicOpcode,
        /// Operand.
        a: Operand,
    },
}

impl Operation {
    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Basic { op, .. } => op.mnemonic(),
            Self::NonBasic { op, .. } => op.mnemonic(),
        }
    }

    /// Applies the operation to `state`.
    ///
    /// Operand side effects on PC/SP must already be stored in `state`.
    pub fn apply<S: State>(&self, state: &mut S) {
        match *self {
            Self::Basic { op, a, b } => apply_basic(op, a, b, state),
            Self::NonBasic {
                op: NonBasicOpcode::Jsr,
                a,
            } => {
                let target = a.get(state);
                let sp = state.sp().wrapping_sub(1);
                state.set_sp(sp);
                let pc = state.pc();
                state.write(sp, pc);
                state.set_pc(target);
            }
        }
    }

    /// Returns a copy of `state` with the operation applied.
    ///
    /// For [`crate::PersistentState`] this is an O(log n) new version that
    /// leaves `state` valid.
    #[must_use]
    pub fn applied<S: State>(&self, state: &S) -> S {
        let mut next = state.clone();
        self.apply(&mut next);
        next
    }
}

fn apply_basic<S: State>(op: BasicOpcode, a: Operand, b: Operand, state: &mut S) {
    let x = a.get(state);
    let y = b.get(state);

    let with_overflow = |state: &mut S, (value, overflow): (Word, Word)| {
        a.set(state, value);
        state.set_overflow(overflow);
    };

    match op {
        BasicOpcode::Set => a.set(state, y),
        BasicOpcode::Add => with_overflow(state, arith::add(x, y)),
        BasicOpcode::Sub => with_overflow(state, arith::sub(x, y)),
        BasicOpcode::Mul => with_overflow(state, arith::mul(x, y)),
        BasicOpcode::Div => with_overflow(state, arith::div(x, y)),
        BasicOpcode::Mod => a.set(state, arith::modulo(x, y)),
        BasicOpcode::Shl => with_overflow(state, arith::shl(x, y)),
        BasicOpcode::Shr => with_overflow(state, arith::shr(x, y)),
        BasicOpcode::And => a.set(state, x & y),
        BasicOpcode::Bor => a.set(state, x | y),
        BasicOpcode::Xor => a.set(state, x ^ y),
        BasicOpcode::Ife => skip_unless(x == y, state),
        BasicOpcode::Ifn => skip_unless(x != y, state),
        BasicOpcode::Ifg => skip_unless(x > y, state),
        BasicOpcode::Ifb => skip_unless((x & y) != 0, state),
    }
}

// The skipped instruction is measured, never executed, so its stack modes
// do not move SP.
fn skip_unless<S: State>(passes: bool, state: &mut S) {
    if passes {
        return;
    }
    let pc = state.pc();
    let len = Decoder::instruction_length(state.read(pc));
    state.set_pc(pc.wrapping_add(len));
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { op, a, b } => write!(f, "{op} {a}, {b}"),
            Self::NonBasic { op, a } => write!(f, "{op} {a}"),
        }
    }
}

/// Result of one [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The instruction at `pc` was applied.
    Retired {
        /// Address of the instruction word.
        pc: Word,
        /// Operation that was applied.
        operation: Operation,
    },
    /// The word at `pc` could not be decoded; the state is unchanged.
    Fault {
        /// Address of the undecodable word.
        pc: Word,
        /// Decode failure.
        cause: DecodeError,
    },
}

impl StepOutcome {
    /// Returns the decode fault, if the step faulted.
    #[must_use]
    pub const fn fault(&self) -> Option<DecodeError> {
        match self {
            Self::Fault { cause, .. } => Some(*cause),
            Self::Retired { .. } => None,
        }
    }
}

/// Fetches and decodes the instruction at PC without modifying `state`.
///
/// Returns the operation together with the cursor holding PC/SP as they
/// stand after the fetch and operand resolution.
///
/// # Errors
///
/// Propagates [`DecodeError`] from [`Decoder::decode`].
pub fn fetch_decode<S: State>(state: &S) -> Result<(Operation, Cursor), DecodeError> {
    let mut cursor = Cursor::of(state);
    let word = cursor.next_word(state);
    let operation = Decoder::decode(word, state, &mut cursor)?;
    Ok((operation, cursor))
}

/// Executes exactly one instruction.
pub fn step<S: State>(state: &mut S) -> StepOutcome {
    let pc = state.pc();
    match fetch_decode(state) {
        Ok((operation, cursor)) => {
            cursor.commit(state);
            operation.apply(state);
            StepOutcome::Retired { pc, operation }
        }
        Err(cause) => StepOutcome::Fault { pc, cause },
    }
}
