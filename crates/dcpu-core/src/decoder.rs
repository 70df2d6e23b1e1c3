use crate::encoding::{BasicOpcode, NonBasicOpcode, WordFields};
use crate::execute::Operation;
use crate::fault::DecodeError;
use crate::memory::Word;
use crate::operand::{resolve, AddressingMode, Cursor};
use crate::state::State;

/// Instruction decoder.
///
/// Splits an instruction word into its fields and resolves the operands in
/// order (A, then B) against a [`Cursor`], so trailing words and stack moves
/// are accounted for before the operation is applied.
pub struct Decoder;

impl Decoder {
    /// Decodes `word`, whose own fetch has already advanced `cursor.pc`.
    ///
    /// `cursor` is advanced only when decoding succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownNonBasicOpcode`] for unassigned
    /// non-basic opcodes, [`DecodeError::UnknownOpcode`] for unassigned
    /// primary opcodes and [`DecodeError::InvalidOperand`] for operand codes
    /// outside the 6-bit range.
    pub fn decode<S: State>(
        word: Word,
        state: &S,
        cursor: &mut Cursor,
    ) -> Result<Operation, DecodeError> {
        let fields = WordFields::split(word);
        let mut next = *cursor;

        let operation = if fields.is_non_basic() {
            let op = NonBasicOpcode::from_u6(fields.a)
                .ok_or(DecodeError::UnknownNonBasicOpcode(fields.a))?;
            let a = resolve(fields.b, state, &mut next)?;
            Operation::NonBasic { op, a }
        } else {
            let op = BasicOpcode::from_u4(fields.opcode)
                .ok_or(DecodeError::UnknownOpcode(fields.opcode))?;
            let a = resolve(fields.a, state, &mut next)?;
            let b = resolve(fields.b, state, &mut next)?;
            Operation::Basic { op, a, b }
        };

        *cursor = next;
        Ok(operation)
    }

    /// Total length in words of the instruction starting with `word`.
    ///
    /// Only operand fields are inspected, so the length is defined even for
    /// words whose opcode is unassigned. Used when a conditional skips the
    /// next instruction without executing it.
    #[must_use]
    pub const fn instruction_length(word: Word) -> Word {
        let fields = WordFields::split(word);
        let b = trailing_words(fields.b);
        if fields.is_non_basic() {
            1 + b
        } else {
            1 + trailing_words(fields.a) + b
        }
    }
}

const fn trailing_words(code: u8) -> Word {
    match AddressingMode::from_code(code) {
        Some(mode) => mode.trailing_words(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Decoder;
    use crate::encoding::{encode_basic, encode_non_basic, BasicOpcode, NonBasicOpcode};
    use crate::execute::Operation;
    use crate::fault::DecodeError;
    use crate::operand::{Cursor, Operand};
    use crate::state::{MutableState, Register, State};

    #[test]
    fn set_with_next_word_literal() {
        let mut state = MutableState::new();
        state.write(0x0001, 0x0030);
        let mut cursor = Cursor::new(1, 0);

        let operation = Decoder::decode(0x7C01, &state, &mut cursor).expect("SET A, 0x30");

        assert_eq!(
            operation,
            Operation::Basic {
                op: BasicOpcode::Set,
                a: Operand::Register(Register::A),
                b: Operand::NextWordLiteral(0x0030),
            }
        );
        assert_eq!(cursor, Cursor::new(2, 0));
    }

    #[test]
    fn operand_a_is_resolved_before_b() {
        let mut state = MutableState::new();
        state.write(0x0001, 0x1111);
        state.write(0x0002, 0x2222);
        let word = encode_basic(BasicOpcode::Add, 0x1E, 0x1F);
        let mut cursor = Cursor::new(1, 0);

        let operation = Decoder::decode(word, &state, &mut cursor).expect("ADD [next], next");

        assert_eq!(
            operation,
            Operation::Basic {
                op: BasicOpcode::Add,
                a: Operand::Address(0x1111),
                b: Operand::NextWordLiteral(0x2222),
            }
        );
        assert_eq!(cursor.pc, 3);
    }

    #[test]
    fn both_stack_operands_move_sp_in_order() {
        let state = MutableState::new();
        let word = encode_basic(BasicOpcode::Set, 0x1A, 0x18);
        let mut cursor = Cursor::new(1, 0x0010);

        let operation = Decoder::decode(word, &state, &mut cursor).expect("SET PUSH, POP");

        assert_eq!(
            operation,
            Operation::Basic {
                op: BasicOpcode::Set,
                a: Operand::Push(0x000F),
                b: Operand::Pop(0x000F),
            }
        );
        assert_eq!(cursor.sp, 0x0010);
    }

    #[test]
    fn jsr_decodes_single_operand() {
        let state = MutableState::new();
        let word = encode_non_basic(NonBasicOpcode::Jsr, 0x00);
        let mut cursor = Cursor::new(1, 0);

        let operation = Decoder::decode(word, &state, &mut cursor).expect("JSR A");

        assert_eq!(
            operation,
            Operation::NonBasic {
                op: NonBasicOpcode::Jsr,
                a: Operand::Register(Register::A),
            }
        );
        assert_eq!(cursor, Cursor::new(1, 0));
    }

    #[rstest]
    #[case(0x0000, 0x00)]
    #[case(0x0020, 0x02)]
    #[case(0x7FF0, 0x3F)]
    fn unknown_non_basic_opcodes_fault_without_moving_cursor(
        #[case] word: u16,
        #[case] expected: u8,
    ) {
        let state = MutableState::new();
        let mut cursor = Cursor::new(1, 0);
        assert_eq!(
            Decoder::decode(word, &state, &mut cursor),
            Err(DecodeError::UnknownNonBasicOpcode(expected))
        );
        assert_eq!(cursor, Cursor::new(1, 0));
    }

    #[rstest]
    #[case(0x7C02, 2)]
    #[case(encode_basic(BasicOpcode::Set, 0x00, 0x01), 1)]
    #[case(encode_basic(BasicOpcode::Set, 0x10, 0x1E), 3)]
    #[case(encode_basic(BasicOpcode::Ife, 0x18, 0x1A), 1)]
    #[case(encode_non_basic(NonBasicOpcode::Jsr, 0x1F), 2)]
    #[case(encode_non_basic(NonBasicOpcode::Jsr, 0x00), 1)]
    #[case(0x7FE0, 2)]
    fn instruction_length_counts_trailing_words(#[case] word: u16, #[case] len: u16) {
        assert_eq!(Decoder::instruction_length(word), len);
    }

    #[test]
    fn every_basic_word_decodes() {
        let state = MutableState::new();
        for word in (0_u16..=u16::MAX).filter(|word| word & 0xF != 0).step_by(7) {
            let mut cursor = Cursor::of(&state);
            assert!(Decoder::decode(word, &state, &mut cursor).is_ok(), "{word:#06x}");
            assert_eq!(cursor.pc - state.pc(), Decoder::instruction_length(word) - 1);
        }
    }
}
