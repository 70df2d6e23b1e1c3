//! Behavioural properties of the instruction set, checked on both state
//! realizations.

#![allow(clippy::pedantic, clippy::nursery)]

use dcpu_core::{
    boot_from_bytes, encode_basic, step, AddressRangeTable, BasicOpcode, CoreConfig, DeviceId,
    MapError, MutableState, NonBasicOpcode, Operand, Operation, PersistentSequence,
    PersistentState, Register, State, StepOutcome,
};
use proptest::prelude::*;
use rstest::rstest;

use crossbeam_channel as _;
use parking_lot as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn basic(op: BasicOpcode, a: Operand, b: Operand) -> Operation {
    Operation::Basic { op, a, b }
}

fn reg(r: Register) -> Operand {
    Operand::Register(r)
}

fn set_literal_lands_in_every_register<S: State + Default>() {
    for r in Register::ALL {
        for v in 0..=31 {
            let mut state = S::default();
            basic(BasicOpcode::Set, reg(r), Operand::Literal(v)).apply(&mut state);
            assert_eq!(state.register(r), v, "SET {r}, {v}");
        }
    }
}

fn add_overflow<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 0xFFFE);
    basic(BasicOpcode::Add, reg(Register::A), Operand::Literal(5)).apply(&mut state);
    assert_eq!(state.register(Register::A), 0x0003);
    assert_eq!(state.overflow(), 1);
}

fn sub_underflow<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 3);
    basic(BasicOpcode::Sub, reg(Register::A), Operand::Literal(5)).apply(&mut state);
    assert_eq!(state.register(Register::A), 0xFFFE);
    assert_eq!(state.overflow(), 0xFFFF);
}

fn mul_high_word<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 0x345);
    state.set_register(Register::B, 0x678);
    basic(BasicOpcode::Mul, reg(Register::A), reg(Register::B)).apply(&mut state);
    assert_eq!(state.register(Register::A), 0x2658);
    assert_eq!(state.overflow(), 0x15);
}

fn div_by_zero<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 1);
    state.set_overflow(0x1234);
    basic(BasicOpcode::Div, reg(Register::A), Operand::Literal(0)).apply(&mut state);
    assert_eq!(state.register(Register::A), 0);
    assert_eq!(state.overflow(), 0);
}

fn div_fraction<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 3);
    state.set_register(Register::B, 2);
    basic(BasicOpcode::Div, reg(Register::A), reg(Register::B)).apply(&mut state);
    assert_eq!(state.register(Register::A), 1);
    assert_eq!(state.overflow(), 0x8000);
}

fn shl_overflow<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 0x5201);
    basic(BasicOpcode::Shl, reg(Register::A), Operand::Literal(4)).apply(&mut state);
    assert_eq!(state.register(Register::A), 0x2010);
    assert_eq!(state.overflow(), 0x5);
}

fn ife_skips_the_next_instruction<S: State + Default>() {
    let mut state = S::default();
    state.set_register(Register::A, 1);
    state.set_register(Register::B, 2);
    state.load_words(&[0x7C02, 0x002A]);

    basic(BasicOpcode::Ife, reg(Register::A), reg(Register::B)).apply(&mut state);

    assert_eq!(state.pc(), 2);
    assert_eq!(state.register(Register::A), 1);
}

fn jsr_pushes_return_address<S: State + Default>() {
    let mut state = S::default();
    state.set_pc(5);
    state.set_sp(0xFFFF);
    state.set_register(Register::A, 0x10);

    Operation::NonBasic {
        op: NonBasicOpcode::Jsr,
        a: reg(Register::A),
    }
    .apply(&mut state);

    assert_eq!(state.pc(), 0x10);
    assert_eq!(state.sp(), 0xFFFE);
    assert_eq!(state.read(0xFFFE), 5);
}

fn image_end_to_end<S: State + Default>() {
    let mut state: S =
        boot_from_bytes(&CoreConfig::bare(), &[0x7C, 0x02, 0x00, 0x2A]).expect("image fits");

    let outcome = step(&mut state);

    assert!(matches!(outcome, StepOutcome::Retired { pc: 0, .. }));
    assert_eq!(state.register(Register::A), 42);
    assert_eq!(state.pc(), 2);
}

fn subroutine_round_trip<S: State + Default>() {
    // SET A, 0x10 ; JSR sub ; SET B, A ; <halt: SUB PC, 1>
    // sub: ADD A, 0x1F ; SET PC, POP
    let program = [
        encode_basic(BasicOpcode::Set, 0x00, 0x30),
        dcpu_core::encode_non_basic(NonBasicOpcode::Jsr, 0x1F),
        0x0006,
        encode_basic(BasicOpcode::Set, 0x01, 0x00),
        encode_basic(BasicOpcode::Sub, 0x1C, 0x21),
        0x0000,
        encode_basic(BasicOpcode::Add, 0x00, 0x3F),
        encode_basic(BasicOpcode::Set, 0x1C, 0x18),
    ];
    let mut state = S::default();
    state.load_words(&program);

    for _ in 0..6 {
        assert!(step(&mut state).fault().is_none());
    }

    assert_eq!(state.register(Register::A), 0x10 + 31);
    assert_eq!(state.register(Register::B), 0x10 + 31);
    assert_eq!(state.sp(), 0, "stack balanced after return");
    assert_eq!(state.pc(), 4, "parked on the halt loop");
}

#[rstest]
#[case::set_mutable(set_literal_lands_in_every_register::<MutableState> as fn())]
#[case::set_persistent(set_literal_lands_in_every_register::<PersistentState> as fn())]
#[case::add_mutable(add_overflow::<MutableState> as fn())]
#[case::add_persistent(add_overflow::<PersistentState> as fn())]
#[case::sub_mutable(sub_underflow::<MutableState> as fn())]
#[case::sub_persistent(sub_underflow::<PersistentState> as fn())]
#[case::mul_mutable(mul_high_word::<MutableState> as fn())]
#[case::mul_persistent(mul_high_word::<PersistentState> as fn())]
#[case::div_zero_mutable(div_by_zero::<MutableState> as fn())]
#[case::div_zero_persistent(div_by_zero::<PersistentState> as fn())]
#[case::div_mutable(div_fraction::<MutableState> as fn())]
#[case::div_persistent(div_fraction::<PersistentState> as fn())]
#[case::shl_mutable(shl_overflow::<MutableState> as fn())]
#[case::shl_persistent(shl_overflow::<PersistentState> as fn())]
#[case::ife_mutable(ife_skips_the_next_instruction::<MutableState> as fn())]
#[case::ife_persistent(ife_skips_the_next_instruction::<PersistentState> as fn())]
#[case::jsr_mutable(jsr_pushes_return_address::<MutableState> as fn())]
#[case::jsr_persistent(jsr_pushes_return_address::<PersistentState> as fn())]
#[case::image_mutable(image_end_to_end::<MutableState> as fn())]
#[case::image_persistent(image_end_to_end::<PersistentState> as fn())]
#[case::subroutine_mutable(subroutine_round_trip::<MutableState> as fn())]
#[case::subroutine_persistent(subroutine_round_trip::<PersistentState> as fn())]
fn instruction_set_behaviour(#[case] check: fn()) {
    check();
}

#[test]
fn overlapping_map_leaves_lookups_unchanged() {
    let mut table = AddressRangeTable::new();
    table
        .map(0x8000, 0x817F, DeviceId::new("display"))
        .expect("first mapping");
    let before: Vec<Option<DeviceId>> = (0..=u16::MAX).map(|addr| table.lookup(addr)).collect();

    let result = table.map(0x8100, 0x8200, DeviceId::new("other"));

    assert!(matches!(result, Err(MapError::Overlap { .. })));
    let after: Vec<Option<DeviceId>> = (0..=u16::MAX).map(|addr| table.lookup(addr)).collect();
    assert_eq!(before, after);
}

#[test]
fn both_realizations_agree_on_a_program() {
    let program = [
        encode_basic(BasicOpcode::Set, 0x00, 0x1F),
        0xFFF0,
        encode_basic(BasicOpcode::Add, 0x00, 0x3F),
        encode_basic(BasicOpcode::Set, 0x1A, 0x00),
        encode_basic(BasicOpcode::Mul, 0x00, 0x19),
        encode_basic(BasicOpcode::Shr, 0x00, 0x23),
        encode_basic(BasicOpcode::Ifg, 0x00, 0x21),
        encode_basic(BasicOpcode::Xor, 0x00, 0x1F),
        0x5555,
    ];
    let mut mutable = MutableState::new();
    let mut persistent = PersistentState::new();
    mutable.load_words(&program);
    persistent.load_words(&program);

    for _ in 0..7 {
        assert_eq!(step(&mut mutable), step(&mut persistent));
        for r in Register::ALL {
            assert_eq!(mutable.register(r), persistent.register(r), "{r}");
        }
    }
    assert_eq!(mutable.read(0xFFFF), persistent.read(0xFFFF));
}

proptest! {
    #[test]
    fn sequence_set_leaves_original_untouched(
        values in prop::collection::vec(any::<u16>(), 1..128),
        index in any::<prop::sample::Index>(),
        value in any::<u16>(),
    ) {
        let i = index.index(values.len());
        let s1 = PersistentSequence::from_slice(&values);
        let s2 = s1.set(i, value).expect("index in bounds");
        prop_assert_eq!(*s2.get(i).expect("in bounds"), value);
        prop_assert_eq!(*s1.get(i).expect("in bounds"), values[i]);
    }

    #[test]
    fn sequence_disjoint_updates_commute(
        len in 2_usize..128,
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
        x in any::<u16>(),
        y in any::<u16>(),
    ) {
        let i = a.index(len);
        let j = b.index(len);
        prop_assume!(i != j);
        let base = PersistentSequence::<u16>::new(len);
        let ij = base.set(i, x).and_then(|s| s.set(j, y)).expect("in bounds");
        let ji = base.set(j, y).and_then(|s| s.set(i, x)).expect("in bounds");
        prop_assert_eq!(ij.to_vec(), ji.to_vec());
        prop_assert_eq!(ij, ji);
    }
}
