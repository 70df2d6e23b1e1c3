//! 16-bit arithmetic with overflow-register results.
//!
//! Each function returns `(value, overflow)` where `overflow` is the word
//! written to `O`.

use crate::memory::Word;

#[allow(clippy::cast_possible_truncation)]
const fn low(wide: u32) -> Word {
    wide as Word
}

#[allow(clippy::cast_possible_truncation)]
const fn high(wide: u32) -> Word {
    (wide >> 16) as Word
}

/// `a + b`; `O` receives the carry.
#[must_use]
pub const fn add(a: Word, b: Word) -> (Word, Word) {
    let sum = a as u32 + b as u32;
    (low(sum), high(sum))
}

/// `a - b`; `O` receives the high half of the signed difference, `0xffff`
/// on borrow.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn sub(a: Word, b: Word) -> (Word, Word) {
    let diff = a as i32 - b as i32;
    (low(diff as u32), high(diff as u32))
}

/// `a * b`; `O` receives the high half of the 32-bit product.
#[must_use]
pub const fn mul(a: Word, b: Word) -> (Word, Word) {
    let product = a as u32 * b as u32;
    (low(product), high(product))
}

/// `a / b`; `O` receives the fractional part `(a << 16) / b`.
/// Division by zero yields `(0, 0)`.
#[must_use]
pub const fn div(a: Word, b: Word) -> (Word, Word) {
    if b == 0 {
        return (0, 0);
    }
    (a / b, low(((a as u32) << 16) / b as u32))
}

/// `a % b`; modulo by zero yields 0.
#[must_use]
pub const fn modulo(a: Word, b: Word) -> Word {
    if b == 0 {
        0
    } else {
        a % b
    }
}

/// `a << (b % 16)`; `O` receives the bits shifted out.
///
/// A shift of 0 computes the overflow as `a >> 16`, which is 0.
#[must_use]
pub const fn shl(a: Word, b: Word) -> (Word, Word) {
    let shift = (b % 16) as u32;
    let wide = a as u32;
    (low(wide << shift), low(wide >> (16 - shift)))
}

/// `a >> (b % 16)`; `O` receives the bits shifted out, unshifted.
#[must_use]
pub const fn shr(a: Word, b: Word) -> (Word, Word) {
    let shift = (b % 16) as u32;
    let mask = (1_u32 << shift) - 1;
    (a >> shift, low(a as u32 & mask))
}
