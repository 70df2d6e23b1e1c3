//! Word-addressed memory model, device address ranges and image loading.

/// Binary image loader.
pub mod image;
/// Address-range to device bindings.
pub mod map;

pub use image::{load_image, load_image_file};
pub use map::{AddressRangeTable, DeviceId, MappedRange};

/// Unsigned 16-bit machine word; the unit of storage and addressing.
pub type Word = u16;

/// Number of addressable words (64 Ki words).
pub const ADDRESS_SPACE_WORDS: usize = Word::MAX as usize + 1;

/// Highest valid word address.
pub const MAX_ADDRESS: Word = Word::MAX;

const _: () = assert!(ADDRESS_SPACE_WORDS == 1 << 16);

/// Allocates a canonical zeroed backing store covering the whole address space.
#[must_use]
pub fn new_address_space() -> Box<[Word]> {
    vec![0; ADDRESS_SPACE_WORDS].into_boxed_slice()
}
