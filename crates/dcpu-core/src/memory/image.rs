//! Flat big-endian binary image loading.

use std::path::Path;

use crate::fault::ImageError;
use crate::memory::{Word, ADDRESS_SPACE_WORDS};

/// Decodes a flat big-endian stream of 16-bit words destined for address 0.
///
/// A trailing odd byte is ignored.
///
/// # Errors
///
/// Returns [`ImageError::TooLarge`] when the image holds more words than the
/// address space.
pub fn load_image(bytes: &[u8]) -> Result<Vec<Word>, ImageError> {
    let words = bytes.len() / 2;
    if words > ADDRESS_SPACE_WORDS {
        return Err(ImageError::TooLarge {
            words,
            capacity: ADDRESS_SPACE_WORDS,
        });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| Word::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Reads and decodes an image file. See [`load_image`].
///
/// # Errors
///
/// Returns [`ImageError::Io`] when the file cannot be read and
/// [`ImageError::TooLarge`] when it does not fit the address space.
pub fn load_image_file(path: impl AsRef<Path>) -> Result<Vec<Word>, ImageError> {
    let bytes = std::fs::read(path)?;
    load_image(&bytes)
}
