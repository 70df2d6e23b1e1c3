use std::path::Path;
use std::sync::Arc;

use crate::fault::{Fault, MapError};
use crate::memory::{load_image, load_image_file, Word};
use crate::peripherals::{Display, Keyboard, DISPLAY_DEFAULT_BASE, KEYBOARD_DEFAULT_BASE};
use crate::state::State;

/// Default number of retired instructions between history snapshots.
pub const DEFAULT_HISTORY_INTERVAL: u64 = 1000;

/// Boot-time configuration for a machine and its engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Base address of the keyboard ring buffer.
    pub keyboard_base: Word,
    /// Base address of video memory.
    pub display_base: Word,
    /// Whether [`boot`] maps the keyboard and display.
    pub map_devices: bool,
    /// Stack pointer at boot; 0 makes the first push land at `0xffff`.
    pub initial_sp: Word,
    /// Snapshots retained by the engine; 0 disables history.
    pub history_capacity: usize,
    /// Retired instructions between history snapshots.
    pub history_interval: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            keyboard_base: KEYBOARD_DEFAULT_BASE,
            display_base: DISPLAY_DEFAULT_BASE,
            map_devices: true,
            initial_sp: 0,
            history_capacity: 0,
            history_interval: DEFAULT_HISTORY_INTERVAL,
        }
    }
}

impl CoreConfig {
    /// Configuration for a bare machine: no devices, no history.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            map_devices: false,
            ..Self::default()
        }
    }
}

/// Builds a machine of realization `S`, loads `image` at address 0 and maps
/// the configured devices.
///
/// # Errors
///
/// Returns [`MapError`] when the configured device ranges overlap or do not
/// fit the address space.
pub fn boot<S: State + Default>(config: &CoreConfig, image: &[Word]) -> Result<S, MapError> {
    let mut state = S::default();
    state.load_words(image);
    state.set_sp(config.initial_sp);
    if config.map_devices {
        state.map_device(Arc::new(Display::new(config.display_base)))?;
        state.map_device(Arc::new(Keyboard::new(config.keyboard_base)))?;
    }
    tracing::debug!(
        image_words = image.len(),
        devices = state.address_map().len(),
        "machine booted"
    );
    Ok(state)
}

/// [`boot`] from raw big-endian image bytes.
///
/// # Errors
///
/// Returns [`Fault::Load`] for an oversized image and
/// [`Fault::Configuration`] for a mapping failure.
pub fn boot_from_bytes<S: State + Default>(config: &CoreConfig, bytes: &[u8]) -> Result<S, Fault> {
    let words = load_image(bytes)?;
    Ok(boot(config, &words)?)
}

/// [`boot`] from an image file.
///
/// # Errors
///
/// Returns [`Fault::Load`] when the file cannot be read or is oversized and
/// [`Fault::Configuration`] for a mapping failure.
pub fn boot_from_file<S: State + Default>(
    config: &CoreConfig,
    path: impl AsRef<Path>,
) -> Result<S, Fault> {
    let words = load_image_file(path)?;
    Ok(boot(config, &words)?)
}

#[cfg(test)]
mod tests {
    use super::{boot, boot_from_bytes, boot_from_file, CoreConfig};
    use crate::fault::{Fault, FaultClass, MapError};
    use crate::peripherals::{DISPLAY_ID, KEYBOARD_ID};
    use crate::state::{MutableState, PersistentState, State};

    #[test]
    fn default_config_maps_both_exemplars() {
        let state: PersistentState = boot(&CoreConfig::default(), &[0x7C02, 0x002A]).expect("boots");
        assert_eq!(state.address_map().lookup(0x8000), Some(DISPLAY_ID));
        assert_eq!(state.address_map().lookup(0x9010), Some(KEYBOARD_ID));
        assert_eq!(state.read(1), 0x002A);
        assert_eq!(state.sp(), 0);
    }

    #[test]
    fn bare_config_maps_nothing() {
        let state: MutableState = boot(&CoreConfig::bare(), &[]).expect("boots");
        assert!(state.address_map().is_empty());
    }

    #[test]
    fn overlapping_device_bases_fail_at_boot() {
        let config = CoreConfig {
            keyboard_base: 0x8100,
            ..CoreConfig::default()
        };
        let result: Result<MutableState, _> = boot(&config, &[]);
        assert!(matches!(result, Err(MapError::Overlap { .. })));
    }

    #[test]
    fn keyboard_at_top_of_memory_is_rejected() {
        let config = CoreConfig {
            keyboard_base: 0xFFF8,
            ..CoreConfig::default()
        };
        let result: Result<MutableState, _> = boot(&config, &[]);
        assert!(matches!(result, Err(MapError::InvertedRange { .. })));
    }

    #[test]
    fn boot_from_bytes_decodes_big_endian() {
        let state: MutableState =
            boot_from_bytes(&CoreConfig::bare(), &[0x7C, 0x02, 0x00, 0x2A, 0xFF]).expect("boots");
        assert_eq!(state.read(0), 0x7C02);
        assert_eq!(state.read(1), 0x002A);
        assert_eq!(state.read(2), 0);
    }

    #[test]
    fn missing_image_file_is_a_load_fault() {
        let result: Result<MutableState, Fault> =
            boot_from_file(&CoreConfig::bare(), "/nonexistent/dcpu/image.bin");
        let err = result.expect_err("file does not exist");
        assert_eq!(err.class(), FaultClass::Load);
    }
}
