//! Access to the keymap's layer state
use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;

use crate::RawMutex;

/// The keymap's layer activation, as seen by the trackball
pub trait LayerControl {
    /// The highest active layer, the default layer when no other layer is active
    fn highest_active_layer(&self) -> u8;
    fn is_layer_active(&self, layer: u8) -> bool;
    fn activate_layer(&self, layer: u8);
    fn deactivate_layer(&self, layer: u8);
}

/// Bitmask of up to 32 active layers, layer 0 is the default layer
pub struct LayerState {
    mask: Mutex<RawMutex, Cell<u32>>,
}

impl Default for LayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerState {
    pub const fn new() -> Self {
        Self {
            mask: Mutex::new(Cell::new(0)),
        }
    }

    fn update(&self, f: impl FnOnce(u32) -> u32) {
        self.mask.lock(|mask| mask.set(f(mask.get())));
    }
}

impl LayerControl for LayerState {
    fn highest_active_layer(&self) -> u8 {
        let mask = self.mask.lock(|mask| mask.get());
        if mask == 0 { 0 } else { (31 - mask.leading_zeros()) as u8 }
    }

    fn is_layer_active(&self, layer: u8) -> bool {
        layer < 32 && self.mask.lock(|mask| mask.get() & (1 << layer) != 0)
    }

    fn activate_layer(&self, layer: u8) {
        if layer >= 32 {
            warn!("Layer {} out of range", layer);
            return;
        }
        self.update(|mask| mask | (1 << layer));
    }

    fn deactivate_layer(&self, layer: u8) {
        if layer >= 32 {
            return;
        }
        self.update(|mask| mask & !(1 << layer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_layer() {
        let layers = LayerState::new();
        assert_eq!(layers.highest_active_layer(), 0);

        layers.activate_layer(2);
        layers.activate_layer(5);
        assert_eq!(layers.highest_active_layer(), 5);
        assert!(layers.is_layer_active(2));

        layers.deactivate_layer(5);
        assert_eq!(layers.highest_active_layer(), 2);
        assert!(!layers.is_layer_active(5));

        layers.activate_layer(31);
        assert_eq!(layers.highest_active_layer(), 31);
    }

    #[test]
    fn test_out_of_range_layer() {
        let layers = LayerState::new();
        layers.activate_layer(40);
        assert_eq!(layers.highest_active_layer(), 0);
        assert!(!layers.is_layer_active(40));
    }
}
