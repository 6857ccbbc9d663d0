//! Decoding of the motion burst frame and the pointer transforms
use crate::config::{Orientation, Pmw3610Config};
use crate::mode::InputMode;
use crate::registers::{BURST_DELTA_X_L, BURST_DELTA_XY_H, BURST_DELTA_Y_L, BURST_SHUTTER_HI, BURST_SHUTTER_LO};

/// Sign-extend a 12-bit two's complement value
pub const fn sign_extend_12(raw: u16) -> i16 {
    ((raw << 4) as i16) >> 4
}

/// Decode the 12-bit X and Y deltas from the low bytes and the shared high byte.
///
/// The high nibble of `xy_high` holds bits 8..12 of X, the low nibble those of Y.
pub const fn decode_delta(x_low: u8, y_low: u8, xy_high: u8) -> (i16, i16) {
    let x = x_low as u16 | ((xy_high as u16 & 0xf0) << 4);
    let y = y_low as u16 | ((xy_high as u16 & 0x0f) << 8);
    (sign_extend_12(x), sign_extend_12(y))
}

/// Raw deltas and shutter of one burst frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionFrame {
    pub dx: i16,
    pub dy: i16,
    pub shutter: u16,
}

impl MotionFrame {
    pub fn parse(frame: &[u8]) -> Self {
        let (dx, dy) = decode_delta(frame[BURST_DELTA_X_L], frame[BURST_DELTA_Y_L], frame[BURST_DELTA_XY_H]);
        // Shutter is 9 bits wide
        let shutter = ((frame[BURST_SHUTTER_HI] as u16 & 0x01) << 8) | frame[BURST_SHUTTER_LO] as u16;
        Self { dx, dy, shutter }
    }
}

/// Speed-dependent multiplier, keyed by |x| + |y| of a sample
pub fn adaptive_multiplier(magnitude: u16) -> f32 {
    match magnitude {
        m if m > 60 => 3.0,
        m if m > 30 => 1.5,
        m if m > 5 => 1.0,
        m if m > 4 => 0.9,
        m if m > 3 => 0.7,
        m if m > 2 => 0.5,
        m if m > 1 => 0.1,
        _ => 1.0,
    }
}

/// Rotate the deltas by the sensor's mounting orientation
pub fn rotate(x: i16, y: i16, orientation: Orientation) -> (i16, i16) {
    match orientation {
        Orientation::Deg0 => (-x, y),
        Orientation::Deg90 => (y, -x),
        Orientation::Deg180 => (x, -y),
        Orientation::Deg270 => (-y, x),
    }
}

/// Apply the divisor, adaptive speed, orientation and inversion of a mode to the raw deltas
pub fn transform(dx: i16, dy: i16, mode: InputMode, config: &Pmw3610Config) -> (i16, i16) {
    let divisor = match mode {
        InputMode::Move => config.move_divisor.max(1),
        InputMode::Snipe => config.snipe_divisor.max(1),
        InputMode::Scroll | InputMode::BallAction(_) => 1,
    };
    let (mut x, mut y) = (dx / divisor, dy / divisor);

    if config.adaptive_speed {
        let multiplier = adaptive_multiplier(x.unsigned_abs().saturating_add(y.unsigned_abs()));
        x = (x as f32 * multiplier) as i16;
        y = (y as f32 * multiplier) as i16;
    }

    let (mut x, mut y) = rotate(x, y, config.orientation);
    if config.invert_x {
        x = -x;
    }
    if config.invert_y {
        y = -y;
    }
    (x, y)
}
