//! Scroll mode: axis snapping, acceleration and quantization of motion into wheel ticks
use embassy_time::{Duration, Instant};

use crate::config::{ScrollConfig, ScrollSnap};

/// Max wheel events per axis of one sample, the rest is carried to the next sample
pub const MAX_TICKS_PER_SAMPLE: i32 = 20;
/// Largest carry a single sample can add beyond the capped ticks: 12-bit deltas on both axes,
/// scaled by the top adaptive speed step
const MAX_SAMPLE_CARRY: i32 = 2 * 2048 * 3;
/// A tick remainder untouched for longer than this is dropped
pub const REMAINDER_TIMEOUT: Duration = Duration::from_millis(100);
/// Samples further apart than this aren't accelerated
const ACCELERATION_WINDOW: Duration = Duration::from_millis(100);

/// Signed number of wheel ticks of one sample, positive for a positive accumulated total
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScrollTicks {
    pub vertical: i16,
    pub horizontal: i16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollState {
    /// Motion accumulated towards the next horizontal tick
    total_x: i32,
    /// Motion accumulated towards the next vertical tick
    total_y: i32,
    snap_x: i32,
    snap_y: i32,
    last_activity: Option<Instant>,
    deadtime_start: Option<Instant>,
    last_sample: Option<Instant>,
    remainder_at: Option<Instant>,
}

impl ScrollState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Remaining (x, y) motion towards the next tick
    pub fn remainder(&self) -> (i32, i32) {
        (self.total_x, self.total_y)
    }

    /// Drop the tick remainder once it's been untouched for too long
    pub fn expire_remainder(&mut self, now: Instant) {
        if let Some(at) = self.remainder_at {
            if now.saturating_duration_since(at) > REMAINDER_TIMEOUT {
                self.total_x = 0;
                self.total_y = 0;
                self.remainder_at = None;
            }
        }
    }

    /// Run one sample through snapping, acceleration and tick quantization
    pub fn process(&mut self, x: i16, y: i16, now: Instant, config: &ScrollConfig) -> ScrollTicks {
        let (x, y) = self.snap(x as i32, y as i32, now, &config.snap);
        let (x, y) = self.accelerate(x, y, now, config.acceleration_sensitivity);

        let tick = config.tick.max(1) as i32;
        let carry = MAX_TICKS_PER_SAMPLE * tick + MAX_SAMPLE_CARRY;
        self.total_x = self.total_x.saturating_add(x).clamp(-carry, carry);
        self.total_y = self.total_y.saturating_add(y).clamp(-carry, carry);
        self.remainder_at = Some(now);

        // Axis lock already suppresses the other axis
        let exclusive = !matches!(config.snap, ScrollSnap::AxisLock { .. });

        let vertical = quantize(&mut self.total_y, tick);
        if vertical != 0 && exclusive {
            self.total_x = 0;
        }
        let horizontal = quantize(&mut self.total_x, tick);
        if horizontal != 0 && exclusive {
            self.total_y = 0;
        }

        ScrollTicks { vertical, horizontal }
    }

    /// Suppress the non-dominant axis
    pub fn snap(&mut self, x: i32, y: i32, now: Instant, snap: &ScrollSnap) -> (i32, i32) {
        match *snap {
            ScrollSnap::Off => (x, y),
            ScrollSnap::AxisLock {
                threshold,
                timeout_ms,
                deadtime_ms,
            } => self.axis_lock(x, y, now, threshold as i32, timeout_ms, deadtime_ms),
            ScrollSnap::Decay {
                threshold_percent,
                strength_percent,
            } => self.decay(x, y, threshold_percent, strength_percent),
        }
    }

    fn axis_lock(&mut self, x: i32, y: i32, now: Instant, threshold: i32, timeout_ms: u32, deadtime_ms: u32) -> (i32, i32) {
        let timeout = Duration::from_millis(timeout_ms as u64);
        if let Some(last) = self.last_activity {
            if now.saturating_duration_since(last) > timeout {
                // The motion stopped, the dead time starts when the timeout elapsed
                self.snap_x = 0;
                self.snap_y = 0;
                self.last_activity = None;
                self.deadtime_start = Some(last + timeout);
            }
        }

        if x != 0 || y != 0 {
            self.last_activity = Some(now);
        }

        if let Some(start) = self.deadtime_start {
            if now.saturating_duration_since(start) < Duration::from_millis(deadtime_ms as u64) {
                return (0, 0);
            }
            self.deadtime_start = None;
        }

        let (mut x, mut y) = (x, y);
        if y.abs() > x.abs() {
            self.snap_x += x;
            if self.snap_x.abs() < threshold {
                x = 0;
            } else {
                self.snap_x = 0;
            }
        } else {
            self.snap_y += y;
            if self.snap_y.abs() < threshold {
                y = 0;
            } else {
                self.snap_y = 0;
            }
        }
        (x, y)
    }

    fn decay(&mut self, x: i32, y: i32, threshold_percent: u8, strength_percent: u8) -> (i32, i32) {
        self.snap_x = self.snap_x.saturating_add(x);
        self.snap_y = self.snap_y.saturating_add(y);

        let (abs_x, abs_y) = (self.snap_x.unsigned_abs(), self.snap_y.unsigned_abs());
        if abs_x == 0 && abs_y == 0 {
            return (0, 0);
        }

        let threshold = threshold_percent as f32 / 100.0;
        let strength = strength_percent as f32 / 100.0;
        let factor = |ratio: f32| 1.0 - strength * (1.0 - ratio / threshold);

        if abs_y > abs_x {
            let ratio = abs_x as f32 / abs_y as f32;
            if ratio < threshold {
                self.snap_x = (self.snap_x as f32 * factor(ratio)) as i32;
            }
        } else {
            let ratio = abs_y as f32 / abs_x as f32;
            if ratio < threshold {
                self.snap_y = (self.snap_y as f32 * factor(ratio)) as i32;
            }
        }

        // The attenuated accumulators are the output of the sample
        (self.snap_x, self.snap_y)
    }

    /// Scale fast scrolling up along a logistic curve of the scroll speed
    pub fn accelerate(&mut self, x: i32, y: i32, now: Instant, sensitivity: Option<f32>) -> (i32, i32) {
        let Some(sensitivity) = sensitivity else {
            return (x, y);
        };

        let mut out = (x, y);
        if let Some(last) = self.last_sample {
            let gap = now.saturating_duration_since(last);
            if gap > Duration::from_ticks(0) && gap < ACCELERATION_WINDOW {
                let speed = (x.unsigned_abs() as f32 + y.unsigned_abs() as f32) / (gap.as_micros() as f32 / 1000.0);
                let acceleration = 1.0 + (sensitivity - 1.0) / (1.0 + libm::expf(-0.2 * (speed - 10.0)));
                if x.unsigned_abs() > 1 {
                    out.0 = (x as f32 * acceleration) as i32;
                }
                if y.unsigned_abs() > 1 {
                    out.1 = (y as f32 * acceleration) as i32;
                }
            }
        }
        self.last_sample = Some(now);
        out
    }
}

/// Take the whole ticks out of `total`, at most `MAX_TICKS_PER_SAMPLE` of them
fn quantize(total: &mut i32, tick: i32) -> i16 {
    let magnitude = total.unsigned_abs();
    if magnitude < tick as u32 {
        return 0;
    }
    let sign = total.signum();
    let count = (magnitude / tick as u32) as i32;
    if count > MAX_TICKS_PER_SAMPLE {
        *total -= sign * MAX_TICKS_PER_SAMPLE * tick;
        return (sign * MAX_TICKS_PER_SAMPLE) as i16;
    }
    *total %= tick;
    (sign * count) as i16
}
