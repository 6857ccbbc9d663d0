//! Ball action mode: the trackball triggers one directional binding per accumulated tick
use serde::{Deserialize, Serialize};

use crate::config::BallActionConfig;
use crate::event::{ActionEvent, ActionQueue};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BallDirection {
    Right,
    Left,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BallActionState {
    acc_x: i32,
    acc_y: i32,
}

impl BallActionState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn accumulated(&self) -> (i32, i32) {
        (self.acc_x, self.acc_y)
    }

    /// Accumulate a sample, returns the direction once an axis crossed the group's tick.
    ///
    /// The horizontal axis is checked first, both accumulators restart after a trigger.
    pub fn accumulate(&mut self, x: i16, y: i16, tick: u16) -> Option<BallDirection> {
        self.acc_x += x as i32;
        self.acc_y += y as i32;

        let tick = tick as i32;
        let direction = if self.acc_x.abs() > tick {
            if self.acc_x > 0 { BallDirection::Right } else { BallDirection::Left }
        } else if self.acc_y.abs() > tick {
            if self.acc_y > 0 { BallDirection::Down } else { BallDirection::Up }
        } else {
            return None;
        };

        self.reset();
        Some(direction)
    }
}

/// Enqueue the press and the release of the group's binding for `direction`.
///
/// Both entries are dropped when the queue can't take the pair.
pub fn dispatch<A: ActionQueue>(queue: &A, group: &BallActionConfig, direction: BallDirection) {
    let binding = group.bindings.get(direction);
    let press = ActionEvent {
        binding,
        pressed: true,
        delay_ms: group.tap_ms,
    };
    let release = ActionEvent {
        binding,
        pressed: false,
        delay_ms: group.wait_ms,
    };
    if queue.free_capacity() < 2 {
        warn!("Action queue is full, dropping ball action {:?}", direction);
        return;
    }
    if queue.enqueue(press).is_err() || queue.enqueue(release).is_err() {
        error!("Action queue rejected ball action {:?}", direction);
    }
}
