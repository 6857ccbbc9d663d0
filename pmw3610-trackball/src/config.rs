//! Configuration of the PMW3610 trackball
//!
//! Every behaviour which is optional in the sensor pipeline is a runtime field here and
//! defaults to off, so the defaults give a plain pointer device at 600 CPI.
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::ball_action::BallDirection;
use crate::event::ActionBinding;

/// Max number of layers in each layer list
pub const MAX_MODE_LAYERS: usize = 8;
/// Max number of ball action groups
pub const MAX_BALL_ACTIONS: usize = 4;

/// Mounting orientation of the sensor
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Sample periods and downshift times of the sensor's power modes, all in ms
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PowerConfig {
    /// Inactivity time before run mode downshifts to rest1
    pub run_downshift_ms: u32,
    /// Sample period in rest1 mode
    pub rest1_sample_ms: u32,
    /// Inactivity time before rest1 downshifts to rest2
    pub rest1_downshift_ms: u32,
    /// Inactivity time before rest2 downshifts to rest3, 0 keeps the sensor default
    pub rest2_downshift_ms: u32,
    /// Sample period in rest2 mode, values below 10 keep the sensor default
    pub rest2_sample_ms: u32,
    /// Sample period in rest3 mode, values below 10 keep the sensor default
    pub rest3_sample_ms: u32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            run_downshift_ms: 128,
            rest1_sample_ms: 40,
            rest1_downshift_ms: 9600,
            rest2_downshift_ms: 0,
            rest2_sample_ms: 0,
            rest3_sample_ms: 0,
        }
    }
}

/// Suppression of the motion orthogonal to the dominant scroll direction
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub enum ScrollSnap {
    #[default]
    Off,
    /// Drop the non-dominant axis until its accumulated motion exceeds `threshold`.
    ///
    /// After `timeout_ms` without motion, all input is ignored for `deadtime_ms`.
    AxisLock {
        threshold: u16,
        timeout_ms: u32,
        deadtime_ms: u32,
    },
    /// Attenuate the non-dominant axis while its ratio to the dominant axis is below
    /// `threshold_percent`, by up to `strength_percent`.
    Decay { threshold_percent: u8, strength_percent: u8 },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Accumulated motion per wheel step
    pub tick: u16,
    /// Scroll acceleration sensitivity, `None` disables acceleration
    pub acceleration_sensitivity: Option<f32>,
    pub snap: ScrollSnap,
    /// Invert horizontal wheel direction
    pub invert_x: bool,
    /// Invert vertical wheel direction
    pub invert_y: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            tick: 20,
            acceleration_sensitivity: None,
            snap: ScrollSnap::Off,
            invert_x: false,
            invert_y: false,
        }
    }
}

/// Bindings of a ball action group, one per direction
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BallActionBindings {
    pub right: ActionBinding,
    pub left: ActionBinding,
    pub up: ActionBinding,
    pub down: ActionBinding,
}

impl BallActionBindings {
    pub fn get(&self, direction: BallDirection) -> ActionBinding {
        match direction {
            BallDirection::Right => self.right,
            BallDirection::Left => self.left,
            BallDirection::Up => self.up,
            BallDirection::Down => self.down,
        }
    }
}

/// A group of layers on which the trackball triggers directional actions
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BallActionConfig {
    pub layers: Vec<u8, MAX_MODE_LAYERS>,
    /// Accumulated motion needed to trigger an action
    pub tick: u16,
    /// Time between press and release of the triggered action
    pub tap_ms: u32,
    /// Time to wait after the release of the triggered action
    pub wait_ms: u32,
    pub bindings: BallActionBindings,
}

impl Default for BallActionConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            tick: 10,
            tap_ms: 0,
            wait_ms: 0,
            bindings: BallActionBindings::default(),
        }
    }
}

/// Mapping from layers to the trackball's operating modes
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerModeConfig {
    pub scroll_layers: Vec<u8, MAX_MODE_LAYERS>,
    pub snipe_layers: Vec<u8, MAX_MODE_LAYERS>,
    pub ball_actions: Vec<BallActionConfig, MAX_BALL_ACTIONS>,
}

/// Transient layer activated while the trackball moves
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutomouseConfig {
    pub layer: u8,
    /// Minimum |x| + |y| of a sample which activates the layer
    pub threshold: u16,
    /// Inactivity time before the layer is deactivated
    pub timeout_ms: u32,
}

impl AutomouseConfig {
    pub fn new(layer: u8) -> Self {
        Self {
            layer,
            threshold: 5,
            timeout_ms: 400,
        }
    }
}

/// PMW3610 configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Pmw3610Config {
    /// CPI used in move, scroll and ball action modes (step 200)
    pub cpi: u16,
    /// CPI used in snipe mode (step 200)
    pub snipe_cpi: u16,
    pub cpi_min: u16,
    pub cpi_max: u16,
    /// Divisor applied to the deltas in move mode
    pub move_divisor: i16,
    /// Divisor applied to the deltas in snipe mode
    pub snipe_divisor: i16,
    pub orientation: Orientation,
    /// Invert X axis
    pub invert_x: bool,
    /// Invert Y axis
    pub invert_y: bool,
    /// Scale the deltas with a speed-dependent curve
    pub adaptive_speed: bool,
    /// Force awake mode (disable power saving)
    pub force_awake: bool,
    /// Switch the sensor's smart mode by shutter value, for better tracking on shiny surfaces
    pub smart_algorithm: bool,
    /// Merge pairs of samples, to limit the report rate to roughly 125Hz
    pub merge_125hz: bool,
    /// Poll interval used when no motion pin is available, in us
    pub poll_interval_us: u64,
    pub power: PowerConfig,
    pub scroll: ScrollConfig,
    pub layers: LayerModeConfig,
    pub automouse: Option<AutomouseConfig>,
}

impl Default for Pmw3610Config {
    fn default() -> Self {
        Self {
            cpi: 600,
            snipe_cpi: 200,
            cpi_min: 200,
            cpi_max: 3200,
            move_divisor: 1,
            snipe_divisor: 1,
            orientation: Orientation::Deg0,
            invert_x: false,
            invert_y: false,
            adaptive_speed: false,
            force_awake: false,
            smart_algorithm: false,
            merge_125hz: false,
            poll_interval_us: 500,
            power: PowerConfig::default(),
            scroll: ScrollConfig::default(),
            layers: LayerModeConfig::default(),
            automouse: None,
        }
    }
}
