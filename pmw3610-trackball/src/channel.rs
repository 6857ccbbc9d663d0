//! Static channels connecting the trackball task with the rest of the firmware
use embassy_sync::channel::Channel;
use usbd_hid::descriptor::MouseReport;

use crate::RawMutex;
use crate::event::{ActionEvent, AxisEvent};

pub const AXIS_EVENT_CHANNEL_SIZE: usize = 16;
pub const ACTION_CHANNEL_SIZE: usize = 8;
pub const MOUSE_REPORT_CHANNEL_SIZE: usize = 4;

/// Channel for pointer and wheel events from the trackball
pub static AXIS_EVENT_CHANNEL: Channel<RawMutex, AxisEvent, AXIS_EVENT_CHANNEL_SIZE> = Channel::new();
/// Action queue of the ball action mode
pub static BALL_ACTION_CHANNEL: Channel<RawMutex, ActionEvent, ACTION_CHANNEL_SIZE> = Channel::new();
/// Channel for mouse reports, to the hid writer
pub static MOUSE_REPORT_CHANNEL: Channel<RawMutex, MouseReport, MOUSE_REPORT_CHANNEL_SIZE> = Channel::new();
