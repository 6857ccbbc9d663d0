//! Async driver for the PixArt PMW3610 low-power optical sensor used as a trackball.
//!
//! The driver brings the sensor up with a non-blocking, delay-scheduled init sequence,
//! samples motion whenever the motion line is asserted, and post-processes the deltas
//! according to the active input layer:
//!
//! - **Move / Snipe**: relative pointer motion, optionally auto-activating a mouse layer
//! - **Scroll**: axis-snapped, accelerated, tick-quantized wheel events
//! - **BallAction**: directional gestures dispatched to an action queue
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("The `defmt` and `log` features are mutually exclusive");

#[macro_use]
mod fmt;

pub mod automouse;
pub mod ball_action;
pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod init;
pub mod irq;
pub mod layer;
pub mod mode;
pub mod motion;
pub mod registers;
pub mod reporter;
pub mod scroll;
pub mod transport;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub use config::Pmw3610Config;
pub use driver::Pmw3610;
pub use error::Pmw3610Error;

/// Raw mutex used by every shared primitive in this crate
pub type RawMutex = CriticalSectionRawMutex;
