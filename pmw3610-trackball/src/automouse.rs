//! Automouse: a transient layer activated by trackball motion, deactivated after inactivity
use embassy_futures::select::{Either, select};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};

use crate::RawMutex;
use crate::config::AutomouseConfig;
use crate::layer::LayerControl;

/// Decide whether a move sample activates the automouse layer.
///
/// `deadline` is the pending deactivation time, the layer counts as triggered by the trackball
/// until then. Motion on the automouse layer which wasn't triggered by the trackball is ignored,
/// so a layer held by a key isn't taken over by the timer.
pub fn should_activate(
    config: &AutomouseConfig,
    movement: u32,
    deadline: Option<Instant>,
    highest_layer: u8,
    now: Instant,
) -> bool {
    let triggered = deadline.is_some_and(|deadline| deadline > now);
    movement > config.threshold as u32 && (triggered || highest_layer != config.layer)
}

/// Deactivation timer of the automouse layer.
///
/// [`AutomouseTimer::run`] runs as an independent task, the driver moves its deadline with
/// [`AutomouseTimer::restart`].
pub struct AutomouseTimer<'a, L: LayerControl> {
    layers: &'a L,
    layer: u8,
    deadline: Signal<RawMutex, Instant>,
}

impl<'a, L: LayerControl> AutomouseTimer<'a, L> {
    pub const fn new(layers: &'a L, layer: u8) -> Self {
        Self {
            layers,
            layer,
            deadline: Signal::new(),
        }
    }

    pub fn layer(&self) -> u8 {
        self.layer
    }

    /// Activate the layer if needed and (re)start the timer
    pub fn activate(&self, now: Instant, timeout: Duration) -> Instant {
        if !self.layers.is_layer_active(self.layer) {
            debug!("Automouse layer {} activated", self.layer);
            self.layers.activate_layer(self.layer);
        }
        let deadline = now + timeout;
        self.restart(deadline);
        deadline
    }

    pub fn restart(&self, deadline: Instant) {
        self.deadline.signal(deadline);
    }

    pub async fn run(&self) -> ! {
        let mut deadline = self.deadline.wait().await;
        loop {
            match select(Timer::at(deadline), self.deadline.wait()).await {
                Either::First(_) => {
                    debug!("Automouse layer {} deactivated", self.layer);
                    self.layers.deactivate_layer(self.layer);
                    deadline = self.deadline.wait().await;
                }
                Either::Second(next) => deadline = next,
            }
        }
    }
}
