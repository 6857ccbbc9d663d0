//! Handoff of the motion interrupt to the sampling worker
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::signal::Signal;

use crate::RawMutex;

/// The motion interrupt's enable gate plus a single-slot sample request.
///
/// The interrupt side calls [`MotionBridge::on_interrupt`], which closes the gate and
/// requests one sample. The worker waits for the request, samples, and reopens the gate.
pub struct MotionBridge {
    enabled: AtomicBool,
    requested: Signal<RawMutex, ()>,
}

impl Default for MotionBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionBridge {
    /// A disabled bridge, it's enabled once the sensor is ready
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            requested: Signal::new(),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Request a sample, returns whether the request was accepted
    pub fn on_interrupt(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.disable();
        self.requested.signal(());
        true
    }

    pub fn is_requested(&self) -> bool {
        self.requested.signaled()
    }

    /// Wait for a sample request, consuming it
    pub async fn wait(&self) {
        self.requested.wait().await
    }
}
