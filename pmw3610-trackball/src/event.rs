//! Output events of the trackball and the traits of their consumers
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Sender, TrySendError};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Relative pointer X
    X,
    /// Relative pointer Y
    Y,
    /// Horizontal wheel
    H,
    /// Vertical wheel
    V,
}

/// A relative axis event
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisEvent {
    /// The axis name
    pub axis: Axis,
    /// Value of the axis event
    pub value: i16,
    /// Marks the last event of a group, consumers can flush their report on it
    pub sync: bool,
}

impl AxisEvent {
    pub const fn new(axis: Axis, value: i16, sync: bool) -> Self {
        Self { axis, value, sync }
    }
}

/// An opaque action code, executed by the action queue's consumer
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionBinding(pub u16);

/// One entry of a gesture dispatch. A dispatch is always a press followed by a release.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionEvent {
    pub binding: ActionBinding,
    pub pressed: bool,
    /// Time to wait after executing this entry, in ms
    pub delay_ms: u32,
}

/// Consumer of the pointer and wheel events
pub trait EventSink {
    /// Report one axis event, waiting until the consumer accepts it
    async fn report(&mut self, event: AxisEvent);
}

/// The external action-execution queue.
///
/// Entries are delivered in FIFO order, the driver never waits for their execution.
/// The driver is the only producer.
pub trait ActionQueue {
    /// Enqueue an entry, returns the entry back when the queue is full
    fn enqueue(&self, event: ActionEvent) -> Result<(), ActionEvent>;

    /// Number of entries that can be enqueued without failing
    fn free_capacity(&self) -> usize;
}

impl<M: RawMutex, const N: usize> EventSink for Sender<'_, M, AxisEvent, N> {
    async fn report(&mut self, event: AxisEvent) {
        self.send(event).await;
    }
}

impl<M: RawMutex, const N: usize> ActionQueue for Channel<M, ActionEvent, N> {
    fn enqueue(&self, event: ActionEvent) -> Result<(), ActionEvent> {
        self.try_send(event).map_err(|e| match e {
            TrySendError::Full(e) => e,
        })
    }

    fn free_capacity(&self) -> usize {
        Channel::free_capacity(self)
    }
}
