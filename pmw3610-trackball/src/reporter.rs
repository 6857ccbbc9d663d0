//! An event sink which folds axis events into HID mouse reports
use embassy_sync::channel::Sender;
use usbd_hid::descriptor::MouseReport;

use crate::RawMutex;
use crate::event::{Axis, AxisEvent, EventSink};

/// Accumulates axis events and sends a [`MouseReport`] on every sync event
pub struct MouseReportSink<'a, const N: usize> {
    sender: Sender<'a, RawMutex, MouseReport, N>,
    x: i16,
    y: i16,
    wheel: i16,
    pan: i16,
}

impl<'a, const N: usize> MouseReportSink<'a, N> {
    pub fn new(sender: Sender<'a, RawMutex, MouseReport, N>) -> Self {
        Self {
            sender,
            x: 0,
            y: 0,
            wheel: 0,
            pan: 0,
        }
    }

    fn take_report(&mut self) -> MouseReport {
        let clamp = |v: i16| v.clamp(i8::MIN as i16, i8::MAX as i16) as i8;
        let report = MouseReport {
            buttons: 0,
            x: clamp(self.x),
            y: clamp(self.y),
            wheel: clamp(self.wheel),
            pan: clamp(self.pan),
        };
        self.x = 0;
        self.y = 0;
        self.wheel = 0;
        self.pan = 0;
        report
    }
}

impl<const N: usize> EventSink for MouseReportSink<'_, N> {
    async fn report(&mut self, event: AxisEvent) {
        let target = match event.axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::V => &mut self.wheel,
            Axis::H => &mut self.pan,
        };
        *target = target.saturating_add(event.value);

        if event.sync {
            let report = self.take_report();
            self.sender.send(report).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::channel::Channel;

    use super::*;

    fn send_all<const N: usize>(sink: &mut MouseReportSink<'_, N>, events: &[AxisEvent]) {
        for event in events {
            block_on(sink.report(*event));
        }
    }

    #[test]
    fn test_pointer_report() {
        let channel: Channel<RawMutex, MouseReport, 4> = Channel::new();
        let mut sink = MouseReportSink::new(channel.sender());

        send_all(&mut sink, &[AxisEvent::new(Axis::X, 3, false), AxisEvent::new(Axis::Y, -300, true)]);

        let report = channel.try_receive().unwrap();
        assert_eq!((report.x, report.y, report.wheel, report.pan), (3, -128, 0, 0));
        assert!(channel.try_receive().is_err());
    }

    #[test]
    fn test_wheel_burst_is_one_report() {
        let channel: Channel<RawMutex, MouseReport, 4> = Channel::new();
        let mut sink = MouseReportSink::new(channel.sender());

        send_all(
            &mut sink,
            &[
                AxisEvent::new(Axis::V, -1, false),
                AxisEvent::new(Axis::V, -1, false),
                AxisEvent::new(Axis::V, -1, true),
                AxisEvent::new(Axis::H, 1, true),
            ],
        );

        let report = channel.try_receive().unwrap();
        assert_eq!((report.x, report.y, report.wheel, report.pan), (0, 0, -3, 0));
        let report = channel.try_receive().unwrap();
        assert_eq!((report.wheel, report.pan), (0, 1));
    }
}
