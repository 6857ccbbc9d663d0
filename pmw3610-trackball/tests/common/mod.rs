#![allow(dead_code)]

pub mod test_block_on;

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::future::poll_fn;
use core::task::Poll;
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_sync::channel::Channel;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType as SpiErrorType};
use embedded_hal_async::digital::Wait;
use embedded_hal_async::spi::SpiBus;
use pmw3610_trackball::RawMutex;
use pmw3610_trackball::driver::Pmw3610;
use pmw3610_trackball::event::{ActionEvent, AxisEvent, EventSink};
use pmw3610_trackball::irq::MotionBridge;
use pmw3610_trackball::layer::LayerState;
use pmw3610_trackball::registers::{MOTION_BURST, OBSERVATION, PRODUCT_ID, SPI_CLK_ON_REQ, SPI_WRITE};
pub use test_block_on::test_block_on;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub type TestQueue = Channel<RawMutex, ActionEvent, 8>;
pub type TestDriver<'a> = Pmw3610<'a, FakeSpi, FakeCs, FakeMotionPin, LayerState, TestQueue>;

/// Register file and traffic log of the fake sensor
pub struct SensorState {
    pub registers: [u8; 128],
    /// Value of the observation register, after the self-test
    pub observation: u8,
    pub product_id: u8,
    /// Every register write, including the SPI clock requests
    pub writes: Vec<(u8, u8)>,
    /// Addresses of every register read
    pub reads: Vec<u8>,
    pub frames: VecDeque<[u8; 7]>,
    pub burst_reads: usize,
    /// Fail every bus access
    pub fail: bool,
    selected: Option<u8>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            registers: [0; 128],
            observation: 0x0f,
            product_id: 0x3e,
            writes: Vec::new(),
            reads: Vec::new(),
            frames: VecDeque::new(),
            burst_reads: 0,
            fail: false,
            selected: None,
        }
    }
}

impl SensorState {
    /// Register writes without the SPI clock requests
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.writes
            .iter()
            .copied()
            .filter(|(addr, _)| *addr != SPI_CLK_ON_REQ)
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.reads.clear();
        self.burst_reads = 0;
    }

    pub fn bus_accesses(&self) -> usize {
        self.writes.len() + self.reads.len() + self.burst_reads
    }
}

/// A PMW3610 on a 3-wire SPI bus
#[derive(Clone, Default)]
pub struct FakeSpi {
    pub state: Rc<RefCell<SensorState>>,
}

impl SpiErrorType for FakeSpi {
    type Error = ErrorKind;
}

impl SpiBus for FakeSpi {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(ErrorKind::Other);
        }
        match state.selected.take() {
            Some(MOTION_BURST) => {
                state.burst_reads += 1;
                let frame = state.frames.pop_front().unwrap_or_default();
                let n = words.len().min(frame.len());
                words[..n].copy_from_slice(&frame[..n]);
            }
            Some(addr) => {
                state.reads.push(addr);
                words[0] = match addr {
                    OBSERVATION => state.observation,
                    PRODUCT_ID => state.product_id,
                    _ => state.registers[addr as usize],
                };
            }
            None => return Err(ErrorKind::Other),
        }
        Ok(())
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(ErrorKind::Other);
        }
        match words {
            &[addr, value] if addr & SPI_WRITE != 0 => {
                let addr = addr & !SPI_WRITE;
                state.writes.push((addr, value));
                state.registers[addr as usize] = value;
            }
            &[addr] => state.selected = Some(addr & !SPI_WRITE),
            _ => return Err(ErrorKind::Other),
        }
        Ok(())
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write).await?;
        self.read(read).await
    }

    async fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeCs {
    pub low: Rc<Cell<bool>>,
}

impl PinErrorType for FakeCs {
    type Error = Infallible;
}

impl OutputPin for FakeCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.low.set(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.low.set(false);
        Ok(())
    }
}

/// Active-low motion line, level controlled by the test
#[derive(Clone, Default)]
pub struct FakeMotionPin {
    pub asserted: Rc<Cell<bool>>,
}

impl PinErrorType for FakeMotionPin {
    type Error = Infallible;
}

impl InputPin for FakeMotionPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.asserted.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.asserted.get())
    }
}

impl FakeMotionPin {
    async fn wait_level(&self, low: bool) {
        poll_fn(|_| if self.asserted.get() == low { Poll::Ready(()) } else { Poll::Pending }).await
    }
}

impl Wait for FakeMotionPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.wait_level(false).await;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.wait_level(true).await;
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_level(true).await;
        self.wait_level(false).await;
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_level(false).await;
        self.wait_level(true).await;
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        let level = self.asserted.get();
        self.wait_level(!level).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AxisEvent>,
}

impl EventSink for RecordingSink {
    async fn report(&mut self, event: AxisEvent) {
        self.events.push(event);
    }
}

/// Encode a burst frame, with the raw deltas as the sensor reports them
pub fn frame(dx: i16, dy: i16) -> [u8; 7] {
    frame_with_shutter(dx, dy, 0)
}

pub fn frame_with_shutter(dx: i16, dy: i16, shutter: u16) -> [u8; 7] {
    let x = dx as u16 & 0x0fff;
    let y = dy as u16 & 0x0fff;
    [
        0x80,
        (x & 0xff) as u8,
        (y & 0xff) as u8,
        (((x >> 8) << 4) | (y >> 8)) as u8,
        0x40,
        ((shutter >> 8) & 0x01) as u8,
        (shutter & 0xff) as u8,
    ]
}

/// Everything a test driver borrows
pub struct Fixture {
    pub spi: FakeSpi,
    pub motion: FakeMotionPin,
    pub bridge: MotionBridge,
    pub layers: LayerState,
    pub queue: TestQueue,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            spi: FakeSpi::default(),
            motion: FakeMotionPin::default(),
            bridge: MotionBridge::new(),
            layers: LayerState::new(),
            queue: Channel::new(),
        }
    }

    pub fn sensor(&self) -> std::cell::RefMut<'_, SensorState> {
        self.spi.state.borrow_mut()
    }

    /// A driver without motion pin
    pub fn driver(&self, config: pmw3610_trackball::Pmw3610Config) -> TestDriver<'_> {
        Pmw3610::new(
            self.spi.clone(),
            FakeCs::default(),
            None,
            config,
            &self.bridge,
            &self.layers,
            &self.queue,
        )
    }

    pub fn driver_with_motion_pin(&self, config: pmw3610_trackball::Pmw3610Config) -> TestDriver<'_> {
        Pmw3610::new(
            self.spi.clone(),
            FakeCs::default(),
            Some(self.motion.clone()),
            config,
            &self.bridge,
            &self.layers,
            &self.queue,
        )
    }

    /// A driver which completed its init sequence
    pub fn ready_driver(&self, config: pmw3610_trackball::Pmw3610Config) -> TestDriver<'_> {
        let mut driver = self.driver(config);
        test_block_on(driver.init()).unwrap();
        self.sensor().clear_log();
        driver
    }

    pub fn queued_actions(&self) -> Vec<ActionEvent> {
        let mut actions = Vec::new();
        while let Ok(action) = self.queue.try_receive() {
            actions.push(action);
        }
        actions
    }
}
