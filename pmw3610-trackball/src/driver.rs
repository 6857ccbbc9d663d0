//! PMW3610 trackball driver
//!
//! [`Pmw3610::run`] brings the sensor up, then samples it once per motion interrupt and
//! post-processes the motion according to the input mode of the highest active layer.
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;
use embedded_hal_async::spi::SpiBus;
use futures::future::pending;

use crate::automouse::{AutomouseTimer, should_activate};
use crate::ball_action::{self, BallActionState};
use crate::config::Pmw3610Config;
use crate::error::Pmw3610Error;
use crate::event::{ActionQueue, Axis, AxisEvent, EventSink};
use crate::init::{Downshift, InitState, InitStep, SamplePeriod, cpi_register_value};
use crate::irq::MotionBridge;
use crate::layer::LayerControl;
use crate::mode::InputMode;
use crate::motion::{MotionFrame, transform};
use crate::registers::*;
use crate::scroll::{ScrollState, ScrollTicks};
use crate::transport::RegisterTransport;

/// Samples closer than this are merged by the 125Hz limiter
const MERGE_WINDOW: Duration = Duration::from_millis(128);

/// A sample held back by the 125Hz limiter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingSample {
    pub at: Instant,
    pub x: i16,
    pub y: i16,
}

/// Runtime state of the sensor, owned by one driver instance
#[derive(Clone, Debug, Default)]
pub struct DeviceState {
    /// Whether the init sequence completed
    pub ready: bool,
    /// Input mode of the last sampling pass
    pub mode: InputMode,
    /// CPI currently set in the sensor, 0 before the init sequence set it
    pub cpi: u16,
    pub init: InitState,
    pub last_error: Option<Pmw3610Error>,
    pub scroll: ScrollState,
    pub ball: BallActionState,
    /// Deactivation time of the automouse layer, while it's triggered by the trackball
    pub automouse_deadline: Option<Instant>,
    /// Whether the sensor's smart mode is switched off for a bright surface
    pub smart_flag: bool,
    pub pending: Option<PendingSample>,
}

/// PMW3610 driver
pub struct Pmw3610<'a, SPI, CS, MOTION, L, A>
where
    SPI: SpiBus,
    CS: OutputPin,
    MOTION: InputPin + Wait,
    L: LayerControl,
    A: ActionQueue,
{
    transport: RegisterTransport<SPI, CS>,
    motion_gpio: Option<MOTION>,
    config: Pmw3610Config,
    state: DeviceState,
    bridge: &'a MotionBridge,
    layers: &'a L,
    actions: &'a A,
    automouse: Option<&'a AutomouseTimer<'a, L>>,
}

impl<'a, SPI, CS, MOTION, L, A> Pmw3610<'a, SPI, CS, MOTION, L, A>
where
    SPI: SpiBus,
    CS: OutputPin,
    MOTION: InputPin + Wait,
    L: LayerControl,
    A: ActionQueue,
{
    /// Create a new PMW3610 driver instance.
    ///
    /// Without a motion pin the sensor is polled every `config.poll_interval_us`.
    pub fn new(
        spi: SPI,
        cs: CS,
        motion_gpio: Option<MOTION>,
        config: Pmw3610Config,
        bridge: &'a MotionBridge,
        layers: &'a L,
        actions: &'a A,
    ) -> Self {
        Self {
            transport: RegisterTransport::new(spi, cs),
            motion_gpio,
            config,
            state: DeviceState::default(),
            bridge,
            layers,
            actions,
            automouse: None,
        }
    }

    /// Attach the deactivation timer of the automouse layer
    pub fn with_automouse(mut self, timer: &'a AutomouseTimer<'a, L>) -> Self {
        match self.config.automouse {
            Some(config) if config.layer != timer.layer() => {
                warn!(
                    "Automouse timer controls layer {}, but layer {} is configured",
                    timer.layer(),
                    config.layer
                );
            }
            None => warn!("Automouse timer attached without automouse config"),
            _ => {}
        }
        self.automouse = Some(timer);
        self
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn config(&self) -> &Pmw3610Config {
        &self.config
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, CS, Option<MOTION>) {
        let (spi, cs) = self.transport.release();
        (spi, cs, self.motion_gpio)
    }

    /// Run the init sequence, then sample the sensor on every motion interrupt
    pub async fn run<S: EventSink>(&mut self, sink: &mut S) -> ! {
        if self.init().await.is_err() {
            // The sensor stays unusable until reset
            loop {
                pending::<()>().await;
            }
        }

        loop {
            self.wait_for_request().await;
            let _ = self.sample(Instant::now(), sink).await;
            self.bridge.enable();
        }
    }

    async fn wait_for_request(&mut self) {
        let bridge = self.bridge;
        let poll_interval = Duration::from_micros(self.config.poll_interval_us);
        let gpio = self.motion_gpio.as_mut();
        let motion = async move {
            match gpio {
                // Motion line is active low
                Some(gpio) => {
                    if gpio.wait_for_low().await.is_err() {
                        Timer::after(poll_interval).await;
                    }
                }
                None => Timer::after(poll_interval).await,
            }
            bridge.on_interrupt();
        };

        if let Either::First(_) = select(motion, bridge.wait()).await {
            bridge.wait().await;
        }
    }

    /// Run the remaining init steps, each after its delay
    pub async fn init(&mut self) -> Result<(), Pmw3610Error> {
        loop {
            let step = match self.state.init {
                InitState::Running(step) => step,
                InitState::Ready => return Ok(()),
                InitState::Failed(_) => return Err(self.state.last_error.unwrap_or(Pmw3610Error::NotReady)),
            };

            Timer::after(step.delay()).await;
            debug!("PMW3610 init step {:?}", step);

            let outcome = self.run_init_step(step).await;
            self.state.init = self.state.init.advance(outcome);
            if let Err(e) = outcome {
                error!("PMW3610 initialization failed at {:?}: {:?}", step, e);
                self.state.last_error = Some(e);
            }

            if self.state.init == InitState::Ready {
                self.state.ready = true;
                self.bridge.enable();
                info!("PMW3610 initialized");
            }
        }
    }

    async fn run_init_step(&mut self, step: InitStep) -> Result<(), Pmw3610Error> {
        match step {
            InitStep::PowerUp => {
                // Reset the SPI port, then the chip
                self.transport.pulse_chip_select().await?;
                self.transport.write(POWER_UP_RESET, POWER_UP_RESET_VAL).await
            }
            InitStep::ClearObservation => self.transport.write(OBSERVATION, 0).await,
            InitStep::CheckObservation => self.check_observation().await,
            InitStep::Configure => self.configure().await,
        }
    }

    async fn check_observation(&mut self) -> Result<(), Pmw3610Error> {
        let value = self.transport.read(OBSERVATION).await?;
        if value & OBSERVATION_SELF_TEST_MASK != OBSERVATION_SELF_TEST_MASK {
            error!("PMW3610 self-test failed, observation: {:#02x}", value);
            return Err(Pmw3610Error::SelfTest(value));
        }

        let id = self.transport.read(PRODUCT_ID).await?;
        if id != PRODUCT_ID_PMW3610 {
            error!("Invalid product id: {:#02x}", id);
            return Err(Pmw3610Error::InvalidProductId(id));
        }
        info!("PMW3610 detected, product ID: {:#02x}", id);
        Ok(())
    }

    async fn configure(&mut self) -> Result<(), Pmw3610Error> {
        // Clear motion registers
        for reg in MOTION..=DELTA_XY_H {
            self.transport.read(reg).await?;
        }

        self.write_cpi(self.config.cpi).await?;

        let performance = if self.config.force_awake {
            PERFORMANCE_INIT | PERFORMANCE_FMODE_FORCE_AWAKE
        } else {
            PERFORMANCE_INIT
        };
        self.transport.write(PERFORMANCE, performance).await?;
        debug!("Set performance register (reg value {:#02x})", performance);

        let power = self.config.power.clone();
        self.set_downshift(Downshift::Run, power.run_downshift_ms).await?;
        self.set_sample_period(SamplePeriod::Rest1, power.rest1_sample_ms).await?;
        self.set_downshift(Downshift::Rest1, power.rest1_downshift_ms).await?;

        // Optional rest mode settings, the sensor defaults are kept otherwise
        if power.rest2_downshift_ms > 0 {
            self.set_downshift(Downshift::Rest2, power.rest2_downshift_ms).await?;
        }
        if power.rest2_sample_ms >= SamplePeriod::MIN_MS {
            self.set_sample_period(SamplePeriod::Rest2, power.rest2_sample_ms).await?;
        }
        if power.rest3_sample_ms >= SamplePeriod::MIN_MS {
            self.set_sample_period(SamplePeriod::Rest3, power.rest3_sample_ms).await?;
        }
        Ok(())
    }

    async fn set_sample_period(&mut self, period: SamplePeriod, ms: u32) -> Result<(), Pmw3610Error> {
        let value = period.register_value(ms)?;
        self.transport.write(period.register(), value).await?;
        debug!("Set {:?} sample period to {}ms (reg value {:#02x})", period, ms, value);
        Ok(())
    }

    async fn set_downshift(&mut self, downshift: Downshift, ms: u32) -> Result<(), Pmw3610Error> {
        let value = downshift.register_value(ms, &self.config.power)?;
        self.transport.write(downshift.register(), value).await?;
        debug!("Set {:?} downshift time to {}ms (reg value {:#02x})", downshift, ms, value);
        Ok(())
    }

    async fn write_cpi(&mut self, cpi: u16) -> Result<(), Pmw3610Error> {
        let value = cpi_register_value(cpi, self.config.cpi_min, self.config.cpi_max)?;
        // RES_STEP is on page 1
        self.transport
            .burst_write(&[SPI_PAGE, RES_STEP, SPI_PAGE], &[SPI_PAGE0_1, value, SPI_PAGE1_0])
            .await?;
        self.state.cpi = cpi;
        debug!("PMW3610: Resolution set to {} CPI", cpi);
        Ok(())
    }

    async fn set_cpi_if_needed(&mut self, cpi: u16) -> Result<(), Pmw3610Error> {
        if cpi != self.state.cpi {
            self.write_cpi(cpi).await?;
        }
        Ok(())
    }

    /// Change the CPI used outside of snipe mode
    pub async fn set_cpi(&mut self, cpi: u16) -> Result<(), Pmw3610Error> {
        if !self.state.ready {
            return Err(Pmw3610Error::NotReady);
        }
        cpi_register_value(cpi, self.config.cpi_min, self.config.cpi_max)?;
        self.config.cpi = cpi;
        if self.state.mode != InputMode::Snipe {
            self.set_cpi_if_needed(cpi).await?;
        }
        Ok(())
    }

    /// Run one sampling pass.
    ///
    /// A failed pass emits nothing, the error is kept in [`DeviceState::last_error`].
    pub async fn sample<S: EventSink>(&mut self, now: Instant, sink: &mut S) -> Result<(), Pmw3610Error> {
        let result = self.sample_inner(now, sink).await;
        if let Err(e) = result {
            match e {
                Pmw3610Error::NotReady => warn!("PMW3610 is not initialized yet"),
                e => error!("PMW3610 sampling failed: {:?}", e),
            }
            self.state.last_error = Some(e);
        }
        result
    }

    async fn sample_inner<S: EventSink>(&mut self, now: Instant, sink: &mut S) -> Result<(), Pmw3610Error> {
        if !self.state.ready {
            return Err(Pmw3610Error::NotReady);
        }

        let layer = self.layers.highest_active_layer();
        let mode = InputMode::resolve(layer, &self.config.layers);
        if let InputMode::BallAction(index) = mode {
            if index >= self.config.layers.ball_actions.len() {
                return Err(Pmw3610Error::UnsupportedMode);
            }
        }

        let cpi = match mode {
            InputMode::Snipe => self.config.snipe_cpi,
            _ => self.config.cpi,
        };
        self.set_cpi_if_needed(cpi).await?;

        if mode != self.state.mode {
            self.enter_mode(mode);
        }

        let mut frame = [0u8; BURST_SIZE];
        self.transport.burst_read(&mut frame).await?;
        let motion = MotionFrame::parse(&frame);
        let (x, y) = transform(motion.dx, motion.dy, mode, &self.config);

        self.state.scroll.expire_remainder(now);

        if self.config.smart_algorithm {
            self.update_smart_mode(motion.shutter).await?;
        }

        let (x, y) = if self.config.merge_125hz {
            match self.merge_samples(x, y, now) {
                Some(merged) => merged,
                None => return Ok(()),
            }
        } else {
            (x, y)
        };

        if x == 0 && y == 0 {
            return Ok(());
        }

        match mode {
            InputMode::Move | InputMode::Snipe => {
                if mode == InputMode::Move {
                    self.update_automouse(x, y, layer, now);
                }
                sink.report(AxisEvent::new(Axis::X, x, false)).await;
                sink.report(AxisEvent::new(Axis::Y, y, true)).await;
            }
            InputMode::Scroll => {
                let ticks = self.state.scroll.process(x, y, now, &self.config.scroll);
                let (invert_x, invert_y) = (self.config.scroll.invert_x, self.config.scroll.invert_y);
                report_wheel(sink, ticks, invert_x, invert_y).await;
            }
            InputMode::BallAction(index) => {
                let group = self
                    .config
                    .layers
                    .ball_actions
                    .get(index)
                    .ok_or(Pmw3610Error::UnsupportedMode)?;
                if let Some(direction) = self.state.ball.accumulate(x, y, group.tick) {
                    debug!("Ball action {:?} triggered", direction);
                    ball_action::dispatch(self.actions, group, direction);
                }
            }
        }
        Ok(())
    }

    fn enter_mode(&mut self, mode: InputMode) {
        debug!("PMW3610 input mode changed to {:?}", mode);
        match mode {
            InputMode::Scroll => self.state.scroll.reset(),
            InputMode::BallAction(_) => self.state.ball.reset(),
            InputMode::Move | InputMode::Snipe => {}
        }
        self.state.mode = mode;
    }

    /// Switch the sensor's smart mode by the shutter value
    async fn update_smart_mode(&mut self, shutter: u16) -> Result<(), Pmw3610Error> {
        if self.state.smart_flag && shutter < SHUTTER_SMART_THRESHOLD {
            self.transport.write(SMART_MODE, SMART_MODE_ENABLE).await?;
            self.state.smart_flag = false;
        } else if !self.state.smart_flag && shutter > SHUTTER_SMART_THRESHOLD {
            self.transport.write(SMART_MODE, SMART_MODE_DISABLE).await?;
            self.state.smart_flag = true;
        }
        Ok(())
    }

    /// Hold back every other sample, returns the sum of the held and the current one
    fn merge_samples(&mut self, x: i16, y: i16, now: Instant) -> Option<(i16, i16)> {
        match self.state.pending.take() {
            Some(held) if now.saturating_duration_since(held.at) <= MERGE_WINDOW => {
                Some((x.saturating_add(held.x), y.saturating_add(held.y)))
            }
            _ => {
                self.state.pending = Some(PendingSample { at: now, x, y });
                None
            }
        }
    }

    fn update_automouse(&mut self, x: i16, y: i16, layer: u8, now: Instant) {
        let (Some(config), Some(timer)) = (self.config.automouse, self.automouse) else {
            return;
        };
        let movement = x.unsigned_abs() as u32 + y.unsigned_abs() as u32;
        if should_activate(&config, movement, self.state.automouse_deadline, layer, now) {
            let deadline = timer.activate(now, Duration::from_millis(config.timeout_ms as u64));
            self.state.automouse_deadline = Some(deadline);
        }
    }
}

/// Report wheel ticks, vertical first. The last event of each axis carries the sync flag.
async fn report_wheel<S: EventSink>(sink: &mut S, ticks: ScrollTicks, invert_x: bool, invert_y: bool) {
    for (axis, count, invert) in [
        (Axis::V, ticks.vertical, invert_y),
        (Axis::H, ticks.horizontal, invert_x),
    ] {
        // A positive total scrolls in the wheel's negative direction
        let mut value = if count > 0 { -1 } else { 1 };
        if invert {
            value = -value;
        }
        let n = count.unsigned_abs();
        for i in 0..n {
            sink.report(AxisEvent::new(axis, value, i + 1 == n)).await;
        }
    }
}
