//! Non-blocking bring-up sequence of the sensor, and validation of the values written during it
//!
//! The sensor needs several milliseconds between the bring-up steps, during which the MCU
//! isn't involved. The sequence is modelled as an explicit state plus a pure transition
//! function, the driver awaits each step's delay before executing it.

use embassy_time::Duration;

use crate::config::PowerConfig;
use crate::error::Pmw3610Error;
use crate::registers::{REST1_DOWNSHIFT, REST1_PERIOD, REST2_DOWNSHIFT, REST2_PERIOD, REST3_PERIOD, RUN_DOWNSHIFT};

/// Steps of the init sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStep {
    /// Reset the SPI port and issue a power-up reset
    PowerUp,
    /// Clear the observation register for the self-test
    ClearObservation,
    /// Check the self-test result and the product id
    CheckObservation,
    /// Clear the motion registers, set CPI, performance, sample and downshift times
    Configure,
}

impl InitStep {
    pub const SEQUENCE: [InitStep; 4] = [
        InitStep::PowerUp,
        InitStep::ClearObservation,
        InitStep::CheckObservation,
        InitStep::Configure,
    ];

    /// Time to wait before executing the step.
    ///
    /// These are longer than the datasheet minimums, shorter values fail on real boards,
    /// especially when a display shares the bus.
    pub const fn delay(self) -> Duration {
        match self {
            InitStep::PowerUp => Duration::from_millis(10),
            InitStep::ClearObservation => Duration::from_millis(200),
            InitStep::CheckObservation => Duration::from_millis(50),
            InitStep::Configure => Duration::from_millis(0),
        }
    }

    pub const fn next(self) -> Option<InitStep> {
        match self {
            InitStep::PowerUp => Some(InitStep::ClearObservation),
            InitStep::ClearObservation => Some(InitStep::CheckObservation),
            InitStep::CheckObservation => Some(InitStep::Configure),
            InitStep::Configure => None,
        }
    }
}

/// Initialization state of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    /// The step is the next one to execute
    Running(InitStep),
    Ready,
    /// The step failed, the sequence never continues
    Failed(InitStep),
}

impl Default for InitState {
    fn default() -> Self {
        InitState::Running(InitStep::PowerUp)
    }
}

impl InitState {
    /// Apply the outcome of the current step
    pub fn advance(self, outcome: Result<(), Pmw3610Error>) -> InitState {
        match (self, outcome) {
            (InitState::Running(step), Ok(())) => match step.next() {
                Some(next) => InitState::Running(next),
                None => InitState::Ready,
            },
            (InitState::Running(step), Err(_)) => InitState::Failed(step),
            (terminal, _) => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InitState::Running(_))
    }
}

fn check_range(value: u32, min: u32, max: u32) -> Result<(), Pmw3610Error> {
    if value < min || value > max {
        return Err(Pmw3610Error::OutOfRange { value, min, max });
    }
    Ok(())
}

/// CPI resolution step
pub const CPI_STEP: u16 = 200;

/// Convert CPI to the RES_STEP register value, 0x1 is 200 CPI, 0x2 400 CPI, ...
pub fn cpi_register_value(cpi: u16, min: u16, max: u16) -> Result<u8, Pmw3610Error> {
    check_range(cpi as u32, min as u32, max as u32)?;
    Ok((cpi / CPI_STEP) as u8)
}

/// Registers holding the sample period of a rest mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplePeriod {
    Rest1,
    Rest2,
    Rest3,
}

impl SamplePeriod {
    pub const MIN_MS: u32 = 10;
    pub const MAX_MS: u32 = 2550;

    pub fn register(self) -> u8 {
        match self {
            SamplePeriod::Rest1 => REST1_PERIOD,
            SamplePeriod::Rest2 => REST2_PERIOD,
            SamplePeriod::Rest3 => REST3_PERIOD,
        }
    }

    /// Register value of the sample period, in units of 10ms
    pub fn register_value(self, ms: u32) -> Result<u8, Pmw3610Error> {
        check_range(ms, Self::MIN_MS, Self::MAX_MS)?;
        Ok((ms / Self::MIN_MS) as u8)
    }
}

/// Registers holding the downshift time of a power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Downshift {
    Run,
    Rest1,
    Rest2,
}

/// Rest2 sample period of the sensor, when it's not configured
const REST2_DEFAULT_SAMPLE_MS: u32 = 100;
/// Pos-mode rate, the performance register sets it to 4ms
const POS_RATE_MS: u32 = 4;

impl Downshift {
    pub fn register(self) -> u8 {
        match self {
            Downshift::Run => RUN_DOWNSHIFT,
            Downshift::Rest1 => REST1_DOWNSHIFT,
            Downshift::Rest2 => REST2_DOWNSHIFT,
        }
    }

    /// Downshift time of one register unit, in ms
    pub fn unit_ms(self, power: &PowerConfig) -> u32 {
        match self {
            // run downshift = value * 8 * pos-rate
            Downshift::Run => 8 * POS_RATE_MS,
            // rest1 downshift = value * 16 * rest1 period
            Downshift::Rest1 => 16 * power.rest1_sample_ms.max(SamplePeriod::MIN_MS),
            // rest2 downshift = value * 128 * rest2 period
            Downshift::Rest2 => {
                let period = if power.rest2_sample_ms >= SamplePeriod::MIN_MS {
                    power.rest2_sample_ms
                } else {
                    REST2_DEFAULT_SAMPLE_MS
                };
                128 * period
            }
        }
    }

    /// Valid `[min, max]` downshift time in ms
    pub fn range(self, power: &PowerConfig) -> (u32, u32) {
        let unit = self.unit_ms(power);
        (unit, unit * u8::MAX as u32)
    }

    pub fn register_value(self, ms: u32, power: &PowerConfig) -> Result<u8, Pmw3610Error> {
        let (min, max) = self.range(power);
        check_range(ms, min, max)?;
        Ok((ms / min) as u8)
    }
}
