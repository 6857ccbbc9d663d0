/// PMW3610 error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pmw3610Error {
    /// SPI bus or chip-select failure
    Io,
    /// Self-test failed, the observation register didn't report 0x0F in its low nibble
    SelfTest(u8),
    /// Invalid product ID detected
    InvalidProductId(u8),
    /// Requested CPI, sample period or downshift time is outside of its range
    OutOfRange { value: u32, min: u32, max: u32 },
    /// Sampling was requested before the init sequence completed
    NotReady,
    /// The resolved input mode has no handler
    UnsupportedMode,
}

impl Pmw3610Error {
    /// Whether the error is one of the self-test failures which halt the init sequence
    pub fn is_self_test_failure(&self) -> bool {
        matches!(self, Pmw3610Error::SelfTest(_) | Pmw3610Error::InvalidProductId(_))
    }
}
