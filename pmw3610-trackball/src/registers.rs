//! PMW3610 register map, command values and SPI timing

// ============================================================================
// Page 0 registers
// ============================================================================
pub const PRODUCT_ID: u8 = 0x00;
pub const MOTION: u8 = 0x02;
pub const DELTA_X_L: u8 = 0x03;
pub const DELTA_Y_L: u8 = 0x04;
pub const DELTA_XY_H: u8 = 0x05;
pub const PERFORMANCE: u8 = 0x11;
pub const MOTION_BURST: u8 = 0x12;
pub const RUN_DOWNSHIFT: u8 = 0x1b;
pub const REST1_PERIOD: u8 = 0x1c;
pub const REST1_DOWNSHIFT: u8 = 0x1d;
pub const REST2_PERIOD: u8 = 0x1e;
pub const REST2_DOWNSHIFT: u8 = 0x1f;
pub const REST3_PERIOD: u8 = 0x20;
pub const OBSERVATION: u8 = 0x2d;
pub const SMART_MODE: u8 = 0x32;
pub const POWER_UP_RESET: u8 = 0x3a;
pub const SPI_CLK_ON_REQ: u8 = 0x41;
pub const SPI_PAGE: u8 = 0x7f;

// ============================================================================
// Page 1 registers
// ============================================================================
pub const RES_STEP: u8 = 0x05;

// ============================================================================
// Burst frame offsets
// ============================================================================
pub const BURST_MOTION: usize = 0;
pub const BURST_DELTA_X_L: usize = 1;
pub const BURST_DELTA_Y_L: usize = 2;
pub const BURST_DELTA_XY_H: usize = 3;
pub const BURST_SQUAL: usize = 4;
pub const BURST_SHUTTER_HI: usize = 5;
pub const BURST_SHUTTER_LO: usize = 6;
pub const BURST_SIZE: usize = BURST_SHUTTER_LO + 1;

// ============================================================================
// Constants
// ============================================================================
pub const PRODUCT_ID_PMW3610: u8 = 0x3e;
pub const SPI_WRITE: u8 = 0x80;
pub const POWER_UP_RESET_VAL: u8 = 0x5a;
pub const SPI_CLOCK_ON_REQ_ON: u8 = 0xba;
pub const SPI_CLOCK_ON_REQ_OFF: u8 = 0xb5;
pub const SPI_PAGE0_1: u8 = 0xff;
pub const SPI_PAGE1_0: u8 = 0x00;
pub const OBSERVATION_SELF_TEST_MASK: u8 = 0x0f;
pub const PERFORMANCE_INIT: u8 = 0x0d;
pub const PERFORMANCE_FMODE_FORCE_AWAKE: u8 = 0x0f << 4;
pub const SMART_MODE_ENABLE: u8 = 0x00;
pub const SMART_MODE_DISABLE: u8 = 0x80;
pub const SHUTTER_SMART_THRESHOLD: u16 = 45;

// SPI timing constants (from PMW3610 datasheet), in microseconds
pub const T_NCS_SCLK_US: u64 = 1;
pub const T_SCLK_NCS_WR_US: u64 = 20;
pub const T_SRAD_US: u64 = 5;
pub const T_SRAD_MOTBR_US: u64 = 5;
pub const T_SRX_US: u64 = 2;
pub const T_SWX_US: u64 = 35;
pub const T_BEXIT_US: u64 = 2;
