//! Register access over the PMW3610's 3-wire SPI
//!
//! Every transaction asserts chip select, honours the datasheet settle times around it
//! and releases chip select again. Logical writes are bracketed by the SPI clock
//! enable/disable commands, so the sensor can gate its SPI clock between accesses.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

use crate::error::Pmw3610Error;
use crate::registers::*;

pub struct RegisterTransport<SPI: SpiBus, CS: OutputPin> {
    spi: SPI,
    cs: CS,
}

impl<SPI: SpiBus, CS: OutputPin> RegisterTransport<SPI, CS> {
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Release the bus and chip select pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    async fn select(&mut self) -> Result<(), Pmw3610Error> {
        self.cs.set_low().map_err(|_| Pmw3610Error::Io)?;
        Timer::after(Duration::from_micros(T_NCS_SCLK_US)).await;
        Ok(())
    }

    async fn deselect(&mut self) -> Result<(), Pmw3610Error> {
        Timer::after(Duration::from_micros(T_NCS_SCLK_US)).await;
        self.cs.set_high().map_err(|_| Pmw3610Error::Io)
    }

    /// Deassert then reassert chip select, resetting the sensor's SPI port
    pub async fn pulse_chip_select(&mut self) -> Result<(), Pmw3610Error> {
        self.deselect().await?;
        self.select().await
    }

    /// Read a single register
    pub async fn read(&mut self, addr: u8) -> Result<u8, Pmw3610Error> {
        let mut value = [0u8];
        self.read_selected(addr & 0x7f, T_SRAD_US, &mut value).await?;
        Timer::after(Duration::from_micros(T_SRX_US)).await;
        Ok(value[0])
    }

    /// Address `addr`, wait `delay_us` and read `buf`, within one chip select.
    ///
    /// Chip select is released even when the transfer fails.
    async fn read_selected(&mut self, addr: u8, delay_us: u64, buf: &mut [u8]) -> Result<(), Pmw3610Error> {
        self.select().await?;
        let transfer = match self.spi.write(&[addr]).await {
            Ok(()) => {
                Timer::after(Duration::from_micros(delay_us)).await;
                self.spi.read(buf).await
            }
            Err(e) => Err(e),
        };
        self.deselect().await?;
        transfer.map_err(|_| Pmw3610Error::Io)
    }

    /// Primitive write, without enabling the sensor's SPI clock
    async fn write_raw(&mut self, addr: u8, value: u8) -> Result<(), Pmw3610Error> {
        self.select().await?;

        let transfer = self.spi.write(&[addr | SPI_WRITE, value]).await;
        if transfer.is_ok() {
            Timer::after(Duration::from_micros(T_SCLK_NCS_WR_US)).await;
        }
        self.deselect().await?;
        transfer.map_err(|_| Pmw3610Error::Io)?;

        Timer::after(Duration::from_micros(T_SWX_US)).await;

        Ok(())
    }

    async fn spi_clk_on(&mut self) -> Result<(), Pmw3610Error> {
        self.write_raw(SPI_CLK_ON_REQ, SPI_CLOCK_ON_REQ_ON).await
    }

    async fn spi_clk_off(&mut self) -> Result<(), Pmw3610Error> {
        self.write_raw(SPI_CLK_ON_REQ, SPI_CLOCK_ON_REQ_OFF).await
    }

    /// Write a single register
    pub async fn write(&mut self, addr: u8, value: u8) -> Result<(), Pmw3610Error> {
        self.spi_clk_on().await?;
        self.write_raw(addr, value).await?;
        self.spi_clk_off().await
    }

    /// Write registers in sequence, within one SPI clock on/off bracket
    pub async fn burst_write(&mut self, addrs: &[u8], values: &[u8]) -> Result<(), Pmw3610Error> {
        self.spi_clk_on().await?;
        for (&addr, &value) in addrs.iter().zip(values.iter()) {
            if let Err(e) = self.write_raw(addr, value).await {
                error!("PMW3610: Burst write failed at register {:#02x}", addr);
                return Err(e);
            }
        }
        self.spi_clk_off().await
    }

    /// Read the motion burst frame
    pub async fn burst_read(&mut self, frame: &mut [u8; BURST_SIZE]) -> Result<(), Pmw3610Error> {
        self.read_selected(MOTION_BURST, T_SRAD_MOTBR_US, frame).await?;

        // Terminate burst
        Timer::after(Duration::from_micros(T_BEXIT_US)).await;

        Ok(())
    }
}
