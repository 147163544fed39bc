//! SCCB Bus
//!
//! The OV2640 configuration bus. SCCB is I2C-compatible for writes but does
//! not support repeated starts, so register reads are a write followed by a
//! separate read.

use embedded_hal_async::i2c::I2c;

use crate::camera::sensor::SensorBus;
use crate::config::OV2640_SCCB_ADDR;
use crate::error::{Bus, Error, Result};

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// OV2640 image sensor address
    pub const OV2640: Self = Self(OV2640_SCCB_ADDR);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// SCCB register access over any async I2C bus
pub struct SccbBus<I> {
    i2c: I,
    addr: I2cAddress,
}

impl<I: I2c> SccbBus<I> {
    /// Create a bus for the device at `addr`
    #[must_use]
    pub const fn new(i2c: I, addr: I2cAddress) -> Self {
        Self { i2c, addr }
    }

    /// Device address
    #[must_use]
    pub const fn address(&self) -> I2cAddress {
        self.addr
    }
}

fn nack<E>(_: E) -> Error {
    Error::BusTransactionFailure(Bus::SensorConfig)
}

impl<I: I2c> SensorBus for SccbBus<I> {
    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.addr.addr(), &[reg, value])
            .await
            .map_err(nack)
    }

    async fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let mut buf = [0u8];
        self.i2c.write(self.addr.addr(), &[reg]).await.map_err(nack)?;
        self.i2c.read(self.addr.addr(), &mut buf).await.map_err(nack)?;
        Ok(buf[0])
    }
}
