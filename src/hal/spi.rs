//! Camera FIFO SPI
//!
//! ArduCAM-style register protocol: the first byte of every transaction is
//! the register address, with bit 7 set for writes.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

use crate::camera::fifo::FifoBus;
use crate::error::{Bus, Error, Result};

const WRITE_FLAG: u8 = 0x80;

fn fault<E>(_: E) -> Error {
    Error::BusTransactionFailure(Bus::CameraFifo)
}

/// FIFO controller on an SPI bus with a dedicated chip select
pub struct ArducamSpi<B, CS> {
    spi: B,
    cs: CS,
}

impl<B, CS> ArducamSpi<B, CS>
where
    B: SpiBus,
    CS: OutputPin,
{
    /// Create the bus; chip select is released
    pub fn new(spi: B, mut cs: CS) -> Self {
        // Chip select failures surface on the first transaction
        let _ = cs.set_high();
        Self { spi, cs }
    }

    async fn transaction(&mut self, header: &[u8], read: &mut [u8]) -> Result<()> {
        self.cs.set_low().map_err(fault)?;
        let result = async {
            self.spi.write(header).await?;
            if !read.is_empty() {
                self.spi.read(read).await?;
            }
            self.spi.flush().await
        }
        .await;
        self.cs.set_high().map_err(fault)?;
        result.map_err(fault)
    }
}

impl<B, CS> FifoBus for ArducamSpi<B, CS>
where
    B: SpiBus,
    CS: OutputPin,
{
    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        self.transaction(&[reg | WRITE_FLAG, value], &mut []).await
    }

    async fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let mut value = [0u8];
        self.transaction(&[reg & !WRITE_FLAG], &mut value).await?;
        Ok(value[0])
    }

    async fn burst_read(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.transaction(&[reg & !WRITE_FLAG], buf).await
    }
}
