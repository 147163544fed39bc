//! Radio UART
//!
//! USART1 carries the radio link. The transmit half is driven directly;
//! the receive half runs in its own task, pumping a ring-buffered DMA
//! transfer into a pipe that the receive channel drains.

use embassy_stm32::mode::Async;
use embassy_stm32::usart::{Config, RingBufferedUartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embedded_io_async::Write;

use crate::config::{RADIO_BAUD, RX_PIPE_SIZE};
use crate::error::{Bus, Error, Result};
use crate::link::receive::RxDma;
use crate::link::transmit::{LinkProfile, SerialTx};

/// Bytes received from the radio, waiting for the receive channel
pub type RxPipe = Pipe<CriticalSectionRawMutex, RX_PIPE_SIZE>;

/// UART settings for a link profile
#[must_use]
pub fn profile_config(profile: LinkProfile) -> Config {
    let mut config = Config::default();
    config.baudrate = RADIO_BAUD;
    match profile {
        LinkProfile::Command => {
            config.detect_previous_overrun = true;
        }
        // Image frames are write-only; a stale receive overrun must not abort them
        LinkProfile::Bulk => {
            config.detect_previous_overrun = false;
        }
    }
    config
}

/// Transmit half of the radio link
pub struct RadioUart {
    tx: UartTx<'static, Async>,
}

impl RadioUart {
    /// Wrap the transmit half
    #[must_use]
    pub fn new(tx: UartTx<'static, Async>) -> Self {
        Self { tx }
    }
}

impl SerialTx for RadioUart {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx
            .write_all(bytes)
            .await
            .map_err(|_| Error::BusTransactionFailure(Bus::RadioLink))?;
        self.tx
            .flush()
            .await
            .map_err(|_| Error::BusTransactionFailure(Bus::RadioLink))
    }

    fn select_profile(&mut self, profile: LinkProfile) -> Result<()> {
        self.tx
            .set_config(&profile_config(profile))
            .map_err(|_| Error::BusTransactionFailure(Bus::RadioLink))
    }
}

/// Receive side of the pipe
pub struct PipeReceiver {
    pipe: &'static RxPipe,
}

impl PipeReceiver {
    /// Drain `pipe`
    #[must_use]
    pub const fn new(pipe: &'static RxPipe) -> Self {
        Self { pipe }
    }
}

impl RxDma for PipeReceiver {
    fn restart(&mut self) {
        self.pipe.clear();
    }

    fn drain(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        self.pipe.try_read(buf).unwrap_or(0)
    }
}

/// Move received bytes into `pipe` forever
///
/// Bytes that do not fit are dropped; the receive channel only ever wants
/// the start of a transfer.
pub async fn pump_rx(mut rx: RingBufferedUartRx<'static>, pipe: &'static RxPipe) {
    let mut chunk = [0u8; 32];
    loop {
        match rx.read(&mut chunk).await {
            Ok(n) => {
                let mut rest = &chunk[..n];
                while !rest.is_empty() {
                    match pipe.try_write(rest) {
                        Ok(written) => rest = &rest[written..],
                        Err(_) => {
                            defmt::trace!("rx pipe full, dropped {} bytes", rest.len());
                            break;
                        }
                    }
                }
            }
            Err(e) => defmt::warn!("radio rx error: {}", e),
        }
    }
}
