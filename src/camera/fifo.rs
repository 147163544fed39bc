//! FIFO Controller Capture
//!
//! Triggers one capture on the camera's FIFO controller and drains the
//! encoded image into an [`ImageBuffer`].

use crate::config::{
    CAPTURE_POLL_US, CAPTURE_TIMEOUT_MS, FIFO_CAPTURE_DONE, FIFO_LIVENESS_SENTINEL,
    FIFO_SIZE_MASK, IMAGE_MARKER,
};
use crate::error::{Error, Result};
use crate::timing::{Clock, Deadline, WaitState};

/// FIFO controller register addresses
pub mod reg {
    /// Scratch register used for the liveness check
    pub const TEST: u8 = 0x00;
    /// FIFO control (clear done flag, start capture)
    pub const FIFO_CONTROL: u8 = 0x04;
    /// Burst FIFO read
    pub const BURST_FIFO: u8 = 0x3C;
    /// Trigger / status
    pub const STATUS: u8 = 0x41;
    /// FIFO size bits 0..8
    pub const FIFO_SIZE_LOW: u8 = 0x42;
    /// FIFO size bits 8..16
    pub const FIFO_SIZE_MID: u8 = 0x43;
    /// FIFO size bits 16..23
    pub const FIFO_SIZE_HIGH: u8 = 0x44;

    /// `FIFO_CONTROL`: clear the capture-done flag
    pub const CLEAR_DONE: u8 = 0x01;
    /// `FIFO_CONTROL`: start a capture
    pub const START_CAPTURE: u8 = 0x02;
}

/// Register bus to the FIFO controller
#[allow(async_fn_in_trait)]
pub trait FifoBus {
    /// Write one register
    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<()>;

    /// Read one register
    async fn read_reg(&mut self, reg: u8) -> Result<u8>;

    /// Read `buf.len()` bytes from a streaming register
    async fn burst_read(&mut self, reg: u8, buf: &mut [u8]) -> Result<()>;
}

/// Capture completion budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Budget for the done flag after starting a capture
    pub timeout_ms: u32,
    /// Pause between status polls
    pub poll_us: u32,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            timeout_ms: CAPTURE_TIMEOUT_MS,
            poll_us: CAPTURE_POLL_US,
        }
    }
}

/// Compose the 23-bit FIFO size and clamp it to `capacity`
#[must_use]
pub fn compose_size(low: u8, mid: u8, high: u8, capacity: usize) -> usize {
    let raw = ((u32::from(high) << 16) | (u32::from(mid) << 8) | u32::from(low)) & FIFO_SIZE_MASK;
    (raw as usize).min(capacity)
}

/// Image storage: a marker slot followed by the payload
///
/// The capture only ever writes the payload; the marker is stamped when
/// the outbound frame is built.
pub struct ImageBuffer<'a> {
    storage: &'a mut [u8],
}

impl<'a> ImageBuffer<'a> {
    /// Wrap caller storage; returns None if there is no room for a payload
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Option<Self> {
        (storage.len() > 1).then_some(Self { storage })
    }

    /// Payload capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len() - 1
    }

    /// Payload region
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.storage[1..]
    }

    /// Mutable payload region
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.storage[1..]
    }

    /// Stamp the marker and return marker plus the first `len` payload bytes
    pub fn frame(&mut self, len: usize) -> &[u8] {
        let len = len.min(self.capacity());
        self.storage[0] = IMAGE_MARKER;
        &self.storage[..=len]
    }
}

/// Capture driver for the FIFO controller
pub struct CameraCapture<B> {
    bus: B,
    timing: CaptureTiming,
}

impl<B: FifoBus> CameraCapture<B> {
    /// Create a capture driver
    #[must_use]
    pub const fn new(bus: B, timing: CaptureTiming) -> Self {
        Self { bus, timing }
    }

    /// Capture one image into the payload region of `image`
    ///
    /// Returns the number of payload bytes, never zero.
    ///
    /// # Errors
    ///
    /// - [`Error::CaptureAborted`] if the liveness readback mismatches or
    ///   the FIFO reports an empty image
    /// - [`Error::ProtocolTimeout`] if the done flag never rises
    /// - any bus failure
    pub async fn capture<C: Clock>(
        &mut self,
        clock: &mut C,
        image: &mut ImageBuffer<'_>,
    ) -> Result<usize> {
        self.check_alive().await?;

        self.bus.write_reg(reg::FIFO_CONTROL, reg::CLEAR_DONE).await?;
        self.bus
            .write_reg(reg::FIFO_CONTROL, reg::START_CAPTURE)
            .await?;
        self.wait_done(clock).await?;

        let low = self.bus.read_reg(reg::FIFO_SIZE_LOW).await?;
        let mid = self.bus.read_reg(reg::FIFO_SIZE_MID).await?;
        let high = self.bus.read_reg(reg::FIFO_SIZE_HIGH).await?;
        let size = compose_size(low, mid, high, image.capacity());
        if size == 0 {
            warn!("capture: fifo reported no data");
            return Err(Error::CaptureAborted);
        }

        self.bus
            .burst_read(reg::BURST_FIFO, &mut image.payload_mut()[..size])
            .await?;
        debug!("capture: {} bytes", size);
        Ok(size)
    }

    /// Access the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    async fn check_alive(&mut self) -> Result<()> {
        self.bus.write_reg(reg::TEST, FIFO_LIVENESS_SENTINEL).await?;
        let echo = self.bus.read_reg(reg::TEST).await?;
        if echo == FIFO_LIVENESS_SENTINEL {
            Ok(())
        } else {
            warn!("capture: fifo test register read 0x{:02X}", echo);
            Err(Error::CaptureAborted)
        }
    }

    async fn wait_done<C: Clock>(&mut self, clock: &mut C) -> Result<()> {
        let deadline = Deadline::start_ms(&*clock, self.timing.timeout_ms);
        loop {
            let status = self.bus.read_reg(reg::STATUS).await?;
            let probe = (status & FIFO_CAPTURE_DONE != 0).then_some(());
            match deadline.poll(&*clock, probe) {
                WaitState::Ready(()) => return Ok(()),
                WaitState::TimedOut => {
                    warn!("capture: done flag timeout");
                    return Err(Error::ProtocolTimeout);
                }
                WaitState::NotYet => clock.pause_us(self.timing.poll_us).await,
            }
        }
    }
}
