//! Receive Channel
//!
//! Owns the single shared receive buffer. Bytes arrive through a DMA-style
//! producer ([`RxDma`]) and are only visible for the transfer armed most
//! recently.

use crate::config::RX_BUFFER_SIZE;

/// DMA-backed receive path feeding the channel
pub trait RxDma {
    /// Abort the current transfer and start a fresh one, dropping in-flight bytes
    fn restart(&mut self);

    /// Move bytes deposited since the last call into `buf`, returning the count
    ///
    /// Must never block.
    fn drain(&mut self, buf: &mut [u8]) -> usize;
}

/// Borrowed view of the bytes received since the last arm
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    bytes: &'a [u8],
    generation: u32,
}

impl<'a> Snapshot<'a> {
    /// Received bytes, oldest first
    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Arm generation these bytes belong to
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of bytes received
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing has arrived yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The node's single receive buffer and its re-arm discipline
pub struct ReceiveChannel<D, const N: usize = RX_BUFFER_SIZE> {
    dma: D,
    buffer: [u8; N],
    fill: usize,
    capacity: usize,
    generation: u32,
}

impl<D: RxDma, const N: usize> ReceiveChannel<D, N> {
    /// Create a channel; nothing is received until the first [`arm`](Self::arm)
    #[must_use]
    pub const fn new(dma: D) -> Self {
        Self {
            dma,
            buffer: [0; N],
            fill: 0,
            capacity: 0,
            generation: 0,
        }
    }

    /// Clear the buffer and start receiving up to `capacity` bytes
    ///
    /// Returns immediately. Any borrowed [`Snapshot`] must be dropped first,
    /// so bytes of an older transfer can never be read as a newer response.
    pub fn arm(&mut self, capacity: usize) {
        self.buffer.fill(0);
        self.fill = 0;
        self.capacity = capacity.min(N);
        self.generation = self.generation.wrapping_add(1);
        self.dma.restart();
        trace!("rx armed gen={} cap={}", self.generation, self.capacity);
    }

    /// First byte of the current transfer, if anything has arrived
    pub fn peek_opcode(&mut self) -> Option<u8> {
        self.pump();
        (self.fill > 0).then(|| self.buffer[0])
    }

    /// Everything received since the last arm
    pub fn snapshot(&mut self) -> Snapshot<'_> {
        self.pump();
        Snapshot {
            bytes: &self.buffer[..self.fill],
            generation: self.generation,
        }
    }

    /// Bytes received since the last arm
    pub fn len(&mut self) -> usize {
        self.pump();
        self.fill
    }

    /// Check if nothing has arrived since the last arm
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Capacity of the transfer currently armed
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of arms so far (wrapping)
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Access the DMA port
    pub fn dma_mut(&mut self) -> &mut D {
        &mut self.dma
    }

    /// Pull newly deposited bytes; a full transfer stops accepting data
    fn pump(&mut self) {
        if self.fill < self.capacity {
            let received = self.dma.drain(&mut self.buffer[self.fill..self.capacity]);
            self.fill = (self.fill + received).min(self.capacity);
        }
    }
}
