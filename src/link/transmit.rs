//! Transmitter
//!
//! Byte-stream sender to the radio module. Command traffic runs on the
//! command timing profile; image transfers temporarily switch the link to a
//! bulk profile and always switch back.

use crate::error::Result;

/// Link timing profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkProfile {
    /// Command channel: AT traffic and short control messages
    #[default]
    Command,
    /// Sustained throughput for image transfers
    Bulk,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkProfile {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Command => defmt::write!(f, "CMD"),
            Self::Bulk => defmt::write!(f, "BULK"),
        }
    }
}

/// Transmit half of the serial link
#[allow(async_fn_in_trait)]
pub trait SerialTx {
    /// Write all bytes, waiting for transmit-ready before each one
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Reconfigure the link timing
    fn select_profile(&mut self, profile: LinkProfile) -> Result<()>;
}

/// Sender owning the transmit half and its current profile
pub struct Transmitter<T> {
    tx: T,
    profile: LinkProfile,
    bytes_sent: u32,
}

impl<T: SerialTx> Transmitter<T> {
    /// Create a transmitter; the link is assumed to be on the command profile
    #[must_use]
    pub const fn new(tx: T) -> Self {
        Self {
            tx,
            profile: LinkProfile::Command,
            bytes_sent: 0,
        }
    }

    /// Send bytes on the command profile
    pub async fn send_control(&mut self, bytes: &[u8]) -> Result<()> {
        if self.profile != LinkProfile::Command {
            self.switch(LinkProfile::Command)?;
        }
        self.tx.write(bytes).await?;
        self.count(bytes.len());
        Ok(())
    }

    /// Send bytes on the bulk profile, then restore the command profile
    ///
    /// The command profile is restored even if the write fails; the write
    /// error takes precedence over a restore error.
    pub async fn send_bulk(&mut self, bytes: &[u8]) -> Result<()> {
        self.switch(LinkProfile::Bulk)?;
        let written = self.tx.write(bytes).await;
        let restored = self.switch(LinkProfile::Command);

        written?;
        restored?;
        self.count(bytes.len());
        debug!("bulk sent {} bytes", bytes.len());
        Ok(())
    }

    /// Currently selected profile
    #[must_use]
    pub const fn profile(&self) -> LinkProfile {
        self.profile
    }

    /// Total bytes sent successfully (wrapping)
    #[must_use]
    pub const fn bytes_sent(&self) -> u32 {
        self.bytes_sent
    }

    /// Access the transmit port
    pub fn port_mut(&mut self) -> &mut T {
        &mut self.tx
    }

    fn switch(&mut self, profile: LinkProfile) -> Result<()> {
        self.tx.select_profile(profile)?;
        self.profile = profile;
        Ok(())
    }

    fn count(&mut self, len: usize) {
        self.bytes_sent = self.bytes_sent.wrapping_add(len as u32);
    }
}
