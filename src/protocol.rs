//! Communication Protocols
//!
//! Inbound command-channel messages from the coordinator. Every message
//! starts with one opcode byte; a zero byte means nothing was received.

use crate::config::{COORD_LEN, OPCODE_CAPTURE, OPCODE_SESSION_KEY, PAN_ID_LEN, SESSION_KEY_LEN};
use crate::error::{Error, Result};
use crate::types::{Coordinates, PanId, RadioIdentity, SessionKey};

/// Opcode of an inbound message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InboundCommand {
    /// Zero byte, no message
    Empty,
    /// Rotate PAN id and session key
    UpdateSessionKey,
    /// Capture and send an image
    CaptureImage,
    /// Anything else
    Unknown(u8),
}

impl InboundCommand {
    /// Classify an opcode byte
    #[must_use]
    pub const fn from_opcode(opcode: u8) -> Self {
        match opcode {
            0 => Self::Empty,
            OPCODE_SESSION_KEY => Self::UpdateSessionKey,
            OPCODE_CAPTURE => Self::CaptureImage,
            other => Self::Unknown(other),
        }
    }

    /// Total message length including the opcode, when known
    #[must_use]
    pub const fn message_len(self) -> Option<usize> {
        match self {
            Self::UpdateSessionKey => Some(ConfigUpdate::WIRE_LEN),
            Self::CaptureImage => Some(1),
            Self::Empty | Self::Unknown(_) => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for InboundCommand {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Empty => defmt::write!(f, "Empty"),
            Self::UpdateSessionKey => defmt::write!(f, "UpdateSessionKey"),
            Self::CaptureImage => defmt::write!(f, "CaptureImage"),
            Self::Unknown(op) => defmt::write!(f, "Unknown(0x{:02X})", op),
        }
    }
}

/// Payload of an `UpdateSessionKey` message
///
/// Layout: opcode, PAN id as 4 ASCII hex digits, 32-byte session key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigUpdate {
    /// New PAN id
    pub pan_id: PanId,
    /// New link key
    pub session_key: SessionKey,
}

impl ConfigUpdate {
    /// Message length including the opcode
    pub const WIRE_LEN: usize = 1 + PAN_ID_LEN + SESSION_KEY_LEN;

    /// Parse a full message, opcode included
    ///
    /// Bytes past [`Self::WIRE_LEN`] are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMessage`] if the message is short, carries
    /// another opcode, or the PAN id is not hex.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let (&opcode, body) = bytes.split_first().ok_or(Error::MalformedMessage)?;
        if opcode != OPCODE_SESSION_KEY || body.len() < PAN_ID_LEN + SESSION_KEY_LEN {
            return Err(Error::MalformedMessage);
        }

        let (pan, rest) = body.split_at(PAN_ID_LEN);
        let pan_id = PanId::from_ascii(pan).ok_or(Error::MalformedMessage)?;
        let session_key =
            SessionKey::from_slice(&rest[..SESSION_KEY_LEN]).ok_or(Error::MalformedMessage)?;

        Ok(Self {
            pan_id,
            session_key,
        })
    }

    /// Identity with this update applied, coordinates kept
    #[must_use]
    pub fn apply_to(&self, identity: &RadioIdentity) -> RadioIdentity {
        RadioIdentity {
            pan_id: self.pan_id,
            session_key: self.session_key,
            ..*identity
        }
    }
}

impl Coordinates {
    /// Message length including the leading opcode byte
    pub const WIRE_LEN: usize = 1 + 2 * COORD_LEN;

    /// Parse the two coordinate fields following the opcode byte
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMessage`] if the message is short.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let fields = bytes
            .get(1..Self::WIRE_LEN)
            .ok_or(Error::MalformedMessage)?;
        let (x, y) = fields.split_at(COORD_LEN);
        Self::from_fields(x, y).ok_or(Error::MalformedMessage)
    }
}
