//! Shared types used across the node firmware
//!
//! This module defines the fixed-length identity fields pushed into the
//! radio module. Each newtype only exists at its exact wire length.

use core::fmt;

use crate::config::{COORD_LEN, PAN_ID_LEN, SERIAL_HIGH_LEN, SERIAL_LOW_LEN, SESSION_KEY_LEN};

/// PAN identifier as the ASCII hex digits the radio module expects
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanId([u8; PAN_ID_LEN]);

impl PanId {
    /// PAN zero: join any network
    pub const JOIN_ANY: Self = Self(*b"0000");

    /// Create from ASCII hex digits, returns None unless every byte is a hex digit
    #[must_use]
    pub fn from_ascii(digits: &[u8]) -> Option<Self> {
        let digits: [u8; PAN_ID_LEN] = digits.try_into().ok()?;
        if digits.iter().all(u8::is_ascii_hexdigit) {
            Some(Self(digits))
        } else {
            None
        }
    }

    /// Get the digits as sent to the module
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PAN_ID_LEN] {
        &self.0
    }

    /// Numeric value of the PAN id
    #[must_use]
    pub fn value(&self) -> u16 {
        self.0.iter().fold(0u16, |acc, &d| {
            let nibble = match d {
                b'0'..=b'9' => d - b'0',
                b'a'..=b'f' => d - b'a' + 10,
                _ => d - b'A' + 10,
            };
            (acc << 4) | u16::from(nibble)
        })
    }
}

impl Default for PanId {
    fn default() -> Self {
        Self::JOIN_ANY
    }
}

impl fmt::Debug for PanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PanId(0x{:04X})", self.value())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PanId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PAN 0x{:04X}", self.value());
    }
}

/// Link (session) key pushed with `ATKY`
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Create from exactly [`SESSION_KEY_LEN`] bytes
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Get the raw key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self([0; SESSION_KEY_LEN])
    }
}

// Never print key material
impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey(..)")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SessionKey {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SessionKey(..)");
    }
}

/// Node position as two fixed-width text fields
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    x: [u8; COORD_LEN],
    y: [u8; COORD_LEN],
}

impl Coordinates {
    /// Create from the two raw fields
    #[must_use]
    pub fn from_fields(x: &[u8], y: &[u8]) -> Option<Self> {
        Some(Self {
            x: x.try_into().ok()?,
            y: y.try_into().ok()?,
        })
    }

    /// X field
    #[must_use]
    pub const fn x(&self) -> &[u8; COORD_LEN] {
        &self.x
    }

    /// Y field
    #[must_use]
    pub const fn y(&self) -> &[u8; COORD_LEN] {
        &self.y
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            x: [b'0'; COORD_LEN],
            y: [b'0'; COORD_LEN],
        }
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = core::str::from_utf8(&self.x).unwrap_or("?");
        let y = core::str::from_utf8(&self.y).unwrap_or("?");
        write!(f, "Coordinates({}, {})", x.trim(), y.trim())
    }
}

/// Identity the node pushes into its radio module
///
/// Lives for the whole node lifetime and is only mutated by the
/// configuration path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadioIdentity {
    /// Network PAN id
    pub pan_id: PanId,
    /// Link key
    pub session_key: SessionKey,
    /// Last reported position
    pub coordinates: Coordinates,
}

/// Factory serial number read from the radio module
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress {
    /// `ATSH` response digits
    pub high: [u8; SERIAL_HIGH_LEN],
    /// `ATSL` response digits
    pub low: [u8; SERIAL_LOW_LEN],
}

impl fmt::Debug for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let high = core::str::from_utf8(&self.high).unwrap_or("?");
        let low = core::str::from_utf8(&self.low).unwrap_or("?");
        write!(f, "NodeAddress({high}:{low})")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for NodeAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:a}:{=[u8]:a}", &self.high[..], &self.low[..]);
    }
}
