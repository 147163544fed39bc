//! Firmware error types
//!
//! Every fallible operation returns [`Result`]. All variants are `Copy`
//! so they travel through the control loop without allocation.

use core::fmt;

/// Result type for node operations
pub type Result<T> = core::result::Result<T, Error>;

/// Node-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No matching token arrived within the wait budget
    ProtocolTimeout,
    /// The radio module answered with `ERR`
    UnexpectedResponse,
    /// Camera identity bytes did not match the expected sensor
    DeviceMismatch {
        /// Product id read back (register 0x0A)
        vendor: u8,
        /// Version read back (register 0x0B)
        product: u8,
    },
    /// A register or link transaction was rejected
    BusTransactionFailure(Bus),
    /// The capture produced no image (dead bus or empty FIFO)
    CaptureAborted,
    /// Command, parameter and options do not fit the command descriptor
    InvalidRequest,
    /// An inbound message could not be parsed
    MalformedMessage,
}

/// Bus on which a transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// Radio UART link
    RadioLink,
    /// Camera FIFO controller (SPI)
    CameraFifo,
    /// Camera sensor configuration bus (SCCB)
    SensorConfig,
}

impl Error {
    /// True when a retry of the same operation could reasonably succeed
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::ProtocolTimeout | Self::BusTransactionFailure(_) | Self::CaptureAborted
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolTimeout => write!(f, "protocol timeout"),
            Self::UnexpectedResponse => write!(f, "unexpected response"),
            Self::DeviceMismatch { vendor, product } => {
                write!(f, "device mismatch ({vendor:#04x}:{product:#04x})")
            }
            Self::BusTransactionFailure(bus) => write!(f, "bus transaction failed on {bus}"),
            Self::CaptureAborted => write!(f, "capture aborted"),
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::MalformedMessage => write!(f, "malformed message"),
        }
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RadioLink => write!(f, "radio link"),
            Self::CameraFifo => write!(f, "camera fifo"),
            Self::SensorConfig => write!(f, "sensor config"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ProtocolTimeout => defmt::write!(f, "ProtocolTimeout"),
            Self::UnexpectedResponse => defmt::write!(f, "UnexpectedResponse"),
            Self::DeviceMismatch { vendor, product } => {
                defmt::write!(f, "DeviceMismatch(0x{:02X}:0x{:02X})", vendor, product);
            }
            Self::BusTransactionFailure(bus) => defmt::write!(f, "BusFailure({})", bus),
            Self::CaptureAborted => defmt::write!(f, "CaptureAborted"),
            Self::InvalidRequest => defmt::write!(f, "InvalidRequest"),
            Self::MalformedMessage => defmt::write!(f, "MalformedMessage"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Bus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RadioLink => defmt::write!(f, "radio"),
            Self::CameraFifo => defmt::write!(f, "fifo"),
            Self::SensorConfig => defmt::write!(f, "sccb"),
        }
    }
}
