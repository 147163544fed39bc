//! AT Command Set
//!
//! The closed set of radio module commands the node issues, their parameter
//! rules, and the validated request that the engine executes.

use heapless::Vec;

use crate::config::{AT_ERR, AT_LINE_MAX, AT_OK, AT_TERMINATOR};
use crate::error::{Error, Result};

/// Whether a command carries a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterRule {
    /// Never takes a parameter
    None,
    /// Parameter is sent only when the request says so
    Optional,
    /// Parameter must always be sent
    Required,
}

/// Immutable description of one AT command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command name as sent, including the `AT` prefix
    pub name: &'static [u8],
    /// Parameter rule
    pub rule: ParameterRule,
    /// Parameter length on write, or response length on read
    pub parameter_len: usize,
}

impl CommandDescriptor {
    const fn new(name: &'static [u8], rule: ParameterRule, parameter_len: usize) -> Self {
        Self {
            name,
            rule,
            parameter_len,
        }
    }

    /// Two-letter mnemonic, empty for the bare attention command
    #[must_use]
    pub fn mnemonic(&self) -> &'static [u8] {
        let name = self.name;
        name.get(2..).unwrap_or(&[])
    }
}

/// Radio module AT commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtCommand {
    /// `AT`: attention / no-op
    Attention,
    /// `WR`: persist settings to non-volatile memory
    Write,
    /// `RE`: restore factory defaults
    Restore,
    /// `AC`: apply queued changes
    Apply,
    /// `BD`: interface data rate
    BaudRate,
    /// `SB`: stop bits
    StopBits,
    /// `RO`: packetization timeout
    PacketTimeout,
    /// `EE`: encryption enable
    EncryptionEnable,
    /// `DH`: destination address high
    DestinationHigh,
    /// `DL`: destination address low
    DestinationLow,
    /// `KY`: link key
    LinkKey,
    /// `CN`: exit command mode
    Exit,
    /// `CT`: command mode timeout
    CommandTimeout,
    /// `ID`: configured PAN id
    PanId,
    /// `OI`: operating PAN id
    OperatingPanId,
    /// `SH`: serial number high
    SerialHigh,
    /// `SL`: serial number low
    SerialLow,
    /// `JV`: channel verification on join
    JoinVerify,
    /// `NR`: network reset
    NetworkReset,
}

impl AtCommand {
    /// Get the command's descriptor
    #[must_use]
    pub const fn descriptor(self) -> CommandDescriptor {
        use ParameterRule::{None, Optional, Required};

        match self {
            Self::Attention => CommandDescriptor::new(b"AT", None, 0),
            Self::Write => CommandDescriptor::new(b"ATWR", None, 0),
            Self::Restore => CommandDescriptor::new(b"ATRE", None, 0),
            Self::Apply => CommandDescriptor::new(b"ATAC", None, 0),
            Self::BaudRate => CommandDescriptor::new(b"ATBD", Optional, 1),
            Self::StopBits => CommandDescriptor::new(b"ATSB", Required, 1),
            Self::PacketTimeout => CommandDescriptor::new(b"ATRO", None, 0),
            Self::EncryptionEnable => CommandDescriptor::new(b"ATEE", Required, 1),
            Self::DestinationHigh => CommandDescriptor::new(b"ATDH", Optional, 8),
            Self::DestinationLow => CommandDescriptor::new(b"ATDL", Optional, 8),
            Self::LinkKey => CommandDescriptor::new(b"ATKY", Required, 32),
            Self::Exit => CommandDescriptor::new(b"ATCN", None, 0),
            Self::CommandTimeout => CommandDescriptor::new(b"ATCT", Optional, 2),
            Self::PanId => CommandDescriptor::new(b"ATID", Optional, 4),
            Self::OperatingPanId => CommandDescriptor::new(b"ATOI", None, 4),
            Self::SerialHigh => CommandDescriptor::new(b"ATSH", None, 6),
            Self::SerialLow => CommandDescriptor::new(b"ATSL", None, 8),
            Self::JoinVerify => CommandDescriptor::new(b"ATJV", Optional, 1),
            Self::NetworkReset => CommandDescriptor::new(b"ATNR", Optional, 1),
        }
    }

    /// Full command name as sent
    #[must_use]
    pub const fn name(self) -> &'static [u8] {
        self.descriptor().name
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AtCommand {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:a}", self.name());
    }
}

/// Per-request flags
///
/// Every combination is legal; `expect_read` switches the success criterion
/// from the OK token to a terminated payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Follow with `ATWR`
    pub persist: bool,
    /// Follow with `ATAC`
    pub apply: bool,
    /// Send the parameter of an optional-parameter command
    pub parameter_present: bool,
    /// Read a fixed-length response instead of waiting for OK
    pub expect_read: bool,
}

impl CommandOptions {
    /// No flags set
    pub const NONE: Self = Self {
        persist: false,
        apply: false,
        parameter_present: false,
        expect_read: false,
    };

    /// Write a parameter, persist it and apply it
    pub const WRITE_APPLY: Self = Self {
        persist: true,
        apply: true,
        parameter_present: true,
        expect_read: false,
    };

    /// Read a register value
    pub const READ: Self = Self {
        persist: false,
        apply: false,
        parameter_present: false,
        expect_read: true,
    };

    /// Set the persist flag
    #[must_use]
    pub const fn persist(mut self) -> Self {
        self.persist = true;
        self
    }

    /// Set the apply flag
    #[must_use]
    pub const fn apply(mut self) -> Self {
        self.apply = true;
        self
    }

    /// Set the parameter-present flag
    #[must_use]
    pub const fn with_parameter(mut self) -> Self {
        self.parameter_present = true;
        self
    }

    /// Set the expect-read flag
    #[must_use]
    pub const fn read(mut self) -> Self {
        self.expect_read = true;
        self
    }
}

/// A command whose parameter and options agree with its descriptor
#[derive(Clone, Copy, Debug)]
pub struct AtRequest<'a> {
    command: AtCommand,
    parameter: Option<&'a [u8]>,
    options: CommandOptions,
}

impl<'a> AtRequest<'a> {
    /// Validate a request
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the parameter's presence or
    /// length contradicts the descriptor or the options.
    pub fn new(
        command: AtCommand,
        parameter: Option<&'a [u8]>,
        options: CommandOptions,
    ) -> Result<Self> {
        let descriptor = command.descriptor();

        let sends_parameter = match descriptor.rule {
            ParameterRule::None => false,
            ParameterRule::Required => true,
            ParameterRule::Optional => options.parameter_present,
        };

        match (sends_parameter, parameter) {
            (true, Some(bytes)) if bytes.len() == descriptor.parameter_len => {}
            (false, None) => {}
            _ => return Err(Error::InvalidRequest),
        }

        Ok(Self {
            command,
            parameter,
            options,
        })
    }

    /// Request with no parameter
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the command requires a parameter.
    pub fn bare(command: AtCommand, options: CommandOptions) -> Result<Self> {
        Self::new(command, None, options)
    }

    /// Read request for a register value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the command requires a parameter.
    pub fn read(command: AtCommand) -> Result<Self> {
        Self::new(command, None, CommandOptions::READ)
    }

    /// Write request that persists and applies the value
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the command takes no parameter or
    /// the value has the wrong length.
    pub fn write_apply(command: AtCommand, value: &'a [u8]) -> Result<Self> {
        Self::new(command, Some(value), CommandOptions::WRITE_APPLY)
    }

    /// Command being issued
    #[must_use]
    pub const fn command(&self) -> AtCommand {
        self.command
    }

    /// Parameter bytes, if sent
    #[must_use]
    pub const fn parameter(&self) -> Option<&'a [u8]> {
        self.parameter
    }

    /// Request options
    #[must_use]
    pub const fn options(&self) -> CommandOptions {
        self.options
    }

    /// Build the `AT<op><param?>\r` line
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the line does not fit.
    pub fn encode(&self) -> Result<Vec<u8, AT_LINE_MAX>> {
        let mut line = Vec::new();
        line.extend_from_slice(self.command.name())
            .map_err(|()| Error::InvalidRequest)?;
        if let Some(parameter) = self.parameter {
            line.extend_from_slice(parameter)
                .map_err(|()| Error::InvalidRequest)?;
        }
        line.push(AT_TERMINATOR)
            .map_err(|_| Error::InvalidRequest)?;
        Ok(line)
    }
}

/// Result of scanning a response window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// `OK\r` found
    Ok,
    /// `ERR` found
    Err,
}

/// Find the first status token in a response window
///
/// The whole window is scanned on every call; whichever token starts first
/// decides the outcome.
#[must_use]
pub fn scan_status(bytes: &[u8]) -> Option<Status> {
    bytes.windows(3).find_map(|w| {
        if w == AT_OK {
            Some(Status::Ok)
        } else if w == AT_ERR {
            Some(Status::Err)
        } else {
            None
        }
    })
}

/// Position of the first command terminator
#[must_use]
pub fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == AT_TERMINATOR)
}
