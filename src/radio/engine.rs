//! AT Command Engine
//!
//! Drives one AT request through the radio module's command mode:
//! escape, command, optional persist and apply, exit. Every response is
//! parsed from a receive transfer armed right before the message that
//! provokes it.
//!
//! A failure after the escape sequence has gone out leaves the module in
//! command mode, so the engine always tries to leave it again with `ATCN`
//! before reporting the original failure.

use heapless::Vec;

use crate::config::{
    AT_ESCAPE, AT_LINE_MAX, ESCAPE_GUARD_MS, ESCAPE_TIMEOUT_MS, POLL_INTERVAL_US,
    RESPONSE_TIMEOUT_MS, RX_BUFFER_SIZE,
};
use crate::error::{Error, Result};
use crate::link::receive::{ReceiveChannel, RxDma};
use crate::link::transmit::{SerialTx, Transmitter};
use crate::radio::command::{
    find_terminator, scan_status, AtCommand, AtRequest, CommandOptions, Status,
};
use crate::timing::{Clock, Deadline, WaitState};

/// Wait budgets used by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineTiming {
    /// Budget for OK/ERR or a terminator after each command
    pub response_timeout_ms: u32,
    /// Budget for the reply to the escape sequence
    pub escape_timeout_ms: u32,
    /// Silence kept before the escape sequence
    pub escape_guard_ms: u32,
    /// Pause between two scans of the receive buffer
    pub poll_interval_us: u32,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            response_timeout_ms: RESPONSE_TIMEOUT_MS,
            escape_timeout_ms: ESCAPE_TIMEOUT_MS,
            escape_guard_ms: ESCAPE_GUARD_MS,
            poll_interval_us: POLL_INTERVAL_US,
        }
    }
}

/// AT command engine
///
/// Borrows the link for the duration of a provisioning sequence; nothing
/// else may touch the receive channel or the transmitter meanwhile.
pub struct RadioCommandEngine<'a, D, T, C> {
    rx: &'a mut ReceiveChannel<D>,
    tx: &'a mut Transmitter<T>,
    clock: &'a mut C,
    timing: EngineTiming,
}

impl<'a, D, T, C> RadioCommandEngine<'a, D, T, C>
where
    D: RxDma,
    T: SerialTx,
    C: Clock,
{
    /// Create an engine over the link
    pub fn new(
        rx: &'a mut ReceiveChannel<D>,
        tx: &'a mut Transmitter<T>,
        clock: &'a mut C,
        timing: EngineTiming,
    ) -> Self {
        Self {
            rx,
            tx,
            clock,
            timing,
        }
    }

    /// Run a request whose response carries no payload
    ///
    /// With `expect_read` set the payload is awaited but discarded.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the sequence; see [`Error`].
    pub async fn execute(&mut self, request: &AtRequest<'_>) -> Result<()> {
        let line = request.encode()?;
        self.guarded(request, &line, None).await
    }

    /// Run a read request, copying the payload into `response`
    ///
    /// Returns the number of bytes written, always the descriptor's
    /// parameter length. `response` is untouched unless the whole sequence
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without touching the link if the
    /// request is not a read or `response` is too small, otherwise the first
    /// failure of the sequence.
    pub async fn query(&mut self, request: &AtRequest<'_>, response: &mut [u8]) -> Result<usize> {
        let len = request.command().descriptor().parameter_len;
        if !request.options().expect_read || response.len() < len {
            return Err(Error::InvalidRequest);
        }

        let line = request.encode()?;
        let mut staged = Vec::new();
        self.guarded(request, &line, Some(&mut staged)).await?;

        response[..len].copy_from_slice(&staged);
        Ok(len)
    }

    /// Timing in use
    #[must_use]
    pub const fn timing(&self) -> EngineTiming {
        self.timing
    }

    /// Pause on the engine's clock
    pub async fn pause_ms(&mut self, ms: u32) {
        self.clock.pause_ms(ms).await;
    }

    async fn guarded(
        &mut self,
        request: &AtRequest<'_>,
        line: &[u8],
        staged: Option<&mut Vec<u8, AT_LINE_MAX>>,
    ) -> Result<()> {
        let command = request.command();
        debug!("at {} begin", command);

        let outcome = self.sequence(request, line, staged).await;
        match outcome {
            Ok(()) => debug!("at {} ok", command),
            Err(e) => {
                warn!("at {} failed: {}", command, e);
                self.recover().await;
            }
        }
        outcome
    }

    async fn sequence(
        &mut self,
        request: &AtRequest<'_>,
        line: &[u8],
        staged: Option<&mut Vec<u8, AT_LINE_MAX>>,
    ) -> Result<()> {
        self.enter_command_mode().await?;

        self.rx.arm(RX_BUFFER_SIZE);
        self.tx.send_control(line).await?;

        if request.options().expect_read {
            let len = request.command().descriptor().parameter_len;
            self.read_payload(len, staged).await?;
        } else {
            self.wait_ok(self.timing.response_timeout_ms).await?;
        }

        if request.options().persist {
            self.simple(AtCommand::Write).await?;
        }
        if request.options().apply {
            self.simple(AtCommand::Apply).await?;
        }
        self.simple(AtCommand::Exit).await
    }

    async fn enter_command_mode(&mut self) -> Result<()> {
        self.clock.pause_ms(self.timing.escape_guard_ms).await;
        self.rx.arm(RX_BUFFER_SIZE);
        self.tx.send_control(AT_ESCAPE).await?;
        self.wait_ok(self.timing.escape_timeout_ms).await
    }

    /// Issue a parameterless command and wait for OK
    async fn simple(&mut self, command: AtCommand) -> Result<()> {
        let line = AtRequest::bare(command, CommandOptions::NONE)?.encode()?;

        self.rx.arm(RX_BUFFER_SIZE);
        self.tx.send_control(&line).await?;
        self.wait_ok(self.timing.response_timeout_ms).await
    }

    /// Best-effort exit from command mode; the result is only logged
    async fn recover(&mut self) {
        match self.simple(AtCommand::Exit).await {
            Ok(()) => info!("at recovery: left command mode"),
            Err(e) => warn!("at recovery failed: {}", e),
        }
    }

    async fn wait_ok(&mut self, budget_ms: u32) -> Result<()> {
        let deadline = Deadline::start_ms(&*self.clock, budget_ms);
        loop {
            let probe = scan_status(self.rx.snapshot().bytes());
            match deadline.poll(&*self.clock, probe) {
                WaitState::Ready(Status::Ok) => return Ok(()),
                WaitState::Ready(Status::Err) => return Err(Error::UnexpectedResponse),
                WaitState::TimedOut => return Err(Error::ProtocolTimeout),
                WaitState::NotYet => self.clock.pause_us(self.timing.poll_interval_us).await,
            }
        }
    }

    /// Wait for the terminator, then stage `len` bytes from the start of the window
    async fn read_payload(
        &mut self,
        len: usize,
        staged: Option<&mut Vec<u8, AT_LINE_MAX>>,
    ) -> Result<()> {
        let deadline = Deadline::start_ms(&*self.clock, self.timing.response_timeout_ms);
        loop {
            let snapshot = self.rx.snapshot();
            let probe = find_terminator(snapshot.bytes()).map(|_| snapshot.bytes());
            match deadline.poll(&*self.clock, probe) {
                WaitState::Ready(bytes) => {
                    if let Some(out) = staged {
                        out.clear();
                        // A short reply is padded with the zeroes of the cleared buffer
                        for i in 0..len {
                            out.push(bytes.get(i).copied().unwrap_or(0))
                                .map_err(|_| Error::InvalidRequest)?;
                        }
                    }
                    return Ok(());
                }
                WaitState::TimedOut => return Err(Error::ProtocolTimeout),
                WaitState::NotYet => {}
            }
            self.clock.pause_us(self.timing.poll_interval_us).await;
        }
    }
}
