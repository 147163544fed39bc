//! Capture Orchestrator
//!
//! The node main loop. Each iteration either handles one inbound message
//! or one pending motion event, never both and never nested. The motion
//! source stays suppressed for the whole of either handler, and every
//! message is followed by a fresh receive arm.

use crate::camera::fifo::{CameraCapture, FifoBus, ImageBuffer};
use crate::config::{
    ACK_REPEAT, ACK_SPACING_MS, ACK_TOKEN, COMMAND_SPACING_MS, CONFIG_PAYLOAD_TIMEOUT_MS,
    POLL_INTERVAL_US, RX_ARM_LENGTH,
};
use crate::error::{Error, Result};
use crate::link::receive::{ReceiveChannel, RxDma};
use crate::link::transmit::{SerialTx, Transmitter};
use crate::node::motion::MotionEventSource;
use crate::protocol::{ConfigUpdate, InboundCommand};
use crate::radio::engine::{EngineTiming, RadioCommandEngine};
use crate::radio::provision::{apply_identity, join_network, JoinPolicy};
use crate::timing::{Clock, Deadline, Stopwatch, WaitState};
use crate::types::{NodeAddress, RadioIdentity};

/// Main loop state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Waiting for a message or motion
    #[default]
    Idle,
    /// Handling an inbound message
    HandlingMessage,
    /// Handling a motion event
    HandlingMotion,
}

#[cfg(feature = "embedded")]
impl defmt::Format for NodeState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::HandlingMessage => defmt::write!(f, "HandlingMessage"),
            Self::HandlingMotion => defmt::write!(f, "HandlingMotion"),
        }
    }
}

/// What one loop iteration did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    /// Nothing to do
    Idle,
    /// Handled an inbound message
    Message(InboundCommand),
    /// Handled a motion event
    Motion,
}

/// Diagnostic counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Images captured and sent
    pub captures_sent: u32,
    /// Captures or sends that failed
    pub capture_failures: u32,
    /// Identity updates applied
    pub config_updates: u32,
    /// Identity updates that failed
    pub config_failures: u32,
    /// Empty or unknown messages dropped
    pub ignored_messages: u32,
}

/// Loop timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeTiming {
    /// AT engine budgets
    pub engine: EngineTiming,
    /// Join polling
    pub join: JoinPolicy,
    /// Pause between identity commands
    pub command_spacing_ms: u32,
    /// Pause between acknowledgements
    pub ack_spacing_ms: u32,
    /// Budget for the rest of a configuration message
    pub config_payload_timeout_ms: u32,
    /// Pause between idle iterations and payload polls
    pub poll_interval_us: u32,
}

impl Default for NodeTiming {
    fn default() -> Self {
        Self {
            engine: EngineTiming::default(),
            join: JoinPolicy::default(),
            command_spacing_ms: COMMAND_SPACING_MS,
            ack_spacing_ms: ACK_SPACING_MS,
            config_payload_timeout_ms: CONFIG_PAYLOAD_TIMEOUT_MS,
            poll_interval_us: POLL_INTERVAL_US,
        }
    }
}

/// Everything the handlers drive, kept apart from the motion source so a
/// suppression guard can be held across a handler
struct NodeIo<'img, D, T, B, C> {
    rx: ReceiveChannel<D>,
    tx: Transmitter<T>,
    camera: CameraCapture<B>,
    clock: C,
    image: ImageBuffer<'img>,
    identity: RadioIdentity,
    stats: NodeStats,
    timing: NodeTiming,
}

/// The node main loop
pub struct CaptureOrchestrator<'a, 'img, D, T, B, C> {
    motion: MotionEventSource<'a>,
    io: NodeIo<'img, D, T, B, C>,
    state: NodeState,
}

impl<'a, 'img, D, T, B, C> CaptureOrchestrator<'a, 'img, D, T, B, C>
where
    D: RxDma,
    T: SerialTx,
    B: FifoBus,
    C: Clock,
{
    /// Assemble the loop from its parts
    pub fn new(
        rx: ReceiveChannel<D>,
        tx: Transmitter<T>,
        camera: CameraCapture<B>,
        motion: MotionEventSource<'a>,
        clock: C,
        image: ImageBuffer<'img>,
        timing: NodeTiming,
    ) -> Self {
        Self {
            motion,
            io: NodeIo {
                rx,
                tx,
                camera,
                clock,
                image,
                identity: RadioIdentity::default(),
                stats: NodeStats::default(),
                timing,
            },
            state: NodeState::Idle,
        }
    }

    /// Join a network and announce the node address to the coordinator
    ///
    /// # Errors
    ///
    /// Returns the first join or send failure.
    pub async fn join(&mut self) -> Result<NodeAddress> {
        let io = &mut self.io;
        let mut engine =
            RadioCommandEngine::new(&mut io.rx, &mut io.tx, &mut io.clock, io.timing.engine);
        let address = join_network(&mut engine, &io.timing.join).await?;

        io.tx.send_control(&address.high).await?;
        io.tx.send_control(&address.low).await?;
        Ok(address)
    }

    /// Arm the receive channel and accept motion
    pub fn start(&mut self) {
        self.io.rx.arm(RX_ARM_LENGTH);
        self.motion.enable();
        self.state = NodeState::Idle;
        info!("node listening");
    }

    /// Run one loop iteration
    ///
    /// An inbound message takes precedence over a pending motion event.
    /// Handler failures are logged and counted, never propagated.
    pub async fn step(&mut self) -> Activity {
        if let Some(opcode) = self.io.rx.peek_opcode() {
            let command = InboundCommand::from_opcode(opcode);
            self.state = NodeState::HandlingMessage;
            {
                let _suppressed = self.motion.suppress();
                self.io.dispatch(command).await;
            }
            self.io.rx.arm(RX_ARM_LENGTH);
            self.state = NodeState::Idle;
            return Activity::Message(command);
        }

        if self.motion.is_pending() {
            self.state = NodeState::HandlingMotion;
            {
                let mut suppressed = self.motion.suppress();
                debug!("motion: capture requested");
                self.io.capture_and_send().await;
                suppressed.clear();
            }
            self.state = NodeState::Idle;
            return Activity::Motion;
        }

        Activity::Idle
    }

    /// Run the loop; never returns
    pub async fn run(&mut self) {
        self.start();
        loop {
            if self.step().await == Activity::Idle {
                let pause = self.io.timing.poll_interval_us;
                self.io.clock.pause_us(pause).await;
            }
        }
    }

    /// Current loop state
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Diagnostic counters
    #[must_use]
    pub const fn stats(&self) -> NodeStats {
        self.io.stats
    }

    /// Identity last pushed into the radio
    #[must_use]
    pub const fn identity(&self) -> &RadioIdentity {
        &self.io.identity
    }

    /// Motion source
    #[must_use]
    pub fn motion(&self) -> &MotionEventSource<'a> {
        &self.motion
    }

    /// Receive channel
    pub fn rx_mut(&mut self) -> &mut ReceiveChannel<D> {
        &mut self.io.rx
    }

    /// Transmitter
    #[must_use]
    pub fn transmitter(&self) -> &Transmitter<T> {
        &self.io.tx
    }
}

impl<D, T, B, C> NodeIo<'_, D, T, B, C>
where
    D: RxDma,
    T: SerialTx,
    B: FifoBus,
    C: Clock,
{
    async fn dispatch(&mut self, command: InboundCommand) {
        match command {
            InboundCommand::CaptureImage => {
                debug!("message: capture request");
                self.capture_and_send().await;
            }
            InboundCommand::UpdateSessionKey => {
                let watch = Stopwatch::start(&self.clock);
                match self.update_session_key().await {
                    Ok(()) => {
                        self.stats.config_updates += 1;
                        info!("config: applied in {} ms", watch.elapsed_ms(&self.clock));
                    }
                    Err(e) => {
                        self.stats.config_failures += 1;
                        warn!("config: update failed: {}", e);
                    }
                }
            }
            InboundCommand::Empty | InboundCommand::Unknown(_) => {
                self.stats.ignored_messages += 1;
                warn!("message: ignored {}", command);
            }
        }
    }

    async fn capture_and_send(&mut self) {
        match self.try_capture_and_send().await {
            Ok(size) => {
                self.stats.captures_sent += 1;
                info!("image: sent {} bytes", size);
            }
            Err(e) => {
                self.stats.capture_failures += 1;
                warn!("image: not sent: {}", e);
            }
        }
    }

    async fn try_capture_and_send(&mut self) -> Result<usize> {
        let size = self.camera.capture(&mut self.clock, &mut self.image).await?;
        let frame = self.image.frame(size);
        self.tx.send_bulk(frame).await?;
        Ok(size)
    }

    async fn update_session_key(&mut self) -> Result<()> {
        let update = self.await_config_update().await?;
        let identity = update.apply_to(&self.identity);

        let mut engine = RadioCommandEngine::new(
            &mut self.rx,
            &mut self.tx,
            &mut self.clock,
            self.timing.engine,
        );
        apply_identity(&mut engine, &identity, self.timing.command_spacing_ms).await?;
        self.identity = identity;

        for i in 0..ACK_REPEAT {
            if i > 0 {
                self.clock.pause_ms(self.timing.ack_spacing_ms).await;
            }
            self.tx.send_control(ACK_TOKEN).await?;
        }
        Ok(())
    }

    /// Wait for the full configuration message behind its opcode
    async fn await_config_update(&mut self) -> Result<ConfigUpdate> {
        let deadline = Deadline::start_ms(&self.clock, self.timing.config_payload_timeout_ms);
        loop {
            let snapshot = self.rx.snapshot();
            let probe = (snapshot.len() >= ConfigUpdate::WIRE_LEN)
                .then(|| ConfigUpdate::parse(snapshot.bytes()));
            match deadline.poll(&self.clock, probe) {
                WaitState::Ready(parsed) => return parsed,
                WaitState::TimedOut => return Err(Error::ProtocolTimeout),
                WaitState::NotYet => self.clock.pause_us(self.timing.poll_interval_us).await,
            }
        }
    }
}
