//! Shared test doubles
//!
//! A scripted radio module, FIFO controller and image sensor, plus a clock
//! that advances only when the code under test pauses.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use lpn_firmware::camera::fifo::{reg, CameraCapture, CaptureTiming, FifoBus, ImageBuffer};
use lpn_firmware::camera::sensor::SensorBus;
use lpn_firmware::error::{Bus, Error, Result};
use lpn_firmware::link::receive::{ReceiveChannel, RxDma};
use lpn_firmware::link::transmit::{LinkProfile, SerialTx, Transmitter};
use lpn_firmware::node::motion::{MotionEventSource, MotionLatch};
use lpn_firmware::node::orchestrator::{CaptureOrchestrator, NodeTiming};
use lpn_firmware::radio::engine::{EngineTiming, RadioCommandEngine};
use lpn_firmware::timing::Clock;

// =============================================================================
// Clock
// =============================================================================

/// Clock that only moves when paused
#[derive(Clone, Default)]
pub struct StepClock {
    now: Rc<Cell<u64>>,
    pauses: Rc<Cell<u64>>,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without a pause
    pub fn advance_us(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }

    /// Total paused time in microseconds
    pub fn paused_us(&self) -> u64 {
        self.pauses.get()
    }
}

impl Clock for StepClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }

    async fn pause_us(&mut self, us: u32) {
        self.now.set(self.now.get() + u64::from(us));
        self.pauses.set(self.pauses.get() + u64::from(us));
    }
}

// =============================================================================
// Radio module
// =============================================================================

/// What happened on the link, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// Receive transfer restarted
    Arm,
    /// Bytes written by the node
    Sent(Vec<u8>),
    /// Profile switched
    Profile(LinkProfile),
}

/// Scripted module reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Err,
    Silent,
    Raw(Vec<u8>),
}

#[derive(Default)]
pub struct XbeeState {
    inbox: VecDeque<u8>,
    events: Vec<LinkEvent>,
    command_mode: bool,
    pending_line: Vec<u8>,
    lines: Vec<Vec<u8>>,
    registers: HashMap<Vec<u8>, Vec<u8>>,
    read_queue: HashMap<Vec<u8>, VecDeque<Vec<u8>>>,
    overrides: Vec<(Vec<u8>, Reply)>,
    transparent: Vec<Vec<u8>>,
    bulk: Vec<Vec<u8>>,
    profile: LinkProfile,
    fail_writes: bool,
    fail_bulk_writes: bool,
    fail_profile: bool,
    trickle: Option<usize>,
}

impl XbeeState {
    fn deliver(&mut self, reply: &Reply) {
        match reply {
            Reply::Ok => self.inbox.extend(b"OK\r"),
            Reply::Err => self.inbox.extend(b"ERR\r"),
            Reply::Silent => {}
            Reply::Raw(bytes) => self.inbox.extend(bytes.iter().copied()),
        }
    }

    fn override_for(&self, line: &[u8]) -> Option<Reply> {
        self.overrides
            .iter()
            .find(|(l, _)| l.as_slice() == line)
            .map(|(_, r)| r.clone())
    }

    fn handle_line(&mut self, line: Vec<u8>) {
        self.lines.push(line.clone());

        if let Some(reply) = self.override_for(&line) {
            if line == b"ATCN" && reply == Reply::Ok {
                self.command_mode = false;
            }
            self.deliver(&reply);
            return;
        }

        if line == b"ATCN" {
            self.command_mode = false;
            self.deliver(&Reply::Ok);
            return;
        }

        if line.len() < 4 {
            self.deliver(&Reply::Ok);
            return;
        }

        let name = line[2..4].to_vec();
        let param = &line[4..];
        if !param.is_empty() {
            self.registers.insert(name, param.to_vec());
            self.deliver(&Reply::Ok);
            return;
        }

        let queued = self.read_queue.get_mut(&name).and_then(VecDeque::pop_front);
        match queued.or_else(|| self.registers.get(&name).cloned()) {
            Some(mut value) => {
                value.push(b'\r');
                self.deliver(&Reply::Raw(value));
            }
            None => self.deliver(&Reply::Ok),
        }
    }
}

/// Simulated XBee module in transparent / command mode
#[derive(Clone)]
pub struct FakeXbee(Rc<RefCell<XbeeState>>);

impl FakeXbee {
    pub fn new() -> Self {
        let mut state = XbeeState::default();
        state.registers.insert(b"SH".to_vec(), b"13A200".to_vec());
        state.registers.insert(b"SL".to_vec(), b"41B7C9D2".to_vec());
        state.registers.insert(b"OI".to_vec(), b"1A2B".to_vec());
        state.registers.insert(b"ID".to_vec(), b"0000".to_vec());
        Self(Rc::new(RefCell::new(state)))
    }

    /// Bytes arriving from the coordinator
    pub fn inject(&self, bytes: &[u8]) {
        self.0.borrow_mut().inbox.extend(bytes.iter().copied());
    }

    /// Reply to an exact command line (no CR), or `+++`
    pub fn set_reply(&self, line: &[u8], reply: Reply) {
        let mut state = self.0.borrow_mut();
        state.overrides.retain(|(l, _)| l.as_slice() != line);
        state.overrides.push((line.to_vec(), reply));
    }

    /// Successive values for reads of `name`, then the register value
    pub fn queue_reads(&self, name: &[u8], values: &[&[u8]]) {
        self.0
            .borrow_mut()
            .read_queue
            .entry(name.to_vec())
            .or_default()
            .extend(values.iter().map(|v| v.to_vec()));
    }

    pub fn set_register(&self, name: &[u8], value: &[u8]) {
        self.0
            .borrow_mut()
            .registers
            .insert(name.to_vec(), value.to_vec());
    }

    pub fn register(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.0.borrow().registers.get(name).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_writes = fail;
    }

    pub fn set_fail_bulk_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_bulk_writes = fail;
    }

    pub fn set_fail_profile(&self, fail: bool) {
        self.0.borrow_mut().fail_profile = fail;
    }

    /// Deliver at most `n` bytes per drain
    pub fn set_trickle(&self, n: usize) {
        self.0.borrow_mut().trickle = Some(n);
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.0.borrow().events.clone()
    }

    /// Complete command lines received in command mode
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.0.borrow().lines.clone()
    }

    /// Every write, in order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Sent(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Writes made outside command mode on the command profile
    pub fn transparent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().transparent.clone()
    }

    /// Writes made on the bulk profile
    pub fn bulk(&self) -> Vec<Vec<u8>> {
        self.0.borrow().bulk.clone()
    }

    pub fn arms(&self) -> usize {
        self.0
            .borrow()
            .events
            .iter()
            .filter(|e| **e == LinkEvent::Arm)
            .count()
    }

    pub fn command_mode(&self) -> bool {
        self.0.borrow().command_mode
    }

    pub fn profile(&self) -> LinkProfile {
        self.0.borrow().profile
    }

    pub fn clear_events(&self) {
        let mut state = self.0.borrow_mut();
        state.events.clear();
        state.lines.clear();
        state.transparent.clear();
        state.bulk.clear();
    }
}

impl RxDma for FakeXbee {
    fn restart(&mut self) {
        let mut state = self.0.borrow_mut();
        state.inbox.clear();
        state.events.push(LinkEvent::Arm);
    }

    fn drain(&mut self, buf: &mut [u8]) -> usize {
        let mut state = self.0.borrow_mut();
        let limit = state.trickle.unwrap_or(usize::MAX);
        let n = buf.len().min(state.inbox.len()).min(limit);
        for slot in buf.iter_mut().take(n) {
            *slot = state.inbox.pop_front().unwrap_or(0);
        }
        n
    }
}

impl SerialTx for FakeXbee {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.0.borrow_mut();
        let bulk = state.profile == LinkProfile::Bulk;
        if state.fail_writes || (bulk && state.fail_bulk_writes) {
            return Err(Error::BusTransactionFailure(Bus::RadioLink));
        }
        state.events.push(LinkEvent::Sent(bytes.to_vec()));

        if bulk {
            state.bulk.push(bytes.to_vec());
            return Ok(());
        }

        if bytes == b"+++" {
            let reply = state.override_for(b"+++").unwrap_or(Reply::Ok);
            if reply == Reply::Ok {
                state.command_mode = true;
            }
            state.deliver(&reply);
            return Ok(());
        }

        if !state.command_mode {
            state.transparent.push(bytes.to_vec());
            return Ok(());
        }

        for &b in bytes {
            if b == b'\r' {
                let line = std::mem::take(&mut state.pending_line);
                state.handle_line(line);
            } else {
                state.pending_line.push(b);
            }
        }
        Ok(())
    }

    fn select_profile(&mut self, profile: LinkProfile) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.fail_profile {
            return Err(Error::BusTransactionFailure(Bus::RadioLink));
        }
        state.profile = profile;
        state.events.push(LinkEvent::Profile(profile));
        Ok(())
    }
}

/// True if every write is immediately preceded by a receive arm
pub fn every_send_follows_arm(events: &[LinkEvent]) -> bool {
    events.iter().enumerate().all(|(i, e)| match e {
        LinkEvent::Sent(_) => i > 0 && events[i - 1] == LinkEvent::Arm,
        _ => true,
    })
}

// =============================================================================
// Camera FIFO controller
// =============================================================================

pub struct FifoState {
    pub test_reg: u8,
    pub dead: bool,
    pub done_after_polls: Option<u32>,
    pub status_polls: u32,
    pub size: [u8; 3],
    pub image: Vec<u8>,
    pub writes: Vec<(u8, u8)>,
    pub bursts: Vec<(u8, usize)>,
    pub fail_bus: bool,
    pub on_start: Option<Box<dyn FnMut()>>,
}

#[derive(Clone)]
pub struct FakeFifo(pub Rc<RefCell<FifoState>>);

impl FakeFifo {
    /// A controller that will report `image` after two status polls
    pub fn with_image(image: Vec<u8>) -> Self {
        let len = image.len() as u32;
        Self(Rc::new(RefCell::new(FifoState {
            test_reg: 0,
            dead: false,
            done_after_polls: Some(2),
            status_polls: 0,
            size: [len as u8, (len >> 8) as u8, (len >> 16) as u8],
            image,
            writes: Vec::new(),
            bursts: Vec::new(),
            fail_bus: false,
            on_start: None,
        })))
    }

    pub fn set_size_regs(&self, low: u8, mid: u8, high: u8) {
        self.0.borrow_mut().size = [low, mid, high];
    }

    pub fn set_dead(&self, dead: bool) {
        self.0.borrow_mut().dead = dead;
    }

    pub fn set_done_after(&self, polls: Option<u32>) {
        self.0.borrow_mut().done_after_polls = polls;
    }

    pub fn set_fail_bus(&self, fail: bool) {
        self.0.borrow_mut().fail_bus = fail;
    }

    pub fn on_start(&self, hook: impl FnMut() + 'static) {
        self.0.borrow_mut().on_start = Some(Box::new(hook));
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.0.borrow().writes.clone()
    }

    pub fn bursts(&self) -> Vec<(u8, usize)> {
        self.0.borrow().bursts.clone()
    }

    pub fn status_polls(&self) -> u32 {
        self.0.borrow().status_polls
    }
}

impl FifoBus for FakeFifo {
    async fn write_reg(&mut self, r: u8, value: u8) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.fail_bus {
            return Err(Error::BusTransactionFailure(Bus::CameraFifo));
        }
        state.writes.push((r, value));
        if r == reg::TEST && !state.dead {
            state.test_reg = value;
        }
        if r == reg::FIFO_CONTROL && value == reg::START_CAPTURE {
            state.status_polls = 0;
            if let Some(hook) = state.on_start.as_mut() {
                hook();
            }
        }
        Ok(())
    }

    async fn read_reg(&mut self, r: u8) -> Result<u8> {
        let mut state = self.0.borrow_mut();
        if state.fail_bus {
            return Err(Error::BusTransactionFailure(Bus::CameraFifo));
        }
        Ok(match r {
            reg::TEST if state.dead => 0x00,
            reg::TEST => state.test_reg,
            reg::STATUS => {
                state.status_polls += 1;
                match state.done_after_polls {
                    Some(n) if state.status_polls > n => 0x08,
                    _ => 0x00,
                }
            }
            reg::FIFO_SIZE_LOW => state.size[0],
            reg::FIFO_SIZE_MID => state.size[1],
            reg::FIFO_SIZE_HIGH => state.size[2],
            _ => 0,
        })
    }

    async fn burst_read(&mut self, r: u8, buf: &mut [u8]) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.fail_bus {
            return Err(Error::BusTransactionFailure(Bus::CameraFifo));
        }
        state.bursts.push((r, buf.len()));
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = state.image.get(i).copied().unwrap_or(i as u8);
        }
        Ok(())
    }
}

/// Deterministic image content
pub fn test_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

// =============================================================================
// Image sensor
// =============================================================================

pub struct SensorState {
    pub pid: u8,
    pub ver: u8,
    pub writes: Vec<(u8, u8)>,
    pub nack_reg: Option<u8>,
}

#[derive(Clone)]
pub struct FakeSensor(pub Rc<RefCell<SensorState>>);

impl FakeSensor {
    pub fn new(pid: u8, ver: u8) -> Self {
        Self(Rc::new(RefCell::new(SensorState {
            pid,
            ver,
            writes: Vec::new(),
            nack_reg: None,
        })))
    }

    pub fn ov2640() -> Self {
        Self::new(0x26, 0x42)
    }

    pub fn nack_on(&self, r: u8) {
        self.0.borrow_mut().nack_reg = Some(r);
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.0.borrow().writes.clone()
    }
}

impl SensorBus for FakeSensor {
    async fn write_reg(&mut self, r: u8, value: u8) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.nack_reg == Some(r) {
            return Err(Error::BusTransactionFailure(Bus::SensorConfig));
        }
        state.writes.push((r, value));
        Ok(())
    }

    async fn read_reg(&mut self, r: u8) -> Result<u8> {
        let state = self.0.borrow();
        if state.nack_reg == Some(r) {
            return Err(Error::BusTransactionFailure(Bus::SensorConfig));
        }
        Ok(match r {
            0x0A => state.pid,
            0x0B => state.ver,
            _ => 0,
        })
    }
}

// =============================================================================
// Assemblies
// =============================================================================

/// Link halves over one simulated module
pub fn link(xbee: &FakeXbee) -> (ReceiveChannel<FakeXbee>, Transmitter<FakeXbee>) {
    (
        ReceiveChannel::new(xbee.clone()),
        Transmitter::new(xbee.clone()),
    )
}

/// Run `f` with an engine over a fresh link to `xbee`
pub fn with_engine<R>(
    xbee: &FakeXbee,
    clock: &StepClock,
    f: impl FnOnce(&mut RadioCommandEngine<'_, FakeXbee, FakeXbee, StepClock>) -> R,
) -> R {
    let (mut rx, mut tx) = link(xbee);
    let mut clock = clock.clone();
    let mut engine = RadioCommandEngine::new(&mut rx, &mut tx, &mut clock, EngineTiming::default());
    f(&mut engine)
}

/// A motion latch that outlives the test
pub fn leaked_latch() -> &'static MotionLatch {
    Box::leak(Box::new(MotionLatch::new()))
}

pub type TestNode<'img> =
    CaptureOrchestrator<'static, 'img, FakeXbee, FakeXbee, FakeFifo, StepClock>;

/// Orchestrator over the given doubles, started and listening
pub fn started_node<'img>(
    xbee: &FakeXbee,
    fifo: &FakeFifo,
    clock: &StepClock,
    latch: &'static MotionLatch,
    storage: &'img mut [u8],
) -> TestNode<'img> {
    let (rx, tx) = link(xbee);
    let image = ImageBuffer::new(storage).expect("storage too small");
    let mut node = CaptureOrchestrator::new(
        rx,
        tx,
        CameraCapture::new(fifo.clone(), CaptureTiming::default()),
        MotionEventSource::new(latch),
        clock.clone(),
        image,
        NodeTiming::default(),
    );
    node.start();
    node
}
