//! GPIO Abstractions
//!
//! Status LED and the PIR motion input.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Timer};

use crate::config::FAULT_BLINK_MS;
use crate::node::motion::MotionLatch;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(mut pin: Output<'d>) -> Self {
        pin.set_low();
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.pin.set_high();
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.pin.set_low();
        self.state = LedState::Off;
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        match self.state {
            LedState::Off => self.on(),
            LedState::On => self.off(),
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }

    /// Blink fast forever; used when the node cannot operate
    pub async fn fault(&mut self) {
        loop {
            self.toggle();
            Timer::after(Duration::from_millis(FAULT_BLINK_MS)).await;
        }
    }
}

/// PIR sensor output on an EXTI line
pub struct MotionInput<'d> {
    pin: ExtiInput<'d>,
}

impl<'d> MotionInput<'d> {
    /// Wrap the EXTI input (pull-up, rising edge on motion)
    #[must_use]
    pub fn new(pin: ExtiInput<'d>) -> Self {
        Self { pin }
    }

    /// Forward every rising edge to `latch`; never returns
    pub async fn watch(&mut self, latch: &MotionLatch) {
        loop {
            self.pin.wait_for_rising_edge().await;
            if latch.on_edge() {
                defmt::trace!("motion edge latched");
            }
        }
    }
}
