//! Timer Abstractions
//!
//! Tick source and pauses for the portable core, backed by `embassy-time`.

use embassy_time::{Duration, Instant, Timer};

use crate::timing::Clock;

/// Clock over the embassy time driver
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create the clock
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    async fn pause_us(&mut self, us: u32) {
        Timer::after(Duration::from_micros(u64::from(us))).await;
    }

    async fn pause_ms(&mut self, ms: u32) {
        Timer::after(Duration::from_millis(u64::from(ms))).await;
    }
}

impl defmt::Format for SystemClock {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SystemClock({}us)", self.now_us());
    }
}
