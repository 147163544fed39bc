//! Timing primitives
//!
//! Every wait in the firmware is a poll loop bounded by a tick counter.
//! [`Deadline::poll`] turns one probe of a predicate into a tri-state
//! [`WaitState`] so callers can never spin without a budget.

/// Monotonic microsecond tick source with a cooperative pause
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// Current tick count in microseconds
    fn now_us(&self) -> u64;

    /// Yield for roughly `us` microseconds
    async fn pause_us(&mut self, us: u32);

    /// Yield for roughly `ms` milliseconds
    async fn pause_ms(&mut self, ms: u32) {
        self.pause_us(ms.saturating_mul(1_000)).await;
    }
}

/// Outcome of probing a wait predicate once
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitState<T> {
    /// The predicate produced a value
    Ready(T),
    /// Not ready yet, budget remains
    NotYet,
    /// Not ready and the budget is exhausted
    TimedOut,
}

/// A wall-clock budget started at a given tick
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: u64,
    budget: u64,
}

impl Deadline {
    /// Start a budget of `budget_us` microseconds now
    #[must_use]
    pub fn start<C: Clock>(clock: &C, budget_us: u64) -> Self {
        Self {
            start: clock.now_us(),
            budget: budget_us,
        }
    }

    /// Start a budget of `budget_ms` milliseconds now
    #[must_use]
    pub fn start_ms<C: Clock>(clock: &C, budget_ms: u32) -> Self {
        Self::start(clock, crate::config::ms_to_us(budget_ms))
    }

    /// Check if the budget is spent
    #[must_use]
    pub fn expired<C: Clock>(&self, clock: &C) -> bool {
        clock.now_us().wrapping_sub(self.start) >= self.budget
    }

    /// Get remaining budget in microseconds
    #[must_use]
    pub fn remaining_us<C: Clock>(&self, clock: &C) -> u64 {
        self.budget
            .saturating_sub(clock.now_us().wrapping_sub(self.start))
    }

    /// Classify one probe of a predicate against the budget
    ///
    /// A ready value wins even if the budget ran out during the probe.
    pub fn poll<C: Clock, T>(&self, clock: &C, probe: Option<T>) -> WaitState<T> {
        match probe {
            Some(value) => WaitState::Ready(value),
            None if self.expired(clock) => WaitState::TimedOut,
            None => WaitState::NotYet,
        }
    }
}

/// Stopwatch for timing measurements
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    start: u64,
}

impl Stopwatch {
    /// Start measuring now
    #[must_use]
    pub fn start<C: Clock>(clock: &C) -> Self {
        Self {
            start: clock.now_us(),
        }
    }

    /// Get elapsed time in microseconds
    #[must_use]
    pub fn elapsed_us<C: Clock>(&self, clock: &C) -> u64 {
        clock.now_us().wrapping_sub(self.start)
    }

    /// Get elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms<C: Clock>(&self, clock: &C) -> u64 {
        self.elapsed_us(clock) / 1_000
    }
}
