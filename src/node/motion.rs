//! Motion Event Source
//!
//! The motion input latches a single pending bit; repeated edges before the
//! bit is consumed collapse into one capture request. The bit is written
//! from interrupt context and only cleared while the source is suppressed.

use core::sync::atomic::{AtomicBool, Ordering};

/// Interrupt-side state of the motion input
///
/// Meant to live in a `static`; the edge handler only ever calls
/// [`on_edge`](Self::on_edge).
pub struct MotionLatch {
    pending: AtomicBool,
    armed: AtomicBool,
}

impl MotionLatch {
    /// Create a latch, disarmed and clear
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            armed: AtomicBool::new(false),
        }
    }

    /// Record a motion edge; ignored while the source is disabled
    ///
    /// Returns true if the edge was latched.
    pub fn on_edge(&self) -> bool {
        if self.armed.load(Ordering::Acquire) {
            self.pending.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Check if edges are currently accepted
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Check if a capture request is pending
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::Release);
    }

    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for MotionLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Loop-side handle to the motion latch
pub struct MotionEventSource<'a> {
    latch: &'a MotionLatch,
}

impl<'a> MotionEventSource<'a> {
    /// Wrap a latch; the source starts disabled
    #[must_use]
    pub fn new(latch: &'a MotionLatch) -> Self {
        latch.set_armed(false);
        Self { latch }
    }

    /// Accept motion edges
    pub fn enable(&mut self) {
        self.latch.set_armed(true);
    }

    /// Ignore motion edges
    pub fn disable(&mut self) {
        self.latch.set_armed(false);
    }

    /// Check if edges are accepted
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.latch.is_armed()
    }

    /// Check if a capture request is pending
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.latch.is_pending()
    }

    /// Disable the source until the returned guard is dropped
    pub fn suppress(&mut self) -> Suppressed<'_, 'a> {
        self.disable();
        Suppressed { source: self }
    }
}

/// Motion source held disabled; re-enabled on drop
///
/// Clearing the pending bit is only possible through this guard.
pub struct Suppressed<'s, 'a> {
    source: &'s mut MotionEventSource<'a>,
}

impl Suppressed<'_, '_> {
    /// Check if a capture request is pending
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.source.is_pending()
    }

    /// Consume the pending request, returning whether there was one
    pub fn clear(&mut self) -> bool {
        self.source.latch.take()
    }
}

impl Drop for Suppressed<'_, '_> {
    fn drop(&mut self) {
        self.source.enable();
    }
}
