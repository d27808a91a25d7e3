//! Draw timer: coalesces redraw requests into a single pending deadline.

use crossbeam_channel::{after, never, Receiver};
use std::time::{Duration, Instant};

/// A one-shot timer that can only be brought forward.
///
/// Requests made while a deadline is pending either shorten it or are
/// ignored, so any burst of requests yields exactly one fire at the
/// earliest requested time.
pub struct DrawTimer {
    deadline: Option<Instant>,
    rx: Receiver<Instant>,
}

impl DrawTimer {
    /// A timer with nothing pending.
    pub fn new() -> Self {
        Self {
            deadline: None,
            rx: never(),
        }
    }

    /// Ask for a draw within `delay`.
    ///
    /// Returns whether the pending deadline changed. A delay too large to
    /// represent as an instant is no request at all.
    pub fn request(&mut self, delay: Duration) -> bool {
        let Some(at) = Instant::now().checked_add(delay) else {
            return false;
        };
        if matches!(self.deadline, Some(pending) if pending <= at) {
            return false;
        }
        self.deadline = Some(at);
        self.rx = after(delay);
        true
    }

    /// Fires once with the firing instant when the deadline passes.
    #[inline]
    pub const fn receiver(&self) -> &Receiver<Instant> {
        &self.rx
    }

    /// Clear the pending deadline after the receiver fired.
    pub fn fired(&mut self) {
        self.deadline = None;
        self.rx = never();
    }

    /// The pending deadline, if any.
    #[inline]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check whether a draw is pending.
    #[inline]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Default for DrawTimer {
    fn default() -> Self {
        Self::new()
    }
}
