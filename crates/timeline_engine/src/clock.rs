// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host frame clock.
//!
//! The engine asks the clock for one frame at a time and the host delivers
//! it back through [`TimelineEngine::on_frame`](crate::TimelineEngine::on_frame)
//! together with a monotonic timestamp in milliseconds.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Handle identifying one frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// A frame due for delivery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Request this frame answers
    pub handle: FrameHandle,
    /// Monotonic timestamp in milliseconds
    pub timestamp: f64,
}

/// Schedule-once frame source
pub trait FrameClock {
    /// Request a frame at the next refresh
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending request. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Hand out the next due frame, if any request is pending
    fn next_frame(&mut self) -> Option<FrameTick>;
}

#[derive(Debug, Default)]
struct ManualClockState {
    now: f64,
    next_handle: u64,
    pending: Vec<FrameHandle>,
}

/// Virtual clock advanced by hand.
///
/// Clones share the same state, so a test can keep one clone while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ManualClockState>>,
}

impl ManualClock {
    /// Create a clock at timestamp 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock at `now` milliseconds
    pub fn starting_at(now: f64) -> Self {
        let clock = Self::new();
        clock.state.borrow_mut().now = now;
        clock
    }

    /// Current timestamp in milliseconds
    pub fn now(&self) -> f64 {
        self.state.borrow().now
    }

    /// Move the clock forward
    pub fn advance(&self, ms: f64) {
        self.state.borrow_mut().now += ms;
    }

    /// Number of frame requests not yet delivered or cancelled
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = FrameHandle(state.next_handle);
        state.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.state.borrow_mut().pending.retain(|h| *h != handle);
    }

    fn next_frame(&mut self) -> Option<FrameTick> {
        let mut state = self.state.borrow_mut();
        if state.pending.is_empty() {
            return None;
        }
        let handle = state.pending.remove(0);
        Some(FrameTick {
            handle,
            timestamp: state.now,
        })
    }
}

/// Wall-clock frame source with a fixed refresh interval.
///
/// `next_frame` blocks the calling thread until the next refresh boundary.
#[derive(Debug)]
pub struct RealtimeClock {
    origin: Instant,
    interval: Duration,
    next_deadline: Instant,
    next_handle: u64,
    pending: Vec<FrameHandle>,
}

impl RealtimeClock {
    /// Default refresh interval (60 Hz)
    pub const DEFAULT_INTERVAL_MS: f64 = 1000.0 / 60.0;

    /// Create a clock refreshing every `interval_ms` milliseconds
    pub fn new(interval_ms: f64) -> Self {
        let origin = Instant::now();
        let interval = Duration::from_secs_f64(interval_ms.max(0.0) / 1000.0);
        Self {
            origin,
            interval,
            next_deadline: origin + interval,
            next_handle: 0,
            pending: Vec::new(),
        }
    }

    /// Refresh interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Milliseconds since the clock was created
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for RealtimeClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL_MS)
    }
}

impl FrameClock for RealtimeClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }

    fn next_frame(&mut self) -> Option<FrameTick> {
        if self.pending.is_empty() {
            return None;
        }

        let now = Instant::now();
        if now < self.next_deadline {
            std::thread::sleep(self.next_deadline - now);
        } else if !self.interval.is_zero() {
            // Skip refreshes we slept through instead of bursting
            while self.next_deadline <= now {
                self.next_deadline += self.interval;
            }
        }
        if self.next_deadline <= Instant::now() {
            self.next_deadline += self.interval;
        }

        let handle = self.pending.remove(0);
        Some(FrameTick {
            handle,
            timestamp: self.now(),
        })
    }
}
