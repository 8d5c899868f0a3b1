// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick sources and the throttle that turns them into frames.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Decides which ticks become frames.
///
/// A tick runs a frame when at least one full interval has passed since the
/// last frame. The last frame time starts at 0 and goes back to 0 on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_frame_ms: f64,
}

impl FrameThrottle {
    /// Create a throttle for `interval_ms` between frames
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_frame_ms: 0.0,
        }
    }

    /// Minimum spacing between frames
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Change the spacing between frames
    pub fn set_interval_ms(&mut self, interval_ms: f64) {
        self.interval_ms = interval_ms;
    }

    /// Timestamp of the last frame
    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Whether a tick at `timestamp_ms` should run a frame
    pub fn ready(&self, timestamp_ms: f64) -> bool {
        timestamp_ms - self.last_frame_ms >= self.interval_ms
    }

    /// Note that a frame ran at `timestamp_ms`
    pub fn record(&mut self, timestamp_ms: f64) {
        self.last_frame_ms = timestamp_ms;
    }

    /// Forget the last frame
    pub fn reset(&mut self) {
        self.last_frame_ms = 0.0;
    }
}

/// Source of display refresh ticks.
///
/// Each tick carries a monotonic timestamp in milliseconds. `None` means the
/// source is exhausted.
#[allow(async_fn_in_trait)]
pub trait TickDriver {
    /// Wait for the next tick
    async fn next_tick(&mut self) -> Option<f64>;
}

/// Ticks at a fixed refresh rate on the tokio clock
#[derive(Debug)]
pub struct IntervalDriver {
    interval: Interval,
    origin: Instant,
}

impl IntervalDriver {
    /// Tick `refresh_hz` times per second. Timestamps count from creation.
    pub fn new(refresh_hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1)));
        let origin = Instant::now();
        let mut interval = tokio::time::interval_at(origin + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, origin }
    }
}

impl TickDriver for IntervalDriver {
    async fn next_tick(&mut self) -> Option<f64> {
        // Stamp with the delivery time, not the missed deadline
        self.interval.tick().await;
        Some(Instant::now().duration_since(self.origin).as_secs_f64() * 1000.0)
    }
}

/// Replays a fixed list of timestamps
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    ticks: VecDeque<f64>,
}

impl ScriptedDriver {
    /// Create a driver yielding `ticks` in order
    pub fn new(ticks: impl IntoIterator<Item = f64>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
        }
    }

    /// Ticks not yet delivered
    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl TickDriver for ScriptedDriver {
    async fn next_tick(&mut self) -> Option<f64> {
        self.ticks.pop_front()
    }
}

/// Cloneable handle that stops a running engine
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopHandle {
    /// Create a handle in the running state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Wakes any pending wait.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Clear a previous stop request
    pub(crate) fn rearm(&self) {
        self.inner.stopped.store(false, Ordering::SeqCst);
    }

    /// Resolve once a stop has been requested
    pub async fn stopped(&self) {
        loop {
            // Register before checking so a concurrent stop is not missed
            let notified = self.inner.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}
