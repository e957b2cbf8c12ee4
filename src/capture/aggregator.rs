//! Event aggregation
//!
//! Single consumer loop between the raw-input ring and the sample window.
//! Drains the ring fully on each wake, accumulates relative deltas into an
//! unbounded virtual cursor position, tracks held buttons, and appends a
//! sample whenever position or button state changed.

use crate::capture::ring::MotionConsumer;
use crate::capture::types::{unix_millis, MotionEvent, Sample, BUTTON_TRANSITIONS};
use crate::capture::window::SampleWindow;
use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::sync::Arc;

/// Consumes raw motion events and maintains the shared [`SampleWindow`].
pub struct Aggregator {
    consumer: MotionConsumer,
    wake: Receiver<()>,
    window: Arc<RwLock<SampleWindow>>,
    vx: i32,
    vy: i32,
    buttons: i32,
}

impl Aggregator {
    pub fn new(
        consumer: MotionConsumer,
        wake: Receiver<()>,
        window: Arc<RwLock<SampleWindow>>,
    ) -> Self {
        Self {
            consumer,
            wake,
            window,
            vx: 0,
            vy: 0,
            buttons: 0,
        }
    }

    /// Run until the wake channel disconnects (all producers dropped).
    ///
    /// The loop drains everything pending, then blocks; wakes are coalesced
    /// on the producer side, so a single token can cover a burst of events.
    pub fn run(mut self) {
        loop {
            while let Some(event) = self.consumer.pop() {
                self.apply(event, unix_millis());
            }
            if self.wake.recv().is_err() {
                // disconnect: drain whatever raced in, then exit
                while let Some(event) = self.consumer.pop() {
                    self.apply(event, unix_millis());
                }
                break;
            }
        }
        tracing::debug!("aggregator stopped");
    }

    /// Fold one event into the virtual cursor state, appending a sample when
    /// anything changed. A flag-free event with zero deltas stores nothing.
    fn apply(&mut self, event: MotionEvent, now_ms: i64) {
        let mut changed = false;
        if event.dx != 0 || event.dy != 0 {
            self.vx = self.vx.wrapping_add(event.dx);
            self.vy = self.vy.wrapping_add(event.dy);
            changed = true;
        }
        // Absence of a down/up flag means "no change", not "released".
        for (down, up, mask) in BUTTON_TRANSITIONS {
            if event.button_flags & down != 0 && self.buttons & mask == 0 {
                self.buttons |= mask;
                changed = true;
            }
            if event.button_flags & up != 0 && self.buttons & mask != 0 {
                self.buttons &= !mask;
                changed = true;
            }
        }
        if changed {
            let mut window = self.window.write();
            window.push(Sample {
                ts: now_ms,
                x: self.vx,
                y: self.vy,
                buttons: self.buttons,
            });
            window.prune_if_due(now_ms);
        }
    }
}
