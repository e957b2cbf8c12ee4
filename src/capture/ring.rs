//! Lock-free SPSC ring buffer for raw motion events
//!
//! Connects the OS input listener (producer) to the event aggregator
//! (consumer). The producer runs on the window-message thread and must never
//! block or allocate; on overflow the incoming event is dropped.
//!
//! Cursors are free-running `u32` indices published with release stores and
//! observed with acquire loads; the power-of-two capacity lets index masking
//! replace modulo.

use crate::capture::types::MotionEvent;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Default ring capacity (must be a power of 2).
pub const DEFAULT_RING_CAPACITY: usize = 1 << 14; // 16384 events

struct RingShared {
    slots: Box<[UnsafeCell<MotionEvent>]>,
    mask: u32,
    /// Producer cursor: next slot to write.
    write: AtomicU32,
    /// Consumer cursor: next slot to read.
    read: AtomicU32,
}

// Safety: slot i is written by the producer strictly before the release store
// that makes index i visible to the consumer, and read by the consumer only
// after the matching acquire load. A slot is never accessed from both sides
// at once, and the producer/consumer halves are move-only (no aliasing).
unsafe impl Send for RingShared {}
unsafe impl Sync for RingShared {}

/// Fixed-capacity single-producer/single-consumer ring of [`MotionEvent`]s.
pub struct MotionRing {
    shared: Arc<RingShared>,
}

impl MotionRing {
    /// Create a ring with the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or not a power of 2.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity.is_power_of_two(),
            "ring capacity must be a power of 2"
        );
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MotionEvent::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shared: Arc::new(RingShared {
                slots,
                mask: (capacity - 1) as u32,
                write: AtomicU32::new(0),
                read: AtomicU32::new(0),
            }),
        }
    }

    /// Split into the producer and consumer halves. Each half is move-only,
    /// which is what enforces the single-producer/single-consumer contract.
    pub fn split(self) -> (MotionProducer, MotionConsumer) {
        (
            MotionProducer {
                shared: Arc::clone(&self.shared),
            },
            MotionConsumer {
                shared: self.shared,
            },
        )
    }
}

impl Default for MotionRing {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }
}

/// Producer half, owned by the input listener thread.
pub struct MotionProducer {
    shared: Arc<RingShared>,
}

impl MotionProducer {
    /// Push an event without blocking.
    ///
    /// Returns `false` when the ring is full; the event is dropped. Callers
    /// must not log per-drop (overflow is an expected overload policy).
    #[inline]
    pub fn push(&mut self, event: MotionEvent) -> bool {
        let shared = &*self.shared;
        let write = shared.write.load(Ordering::Relaxed);
        let read = shared.read.load(Ordering::Acquire);
        if write.wrapping_sub(read) == shared.slots.len() as u32 {
            return false;
        }
        // Safety: the slot at `write` is outside the consumer's visible range
        // until the release store below.
        unsafe {
            *shared.slots[(write & shared.mask) as usize].get() = event;
        }
        shared.write.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .write
            .load(Ordering::Relaxed)
            .wrapping_sub(shared.read.load(Ordering::Acquire)) as usize
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.shared.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

/// Consumer half, owned by the aggregator thread.
pub struct MotionConsumer {
    shared: Arc<RingShared>,
}

impl MotionConsumer {
    /// Pop the oldest buffered event, or `None` when the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<MotionEvent> {
        let shared = &*self.shared;
        let read = shared.read.load(Ordering::Relaxed);
        let write = shared.write.load(Ordering::Acquire);
        if read == write {
            return None;
        }
        // Safety: the acquire load above pairs with the producer's release
        // store, so the slot contents at `read` are fully published.
        let event = unsafe { *shared.slots[(read & shared.mask) as usize].get() };
        shared.read.store(read.wrapping_add(1), Ordering::Release);
        Some(event)
    }

    pub fn len(&self) -> usize {
        let shared = &*self.shared;
        shared
            .write
            .load(Ordering::Acquire)
            .wrapping_sub(shared.read.load(Ordering::Relaxed)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
