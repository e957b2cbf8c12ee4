//! Mouse input capture pipeline
//!
//! Raw OS motion events flow listener → ring buffer → aggregator →
//! time-windowed sample buffer. Only the ring is shared lock-free; the
//! sample window sits behind a reader/writer lock owned by the tracker.

pub mod aggregator;
pub mod ring;
pub mod tracker;
pub mod types;
pub mod window;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod fallback;

pub use ring::{MotionConsumer, MotionProducer, MotionRing, DEFAULT_RING_CAPACITY};
pub use tracker::{CaptureError, MouseProvider, MouseTracker, DEFAULT_BUFFER_DURATION};
pub use types::{MotionEvent, Sample};
pub use window::SampleWindow;
