//! Windows capture implementation
//!
//! Raw Input based mouse listener (`RIDEV_INPUTSINK` on a hidden window).

pub mod input;

pub use input::CaptureListener;
