//! Parameter definitions with physical units and documented semantics.
//!
//! All session constants are collected here with:
//! - Physical units (Hz, milliseconds, samples, meters)
//! - Documented ranges and meanings
//! - Derived quantities computed in one place

mod capture;
mod sweep;

// Re-export all types
pub use capture::{CaptureConfig, CaptureMode, StreamSettings};
pub use sweep::{SweepParameters, SPEED_OF_SOUND_M_S};
