//! Acoustic ranging pipeline: chirp synthesis, pilot sync and range spectra.
//!
//! The capture callback feeds blocks through [`RangePipeline`] (or
//! [`SpectrogramProcessor`]) and publishes magnitudes into a
//! [`MagnitudeBuffer`]; readers take snapshots from any thread.

mod accumulator;
mod correlator;
mod engine;
mod fft;
mod loopback;
mod magnitude;
mod pipeline;
mod recorder;
mod spectrogram;
mod sweep;
mod transport;

// Re-export public types
pub use accumulator::SweepAccumulator;
pub use correlator::{PilotCorrelator, PilotMatch, SyncState, SYNC_THRESHOLD};
pub use engine::Engine;
pub use fft::{RangeFftProcessor, RealFft};
pub use loopback::{EchoPath, EchoTap, LoopbackTransport};
pub use magnitude::{MagnitudeBuffer, Publisher};
pub use pipeline::{BlockProcessor, RangePipeline};
pub use recorder::{append_magnitude_line, write_text_log, write_wav, Recorder};
pub use spectrogram::SpectrogramProcessor;
pub use sweep::{PilotTemplate, SweepGenerator};
pub use transport::{
    list_devices, CaptureCallback, CpalTransport, PlaybackCallback, StreamHandle, Transport,
};
