//! Error types for configuration and audio transport

use thiserror::Error;

/// Invalid session configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Sample rate of zero makes every derived quantity meaningless
    #[error("Sample rate must be > 0")]
    ZeroSampleRate,

    /// Sweep shorter than one sample
    #[error("Sweep of {duration_ms} ms contains no samples")]
    EmptySweep { duration_ms: u32 },

    /// Sweep too short to carve a pilot out of its leading sixteenth
    #[error("Sweep of {duration_samples} samples is too short for a pilot")]
    PilotTooShort { duration_samples: usize },

    /// Frequency that is negative, infinite or NaN
    #[error("Frequency {hz} Hz is not a finite non-negative value")]
    InvalidFrequency { hz: f32 },

    /// Bandwidth smaller than one FFT bin
    #[error("Bandwidth of {bandwidth_hz} Hz covers less than one bin")]
    BandTooNarrow { bandwidth_hz: f32 },

    /// Requested band extends past the last FFT bin
    #[error("Band ends at bin {upper_bin} but the transform only has {bins} bins")]
    BandAboveNyquist { upper_bin: usize, bins: usize },

    /// Transport block length of zero
    #[error("Block size must be > 0")]
    ZeroBlockSize,

    /// Spectrogram analysis length of zero
    #[error("Spectrogram analysis size must be > 0")]
    ZeroAnalysisSize,
}

/// Errors raised while acquiring, starting or stopping the audio transport
#[derive(Error, Debug)]
pub enum AudioError {
    /// Configuration rejected before touching the device
    #[error("Invalid configuration: {0}")]
    Config(#[from] ParamError),

    /// No default device for the requested direction
    #[error("No audio {0} device found")]
    NoDevice(&'static str),

    /// Device name or default configuration could not be queried
    #[error("Failed to query audio device: {0}")]
    Device(String),

    /// Platform refused to build the stream
    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// Platform refused to start the stream
    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// Stream worker thread exited before reporting its setup result
    #[error("Audio stream worker terminated unexpectedly")]
    WorkerLost,

    /// Writing an exported recording failed
    #[error("Failed to write recording: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a WAV export failed
    #[error("Failed to write WAV file: {0}")]
    Wav(#[from] hound::Error),
}

impl From<cpal::DevicesError> for AudioError {
    fn from(e: cpal::DevicesError) -> Self {
        AudioError::Device(e.to_string())
    }
}

impl From<cpal::DeviceNameError> for AudioError {
    fn from(e: cpal::DeviceNameError) -> Self {
        AudioError::Device(e.to_string())
    }
}
