//! Capture pipeline and audio stream configuration.

use crate::error::ParamError;

/// Which analysis runs on captured blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureMode {
    /// Pilot synchronization, sweep accumulation and band-limited range FFT
    #[default]
    Ranging,

    /// Sync-free full-spectrum FFT of every raw block
    Spectrogram,
}

/// Capture session configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Fixed transport block length (samples per callback)
    /// 256 = 5.3ms @ 48kHz
    pub block_size: usize,

    /// Analysis performed on each captured block
    pub mode: CaptureMode,

    /// Analysis length for spectrogram mode (samples)
    /// 1024 = 513 published bins
    pub spectrogram_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            block_size: 256,
            mode: CaptureMode::Ranging,
            spectrogram_size: 1024,
        }
    }
}

impl CaptureConfig {
    /// Validate configuration (non-zero block and analysis lengths)
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.block_size == 0 {
            return Err(ParamError::ZeroBlockSize);
        }
        if self.spectrogram_size == 0 {
            return Err(ParamError::ZeroAnalysisSize);
        }
        Ok(())
    }
}

/// Stream shape requested from an audio transport (always mono f32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Samples delivered or requested per callback
    pub block_size: usize,
}

impl StreamSettings {
    /// Wall-clock duration of one block
    pub fn block_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.block_size as f64 / self.sample_rate_hz as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capture_config_is_valid() {
        let config = CaptureConfig::default();
        assert_eq!(config.mode, CaptureMode::Ranging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = CaptureConfig {
            block_size: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(config.validate(), Err(ParamError::ZeroBlockSize));
    }

    #[test]
    fn test_block_duration() {
        let settings = StreamSettings {
            sample_rate_hz: 48_000,
            block_size: 480,
        };
        assert_eq!(settings.block_duration().as_millis(), 10);
    }
}
