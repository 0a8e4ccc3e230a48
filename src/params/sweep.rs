//! Chirp sweep parameters and the bin/range quantities derived from them.

use std::ops::Range;

use crate::error::ParamError;

/// Speed of sound in air at roughly 20 °C (meters per second)
pub const SPEED_OF_SOUND_M_S: f32 = 343.0;

/// Frequency-modulated sweep configuration, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParameters {
    /// Sweep start frequency (Hz)
    pub baseband_hz: f32,

    /// Frequency span covered by one sweep (Hz)
    pub bandwidth_hz: f32,

    /// Active sweep duration (milliseconds); the rest phase has the same length
    pub duration_ms: u32,

    /// Audio sample rate (Hz)
    pub sample_rate_hz: u32,
}

impl Default for SweepParameters {
    fn default() -> Self {
        Self {
            baseband_hz: 18_000.0, // Near-ultrasonic, inaudible to most adults
            bandwidth_hz: 4_000.0,
            duration_ms: 20, // 960 samples @ 48 kHz, 3.43 m range window
            sample_rate_hz: 48_000,
        }
    }
}

impl SweepParameters {
    /// Sweep duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.duration_ms as f32 / 1000.0
    }

    /// Number of samples in one sweep (and in one rest phase)
    pub fn duration_samples(&self) -> usize {
        (self.sample_rate_hz as u64 * self.duration_ms as u64 / 1000) as usize
    }

    /// FFT length used for range analysis; one full sweep
    pub fn fft_size(&self) -> usize {
        self.duration_samples()
    }

    /// Length of the pilot reference captured from the sweep's leading edge
    pub fn pilot_width(&self) -> usize {
        self.duration_samples() / 16
    }

    /// Convert frequency (Hz) to FFT bin index, saturating at `usize::MAX`
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size() as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Bin index of the sweep's starting frequency
    pub fn baseband_bin(&self) -> usize {
        self.hz_to_bin(self.baseband_hz)
    }

    /// Number of bins spanned by the sweep bandwidth
    pub fn bandwidth_bins(&self) -> usize {
        self.hz_to_bin(self.bandwidth_hz)
    }

    /// Bin range exposed to readers: `[baseband_bin, baseband_bin + bandwidth_bins)`
    pub fn band_bins(&self) -> Range<usize> {
        let start = self.baseband_bin();
        start..start.saturating_add(self.bandwidth_bins())
    }

    /// Distance covered by one range bin (meters)
    ///
    /// One bin of beat frequency corresponds to a round-trip delay of
    /// `1 / bandwidth`, so the one-way distance is `c / (2 * bandwidth)`.
    pub fn range_resolution_m(&self) -> f32 {
        SPEED_OF_SOUND_M_S / (2.0 * self.bandwidth_hz)
    }

    /// Distance (meters) of the `index`-th bin within the published band
    pub fn bin_distance_m(&self, index: usize) -> f32 {
        index as f32 * self.range_resolution_m()
    }

    /// Validate configuration (non-empty sweep, band below Nyquist, etc.)
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.sample_rate_hz == 0 {
            return Err(ParamError::ZeroSampleRate);
        }
        if self.duration_samples() == 0 {
            return Err(ParamError::EmptySweep {
                duration_ms: self.duration_ms,
            });
        }
        if self.pilot_width() == 0 {
            return Err(ParamError::PilotTooShort {
                duration_samples: self.duration_samples(),
            });
        }
        for hz in [self.baseband_hz, self.bandwidth_hz] {
            if !hz.is_finite() || hz < 0.0 {
                return Err(ParamError::InvalidFrequency { hz });
            }
        }
        if self.bandwidth_bins() < 1 {
            return Err(ParamError::BandTooNarrow {
                bandwidth_hz: self.bandwidth_hz,
            });
        }
        let bins = self.fft_size() / 2 + 1;
        let band = self.band_bins();
        if band.end > bins {
            return Err(ParamError::BandAboveNyquist {
                upper_bin: band.end,
                bins,
            });
        }
        Ok(())
    }
}
