//! Periodic chirp synthesis and the pilot reference cut from its leading edge.

use std::f64::consts::PI;

use crate::params::SweepParameters;

/// Chirp generator alternating one active sweep with one equal-length rest
///
/// Output depends only on the sample counter, so splitting a request across
/// several calls yields exactly the same samples as one large call.
#[derive(Debug, Clone)]
pub struct SweepGenerator {
    /// Sweep rate (Hz per second)
    chirp_rate: f64,

    /// Time offset placing the instantaneous frequency at baseband when t = 0 (seconds)
    phase_offset_s: f64,

    sample_rate_hz: f64,
    duration_samples: usize,

    /// Position within the current half-period (samples)
    counter: usize,
    active: bool,
}

impl SweepGenerator {
    /// Create a generator at the start of an active sweep
    pub fn new(params: &SweepParameters) -> Self {
        let duration_s = params.duration_secs() as f64;
        let bandwidth = params.bandwidth_hz as f64;
        Self {
            chirp_rate: bandwidth / duration_s,
            phase_offset_s: params.baseband_hz as f64 / bandwidth * duration_s,
            sample_rate_hz: params.sample_rate_hz as f64,
            duration_samples: params.duration_samples(),
            counter: 0,
            active: true,
        }
    }

    /// Fill `out` with the next `out.len()` samples
    pub fn generate(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.active {
                let t = self.counter as f64 / self.sample_rate_hz + self.phase_offset_s;
                (PI * self.chirp_rate * t * t).sin() as f32
            } else {
                0.0
            };

            self.counter += 1;
            if self.counter >= self.duration_samples {
                self.counter = 0;
                self.active = !self.active;
            }
        }
    }

    /// Whether the next generated sample belongs to an active sweep
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Immutable reference segment used only for correlation
#[derive(Debug, Clone, PartialEq)]
pub struct PilotTemplate {
    samples: Vec<f32>,
    norm: f32,
}

impl PilotTemplate {
    /// Capture the first `pilot_width` samples of a fresh generator
    pub fn capture(params: &SweepParameters) -> Self {
        let mut generator = SweepGenerator::new(params);
        let mut samples = vec![0.0; params.pilot_width()];
        generator.generate(&mut samples);
        Self::from_samples(samples)
    }

    /// Wrap an arbitrary reference segment
    pub fn from_samples(samples: Vec<f32>) -> Self {
        let norm = energy(&samples).sqrt();
        Self { samples, norm }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// L2 norm of the template; zero means it can never match
    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Cosine similarity against a window of the same length
    ///
    /// Returns 0.0 when either side has no energy.
    pub fn similarity(&self, window: &[f32]) -> f32 {
        debug_assert_eq!(window.len(), self.samples.len());
        let window_norm = energy(window).sqrt();
        if self.norm <= 0.0 || window_norm <= 0.0 {
            return 0.0;
        }
        let cross: f32 = window
            .iter()
            .zip(self.samples.iter())
            .map(|(a, b)| a * b)
            .sum();
        cross / (self.norm * window_norm)
    }
}

fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_generation_matches_single_call() {
        let params = SweepParameters::default();
        let total = params.duration_samples() * 3 + 17;

        let mut whole = vec![0.0; total];
        SweepGenerator::new(&params).generate(&mut whole);

        for split in [0, 1, 59, 960, 961, 1500, total] {
            let mut generator = SweepGenerator::new(&params);
            let mut parts = vec![0.0; total];
            let (a, b) = parts.split_at_mut(split);
            generator.generate(a);
            generator.generate(b);
            assert_eq!(parts, whole, "split at {} diverged", split);
        }
    }

    #[test]
    fn test_rest_phase_is_silent() {
        let params = SweepParameters::default();
        let n = params.duration_samples();
        let mut out = vec![0.0; 2 * n];
        let mut generator = SweepGenerator::new(&params);
        generator.generate(&mut out);

        assert!(out[..n].iter().any(|&s| s.abs() > 0.5));
        assert!(out[n..].iter().all(|&s| s == 0.0));
        // Back at the start of an active sweep
        assert!(generator.is_active());
    }

    #[test]
    fn test_first_sample_matches_chirp_formula() {
        let params = SweepParameters::default();
        let mut out = [0.0f32; 2];
        SweepGenerator::new(&params).generate(&mut out);

        let b = params.bandwidth_hz as f64;
        let d = params.duration_secs() as f64;
        let offset = params.baseband_hz as f64 / b * d;
        let expected0 = (PI * b / d * offset * offset).sin() as f32;
        let t1 = 1.0 / params.sample_rate_hz as f64 + offset;
        let expected1 = (PI * b / d * t1 * t1).sin() as f32;
        assert!((out[0] - expected0).abs() < 1e-5);
        assert!((out[1] - expected1).abs() < 1e-5);
    }

    #[test]
    fn test_pilot_self_similarity() {
        let pilot = PilotTemplate::capture(&SweepParameters::default());
        assert_eq!(pilot.len(), 60);
        assert!(pilot.norm() > 0.0);

        let copy = pilot.samples().to_vec();
        assert!((pilot.similarity(&copy) - 1.0).abs() < 1e-5);

        // Amplitude is normalized out
        let quiet: Vec<f32> = copy.iter().map(|s| s * 0.1).collect();
        assert!((pilot.similarity(&quiet) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_window_has_zero_similarity() {
        let pilot = PilotTemplate::capture(&SweepParameters::default());
        let silence = vec![0.0f32; pilot.len()];
        assert_eq!(pilot.similarity(&silence), 0.0);
    }

    #[test]
    fn test_zero_energy_pilot_never_matches() {
        let pilot = PilotTemplate::from_samples(vec![0.0; 8]);
        let window = [1.0f32; 8];
        assert_eq!(pilot.similarity(&window), 0.0);
    }
}
