//! Real-input forward FFT and band-limited range magnitudes.

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use std::ops::Range;
use std::sync::Arc;

use crate::params::SweepParameters;

/// Forward transform of real samples yielding `size / 2 + 1` bins
///
/// Plan and buffers are allocated once; `process` never allocates.
pub struct RealFft {
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RealFft {
    /// Plan a transform of `size` real samples
    pub fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            input: fft.make_input_vec(),
            spectrum: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            fft,
        }
    }

    /// Input length
    pub fn size(&self) -> usize {
        self.input.len()
    }

    /// Number of non-redundant output bins
    pub fn bins(&self) -> usize {
        self.spectrum.len()
    }

    /// Transform `input`, zero-padding or truncating it to `size()`
    pub fn process(&mut self, input: &[f32]) -> &[Complex<f32>] {
        let n = input.len().min(self.input.len());
        self.input[..n].copy_from_slice(&input[..n]);
        self.input[n..].fill(0.0);

        // Buffer lengths come from the plan, so the length check cannot fail
        if self
            .fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .is_err()
        {
            self.spectrum.fill(Complex::default());
        }
        &self.spectrum
    }

    /// Transform `input` and write `|X[k]|` for every bin in `range` into `out`
    pub fn magnitudes_into(&mut self, input: &[f32], range: Range<usize>, out: &mut [f32]) {
        let spectrum = self.process(input);
        for (dst, c) in out.iter_mut().zip(&spectrum[range]) {
            *dst = c.norm();
        }
    }
}

/// Per-sweep range spectrum restricted to the chirp's band
pub struct RangeFftProcessor {
    fft: RealFft,
    band: Range<usize>,
    magnitudes: Vec<f32>,
}

impl RangeFftProcessor {
    /// Plan the transform for one session
    pub fn new(params: &SweepParameters) -> Self {
        let band = params.band_bins();
        Self {
            fft: RealFft::new(params.fft_size()),
            magnitudes: vec![0.0; band.len()],
            band,
        }
    }

    /// Number of published magnitude bins
    pub fn band_len(&self) -> usize {
        self.magnitudes.len()
    }

    /// Magnitudes of `[baseband_bin, baseband_bin + bandwidth_bins)` for one sweep
    pub fn process(&mut self, sweep: &[f32]) -> &[f32] {
        self.fft
            .magnitudes_into(sweep, self.band.clone(), &mut self.magnitudes);
        &self.magnitudes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sweep::SweepGenerator;
    use std::f32::consts::PI;

    #[test]
    fn test_real_fft_bin_count_and_tone_peak() {
        let size = 64;
        let mut fft = RealFft::new(size);
        assert_eq!(fft.bins(), 33);

        // Pure tone on bin 5
        let tone: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * 5.0 * i as f32 / size as f32).cos())
            .collect();
        let spectrum = fft.process(&tone);
        assert_eq!(spectrum.len(), 33);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 5);
        assert!((spectrum[5].norm() - size as f32 / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_odd_length_and_zero_padding() {
        let mut fft = RealFft::new(63);
        assert_eq!(fft.size(), 63);
        assert_eq!(fft.bins(), 32);

        let short = [1.0f32, -0.5, 0.25];
        let mut padded = vec![0.0f32; 63];
        padded[..3].copy_from_slice(&short);

        let from_short = fft.process(&short).to_vec();
        let from_padded = fft.process(&padded).to_vec();
        assert_eq!(from_short.len(), 32);
        for (a, b) in from_short.iter().zip(&from_padded) {
            assert!((a - b).norm() < 1e-6);
        }

        // DC bin is the plain sum
        assert!((from_short[0].re - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_range_magnitudes_are_band_limited_and_non_negative() {
        let params = SweepParameters::default();
        let mut processor = RangeFftProcessor::new(&params);
        assert_eq!(processor.band_len(), params.bandwidth_bins());

        // Arbitrary signed input
        let input: Vec<f32> = (0..params.fft_size())
            .map(|i| ((i * 7919) % 201) as f32 / 100.0 - 1.0)
            .collect();
        let mags = processor.process(&input);
        assert_eq!(mags.len(), params.bandwidth_bins());
        assert!(mags.iter().all(|&m| m >= 0.0 && m.is_finite()));
    }

    #[test]
    fn test_clean_sweep_energy_lies_in_band() {
        let params = SweepParameters::default();
        let mut sweep = vec![0.0; params.duration_samples()];
        SweepGenerator::new(&params).generate(&mut sweep);

        let mut full = RealFft::new(params.fft_size());
        let spectrum: Vec<f32> = full.process(&sweep).iter().map(|c| c.norm()).collect();
        let band = params.band_bins();
        let in_band: f32 = spectrum[band.clone()].iter().map(|m| m * m).sum();
        let total: f32 = spectrum.iter().map(|m| m * m).sum();
        assert!(in_band / total > 0.8, "in-band fraction {}", in_band / total);

        let mut processor = RangeFftProcessor::new(&params);
        let mags = processor.process(&sweep).to_vec();
        for (a, b) in mags.iter().zip(&spectrum[band]) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
