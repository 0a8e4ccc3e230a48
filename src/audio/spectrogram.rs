//! Sync-free visualization mode: every raw block is transformed directly.

use super::fft::RealFft;
use super::magnitude::Publisher;
use super::pipeline::BlockProcessor;

/// Publishes all `size / 2 + 1` magnitude bins for every captured block
pub struct SpectrogramProcessor {
    fft: RealFft,
    magnitudes: Vec<f32>,
    publisher: Publisher,
}

impl SpectrogramProcessor {
    /// Plan a transform of `analysis_size` samples
    pub fn new(analysis_size: usize, publisher: Publisher) -> Self {
        let fft = RealFft::new(analysis_size);
        Self {
            magnitudes: vec![0.0; fft.bins()],
            fft,
            publisher,
        }
    }

    /// Number of published bins
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }
}

impl BlockProcessor for SpectrogramProcessor {
    /// Blocks shorter than the analysis size are zero-padded, longer ones truncated
    fn process_block(&mut self, block: &[f32]) {
        let bins = self.magnitudes.len();
        self.fft.magnitudes_into(block, 0..bins, &mut self.magnitudes);
        self.publisher.publish(&self.magnitudes);
    }
}
