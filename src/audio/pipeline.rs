//! Capture-side processing chains driven by the audio callback.

use super::accumulator::SweepAccumulator;
use super::correlator::{PilotCorrelator, SyncState};
use super::fft::RangeFftProcessor;
use super::magnitude::Publisher;
use super::sweep::PilotTemplate;
use crate::params::SweepParameters;

/// Consumes one captured block per audio callback
///
/// Implementations run on the real-time thread: bounded work per block and
/// no allocation after construction.
pub trait BlockProcessor: Send {
    fn process_block(&mut self, block: &[f32]);
}

/// Pilot sync, sweep accumulation and band-limited FFT per active sweep
pub struct RangePipeline {
    correlator: PilotCorrelator,
    accumulator: SweepAccumulator,
    fft: RangeFftProcessor,
    publisher: Publisher,
}

impl RangePipeline {
    /// Build a pipeline whose pilot is cut from a fresh generator
    pub fn new(params: &SweepParameters, publisher: Publisher) -> Self {
        Self {
            correlator: PilotCorrelator::new(PilotTemplate::capture(params)),
            accumulator: SweepAccumulator::new(params.duration_samples()),
            fft: RangeFftProcessor::new(params),
            publisher,
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.correlator.state()
    }
}

impl BlockProcessor for RangePipeline {
    fn process_block(&mut self, block: &[f32]) {
        let start = match self.correlator.state() {
            SyncState::Synced(_) => 0,
            SyncState::Unsynced => match self.correlator.acquire(block) {
                SyncState::Synced(offset) => offset,
                SyncState::Unsynced => return,
            },
        };

        let fft = &mut self.fft;
        let publisher = &self.publisher;
        self.accumulator.push(&block[start..], |sweep| {
            publisher.publish(fft.process(sweep));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::magnitude::MagnitudeBuffer;
    use crate::audio::sweep::SweepGenerator;
    use std::sync::Arc;

    /// `lead` samples of silence followed by `sweeps` transmitted sweep periods
    fn received_stream(params: &SweepParameters, lead: usize, sweeps: usize) -> Vec<f32> {
        let mut stream = vec![0.0; lead + sweeps * params.duration_samples()];
        SweepGenerator::new(params).generate(&mut stream[lead..]);
        stream
    }

    /// Add a delayed, attenuated copy of `stream` onto itself
    fn with_echo(stream: &[f32], delay: usize, gain: f32) -> Vec<f32> {
        stream
            .iter()
            .enumerate()
            .map(|(i, &s)| s + if i >= delay { gain * stream[i - delay] } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_publishes_once_per_active_sweep() {
        let params = SweepParameters::default();
        let buffer = Arc::new(MagnitudeBuffer::new());

        for sweeps in [1, 2, 3, 5, 6, 10] {
            let mut pipeline = RangePipeline::new(&params, buffer.arm(params.bandwidth_bins()));
            let stream = received_stream(&params, 100, sweeps);
            for block in stream.chunks(256) {
                pipeline.process_block(block);
            }

            assert_eq!(pipeline.sync_state(), SyncState::Synced(100));
            assert_eq!(
                buffer.publish_count(),
                sweeps as u64 / 2,
                "{} sweep periods",
                sweeps
            );
        }
    }

    #[test]
    fn test_published_spectrum_matches_period_after_chirp() {
        let params = SweepParameters::default();
        let n = params.duration_samples();
        let buffer = Arc::new(MagnitudeBuffer::new());
        let mut pipeline = RangePipeline::new(&params, buffer.arm(params.bandwidth_bins()));

        // Sync lands in the second block; the echo spills into the period after each chirp
        let lead = 300;
        let stream = with_echo(&received_stream(&params, lead, 4), 200, 0.3);
        for block in stream.chunks(256) {
            pipeline.process_block(block);
        }
        assert_eq!(pipeline.sync_state(), SyncState::Synced(lead - 256));
        assert_eq!(buffer.publish_count(), 2);

        let analyzed = &stream[lead + 3 * n..lead + 4 * n];
        let expected = RangeFftProcessor::new(&params).process(analyzed).to_vec();
        assert!(expected.iter().any(|&m| m > 1.0));

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), expected.len());
        for (a, b) in snapshot.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_whole_stream_in_one_block() {
        let params = SweepParameters::default();
        let buffer = Arc::new(MagnitudeBuffer::new());
        let mut pipeline = RangePipeline::new(&params, buffer.arm(params.bandwidth_bins()));

        pipeline.process_block(&received_stream(&params, 10, 7));
        assert_eq!(buffer.publish_count(), 3);
    }

    #[test]
    fn test_silence_never_publishes() {
        let params = SweepParameters::default();
        let buffer = Arc::new(MagnitudeBuffer::new());
        let mut pipeline = RangePipeline::new(&params, buffer.arm(params.bandwidth_bins()));

        let silence = vec![0.0f32; 256];
        for _ in 0..40 {
            pipeline.process_block(&silence);
        }
        assert_eq!(pipeline.sync_state(), SyncState::Unsynced);
        assert_eq!(buffer.try_snapshot(), None);
    }
}
