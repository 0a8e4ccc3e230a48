//! Session management and the application-facing ranging API.

use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::magnitude::MagnitudeBuffer;
use super::pipeline::{BlockProcessor, RangePipeline};
use super::recorder::Recorder;
use super::spectrogram::SpectrogramProcessor;
use super::sweep::SweepGenerator;
use super::transport::{StreamHandle, Transport};
use crate::error::AudioError;
use crate::params::{CaptureConfig, CaptureMode, StreamSettings, SweepParameters};

/// Owns at most one capture and one transmit session at a time
///
/// Every method may be called from any thread. Start calls are idempotent;
/// stop calls tear the session down and make snapshot readers wait for the
/// next session's first result.
pub struct Engine<T: Transport> {
    transport: T,
    params: SweepParameters,
    capture_config: CaptureConfig,

    /// Shared FFT magnitudes (thread-safe)
    magnitudes: Arc<MagnitudeBuffer>,

    capture: Mutex<Option<StreamHandle>>,
    transmit: Mutex<Option<StreamHandle>>,
}

fn lock_session(slot: &Mutex<Option<StreamHandle>>) -> MutexGuard<'_, Option<StreamHandle>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl<T: Transport> Engine<T> {
    /// Validate configuration and create an idle engine
    pub fn new(
        transport: T,
        params: SweepParameters,
        capture_config: CaptureConfig,
    ) -> Result<Self, AudioError> {
        params.validate()?;
        capture_config.validate()?;

        Ok(Self {
            transport,
            params,
            capture_config,
            magnitudes: Arc::new(MagnitudeBuffer::new()),
            capture: Mutex::new(None),
            transmit: Mutex::new(None),
        })
    }

    pub fn params(&self) -> &SweepParameters {
        &self.params
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture_config
    }

    fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            sample_rate_hz: self.params.sample_rate_hz,
            block_size: self.capture_config.block_size,
        }
    }

    /// Length of every snapshot produced by the configured capture mode
    pub fn snapshot_len(&self) -> usize {
        match self.capture_config.mode {
            CaptureMode::Ranging => self.params.bandwidth_bins(),
            CaptureMode::Spectrogram => self.capture_config.spectrogram_size / 2 + 1,
        }
    }

    /// Start the capture pipeline; no-op while one is already running
    pub fn start_capture(&self) -> Result<(), AudioError> {
        let mut session = lock_session(&self.capture);
        if session.is_some() {
            debug!("Capture already running");
            return Ok(());
        }

        let publisher = self.magnitudes.arm(self.snapshot_len());
        let mut processor: Box<dyn BlockProcessor> = match self.capture_config.mode {
            CaptureMode::Ranging => Box::new(RangePipeline::new(&self.params, publisher)),
            CaptureMode::Spectrogram => Box::new(SpectrogramProcessor::new(
                self.capture_config.spectrogram_size,
                publisher,
            )),
        };

        let handle = self
            .transport
            .open_capture(
                self.stream_settings(),
                Box::new(move |block: &[f32]| processor.process_block(block)),
            )
            .inspect_err(|_| self.magnitudes.disarm())?;

        *session = Some(handle);
        info!("Capture started ({:?} mode)", self.capture_config.mode);
        Ok(())
    }

    /// Stop the capture pipeline if one is running
    pub fn stop_capture(&self) {
        let mut session = lock_session(&self.capture);
        if let Some(handle) = session.take() {
            self.magnitudes.disarm();
            handle.stop();
            info!("Capture stopped");
        }
    }

    /// Start chirp playback; no-op while already transmitting
    pub fn start_transmit(&self) -> Result<(), AudioError> {
        let mut session = lock_session(&self.transmit);
        if session.is_some() {
            debug!("Transmit already running");
            return Ok(());
        }

        let mut generator = SweepGenerator::new(&self.params);
        let handle = self.transport.open_playback(
            self.stream_settings(),
            Box::new(move |out: &mut [f32]| generator.generate(out)),
        )?;

        *session = Some(handle);
        info!(
            "Transmit started: {} Hz + {} Hz over {} ms",
            self.params.baseband_hz, self.params.bandwidth_hz, self.params.duration_ms
        );
        Ok(())
    }

    /// Stop chirp playback if running
    pub fn stop_transmit(&self) {
        let mut session = lock_session(&self.transmit);
        if let Some(handle) = session.take() {
            handle.stop();
            info!("Transmit stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        lock_session(&self.capture).is_some()
    }

    pub fn is_transmitting(&self) -> bool {
        lock_session(&self.transmit).is_some()
    }

    /// Latest magnitude spectrum, blocking until the current session publishes
    pub fn get_magnitude_snapshot(&self) -> Vec<f32> {
        self.magnitudes.snapshot()
    }

    /// Latest magnitude spectrum without waiting
    pub fn try_magnitude_snapshot(&self) -> Option<Vec<f32>> {
        self.magnitudes.try_snapshot()
    }

    /// Spectra published by the current capture session so far
    pub fn publish_count(&self) -> u64 {
        self.magnitudes.publish_count()
    }

    /// Record raw capture for `duration` on a stream of its own
    pub fn record_for(&self, duration: Duration) -> Result<Vec<f32>, AudioError> {
        Recorder::new(self.stream_settings()).record_for(&self.transport, duration)
    }
}

impl<T: Transport> Drop for Engine<T> {
    fn drop(&mut self) {
        self.stop_capture();
        self.stop_transmit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::loopback::{EchoPath, LoopbackTransport};
    use crate::error::ParamError;

    fn engine(mode: CaptureMode) -> Engine<LoopbackTransport> {
        let config = CaptureConfig {
            mode,
            ..CaptureConfig::default()
        };
        Engine::new(
            LoopbackTransport::new(EchoPath::default()).unpaced(),
            SweepParameters::default(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = SweepParameters {
            duration_ms: 0,
            ..SweepParameters::default()
        };
        let result = Engine::new(LoopbackTransport::default(), params, CaptureConfig::default());
        assert!(matches!(
            result,
            Err(AudioError::Config(ParamError::EmptySweep { .. }))
        ));
    }

    #[test]
    fn test_start_is_idempotent() {
        let engine = engine(CaptureMode::Ranging);
        assert!(!engine.is_capturing());

        engine.start_capture().unwrap();
        engine.start_capture().unwrap();
        assert!(engine.is_capturing());

        engine.start_transmit().unwrap();
        engine.start_transmit().unwrap();
        assert!(engine.is_transmitting());

        engine.stop_capture();
        engine.stop_capture();
        engine.stop_transmit();
        assert!(!engine.is_capturing());
        assert!(!engine.is_transmitting());
    }

    #[test]
    fn test_ranging_session_publishes_band_limited_spectrum() {
        let engine = engine(CaptureMode::Ranging);
        engine.start_transmit().unwrap();
        engine.start_capture().unwrap();

        let snapshot = engine.get_magnitude_snapshot();
        assert_eq!(snapshot.len(), engine.params().bandwidth_bins());
        assert!(snapshot.iter().all(|&m| m >= 0.0));
        assert!(snapshot.iter().any(|&m| m > 0.0));
    }

    #[test]
    fn test_stop_requires_fresh_rendezvous() {
        let engine = engine(CaptureMode::Spectrogram);
        engine.start_capture().unwrap();
        assert_eq!(engine.get_magnitude_snapshot().len(), 513);

        engine.stop_capture();
        assert_eq!(engine.try_magnitude_snapshot(), None);

        engine.start_capture().unwrap();
        assert_eq!(engine.get_magnitude_snapshot().len(), 513);
    }
}
