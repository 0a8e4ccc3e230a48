//! Bounded-duration raw capture and on-disk export of samples and spectra.

use log::info;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::transport::Transport;
use crate::error::AudioError;
use crate::params::StreamSettings;

/// One-shot diagnostic capture of raw microphone samples
#[derive(Debug, Clone, Copy)]
pub struct Recorder {
    settings: StreamSettings,
}

impl Recorder {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    /// Capture for `duration`, blocking the caller, and return every sample seen
    ///
    /// Opens its own capture stream, independent of any ranging session.
    pub fn record_for<T>(&self, transport: &T, duration: Duration) -> Result<Vec<f32>, AudioError>
    where
        T: Transport + ?Sized,
    {
        let expected = (duration.as_secs_f64() * self.settings.sample_rate_hz as f64) as usize;
        let log = Arc::new(Mutex::new(Vec::with_capacity(expected)));
        let sink = Arc::clone(&log);

        let stream = transport.open_capture(
            self.settings,
            Box::new(move |block: &[f32]| {
                let mut log = sink.lock().unwrap_or_else(|e| e.into_inner());
                log.extend_from_slice(block);
            }),
        )?;

        thread::sleep(duration);
        stream.stop();

        let samples = std::mem::take(&mut *log.lock().unwrap_or_else(|e| e.into_inner()));
        info!(
            "Recorded {} samples ({:.2}s at {}Hz)",
            samples.len(),
            samples.len() as f32 / self.settings.sample_rate_hz as f32,
            self.settings.sample_rate_hz
        );
        Ok(samples)
    }
}

/// Write samples as space-separated fixed-point text (`"%.5f "` per value)
pub fn write_text_log<W: Write>(mut writer: W, samples: &[f32]) -> io::Result<()> {
    for v in samples {
        write!(writer, "{:.5} ", v)?;
    }
    writer.flush()
}

/// Append one spectrum as a line of space-separated values
pub fn append_magnitude_line<W: Write>(writer: &mut W, magnitudes: &[f32]) -> io::Result<()> {
    for v in magnitudes {
        write!(writer, "{:.5} ", v)?;
    }
    writer.write_all(b"\n")
}

/// Write mono 32-bit float WAV
pub fn write_wav(path: &Path, samples: &[f32], sample_rate_hz: u32) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}
