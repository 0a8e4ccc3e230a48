//! Echorange - acoustic FMCW ranging
//!
//! Plays a repeating near-ultrasonic chirp through the speaker, locks onto it
//! in the microphone stream and reports the strongest reflection distance.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use echorange::audio::{
    append_magnitude_line, list_devices, write_text_log, write_wav, CpalTransport, Engine,
    LoopbackTransport, Transport,
};
use echorange::cli::{Args, Command};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Index and value of the largest magnitude
fn peak(magnitudes: &[f32]) -> Option<(usize, f32)> {
    magnitudes
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Poll the engine for fresh spectra until `seconds` elapse
fn watch<T, F>(engine: &Engine<T>, seconds: f32, mut on_spectrum: F) -> Result<u64>
where
    T: Transport,
    F: FnMut(&[f32]) -> Result<()>,
{
    let deadline = Instant::now() + Duration::from_secs_f32(seconds);
    let refresh = Duration::from_millis(50);
    let mut seen = 0;

    while Instant::now() < deadline {
        let count = engine.publish_count();
        if count != seen {
            if let Some(spectrum) = engine.try_magnitude_snapshot() {
                on_spectrum(&spectrum)?;
            }
            seen = count;
        }
        thread::sleep(refresh);
    }
    Ok(seen)
}

fn run_range<T: Transport>(engine: Engine<T>, seconds: f32, log_path: Option<&Path>) -> Result<()> {
    let mut log = log_path
        .map(|path| {
            File::create(path)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create {}", path.display()))
        })
        .transpose()?;

    engine.start_transmit()?;
    engine.start_capture()?;
    info!(
        "Ranging for {:.1}s, {:.1} cm per bin",
        seconds,
        engine.params().range_resolution_m() * 100.0
    );

    let params = *engine.params();
    let published = watch(&engine, seconds, |spectrum| {
        if let Some((bin, magnitude)) = peak(spectrum) {
            println!(
                "{:6.2} m  (bin {:3}, magnitude {:.3})",
                params.bin_distance_m(bin),
                bin,
                magnitude
            );
        }
        if let Some(log) = log.as_mut() {
            append_magnitude_line(log, spectrum)?;
        }
        Ok(())
    })?;

    engine.stop_capture();
    engine.stop_transmit();

    if published == 0 {
        warn!("No sweep was ever synchronized; is the speaker audible to the microphone?");
    }
    Ok(())
}

fn run_spectrogram<T: Transport>(engine: Engine<T>, seconds: f32) -> Result<()> {
    engine.start_capture()?;

    let bin_hz =
        engine.params().sample_rate_hz as f32 / engine.capture_config().spectrogram_size as f32;
    watch(&engine, seconds, |spectrum| {
        if let Some((bin, magnitude)) = peak(spectrum) {
            println!("{:8.1} Hz  (magnitude {:.3})", bin as f32 * bin_hz, magnitude);
        }
        Ok(())
    })?;

    engine.stop_capture();
    Ok(())
}

fn run_record<T: Transport>(engine: Engine<T>, millis: u64, out: &Path) -> Result<()> {
    let samples = engine.record_for(Duration::from_millis(millis))?;

    let is_wav = out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        write_wav(out, &samples, engine.params().sample_rate_hz)?;
    } else {
        let file =
            File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
        write_text_log(BufWriter::new(file), &samples)?;
    }

    println!("Wrote {} samples to {}", samples.len(), out.display());
    Ok(())
}

fn run<T: Transport>(args: &Args, transport: T) -> Result<()> {
    let engine = Engine::new(transport, args.sweep_parameters(), args.capture_config())?;

    match &args.command {
        Command::Devices => Ok(list_devices()?),
        Command::Range { seconds, log, .. } => run_range(engine, *seconds, log.as_deref()),
        Command::Spectrogram { seconds, .. } => run_spectrogram(engine, *seconds),
        Command::Record { millis, out, .. } => run_record(engine, *millis, out),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.loopback() {
        info!("Using in-memory loopback room");
        run(&args, LoopbackTransport::default())
    } else {
        run(&args, CpalTransport::new())
    }
}
