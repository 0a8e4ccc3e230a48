//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::params::{CaptureConfig, CaptureMode, SweepParameters};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "echorange")]
#[command(about = "Acoustic FMCW ranging with a speaker and a microphone", long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Sweep start frequency (Hz)
    #[arg(long, value_name = "HZ", default_value = "18000")]
    pub baseband: f32,

    /// Sweep bandwidth (Hz)
    #[arg(long, value_name = "HZ", default_value = "4000")]
    pub bandwidth: f32,

    /// Active sweep duration; the rest phase matches it
    #[arg(long, value_name = "MILLIS", default_value = "20")]
    pub duration_ms: u32,

    /// Audio sample rate (Hz)
    #[arg(long, value_name = "HZ", default_value = "48000")]
    pub sample_rate: u32,

    /// Samples per audio callback
    #[arg(long, value_name = "SAMPLES", default_value = "256")]
    pub block_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List audio hosts and devices
    Devices,

    /// Transmit chirps and print the strongest range bin per spectrum
    Range {
        /// How long to run
        #[arg(long, value_name = "SECONDS", default_value = "10")]
        seconds: f32,

        /// Simulate the room in memory instead of using audio devices
        #[arg(long)]
        loopback: bool,

        /// Write every spectrum as a line of text
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
    },

    /// Print the dominant frequency of every captured block
    Spectrogram {
        /// How long to run
        #[arg(long, value_name = "SECONDS", default_value = "10")]
        seconds: f32,

        /// Analysis length (samples)
        #[arg(long, value_name = "SAMPLES", default_value = "1024")]
        size: usize,

        /// Simulate the room in memory instead of using audio devices
        #[arg(long)]
        loopback: bool,
    },

    /// Capture raw samples for a fixed time and save them
    Record {
        /// Capture duration
        #[arg(long, value_name = "MILLIS")]
        millis: u64,

        /// Output path; `.wav` writes WAV, anything else space-separated text
        #[arg(long, value_name = "FILE", default_value = "log.txt")]
        out: PathBuf,

        /// Simulate the room in memory instead of using audio devices
        #[arg(long)]
        loopback: bool,
    },
}

impl Args {
    /// Sweep parameters from command-line arguments
    pub fn sweep_parameters(&self) -> SweepParameters {
        SweepParameters {
            baseband_hz: self.baseband,
            bandwidth_hz: self.bandwidth,
            duration_ms: self.duration_ms,
            sample_rate_hz: self.sample_rate,
        }
    }

    /// Capture configuration for the selected subcommand
    pub fn capture_config(&self) -> CaptureConfig {
        let mut config = CaptureConfig {
            block_size: self.block_size,
            ..CaptureConfig::default()
        };
        if let Command::Spectrogram { size, .. } = self.command {
            config.mode = CaptureMode::Spectrogram;
            config.spectrogram_size = size;
        }
        config
    }

    /// Whether the subcommand asked for the in-memory room
    pub fn loopback(&self) -> bool {
        match self.command {
            Command::Devices => false,
            Command::Range { loopback, .. }
            | Command::Spectrogram { loopback, .. }
            | Command::Record { loopback, .. } => loopback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parameter_defaults() {
        let args = Args::parse_from(["echorange", "range"]);
        assert_eq!(args.sweep_parameters(), SweepParameters::default());

        let config = args.capture_config();
        assert_eq!(config.mode, CaptureMode::Ranging);
        assert_eq!(config.block_size, CaptureConfig::default().block_size);
        assert!(!args.loopback());
    }

    #[test]
    fn test_spectrogram_mode_selected() {
        let args = Args::parse_from([
            "echorange",
            "--block-size",
            "512",
            "spectrogram",
            "--size",
            "2048",
            "--loopback",
        ]);
        let config = args.capture_config();
        assert_eq!(config.mode, CaptureMode::Spectrogram);
        assert_eq!(config.spectrogram_size, 2048);
        assert_eq!(config.block_size, 512);
        assert!(args.loopback());
    }

    #[test]
    fn test_record_requires_duration() {
        assert!(Args::try_parse_from(["echorange", "record"]).is_err());
        let args = Args::try_parse_from(["echorange", "record", "--millis", "500"]).unwrap();
        match args.command {
            Command::Record { millis, out, .. } => {
                assert_eq!(millis, 500);
                assert_eq!(out, PathBuf::from("log.txt"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
