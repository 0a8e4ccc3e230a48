//! Echorange library - Acoustic FMCW ranging with a speaker and a microphone

pub mod audio;
pub mod cli;
pub mod error;
pub mod params;
