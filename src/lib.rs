//! redub - subtitle translation and dubbing pipeline
//!
//! Merges fragmentary subtitle cues into sentences for translation, splits
//! the translations back onto the original timing, and mixes per-cue speech
//! clips into one dubbed track.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod media;
pub mod mix;
pub mod segment;
pub mod subtitle;
pub mod synth;
pub mod translate;
pub mod workflow;
