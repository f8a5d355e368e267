//! Recorder session management
//!
//! This module provides the `Recorder` engine that manages:
//! - Capture start/stop and chunk encoding
//! - Asynchronous decode of each finished take
//! - Single-use playback handles with resumable offsets
//! - Periodic state and volume notifications

mod callbacks;
mod config;
mod session;
mod state;
mod stats;
mod timeline;

pub use callbacks::{Callbacks, PlaybackEndedCallback, StateCallback, VolumeCallback};
pub use config::SessionConfig;
pub use session::{DecodeStatus, Recorder};
pub use state::RecorderState;
pub use stats::SessionStats;
pub use timeline::{PlaybackTimeline, SliceOutcome};
