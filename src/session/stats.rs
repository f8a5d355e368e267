use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::RecorderState;

/// Snapshot of a recorder session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Current lifecycle state
    pub state: RecorderState,

    /// Length of the decoded recording in seconds (0 when there is none)
    pub duration_secs: f64,

    /// Uninterrupted playback stretches in the current pass
    pub time_slices: Vec<f64>,

    /// Sum of `time_slices`; the next play resumes here
    pub played_secs: f64,

    /// Whether a decoded recording is ready to play
    pub playable: bool,

    /// Whether the last recording is still being decoded
    pub decoding: bool,

    /// Encoded chunks in the current (or last) recording
    pub chunks_count: usize,

    /// Number of fully played passes since the engine started
    pub completed_passes: u64,

    /// Seconds covered by the most recent completed pass
    pub last_pass_secs: Option<f64>,

    /// When the last recording was stopped
    pub recorded_at: Option<DateTime<Utc>>,
}
