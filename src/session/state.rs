use std::fmt;

use serde::{Deserialize, Serialize};

/// Recorder/player lifecycle
///
/// `Inactive → Recording → Recorded → Playing → Stopped`, with a fully played
/// pass returning to `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    #[default]
    Inactive,
    Recording,
    Recorded,
    Playing,
    Stopped,
}

impl RecorderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderState::Inactive => "inactive",
            RecorderState::Recording => "recording",
            RecorderState::Recorded => "recorded",
            RecorderState::Playing => "playing",
            RecorderState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
