//! Recorder error types (thiserror-based).

use thiserror::Error;

use crate::session::RecorderState;

/// Every failure the engine can report back to a caller.
///
/// Nothing in the engine panics on these; each one is logged where it happens
/// and returned so the presentation layer can decide whether to surface it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecorderError {
    /// Capture permission denied or no capture API. The engine stays inert.
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The operation is not valid in the current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: RecorderState,
    },

    /// There is no decoded recording to play.
    #[error("No playable recording")]
    NoRecording,

    /// The previous recording is still being decoded.
    #[error("Previous recording is still decoding")]
    DecodePending,

    /// The capture device failed to start or stop.
    #[error("Capture error: {0}")]
    Capture(String),

    /// Captured frames could not be packed into a recording container.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The encoded recording could not be turned into a playable buffer.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The playback output failed.
    #[error("Playback error: {0}")]
    Playback(String),

    /// A playback handle was started a second time.
    #[error("Playback handle already used")]
    HandleConsumed,

    /// The engine task is gone.
    #[error("Recorder engine has shut down")]
    EngineClosed,
}

pub type RecorderResult<T> = std::result::Result<T, RecorderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display() {
        let err = RecorderError::InvalidState {
            operation: "stop recording",
            state: RecorderState::Inactive,
        };
        assert_eq!(err.to_string(), "Cannot stop recording while inactive");
    }

    #[test]
    fn device_unavailable_display() {
        let err = RecorderError::DeviceUnavailable("permission denied".to_string());
        assert_eq!(
            err.to_string(),
            "Capture device unavailable: permission denied"
        );
    }
}
