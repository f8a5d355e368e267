//! Single-button front end over a `Recorder`
//!
//! Mirrors the record → stop → play → pause cycle of the recording widget,
//! plus the "try again" button that discards the take.

use tracing::debug;

use crate::error::{RecorderError, RecorderResult};
use crate::session::{Recorder, RecorderState};

/// What the next press of the button does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Record,
    StopRecord,
    Play,
    StopPlay,
}

impl ButtonAction {
    /// Icon glyph name shown on the button
    pub fn label(&self) -> &'static str {
        match self {
            ButtonAction::Record => "mic",
            ButtonAction::StopRecord => "stop",
            ButtonAction::Play => "play_arrow",
            ButtonAction::StopPlay => "pause",
        }
    }
}

pub struct RecordButton {
    recorder: Recorder,
    action: ButtonAction,
    retry_enabled: bool,
}

impl RecordButton {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            action: ButtonAction::Record,
            retry_enabled: false,
        }
    }

    pub fn action(&self) -> ButtonAction {
        self.action
    }

    pub fn label(&self) -> &'static str {
        self.action.label()
    }

    pub fn retry_enabled(&self) -> bool {
        self.retry_enabled
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Run the current action and advance the button.
    ///
    /// On error the button stays where it was, except for a pause that
    /// arrives after playback already finished, which snaps back to `Play`.
    pub async fn press(&mut self) -> RecorderResult<RecorderState> {
        let pressed = self.action;
        let result = match pressed {
            ButtonAction::Record => self.recorder.record().await,
            ButtonAction::StopRecord => self.recorder.stop_record().await,
            ButtonAction::Play => self.recorder.play().await,
            ButtonAction::StopPlay => self.recorder.stop_play().await,
        };

        match (&result, pressed) {
            (Ok(_), ButtonAction::Record) => self.set(ButtonAction::StopRecord, false),
            (Ok(_), ButtonAction::StopRecord) => self.set(ButtonAction::Play, true),
            (Ok(_), ButtonAction::Play) => self.set(ButtonAction::StopPlay, false),
            (Ok(_), ButtonAction::StopPlay) => self.set(ButtonAction::Play, true),
            (Err(RecorderError::InvalidState { .. }), ButtonAction::StopPlay) => {
                self.set(ButtonAction::Play, true)
            }
            (Err(e), _) => debug!("Button press {:?} failed: {}", pressed, e),
        }

        result
    }

    /// Playback ran to the end
    pub fn playback_ended(&mut self) {
        self.set(ButtonAction::Play, true);
    }

    /// Discard the take and start over
    pub async fn try_again(&mut self) -> RecorderResult<RecorderState> {
        let state = self.recorder.reset().await?;
        self.set(ButtonAction::Record, false);
        Ok(state)
    }

    fn set(&mut self, action: ButtonAction, retry_enabled: bool) {
        self.action = action;
        self.retry_enabled = retry_enabled;
    }
}
