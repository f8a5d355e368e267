use std::fmt;

use super::state::RecorderState;

pub type StateCallback = Box<dyn FnMut(RecorderState) + Send>;
pub type VolumeCallback = Box<dyn FnMut(f32) + Send>;
pub type PlaybackEndedCallback = Box<dyn FnMut() + Send>;

/// Outward notification channels, handed to the engine at spawn time
///
/// All three are optional. They run on the engine task, so they should hand
/// work off (a channel send, a UI invalidation) rather than block.
#[derive(Default)]
pub struct Callbacks {
    on_state_change: Option<StateCallback>,
    on_volume_level: Option<VolumeCallback>,
    on_playback_ended: Option<PlaybackEndedCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every transition and on every state-poll tick
    pub fn on_state_change(mut self, f: impl FnMut(RecorderState) + Send + 'static) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    /// Called on every volume tick while recording
    pub fn on_volume_level(mut self, f: impl FnMut(f32) + Send + 'static) -> Self {
        self.on_volume_level = Some(Box::new(f));
        self
    }

    /// Called once per fully played pass
    pub fn on_playback_ended(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_playback_ended = Some(Box::new(f));
        self
    }

    pub(crate) fn state_changed(&mut self, state: RecorderState) {
        if let Some(f) = self.on_state_change.as_mut() {
            f(state);
        }
    }

    pub(crate) fn volume_level(&mut self, level: f32) {
        if let Some(f) = self.on_volume_level.as_mut() {
            f(level);
        }
    }

    pub(crate) fn playback_ended(&mut self) {
        if let Some(f) = self.on_playback_ended.as_mut() {
            f();
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_state_change", &self.on_state_change.is_some())
            .field("on_volume_level", &self.on_volume_level.is_some())
            .field("on_playback_ended", &self.on_playback_ended.is_some())
            .finish()
    }
}
