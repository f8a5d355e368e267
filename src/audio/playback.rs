//! Playback outputs and single-use playback handles.
//!
//! A handle is bound to a decoded buffer and can be started exactly once.
//! The engine asks its output for a fresh handle on every `play()`; the
//! buffer is shared, the handle never is.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::{sleep, Duration};
use tracing::debug;

use super::decoder::DecodedBuffer;
use crate::error::{RecorderError, RecorderResult};

/// Why a playback handle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Ran to the end of the buffer
    Completed,
    /// `stop()` was called (or the handle was dropped)
    Stopped,
}

/// Single-use playback controller
pub trait PlaybackHandle: Send {
    /// Start playing from `offset_secs` into the buffer.
    ///
    /// The returned receiver fires once, on natural completion or on stop.
    fn start(&mut self, offset_secs: f64) -> RecorderResult<oneshot::Receiver<PlaybackEnd>>;

    /// Stop playback. No-op if not playing.
    fn stop(&mut self);

    /// Whether `start()` has already been called
    fn is_consumed(&self) -> bool;

    fn buffer(&self) -> &Arc<DecodedBuffer>;
}

/// Factory for playback handles
pub trait PlaybackOutput: Send {
    fn create_handle(&self, buffer: Arc<DecodedBuffer>) -> Box<dyn PlaybackHandle>;

    /// Output name for logging
    fn name(&self) -> &str;
}

/// Timer-driven output
///
/// Plays nothing audible; each handle simply ends after the remaining buffer
/// duration has elapsed on the tokio clock.
#[derive(Debug, Default, Clone)]
pub struct ClockOutput;

impl ClockOutput {
    pub fn new() -> Self {
        Self
    }
}

impl PlaybackOutput for ClockOutput {
    fn create_handle(&self, buffer: Arc<DecodedBuffer>) -> Box<dyn PlaybackHandle> {
        Box::new(ClockHandle::new(buffer))
    }

    fn name(&self) -> &str {
        "clock"
    }
}

pub struct ClockHandle {
    buffer: Arc<DecodedBuffer>,
    consumed: bool,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ClockHandle {
    pub fn new(buffer: Arc<DecodedBuffer>) -> Self {
        Self {
            buffer,
            consumed: false,
            stop_tx: None,
        }
    }
}

impl PlaybackHandle for ClockHandle {
    fn start(&mut self, offset_secs: f64) -> RecorderResult<oneshot::Receiver<PlaybackEnd>> {
        if self.consumed {
            return Err(RecorderError::HandleConsumed);
        }
        if !offset_secs.is_finite() {
            return Err(RecorderError::Playback(format!(
                "cannot start at offset {}",
                offset_secs
            )));
        }
        self.consumed = true;

        let duration = self.buffer.duration_secs();
        let offset = offset_secs.clamp(0.0, duration);
        let remaining = Duration::from_secs_f64(duration - offset);

        let (ended_tx, ended_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let end = tokio::select! {
                _ = sleep(remaining) => PlaybackEnd::Completed,
                _ = stop_rx => PlaybackEnd::Stopped,
            };
            let _ = ended_tx.send(end);
        });

        self.stop_tx = Some(stop_tx);
        debug!(offset, remaining_secs = remaining.as_secs_f64(), "Clock playback started");

        Ok(ended_rx)
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    fn is_consumed(&self) -> bool {
        self.consumed
    }

    fn buffer(&self) -> &Arc<DecodedBuffer> {
        &self.buffer
    }
}
