use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, interval_at, timeout, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::callbacks::Callbacks;
use super::config::SessionConfig;
use super::state::RecorderState;
use super::stats::SessionStats;
use super::timeline::{PlaybackTimeline, SliceOutcome};
use crate::audio::{
    decode_recording, Analyser, AudioFrame, CaptureDevice, DecodedBuffer, EncoderSink,
    PlaybackEnd, PlaybackHandle, PlaybackOutput,
};
use crate::error::{RecorderError, RecorderResult};

/// How long `stop_play` waits for the handle to report its end
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Shortest ticker period; tokio intervals reject a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

type Reply = oneshot::Sender<RecorderResult<RecorderState>>;
type DecodeResult = RecorderResult<DecodedBuffer>;

enum Command {
    Record(Reply),
    StopRecord(Reply),
    Play(Reply),
    StopPlay(Reply),
    Reset(Reply),
    State(oneshot::Sender<RecorderState>),
    Stats(oneshot::Sender<SessionStats>),
    Shutdown(oneshot::Sender<()>),
}

/// Progress of the decode that follows every recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Idle,
    Decoding,
    Ready,
    Failed,
}

/// Handle to a running recorder engine
///
/// Cheap to clone. Every method is a request to the engine task and returns
/// once the engine has applied it, so the returned state already reflects
/// the operation.
#[derive(Clone)]
pub struct Recorder {
    commands: mpsc::Sender<Command>,
    decode_status: watch::Receiver<DecodeStatus>,
}

impl Recorder {
    /// Spawn the engine task on the current tokio runtime.
    ///
    /// `capture` is the outcome of acquiring the capture device. An `Err`
    /// is logged and leaves the engine inert: every recording operation then
    /// reports `DeviceUnavailable`.
    pub fn spawn(
        config: SessionConfig,
        capture: RecorderResult<Box<dyn CaptureDevice>>,
        output: Box<dyn PlaybackOutput>,
        callbacks: Callbacks,
    ) -> Self {
        match &capture {
            Ok(device) => info!(
                "Creating recorder session {} (capture: {}, output: {})",
                config.session_id,
                device.name(),
                output.name()
            ),
            Err(e) => error!(
                "Recorder session {} has no capture device: {}",
                config.session_id, e
            ),
        }

        let (command_tx, command_rx) = mpsc::channel(32);
        let (status_tx, status_rx) = watch::channel(DecodeStatus::Idle);

        let engine = Engine::new(config, capture, output, callbacks, command_rx, status_tx);
        tokio::spawn(engine.run());

        Self {
            commands: command_tx,
            decode_status: status_rx,
        }
    }

    /// Start a new recording
    pub async fn record(&self) -> RecorderResult<RecorderState> {
        self.request(Command::Record).await
    }

    /// Stop recording and start decoding the take
    pub async fn stop_record(&self) -> RecorderResult<RecorderState> {
        self.request(Command::StopRecord).await
    }

    /// Play the decoded recording, resuming where the last stop left off
    pub async fn play(&self) -> RecorderResult<RecorderState> {
        self.request(Command::Play).await
    }

    /// Stop playback; the next `play()` resumes from here
    pub async fn stop_play(&self) -> RecorderResult<RecorderState> {
        self.request(Command::StopPlay).await
    }

    /// Discard the recording and return to `Inactive`
    pub async fn reset(&self) -> RecorderResult<RecorderState> {
        self.request(Command::Reset).await
    }

    pub async fn state(&self) -> RecorderResult<RecorderState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::State(tx)).await?;
        rx.await.map_err(|_| RecorderError::EngineClosed)
    }

    pub async fn stats(&self) -> RecorderResult<SessionStats> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stats(tx)).await?;
        rx.await.map_err(|_| RecorderError::EngineClosed)
    }

    /// Current decode progress without waiting
    pub fn decode_status(&self) -> DecodeStatus {
        *self.decode_status.borrow()
    }

    /// Wait for an in-flight decode to finish.
    ///
    /// Returns whether a playable recording exists afterwards.
    pub async fn wait_until_settled(&self) -> RecorderResult<bool> {
        let mut status = self.decode_status.clone();
        let settled = status
            .wait_for(|s| *s != DecodeStatus::Decoding)
            .await
            .map_err(|_| RecorderError::EngineClosed)?;
        Ok(*settled == DecodeStatus::Ready)
    }

    /// Stop the engine, its timers, and any active capture or playback
    pub async fn shutdown(&self) -> RecorderResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx)).await?;
        rx.await.map_err(|_| RecorderError::EngineClosed)
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> RecorderResult<RecorderState> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| RecorderError::EngineClosed)?
    }

    async fn send(&self, command: Command) -> RecorderResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RecorderError::EngineClosed)
    }
}

enum Event {
    Command(Command),
    Closed,
    PlaybackEnded(Result<PlaybackEnd, oneshot::error::RecvError>),
    Decoded(Result<DecodeResult, JoinError>),
    Frame(Option<AudioFrame>),
    VolumeTick,
    StateTick,
}

/// The session itself; lives on its own task and owns every resource.
struct Engine {
    config: SessionConfig,
    capture: RecorderResult<Box<dyn CaptureDevice>>,
    output: Box<dyn PlaybackOutput>,
    callbacks: Callbacks,
    commands: mpsc::Receiver<Command>,
    decode_status: watch::Sender<DecodeStatus>,

    state: RecorderState,
    encoder: Option<EncoderSink>,
    chunks_count: usize,
    analyser: Analyser,
    buffer: Option<Arc<DecodedBuffer>>,
    timeline: PlaybackTimeline,
    handle: Option<Box<dyn PlaybackHandle>>,
    play_started: Option<Instant>,
    completed_passes: u64,
    last_pass_secs: Option<f64>,
    recorded_at: Option<DateTime<Utc>>,

    frames: Option<mpsc::Receiver<AudioFrame>>,
    volume_ticker: Option<Interval>,
    pending_decode: Option<JoinHandle<DecodeResult>>,
    playback_ended: Option<oneshot::Receiver<PlaybackEnd>>,
}

impl Engine {
    fn new(
        mut config: SessionConfig,
        capture: RecorderResult<Box<dyn CaptureDevice>>,
        output: Box<dyn PlaybackOutput>,
        callbacks: Callbacks,
        commands: mpsc::Receiver<Command>,
        decode_status: watch::Sender<DecodeStatus>,
    ) -> Self {
        if config.state_poll_interval < MIN_TICK || config.volume_interval < MIN_TICK {
            warn!(
                "Ticker periods below {:?} are raised to {:?}",
                MIN_TICK, MIN_TICK
            );
            config.state_poll_interval = config.state_poll_interval.max(MIN_TICK);
            config.volume_interval = config.volume_interval.max(MIN_TICK);
        }

        Self {
            analyser: Analyser::new(config.analysis_window),
            timeline: PlaybackTimeline::new(config.completion_threshold_secs),
            config,
            capture,
            output,
            callbacks,
            commands,
            decode_status,
            state: RecorderState::Inactive,
            encoder: None,
            chunks_count: 0,
            buffer: None,
            handle: None,
            play_started: None,
            completed_passes: 0,
            last_pass_secs: None,
            recorded_at: None,
            frames: None,
            volume_ticker: None,
            pending_decode: None,
            playback_ended: None,
        }
    }

    async fn run(mut self) {
        info!("Recorder engine started: {}", self.config.session_id);

        let mut state_ticker = interval(self.config.state_poll_interval);
        state_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Device events go first so commands always see them applied.
            let event = tokio::select! {
                biased;
                end = recv_opt(&mut self.playback_ended) => Event::PlaybackEnded(end),
                result = join_opt(&mut self.pending_decode) => Event::Decoded(result),
                frame = next_frame(&mut self.frames) => Event::Frame(frame),
                command = self.commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => Event::Closed,
                },
                _ = tick_opt(&mut self.volume_ticker) => Event::VolumeTick,
                _ = state_ticker.tick() => Event::StateTick,
            };

            match event {
                Event::Command(command) => {
                    if !self.handle_command(command).await {
                        return;
                    }
                }
                Event::Closed => break,
                Event::PlaybackEnded(end) => {
                    self.playback_ended = None;
                    self.finish_playback(end, Instant::now());
                }
                Event::Decoded(result) => {
                    self.pending_decode = None;
                    self.finish_decode(result);
                }
                Event::Frame(Some(frame)) => self.ingest(&frame),
                Event::Frame(None) => {
                    info!("Capture stream ended");
                    self.frames = None;
                }
                Event::VolumeTick => {
                    if self.state == RecorderState::Recording {
                        let level = self.analyser.level();
                        self.callbacks.volume_level(level);
                    }
                }
                Event::StateTick => self.callbacks.state_changed(self.state),
            }
        }

        self.teardown().await;
    }

    /// Returns false once the engine should exit.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Record(reply) => {
                let result = self.record().await;
                let _ = reply.send(self.logged("record", result));
            }
            Command::StopRecord(reply) => {
                let result = self.stop_record().await;
                let _ = reply.send(self.logged("stop recording", result));
            }
            Command::Play(reply) => {
                let result = self.play();
                let _ = reply.send(self.logged("play", result));
            }
            Command::StopPlay(reply) => {
                let result = self.stop_play().await;
                let _ = reply.send(self.logged("stop playback", result));
            }
            Command::Reset(reply) => {
                let result = self.reset().await;
                let _ = reply.send(self.logged("reset", result));
            }
            Command::State(reply) => {
                let _ = reply.send(self.state);
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            Command::Shutdown(reply) => {
                self.teardown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn logged(
        &self,
        operation: &str,
        result: RecorderResult<RecorderState>,
    ) -> RecorderResult<RecorderState> {
        match &result {
            Err(e @ (RecorderError::InvalidState { .. } | RecorderError::NoRecording)) => {
                debug!("Ignoring {}: {}", operation, e);
            }
            Err(e) => warn!("Failed to {}: {}", operation, e),
            Ok(_) => {}
        }
        result
    }

    fn invalid(&self, operation: &'static str) -> RecorderError {
        RecorderError::InvalidState {
            operation,
            state: self.state,
        }
    }

    async fn record(&mut self) -> RecorderResult<RecorderState> {
        if let Err(e) = &self.capture {
            return Err(e.clone());
        }
        if self.state == RecorderState::Recording {
            return Err(self.invalid("record"));
        }
        if self.pending_decode.is_some() {
            return Err(RecorderError::DecodePending);
        }

        let frames = match self.capture.as_mut() {
            Ok(device) => device.start().await?,
            Err(e) => return Err(e.clone()),
        };

        self.discard_playback();

        self.buffer = None;
        self.timeline.reset();
        self.encoder = Some(EncoderSink::new(self.config.sample_rate, self.config.channels));
        self.chunks_count = 0;
        self.analyser.clear();
        self.frames = Some(frames);

        let period = self.config.volume_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.volume_ticker = Some(ticker);

        self.decode_status.send_replace(DecodeStatus::Idle);
        info!("Recording started: {}", self.config.session_id);

        self.transition(RecorderState::Recording);
        Ok(self.state)
    }

    async fn stop_record(&mut self) -> RecorderResult<RecorderState> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("stop recording"));
        }

        self.volume_ticker = None;

        let stopped = match self.capture.as_mut() {
            Ok(device) => device.stop().await,
            Err(e) => Err(e.clone()),
        };
        if let Err(e) = stopped {
            error!("Capture device did not stop cleanly: {}", e);
        }

        // Whatever the device delivered before stopping belongs to this take.
        if let Some(mut frames) = self.frames.take() {
            while let Ok(frame) = frames.try_recv() {
                self.ingest(&frame);
            }
        }

        let encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| EncoderSink::new(self.config.sample_rate, self.config.channels));
        self.chunks_count = encoder.chunk_count();

        info!(
            "Recording stopped: {} chunks, decoding",
            self.chunks_count
        );

        self.pending_decode = Some(tokio::task::spawn_blocking(move || {
            encoder.finish().and_then(decode_recording)
        }));
        self.decode_status.send_replace(DecodeStatus::Decoding);
        self.recorded_at = Some(Utc::now());

        self.transition(RecorderState::Recorded);
        Ok(self.state)
    }

    fn play(&mut self) -> RecorderResult<RecorderState> {
        if self.state == RecorderState::Playing {
            return Err(self.invalid("play"));
        }
        let Some(buffer) = self.buffer.clone() else {
            return Err(if self.pending_decode.is_some() {
                RecorderError::DecodePending
            } else {
                RecorderError::NoRecording
            });
        };

        // Handles are single-use; every play gets a fresh one on the same buffer.
        let mut handle = self.output.create_handle(buffer);
        let offset = self.timeline.resume_offset();
        let ended = handle.start(offset)?;

        self.handle = Some(handle);
        self.playback_ended = Some(ended);
        self.play_started = Some(Instant::now());

        info!(
            "Playback started at {:.2}s of {:.2}s",
            offset,
            self.timeline.duration()
        );

        self.transition(RecorderState::Playing);
        Ok(self.state)
    }

    async fn stop_play(&mut self) -> RecorderResult<RecorderState> {
        if self.state != RecorderState::Playing {
            return Err(self.invalid("stop playback"));
        }
        if self.handle.is_none() {
            return Err(self.invalid("stop playback"));
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        let stopped_at = Instant::now();
        self.transition(RecorderState::Stopped);

        // The handle reports its end on stop too; book the slice before replying.
        if let Some(ended) = self.playback_ended.take() {
            match timeout(STOP_GRACE, ended).await {
                Ok(end) => self.finish_playback(end, stopped_at),
                Err(_) => {
                    warn!("Playback handle did not report its end after stop");
                    self.finish_playback(Ok(PlaybackEnd::Stopped), stopped_at);
                }
            }
        }

        Ok(self.state)
    }

    async fn reset(&mut self) -> RecorderResult<RecorderState> {
        self.discard_playback();

        if self.state == RecorderState::Recording {
            self.volume_ticker = None;
            if let Ok(device) = self.capture.as_mut() {
                if let Err(e) = device.stop().await {
                    error!("Capture device did not stop cleanly: {}", e);
                }
            }
            self.frames = None;
            self.encoder = None;
        }

        // Detaching the task drops its result when it lands.
        if self.pending_decode.take().is_some() {
            info!("Discarding in-flight decode");
        }

        self.buffer = None;
        self.timeline.reset();
        self.chunks_count = 0;
        self.decode_status.send_replace(DecodeStatus::Idle);

        info!("Session reset: {}", self.config.session_id);
        self.transition(RecorderState::Inactive);
        Ok(self.state)
    }

    fn finish_decode(&mut self, result: Result<DecodeResult, JoinError>) {
        match result {
            Ok(Ok(buffer)) => {
                let duration = buffer.duration_secs();
                self.timeline.set_duration(duration);
                self.buffer = Some(Arc::new(buffer));
                self.decode_status.send_replace(DecodeStatus::Ready);
                info!("Recording ready: {:.2}s", duration);
            }
            Ok(Err(e)) => {
                error!("Failed to decode recording: {}", e);
                self.buffer = None;
                self.decode_status.send_replace(DecodeStatus::Failed);
            }
            Err(e) => {
                error!("Decode task panicked: {}", e);
                self.buffer = None;
                self.decode_status.send_replace(DecodeStatus::Failed);
            }
        }
    }

    /// Book the slice that ran from play until `ended_at`
    fn finish_playback(
        &mut self,
        end: Result<PlaybackEnd, oneshot::error::RecvError>,
        ended_at: Instant,
    ) {
        self.handle = None;
        let Some(started) = self.play_started.take() else {
            return;
        };

        let elapsed = ended_at.saturating_duration_since(started).as_secs_f64();
        let end = end.unwrap_or(PlaybackEnd::Stopped);

        match self.timeline.record_slice(elapsed) {
            SliceOutcome::Finished { played_secs } => {
                self.completed_passes += 1;
                self.last_pass_secs = Some(played_secs);
                info!("Playback finished ({:?}): {:.2}s played", end, played_secs);
                self.callbacks.playback_ended();
                self.transition(RecorderState::Inactive);
            }
            SliceOutcome::Remaining { remaining_secs } => {
                debug!(
                    "Playback paused ({:?}) after {:.2}s, {:.2}s remaining",
                    end, elapsed, remaining_secs
                );
                if self.state == RecorderState::Playing {
                    self.transition(RecorderState::Stopped);
                }
            }
        }
    }

    /// Drop any active playback without booking a slice
    fn discard_playback(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.playback_ended = None;
        self.play_started = None;
    }

    fn ingest(&mut self, frame: &AudioFrame) {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.write_frame(frame);
            self.chunks_count = encoder.chunk_count();
        }
        self.analyser.push(&frame.samples);
    }

    fn transition(&mut self, state: RecorderState) {
        if self.state != state {
            debug!("State: {} -> {}", self.state, state);
        }
        self.state = state;
        self.callbacks.state_changed(state);
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.config.session_id.clone(),
            state: self.state,
            duration_secs: self.timeline.duration(),
            time_slices: self.timeline.slices().to_vec(),
            played_secs: self.timeline.resume_offset(),
            playable: self.buffer.is_some(),
            decoding: self.pending_decode.is_some(),
            chunks_count: self.chunks_count,
            completed_passes: self.completed_passes,
            last_pass_secs: self.last_pass_secs,
            recorded_at: self.recorded_at,
        }
    }

    async fn teardown(&mut self) {
        self.discard_playback();
        self.volume_ticker = None;
        self.pending_decode = None;

        if let Ok(device) = self.capture.as_mut() {
            if device.is_capturing() {
                if let Err(e) = device.stop().await {
                    error!("Capture device did not stop cleanly: {}", e);
                }
            }
        }
        self.frames = None;

        info!("Recorder engine stopped: {}", self.config.session_id);
    }
}

async fn recv_opt<T>(rx: &mut Option<oneshot::Receiver<T>>) -> Result<T, oneshot::error::RecvError> {
    match rx {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}

async fn join_opt<T>(handle: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(rx: &mut Option<mpsc::Receiver<AudioFrame>>) -> Option<AudioFrame> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn tick_opt(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
