use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use recording_box::{
    Callbacks, CaptureDeviceFactory, CaptureSource, ClockOutput, Config, RecordButton, Recorder,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Source {
    Tone,
    File,
    Microphone,
}

/// Record a take, then play it back through the recorder engine
#[derive(Debug, Parser)]
#[command(name = "recording-box", version)]
struct Args {
    /// Config file (TOML/YAML/JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<String>,

    /// Capture source
    #[arg(long, value_enum, default_value = "tone")]
    source: Source,

    /// WAV file for `--source file`
    #[arg(long)]
    file: Option<PathBuf>,

    /// How long to record, in seconds
    #[arg(long, default_value_t = 2.0, value_parser = parse_secs)]
    record_secs: f64,

    /// Pause playback after this many seconds, then resume
    #[arg(long, value_parser = parse_secs)]
    interrupt_after: Option<f64>,
}

fn parse_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("{} is not a non-negative number of seconds", s));
    }
    Ok(secs)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let source = match args.source {
        Source::Tone => CaptureSource::Tone {
            frequency_hz: cfg.audio.tone_frequency_hz,
            amplitude: cfg.audio.tone_amplitude,
        },
        Source::File => match &args.file {
            Some(path) => CaptureSource::File(path.clone()),
            None => bail!("--source file needs --file <path>"),
        },
        Source::Microphone => CaptureSource::Microphone,
    };

    let capture = CaptureDeviceFactory::create(source, cfg.capture_config());

    let (ended_tx, mut ended_rx) = mpsc::unbounded_channel();
    let callbacks = Callbacks::new()
        .on_state_change(|state| debug!("State: {}", state))
        .on_volume_level(|level| debug!("Volume: {:.3}", level))
        .on_playback_ended(move || {
            let _ = ended_tx.send(());
        });

    let recorder = Recorder::spawn(
        cfg.session_config(),
        capture,
        Box::new(ClockOutput::new()),
        callbacks,
    );
    let mut button = RecordButton::new(recorder.clone());

    info!("recording-box v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_cycle(&mut button, &args, &mut ended_rx).await {
        error!("Session ended early: {}", e);
    }

    let stats = recorder.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    recorder.shutdown().await?;
    Ok(())
}

async fn run_cycle(
    button: &mut RecordButton,
    args: &Args,
    ended_rx: &mut mpsc::UnboundedReceiver<()>,
) -> Result<()> {
    info!("[{}] Recording for {:.1}s", button.label(), args.record_secs);
    button.press().await?;
    sleep(Duration::from_secs_f64(args.record_secs)).await;

    button.press().await?;
    if !button.recorder().wait_until_settled().await? {
        warn!("Nothing playable was recorded");
        return Ok(());
    }

    info!("[{}] Playing back", button.label());
    button.press().await?;

    if let Some(after) = args.interrupt_after {
        sleep(Duration::from_secs_f64(after)).await;
        info!("[{}] Pausing", button.label());
        button.press().await?;
        info!("[{}] Resuming", button.label());
        button.press().await?;
    }

    if ended_rx.recv().await.is_some() {
        button.playback_ended();
        info!("Playback complete, button shows {}", button.label());
    }

    Ok(())
}
