// Records a tone, plays half of it, pauses, then resumes to the end.
//
// Run with: cargo run --example pause_and_resume

use anyhow::Result;
use recording_box::{
    Callbacks, CaptureConfig, CaptureDeviceFactory, CaptureSource, ClockOutput, Recorder,
    SessionConfig,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Pause and resume ===\n");

    let capture = CaptureDeviceFactory::create(
        CaptureSource::Tone {
            frequency_hz: 220.0,
            amplitude: 0.3,
        },
        CaptureConfig::default(),
    );

    let (ended_tx, mut ended_rx) = mpsc::unbounded_channel();
    let callbacks = Callbacks::new()
        .on_volume_level(|level| println!("   level {:.3}", level))
        .on_playback_ended(move || {
            let _ = ended_tx.send(());
        });

    let recorder = Recorder::spawn(
        SessionConfig {
            // Keep the console readable.
            volume_interval: Duration::from_millis(250),
            ..SessionConfig::default()
        },
        capture,
        Box::new(ClockOutput::new()),
        callbacks,
    );

    println!("🎙️  Recording 2s...");
    recorder.record().await?;
    sleep(Duration::from_secs(2)).await;
    recorder.stop_record().await?;

    if !recorder.wait_until_settled().await? {
        println!("❌ Nothing to play");
        return Ok(());
    }

    println!("▶️  Playing...");
    recorder.play().await?;
    sleep(Duration::from_secs(1)).await;

    println!("⏸️  Paused");
    recorder.stop_play().await?;
    let stats = recorder.stats().await?;
    println!("   played {:.2}s of {:.2}s", stats.played_secs, stats.duration_secs);

    sleep(Duration::from_millis(500)).await;

    println!("▶️  Resuming...");
    recorder.play().await?;
    ended_rx.recv().await;

    let stats = recorder.stats().await?;
    println!(
        "✅ Done: {} pass(es), last one {:.2}s",
        stats.completed_passes,
        stats.last_pass_secs.unwrap_or_default()
    );

    recorder.shutdown().await?;
    Ok(())
}
