// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vibe_runner::detector::{PoseLogWriter, SimulatedRunnerConfig};
use vibe_runner::runner::RunnerMotion;
use vibe_runner::scene::{HeadlessScene, RunnerClip, RunnerSceneDriver};
use vibe_runner::{
    AppConfig, Clock, MotionCell, PoseDetecting, RecordedPoseDetector, RunnerSession, SessionExporter,
    SimulatedRunner, SystemClock, TuningCell,
};

/// Runs a headless running session and exports its metrics.
#[derive(Debug, Parser)]
#[command(name = "vibe_runner", version, about)]
struct Args {
    /// JSON configuration file
    config: Option<PathBuf>,

    /// Session length in seconds
    #[arg(long, value_parser = parse_seconds)]
    seconds: Option<f64>,

    /// Replay a recorded pose log instead of the simulated runner
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Record detected poses to a CSV log
    #[arg(long)]
    record: Option<PathBuf>,
}

fn parse_seconds(value: &str) -> std::result::Result<f64, String> {
    let seconds: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("expected a finite, non-negative number of seconds, got {value}"));
    }
    Ok(seconds)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    let seconds = args.seconds.unwrap_or(10.0);

    let motion = MotionCell::new(RunnerMotion::ZERO);
    let tuning = TuningCell::new(config.scene);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let mut driver = RunnerSceneDriver::new(config.terrain, motion.clone(), tuning)
        .context("failed to build terrain")?;
    let render_clock = Arc::clone(&clock);
    let render_hz = config.ticks.render_hz;
    let render = tokio::spawn(async move {
        let mut scene = HeadlessScene::new()
            .with_clip_duration(RunnerClip::SlowRun, 0.8)
            .with_clip_duration(RunnerClip::FastRun, 0.6);
        driver.install(&mut scene);

        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / render_hz));
        let mut ticks: u64 = 0;
        loop {
            ticker.tick().await;
            let report = driver.tick(render_clock.now(), &mut scene);
            ticks += 1;
            if ticks % (render_hz.round() as u64).max(1) == 0 {
                info!(
                    travel_z = report.travel_z,
                    speed = report.displayed_speed_meters_per_second,
                    fast_run = report.animation.blend.fast_run_weight,
                    "render"
                );
            }
        }
    });

    let mut detector: Box<dyn PoseDetecting + Send> = match &args.replay {
        Some(path) => Box::new(
            RecordedPoseDetector::open(path)
                .with_context(|| format!("failed to open pose log {}", path.display()))?,
        ),
        None => Box::new(SimulatedRunner::new(SimulatedRunnerConfig {
            dropout_every: 25,
            ..Default::default()
        })),
    };
    let mut recorder = match &args.record {
        Some(path) => Some(
            PoseLogWriter::create(path)
                .with_context(|| format!("failed to create pose log {}", path.display()))?,
        ),
        None => None,
    };

    let mut session = RunnerSession::new(&config, motion);
    let mut exporter = SessionExporter::new(&config.export.output_directory, None);
    let frame = DynamicImage::new_rgb8(64, 48);

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.ticks.pose_hz));
    let deadline = tokio::time::sleep(Duration::from_secs_f64(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = ticker.tick() => {
                let now = clock.now();
                let pose = match detector.detect(&frame, now) {
                    Ok(pose) => pose,
                    Err(e) => {
                        warn!(error = %e, "pose detection failed");
                        None
                    }
                };
                if let Some(recorder) = recorder.as_mut() {
                    recorder.write_frame(now, pose.as_ref()).context("failed to write pose log")?;
                }
                let result = session.handle_pose(pose, now);
                exporter.record(result.snapshot, now, result.calories);
            }
        }
    }

    render.abort();
    let summary = exporter.summary();
    session.stop();

    if let Some(mut recorder) = recorder {
        recorder.flush().context("failed to flush pose log")?;
        info!(path = %recorder.path().display(), frames = recorder.frames_written(), "pose log saved");
    }

    info!(
        frames = summary.total_frames,
        steps = summary.steps,
        peak_kmh = summary.peak_speed_kilometers_per_hour,
        calories = summary.calories,
        "session finished"
    );

    if config.export.auto_save && !exporter.is_empty() {
        let csv = exporter.export_csv().context("failed to export metrics")?;
        let report = exporter.generate_report().context("failed to write report")?;
        info!(csv = %csv.display(), report = %report.display(), "session exported");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_options() {
        let args = Args::try_parse_from([
            "vibe_runner",
            "run.json",
            "--seconds",
            "2.5",
            "--record",
            "poses.csv",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("run.json")));
        assert_eq!(args.seconds, Some(2.5));
        assert_eq!(args.record, Some(PathBuf::from("poses.csv")));
        assert!(args.replay.is_none());
    }

    #[test]
    fn test_rejects_non_finite_seconds() {
        for bad in ["inf", "NaN", "-1", "abc"] {
            assert!(Args::try_parse_from(["vibe_runner", "--seconds", bad]).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_rejects_unknown_option() {
        assert!(Args::try_parse_from(["vibe_runner", "--fast"]).is_err());
    }
}
