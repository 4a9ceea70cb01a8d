// src/data.rs - Per-session metrics export
use crate::clock::Timestamp;
use crate::error::Result;
use crate::running::RunningMetricsSnapshot;
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct MetricsRecord {
    frame: usize,
    timestamp: f64,
    pose_detected: bool,
    movement_quality_percent: u8,
    cadence_steps_per_second: f64,
    cadence_steps_per_minute: f64,
    speed_meters_per_second: f64,
    speed_kilometers_per_hour: f64,
    steps: u64,
    close_up_mode: bool,
    shoulder_distance: Option<f64>,
    calories: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RecordedSnapshot {
    timestamp: Timestamp,
    snapshot: RunningMetricsSnapshot,
    calories: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub total_frames: usize,
    /// Share of frames with a detected pose, 0..=100.
    pub detection_rate_percent: f64,
    pub steps: u64,
    pub peak_speed_kilometers_per_hour: f64,
    pub average_cadence_steps_per_minute: f64,
    pub calories: f64,
    pub duration_seconds: f64,
}

pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
    records: Vec<RecordedSnapshot>,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            records: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&mut self, snapshot: RunningMetricsSnapshot, timestamp: Timestamp, calories: f64) {
        self.records.push(RecordedSnapshot {
            timestamp,
            snapshot,
            calories,
        });
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("metrics.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for (frame, recorded) in self.records.iter().enumerate() {
            let s = &recorded.snapshot;
            writer.serialize(MetricsRecord {
                frame,
                timestamp: recorded.timestamp,
                pose_detected: s.pose_detected,
                movement_quality_percent: s.movement_quality_percent,
                cadence_steps_per_second: s.cadence_steps_per_second,
                cadence_steps_per_minute: s.cadence_steps_per_minute,
                speed_meters_per_second: s.speed_meters_per_second,
                speed_kilometers_per_hour: s.speed_kilometers_per_hour,
                steps: s.steps,
                close_up_mode: s.is_close_up_mode,
                shoulder_distance: s.shoulder_distance,
                calories: recorded.calories,
            })?;
        }

        writer.flush()?;
        info!(path = %csv_path.display(), rows = self.records.len(), "metrics exported");
        Ok(csv_path)
    }

    pub fn summary(&self) -> SessionSummary {
        let total_frames = self.records.len();
        let detected = self.records.iter().filter(|r| r.snapshot.pose_detected).count();
        let detection_rate_percent = if total_frames == 0 {
            0.0
        } else {
            detected as f64 / total_frames as f64 * 100.0
        };

        let peak_speed_kilometers_per_hour = self
            .records
            .iter()
            .map(|r| r.snapshot.speed_kilometers_per_hour)
            .fold(0.0, f64::max);

        let moving: Vec<f64> = self
            .records
            .iter()
            .map(|r| r.snapshot.cadence_steps_per_minute)
            .filter(|c| *c > 0.0)
            .collect();
        let average_cadence_steps_per_minute = if moving.is_empty() {
            0.0
        } else {
            moving.iter().sum::<f64>() / moving.len() as f64
        };

        let duration_seconds = match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).max(0.0),
            _ => 0.0,
        };

        SessionSummary {
            total_frames,
            detection_rate_percent,
            steps: self.records.last().map_or(0, |r| r.snapshot.steps),
            peak_speed_kilometers_per_hour,
            average_cadence_steps_per_minute,
            calories: self.records.last().map_or(0.0, |r| r.calories),
            duration_seconds,
        }
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&report_path, self.create_html_report())?;
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let summary = self.summary();
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S");

        format!(r#"
<!DOCTYPE html>
<html>
<head>
    <title>Running Report - {name}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Running Session Report</h1>
    <div class="stats">
        <h2>Session: {name}</h2>
        <p>Generated {generated}</p>
        <div class="stat-item">
            <span class="stat-label">Duration:</span>
            <span class="stat-value">{duration:.1} s</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Total Frames:</span>
            <span class="stat-value">{frames}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Pose Detection Rate:</span>
            <span class="stat-value">{detection:.1}%</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Steps:</span>
            <span class="stat-value">{steps}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Average Cadence:</span>
            <span class="stat-value">{cadence:.0} spm</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Peak Speed:</span>
            <span class="stat-value">{peak:.1} km/h</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Calories:</span>
            <span class="stat-value">{calories:.1} kcal</span>
        </div>
    </div>
</body>
</html>
        "#,
            name = self.session_name,
            generated = generated,
            duration = summary.duration_seconds,
            frames = summary.total_frames,
            detection = summary.detection_rate_percent,
            steps = summary.steps,
            cadence = summary.average_cadence_steps_per_minute,
            peak = summary.peak_speed_kilometers_per_hour,
            calories = summary.calories,
        )
    }
}
