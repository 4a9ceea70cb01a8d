// src/config.rs - Application configuration loaded from JSON
use crate::error::{Error, Result};
use crate::running::{CaloriesConfig, MetricsConfig, StepDetectorConfig};
use crate::scene::{SceneTuning, TerrainConfig};
use crate::stabilizer::StabilizerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub user_weight_kg: f64,
    pub pose_stabilization_enabled: bool,
    pub show_pose_overlay: bool,
    pub mirror_pose_overlay: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            user_weight_kg: 60.0,
            pose_stabilization_enabled: true,
            show_pose_overlay: false,
            mirror_pose_overlay: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Rate poses are pulled from the detector.
    pub pose_hz: f64,
    pub render_hz: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            pose_hz: 20.0,
            render_hz: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_directory: PathBuf,
    pub auto_save: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("VibeRunner")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: RunnerSettings,
    pub stabilizer: StabilizerConfig,
    pub metrics: MetricsConfig,
    pub step_detector: StepDetectorConfig,
    pub calories: CaloriesConfig,
    pub terrain: TerrainConfig,
    pub scene: SceneTuning,
    pub ticks: TickConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to defaults when the file is missing or unusable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Rejects values that would stall the pipeline. Soft ranges such as inverted
    /// blender speeds are clamped where they are used instead.
    pub fn validate(&self) -> Result<()> {
        if !(self.settings.user_weight_kg.is_finite() && self.settings.user_weight_kg >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "user_weight_kg must be a non-negative number, got {}",
                self.settings.user_weight_kg
            )));
        }
        if self.terrain.active_segments == 0 {
            return Err(Error::InvalidConfig("terrain.active_segments must be at least 1".into()));
        }
        if !(self.terrain.segment_length.is_finite() && self.terrain.segment_length > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "terrain.segment_length must be positive, got {}",
                self.terrain.segment_length
            )));
        }
        for (name, hz) in [("pose_hz", self.ticks.pose_hz), ("render_hz", self.ticks.render_hz)] {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(Error::InvalidConfig(format!("ticks.{name} must be positive, got {hz}")));
            }
        }
        if self.stabilizer.off_confidence_threshold > self.stabilizer.on_confidence_threshold {
            warn!(
                on = self.stabilizer.on_confidence_threshold,
                off = self.stabilizer.off_confidence_threshold,
                "stabilizer off-threshold above on-threshold; joints may flicker"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_json(
            r#"{
                "settings": { "user_weight_kg": 72.5 },
                "metrics": { "cadence": { "timeout_to_zero": 2.0 } },
                "scene": { "camera": { "height_y": 3.0 } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.settings.user_weight_kg, 72.5);
        assert!(config.settings.pose_stabilization_enabled);
        assert_eq!(config.metrics.cadence.timeout_to_zero, 2.0);
        assert_eq!(config.metrics.cadence.min_step_interval, 0.15);
        assert_eq!(config.scene.camera.height_y, 3.0);
        assert_eq!(config.scene.camera.field_of_view_degrees, 70.0);
    }

    #[test]
    fn test_rejects_bad_terrain() {
        let err = AppConfig::from_json(r#"{ "terrain": { "active_segments": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = AppConfig::from_json(r#"{ "settings": { "user_weight_kg": -1 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.terrain.active_segments = 6;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AppConfig::load_or_default(Some(Path::new("/definitely/not/here.json")));
        assert_eq!(config, AppConfig::default());
    }
}
