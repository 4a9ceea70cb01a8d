// src/running/mod.rs
pub mod cadence;
pub mod calories;
pub mod metrics;
pub mod step_detector;

pub use cadence::{CadenceConfig, CadenceModel};
pub use calories::{CaloriesConfig, CaloriesEstimator};
pub use metrics::{MetricsConfig, RunningMetrics, RunningMetricsSnapshot};
pub use step_detector::{ArmPhase, RunningStepDetector, StepDetectorConfig, StepEvent};
