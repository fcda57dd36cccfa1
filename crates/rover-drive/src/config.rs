//! Drive and object-interaction configuration, loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, MotionProfile, PoseTolerance};

/// Defaults for the drive actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    #[serde(default = "default_distance_tolerance_mm")]
    pub distance_tolerance_x_mm: f32,

    #[serde(default = "default_distance_tolerance_mm")]
    pub distance_tolerance_y_mm: f32,

    #[serde(default = "default_angle_tolerance_deg")]
    pub angle_tolerance_deg: f32,

    /// Time allowed for the first path to be computed.
    #[serde(default = "default_max_planning_seconds")]
    pub max_planning_seconds: f64,

    /// Time allowed for a replan while already driving.
    #[serde(default = "default_max_replanning_seconds")]
    pub max_replanning_seconds: f64,

    /// Half-width of the window around a requested approach angle, in radians.
    #[serde(default = "default_approach_angle_window")]
    pub approach_angle_window_rad: f32,

    #[serde(default = "default_verify_timeout_seconds")]
    pub verify_timeout_seconds: f64,

    pub motion_profile: MotionProfile,

    pub sounds: DriveSounds,

    pub search: SearchConfig,
}

fn default_distance_tolerance_mm() -> f32 {
    10.0
}
fn default_angle_tolerance_deg() -> f32 {
    5.0
}
fn default_max_planning_seconds() -> f64 {
    5.0
}
fn default_max_replanning_seconds() -> f64 {
    10.0
}
fn default_approach_angle_window() -> f32 {
    core::f32::consts::FRAC_PI_2
}
fn default_verify_timeout_seconds() -> f64 {
    2.0
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            distance_tolerance_x_mm: default_distance_tolerance_mm(),
            distance_tolerance_y_mm: default_distance_tolerance_mm(),
            angle_tolerance_deg: default_angle_tolerance_deg(),
            max_planning_seconds: default_max_planning_seconds(),
            max_replanning_seconds: default_max_replanning_seconds(),
            approach_angle_window_rad: default_approach_angle_window(),
            verify_timeout_seconds: default_verify_timeout_seconds(),
            motion_profile: MotionProfile::default(),
            sounds: DriveSounds::default(),
            search: SearchConfig::default(),
        }
    }
}

impl DriveConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn tolerance(&self) -> PoseTolerance {
        PoseTolerance::new(
            self.distance_tolerance_x_mm,
            self.distance_tolerance_y_mm,
            self.angle_tolerance_deg.to_radians(),
        )
    }
}

/// Sounds played alongside a drive. `None` plays nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSounds {
    pub start: Option<String>,
    pub driving: Option<String>,
    pub stop: Option<String>,
    #[serde(default = "default_driving_spacing_min")]
    pub driving_spacing_min_seconds: f64,
    #[serde(default = "default_driving_spacing_max")]
    pub driving_spacing_max_seconds: f64,
}

fn default_driving_spacing_min() -> f64 {
    0.5
}
fn default_driving_spacing_max() -> f64 {
    1.5
}

impl Default for DriveSounds {
    fn default() -> Self {
        Self {
            start: None,
            driving: None,
            stop: None,
            driving_spacing_min_seconds: default_driving_spacing_min(),
            driving_spacing_max_seconds: default_driving_spacing_max(),
        }
    }
}

impl DriveSounds {
    pub fn is_silent(&self) -> bool {
        self.start.is_none() && self.driving.is_none() && self.stop.is_none()
    }
}

/// How the robot looks around for an object it lost track of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPattern {
    /// A couple of small turns either side of the current heading.
    Nearby,
    /// A full turn in fixed steps.
    Sweep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Time spent looking at each heading.
    pub dwell_seconds: f64,
    /// Offsets from the starting heading for [`SearchPattern::Nearby`], in degrees.
    pub nearby_offsets_deg: Vec<f32>,
    pub sweep_step_deg: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dwell_seconds: 0.5,
            nearby_offsets_deg: vec![-30.0, 30.0, 0.0],
            sweep_step_deg: 60.0,
        }
    }
}

impl SearchConfig {
    /// Headings to visit, relative to where the search starts, in radians.
    pub fn offsets(&self, pattern: SearchPattern) -> Vec<f32> {
        match pattern {
            SearchPattern::Nearby => self
                .nearby_offsets_deg
                .iter()
                .map(|deg| deg.to_radians())
                .collect(),
            SearchPattern::Sweep => {
                let step = self.sweep_step_deg.abs().max(1.0);
                let count = (360.0 / step).ceil() as usize;
                (1..=count)
                    .map(|i| (i as f32 * step).min(360.0).to_radians())
                    .collect()
            }
        }
    }
}

/// Settings for [`crate::InteractWithObjectBehavior`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractConfig {
    /// Immediate retries allowed for transient motion failures.
    pub max_transient_retries: u32,
    /// Search stages tried in order after the object could not be verified.
    pub search_stages: Vec<SearchPattern>,
    /// Forget the object once every search stage came up empty.
    pub forget_object_when_search_fails: bool,
    pub success_animation: Option<String>,
}

impl Default for InteractConfig {
    fn default() -> Self {
        Self {
            max_transient_retries: 2,
            search_stages: vec![SearchPattern::Nearby, SearchPattern::Sweep],
            forget_object_when_search_fails: true,
            success_animation: None,
        }
    }
}

impl InteractConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
