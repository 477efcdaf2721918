//! Scene abstraction the emulator draws into

use cncemu_core::{EmulatorError, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Target of a traced program.
///
/// A scene owns at most one toolpath polyline and a marker object standing
/// in for the tool. Locations are in scene units with the emulator offset
/// already applied.
pub trait Scene {
    /// Create the polyline if it does not exist yet
    fn ensure_polyline(&mut self) -> Result<()>;

    fn append_polyline_point(&mut self, point: DVec3) -> Result<()>;

    fn delete_polyline(&mut self);

    fn marker_location(&self) -> DVec3;

    /// Place the marker, recording a keyframe at `time` seconds
    fn move_marker(&mut self, location: DVec3, time: f64) -> Result<()>;
}

/// Marker location at a point of the job timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub location: DVec3,
}

const DEFAULT_MARKER_NAME: &str = "Tool";

/// In-memory scene that records everything drawn into it
#[derive(Debug, Clone)]
pub struct SceneRecorder {
    polyline: Option<Vec<DVec3>>,
    marker_name: String,
    marker: DVec3,
    keyframes: Vec<Keyframe>,
}

impl Default for SceneRecorder {
    fn default() -> Self {
        Self::named(DEFAULT_MARKER_NAME)
    }
}

impl SceneRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose marker object is called `marker_name`
    pub fn named(marker_name: impl Into<String>) -> Self {
        Self {
            polyline: None,
            marker_name: marker_name.into(),
            marker: DVec3::ZERO,
            keyframes: Vec::new(),
        }
    }

    pub fn marker_name(&self) -> &str {
        &self.marker_name
    }

    /// Recorder whose marker starts at `location`
    pub fn with_marker(location: DVec3) -> Self {
        Self {
            marker: location,
            ..Self::default()
        }
    }

    pub fn has_polyline(&self) -> bool {
        self.polyline.is_some()
    }

    pub fn polyline(&self) -> &[DVec3] {
        self.polyline.as_deref().unwrap_or(&[])
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Place the marker without recording a keyframe, as a user dragging it would
    pub fn set_marker(&mut self, location: DVec3) {
        self.marker = location;
    }

    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }
}

impl Scene for SceneRecorder {
    fn ensure_polyline(&mut self) -> Result<()> {
        self.polyline.get_or_insert_with(Vec::new);
        Ok(())
    }

    fn append_polyline_point(&mut self, point: DVec3) -> Result<()> {
        let polyline = self.polyline.as_mut().ok_or_else(|| EmulatorError::Scene {
            reason: "no polyline to append to".to_string(),
        })?;
        polyline.push(point);
        Ok(())
    }

    fn delete_polyline(&mut self) {
        self.polyline = None;
    }

    fn marker_location(&self) -> DVec3 {
        self.marker
    }

    fn move_marker(&mut self, location: DVec3, time: f64) -> Result<()> {
        if !time.is_finite() {
            return Err(EmulatorError::Scene {
                reason: format!("keyframe time {} is not finite", time),
            }
            .into());
        }
        self.marker = location;
        self.keyframes.push(Keyframe { time, location });
        Ok(())
    }
}
