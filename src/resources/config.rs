//! Runtime tuning for navigation, locomotion and presentation.
//!
//! Loaded once at startup from an optional JSON file; every field falls back
//! to its default when missing.

use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

use crate::resources::navmesh::LocateTolerance;

/// Name of the zone the demo level registers and the agent queries.
pub const DEFAULT_ZONE: &str = "ground";

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub zone_name: String,
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Turn rate as a multiple of `speed`, in radians per second.
    pub rotation_multiplier: f32,
    /// Distance at which an NPC counts as reached.
    pub arrival_radius: f32,
    /// Waypoints closer than this are treated as reached.
    pub waypoint_epsilon: f32,
    /// Crossfade duration between idle and run clips, in seconds.
    pub animation_blend_secs: f32,
    pub camera_offset: [f32; 3],
    pub tolerance: LocateTolerance,
    pub character_model: String,
    pub idle_animation: usize,
    pub run_animation: usize,
    pub show_navmesh: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            zone_name: DEFAULT_ZONE.to_string(),
            speed: 5.0,
            rotation_multiplier: 1.5,
            arrival_radius: 1.0,
            waypoint_epsilon: 1e-4,
            animation_blend_secs: 0.2,
            camera_offset: [5.0, 5.0, 5.0],
            tolerance: LocateTolerance::default(),
            character_model: "models/ybot.glb".to_string(),
            idle_animation: 0,
            run_animation: 1,
            show_navmesh: false,
        }
    }
}

impl NavigationConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads the config file at `path`, or returns the defaults if it is
    /// missing or malformed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!("Loaded navigation config from {:?}", path);
                    config
                }
                Err(e) => {
                    error!("Failed to parse navigation config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read navigation config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn camera_offset(&self) -> Vec3 {
        Vec3::from_array(self.camera_offset)
    }

    pub fn animation_blend(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(self.animation_blend_secs.max(0.0))
    }
}

/// Whether the navmesh wireframe overlay is drawn.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavmeshOverlay {
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NavigationConfig::from_json(r#"{ "speed": 8.0, "tolerance": { "vertical": 2.5 } }"#)
            .unwrap();
        assert_eq!(config.speed, 8.0);
        assert_eq!(config.rotation_multiplier, 1.5);
        assert_eq!(config.tolerance.vertical, 2.5);
        assert_eq!(config.tolerance.horizontal, LocateTolerance::default().horizontal);
        assert_eq!(config.zone_name, DEFAULT_ZONE);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(NavigationConfig::from_json("{ speed: }").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = NavigationConfig::load(Path::new("does/not/exist.json"));
        assert_eq!(config, NavigationConfig::default());
    }

    #[test]
    fn test_helpers() {
        let config = NavigationConfig::default();
        assert_eq!(config.camera_offset(), Vec3::splat(5.0));
        assert_eq!(config.animation_blend().as_millis(), 200);
    }
}
