//! Surface configuration.
//!
//! Per-renderer settings: indicator geometry, palette, frame pacing, and
//! the initial capture-on-press policy. A config is plain data handed to
//! `PointerRenderer` at construction; JSON round-tripping is provided for
//! hosts that persist user preferences.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scene::{Palette, INDICATOR_SIDE};

/// How the render loop paces frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PacingMode {
    /// Block on the swap chain's frame-latency waitable before each frame.
    /// Bounds queued-frame depth and input-to-photon latency.
    LowLatency,
    /// Sleep a fixed ~16ms tick between frames (approximates 60Hz).
    FixedTick,
}

/// Per-renderer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceConfig {
    /// Side length of each contact indicator square, in logical units.
    pub indicator_side: f64,

    /// Background/hover/pressed colors.
    pub palette: Palette,

    /// Preferred frame pacing. The chain falls back to `FixedTick` when
    /// the swap chain cannot provide a latency waitable.
    pub pacing: PacingMode,

    /// Initial value of the capture-on-press attribute.
    pub capture_on_press: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            indicator_side: INDICATOR_SIDE,
            palette: Palette::default(),
            pacing: PacingMode::LowLatency,
            capture_on_press: false,
        }
    }
}

impl SurfaceConfig {
    /// Load a config from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to open config file: {e}"))?;
        serde_json::from_reader(file).map_err(|e| format!("Failed to parse config: {e}"))
    }

    /// Save a config to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write config file: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Color;

    #[test]
    fn test_default_config() {
        let config = SurfaceConfig::default();
        assert_eq!(config.indicator_side, 40.0);
        assert_eq!(config.pacing, PacingMode::LowLatency);
        assert!(!config.capture_on_press);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = SurfaceConfig {
            indicator_side: 24.0,
            palette: Palette {
                background: Color::opaque(0.1, 0.1, 0.1),
                hover: Color::BLUE,
                pressed: Color::RED,
            },
            pacing: PacingMode::FixedTick,
            capture_on_press: true,
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: SurfaceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_field_names_are_camel_case() {
        let json = serde_json::to_string(&SurfaceConfig::default()).unwrap();
        assert!(json.contains("indicatorSide"));
        assert!(json.contains("captureOnPress"));
        assert!(json.contains("lowLatency"));
    }
}
