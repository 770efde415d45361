//! Recognition Configuration
//!
//! Tunable thresholds and window sizes, stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full recognition configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Per-frame detection and cleanup settings
    pub detection: DetectionSettings,
    /// Cross-frame consensus settings
    pub consensus: ConsensusSettings,
}

/// Per-frame detection and cleanup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Minimum class score for a candidate box (0.3 - 0.7)
    pub confidence_threshold: f32,
    /// Confidence above which a box survives the spacing check (0.75 - 0.95)
    pub high_confidence_threshold: f32,
    /// IoU at or above which NMS drops the lower-confidence box
    pub iou_threshold: f32,
    /// Vertical deviation allowed from the row center, in mean heights
    pub y_tolerance: f32,
    /// Horizontal gap allowed from the left neighbor, in median gaps
    pub x_tolerance: f32,
    /// Short stabilizer window size, in frames
    pub history_frames: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            high_confidence_threshold: 0.95,
            iou_threshold: 0.5,
            y_tolerance: 0.5,
            x_tolerance: 2.0,
            history_frames: 5,
        }
    }
}

/// Cross-frame consensus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusSettings {
    /// Session buffer capacity, in frames
    pub window_frames: usize,
    /// Minimum buffered frames before consensus is attempted
    pub min_frames: usize,
    /// Share of the buffer the winning reading must reach (0.0 - 1.0)
    pub stability_threshold: f32,
    /// Consecutive empty frames before the buffer resets
    pub no_detection_reset: usize,
    /// Expected digit count; a display hint, not a constraint
    pub expected_digits: usize,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            window_frames: 30,
            min_frames: 20,
            stability_threshold: 0.7,
            no_detection_reset: 20,
            expected_digits: 4,
        }
    }
}

impl RecognitionConfig {
    /// Clamp thresholds into their supported ranges.
    pub fn validated(mut self) -> Self {
        self.detection.confidence_threshold = self.detection.confidence_threshold.clamp(0.3, 0.7);
        self.detection.high_confidence_threshold =
            self.detection.high_confidence_threshold.clamp(0.75, 0.95);
        self.consensus.stability_threshold = self.consensus.stability_threshold.clamp(0.0, 1.0);
        self.consensus.min_frames = self.consensus.min_frames.min(self.consensus.window_frames);
        self
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<RecognitionConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: RecognitionConfig = toml::from_str(&content)?;
    Ok(config.validated())
}

/// Save configuration to file
pub fn save_config(config: &RecognitionConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RecognitionConfig::default();

        assert!((config.detection.confidence_threshold - 0.5).abs() < 1e-6);
        assert!((config.detection.high_confidence_threshold - 0.95).abs() < 1e-6);
        assert!((config.detection.iou_threshold - 0.5).abs() < 1e-6);
        assert!((config.detection.y_tolerance - 0.5).abs() < 1e-6);
        assert!((config.detection.x_tolerance - 2.0).abs() < 1e-6);
        assert_eq!(config.detection.history_frames, 5);

        assert_eq!(config.consensus.window_frames, 30);
        assert_eq!(config.consensus.min_frames, 20);
        assert!((config.consensus.stability_threshold - 0.7).abs() < 1e-6);
        assert_eq!(config.consensus.no_detection_reset, 20);
        assert_eq!(config.consensus.expected_digits, 4);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = RecognitionConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: RecognitionConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.detection.confidence_threshold,
            parsed.detection.confidence_threshold
        );
        assert_eq!(config.consensus.window_frames, parsed.consensus.window_frames);
        assert_eq!(config.consensus.expected_digits, parsed.consensus.expected_digits);
    }

    #[test]
    fn test_validated_clamps_thresholds() {
        let mut config = RecognitionConfig::default();
        config.detection.confidence_threshold = 0.95;
        config.detection.high_confidence_threshold = 0.2;
        config.consensus.min_frames = 50;

        let validated = config.validated();
        assert!((validated.detection.confidence_threshold - 0.7).abs() < 1e-6);
        assert!((validated.detection.high_confidence_threshold - 0.75).abs() < 1e-6);
        assert_eq!(validated.consensus.min_frames, 30);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = RecognitionConfig::default();
        config.consensus.window_frames = 40;
        config.consensus.min_frames = 25;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();

        let loaded = load_config(temp_file.path()).unwrap();
        assert_eq!(loaded.consensus.window_frames, 40);
        assert_eq!(loaded.consensus.min_frames, 25);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
