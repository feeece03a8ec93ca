//! Configuration for the evaluation demo.
//!
//! Loaded from JSON; any field may be omitted and falls back to its default.

use std::path::PathBuf;

use dice_eval_burn::EvaluationConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateConfig {
    /// Dataset root holding `imgs/` and `masks/`. Ignored for synthetic runs.
    pub data_dir: Option<PathBuf>,
    /// Suffix appended to an image stem to find its mask.
    pub mask_suffix: String,
    /// Downscaling factor applied to images and masks.
    pub scale: f32,
    /// Channels of the input images.
    pub in_channels: usize,
    /// Model output classes; `1` for binary masks.
    pub n_classes: usize,
    /// Trained weights. A freshly initialised model is scored when absent.
    pub weights: Option<PathBuf>,
    pub batch_size: usize,
    /// Number of workers for data loading.
    pub num_workers: usize,
    /// Generated data used instead of a dataset folder.
    pub synthetic: Option<SyntheticConfig>,
    pub evaluation: EvaluationConfig,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("data/val")),
            mask_suffix: "_mask".to_string(),
            scale: 0.5,
            in_channels: 3,
            n_classes: 2,
            weights: None,
            batch_size: 1,
            num_workers: 0,
            synthetic: None,
            evaluation: EvaluationConfig::new(),
        }
    }
}

/// Random images with uniformly drawn labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub samples: usize,
    pub height: usize,
    pub width: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            samples: 8,
            height: 32,
            width: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EvaluateConfig =
            serde_json::from_str(r#"{ "n_classes": 1, "batch_size": 4 }"#).unwrap();

        assert_eq!(config.n_classes, 1);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.mask_suffix, "_mask");
        assert!(!config.evaluation.amp);
        assert!(config.synthetic.is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = EvaluateConfig::default();
        config.synthetic = Some(SyntheticConfig::default());
        config.evaluation = EvaluationConfig::new().with_amp(true);

        let json = serde_json::to_string(&config).unwrap();
        let restored: EvaluateConfig = serde_json::from_str(&json).unwrap();

        assert!(restored.evaluation.amp);
        assert_eq!(restored.synthetic.map(|s| s.samples), Some(8));
    }
}
