//! Configuration for Dice scoring and validation passes.

use burn::prelude::*;

use crate::error::{EvalError, EvalResult};

/// How per-element sums are grouped before the Dice ratio is taken.
#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Sum over the batch and spatial extent jointly, then divide once.
    BatchJoint,
    /// Score every trailing `[H, W]` plane on its own, then average the scores.
    PerImage,
}

/// Which sums form the Dice denominator.
#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum Denominator {
    /// `ΣA + ΣB`.
    Linear,
    /// `ΣA² + ΣB²`.
    Squared,
}

/// Dice coefficient settings.
#[derive(Config, Debug)]
pub struct DiceConfig {
    /// Smoothing term added to numerator and denominator.
    #[config(default = 1e-6)]
    pub epsilon: f64,
    #[config(default = "Reduction::BatchJoint")]
    pub reduction: Reduction,
    #[config(default = "Denominator::Linear")]
    pub denominator: Denominator,
}

impl DiceConfig {
    /// Rejects settings that would make the ratio undefined.
    pub fn validate(&self) -> EvalResult<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(EvalError::InvalidConfiguration {
                reason: format!("epsilon must be finite and positive, got {}", self.epsilon),
            });
        }
        Ok(())
    }
}

/// Settings for one validation pass.
#[derive(Config, Debug)]
pub struct EvaluationConfig {
    /// Reduced-precision request.
    ///
    /// Burn fixes float precision through the backend type, so the pass itself only
    /// records this flag; callers pick a half-precision backend when it is set.
    #[config(default = false)]
    pub amp: bool,
    #[config(default = "DiceConfig::new()")]
    pub dice: DiceConfig,
    /// Emit an info-level progress line every `log_every` batches. Zero disables it.
    #[config(default = 0)]
    pub log_every: usize,
    /// Batches the source must deliver; a shorter pass fails. When unset, an
    /// exact iterator size hint is used instead.
    pub expected_batches: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvaluationConfig::new();

        assert!(!config.amp);
        assert_eq!(config.log_every, 0);
        assert_eq!(config.expected_batches, None);
        assert!((config.dice.epsilon - 1e-6).abs() < 1e-12);
        assert_eq!(config.dice.reduction, Reduction::BatchJoint);
        assert_eq!(config.dice.denominator, Denominator::Linear);
        assert!(config.dice.validate().is_ok());
    }

    #[test]
    fn test_invalid_epsilon() {
        for epsilon in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = DiceConfig::new().with_epsilon(epsilon);
            match config.validate() {
                Err(EvalError::InvalidConfiguration { reason }) => {
                    assert!(reason.contains("epsilon"));
                }
                _ => panic!("Expected InvalidConfiguration error for {epsilon}"),
            }
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = EvaluationConfig::new()
            .with_amp(true)
            .with_dice(DiceConfig::new().with_reduction(Reduction::PerImage));

        let json = config.to_string();
        let restored = EvaluationConfig::load_binary(json.as_bytes()).unwrap();

        assert!(restored.amp);
        assert_eq!(restored.dice.reduction, Reduction::PerImage);
    }
}
