//! Dice coefficient and Dice loss.
//!
//! The coefficient between a soft prediction `A` and a binary target `B` is
//!
//! ```text
//! dice = (2 · Σ(A·B) + ε) / (ΣA + ΣB + ε)
//! ```
//!
//! with `ΣA² + ΣB²` in the denominator under [`Denominator::Squared`]. Which
//! elements share a sum is controlled by [`Reduction`]: `BatchJoint` folds the
//! whole batch into one ratio, `PerImage` takes one ratio per `[H, W]` plane
//! and averages them. The two differ whenever the planes carry unequal
//! foreground mass, so the choice is part of the metric definition.

use burn::{prelude::*, tensor::ElementConversion};

use crate::{
    config::{DiceConfig, Denominator, Reduction},
    error::{EvalError, EvalResult},
};

/// Row-wise Dice over a `[rows, elements]` pair, kept on the autodiff graph.
pub fn dice_per_row<B: Backend>(
    input: Tensor<B, 2>,
    target: Tensor<B, 2>,
    epsilon: f64,
    denominator: Denominator,
) -> Tensor<B, 1> {
    let [rows, _] = input.dims();

    let intersection = (input.clone() * target.clone()).sum_dim(1);
    let sets_sum = match denominator {
        Denominator::Linear => input.sum_dim(1) + target.sum_dim(1),
        Denominator::Squared => {
            (input.clone() * input).sum_dim(1) + (target.clone() * target).sum_dim(1)
        }
    };

    let dice = intersection.mul_scalar(2.0).add_scalar(epsilon) / sets_sum.add_scalar(epsilon);
    dice.reshape([rows])
}

/// Dice coefficient between two same-shaped tensors of any rank.
///
/// For rank-1 tensors `PerImage` has no planes to split and behaves like
/// `BatchJoint`.
pub fn dice_coeff<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    target: Tensor<B, D>,
    config: &DiceConfig,
) -> EvalResult<f64> {
    config.validate()?;
    ensure_same_shape(&input, &target)?;

    let dims = input.dims();
    let rows = match config.reduction {
        Reduction::BatchJoint => 1,
        Reduction::PerImage => plane_count(&dims),
    };
    let elements = dims.iter().product::<usize>() / rows;

    let dice = dice_per_row(
        input.reshape([rows, elements]),
        target.reshape([rows, elements]),
        config.epsilon,
        config.denominator,
    );

    Ok(dice.mean().into_scalar().elem::<f64>())
}

/// Mean Dice coefficient over the channels of two `[N, C, H, W]` tensors.
///
/// Under `BatchJoint` each channel is one ratio with its sums taken across the
/// whole batch; under `PerImage` every `(sample, channel)` plane is its own ratio.
/// Callers drop channels they do not want scored (e.g. background) beforehand.
pub fn multiclass_dice_coeff<B: Backend>(
    input: Tensor<B, 4>,
    target: Tensor<B, 4>,
    config: &DiceConfig,
) -> EvalResult<f64> {
    config.validate()?;
    ensure_same_shape(&input, &target)?;

    let [n, c, h, w] = input.dims();
    if c == 0 {
        return Err(EvalError::EmptyChannelRange { channels: c });
    }

    let (input, target) = match config.reduction {
        Reduction::BatchJoint => (
            input.swap_dims(0, 1).reshape([c, n * h * w]),
            target.swap_dims(0, 1).reshape([c, n * h * w]),
        ),
        Reduction::PerImage => (
            input.reshape([n * c, h * w]),
            target.reshape([n * c, h * w]),
        ),
    };

    let dice = dice_per_row(input, target, config.epsilon, config.denominator);
    Ok(dice.mean().into_scalar().elem::<f64>())
}

/// `1 - dice` over the whole tensor, as a differentiable training objective.
///
/// For multiclass use pass softmax probabilities and a one-hot target; every
/// channel then contributes to one joint ratio.
pub fn dice_loss<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    target: Tensor<B, D>,
    epsilon: f64,
    denominator: Denominator,
) -> Tensor<B, 1> {
    let elements = input.dims().iter().product::<usize>();
    let dice = dice_per_row(
        input.reshape([1, elements]),
        target.reshape([1, elements]),
        epsilon,
        denominator,
    );

    dice.neg().add_scalar(1.0)
}

fn plane_count<const D: usize>(dims: &[usize; D]) -> usize {
    dims[..D.saturating_sub(2)].iter().product()
}

fn ensure_same_shape<B: Backend, const D: usize>(
    input: &Tensor<B, D>,
    target: &Tensor<B, D>,
) -> EvalResult<()> {
    let (prediction, truth) = (input.dims(), target.dims());
    if prediction != truth {
        return Err(EvalError::ShapeMismatch {
            prediction: prediction.to_vec(),
            target: truth.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn mask(values: [[f32; 4]; 2]) -> Tensor<TestBackend, 4> {
        let device = Default::default();
        Tensor::<TestBackend, 2>::from_floats(values, &device).reshape([2, 1, 2, 2])
    }

    #[test]
    fn test_dice_perfect_overlap() {
        let a = mask([[1.0, 0.0, 1.0, 0.0], [0.0, 1.0, 1.0, 1.0]]);

        let dice = dice_coeff(a.clone(), a, &DiceConfig::new()).unwrap();

        assert!((dice - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dice_no_overlap() {
        let a = mask([[1.0, 0.0, 1.0, 0.0], [1.0, 0.0, 1.0, 0.0]]);
        let b = mask([[0.0, 1.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]]);

        let dice = dice_coeff(a, b, &DiceConfig::new()).unwrap();

        assert!(dice < 1e-6);
    }

    #[test]
    fn test_dice_partial_overlap() {
        let a = mask([[1.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]]);
        let b = mask([[1.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0]]);

        let dice = dice_coeff(a, b, &DiceConfig::new()).unwrap();

        // intersection = 1, sums = 2 + 2, dice = 2 * 1 / 4
        assert!((dice - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_dice_empty_masks() {
        let a = mask([[0.0; 4]; 2]);

        let dice = dice_coeff(a.clone(), a, &DiceConfig::new()).unwrap();

        assert!((dice - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_batch_joint_differs_from_per_image() {
        // Sample 0 is a perfect match, sample 1 predicts one pixel of an empty target.
        let pred = mask([[1.0, 1.0, 1.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
        let truth = mask([[1.0, 1.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0]]);

        let joint = dice_coeff(pred.clone(), truth.clone(), &DiceConfig::new()).unwrap();
        let per_image = dice_coeff(
            pred,
            truth,
            &DiceConfig::new().with_reduction(Reduction::PerImage),
        )
        .unwrap();

        // joint: 2 * 3 / (4 + 3) ; per image: (1 + 0) / 2
        assert!((joint - 6.0 / 7.0).abs() < 1e-5);
        assert!((per_image - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_squared_denominator() {
        let device = Default::default();
        let pred = Tensor::<TestBackend, 1>::from_floats([0.5, 0.5], &device);
        let truth = Tensor::<TestBackend, 1>::from_floats([1.0, 0.0], &device);

        let linear = dice_coeff(pred.clone(), truth.clone(), &DiceConfig::new()).unwrap();
        let squared = dice_coeff(
            pred,
            truth,
            &DiceConfig::new().with_denominator(Denominator::Squared),
        )
        .unwrap();

        // linear: 1 / 2 ; squared: 1 / (0.5 + 1)
        assert!((linear - 0.5).abs() < 1e-5);
        assert!((squared - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_shape_mismatch() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 4>::zeros([1, 1, 2, 2], &device);
        let b = Tensor::<TestBackend, 4>::zeros([1, 2, 2, 2], &device);

        match dice_coeff(a, b, &DiceConfig::new()) {
            Err(EvalError::ShapeMismatch { prediction, target }) => {
                assert_eq!(prediction, vec![1, 1, 2, 2]);
                assert_eq!(target, vec![1, 2, 2, 2]);
            }
            _ => panic!("Expected ShapeMismatch error"),
        }
    }

    #[test]
    fn test_multiclass_averages_channels() {
        let device = Default::default();
        // Channel 0 matches perfectly, channel 1 does not overlap at all.
        let pred = Tensor::<TestBackend, 4>::from_floats(
            [[[[1.0, 0.0]], [[1.0, 0.0]]]],
            &device,
        );
        let truth = Tensor::<TestBackend, 4>::from_floats(
            [[[[1.0, 0.0]], [[0.0, 1.0]]]],
            &device,
        );

        let dice = multiclass_dice_coeff(pred, truth, &DiceConfig::new()).unwrap();

        assert!((dice - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_multiclass_batch_joint_pools_samples() {
        let device = Default::default();
        // One channel, two samples: the first is all hits, the second a single miss.
        let pred = Tensor::<TestBackend, 4>::from_floats(
            [[[[1.0, 1.0, 1.0]]], [[[0.0, 0.0, 0.0]]]],
            &device,
        );
        let truth = Tensor::<TestBackend, 4>::from_floats(
            [[[[1.0, 1.0, 1.0]]], [[[1.0, 0.0, 0.0]]]],
            &device,
        );

        let joint = multiclass_dice_coeff(pred.clone(), truth.clone(), &DiceConfig::new()).unwrap();
        let per_image = multiclass_dice_coeff(
            pred,
            truth,
            &DiceConfig::new().with_reduction(Reduction::PerImage),
        )
        .unwrap();

        assert!((joint - 6.0 / 7.0).abs() < 1e-5);
        assert!((per_image - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_dice_loss() {
        let a = mask([[1.0, 0.0, 1.0, 0.0], [0.0, 1.0, 1.0, 1.0]]);
        let b = mask([[0.0, 1.0, 0.0, 1.0], [1.0, 0.0, 0.0, 0.0]]);

        let perfect = dice_loss(a.clone(), a.clone(), 1e-6, Denominator::Linear)
            .into_scalar()
            .elem::<f64>();
        let disjoint = dice_loss(a, b, 1e-6, Denominator::Linear)
            .into_scalar()
            .elem::<f64>();

        assert!(perfect.abs() < 1e-6);
        assert!((disjoint - 1.0).abs() < 1e-6);
    }
}
