//! Dice validation pass over a set of batches.
//!
//! The pass puts the model in eval mode, scores every batch with the strategy
//! selected from the model's class count, and returns the mean batch score.
//!
//! Gradient bookkeeping in Burn is a backend property: pass a model on a plain
//! backend, e.g. `AutodiffModule::valid()` of the training model, to get
//! inference-only computation.

use burn::{prelude::*, tensor::activation::sigmoid};
use burn_extra_ops::{LabelExtraOps, Slice, TensorExtraOps};

use crate::{
    config::{DiceConfig, EvaluationConfig},
    dataset::SegmentationBatch,
    dice::{dice_coeff, multiclass_dice_coeff},
    error::{EvalError, EvalResult},
    mask::MaskTensor,
    model::{EvalModeGuard, SegmentationModel},
};

/// How logits and ground truth are compared, fixed once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalStrategy {
    /// Single-channel logits against a 0/1 mask, scored after a sigmoid.
    Binary,
    /// Arg-max class map against class indices, background channel excluded.
    Multiclass { n_classes: usize },
}

impl EvalStrategy {
    /// Picks the strategy for a model predicting `n_classes` channels.
    pub fn for_classes(n_classes: usize) -> EvalResult<Self> {
        match n_classes {
            0 => Err(EvalError::InvalidClassCount { n_classes }),
            1 => Ok(Self::Binary),
            n_classes => Ok(Self::Multiclass { n_classes }),
        }
    }

    /// Dice score of one batch of `[N, n_classes, H, W]` logits.
    pub fn score_batch<B: Backend>(
        &self,
        logits: Tensor<B, 4>,
        masks: MaskTensor<B>,
        dice: &DiceConfig,
    ) -> EvalResult<f64> {
        match *self {
            Self::Binary => score_binary(logits, masks, dice),
            Self::Multiclass { n_classes } => score_multiclass(logits, masks, n_classes, dice),
        }
    }
}

fn score_binary<B: Backend>(
    logits: Tensor<B, 4>,
    masks: MaskTensor<B>,
    dice: &DiceConfig,
) -> EvalResult<f64> {
    let truth = masks.into_channeled().float();
    let probabilities = sigmoid(logits);

    if probabilities.dims() != truth.dims() {
        return Err(EvalError::ShapeMismatch {
            prediction: probabilities.dims().to_vec(),
            target: truth.dims().to_vec(),
        });
    }

    dice_coeff(probabilities, truth, dice)
}

fn score_multiclass<B: Backend>(
    logits: Tensor<B, 4>,
    masks: MaskTensor<B>,
    n_classes: usize,
    dice: &DiceConfig,
) -> EvalResult<f64> {
    let (min, max) = masks.label_range();
    if min < 0 || max >= n_classes as i64 {
        return Err(EvalError::LabelOutOfRange { min, max, n_classes });
    }

    let mask_dims = masks.dims();
    let labels = masks.into_planar().ok_or_else(|| EvalError::ShapeMismatch {
        prediction: logits.dims().to_vec(),
        target: mask_dims,
    })?;

    let truth = labels.one_hot_channels(n_classes);
    if logits.dims() != truth.dims() {
        return Err(EvalError::ShapeMismatch {
            prediction: logits.dims().to_vec(),
            target: truth.dims().to_vec(),
        });
    }
    let prediction = logits.argmax_one_hot();

    // Channel 0 is background and does not count towards the score.
    let foreground = Slice::starting_at(1);
    match (
        prediction.select_channels(&foreground),
        truth.select_channels(&foreground),
    ) {
        (Some(prediction), Some(truth)) => multiclass_dice_coeff(prediction, truth, dice),
        _ => Err(EvalError::EmptyChannelRange {
            channels: n_classes,
        }),
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSummary {
    /// Mean Dice score over the batches, `0.0` for an empty set.
    pub score: f64,
    /// Number of batches scored.
    pub batches: usize,
}

/// Mean Dice score of `model` over `batches`.
///
/// See [`evaluate_with_summary`].
pub fn evaluate<B, M, I>(
    model: &mut M,
    batches: I,
    device: &B::Device,
    config: &EvaluationConfig,
) -> EvalResult<f64>
where
    B: Backend,
    M: SegmentationModel<B> + ?Sized,
    I: IntoIterator<Item = SegmentationBatch<B>>,
{
    evaluate_with_summary(model, batches, device, config).map(|summary| summary.score)
}

/// Runs a validation pass and reports the mean score with the batch count.
///
/// The model is held in eval mode for the duration of the pass and returned to
/// its previous mode afterwards, whether the pass succeeds or not. Batches are
/// moved to `device` one at a time. The first failing batch aborts the pass.
///
/// # Errors
///
/// * [`EvalError::InvalidClassCount`] if the model reports zero classes.
/// * [`EvalError::InvalidConfiguration`] for an unusable Dice configuration.
/// * [`EvalError::ShapeMismatch`] if logits and mask disagree in shape.
/// * [`EvalError::LabelOutOfRange`] if a multiclass mask holds a label outside
///   `[0, n_classes)`.
/// * [`EvalError::IncompleteValidationSet`] if fewer batches arrive than
///   `config.expected_batches`, or than an exact iterator size hint announces.
pub fn evaluate_with_summary<B, M, I>(
    model: &mut M,
    batches: I,
    device: &B::Device,
    config: &EvaluationConfig,
) -> EvalResult<EvaluationSummary>
where
    B: Backend,
    M: SegmentationModel<B> + ?Sized,
    I: IntoIterator<Item = SegmentationBatch<B>>,
{
    config.dice.validate()?;
    let strategy = EvalStrategy::for_classes(model.n_classes())?;

    let model = EvalModeGuard::new(model);
    let batches = batches.into_iter();
    let expected = config.expected_batches.or_else(|| match batches.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(lower),
        _ => None,
    });
    tracing::debug!(?strategy, amp = config.amp, ?expected, "validation round");

    let mut dice_score = 0.0;
    let mut num_batches = 0_usize;

    for batch in batches {
        let images = batch.images.to_device(device);
        let masks = batch.masks.to_device(device);

        let logits = model.forward(images);
        let score = strategy.score_batch(logits, masks, &config.dice)?;

        dice_score += score;
        num_batches += 1;
        tracing::debug!(batch = num_batches, score, "scored validation batch");

        if config.log_every > 0 && num_batches % config.log_every == 0 {
            tracing::info!(
                batch = num_batches,
                ?expected,
                running = dice_score / num_batches as f64,
                "validation progress",
            );
        }
    }

    // Data loaders stop at the first sample they cannot load.
    if let Some(expected) = expected {
        if num_batches < expected {
            return Err(EvalError::IncompleteValidationSet {
                expected,
                seen: num_batches,
            });
        }
    }

    let score = dice_score / num_batches.max(1) as f64;
    tracing::debug!(score, batches = num_batches, "validation round finished");

    Ok(EvaluationSummary {
        score,
        batches: num_batches,
    })
}
