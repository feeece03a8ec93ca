//! Dice-coefficient validation for semantic segmentation models built with Burn.
//!
//! A validation pass runs a [`SegmentationModel`] over batches of images and
//! ground-truth masks and reports the mean Dice score:
//!
//! - binary models (`n_classes == 1`) are scored on sigmoid probabilities
//!   against the 0/1 mask;
//! - multiclass models are scored on the one-hot arg-max class map against the
//!   one-hot mask, with the background channel left out.
//!
//! ```rust,ignore
//! use dice_eval_burn::{evaluate, EvaluationConfig, PixelClassifierConfig};
//!
//! let mut model = PixelClassifierConfig::new().init::<B>(&device)?;
//! let score = evaluate(&mut model, loader.iter(), &device, &EvaluationConfig::new())?;
//! ```

mod config;
mod dataset;
mod dice;
mod error;
mod evaluate;
mod mask;
mod model;

pub use config::{Denominator, DiceConfig, EvaluationConfig, Reduction};
#[cfg(feature = "dataset")]
pub use dataset::FolderDataset;
pub use dataset::{SegmentationBatch, SegmentationBatcher, SegmentationItem};
pub use dice::{dice_coeff, dice_loss, dice_per_row, multiclass_dice_coeff};
#[cfg(feature = "dataset")]
pub use error::{DatasetError, DatasetResult};
pub use error::{EvalError, EvalResult};
pub use evaluate::{evaluate, evaluate_with_summary, EvalStrategy, EvaluationSummary};
pub use mask::MaskTensor;
pub use model::{
    EvalModeGuard, ModelMode, PixelClassifier, PixelClassifierConfig, PixelClassifierRecord,
    SegmentationModel,
};
