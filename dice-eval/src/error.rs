//! Error types for Dice validation.
//!
//! Every check the evaluator performs on a batch surfaces as an [`EvalError`]
//! variant. None of them is recoverable inside a validation pass: the first one
//! aborts the pass and is handed back to the caller.

use thiserror::Error;

/// The error type for evaluation operations.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Prediction and ground truth disagree in shape after normalisation.
    #[error("Shape mismatch: prediction {prediction:?}, target {target:?}")]
    ShapeMismatch {
        /// Shape of the prediction tensor.
        prediction: Vec<usize>,
        /// Shape of the ground-truth tensor.
        target: Vec<usize>,
    },

    /// A ground-truth label lies outside `[0, n_classes)`.
    #[error("True mask indices should be in [0, {n_classes}), got values in [{min}, {max}]")]
    LabelOutOfRange {
        /// Smallest label in the offending mask.
        min: i64,
        /// Largest label in the offending mask.
        max: i64,
        /// Number of classes the model predicts.
        n_classes: usize,
    },

    /// The model reports zero output classes.
    #[error("A segmentation model needs at least one class, got {n_classes}")]
    InvalidClassCount {
        /// The reported class count.
        n_classes: usize,
    },

    /// Multiclass Dice was asked to score an empty channel range.
    #[error("No channels left to score out of {channels}")]
    EmptyChannelRange {
        /// Channel count of the tensor before selection.
        channels: usize,
    },

    /// The batch source ended before delivering every expected batch.
    #[error("Validation set ended early: expected {expected} batches, scored {seen}")]
    IncompleteValidationSet {
        /// Number of batches the pass was told to expect.
        expected: usize,
        /// Number of batches actually scored.
        seen: usize,
    },

    /// Error for when an invalid configuration is provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error raised while loading validation data from disk.
    #[cfg(feature = "dataset")]
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// A specialized `Result` type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Error type for on-disk dataset operations.
#[cfg(feature = "dataset")]
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Error when the image directory is not found.
    #[error("Image directory not found: {path}")]
    ImageDirectoryNotFound {
        /// The expected image directory path.
        path: std::path::PathBuf,
    },

    /// Error when the mask directory is not found.
    #[error("Mask directory not found: {path}")]
    MaskDirectoryNotFound {
        /// The expected mask directory path.
        path: std::path::PathBuf,
    },

    /// Error when reading a directory fails.
    #[error("Failed to read directory: {path}")]
    DirectoryReadFailed {
        /// The directory path that failed to read.
        path: std::path::PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// Error when no valid image/mask pairs are found in the dataset.
    #[error("No valid image/mask pairs found in: {path}")]
    NoValidPairs {
        /// The directory where no pairs were found.
        path: std::path::PathBuf,
    },

    /// Error when an image has no matching mask file.
    #[error("No mask found for image: {path}")]
    MaskNotFound {
        /// The image that has no mask.
        path: std::path::PathBuf,
    },

    /// Error when opening or decoding an image file fails.
    #[error("Failed to open image: {path}")]
    ImageOpenFailed {
        /// The image file path that failed to open.
        path: std::path::PathBuf,
        /// The underlying image processing error.
        #[source]
        source: image::ImageError,
    },

    /// Error when the resize factor is outside `(0, 1]`.
    #[error("Scale must be in (0, 1], got {scale}")]
    InvalidScale {
        /// The rejected scale factor.
        scale: f32,
    },
}

/// A specialized `Result` type for dataset operations.
#[cfg(feature = "dataset")]
pub type DatasetResult<T> = Result<T, DatasetError>;
