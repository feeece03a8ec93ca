//! The model side of a validation pass.
//!
//! Burn has no global train/eval switch on modules, so models expose their mode
//! through [`SegmentationModel`] and the evaluator scopes it with
//! [`EvalModeGuard`]. [`PixelClassifier`] is a minimal per-pixel head that
//! implements the trait and backs the demo binary and the tests.

use core::{marker::PhantomData, ops::Deref};

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Dropout, DropoutConfig,
    },
    prelude::*,
};

use crate::error::{EvalError, EvalResult};

/// Whether training-only behaviour such as dropout is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelMode {
    #[default]
    Train,
    Eval,
}

/// A model that maps `[N, C, H, W]` images to `[N, n_classes, H, W]` logits.
pub trait SegmentationModel<B: Backend> {
    /// Number of output channels; `1` means binary segmentation.
    fn n_classes(&self) -> usize;

    /// Forward inference, returning unnormalised logits.
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4>;

    fn mode(&self) -> ModelMode;

    fn set_mode(&mut self, mode: ModelMode);
}

/// Holds a model in [`ModelMode::Eval`] and puts the previous mode back on drop.
///
/// Restoration runs on every exit path, including `?` returns and unwinding.
pub struct EvalModeGuard<'a, B: Backend, M: SegmentationModel<B> + ?Sized> {
    model: &'a mut M,
    previous: ModelMode,
    _backend: PhantomData<fn() -> B>,
}

impl<'a, B: Backend, M: SegmentationModel<B> + ?Sized> EvalModeGuard<'a, B, M> {
    pub fn new(model: &'a mut M) -> Self {
        let previous = model.mode();
        model.set_mode(ModelMode::Eval);
        Self {
            model,
            previous,
            _backend: PhantomData,
        }
    }

    /// The mode that will be restored.
    pub const fn previous(&self) -> ModelMode {
        self.previous
    }
}

impl<B: Backend, M: SegmentationModel<B> + ?Sized> Deref for EvalModeGuard<'_, B, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.model
    }
}

impl<B: Backend, M: SegmentationModel<B> + ?Sized> Drop for EvalModeGuard<'_, B, M> {
    fn drop(&mut self) {
        self.model.set_mode(self.previous);
    }
}

/// Configuration for [`PixelClassifier`].
#[derive(Config, Debug)]
pub struct PixelClassifierConfig {
    #[config(default = 3)]
    pub in_channels: usize,
    /// Output classes; `1` for binary masks.
    #[config(default = 1)]
    pub n_classes: usize,
    /// Input dropout probability, applied only in train mode.
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl PixelClassifierConfig {
    /// Initialize a new classifier on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> EvalResult<PixelClassifier<B>> {
        if self.n_classes == 0 {
            return Err(EvalError::InvalidClassCount {
                n_classes: self.n_classes,
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(EvalError::InvalidConfiguration {
                reason: format!("dropout must be in [0, 1), got {}", self.dropout),
            });
        }

        Ok(PixelClassifier {
            dropout: DropoutConfig::new(self.dropout).init(),
            head: Conv2dConfig::new([self.in_channels, self.n_classes], [1, 1]).init(device),
            n_classes: self.n_classes,
            training: true,
        })
    }
}

/// 1×1 convolution head scoring every pixel independently.
#[derive(Module, Debug)]
pub struct PixelClassifier<B: Backend> {
    dropout: Dropout,
    head: Conv2d<B>,
    n_classes: usize,
    training: bool,
}

impl<B: Backend> SegmentationModel<B> for PixelClassifier<B> {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = if self.training {
            self.dropout.forward(images)
        } else {
            images
        };
        self.head.forward(x)
    }

    fn mode(&self) -> ModelMode {
        if self.training {
            ModelMode::Train
        } else {
            ModelMode::Eval
        }
    }

    fn set_mode(&mut self, mode: ModelMode) {
        self.training = mode == ModelMode::Train;
    }
}
