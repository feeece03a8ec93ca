//! Tensor helpers for scoring segmentation outputs with Burn
//!
//! Label maps and logits are converted to channel-first one-hot tensors, and
//! channels can be selected with Python-style slices.

use burn::prelude::*;

mod one_hot;
mod slice;

pub use one_hot::{argmax_one_hot, one_hot_channels};
pub use slice::{slice_dim, Slice};

/// Additional operations for float Burn tensors
pub trait TensorExtraOps<B: Backend>: Sized {
    /// One-hot encode the arg-max over the channel axis
    fn argmax_one_hot(self) -> Self;

    /// Keep the channels selected by `slice`, or `None` if it selects nothing
    fn select_channels(self, slice: &Slice) -> Option<Self>;
}

impl<B: Backend> TensorExtraOps<B> for Tensor<B, 4> {
    fn argmax_one_hot(self) -> Self {
        argmax_one_hot(self)
    }

    fn select_channels(self, slice: &Slice) -> Option<Self> {
        slice_dim(self, 1, slice)
    }
}

/// Additional operations for integer label maps
pub trait LabelExtraOps<B: Backend> {
    /// Channel-first one-hot encoding, see [`one_hot_channels`]
    fn one_hot_channels(self, num_classes: usize) -> Tensor<B, 4>;
}

impl<B: Backend> LabelExtraOps<B> for Tensor<B, 3, Int> {
    fn one_hot_channels(self, num_classes: usize) -> Tensor<B, 4> {
        one_hot_channels(self, num_classes)
    }
}
