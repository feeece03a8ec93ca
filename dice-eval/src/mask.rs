//! Ground-truth masks with or without a channel axis.
//!
//! Data loaders hand back class-index maps as `[N, H, W]`, while binary masks
//! often keep a singleton channel, `[N, 1, H, W]`. `MaskTensor` carries either
//! layout so the evaluator can normalise it once it knows which strategy runs.

use burn::{prelude::*, tensor::ElementConversion};

/// An integer ground-truth mask.
#[derive(Debug, Clone)]
pub enum MaskTensor<B: Backend> {
    /// Class indices laid out as `[N, H, W]`.
    Planar(Tensor<B, 3, Int>),
    /// Mask with an explicit channel axis, `[N, C, H, W]`.
    Channeled(Tensor<B, 4, Int>),
}

impl<B: Backend> MaskTensor<B> {
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::Planar(mask) => mask.dims().to_vec(),
            Self::Channeled(mask) => mask.dims().to_vec(),
        }
    }

    pub fn device(&self) -> B::Device {
        match self {
            Self::Planar(mask) => mask.device(),
            Self::Channeled(mask) => mask.device(),
        }
    }

    pub fn to_device(self, device: &B::Device) -> Self {
        match self {
            Self::Planar(mask) => Self::Planar(mask.to_device(device)),
            Self::Channeled(mask) => Self::Channeled(mask.to_device(device)),
        }
    }

    /// Returns the mask as `[N, C, H, W]`, inserting a singleton channel if needed.
    pub fn into_channeled(self) -> Tensor<B, 4, Int> {
        match self {
            Self::Planar(mask) => mask.unsqueeze_dim(1),
            Self::Channeled(mask) => mask,
        }
    }

    /// Returns the mask as `[N, H, W]`.
    ///
    /// A channeled mask is accepted only when its channel axis is a singleton;
    /// otherwise `None` is returned.
    pub fn into_planar(self) -> Option<Tensor<B, 3, Int>> {
        match self {
            Self::Planar(mask) => Some(mask),
            Self::Channeled(mask) => {
                let [n, c, h, w] = mask.dims();
                (c == 1).then(|| mask.reshape([n, h, w]))
            }
        }
    }

    /// Smallest and largest label in the mask.
    pub fn label_range(&self) -> (i64, i64) {
        fn extremes<B: Backend, const D: usize>(mask: &Tensor<B, D, Int>) -> (i64, i64) {
            let min = mask.clone().min().into_scalar().elem::<i64>();
            let max = mask.clone().max().into_scalar().elem::<i64>();
            (min, max)
        }

        match self {
            Self::Planar(mask) => extremes(mask),
            Self::Channeled(mask) => extremes(mask),
        }
    }
}

impl<B: Backend> From<Tensor<B, 3, Int>> for MaskTensor<B> {
    fn from(mask: Tensor<B, 3, Int>) -> Self {
        Self::Planar(mask)
    }
}

impl<B: Backend> From<Tensor<B, 4, Int>> for MaskTensor<B> {
    fn from(mask: Tensor<B, 4, Int>) -> Self {
        Self::Channeled(mask)
    }
}
