//! Channel-first one-hot encoding for dense label maps.
//!
//! Burn's `one_hot` appends the class axis at the end of the tensor. Segmentation
//! code wants it at position 1 (`[N, C, H, W]`), next to the batch axis, so these
//! helpers build the encoding directly in that layout by comparing every pixel
//! against a broadcast class-index grid.

use burn::prelude::*;

/// Encodes a `[N, H, W]` label map as a `[N, num_classes, H, W]` float tensor.
///
/// Channel `c` holds `1.0` where the label equals `c` and `0.0` elsewhere. A label
/// outside `0..num_classes` yields an all-zero column; range checking is left to
/// the caller.
///
/// # Panics
///
/// Panics if `num_classes` is zero.
pub fn one_hot_channels<B: Backend>(labels: Tensor<B, 3, Int>, num_classes: usize) -> Tensor<B, 4> {
    assert!(num_classes > 0, "one-hot encoding needs at least one class");

    let [n, h, w] = labels.dims();
    let device = labels.device();

    let classes = Tensor::<B, 1, Int>::arange(0..num_classes as i64, &device)
        .reshape([1, num_classes, 1, 1])
        .repeat_dim(0, n)
        .repeat_dim(2, h)
        .repeat_dim(3, w);

    labels
        .unsqueeze_dim::<4>(1)
        .repeat_dim(1, num_classes)
        .equal(classes)
        .float()
}

/// Replaces `[N, C, H, W]` logits with the one-hot encoding of their arg-max class.
pub fn argmax_one_hot<B: Backend>(logits: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, c, h, w] = logits.dims();
    let winners = logits.argmax(1).reshape([n, h, w]);

    one_hot_channels(winners, c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_one_hot_channels_layout() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_ints([[[0, 1], [2, 1]]], &device);

        let encoded = one_hot_channels(labels, 3);

        assert_eq!(encoded.dims(), [1, 3, 2, 2]);
        let values: Vec<f32> = encoded.into_data().iter::<f32>().collect();
        assert_eq!(
            values,
            vec![
                1.0, 0.0, 0.0, 0.0, // class 0
                0.0, 1.0, 0.0, 1.0, // class 1
                0.0, 0.0, 1.0, 0.0, // class 2
            ]
        );
    }

    #[test]
    fn test_one_hot_channels_out_of_range_is_zero() {
        let device = Default::default();
        let labels = Tensor::<TestBackend, 3, Int>::from_ints([[[5]]], &device);

        let total = one_hot_channels(labels, 2).sum().into_scalar();

        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_argmax_one_hot() {
        let device = Default::default();
        // Two pixels, three classes: pixel 0 -> class 2, pixel 1 -> class 0.
        let logits = Tensor::<TestBackend, 4>::from_floats(
            [[[[0.1, 3.0]], [[0.2, -1.0]], [[4.0, 0.5]]]],
            &device,
        );

        let encoded = argmax_one_hot(logits);

        assert_eq!(encoded.dims(), [1, 3, 1, 2]);
        let values: Vec<f32> = encoded.into_data().iter::<f32>().collect();
        assert_eq!(values, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
