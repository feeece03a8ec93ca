//! Python-style `start:end` selections on a single tensor axis.
//!
//! Negative bounds count from the end of the axis and every bound is clamped to
//! it, so a `Slice` never produces an out-of-range `narrow`.

use burn::prelude::*;
use core::ops::Range;

/// Half-open selection `start:end` where either bound may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    start: Option<isize>,
    end: Option<isize>,
}

impl Slice {
    pub const fn new(start: Option<isize>, end: Option<isize>) -> Self {
        Self { start, end }
    }

    /// Everything from `start` to the end of the axis (`x[start:]`).
    pub const fn starting_at(start: isize) -> Self {
        Self::new(Some(start), None)
    }

    /// Resolves the selection against an axis of length `len`.
    ///
    /// The result is always within `0..len` and never reversed; a selection
    /// whose end precedes its start resolves to an empty range.
    pub fn to_range(&self, len: usize) -> Range<usize> {
        let start = self.start.map_or(0, |index| resolve(index, len));
        let end = self.end.map_or(len, |index| resolve(index, len));
        start..end.max(start)
    }

    /// Number of elements selected on an axis of length `len`.
    pub fn slice_length(&self, len: usize) -> usize {
        self.to_range(len).len()
    }
}

fn resolve(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

/// Narrows `tensor` along `dim` to the elements selected by `slice`.
///
/// Returns `None` when the selection is empty, since Burn tensors cannot have a
/// zero-length axis produced by `narrow`.
///
/// # Panics
///
/// Panics if `dim >= D`.
pub fn slice_dim<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
    dim: usize,
    slice: &Slice,
) -> Option<Tensor<B, D>> {
    let len = tensor.dims()[dim];
    let range = slice.to_range(len);
    if range.is_empty() {
        return None;
    }
    if range.start == 0 && range.end == len {
        return Some(tensor);
    }

    Some(tensor.narrow(dim, range.start, range.end - range.start))
}
