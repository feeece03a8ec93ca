//! Validation data: items, batches and an on-disk image/mask dataset.
//!
//! Items hold one `[3, H, W]` image and one `[H, W]` class-index mask. The
//! batcher stacks them into [`SegmentationBatch`]es that the evaluator
//! consumes. With the `dataset` feature, [`FolderDataset`] reads pairs from an
//! `imgs/` + `masks/` directory layout.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::mask::MaskTensor;

/// A single preprocessed validation sample.
#[derive(Debug, Clone)]
pub struct SegmentationItem<B: Backend> {
    /// Image tensor with shape `[C, H, W]`, values in `[0, 1]`.
    pub image: Tensor<B, 3>,
    /// Class-index mask with shape `[H, W]`.
    pub mask: Tensor<B, 2, Int>,
}

/// A batch of validation samples.
#[derive(Debug, Clone)]
pub struct SegmentationBatch<B: Backend> {
    /// Batched images with shape `[N, C, H, W]`.
    pub images: Tensor<B, 4>,
    /// Ground truth, `[N, H, W]` or `[N, 1, H, W]`.
    pub masks: MaskTensor<B>,
}

impl<B: Backend> SegmentationBatch<B> {
    pub fn new(images: Tensor<B, 4>, masks: impl Into<MaskTensor<B>>) -> Self {
        Self {
            images,
            masks: masks.into(),
        }
    }
}

/// Stacks [`SegmentationItem`]s along a new batch axis.
#[derive(Clone, Default)]
pub struct SegmentationBatcher<B: Backend> {
    _phantom: core::marker::PhantomData<B>,
}

impl<B: Backend> SegmentationBatcher<B> {
    /// Create a new batcher.
    pub const fn new() -> Self {
        Self {
            _phantom: core::marker::PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, SegmentationItem<B>, SegmentationBatch<B>> for SegmentationBatcher<B> {
    fn batch(&self, items: Vec<SegmentationItem<B>>, device: &B::Device) -> SegmentationBatch<B> {
        let (images, masks): (Vec<_>, Vec<_>) = items
            .into_iter()
            .map(|item| (item.image, item.mask))
            .unzip();

        let images: Tensor<B, 4> = Tensor::stack(images, 0);
        let masks: Tensor<B, 3, Int> = Tensor::stack(masks, 0);

        SegmentationBatch::new(images.to_device(device), masks.to_device(device))
    }
}

#[cfg(feature = "dataset")]
pub use folder::FolderDataset;

#[cfg(feature = "dataset")]
mod folder {
    use std::{
        collections::{BTreeSet, HashMap},
        path::{Path, PathBuf},
    };

    use burn::{data::dataset::Dataset, prelude::*, tensor::TensorData};
    use image::{imageops::FilterType, DynamicImage};
    use walkdir::WalkDir;

    use super::SegmentationItem;
    use crate::error::{DatasetError, DatasetResult};

    const VALID_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

    /// Image/mask pairs read from `root/imgs` and `root/masks`.
    ///
    /// The mask for `imgs/<stem>.<ext>` is `masks/<stem><mask_suffix>.<ext>`, with
    /// any supported extension. Distinct grey levels found across all masks are
    /// sorted and mapped to class indices `0..K`, so a `{0, 255}` binary mask
    /// becomes `{0, 1}`.
    pub struct FolderDataset<B: Backend> {
        items: Vec<(PathBuf, PathBuf)>,
        mask_values: Vec<u8>,
        scale: f32,
        device: B::Device,
    }

    impl<B: Backend> FolderDataset<B> {
        /// Indexes the dataset under `root`, resizing samples by `scale` on load.
        ///
        /// # Errors
        ///
        /// Returns an error if `scale` is outside `(0, 1]`, a directory is missing
        /// or unreadable, an image has no mask, an image or mask cannot be
        /// decoded, or no pairs are found.
        pub fn new(
            root: impl AsRef<Path>,
            mask_suffix: &str,
            scale: f32,
            device: &B::Device,
        ) -> DatasetResult<Self> {
            if !(scale > 0.0 && scale <= 1.0) {
                return Err(DatasetError::InvalidScale { scale });
            }

            let image_root = root.as_ref().join("imgs");
            let mask_root = root.as_ref().join("masks");
            if !image_root.is_dir() {
                return Err(DatasetError::ImageDirectoryNotFound { path: image_root });
            }
            if !mask_root.is_dir() {
                return Err(DatasetError::MaskDirectoryNotFound { path: mask_root });
            }

            let masks: HashMap<String, PathBuf> = list_images(&mask_root)?
                .into_iter()
                .filter_map(|path| Some((stem_of(&path)?, path)))
                .collect();

            let mut items = Vec::new();
            for image_path in list_images(&image_root)? {
                let Some(stem) = stem_of(&image_path) else {
                    continue;
                };
                let mask_path = masks
                    .get(&format!("{stem}{mask_suffix}"))
                    .cloned()
                    .ok_or_else(|| DatasetError::MaskNotFound {
                        path: image_path.clone(),
                    })?;
                items.push((image_path, mask_path));
            }

            if items.is_empty() {
                return Err(DatasetError::NoValidPairs { path: image_root });
            }

            // Every file is decoded once here so that a broken sample fails the
            // whole dataset instead of ending a loader early.
            let mut levels = BTreeSet::new();
            for (image_path, mask_path) in &items {
                open(image_path)?;
                levels.extend(open(mask_path)?.to_luma8().into_raw());
            }
            let mask_values: Vec<u8> = levels.into_iter().collect();

            tracing::info!(
                pairs = items.len(),
                classes = mask_values.len(),
                path = %image_root.display(),
                "indexed segmentation dataset",
            );

            Ok(Self {
                items,
                mask_values,
                scale,
                device: device.clone(),
            })
        }

        /// Grey levels of the masks, in class-index order.
        pub fn mask_values(&self) -> &[u8] {
            &self.mask_values
        }

        fn load(&self, index: usize) -> DatasetResult<Option<SegmentationItem<B>>> {
            let Some((image_path, mask_path)) = self.items.get(index) else {
                return Ok(None);
            };

            let image = rescale(open(image_path)?, self.scale, FilterType::CatmullRom);
            let mask = rescale(open(mask_path)?, self.scale, FilterType::Nearest);

            let image = image.to_rgb32f();
            let (width, height) = image.dimensions();
            let data = TensorData::new(image.into_raw(), [height as usize, width as usize, 3]);
            // HWC to CHW
            let image = Tensor::<B, 3>::from_data(data, &self.device).permute([2, 0, 1]);

            let mask = mask.to_luma8();
            let (width, height) = mask.dimensions();
            let labels: Vec<i64> = mask
                .into_raw()
                .into_iter()
                .map(|level| {
                    // Levels outside the indexed set (e.g. from resampling) map to background.
                    self.mask_values.binary_search(&level).unwrap_or(0) as i64
                })
                .collect();
            let data = TensorData::new(labels, [height as usize, width as usize]);
            let mask = Tensor::<B, 2, Int>::from_data(data, &self.device);

            Ok(Some(SegmentationItem { image, mask }))
        }
    }

    impl<B: Backend> Dataset<SegmentationItem<B>> for FolderDataset<B> {
        fn get(&self, index: usize) -> Option<SegmentationItem<B>> {
            match self.load(index) {
                Ok(item) => item,
                Err(error) => {
                    tracing::error!(index, %error, "failed to load validation sample");
                    None
                }
            }
        }

        fn len(&self) -> usize {
            self.items.len()
        }
    }

    fn list_images(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|source| DatasetError::DirectoryReadFailed {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if entry.file_type().is_file() && !hidden && supported {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }

    fn stem_of(path: &Path) -> Option<String> {
        path.file_stem()?.to_str().map(str::to_owned)
    }

    fn open(path: &Path) -> DatasetResult<DynamicImage> {
        image::open(path).map_err(|source| DatasetError::ImageOpenFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn rescale(image: DynamicImage, scale: f32, filter: FilterType) -> DynamicImage {
        if scale == 1.0 {
            return image;
        }
        let width = ((image.width() as f32 * scale) as u32).max(1);
        let height = ((image.height() as f32 * scale) as u32).max(1);
        image.resize_exact(width, height, filter)
    }
}
