//! Dice validation of a segmentation model.
//!
//! Scores a [`PixelClassifier`] (optionally loaded from a Burn record) on a
//! folder dataset or on generated data, then prints the mean Dice score.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use burn::{
    data::{
        dataloader::DataLoaderBuilder,
        dataset::{Dataset, InMemDataset},
    },
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::Distribution,
};
use clap::Parser;
use dice_eval_burn::{
    evaluate_with_summary, EvaluationSummary, FolderDataset, PixelClassifier,
    PixelClassifierConfig, SegmentationBatcher, SegmentationItem,
};
use dice_eval_demos::{
    common::{create_device, get_backend_name, HalfBackend, SelectedBackend, SelectedDevice},
    config::{EvaluateConfig, SyntheticConfig},
    SUPPORTS_HALF_PRECISION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score a segmentation model with the Dice coefficient", long_about = None)]
struct Args {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset root containing `imgs/` and `masks/`
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Suffix that turns an image stem into its mask stem
    #[arg(long)]
    mask_suffix: Option<String>,

    /// Downscaling factor for images and masks
    #[arg(short, long)]
    scale: Option<f32>,

    /// Number of model output classes (1 for binary masks)
    #[arg(long)]
    classes: Option<usize>,

    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Model weights saved as a named MessagePack record
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Run inference in half precision where the backend supports it
    #[arg(long)]
    amp: bool,

    /// Evaluate on this many generated samples instead of a dataset
    #[arg(long)]
    synthetic: Option<usize>,

    /// Log a running score every N batches
    #[arg(long)]
    log_every: Option<usize>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let device = create_device();
    tracing::info!(backend = get_backend_name(), ?device, "selected backend");

    let summary = if config.evaluation.amp && SUPPORTS_HALF_PRECISION {
        run::<HalfBackend>(&config, &device)?
    } else {
        if config.evaluation.amp {
            tracing::warn!(
                backend = get_backend_name(),
                "half precision is not available on this backend, evaluating in f32"
            );
        }
        run::<SelectedBackend>(&config, &device)?
    };

    println!(
        "Validation Dice score: {:.4} ({} batches)",
        summary.score, summary.batches
    );
    Ok(())
}

fn resolve_config(args: &Args) -> Result<EvaluateConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => EvaluateConfig::default(),
    };

    if let Some(data_dir) = &args.data_dir {
        config.data_dir = Some(data_dir.clone());
    }
    if let Some(mask_suffix) = &args.mask_suffix {
        config.mask_suffix = mask_suffix.clone();
    }
    if let Some(scale) = args.scale {
        config.scale = scale;
    }
    if let Some(classes) = args.classes {
        config.n_classes = classes;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(weights) = &args.weights {
        config.weights = Some(weights.clone());
    }
    if let Some(samples) = args.synthetic {
        config.synthetic = Some(SyntheticConfig {
            samples,
            ..config.synthetic.unwrap_or_default()
        });
    }
    if let Some(log_every) = args.log_every {
        config.evaluation.log_every = log_every;
    }
    config.evaluation.amp |= args.amp;

    ensure!(config.batch_size > 0, "batch size must be positive");
    ensure!(config.n_classes > 0, "at least one class is required");
    Ok(config)
}

fn run<B: Backend<Device = SelectedDevice>>(
    config: &EvaluateConfig,
    device: &SelectedDevice,
) -> Result<EvaluationSummary> {
    let mut model = load_model::<B>(config, device)?;

    let dataset: Box<dyn Dataset<SegmentationItem<B>>> = match &config.synthetic {
        Some(synthetic) => Box::new(synthetic_dataset::<B>(config, synthetic, device)),
        None => {
            let root = config
                .data_dir
                .as_deref()
                .ok_or_else(|| anyhow!("no dataset directory given and no synthetic run requested"))?;
            let dataset = FolderDataset::<B>::new(root, &config.mask_suffix, config.scale, device)
                .with_context(|| format!("failed to index dataset {}", root.display()))?;
            Box::new(dataset)
        }
    };
    let samples = dataset.len();
    let mut evaluation = config.evaluation.clone();
    evaluation.expected_batches = Some(samples.div_ceil(config.batch_size));

    let loader = DataLoaderBuilder::new(SegmentationBatcher::<B>::new())
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .set_device(device.clone())
        .build(dataset);

    tracing::info!(samples, batch_size = config.batch_size, "starting validation");
    let summary = evaluate_with_summary(&mut model, loader.iter(), device, &evaluation)?;
    tracing::info!(score = summary.score, batches = summary.batches, "validation finished");

    Ok(summary)
}

fn load_model<B: Backend>(config: &EvaluateConfig, device: &B::Device) -> Result<PixelClassifier<B>> {
    let model = PixelClassifierConfig::new()
        .with_in_channels(config.in_channels)
        .with_n_classes(config.n_classes)
        .init::<B>(device)?;

    match &config.weights {
        Some(path) => load_weights(model, path, device),
        None => {
            tracing::warn!("no weights given, scoring a freshly initialised model");
            Ok(model)
        }
    }
}

fn load_weights<B: Backend>(
    model: PixelClassifier<B>,
    path: &Path,
    device: &B::Device,
) -> Result<PixelClassifier<B>> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let model = model
        .load_file(path, &recorder, device)
        .map_err(|e| anyhow!("failed to load weights {}: {e:?}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded weights");
    Ok(model)
}

fn synthetic_dataset<B: Backend>(
    config: &EvaluateConfig,
    synthetic: &SyntheticConfig,
    device: &B::Device,
) -> InMemDataset<SegmentationItem<B>> {
    // Binary masks still draw from {0, 1}.
    let label_count = config.n_classes.max(2) as f64;
    let items = (0..synthetic.samples)
        .map(|_| SegmentationItem {
            image: Tensor::random(
                [config.in_channels, synthetic.height, synthetic.width],
                Distribution::Normal(0.0, 1.0),
                device,
            ),
            mask: Tensor::<B, 2>::random(
                [synthetic.height, synthetic.width],
                Distribution::Uniform(0.0, label_count),
                device,
            )
            .int()
            .clamp(0, label_count as i64 - 1),
        })
        .collect();

    InMemDataset::new(items)
}
