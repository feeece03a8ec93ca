//! Dice evaluation demos
//!
//! Runs a validation pass from the command line, either over an
//! `imgs/` + `masks/` folder or over generated data.
//!
//! ```bash
//! # Score a checkpoint on a folder dataset
//! cargo run --bin evaluate -- --data-dir data/val --classes 2 --weights model.mpk
//!
//! # Smoke-test the pipeline without any files
//! cargo run --bin evaluate -- --synthetic 4 --classes 3
//!
//! # Reduced precision on the GPU
//! cargo run --bin evaluate --features wgpu -- --synthetic 4 --amp
//! ```

pub mod common;
pub mod config;

pub use common::{
    create_device, get_backend_name, HalfBackend, SelectedBackend, SelectedDevice,
    SUPPORTS_HALF_PRECISION,
};
pub use config::{EvaluateConfig, SyntheticConfig};
