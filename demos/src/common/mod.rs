//! Shared pieces for the demo binaries.

pub mod backend;

pub use backend::{
    create_device, get_backend_name, HalfBackend, SelectedBackend, SelectedDevice,
    SUPPORTS_HALF_PRECISION,
};
