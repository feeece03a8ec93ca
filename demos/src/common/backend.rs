//! Backend selection from feature flags.
//!
//! `HalfBackend` shares its device type with `SelectedBackend`, so a run can
//! switch precision without touching device setup.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        use burn::{backend::cuda::{Cuda, CudaDevice}, tensor::f16};

        pub type SelectedBackend = Cuda;
        pub type HalfBackend = Cuda<f16, i32>;
        pub type SelectedDevice = CudaDevice;

        pub const SUPPORTS_HALF_PRECISION: bool = true;

        pub fn create_device() -> SelectedDevice {
            CudaDevice::default()
        }

        pub const fn get_backend_name() -> &'static str {
            "CUDA (NVIDIA GPU)"
        }
    } else if #[cfg(feature = "wgpu")] {
        use burn::{backend::wgpu::{Wgpu, WgpuDevice}, tensor::f16};

        pub type SelectedBackend = Wgpu;
        pub type HalfBackend = Wgpu<f16, i32>;
        pub type SelectedDevice = WgpuDevice;

        pub const SUPPORTS_HALF_PRECISION: bool = true;

        pub fn create_device() -> SelectedDevice {
            WgpuDevice::default()
        }

        pub const fn get_backend_name() -> &'static str {
            "WGPU (GPU)"
        }
    } else {
        use burn::backend::ndarray::{NdArray, NdArrayDevice};

        pub type SelectedBackend = NdArray;
        /// NdArray has no half-precision kernels; reduced precision falls back to f32.
        pub type HalfBackend = NdArray;
        pub type SelectedDevice = NdArrayDevice;

        pub const SUPPORTS_HALF_PRECISION: bool = false;

        pub fn create_device() -> SelectedDevice {
            NdArrayDevice::default()
        }

        pub const fn get_backend_name() -> &'static str {
            "NdArray (CPU)"
        }
    }
}
