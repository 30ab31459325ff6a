//! Signals and smoothing kernels for density estimation.
//!
//! A [`Signal`] is either a set of weighted impulses or a dense field. A
//! [`Kernel`] is one of six families ([`KernelKind`]) sampled on the grid's
//! cell size; [`Kernel::convolve`] splats impulses or convolves fields onto
//! a [`DataGrid`](stride_grid::DataGrid), optionally reflecting across the
//! domain boundary to suppress edge loss.
//!
//! Separable families convolve fields axis by axis. The adaptive Plaue
//! family samples a fresh Gaussian per impulse and accepts impulse signals
//! only.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod family;
pub mod kernel;
pub mod signal;

pub use error::KernelError;
pub use family::KernelKind;
pub use kernel::{
    sample_width, Kernel, KernelBuilder, MAX_KERNEL_WIDTH, PLAUE_MAX_SIGMA, PLAUE_MIN_SIGMA,
};
pub use signal::{field_domain_signal, ImpulseImages, ImpulseSignal, Signal};
