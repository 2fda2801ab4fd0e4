//! wgpu backend for windowed hosts.
//!
//! - `context` creates the instance, window surface, adapter and device.
//! - `pipeline` holds the WGSL program that samples the panorama, applies
//!   the presentation blur and scale, and the matching uniform layout.
//! - `backend` implements [`crate::RenderBackend`] on top of both.

mod backend;
mod context;
mod pipeline;

pub use backend::{WgpuBackend, WgpuMaterial, WgpuMesh, WgpuSurface, WgpuTexture};
