//! Immersive panorama backdrop: a textured sphere viewed from its centre,
//! slowly rotating behind the interface.
//!
//! [`PanoramaRenderer`] owns the lifecycle. It acquires a [`ResourceSet`]
//! in one step on [`PanoramaRenderer::mount`], draws once per display refresh
//! through a cancellable frame ticket, follows viewport changes and releases
//! everything on [`PanoramaRenderer::unmount`]. The graphics API sits behind
//! [`RenderBackend`]: [`WgpuBackend`] draws into a winit window and
//! [`HeadlessBackend`] keeps plain records for terminal hosts and tests.
//!
//! The image streams in on a background thread ([`ThreadedTextureLoader`]);
//! until it decodes, or if it never does, a placeholder texture is bound and
//! the sphere keeps turning.

mod backend;
mod camera;
mod error;
mod geometry;
mod gpu;
mod headless;
mod lifecycle;
mod resources;
mod texture;
mod types;

pub use backend::{DrawParams, RenderBackend};
pub use camera::PerspectiveCamera;
pub use error::{AssetError, PanoramaError, SurfaceFault};
pub use geometry::{SphereGeometry, SphereVertex};
pub use gpu::{WgpuBackend, WgpuMaterial, WgpuMesh, WgpuSurface, WgpuTexture};
pub use headless::{
    HeadlessBackend, HeadlessMaterial, HeadlessMesh, HeadlessStats, HeadlessStatsHandle,
    HeadlessSurface, HeadlessTexture,
};
pub use lifecycle::{FrameReport, PanoramaRenderer};
pub use resources::{ResourceSet, Scene};
pub use texture::{
    AssetSource, PanoramaImage, PendingTexture, StaticTextureLoader, TextureLoader, TexturePoll,
    ThreadedTextureLoader,
};
pub use types::{PanoramaConfig, PresentationStyle, TextureFilter, TextureSampling, Viewport};
