use glam::Mat4;

use crate::error::{PanoramaError, SurfaceFault};
use crate::geometry::SphereGeometry;
use crate::texture::PanoramaImage;
use crate::types::{PresentationStyle, TextureSampling};

/// Matrices for one draw of the panorama mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub view_projection: Mat4,
    pub model: Mat4,
    /// Physical pixels per logical pixel of the current viewport.
    pub pixel_ratio: f32,
}

/// Graphics API seam used by [`crate::PanoramaRenderer`].
///
/// Every resource is created through the backend and handed back to
/// [`RenderBackend::release`] when the renderer unmounts. Backends never
/// keep their own references to the resources they hand out.
pub trait RenderBackend {
    type Surface;
    type Mesh;
    type Texture;
    type Material;

    /// Binds a drawing surface with a backing buffer of `width` x `height`
    /// physical pixels.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, PanoramaError>;

    fn resize_surface(&mut self, surface: &mut Self::Surface, width: u32, height: u32);

    fn create_mesh(&mut self, geometry: &SphereGeometry) -> Result<Self::Mesh, PanoramaError>;

    /// Creates the texture shown until the real image is decoded.
    fn create_placeholder_texture(
        &mut self,
        sampling: TextureSampling,
    ) -> Result<Self::Texture, PanoramaError>;

    fn create_material(
        &mut self,
        texture: &Self::Texture,
        presentation: PresentationStyle,
    ) -> Result<Self::Material, PanoramaError>;

    /// Replaces the texture contents with `image` and rebinds `material` to
    /// the new contents.
    fn upload_texture(
        &mut self,
        texture: &mut Self::Texture,
        material: &mut Self::Material,
        image: &PanoramaImage,
    ) -> Result<(), PanoramaError>;

    fn draw(
        &mut self,
        surface: &mut Self::Surface,
        mesh: &Self::Mesh,
        material: &Self::Material,
        params: &DrawParams,
    ) -> Result<(), SurfaceFault>;

    fn release(
        &mut self,
        surface: Self::Surface,
        mesh: Self::Mesh,
        texture: Self::Texture,
        material: Self::Material,
    ) {
        drop((material, texture, mesh, surface));
    }
}
