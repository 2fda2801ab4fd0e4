use glam::Mat4;

use crate::backend::RenderBackend;
use crate::camera::PerspectiveCamera;
use crate::error::PanoramaError;
use crate::geometry::SphereGeometry;
use crate::types::{PanoramaConfig, Viewport};

/// Root container holding the single panorama mesh transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scene {
    rotation_y: f32,
}

impl Scene {
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn rotate_y(&mut self, radians: f32) {
        self.rotation_y += radians;
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_y)
    }
}

/// Everything a mounted renderer owns. Built in one step; either all members
/// are live or none are.
pub struct ResourceSet<B: RenderBackend> {
    pub(crate) surface: B::Surface,
    pub(crate) scene: Scene,
    pub(crate) camera: PerspectiveCamera,
    pub(crate) geometry: SphereGeometry,
    pub(crate) mesh: B::Mesh,
    pub(crate) texture: B::Texture,
    pub(crate) material: B::Material,
    pub(crate) viewport: Viewport,
}

impl<B: RenderBackend> ResourceSet<B> {
    pub(crate) fn build(
        backend: &mut B,
        config: &PanoramaConfig,
        viewport: Viewport,
    ) -> Result<Self, PanoramaError> {
        if viewport.is_empty() {
            return Err(PanoramaError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if !(config.radius > config.near && config.radius < config.far) {
            return Err(PanoramaError::resource(
                "geometry",
                format!(
                    "radius {} must lie between near {} and far {}",
                    config.radius, config.near, config.far
                ),
            ));
        }

        let (width, height) = viewport.backing_size();
        let surface = backend.create_surface(width, height)?;
        let camera = PerspectiveCamera::new(
            config.field_of_view,
            viewport.aspect(),
            config.near,
            config.far,
        );
        let geometry =
            SphereGeometry::inverted(config.radius, config.width_segments, config.height_segments);

        // Drops release whatever was created before a failing step.
        let mesh = backend.create_mesh(&geometry)?;
        let texture = backend.create_placeholder_texture(config.sampling)?;
        let material = backend.create_material(&texture, config.presentation)?;

        Ok(Self {
            surface,
            scene: Scene::default(),
            camera,
            geometry,
            mesh,
            texture,
            material,
            viewport,
        })
    }

    pub(crate) fn release(self, backend: &mut B) {
        backend.release(self.surface, self.mesh, self.texture, self.material);
    }

    pub fn surface(&self) -> &B::Surface {
        &self.surface
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn geometry(&self) -> &SphereGeometry {
        &self.geometry
    }

    pub fn mesh(&self) -> &B::Mesh {
        &self.mesh
    }

    pub fn texture(&self) -> &B::Texture {
        &self.texture
    }

    pub fn material(&self) -> &B::Material {
        &self.material
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
