//! CPU-only backend. It allocates nothing on a GPU and records what the
//! renderer asked of it, which makes it suitable for terminal hosts and for
//! asserting on lifecycle behaviour.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::backend::{DrawParams, RenderBackend};
use crate::error::{PanoramaError, SurfaceFault};
use crate::geometry::SphereGeometry;
use crate::texture::PanoramaImage;
use crate::types::{PresentationStyle, TextureSampling};

/// Counters shared between a [`HeadlessBackend`] and its observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessStats {
    pub surfaces_created: u32,
    pub meshes_created: u32,
    pub textures_created: u32,
    pub materials_created: u32,
    pub uploads: u32,
    pub draws: u64,
    /// Resources created and not yet dropped.
    pub live: u32,
    pub backing_size: Option<(u32, u32)>,
    pub last_rotation: Option<glam::Mat4>,
}

type SharedStats = Rc<RefCell<HeadlessStats>>;

#[derive(Debug)]
struct Tracked(SharedStats);

impl Tracked {
    fn new(stats: &SharedStats) -> Self {
        stats.borrow_mut().live += 1;
        Self(Rc::clone(stats))
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let mut stats = self.0.borrow_mut();
        stats.live = stats.live.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    _tracked: Tracked,
}

#[derive(Debug)]
pub struct HeadlessMesh {
    pub id: u32,
    pub vertex_count: usize,
    pub index_count: usize,
    pub inverted: bool,
    _tracked: Tracked,
}

#[derive(Debug)]
pub struct HeadlessTexture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub sampling: TextureSampling,
    pub placeholder: bool,
    _tracked: Tracked,
}

#[derive(Debug)]
pub struct HeadlessMaterial {
    pub id: u32,
    pub texture_id: u32,
    /// Bumped every time the material is rebound to new texture contents.
    pub revision: u32,
    pub presentation: PresentationStyle,
    _tracked: Tracked,
}

/// Backend that keeps resources as plain records.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    stats: SharedStats,
    next_id: u32,
    fail_surface: bool,
    faults: VecDeque<SurfaceFault>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose surface creation always fails.
    pub fn without_context() -> Self {
        Self {
            fail_surface: true,
            ..Self::default()
        }
    }

    /// Handle for reading counters after the backend moved into a renderer.
    pub fn stats_handle(&self) -> HeadlessStatsHandle {
        HeadlessStatsHandle(Rc::clone(&self.stats))
    }

    /// Makes upcoming draws fail with `faults`, in order.
    pub fn inject_faults(&mut self, faults: impl IntoIterator<Item = SurfaceFault>) {
        self.faults.extend(faults);
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Read access to a backend's [`HeadlessStats`].
#[derive(Debug, Clone)]
pub struct HeadlessStatsHandle(SharedStats);

impl HeadlessStatsHandle {
    pub fn snapshot(&self) -> HeadlessStats {
        self.0.borrow().clone()
    }
}

impl RenderBackend for HeadlessBackend {
    type Surface = HeadlessSurface;
    type Mesh = HeadlessMesh;
    type Texture = HeadlessTexture;
    type Material = HeadlessMaterial;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, PanoramaError> {
        if self.fail_surface {
            return Err(PanoramaError::ContextUnavailable(
                "headless backend configured without a drawing context".into(),
            ));
        }
        let id = self.allocate_id();
        {
            let mut stats = self.stats.borrow_mut();
            stats.surfaces_created += 1;
            stats.backing_size = Some((width, height));
        }
        Ok(HeadlessSurface {
            id,
            width,
            height,
            _tracked: Tracked::new(&self.stats),
        })
    }

    fn resize_surface(&mut self, surface: &mut Self::Surface, width: u32, height: u32) {
        surface.width = width;
        surface.height = height;
        self.stats.borrow_mut().backing_size = Some((width, height));
    }

    fn create_mesh(&mut self, geometry: &SphereGeometry) -> Result<Self::Mesh, PanoramaError> {
        let id = self.allocate_id();
        self.stats.borrow_mut().meshes_created += 1;
        Ok(HeadlessMesh {
            id,
            vertex_count: geometry.vertices().len(),
            index_count: geometry.indices().len(),
            inverted: geometry.is_inverted(),
            _tracked: Tracked::new(&self.stats),
        })
    }

    fn create_placeholder_texture(
        &mut self,
        sampling: TextureSampling,
    ) -> Result<Self::Texture, PanoramaError> {
        let id = self.allocate_id();
        self.stats.borrow_mut().textures_created += 1;
        Ok(HeadlessTexture {
            id,
            width: 1,
            height: 1,
            sampling,
            placeholder: true,
            _tracked: Tracked::new(&self.stats),
        })
    }

    fn create_material(
        &mut self,
        texture: &Self::Texture,
        presentation: PresentationStyle,
    ) -> Result<Self::Material, PanoramaError> {
        let id = self.allocate_id();
        self.stats.borrow_mut().materials_created += 1;
        Ok(HeadlessMaterial {
            id,
            texture_id: texture.id,
            revision: 0,
            presentation,
            _tracked: Tracked::new(&self.stats),
        })
    }

    fn upload_texture(
        &mut self,
        texture: &mut Self::Texture,
        material: &mut Self::Material,
        image: &PanoramaImage,
    ) -> Result<(), PanoramaError> {
        texture.width = image.width();
        texture.height = image.height();
        texture.placeholder = false;
        material.texture_id = texture.id;
        material.revision += 1;
        self.stats.borrow_mut().uploads += 1;
        Ok(())
    }

    fn draw(
        &mut self,
        _surface: &mut Self::Surface,
        _mesh: &Self::Mesh,
        _material: &Self::Material,
        params: &DrawParams,
    ) -> Result<(), SurfaceFault> {
        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }
        let mut stats = self.stats.borrow_mut();
        stats.draws += 1;
        stats.last_rotation = Some(params.model);
        Ok(())
    }
}
