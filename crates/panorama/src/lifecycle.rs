use scheduler::FrameGate;
use tracing::{debug, info, warn};

use crate::backend::{DrawParams, RenderBackend};
use crate::error::PanoramaError;
use crate::resources::ResourceSet;
use crate::texture::{PendingTexture, TextureLoader, TexturePoll};
use crate::types::{PanoramaConfig, Viewport};

/// Outcome of one [`PanoramaRenderer::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// A draw was submitted this tick.
    pub drawn: bool,
    /// The renderer became ready this tick. Reported once per mount.
    pub ready: bool,
}

/// Owns the panorama's graphics resources for the duration of a mount and
/// drives its continuous draw loop.
///
/// The host calls [`PanoramaRenderer::frame`] on every display refresh while
/// [`PanoramaRenderer::frame_pending`] holds. Unmounting cancels the
/// outstanding frame ticket, so a refresh that races with teardown draws
/// nothing.
pub struct PanoramaRenderer<B: RenderBackend> {
    backend: B,
    config: PanoramaConfig,
    gate: FrameGate,
    resources: Option<ResourceSet<B>>,
    pending_texture: Option<PendingTexture>,
    first_draw: bool,
    ready_emitted: bool,
    frames_drawn: u64,
}

impl<B: RenderBackend> PanoramaRenderer<B> {
    pub fn new(backend: B, config: PanoramaConfig) -> Self {
        Self {
            backend,
            config,
            gate: FrameGate::new(),
            resources: None,
            pending_texture: None,
            first_draw: false,
            ready_emitted: false,
            frames_drawn: 0,
        }
    }

    pub fn config(&self) -> &PanoramaConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_mounted(&self) -> bool {
        self.resources.is_some()
    }

    pub fn resources(&self) -> Option<&ResourceSet<B>> {
        self.resources.as_ref()
    }

    /// True while a frame ticket is outstanding.
    pub fn frame_pending(&self) -> bool {
        self.gate.pending().is_some()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Acquires every resource, starts the texture load and requests the
    /// first frame. A previous mount is released first.
    pub fn mount<L>(
        &mut self,
        viewport: Viewport,
        loader: &L,
    ) -> Result<&ResourceSet<B>, PanoramaError>
    where
        L: TextureLoader + ?Sized,
    {
        if self.resources.is_some() {
            debug!("remounting panorama; releasing previous resources");
            self.unmount();
        }

        let resources = ResourceSet::build(&mut self.backend, &self.config, viewport)?;
        let (width, height) = viewport.backing_size();
        info!(
            width,
            height,
            pixel_ratio = viewport.pixel_ratio,
            triangles = resources.geometry.triangle_count(),
            "panorama mounted"
        );

        self.pending_texture = Some(loader.load());
        self.first_draw = false;
        self.ready_emitted = false;
        self.frames_drawn = 0;
        self.gate.request();
        Ok(self.resources.insert(resources))
    }

    /// Runs one tick of the draw loop. Does nothing unless a frame ticket is
    /// outstanding.
    pub fn frame(&mut self) -> FrameReport {
        let mut report = FrameReport::default();
        if self.gate.take().is_none() {
            return report;
        }
        let Some(resources) = self.resources.as_mut() else {
            return report;
        };

        if let Some(pending) = self.pending_texture.as_ref() {
            match pending.poll() {
                TexturePoll::Pending => {}
                TexturePoll::Ready(image) => {
                    self.pending_texture = None;
                    match self.backend.upload_texture(
                        &mut resources.texture,
                        &mut resources.material,
                        &image,
                    ) {
                        Ok(()) => debug!(
                            width = image.width(),
                            height = image.height(),
                            "panorama texture uploaded"
                        ),
                        Err(err) => {
                            warn!(error = %err, "failed to upload panorama texture; keeping placeholder")
                        }
                    }
                }
                TexturePoll::Failed(err) => {
                    self.pending_texture = None;
                    warn!(error = %err, "failed to load panorama texture; keeping placeholder");
                }
            }
        }

        if self.first_draw && !self.ready_emitted {
            self.ready_emitted = true;
            report.ready = true;
            info!("panorama ready");
        }

        resources.scene.rotate_y(self.config.rotation_step);
        let params = DrawParams {
            view_projection: resources.camera.view_projection(),
            model: resources.scene.model_matrix(),
            pixel_ratio: resources.viewport.pixel_ratio,
        };
        match self.backend.draw(
            &mut resources.surface,
            &resources.mesh,
            &resources.material,
            &params,
        ) {
            Ok(()) => {
                report.drawn = true;
                self.first_draw = true;
                self.frames_drawn += 1;
            }
            Err(fault) if fault.needs_reconfigure() => {
                let (width, height) = resources.viewport.backing_size();
                debug!(%fault, width, height, "reconfiguring panorama surface");
                self.backend
                    .resize_surface(&mut resources.surface, width, height);
            }
            Err(fault) => warn!(%fault, "panorama draw skipped"),
        }

        self.gate.request();
        report
    }

    /// Tracks a viewport change. Geometry, texture and material are kept.
    pub fn resize(&mut self, viewport: Viewport) {
        let Some(resources) = self.resources.as_mut() else {
            return;
        };
        if viewport.is_empty() {
            return;
        }
        resources.viewport = viewport;
        resources.camera.set_aspect(viewport.aspect());
        let (width, height) = viewport.backing_size();
        self.backend
            .resize_surface(&mut resources.surface, width, height);
        debug!(width, height, aspect = viewport.aspect(), "panorama resized");
    }

    /// Cancels the draw loop and releases every resource. Safe to call any
    /// number of times.
    pub fn unmount(&mut self) {
        self.gate.cancel();
        self.pending_texture = None;
        if let Some(resources) = self.resources.take() {
            resources.release(&mut self.backend);
            info!(frames = self.frames_drawn, "panorama unmounted");
        }
    }
}

impl<B: RenderBackend> Drop for PanoramaRenderer<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}
