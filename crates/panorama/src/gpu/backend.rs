use std::sync::Arc;

use tracing::debug;
use wgpu::util::{BufferInitDescriptor, DeviceExt, TextureDataOrder};
use winit::window::Window;

use crate::backend::{DrawParams, RenderBackend};
use crate::error::{PanoramaError, SurfaceFault};
use crate::geometry::SphereGeometry;
use crate::texture::PanoramaImage;
use crate::types::{PresentationStyle, TextureFilter, TextureSampling};

use super::context::{create_instance, create_window_surface, GpuDevice};
use super::pipeline::{PanoramaPipeline, PanoramaUniforms};

pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl WgpuSurface {
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

pub struct WgpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

pub struct WgpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    sampling: TextureSampling,
    width: u32,
    height: u32,
}

impl WgpuTexture {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub struct WgpuMaterial {
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    presentation: PresentationStyle,
}

/// Renders the panorama into a winit window through wgpu.
///
/// The device is created lazily with the first surface and reused across
/// remounts; the pipeline is rebuilt only when the surface format changes.
pub struct WgpuBackend {
    window: Arc<Window>,
    instance: wgpu::Instance,
    gpu: Option<GpuDevice>,
    pipeline: Option<PanoramaPipeline>,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            instance: create_instance(),
            gpu: None,
            pipeline: None,
        }
    }

    fn gpu(&self) -> Result<&GpuDevice, PanoramaError> {
        self.gpu.as_ref().ok_or_else(|| {
            PanoramaError::ContextUnavailable("GPU device not initialised".into())
        })
    }

    fn pipeline(&self) -> Result<&PanoramaPipeline, PanoramaError> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| PanoramaError::resource("material", "no render pipeline"))
    }

    fn create_texture_resources(
        &self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        sampling: TextureSampling,
    ) -> Result<WgpuTexture, PanoramaError> {
        let gpu = self.gpu()?;
        let max_dimension = gpu.device.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(PanoramaError::resource(
                "texture",
                format!("{width}x{height} exceeds the GPU limit of {max_dimension}"),
            ));
        }
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                // No mip chain: the image need not be power-of-two sized.
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panorama sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(sampling.mag_filter),
            min_filter: filter_mode(sampling.min_filter),
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Ok(WgpuTexture {
            _texture: texture,
            view,
            sampler,
            sampling,
            width,
            height,
        })
    }

    fn material_bind_group(
        &self,
        uniforms: &wgpu::Buffer,
        texture: &WgpuTexture,
    ) -> Result<wgpu::BindGroup, PanoramaError> {
        let gpu = self.gpu()?;
        let pipeline = self.pipeline()?;
        Ok(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panorama material"),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        }))
    }
}

fn filter_mode(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

impl From<wgpu::SurfaceError> for SurfaceFault {
    fn from(value: wgpu::SurfaceError) -> Self {
        match value {
            wgpu::SurfaceError::Lost => SurfaceFault::Lost,
            wgpu::SurfaceError::Outdated => SurfaceFault::Outdated,
            wgpu::SurfaceError::Timeout => SurfaceFault::Timeout,
            wgpu::SurfaceError::OutOfMemory => SurfaceFault::OutOfMemory,
            _ => SurfaceFault::Other,
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Surface = WgpuSurface;
    type Mesh = WgpuMesh;
    type Texture = WgpuTexture;
    type Material = WgpuMaterial;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, PanoramaError> {
        let surface = create_window_surface(&self.instance, &self.window)?;
        if self.gpu.is_none() {
            self.gpu = Some(GpuDevice::new(&self.instance, &surface)?);
        }
        let gpu = self.gpu()?;
        let config = gpu.surface_config(&surface, width, height)?;
        surface.configure(&gpu.device, &config);

        let stale = self
            .pipeline
            .as_ref()
            .map_or(true, |pipeline| pipeline.format != config.format);
        if stale {
            debug!(format = ?config.format, "building panorama pipeline");
            let pipeline = PanoramaPipeline::new(&gpu.device, config.format);
            self.pipeline = Some(pipeline);
        }
        Ok(WgpuSurface { surface, config })
    }

    fn resize_surface(&mut self, surface: &mut Self::Surface, width: u32, height: u32) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let max_dimension = gpu.device.limits().max_texture_dimension_2d;
        surface.config.width = width.clamp(1, max_dimension);
        surface.config.height = height.clamp(1, max_dimension);
        surface.surface.configure(&gpu.device, &surface.config);
    }

    fn create_mesh(&mut self, geometry: &SphereGeometry) -> Result<Self::Mesh, PanoramaError> {
        let gpu = self.gpu()?;
        let vertices = gpu.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("panorama vertices"),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = gpu.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("panorama indices"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(WgpuMesh {
            vertices,
            indices,
            index_count: geometry.indices().len() as u32,
        })
    }

    fn create_placeholder_texture(
        &mut self,
        sampling: TextureSampling,
    ) -> Result<Self::Texture, PanoramaError> {
        self.create_texture_resources(
            "panorama placeholder",
            1,
            1,
            &[12, 12, 16, 255],
            sampling,
        )
    }

    fn create_material(
        &mut self,
        texture: &Self::Texture,
        presentation: PresentationStyle,
    ) -> Result<Self::Material, PanoramaError> {
        let gpu = self.gpu()?;
        let uniforms = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panorama uniforms"),
            size: std::mem::size_of::<PanoramaUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.material_bind_group(&uniforms, texture)?;
        Ok(WgpuMaterial {
            uniforms,
            bind_group,
            presentation,
        })
    }

    fn upload_texture(
        &mut self,
        texture: &mut Self::Texture,
        material: &mut Self::Material,
        image: &PanoramaImage,
    ) -> Result<(), PanoramaError> {
        let uploaded = self.create_texture_resources(
            "panorama texture",
            image.width(),
            image.height(),
            image.pixels(),
            texture.sampling,
        )?;
        material.bind_group = self.material_bind_group(&material.uniforms, &uploaded)?;
        *texture = uploaded;
        Ok(())
    }

    fn draw(
        &mut self,
        surface: &mut Self::Surface,
        mesh: &Self::Mesh,
        material: &Self::Material,
        params: &DrawParams,
    ) -> Result<(), SurfaceFault> {
        let (Some(gpu), Some(pipeline)) = (self.gpu.as_ref(), self.pipeline.as_ref()) else {
            return Err(SurfaceFault::Other);
        };
        let frame = surface.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = PanoramaUniforms {
            view_projection: params.view_projection.to_cols_array_2d(),
            model: params.model.to_cols_array_2d(),
            presentation: [
                material.presentation.blur * params.pixel_ratio,
                material.presentation.scale,
                0.0,
                0.0,
            ],
        };
        gpu.queue
            .write_buffer(&material.uniforms, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("panorama encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("panorama pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&pipeline.pipeline);
            render_pass.set_bind_group(0, &material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            render_pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}
