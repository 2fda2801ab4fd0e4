/// Size of the area the backdrop covers, in logical pixels, plus the device's
/// physical pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Builds a viewport from a window's physical size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let ratio = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            width: (width as f64 / ratio) as f32,
            height: (height as f64 / ratio) as f32,
            pixel_ratio: ratio as f32,
        }
    }

    /// Minimised windows report a zero-sized viewport; nothing should be
    /// reconfigured for those.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.pixel_ratio > 0.0)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Backing-buffer size in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        let width = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let height = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (width, height)
    }
}

/// Texture minification/magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Sampling configuration for the panorama texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSampling {
    pub generate_mipmaps: bool,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
}

impl TextureSampling {
    /// Panorama images are rarely power-of-two sized, and mip generation for
    /// those breaks on some backends, so mipmaps stay off and both filters are
    /// linear.
    pub fn non_power_of_two() -> Self {
        Self {
            generate_mipmaps: false,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
        }
    }
}

impl Default for TextureSampling {
    fn default() -> Self {
        Self::non_power_of_two()
    }
}

/// Decorative treatment applied when presenting the backdrop. Not part of the
/// resource lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationStyle {
    /// Blur radius in logical pixels.
    pub blur: f32,
    pub scale: f32,
}

impl Default for PresentationStyle {
    fn default() -> Self {
        Self {
            blur: 4.0,
            scale: 1.02,
        }
    }
}

/// Fixed parameters of the panorama scene.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaConfig {
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
    /// Sphere radius; must sit between `near` and `far`.
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Yaw added per frame. Speed therefore follows the display's refresh rate.
    pub rotation_step: f32,
    pub sampling: TextureSampling,
    pub presentation: PresentationStyle,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            field_of_view: 75.0,
            near: 0.1,
            far: 1000.0,
            radius: 500.0,
            width_segments: 60,
            height_segments: 40,
            rotation_step: 0.0006,
            sampling: TextureSampling::default(),
            presentation: PresentationStyle::default(),
        }
    }
}
