use glam::Mat4;

/// Perspective camera fixed at the origin, looking down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    field_of_view: f32,
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(field_of_view: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            field_of_view,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Updates the aspect ratio and recomputes the projection matrix.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.field_of_view.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }

    /// The view matrix is the identity, so this is just the projection.
    pub fn view_projection(&self) -> Mat4 {
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn aspect_change_updates_projection() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        let square = camera.projection();
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect(), 2.0);
        assert_ne!(camera.projection(), square);
        // x is squeezed by the aspect ratio, y is not.
        assert!((camera.projection().x_axis.x * 2.0 - square.x_axis.x).abs() < 1e-5);
        assert!((camera.projection().y_axis.y - square.y_axis.y).abs() < 1e-6);
    }

    #[test]
    fn points_on_sphere_fall_inside_clip_volume() {
        let camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, -500.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0, "depth {depth} outside [0, 1]");
    }
}
