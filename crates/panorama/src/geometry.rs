use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    /// Texture coordinate with v = 0 at the top row of the image.
    pub uv: [f32; 2],
}

/// UV sphere used as the panorama's projection surface.
///
/// Triangles are wound counter-clockwise when seen from outside. Scaling by a
/// negative factor on one axis (see [`SphereGeometry::inverted`]) mirrors the
/// mesh and flips the winding, so the interior becomes the front face.
#[derive(Debug, Clone)]
pub struct SphereGeometry {
    radius: f32,
    width_segments: u32,
    height_segments: u32,
    scale: [f32; 3],
    vertices: Vec<SphereVertex>,
    indices: Vec<u32>,
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let columns = width_segments + 1;
        let mut vertices = Vec::with_capacity((columns * (height_segments + 1)) as usize);
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            // Pole rows share one position; shift their u by half a segment
            // so each pole triangle samples the middle of its column.
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * PI * 2.0;
                vertices.push(SphereVertex {
                    position: [
                        -radius * phi.cos() * theta.sin(),
                        radius * theta.cos(),
                        radius * phi.sin() * theta.sin(),
                    ],
                    uv: [u + u_offset, v],
                });
            }
        }

        let mut indices = Vec::with_capacity((width_segments * (height_segments - 1) * 6) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * columns + ix + 1;
                let b = iy * columns + ix;
                let c = (iy + 1) * columns + ix;
                let d = (iy + 1) * columns + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            radius,
            width_segments,
            height_segments,
            scale: [1.0, 1.0, 1.0],
            vertices,
            indices,
        }
    }

    /// Sphere whose interior faces the camera at its centre.
    pub fn inverted(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let mut geometry = Self::new(radius, width_segments, height_segments);
        geometry.scale(-1.0, 1.0, 1.0);
        geometry
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        for vertex in &mut self.vertices {
            vertex.position[0] *= x;
            vertex.position[1] *= y;
            vertex.position[2] *= z;
        }
        self.scale[0] *= x;
        self.scale[1] *= y;
        self.scale[2] *= z;
    }

    /// True when an odd number of axes are mirrored.
    pub fn is_inverted(&self) -> bool {
        self.scale[0] * self.scale[1] * self.scale[2] < 0.0
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn segments(&self) -> (u32, u32) {
        (self.width_segments, self.height_segments)
    }

    pub fn vertices(&self) -> &[SphereVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle_facing(geometry: &SphereGeometry) -> (usize, usize) {
        let mut outward = 0;
        let mut inward = 0;
        for triangle in geometry.indices().chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|index| Vec3::from(geometry.vertices()[index as usize].position));
            let normal = (b - a).cross(c - a);
            if normal.length() < 1e-3 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            if normal.dot(centroid) > 0.0 {
                outward += 1;
            } else {
                inward += 1;
            }
        }
        (outward, inward)
    }

    #[test]
    fn builds_expected_topology() {
        let geometry = SphereGeometry::new(500.0, 60, 40);
        assert_eq!(geometry.vertices().len(), 61 * 41);
        assert_eq!(geometry.triangle_count(), 60 * (2 * 40 - 2));
        assert!(geometry
            .indices()
            .iter()
            .all(|&index| (index as usize) < geometry.vertices().len()));
    }

    #[test]
    fn vertices_lie_on_radius() {
        let geometry = SphereGeometry::inverted(500.0, 24, 12);
        for vertex in geometry.vertices() {
            let length = Vec3::from(vertex.position).length();
            assert!((length - 500.0).abs() < 1e-2, "vertex at {length}");
        }
    }

    #[test]
    fn plain_sphere_faces_outward() {
        let (outward, inward) = triangle_facing(&SphereGeometry::new(10.0, 16, 8));
        assert!(outward > 0);
        assert_eq!(inward, 0);
    }

    #[test]
    fn inverted_sphere_faces_inward() {
        let geometry = SphereGeometry::inverted(10.0, 16, 8);
        assert!(geometry.is_inverted());
        let (outward, inward) = triangle_facing(&geometry);
        assert!(inward > 0);
        assert_eq!(outward, 0);
    }

    #[test]
    fn uvs_span_the_image() {
        let geometry = SphereGeometry::inverted(1.0, 8, 4);
        let top = geometry.vertices()[0].uv[1];
        let bottom = geometry.vertices().last().unwrap().uv[1];
        assert_eq!(top, 0.0);
        assert_eq!(bottom, 1.0);
        for vertex in geometry.vertices() {
            assert!((-0.1..=1.1).contains(&vertex.uv[0]));
        }
    }

    #[test]
    fn degenerate_segment_counts_are_clamped() {
        let geometry = SphereGeometry::new(1.0, 0, 0);
        assert_eq!(geometry.segments(), (3, 2));
        assert!(geometry.triangle_count() > 0);
    }
}
