// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Surface generators: plane, disk, sphere, cylinder and torus.

use super::{MeshError, MeshVertex, ParametricMesh};
use crate::math::{Vec3, Vec4, FRAC_PI_2, FRAC_PI_4, PI, TAU};

#[inline]
fn point(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 1.0)
}

#[inline]
fn direction(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4::new(x, y, z, 0.0)
}

#[inline]
fn tex_coord(s: f32, t: f32) -> Vec4 {
    Vec4::new(s, t, 0.0, 0.0)
}

/// Maps the unit square onto the unit disk with Shirley's concentric mapping.
///
/// Returns the polar radius in `[-1, 1]` and the angle.
fn concentric_map(s: f32, t: f32) -> (f32, f32) {
    let r1 = 2.0 * s - 1.0;
    let r2 = 2.0 * t - 1.0;

    if r1 == 0.0 && r2 == 0.0 {
        (0.0, 0.0)
    } else if r1 * r1 > r2 * r2 {
        (r1, FRAC_PI_4 * (r2 / r1))
    } else {
        (r2, FRAC_PI_2 - FRAC_PI_4 * (r1 / r2))
    }
}

impl ParametricMesh {
    /// A `width x height` plane in the `xy` plane, centred on the origin.
    ///
    /// Vertex `(x, z)` of the `(slices + 2) x (stacks + 2)` grid sits at
    /// `s = x / (slices + 1)`, `t = z / (stacks + 1)`.
    ///
    /// # Errors
    ///
    /// [`MeshError::TooManyVertices`] when the padded grid exceeds 65536 vertices.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not strictly positive.
    pub fn plane(width: f32, height: f32, slices: u32, stacks: u32) -> Result<Self, MeshError> {
        assert!(
            width > 0.0 && height > 0.0,
            "plane dimensions must be positive (got {width} x {height})"
        );

        Self::from_surface(slices, stacks, |s, t| MeshVertex {
            position: point((s - 0.5) * width, (t - 0.5) * height, 0.0),
            tex_coord: tex_coord(s, t),
            tangent: Vec4::X,
            bitangent: Vec4::Y,
        })
    }

    /// A disk of the given radius in the `xy` plane, obtained by mapping the
    /// plane grid through the concentric square-to-disk map.
    ///
    /// An odd tessellation puts a vertex on the centre, where the tangent frame
    /// collapses; such a mesh still renders but cannot be exported to OBJ.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not strictly positive.
    pub fn disk(radius: f32, slices: u32, stacks: u32) -> Result<Self, MeshError> {
        assert!(radius > 0.0, "disk radius must be positive (got {radius})");

        Self::from_surface(slices, stacks, |s, t| {
            let (r, phi) = concentric_map(s, t);
            let (sin_phi, cos_phi) = phi.sin_cos();

            MeshVertex {
                position: point(radius * r * cos_phi, radius * r * sin_phi, 0.0),
                tex_coord: tex_coord(s, t),
                tangent: direction(cos_phi, sin_phi, 0.0),
                bitangent: direction(-r * sin_phi, r * cos_phi, 0.0),
            }
        })
    }

    /// A sphere centred on the origin with its poles on the `z` axis.
    ///
    /// `theta = s * pi` runs pole to pole and `phi = t * 2pi` around the axis;
    /// the stored texture coordinate is `(t, s)` so `u` follows the longitude.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is not strictly positive.
    pub fn sphere(radius: f32, slices: u32, stacks: u32) -> Result<Self, MeshError> {
        assert!(radius > 0.0, "sphere radius must be positive (got {radius})");

        Self::from_surface(slices, stacks, |s, t| {
            let (sin_theta, cos_theta) = (s * PI).sin_cos();
            let (sin_phi, cos_phi) = (t * TAU).sin_cos();

            MeshVertex {
                position: point(
                    radius * sin_theta * cos_phi,
                    radius * sin_theta * sin_phi,
                    radius * cos_theta,
                ),
                tex_coord: tex_coord(t, s),
                tangent: direction(cos_theta * cos_phi, cos_theta * sin_phi, -sin_theta),
                bitangent: direction(-sin_phi, cos_phi, 0.0),
            }
        })
    }

    /// An open cylinder around the `y` axis, centred on the origin.
    ///
    /// # Panics
    ///
    /// Panics if `radius` or `height` is not strictly positive.
    pub fn cylinder(radius: f32, height: f32, slices: u32, stacks: u32) -> Result<Self, MeshError> {
        assert!(
            radius > 0.0 && height > 0.0,
            "cylinder radius and height must be positive (got {radius}, {height})"
        );

        Self::from_surface(slices, stacks, |s, t| {
            let (sin_phi, cos_phi) = (s * TAU).sin_cos();

            MeshVertex {
                position: point(radius * cos_phi, (t - 0.5) * height, -radius * sin_phi),
                tex_coord: tex_coord(s, t),
                tangent: direction(-sin_phi, 0.0, -cos_phi),
                bitangent: Vec4::Y,
            }
        })
    }

    /// A torus around the `z` axis.
    ///
    /// `ring_radius` is the distance from the centre to the middle of the pipe;
    /// `s` walks the ring and `t` walks the pipe, both clockwise.
    ///
    /// # Panics
    ///
    /// Panics if either radius is not strictly positive.
    pub fn torus(
        ring_radius: f32,
        ring_segments: u32,
        pipe_radius: f32,
        pipe_segments: u32,
    ) -> Result<Self, MeshError> {
        assert!(
            ring_radius > 0.0 && pipe_radius > 0.0,
            "torus radii must be positive (got {ring_radius}, {pipe_radius})"
        );

        Self::from_surface(ring_segments, pipe_segments, |s, t| {
            let (sin_theta, cos_theta) = ((1.0 - s) * TAU).sin_cos();
            let (sin_phi, cos_phi) = ((1.0 - t) * TAU).sin_cos();
            let arm = pipe_radius * cos_phi + ring_radius;

            let ring_direction = Vec3::new(-sin_theta, cos_theta, 0.0);
            let tangent = (ring_direction * arm)
                .try_normalize()
                .unwrap_or(ring_direction);

            MeshVertex {
                position: point(cos_theta * arm, sin_theta * arm, pipe_radius * sin_phi),
                tex_coord: tex_coord(s, t),
                tangent: Vec4::from_vec3(tangent, 0.0),
                bitangent: direction(-cos_theta * sin_phi, -sin_theta * sin_phi, cos_phi),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn normal(v: &MeshVertex) -> Vec3 {
        v.tangent.truncate().cross(v.bitangent.truncate())
    }

    type Generator = fn(u32, u32) -> Result<ParametricMesh, MeshError>;

    fn generators() -> [(&'static str, Generator); 5] {
        [
            ("plane", |s: u32, t: u32| ParametricMesh::plane(2.0, 1.0, s, t)),
            ("disk", |s: u32, t: u32| ParametricMesh::disk(1.5, s, t)),
            ("sphere", |s: u32, t: u32| ParametricMesh::sphere(0.75, s, t)),
            ("cylinder", |s: u32, t: u32| ParametricMesh::cylinder(1.0, 3.0, s, t)),
            ("torus", |s: u32, t: u32| ParametricMesh::torus(2.0, s, 0.5, t)),
        ]
    }

    /// Subdivisions up to the last grid that fits 16-bit indices (256 x 256).
    const RESOLUTIONS: [(u32, u32); 5] = [(0, 0), (1, 3), (7, 2), (16, 16), (254, 254)];

    #[test]
    fn every_surface_fills_the_padded_grid() {
        for (name, generate) in generators() {
            for (slices, stacks) in RESOLUTIONS {
                let mesh = generate(slices, stacks).unwrap();
                let (columns, rows) = (slices as usize + 2, stacks as usize + 2);
                let cells = (columns - 1) * (rows - 1);
                let vertex_count = mesh.vertex_count();

                assert_eq!(vertex_count, columns * rows, "{name} {slices}x{stacks}");
                assert_eq!(mesh.triangle_count(), 2 * cells, "{name} {slices}x{stacks}");
                assert_eq!(mesh.quad_count(), cells, "{name} {slices}x{stacks}");
                assert!(
                    mesh.triangles()
                        .iter()
                        .chain(mesh.quads())
                        .all(|&i| (i as usize) < vertex_count),
                    "{name} {slices}x{stacks} indexes past its vertices"
                );
            }
        }
    }

    #[test]
    fn every_surface_rejects_grids_past_sixteen_bits() {
        for (name, generate) in generators() {
            assert!(
                matches!(
                    generate(255, 254),
                    Err(MeshError::TooManyVertices {
                        requested: 65792,
                        max: 65536
                    })
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn sphere_radius_holds_at_every_resolution() {
        for (slices, stacks) in RESOLUTIONS {
            let mesh = ParametricMesh::sphere(0.75, slices, stacks).unwrap();
            for v in mesh.vertices() {
                assert_relative_eq!(v.position.truncate().length(), 0.75, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn plane_counts_match_padded_grid() {
        let mesh = ParametricMesh::plane(2.0, 1.0, 3, 5).unwrap();
        assert_eq!(mesh.vertex_count(), 5 * 7);
        assert_eq!(mesh.triangle_count(), 2 * 4 * 6);
        assert_eq!(mesh.quad_count(), 4 * 6);
        assert!(mesh
            .triangles()
            .iter()
            .chain(mesh.quads())
            .all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn plane_vertex_layout_is_column_major() {
        let mesh = ParametricMesh::plane(2.0, 4.0, 0, 1).unwrap();
        // 2 columns x 3 rows; vertex (x=1, z=2) at 1 * 3 + 2.
        let v = mesh.vertices()[5];
        assert_relative_eq!(v.tex_coord.x, 1.0);
        assert_relative_eq!(v.tex_coord.y, 1.0);
        assert_relative_eq!(v.position.x, 1.0);
        assert_relative_eq!(v.position.y, 2.0);
        assert_eq!(v.position.w, 1.0);
        assert_eq!(v.tangent, Vec4::X);
        assert_eq!(v.bitangent, Vec4::Y);
    }

    #[test]
    fn plane_rejects_oversized_grid() {
        assert!(matches!(
            ParametricMesh::plane(1.0, 1.0, 300, 300),
            Err(MeshError::TooManyVertices { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "plane dimensions must be positive")]
    fn plane_panics_on_zero_width() {
        let _ = ParametricMesh::plane(0.0, 1.0, 1, 1);
    }

    #[test]
    fn disk_stays_inside_radius() {
        let mesh = ParametricMesh::disk(3.0, 8, 8).unwrap();
        for v in mesh.vertices() {
            assert!(v.position.truncate().length() <= 3.0 + 1e-4);
            assert_eq!(v.position.z, 0.0);
        }
    }

    #[test]
    fn disk_corner_lands_on_rim() {
        let mesh = ParametricMesh::disk(2.0, 2, 2).unwrap();
        let corner = mesh.vertices()[0];
        assert_relative_eq!(corner.position.truncate().length(), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = ParametricMesh::sphere(2.5, 6, 9).unwrap();
        for v in mesh.vertices() {
            assert_relative_eq!(v.position.truncate().length(), 2.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn sphere_swaps_texture_coordinates() {
        let mesh = ParametricMesh::sphere(1.0, 0, 1).unwrap();
        // Vertex (x=0, z=1): s = 0, t = 0.5.
        let v = mesh.vertices()[1];
        assert_relative_eq!(v.tex_coord.x, 0.5);
        assert_relative_eq!(v.tex_coord.y, 0.0);
    }

    #[test]
    fn sphere_normals_point_outward() {
        let mesh = ParametricMesh::sphere(1.0, 6, 6).unwrap();
        for v in &mesh.vertices()[8..mesh.vertex_count() - 8] {
            let p = v.position.truncate();
            if p.z.abs() < 0.99 {
                assert!(normal(v).dot(p) > 0.0);
            }
        }
    }

    #[test]
    fn cylinder_has_constant_radius_and_bounded_height() {
        let mesh = ParametricMesh::cylinder(0.5, 3.0, 7, 2).unwrap();
        for v in mesh.vertices() {
            let p = v.position;
            assert_relative_eq!((p.x * p.x + p.z * p.z).sqrt(), 0.5, epsilon = 1e-5);
            assert!(p.y >= -1.5 - 1e-5 && p.y <= 1.5 + 1e-5);
        }
    }

    #[test]
    fn torus_tangents_are_unit_length() {
        let mesh = ParametricMesh::torus(2.0, 10, 0.5, 6).unwrap();
        for v in mesh.vertices() {
            assert_relative_eq!(v.tangent.truncate().length(), 1.0, epsilon = 1e-5);
            let p = v.position.truncate();
            let ring = (p.x * p.x + p.y * p.y).sqrt() - 2.0;
            assert_relative_eq!((ring * ring + p.z * p.z).sqrt(), 0.5, epsilon = 1e-4);
        }
    }

    #[test]
    fn concentric_map_covers_unit_disk() {
        assert_eq!(concentric_map(0.5, 0.5), (0.0, 0.0));
        let (r, phi) = concentric_map(1.0, 0.5);
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(phi, 0.0);
        let (r, phi) = concentric_map(0.5, 1.0);
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(phi, FRAC_PI_2);
    }
}
