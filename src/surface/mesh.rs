//! Surface mesh construction and per-frame deformation.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex data for the deformed surface (position + UV + raw field value)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    /// Merged field value before any display clamping
    pub value: f32,
}

/// Row-major node lattice with triangle indices
pub struct SurfaceMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Undeformed positions (grid) or unit directions (sphere)
    base: Vec<Vec3>,
    rows: usize,
    cols: usize,
}

impl SurfaceMesh {
    /// Flat `size × size` grid in the XZ plane, centered on the world origin.
    ///
    /// Node `(row, col)` sits at `x = col * spacing`, `z = row * spacing` (shifted to center).
    pub fn grid(size: usize, spacing: f32) -> Self {
        let half_size = (size.saturating_sub(1)) as f32 * spacing / 2.0;
        let uv_scale = 1.0 / size.saturating_sub(1).max(1) as f32;

        let mut base = Vec::with_capacity(size * size);
        let mut vertices = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let position = Vec3::new(
                    col as f32 * spacing - half_size,
                    0.0,
                    row as f32 * spacing - half_size,
                );
                base.push(position);
                vertices.push(Vertex {
                    position: position.to_array(),
                    uv: [col as f32 * uv_scale, row as f32 * uv_scale],
                    value: 0.0,
                });
            }
        }

        Self {
            indices: lattice_indices(size, size),
            vertices,
            base,
            rows: size,
            cols: size,
        }
    }

    /// Latitude/longitude sphere of the given radius, pole on +Y.
    ///
    /// Returns the mesh and each node's `(inclination, azimuth)`.
    pub fn sphere(rings: usize, segments: usize, radius: f32) -> (Self, Vec<(f32, f32)>) {
        let rows = rings + 1;
        let cols = segments + 1;

        let mut base = Vec::with_capacity(rows * cols);
        let mut vertices = Vec::with_capacity(rows * cols);
        let mut angles = Vec::with_capacity(rows * cols);
        for ring in 0..rows {
            let inclination = std::f32::consts::PI * ring as f32 / rings as f32;
            let (sin_inc, cos_inc) = inclination.sin_cos();
            for segment in 0..cols {
                let longitude = std::f32::consts::TAU * segment as f32 / segments as f32;
                let (sin_lon, cos_lon) = longitude.sin_cos();
                let direction = Vec3::new(sin_inc * cos_lon, cos_inc, sin_inc * sin_lon);
                // Wrap into (-π, π]; poles report 0
                let azimuth = if ring == 0 || ring == rings {
                    0.0
                } else {
                    direction.z.atan2(direction.x)
                };

                base.push(direction);
                angles.push((inclination, azimuth));
                vertices.push(Vertex {
                    position: (direction * radius).to_array(),
                    uv: [
                        segment as f32 / segments as f32,
                        ring as f32 / rings as f32,
                    ],
                    value: 0.0,
                });
            }
        }

        let mesh = Self {
            indices: lattice_indices(rows, cols),
            vertices,
            base,
            rows,
            cols,
        };
        (mesh, angles)
    }

    /// Lattice dimensions `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Undeformed position or direction of one node
    pub fn base(&self, node: usize) -> Vec3 {
        self.base[node]
    }

    /// Lift grid vertices along +Y by the field value (no clamping)
    pub fn deform_planar(&mut self, field: &[f32]) {
        for (idx, vertex) in self.vertices.iter_mut().enumerate() {
            let value = field.get(idx).copied().unwrap_or(0.0);
            let base = self.base[idx];
            vertex.position = [base.x, value, base.z];
            vertex.value = value;
        }
    }

    /// Push sphere vertices along their direction by the clamped field value
    pub fn deform_spherical(&mut self, field: &[f32], base_radius: f32, max_displacement: f32) {
        for (idx, vertex) in self.vertices.iter_mut().enumerate() {
            let value = field.get(idx).copied().unwrap_or(0.0);
            // NaN displacement collapses to the base radius
            let displacement = if value.is_nan() {
                0.0
            } else {
                value.clamp(-max_displacement, max_displacement)
            };
            vertex.position = (self.base[idx] * (base_radius + displacement)).to_array();
            vertex.value = value;
        }
    }
}

/// Two counter-clockwise triangles per lattice cell
fn lattice_indices(rows: usize, cols: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1) * 6);
    for row in 0..rows.saturating_sub(1) {
        for col in 0..cols.saturating_sub(1) {
            let top_left = (row * cols + col) as u32;
            let top_right = top_left + 1;
            let bottom_left = ((row + 1) * cols + col) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    indices
}
