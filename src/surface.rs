//! Surface adapter: node topology, field-coordinate mapping, and geometry output.
//!
//! Both surface variants are row-major node lattices:
//! - Grid: `size × size`, node `row * size + col`, coordinates measured from the origin
//! - Sphere: `(rings + 1) × (segments + 1)`, coordinates measured from the +Y pole

mod mesh;

pub use mesh::{SurfaceMesh, Vertex};

use glam::{Vec2, Vec3};
use log::{info, warn};

use crate::error::FieldResult;
use crate::field::ValueRange;
use crate::params::{SurfaceParams, SurfaceShape};

/// A location on the surface, used as a pulse origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfacePoint {
    /// Fractional grid position
    Grid { row: f32, col: f32 },
    /// Direction on the sphere (normalized on use)
    Sphere(Vec3),
}

/// Per-node spatial coordinate relative to the surface center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialCoord {
    /// Distance from the grid origin, or inclination from the pole (radians)
    pub radial: f32,
    /// Angle around the grid origin, or azimuth (radians, `(-π, π]`)
    pub angular: f32,
}

#[derive(Debug, Clone, Copy)]
enum Topology {
    Grid { size: usize, origin: Vec2 },
    Sphere { base_radius: f32, max_displacement: f32 },
}

/// Geometry and color handed to the rendering collaborator each frame
#[derive(Debug)]
pub struct FramePayload<'a> {
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    /// Authoritative merged field, one value per node
    pub field: &'a [f32],
    /// Node lattice `(rows, cols)`
    pub dims: (usize, usize),
    /// Smoothed feature color, channels in `[0, 1]`
    pub color: [f32; 3],
    /// Theoretical field range for display normalization
    pub range: ValueRange,
    pub time_s: f32,
}

/// Fixed-topology surface: coordinates are computed once, vertices are rewritten per frame
pub struct Surface {
    topology: Topology,
    coords: Vec<SpatialCoord>,
    max_radial: f32,
    mesh: SurfaceMesh,
}

impl Surface {
    /// Build the surface described by `params`
    pub fn new(params: &SurfaceParams) -> FieldResult<Self> {
        params.validate()?;

        let surface = match params.shape {
            SurfaceShape::Grid { size, origin } => {
                let origin = origin
                    .map(|[row, col]| Vec2::new(col, row))
                    .unwrap_or_else(|| Vec2::splat((size / 2) as f32));
                let mesh = SurfaceMesh::grid(size, params.grid_spacing_m);
                let coords: Vec<SpatialCoord> = (0..size * size)
                    .map(|node| {
                        let offset = grid_position(node, size) - origin;
                        SpatialCoord {
                            radial: offset.length(),
                            angular: offset.y.atan2(offset.x),
                        }
                    })
                    .collect();
                let max_radial = coords.iter().map(|c| c.radial).fold(0.0, f32::max);
                Self {
                    topology: Topology::Grid { size, origin },
                    coords,
                    max_radial,
                    mesh,
                }
            }
            SurfaceShape::Sphere { rings, segments } => {
                let (mesh, angles) = SurfaceMesh::sphere(rings, segments, params.base_radius_m);
                let coords = angles
                    .into_iter()
                    .map(|(radial, angular)| SpatialCoord { radial, angular })
                    .collect();
                Self {
                    topology: Topology::Sphere {
                        base_radius: params.base_radius_m,
                        max_displacement: params.max_displacement_m,
                    },
                    coords,
                    max_radial: std::f32::consts::PI,
                    mesh,
                }
            }
        };

        info!(
            "Surface: {} nodes, lattice {:?}, max radial extent {:.3}",
            surface.node_count(),
            surface.dims(),
            surface.max_radial
        );
        Ok(surface)
    }

    pub fn node_count(&self) -> usize {
        self.coords.len()
    }

    /// Node lattice `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        self.mesh.dims()
    }

    pub fn is_spherical(&self) -> bool {
        matches!(self.topology, Topology::Sphere { .. })
    }

    /// Coordinate of `node` relative to the surface center
    pub fn spatial_coordinate(&self, node: usize) -> SpatialCoord {
        self.coords[node]
    }

    /// Largest radial coordinate over all nodes (π on a sphere)
    pub fn max_radial(&self) -> f32 {
        self.max_radial
    }

    /// Radial coordinate projected onto `[0, 1]`; 0 at the origin or pole
    pub fn normalized_radial(&self, node: usize) -> f32 {
        if self.max_radial > 0.0 {
            (self.coords[node].radial / self.max_radial).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// The designated center: grid origin or north pole
    pub fn center(&self) -> SurfacePoint {
        match self.topology {
            Topology::Grid { origin, .. } => SurfacePoint::Grid {
                row: origin.y,
                col: origin.x,
            },
            Topology::Sphere { .. } => SurfacePoint::Sphere(Vec3::Y),
        }
    }

    /// Accept `point` if it matches this surface, otherwise fall back to the center
    pub fn resolve(&self, point: Option<SurfacePoint>) -> SurfacePoint {
        let Some(point) = point else {
            return self.center();
        };
        match (self.topology, point) {
            (Topology::Grid { .. }, SurfacePoint::Grid { row, col })
                if row.is_finite() && col.is_finite() =>
            {
                point
            }
            (Topology::Sphere { .. }, SurfacePoint::Sphere(dir))
                if dir.is_finite() && dir.length_squared() > 0.0 =>
            {
                SurfacePoint::Sphere(dir.normalize())
            }
            _ => {
                warn!("Pulse origin {point:?} does not fit this surface, using center");
                self.center()
            }
        }
    }

    /// Distance from `point` to `node`: Euclidean in grid cells, or great-circle angle
    pub fn distance(&self, point: &SurfacePoint, node: usize) -> f32 {
        match (self.topology, point) {
            (Topology::Grid { size, .. }, SurfacePoint::Grid { row, col }) => {
                (grid_position(node, size) - Vec2::new(*col, *row)).length()
            }
            (Topology::Sphere { .. }, SurfacePoint::Sphere(dir)) => {
                if *dir == Vec3::Y {
                    return self.coords[node].radial;
                }
                let n = self.mesh.base(node);
                // atan2 form stays accurate near 0 and π
                n.cross(*dir).length().atan2(n.dot(*dir))
            }
            _ => self.coords[node].radial,
        }
    }

    /// Write `field` and `color` into the geometry and return the render payload
    pub fn apply<'a>(
        &'a mut self,
        field: &'a [f32],
        color: [f32; 3],
        range: ValueRange,
        time_s: f32,
    ) -> FramePayload<'a> {
        match self.topology {
            Topology::Grid { .. } => self.mesh.deform_planar(field),
            Topology::Sphere {
                base_radius,
                max_displacement,
            } => self
                .mesh
                .deform_spherical(field, base_radius, max_displacement),
        }

        FramePayload {
            vertices: &self.mesh.vertices,
            indices: &self.mesh.indices,
            field,
            dims: self.mesh.dims(),
            color,
            range,
            time_s,
        }
    }
}

/// `(col, row)` of a grid node as a vector
fn grid_position(node: usize, size: usize) -> Vec2 {
    Vec2::new((node % size) as f32, (node / size) as f32)
}
