//! Surface topology and displacement parameters.

use crate::error::{FieldError, FieldResult};

/// Shape and resolution of the deformed surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceShape {
    /// Planar `size × size` node grid
    Grid {
        /// Nodes per side
        size: usize,
        /// Field origin as fractional `[row, col]`; `None` = `(size / 2, size / 2)`
        origin: Option<[f32; 2]>,
    },

    /// Latitude/longitude sphere mesh, pole on +Y
    Sphere {
        /// Latitude subdivisions (pole to pole); yields `rings + 1` node rows
        rings: usize,
        /// Longitude subdivisions; yields `segments + 1` node columns (seam duplicated)
        segments: usize,
    },
}

/// Surface parameters resolved once at engine construction
#[derive(Debug, Clone)]
pub struct SurfaceParams {
    pub shape: SurfaceShape,

    /// Spacing between grid nodes in world units (grid only)
    pub grid_spacing_m: f32,

    /// Undeformed sphere radius in world units (sphere only)
    pub base_radius_m: f32,

    /// Displacement clamp applied to sphere vertices (±, world units)
    pub max_displacement_m: f32,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            shape: SurfaceShape::Grid {
                size: 128,
                origin: None,
            },
            grid_spacing_m: 1.0,
            base_radius_m: 10.0,
            max_displacement_m: 2.0,
        }
    }
}

impl SurfaceParams {
    /// Planar grid with centered origin
    pub fn grid(size: usize) -> Self {
        Self {
            shape: SurfaceShape::Grid { size, origin: None },
            ..Self::default()
        }
    }

    /// Sphere with the given ring/segment resolution
    pub fn sphere(rings: usize, segments: usize) -> Self {
        Self {
            shape: SurfaceShape::Sphere { rings, segments },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FieldResult<()> {
        match self.shape {
            SurfaceShape::Grid { size, origin } => {
                if size == 0 {
                    return Err(FieldError::configuration("grid size must be > 0"));
                }
                if let Some([row, col]) = origin {
                    if !row.is_finite() || !col.is_finite() {
                        return Err(FieldError::configuration(format!(
                            "grid origin must be finite, got ({row}, {col})"
                        )));
                    }
                }
                if !(self.grid_spacing_m > 0.0) {
                    return Err(FieldError::configuration(format!(
                        "grid spacing must be > 0, got {}",
                        self.grid_spacing_m
                    )));
                }
            }
            SurfaceShape::Sphere { rings, segments } => {
                if rings < 2 || segments < 3 {
                    return Err(FieldError::configuration(format!(
                        "sphere needs rings >= 2 and segments >= 3, got {rings}x{segments}"
                    )));
                }
                if !(self.base_radius_m > 0.0) {
                    return Err(FieldError::configuration(format!(
                        "sphere base radius must be > 0, got {}",
                        self.base_radius_m
                    )));
                }
                if !(self.max_displacement_m >= 0.0) {
                    return Err(FieldError::configuration(format!(
                        "max displacement must be >= 0, got {}",
                        self.max_displacement_m
                    )));
                }
            }
        }
        Ok(())
    }
}
