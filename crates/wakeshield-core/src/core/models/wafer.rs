use super::error::{ConfigError, require_positive};
use nalgebra::{Point3, Vector2};
use std::f64::consts::PI;

pub const DEFAULT_GRID_SHAPE: (usize, usize) = (50, 50);

/// Circular sensor plane parallel to XY, located behind the shield.
///
/// The wafer only describes geometry. The hit-count buffer belongs to the tracer so that a
/// scene can be shared read-only across batches.
#[derive(Debug, Clone, PartialEq)]
pub struct WaferPlane {
    radius: f64,
    z_offset: f64,
    xy_offset: Vector2<f64>,
    grid_shape: (usize, usize),
}

impl WaferPlane {
    /// `z_offset` is signed with negative values downstream of the shield apex.
    /// `grid_shape` is `(rows, cols)`.
    pub fn new(
        radius: f64,
        z_offset: f64,
        xy_offset: Vector2<f64>,
        grid_shape: (usize, usize),
    ) -> Result<Self, ConfigError> {
        let radius = require_positive("wafer.radius", radius)?;
        if !z_offset.is_finite() {
            return Err(ConfigError::invalid(
                "wafer.z_offset",
                format!("expected a finite number, got {}", z_offset),
            ));
        }
        if !(xy_offset.x.is_finite() && xy_offset.y.is_finite()) {
            return Err(ConfigError::invalid(
                "wafer.xy_offset",
                "offset components must be finite",
            ));
        }
        if grid_shape.0 == 0 || grid_shape.1 == 0 {
            return Err(ConfigError::invalid(
                "wafer.grid_shape",
                format!(
                    "grid must have at least one row and column, got {}x{}",
                    grid_shape.0, grid_shape.1
                ),
            ));
        }
        Ok(Self {
            radius,
            z_offset,
            xy_offset,
            grid_shape,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn z_offset(&self) -> f64 {
        self.z_offset
    }

    pub fn xy_offset(&self) -> Vector2<f64> {
        self.xy_offset
    }

    pub fn grid_shape(&self) -> (usize, usize) {
        self.grid_shape
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::new(self.xy_offset.x, self.xy_offset.y, self.z_offset)
    }

    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_combines_xy_offset_and_z_offset() {
        let wafer = WaferPlane::new(0.1, -0.5, Vector2::new(0.02, -0.03), (10, 20)).unwrap();
        assert_eq!(wafer.center(), Point3::new(0.02, -0.03, -0.5));
        assert_eq!(wafer.grid_shape(), (10, 20));
    }

    #[test]
    fn new_rejects_empty_grid() {
        let result = WaferPlane::new(0.1, -0.5, Vector2::zeros(), (0, 50));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "wafer.grid_shape",
                ..
            })
        ));
    }

    #[test]
    fn new_rejects_non_positive_radius() {
        assert!(WaferPlane::new(0.0, -0.5, Vector2::zeros(), DEFAULT_GRID_SHAPE).is_err());
        assert!(WaferPlane::new(-1.0, -0.5, Vector2::zeros(), DEFAULT_GRID_SHAPE).is_err());
    }

    #[test]
    fn new_rejects_non_finite_offsets() {
        assert!(WaferPlane::new(0.1, f64::NAN, Vector2::zeros(), DEFAULT_GRID_SHAPE).is_err());
        assert!(
            WaferPlane::new(0.1, -0.5, Vector2::new(f64::INFINITY, 0.0), DEFAULT_GRID_SHAPE)
                .is_err()
        );
    }
}
