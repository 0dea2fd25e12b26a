use crate::core::geometry::{disk_contains, plane_intersection};
use crate::core::models::wafer::WaferPlane;
use nalgebra::{DMatrix, Point3, Vector3};

/// Row-major `rows x cols` tally of wafer impacts.
///
/// Under unweighted binning every cell holds a whole number of hits. Counts never decrease
/// between resets.
#[derive(Debug, Clone, PartialEq)]
pub struct HitGrid {
    cells: DMatrix<f64>,
}

impl HitGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: DMatrix::zeros(rows, cols),
        }
    }

    pub fn for_wafer(wafer: &WaferPlane) -> Self {
        let (rows, cols) = wafer.grid_shape();
        Self::new(rows, cols)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.shape()
    }

    pub fn reset(&mut self) {
        self.cells.fill(0.0);
    }

    /// Adds `weight` (non-negative) to the cell at `(row, col)`.
    pub fn increment(&mut self, row: usize, col: usize, weight: f64) {
        self.cells[(row, col)] += weight.max(0.0);
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[(row, col)]
    }

    pub fn total(&self) -> f64 {
        self.cells.sum()
    }

    /// Owned copy of the current counts.
    pub fn snapshot(&self) -> DMatrix<f64> {
        self.cells.clone()
    }

    /// The cell containing the wafer centre.
    pub fn center_cell(&self) -> (usize, usize) {
        let (rows, cols) = self.shape();
        (rows / 2, cols / 2)
    }

    /// Cell values in row-major order, rounded to whole counts.
    pub fn counts_u32(&self) -> Vec<u32> {
        row_major_counts(&self.cells)
    }
}

/// Flattens a grid snapshot to whole counts in row-major order.
pub fn row_major_counts(cells: &DMatrix<f64>) -> Vec<u32> {
    let (rows, cols) = cells.shape();
    let mut out = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            out.push(cells[(row, col)].round().max(0.0) as u32);
        }
    }
    out
}

/// A ray that crossed the wafer plane inside the wafer disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaferImpact {
    pub point: Point3<f64>,
    /// Cosine between the ray and the wafer's upstream-facing normal, clamped at zero.
    pub cos_incidence: f64,
}

/// Wafer hit testing and cell mapping for one wafer.
#[derive(Debug, Clone, Copy)]
pub struct WaferAccumulator<'a> {
    wafer: &'a WaferPlane,
}

impl<'a> WaferAccumulator<'a> {
    pub fn new(wafer: &'a WaferPlane) -> Self {
        Self { wafer }
    }

    pub fn test(&self, origin: &Point3<f64>, dir: &Vector3<f64>) -> Option<WaferImpact> {
        let point = plane_intersection(origin, dir, self.wafer.z_offset())?;
        if !disk_contains(&point, &self.wafer.center(), self.wafer.radius()) {
            return None;
        }
        Some(WaferImpact {
            point,
            cos_incidence: (-dir.z).max(0.0),
        })
    }

    /// `(row, col)` of the cell containing `point`, clipped to the grid.
    pub fn bin(&self, point: &Point3<f64>) -> (usize, usize) {
        let (rows, cols) = self.wafer.grid_shape();
        let center = self.wafer.center();
        let radius = self.wafer.radius();
        let u = ((point.x - center.x) / radius + 1.0) / 2.0;
        let v = ((point.y - center.y) / radius + 1.0) / 2.0;
        (cell_index(v, rows), cell_index(u, cols))
    }
}

#[inline]
fn cell_index(fraction: f64, cells: usize) -> usize {
    let scaled = (fraction * cells as f64).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(cells - 1)
    }
}
