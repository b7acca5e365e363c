//! Fixed-resolution surface grids.
//!
//! `SurfaceGrid` is the sparse accumulator the binner fills; `FilledGrid` is
//! the dense result the interpolator guarantees, with every cell defined.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One grid axis: value range, per-bucket step and bucket count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridAxis {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub resolution: usize,
}

impl GridAxis {
    /// Build an axis over `[min, max]` with `resolution` buckets. A zero
    /// range would make the step divisor zero, so 1 is substituted.
    ///
    /// Panics if `resolution < 2`: fewer buckets make the step divisor
    /// degenerate, and config validation rejects such resolutions before
    /// any axis is built.
    pub fn new(min: f64, max: f64, resolution: usize) -> Self {
        assert!(resolution >= 2, "grid axis needs at least 2 buckets");
        let range = max - min;
        let step = if range > 0.0 {
            range / (resolution - 1) as f64
        } else {
            1.0
        };
        Self {
            min,
            max,
            step,
            resolution,
        }
    }

    /// Bucket index for a continuous value, clamped to `[0, resolution-1]`.
    pub fn bucket(&self, value: f64) -> usize {
        let idx = ((value - self.min) / self.step).floor();
        if idx < 0.0 {
            0
        } else {
            (idx as usize).min(self.resolution - 1)
        }
    }

    /// Continuous axis value at the low edge of bucket `i`.
    pub fn value_at(&self, i: usize) -> f64 {
        self.min + i as f64 * self.step
    }
}

/// Aggregate of every record landing in one bucket. Either field may be
/// absent in a sparse grid; each field carries its own contribution count
/// so mixed pushes into one cell keep both running means exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub iv: Option<f64>,
    pub iv_samples: u32,
    pub gamma: Option<f64>,
    pub gamma_samples: u32,
}

impl GridCell {
    fn push(mean: &mut Option<f64>, count: u32, value: f64) {
        *mean = Some(match *mean {
            Some(m) => (m * count as f64 + value) / (count + 1) as f64,
            None => value,
        });
    }
}

/// Sparse 2D grid over (strike, days-to-expiry). Dimensions are fixed at
/// construction; `None` cells have seen no records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub cells: Array2<Option<GridCell>>,
    pub strike_axis: GridAxis,
    pub days_axis: GridAxis,
}

impl SurfaceGrid {
    pub fn new(strike_axis: GridAxis, days_axis: GridAxis) -> Self {
        Self {
            cells: Array2::from_elem((strike_axis.resolution, days_axis.resolution), None),
            strike_axis,
            days_axis,
        }
    }

    /// Fold an IV observation into the bucket for `(display_strike, days)`.
    /// The stored value stays the arithmetic mean of every contribution
    /// regardless of arrival order.
    pub fn push_iv(&mut self, display_strike: f64, days: f64, iv: f64) {
        let (i, j) = self.bucket(display_strike, days);
        let cell = self.cells[[i, j]].get_or_insert_with(GridCell::default);
        GridCell::push(&mut cell.iv, cell.iv_samples, iv);
        cell.iv_samples += 1;
    }

    /// Fold a gamma observation into the bucket for `(display_strike, days)`.
    pub fn push_gamma(&mut self, display_strike: f64, days: f64, gamma: f64) {
        let (i, j) = self.bucket(display_strike, days);
        let cell = self.cells[[i, j]].get_or_insert_with(GridCell::default);
        GridCell::push(&mut cell.gamma, cell.gamma_samples, gamma);
        cell.gamma_samples += 1;
    }

    pub fn bucket(&self, display_strike: f64, days: f64) -> (usize, usize) {
        (self.strike_axis.bucket(display_strike), self.days_axis.bucket(days))
    }
}

/// Dense grid: every bucket carries a defined iv and gamma. Produced only by
/// the interpolator, so holes cannot reach the coordinate mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilledGrid {
    pub iv: Array2<f64>,
    pub gamma: Array2<f64>,
    pub strike_axis: GridAxis,
    pub days_axis: GridAxis,
}

impl FilledGrid {
    pub fn iv_range(&self) -> (f64, f64) {
        value_range(&self.iv)
    }

    pub fn gamma_range(&self) -> (f64, f64) {
        value_range(&self.gamma)
    }
}

fn value_range(values: &Array2<f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bucket_indices_clamp_to_grid() {
        let axis = GridAxis::new(90.0, 110.0, 5);
        assert_eq!(axis.bucket(90.0), 0);
        assert_eq!(axis.bucket(89.0), 0);
        assert_eq!(axis.bucket(110.0), 4);
        assert_eq!(axis.bucket(500.0), 4);
    }

    #[test]
    fn zero_range_axis_substitutes_unit_step() {
        let axis = GridAxis::new(100.0, 100.0, 50);
        assert_relative_eq!(axis.step, 1.0);
        assert_eq!(axis.bucket(100.0), 0);
    }

    #[test]
    fn running_mean_is_order_independent() {
        let axis = GridAxis::new(0.0, 1.0, 2);
        let values = [0.25, 0.31, 0.4, 0.22];
        let mut forward = SurfaceGrid::new(axis, axis);
        let mut reverse = SurfaceGrid::new(axis, axis);
        for &v in &values {
            forward.push_iv(0.0, 0.0, v);
        }
        for &v in values.iter().rev() {
            reverse.push_iv(0.0, 0.0, v);
        }
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        let f = forward.cells[[0, 0]].unwrap();
        let r = reverse.cells[[0, 0]].unwrap();
        assert_relative_eq!(f.iv.unwrap(), expected, max_relative = 1e-12);
        assert_relative_eq!(r.iv.unwrap(), expected, max_relative = 1e-12);
        assert_eq!(f.iv_samples, 4);
    }

    #[test]
    fn mixed_pushes_into_one_cell_keep_both_means_exact() {
        let axis = GridAxis::new(0.0, 1.0, 2);
        let mut grid = SurfaceGrid::new(axis, axis);
        grid.push_iv(0.0, 0.0, 0.2);
        grid.push_gamma(0.0, 0.0, 10.0);
        grid.push_iv(0.0, 0.0, 0.4);
        grid.push_gamma(0.0, 0.0, 20.0);
        let cell = grid.cells[[0, 0]].unwrap();
        assert_relative_eq!(cell.iv.unwrap(), 0.3, max_relative = 1e-12);
        assert_relative_eq!(cell.gamma.unwrap(), 15.0, max_relative = 1e-12);
        assert_eq!(cell.iv_samples, 2);
        assert_eq!(cell.gamma_samples, 2);
    }

    #[test]
    #[should_panic(expected = "at least 2 buckets")]
    fn single_bucket_axis_is_rejected() {
        GridAxis::new(0.0, 1.0, 1);
    }
}
