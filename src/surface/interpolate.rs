//! Fills empty grid cells so no hole ever reaches the coordinate mapper.
//!
//! Pass 1 averages populated neighbors in a 5x5 window with inverse
//! Manhattan-distance weights, reading only a snapshot of the sparse grid so
//! a pass never observes its own fills. Pass 2 patches whatever is left with
//! the global averages.

use crate::models::{FilledGrid, GridCell, SurfaceGrid};
use tracing::debug;

/// Defaults when the entire grid carries no defined value at all.
const DEFAULT_IV: f64 = 0.3;
const DEFAULT_GAMMA: f64 = 0.01;

/// Interpolate a sparse grid into a dense one. Every cell of the result has
/// both iv and gamma defined.
pub fn fill(mut grid: SurfaceGrid) -> FilledGrid {
    let (rows, cols) = grid.cells.dim();

    // Pass 1: local neighborhood fill. Neighbors come from the untouched
    // snapshot; writes go to the working grid.
    let snapshot = grid.cells.clone();
    let mut filled = 0usize;
    for i in 0..rows {
        for j in 0..cols {
            if snapshot[[i, j]].is_some() {
                continue;
            }
            let mut iv_sum = 0.0;
            let mut gamma_sum = 0.0;
            let mut weight_sum = 0.0;
            let mut saw_iv = false;
            let mut saw_gamma = false;
            for di in -2i64..=2 {
                for dj in -2i64..=2 {
                    if di == 0 && dj == 0 {
                        continue;
                    }
                    let ni = i as i64 + di;
                    let nj = j as i64 + dj;
                    if ni < 0 || ni >= rows as i64 || nj < 0 || nj >= cols as i64 {
                        continue;
                    }
                    let Some(neighbor) = snapshot[[ni as usize, nj as usize]] else {
                        continue;
                    };
                    // Closer neighbors get higher weight; equal Manhattan
                    // distance means equal weight.
                    let weight = 1.0 / (di.abs() + dj.abs()) as f64;
                    if let Some(iv) = neighbor.iv {
                        iv_sum += iv * weight;
                        saw_iv = true;
                    }
                    if let Some(gamma) = neighbor.gamma {
                        gamma_sum += gamma * weight;
                        saw_gamma = true;
                    }
                    weight_sum += weight;
                }
            }
            if weight_sum > 0.0 {
                grid.cells[[i, j]] = Some(GridCell {
                    iv: saw_iv.then(|| iv_sum / weight_sum),
                    iv_samples: saw_iv as u32,
                    gamma: saw_gamma.then(|| gamma_sum / weight_sum),
                    gamma_samples: saw_gamma as u32,
                });
                filled += 1;
            }
        }
    }

    // Pass 2: global-average fallback for cells no neighborhood reached,
    // and for cells with only one of the two fields defined.
    let mut iv_sum = 0.0;
    let mut iv_count = 0usize;
    let mut gamma_sum = 0.0;
    let mut gamma_count = 0usize;
    for cell in grid.cells.iter().flatten() {
        if let Some(iv) = cell.iv {
            iv_sum += iv;
            iv_count += 1;
        }
        if let Some(gamma) = cell.gamma {
            gamma_sum += gamma;
            gamma_count += 1;
        }
    }
    let avg_iv = if iv_count > 0 { iv_sum / iv_count as f64 } else { DEFAULT_IV };
    let avg_gamma = if gamma_count > 0 {
        gamma_sum / gamma_count as f64
    } else {
        DEFAULT_GAMMA
    };
    debug!(
        "Interpolation: {} cells filled locally, global means iv={:.4} gamma={:.4}",
        filled, avg_iv, avg_gamma
    );

    let mut iv = ndarray::Array2::zeros((rows, cols));
    let mut gamma = ndarray::Array2::zeros((rows, cols));
    for i in 0..rows {
        for j in 0..cols {
            let cell = grid.cells[[i, j]].unwrap_or_default();
            iv[[i, j]] = cell.iv.unwrap_or(avg_iv);
            gamma[[i, j]] = cell.gamma.unwrap_or(avg_gamma);
        }
    }

    FilledGrid {
        iv,
        gamma,
        strike_axis: grid.strike_axis,
        days_axis: grid.days_axis,
    }
}
