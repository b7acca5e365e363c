//! Converts dense grids and the flat record list into renderable
//! coordinate/color arrays. This is the boundary the excluded 3D scene and
//! dashboard layers consume; nothing here owns pipeline state.

use crate::config::{ColorScheme, SurfaceConfig};
use crate::models::{display_strike, EnrichedRecord, FilledGrid};

/// Vertical offset of the gamma plane below the IV surface.
const GAMMA_PLANE_BASELINE: f32 = -10.0;

/// Vertex grid in strike-fastest order: index `zi * strike_res + xi`.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub strike_count: usize,
    pub days_count: usize,
}

/// One vertex per raw record.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
}

pub(crate) fn gradient(scheme: ColorScheme) -> colorous::Gradient {
    match scheme {
        ColorScheme::Rainbow => colorous::RAINBOW,
        ColorScheme::Heatmap => colorous::TURBO,
        ColorScheme::Monochrome => colorous::GREYS,
    }
}

fn color_for(scheme: ColorScheme, normalized: f64) -> [f32; 3] {
    let c = gradient(scheme).eval_continuous(normalized.clamp(0.0, 1.0));
    [
        c.r as f32 / 255.0,
        c.g as f32 / 255.0,
        c.b as f32 / 255.0,
    ]
}

/// Normalize into [0, 1]; a flat range divides by 1 instead of 0.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    let divisor = if range != 0.0 { range } else { 1.0 };
    (value - min) / divisor
}

/// Height scale so the maximum IV maps to the configured surface height.
fn vol_scale(max_iv: f64, config: &SurfaceConfig) -> f64 {
    if max_iv > 0.0 {
        config.surface_height / max_iv
    } else {
        1.0
    }
}

/// Map the dense IV grid to a surface mesh: x = display strike, y = scaled
/// IV, z = days to expiry, colored by normalized IV.
pub fn surface_mesh(grid: &FilledGrid, config: &SurfaceConfig) -> SurfaceMesh {
    let (min_iv, max_iv) = grid.iv_range();
    let scale = vol_scale(max_iv, config);
    let strike_count = grid.strike_axis.resolution;
    let days_count = grid.days_axis.resolution;

    let mut positions = Vec::with_capacity(strike_count * days_count);
    let mut colors = Vec::with_capacity(strike_count * days_count);
    for zi in 0..days_count {
        for xi in 0..strike_count {
            let iv = grid.iv[[xi, zi]];
            positions.push([
                grid.strike_axis.value_at(xi) as f32,
                (iv * scale) as f32,
                grid.days_axis.value_at(zi) as f32,
            ]);
            colors.push(color_for(config.color_scheme, normalize(iv, min_iv, max_iv)));
        }
    }

    SurfaceMesh {
        positions,
        colors,
        strike_count,
        days_count,
    }
}

/// Map the dense gamma grid to a flat plane below the surface, colored by
/// normalized gamma exposure.
pub fn gamma_plane(grid: &FilledGrid, config: &SurfaceConfig) -> SurfaceMesh {
    let (min_gamma, max_gamma) = grid.gamma_range();
    let strike_count = grid.strike_axis.resolution;
    let days_count = grid.days_axis.resolution;

    let mut positions = Vec::with_capacity(strike_count * days_count);
    let mut colors = Vec::with_capacity(strike_count * days_count);
    for zi in 0..days_count {
        for xi in 0..strike_count {
            let gamma = grid.gamma[[xi, zi]];
            positions.push([
                grid.strike_axis.value_at(xi) as f32,
                GAMMA_PLANE_BASELINE,
                grid.days_axis.value_at(zi) as f32,
            ]);
            colors.push(color_for(
                config.color_scheme,
                normalize(gamma, min_gamma, max_gamma),
            ));
        }
    }

    SurfaceMesh {
        positions,
        colors,
        strike_count,
        days_count,
    }
}

/// Map raw records to a point cloud at their exact (strike, iv, days)
/// coordinates, sharing the surface's vertical scale.
pub fn point_cloud(
    records: &[EnrichedRecord],
    grid: &FilledGrid,
    spot: f64,
    config: &SurfaceConfig,
) -> PointCloud {
    let mut min_iv = f64::INFINITY;
    let mut max_iv = f64::NEG_INFINITY;
    for r in records {
        min_iv = min_iv.min(r.iv);
        max_iv = max_iv.max(r.iv);
    }
    let (_, grid_max_iv) = grid.iv_range();
    let scale = vol_scale(grid_max_iv, config);

    let mut positions = Vec::with_capacity(records.len());
    let mut colors = Vec::with_capacity(records.len());
    for r in records {
        positions.push([
            display_strike(r.strike, spot, config.normalize_strikes) as f32,
            (r.iv * scale) as f32,
            r.days_to_expiry as f32,
        ]);
        colors.push(color_for(config.color_scheme, normalize(r.iv, min_iv, max_iv)));
    }

    PointCloud { positions, colors }
}
