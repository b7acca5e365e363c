use crate::config::ColorScheme;
use crate::error::{Result, SurfaceError};
use crate::models::{FilledGrid, GridAxis};
use crate::surface::mapper::gradient;
use plotters::backend::BitMapBackend;
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 900;

/// Render the IV grid as a 2D heatmap PNG.
pub fn plot_iv_heatmap<P: AsRef<Path>>(
    grid: &FilledGrid,
    symbol: &str,
    scheme: ColorScheme,
    output_path: P,
) -> Result<()> {
    let (min, max) = grid.iv_range();
    plot_heatmap(
        &grid.iv,
        &grid.strike_axis,
        &grid.days_axis,
        min,
        max,
        &format!("{} Implied Volatility Surface", symbol),
        "IV",
        scheme,
        output_path.as_ref(),
    )
}

/// Render the gamma exposure grid as a 2D heatmap PNG.
pub fn plot_gamma_heatmap<P: AsRef<Path>>(
    grid: &FilledGrid,
    symbol: &str,
    scheme: ColorScheme,
    output_path: P,
) -> Result<()> {
    let (min, max) = grid.gamma_range();
    plot_heatmap(
        &grid.gamma,
        &grid.strike_axis,
        &grid.days_axis,
        min,
        max,
        &format!("{} Gamma Exposure", symbol),
        "GEX",
        scheme,
        output_path.as_ref(),
    )
}

/// Half-open bucket rectangle centered on the bucket's low-edge value.
fn cell_bounds(axis: &GridAxis, i: usize) -> (f64, f64) {
    let center = axis.value_at(i);
    (center - 0.5 * axis.step, center + 0.5 * axis.step)
}

/// Color-bar range guarded against a flat grid.
fn color_span(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span != 0.0 {
        span
    } else {
        1.0
    }
}

#[allow(clippy::too_many_arguments)]
fn plot_heatmap(
    values: &ndarray::Array2<f64>,
    strike_axis: &GridAxis,
    days_axis: &GridAxis,
    min_value: f64,
    max_value: f64,
    title: &str,
    value_label: &str,
    scheme: ColorScheme,
    output_path: &Path,
) -> Result<()> {
    let span = color_span(min_value, max_value);
    let color_gradient = gradient(scheme);

    let x_min = strike_axis.min - 0.5 * strike_axis.step;
    let x_max = strike_axis.max + 0.5 * strike_axis.step;
    let y_min = (days_axis.min - 0.5 * days_axis.step).max(0.0);
    let y_max = days_axis.max + 0.5 * days_axis.step;

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| SurfaceError::RenderError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| SurfaceError::RenderError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Strike")
        .y_desc("Days to Expiration")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(|e| SurfaceError::RenderError(e.to_string()))?;

    for xi in 0..strike_axis.resolution {
        for zi in 0..days_axis.resolution {
            let value = values[[xi, zi]];
            let normalized = ((value - min_value) / span).clamp(0.0, 1.0);
            let color = color_gradient.eval_continuous(normalized);
            let rgb = RGBColor(color.r, color.g, color.b);
            let (x0, x1) = cell_bounds(strike_axis, xi);
            let (y0, y1) = cell_bounds(days_axis, zi);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0.max(0.0)), (x1, y1)],
                    rgb.filled(),
                )))
                .map_err(|e| SurfaceError::RenderError(e.to_string()))?;
        }
    }

    let color_bar_width = 20;
    let color_bar_height = 400;
    let color_bar_x = (WIDTH - 120) as i32;
    let color_bar_y = 100;

    for i in 0..color_bar_height {
        let normalized_pos = 1.0 - (i as f64 / color_bar_height as f64);
        let color = color_gradient.eval_continuous(normalized_pos);
        let rgb = RGBColor(color.r, color.g, color.b);
        root.draw(&Rectangle::new(
            [
                (color_bar_x, color_bar_y + i),
                (color_bar_x + color_bar_width, color_bar_y + i + 1),
            ],
            rgb.filled(),
        ))
        .map_err(|e| SurfaceError::RenderError(e.to_string()))?;
    }

    let label_style = TextStyle::from(("sans-serif", 12)).color(&BLACK);
    root.draw_text(
        &format!("{:.4}", max_value),
        &label_style,
        (color_bar_x + color_bar_width + 5, color_bar_y),
    )
    .map_err(|e| SurfaceError::RenderError(e.to_string()))?;
    root.draw_text(
        &format!("{:.4}", min_value),
        &label_style,
        (
            color_bar_x + color_bar_width + 5,
            color_bar_y + color_bar_height,
        ),
    )
    .map_err(|e| SurfaceError::RenderError(e.to_string()))?;
    root.draw_text(
        value_label,
        &label_style,
        (
            color_bar_x + color_bar_width + 5,
            color_bar_y + color_bar_height / 2,
        ),
    )
    .map_err(|e| SurfaceError::RenderError(e.to_string()))?;

    root.present()
        .map_err(|e| SurfaceError::RenderError(e.to_string()))?;
    Ok(())
}
