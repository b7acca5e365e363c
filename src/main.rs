//! Demo application for volsurface-rs:
//! 1. Fetch option contracts for the configured symbol
//! 2. Build the volatility surface and gamma exposure grids
//! 3. Print the options chain and write heatmap PNGs

use std::path::Path;
use tracing::{info, warn};
use volsurface_rs::api::ContractsClient;
use volsurface_rs::config::Config;
use volsurface_rs::error::Result;
use volsurface_rs::surface::{gamma_plane, point_cloud, surface_mesh, SurfaceService};
use volsurface_rs::utils::chain_table::render_chain_table;
use volsurface_rs::utils::plotting::{plot_gamma_heatmap, plot_iv_heatmap};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    info!("Starting volsurface-rs");

    let client = ContractsClient::new(config.api.clone())?;
    let service = SurfaceService::new(config.surface.clone());
    let symbol = config.surface.symbol.clone();

    let now = chrono::Utc::now();
    let ticket = service.begin_refresh();
    let raw = match client
        .fetch_contracts(&symbol, now, config.surface.expiry_range_days)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            service.fail(&format!("Error fetching contracts: {}", e));
            return Err(e);
        }
    };

    let snapshot = service.apply(ticket, &symbol, &raw, now)?;
    info!(
        "Surface built: {} records, spot estimate {:.2}",
        snapshot.records.len(),
        snapshot.spot_estimate
    );

    println!(
        "{}",
        render_chain_table(&snapshot.records, snapshot.spot_estimate, &config.surface)
    );

    let mesh = surface_mesh(&snapshot.iv_grid, &config.surface);
    let plane = gamma_plane(&snapshot.gamma_grid, &config.surface);
    let points = point_cloud(
        &snapshot.records,
        &snapshot.iv_grid,
        snapshot.spot_estimate,
        &config.surface,
    );
    info!(
        "Mapped {} surface vertices, {} gamma cells, {} points",
        mesh.positions.len(),
        plane.positions.len(),
        points.positions.len()
    );

    let output_dir = Path::new("output");
    if !output_dir.exists() {
        std::fs::create_dir(output_dir)?;
    }

    let iv_path = output_dir.join("iv_surface.png");
    plot_iv_heatmap(&snapshot.iv_grid, &symbol, config.surface.color_scheme, &iv_path)?;
    info!("IV heatmap saved to {:?}", iv_path);

    let gamma_path = output_dir.join("gamma_exposure.png");
    plot_gamma_heatmap(
        &snapshot.gamma_grid,
        &symbol,
        config.surface.color_scheme,
        &gamma_path,
    )?;
    info!("Gamma heatmap saved to {:?}", gamma_path);

    if snapshot.records.is_empty() {
        warn!("No contracts survived validation; surface uses default levels");
    }

    info!("Done");
    Ok(())
}
