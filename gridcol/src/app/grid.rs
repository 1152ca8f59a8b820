use crate::config::{Config, GridParams};
use color_eyre::eyre::{eyre, Result};
use nalgebra::Vector3;
use tracing::info;

fn regular_grid(grid: &GridParams) -> Vec<Vector3<f64>> {
    let [nx, ny, nz] = grid.counts;
    let origin = Vector3::from(grid.origin);
    let mut points = Vec::with_capacity(nx * ny * nz);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let step = Vector3::new(
                    i as f64 * grid.spacing[0],
                    j as f64 * grid.spacing[1],
                    k as f64 * grid.spacing[2],
                );
                points.push(origin + step);
            }
        }
    }
    points
}

/// Explicit points followed by the regular grid, if any.
pub fn build_points(config: &Config) -> Result<Vec<Vector3<f64>>> {
    let mut points: Vec<Vector3<f64>> = config.points.iter().map(|p| Vector3::from(*p)).collect();
    if let Some(grid) = &config.grid {
        if grid.spacing.iter().any(|s| !(*s > 0.0)) {
            return Err(eyre!("Grid spacing must be positive, got {:?}", grid.spacing));
        }
        points.extend(regular_grid(grid));
    }
    info!("Grid: {} points", points.len());
    Ok(points)
}
