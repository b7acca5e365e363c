//! Maps the flat record list onto fixed-resolution (strike, days) grids.

use crate::config::SurfaceConfig;
use crate::models::{display_strike, EnrichedRecord, GridAxis, SurfaceGrid};
use tracing::debug;

/// Parallel sparse grids produced from one record list.
#[derive(Debug, Clone)]
pub struct BinnedGrids {
    pub iv: SurfaceGrid,
    pub gamma: SurfaceGrid,
}

/// Observed value ranges padded 5% beyond the extremes and rounded outward
/// to whole units; the days axis never dips below zero. With no records the
/// axes collapse to unit ranges and the interpolator's global fallback
/// produces the default grid.
fn axis_ranges(records: &[EnrichedRecord], spot: f64, config: &SurfaceConfig) -> (GridAxis, GridAxis) {
    if records.is_empty() {
        return (
            GridAxis::new(0.0, 1.0, config.strike_resolution),
            GridAxis::new(0.0, 1.0, config.days_resolution),
        );
    }

    let mut min_strike = f64::INFINITY;
    let mut max_strike = f64::NEG_INFINITY;
    let mut min_days = f64::INFINITY;
    let mut max_days = f64::NEG_INFINITY;
    for r in records {
        let k = display_strike(r.strike, spot, config.normalize_strikes);
        min_strike = min_strike.min(k);
        max_strike = max_strike.max(k);
        min_days = min_days.min(r.days_to_expiry);
        max_days = max_days.max(r.days_to_expiry);
    }

    let strike_range = max_strike - min_strike;
    let days_range = max_days - min_days;
    let strike_axis = GridAxis::new(
        (min_strike - strike_range * 0.05).floor(),
        (max_strike + strike_range * 0.05).ceil(),
        config.strike_resolution,
    );
    let days_axis = GridAxis::new(
        (min_days - days_range * 0.05).floor().max(0.0),
        (max_days + days_range * 0.05).ceil(),
        config.days_resolution,
    );
    (strike_axis, days_axis)
}

/// Bin records into parallel IV and gamma grids.
///
/// Each populated cell holds the arithmetic mean of every record landing in
/// its bucket, maintained incrementally so insertion order is irrelevant.
/// Strikes are consumed in display space: normalization (when enabled and a
/// spot estimate exists) happens before bucketing.
pub fn bin_records(
    records: &[EnrichedRecord],
    spot: f64,
    config: &SurfaceConfig,
) -> BinnedGrids {
    let (strike_axis, days_axis) = axis_ranges(records, spot, config);
    debug!(
        "Binning {} records onto {}x{} grid, strikes [{:.1}, {:.1}], days [{:.1}, {:.1}]",
        records.len(),
        strike_axis.resolution,
        days_axis.resolution,
        strike_axis.min,
        strike_axis.max,
        days_axis.min,
        days_axis.max,
    );

    let mut iv = SurfaceGrid::new(strike_axis, days_axis);
    let mut gamma = SurfaceGrid::new(strike_axis, days_axis);

    for r in records {
        let k = display_strike(r.strike, spot, config.normalize_strikes);
        iv.push_iv(k, r.days_to_expiry, r.iv);
        gamma.push_gamma(k, r.days_to_expiry, r.gamma_exposure);
    }

    BinnedGrids { iv, gamma }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionType;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn record(strike: f64, days: f64, iv: f64, gamma: f64) -> EnrichedRecord {
        EnrichedRecord {
            ticker: "TEST".into(),
            contract_type: OptionType::Call,
            strike,
            expiration: NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            days_to_expiry: days,
            iv,
            gamma_exposure: gamma,
            delta: 0.5,
            theta: -0.01,
            vega: 0.02,
            bid: 1.0,
            ask: 1.1,
            last: 1.05,
            open_interest: 100,
            volume: 10,
            moneyness: 0.0,
        }
    }

    #[test]
    fn record_at_minimum_corner_lands_in_origin_bucket() {
        let cfg = SurfaceConfig::default();
        let records = vec![record(100.0, 10.0, 0.3, 5.0)];
        let grids = bin_records(&records, 100.0, &cfg);
        // Degenerate single-record ranges get no padding, only rounding.
        let (i, j) = grids.iv.bucket(100.0, 10.0);
        assert_eq!((i, j), (0, 0));
        assert!(grids.iv.cells[[0, 0]].is_some());
    }

    #[test]
    fn cell_mean_is_arithmetic_mean_in_any_order() {
        let cfg = SurfaceConfig::default();
        // All strikes collapse into a tiny range so several records share
        // buckets; reversing the list must not change any cell.
        let records: Vec<_> = (0..12)
            .map(|i| record(100.0 + (i % 3) as f64 * 0.01, 30.0, 0.2 + i as f64 * 0.01, 1.0))
            .collect();
        let reversed: Vec<_> = records.iter().rev().cloned().collect();

        let a = bin_records(&records, 100.0, &cfg);
        let b = bin_records(&reversed, 100.0, &cfg);
        for (ca, cb) in a.iv.cells.iter().zip(b.iv.cells.iter()) {
            match (ca, cb) {
                (Some(x), Some(y)) => {
                    assert_relative_eq!(x.iv.unwrap(), y.iv.unwrap(), max_relative = 1e-12);
                    assert_eq!(x.iv_samples, y.iv_samples);
                }
                (None, None) => {}
                _ => panic!("grids binned from permuted input differ in occupancy"),
            }
        }
    }

    #[test]
    fn ranges_are_padded_and_days_clamped_at_zero() {
        let cfg = SurfaceConfig::default();
        let records = vec![record(90.0, 1.0, 0.3, 5.0), record(110.0, 60.0, 0.35, 6.0)];
        let grids = bin_records(&records, 100.0, &cfg);
        assert_relative_eq!(grids.iv.strike_axis.min, 89.0); // floor(90 - 1.0)
        assert_relative_eq!(grids.iv.strike_axis.max, 111.0);
        assert!(grids.iv.days_axis.min >= 0.0);
        assert_relative_eq!(grids.iv.days_axis.max, 63.0); // ceil(60 + 2.95)
    }

    #[test]
    fn normalized_strikes_are_binned_in_display_space() {
        let cfg = SurfaceConfig {
            normalize_strikes: true,
            ..SurfaceConfig::default()
        };
        let records = vec![record(50.0, 30.0, 0.3, 5.0), record(200.0, 30.0, 0.4, 6.0)];
        let grids = bin_records(&records, 100.0, &cfg);
        // Display strikes are 50 and 200 rebased to 50% and 200% of spot.
        assert_relative_eq!(grids.iv.strike_axis.min, (50.0f64 - 150.0 * 0.05).floor());
        assert_relative_eq!(grids.iv.strike_axis.max, (200.0f64 + 150.0 * 0.05).ceil());
    }

    #[test]
    fn empty_record_list_yields_unit_axes() {
        let cfg = SurfaceConfig::default();
        let grids = bin_records(&[], 100.0, &cfg);
        assert_relative_eq!(grids.iv.strike_axis.min, 0.0);
        assert_relative_eq!(grids.iv.strike_axis.max, 1.0);
        assert!(grids.iv.cells.iter().all(|c| c.is_none()));
    }
}
