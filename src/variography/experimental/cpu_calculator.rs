use std::collections::BTreeMap;

use crate::error::VariogramError;
use crate::spatial_database::coordinate_system::GridSpacing;
use crate::spatial_database::gridded_databases::{
    incomplete_grid::InCompleteGriddedDataBase, GriddedDataBaseInterface,
};

use super::{IsotropicBin, LagVariogramCalculator, RawAnisotropicVariogram, RawLagRecord};

use itertools::{izip, Itertools};
use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// Resolution at which two lag lengths count as the same isotropic distance.
const DISTANCE_RESOLUTION: f64 = 1e-9;

/// Brute force lag variogram over every populated cell of the grid.
///
/// Lags are evaluated in parallel; output order is row lag then column lag.
#[derive(Clone, Debug, Default)]
pub struct CPUCalculator;

impl CPUCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Half-plane (row, col) lags with physical length at most `radius`.
    ///
    /// Row lag 0 only takes positive column lags, `(0, -c)` holds the same
    /// pairs as `(0, c)`.
    fn lags(shape: [usize; 2], radius: f64, spacing: &GridSpacing) -> Vec<(usize, isize)> {
        let max_row = ((radius / spacing.x).floor() as usize).min(shape[0].saturating_sub(1));
        let max_col =
            ((radius / spacing.y).floor() as usize).min(shape[1].saturating_sub(1)) as isize;

        (0..=max_row)
            .cartesian_product(-max_col..=max_col)
            .filter(|&(row, col)| row > 0 || col > 0)
            .filter(|&(row, col)| {
                spacing.lag_distance(row as isize, col) <= radius * (1.0 + DISTANCE_RESOLUTION)
            })
            .collect()
    }
}

impl LagVariogramCalculator for CPUCalculator {
    fn compute(
        &self,
        grid: &InCompleteGriddedDataBase<f64>,
        radius: f64,
        dx: f64,
        dy: f64,
    ) -> Result<RawAnisotropicVariogram, VariogramError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(VariogramError::invalid_input(format!(
                "radius must be positive, found {radius}"
            )));
        }
        if !(dx.is_finite() && dx > 0.0 && dy.is_finite() && dy > 0.0) {
            return Err(VariogramError::invalid_input(format!(
                "grid spacing must be positive, found ({dx}, {dy})"
            )));
        }

        let spacing = GridSpacing::new(dx, dy);
        let lags = Self::lags(grid.shape(), radius, &spacing);
        let (values, inds) = grid.data_and_inds();

        debug!(
            "CPUCalculator: {} lags within radius {} over {} populated cells",
            lags.len(),
            radius,
            values.len()
        );

        //sum of squared differences and pair count per lag
        let sums = lags
            .par_iter()
            .map(|&(row_lag, col_lag)| {
                let mut count = 0u64;
                let mut sum_sq = 0f64;

                for (value, ind) in izip!(values.iter(), inds.iter()) {
                    let Some(pair_ind) = grid.offset_ind(*ind, [row_lag as isize, col_lag]) else {
                        continue;
                    };
                    let Some(pair_value) = grid.data_at_ind(&pair_ind) else {
                        continue;
                    };

                    count += 1;
                    sum_sq += (value - pair_value) * (value - pair_value);
                }

                (sum_sq, count)
            })
            .collect::<Vec<_>>();

        let records = izip!(lags.iter(), sums.iter())
            .map(|(&(row_lag, col_lag), &(sum_sq, count))| RawLagRecord {
                row_lag,
                col_lag,
                mean_sq_diff: (count > 0).then(|| sum_sq / count as f64),
                pair_count: count,
            })
            .collect::<Vec<_>>();

        //pool lags of equal length
        let scale = dx.min(dy);
        let mut bins: BTreeMap<i64, (f64, f64, u64)> = BTreeMap::new();
        for (&(row_lag, col_lag), &(sum_sq, count)) in izip!(lags.iter(), sums.iter()) {
            let distance = spacing.lag_distance(row_lag as isize, col_lag);
            let key = (distance / (scale * DISTANCE_RESOLUTION)).round() as i64;
            let bin = bins.entry(key).or_insert((distance, 0.0, 0));
            bin.1 += sum_sq;
            bin.2 += count;
        }

        let isotropic = bins
            .into_values()
            .map(|(distance, sum_sq, count)| IsotropicBin {
                distance,
                mean_sq_diff: (count > 0).then(|| sum_sq / count as f64),
                pair_count: count,
            })
            .collect();

        Ok(RawAnisotropicVariogram {
            grid_spacing: spacing,
            records,
            isotropic,
        })
    }
}
