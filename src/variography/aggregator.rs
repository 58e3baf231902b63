//! Derivation of the isotropic, heat and surface representations from one raw
//! lag variogram.
use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;

use crate::{
    config::VariogramConfig,
    error::VariogramError,
    spatial_database::gridded_databases::{
        incomplete_grid::InCompleteGriddedDataBase, GriddedDataBaseInterface,
    },
};

use super::{
    experimental::{LagVariogramCalculator, RawAnisotropicVariogram, RawLagRecord},
    representations::{
        AnisotropicRow, AnisotropicVariogram, HeatCell, HeatVariogram, IsotropicVariogram,
        Variogram,
    },
    surface::SurfaceMesh,
};

/// How a mean treats missing members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValues {
    /// Average the present members only.
    #[default]
    Ignore,
    /// Any missing member makes the mean missing.
    Propagate,
}

impl MissingValues {
    /// Mean of `values`, `None` if no member is present (or, when propagating,
    /// if any member is missing).
    pub fn mean<I>(self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut sum = 0f64;
        let mut n = 0usize;
        for value in values {
            match (value, self) {
                (Some(v), _) => {
                    sum += v;
                    n += 1;
                }
                (None, MissingValues::Ignore) => {}
                (None, MissingValues::Propagate) => return None,
            }
        }
        (n > 0).then(|| sum / n as f64)
    }
}

/// Fold the raw records onto absolute lags.
///
/// Records sharing `(row_lag, |col_lag|)` are merged: the mean squared
/// difference is the mean over the members, the pair count is their sum.
pub fn fold_quadrants(raw: &RawAnisotropicVariogram, missing: MissingValues) -> HeatVariogram {
    let mut groups: BTreeMap<(usize, usize), Vec<&RawLagRecord>> = BTreeMap::new();
    for record in raw.records.iter() {
        groups
            .entry((record.row_lag, record.col_lag.unsigned_abs()))
            .or_default()
            .push(record);
    }

    let spacing = raw.grid_spacing;
    let cells = groups
        .into_iter()
        .map(|((row_lag, col_lag), members)| HeatCell {
            row_lag,
            col_lag,
            x: row_lag as f64 * spacing.x,
            y: col_lag as f64 * spacing.y,
            mean_sq_diff: missing.mean(members.iter().map(|m| m.mean_sq_diff)),
            pair_count: members.iter().map(|m| m.pair_count).sum(),
            members: members.len(),
        })
        .collect();

    HeatVariogram { cells }
}

/// Raw records re-expressed in physical units.
pub fn anisotropic(raw: &RawAnisotropicVariogram) -> AnisotropicVariogram {
    let spacing = raw.grid_spacing;
    let rows = raw
        .records
        .iter()
        .map(|r| {
            let [x, y] = spacing.lag_to_offset(r.row_lag as isize, r.col_lag);
            AnisotropicRow {
                x,
                y,
                row_lag: r.row_lag,
                col_lag: r.col_lag,
                mean_sq_diff: r.mean_sq_diff,
                pair_count: r.pair_count,
            }
        })
        .collect();

    AnisotropicVariogram { rows }
}

/// Compute every representation of the variogram of a populated grid.
///
/// The calculator is called exactly once; every representation is derived
/// from its output.
/// # Arguments
/// * `grid` - populated grid
/// * `calculator` - raw lag variogram collaborator
/// * `radius` - largest physical lag length
/// * `config` - missing value handling and surface colours
pub fn compute_variogram<C>(
    grid: &InCompleteGriddedDataBase<f64>,
    calculator: &C,
    radius: f64,
    config: &VariogramConfig,
) -> Result<Variogram, VariogramError>
where
    C: LagVariogramCalculator + ?Sized,
{
    let spacing = grid.grid_spacing();
    let raw = calculator.compute(grid, radius, spacing.x, spacing.y)?;

    debug!(
        "compute_variogram: {} lag records, {} isotropic bins, {} pairs",
        raw.records.len(),
        raw.isotropic.len(),
        raw.total_pairs()
    );

    let heat = fold_quadrants(&raw, config.missing);
    let surface = SurfaceMesh::from_heat(&heat, &config.surface, config.missing);

    Ok(Variogram {
        radius,
        grid_spacing: raw.grid_spacing,
        anisotropic: anisotropic(&raw),
        isotropic: IsotropicVariogram {
            bins: raw.isotropic.clone(),
        },
        heat,
        surface,
    })
}
