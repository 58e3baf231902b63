pub mod cpu_calculator;

use serde::Serialize;

use crate::{
    error::VariogramError,
    spatial_database::{
        coordinate_system::GridSpacing, gridded_databases::incomplete_grid::InCompleteGriddedDataBase,
    },
};

/// Mean squared difference of all populated cell pairs separated by one integer lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLagRecord {
    pub row_lag: usize,
    pub col_lag: isize,
    /// Mean squared difference, `None` when no pair was found.
    pub mean_sq_diff: Option<f64>,
    pub pair_count: u64,
}

/// Mean squared difference of all cell pairs at one physical distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IsotropicBin {
    pub distance: f64,
    pub mean_sq_diff: Option<f64>,
    pub pair_count: u64,
}

/// Unbinned anisotropic variogram of a populated grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnisotropicVariogram {
    pub grid_spacing: GridSpacing,
    /// One record per lag, including lags without any pair.
    pub records: Vec<RawLagRecord>,
    /// Lags pooled by physical distance.
    pub isotropic: Vec<IsotropicBin>,
}

impl RawAnisotropicVariogram {
    /// Total number of pairs over all lag records.
    pub fn total_pairs(&self) -> u64 {
        self.records.iter().map(|r| r.pair_count).sum()
    }
}

/// Computes the raw lag variogram of a populated grid.
///
/// Implementations must only produce `row_lag >= 0` (enforced by the record
/// type) and must report lags without pairs with `pair_count == 0` rather
/// than omitting them.
pub trait LagVariogramCalculator {
    /// # Arguments
    /// * `grid` - values at lattice cells
    /// * `radius` - largest physical lag length to consider
    /// * `dx` - physical row spacing
    /// * `dy` - physical column spacing
    fn compute(
        &self,
        grid: &InCompleteGriddedDataBase<f64>,
        radius: f64,
        dx: f64,
        dy: f64,
    ) -> Result<RawAnisotropicVariogram, VariogramError>;
}
