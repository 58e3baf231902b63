use std::io;

use serde::Serialize;

use crate::{error::ObservationIoError, spatial_database::coordinate_system::GridSpacing};

use super::{experimental::IsotropicBin, surface::SurfaceMesh};

/// One raw lag in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnisotropicRow {
    pub x: f64,
    pub y: f64,
    pub row_lag: usize,
    pub col_lag: isize,
    pub mean_sq_diff: Option<f64>,
    pub pair_count: u64,
}

/// Full 2-D variogram, one row per lag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnisotropicVariogram {
    pub rows: Vec<AnisotropicRow>,
}

impl AnisotropicVariogram {
    /// Copy with the values of lags below `min_pairs` removed (rows kept).
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| AnisotropicRow {
                mean_sq_diff: row.mean_sq_diff.filter(|_| row.pair_count >= min_pairs),
                ..*row
            })
            .collect();
        Self { rows }
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ObservationIoError> {
        write_rows(writer, &self.rows)
    }
}

/// Variogram as a function of distance only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IsotropicVariogram {
    pub bins: Vec<IsotropicBin>,
}

impl IsotropicVariogram {
    /// Copy without the bins below `min_pairs`.
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        Self {
            bins: self
                .bins
                .iter()
                .filter(|bin| bin.pair_count >= min_pairs)
                .copied()
                .collect(),
        }
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ObservationIoError> {
        write_rows(writer, &self.bins)
    }
}

/// Raw lags folded onto absolute row and column lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatCell {
    pub row_lag: usize,
    pub col_lag: usize,
    pub x: f64,
    pub y: f64,
    /// Mean of the members' mean squared differences.
    pub mean_sq_diff: Option<f64>,
    /// Total pairs over the members.
    pub pair_count: u64,
    /// Number of raw lags folded into this cell.
    pub members: usize,
}

impl HeatCell {
    pub fn mean_pair_count(&self) -> f64 {
        self.pair_count as f64 / self.members.max(1) as f64
    }
}

/// Semi-isotropic ("heat") variogram.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeatVariogram {
    pub cells: Vec<HeatCell>,
}

impl HeatVariogram {
    pub fn total_pairs(&self) -> u64 {
        self.cells.iter().map(|c| c.pair_count).sum()
    }

    /// Copy with the values of cells below `min_pairs` removed (cells kept).
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|cell| HeatCell {
                mean_sq_diff: cell.mean_sq_diff.filter(|_| cell.pair_count >= min_pairs),
                ..*cell
            })
            .collect();
        Self { cells }
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), ObservationIoError> {
        write_rows(writer, &self.cells)
    }
}

/// One of the derived variogram representations.
#[derive(Debug, Clone, PartialEq)]
pub enum VariogramRepresentation {
    Isotropic(IsotropicVariogram),
    Anisotropic(AnisotropicVariogram),
    Heat(HeatVariogram),
    Surface(SurfaceMesh),
}

impl VariogramRepresentation {
    /// Copy with every value computed from fewer than `min_pairs` pairs removed.
    ///
    /// Isotropic bins are dropped; the other representations keep their shape
    /// and lose the value.
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        match self {
            VariogramRepresentation::Isotropic(v) => {
                VariogramRepresentation::Isotropic(v.filter_unstable(min_pairs))
            }
            VariogramRepresentation::Anisotropic(v) => {
                VariogramRepresentation::Anisotropic(v.filter_unstable(min_pairs))
            }
            VariogramRepresentation::Heat(v) => {
                VariogramRepresentation::Heat(v.filter_unstable(min_pairs))
            }
            VariogramRepresentation::Surface(v) => {
                VariogramRepresentation::Surface(v.filter_unstable(min_pairs))
            }
        }
    }

    /// Number of present (non-missing) values.
    pub fn n_values(&self) -> usize {
        match self {
            VariogramRepresentation::Isotropic(v) => {
                v.bins.iter().filter(|b| b.mean_sq_diff.is_some()).count()
            }
            VariogramRepresentation::Anisotropic(v) => {
                v.rows.iter().filter(|r| r.mean_sq_diff.is_some()).count()
            }
            VariogramRepresentation::Heat(v) => {
                v.cells.iter().filter(|c| c.mean_sq_diff.is_some()).count()
            }
            VariogramRepresentation::Surface(v) => v.z.iter().filter(|z| z.is_some()).count(),
        }
    }
}

/// All representations of one variogram computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Variogram {
    pub radius: f64,
    pub grid_spacing: GridSpacing,
    pub anisotropic: AnisotropicVariogram,
    pub isotropic: IsotropicVariogram,
    pub heat: HeatVariogram,
    pub surface: SurfaceMesh,
}

impl Variogram {
    /// Filtered copy of every representation.
    pub fn filter_unstable(&self, min_pairs: u64) -> Self {
        Self {
            radius: self.radius,
            grid_spacing: self.grid_spacing,
            anisotropic: self.anisotropic.filter_unstable(min_pairs),
            isotropic: self.isotropic.filter_unstable(min_pairs),
            heat: self.heat.filter_unstable(min_pairs),
            surface: self.surface.filter_unstable(min_pairs),
        }
    }

    pub fn representations(&self) -> [VariogramRepresentation; 4] {
        [
            VariogramRepresentation::Isotropic(self.isotropic.clone()),
            VariogramRepresentation::Anisotropic(self.anisotropic.clone()),
            VariogramRepresentation::Heat(self.heat.clone()),
            VariogramRepresentation::Surface(self.surface.clone()),
        ]
    }
}

fn write_rows<W, R>(writer: W, rows: &[R]) -> Result<(), ObservationIoError>
where
    W: io::Write,
    R: Serialize,
{
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
