use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::spatial_database::coordinate_system::Axis;

/// Failures raised while building a lattice or a variogram.
///
/// Every variant is raised before any partial result is assembled, so callers
/// can branch on the kind without inspecting messages.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VariogramError {
    /// Missing, malformed, or too few observations.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Human readable description of what was wrong with the input.
        reason: String,
    },

    /// Two observations share one lattice cell.
    #[error(
        "Duplicate observation location: observations {first} and {second} both map to cell {cell:?}"
    )]
    DuplicateLocation {
        /// Index of the first observation in the cell.
        first: usize,
        /// Index of the colliding observation.
        second: usize,
        /// The shared (row, col) cell.
        cell: [usize; 2],
    },

    /// An axis has no distinct values.
    #[error("Axis {axis} has no distinct values")]
    EmptyAxis {
        /// The collapsed axis.
        axis: Axis,
    },

    /// An observed coordinate does not fall on the inferred lattice.
    #[error("Coordinate {value} on axis {axis} does not lie on the inferred lattice")]
    OffLattice {
        /// Axis of the offending coordinate.
        axis: Axis,
        /// The offending coordinate value.
        value: f64,
    },

    /// The stability filter removed every surface cell.
    #[error("No stable cells remain in the variogram surface")]
    NoStableCells,
}

impl VariogramError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        VariogramError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading a [`crate::config::VariogramConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors raised while reading observations or writing variogram tables.
#[derive(Debug, Error)]
pub enum ObservationIoError {
    #[error("Failed to read observations from {}: {source}", path.display())]
    Read { path: PathBuf, source: csv::Error },

    #[error("Failed to write variogram table: {0}")]
    Write(#[from] csv::Error),

    #[error("Failed to flush variogram table: {0}")]
    Flush(#[from] io::Error),
}
