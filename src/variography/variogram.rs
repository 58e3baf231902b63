use log::debug;

use crate::{
    config::VariogramConfig,
    error::VariogramError,
    spatial_database::{
        gridded_databases::incomplete_grid::InCompleteGriddedDataBase, lattice::build_lattice,
        CoordinateSet, Observations, SpatialModel,
    },
};

use super::{
    aggregator::compute_variogram, experimental::LagVariogramCalculator,
    representations::Variogram,
};

/// Where the coordinates and values of a variogram come from.
///
/// Explicit coordinates or values take precedence over the model's.
#[derive(Default)]
pub struct VariogramInput<'a> {
    pub model: Option<&'a dyn SpatialModel>,
    pub coordinates: Option<CoordinateSet>,
    pub values: Option<Vec<f64>>,
}

impl<'a> VariogramInput<'a> {
    pub fn from_model(model: &'a dyn SpatialModel) -> Self {
        Self {
            model: Some(model),
            ..Default::default()
        }
    }

    pub fn from_observations(observations: Observations) -> Self {
        Self {
            model: None,
            coordinates: Some(observations.coordinates),
            values: Some(observations.values),
        }
    }

    pub fn with_coordinates(mut self, coordinates: CoordinateSet) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = Some(values);
        self
    }

    /// Pair up coordinates and values, falling back on the model for either.
    pub fn resolve(self) -> Result<Observations, VariogramError> {
        let coordinates = match (self.coordinates, self.model) {
            (Some(coordinates), _) => coordinates,
            (None, Some(model)) => CoordinateSet::new(model.coordinates())?,
            (None, None) => {
                return Err(VariogramError::invalid_input(
                    "missing input: no coordinates and no model",
                ))
            }
        };
        let values = match (self.values, self.model) {
            (Some(values), _) => values,
            (None, Some(model)) => model.residuals(),
            (None, None) => {
                return Err(VariogramError::invalid_input(
                    "missing input: no values and no model",
                ))
            }
        };

        let observations = Observations::new(coordinates, values)?;
        if observations.len() < 2 {
            return Err(VariogramError::invalid_input(format!(
                "at least 2 observations are required, found {}",
                observations.len()
            )));
        }
        Ok(observations)
    }
}

/// Lag radius used when none is configured: a third of the largest pairwise distance.
pub fn default_radius(coordinates: &CoordinateSet) -> f64 {
    coordinates.max_pairwise_distance() / 3.0
}

/// Variogram of the values of `input` over the lattice of its coordinates.
///
/// Fails with [`VariogramError::DuplicateLocation`] before the calculator is
/// invoked if two observations share a lattice cell. The result is
/// unfiltered; apply [`Variogram::filter_unstable`] with `config.min_pairs`
/// for the stable subset.
pub fn variogram<C>(
    input: VariogramInput<'_>,
    calculator: &C,
    config: &VariogramConfig,
) -> Result<Variogram, VariogramError>
where
    C: LagVariogramCalculator + ?Sized,
{
    let observations = input.resolve()?;

    let lattice = build_lattice(&observations.coordinates, config.autofill)?;
    lattice.ensure_unique_cells()?;
    let grid = InCompleteGriddedDataBase::from_lattice(&lattice, &observations.values)?;

    let radius = config
        .radius
        .unwrap_or_else(|| default_radius(&observations.coordinates));
    if !(radius.is_finite() && radius > 0.0) {
        return Err(VariogramError::invalid_input(format!(
            "lag radius must be positive, found {radius}"
        )));
    }

    debug!(
        "variogram: {} observations on a {:?} lattice, radius {}",
        observations.len(),
        lattice.shape(),
        radius
    );

    compute_variogram(&grid, calculator, radius, config)
}
