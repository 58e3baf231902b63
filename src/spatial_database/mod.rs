use std::path::Path;

use itertools::Itertools;
use nalgebra::Point2;
use ndarray::ArrayView2;
use serde::Deserialize;

use crate::error::{ObservationIoError, VariogramError};

use self::coordinate_system::Axis;

pub mod coordinate_system;
pub mod gridded_databases;
pub mod lattice;

/// Fitted spatial model supplying residuals at observation locations.
///
/// `residuals()[i]` must belong to `coordinates()[i]`.
pub trait SpatialModel {
    fn residuals(&self) -> Vec<f64>;
    fn coordinates(&self) -> Vec<Point2<f64>>;
}

/// Ordered set of 2-D observation locations.
///
/// Duplicated locations are allowed here, they only become an error once a
/// variogram is requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    points: Vec<Point2<f64>>,
}

impl CoordinateSet {
    /// Create a coordinate set, rejecting non-finite coordinates.
    pub fn new(points: Vec<Point2<f64>>) -> Result<Self, VariogramError> {
        if let Some((ind, point)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(VariogramError::invalid_input(format!(
                "coordinate {ind} is not finite: ({}, {})",
                point.x, point.y
            )));
        }
        Ok(Self { points })
    }

    /// Create a coordinate set from an `N x 2` array view.
    pub fn from_array(coords: ArrayView2<f64>) -> Result<Self, VariogramError> {
        if coords.ncols() != 2 {
            return Err(VariogramError::invalid_input(format!(
                "coordinates must have 2 columns, found {}",
                coords.ncols()
            )));
        }
        let points = coords
            .rows()
            .into_iter()
            .map(|row| Point2::new(row[0], row[1]))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinate values along one axis in observation order.
    pub fn axis_values(&self, axis: Axis) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(move |p| match axis {
            Axis::X => p.x,
            Axis::Y => p.y,
        })
    }

    /// Largest Euclidean distance between any two locations (0 for fewer than two).
    pub fn max_pairwise_distance(&self) -> f64 {
        self.points
            .iter()
            .tuple_combinations()
            .map(|(a, b)| nalgebra::distance(a, b))
            .fold(0f64, f64::max)
    }
}

impl TryFrom<Vec<[f64; 2]>> for CoordinateSet {
    type Error = VariogramError;

    fn try_from(points: Vec<[f64; 2]>) -> Result<Self, Self::Error> {
        Self::new(points.into_iter().map(Point2::from).collect())
    }
}

/// Locations paired with one scalar value each (typically model residuals).
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    pub coordinates: CoordinateSet,
    pub values: Vec<f64>,
}

#[derive(Deserialize)]
struct ObservationRecord {
    x: f64,
    y: f64,
    value: f64,
}

impl Observations {
    /// Pair locations with values, checking that both line up.
    pub fn new(coordinates: CoordinateSet, values: Vec<f64>) -> Result<Self, VariogramError> {
        if coordinates.len() != values.len() {
            return Err(VariogramError::invalid_input(format!(
                "{} coordinates but {} values",
                coordinates.len(),
                values.len()
            )));
        }
        if let Some(ind) = values.iter().position(|v| !v.is_finite()) {
            return Err(VariogramError::invalid_input(format!(
                "value {ind} is not finite: {}",
                values[ind]
            )));
        }
        Ok(Self {
            coordinates,
            values,
        })
    }

    /// Residuals and coordinates of a fitted model.
    pub fn from_model<M: SpatialModel + ?Sized>(model: &M) -> Result<Self, VariogramError> {
        Self::new(CoordinateSet::new(model.coordinates())?, model.residuals())
    }

    /// Read observations from a csv file with an `x,y,value` header.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, ObservationIoError> {
        let path = path.as_ref();
        let read_err = |source| ObservationIoError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(read_err)?;

        let mut points = Vec::new();
        let mut values = Vec::new();
        for record in reader.deserialize() {
            let record: ObservationRecord = record.map_err(read_err)?;
            points.push(Point2::new(record.x, record.y));
            values.push(record.value);
        }

        let coordinates = CoordinateSet::new(points).map_err(|e| read_err(invalid_data(e)))?;
        Self::new(coordinates, values).map_err(|e| read_err(invalid_data(e)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn invalid_data(err: VariogramError) -> csv::Error {
    csv::Error::from(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        err.to_string(),
    ))
}
