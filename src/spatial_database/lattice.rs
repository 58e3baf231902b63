//! Inference of the regular lattice underlying a set of scattered coordinates.
//!
//! Each axis is handled independently: the distinct observed values are
//! sorted, the smallest gap between consecutive values is taken as the
//! lattice spacing, and (optionally) the gaps between observed values are
//! filled with the missing lattice positions.
use std::collections::HashMap;

use log::debug;
use nalgebra::Point2;
use ordered_float::OrderedFloat;

use crate::error::VariogramError;

use super::coordinate_system::{Axis, GridSpacing};
use super::CoordinateSet;

/// Tolerance under which two coordinates are the same value, relative to the
/// larger magnitude of the two (absolute below a magnitude of one).
pub const COORDINATE_TOLERANCE: f64 = 1e-9;

/// Tolerance, relative to the axis step, for a coordinate to sit on a lattice node.
pub const LATTICE_TOLERANCE: f64 = 1e-6;

/// Lattice positions along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLattice {
    pub axis: Axis,
    /// Spacing between consecutive lattice positions.
    pub step: f64,
    /// Strictly increasing lattice positions.
    pub values: Vec<f64>,
    /// Allowed offset of a coordinate from its node, on top of the coordinate tolerance.
    tolerance: f64,
}

impl AxisLattice {
    /// Infer the lattice of one axis from the observed coordinate values.
    /// # Arguments
    /// * `axis` - axis the values belong to (used for error reporting)
    /// * `observed` - coordinate values in any order, duplicates allowed
    /// * `autofill` - fill gaps between observed values with the missing lattice positions
    pub fn from_observed<I>(axis: Axis, observed: I, autofill: bool) -> Result<Self, VariogramError>
    where
        I: IntoIterator<Item = f64>,
    {
        let distinct = distinct_sorted(observed);
        let (Some(&min), Some(&max)) = (distinct.first(), distinct.last()) else {
            return Err(VariogramError::EmptyAxis { axis });
        };

        let step = distinct
            .windows(2)
            .map(|w| w[1] - w[0])
            .min_by_key(|gap| OrderedFloat(*gap))
            .unwrap_or(1.0);

        let tolerance = LATTICE_TOLERANCE * step;

        let values = if autofill {
            //every observed value must sit on min + k * step
            for &value in distinct.iter() {
                let node = min + ((value - min) / step).round() * step;
                if (value - node).abs() > tolerance + coordinate_tolerance(value, node) {
                    return Err(VariogramError::OffLattice { axis, value });
                }
            }
            let n = ((max - min) / step).round() as usize;
            (0..=n).map(|i| min + i as f64 * step).collect()
        } else {
            distinct
        };

        Ok(Self {
            axis,
            step,
            values,
            tolerance,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the lattice position matching `value`.
    pub fn locate(&self, value: f64) -> Result<usize, VariogramError> {
        let upper = self.values.partition_point(|&v| v < value);

        //nearest of the two neighbouring positions
        let ind = match (upper.checked_sub(1), self.values.get(upper)) {
            (Some(lower), Some(&above)) if (above - value) < (value - self.values[lower]) => upper,
            (Some(lower), _) => lower,
            (None, _) => upper,
        };

        match self.values.get(ind) {
            Some(&v) if (v - value).abs() <= self.tolerance + coordinate_tolerance(v, value) => {
                Ok(ind)
            }
            _ => Err(VariogramError::OffLattice {
                axis: self.axis,
                value,
            }),
        }
    }
}

/// Regular lattice containing a coordinate set, plus the cell of every coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeDescriptor {
    /// Row axis.
    pub x: AxisLattice,
    /// Column axis.
    pub y: AxisLattice,
    /// `(row, col)` cell of each input coordinate, in input order.
    pub cell_index: Vec<[usize; 2]>,
}

impl LatticeDescriptor {
    /// (rows, cols) of the lattice.
    pub fn shape(&self) -> [usize; 2] {
        [self.x.len(), self.y.len()]
    }

    pub fn grid_spacing(&self) -> GridSpacing {
        GridSpacing::new(self.x.step, self.y.step)
    }

    /// Location of a lattice cell.
    pub fn cell_center(&self, ind: [usize; 2]) -> Option<Point2<f64>> {
        Some(Point2::new(
            *self.x.values.get(ind[0])?,
            *self.y.values.get(ind[1])?,
        ))
    }

    /// Fails with [`VariogramError::DuplicateLocation`] on the first pair of
    /// coordinates sharing a cell.
    pub fn ensure_unique_cells(&self) -> Result<(), VariogramError> {
        let mut occupied: HashMap<[usize; 2], usize> = HashMap::with_capacity(self.cell_index.len());
        for (second, cell) in self.cell_index.iter().enumerate() {
            if let Some(&first) = occupied.get(cell) {
                return Err(VariogramError::DuplicateLocation {
                    first,
                    second,
                    cell: *cell,
                });
            }
            occupied.insert(*cell, second);
        }
        Ok(())
    }
}

/// Infer the lattice containing `coordinates` and locate every coordinate on it.
/// # Arguments
/// * `coordinates` - non-empty coordinate set, duplicates allowed
/// * `autofill` - produce the complete arithmetic sequence on each axis rather than
///   only the observed values
pub fn build_lattice(
    coordinates: &CoordinateSet,
    autofill: bool,
) -> Result<LatticeDescriptor, VariogramError> {
    if coordinates.is_empty() {
        return Err(VariogramError::invalid_input("coordinate set is empty"));
    }

    let x = AxisLattice::from_observed(Axis::X, coordinates.axis_values(Axis::X), autofill)?;
    let y = AxisLattice::from_observed(Axis::Y, coordinates.axis_values(Axis::Y), autofill)?;

    let cell_index = coordinates
        .points()
        .iter()
        .map(|p| -> Result<[usize; 2], VariogramError> { Ok([x.locate(p.x)?, y.locate(p.y)?]) })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "build_lattice: shape {}x{} step ({}, {}) autofill {}",
        x.len(),
        y.len(),
        x.step,
        y.step,
        autofill
    );

    Ok(LatticeDescriptor { x, y, cell_index })
}

/// Largest separation at which `a` and `b` are the same coordinate.
///
/// Scaled by the two values only, so a small gap next to zero stays distinct
/// however large the other coordinates on the axis are. Values of magnitude
/// below one closer than `COORDINATE_TOLERANCE` still merge.
fn coordinate_tolerance(a: f64, b: f64) -> f64 {
    COORDINATE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Sorted values with neighbours closer than the coordinate tolerance collapsed.
fn distinct_sorted<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut values = values.into_iter().collect::<Vec<_>>();
    values.sort_unstable_by_key(|v| OrderedFloat(*v));
    values.dedup_by(|later, kept| (*later - *kept).abs() <= coordinate_tolerance(*later, *kept));
    values
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn coords(x: &[f64], y: &[f64]) -> CoordinateSet {
        CoordinateSet::new(
            x.iter()
                .zip(y.iter())
                .map(|(x, y)| Point2::new(*x, *y))
                .collect(),
        )
        .unwrap()
    }

    fn range(lo: i32, hi: i32) -> Vec<f64> {
        (lo..=hi).map(f64::from).collect()
    }

    #[test]
    fn no_fill_keeps_observed_values() {
        let c = coords(
            &[1.0, 2.0, 3.0, 5.0, 6.0, 7.0, 8.0],
            &[1.0, 2.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        );
        let lattice = build_lattice(&c, false).unwrap();
        assert_eq!(lattice.x.values, vec![1.0, 2.0, 3.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(lattice.y.values, vec![1.0, 2.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(lattice.shape(), [7, 7]);
        assert_eq!(lattice.cell_index[3], [3, 3]);
    }

    #[test]
    fn autofill_completes_axes() {
        let c = coords(
            &[1.0, 2.0, 3.0, 5.0, 6.0, 7.0, 8.0],
            &[1.0, 2.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        );
        let lattice = build_lattice(&c, true).unwrap();
        assert_eq!(lattice.x.values, range(1, 8));
        assert_eq!(lattice.y.values, range(1, 9));
        assert_eq!(lattice.shape(), [8, 9]);
        //(5, 6) sits at row 4 col 5 once the gaps are filled
        assert_eq!(lattice.cell_index[3], [4, 5]);
    }

    #[test]
    fn duplicates_collapse() {
        let c = coords(
            &[1.0, 2.0, 3.0, 3.0, 4.0, 5.0, 6.0],
            &[0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 5.0],
        );
        for autofill in [false, true] {
            let lattice = build_lattice(&c, autofill).unwrap();
            assert_eq!(lattice.x.values, range(1, 6));
            assert_eq!(lattice.y.values, range(0, 5));
            assert_eq!(lattice.x.step, 1.0);
            assert_eq!(lattice.y.step, 1.0);
        }
    }

    #[test]
    fn single_value_axis_has_unit_step() {
        let c = coords(&[4.0, 4.0, 4.0], &[0.0, 2.0, 6.0]);
        let lattice = build_lattice(&c, true).unwrap();
        assert_eq!(lattice.x.step, 1.0);
        assert_eq!(lattice.x.values, vec![4.0]);
        assert_eq!(lattice.y.step, 2.0);
        assert_eq!(lattice.y.values, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(lattice.cell_index, vec![[0, 0], [0, 1], [0, 3]]);
    }

    #[test]
    fn float_noise_does_not_create_levels() {
        let c = coords(&[0.1, 0.2, 0.30000000000000004, 0.3], &[0.0, 0.0, 0.0, 0.0]);
        let lattice = build_lattice(&c, true).unwrap();
        assert_eq!(lattice.x.len(), 3);
        assert_relative_eq!(lattice.x.step, 0.1, epsilon = 1e-12);
        assert_eq!(lattice.cell_index[2], lattice.cell_index[3]);
    }

    #[test]
    fn small_gap_stays_distinct_next_to_large_values() {
        let c = coords(&[0.0, 1e-6, 1e3], &[0.0, 0.0, 0.0]);
        let lattice = build_lattice(&c, false).unwrap();
        assert_eq!(lattice.x.values, vec![0.0, 1e-6, 1e3]);
        assert_eq!(lattice.shape(), [3, 1]);
        assert_eq!(lattice.cell_index, vec![[0, 0], [1, 0], [2, 0]]);
        assert!(lattice.ensure_unique_cells().is_ok());
    }

    #[test]
    fn off_lattice_value_fails_under_autofill() {
        let c = coords(&[0.0, 1.0, 2.5], &[0.0, 0.0, 0.0]);
        let err = build_lattice(&c, true).unwrap_err();
        assert_eq!(
            err,
            VariogramError::OffLattice {
                axis: Axis::X,
                value: 2.5
            }
        );
        //without fill the observed values are the lattice
        assert!(build_lattice(&c, false).is_ok());
    }

    #[test]
    fn empty_coordinates_are_invalid() {
        let c = CoordinateSet::new(vec![]).unwrap();
        assert!(matches!(
            build_lattice(&c, true),
            Err(VariogramError::InvalidInput { .. })
        ));
    }

    #[test]
    fn empty_axis() {
        let err = AxisLattice::from_observed(Axis::Y, Vec::new(), false).unwrap_err();
        assert_eq!(err, VariogramError::EmptyAxis { axis: Axis::Y });
    }

    #[test]
    fn duplicate_cells_are_reported() {
        let c = coords(&[0.0, 1.0, 0.0], &[0.0, 0.0, 0.0]);
        let lattice = build_lattice(&c, true).unwrap();
        assert_eq!(
            lattice.ensure_unique_cells(),
            Err(VariogramError::DuplicateLocation {
                first: 0,
                second: 2,
                cell: [0, 0]
            })
        );
    }

    #[test]
    fn cell_center_matches_axis_values() {
        let c = coords(&[10.0, 12.0], &[-1.0, 2.0]);
        let lattice = build_lattice(&c, true).unwrap();
        assert_eq!(lattice.cell_center([1, 3]), Some(Point2::new(12.0, 2.0)));
        assert_eq!(lattice.cell_center([2, 0]), None);
    }
}
