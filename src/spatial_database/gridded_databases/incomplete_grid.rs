use ndarray::Array2;

use crate::{
    error::VariogramError,
    spatial_database::{
        coordinate_system::GridSpacing,
        lattice::LatticeDescriptor,
    },
};

use super::GriddedDataBaseInterface;

/// Grid implementation for handling incomplete grids.
/// # Members
/// * `grid` - cell values, `None` where nothing was observed
/// * `grid_spacing` - physical size of each cell
#[derive(Debug, Clone, PartialEq)]
pub struct InCompleteGriddedDataBase<T> {
    pub grid: Array2<Option<T>>,
    pub grid_spacing: GridSpacing,
}

impl<T> InCompleteGriddedDataBase<T> {
    pub fn new(grid: Array2<Option<T>>, grid_spacing: GridSpacing) -> Self {
        Self { grid, grid_spacing }
    }

    /// Number of populated cells
    pub fn n_populated(&self) -> usize {
        self.grid.iter().filter(|v| v.is_some()).count()
    }
}

impl<T> InCompleteGriddedDataBase<T>
where
    T: Copy,
{
    /// Place `values[i]` at `lattice.cell_index[i]`.
    ///
    /// Two values landing in one cell is a [`VariogramError::DuplicateLocation`].
    pub fn from_lattice(lattice: &LatticeDescriptor, values: &[T]) -> Result<Self, VariogramError> {
        if values.len() != lattice.cell_index.len() {
            return Err(VariogramError::invalid_input(format!(
                "{} values for {} lattice cells",
                values.len(),
                lattice.cell_index.len()
            )));
        }

        let [rows, cols] = lattice.shape();
        let mut grid: Array2<Option<T>> = Array2::from_elem((rows, cols), None);
        let mut owner: Array2<Option<usize>> = Array2::from_elem((rows, cols), None);

        for (i, (ind, value)) in lattice.cell_index.iter().zip(values).enumerate() {
            if let Some(first) = owner[*ind] {
                return Err(VariogramError::DuplicateLocation {
                    first,
                    second: i,
                    cell: *ind,
                });
            }
            owner[*ind] = Some(i);
            grid[*ind] = Some(*value);
        }

        Ok(Self::new(grid, lattice.grid_spacing()))
    }
}

impl<T> GriddedDataBaseInterface<T> for InCompleteGriddedDataBase<T>
where
    T: Copy,
{
    fn offset_ind(&self, ind: [usize; 2], offset: [isize; 2]) -> Option<[usize; 2]> {
        let mut new_ind = ind;
        let shape = self.grid.shape();

        for i in 0..2 {
            let shifted = ind[i].checked_add_signed(offset[i])?;
            if shifted >= shape[i] {
                return None;
            }
            new_ind[i] = shifted;
        }

        Some(new_ind)
    }

    fn data_at_ind(&self, ind: &[usize; 2]) -> Option<T> {
        self.grid.get(*ind).copied().flatten()
    }

    fn data_and_inds(&self) -> (Vec<T>, Vec<[usize; 2]>) {
        self.grid
            .indexed_iter()
            .filter_map(|((row, col), val)| val.map(|v| (v, [row, col])))
            .unzip()
    }

    fn shape(&self) -> [usize; 2] {
        let shape = self.grid.shape();
        [shape[0], shape[1]]
    }

    fn grid_spacing(&self) -> GridSpacing {
        self.grid_spacing
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spatial_database::{lattice::build_lattice, CoordinateSet};

    fn lattice(points: Vec<[f64; 2]>) -> LatticeDescriptor {
        build_lattice(&CoordinateSet::try_from(points).unwrap(), true).unwrap()
    }

    #[test]
    fn populate_leaves_gaps_empty() {
        let lattice = lattice(vec![[0.0, 0.0], [3.0, 1.0], [0.0, 1.0], [1.0, 0.0]]);
        let db =
            InCompleteGriddedDataBase::from_lattice(&lattice, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(db.shape(), [4, 2]);
        assert_eq!(db.n_populated(), 4);
        assert_eq!(db.data_at_ind(&[0, 0]), Some(1.0));
        assert_eq!(db.data_at_ind(&[3, 1]), Some(2.0));
        assert_eq!(db.data_at_ind(&[1, 0]), Some(4.0));
        assert_eq!(db.data_at_ind(&[2, 0]), None);
        assert_eq!(db.data_at_ind(&[5, 0]), None);
    }

    #[test]
    fn collision_is_duplicate_location() {
        let lattice = lattice(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.0]]);
        let err = InCompleteGriddedDataBase::from_lattice(&lattice, &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            VariogramError::DuplicateLocation {
                first: 1,
                second: 2,
                cell: [1, 0]
            }
        );
    }

    #[test]
    fn offset_ind_stays_in_grid() {
        let lattice = lattice(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let db = InCompleteGriddedDataBase::from_lattice(&lattice, &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(db.offset_ind([1, 1], [1, -1]), Some([2, 0]));
        assert_eq!(db.offset_ind([0, 1], [-1, 0]), None);
        assert_eq!(db.offset_ind([2, 2], [0, 1]), None);
    }

    #[test]
    fn data_and_inds_in_row_major_order() {
        let lattice = lattice(vec![[12.0, 5.5], [10.0, 5.0], [10.0, 5.5]]);
        let db = InCompleteGriddedDataBase::from_lattice(&lattice, &[1.0, 2.0, 7.0]).unwrap();

        assert_eq!(db.grid_spacing(), GridSpacing::new(2.0, 0.5));
        let (data, inds) = db.data_and_inds();
        assert_eq!(data, vec![2.0, 7.0, 1.0]);
        assert_eq!(inds, vec![[0, 0], [0, 1], [1, 1]]);
    }
}
