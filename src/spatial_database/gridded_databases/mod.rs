use super::coordinate_system::GridSpacing;

pub mod incomplete_grid;

/// Gridded database interface.
pub trait GriddedDataBaseInterface<T> {
    fn offset_ind(&self, ind: [usize; 2], offset: [isize; 2]) -> Option<[usize; 2]>;
    fn data_at_ind(&self, ind: &[usize; 2]) -> Option<T>;
    fn data_and_inds(&self) -> (Vec<T>, Vec<[usize; 2]>);
    fn shape(&self) -> [usize; 2];
    fn grid_spacing(&self) -> GridSpacing;
}
