pub mod config;
pub mod error;
pub mod spatial_database;
pub mod variography;

pub mod prelude {

    pub mod re_exports {
        pub use nalgebra;
        pub use ndarray;
    }

    pub use crate::config::{load_config, VariogramConfig};
    pub use crate::error::VariogramError;
    pub use crate::spatial_database::{
        lattice::{build_lattice, LatticeDescriptor},
        CoordinateSet, Observations, SpatialModel,
    };
    pub use crate::variography::{
        aggregator::{compute_variogram, MissingValues},
        experimental::{cpu_calculator::CPUCalculator, LagVariogramCalculator},
        representations::{Variogram, VariogramRepresentation},
        surface::SurfaceMesh,
        variogram::{variogram, VariogramInput},
    };
}
