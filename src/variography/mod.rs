pub mod aggregator;
pub mod experimental;
pub mod representations;
pub mod surface;
pub mod variogram;
