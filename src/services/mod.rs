pub mod bands;
pub mod grid;
pub mod pipeline;
pub mod region;
pub mod spatial;
pub mod temporal;
pub mod wkt;
