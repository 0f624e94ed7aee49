pub mod elements;
pub mod structure;

pub use structure::{Lattice, Site, Structure};
