//! Reduce crystallographic unit cells to primitive form and visualize the
//! result. Symmetry detection is delegated to moyo; everything here is CIF
//! plumbing, batch driving and rendering.

pub mod batch;
pub mod error;
pub mod io;
pub mod model;
pub mod rendering;
pub mod symmetry;

pub use crate::batch::{run, BatchConfig, BatchReport};
pub use crate::error::{Error, Result};
pub use crate::model::{Lattice, Site, Structure};
pub use crate::symmetry::{MoyoReducer, PrimitiveReducer, ReductionResult, DEFAULT_TOLERANCE};
