//! Graph file formats and instance builders shared by the solver, its binary and its tests.

pub mod instances;
pub mod io;
