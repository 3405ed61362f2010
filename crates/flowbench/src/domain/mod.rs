//! Domain types shared across the workbench.

pub mod errors;
pub mod model;
