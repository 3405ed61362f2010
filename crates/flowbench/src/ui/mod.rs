//! Terminal UI shell hosting the workbench.

pub mod app;
pub mod components;
