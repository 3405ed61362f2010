//! Application layer orchestrating the document, tab, perspective, and
//! plugin lifecycles.

pub mod context;
pub mod document;
pub mod files;
pub mod perspective;
pub mod plugins;
pub mod prompt;
pub mod tabs;
