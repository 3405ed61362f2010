//! Infrastructure adapters for configuration, plugin manifests, message
//! bundles, and recently-used file tracking.

pub mod config;
pub mod manifest;
pub mod messages;
pub mod recent;
