//! Reusable UI components.

pub mod confirm;
pub mod scroll;
pub mod tab_strip;
