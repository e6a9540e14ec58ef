//! CLI commands

pub mod apply;
pub mod destroy;
pub mod render;
pub mod status;
