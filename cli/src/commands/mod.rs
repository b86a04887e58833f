//! CLI command implementations.

pub mod check;
pub mod forward;
pub mod profile;
