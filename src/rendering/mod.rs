//! # Rendering Module
//!
//! Text output for inspecting generated levels.

pub mod ascii;

pub use ascii::*;
