//! Scene module - mesh data and model transform
//!
//! The mesh is loaded once and never mutated; the model position and
//! rotation accumulate from input and produce cached world-space arrays.

mod mesh;
mod state;

pub use mesh::*;
pub use state::*;
