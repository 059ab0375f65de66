//! # Normals
//!
//! Per-vertex *smooth* normals from a [`VertexAdjacency`](crate::VertexAdjacency)
//! table and per-face *flat* normals straight from the topology.
//!
//! Both come in full precision (matching the point type, `f32` or `f64`)
//! and as [`PackedNormal`]s for GPU transfer. The numeric path is identical,
//! only the final store differs.
mod flat;
mod packed;
mod smooth;

pub use flat::*;
pub use packed::*;
pub use smooth::*;
