//! # Mesh Refine
//!
//! Topology bookkeeping for polygon meshes on their way to the GPU.
//!
//! Given a [`MeshTopology`] (face vertex counts, face vertex indices, holes,
//! orientation and geom subsets) this crate derives the tables and buffers a
//! renderer needs to draw it:
//!
//! * A [`VertexAdjacency`] table and from it per-point smooth normals.
//! * Per-face flat normals.
//! * Fan triangulated and quadrangulated index buffers with per-primitive
//!   params (coarse face index plus edge flag) and authored edge indices,
//!   see [`TriangleIndices`] and [`QuadIndices`].
//! * Triangulated and quadrangulated face-varying primvars matching those
//!   index buffers.
//! * Per geom subset index buffers, also for refined meshes, see
//!   [`RenderTopology`].
//!
//! Normals can be stored as [`PackedNormal`]s.
//!
//! Subdivision itself is not done here. A [`SubdivisionEngine`] hands back a
//! [`Refinement`] that the [`RenderTopology`] owns and queries.
//!
//! ## Malformed Data
//!
//! Scene data is never trusted. Degenerate faces, index arrays that are too
//! short or subset indices that point nowhere are recovered from with
//! degenerate output (skipped faces, zero-filled primitives) and reported
//! through the [`log`] facade, once per computation. Primvars of an element
//! type a kernel has no case for (packed normals) are passed through
//! unchanged. Only API misuse, e.g.
//! asking for refined indices before the refinement was built, is an
//! [`Error::CodingError`].
//!
//! ## Computations
//!
//! Each kernel is a plain function. The [`computation`] module wraps them
//! into a small dependency graph that declares the buffers it produces up
//! front and hands them to a [`BufferSink`](buffer::BufferSink) once they
//! are resolved. A [`TableCache`](cache::TableCache) shares the tables
//! several computations need between them.
//!
//! ```
//! # use mesh_refine::{MeshTopology, computation::{Computation, ComputeContext}, buffer::BufferData};
//! let mut topology = MeshTopology::new(vec![4, 3], vec![0, 1, 2, 3, 0, 3, 4]);
//! topology.id("/mesh");
//!
//! let points = BufferData::FloatVec3(vec![
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [1.0, 1.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [-1.0, 0.5, 0.0],
//! ]);
//!
//! let mut context = ComputeContext::new(&topology);
//! let points = context.add(Computation::Source(
//!     mesh_refine::buffer::BufferSource::new("points", points),
//! ))?;
//! let adjacency = context.add(Computation::Adjacency)?;
//! let normals = context.add(Computation::SmoothNormals {
//!     adjacency,
//!     points,
//!     packed: false,
//! })?;
//! context.resolve_all()?;
//!
//! let BufferData::FloatVec3(normals) = &context.buffer(normals)?.data else {
//!     unreachable!()
//! };
//! assert!(normals.iter().all(|n| (n[2] - 1.0).abs() < 1e-6));
//! # Ok::<(), mesh_refine::Error>(())
//! ```
//!
//! ## Cargo Features
#![doc = document_features::document_features!()]

pub mod adjacency;
pub mod buffer;
pub mod cache;
pub mod computation;
pub mod edges;
pub mod error;
pub mod geom_subset;
pub mod math;
pub mod normals;
pub mod options;
pub mod primitive_param;
pub mod quadrangulate;
pub mod render_topology;
pub mod subdivision;
pub mod subset;
pub mod topology;
pub mod triangulate;

mod util;

pub use adjacency::VertexAdjacency;
pub use error::{Error, Result};
pub use geom_subset::{sanitize_geom_subsets, GeomSubset, SanitizedGeomSubsets};
pub use normals::PackedNormal;
pub use options::{NormalsOptions, QuadsMode, RefineMode, RefineOptions};
pub use primitive_param::EdgeFlag;
pub use quadrangulate::{QuadIndices, QuadInfo};
pub use render_topology::RenderTopology;
pub use subdivision::{Interpolation, RefinedFaceMap, Refinement, SubdivisionEngine};
pub use topology::{MeshTopology, Orientation, Scheme};
pub use triangulate::TriangleIndices;
