//! Option structs. All use the init struct pattern:
//!
//! ```
//! # use mesh_refine::options::{QuadsMode, RefineOptions};
//! let options = RefineOptions {
//!     refine_level: 2,
//!     quads_mode: QuadsMode::Triangulated,
//!     ..Default::default()
//! };
//! # assert!(options.is_refined());
//! ```
use derive_more::Display;

/// Environment variable consulted by [`NormalsOptions::from_env()`].
pub const PACKED_NORMALS_ENV: &str = "MESH_REFINE_PACKED_NORMALS";

/// How a subdivision engine refines the mesh.
#[derive(Display, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefineMode {
    /// Uniformly subdivided faces.
    #[default]
    Uniform,
    /// Limit surface patches.
    Patches,
}

/// How quads are handed to the draw stage, when a mesh is drawn with quads.
#[derive(Display, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuadsMode {
    /// Quads stay quads (4 indices each).
    #[default]
    Untriangulated,
    /// Quads are split into two triangles (6 indices each).
    Triangulated,
}

/// Refinement options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefineOptions {
    pub refine_level: usize,
    pub refine_mode: RefineMode,
    pub quads_mode: QuadsMode,
    /// Draw unrefined meshes with quad indices instead of triangles.
    pub quad_indices: bool,
    /// Feature adaptive refinement.
    pub adaptive: bool,
}

impl Default for RefineOptions {
    /// Create options with the following defaults:
    ///
    /// | Property       | Value                                          |
    /// |----------------|------------------------------------------------|
    /// | `refine_level` | `0`                                            |
    /// | `refine_mode`  | [`Uniform`](RefineMode::Uniform)               |
    /// | `quads_mode`   | [`Untriangulated`](QuadsMode::Untriangulated)  |
    /// | `quad_indices` | `false`                                        |
    /// | `adaptive`     | `false`                                        |
    fn default() -> Self {
        Self {
            refine_level: 0,
            refine_mode: RefineMode::Uniform,
            quads_mode: QuadsMode::Untriangulated,
            quad_indices: false,
            adaptive: false,
        }
    }
}

impl RefineOptions {
    #[inline]
    pub fn is_refined(&self) -> bool {
        0 < self.refine_level
    }
}

/// Normals computation options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalsOptions {
    /// Store normals as [`PackedNormal`](crate::PackedNormal)s.
    pub packed: bool,
}

impl Default for NormalsOptions {
    /// Create options with the following defaults:
    ///
    /// | Property | Value  |
    /// |----------|--------|
    /// | `packed` | `true` |
    fn default() -> Self {
        Self { packed: true }
    }
}

impl NormalsOptions {
    /// Defaults, with `packed` overridden by [`PACKED_NORMALS_ENV`] if set.
    /// `"0"`, `"false"` and `"off"` disable packing, anything else enables
    /// it.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(PACKED_NORMALS_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(value) => Self {
                packed: !matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "0" | "false" | "off"
                ),
            },
            None => Self::default(),
        }
    }
}
