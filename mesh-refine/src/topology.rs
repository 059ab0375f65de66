//! A container holding raw (authored) mesh topology.
//!
//! ## Example
//! ```
//! # use mesh_refine::MeshTopology;
//! // Two quads sharing an edge, the second one is a hole.
//! let mut topology = MeshTopology::new(
//!     vec![4, 4],
//!     vec![0, 1, 4, 3, 1, 2, 5, 4],
//! );
//! topology.holes(&[1]).id("/World/grid");
//!
//! assert_eq!(topology.num_faces(), 2);
//! assert_eq!(topology.compute_num_points(), 6);
//! assert!(topology.is_hole(1));
//! ```
//!
//! All kernels in this crate walk the same two flat arrays,
//! `face_vertex_counts` and `face_vertex_indices`. The vertex cursor is
//! advanced by the face's count for every face, valid or not, so that index
//! alignment with the authored arrays is preserved even when faces are
//! skipped.
use derive_more::Display;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::geom_subset::GeomSubset;
use crate::{Error, Result};

/// Winding order of the authored faces.
#[derive(Display, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Counter-clockwise faces are front facing.
    #[default]
    #[display("rightHanded")]
    RightHanded,
    /// Clockwise faces are front facing. Triggers a winding flip in every
    /// kernel so results stay right-handed downstream.
    #[display("leftHanded")]
    LeftHanded,
}

impl Orientation {
    /// Returns `true` if outputs need their winding flipped.
    #[inline]
    pub fn is_flipped(&self) -> bool {
        *self != Orientation::RightHanded
    }
}

/// Subdivision scheme the mesh is refined with (if it is refined at all).
#[derive(Display, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// [*Catmull-Clark* subdivision](https://en.wikipedia.org/wiki/Catmull%E2%80%93Clark_subdivision_surface).
    #[default]
    CatmullClark,
    /// [*Loop* subdivision](https://en.wikipedia.org/wiki/Loop_subdivision_surface).
    Loop,
    /// *Bilinear* interpolation.
    Bilinear,
}

impl Scheme {
    /// Returns `true` if the scheme produces triangles when refined.
    pub fn refines_to_triangles(&self) -> bool {
        matches!(self, Scheme::Loop)
    }
}

/// A face as seen while scanning the topology.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceRef {
    /// Authored (coarse) face index.
    pub index: usize,
    /// Offset of the face's first vertex index in `face_vertex_indices`.
    pub offset: usize,
    /// Authored vertex count. May be negative or smaller than 3 for
    /// malformed input.
    pub count: i32,
}

impl FaceRef {
    /// The authored vertex count, clamped to zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    /// Faces with less than three vertices produce no primitives.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.count < 3
    }
}

/// Owns raw topology data as flat index buffers.
///
/// This is the input consumed by every computation in this crate. It is
/// treated as an immutable snapshot once handed over; a topology change means
/// a new `MeshTopology` and a full rebuild of everything derived from it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshTopology {
    id: String,
    scheme: Scheme,
    orientation: Orientation,
    face_vertex_counts: Vec<i32>,
    face_vertex_indices: Vec<i32>,
    hole_indices: Vec<i32>,
    refine_level: usize,
    num_points: Option<usize>,
    geom_subsets: Vec<GeomSubset>,
}

impl MeshTopology {
    /// Describes a mesh topology.
    ///
    /// # Arguments
    ///
    /// * `face_vertex_counts` - The number of vertices of each face. The
    ///   length of this is the number of faces in the mesh.
    /// * `face_vertex_indices` - A flat list of the vertex indices for each
    ///   face in the mesh.
    pub fn new(face_vertex_counts: Vec<i32>, face_vertex_indices: Vec<i32>) -> Self {
        Self {
            face_vertex_counts,
            face_vertex_indices,
            ..Default::default()
        }
    }

    /// Set an identifier (usually a scene path) used in diagnostics.
    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    /// Tag faces as holes.
    ///
    /// The indices are sorted and deduplicated. Indices that are not valid
    /// face indices are dropped with a diagnostic.
    pub fn holes(&mut self, holes: &[i32]) -> &mut Self {
        let num_faces = self.num_faces();
        let mut hole_indices: Vec<i32> = holes
            .iter()
            .copied()
            .filter(|&hole| {
                let valid = 0 <= hole && (hole as usize) < num_faces;
                if !valid {
                    log::warn!(
                        "Hole index {} is out of range (should be < {}) [{}]",
                        hole,
                        num_faces,
                        self.id
                    );
                }
                valid
            })
            .collect();
        hole_indices.sort_unstable();
        hole_indices.dedup();
        self.hole_indices = hole_indices;
        self
    }

    /// Set the winding order of the faces.
    pub fn orientation(&mut self, orientation: Orientation) -> &mut Self {
        self.orientation = orientation;
        self
    }

    /// Set if the topology describes faces with left handed (clockwise)
    /// winding.
    pub fn left_handed(&mut self, left_handed: bool) -> &mut Self {
        self.orientation = if left_handed {
            Orientation::LeftHanded
        } else {
            Orientation::RightHanded
        };
        self
    }

    /// Set the subdivision scheme.
    pub fn scheme(&mut self, scheme: Scheme) -> &mut Self {
        self.scheme = scheme;
        self
    }

    /// Set the subdivision level. `0` means the mesh is not refined.
    pub fn refine_level(&mut self, refine_level: usize) -> &mut Self {
        self.refine_level = refine_level;
        self
    }

    /// Override the point count otherwise derived from the largest vertex
    /// index.
    pub fn num_points(&mut self, num_points: usize) -> &mut Self {
        self.num_points = Some(num_points);
        self
    }

    /// Set the geom subsets. These are sanitized when the topology is turned
    /// into a [`RenderTopology`](crate::RenderTopology).
    pub fn geom_subsets(&mut self, geom_subsets: Vec<GeomSubset>) -> &mut Self {
        self.geom_subsets = geom_subsets;
        self
    }

    #[inline]
    pub fn get_id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn get_scheme(&self) -> Scheme {
        self.scheme
    }

    #[inline]
    pub fn get_orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn face_vertex_counts(&self) -> &[i32] {
        &self.face_vertex_counts
    }

    #[inline]
    pub fn face_vertex_indices(&self) -> &[i32] {
        &self.face_vertex_indices
    }

    /// Strictly ascending hole face indices.
    #[inline]
    pub fn hole_indices(&self) -> &[i32] {
        &self.hole_indices
    }

    #[inline]
    pub fn get_refine_level(&self) -> usize {
        self.refine_level
    }

    #[inline]
    pub fn get_geom_subsets(&self) -> &[GeomSubset] {
        &self.geom_subsets
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_vertex_counts.len()
    }

    /// Number of face-varying values (one per face corner).
    #[inline]
    pub fn num_face_varyings(&self) -> usize {
        self.face_vertex_indices.len()
    }

    /// Returns the explicit point count if one was set, the point count
    /// derived from the vertex indices otherwise.
    pub fn get_num_points(&self) -> usize {
        self.num_points.unwrap_or_else(|| self.compute_num_points())
    }

    /// Largest referenced vertex index plus one. Negative indices are
    /// ignored.
    pub fn compute_num_points(&self) -> usize {
        self.face_vertex_indices
            .iter()
            .filter(|&&index| 0 <= index)
            .max()
            .map_or(0, |&max| max as usize + 1)
    }

    /// Returns `true` if the mesh gets refined by a subdivision engine.
    #[inline]
    pub fn is_refined(&self) -> bool {
        0 < self.refine_level
    }

    /// Returns `true` if `face` is tagged as a hole.
    pub fn is_hole(&self, face: usize) -> bool {
        self.hole_indices
            .binary_search(&(face.min(i32::MAX as usize) as i32))
            .is_ok()
    }

    /// Iterates over all faces, in authored order.
    pub fn faces(&self) -> impl Iterator<Item = FaceRef> + Clone + '_ {
        self.face_vertex_counts
            .iter()
            .enumerate()
            .scan(0usize, |offset, (index, &count)| {
                let face = FaceRef {
                    index,
                    offset: *offset,
                    count,
                };
                *offset += count.max(0) as usize;
                Some(face)
            })
    }

    /// The vertex indices of `face`, or `None` if the face overruns
    /// `face_vertex_indices`.
    #[inline]
    pub fn face_vertices(&self, face: &FaceRef) -> Option<&[i32]> {
        self.face_vertex_indices
            .get(face.offset..face.offset + face.len())
    }

    /// A content hash of everything the derived tables depend on. Two
    /// topologies with the same version share entries in a
    /// [`TableCache`](crate::cache::TableCache).
    pub fn version(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.scheme.hash(&mut hasher);
        self.orientation.hash(&mut hasher);
        self.face_vertex_counts.hash(&mut hasher);
        self.face_vertex_indices.hash(&mut hasher);
        self.hole_indices.hash(&mut hasher);
        self.refine_level.hash(&mut hasher);
        self.num_points.hash(&mut hasher);
        hasher.finish()
    }

    /// Checks the topology for malformed input.
    ///
    /// The kernels tolerate everything this reports, but callers that want
    /// to reject bad data up front can use this.
    pub fn validate(&self) -> Result<()> {
        if let Some((face, count)) = self
            .face_vertex_counts
            .iter()
            .enumerate()
            .find(|(_, &count)| count < 0)
        {
            return Err(Error::InvalidTopology(format!(
                "Face {} has a negative vertex count ({}) [{}]",
                face, count, self.id
            )));
        }

        let expected: usize = self.face_vertex_counts.iter().map(|&c| c as usize).sum();
        if expected != self.face_vertex_indices.len() {
            return Err(Error::InvalidTopology(format!(
                "The number of vertex indices ({}) is not equal to the sum of face arities ({}) [{}]",
                self.face_vertex_indices.len(),
                expected,
                self.id
            )));
        }

        if let Some((i, index)) = self
            .face_vertex_indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index < 0)
        {
            return Err(Error::InvalidTopology(format!(
                "Vertex index[{}] = {} is negative [{}]",
                i, index, self.id
            )));
        }

        if let Some(num_points) = self.num_points {
            if let Some((i, index)) = self
                .face_vertex_indices
                .iter()
                .enumerate()
                .find(|(_, &index)| num_points <= index as usize)
            {
                return Err(Error::InvalidTopology(format!(
                    "Vertex index[{}] = {} is out of range (should be < {}) [{}]",
                    i, index, num_points, self.id
                )));
            }
        }

        Ok(())
    }
}

/// Writes the corners of `face` into `ring`, collapsing consecutive repeated
/// vertices (including the wraparound from last to first corner).
pub(crate) fn collapse_corner_ring(face: &[i32], ring: &mut Vec<i32>) {
    ring.clear();
    for &vertex in face {
        if ring.last() != Some(&vertex) {
            ring.push(vertex);
        }
    }
    while 1 < ring.len() && ring.first() == ring.last() {
        ring.pop();
    }
}

/// Tracks the position in the ascending hole list while faces are scanned
/// in increasing order. O(faces + holes) for a whole scan.
#[derive(Clone, Debug)]
pub(crate) struct HoleCursor<'a> {
    holes: &'a [i32],
    next: usize,
}

impl<'a> HoleCursor<'a> {
    pub(crate) fn new(holes: &'a [i32]) -> Self {
        Self { holes, next: 0 }
    }

    /// Returns `true` if `face` is a hole. Must be called with
    /// non-decreasing face indices.
    pub(crate) fn is_hole(&mut self, face: usize) -> bool {
        while self.next < self.holes.len() && (self.holes[self.next] as usize) < face {
            self.next += 1;
        }
        if self.next < self.holes.len() && self.holes[self.next] as usize == face {
            self.next += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hole_cursor_skips_in_one_pass() {
        let holes = [1, 3, 4];
        let mut cursor = HoleCursor::new(&holes);
        let tagged: Vec<bool> = (0..6).map(|face| cursor.is_hole(face)).collect();
        assert_eq!(tagged, [false, true, false, true, true, false]);
    }

    #[test]
    fn hole_cursor_tolerates_skipped_queries() {
        let holes = [1, 3];
        let mut cursor = HoleCursor::new(&holes);
        // Face 1 is never asked about (e.g. it was degenerate).
        assert!(!cursor.is_hole(0));
        assert!(!cursor.is_hole(2));
        assert!(cursor.is_hole(3));
    }

    #[test]
    fn faces_advance_past_negative_counts() {
        let topology = MeshTopology::new(vec![3, -1, 3], vec![0, 1, 2, 2, 1, 3]);
        let offsets: Vec<usize> = topology.faces().map(|f| f.offset).collect();
        assert_eq!(offsets, [0, 3, 3]);
        assert!(topology.validate().is_err());
    }

    #[test]
    fn corner_ring_collapses_repeats() {
        let mut ring = Vec::new();
        collapse_corner_ring(&[1, 1, 2, 3], &mut ring);
        assert_eq!(ring, [1, 2, 3]);
        collapse_corner_ring(&[4, 5, 6, 4], &mut ring);
        assert_eq!(ring, [4, 5, 6]);
        collapse_corner_ring(&[7, 7, 7], &mut ring);
        assert_eq!(ring, [7]);
    }

    #[test]
    fn holes_are_sanitized() {
        let mut topology = MeshTopology::new(vec![3, 3, 3], vec![0, 1, 2, 0, 2, 3, 0, 3, 1]);
        topology.holes(&[2, 7, 0, 2, -1]);
        assert_eq!(topology.hole_indices(), &[0, 2]);
    }
}
