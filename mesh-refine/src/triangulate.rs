//! # Fan Triangulation
//!
//! Splits every face with `n >= 3` corners into `n - 2` triangles sharing
//! the first corner. Holes and faces with less than three corners produce
//! nothing, but the read cursor into `face_vertex_indices` still advances
//! by the authored count, so alignment with the authored arrays holds for
//! every face.
//!
//! ## Example
//! ```
//! # use mesh_refine::{MeshTopology, triangulate::compute_triangle_indices};
//! let topology = MeshTopology::new(vec![4], vec![1, 2, 3, 4]);
//! let triangles = compute_triangle_indices(&topology);
//!
//! assert_eq!(triangles.indices, [[1, 2, 3], [1, 3, 4]]);
//! ```
//!
//! For left handed topologies the last two corners of each fan triangle are
//! swapped. The first and last triangle of a split face are additionally
//! rotated so the corner pattern the [`EdgeFlag`] refers to stays the same.
use crate::{
    buffer::{names, BufferData, BufferSource},
    math::{with_primvar_slice, PrimvarElement},
    primitive_param::{encode_coarse_face_param, EdgeFlag},
    topology::{HoleCursor, MeshTopology},
    util::{Diagnostic, Diagnostics},
    Error,
};

/// Output of [`compute_triangle_indices()`]. All three arrays have one entry
/// per triangle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriangleIndices {
    pub indices: Vec<[i32; 3]>,
    /// See [`primitive_param`](crate::primitive_param).
    pub primitive_params: Vec<i32>,
    /// Index of the authored edge (i.e. face corner) each triangle starts
    /// at.
    pub edge_indices: Vec<i32>,
}

impl TriangleIndices {
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// An `Int32Vec3` index buffer with the primitive params and edge indices
    /// chained.
    pub fn into_buffer_source(self) -> BufferSource {
        BufferSource::new(names::INDICES, BufferData::Int32Vec3(self.indices))
            .chain(BufferSource::new(
                names::PRIMITIVE_PARAM,
                BufferData::Int32(self.primitive_params),
            ))
            .chain(BufferSource::new(
                names::EDGE_INDICES,
                BufferData::Int32(self.edge_indices),
            ))
    }
}

/// Number of triangles the fan triangulation of `topology` yields.
pub fn count_triangles(topology: &MeshTopology) -> usize {
    let mut holes = HoleCursor::new(topology.hole_indices());
    topology
        .faces()
        .filter(|face| !face.is_degenerate() && !holes.is_hole(face.index))
        .map(|face| face.len() - 2)
        .sum()
}

/// Fan-triangulates `topology`.
///
/// A triangle that would read past the end of `face_vertex_indices` is
/// zero-filled and flagged with one diagnostic for the whole call.
pub fn compute_triangle_indices(topology: &MeshTopology) -> TriangleIndices {
    let num_triangles = count_triangles(topology);
    let flip = topology.get_orientation().is_flipped();
    let verts = topology.face_vertex_indices();

    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut holes = HoleCursor::new(topology.hole_indices());
    let mut result = TriangleIndices {
        indices: Vec::with_capacity(num_triangles),
        primitive_params: Vec::with_capacity(num_triangles),
        edge_indices: Vec::with_capacity(num_triangles),
    };

    for face in topology.faces() {
        if face.is_degenerate() {
            diagnostics.raise(Diagnostic::DegenerateFace);
            continue;
        }
        if holes.is_hole(face.index) {
            continue;
        }

        let nv = face.len();
        let mut edge_index = face.offset as i32;
        for j in 0..nv - 2 {
            let triangle = match fan_triangle(verts, face.offset, j, flip) {
                Some(triangle) => triangle,
                None => {
                    diagnostics.raise(Diagnostic::InconsistentTopology);
                    [0; 3]
                }
            };

            let edge_flag = if 3 < nv {
                edge_index += 1;
                EdgeFlag::for_split(j, nv - 2)
            } else {
                EdgeFlag::ShowAll
            };

            result.indices.push(rotate_for_edge_flag(triangle, edge_flag, flip));
            result
                .primitive_params
                .push(encode_coarse_face_param(face.index, edge_flag));
            result.edge_indices.push(edge_index);
        }
    }

    result
}

/// Triangle `j` of the fan starting at `offset`, or `None` on overrun.
#[inline]
fn fan_triangle<T: Copy>(source: &[T], offset: usize, j: usize, flip: bool) -> Option<[T; 3]> {
    if source.len() <= offset + j + 2 {
        return None;
    }
    let (v0, v1, v2) = (
        source[offset],
        source[offset + j + 1],
        source[offset + j + 2],
    );
    Some(if flip { [v0, v2, v1] } else { [v0, v1, v2] })
}

/// Under flip the first triangle `(0, 2, 1)` becomes `(2, 1, 0)` and the
/// last `(0, 4, 3)` becomes `(3, 0, 4)`, keeping the hidden edge in place.
#[inline]
fn rotate_for_edge_flag<T: Copy>(triangle: [T; 3], edge_flag: EdgeFlag, flip: bool) -> [T; 3] {
    match (flip, edge_flag) {
        (true, EdgeFlag::First) => [triangle[1], triangle[2], triangle[0]],
        (true, EdgeFlag::Last) => [triangle[2], triangle[0], triangle[1]],
        _ => triangle,
    }
}

/// Triangulates face-varying values the same way [`compute_triangle_indices()`]
/// triangulates vertex indices. The output holds three values per triangle.
///
/// Holes are only skipped when the topology is not refined. A refined
/// topology keeps hole faces in the face-varying channel so it lines up
/// with the refiner's face-varying topology.
///
/// Triangles reading past the end of `source` are zero-filled.
pub fn triangulate_face_varying<T: PrimvarElement>(topology: &MeshTopology, source: &[T]) -> Vec<T> {
    let flip = topology.get_orientation().is_flipped();
    let hole_indices: &[i32] = if topology.is_refined() {
        &[]
    } else {
        topology.hole_indices()
    };

    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut holes = HoleCursor::new(hole_indices);
    let mut result = Vec::new();

    for face in topology.faces() {
        if face.is_degenerate() {
            diagnostics.raise(Diagnostic::DegenerateFace);
            continue;
        }
        if holes.is_hole(face.index) {
            continue;
        }

        let nv = face.len();
        for j in 0..nv - 2 {
            let triangle = fan_triangle(source, face.offset, j, flip).unwrap_or_else(|| {
                diagnostics.raise(Diagnostic::InconsistentTopology);
                [T::zero(); 3]
            });
            let edge_flag = if 3 < nv {
                EdgeFlag::for_split(j, nv - 2)
            } else {
                EdgeFlag::ShowAll
            };
            result.extend_from_slice(&rotate_for_edge_flag(triangle, edge_flag, flip));
        }
    }

    result
}

/// Dispatches [`triangulate_face_varying()`] over the element type of
/// `source`.
///
/// Packed data has no face-varying case. It is reported as
/// [`Error::UnsupportedElementType`] and returned unchanged.
pub fn triangulate_face_varying_buffer(
    topology: &MeshTopology,
    source: &BufferSource,
) -> BufferSource {
    with_primvar_slice!(&source.data, values => {
        PrimvarElement::into_buffer_data(triangulate_face_varying(topology, values))
    })
    .map(|data| BufferSource::new(source.name.clone(), data))
    .unwrap_or_else(|| pass_through(source))
}

/// Reports `source` as unsupported and returns a copy of it.
pub(crate) fn pass_through(source: &BufferSource) -> BufferSource {
    Error::UnsupportedElementType {
        name: source.name.clone(),
        tuple_type: source.tuple_type(),
    }
    .report();
    source.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive_param::{decode_edge_flag, decode_face_index};

    #[test]
    fn pentagon_edge_flags() {
        let topology = MeshTopology::new(vec![5], vec![0, 1, 2, 3, 4]);
        let triangles = compute_triangle_indices(&topology);

        assert_eq!(triangles.indices, [[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
        let flags: Vec<_> = triangles
            .primitive_params
            .iter()
            .map(|&p| decode_edge_flag(p))
            .collect();
        assert_eq!(flags, [EdgeFlag::First, EdgeFlag::Interior, EdgeFlag::Last]);
        assert!(triangles
            .primitive_params
            .iter()
            .all(|&p| decode_face_index(p) == 0));
        assert_eq!(triangles.edge_indices, [1, 2, 3]);
    }

    #[test]
    fn left_handed_rotation() {
        let mut topology = MeshTopology::new(vec![5], vec![0, 1, 2, 3, 4]);
        topology.left_handed(true);
        let triangles = compute_triangle_indices(&topology);

        assert_eq!(triangles.indices, [[2, 1, 0], [0, 3, 2], [3, 0, 4]]);
    }

    #[test]
    fn face_varying_follows_index_rotation() {
        let mut topology = MeshTopology::new(vec![3, 5], vec![0, 1, 2, 0, 1, 2, 3, 4]);
        topology.left_handed(true);
        let source: Vec<f32> = (0..8).map(|i| i as f32).collect();

        let indices = compute_triangle_indices(&topology);
        let values = triangulate_face_varying(&topology, &source);

        assert_eq!(values.len(), 3 * indices.len());
        assert_eq!(values, [0.0, 2.0, 1.0, 5.0, 4.0, 3.0, 3.0, 6.0, 5.0, 6.0, 3.0, 7.0]);
    }
}
