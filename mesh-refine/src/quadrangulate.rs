//! # Quadrangulation
//!
//! Quad faces are passed through. Every other face with `n` corners is
//! split into `n` quads around a new center point, using `n` new edge
//! midpoints:
//!
//! ```text
//!   v0 ---- e0 ---- v1           quad j: (v_j, e_j, center, e_{j-1})
//!   |        |       |
//!  e(n-1) - center - e1
//!   |        |       |
//!  ...
//! ```
//!
//! The new points are appended after the authored points. Per split face,
//! the edge midpoints come first (in corner order), followed by the center.
//! [`QuadInfo`] records what is needed to compute them for any vertex
//! primvar.
use crate::{
    buffer::{names, BufferData, BufferSource},
    math::{with_primvar_slice, PrimvarElement},
    primitive_param::{encode_coarse_face_param, EdgeFlag},
    topology::{HoleCursor, MeshTopology},
    triangulate::pass_through,
    util::{Diagnostic, Diagnostics},
};

/// Bookkeeping for the points a quadrangulation adds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuadInfo {
    /// Corner count of each split (non-quad) face.
    pub num_verts: Vec<i32>,
    /// Concatenated vertex indices of the split faces.
    pub verts: Vec<i32>,
    /// Where the additional points start. Equal to the authored point count.
    pub points_offset: usize,
    /// Number of additional points (`n + 1` per split face).
    pub num_additional_points: usize,
    /// Largest corner count of any split face.
    pub max_num_vert: usize,
}

impl QuadInfo {
    /// `true` if no face needs splitting.
    #[inline]
    pub fn is_all_quads(&self) -> bool {
        0 == self.num_additional_points
    }

    /// Total point count after quadrangulation.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points_offset + self.num_additional_points
    }
}

/// Number of quads the quadrangulation of `topology` yields.
pub fn count_quads(topology: &MeshTopology) -> usize {
    let mut holes = HoleCursor::new(topology.hole_indices());
    topology
        .faces()
        .filter(|face| !face.is_degenerate() && !holes.is_hole(face.index))
        .map(|face| if 4 == face.count { 1 } else { face.len() })
        .sum()
}

/// Collects the split faces of `topology`.
pub fn compute_quad_info(topology: &MeshTopology) -> QuadInfo {
    let verts = topology.face_vertex_indices();
    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut holes = HoleCursor::new(topology.hole_indices());
    let mut quad_info = QuadInfo {
        points_offset: topology.get_num_points(),
        ..Default::default()
    };

    for face in topology.faces() {
        if face.is_degenerate() || holes.is_hole(face.index) || 4 == face.count {
            continue;
        }
        let nv = face.len();
        quad_info.num_verts.push(face.count);
        quad_info
            .verts
            .extend((face.offset..face.offset + nv).map(|v| {
                verts.get(v).copied().unwrap_or_else(|| {
                    diagnostics.raise(Diagnostic::InconsistentTopology);
                    0
                })
            }));
        quad_info.num_additional_points += nv + 1;
        quad_info.max_num_vert = quad_info.max_num_vert.max(nv);
    }

    quad_info
}

/// Output of [`compute_quad_indices()`]. All arrays have one entry per quad.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuadIndices {
    pub indices: Vec<[i32; 4]>,
    pub primitive_params: Vec<i32>,
    /// The two authored edges (face corners) each quad touches.
    pub edge_indices: Vec<[i32; 2]>,
}

impl QuadIndices {
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Splits every quad into the triangles `(0, 1, 2)` and `(2, 3, 0)`.
    /// Six indices per quad.
    pub fn to_tri_quads(&self) -> Vec<[i32; 6]> {
        self.indices
            .iter()
            .map(|q| [q[0], q[1], q[2], q[2], q[3], q[0]])
            .collect()
    }

    /// An `Int32Vec4` index buffer with primitive params and edge indices
    /// chained.
    pub fn into_buffer_source(self) -> BufferSource {
        BufferSource::new(names::INDICES, BufferData::Int32Vec4(self.indices))
            .chain(BufferSource::new(
                names::PRIMITIVE_PARAM,
                BufferData::Int32(self.primitive_params),
            ))
            .chain(BufferSource::new(
                names::EDGE_INDICES,
                BufferData::Int32Vec2(self.edge_indices),
            ))
    }
}

/// Quadrangulates `topology`. Additional point indices start at
/// `topology.get_num_points()`, matching [`compute_quad_info()`].
///
/// Faces overrunning `face_vertex_indices` yield zero-filled quads (still one
/// per expected quad) and one diagnostic.
pub fn compute_quad_indices(topology: &MeshTopology) -> QuadIndices {
    let num_quads = count_quads(topology);
    let flip = topology.get_orientation().is_flipped();

    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut holes = HoleCursor::new(topology.hole_indices());
    let mut result = QuadIndices {
        indices: Vec::with_capacity(num_quads),
        primitive_params: Vec::with_capacity(num_quads),
        edge_indices: Vec::with_capacity(num_quads),
    };
    let mut vert_index = topology.get_num_points() as i32;

    for face in topology.faces() {
        if face.is_degenerate() {
            diagnostics.raise(Diagnostic::DegenerateFace);
            continue;
        }
        if holes.is_hole(face.index) {
            continue;
        }

        let nv = face.len();
        let edge_index = face.offset as i32;

        let Some(corners) = topology.face_vertices(&face) else {
            diagnostics.raise(Diagnostic::InconsistentTopology);
            let count = if 4 == nv { 1 } else { nv };
            for j in 0..count {
                result.indices.push([0; 4]);
                result.primitive_params.push(encode_coarse_face_param(
                    face.index,
                    if 4 == nv {
                        EdgeFlag::ShowAll
                    } else {
                        EdgeFlag::for_split(j, nv)
                    },
                ));
                result.edge_indices.push([0; 2]);
            }
            continue;
        };

        if 4 == nv {
            result.indices.push(if flip {
                [corners[0], corners[3], corners[2], corners[1]]
            } else {
                [corners[0], corners[1], corners[2], corners[3]]
            });
            result
                .primitive_params
                .push(encode_coarse_face_param(face.index, EdgeFlag::ShowAll));
            result.edge_indices.push([edge_index, edge_index + 3]);
        } else {
            let n = nv as i32;
            for (j, &corner) in corners.iter().enumerate() {
                let j = j as i32;
                let prev = (j + n - 1) % n;
                let center = vert_index + n;
                result.indices.push(if flip {
                    [corner, vert_index + prev, center, vert_index + j]
                } else {
                    [corner, vert_index + j, center, vert_index + prev]
                });
                result.primitive_params.push(encode_coarse_face_param(
                    face.index,
                    EdgeFlag::for_split(j as usize, nv),
                ));
                result.edge_indices.push(if flip {
                    [edge_index + prev, edge_index + j]
                } else {
                    [edge_index + j, edge_index + prev]
                });
            }
            vert_index += n + 1;
        }
    }

    result
}

/// Like [`compute_quad_indices()`] but with every quad emitted as two
/// triangles, six indices per quad. The primitive params still have one
/// entry per quad.
pub fn compute_tri_quad_indices(topology: &MeshTopology) -> (Vec<[i32; 6]>, QuadIndices) {
    let quads = compute_quad_indices(topology);
    (quads.to_tri_quads(), quads)
}

/// Extends a vertex primvar with the edge midpoints and face centers
/// [`QuadInfo`] describes.
///
/// If `source` is shorter than `quad_info.points_offset` the missing values
/// are zero-filled and a diagnostic is logged.
pub fn quadrangulate_primvar<T: PrimvarElement>(
    quad_info: &QuadInfo,
    source: &[T],
    id: &str,
) -> Vec<T> {
    let mut diagnostics = Diagnostics::new(id);
    let mut result = Vec::with_capacity(quad_info.num_points());

    if source.len() < quad_info.points_offset {
        diagnostics.raise(Diagnostic::ShortSource);
        result.extend_from_slice(source);
        result.resize(quad_info.points_offset, T::zero());
    } else {
        result.extend_from_slice(&source[..quad_info.points_offset]);
    }

    let value = |result: &[T], index: i32| result.get(index as usize).copied().unwrap_or(T::zero());

    let mut index = 0;
    for &nv in &quad_info.num_verts {
        let nv = nv.max(0) as usize;
        let Some(face) = quad_info.verts.get(index..index + nv) else {
            diagnostics.raise(Diagnostic::InconsistentTopology);
            result.extend(std::iter::repeat(T::zero()).take(nv + 1));
            index += nv;
            continue;
        };
        let mut center = T::zero();
        for i in 0..face.len() {
            let v0 = value(&result, face[i]);
            let v1 = value(&result, face[(i + 1) % face.len()]);
            result.push(v0.midpoint(v1));
            center = center.add(v0);
        }
        if !face.is_empty() {
            center = center.scale(1.0 / face.len() as f64);
        }
        result.push(center);
        index += nv;
    }

    result
}

/// Dispatches [`quadrangulate_primvar()`] over the element type of `source`.
///
/// Packed data is reported and returned unchanged.
pub fn quadrangulate_primvar_buffer(
    quad_info: &QuadInfo,
    source: &BufferSource,
    id: &str,
) -> BufferSource {
    with_primvar_slice!(&source.data, values => {
        PrimvarElement::into_buffer_data(quadrangulate_primvar(quad_info, values, id))
    })
    .map(|data| BufferSource::new(source.name.clone(), data))
    .unwrap_or_else(|| pass_through(source))
}

/// Quadrangulates face-varying values the same way [`compute_quad_indices()`]
/// quadrangulates vertex indices. The output holds four values per quad.
///
/// Holes are only skipped when the topology is not refined.
pub fn quadrangulate_face_varying<T: PrimvarElement>(
    topology: &MeshTopology,
    source: &[T],
) -> Vec<T> {
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
        let Some(s) = source.get(face.offset..face.offset + nv) else {
            diagnostics.raise(Diagnostic::InconsistentTopology);
            let count = if 4 == nv { 4 } else { 4 * nv };
            result.extend(std::iter::repeat(T::zero()).take(count));
            continue;
        };

        if 4 == nv {
            if flip {
                result.extend_from_slice(&[s[0], s[3], s[2], s[1]]);
            } else {
                result.extend_from_slice(s);
            }
            continue;
        }

        let center = s
            .iter()
            .fold(T::zero(), |sum, &value| sum.add(value))
            .scale(1.0 / nv as f64);
        // Midpoints of the edges leaving and entering corner `j`.
        let next_edge = |j: usize| s[j].midpoint(s[(j + 1) % nv]);
        let prev_edge = |j: usize| s[j].midpoint(s[(j + nv - 1) % nv]);

        if flip {
            result.extend_from_slice(&[s[0], prev_edge(0), center, next_edge(0)]);
            for j in (1..nv).rev() {
                result.extend_from_slice(&[s[j], prev_edge(j), center, next_edge(j)]);
            }
        } else {
            for j in 0..nv {
                result.extend_from_slice(&[s[j], next_edge(j), center, prev_edge(j)]);
            }
        }
    }

    result
}

/// Dispatches [`quadrangulate_face_varying()`] over the element type of
/// `source`. Packed data is reported and returned unchanged.
pub fn quadrangulate_face_varying_buffer(
    topology: &MeshTopology,
    source: &BufferSource,
) -> BufferSource {
    with_primvar_slice!(&source.data, values => {
        PrimvarElement::into_buffer_data(quadrangulate_face_varying(topology, values))
    })
    .map(|data| BufferSource::new(source.name.clone(), data))
    .unwrap_or_else(|| pass_through(source))
}
