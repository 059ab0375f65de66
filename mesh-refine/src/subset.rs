//! # Geom Subset Index Remapping
//!
//! Geom subsets name *coarse* faces, but what gets drawn are the processed
//! primitives (triangles, quads or refined faces). This module maps subset
//! face indices into that processed domain and slices index buffers (plus
//! their chained buffers) accordingly.
//!
//! ## Example
//! ```
//! # use mesh_refine::{MeshTopology, subset::FaceIndexHelper};
//! // A triangle, a quad and a pentagon, triangulated.
//! let topology = MeshTopology::new(
//!     vec![3, 4, 5],
//!     vec![0, 1, 2, 0, 2, 3, 4, 0, 4, 5, 6, 7],
//! );
//! let helper = FaceIndexHelper::new(&topology, false, false);
//!
//! assert_eq!(helper.processed_face_counts, [1, 2, 3]);
//! assert_eq!(helper.processed_face_indices, [0, 1, 3]);
//! assert_eq!(helper.subset_face_indices(&[2, 0]), [3, 4, 5, 0]);
//! ```
use crate::{
    buffer::{names, BufferData, BufferSource},
    subdivision::RefinedFaceMap,
    topology::{HoleCursor, MeshTopology},
    Error, Result,
};

/// Number and position of the processed primitives of every coarse face.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceIndexHelper {
    /// Processed primitives per coarse face. `0` for holes and faces with
    /// less than three corners.
    pub processed_face_counts: Vec<i32>,
    /// Index of the first processed primitive of every coarse face.
    pub processed_face_indices: Vec<i32>,
}

impl FaceIndexHelper {
    /// Builds the tables for the given decomposition.
    ///
    /// With `quadrangulated` a quad becomes one primitive and any other face
    /// with `n` corners `n` primitives. Otherwise a face becomes `n - 2`
    /// triangles.
    ///
    /// When `refined`, holes still occupy their slots in the processed
    /// domain (the refiner does not drop them), so the offsets advance past
    /// them by the count the face would have had.
    pub fn new(topology: &MeshTopology, refined: bool, quadrangulated: bool) -> Self {
        let decomposed_count = |count: i32| -> i32 {
            if count < 3 {
                0
            } else if quadrangulated {
                if 4 == count {
                    1
                } else {
                    count
                }
            } else {
                count - 2
            }
        };

        let mut holes = HoleCursor::new(topology.hole_indices());
        let num_faces = topology.num_faces();
        let mut processed_face_counts = Vec::with_capacity(num_faces);
        let mut processed_face_indices = Vec::with_capacity(num_faces);
        let mut processed_face_index = 0;

        for (face, &count) in topology.face_vertex_counts().iter().enumerate() {
            let is_hole = holes.is_hole(face);
            let processed = if is_hole { 0 } else { decomposed_count(count) };
            processed_face_counts.push(processed);
            processed_face_indices.push(processed_face_index);
            processed_face_index += if refined && is_hole {
                decomposed_count(count)
            } else {
                processed
            };
        }

        Self {
            processed_face_counts,
            processed_face_indices,
        }
    }

    /// The processed primitive indices of the coarse `face_indices`, in
    /// order.
    ///
    /// This doubles as the *coarse face index* buffer used for drawing
    /// subsets. Invalid face indices are ignored.
    pub fn subset_face_indices(&self, face_indices: &[i32]) -> Vec<i32> {
        face_indices
            .iter()
            .filter_map(|&face| usize::try_from(face).ok())
            .filter_map(|face| {
                Some((
                    *self.processed_face_indices.get(face)?,
                    *self.processed_face_counts.get(face)?,
                ))
            })
            .flat_map(|(start, count)| start..start + count)
            .collect()
    }

    /// [`subset_face_indices()`](Self::subset_face_indices) as an `Int32`
    /// buffer.
    pub fn subset_face_index_buffer(&self, face_indices: &[i32]) -> BufferSource {
        BufferSource::new(
            names::COARSE_FACE_INDEX,
            BufferData::Int32(self.subset_face_indices(face_indices)),
        )
    }

    /// The counts with the indices chained.
    pub fn to_buffer_source(&self) -> BufferSource {
        BufferSource::new(
            names::PROCESSED_FACE_COUNTS,
            BufferData::Int32(self.processed_face_counts.clone()),
        )
        .chain(BufferSource::new(
            names::PROCESSED_FACE_INDICES,
            BufferData::Int32(self.processed_face_indices.clone()),
        ))
    }
}

/// Maps processed face indices to refined face indices.
pub fn refine_face_indices(face_indices: &[i32], refined_face_map: &RefinedFaceMap) -> Vec<i32> {
    face_indices
        .iter()
        .flat_map(|&face| refined_face_map.refined_faces(face).iter().copied())
        .collect()
}

/// Slices `index_builder` (and every chained buffer) down to the entries
/// listed in `face_indices`.
///
/// With a `refined_face_map`, `face_indices` are processed face indices that
/// are first mapped to refined faces.
///
/// Buffers of a non-integer element type are replaced by empty buffers of
/// the same type, with a diagnostic. Face indices beyond the end of
/// `index_builder` are dropped with a diagnostic.
///
/// # Errors
///
/// Returns [`Error::InvalidBufferSize`] if a chained buffer does not have
/// one entry per entry of `index_builder`.
pub fn compute_index_subset(
    index_builder: &BufferSource,
    face_indices: &[i32],
    refined_face_map: Option<&RefinedFaceMap>,
) -> Result<BufferSource> {
    index_builder.check_chained()?;

    let refined;
    let face_indices = match refined_face_map {
        Some(map) => {
            refined = refine_face_indices(face_indices, map);
            refined.as_slice()
        }
        None => face_indices,
    };

    let num_entries = index_builder.len();
    let entries: Vec<usize> = face_indices
        .iter()
        .filter_map(|&face| usize::try_from(face).ok())
        .filter(|&face| face < num_entries)
        .collect();
    if entries.len() != face_indices.len() {
        log::warn!(
            "Subset face indices out of range for '{}' (should be < {})",
            index_builder.name,
            num_entries
        );
    }

    let mut subset = gather_source(index_builder, &entries);
    subset.chained = index_builder
        .chained
        .iter()
        .map(|chained| gather_source(chained, &entries))
        .collect();
    Ok(subset)
}

fn gather_source(source: &BufferSource, entries: &[usize]) -> BufferSource {
    let width = source.array_size;
    let data = match &source.data {
        BufferData::Int32(values) => BufferData::Int32(gather(values, width, entries)),
        BufferData::Int32Vec2(values) => BufferData::Int32Vec2(gather(values, width, entries)),
        BufferData::Int32Vec3(values) => BufferData::Int32Vec3(gather(values, width, entries)),
        BufferData::Int32Vec4(values) => BufferData::Int32Vec4(gather(values, width, entries)),
        other => {
            Error::UnsupportedElementType {
                name: source.name.clone(),
                tuple_type: source.tuple_type(),
            }
            .report();
            other.empty_like()
        }
    };
    BufferSource {
        name: source.name.clone(),
        data,
        array_size: width,
        chained: Vec::new(),
    }
}

#[inline]
fn gather<T: Copy>(values: &[T], width: usize, entries: &[usize]) -> Vec<T> {
    entries
        .iter()
        .flat_map(|&entry| &values[entry * width..(entry + 1) * width])
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refined_holes_keep_their_stride() {
        let mut topology = MeshTopology::new(vec![4, 5, 4], (0..13).collect());
        topology.holes(&[1]);

        let unrefined = FaceIndexHelper::new(&topology, false, true);
        assert_eq!(unrefined.processed_face_counts, [1, 0, 1]);
        assert_eq!(unrefined.processed_face_indices, [0, 1, 1]);

        let refined = FaceIndexHelper::new(&topology, true, true);
        assert_eq!(refined.processed_face_counts, [1, 0, 1]);
        assert_eq!(refined.processed_face_indices, [0, 1, 6]);
    }

    #[test]
    fn degenerate_faces_are_empty() {
        let topology = MeshTopology::new(vec![2, 3], vec![0, 1, 0, 1, 2]);
        let helper = FaceIndexHelper::new(&topology, false, false);
        assert_eq!(helper.processed_face_counts, [0, 1]);
        assert_eq!(helper.processed_face_indices, [0, 0]);
    }
}
