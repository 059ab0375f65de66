//! # Subdivision Engine Seam
//!
//! Stencil and patch evaluation are not done in this crate. A
//! [`SubdivisionEngine`] turns a [`MeshTopology`] into a [`Refinement`],
//! which then produces refined indices and refines primvars.
//!
//! The one table this crate derives from a refinement itself is the
//! [`RefinedFaceMap`]: which refined faces (patches) each base face became.
use std::fmt::Debug;

use crate::{
    buffer::{names, BufferData, BufferSource, BufferSpec, ElementType},
    options::RefineOptions,
    topology::MeshTopology,
    Error, Result,
};

/// How a primvar is interpolated by the refinement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    Vertex,
    Varying,
    FaceVarying,
}

/// Creates refinements.
pub trait SubdivisionEngine {
    /// Builds the refinement of `topology`.
    fn create_refinement(
        &self,
        topology: &MeshTopology,
        options: &RefineOptions,
    ) -> Result<Box<dyn Refinement>>;
}

/// The result of refining one topology. Owned by exactly one
/// [`RenderTopology`](crate::RenderTopology) and replaced as a whole when
/// the topology changes.
pub trait Refinement: Debug + Send + Sync {
    /// The options the refinement was built with.
    fn refine_options(&self) -> &RefineOptions;

    /// Number of refined vertices.
    fn num_vertices(&self) -> usize;

    /// The specs of the buffers [`indices()`](Self::indices) returns,
    /// primary buffer first.
    fn index_buffer_specs(&self) -> Vec<BufferSpec>;

    /// The refined index buffer, optionally with per-face chained buffers
    /// (e.g. patch params).
    fn indices(&self) -> Result<BufferSource>;

    /// Refines `source` on the CPU.
    fn refine_cpu(&self, source: &BufferSource, interpolation: Interpolation)
        -> Result<BufferSource>;

    /// Schedules refinement of the named buffer on the GPU.
    ///
    /// Engines without a GPU path keep the default, which reports a coding
    /// error.
    fn refine_gpu(
        &self,
        name: &str,
        _element_type: ElementType,
        _interpolation: Interpolation,
    ) -> Result<()> {
        Err(Error::CodingError(format!(
            "GPU refinement of '{}' is not supported by this engine",
            name
        )))
    }

    /// Number of base faces the patch face ids refer to.
    fn num_base_faces(&self) -> usize;

    /// The base face each refined face (patch) comes from, in refined face
    /// order.
    fn patch_face_ids(&self) -> Vec<i32>;
}

/// Which refined faces each base face became.
///
/// `refined_face_counts` is cumulative: the refined faces of base face `f`
/// are `base_face_to_refined_faces[start..refined_face_counts[f]]` with
/// `start = refined_face_counts[f - 1]` (or `0` for the first face).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefinedFaceMap {
    pub base_face_to_refined_faces: Vec<i32>,
    pub refined_face_counts: Vec<i32>,
}

impl RefinedFaceMap {
    /// Groups refined face indices by the base face they came from.
    ///
    /// Face ids outside `0..num_base_faces` are dropped with a diagnostic.
    pub fn from_patch_face_ids(num_base_faces: usize, patch_face_ids: &[i32]) -> Self {
        let mut per_face = vec![Vec::new(); num_base_faces];
        let mut out_of_range = false;
        for (patch, &face) in patch_face_ids.iter().enumerate() {
            match usize::try_from(face).ok().and_then(|face| per_face.get_mut(face)) {
                Some(refined) => refined.push(patch as i32),
                None => out_of_range = true,
            }
        }
        if out_of_range {
            log::warn!(
                "Patch face ids out of range (should be < {})",
                num_base_faces
            );
        }

        let mut map = Self {
            base_face_to_refined_faces: Vec::with_capacity(patch_face_ids.len()),
            refined_face_counts: Vec::with_capacity(num_base_faces),
        };
        for refined in per_face {
            map.base_face_to_refined_faces.extend(refined);
            map.refined_face_counts
                .push(map.base_face_to_refined_faces.len() as i32);
        }
        map
    }

    /// Builds the map from a refinement's patch face ids.
    pub fn from_refinement(refinement: &dyn Refinement) -> Self {
        Self::from_patch_face_ids(refinement.num_base_faces(), &refinement.patch_face_ids())
    }

    pub fn num_base_faces(&self) -> usize {
        self.refined_face_counts.len()
    }

    /// The refined faces of `base_face`. Empty for invalid faces.
    pub fn refined_faces(&self, base_face: i32) -> &[i32] {
        let Ok(face) = usize::try_from(base_face) else {
            return &[];
        };
        let Some(&end) = self.refined_face_counts.get(face) else {
            return &[];
        };
        let start = if 0 == face {
            0
        } else {
            self.refined_face_counts[face - 1]
        };
        self.base_face_to_refined_faces
            .get(start as usize..end as usize)
            .unwrap_or(&[])
    }

    /// The map with the counts chained.
    pub fn to_buffer_source(&self) -> BufferSource {
        BufferSource::new(
            names::BASE_FACE_TO_REFINED_FACES_MAP,
            BufferData::Int32(self.base_face_to_refined_faces.clone()),
        )
        .chain(BufferSource::new(
            names::REFINED_FACE_COUNTS,
            BufferData::Int32(self.refined_face_counts.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_face() {
        let map = RefinedFaceMap::from_patch_face_ids(3, &[0, 2, 0, 2, 2, 7]);
        assert_eq!(map.base_face_to_refined_faces, [0, 2, 1, 3, 4]);
        assert_eq!(map.refined_face_counts, [2, 2, 5]);
        assert_eq!(map.refined_faces(0), [0, 2]);
        assert!(map.refined_faces(1).is_empty());
        assert_eq!(map.refined_faces(2), [1, 3, 4]);
        assert!(map.refined_faces(3).is_empty());
    }
}
