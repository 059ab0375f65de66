//! A topology as it is prepared for drawing.
use crate::{
    computation::{Computation, ComputationId, ComputeContext},
    geom_subset::{sanitize_geom_subsets, SanitizedGeomSubsets},
    options::{NormalsOptions, RefineOptions},
    subdivision::{RefinedFaceMap, Refinement, SubdivisionEngine},
    subset::FaceIndexHelper,
    topology::MeshTopology,
    Error, Result,
};

/// The index computation drawing one geom subset, or the faces no subset
/// claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsetIndexComputation {
    /// `None` for the faces not in any subset.
    pub subset_id: Option<String>,
    pub material_id: Option<String>,
    pub indices: ComputationId,
}

/// Wraps a [`MeshTopology`] with its [`RefineOptions`], the sanitized geom
/// subsets and, once built, the [`Refinement`].
///
/// Normals are packed or not according to the [`NormalsOptions`], which
/// start out as [`NormalsOptions::from_env()`].
///
/// The refinement is owned here and replaced as a whole by
/// [`build_refinement()`](Self::build_refinement).
#[derive(Debug)]
pub struct RenderTopology {
    topology: MeshTopology,
    options: RefineOptions,
    normals_options: NormalsOptions,
    geom_subsets: SanitizedGeomSubsets,
    refinement: Option<Box<dyn Refinement>>,
}

impl RenderTopology {
    /// Takes ownership of `topology`. The refine level of `options` replaces
    /// the one of the topology.
    pub fn new(topology: MeshTopology, options: RefineOptions) -> Self {
        let mut render_topology = Self {
            topology: MeshTopology::default(),
            options,
            normals_options: NormalsOptions::from_env(),
            geom_subsets: SanitizedGeomSubsets::default(),
            refinement: None,
        };
        render_topology.set_topology(topology);
        render_topology
    }

    /// Replaces the topology. Everything derived from the old one, including
    /// the refinement, is dropped.
    pub fn set_topology(&mut self, mut topology: MeshTopology) {
        topology.refine_level(self.options.refine_level);

        #[cfg(feature = "topology_validation")]
        if let Err(error) = topology.validate() {
            error.report();
        }

        self.geom_subsets = sanitize_geom_subsets(
            topology.get_geom_subsets(),
            topology.num_faces(),
            topology.get_id(),
        );
        self.topology = topology;
        if self.refinement.take().is_some() {
            log::debug!("Dropped refinement of [{}]", self.topology.get_id());
        }
    }

    #[inline]
    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    #[inline]
    pub fn options(&self) -> &RefineOptions {
        &self.options
    }

    #[inline]
    pub fn normals_options(&self) -> &NormalsOptions {
        &self.normals_options
    }

    pub fn set_normals_options(&mut self, normals_options: NormalsOptions) {
        self.normals_options = normals_options;
    }

    #[inline]
    pub fn is_refined(&self) -> bool {
        self.topology.is_refined()
    }

    /// Refined faces of quad schemes are quads. Unrefined faces are quads
    /// if [`RefineOptions::quad_indices`] is set.
    #[inline]
    pub fn is_quadrangulated(&self) -> bool {
        if self.is_refined() {
            !self.topology.get_scheme().refines_to_triangles()
        } else {
            self.options.quad_indices
        }
    }

    /// (Re)builds the refinement with `engine`.
    pub fn build_refinement(&mut self, engine: &dyn SubdivisionEngine) -> Result<()> {
        let refinement = engine.create_refinement(&self.topology, &self.options)?;
        log::debug!(
            "Built refinement of [{}] at level {}: {} vertices",
            self.topology.get_id(),
            self.options.refine_level,
            refinement.num_vertices()
        );
        self.refinement = Some(refinement);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::CodingError`] if the refinement was not built.
    pub fn refinement(&self) -> Result<&dyn Refinement> {
        self.refinement.as_deref().ok_or_else(|| {
            Error::CodingError(format!(
                "Refinement of [{}] requested before it was built",
                self.topology.get_id()
            ))
        })
    }

    #[inline]
    pub fn geom_subsets(&self) -> &SanitizedGeomSubsets {
        &self.geom_subsets
    }

    #[inline]
    pub fn non_subset_faces(&self) -> &[i32] {
        &self.geom_subsets.non_subset_faces
    }

    /// The processed face tables for the way this topology is drawn.
    pub fn face_index_helper(&self) -> FaceIndexHelper {
        FaceIndexHelper::new(&self.topology, self.is_refined(), self.is_quadrangulated())
    }

    pub fn refined_face_map(&self) -> Result<RefinedFaceMap> {
        Ok(RefinedFaceMap::from_refinement(self.refinement()?))
    }

    /// A context over this topology, with the refinement if it was built.
    pub fn compute_context(&self) -> ComputeContext<'_> {
        let context = ComputeContext::new(&self.topology);
        match self.refinement.as_deref() {
            Some(refinement) => context.with_refinement(refinement),
            None => context,
        }
    }

    /// Queues the computation of the index buffer this topology is drawn
    /// with: refined indices when refined, quads in the configured
    /// [`QuadsMode`](crate::QuadsMode) when quadrangulated, triangles
    /// otherwise.
    pub fn index_computation(&self, context: &mut ComputeContext) -> Result<ComputationId> {
        if self.is_refined() {
            context.add(Computation::RefinedIndices)
        } else if self.is_quadrangulated() {
            context.add(Computation::QuadIndices {
                quads_mode: self.options.quads_mode,
            })
        } else {
            context.add(Computation::TriangleIndices)
        }
    }

    /// Queues smooth normals of `points`, together with the adjacency table
    /// they need.
    pub fn smooth_normals_computation(
        &self,
        context: &mut ComputeContext,
        points: ComputationId,
    ) -> Result<ComputationId> {
        let adjacency = context.add(Computation::Adjacency)?;
        context.add(Computation::SmoothNormals {
            adjacency,
            points,
            packed: self.normals_options.packed,
        })
    }

    /// Queues flat normals of `points`.
    pub fn flat_normals_computation(
        &self,
        context: &mut ComputeContext,
        points: ComputationId,
    ) -> Result<ComputationId> {
        context.add(Computation::FlatNormals {
            points,
            packed: self.normals_options.packed,
        })
    }

    /// Queues one [`Computation::IndexSubset`] of `index_builder` per geom
    /// subset, followed by one for the non-subset faces if there are any.
    ///
    /// Without geom subsets nothing is queued.
    pub fn subset_index_computations(
        &self,
        context: &mut ComputeContext,
        index_builder: ComputationId,
    ) -> Result<Vec<SubsetIndexComputation>> {
        if self.geom_subsets.is_empty() && self.geom_subsets.non_subset_faces.is_empty() {
            return Ok(Vec::new());
        }

        let helper = context.add(Computation::FaceIndexHelper {
            refined: self.is_refined(),
            quadrangulated: self.is_quadrangulated(),
        })?;
        let refined_face_map = if self.is_refined() {
            Some(context.add(Computation::RefinedFaceMap)?)
        } else {
            None
        };

        let mut add = |face_indices: &[i32]| -> Result<ComputationId> {
            let face_indices = context.add(Computation::GeomSubsetFaceIndices {
                helper,
                face_indices: face_indices.to_vec(),
            })?;
            context.add(Computation::IndexSubset {
                index_builder,
                face_indices,
                refined_face_map,
            })
        };

        let mut computations = Vec::with_capacity(self.geom_subsets.subsets.len() + 1);
        for subset in &self.geom_subsets.subsets {
            computations.push(SubsetIndexComputation {
                subset_id: Some(subset.id.clone()),
                material_id: Some(subset.material_id.clone()),
                indices: add(&subset.indices)?,
            });
        }
        if !self.geom_subsets.non_subset_faces.is_empty() {
            computations.push(SubsetIndexComputation {
                subset_id: None,
                material_id: None,
                indices: add(&self.geom_subsets.non_subset_faces)?,
            });
        }
        Ok(computations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom_subset::GeomSubset;

    #[test]
    fn refinement_before_build_is_a_coding_error() {
        let render_topology = RenderTopology::new(
            MeshTopology::new(vec![4], vec![0, 1, 2, 3]),
            RefineOptions {
                refine_level: 1,
                ..Default::default()
            },
        );
        assert!(render_topology.is_refined());
        assert!(render_topology.is_quadrangulated());
        assert!(render_topology.refinement().unwrap_err().is_coding_error());

        let mut context = render_topology.compute_context();
        assert!(render_topology
            .index_computation(&mut context)
            .unwrap_err()
            .is_coding_error());
    }

    #[test]
    fn subsets_are_sanitized() {
        let mut topology = MeshTopology::new(vec![3, 3, 3], (0..9).collect());
        topology.geom_subsets(vec![
            GeomSubset::new("/a", "/m", vec![2, 7]),
            GeomSubset::new("/b", "", vec![0]),
        ]);
        let render_topology = RenderTopology::new(topology, RefineOptions::default());

        assert_eq!(render_topology.geom_subsets().subsets.len(), 1);
        assert_eq!(render_topology.geom_subsets().subsets[0].indices, [2]);
        assert_eq!(render_topology.non_subset_faces(), [0, 1]);
    }
}
