//! Helpers shared by the integration tests.
#![allow(dead_code)]

use mesh_refine::{
    buffer::{names, BufferData, BufferSource, BufferSpec, ElementType, TupleType},
    quadrangulate::count_quads,
    subset::FaceIndexHelper,
    Interpolation, MeshTopology, Orientation, RefineOptions, Refinement, Result,
    SubdivisionEngine,
};
use ultraviolet::Vec3;

pub const EPSILON: f32 = 1e-6;

pub fn assert_vec3_near(actual: &[Vec3], expected: &[Vec3], epsilon: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (*a - *e).abs().component_max() <= epsilon,
            "[{}]: {:?} != {:?}",
            i,
            a,
            e
        );
    }
}

pub fn vec3s(values: &[[f32; 3]]) -> Vec<Vec3> {
    values.iter().copied().map(Vec3::from).collect()
}

pub fn cube_points() -> Vec<Vec3> {
    vec3s(&[
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
    ])
}

/// A cube with outward facing normals for the given orientation.
pub fn cube(orientation: Orientation) -> MeshTopology {
    let indices = match orientation {
        Orientation::RightHanded => vec![
            0, 1, 2, 3, 4, 5, 6, 7, 0, 6, 5, 1, 4, 7, 3, 2, 0, 3, 7, 6, 4, 2, 1, 5,
        ],
        Orientation::LeftHanded => vec![
            3, 2, 1, 0, 7, 6, 5, 4, 1, 5, 6, 0, 2, 3, 7, 4, 6, 7, 3, 0, 5, 1, 2, 4,
        ],
    };
    let mut topology = MeshTopology::new(vec![4; 6], indices);
    topology.orientation(orientation).id("/cube");
    topology
}

/// The quad grid with five faces used by the hole and invalid topology
/// tests.
pub fn five_quads() -> MeshTopology {
    MeshTopology::new(
        vec![4; 5],
        vec![
            0, 1, 2, 3, 3, 2, 5, 4, 4, 5, 6, 7, 2, 8, 9, 5, 5, 9, 10, 6,
        ],
    )
}

pub const PATCH_PARAM: &str = "patchParam";

/// Splits every quadrangulated face into four refined faces, one level
/// deep. Hole faces stay base faces but yield no refined faces. Refined face
/// `k` has the indices `[k; 4]` and the patch param `100 + k`.
#[derive(Debug)]
pub struct UniformQuadRefinement {
    options: RefineOptions,
    /// One entry per base face.
    is_hole: Vec<bool>,
}

impl UniformQuadRefinement {
    fn num_refined_faces(&self) -> i32 {
        4 * self.is_hole.iter().filter(|&&hole| !hole).count() as i32
    }
}

impl Refinement for UniformQuadRefinement {
    fn refine_options(&self) -> &RefineOptions {
        &self.options
    }

    fn num_vertices(&self) -> usize {
        4 * self.is_hole.len()
    }

    fn index_buffer_specs(&self) -> Vec<BufferSpec> {
        vec![
            BufferSpec::new(names::INDICES, TupleType::single(ElementType::Int32Vec4)),
            BufferSpec::new(PATCH_PARAM, TupleType::single(ElementType::Int32)),
        ]
    }

    fn indices(&self) -> Result<BufferSource> {
        let num_faces = self.num_refined_faces();
        Ok(BufferSource::new(
            names::INDICES,
            BufferData::Int32Vec4((0..num_faces).map(|k| [k; 4]).collect()),
        )
        .chain(BufferSource::new(
            PATCH_PARAM,
            BufferData::Int32((0..num_faces).map(|k| 100 + k).collect()),
        )))
    }

    fn refine_cpu(&self, source: &BufferSource, _: Interpolation) -> Result<BufferSource> {
        Ok(source.clone())
    }

    fn num_base_faces(&self) -> usize {
        self.is_hole.len()
    }

    fn patch_face_ids(&self) -> Vec<i32> {
        (0..self.is_hole.len() as i32)
            .filter(|&face| !self.is_hole[face as usize])
            .flat_map(|face| [face; 4])
            .collect()
    }
}

pub struct UniformQuadEngine;

impl SubdivisionEngine for UniformQuadEngine {
    fn create_refinement(
        &self,
        topology: &MeshTopology,
        options: &RefineOptions,
    ) -> Result<Box<dyn Refinement>> {
        // Base faces are the quads of all faces, holes included.
        let helper = FaceIndexHelper::new(topology, true, true);
        let mut solid = topology.clone();
        solid.holes(&[]);
        let mut is_hole = vec![false; count_quads(&solid)];
        for &hole in topology.hole_indices() {
            let Ok(face) = usize::try_from(hole) else {
                continue;
            };
            let Some(&start) = helper.processed_face_indices.get(face) else {
                continue;
            };
            let end = helper
                .processed_face_indices
                .get(face + 1)
                .map_or(is_hole.len(), |&end| end as usize);
            is_hole[start as usize..end].iter_mut().for_each(|hole| *hole = true);
        }
        Ok(Box::new(UniformQuadRefinement {
            options: *options,
            is_hole,
        }))
    }
}
