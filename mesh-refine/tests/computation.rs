//! Tests for the computation graph.
mod common;

use common::{cube, cube_points, UniformQuadEngine, PATCH_PARAM};
use mesh_refine::{
    buffer::{names, BufferData, BufferSink, BufferSource, BufferSpec, ElementType, MemorySink, TupleType},
    cache::TableCache,
    computation::{Computation, ComputationState, ComputeContext},
    GeomSubset, Interpolation, MeshTopology, Orientation, PackedNormal, QuadsMode, RefineOptions,
    RenderTopology,
};

fn points_source() -> BufferSource {
    BufferSource::new(
        names::POINTS,
        BufferData::FloatVec3(cube_points().iter().map(|p| [p.x, p.y, p.z]).collect()),
    )
}

#[test]
fn test_normals_pipeline() -> anyhow::Result<()> {
    let topology = cube(Orientation::RightHanded);
    let mut context = ComputeContext::new(&topology);

    // Queued before its dependencies resolve.
    let points = context.add(Computation::Source(points_source()))?;
    let adjacency = context.add(Computation::Adjacency)?;
    let smooth = context.add(Computation::SmoothNormals {
        adjacency,
        points,
        packed: false,
    })?;
    let packed = context.add(Computation::SmoothNormals {
        adjacency,
        points,
        packed: true,
    })?;
    let flat = context.add(Computation::FlatNormals {
        points,
        packed: false,
    })?;

    assert_eq!(
        context.buffer_specs(smooth),
        [BufferSpec::new(
            names::SMOOTH_NORMALS,
            TupleType::single(ElementType::FloatVec3)
        )]
    );
    assert_eq!(
        context.buffer_specs(packed)[0].tuple_type.element,
        ElementType::PackedNormal
    );
    assert!(matches!(context.state(smooth), Some(ComputationState::Pending)));

    context.resolve_all()?;

    let BufferData::FloatVec3(normals) = &context.buffer(smooth)?.data else {
        anyhow::bail!("smooth normals are not FloatVec3");
    };
    let expected = 1.0 / 3.0f32.sqrt();
    for (normal, point) in normals.iter().zip(cube_points()) {
        assert!((normal[0] - point.x * expected).abs() < 1e-6);
        assert!((normal[1] - point.y * expected).abs() < 1e-6);
        assert!((normal[2] - point.z * expected).abs() < 1e-6);
    }

    let BufferData::PackedNormal(packed) = &context.buffer(packed)?.data else {
        anyhow::bail!("packed normals are not packed");
    };
    assert_eq!(packed.len(), 8);
    assert!(packed
        .iter()
        .zip(normals)
        .all(|(p, n)| p.unpack()
            .iter()
            .zip(n)
            .all(|(a, b)| (a - b).abs() <= PackedNormal::QUANTIZATION_ERROR)));

    assert_eq!(context.buffer(flat)?.len(), 6);
    Ok(())
}

#[test]
fn test_double_points() -> anyhow::Result<()> {
    let topology = MeshTopology::new(vec![3], vec![0, 1, 2]);
    let mut context = ComputeContext::new(&topology);
    let points = context.add(Computation::Source(BufferSource::new(
        names::POINTS,
        BufferData::DoubleVec3(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
    )))?;
    let flat = context.add(Computation::FlatNormals {
        points,
        packed: false,
    })?;
    context.resolve_all()?;

    assert_eq!(
        context.buffer(flat)?.data,
        BufferData::DoubleVec3(vec![[0.0, 0.0, 1.0]])
    );
    assert_eq!(
        context.buffer_specs(flat)[0].tuple_type.element,
        ElementType::DoubleVec3
    );
    Ok(())
}

#[test]
fn test_wrong_points_type_yields_no_normals() -> anyhow::Result<()> {
    let topology = MeshTopology::new(vec![3], vec![0, 1, 2]);
    let mut context = ComputeContext::new(&topology);
    let points = context.add(Computation::Source(BufferSource::new(
        names::POINTS,
        BufferData::Float(vec![0.0; 9]),
    )))?;
    let flat = context.add(Computation::FlatNormals {
        points,
        packed: true,
    })?;
    let adjacency = context.add(Computation::Adjacency)?;
    let smooth = context.add(Computation::SmoothNormals {
        adjacency,
        points,
        packed: false,
    })?;

    context.resolve_all()?;
    assert_eq!(
        context.buffer(flat)?.data,
        BufferData::PackedNormal(Vec::new())
    );
    assert_eq!(context.buffer(smooth)?.data, BufferData::FloatVec3(Vec::new()));
    assert_eq!(
        context.buffer_specs(smooth)[0].tuple_type.element,
        ElementType::FloatVec3
    );
    Ok(())
}

#[test]
fn test_quadrangulation_pipeline() -> anyhow::Result<()> {
    let topology = MeshTopology::new(vec![4, 3], vec![0, 1, 2, 3, 1, 4, 2]);
    let mut context = ComputeContext::new(&topology);

    let quad_info = context.add(Computation::QuadInfo)?;
    let values = context.add(Computation::Source(BufferSource::new(
        "temperature",
        BufferData::Double(vec![0.0, 3.0, 6.0, 9.0, 12.0]),
    )))?;
    let refined = context.add(Computation::QuadrangulatePrimvar {
        quad_info,
        source: values,
    })?;
    let quads = context.add(Computation::QuadIndices {
        quads_mode: QuadsMode::Untriangulated,
    })?;
    context.resolve_all()?;

    assert_eq!(context.quad_info(quad_info)?.num_points(), 9);
    assert_eq!(
        context.buffer(refined)?.data,
        BufferData::Double(vec![0.0, 3.0, 6.0, 9.0, 12.0, 7.5, 9.0, 4.5, 7.0])
    );
    assert_eq!(context.buffer(quads)?.len(), 4);
    assert!(context.buffer(quad_info).is_err());
    Ok(())
}

#[derive(Default)]
struct CountingSink {
    committed: Vec<BufferSpec>,
    bytes: usize,
}

impl BufferSink for CountingSink {
    fn commit(&mut self, spec: &BufferSpec, data: &BufferData) {
        assert_eq!(spec.tuple_type.element, data.element_type());
        self.committed.push(spec.clone());
        self.bytes += data.as_bytes().len();
    }
}

#[test]
fn test_sink_receives_declared_specs() -> anyhow::Result<()> {
    let topology = cube(Orientation::RightHanded);
    let mut sink = CountingSink::default();
    let declared = {
        let mut context = ComputeContext::new(&topology).with_sink(&mut sink);
        let triangles = context.add(Computation::TriangleIndices)?;
        let adjacency = context.add(Computation::Adjacency)?;
        let _ = context.add(Computation::QuadInfo)?;
        context.resolve_all()?;

        let mut declared = context.buffer_specs(triangles).to_vec();
        declared.extend_from_slice(context.buffer_specs(adjacency));
        declared
    };

    // Quad info stays on the CPU.
    assert_eq!(sink.committed, declared);
    // 12 triangles with a param and an edge index each, plus the adjacency
    // table of 8 points of valence 3.
    assert_eq!(sink.bytes, 4 * (12 * 5 + 2 * 8 + 8 * 2 * 3));
    Ok(())
}

#[test]
fn test_shared_cache() -> anyhow::Result<()> {
    let cache = TableCache::new();
    let topology = cube(Orientation::RightHanded);

    for _ in 0..2 {
        let mut context = ComputeContext::new(&topology).with_cache(&cache);
        let adjacency = context.add(Computation::Adjacency)?;
        let helper = context.add(Computation::FaceIndexHelper {
            refined: false,
            quadrangulated: false,
        })?;
        context.resolve_all()?;
        assert_eq!(context.adjacency(adjacency)?.num_points(), 8);
        assert_eq!(
            context.face_index_helper(helper)?.processed_face_counts,
            [2; 6]
        );
    }
    assert_eq!(cache.len(), 2);
    Ok(())
}

#[test]
fn test_refined_before_build_is_rejected() {
    let topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
    let mut context = ComputeContext::new(&topology);
    let error = context.add(Computation::RefinedIndices).unwrap_err();
    assert!(error.is_coding_error());
}

#[test]
fn test_render_topology_subsets() -> anyhow::Result<()> {
    let mut topology = MeshTopology::new(vec![4, 4, 3], vec![0, 1, 2, 3, 1, 4, 5, 2, 3, 2, 6]);
    topology.geom_subsets(vec![GeomSubset::new("/a", "/red", vec![2, 1])]);
    let render_topology = RenderTopology::new(topology, RefineOptions::default());

    let mut context = render_topology.compute_context();
    let indices = render_topology.index_computation(&mut context)?;
    let subsets = render_topology.subset_index_computations(&mut context, indices)?;
    context.resolve_all()?;

    assert_eq!(subsets.len(), 2);
    assert_eq!(subsets[0].material_id.as_deref(), Some("/red"));
    assert_eq!(
        context.buffer(subsets[0].indices)?.data,
        BufferData::Int32Vec3(vec![[3, 2, 6], [1, 4, 5], [1, 5, 2]])
    );
    assert_eq!(subsets[1].subset_id, None);
    assert_eq!(
        context.buffer(subsets[1].indices)?.data,
        BufferData::Int32Vec3(vec![[0, 1, 2], [0, 2, 3]])
    );
    Ok(())
}

#[test]
fn test_render_topology_refined_subsets() -> anyhow::Result<()> {
    let mut topology = MeshTopology::new(vec![4, 4, 3], vec![0, 1, 2, 3, 1, 4, 5, 2, 3, 2, 6]);
    topology.geom_subsets(vec![GeomSubset::new("/a", "/red", vec![1])]);
    let mut render_topology = RenderTopology::new(
        topology,
        RefineOptions {
            refine_level: 1,
            ..Default::default()
        },
    );
    render_topology.build_refinement(&UniformQuadEngine)?;

    let mut sink = MemorySink::new();
    let mut context = render_topology.compute_context().with_sink(&mut sink);
    let indices = render_topology.index_computation(&mut context)?;
    let points = context.add(Computation::Source(BufferSource::new(
        names::POINTS,
        BufferData::Float(vec![1.0; 7]),
    )))?;
    let refined_points = context.add(Computation::RefinePrimvar {
        source: points,
        interpolation: Interpolation::Vertex,
    })?;
    let subsets = render_topology.subset_index_computations(&mut context, indices)?;
    context.resolve_all()?;

    assert_eq!(context.buffer(refined_points)?.len(), 7);
    let subset = context.buffer(subsets[0].indices)?;
    assert_eq!(
        subset.data,
        BufferData::Int32Vec4((4..8).map(|k| [k; 4]).collect())
    );
    assert_eq!(
        subset.chained_buffer(PATCH_PARAM).map(|b| &b.data),
        Some(&BufferData::Int32((104..108).collect()))
    );
    drop(context);

    assert!(sink.get(names::BASE_FACE_TO_REFINED_FACES_MAP).is_some());
    assert_eq!(
        sink.get(names::REFINED_FACE_COUNTS),
        Some(&BufferData::Int32(vec![4, 8, 12, 16, 20]))
    );
    Ok(())
}

#[test]
fn test_render_topology_quad_subsets() -> anyhow::Result<()> {
    let mut topology = MeshTopology::new(vec![4, 4, 3], vec![0, 1, 2, 3, 1, 4, 5, 2, 3, 2, 6]);
    topology.geom_subsets(vec![GeomSubset::new("/a", "/red", vec![2])]);
    let render_topology = RenderTopology::new(
        topology,
        RefineOptions {
            quad_indices: true,
            ..Default::default()
        },
    );
    assert!(!render_topology.is_refined());
    assert!(render_topology.is_quadrangulated());

    let mut context = render_topology.compute_context();
    let indices = render_topology.index_computation(&mut context)?;
    let subsets = render_topology.subset_index_computations(&mut context, indices)?;
    context.resolve_all()?;

    // The triangle is split into three quads around the new center point 10.
    let subset = context.buffer(subsets[0].indices)?;
    assert_eq!(
        subset.data,
        BufferData::Int32Vec4(vec![[3, 7, 10, 9], [2, 8, 10, 7], [6, 9, 10, 8]])
    );
    assert_eq!(
        subset.chained_buffer(names::PRIMITIVE_PARAM).map(|b| b.len()),
        Some(3)
    );
    assert_eq!(
        context.buffer(subsets[1].indices)?.data,
        BufferData::Int32Vec4(vec![[0, 1, 2, 3], [1, 4, 5, 2]])
    );
    Ok(())
}

#[test]
fn test_render_topology_tri_quad_subsets() -> anyhow::Result<()> {
    let mut topology = MeshTopology::new(vec![4, 4, 3], vec![0, 1, 2, 3, 1, 4, 5, 2, 3, 2, 6]);
    topology.geom_subsets(vec![GeomSubset::new("/a", "/red", vec![1])]);
    let render_topology = RenderTopology::new(
        topology,
        RefineOptions {
            quad_indices: true,
            quads_mode: QuadsMode::Triangulated,
            ..Default::default()
        },
    );

    let mut context = render_topology.compute_context();
    let indices = render_topology.index_computation(&mut context)?;
    let subsets = render_topology.subset_index_computations(&mut context, indices)?;
    context.resolve_all()?;

    let subset = context.buffer(subsets[0].indices)?;
    assert_eq!(subset.data, BufferData::Int32(vec![1, 4, 5, 5, 2, 1]));
    assert_eq!(subset.array_size, 6);
    assert_eq!(context.buffer(subsets[1].indices)?.len(), 1 + 3);
    Ok(())
}

#[test]
fn test_refined_face_maps_are_cached_per_options() -> anyhow::Result<()> {
    use mesh_refine::{RefineMode, SubdivisionEngine};

    let cache = TableCache::new();
    let mut topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
    topology.refine_level(1);

    let uniform = RefineOptions {
        refine_level: 1,
        ..Default::default()
    };
    let patches = RefineOptions {
        refine_mode: RefineMode::Patches,
        adaptive: true,
        ..uniform
    };
    for options in [uniform, patches, uniform] {
        let refinement = UniformQuadEngine.create_refinement(&topology, &options)?;
        let map = cache.refined_face_map(&topology, refinement.as_ref());
        assert_eq!(map.refined_face_counts, [4]);
    }
    assert_eq!(cache.len(), 2);
    Ok(())
}
