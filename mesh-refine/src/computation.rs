//! # Computation Graph
//!
//! Everything derived from a topology is expressed as a [`Computation`]:
//! a tagged description of *what* to compute plus the ids of the
//! computations it consumes. Computations are queued on a
//! [`ComputeContext`], which resolves them in dependency order, keeps
//! results for read-back and forwards resolved buffers to a
//! [`BufferSink`].
//!
//! ## Example
//! ```
//! # use mesh_refine::{MeshTopology, computation::{Computation, ComputeContext}, buffer::BufferData};
//! let topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
//! let mut context = ComputeContext::new(&topology);
//!
//! let triangles = context.add(Computation::TriangleIndices)?;
//! context.resolve_all()?;
//!
//! let indices = context.buffer(triangles)?;
//! assert_eq!(indices.data, BufferData::Int32Vec3(vec![[0, 1, 2], [0, 2, 3]]));
//! # Ok::<(), mesh_refine::Error>(())
//! ```
//!
//! Each queued computation moves through the states of
//! [`ComputationState`]. A computation whose dependencies are not resolved
//! yet is [`Blocked`](ComputationState::Blocked). One whose dependency
//! failed fails as well.
use derive_more::Display;
use slice_of_array::prelude::*;
use std::sync::Arc;

use crate::{
    adjacency::VertexAdjacency,
    buffer::{names, BufferData, BufferSink, BufferSource, BufferSpec, ElementType, TupleType},
    cache::TableCache,
    math::{dpoints_from_arrays, points_from_arrays, Point3},
    normals::{
        compute_flat_normals, compute_packed_flat_normals, compute_packed_smooth_normals,
        compute_smooth_normals,
    },
    options::QuadsMode,
    quadrangulate::{
        compute_quad_indices, compute_quad_info, quadrangulate_face_varying_buffer,
        quadrangulate_primvar_buffer, QuadInfo,
    },
    subdivision::{Interpolation, RefinedFaceMap, Refinement},
    subset::{compute_index_subset, FaceIndexHelper},
    topology::MeshTopology,
    triangulate::{compute_triangle_indices, triangulate_face_varying_buffer},
    Error, Result,
};

/// Handle of a computation queued on a [`ComputeContext`].
#[derive(Display, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("#{_0}")]
pub struct ComputationId(usize);

/// What to compute.
#[derive(Clone, Debug)]
pub enum Computation {
    /// An already computed buffer, e.g. authored points or primvars.
    Source(BufferSource),
    /// [`VertexAdjacency`] of the context's topology.
    Adjacency,
    /// Smooth normals from an adjacency table and a points buffer.
    SmoothNormals {
        adjacency: ComputationId,
        points: ComputationId,
        packed: bool,
    },
    /// Flat normals of the context's topology from a points buffer.
    FlatNormals { points: ComputationId, packed: bool },
    /// Fan triangulated indices with primitive params and edge indices
    /// chained.
    TriangleIndices,
    /// [`QuadInfo`] of the context's topology.
    QuadInfo,
    /// Quadrangulated indices with primitive params and edge indices
    /// chained.
    QuadIndices { quads_mode: QuadsMode },
    /// Triangulated face-varying primvar.
    TriangulateFaceVarying { source: ComputationId },
    /// Vertex primvar extended with the points quadrangulation adds.
    QuadrangulatePrimvar {
        quad_info: ComputationId,
        source: ComputationId,
    },
    /// Quadrangulated face-varying primvar.
    QuadrangulateFaceVarying { source: ComputationId },
    /// [`FaceIndexHelper`] of the context's topology.
    FaceIndexHelper { refined: bool, quadrangulated: bool },
    /// Processed face indices (the *coarse face index* buffer) of a geom
    /// subset.
    GeomSubsetFaceIndices {
        helper: ComputationId,
        face_indices: Vec<i32>,
    },
    /// Refined indices from the context's refinement.
    RefinedIndices,
    /// [`RefinedFaceMap`] of the context's refinement.
    RefinedFaceMap,
    /// A primvar refined on the CPU by the context's refinement.
    RefinePrimvar {
        source: ComputationId,
        interpolation: Interpolation,
    },
    /// An index buffer (and its chained buffers) sliced to a subset's
    /// faces. With `refined_face_map`, the face indices are mapped to
    /// refined faces first.
    IndexSubset {
        index_builder: ComputationId,
        face_indices: ComputationId,
        refined_face_map: Option<ComputationId>,
    },
}

impl Computation {
    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Computation::Source(_) => "source",
            Computation::Adjacency => "adjacency",
            Computation::SmoothNormals { .. } => "smoothNormals",
            Computation::FlatNormals { .. } => "flatNormals",
            Computation::TriangleIndices => "triangleIndices",
            Computation::QuadInfo => "quadInfo",
            Computation::QuadIndices { .. } => "quadIndices",
            Computation::TriangulateFaceVarying { .. } => "triangulateFaceVarying",
            Computation::QuadrangulatePrimvar { .. } => "quadrangulatePrimvar",
            Computation::QuadrangulateFaceVarying { .. } => "quadrangulateFaceVarying",
            Computation::FaceIndexHelper { .. } => "faceIndexHelper",
            Computation::GeomSubsetFaceIndices { .. } => "geomSubsetFaceIndices",
            Computation::RefinedIndices => "refinedIndices",
            Computation::RefinedFaceMap => "refinedFaceMap",
            Computation::RefinePrimvar { .. } => "refinePrimvar",
            Computation::IndexSubset { .. } => "indexSubset",
        }
    }

    /// The computations this one consumes.
    pub fn dependencies(&self) -> Vec<ComputationId> {
        match self {
            Computation::SmoothNormals {
                adjacency, points, ..
            } => vec![*adjacency, *points],
            Computation::FlatNormals { points, .. } => vec![*points],
            Computation::TriangulateFaceVarying { source }
            | Computation::QuadrangulateFaceVarying { source }
            | Computation::RefinePrimvar { source, .. } => vec![*source],
            Computation::QuadrangulatePrimvar { quad_info, source } => vec![*quad_info, *source],
            Computation::GeomSubsetFaceIndices { helper, .. } => vec![*helper],
            Computation::IndexSubset {
                index_builder,
                face_indices,
                refined_face_map,
            } => std::iter::once(*index_builder)
                .chain(std::iter::once(*face_indices))
                .chain(*refined_face_map)
                .collect(),
            Computation::Source(_)
            | Computation::Adjacency
            | Computation::TriangleIndices
            | Computation::QuadInfo
            | Computation::QuadIndices { .. }
            | Computation::FaceIndexHelper { .. }
            | Computation::RefinedIndices
            | Computation::RefinedFaceMap => Vec::new(),
        }
    }

    /// Returns `true` if the computation needs a refinement.
    pub fn needs_refinement(&self) -> bool {
        matches!(
            self,
            Computation::RefinedIndices
                | Computation::RefinedFaceMap
                | Computation::RefinePrimvar { .. }
        )
    }

    /// Resolves the computation. All dependencies must be resolved.
    pub fn resolve(&self, context: &ComputeContext) -> Result<ComputedValue> {
        let topology = context.topology;
        Ok(match self {
            Computation::Source(source) => ComputedValue::Buffer(source.clone()),

            Computation::Adjacency => ComputedValue::Adjacency(match context.cache {
                Some(cache) => cache.adjacency(topology)?,
                None => Arc::new(VertexAdjacency::build(topology)?),
            }),

            Computation::SmoothNormals {
                adjacency,
                points,
                packed,
            } => {
                let adjacency = context.adjacency(*adjacency)?;
                let points = context.buffer(*points)?;
                ComputedValue::Buffer(smooth_normals(&adjacency, points, *packed))
            }

            Computation::FlatNormals { points, packed } => {
                let points = context.buffer(*points)?;
                ComputedValue::Buffer(flat_normals(topology, points, *packed))
            }

            Computation::TriangleIndices => {
                ComputedValue::Buffer(compute_triangle_indices(topology).into_buffer_source())
            }

            Computation::QuadInfo => ComputedValue::QuadInfo(match context.cache {
                Some(cache) => cache.quad_info(topology),
                None => Arc::new(compute_quad_info(topology)),
            }),

            Computation::QuadIndices { quads_mode } => {
                let quads = compute_quad_indices(topology);
                ComputedValue::Buffer(match quads_mode {
                    QuadsMode::Untriangulated => quads.into_buffer_source(),
                    QuadsMode::Triangulated => {
                        let tri_quads = quads.to_tri_quads();
                        let mut source = quads.into_buffer_source();
                        source.data = BufferData::Int32(tri_quads.flat().to_vec());
                        source.with_array_size(6)
                    }
                })
            }

            Computation::TriangulateFaceVarying { source } => ComputedValue::Buffer(
                triangulate_face_varying_buffer(topology, context.buffer(*source)?),
            ),

            Computation::QuadrangulatePrimvar { quad_info, source } => {
                ComputedValue::Buffer(quadrangulate_primvar_buffer(
                    &*context.quad_info(*quad_info)?,
                    context.buffer(*source)?,
                    topology.get_id(),
                ))
            }

            Computation::QuadrangulateFaceVarying { source } => ComputedValue::Buffer(
                quadrangulate_face_varying_buffer(topology, context.buffer(*source)?),
            ),

            Computation::FaceIndexHelper {
                refined,
                quadrangulated,
            } => ComputedValue::FaceIndexHelper(match context.cache {
                Some(cache) => cache.face_index_helper(topology, *refined, *quadrangulated),
                None => Arc::new(FaceIndexHelper::new(topology, *refined, *quadrangulated)),
            }),

            Computation::GeomSubsetFaceIndices {
                helper,
                face_indices,
            } => ComputedValue::Buffer(
                context
                    .face_index_helper(*helper)?
                    .subset_face_index_buffer(face_indices),
            ),

            Computation::RefinedIndices => {
                ComputedValue::Buffer(context.refinement()?.indices()?)
            }

            Computation::RefinedFaceMap => {
                let refinement = context.refinement()?;
                ComputedValue::RefinedFaceMap(match context.cache {
                    Some(cache) => cache.refined_face_map(topology, refinement),
                    None => Arc::new(RefinedFaceMap::from_refinement(refinement)),
                })
            }

            Computation::RefinePrimvar {
                source,
                interpolation,
            } => ComputedValue::Buffer(
                context
                    .refinement()?
                    .refine_cpu(context.buffer(*source)?, *interpolation)?,
            ),

            Computation::IndexSubset {
                index_builder,
                face_indices,
                refined_face_map,
            } => {
                let face_indices = context.buffer(*face_indices)?;
                let face_indices = face_indices.data.as_i32_flat().unwrap_or_else(|| {
                    unsupported(face_indices).report();
                    &[][..]
                });
                let refined_face_map = refined_face_map
                    .map(|id| context.refined_face_map(id))
                    .transpose()?;
                ComputedValue::Buffer(compute_index_subset(
                    context.buffer(*index_builder)?,
                    face_indices,
                    refined_face_map.as_deref(),
                )?)
            }
        })
    }
}

/// Points other than `FloatVec3` and `DoubleVec3` are reported and yield
/// no normals.
fn smooth_normals(adjacency: &VertexAdjacency, points: &BufferSource, packed: bool) -> BufferSource {
    fn compute<P: Point3>(adjacency: &VertexAdjacency, points: &[P], packed: bool) -> BufferSource {
        if packed {
            BufferSource::new(
                names::PACKED_SMOOTH_NORMALS,
                BufferData::PackedNormal(compute_packed_smooth_normals(
                    adjacency,
                    points.len(),
                    points,
                )),
            )
        } else {
            BufferSource::new(
                names::SMOOTH_NORMALS,
                P::into_buffer_data(compute_smooth_normals(adjacency, points.len(), points)),
            )
        }
    }

    match &points.data {
        BufferData::FloatVec3(p) => compute(adjacency, &points_from_arrays(p), packed),
        BufferData::DoubleVec3(p) => compute(adjacency, &dpoints_from_arrays(p), packed),
        _ => no_normals(points, packed, names::SMOOTH_NORMALS, names::PACKED_SMOOTH_NORMALS),
    }
}

fn flat_normals(topology: &MeshTopology, points: &BufferSource, packed: bool) -> BufferSource {
    fn compute<P: Point3>(topology: &MeshTopology, points: &[P], packed: bool) -> BufferSource {
        if packed {
            BufferSource::new(
                names::PACKED_FLAT_NORMALS,
                BufferData::PackedNormal(compute_packed_flat_normals(topology, points)),
            )
        } else {
            BufferSource::new(
                names::FLAT_NORMALS,
                P::into_buffer_data(compute_flat_normals(topology, points)),
            )
        }
    }

    match &points.data {
        BufferData::FloatVec3(p) => compute(topology, &points_from_arrays(p), packed),
        BufferData::DoubleVec3(p) => compute(topology, &dpoints_from_arrays(p), packed),
        _ => no_normals(points, packed, names::FLAT_NORMALS, names::PACKED_FLAT_NORMALS),
    }
}

fn no_normals(points: &BufferSource, packed: bool, name: &str, packed_name: &str) -> BufferSource {
    unsupported(points).report();
    if packed {
        BufferSource::new(packed_name, BufferData::PackedNormal(Vec::new()))
    } else {
        BufferSource::new(name, BufferData::FloatVec3(Vec::new()))
    }
}

fn unsupported(source: &BufferSource) -> Error {
    Error::UnsupportedElementType {
        name: source.name.clone(),
        tuple_type: source.tuple_type(),
    }
}

/// A resolved computation.
#[derive(Clone, Debug)]
pub enum ComputedValue {
    Buffer(BufferSource),
    Adjacency(Arc<VertexAdjacency>),
    QuadInfo(Arc<QuadInfo>),
    FaceIndexHelper(Arc<FaceIndexHelper>),
    RefinedFaceMap(Arc<RefinedFaceMap>),
}

impl ComputedValue {
    /// The value as it is handed to a [`BufferSink`]. `None` for CPU-only
    /// tables.
    pub fn to_buffer_source(&self) -> Option<BufferSource> {
        match self {
            ComputedValue::Buffer(source) => Some(source.clone()),
            ComputedValue::Adjacency(adjacency) => Some(adjacency.to_buffer_source()),
            ComputedValue::QuadInfo(_) => None,
            ComputedValue::FaceIndexHelper(helper) => Some(helper.to_buffer_source()),
            ComputedValue::RefinedFaceMap(map) => Some(map.to_buffer_source()),
        }
    }
}

/// Where a queued computation is at.
#[derive(Clone, Debug)]
pub enum ComputationState {
    /// Not looked at yet.
    Pending,
    /// Waiting for the listed dependencies.
    Blocked(Vec<ComputationId>),
    Resolved(ComputedValue),
    /// Resolution failed, or a dependency failed.
    Failed(String),
}

impl ComputationState {
    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, ComputationState::Resolved(_))
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, ComputationState::Failed(_))
    }
}

#[derive(Debug)]
struct Entry {
    computation: Computation,
    specs: Vec<BufferSpec>,
    state: ComputationState,
}

/// Owns queued computations and their results.
///
/// There is no global registry: anything a computation reads (topology,
/// refinement, table cache) or writes (buffer sink) is reached through the
/// context.
pub struct ComputeContext<'a> {
    topology: &'a MeshTopology,
    refinement: Option<&'a dyn Refinement>,
    cache: Option<&'a TableCache>,
    sink: Option<&'a mut dyn BufferSink>,
    entries: Vec<Entry>,
}

impl<'a> ComputeContext<'a> {
    pub fn new(topology: &'a MeshTopology) -> Self {
        Self {
            topology,
            refinement: None,
            cache: None,
            sink: None,
            entries: Vec::new(),
        }
    }

    /// Enables refined computations.
    pub fn with_refinement(mut self, refinement: &'a dyn Refinement) -> Self {
        self.refinement = Some(refinement);
        self
    }

    /// Shares adjacency, quad info, face index helper and refined face map
    /// tables through `cache`.
    pub fn with_cache(mut self, cache: &'a TableCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Forwards every resolved buffer to `sink`.
    pub fn with_sink(mut self, sink: &'a mut dyn BufferSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[inline]
    pub fn topology(&self) -> &MeshTopology {
        self.topology
    }

    /// Queues a computation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CodingError`] if a dependency id is unknown or a
    /// refined computation is queued on a context without a refinement.
    pub fn add(&mut self, computation: Computation) -> Result<ComputationId> {
        if let Some(dependency) = computation
            .dependencies()
            .into_iter()
            .find(|dependency| self.entries.len() <= dependency.0)
        {
            return Err(Error::CodingError(format!(
                "'{}' depends on unknown computation {}",
                computation.name(),
                dependency
            )));
        }
        if computation.needs_refinement() && self.refinement.is_none() {
            return Err(Error::CodingError(format!(
                "'{}' requested before the refinement was built",
                computation.name()
            )));
        }

        let specs = self.declare_specs(&computation);
        self.entries.push(Entry {
            computation,
            specs,
            state: ComputationState::Pending,
        });
        Ok(ComputationId(self.entries.len() - 1))
    }

    /// Number of queued computations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The buffer specs `id` will produce, declared when it was queued.
    pub fn buffer_specs(&self, id: ComputationId) -> &[BufferSpec] {
        self.entries
            .get(id.0)
            .map_or(&[], |entry| entry.specs.as_slice())
    }

    pub fn state(&self, id: ComputationId) -> Option<&ComputationState> {
        self.entries.get(id.0).map(|entry| &entry.state)
    }

    /// Resolves everything resolvable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ComputationFailed`] for the first computation that
    /// failed. All others are resolved regardless.
    pub fn resolve_all(&mut self) -> Result<()> {
        loop {
            let mut progress = false;
            for index in 0..self.entries.len() {
                if matches!(
                    self.entries[index].state,
                    ComputationState::Pending | ComputationState::Blocked(_)
                ) {
                    progress |= self.resolve(ComputationId(index));
                }
            }
            if !progress {
                break;
            }
        }

        match self
            .entries
            .iter()
            .find_map(|entry| match &entry.state {
                ComputationState::Failed(reason) => Some((entry.computation.name(), reason)),
                _ => None,
            }) {
            Some((name, reason)) => Err(Error::ComputationFailed {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Tries to resolve one computation. Returns `true` if its state changed
    /// to resolved or failed.
    pub fn resolve(&mut self, id: ComputationId) -> bool {
        let Some(entry) = self.entries.get(id.0) else {
            return false;
        };
        if entry.state.is_resolved() || entry.state.is_failed() {
            return false;
        }

        let dependencies = entry.computation.dependencies();
        if let Some(failed) = dependencies
            .iter()
            .find(|dependency| self.entries[dependency.0].state.is_failed())
        {
            let reason = format!("dependency {} failed", failed);
            self.entries[id.0].state = ComputationState::Failed(reason);
            return true;
        }
        let blocked: Vec<ComputationId> = dependencies
            .into_iter()
            .filter(|dependency| !self.entries[dependency.0].state.is_resolved())
            .collect();
        if !blocked.is_empty() {
            self.entries[id.0].state = ComputationState::Blocked(blocked);
            return false;
        }

        let state = match self.entries[id.0].computation.resolve(self) {
            Ok(value) => {
                self.commit(id, &value);
                ComputationState::Resolved(value)
            }
            Err(error) => {
                error.report();
                ComputationState::Failed(error.to_string())
            }
        };
        log::trace!(
            "{} '{}' -> {}",
            id,
            self.entries[id.0].computation.name(),
            if state.is_resolved() { "resolved" } else { "failed" }
        );
        self.entries[id.0].state = state;
        true
    }

    /// The resolved value of `id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotResolved`] if `id` is unknown, pending or blocked and
    /// [`Error::ComputationFailed`] if it failed.
    pub fn result(&self, id: ComputationId) -> Result<&ComputedValue> {
        let entry = self
            .entries
            .get(id.0)
            .ok_or_else(|| Error::NotResolved(id.to_string()))?;
        match &entry.state {
            ComputationState::Resolved(value) => Ok(value),
            ComputationState::Failed(reason) => Err(Error::ComputationFailed {
                name: entry.computation.name().to_string(),
                reason: reason.clone(),
            }),
            _ => Err(Error::NotResolved(format!(
                "{} '{}'",
                id,
                entry.computation.name()
            ))),
        }
    }

    /// The resolved buffer of `id`.
    pub fn buffer(&self, id: ComputationId) -> Result<&BufferSource> {
        match self.result(id)? {
            ComputedValue::Buffer(source) => Ok(source),
            _ => Err(self.wrong_kind(id, "buffer")),
        }
    }

    pub fn adjacency(&self, id: ComputationId) -> Result<Arc<VertexAdjacency>> {
        match self.result(id)? {
            ComputedValue::Adjacency(adjacency) => Ok(adjacency.clone()),
            _ => Err(self.wrong_kind(id, "adjacency table")),
        }
    }

    pub fn quad_info(&self, id: ComputationId) -> Result<Arc<QuadInfo>> {
        match self.result(id)? {
            ComputedValue::QuadInfo(quad_info) => Ok(quad_info.clone()),
            _ => Err(self.wrong_kind(id, "quad info")),
        }
    }

    pub fn face_index_helper(&self, id: ComputationId) -> Result<Arc<FaceIndexHelper>> {
        match self.result(id)? {
            ComputedValue::FaceIndexHelper(helper) => Ok(helper.clone()),
            _ => Err(self.wrong_kind(id, "face index helper")),
        }
    }

    pub fn refined_face_map(&self, id: ComputationId) -> Result<Arc<RefinedFaceMap>> {
        match self.result(id)? {
            ComputedValue::RefinedFaceMap(map) => Ok(map.clone()),
            _ => Err(self.wrong_kind(id, "refined face map")),
        }
    }

    fn refinement(&self) -> Result<&'a dyn Refinement> {
        self.refinement.ok_or_else(|| {
            Error::CodingError("Refined computation without a refinement".to_string())
        })
    }

    fn wrong_kind(&self, id: ComputationId, expected: &str) -> Error {
        Error::CodingError(format!(
            "{} '{}' does not produce a {}",
            id,
            self.entries[id.0].computation.name(),
            expected
        ))
    }

    fn declare_specs(&self, computation: &Computation) -> Vec<BufferSpec> {
        let int = |name: &str| BufferSpec::new(name, TupleType::single(ElementType::Int32));
        let index_specs = |element: ElementType, count: usize, edges: ElementType| {
            vec![
                BufferSpec::new(names::INDICES, TupleType::new(element, count)),
                int(names::PRIMITIVE_PARAM),
                BufferSpec::new(names::EDGE_INDICES, TupleType::single(edges)),
            ]
        };
        let dependency_specs = |id: &ComputationId| self.buffer_specs(*id).to_vec();
        let normals = |points: &ComputationId, packed: bool, name: &str, packed_name: &str| {
            if packed {
                vec![BufferSpec::new(
                    packed_name,
                    TupleType::single(ElementType::PackedNormal),
                )]
            } else {
                let element = match self.buffer_specs(*points).first() {
                    Some(spec) if ElementType::DoubleVec3 == spec.tuple_type.element => {
                        ElementType::DoubleVec3
                    }
                    _ => ElementType::FloatVec3,
                };
                vec![BufferSpec::new(name, TupleType::single(element))]
            }
        };

        match computation {
            Computation::Source(source) => source.buffer_specs(),
            Computation::Adjacency => vec![int(names::ADJACENCY)],
            Computation::SmoothNormals { points, packed, .. } => normals(
                points,
                *packed,
                names::SMOOTH_NORMALS,
                names::PACKED_SMOOTH_NORMALS,
            ),
            Computation::FlatNormals { points, packed } => normals(
                points,
                *packed,
                names::FLAT_NORMALS,
                names::PACKED_FLAT_NORMALS,
            ),
            Computation::TriangleIndices => {
                index_specs(ElementType::Int32Vec3, 1, ElementType::Int32)
            }
            Computation::QuadInfo => Vec::new(),
            Computation::QuadIndices {
                quads_mode: QuadsMode::Untriangulated,
            } => index_specs(ElementType::Int32Vec4, 1, ElementType::Int32Vec2),
            Computation::QuadIndices {
                quads_mode: QuadsMode::Triangulated,
            } => index_specs(ElementType::Int32, 6, ElementType::Int32Vec2),
            Computation::TriangulateFaceVarying { source }
            | Computation::QuadrangulatePrimvar { source, .. }
            | Computation::QuadrangulateFaceVarying { source }
            | Computation::RefinePrimvar { source, .. } => dependency_specs(source),
            Computation::FaceIndexHelper { .. } => vec![
                int(names::PROCESSED_FACE_COUNTS),
                int(names::PROCESSED_FACE_INDICES),
            ],
            Computation::GeomSubsetFaceIndices { .. } => vec![int(names::COARSE_FACE_INDEX)],
            Computation::RefinedIndices => self
                .refinement
                .map(|refinement| refinement.index_buffer_specs())
                .unwrap_or_default(),
            Computation::RefinedFaceMap => vec![
                int(names::BASE_FACE_TO_REFINED_FACES_MAP),
                int(names::REFINED_FACE_COUNTS),
            ],
            Computation::IndexSubset { index_builder, .. } => dependency_specs(index_builder),
        }
    }

    fn commit(&mut self, id: ComputationId, value: &ComputedValue) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let Some(source) = value.to_buffer_source() else {
            return;
        };

        let declared = &self.entries[id.0].specs;
        let mut buffers = Vec::with_capacity(1 + source.chained.len());
        flatten(&source, &mut buffers);
        for (index, buffer) in buffers.into_iter().enumerate() {
            let spec = BufferSpec::new(buffer.name.clone(), buffer.tuple_type());
            if declared.get(index) != Some(&spec) {
                log::error!(
                    "{} '{}' produced {} '{}' which was not declared",
                    id,
                    self.entries[id.0].computation.name(),
                    spec.tuple_type,
                    spec.name
                );
            }
            sink.commit(&spec, &buffer.data);
        }
    }
}

fn flatten<'s>(source: &'s BufferSource, buffers: &mut Vec<&'s BufferSource>) {
    buffers.push(source);
    for chained in &source.chained {
        flatten(chained, buffers);
    }
}
