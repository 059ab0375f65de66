//! Memoized topology-derived tables.
//!
//! Several consumers (e.g. every primvar of a mesh, or several meshes
//! instancing the same topology) need the same adjacency table, quad info
//! or face index helper. A [`TableCache`] builds each of them once per
//! `(topology version, table)` key and hands out shared [`Arc`]s.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    adjacency::VertexAdjacency,
    options::RefineMode,
    quadrangulate::{compute_quad_info, QuadInfo},
    subdivision::{RefinedFaceMap, Refinement},
    subset::FaceIndexHelper,
    topology::MeshTopology,
    Result,
};

/// Which table of a topology an entry holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableKey {
    Adjacency,
    QuadInfo,
    FaceIndexHelper { refined: bool, quadrangulated: bool },
    RefinedFaceMap {
        refine_level: usize,
        refine_mode: RefineMode,
        adaptive: bool,
    },
}

#[derive(Clone, Debug)]
enum CachedTable {
    Adjacency(Arc<VertexAdjacency>),
    QuadInfo(Arc<QuadInfo>),
    FaceIndexHelper(Arc<FaceIndexHelper>),
    RefinedFaceMap(Arc<RefinedFaceMap>),
}

/// Lookup-or-build cache for topology-derived tables.
///
/// Entries are keyed by [`MeshTopology::version()`], so a changed topology
/// simply misses. Stale entries stay until [`invalidate()`](Self::invalidate)
/// or [`clear()`](Self::clear) is called.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: Mutex<HashMap<(u64, TableKey), CachedTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjacency(&self, topology: &MeshTopology) -> Result<Arc<VertexAdjacency>> {
        self.get_or_build(
            (topology.version(), TableKey::Adjacency),
            |table| match table {
                CachedTable::Adjacency(adjacency) => Some(adjacency.clone()),
                _ => None,
            },
            CachedTable::Adjacency,
            || VertexAdjacency::build(topology),
        )
    }

    pub fn quad_info(&self, topology: &MeshTopology) -> Arc<QuadInfo> {
        let table = self.get_or_build(
            (topology.version(), TableKey::QuadInfo),
            |table| match table {
                CachedTable::QuadInfo(quad_info) => Some(quad_info.clone()),
                _ => None,
            },
            CachedTable::QuadInfo,
            || Ok(compute_quad_info(topology)),
        );
        // Building quad info does not fail.
        table.unwrap_or_default()
    }

    pub fn face_index_helper(
        &self,
        topology: &MeshTopology,
        refined: bool,
        quadrangulated: bool,
    ) -> Arc<FaceIndexHelper> {
        let table = self.get_or_build(
            (
                topology.version(),
                TableKey::FaceIndexHelper {
                    refined,
                    quadrangulated,
                },
            ),
            |table| match table {
                CachedTable::FaceIndexHelper(helper) => Some(helper.clone()),
                _ => None,
            },
            CachedTable::FaceIndexHelper,
            || Ok(FaceIndexHelper::new(topology, refined, quadrangulated)),
        );
        table.unwrap_or_default()
    }

    /// The refined face map of `refinement`, which must be the refinement of
    /// `topology`. Keyed by the options the refinement was built with.
    pub fn refined_face_map(
        &self,
        topology: &MeshTopology,
        refinement: &dyn Refinement,
    ) -> Arc<RefinedFaceMap> {
        let options = refinement.refine_options();
        let table = self.get_or_build(
            (
                topology.version(),
                TableKey::RefinedFaceMap {
                    refine_level: options.refine_level,
                    refine_mode: options.refine_mode,
                    adaptive: options.adaptive,
                },
            ),
            |table| match table {
                CachedTable::RefinedFaceMap(map) => Some(map.clone()),
                _ => None,
            },
            CachedTable::RefinedFaceMap,
            || Ok(RefinedFaceMap::from_refinement(refinement)),
        );
        table.unwrap_or_default()
    }

    /// Drops all tables of the topology with the given version.
    pub fn invalidate(&self, version: u64) {
        self.lock().retain(|(entry_version, _), _| *entry_version != version);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(u64, TableKey), CachedTable>> {
        // A panic while holding the lock cannot leave a half written entry.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_or_build<T>(
        &self,
        key: (u64, TableKey),
        get: impl Fn(&CachedTable) -> Option<Arc<T>>,
        wrap: impl FnOnce(Arc<T>) -> CachedTable,
        build: impl FnOnce() -> Result<T>,
    ) -> Result<Arc<T>> {
        if let Some(table) = self.lock().get(&key).and_then(&get) {
            log::trace!("Table cache hit for {:?}", key);
            return Ok(table);
        }

        // Built without holding the lock. If another thread won the race its
        // table is kept.
        let table = Arc::new(build()?);
        let mut tables = self.lock();
        let entry = tables.entry(key).or_insert_with(|| wrap(table.clone()));
        Ok(get(entry).unwrap_or(table))
    }
}
