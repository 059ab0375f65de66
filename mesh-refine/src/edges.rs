//! Authored edge enumeration.
//!
//! Every face corner starts one edge, so edge `e` of the mesh is the edge
//! leaving the corner at position `e` in `face_vertex_indices`. Shared edges
//! therefore appear once per incident face. This is the edge numbering
//! [`TriangleIndices::edge_indices`](crate::TriangleIndices) and
//! [`QuadIndices::edge_indices`](crate::QuadIndices) refer to.
use itertools::Itertools;

use crate::{
    topology::MeshTopology,
    util::{Diagnostic, Diagnostics},
};

/// Lists the vertex pair of every authored edge, larger index first.
///
/// For left handed topologies, the corners of each face are walked in
/// reverse so edge numbering follows the flipped winding.
pub fn enumerate_edges(topology: &MeshTopology) -> Vec<[i32; 2]> {
    let flip = topology.get_orientation().is_flipped();
    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut edges = Vec::with_capacity(topology.num_face_varyings());

    for face in topology.faces() {
        let Some(corners) = topology.face_vertices(&face) else {
            diagnostics.raise(Diagnostic::InconsistentTopology);
            edges.extend(std::iter::repeat([0, 0]).take(face.len()));
            continue;
        };
        let nv = corners.len();
        if flip {
            edges.extend(
                (1..=nv)
                    .rev()
                    .map(|j| ordered_edge(corners[j % nv], corners[j - 1])),
            );
        } else {
            edges.extend(
                corners
                    .iter()
                    .circular_tuple_windows()
                    .map(|(&v0, &v1)| ordered_edge(v0, v1)),
            );
        }
    }

    edges
}

#[inline]
fn ordered_edge(v0: i32, v1: i32) -> [i32; 2] {
    if v0 < v1 {
        [v1, v0]
    } else {
        [v0, v1]
    }
}

/// Maps between authored edge indices and edge vertex pairs.
#[derive(Clone, Debug, Default)]
pub struct MeshEdgeIndexTable {
    edge_vertices: Vec<[i32; 2]>,
    // (vertices, edge index), sorted.
    edges_by_vertices: Vec<([i32; 2], i32)>,
}

impl MeshEdgeIndexTable {
    pub fn new(topology: &MeshTopology) -> Self {
        let edge_vertices = enumerate_edges(topology);
        let edges_by_vertices = edge_vertices
            .iter()
            .enumerate()
            .map(|(index, &edge)| (edge, index as i32))
            .sorted_unstable()
            .collect();
        Self {
            edge_vertices,
            edges_by_vertices,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edge_vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edge_vertices.is_empty()
    }

    /// The vertex pair of `edge_index`, larger index first.
    pub fn vertices_for_edge_index(&self, edge_index: i32) -> Option<[i32; 2]> {
        usize::try_from(edge_index)
            .ok()
            .and_then(|index| self.edge_vertices.get(index))
            .copied()
    }

    /// The distinct vertex pairs of `edge_indices`, in ascending order.
    /// Invalid indices are ignored.
    pub fn vertices_for_edge_indices(&self, edge_indices: &[i32]) -> Vec<[i32; 2]> {
        edge_indices
            .iter()
            .filter_map(|&index| self.vertices_for_edge_index(index))
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// All edge indices (one per incident face) of the edge between the two
    /// vertices, in either order.
    pub fn edge_indices(&self, edge: [i32; 2]) -> Vec<i32> {
        let key = ordered_edge(edge[0], edge[1]);
        let start = self
            .edges_by_vertices
            .partition_point(|(vertices, _)| *vertices < key);
        self.edges_by_vertices[start..]
            .iter()
            .take_while(|(vertices, _)| *vertices == key)
            .map(|&(_, index)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_is_listed_per_face() {
        let topology = MeshTopology::new(vec![3, 3], vec![0, 1, 2, 2, 1, 3]);
        let table = MeshEdgeIndexTable::new(&topology);

        assert_eq!(table.len(), 6);
        assert_eq!(table.vertices_for_edge_index(1), Some([2, 1]));
        assert_eq!(table.vertices_for_edge_index(6), None);
        assert_eq!(table.edge_indices([1, 2]), [1, 3]);
        assert!(table.edge_indices([0, 3]).is_empty());
        assert_eq!(
            table.vertices_for_edge_indices(&[1, 3, 0, -1]),
            [[1, 0], [2, 1]]
        );
    }

    #[test]
    fn left_handed_walks_backwards() {
        let mut topology = MeshTopology::new(vec![3], vec![0, 1, 2]);
        topology.left_handed(true);
        assert_eq!(enumerate_edges(&topology), [[2, 0], [2, 1], [1, 0]]);
    }
}
