//! Tests for authored edge enumeration and the edge index table.
use mesh_refine::{
    edges::{enumerate_edges, MeshEdgeIndexTable},
    triangulate::compute_triangle_indices,
    MeshTopology,
};

fn two_quads() -> MeshTopology {
    // 3---2---5
    // |   |   |
    // 0---1---4
    MeshTopology::new(vec![4, 4], vec![0, 1, 2, 3, 1, 4, 5, 2])
}

#[test]
fn test_enumerate_edges() {
    assert_eq!(
        enumerate_edges(&two_quads()),
        [
            [1, 0],
            [2, 1],
            [3, 2],
            [3, 0],
            [4, 1],
            [5, 4],
            [5, 2],
            [2, 1],
        ]
    );
}

#[test]
fn test_enumerate_edges_left_handed() {
    let mut topology = MeshTopology::new(vec![3], vec![0, 1, 2]);
    topology.left_handed(true);
    assert_eq!(enumerate_edges(&topology), [[2, 0], [2, 1], [1, 0]]);
}

#[test]
fn test_edge_index_table() {
    let table = MeshEdgeIndexTable::new(&two_quads());
    assert_eq!(table.len(), 8);

    assert_eq!(table.vertices_for_edge_index(5), Some([5, 4]));
    assert_eq!(table.vertices_for_edge_index(8), None);
    assert_eq!(table.vertices_for_edge_index(-1), None);

    // The shared edge is listed once per face, in either vertex order.
    assert_eq!(table.edge_indices([1, 2]), [1, 7]);
    assert_eq!(table.edge_indices([2, 1]), [1, 7]);
    assert!(table.edge_indices([0, 5]).is_empty());

    assert_eq!(
        table.vertices_for_edge_indices(&[7, 1, 0, 42]),
        [[1, 0], [2, 1]]
    );
}

#[test]
fn test_triangle_edge_indices_resolve() {
    let topology = MeshTopology::new(vec![5], vec![0, 1, 2, 3, 4]);
    let triangles = compute_triangle_indices(&topology);
    let table = MeshEdgeIndexTable::new(&topology);

    // Each fan triangle starts at the authored edge leaving its second
    // corner.
    for (triangle, &edge) in triangles.indices.iter().zip(&triangles.edge_indices) {
        let [a, b] = table
            .vertices_for_edge_index(edge)
            .expect("edge index in range");
        assert_eq!([a, b], [triangle[1].max(triangle[2]), triangle[1].min(triangle[2])]);
    }
}
