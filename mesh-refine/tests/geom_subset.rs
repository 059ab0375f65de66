//! Tests for geom subset sanitization.
use mesh_refine::{sanitize_geom_subsets, GeomSubset};

#[test]
fn test_empty_input() {
    let sanitized = sanitize_geom_subsets(&[], 10, "/mesh");
    assert!(sanitized.is_empty());
    assert!(sanitized.non_subset_faces.is_empty());
}

#[test]
fn test_invalid_subsets_are_dropped() {
    let subsets = [
        GeomSubset::new("/a", "/material", Vec::new()),
        GeomSubset::new("/b", "", vec![0, 1]),
    ];
    let sanitized = sanitize_geom_subsets(&subsets, 4, "/mesh");
    assert!(sanitized.is_empty());
    assert_eq!(sanitized.non_subset_faces, [0, 1, 2, 3]);
}

#[test]
fn test_partition() {
    let subsets = [
        GeomSubset::new("/a", "/red", vec![4, 0, -1, 9]),
        GeomSubset::new("/b", "/green", vec![0, 2, 2, 5]),
        GeomSubset::new("/c", "/blue", vec![4]),
    ];
    let sanitized = sanitize_geom_subsets(&subsets, 6, "/mesh");

    assert_eq!(sanitized.subsets.len(), 2);
    assert_eq!(sanitized.subsets[0].indices, [4, 0]);
    assert_eq!(sanitized.subsets[1].id, "/b");
    assert_eq!(sanitized.subsets[1].indices, [2, 5]);
    assert_eq!(sanitized.non_subset_faces, [1, 3]);

    let mut all: Vec<i32> = sanitized.all_faces().collect();
    all.sort_unstable();
    assert_eq!(all, (0..6).collect::<Vec<_>>());
}
