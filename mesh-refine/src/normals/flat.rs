use crate::{
    math::Point3,
    normals::PackedNormal,
    topology::{collapse_corner_ring, HoleCursor, MeshTopology},
    util::{parallel_map, Diagnostic, Diagnostics},
};

/// Computes one normal per *valid* face: a face that is not a hole and has
/// at least three distinct corners once consecutive repeats are collapsed.
///
/// The normal is `normalize(cross(v1 - v0, v2 - v0))` of the first three
/// collapsed corners, negated for left handed topologies. Use
/// [`flat_normal_faces()`] to map entries back to coarse faces.
///
/// Faces referencing points outside `points` get a zero normal so the output
/// stays aligned with [`flat_normal_faces()`].
pub fn compute_flat_normals<P: Point3>(topology: &MeshTopology, points: &[P]) -> Vec<P> {
    let faces = valid_face_corners(topology);
    let flip = topology.get_orientation().is_flipped();
    let mut diagnostics = Diagnostics::new(topology.get_id());
    if faces
        .iter()
        .flat_map(|(_, corners)| corners)
        .any(|&vertex| points.len() <= vertex as usize)
    {
        diagnostics.raise(Diagnostic::VertexOutOfRange);
    }
    parallel_map(faces.len(), |i| face_normal(&faces[i].1, points, flip))
}

/// Same as [`compute_flat_normals()`] but stores [`PackedNormal`]s.
pub fn compute_packed_flat_normals<P: Point3>(
    topology: &MeshTopology,
    points: &[P],
) -> Vec<PackedNormal> {
    compute_flat_normals(topology, points)
        .iter()
        .map(PackedNormal::from_point)
        .collect()
}

/// The coarse face index of each entry [`compute_flat_normals()`] returns.
pub fn flat_normal_faces(topology: &MeshTopology) -> Vec<i32> {
    valid_face_corners(topology)
        .into_iter()
        .map(|(face, _)| face as i32)
        .collect()
}

fn face_normal<P: Point3>(corners: &[i32; 3], points: &[P], flip: bool) -> P {
    let [Some(&v0), Some(&v1), Some(&v2)] = corners.map(|vertex| points.get(vertex as usize))
    else {
        return P::zero();
    };
    let normal = (v1 - v0).cross(v2 - v0).normalized_or_zero();
    if flip {
        -normal
    } else {
        normal
    }
}

/// Coarse face index and first three collapsed corners of every valid face.
fn valid_face_corners(topology: &MeshTopology) -> Vec<(usize, [i32; 3])> {
    let mut holes = HoleCursor::new(topology.hole_indices());
    let mut diagnostics = Diagnostics::new(topology.get_id());
    let mut ring = Vec::new();

    topology
        .faces()
        .filter_map(|face| {
            if holes.is_hole(face.index) {
                return None;
            }
            if face.is_degenerate() {
                diagnostics.raise(Diagnostic::DegenerateFace);
                return None;
            }
            let Some(vertices) = topology.face_vertices(&face) else {
                diagnostics.raise(Diagnostic::InconsistentTopology);
                return None;
            };
            collapse_corner_ring(vertices, &mut ring);
            if ring.len() < 3 {
                return None;
            }
            Some((face.index, [ring[0], ring[1], ring[2]]))
        })
        .collect()
}
