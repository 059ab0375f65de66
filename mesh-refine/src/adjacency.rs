//! Per-vertex face-corner neighbor table.
//!
//! The table is a single flat `i32` array, so it can be uploaded as is and
//! consumed by a GPU smooth normals kernel:
//!
//! ```text
//! [ offset_0, valence_0, offset_1, valence_1, ...     // 2 * num_points
//!   prev, next, prev, next, ...                       // 2 * valence_0
//!   prev, next, ...                                   // 2 * valence_1
//!   ... ]
//! ```
//!
//! `offset_i` is the absolute position in the table of the first `(prev,
//! next)` pair of point `i`. Pairs are stored in face visitation order.
use crate::{
    buffer::{names, BufferData, BufferSource},
    topology::{collapse_corner_ring, FaceRef, MeshTopology},
    util::{Diagnostic, Diagnostics},
    Error, Result,
};

/// The neighbor table for smooth normals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexAdjacency {
    num_points: usize,
    table: Vec<i32>,
}

impl VertexAdjacency {
    /// Builds the table with a two pass scan over the faces.
    ///
    /// Consecutive repeated corners are collapsed first. Faces left with
    /// less than three corners contribute nothing. Faces overrunning the
    /// index array or referencing vertices outside the point domain are
    /// skipped with a diagnostic. Winding is normalized so a left handed
    /// mesh yields the same `(prev, next)` convention as a right handed one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTopology`] if a face has a negative vertex
    /// count.
    pub fn build(topology: &MeshTopology) -> Result<Self> {
        if let Some(face) = topology.faces().find(|face| face.count < 0) {
            return Err(Error::InvalidTopology(format!(
                "Face {} has a negative vertex count ({}) [{}]",
                face.index,
                face.count,
                topology.get_id()
            )));
        }

        let num_points = topology.get_num_points();
        let flip = topology.get_orientation().is_flipped();
        let mut diagnostics = Diagnostics::new(topology.get_id());
        let mut ring = Vec::new();

        // Pass 1: valences.
        let mut valences = vec![0i32; num_points];
        for face in topology.faces() {
            if contributing_ring(topology, &face, num_points, &mut ring, &mut diagnostics) {
                ring.iter().for_each(|&vertex| valences[vertex as usize] += 1);
            }
        }

        // Offsets.
        let mut table = vec![0i32; 2 * num_points];
        let mut offset = 2 * num_points as i32;
        for (point, &valence) in valences.iter().enumerate() {
            table[2 * point] = offset;
            table[2 * point + 1] = valence;
            offset += 2 * valence;
        }
        table.resize(offset as usize, 0);

        // Pass 2: neighbor pairs.
        let mut cursors: Vec<usize> = (0..num_points)
            .map(|point| table[2 * point] as usize)
            .collect();
        for face in topology.faces() {
            if !contributing_ring(topology, &face, num_points, &mut ring, &mut diagnostics) {
                continue;
            }
            let len = ring.len();
            for j in 0..len {
                let vertex = ring[j] as usize;
                let mut prev = ring[(j + len - 1) % len];
                let mut next = ring[(j + 1) % len];
                if flip {
                    std::mem::swap(&mut prev, &mut next);
                }
                let cursor = &mut cursors[vertex];
                table[*cursor] = prev;
                table[*cursor + 1] = next;
                *cursor += 2;
            }
        }

        log::debug!(
            "Built vertex adjacency for {} points ({} ints) [{}]",
            num_points,
            table.len(),
            topology.get_id()
        );

        Ok(Self { num_points, table })
    }

    /// Wraps an existing flat table, e.g. one read back from a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBufferSize`] if the header or any of the
    /// offset/valence ranges do not fit the table.
    pub fn from_table(table: Vec<i32>) -> Result<Self> {
        let num_points = table.first().map_or(0, |&offset| offset.max(0) as usize / 2);
        if table.len() < 2 * num_points {
            return Err(Error::InvalidBufferSize {
                expected: 2 * num_points,
                actual: table.len(),
            });
        }
        for point in 0..num_points {
            let (offset, valence) = (table[2 * point], table[2 * point + 1]);
            if offset < 2 * num_points as i32 || valence < 0 {
                return Err(Error::InvalidTopology(format!(
                    "Corrupt adjacency entry ({}, {}) for point {}",
                    offset, valence, point
                )));
            }
            let end = offset as usize + 2 * valence as usize;
            if table.len() < end {
                return Err(Error::InvalidBufferSize {
                    expected: end,
                    actual: table.len(),
                });
            }
        }
        Ok(Self { num_points, table })
    }

    /// Size of the point domain the table covers.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    #[inline]
    pub fn table(&self) -> &[i32] {
        &self.table
    }

    pub fn into_table(self) -> Vec<i32> {
        self.table
    }

    /// Number of face corners incident to `point`.
    pub fn valence(&self, point: usize) -> usize {
        if point < self.num_points {
            self.table[2 * point + 1] as usize
        } else {
            0
        }
    }

    /// The `(prev, next)` neighbor pairs of `point`, one per incident face
    /// corner.
    pub fn neighbors(&self, point: usize) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (offset, valence) = if point < self.num_points {
            (self.table[2 * point] as usize, self.table[2 * point + 1] as usize)
        } else {
            (0, 0)
        };
        self.table[offset..offset + 2 * valence]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
    }

    /// The table as an `Int32` buffer.
    pub fn to_buffer_source(&self) -> BufferSource {
        BufferSource::new(names::ADJACENCY, BufferData::Int32(self.table.clone()))
    }
}

/// Writes the collapsed corner ring of `face` into `ring` and returns
/// `true` if the face contributes to the table.
fn contributing_ring(
    topology: &MeshTopology,
    face: &FaceRef,
    num_points: usize,
    ring: &mut Vec<i32>,
    diagnostics: &mut Diagnostics,
) -> bool {
    let Some(vertices) = topology.face_vertices(face) else {
        diagnostics.raise(Diagnostic::InconsistentTopology);
        return false;
    };
    collapse_corner_ring(vertices, ring);
    if ring.len() < 3 {
        return false;
    }
    if ring
        .iter()
        .any(|&vertex| vertex < 0 || num_points <= vertex as usize)
    {
        diagnostics.raise(Diagnostic::VertexOutOfRange);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_layout() {
        // Two triangles sharing edge 1-2.
        let topology = MeshTopology::new(vec![3, 3], vec![0, 1, 2, 2, 1, 3]);
        let adjacency = VertexAdjacency::build(&topology).unwrap();

        assert_eq!(adjacency.num_points(), 4);
        assert_eq!(adjacency.valence(0), 1);
        assert_eq!(adjacency.valence(1), 2);
        assert_eq!(adjacency.valence(2), 2);
        assert_eq!(adjacency.valence(3), 1);
        assert_eq!(adjacency.table()[0], 8);
        assert_eq!(adjacency.table().len(), 8 + 2 * 6);
        assert_eq!(adjacency.neighbors(1).collect::<Vec<_>>(), [(0, 2), (2, 3)]);
    }

    #[test]
    fn round_trips_through_flat_table() {
        let topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
        let adjacency = VertexAdjacency::build(&topology).unwrap();
        let copy = VertexAdjacency::from_table(adjacency.table().to_vec()).unwrap();
        assert_eq!(copy, adjacency);
    }

    #[test]
    fn truncated_table_is_rejected() {
        let topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
        let mut table = VertexAdjacency::build(&topology).unwrap().into_table();
        table.pop();
        assert!(VertexAdjacency::from_table(table).is_err());
    }
}
