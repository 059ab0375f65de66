//! Geom subsets: named partitions of a mesh's faces, usually carrying a
//! material binding.
use crate::Error;

/// A set of coarse faces that is drawn with its own material.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeomSubset {
    /// Identifier (usually a scene path).
    pub id: String,
    /// The material bound to the faces.
    pub material_id: String,
    /// Coarse face indices.
    pub indices: Vec<i32>,
}

impl GeomSubset {
    pub fn new(id: impl Into<String>, material_id: impl Into<String>, indices: Vec<i32>) -> Self {
        Self {
            id: id.into(),
            material_id: material_id.into(),
            indices,
        }
    }
}

/// Subsets after [`sanitize_geom_subsets()`] plus the faces no subset
/// claims.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizedGeomSubsets {
    pub subsets: Vec<GeomSubset>,
    /// Ascending coarse face indices not in any subset.
    pub non_subset_faces: Vec<i32>,
}

impl SanitizedGeomSubsets {
    /// `true` if no subset survived sanitization.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    /// All face indices in subset order, followed by the non-subset faces.
    pub fn all_faces(&self) -> impl Iterator<Item = i32> + '_ {
        self.subsets
            .iter()
            .flat_map(|subset| subset.indices.iter().copied())
            .chain(self.non_subset_faces.iter().copied())
    }
}

/// Makes subsets safe to draw.
///
/// * Subsets without indices or without a material are dropped.
/// * Indices outside `0..num_faces` are dropped.
/// * A face claimed by several subsets stays with the first one.
///
/// Every dropped index is reported. Afterwards every face is either in
/// exactly one subset or in `non_subset_faces`, unless `geom_subsets` is
/// empty, in which case both lists are empty.
pub fn sanitize_geom_subsets(
    geom_subsets: &[GeomSubset],
    num_faces: usize,
    id: &str,
) -> SanitizedGeomSubsets {
    let mut face_is_used = vec![false; num_faces];
    let mut subsets = Vec::with_capacity(geom_subsets.len());

    for subset in geom_subsets {
        if subset.indices.is_empty() || subset.material_id.is_empty() {
            continue;
        }

        let indices: Vec<i32> = subset
            .indices
            .iter()
            .copied()
            .filter(|&index| {
                let error = match usize::try_from(index) {
                    Ok(face) if face < num_faces => {
                        if !face_is_used[face] {
                            face_is_used[face] = true;
                            return true;
                        }
                        Error::DuplicateSubsetIndex { index }
                    }
                    _ => Error::OutOfRangeSubsetIndex {
                        index,
                        face_count: num_faces,
                    },
                };
                if id.is_empty() {
                    log::warn!("{} in subset '{}'", error, subset.id);
                } else {
                    log::warn!("{} in subset '{}' [{}]", error, subset.id, id);
                }
                false
            })
            .collect();

        if indices.is_empty() {
            continue;
        }
        subsets.push(GeomSubset {
            indices,
            ..subset.clone()
        });
    }

    // Without any authored subset there is nothing to partition.
    let non_subset_faces = if geom_subsets.is_empty() {
        Vec::new()
    } else {
        face_is_used
            .iter()
            .enumerate()
            .filter(|(_, &used)| !used)
            .map(|(face, _)| face as i32)
            .collect()
    };

    SanitizedGeomSubsets {
        subsets,
        non_subset_faces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_stay_with_first_subset() {
        let subsets = [
            GeomSubset::new("/a", "/m0", vec![0, 2, 9]),
            GeomSubset::new("/b", "/m1", vec![2, 3, -1]),
            GeomSubset::new("/c", "", vec![1]),
        ];
        let sanitized = sanitize_geom_subsets(&subsets, 5, "/mesh");

        assert_eq!(sanitized.subsets.len(), 2);
        assert_eq!(sanitized.subsets[0].indices, [0, 2]);
        assert_eq!(sanitized.subsets[1].indices, [3]);
        assert_eq!(sanitized.non_subset_faces, [1, 4]);
    }
}
