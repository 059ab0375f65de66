//! Packing of the per-primitive *coarse face index + edge flag* word.
//!
//! ```text
//!  31                               2 1 0
//! +----------------------------------+---+
//! |         coarse face index        |flg|
//! +----------------------------------+---+
//! ```
//!
//! The same layout must be used by whatever shading stage decodes the
//! buffer.
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Which synthetic (decomposition-introduced) edges of a primitive to hide in
/// wireframe drawing.
///
/// For fan triangles, corner `0` is the fan origin:
///
/// ```text
///          0__                0  0   0__
///        _/|\ \_            _/.  ..   . \_
///      _/  | \  \_   ->   _/  .  . .   .  \_
///     /  A |C \ B \_     /  A .  .C .   . B \_
///    1-----2---3----4   1-----2  1---2   1----2
/// ```
#[repr(i32)]
#[derive(TryFromPrimitive, IntoPrimitive, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeFlag {
    /// Primitive is an authored face. Show all edges.
    #[default]
    ShowAll = 0,
    /// First primitive of a split face (`A`). Hides edge `[2-0]`.
    First = 1,
    /// Last primitive of a split face (`B`). Hides edge `[0-1]`.
    Last = 2,
    /// Interior primitive of a split face (`C`). Hides both.
    Interior = 3,
}

impl EdgeFlag {
    /// The flag of primitive `j` out of `count` primitives a face was split
    /// into.
    #[inline]
    pub fn for_split(j: usize, count: usize) -> Self {
        if count < 2 {
            EdgeFlag::ShowAll
        } else if 0 == j {
            EdgeFlag::First
        } else if count - 1 == j {
            EdgeFlag::Last
        } else {
            EdgeFlag::Interior
        }
    }
}

#[inline]
pub fn encode_coarse_face_param(coarse_face_index: usize, edge_flag: EdgeFlag) -> i32 {
    ((coarse_face_index as i32) << 2) | (i32::from(edge_flag) & 3)
}

#[inline]
pub fn decode_face_index(coarse_face_param: i32) -> usize {
    (coarse_face_param >> 2) as usize
}

#[inline]
pub fn decode_edge_flag(coarse_face_param: i32) -> EdgeFlag {
    // Two bits always map onto a variant.
    EdgeFlag::try_from(coarse_face_param & 3).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode() {
        let param = encode_coarse_face_param(1234, EdgeFlag::Last);
        assert_eq!(param, (1234 << 2) | 2);
        assert_eq!(decode_face_index(param), 1234);
        assert_eq!(decode_edge_flag(param), EdgeFlag::Last);
    }

    #[test]
    fn split_flags() {
        assert_eq!(EdgeFlag::for_split(0, 1), EdgeFlag::ShowAll);
        let flags: Vec<_> = (0..4).map(|j| EdgeFlag::for_split(j, 4)).collect();
        assert_eq!(
            flags,
            [
                EdgeFlag::First,
                EdgeFlag::Interior,
                EdgeFlag::Interior,
                EdgeFlag::Last
            ]
        );
    }
}
