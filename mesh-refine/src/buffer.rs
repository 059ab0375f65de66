//! Buffer specs and typed buffer payloads.
//!
//! Everything the kernels in this crate produce ends up in a
//! [`BufferSource`]: a named, typed flat array plus an optional list of
//! *chained* buffers that carry one entry per entry of the primary array
//! (e.g. a triangle index buffer chained with its primitive params).
//!
//! Storage and upload of these buffers is not done here. A [`BufferSink`]
//! receives the declared [`BufferSpec`]s and the resolved data.
use bytemuck::Pod;
use derive_more::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use slice_of_array::prelude::*;
use std::collections::HashMap;

use crate::normals::PackedNormal;
use crate::{Error, Result};

/// The scalar/tuple type of a single buffer element.
#[repr(u32)]
#[derive(Display, TryFromPrimitive, IntoPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int32,
    Int32Vec2,
    Int32Vec3,
    Int32Vec4,
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Double,
    DoubleVec2,
    DoubleVec3,
    DoubleVec4,
    /// Signed normalized 2_10_10_10, see [`PackedNormal`].
    PackedNormal,
}

/// An element type plus the number of elements making up one entry of a
/// buffer (e.g. `Int32` x 6 for tri-quad index buffers).
#[derive(Display, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[display("{element}[{count}]")]
pub struct TupleType {
    pub element: ElementType,
    pub count: usize,
}

impl TupleType {
    pub fn new(element: ElementType, count: usize) -> Self {
        Self { element, count }
    }

    pub fn single(element: ElementType) -> Self {
        Self { element, count: 1 }
    }
}

/// Declares a buffer before any data for it is produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferSpec {
    pub name: String,
    pub tuple_type: TupleType,
}

impl BufferSpec {
    pub fn new(name: impl Into<String>, tuple_type: TupleType) -> Self {
        Self {
            name: name.into(),
            tuple_type,
        }
    }
}

/// Well known buffer names.
pub mod names {
    pub const INDICES: &str = "indices";
    pub const PRIMITIVE_PARAM: &str = "primitiveParam";
    pub const EDGE_INDICES: &str = "edgeIndices";
    pub const POINTS: &str = "points";
    pub const SMOOTH_NORMALS: &str = "smoothNormals";
    pub const PACKED_SMOOTH_NORMALS: &str = "packedSmoothNormals";
    pub const FLAT_NORMALS: &str = "flatNormals";
    pub const PACKED_FLAT_NORMALS: &str = "packedFlatNormals";
    pub const ADJACENCY: &str = "adjacency";
    pub const PROCESSED_FACE_COUNTS: &str = "processedFaceCounts";
    pub const PROCESSED_FACE_INDICES: &str = "processedFaceIndices";
    pub const COARSE_FACE_INDEX: &str = "coarseFaceIndex";
    pub const BASE_FACE_TO_REFINED_FACES_MAP: &str = "baseFaceToRefinedFacesMap";
    pub const REFINED_FACE_COUNTS: &str = "refinedFaceCounts";
}

/// A typed flat array.
#[derive(Clone, Debug, PartialEq)]
pub enum BufferData {
    Int32(Vec<i32>),
    Int32Vec2(Vec<[i32; 2]>),
    Int32Vec3(Vec<[i32; 3]>),
    Int32Vec4(Vec<[i32; 4]>),
    Float(Vec<f32>),
    FloatVec2(Vec<[f32; 2]>),
    FloatVec3(Vec<[f32; 3]>),
    FloatVec4(Vec<[f32; 4]>),
    Double(Vec<f64>),
    DoubleVec2(Vec<[f64; 2]>),
    DoubleVec3(Vec<[f64; 3]>),
    DoubleVec4(Vec<[f64; 4]>),
    PackedNormal(Vec<PackedNormal>),
}

/// Expands `$body` once per variant with `$v` bound to the inner `Vec`.
macro_rules! for_each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            BufferData::Int32($v) => $body,
            BufferData::Int32Vec2($v) => $body,
            BufferData::Int32Vec3($v) => $body,
            BufferData::Int32Vec4($v) => $body,
            BufferData::Float($v) => $body,
            BufferData::FloatVec2($v) => $body,
            BufferData::FloatVec3($v) => $body,
            BufferData::FloatVec4($v) => $body,
            BufferData::Double($v) => $body,
            BufferData::DoubleVec2($v) => $body,
            BufferData::DoubleVec3($v) => $body,
            BufferData::DoubleVec4($v) => $body,
            BufferData::PackedNormal($v) => $body,
        }
    };
}
pub(crate) use for_each_variant;

impl BufferData {
    pub fn element_type(&self) -> ElementType {
        match self {
            BufferData::Int32(_) => ElementType::Int32,
            BufferData::Int32Vec2(_) => ElementType::Int32Vec2,
            BufferData::Int32Vec3(_) => ElementType::Int32Vec3,
            BufferData::Int32Vec4(_) => ElementType::Int32Vec4,
            BufferData::Float(_) => ElementType::Float,
            BufferData::FloatVec2(_) => ElementType::FloatVec2,
            BufferData::FloatVec3(_) => ElementType::FloatVec3,
            BufferData::FloatVec4(_) => ElementType::FloatVec4,
            BufferData::Double(_) => ElementType::Double,
            BufferData::DoubleVec2(_) => ElementType::DoubleVec2,
            BufferData::DoubleVec3(_) => ElementType::DoubleVec3,
            BufferData::DoubleVec4(_) => ElementType::DoubleVec4,
            BufferData::PackedNormal(_) => ElementType::PackedNormal,
        }
    }

    /// Number of elements (not entries, see [`BufferSource::len()`]).
    pub fn len(&self) -> usize {
        for_each_variant!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// An empty array of the same element type.
    pub fn empty_like(&self) -> BufferData {
        let mut data = self.clone();
        for_each_variant!(&mut data, v => v.clear());
        data
    }

    /// Raw bytes, for handing over to a GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        for_each_variant!(self, v => as_bytes(v.as_slice()))
    }

    /// Returns the data as a flat `i32` slice if it is of an `Int32*` type.
    pub fn as_i32_flat(&self) -> Option<&[i32]> {
        match self {
            BufferData::Int32(v) => Some(v.as_slice()),
            BufferData::Int32Vec2(v) => Some(v.flat()),
            BufferData::Int32Vec3(v) => Some(v.flat()),
            BufferData::Int32Vec4(v) => Some(v.flat()),
            _ => None,
        }
    }
}

#[inline]
fn as_bytes<T: Pod>(values: &[T]) -> &[u8] {
    bytemuck::cast_slice(values)
}

/// A named buffer with optional chained buffers.
///
/// `array_size` is the number of elements forming one entry (one primitive
/// for index buffers). Chained buffers always have one entry per entry of
/// the primary buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferSource {
    pub name: String,
    pub data: BufferData,
    pub array_size: usize,
    pub chained: Vec<BufferSource>,
}

impl BufferSource {
    pub fn new(name: impl Into<String>, data: BufferData) -> Self {
        Self {
            name: name.into(),
            data,
            array_size: 1,
            chained: Vec::new(),
        }
    }

    /// Set the number of elements per entry.
    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = array_size.max(1);
        self
    }

    /// Chain an auxiliary buffer.
    pub fn chain(mut self, buffer: BufferSource) -> Self {
        self.chained.push(buffer);
        self
    }

    pub fn tuple_type(&self) -> TupleType {
        TupleType::new(self.data.element_type(), self.array_size)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len() / self.array_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Finds a chained buffer by name.
    pub fn chained_buffer(&self, name: &str) -> Option<&BufferSource> {
        self.chained.iter().find(|b| b.name == name)
    }

    /// Specs of this buffer followed by the specs of all chained buffers.
    pub fn buffer_specs(&self) -> Vec<BufferSpec> {
        std::iter::once(BufferSpec::new(self.name.clone(), self.tuple_type()))
            .chain(self.chained.iter().flat_map(|b| b.buffer_specs()))
            .collect()
    }

    /// Checks that every chained buffer has exactly as many
    /// entries as this one.
    pub fn check_chained(&self) -> Result<()> {
        for chained in &self.chained {
            if chained.len() != self.len() {
                return Err(Error::InvalidBufferSize {
                    expected: self.len(),
                    actual: chained.len(),
                });
            }
        }
        Ok(())
    }
}

/// The downstream consumer of resolved buffers.
pub trait BufferSink {
    /// Called once per buffer (primary and each chained one) after it was
    /// resolved. The spec passed is the one declared before resolution.
    fn commit(&mut self, spec: &BufferSpec, data: &BufferData);
}

/// A [`BufferSink`] that keeps everything in memory, keyed by name.
///
/// Useful for reading buffers back on the CPU.
#[derive(Default, Debug)]
pub struct MemorySink {
    buffers: HashMap<String, (BufferSpec, BufferData)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&BufferData> {
        self.buffers.get(name).map(|(_, data)| data)
    }

    pub fn spec(&self, name: &str) -> Option<&BufferSpec> {
        self.buffers.get(name).map(|(spec, _)| spec)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl BufferSink for MemorySink {
    fn commit(&mut self, spec: &BufferSpec, data: &BufferData) {
        self.buffers
            .insert(spec.name.clone(), (spec.clone(), data.clone()));
    }
}
