use bytemuck::{Pod, Zeroable};

use crate::math::Point3;

const SCALE: f32 = 511.0;
const MASK: u32 = 0x3ff;

/// A normal packed into a signed normalized 2_10_10_10 word.
///
/// `x` occupies bits 0–9, `y` bits 10–19, `z` bits 20–29 and the (unused)
/// `w` bits 30–31. Each component is rounded to the nearest multiple of
/// `1/511` after clamping to `[-1, 1]`.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedNormal(pub u32);

impl PackedNormal {
    /// Largest per-component difference between a unit vector and its packed
    /// round trip.
    pub const QUANTIZATION_ERROR: f32 = 1.0 / SCALE;

    pub fn pack(normal: [f32; 3]) -> Self {
        Self(to_snorm10(normal[0]) | to_snorm10(normal[1]) << 10 | to_snorm10(normal[2]) << 20)
    }

    pub fn from_point<P: Point3>(normal: &P) -> Self {
        Self::pack(normal.to_f32_array())
    }

    pub fn unpack(&self) -> [f32; 3] {
        [
            from_snorm10(self.0),
            from_snorm10(self.0 >> 10),
            from_snorm10(self.0 >> 20),
        ]
    }
}

#[inline]
fn to_snorm10(value: f32) -> u32 {
    // NaN casts to 0.
    ((value.clamp(-1.0, 1.0) * SCALE).round() as i32 as u32) & MASK
}

#[inline]
fn from_snorm10(bits: u32) -> f32 {
    // Sign extend the low 10 bits.
    let value = (((bits & MASK) << 22) as i32) >> 22;
    (value as f32 / SCALE).max(-1.0)
}
