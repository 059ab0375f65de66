//! Element traits the kernels are generic over.
//!
//! [`Point3`] covers positions (single and double precision
//! [`ultraviolet`] vectors). [`PrimvarElement`] covers anything that can be
//! averaged: scalars and 2-, 3- and 4-tuples of `i32`/`f32`/`f64`.
use std::ops::{AddAssign, Neg, Sub};
use ultraviolet::{DVec3, Vec3};

use crate::buffer::BufferData;

/// A 3D point/vector type normals can be computed for.
pub trait Point3:
    Copy + Send + Sync + Sub<Output = Self> + AddAssign + Neg<Output = Self>
{
    fn zero() -> Self;

    fn cross(&self, other: Self) -> Self;

    /// Unit length copy, or zero if the length is zero (or not finite).
    fn normalized_or_zero(&self) -> Self;

    fn to_f32_array(&self) -> [f32; 3];

    /// Wraps a `Vec` of these into typed buffer data.
    fn into_buffer_data(values: Vec<Self>) -> BufferData;
}

macro_rules! impl_point3 {
    ($vec:ty, $scalar:ty, $variant:ident) => {
        impl Point3 for $vec {
            #[inline]
            fn zero() -> Self {
                <$vec>::zero()
            }

            #[inline]
            fn cross(&self, other: Self) -> Self {
                <$vec>::cross(self, other)
            }

            #[inline]
            fn normalized_or_zero(&self) -> Self {
                let mag = self.mag();
                if 0.0 < mag && mag.is_finite() {
                    *self / mag
                } else {
                    <$vec>::zero()
                }
            }

            #[inline]
            fn to_f32_array(&self) -> [f32; 3] {
                [self.x as f32, self.y as f32, self.z as f32]
            }

            fn into_buffer_data(values: Vec<Self>) -> BufferData {
                BufferData::$variant(values.into_iter().map(|v| [v.x, v.y, v.z]).collect())
            }
        }
    };
}

impl_point3!(Vec3, f32, FloatVec3);
impl_point3!(DVec3, f64, DoubleVec3);

/// Converts a nested `[f32; 3]` point array.
pub fn points_from_arrays(points: &[[f32; 3]]) -> Vec<Vec3> {
    points.iter().map(|&p| Vec3::from(p)).collect()
}

/// Converts a nested `[f64; 3]` point array.
pub fn dpoints_from_arrays(points: &[[f64; 3]]) -> Vec<DVec3> {
    points.iter().map(|&p| DVec3::from(p)).collect()
}

/// A primvar value that can be interpolated linearly.
///
/// Arithmetic goes through `f64`, so integer values are truncated after
/// interpolation.
pub trait PrimvarElement: Copy + Send + Sync + 'static {
    fn zero() -> Self;

    fn add(self, other: Self) -> Self;

    fn scale(self, factor: f64) -> Self;

    /// The midpoint of two values.
    #[inline]
    fn midpoint(self, other: Self) -> Self {
        self.add(other).scale(0.5)
    }

    fn into_buffer_data(values: Vec<Self>) -> BufferData;

    /// Borrows typed buffer data as a slice of `Self`, if the types match.
    fn from_buffer_data(data: &BufferData) -> Option<&[Self]>;
}

macro_rules! impl_primvar_scalar {
    ($scalar:ty, $variant:ident) => {
        impl PrimvarElement for $scalar {
            #[inline]
            fn zero() -> Self {
                0 as $scalar
            }

            #[inline]
            fn add(self, other: Self) -> Self {
                (self as f64 + other as f64) as $scalar
            }

            #[inline]
            fn scale(self, factor: f64) -> Self {
                (self as f64 * factor) as $scalar
            }

            fn into_buffer_data(values: Vec<Self>) -> BufferData {
                BufferData::$variant(values)
            }

            fn from_buffer_data(data: &BufferData) -> Option<&[Self]> {
                match data {
                    BufferData::$variant(values) => Some(values.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_primvar_tuple {
    ($scalar:ty, $n:literal, $variant:ident) => {
        impl PrimvarElement for [$scalar; $n] {
            #[inline]
            fn zero() -> Self {
                [0 as $scalar; $n]
            }

            #[inline]
            fn add(mut self, other: Self) -> Self {
                self.iter_mut().zip(other).for_each(|(a, b)| *a = PrimvarElement::add(*a, b));
                self
            }

            #[inline]
            fn scale(mut self, factor: f64) -> Self {
                self.iter_mut().for_each(|a| *a = PrimvarElement::scale(*a, factor));
                self
            }

            fn into_buffer_data(values: Vec<Self>) -> BufferData {
                BufferData::$variant(values)
            }

            fn from_buffer_data(data: &BufferData) -> Option<&[Self]> {
                match data {
                    BufferData::$variant(values) => Some(values.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_primvar_scalar!(i32, Int32);
impl_primvar_scalar!(f32, Float);
impl_primvar_scalar!(f64, Double);
impl_primvar_tuple!(i32, 2, Int32Vec2);
impl_primvar_tuple!(i32, 3, Int32Vec3);
impl_primvar_tuple!(i32, 4, Int32Vec4);
impl_primvar_tuple!(f32, 2, FloatVec2);
impl_primvar_tuple!(f32, 3, FloatVec3);
impl_primvar_tuple!(f32, 4, FloatVec4);
impl_primvar_tuple!(f64, 2, DoubleVec2);
impl_primvar_tuple!(f64, 3, DoubleVec3);
impl_primvar_tuple!(f64, 4, DoubleVec4);

/// Dispatches `$body` over the int/float/double primvar variants of a
/// [`BufferData`], binding `$values` to the typed slice. Evaluates to
/// `None` for packed data.
macro_rules! with_primvar_slice {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            BufferData::Int32($values) => Some($body),
            BufferData::Int32Vec2($values) => Some($body),
            BufferData::Int32Vec3($values) => Some($body),
            BufferData::Int32Vec4($values) => Some($body),
            BufferData::Float($values) => Some($body),
            BufferData::FloatVec2($values) => Some($body),
            BufferData::FloatVec3($values) => Some($body),
            BufferData::FloatVec4($values) => Some($body),
            BufferData::Double($values) => Some($body),
            BufferData::DoubleVec2($values) => Some($body),
            BufferData::DoubleVec3($values) => Some($body),
            BufferData::DoubleVec4($values) => Some($body),
            _ => None,
        }
    };
}
pub(crate) use with_primvar_slice;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_normalizes_to_zero() {
        let n = Vec3::zero().normalized_or_zero();
        assert_eq!(n, Vec3::zero());
        let n = DVec3::new(0.0, 3.0, 4.0).normalized_or_zero();
        assert!((n.mag() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn integer_interpolation_truncates() {
        assert_eq!(PrimvarElement::midpoint(10i32, 13), 11);
        assert_eq!([4i32, -4].midpoint([5, -5]), [4, -4]);
        assert_eq!(PrimvarElement::add(i32::MAX, 1), i32::MAX);
    }

    #[test]
    fn tuple_midpoint() {
        let m = [1.0f32, 2.0].midpoint([3.0, 6.0]);
        assert_eq!(m, [2.0, 4.0]);
    }
}
