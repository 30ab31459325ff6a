//! Numeric element types storable in a grid and in a GFS stream.
//!
//! Every element type has a stable on-disk type id. Sizes are always taken
//! from [`ElementType::size`] (or `size_of::<T>()`); no code path assumes
//! four-byte cells.

use std::fmt;

/// On-disk element type tag of a GFS stream.
///
/// The discriminants are the wire ids written at header offset 24.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit IEEE float (id 0).
    F32,
    /// 64-bit IEEE float (id 1).
    F64,
    /// Signed 8-bit integer (id 2).
    I8,
    /// Signed 16-bit integer (id 3).
    I16,
    /// Signed 32-bit integer (id 4).
    I32,
    /// Signed 64-bit integer (id 5).
    I64,
}

impl ElementType {
    /// All element types in wire-id order.
    pub const ALL: [ElementType; 6] = [
        ElementType::F32,
        ElementType::F64,
        ElementType::I8,
        ElementType::I16,
        ElementType::I32,
        ElementType::I64,
    ];

    /// Wire id of this element type.
    pub fn id(self) -> i32 {
        match self {
            Self::F32 => 0,
            Self::F64 => 1,
            Self::I8 => 2,
            Self::I16 => 3,
            Self::I32 => 4,
            Self::I64 => 5,
        }
    }

    /// Look up an element type by wire id. `None` for unknown ids.
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
            Self::F32 | Self::I32 => 4,
            Self::F64 | Self::I64 => 8,
        }
    }

    /// Short lowercase name (`"f32"`, `"i16"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }

    /// True for the two floating-point types.
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar that can be stored in a `DataGrid` and streamed to disk.
///
/// Implemented for `f32`, `f64`, `i8`, `i16`, `i32`, and `i64`.
pub trait GridElement:
    Copy + PartialOrd + PartialEq + Default + fmt::Debug + Send + Sync + 'static
{
    /// Wire tag of this type.
    const ELEMENT_TYPE: ElementType;

    /// The additive zero.
    const ZERO: Self;

    /// Widen to `f64` (used for statistics and headers).
    fn to_f64(self) -> f64;

    /// Narrow from `f64` with Rust `as` semantics (saturating for integers).
    fn from_f64(value: f64) -> Self;

    /// Append the little-endian encoding to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly `ELEMENT_TYPE.size()` little-endian bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the element size; callers slice
    /// whole frames before decoding.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_grid_element {
    ($ty:ty, $tag:expr) => {
        impl GridElement for $ty {
            const ELEMENT_TYPE: ElementType = $tag;
            const ZERO: Self = 0 as $ty;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_le_bytes(buf)
            }
        }
    };
}

impl_grid_element!(f32, ElementType::F32);
impl_grid_element!(f64, ElementType::F64);
impl_grid_element!(i8, ElementType::I8);
impl_grid_element!(i16, ElementType::I16);
impl_grid_element!(i32, ElementType::I32);
impl_grid_element!(i64, ElementType::I64);
