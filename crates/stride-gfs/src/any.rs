//! Grids whose element type is known only at run time.

use stride_core::ElementType;
use stride_grid::{AbstractGrid, DataGrid};

/// A decoded frame of any supported element type.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyGrid {
    /// `f32` cells.
    F32(DataGrid<f32>),
    /// `f64` cells.
    F64(DataGrid<f64>),
    /// `i8` cells.
    I8(DataGrid<i8>),
    /// `i16` cells.
    I16(DataGrid<i16>),
    /// `i32` cells.
    I32(DataGrid<i32>),
    /// `i64` cells.
    I64(DataGrid<i64>),
}

macro_rules! each_variant {
    ($self:expr, $g:ident => $body:expr) => {
        match $self {
            AnyGrid::F32($g) => $body,
            AnyGrid::F64($g) => $body,
            AnyGrid::I8($g) => $body,
            AnyGrid::I16($g) => $body,
            AnyGrid::I32($g) => $body,
            AnyGrid::I64($g) => $body,
        }
    };
}

impl AnyGrid {
    /// Element type of the cells.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
            Self::I8(_) => ElementType::I8,
            Self::I16(_) => ElementType::I16,
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
        }
    }

    /// Geometry of the frame.
    pub fn grid(&self) -> &AbstractGrid {
        each_variant!(self, g => g.grid())
    }

    /// Cell `(i, j)` widened to `f64`.
    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        use stride_core::GridElement;
        each_variant!(self, g => g.get(i, j).map(GridElement::to_f64))
    }

    /// Widen every cell to `f64`.
    pub fn to_f64(&self) -> DataGrid<f64> {
        use stride_core::GridElement;
        each_variant!(self, g => g.map(GridElement::to_f64))
    }
}
