//! Header and cell encoding.

use std::io::{self, Read, Write};

use stride_core::{ElementType, GridElement, Vec2};
use stride_grid::{AbstractGrid, DataGrid, RectDomain};

use crate::error::GfsError;

/// Length of the fixed header fields before the typed min/max.
pub const FIXED_HEADER_LEN: u64 = 32;

/// Byte offset of the frame count; count, min, and max are patched from
/// here on finish.
pub const COUNT_OFFSET: u64 = 28;

/// Total header length for an element type.
pub fn header_size(element: ElementType) -> u64 {
    FIXED_HEADER_LEN + 2 * element.size() as u64
}

/// A decoded header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GfsHeader {
    /// Geometry of every frame.
    pub grid: AbstractGrid,
    /// Cell element type.
    pub element: ElementType,
    /// Number of frames recorded by the writer.
    pub count: usize,
    /// Global minimum over all frames, widened to `f64`.
    pub min: f64,
    /// Global maximum over all frames, widened to `f64`.
    pub max: f64,
}

impl GfsHeader {
    /// Header length in bytes.
    pub fn size(&self) -> u64 {
        header_size(self.element)
    }

    /// Length of one frame in bytes.
    pub fn frame_size(&self) -> u64 {
        (self.grid.cell_count() * self.element.size()) as u64
    }

    /// Byte offset of frame `index` from the start of the file.
    pub fn frame_offset(&self, index: usize) -> u64 {
        self.size() + index as u64 * self.frame_size()
    }
}

// ── Primitive writers ───────────────────────────────────────────

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), GfsError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), GfsError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write one element.
pub fn write_value<T: GridElement>(w: &mut dyn Write, v: T) -> Result<(), GfsError> {
    let mut buf = Vec::with_capacity(8);
    v.write_le(&mut buf);
    w.write_all(&buf)?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Fill `buf`, reporting end of stream as [`GfsError::TruncatedStream`].
pub fn read_exact_or_truncated(
    r: &mut dyn Read,
    buf: &mut [u8],
    what: &str,
) -> Result<(), GfsError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => GfsError::TruncatedStream {
            detail: format!("stream ended while reading {what}"),
        },
        _ => GfsError::Io(e),
    })
}

fn f32_at(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn i32_at(buf: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Decode one element of a type known only at run time, widened to `f64`.
pub fn decode_value(element: ElementType, bytes: &[u8]) -> f64 {
    match element {
        ElementType::F32 => f32::read_le(bytes).to_f64(),
        ElementType::F64 => f64::read_le(bytes).to_f64(),
        ElementType::I8 => i8::read_le(bytes).to_f64(),
        ElementType::I16 => i16::read_le(bytes).to_f64(),
        ElementType::I32 => i32::read_le(bytes).to_f64(),
        ElementType::I64 => i64::read_le(bytes).to_f64(),
    }
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode a full header.
pub fn encode_header<T: GridElement>(
    w: &mut dyn Write,
    grid: &AbstractGrid,
    count: i32,
    min: T,
    max: T,
) -> Result<(), GfsError> {
    let (nx, ny) = grid.resolution();
    let to_i32 = |n: usize| {
        i32::try_from(n).map_err(|_| GfsError::BadHeader {
            reason: format!("resolution {n} exceeds i32"),
        })
    };
    let domain = grid.domain();
    write_f32_le(w, domain.min_corner().x)?;
    write_f32_le(w, domain.min_corner().y)?;
    write_f32_le(w, domain.width())?;
    write_f32_le(w, domain.height())?;
    write_i32_le(w, to_i32(nx)?)?;
    write_i32_le(w, to_i32(ny)?)?;
    write_i32_le(w, T::ELEMENT_TYPE.id())?;
    encode_summary(w, count, min, max)
}

/// Encode the patchable tail: count, min, and max.
pub fn encode_summary<T: GridElement>(
    w: &mut dyn Write,
    count: i32,
    min: T,
    max: T,
) -> Result<(), GfsError> {
    write_i32_le(w, count)?;
    write_value(w, min)?;
    write_value(w, max)
}

/// Decode and validate a header.
///
/// # Errors
///
/// [`GfsError::TruncatedStream`] if the stream ends inside the header;
/// [`GfsError::BadHeader`] for an unknown element type id, a non-positive
/// resolution, a negative count, or a degenerate domain.
pub fn decode_header(r: &mut dyn Read) -> Result<GfsHeader, GfsError> {
    let mut fixed = [0u8; FIXED_HEADER_LEN as usize];
    read_exact_or_truncated(r, &mut fixed, "header")?;

    let type_id = i32_at(&fixed, 24);
    let element = ElementType::from_id(type_id).ok_or_else(|| GfsError::BadHeader {
        reason: format!("unknown element type id {type_id}"),
    })?;
    let (nx, ny) = (i32_at(&fixed, 16), i32_at(&fixed, 20));
    if nx <= 0 || ny <= 0 {
        return Err(GfsError::BadHeader {
            reason: format!("resolution {nx}x{ny} is not positive"),
        });
    }
    let count = i32_at(&fixed, 28);
    let count = usize::try_from(count).map_err(|_| GfsError::BadHeader {
        reason: format!("negative frame count {count}"),
    })?;

    let bad = |e: stride_grid::GridError| GfsError::BadHeader {
        reason: e.to_string(),
    };
    let domain = RectDomain::new(
        Vec2::new(f32_at(&fixed, 0), f32_at(&fixed, 4)),
        Vec2::new(f32_at(&fixed, 8), f32_at(&fixed, 12)),
    )
    .map_err(bad)?;
    let grid = AbstractGrid::new(domain, nx as usize, ny as usize).map_err(bad)?;

    let size = element.size();
    let mut range = vec![0u8; 2 * size];
    read_exact_or_truncated(r, &mut range, "header min/max")?;
    Ok(GfsHeader {
        grid,
        element,
        count,
        min: decode_value(element, &range[..size]),
        max: decode_value(element, &range[size..]),
    })
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Append a grid's cells to `out` in i-major order.
pub fn encode_cells<T: GridElement>(grid: &DataGrid<T>, out: &mut Vec<u8>) {
    out.reserve(grid.cells().len() * T::ELEMENT_TYPE.size());
    for &v in grid.cells() {
        v.write_le(out);
    }
}

/// Decode one frame's bytes into cells.
pub fn decode_cells<T: GridElement>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(T::ELEMENT_TYPE.size())
        .map(T::read_le)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> AbstractGrid {
        let d = RectDomain::new(Vec2::new(-1.0, 2.0), Vec2::new(4.0, 3.0)).unwrap();
        AbstractGrid::new(d, 8, 6).unwrap()
    }

    #[test]
    fn header_length_follows_element_size() {
        assert_eq!(header_size(ElementType::F32), 40);
        assert_eq!(header_size(ElementType::F64), 48);
        assert_eq!(header_size(ElementType::I8), 34);
        assert_eq!(header_size(ElementType::I64), 48);
    }

    #[test]
    fn header_layout_is_fixed() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &grid(), 7, -2i16, 300i16).unwrap();
        assert_eq!(buf.len(), 36);
        assert_eq!(&buf[0..4], &(-1.0f32).to_le_bytes());
        assert_eq!(&buf[16..20], &8i32.to_le_bytes());
        assert_eq!(&buf[24..28], &ElementType::I16.id().to_le_bytes());
        assert_eq!(&buf[28..32], &7i32.to_le_bytes());
        assert_eq!(&buf[32..34], &(-2i16).to_le_bytes());
    }

    #[test]
    fn header_decodes() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &grid(), 3, 0.5f64, 9.25f64).unwrap();
        let h = decode_header(&mut buf.as_slice()).unwrap();
        assert_eq!(h.grid, grid());
        assert_eq!(h.element, ElementType::F64);
        assert_eq!((h.count, h.min, h.max), (3, 0.5, 9.25));
        assert_eq!(h.frame_size(), 8 * 6 * 8);
        assert_eq!(h.frame_offset(2), 48 + 2 * 384);
    }

    #[test]
    fn unknown_type_id_is_bad_header() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &grid(), 0, 0.0f32, 0.0f32).unwrap();
        buf[24..28].copy_from_slice(&9i32.to_le_bytes());
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(GfsError::BadHeader { .. })
        ));
    }

    #[test]
    fn zero_resolution_is_bad_header() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &grid(), 0, 0.0f32, 0.0f32).unwrap();
        buf[16..20].copy_from_slice(&0i32.to_le_bytes());
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(GfsError::BadHeader { .. })
        ));
    }

    #[test]
    fn short_header_is_truncated() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &grid(), 0, 0i32, 0i32).unwrap();
        for cut in [0, 10, 31, 35] {
            assert!(matches!(
                decode_header(&mut &buf[..cut]),
                Err(GfsError::TruncatedStream { .. })
            ));
        }
    }

    #[test]
    fn cells_round_trip_i_major() {
        let g = AbstractGrid::new(grid().domain().to_owned(), 2, 3).unwrap();
        let data = DataGrid::from_cells(g, vec![1i8, -2, 3, -4, 5, -6]).unwrap();
        let mut bytes = Vec::new();
        encode_cells(&data, &mut bytes);
        assert_eq!(bytes.len(), 6);
        assert_eq!(decode_cells::<i8>(&bytes), data.cells());
    }
}
