//! Streaming grid file writer.
//!
//! [`GfsWriter`] writes the header immediately with zero placeholders for
//! the frame count and range, streams frames, and patches the placeholders
//! by seeking back in [`finish`](GfsWriter::finish). A file whose writer
//! never finished keeps a zero count and is rejected by the reader.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use stride_core::GridElement;
use stride_grid::{AbstractGrid, DataGrid};

use crate::codec::{encode_cells, encode_header, encode_summary, COUNT_OFFSET};
use crate::error::GfsError;
use crate::stats::GridStats;

/// Writes a sequence of same-shaped grids to a seekable byte sink.
///
/// Generic over `W: Write + Seek` so tests can use `Cursor<Vec<u8>>` and
/// production code a buffered file.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use stride_core::Vec2;
/// use stride_gfs::{GfsReader, GfsWriter};
/// use stride_grid::{AbstractGrid, DataGrid, RectDomain};
///
/// let domain = RectDomain::new(Vec2::ZERO, Vec2::new(4.0, 4.0)).unwrap();
/// let grid = AbstractGrid::new(domain, 4, 4).unwrap();
///
/// let mut writer = GfsWriter::<_, f32>::new(Cursor::new(Vec::new()), grid).unwrap();
/// for frame in 0..3 {
///     let mut g = DataGrid::new(grid);
///     g.fill(frame as f32);
///     writer.write_grid(&g).unwrap();
/// }
/// let bytes = writer.finish().unwrap().into_inner();
///
/// let mut reader = GfsReader::open(Cursor::new(bytes)).unwrap();
/// assert_eq!(reader.header().count, 3);
/// assert_eq!((reader.header().min, reader.header().max), (0.0, 2.0));
/// reader.set_next(2).unwrap();
/// let (last, index) = reader.next_frame::<f32>().unwrap().unwrap();
/// assert_eq!(index, 2);
/// assert_eq!(last.sum() / 16.0, 2.0);
/// ```
pub struct GfsWriter<W: Write + Seek, T: GridElement> {
    writer: W,
    grid: AbstractGrid,
    base: u64,
    stats: GridStats<T>,
    scratch: Vec<u8>,
    _element: PhantomData<T>,
}

impl<T: GridElement> GfsWriter<BufWriter<File>, T> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: impl AsRef<Path>, grid: AbstractGrid) -> Result<Self, GfsError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), grid)
    }
}

impl<W: Write + Seek, T: GridElement> GfsWriter<W, T> {
    /// Write the header at the sink's current position.
    pub fn new(mut writer: W, grid: AbstractGrid) -> Result<Self, GfsError> {
        let base = writer.stream_position()?;
        encode_header(&mut writer, &grid, 0, T::ZERO, T::ZERO)?;
        Ok(Self {
            writer,
            grid,
            base,
            stats: GridStats::new(),
            scratch: Vec::new(),
            _element: PhantomData,
        })
    }

    /// Geometry every frame must match.
    pub fn grid(&self) -> &AbstractGrid {
        &self.grid
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> usize {
        self.stats.count()
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &GridStats<T> {
        &self.stats
    }

    /// Append one frame.
    ///
    /// # Errors
    ///
    /// [`GfsError::ShapeMismatch`] if the grid resolution differs from the
    /// file's; [`GfsError::Io`] on write failure.
    pub fn write_grid(&mut self, grid: &DataGrid<T>) -> Result<(), GfsError> {
        let stats = GridStats::of_grid(grid);
        self.write_grid_with_stats(grid, &stats)
    }

    /// Append one frame whose statistics were computed elsewhere.
    pub fn write_grid_with_stats(
        &mut self,
        grid: &DataGrid<T>,
        stats: &GridStats<T>,
    ) -> Result<(), GfsError> {
        if grid.resolution() != self.grid.resolution() {
            return Err(GfsError::ShapeMismatch {
                expected: self.grid.resolution(),
                found: grid.resolution(),
            });
        }
        self.scratch.clear();
        encode_cells(grid, &mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        self.stats.merge(stats);
        Ok(())
    }

    /// Patch the frame count and global range into the header, flush, and
    /// return the sink positioned at its end.
    ///
    /// # Errors
    ///
    /// [`GfsError::FrameCountOverflow`] past `i32::MAX` frames;
    /// [`GfsError::Io`] on seek or write failure.
    pub fn finish(mut self) -> Result<W, GfsError> {
        let count = i32::try_from(self.stats.count()).map_err(|_| GfsError::FrameCountOverflow {
            count: self.stats.count(),
        })?;
        self.writer.seek(SeekFrom::Start(self.base + COUNT_OFFSET))?;
        encode_summary(&mut self.writer, count, self.stats.min(), self.stats.max())?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_header;
    use std::io::Cursor;
    use stride_core::{ElementType, Vec2};
    use stride_grid::RectDomain;

    fn grid(nx: usize, ny: usize) -> AbstractGrid {
        let d = RectDomain::new(Vec2::ZERO, Vec2::new(nx as f32, ny as f32)).unwrap();
        AbstractGrid::new(d, nx, ny).unwrap()
    }

    #[test]
    fn unfinished_header_holds_placeholders() {
        let mut w = GfsWriter::<_, i64>::new(Cursor::new(Vec::new()), grid(2, 2)).unwrap();
        let mut g = DataGrid::new(grid(2, 2));
        g.fill(5);
        w.write_grid(&g).unwrap();
        let bytes = w.writer.get_ref().clone();
        let h = decode_header(&mut bytes.as_slice()).unwrap();
        assert_eq!((h.count, h.min, h.max), (0, 0.0, 0.0));
        assert_eq!(bytes.len() as u64, h.size() + h.frame_size());
    }

    #[test]
    fn finish_patches_count_and_range() {
        let mut w = GfsWriter::<_, i16>::new(Cursor::new(Vec::new()), grid(3, 1)).unwrap();
        w.write_grid(&DataGrid::from_cells(grid(3, 1), vec![4, -9, 2]).unwrap())
            .unwrap();
        w.write_grid(&DataGrid::from_cells(grid(3, 1), vec![11, 0, 0]).unwrap())
            .unwrap();
        let bytes = w.finish().unwrap().into_inner();
        let h = decode_header(&mut bytes.as_slice()).unwrap();
        assert_eq!(h.element, ElementType::I16);
        assert_eq!((h.count, h.min, h.max), (2, -9.0, 11.0));
        assert_eq!(bytes.len() as u64, h.frame_offset(2));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let mut w = GfsWriter::<_, f32>::new(Cursor::new(Vec::new()), grid(2, 2)).unwrap();
        let err = w.write_grid(&DataGrid::new(grid(3, 2))).unwrap_err();
        assert!(matches!(
            err,
            GfsError::ShapeMismatch { expected: (2, 2), found: (3, 2) }
        ));
        assert_eq!(w.frames_written(), 0);
    }

    #[test]
    fn header_is_written_at_current_position() {
        let mut sink = Cursor::new(Vec::new());
        sink.write_all(b"prefix").unwrap();
        let mut w = GfsWriter::<_, f32>::new(sink, grid(1, 1)).unwrap();
        w.write_grid(&DataGrid::from_cells(grid(1, 1), vec![1.5]).unwrap())
            .unwrap();
        let bytes = w.finish().unwrap().into_inner();
        assert_eq!(&bytes[..6], b"prefix");
        let h = decode_header(&mut &bytes[6..]).unwrap();
        assert_eq!((h.count, h.max), (1, 1.5));
    }
}
