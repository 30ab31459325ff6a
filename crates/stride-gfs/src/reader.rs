//! Random-access grid file reader.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use stride_core::{ElementType, GridElement};
use stride_grid::{AbstractGrid, DataGrid};

use crate::any::AnyGrid;
use crate::codec::{decode_cells, decode_header, read_exact_or_truncated, GfsHeader};
use crate::error::GfsError;

/// Reads frames from a finished grid file.
///
/// The reader keeps a cursor (the next frame to return) and a stride: each
/// successful [`next_frame`](Self::next_frame) advances the cursor by the
/// stride. Frame `i` sits at a fixed offset, so seeking is O(1).
#[derive(Debug)]
pub struct GfsReader<R: Read + Seek> {
    reader: R,
    base: u64,
    header: GfsHeader,
    next: usize,
    stride: usize,
    scratch: Vec<u8>,
}

impl GfsReader<BufReader<File>> {
    /// Open the grid file at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, GfsError> {
        Self::open(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> GfsReader<R> {
    /// Decode the header at the current position and check that the stream
    /// holds every frame it announces.
    ///
    /// # Errors
    ///
    /// [`GfsError::BadHeader`] or [`GfsError::TruncatedStream`] for a
    /// malformed header; [`GfsError::Unfinalized`] when the count is zero
    /// but frame data follows; [`GfsError::TruncatedStream`] when fewer
    /// bytes remain than the announced frames need.
    pub fn open(mut reader: R) -> Result<Self, GfsError> {
        let base = reader.stream_position()?;
        let header = decode_header(&mut reader)?;
        let end = reader.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(base);

        if header.count == 0 && available > header.size() {
            return Err(GfsError::Unfinalized);
        }
        let needed = header.frame_offset(header.count);
        if available < needed {
            return Err(GfsError::TruncatedStream {
                detail: format!(
                    "header announces {} frames ({needed} bytes), stream holds {available}",
                    header.count
                ),
            });
        }

        Ok(Self {
            reader,
            base,
            header,
            next: 0,
            stride: 1,
            scratch: Vec::new(),
        })
    }

    /// The decoded header.
    pub fn header(&self) -> &GfsHeader {
        &self.header
    }

    /// Geometry of every frame.
    pub fn grid(&self) -> &AbstractGrid {
        &self.header.grid
    }

    /// Element type of the stored cells.
    pub fn element_type(&self) -> ElementType {
        self.header.element
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.header.count
    }

    /// True when the file holds no frames.
    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    /// Index of the frame the next read returns.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Position the cursor at frame `index`. `index == len()` is allowed and
    /// leaves the reader exhausted.
    ///
    /// # Errors
    ///
    /// [`GfsError::FrameOutOfRange`] past the end.
    pub fn set_next(&mut self, index: usize) -> Result<(), GfsError> {
        if index > self.header.count {
            return Err(GfsError::FrameOutOfRange {
                index,
                count: self.header.count,
            });
        }
        self.next = index;
        Ok(())
    }

    /// Advance by `stride` frames per read; zero is treated as one.
    pub fn set_stride(&mut self, stride: usize) {
        self.stride = stride.max(1);
    }

    /// Read the frame under the cursor and advance. `Ok(None)` once past the
    /// last frame.
    ///
    /// # Errors
    ///
    /// [`GfsError::ElementMismatch`] when `T` is not the stored type.
    pub fn next_frame<T: GridElement>(&mut self) -> Result<Option<(DataGrid<T>, usize)>, GfsError> {
        if self.next >= self.header.count {
            return Ok(None);
        }
        let index = self.next;
        let grid = self.read_frame(index)?;
        self.next = index.saturating_add(self.stride);
        Ok(Some((grid, index)))
    }

    /// Like [`next_frame`](Self::next_frame) for a type known only at run
    /// time.
    pub fn next_any(&mut self) -> Result<Option<(AnyGrid, usize)>, GfsError> {
        match self.header.element {
            ElementType::F32 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::F32(g), i))),
            ElementType::F64 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::F64(g), i))),
            ElementType::I8 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::I8(g), i))),
            ElementType::I16 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::I16(g), i))),
            ElementType::I32 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::I32(g), i))),
            ElementType::I64 => self.next_frame().map(|f| f.map(|(g, i)| (AnyGrid::I64(g), i))),
        }
    }

    /// Read frame `index` without moving the cursor.
    ///
    /// # Errors
    ///
    /// [`GfsError::FrameOutOfRange`] for `index >= len()`;
    /// [`GfsError::ElementMismatch`] when `T` is not the stored type.
    pub fn read_frame<T: GridElement>(&mut self, index: usize) -> Result<DataGrid<T>, GfsError> {
        if T::ELEMENT_TYPE != self.header.element {
            return Err(GfsError::ElementMismatch {
                stored: self.header.element,
                requested: T::ELEMENT_TYPE,
            });
        }
        if index >= self.header.count {
            return Err(GfsError::FrameOutOfRange {
                index,
                count: self.header.count,
            });
        }
        let offset = self.base + self.header.frame_offset(index);
        self.reader.seek(SeekFrom::Start(offset))?;
        self.scratch.resize(self.header.frame_size() as usize, 0);
        read_exact_or_truncated(&mut self.reader, &mut self.scratch, "frame")?;

        let cells = decode_cells::<T>(&self.scratch);
        DataGrid::from_cells(self.header.grid, cells).map_err(|e| GfsError::BadHeader {
            reason: e.to_string(),
        })
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
