//! The trajectory source contract and an in-memory implementation.
//!
//! File-format readers live outside this workspace; they plug in by
//! implementing [`TrajectorySource`].

use crate::error::TrajectoryError;
use crate::frame::Frame;

/// A seekable iterator over the frames of one recorded crowd.
///
/// Sources are shared between raster producers behind a single lock, so
/// they must be `Send`. Every call advances or inspects a read cursor and
/// takes `&mut self`.
pub trait TrajectorySource: Send {
    /// Read the frame at the cursor and advance.
    ///
    /// Returns the frame and its absolute frame index, or `Ok(None)` once
    /// the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<(Frame, usize)>, TrajectoryError>;

    /// Position the cursor so the next `next_frame` returns frame `index`.
    fn set_next(&mut self, index: usize) -> Result<(), TrajectoryError>;

    /// Number of agents per frame.
    fn agent_count(&self) -> usize;

    /// Simulated seconds between consecutive frames, when known.
    fn sim_step_size(&self) -> Option<f32>;

    /// Absolute indices of every frame in the source, in order.
    fn frame_ids(&self) -> Vec<usize>;
}

impl<S: TrajectorySource + ?Sized> TrajectorySource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<(Frame, usize)>, TrajectoryError> {
        (**self).next_frame()
    }

    fn set_next(&mut self, index: usize) -> Result<(), TrajectoryError> {
        (**self).set_next(index)
    }

    fn agent_count(&self) -> usize {
        (**self).agent_count()
    }

    fn sim_step_size(&self) -> Option<f32> {
        (**self).sim_step_size()
    }

    fn frame_ids(&self) -> Vec<usize> {
        (**self).frame_ids()
    }
}

/// A trajectory held entirely in memory.
///
/// Frame `i` of the vector has absolute index `first_index + i`.
///
/// # Examples
///
/// ```
/// use stride_core::{Frame, MemoryTrajectory, TrajectorySource, Vec2};
///
/// let frames = vec![
///     Frame::from_positions([Vec2::new(0.0, 0.0)]),
///     Frame::from_positions([Vec2::new(1.0, 0.0)]),
/// ];
/// let mut source = MemoryTrajectory::new(frames).with_step_size(0.1);
/// let (_, idx) = source.next_frame().unwrap().unwrap();
/// assert_eq!(idx, 0);
/// source.set_next(1).unwrap();
/// let (frame, idx) = source.next_frame().unwrap().unwrap();
/// assert_eq!(idx, 1);
/// assert_eq!(frame.get(0).unwrap().position, Vec2::new(1.0, 0.0));
/// assert!(source.next_frame().unwrap().is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryTrajectory {
    frames: Vec<Frame>,
    first_index: usize,
    cursor: usize,
    step_size: Option<f32>,
}

impl MemoryTrajectory {
    /// Wrap a list of frames; the first has index 0.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            first_index: 0,
            cursor: 0,
            step_size: None,
        }
    }

    /// Set the simulated time step reported by `sim_step_size`.
    pub fn with_step_size(mut self, dt: f32) -> Self {
        self.step_size = Some(dt);
        self
    }

    /// Set the absolute index of the first frame.
    pub fn with_first_index(mut self, first: usize) -> Self {
        self.first_index = first;
        self
    }

    /// Number of frames held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frames are held.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the held frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl TrajectorySource for MemoryTrajectory {
    fn next_frame(&mut self) -> Result<Option<(Frame, usize)>, TrajectoryError> {
        let Some(frame) = self.frames.get(self.cursor) else {
            return Ok(None);
        };
        let out = (frame.clone(), self.first_index + self.cursor);
        self.cursor += 1;
        Ok(Some(out))
    }

    fn set_next(&mut self, index: usize) -> Result<(), TrajectoryError> {
        let local = index
            .checked_sub(self.first_index)
            .filter(|&i| i <= self.frames.len())
            .ok_or(TrajectoryError::SeekOutOfRange {
                index,
                len: self.frames.len(),
            })?;
        self.cursor = local;
        Ok(())
    }

    fn agent_count(&self) -> usize {
        self.frames.first().map_or(0, Frame::len)
    }

    fn sim_step_size(&self) -> Option<f32> {
        self.step_size
    }

    fn frame_ids(&self) -> Vec<usize> {
        (self.first_index..self.first_index + self.frames.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn three_frames() -> MemoryTrajectory {
        MemoryTrajectory::new(
            (0..3)
                .map(|i| Frame::from_positions([Vec2::new(i as f32, 0.0)]))
                .collect(),
        )
    }

    #[test]
    fn iterates_in_order_then_exhausts() {
        let mut src = three_frames();
        for expected in 0..3 {
            let (_, idx) = src.next_frame().unwrap().unwrap();
            assert_eq!(idx, expected);
        }
        assert!(src.next_frame().unwrap().is_none());
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn seek_respects_first_index() {
        let mut src = three_frames().with_first_index(10);
        assert_eq!(src.frame_ids(), vec![10, 11, 12]);
        src.set_next(12).unwrap();
        let (frame, idx) = src.next_frame().unwrap().unwrap();
        assert_eq!(idx, 12);
        assert_eq!(frame.get(0).unwrap().position.x, 2.0);
    }

    #[test]
    fn seek_out_of_range_fails() {
        let mut src = three_frames().with_first_index(10);
        assert!(matches!(
            src.set_next(4),
            Err(TrajectoryError::SeekOutOfRange { index: 4, len: 3 })
        ));
        assert!(src.set_next(14).is_err());
        // Seeking to one-past-the-end is allowed and yields exhaustion.
        src.set_next(13).unwrap();
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn boxed_source_delegates() {
        let mut boxed: Box<dyn TrajectorySource> = Box::new(three_frames().with_step_size(0.5));
        assert_eq!(boxed.agent_count(), 1);
        assert_eq!(boxed.sim_step_size(), Some(0.5));
        assert!(boxed.next_frame().unwrap().is_some());
    }
}
