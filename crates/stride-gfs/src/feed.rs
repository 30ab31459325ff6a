//! Work items for the pipeline.
//!
//! A [`FrameFeed`] is drained under the pipeline's single lock, so a feed
//! may carry state from one item to the next (a frame history, a running
//! per-agent record) while the producers that rasterize its items stay
//! stateless.

use std::collections::VecDeque;

use stride_core::{Frame, TrajectoryError, TrajectorySource};

/// A sequential source of pipeline work items.
pub trait FrameFeed: Send {
    /// What a producer rasterizes.
    type Item: Send;

    /// Next item with the absolute frame index it stands for, or `Ok(None)`
    /// once exhausted.
    fn next_item(&mut self) -> Result<Option<(Self::Item, usize)>, TrajectoryError>;
}

// ── SourceFeed ─────────────────────────────────────────────────────

/// Feeds a trajectory's frames one by one.
#[derive(Debug)]
pub struct SourceFeed<S> {
    source: S,
}

impl<S: TrajectorySource> SourceFeed<S> {
    /// Wrap a trajectory source positioned at its first wanted frame.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Unwrap the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: TrajectorySource> FrameFeed for SourceFeed<S> {
    type Item = Frame;

    fn next_item(&mut self) -> Result<Option<(Frame, usize)>, TrajectoryError> {
        self.source.next_frame()
    }
}

// ── FrameWindow ────────────────────────────────────────────────────

/// Two frames `span` steps apart.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePair {
    /// Frame `t - span`.
    pub earlier: Frame,
    /// Frame `t`.
    pub later: Frame,
    /// Frames between the two.
    pub span: usize,
}

impl FramePair {
    /// Agents present in both frames.
    pub fn common_len(&self) -> usize {
        self.earlier.len().min(self.later.len())
    }
}

/// Feeds `(F_{t-span}, F_t)` pairs over a trajectory.
///
/// The first pair is emitted at `first + span`; earlier frames only fill
/// the history.
#[derive(Debug)]
pub struct FrameWindow<S> {
    source: S,
    span: usize,
    history: VecDeque<Frame>,
}

impl<S: TrajectorySource> FrameWindow<S> {
    /// Window of `span` frames; zero is treated as one.
    pub fn new(source: S, span: usize) -> Self {
        let span = span.max(1);
        Self {
            source,
            span,
            history: VecDeque::with_capacity(span + 1),
        }
    }

    /// Frames between the two halves of each pair.
    pub fn span(&self) -> usize {
        self.span
    }
}

impl<S: TrajectorySource> FrameFeed for FrameWindow<S> {
    type Item = FramePair;

    fn next_item(&mut self) -> Result<Option<(FramePair, usize)>, TrajectoryError> {
        loop {
            let Some((frame, index)) = self.source.next_frame()? else {
                return Ok(None);
            };
            self.history.push_back(frame);
            if self.history.len() <= self.span {
                continue;
            }
            let Some(earlier) = self.history.pop_front() else {
                continue;
            };
            let Some(later) = self.history.back().cloned() else {
                continue;
            };
            return Ok(Some((
                FramePair {
                    earlier,
                    later,
                    span: self.span,
                },
                index,
            )));
        }
    }
}
