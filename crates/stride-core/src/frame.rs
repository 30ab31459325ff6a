//! Agent records and per-instant frames.

use crate::error::TrajectoryError;
use crate::geometry::Vec2;

/// How the third column of a three-or-more-wide record buffer is read.
///
/// Trajectory formats disagree on what column 2 holds, so the consumer must
/// be told.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThirdColumn {
    /// Column 2 is ignored.
    #[default]
    Ignore,
    /// Column 2 is an elevation (z) coordinate.
    Z,
    /// Column 2 is a discrete behaviour-state id.
    State,
}

/// One agent at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentRecord {
    /// Planar position in world coordinates.
    pub position: Vec2,
    /// Facing direction, when the source provides it.
    pub orientation: Option<Vec2>,
    /// Elevation, when the source provides it.
    pub elevation: Option<f32>,
    /// Behaviour-state id, when the source provides it.
    pub state: Option<u32>,
    /// Agent class id, when the source provides it.
    pub class: Option<u32>,
}

impl AgentRecord {
    /// A record carrying only a position.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder-style setter for the state id.
    pub fn with_state(mut self, state: u32) -> Self {
        self.state = Some(state);
        self
    }

    /// Builder-style setter for the class id.
    pub fn with_class(mut self, class: u32) -> Self {
        self.class = Some(class);
        self
    }

    /// Builder-style setter for the orientation.
    pub fn with_orientation(mut self, orientation: Vec2) -> Self {
        self.orientation = Some(orientation);
        self
    }
}

/// The ordered agent records of one instant.
///
/// Record order is stable across frames of the same source: record `k` of
/// frame `t` and record `k` of frame `t + 1` are the same agent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    records: Vec<AgentRecord>,
}

impl Frame {
    /// Wrap a list of records.
    pub fn new(records: Vec<AgentRecord>) -> Self {
        Self { records }
    }

    /// A frame whose records carry positions only.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec2>) -> Self {
        Self {
            records: positions.into_iter().map(AgentRecord::at).collect(),
        }
    }

    /// Decode a row-major `(M, width)` record buffer.
    ///
    /// Columns 0 and 1 are x and y. When `width >= 3`, column 2 is read
    /// according to `third`; further columns are ignored.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::MalformedRecord`] when `width < 2`, when the
    /// buffer length is not a multiple of `width`, or when a state column
    /// holds a negative or fractional value.
    pub fn from_columns(
        buffer: &[f32],
        width: usize,
        third: ThirdColumn,
    ) -> Result<Self, TrajectoryError> {
        if width < 2 {
            return Err(TrajectoryError::MalformedRecord {
                reason: format!("record width must be at least 2, got {width}"),
            });
        }
        if buffer.len() % width != 0 {
            return Err(TrajectoryError::MalformedRecord {
                reason: format!(
                    "buffer of {} values is not a whole number of {width}-wide records",
                    buffer.len()
                ),
            });
        }
        let mut records = Vec::with_capacity(buffer.len() / width);
        for (agent, row) in buffer.chunks_exact(width).enumerate() {
            let mut record = AgentRecord::at(Vec2::new(row[0], row[1]));
            if width >= 3 {
                match third {
                    ThirdColumn::Ignore => {}
                    ThirdColumn::Z => record.elevation = Some(row[2]),
                    ThirdColumn::State => {
                        let raw = row[2];
                        if !(raw >= 0.0) || raw.fract() != 0.0 || raw > u32::MAX as f32 {
                            return Err(TrajectoryError::MalformedRecord {
                                reason: format!("agent {agent} has invalid state id {raw}"),
                            });
                        }
                        record.state = Some(raw as u32);
                    }
                }
            }
            records.push(record);
        }
        Ok(Self { records })
    }

    /// Number of agents in the frame.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the frame has no agents.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in agent order.
    pub fn records(&self) -> &[AgentRecord] {
        &self.records
    }

    /// Record of agent `k`, if present.
    pub fn get(&self, k: usize) -> Option<&AgentRecord> {
        self.records.get(k)
    }

    /// Iterator over agent positions in agent order.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.records.iter().map(|r| r.position)
    }
}

impl FromIterator<AgentRecord> for Frame {
    fn from_iter<I: IntoIterator<Item = AgentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
