//! Region analyses: flow across lines, population in rectangles, and the
//! fundamental diagram.
//!
//! Each walks a trajectory source once from its current cursor and returns
//! one [`TimeSeries`] row per frame.

use std::collections::VecDeque;

use stride_core::{Frame, Segment, TrajectorySource};
use stride_grid::{LineSet, RectDomainSet};
use tracing::debug;

use crate::error::AnalysisError;
use crate::timeseries::TimeSeries;

/// Signed agent crossings of each line per frame.
///
/// The row for frame `t` counts displacements `t-1 → t`: `+1` for a
/// crossing from the line's right side to its left (counter-clockwise of its
/// direction), `-1` the other way. An agent standing on a line counts as
/// being on its right side, so stepping onto a line and back off to the
/// same side adds nothing. The first frame has no predecessor and its row
/// is all zeros.
///
/// # Errors
///
/// Propagates trajectory read failures.
pub fn flow_series<S>(source: &mut S, lines: &LineSet) -> Result<TimeSeries, AnalysisError>
where
    S: TrajectorySource + ?Sized,
{
    let columns: Vec<String> = lines.names().map(str::to_string).collect();
    let Some((mut prev, first)) = source.next_frame()? else {
        return Ok(TimeSeries::new(columns, 0));
    };
    let mut series = TimeSeries::new(columns, first);
    series.push_row(vec![0.0; lines.len()])?;

    while let Some((frame, _)) = source.next_frame()? {
        let row = lines
            .iter()
            .map(|(_, line)| f64::from(crossings(line, &prev, &frame)))
            .collect();
        series.push_row(row)?;
        prev = frame;
    }
    debug!(lines = lines.len(), frames = series.len(), "flow series complete");
    Ok(series)
}

fn crossings(line: &Segment, earlier: &Frame, later: &Frame) -> i32 {
    earlier
        .positions()
        .zip(later.positions())
        .map(|(a, b)| line.crossing_sign(&Segment::new(a, b)))
        .sum()
}

/// Agents inside each region per frame.
///
/// # Errors
///
/// Propagates trajectory read failures.
pub fn population_series<S>(
    source: &mut S,
    regions: &RectDomainSet,
) -> Result<TimeSeries, AnalysisError>
where
    S: TrajectorySource + ?Sized,
{
    let columns: Vec<String> = regions.names().map(str::to_string).collect();
    let mut series: Option<TimeSeries> = None;
    while let Some((frame, index)) = source.next_frame()? {
        let row = regions
            .iter()
            .map(|(_, region)| frame.positions().filter(|&p| region.contains(p)).count() as f64)
            .collect();
        series
            .get_or_insert_with(|| TimeSeries::new(columns.clone(), index))
            .push_row(row)?;
    }
    let series = series.unwrap_or_else(|| TimeSeries::new(columns, 0));
    debug!(regions = regions.len(), frames = series.len(), "population series complete");
    Ok(series)
}

/// Density and mean speed in each region per frame.
///
/// Columns come in pairs, `name:density` then `name:speed`. Density is the
/// agent count over the region area. Speed is the mean over in-region agents
/// of the displacement across `span` frames divided by `span · step_seconds`,
/// and zero for an empty region. Rows start at the first frame that has a
/// predecessor `span` frames back.
///
/// # Errors
///
/// [`AnalysisError::InvalidParameter`] for a non-positive or non-finite
/// `step_seconds`; trajectory read failures are propagated.
pub fn fundamental_diagram_series<S>(
    source: &mut S,
    regions: &RectDomainSet,
    span: usize,
    step_seconds: f32,
) -> Result<TimeSeries, AnalysisError>
where
    S: TrajectorySource + ?Sized,
{
    if !(step_seconds.is_finite() && step_seconds > 0.0) {
        return Err(AnalysisError::InvalidParameter {
            reason: format!("step duration must be positive, got {step_seconds}"),
        });
    }
    let span = span.max(1);
    let seconds = f64::from(step_seconds) * span as f64;
    let columns: Vec<String> = regions
        .names()
        .flat_map(|name| [format!("{name}:density"), format!("{name}:speed")])
        .collect();

    let mut history: VecDeque<Frame> = VecDeque::with_capacity(span + 1);
    let mut series: Option<TimeSeries> = None;
    while let Some((frame, index)) = source.next_frame()? {
        history.push_back(frame);
        if history.len() <= span {
            continue;
        }
        let (Some(earlier), Some(later)) = (history.pop_front(), history.back()) else {
            continue;
        };

        let mut row = Vec::with_capacity(regions.len() * 2);
        for (_, region) in regions.iter() {
            let mut count = 0usize;
            let mut speed_sum = 0.0f64;
            let mut speed_count = 0usize;
            for (k, p) in later.positions().enumerate() {
                if !region.contains(p) {
                    continue;
                }
                count += 1;
                if let Some(before) = earlier.get(k) {
                    speed_sum += f64::from(p.distance(before.position)) / seconds;
                    speed_count += 1;
                }
            }
            let area = f64::from(region.area());
            row.push(if area > 0.0 { count as f64 / area } else { 0.0 });
            row.push(if speed_count > 0 {
                speed_sum / speed_count as f64
            } else {
                0.0
            });
        }
        series
            .get_or_insert_with(|| TimeSeries::new(columns.clone(), index))
            .push_row(row)?;
    }
    let series = series.unwrap_or_else(|| TimeSeries::new(columns, 0));
    debug!(regions = regions.len(), frames = series.len(), "fundamental diagram complete");
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::{MemoryTrajectory, Vec2};
    use stride_grid::RectDomain;

    fn walker_right(frames: usize) -> MemoryTrajectory {
        MemoryTrajectory::new(
            (0..frames)
                .map(|t| Frame::from_positions([Vec2::new(t as f32, 0.5)]))
                .collect(),
        )
    }

    #[test]
    fn downward_crossing_is_negative() {
        let frames = vec![
            Frame::from_positions([Vec2::new(1.0, 1.0)]),
            Frame::from_positions([Vec2::new(1.0, -1.0)]),
        ];
        let mut lines = LineSet::new();
        lines.insert("l", Segment::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)));
        let s = flow_series(&mut MemoryTrajectory::new(frames), &lines).unwrap();
        assert_eq!(s.rows(), &[vec![0.0], vec![-1.0]]);
    }

    #[test]
    fn touching_a_line_adds_no_flow() {
        let ys = [1.0, 0.0, 1.0, 0.0, -1.0];
        let frames = ys
            .iter()
            .map(|&y| Frame::from_positions([Vec2::new(1.0, y)]))
            .collect();
        let mut lines = LineSet::new();
        lines.insert("l", Segment::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)));
        let s = flow_series(&mut MemoryTrajectory::new(frames), &lines).unwrap();
        let l = s.column("l").unwrap();
        assert_eq!(l, vec![0.0, -1.0, 1.0, -1.0, 0.0]);
        assert_eq!(l.iter().sum::<f64>(), -1.0);
    }

    #[test]
    fn population_counts_agents_inside() {
        let mut regions = RectDomainSet::new();
        regions.insert("left", RectDomain::new(Vec2::ZERO, Vec2::new(2.5, 1.0)).unwrap());
        let s = population_series(&mut walker_right(5), &regions).unwrap();
        assert_eq!(s.column("left"), Some(vec![1.0, 1.0, 1.0, 0.0, 0.0]));
        assert_eq!(s.first_frame(), 0);
    }

    #[test]
    fn fundamental_diagram_pairs_density_and_speed() {
        let mut regions = RectDomainSet::new();
        regions.insert("all", RectDomain::new(Vec2::ZERO, Vec2::new(10.0, 2.0)).unwrap());
        let s = fundamental_diagram_series(&mut walker_right(6), &regions, 2, 0.5).unwrap();
        assert_eq!(s.columns(), &["all:density".to_string(), "all:speed".to_string()]);
        assert_eq!(s.first_frame(), 2);
        assert_eq!(s.len(), 4);
        for row in s.rows() {
            assert!((row[0] - 0.05).abs() < 1e-9);
            assert!((row[1] - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_region_has_zero_speed() {
        let mut regions = RectDomainSet::new();
        regions.insert("far", RectDomain::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 1.0)).unwrap());
        let s = fundamental_diagram_series(&mut walker_right(3), &regions, 1, 0.1).unwrap();
        assert!(s.rows().iter().all(|r| r == &vec![0.0, 0.0]));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let regions = RectDomainSet::new();
        let err = fundamental_diagram_series(&mut walker_right(3), &regions, 1, 0.0);
        assert!(matches!(err, Err(AnalysisError::InvalidParameter { .. })));
    }
}
