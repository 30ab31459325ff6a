//! Executes project tasks.
//!
//! The runner resolves a task's files through a [`TaskEnvironment`], builds
//! the rasterizer or region analysis the task names, and writes the result
//! to `outFldr/workName_<suffix>`. A task that fails is logged once and
//! reported as [`TaskOutcome::Failed`]; the rest of the project still runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use stride_core::{MemoryTrajectory, ObstacleQuery, ObstacleSet, TrajectorySource};
use stride_gfs::{
    run_to_file, FrameFeed, FrameWindow, KernelDensity, PipelineConfig, PipelineReport,
    Rasterizer, SourceFeed, VoronoiDensity,
};
use stride_grid::AbstractGrid;
use stride_kernel::Kernel;
use stride_voronoi::Voronoi;
use tracing::{error, info};

use crate::angular::AngularSpeedRasterizer;
use crate::error::{AnalysisError, TaskConfigError};
use crate::progress::{ProgressFeed, ProgressRasterizer};
use crate::project::{CommonKeys, DensityMethod, Project, SpeedKind, TaskParams, TaskSpec};
use crate::regions::{flow_series, fundamental_diagram_series, population_series};
use crate::speed::SpeedRasterizer;
use crate::timeseries::TimeSeries;

/// Opens the files a task refers to.
pub trait TaskEnvironment {
    /// Open the trajectory at `path`, positioned at its first frame.
    fn open_trajectory(&self, path: &Path) -> Result<Box<dyn TrajectorySource>, AnalysisError>;

    /// Open the obstacle set at `path`.
    fn open_obstacles(&self, path: &Path) -> Result<Arc<dyn ObstacleQuery>, AnalysisError>;

    /// Whether `path` names something this environment can open.
    fn exists(&self, path: &Path) -> bool;
}

/// Trajectories and obstacles registered in memory under file paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryEnvironment {
    trajectories: IndexMap<PathBuf, MemoryTrajectory>,
    obstacles: IndexMap<PathBuf, Arc<ObstacleSet>>,
}

impl MemoryEnvironment {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trajectory under `path`.
    pub fn with_trajectory(mut self, path: impl Into<PathBuf>, source: MemoryTrajectory) -> Self {
        self.trajectories.insert(path.into(), source);
        self
    }

    /// Register an obstacle set under `path`.
    pub fn with_obstacles(mut self, path: impl Into<PathBuf>, obstacles: ObstacleSet) -> Self {
        self.obstacles.insert(path.into(), Arc::new(obstacles));
        self
    }
}

fn missing(path: &Path) -> AnalysisError {
    AnalysisError::Config(TaskConfigError::MissingFile {
        path: path.to_path_buf(),
    })
}

impl TaskEnvironment for MemoryEnvironment {
    fn open_trajectory(&self, path: &Path) -> Result<Box<dyn TrajectorySource>, AnalysisError> {
        let source = self.trajectories.get(path).ok_or_else(|| missing(path))?;
        Ok(Box::new(source.clone()))
    }

    fn open_obstacles(&self, path: &Path) -> Result<Arc<dyn ObstacleQuery>, AnalysisError> {
        let set = self.obstacles.get(path).ok_or_else(|| missing(path))?;
        Ok(Arc::clone(set) as Arc<dyn ObstacleQuery>)
    }

    fn exists(&self, path: &Path) -> bool {
        self.trajectories.contains_key(path) || self.obstacles.contains_key(path)
    }
}

/// What became of one task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Output written to this file.
    Written(PathBuf),
    /// Nothing computed.
    Skipped {
        /// Why.
        reason: String,
    },
    /// The task is inactive or has configuration problems.
    Inactive,
    /// The task failed; the message was logged.
    Failed(String),
}

/// Runs the tasks of a [`Project`] against a [`TaskEnvironment`].
#[derive(Debug)]
pub struct TaskRunner<E> {
    env: E,
    config: PipelineConfig,
}

impl<E: TaskEnvironment> TaskRunner<E> {
    /// A runner with the pipeline configuration taken from the environment
    /// variables.
    pub fn new(env: E) -> Self {
        Self {
            env,
            config: PipelineConfig::from_env(),
        }
    }

    /// Replace the pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Run every task in order, one outcome per task.
    pub fn run(&self, project: &Project) -> Vec<TaskOutcome> {
        let mut project = project.clone();
        project.check_files(|p| self.env.exists(p));
        project.tasks.iter().map(|task| self.run_one(task)).collect()
    }

    fn run_one(&self, task: &TaskSpec) -> TaskOutcome {
        if !task.is_active() {
            return TaskOutcome::Inactive;
        }
        match self.run_task(task) {
            Ok(outcome) => outcome,
            Err(e) => {
                let name = task.common().map_or("", |c| c.work_name.as_str());
                error!(task = task.kind().tag(), work = name, error = %e, "task failed");
                TaskOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run one task regardless of other tasks.
    ///
    /// # Errors
    ///
    /// Any failure opening inputs, building the analysis, or writing output.
    pub fn run_task(&self, task: &TaskSpec) -> Result<TaskOutcome, AnalysisError> {
        let (Some(common), Some(params), true) = (task.common(), task.params(), task.is_active())
        else {
            return Ok(TaskOutcome::Inactive);
        };
        if !common.action.computes() {
            return Ok(TaskOutcome::Skipped {
                reason: "visualization only".to_string(),
            });
        }
        fs::create_dir_all(&common.out_folder)?;
        let mut source = self.env.open_trajectory(&common.scb)?;
        let obstacles = common
            .obstacle
            .as_deref()
            .map(|p| self.env.open_obstacles(p))
            .transpose()?;

        let outcome = match params {
            TaskParams::Density { grid, method } => {
                let path = output_path(common, "density.gfs");
                let feed = SourceFeed::new(source);
                match method {
                    DensityMethod::Kernel {
                        kind,
                        sigma,
                        reflect,
                    } => {
                        require_square(grid)?;
                        let mut builder = Kernel::builder(*kind)
                            .sigma(*sigma)
                            .cell_size(grid.cell_size().x)
                            .reflect(*reflect);
                        if let Some(o) = obstacles {
                            builder = builder.obstacles(o);
                        }
                        let r = KernelDensity::new(*grid, builder.build()?);
                        self.grid_file(feed, &r, path)?
                    }
                    DensityMethod::Voronoi { max_radius } => {
                        let mut voronoi = Voronoi::new(*max_radius)?;
                        if let Some(o) = obstacles {
                            voronoi = voronoi.with_obstacles(o);
                        }
                        let r = VoronoiDensity::new(*grid, voronoi);
                        self.grid_file(feed, &r, path)?
                    }
                }
            }
            TaskParams::Speed {
                grid,
                kind,
                window,
                mode,
                max_speed,
                blit_radius,
                sigma,
                reflect,
                exclude_states,
            } => match kind {
                SpeedKind::Speed => {
                    let seconds = step_seconds(common, &*source)? * *window as f32;
                    let mut builder = SpeedRasterizer::builder(*grid)
                        .mode(*mode)
                        .step_seconds(seconds)
                        .max_speed(*max_speed)
                        .blit_radius(*blit_radius)
                        .reflect(*reflect)
                        .exclude_states(exclude_states.iter().copied());
                    if let Some(s) = sigma {
                        builder = builder.sigma(*s);
                    }
                    let r = builder.build()?;
                    let feed = FrameWindow::new(source, *window);
                    self.grid_file(feed, &r, output_path(common, "speed.gfs"))?
                }
                SpeedKind::Angular => {
                    let seconds = step_seconds(common, &*source)? * *window as f32;
                    let r = AngularSpeedRasterizer::new(*grid, seconds)?
                        .with_blit_radius(*blit_radius);
                    let feed = FrameWindow::new(source, *window);
                    self.grid_file(feed, &r, output_path(common, "angular_speed.gfs"))?
                }
                SpeedKind::Progress => {
                    let r = ProgressRasterizer::new(*grid).with_blit_radius(*blit_radius);
                    let feed = ProgressFeed::new(source);
                    self.grid_file(feed, &r, output_path(common, "progress.gfs"))?
                }
            },
            TaskParams::Flow { lines } => {
                let path = output_path(common, "flow.txt");
                self.series_file(&path, || flow_series(&mut source, lines))?
            }
            TaskParams::Population { regions } => {
                let path = output_path(common, "population.txt");
                self.series_file(&path, || population_series(&mut source, regions))?
            }
            TaskParams::FundDiag { regions, window } => {
                let path = output_path(common, "fund_diag.txt");
                let seconds = step_seconds(common, &*source)?;
                self.series_file(&path, || {
                    fundamental_diagram_series(&mut source, regions, *window, seconds)
                })?
            }
        };
        Ok(outcome)
    }

    fn grid_file<F, R>(
        &self,
        feed: F,
        rasterizer: &R,
        path: PathBuf,
    ) -> Result<TaskOutcome, AnalysisError>
    where
        F: FrameFeed<Item = R::Input>,
        R: Rasterizer,
    {
        let report: PipelineReport = run_to_file(feed, rasterizer, &path, &self.config)?;
        if report.skipped {
            return Ok(existing(&report.path));
        }
        Ok(TaskOutcome::Written(report.path))
    }

    fn series_file(
        &self,
        path: &Path,
        compute: impl FnOnce() -> Result<TimeSeries, AnalysisError>,
    ) -> Result<TaskOutcome, AnalysisError> {
        if !self.config.overwrite && path.exists() {
            info!(path = %path.display(), "output exists, analysis skipped");
            return Ok(existing(path));
        }
        let series = compute()?;
        series.write_file(path)?;
        info!(path = %path.display(), rows = series.len(), "time series written");
        Ok(TaskOutcome::Written(path.to_path_buf()))
    }
}

fn existing(path: &Path) -> TaskOutcome {
    TaskOutcome::Skipped {
        reason: format!("{} exists", path.display()),
    }
}

fn output_path(common: &CommonKeys, suffix: &str) -> PathBuf {
    common
        .out_folder
        .join(format!("{}_{suffix}", common.work_name))
}

fn step_seconds(common: &CommonKeys, source: &dyn TrajectorySource) -> Result<f32, AnalysisError> {
    common
        .time_step
        .or_else(|| source.sim_step_size())
        .ok_or_else(|| AnalysisError::InvalidParameter {
            reason: "no timeStep and the trajectory has no step size".to_string(),
        })
}

fn require_square(grid: &AbstractGrid) -> Result<(), AnalysisError> {
    if grid.is_square() {
        return Ok(());
    }
    Err(AnalysisError::InvalidParameter {
        reason: "kernel density needs square cells".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::TaskKind;
    use stride_core::{Frame, Vec2};

    fn env() -> MemoryEnvironment {
        let frames = (0..4)
            .map(|t| Frame::from_positions([Vec2::new(1.0 + t as f32, 1.0)]))
            .collect();
        MemoryEnvironment::new()
            .with_trajectory("walk.scb", MemoryTrajectory::new(frames).with_step_size(0.5))
    }

    fn population(out: &Path, extra: &[(&str, &str)]) -> TaskSpec {
        let out = out.display().to_string();
        let mut entries = vec![
            ("SCB", "walk.scb".to_string()),
            ("outFldr", out),
            ("workName", "t".to_string()),
            ("regions", "a~ 0 0 2.5 2".to_string()),
        ];
        entries.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));
        TaskSpec::from_entries(TaskKind::Population, entries)
    }

    #[test]
    fn memory_environment_reports_missing_paths() {
        let env = env();
        assert!(env.exists(Path::new("walk.scb")));
        assert!(matches!(
            env.open_trajectory(Path::new("other.scb")),
            Err(AnalysisError::Config(TaskConfigError::MissingFile { .. }))
        ));
    }

    #[test]
    fn visualize_only_is_skipped() {
        let out = std::env::temp_dir();
        let runner = TaskRunner::new(env());
        let task = population(&out, &[("task", "Visualize")]);
        assert!(matches!(
            runner.run_task(&task).unwrap(),
            TaskOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn inactive_and_unknown_files_do_not_run() {
        let out = std::env::temp_dir();
        let mut project = Project::new();
        project.tasks.push(population(&out, &[("active", "0")]));
        let mut elsewhere = population(&out, &[]);
        elsewhere.set("SCB", "nowhere.scb");
        project.tasks.push(elsewhere);
        let outcomes = TaskRunner::new(env()).run(&project);
        assert_eq!(outcomes, vec![TaskOutcome::Inactive, TaskOutcome::Inactive]);
    }
}
