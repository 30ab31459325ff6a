//! The analysis project file.
//!
//! A project is a list of task blocks in a line-oriented `key || value`
//! text format:
//!
//! ```text
//! # evening rush, camera 2
//! Task count || 2
//!
//! DENSITY
//! SCB || runs/rush.scb
//! outFldr || out
//! workName || rush
//! domain || 0 0 20 10
//! cellSize || 0.25
//! kernel || Gaussian
//! smoothParam || 0.5
//!
//! FLOW
//! SCB || runs/rush.scb
//! outFldr || out
//! workName || rush
//! lines || door~ 0 5 20 5
//! ```
//!
//! Each block opens with a task tag (`DENSITY`, `FLOW`, `SPEED`,
//! `POPULATION`, `FUND DIAG`). Values are kept verbatim, so
//! [`Project::to_project_string`] reproduces a file that parses to the same
//! project. A value that cannot be interpreted deactivates its task instead
//! of rejecting the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use stride_core::Vec2;
use stride_grid::{AbstractGrid, LineSet, RectDomainSet};
use stride_kernel::KernelKind;
use tracing::warn;

use crate::error::{AnalysisError, TaskConfigError};
use crate::speed::{SpeedMode, DEFAULT_MAX_SPEED};

const TASK_COUNT_KEY: &str = "Task count";
const SEPARATOR: &str = "||";

// ── Task vocabulary ────────────────────────────────────────────────

/// What a task computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Kernel or Voronoi density grid file.
    Density,
    /// Signed line crossings time series.
    Flow,
    /// Speed, angular speed, or progress grid file.
    Speed,
    /// Region population time series.
    Population,
    /// Region density and speed time series.
    FundDiag,
}

impl TaskKind {
    /// Every kind in file order.
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Density,
        TaskKind::Flow,
        TaskKind::Speed,
        TaskKind::Population,
        TaskKind::FundDiag,
    ];

    /// Block tag as written in project files.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Density => "DENSITY",
            Self::Flow => "FLOW",
            Self::Speed => "SPEED",
            Self::Population => "POPULATION",
            Self::FundDiag => "FUND DIAG",
        }
    }

    /// Kind for a block tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What to do with a task's results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskAction {
    /// Compute output files.
    #[default]
    Compute,
    /// Render existing output only.
    Visualize,
    /// Compute, then render.
    ComputeAndVisualize,
}

impl TaskAction {
    /// Label as written in project files.
    pub fn label(self) -> &'static str {
        match self {
            Self::Compute => "Compute",
            Self::Visualize => "Visualize",
            Self::ComputeAndVisualize => "Compute and Vis.",
        }
    }

    /// Whether this action produces output files.
    pub fn computes(self) -> bool {
        !matches!(self, Self::Visualize)
    }

    fn parse(s: &str) -> Option<Self> {
        [Self::Compute, Self::Visualize, Self::ComputeAndVisualize]
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(s))
    }
}

/// Which per-agent quantity a speed task renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeedKind {
    /// Linear speed in m/s.
    #[default]
    Speed,
    /// Signed angular speed around the origin in degrees/s.
    Angular,
    /// Lap progress around the origin.
    Progress,
}

impl SpeedKind {
    /// Name as written in project files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Angular => "Angular",
            Self::Progress => "Progress",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        [Self::Speed, Self::Angular, Self::Progress]
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
    }
}

/// How a density task estimates density.
#[derive(Clone, Debug, PartialEq)]
pub enum DensityMethod {
    /// Kernel density estimate.
    Kernel {
        /// Kernel family.
        kind: KernelKind,
        /// Smoothing parameter.
        sigma: f32,
        /// Reflect at the domain edge.
        reflect: bool,
    },
    /// Voronoi density.
    Voronoi {
        /// Largest distance a site may claim.
        max_radius: f32,
    },
}

/// Keys shared by every task block.
#[derive(Clone, Debug, PartialEq)]
pub struct CommonKeys {
    /// Trajectory file (`SCB`).
    pub scb: PathBuf,
    /// Seconds per frame (`timeStep`); falls back to the source's own.
    pub time_step: Option<f32>,
    /// Obstacle file (`obstacle`).
    pub obstacle: Option<PathBuf>,
    /// Output directory (`outFldr`).
    pub out_folder: PathBuf,
    /// Output file stem (`workName`).
    pub work_name: String,
    /// What to do (`task`).
    pub action: TaskAction,
    /// The `active` flag as written.
    pub active: bool,
}

/// Interpreted task-specific keys.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskParams {
    /// A density grid file.
    Density {
        /// Output grid.
        grid: AbstractGrid,
        /// Estimation method.
        method: DensityMethod,
    },
    /// A speed-like grid file.
    Speed {
        /// Output grid.
        grid: AbstractGrid,
        /// Rendered quantity.
        kind: SpeedKind,
        /// Frames between the two halves of each speed pair.
        window: usize,
        /// Rendering of linear speed.
        mode: SpeedMode,
        /// Speed clamp.
        max_speed: f32,
        /// Blit half-width in cells.
        blit_radius: usize,
        /// Gaussian `σ` for the convolution modes.
        sigma: Option<f32>,
        /// Reflect at the domain edge in the convolution modes.
        reflect: bool,
        /// Agent states left out of linear speed.
        exclude_states: Vec<u32>,
    },
    /// Flow across named lines.
    Flow {
        /// The lines.
        lines: LineSet,
    },
    /// Population of named regions.
    Population {
        /// The regions.
        regions: RectDomainSet,
    },
    /// Fundamental diagram of named regions.
    FundDiag {
        /// The regions.
        regions: RectDomainSet,
        /// Frames between the two halves of each speed pair.
        window: usize,
    },
}

// ── TaskSpec ───────────────────────────────────────────────────────

/// One task block: its raw entries and their interpretation.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSpec {
    kind: TaskKind,
    entries: IndexMap<String, String>,
    common: Option<CommonKeys>,
    params: Option<TaskParams>,
    issues: Vec<TaskConfigError>,
}

impl TaskSpec {
    /// Build a task from `key, value` pairs in file order.
    ///
    /// Problems are recorded in [`issues`](Self::issues) and deactivate the
    /// task; they are also logged once each.
    pub fn from_entries<K, V>(kind: TaskKind, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut spec = Self {
            kind,
            entries,
            common: None,
            params: None,
            issues: Vec::new(),
        };
        spec.resolve();
        spec
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Raw entries in file order.
    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Replace or add one entry and re-interpret the block.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
        self.resolve();
    }

    /// Common keys, when all required ones were readable.
    pub fn common(&self) -> Option<&CommonKeys> {
        self.common.as_ref()
    }

    /// Task-specific parameters, when readable.
    pub fn params(&self) -> Option<&TaskParams> {
        self.params.as_ref()
    }

    /// Every problem found in this block.
    pub fn issues(&self) -> &[TaskConfigError] {
        &self.issues
    }

    /// True when the block is flagged active and has no problems.
    pub fn is_active(&self) -> bool {
        self.issues.is_empty() && self.common.as_ref().is_some_and(|c| c.active)
    }

    fn record(&mut self, issue: TaskConfigError) {
        warn!(task = self.kind.tag(), issue = %issue, "task deactivated");
        self.issues.push(issue);
    }

    fn resolve(&mut self) {
        let mut keys = Keys::new(&self.entries);
        let common = read_common(&mut keys);
        let params = match self.kind {
            TaskKind::Density => read_density(&mut keys),
            TaskKind::Speed => read_speed(&mut keys),
            TaskKind::Flow => keys
                .required("lines", |v| LineSet::parse(v).ok())
                .map(|lines| TaskParams::Flow { lines }),
            TaskKind::Population => keys
                .required("regions", |v| RectDomainSet::parse(v).ok())
                .map(|regions| TaskParams::Population { regions }),
            TaskKind::FundDiag => {
                let regions = keys.required("regions", |v| RectDomainSet::parse(v).ok());
                let window = keys.optional("window", parse_window).unwrap_or(1);
                regions.map(|regions| TaskParams::FundDiag { regions, window })
            }
        };
        let issues = keys.issues;

        self.common = common;
        self.params = params;
        self.issues.clear();
        for issue in issues {
            self.record(issue);
        }
    }
}

// ── Key readers ────────────────────────────────────────────────────

struct Keys<'a> {
    entries: &'a IndexMap<String, String>,
    issues: Vec<TaskConfigError>,
}

impl<'a> Keys<'a> {
    fn new(entries: &'a IndexMap<String, String>) -> Self {
        Self {
            entries,
            issues: Vec::new(),
        }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.entries.get(key).map(String::as_str)
    }

    fn invalid(&mut self, key: &str) {
        let value = self.raw(key).unwrap_or_default().to_string();
        self.issues.push(TaskConfigError::InvalidValue {
            key: key.to_string(),
            value,
        });
    }

    fn optional<T>(&mut self, key: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let value = self.raw(key)?;
        let parsed = parse(value.trim());
        if parsed.is_none() {
            self.invalid(key);
        }
        parsed
    }

    fn required<T>(&mut self, key: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        if self.raw(key).is_none() {
            self.issues.push(TaskConfigError::MissingKey {
                key: key.to_string(),
            });
            return None;
        }
        self.optional(key, parse)
    }

    fn grid(&mut self) -> Option<AbstractGrid> {
        let domain = self.required("domain", parse_floats::<4>);
        let cell = self.required("cellSize", parse_positive);
        let ([x, y, w, h], cell) = (domain?, cell?);
        let grid = AbstractGrid::with_cell_size(Vec2::new(x, y), Vec2::new(w, h), cell).ok();
        if grid.is_none() {
            self.invalid("domain");
        }
        grid
    }
}

fn parse_positive(s: &str) -> Option<f32> {
    f32::from_str(s).ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

fn parse_window(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().filter(|&w| w > 0)
}

fn parse_floats<const N: usize>(s: &str) -> Option<[f32; N]> {
    let values = s
        .split_whitespace()
        .map(|t| t.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    values.try_into().ok()
}

fn read_common(keys: &mut Keys<'_>) -> Option<CommonKeys> {
    let scb = keys.required("SCB", |v| (!v.is_empty()).then(|| PathBuf::from(v)));
    let time_step = keys.optional("timeStep", parse_positive);
    let obstacle = keys
        .optional("obstacle", |v| Some(v.to_string()))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let out_folder = keys.required("outFldr", |v| (!v.is_empty()).then(|| PathBuf::from(v)));
    let work_name = keys.required("workName", |v| (!v.is_empty()).then(|| v.to_string()));
    let action = keys.optional("task", TaskAction::parse).unwrap_or_default();
    let active = keys.optional("active", parse_flag).unwrap_or(true);
    Some(CommonKeys {
        scb: scb?,
        time_step,
        obstacle,
        out_folder: out_folder?,
        work_name: work_name?,
        action,
        active,
    })
}

fn read_density(keys: &mut Keys<'_>) -> Option<TaskParams> {
    let grid = keys.grid();
    let voronoi = keys
        .optional("method", |v| match v.to_ascii_lowercase().as_str() {
            "kernel" => Some(false),
            "voronoi" => Some(true),
            _ => None,
        })
        .unwrap_or(false);
    let method = if voronoi {
        keys.required("maxRadius", parse_positive)
            .map(|max_radius| DensityMethod::Voronoi { max_radius })
    } else {
        let kind = keys
            .optional("kernel", |v| KernelKind::from_str(v).ok())
            .unwrap_or(KernelKind::Gaussian);
        let reflect = keys.optional("reflect", parse_flag).unwrap_or(false);
        keys.required("smoothParam", parse_positive)
            .map(|sigma| DensityMethod::Kernel {
                kind,
                sigma,
                reflect,
            })
    };
    Some(TaskParams::Density {
        grid: grid?,
        method: method?,
    })
}

fn read_speed(keys: &mut Keys<'_>) -> Option<TaskParams> {
    let grid = keys.grid();
    let kind = keys.optional("speedType", SpeedKind::parse).unwrap_or_default();
    let window = keys.optional("window", parse_window).unwrap_or(1);
    let mode = keys
        .optional("speedMode", |v| SpeedMode::from_str(v).ok())
        .unwrap_or_default();
    let max_speed = keys
        .optional("maxSpeed", parse_positive)
        .unwrap_or(DEFAULT_MAX_SPEED);
    let blit_radius = keys
        .optional("blitRadius", |v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let sigma = if kind == SpeedKind::Speed && mode != SpeedMode::Blit {
        keys.required("smoothParam", parse_positive)
    } else {
        keys.optional("smoothParam", parse_positive)
    };
    let reflect = keys.optional("reflect", parse_flag).unwrap_or(false);
    let exclude_states = keys
        .optional("excludeStates", |v| {
            v.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(|t| t.parse::<u32>().ok())
                .collect::<Option<Vec<u32>>>()
        })
        .unwrap_or_default();
    Some(TaskParams::Speed {
        grid: grid?,
        kind,
        window,
        mode,
        max_speed,
        blit_radius,
        sigma,
        reflect,
        exclude_states,
    })
}

// ── Project ────────────────────────────────────────────────────────

/// An ordered list of analysis tasks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Project {
    /// Tasks in file order.
    pub tasks: Vec<TaskSpec>,
}

impl Project {
    /// An empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse project text.
    ///
    /// # Errors
    ///
    /// [`TaskConfigError::UnknownTaskType`] for an unrecognized block tag,
    /// [`TaskConfigError::Malformed`] for a line that fits nowhere or a
    /// task count that disagrees with the blocks present, and
    /// [`TaskConfigError::MissingKey`] when the task count is absent.
    /// Problems inside a block only deactivate that task.
    pub fn parse(text: &str) -> Result<Self, TaskConfigError> {
        let mut declared: Option<(usize, usize)> = None;
        let mut blocks: Vec<(TaskKind, Vec<(String, String)>)> = Vec::new();

        for (n, line) in text.lines().enumerate() {
            let number = n + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(SEPARATOR) {
                let (key, value) = (key.trim(), value.trim());
                match blocks.last_mut() {
                    Some((_, entries)) => entries.push((key.to_string(), value.to_string())),
                    None if key == TASK_COUNT_KEY && declared.is_none() => {
                        let count = value.parse::<usize>().map_err(|_| {
                            TaskConfigError::InvalidValue {
                                key: key.to_string(),
                                value: value.to_string(),
                            }
                        })?;
                        declared = Some((count, number));
                    }
                    None => return Err(TaskConfigError::Malformed { line: number }),
                }
                continue;
            }
            match TaskKind::from_tag(line) {
                Some(kind) => blocks.push((kind, Vec::new())),
                None if is_tag_like(line) => {
                    return Err(TaskConfigError::UnknownTaskType {
                        tag: line.to_string(),
                    })
                }
                None => return Err(TaskConfigError::Malformed { line: number }),
            }
        }

        let (count, count_line) = declared.ok_or_else(|| TaskConfigError::MissingKey {
            key: TASK_COUNT_KEY.to_string(),
        })?;
        if count != blocks.len() {
            return Err(TaskConfigError::Malformed { line: count_line });
        }
        Ok(Self {
            tasks: blocks
                .into_iter()
                .map(|(kind, entries)| TaskSpec::from_entries(kind, entries))
                .collect(),
        })
    }

    /// Read and parse a project file, then check that referenced files
    /// exist.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Io`] when the file cannot be read and
    /// [`AnalysisError::Config`] for a file-level parse failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let text = fs::read_to_string(path)?;
        let mut project = Self::parse(&text)?;
        project.check_files(Path::exists);
        Ok(project)
    }

    /// Deactivate tasks whose trajectory or obstacle file fails `exists`.
    pub fn check_files(&mut self, exists: impl Fn(&Path) -> bool) {
        for task in &mut self.tasks {
            let Some(common) = task.common.clone() else {
                continue;
            };
            let referenced = std::iter::once(common.scb).chain(common.obstacle);
            for path in referenced {
                if !exists(&path) {
                    task.record(TaskConfigError::MissingFile { path });
                }
            }
        }
    }

    /// Tasks that will run.
    pub fn active_tasks(&self) -> impl Iterator<Item = &TaskSpec> + '_ {
        self.tasks.iter().filter(|t| t.is_active())
    }

    /// Serialize in the form accepted by [`parse`](Self::parse).
    pub fn to_project_string(&self) -> String {
        let mut out = format!("{TASK_COUNT_KEY} {SEPARATOR} {}\n", self.tasks.len());
        for task in &self.tasks {
            out.push('\n');
            out.push_str(task.kind.tag());
            out.push('\n');
            for (key, value) in &task.entries {
                out.push_str(&format!("{key} {SEPARATOR} {value}\n"));
            }
        }
        out
    }
}

fn is_tag_like(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '_')
}
