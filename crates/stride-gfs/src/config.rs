//! Pipeline configuration.

/// Environment variable that overrides the producer thread count.
pub const THREAD_COUNT_ENV: &str = "STRIDE_THREAD_COUNT";

/// Upper bound on producer threads.
pub const MAX_THREADS: usize = 64;

// ── PipelineConfig ─────────────────────────────────────────────────

/// Configuration for [`run_to_file`](crate::run_to_file).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of producer threads. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[1, 64]`).
    pub thread_count: Option<usize>,
    /// When false and the output file already exists, the pipeline is
    /// skipped. Default: true.
    pub overwrite: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thread_count: None,
            overwrite: true,
        }
    }
}

impl PipelineConfig {
    /// Defaults with the thread count taken from [`THREAD_COUNT_ENV`] when
    /// it is set and numeric.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(THREAD_COUNT_ENV).ok().as_deref())
    }

    /// Defaults with the thread count parsed from `value`; non-numeric
    /// values are ignored.
    pub fn from_env_value(value: Option<&str>) -> Self {
        Self {
            thread_count: value.and_then(|v| v.trim().parse().ok()),
            ..Self::default()
        }
    }

    /// Set an explicit thread count.
    pub fn with_thread_count(mut self, threads: usize) -> Self {
        self.thread_count = Some(threads);
        self
    }

    /// Set the overwrite flag.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Resolve the actual thread count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`. Zero producers would
    /// never drain the feed.
    pub fn resolved_thread_count(&self) -> usize {
        match self.thread_count {
            Some(n) => n.clamp(1, MAX_THREADS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, MAX_THREADS),
        }
    }
}
