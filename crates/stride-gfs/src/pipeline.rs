//! Producer/consumer rasterization into a grid file.
//!
//! Producers draw items from the feed one at a time under a single lock,
//! and each draw is stamped with a sequence number (its ticket) while the
//! lock is held. Rasterization happens outside the lock. The sink keeps a
//! reorder buffer keyed by ticket and writes strictly in ticket order, so
//! the output follows feed order whatever the producer scheduling.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use stride_core::GridElement;
use stride_grid::DataGrid;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{GfsError, PipelineError};
use crate::feed::FrameFeed;
use crate::raster::Rasterizer;
use crate::reader::GfsReader;
use crate::stats::GridStats;
use crate::writer::GfsWriter;

/// Outcome of [`run_to_file`].
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineReport {
    /// The output file.
    pub path: PathBuf,
    /// True when the file already existed and overwrite was off.
    pub skipped: bool,
    /// Frames in the file.
    pub frames: usize,
    /// Producer threads used; zero when skipped.
    pub threads: usize,
    /// Global `(min, max)` of the file, when known.
    pub range: Option<(f64, f64)>,
}

enum Message<T> {
    Grid {
        ticket: usize,
        frame_index: usize,
        grid: DataGrid<T>,
        stats: GridStats<T>,
    },
    Failed(PipelineError),
}

struct Intake<F> {
    feed: F,
    next_ticket: usize,
}

/// Rasterize every item of `feed` on `threads` producer threads and write
/// the grids through `writer` in feed order.
///
/// Returns the finished sink and the statistics patched into the header.
///
/// # Errors
///
/// The first feed, rasterization, or write failure stops the pipeline;
/// outstanding producers finish their current item and exit.
/// [`PipelineError::ProducerPanicked`] / [`PipelineError::SinkPanicked`]
/// when a thread panics, [`PipelineError::ThreadSpawn`] when the OS refuses
/// a thread.
pub fn run_pipeline<F, R, W>(
    feed: F,
    rasterizer: &R,
    writer: GfsWriter<W, R::Elem>,
    threads: usize,
) -> Result<(W, GridStats<R::Elem>), PipelineError>
where
    F: FrameFeed<Item = R::Input>,
    R: Rasterizer,
    W: Write + Seek + Send,
{
    let threads = threads.max(1);
    let intake = Mutex::new(Intake {
        feed,
        next_ticket: 0,
    });
    let abort = AtomicBool::new(false);
    let (tx, rx) = crossbeam_channel::unbounded::<Message<R::Elem>>();

    let intake = &intake;
    let abort = &abort;

    thread::scope(|scope| {
        let sink = thread::Builder::new()
            .name("stride-gfs-sink".into())
            .spawn_scoped(scope, move || write_in_order(rx, writer, abort))
            .map_err(|e| PipelineError::ThreadSpawn {
                reason: format!("sink: {e}"),
            })?;

        let mut producers = Vec::with_capacity(threads);
        let mut spawn_error = None;
        for id in 0..threads {
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("stride-gfs-producer-{id}"))
                .spawn_scoped(scope, move || produce(intake, rasterizer, &tx, abort));
            match spawned {
                Ok(handle) => producers.push(handle),
                Err(e) => {
                    abort.store(true, Ordering::Release);
                    spawn_error = Some(PipelineError::ThreadSpawn {
                        reason: format!("producer {id}: {e}"),
                    });
                    break;
                }
            }
        }
        // The sink stops once every producer's sender is gone.
        drop(tx);

        let mut producer_error = None;
        for handle in producers {
            let outcome = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(PipelineError::ProducerPanicked),
            };
            if let Err(e) = outcome {
                abort.store(true, Ordering::Release);
                producer_error.get_or_insert(e);
            }
        }
        let written = sink.join().map_err(|_| PipelineError::SinkPanicked)?;

        match spawn_error.or(producer_error) {
            Some(e) => Err(e),
            None => written,
        }
    })
}

fn produce<F, R>(
    intake: &Mutex<Intake<F>>,
    rasterizer: &R,
    tx: &Sender<Message<R::Elem>>,
    abort: &AtomicBool,
) -> Result<(), PipelineError>
where
    F: FrameFeed<Item = R::Input>,
    R: Rasterizer,
{
    while !abort.load(Ordering::Acquire) {
        let (item, frame_index, ticket) = {
            let mut guard = intake.lock().map_err(|_| PipelineError::ProducerPanicked)?;
            match guard.feed.next_item() {
                Ok(Some((item, frame_index))) => {
                    let ticket = guard.next_ticket;
                    guard.next_ticket += 1;
                    (item, frame_index, ticket)
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    abort.store(true, Ordering::Release);
                    // A closed channel means the sink already failed.
                    let _ = tx.send(Message::Failed(e.into()));
                    return Ok(());
                }
            }
        };

        let message = match rasterizer.rasterize(&item) {
            Ok(grid) => {
                let stats = GridStats::of_grid(&grid);
                Message::Grid {
                    ticket,
                    frame_index,
                    grid,
                    stats,
                }
            }
            Err(e) => {
                abort.store(true, Ordering::Release);
                Message::Failed(PipelineError::Raster {
                    frame_index,
                    reason: e.reason,
                })
            }
        };
        if tx.send(message).is_err() {
            return Ok(());
        }
    }
    Ok(())
}

fn write_in_order<W, T>(
    rx: Receiver<Message<T>>,
    mut writer: GfsWriter<W, T>,
    abort: &AtomicBool,
) -> Result<(W, GridStats<T>), PipelineError>
where
    W: Write + Seek,
    T: GridElement,
{
    let mut pending: BTreeMap<usize, (usize, DataGrid<T>, GridStats<T>)> = BTreeMap::new();
    let mut next_ticket = 0usize;

    for message in rx.iter() {
        let (ticket, frame_index, grid, stats) = match message {
            Message::Grid {
                ticket,
                frame_index,
                grid,
                stats,
            } => (ticket, frame_index, grid, stats),
            Message::Failed(e) => {
                abort.store(true, Ordering::Release);
                return Err(e);
            }
        };
        pending.insert(ticket, (frame_index, grid, stats));

        while let Some((frame_index, grid, stats)) = pending.remove(&next_ticket) {
            if let Err(e) = writer.write_grid_with_stats(&grid, &stats) {
                abort.store(true, Ordering::Release);
                return Err(e.into());
            }
            debug!(
                frame = frame_index,
                min = stats.min().to_f64(),
                max = stats.max().to_f64(),
                "frame written"
            );
            next_ticket += 1;
        }
    }

    if !pending.is_empty() {
        return Err(PipelineError::MissingFrame {
            ticket: next_ticket,
        });
    }
    let stats = *writer.stats();
    let sink = writer.finish()?;
    Ok((sink, stats))
}

/// Run the pipeline into the file at `path`.
///
/// With `config.overwrite == false` and an existing, readable file the
/// pipeline is skipped and the report describes that file. An existing
/// file that does not open as a finished grid file is regenerated. A run
/// that fails removes its partial output.
pub fn run_to_file<F, R>(
    feed: F,
    rasterizer: &R,
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<PipelineReport, PipelineError>
where
    F: FrameFeed<Item = R::Input>,
    R: Rasterizer,
{
    let path = path.as_ref();
    if !config.overwrite && path.exists() {
        match GfsReader::open_path(path) {
            Ok(existing) => {
                info!(path = %path.display(), "output exists, pipeline skipped");
                return Ok(PipelineReport {
                    path: path.to_path_buf(),
                    skipped: true,
                    frames: existing.len(),
                    threads: 0,
                    range: Some((existing.header().min, existing.header().max)),
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "existing output unreadable, regenerating");
            }
        }
    }

    let threads = config.resolved_thread_count();
    info!(
        path = %path.display(),
        threads,
        rasterizer = rasterizer.name(),
        "pipeline started"
    );
    let writer = GfsWriter::<_, R::Elem>::create(path, *rasterizer.grid())?;
    let finished = run_pipeline(feed, rasterizer, writer, threads).and_then(
        |(buffered, stats)| -> Result<_, PipelineError> {
            buffered
                .into_inner()
                .map_err(|e| GfsError::Io(e.into_error()))?;
            Ok(stats)
        },
    );
    let stats = match finished {
        Ok(stats) => stats,
        Err(e) => {
            if let Err(rm) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %rm, "partial output not removed");
            }
            return Err(e);
        }
    };

    info!(path = %path.display(), frames = stats.count(), "pipeline finished");
    Ok(PipelineReport {
        path: path.to_path_buf(),
        skipped: false,
        frames: stats.count(),
        threads,
        range: stats.range().map(|(lo, hi)| (lo.to_f64(), hi.to_f64())),
    })
}
