//! Background tile loader: fills every tile covering an area at every zoom.
//!
//! One loader runs at most one worker thread at a time. Tiles are filled
//! strictly one after another; progress and completion are reported through a
//! callback invoked on the worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::error::LoaderError;
use crate::grid::TileRange;
use crate::proj::Limits;
use crate::source::{Cancellation, TileSource};
use crate::tile::Tile;

/// Events emitted by a loader run, in order: zero or more `Progress`, then
/// exactly one `Done`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadEvent {
    /// Fraction of tiles attempted so far, in `[0, 1]`.
    Progress(f64),
    /// Tiles that failed or were skipped by a stop.
    Done { failed: u64 },
}

/// Outcome of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub total: u64,
    pub processed: u64,
    pub failed: u64,
    pub stopped: bool,
}

#[derive(Debug, Default)]
pub struct TileLoader {
    busy: Arc<AtomicBool>,
    stop: Cancellation,
}

/// Joinable handle to a running loader worker.
#[derive(Debug)]
pub struct LoadHandle {
    handle: JoinHandle<LoadReport>,
}

impl LoadHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker exits.
    pub fn join(self) -> Result<LoadReport, LoaderError> {
        self.handle.join().map_err(|_| LoaderError::WorkerPanicked)
    }
}

/// Clears the busy flag when the worker finishes or unwinds.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start loading every tile of `source` that covers `bounds` (planar units
    /// of the source projection), at every zoom level of its grid.
    ///
    /// Returns immediately. Fails with [`LoaderError::Busy`] while a previous
    /// run is still active; no second worker is spawned in that case.
    pub fn start<F>(
        &self,
        source: Arc<dyn TileSource>,
        bounds: Limits,
        on_event: F,
    ) -> Result<LoadHandle, LoaderError>
    where
        F: FnMut(LoadEvent) + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("tile loader busy, start rejected");
            return Err(LoaderError::Busy);
        }
        self.stop.reset();

        let guard = BusyGuard(Arc::clone(&self.busy));
        let stop = self.stop.clone();
        let spawned = thread::Builder::new()
            .name("tile-loader".into())
            .spawn(move || run(guard, source, bounds, stop, on_event));

        match spawned {
            Ok(handle) => Ok(LoadHandle { handle }),
            // The closure, and with it the guard, is dropped on failure.
            Err(e) => Err(LoaderError::Spawn(e)),
        }
    }

    /// Ask the running worker to stop before its next tile.
    ///
    /// Does not wait. Calling it repeatedly, or while idle, is harmless.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

fn run<F>(
    guard: BusyGuard,
    source: Arc<dyn TileSource>,
    bounds: Limits,
    stop: Cancellation,
    mut on_event: F,
) -> LoadReport
where
    F: FnMut(LoadEvent),
{
    let ranges = source.grid().cover(&bounds);
    let total: u64 = ranges.iter().map(TileRange::len).sum();
    let tile_size = source.grid().tile_size();
    info!(total, zooms = ranges.len(), "tile loading started");

    let mut processed = 0_u64;
    let mut failed = 0_u64;
    let mut stopped = false;

    // A stop abandons the remaining zoom levels as well.
    'zooms: for range in &ranges {
        for coord in range {
            if stop.is_cancelled() {
                stopped = true;
                break 'zooms;
            }

            let mut tile = Tile::new(coord, tile_size);
            if let Err(e) = source.fill_tile(&mut tile, &stop) {
                failed += 1;
                warn!(%coord, error = %e, "tile load failed");
            }
            processed += 1;
            on_event(LoadEvent::Progress(processed as f64 / total as f64));
        }
    }

    failed += total - processed;
    drop(source);
    // Release before the final event so its handler may start a new run.
    drop(guard);

    if stopped {
        info!(processed, total, failed, "tile loading stopped");
    } else {
        info!(total, failed, "tile loading finished");
    }
    on_event(LoadEvent::Done { failed });

    LoadReport {
        total,
        processed,
        failed,
        stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{Gate, SolidSource};
    use std::sync::mpsc;

    fn full_bounds() -> Limits {
        Limits::new(0.0, 1.0, 0.0, 1.0)
    }

    fn start_collecting(
        loader: &TileLoader,
        source: Arc<dyn TileSource>,
        bounds: Limits,
    ) -> (LoadHandle, mpsc::Receiver<LoadEvent>) {
        let (tx, rx) = mpsc::channel();
        let handle = loader
            .start(source, bounds, move |e| {
                let _ = tx.send(e);
            })
            .unwrap();
        (handle, rx)
    }

    #[test]
    fn test_every_tile_filled_once() {
        let source = Arc::new(SolidSource::new(4));
        let loader = TileLoader::new();
        let (handle, rx) = start_collecting(&loader, source.clone(), full_bounds());

        let report = handle.join().unwrap();
        let events: Vec<_> = rx.iter().collect();

        assert_eq!(source.calls(), 1 + 4 + 16 + 100);
        assert_eq!(
            report,
            LoadReport {
                total: 121,
                processed: 121,
                failed: 0,
                stopped: false
            }
        );
        assert_eq!(events.len(), 122);
        assert_eq!(events[120], LoadEvent::Progress(1.0));
        assert_eq!(events[121], LoadEvent::Done { failed: 0 });
    }

    #[test]
    fn test_progress_is_monotonic() {
        let loader = TileLoader::new();
        let (handle, rx) = start_collecting(&loader, Arc::new(SolidSource::new(4)), full_bounds());
        handle.join().unwrap();

        let mut last = 0.0;
        let mut done = 0;
        for event in rx.iter() {
            match event {
                LoadEvent::Progress(f) => {
                    assert_eq!(done, 0, "progress after done");
                    assert!(f > last && f <= 1.0);
                    last = f;
                }
                LoadEvent::Done { .. } => done += 1,
            }
        }
        assert_eq!(done, 1);
    }

    #[test]
    fn test_failures_are_counted() {
        let source = Arc::new(SolidSource::new(4).failing_on(|c| c.x == 1));
        let loader = TileLoader::new();
        let (handle, rx) = start_collecting(&loader, source, full_bounds());

        let report = handle.join().unwrap();
        // Column 1 exists at zooms 1..=3 with 2, 4 and 10 rows.
        assert_eq!(report.failed, 16);
        assert_eq!(report.processed, 121);
        assert_eq!(rx.iter().last(), Some(LoadEvent::Done { failed: 16 }));
    }

    #[test]
    fn test_partial_bounds() {
        let source = Arc::new(SolidSource::new(4));
        let loader = TileLoader::new();
        let (handle, _rx) =
            start_collecting(&loader, source.clone(), Limits::new(0.05, 0.35, 0.72, 0.95));

        let report = handle.join().unwrap();
        // One tile at zooms 0 and 1, then 2x2 and 4x3.
        assert_eq!(report.total, 1 + 1 + 4 + 12);
        assert_eq!(source.calls(), 18);
    }

    #[test]
    fn test_tile_aligned_bounds_load_only_their_tiles() {
        let source = Arc::new(SolidSource::new(4));
        let loader = TileLoader::new();
        let quadrant = Limits::new(0.0, 0.5, 0.5, 1.0);
        let (handle, rx) = start_collecting(&loader, source.clone(), quadrant);

        let report = handle.join().unwrap();
        assert_eq!(report.total, 1 + 1 + 4 + 25);
        assert_eq!(source.calls(), 31);
        assert_eq!(rx.iter().last(), Some(LoadEvent::Done { failed: 0 }));
    }

    #[test]
    fn test_bounds_outside_grid() {
        let source = Arc::new(SolidSource::new(4));
        let loader = TileLoader::new();
        let outside = Limits::new(5.0, 6.0, 5.0, 6.0);
        let (handle, rx) = start_collecting(&loader, source.clone(), outside);

        assert_eq!(handle.join().unwrap().total, 0);
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![LoadEvent::Done { failed: 0 }]);
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_second_start_rejected_while_busy() {
        let gate = Arc::new(Gate::default());
        let source = Arc::new(SolidSource::new(4).gated(gate.clone()));
        let loader = TileLoader::new();

        let (handle, rx) = start_collecting(&loader, source.clone(), full_bounds());
        assert!(loader.is_busy());

        let second = loader.start(source.clone(), full_bounds(), |_| {});
        assert!(matches!(second, Err(LoaderError::Busy)));

        gate.open();
        let report = handle.join().unwrap();
        assert_eq!(report.processed, 121);
        assert_eq!(report.failed, 0);
        assert_eq!(source.calls(), 121);
        assert_eq!(rx.iter().filter(|e| matches!(e, LoadEvent::Done { .. })).count(), 1);
        assert!(!loader.is_busy());

        let (again, _rx) = start_collecting(&loader, source.clone(), full_bounds());
        again.join().unwrap();
        assert_eq!(source.calls(), 242);
    }

    #[test]
    fn test_stop_abandons_run() {
        let gate = Arc::new(Gate::default());
        let source = Arc::new(SolidSource::new(4).gated(gate.clone()));
        let loader = TileLoader::new();

        let (handle, rx) = start_collecting(&loader, source.clone(), full_bounds());
        loader.stop();
        loader.stop();
        gate.open();

        let report = handle.join().unwrap();
        assert!(report.stopped);
        // At most the tile already blocked on the gate gets through.
        assert!(report.processed <= 1);
        assert_eq!(report.failed, report.total - report.processed);
        assert_eq!(rx.iter().last(), Some(LoadEvent::Done { failed: report.failed }));
    }

    #[test]
    fn test_stop_after_completion_is_harmless() {
        let source = Arc::new(SolidSource::new(4));
        let loader = TileLoader::new();
        let (handle, _rx) = start_collecting(&loader, source.clone(), full_bounds());
        handle.join().unwrap();

        loader.stop();
        loader.stop();
        assert!(!loader.is_busy());

        // The next run clears the stale request and completes.
        let (handle, _rx) = start_collecting(&loader, source.clone(), full_bounds());
        let report = handle.join().unwrap();
        assert!(!report.stopped);
        assert_eq!(report.processed, 121);
    }

    #[test]
    fn test_busy_cleared_when_source_panics() {
        struct Panicking(SolidSource);
        impl TileSource for Panicking {
            fn grid(&self) -> &crate::grid::TileGrid {
                self.0.grid()
            }
            fn projection(&self) -> Arc<dyn crate::proj::Projection> {
                self.0.projection()
            }
            fn fill_tile(
                &self,
                _: &mut Tile,
                _: &Cancellation,
            ) -> Result<(), crate::error::TileError> {
                panic!("source exploded");
            }
        }

        let loader = TileLoader::new();
        let handle = loader
            .start(Arc::new(Panicking(SolidSource::new(4))), full_bounds(), |_| {})
            .unwrap();
        assert!(matches!(handle.join(), Err(LoaderError::WorkerPanicked)));
        assert!(!loader.is_busy());
    }
}
