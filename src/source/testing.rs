//! In-memory sources for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use ndarray::Array3;

use crate::error::TileError;
use crate::grid::TileGrid;
use crate::proj::{Limits, Projection, PseudoMercator};
use crate::source::{Cancellation, TileSource};
use crate::tile::{Tile, TileCoord};

type FailPredicate = Box<dyn Fn(TileCoord) -> bool + Send + Sync>;

/// Blocks fills until opened.
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cond.wait(open).unwrap();
        }
    }
}

/// Fills every tile with a colour derived from its coordinate and counts calls.
///
/// The grid is the unit square with 1, 2, 4 and 10 tiles per side at zooms 0..=3.
pub struct SolidSource {
    grid: TileGrid,
    tile_size: u32,
    calls: AtomicUsize,
    fail: Option<FailPredicate>,
    gate: Option<Arc<Gate>>,
}

impl SolidSource {
    pub fn new(tile_size: u32) -> Self {
        let limits = Limits::new(0.0, 1.0, 0.0, 1.0);
        let grid = TileGrid::with_xnums(limits, 0, tile_size, &[1, 2, 4, 10]).unwrap();
        Self {
            grid,
            tile_size,
            calls: AtomicUsize::new(0),
            fail: None,
            gate: None,
        }
    }

    pub fn failing_on(mut self, pred: impl Fn(TileCoord) -> bool + Send + Sync + 'static) -> Self {
        self.fail = Some(Box::new(pred));
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TileSource for SolidSource {
    fn grid(&self) -> &TileGrid {
        &self.grid
    }

    fn projection(&self) -> Arc<dyn Projection> {
        Arc::new(PseudoMercator::new())
    }

    fn fill_tile(&self, tile: &mut Tile, _cancel: &Cancellation) -> Result<(), TileError> {
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let coord = tile.coord();
        if self.fail.as_ref().is_some_and(|f| f(coord)) {
            return Err(TileError::NotFound(coord));
        }
        let side = self.tile_size as usize;
        let colour = [coord.zoom as u8, coord.x as u8, coord.y as u8, u8::MAX];
        tile.set_pixels(Array3::from_shape_fn((side, side, 4), |(_, _, ch)| colour[ch]))
    }
}
