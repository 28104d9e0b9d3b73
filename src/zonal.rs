//! Zonal statistics over a buffer polygon
//!
//! A pixel contributes when its value is finite, differs from the grid's
//! no-data sentinel, and its center lies inside the polygon ring (even-odd
//! rule, see [`point_in_ring`](crate::geometry::point_in_ring)).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::geometry::BufferPolygon;
use crate::raster::RasterGrid;

/// Aggregates over the included pixels.
///
/// With no included pixels `count`, `sum` and `mean` are 0 and `min`/`max`
/// are `None` (serialized as `null`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZonalStatistics {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ZonalStatistics {
    pub fn empty() -> Self {
        Accumulator::default().finish()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Running count/sum/min/max
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }

    fn finish(self) -> ZonalStatistics {
        if self.count == 0 {
            return ZonalStatistics {
                count: 0,
                sum: 0.0,
                mean: 0.0,
                min: None,
                max: None,
            };
        }

        ZonalStatistics {
            count: self.count,
            sum: self.sum,
            mean: self.sum / self.count as f64,
            min: Some(self.min),
            max: Some(self.max),
        }
    }
}

/// Folds one grid row into `acc`
fn accumulate_row(grid: &RasterGrid, polygon: &BufferPolygon, row: usize, acc: &mut Accumulator) {
    let extent = polygon.extent();
    let y = grid.pixel_center(row, 0).y;
    if y < extent.min_y || y > extent.max_y {
        return;
    }

    for (col, &value) in grid.row(row).iter().enumerate() {
        if grid.is_excluded(value) {
            continue;
        }
        if polygon.contains(grid.pixel_center(row, col)) {
            acc.push(value);
        }
    }
}

/// Single sequential pass over the grid
pub fn aggregate(grid: &RasterGrid, polygon: &BufferPolygon) -> ZonalStatistics {
    let mut acc = Accumulator::default();
    for row in 0..grid.height() {
        accumulate_row(grid, polygon, row, &mut acc);
    }
    acc.finish()
}

/// Row-parallel variant of [`aggregate`].
///
/// Counts, minimum and maximum are identical to the sequential pass; the sum
/// may differ in the last bits because rows are added in a different order.
pub fn aggregate_parallel(grid: &RasterGrid, polygon: &BufferPolygon) -> ZonalStatistics {
    (0..grid.height())
        .into_par_iter()
        .fold(Accumulator::default, |mut acc, row| {
            accumulate_row(grid, polygon, row, &mut acc);
            acc
        })
        .reduce(Accumulator::default, Accumulator::merge)
        .finish()
}

/// Picks the parallel pass when the grid has at least `threshold` pixels
pub fn aggregate_auto(grid: &RasterGrid, polygon: &BufferPolygon, threshold: usize) -> ZonalStatistics {
    if grid.values().len() >= threshold {
        aggregate_parallel(grid, polygon)
    } else {
        aggregate(grid, polygon)
    }
}
