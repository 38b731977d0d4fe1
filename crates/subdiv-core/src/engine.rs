//! One refinement step: grid at depth `d` + system → grid at depth `d + 1`.
//!
//! The old grid is only read. The new activeness array is allocated fresh
//! and every write to it is an idempotent set-to-true, so active boxes can
//! be refined in any order or in parallel with identical results.

use std::ops::Add;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::constants::DEFAULT_SAMPLES_PER_DIMENSION;
use crate::domain::Domain;
use crate::error::{Result, SubdivisionError};
use crate::grid::{BoxGrid, locate_flat_index};
use crate::indexing::{flat_index_to_position, grid_shape, position_to_box_borders};
use crate::sampler::InteriorPoints;
use crate::system::DynamicalSystem;

/// Cooperative cancellation flag, checked between active boxes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counts and timing for one refinement step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub from_depth: u32,
    pub to_depth: u32,
    /// Active boxes of the old grid that were sampled.
    pub boxes_refined: usize,
    /// Test-point images that landed inside the domain.
    pub points_mapped: usize,
    /// Test-point images that were out of domain or non-finite.
    pub points_discarded: usize,
    pub active_after: usize,
    pub box_count_after: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Default)]
struct PointTally {
    mapped: usize,
    discarded: usize,
}

impl Add for PointTally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            mapped: self.mapped + other.mapped,
            discarded: self.discarded + other.discarded,
        }
    }
}

/// Refinement step configuration. Holds no state between steps.
#[derive(Clone, Debug)]
pub struct SubdivisionEngine {
    samples_per_dimension: usize,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl Default for SubdivisionEngine {
    fn default() -> Self {
        Self {
            samples_per_dimension: DEFAULT_SAMPLES_PER_DIMENSION,
            parallel: true,
            cancel: None,
        }
    }
}

impl SubdivisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples_per_dimension(mut self, samples: usize) -> Self {
        self.samples_per_dimension = samples;
        self
    }

    /// Refine active boxes on the rayon pool (default) or on the calling thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn samples_per_dimension(&self) -> usize {
        self.samples_per_dimension
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn subdivide<S>(&self, grid: &BoxGrid, system: &S) -> Result<BoxGrid>
    where
        S: DynamicalSystem + ?Sized,
    {
        self.subdivide_with_report(grid, system).map(|(next, _)| next)
    }

    pub fn subdivide_with_report<S>(&self, grid: &BoxGrid, system: &S) -> Result<(BoxGrid, StepReport)>
    where
        S: DynamicalSystem + ?Sized,
    {
        if self.samples_per_dimension == 0 {
            return Err(SubdivisionError::ZeroSamples);
        }
        if system.dimension() != grid.dimension() {
            return Err(SubdivisionError::DimensionMismatch {
                expected: grid.dimension(),
                found: system.dimension(),
            });
        }
        let depth = grid.depth() + 1;
        let (resolution, count) = grid_shape(depth, grid.dimension())?;

        let start = Instant::now();
        let sources: Vec<usize> = grid.active_indices().collect();
        tracing::debug!(
            depth,
            active = sources.len(),
            parallel = self.parallel,
            "subdivision started"
        );

        let step = Step {
            grid,
            system,
            target: grid.domain().as_ref(),
            resolution,
            samples: self.samples_per_dimension,
        };

        let (active, tally) = if self.parallel {
            let flags: Vec<AtomicBool> = (0..count).map(|_| AtomicBool::new(false)).collect();
            let tally = sources
                .par_iter()
                .map(|&index| {
                    self.check_cancelled()?;
                    step.refine(index, |target| flags[target].store(true, Ordering::Relaxed))
                })
                .try_reduce(PointTally::default, |a, b| Ok(a + b))?;
            let active = flags.into_iter().map(AtomicBool::into_inner).collect();
            (active, tally)
        } else {
            let mut active = vec![false; count];
            let mut tally = PointTally::default();
            for &index in &sources {
                self.check_cancelled()?;
                tally = tally + step.refine(index, |target| active[target] = true)?;
            }
            (active, tally)
        };

        let next = BoxGrid::from_parts(grid.domain().clone(), depth, resolution, active);
        let report = StepReport {
            from_depth: grid.depth(),
            to_depth: depth,
            boxes_refined: sources.len(),
            points_mapped: tally.mapped,
            points_discarded: tally.discarded,
            active_after: next.active_count(),
            box_count_after: next.box_count(),
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            depth,
            active = report.active_after,
            discarded = report.points_discarded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "subdivision ended"
        );
        Ok((next, report))
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SubdivisionError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Shared read-only inputs of one step.
struct Step<'a, S: ?Sized> {
    grid: &'a BoxGrid,
    system: &'a S,
    target: &'a Domain,
    resolution: usize,
    samples: usize,
}

impl<S: DynamicalSystem + ?Sized> Step<'_, S> {
    /// Map every test point of one old box and report each in-domain image's
    /// flat index in the new grid through `mark`.
    fn refine(&self, index: usize, mut mark: impl FnMut(usize)) -> Result<PointTally> {
        let dimension = self.grid.dimension();
        let position = flat_index_to_position(index, self.grid.resolution(), dimension);
        let borders = position_to_box_borders(&position, self.grid.domain(), self.grid.resolution());

        let mut tally = PointTally::default();
        for point in InteriorPoints::new(&borders, self.samples) {
            let image = self.system.map_point(&point)?;
            if image.len() != dimension {
                return Err(SubdivisionError::ImageDimension {
                    expected: dimension,
                    found: image.len(),
                });
            }
            match locate_flat_index(self.target, self.resolution, &image) {
                Some(target) => {
                    mark(target);
                    tally.mapped += 1;
                }
                None => tally.discarded += 1,
            }
        }
        tracing::trace!(
            index,
            mapped = tally.mapped,
            discarded = tally.discarded,
            "box refined"
        );
        Ok(tally)
    }
}

/// One refinement step with the default engine.
pub fn subdivide<S>(grid: &BoxGrid, system: &S) -> Result<BoxGrid>
where
    S: DynamicalSystem + ?Sized,
{
    SubdivisionEngine::default().subdivide(grid, system)
}
