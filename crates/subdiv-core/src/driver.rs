use std::sync::Arc;

use crate::constants::SEED_DEPTH;
use crate::domain::Domain;
use crate::engine::{StepReport, SubdivisionEngine};
use crate::error::{Result, SubdivisionError};
use crate::grid::{Activeness, BoxGrid};
use crate::indexing::grid_shape;
use crate::system::DynamicalSystem;

/// Hooks invoked around every refinement step. Both default to no-ops.
pub trait SubdivisionObserver {
    fn on_step_start(&mut self, _grid: &BoxGrid) {}

    fn on_step_end(&mut self, _report: &StepReport) {}
}

impl SubdivisionObserver for () {}

/// Logs step progress as `info` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl SubdivisionObserver for TracingObserver {
    fn on_step_start(&mut self, grid: &BoxGrid) {
        tracing::info!(
            "subdivision started: depth {} -> {} ({} active boxes)",
            grid.depth(),
            grid.depth() + 1,
            grid.active_count()
        );
    }

    fn on_step_end(&mut self, report: &StepReport) {
        tracing::info!(
            "subdivision ended: depth {}, {}/{} boxes active, {} images discarded, {:.3}s",
            report.to_depth,
            report.active_after,
            report.box_count_after,
            report.points_discarded,
            report.elapsed.as_secs_f64()
        );
    }
}

/// Repeats refinement steps from a seed grid until a target depth.
#[derive(Clone, Debug)]
pub struct SubdivisionDriver {
    engine: SubdivisionEngine,
    seed_depth: u32,
}

impl Default for SubdivisionDriver {
    fn default() -> Self {
        Self {
            engine: SubdivisionEngine::default(),
            seed_depth: SEED_DEPTH,
        }
    }
}

impl SubdivisionDriver {
    pub fn new(engine: SubdivisionEngine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    pub fn with_seed_depth(mut self, depth: u32) -> Self {
        self.seed_depth = depth;
        self
    }

    pub fn engine(&self) -> &SubdivisionEngine {
        &self.engine
    }

    pub fn seed_depth(&self) -> u32 {
        self.seed_depth
    }

    pub fn run<S>(&self, system: &S, domain: impl Into<Arc<Domain>>, target_depth: u32) -> Result<BoxGrid>
    where
        S: DynamicalSystem + ?Sized,
    {
        self.run_observed(system, domain, target_depth, &mut ())
    }

    /// Seed a fully active grid at the seed depth and refine it to
    /// `target_depth`.
    pub fn run_observed<S>(
        &self,
        system: &S,
        domain: impl Into<Arc<Domain>>,
        target_depth: u32,
        observer: &mut dyn SubdivisionObserver,
    ) -> Result<BoxGrid>
    where
        S: DynamicalSystem + ?Sized,
    {
        if target_depth < self.seed_depth {
            return Err(SubdivisionError::TargetBelowSeed {
                target: target_depth,
                seed: self.seed_depth,
            });
        }
        let domain = domain.into();
        check_dimension(system, &domain)?;
        grid_shape(target_depth, domain.dimension())?;
        let seed = BoxGrid::new(domain, self.seed_depth, Activeness::AllActive)?;
        self.run_from(seed, system, target_depth, observer)
    }

    /// Refine a caller-supplied grid, possibly only selectively active, to
    /// `target_depth`.
    pub fn run_from<S>(
        &self,
        mut grid: BoxGrid,
        system: &S,
        target_depth: u32,
        observer: &mut dyn SubdivisionObserver,
    ) -> Result<BoxGrid>
    where
        S: DynamicalSystem + ?Sized,
    {
        if target_depth < grid.depth() {
            return Err(SubdivisionError::TargetBelowSeed {
                target: target_depth,
                seed: grid.depth(),
            });
        }
        check_dimension(system, grid.domain())?;
        grid_shape(target_depth, grid.dimension())?;

        while grid.depth() != target_depth {
            observer.on_step_start(&grid);
            let (next, report) = self.engine.subdivide_with_report(&grid, system)?;
            observer.on_step_end(&report);
            grid = next;
        }
        Ok(grid)
    }
}

fn check_dimension<S>(system: &S, domain: &Domain) -> Result<()>
where
    S: DynamicalSystem + ?Sized,
{
    if system.dimension() != domain.dimension() {
        return Err(SubdivisionError::DimensionMismatch {
            expected: domain.dimension(),
            found: system.dimension(),
        });
    }
    Ok(())
}

/// Refine a fully active depth-3 grid over `domain` to `target_depth` with
/// the default engine.
pub fn run_subdivision<S>(system: &S, domain: impl Into<Arc<Domain>>, target_depth: u32) -> Result<BoxGrid>
where
    S: DynamicalSystem + ?Sized,
{
    SubdivisionDriver::default().run(system, domain, target_depth)
}
