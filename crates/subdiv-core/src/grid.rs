use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Domain, Interval};
use crate::error::Result;
use crate::indexing::{
    Position, flat_index_to_position, grid_shape, position_to_box_borders, position_to_flat_index,
};

/// Initial value of every activeness flag in a new grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activeness {
    AllActive,
    AllInactive,
}

/// Regular partition of a [`Domain`] into `(2^depth)^dimension` boxes, each
/// flagged active or inactive.
///
/// A grid never changes depth. Refinement builds a fresh grid one level
/// deeper and the old one is dropped once nothing refers to it. Each grid
/// owns its activeness array; only the domain is shared.
#[derive(Clone, Debug)]
pub struct BoxGrid {
    domain: Arc<Domain>,
    depth: u32,
    resolution: usize,
    active: Vec<bool>,
}

impl BoxGrid {
    pub fn new(domain: Arc<Domain>, depth: u32, initial: Activeness) -> Result<Self> {
        let (resolution, count) = grid_shape(depth, domain.dimension())?;
        Ok(Self {
            domain,
            depth,
            resolution,
            active: vec![initial == Activeness::AllActive; count],
        })
    }

    /// An inactive grid with only `positions` switched on.
    pub fn with_active<I, P>(domain: Arc<Domain>, depth: u32, positions: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[usize]>,
    {
        let mut grid = Self::new(domain, depth, Activeness::AllInactive)?;
        for p in positions {
            grid.set_active(p.as_ref());
        }
        Ok(grid)
    }

    /// Assemble a grid from an already populated activeness array.
    pub(crate) fn from_parts(
        domain: Arc<Domain>,
        depth: u32,
        resolution: usize,
        active: Vec<bool>,
    ) -> Self {
        debug_assert_eq!(
            Some(active.len()),
            crate::indexing::box_count(resolution, domain.dimension())
        );
        Self {
            domain,
            depth,
            resolution,
            active,
        }
    }

    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Boxes per axis, `2^depth`.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn dimension(&self) -> usize {
        self.domain.dimension()
    }

    pub fn box_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    pub fn is_active(&self, position: &[usize]) -> bool {
        self.active[self.flat_index(position)]
    }

    pub fn is_active_index(&self, index: usize) -> bool {
        self.active[index]
    }

    /// Mark a box active. Setting an already active box is a no-op.
    pub fn set_active(&mut self, position: &[usize]) {
        let index = self.flat_index(position);
        self.active[index] = true;
    }

    pub fn box_borders(&self, position: &[usize]) -> Vec<Interval> {
        self.check_position(position);
        position_to_box_borders(position, &self.domain, self.resolution)
    }

    /// Position of the box containing `point`, or `None` if the point is out
    /// of the domain.
    ///
    /// The closed interval test runs first on every axis and rejects the whole
    /// point, including non-finite coordinates. The floored index is then
    /// clamped from `resolution` to `resolution - 1` only, which absorbs a
    /// point on the upper border. Any other out-of-range index is treated as
    /// out of domain rather than clamped.
    pub fn locate_position(&self, point: &[f64]) -> Option<Position> {
        if point.len() != self.dimension() {
            return None;
        }
        let mut position = vec![0; point.len()];
        if self.locate_into(point, &mut position) {
            Some(position)
        } else {
            None
        }
    }

    /// Flat index of the box containing `point`.
    pub fn locate_index(&self, point: &[f64]) -> Option<usize> {
        locate_flat_index(&self.domain, self.resolution, point)
    }

    fn locate_into(&self, point: &[f64], out: &mut [usize]) -> bool {
        for ((iv, &x), slot) in self.domain.intervals().iter().zip(point).zip(out.iter_mut()) {
            match axis_index(iv, x, self.resolution) {
                Some(i) => *slot = i,
                None => return false,
            }
        }
        true
    }

    /// Every active box in flat-index order. Call again to restart.
    pub fn active_boxes(&self) -> ActiveBoxes<'_> {
        ActiveBoxes {
            grid: self,
            next: 0,
        }
    }

    pub fn summary(&self) -> GridSummary {
        let active = self.active_count();
        let box_volume = self.domain.volume() / self.active.len() as f64;
        GridSummary {
            depth: self.depth,
            resolution: self.resolution,
            box_count: self.active.len(),
            active_count: active,
            covered_volume: box_volume * active as f64,
        }
    }

    pub(crate) fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| a.then_some(i))
    }

    fn flat_index(&self, position: &[usize]) -> usize {
        self.check_position(position);
        position_to_flat_index(position, self.resolution)
    }

    fn check_position(&self, position: &[usize]) {
        assert_eq!(
            position.len(),
            self.dimension(),
            "position has {} coordinates, grid has {} dimensions",
            position.len(),
            self.dimension()
        );
        assert!(
            position.iter().all(|&p| p < self.resolution),
            "position {position:?} out of range for resolution {}",
            self.resolution
        );
    }
}

/// Flat index of the box containing `point` in a `resolution`-per-axis
/// partition of `domain`, without needing the grid itself.
pub(crate) fn locate_flat_index(domain: &Domain, resolution: usize, point: &[f64]) -> Option<usize> {
    if point.len() != domain.dimension() {
        return None;
    }
    let mut index = 0;
    for (iv, &x) in domain.intervals().iter().zip(point).rev() {
        index = index * resolution + axis_index(iv, x, resolution)?;
    }
    Some(index)
}

/// Box index along one axis, per [`BoxGrid::locate_position`].
fn axis_index(iv: &Interval, x: f64, resolution: usize) -> Option<usize> {
    if !iv.contains(x) {
        return None;
    }
    let raw = ((x - iv.min) / iv.width() * resolution as f64).floor();
    if raw < 0.0 {
        return None;
    }
    let index = raw as usize;
    if index < resolution {
        Some(index)
    } else if index == resolution {
        Some(resolution - 1)
    } else {
        None
    }
}

/// One active box as handed to a renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActiveBox {
    pub index: usize,
    pub position: Position,
    pub borders: Vec<Interval>,
}

/// Read-only traversal over the active boxes of a grid.
pub struct ActiveBoxes<'a> {
    grid: &'a BoxGrid,
    next: usize,
}

impl Iterator for ActiveBoxes<'_> {
    type Item = ActiveBox;

    fn next(&mut self) -> Option<Self::Item> {
        let grid = self.grid;
        let offset = grid.active[self.next..].iter().position(|&a| a)?;
        let index = self.next + offset;
        self.next = index + 1;
        let position = flat_index_to_position(index, grid.resolution, grid.dimension());
        let borders = position_to_box_borders(&position, &grid.domain, grid.resolution);
        Some(ActiveBox {
            index,
            position,
            borders,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.grid.active.len() - self.next))
    }
}

/// Operational snapshot of a grid for logs and reports.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GridSummary {
    pub depth: u32,
    pub resolution: usize,
    pub box_count: usize,
    pub active_count: usize,
    pub covered_volume: f64,
}
