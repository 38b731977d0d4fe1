//! Flat index ⇄ multi-index ⇄ box borders.
//!
//! Positions are encoded mixed-radix with axis 0 least significant:
//! `flat = p0 + R * (p1 + R * (p2 + ...))`. The same convention orders the
//! test-point lattice inside a box.

use crate::domain::{Domain, Interval};
use crate::error::{Result, SubdivisionError};

/// One integer coordinate per axis, each in `[0, resolution)`.
pub type Position = Vec<usize>;

/// Boxes per axis at `depth`, or `None` if `2^depth` overflows.
pub fn resolution_for_depth(depth: u32) -> Option<usize> {
    1usize.checked_shl(depth).filter(|&r| r != 0)
}

/// `resolution^dimension`, or `None` on overflow.
pub fn box_count(resolution: usize, dimension: usize) -> Option<usize> {
    let exp = u32::try_from(dimension).ok()?;
    resolution.checked_pow(exp)
}

/// Resolution and box count for a grid, as a configuration error on overflow.
pub(crate) fn grid_shape(depth: u32, dimension: usize) -> Result<(usize, usize)> {
    resolution_for_depth(depth)
        .and_then(|r| box_count(r, dimension).map(|n| (r, n)))
        .ok_or(SubdivisionError::GridTooLarge { depth, dimension })
}

/// Encode `position`. Every coordinate must be below `resolution`.
pub fn position_to_flat_index(position: &[usize], resolution: usize) -> usize {
    position
        .iter()
        .rev()
        .fold(0, |acc, &p| acc * resolution + p)
}

/// Inverse of [`position_to_flat_index`].
pub fn flat_index_to_position(index: usize, resolution: usize, dimension: usize) -> Position {
    let mut position = vec![0; dimension];
    write_position(index, resolution, &mut position);
    position
}

/// Decode into an existing buffer; its length is the dimension.
pub(crate) fn write_position(mut index: usize, resolution: usize, out: &mut [usize]) {
    for p in out.iter_mut() {
        *p = index % resolution;
        index /= resolution;
    }
}

/// Real-valued borders of the box at `position`.
pub fn position_to_box_borders(
    position: &[usize],
    domain: &Domain,
    resolution: usize,
) -> Vec<Interval> {
    let r = resolution as f64;
    domain
        .intervals()
        .iter()
        .zip(position)
        .map(|(iv, &p)| {
            let w = iv.width();
            Interval::new(iv.min + w * (p as f64 / r), iv.min + w * ((p + 1) as f64 / r))
        })
        .collect()
}
