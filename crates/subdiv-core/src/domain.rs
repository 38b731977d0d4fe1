use serde::{Deserialize, Serialize};

use crate::error::{Result, SubdivisionError};

/// Closed real interval `[min, max]`.
///
/// Used both for the axes of a [`Domain`] and for the borders of a single box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Closed containment. NaN is never contained.
    pub fn contains(&self, x: f64) -> bool {
        x.is_finite() && x >= self.min && x <= self.max
    }
}

/// The fixed bounding hyper-rectangle covered by a subdivision run.
///
/// Validated on construction: at least one axis, finite bounds,
/// `min < max` and a finite width on every axis. Grids share it read-only through an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Domain {
    intervals: Vec<Interval>,
}

impl Domain {
    pub fn new(intervals: Vec<Interval>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(SubdivisionError::EmptyDomain);
        }
        for (axis, iv) in intervals.iter().enumerate() {
            // `!(min < max)` also rejects NaN bounds. The width must be
            // representable too, or every box border degenerates.
            if !iv.min.is_finite()
                || !iv.max.is_finite()
                || !(iv.min < iv.max)
                || !iv.width().is_finite()
            {
                return Err(SubdivisionError::InvalidInterval {
                    axis,
                    min: iv.min,
                    max: iv.max,
                });
            }
        }
        Ok(Self { intervals })
    }

    /// `[min, max]^dimension`.
    pub fn cube(dimension: usize, min: f64, max: f64) -> Result<Self> {
        Self::new(vec![Interval::new(min, max); dimension])
    }

    pub fn dimension(&self) -> usize {
        self.intervals.len()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn volume(&self) -> f64 {
        self.intervals.iter().map(Interval::width).product()
    }

    /// True if `point` has one finite coordinate per axis, each inside the
    /// closed axis interval.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dimension()
            && self
                .intervals
                .iter()
                .zip(point)
                .all(|(iv, &x)| iv.contains(x))
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            intervals: Vec<Interval>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Domain::new(raw.intervals).map_err(serde::de::Error::custom)
    }
}
