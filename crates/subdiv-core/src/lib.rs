//! Dellnitz–Hohmann box subdivision.
//!
//! Covers an invariant set of a dynamical system (attractor, unstable
//! manifold) with the active boxes of a regular grid over a bounded domain.
//! Each step doubles the resolution and keeps only boxes hit by the images
//! of test points sampled inside the previously active boxes.
//!
//! Zero I/O. The dynamics are supplied by the caller through
//! [`DynamicalSystem`]; rendering consumes [`BoxGrid::active_boxes`].

pub mod constants;
pub mod domain;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grid;
pub mod indexing;
pub mod sampler;
pub mod system;

pub use constants::{DEFAULT_SAMPLES_PER_DIMENSION, SEED_DEPTH};
pub use domain::{Domain, Interval};
pub use driver::{SubdivisionDriver, SubdivisionObserver, TracingObserver, run_subdivision};
pub use engine::{CancelToken, StepReport, SubdivisionEngine, subdivide};
pub use error::{MapError, Result, SubdivisionError};
pub use grid::{ActiveBox, ActiveBoxes, Activeness, BoxGrid, GridSummary};
pub use indexing::{
    Position, box_count, flat_index_to_position, position_to_box_borders, position_to_flat_index,
    resolution_for_depth,
};
pub use sampler::{InteriorPoints, sample_interior_points};
pub use system::{DynamicalSystem, FnSystem};
