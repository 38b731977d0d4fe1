/// Depth of the fully active grid a run starts from (8 boxes per axis).
pub const SEED_DEPTH: u32 = 3;

/// Test points per axis sampled inside each active box.
pub const DEFAULT_SAMPLES_PER_DIMENSION: usize = 5;
