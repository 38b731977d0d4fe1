use std::fmt;

/// Failure reported by a [`DynamicalSystem`](crate::DynamicalSystem) while
/// evaluating its map. Always fatal for the run that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapError {
    message: String,
}

impl MapError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MapError {}

#[derive(Debug)]
pub enum SubdivisionError {
    EmptyDomain,
    InvalidInterval { axis: usize, min: f64, max: f64 },
    DimensionMismatch { expected: usize, found: usize },
    TargetBelowSeed { target: u32, seed: u32 },
    GridTooLarge { depth: u32, dimension: usize },
    ZeroSamples,
    Map(MapError),
    ImageDimension { expected: usize, found: usize },
    Cancelled,
}

impl fmt::Display for SubdivisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubdivisionError::EmptyDomain => write!(f, "domain must have at least one dimension"),
            SubdivisionError::InvalidInterval { axis, min, max } => {
                write!(f, "invalid interval on axis {axis}: [{min}, {max}]")
            }
            SubdivisionError::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            SubdivisionError::TargetBelowSeed { target, seed } => {
                write!(f, "target depth {target} is below seed depth {seed}")
            }
            SubdivisionError::GridTooLarge { depth, dimension } => {
                write!(f, "grid at depth {depth} in {dimension} dimensions is too large")
            }
            SubdivisionError::ZeroSamples => write!(f, "samples per dimension must be at least 1"),
            SubdivisionError::Map(e) => write!(f, "map evaluation failed: {e}"),
            SubdivisionError::ImageDimension { expected, found } => {
                write!(f, "map returned {found} coordinates, expected {expected}")
            }
            SubdivisionError::Cancelled => write!(f, "subdivision cancelled"),
        }
    }
}

impl std::error::Error for SubdivisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubdivisionError::Map(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapError> for SubdivisionError {
    fn from(e: MapError) -> Self {
        SubdivisionError::Map(e)
    }
}

pub type Result<T> = std::result::Result<T, SubdivisionError>;
