use crate::error::MapError;

/// The dynamical system whose invariant set is being covered.
///
/// `map_point` applies the forward map once. Images with non-finite or
/// out-of-domain coordinates are fine and are simply discarded by the
/// engine; returning `Err` aborts the whole run.
pub trait DynamicalSystem: Sync {
    fn dimension(&self) -> usize;

    fn map_point(&self, point: &[f64]) -> Result<Vec<f64>, MapError>;
}

impl<S: DynamicalSystem + ?Sized> DynamicalSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn map_point(&self, point: &[f64]) -> Result<Vec<f64>, MapError> {
        (**self).map_point(point)
    }
}

impl<S: DynamicalSystem + ?Sized> DynamicalSystem for Box<S> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn map_point(&self, point: &[f64]) -> Result<Vec<f64>, MapError> {
        (**self).map_point(point)
    }
}

/// Wraps an infallible closure as a [`DynamicalSystem`].
pub struct FnSystem<F> {
    dimension: usize,
    map: F,
}

impl<F> FnSystem<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    pub fn new(dimension: usize, map: F) -> Self {
        Self { dimension, map }
    }
}

impl<F> DynamicalSystem for FnSystem<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Sync,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn map_point(&self, point: &[f64]) -> Result<Vec<f64>, MapError> {
        Ok((self.map)(point))
    }
}
