use crate::domain::Interval;

/// Lazy lattice of `n^dimension` test points strictly inside a box.
///
/// Coordinate `i` of lattice point `q` is
/// `low_i + (high_i - low_i) * (q_i + 1) / (n + 1)`, so no sample ever lies on
/// a face shared with a neighbouring box. Points come out in mixed-radix
/// order with axis 0 varying fastest.
pub struct InteriorPoints<'a> {
    borders: &'a [Interval],
    samples_per_dimension: usize,
    lattice: Vec<usize>,
    remaining: usize,
}

impl<'a> InteriorPoints<'a> {
    pub fn new(borders: &'a [Interval], samples_per_dimension: usize) -> Self {
        let remaining = if samples_per_dimension == 0 {
            0
        } else {
            u32::try_from(borders.len())
                .ok()
                .and_then(|d| samples_per_dimension.checked_pow(d))
                .unwrap_or(usize::MAX)
        };
        Self {
            borders,
            samples_per_dimension,
            lattice: vec![0; borders.len()],
            remaining,
        }
    }

    fn advance(&mut self) {
        for q in self.lattice.iter_mut() {
            *q += 1;
            if *q < self.samples_per_dimension {
                return;
            }
            *q = 0;
        }
    }
}

impl Iterator for InteriorPoints<'_> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let denom = (self.samples_per_dimension + 1) as f64;
        let point = self
            .borders
            .iter()
            .zip(&self.lattice)
            .map(|(iv, &q)| iv.min + iv.width() * ((q + 1) as f64 / denom))
            .collect();
        self.remaining -= 1;
        self.advance();
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for InteriorPoints<'_> {}

/// Collect the full interior lattice of a box.
pub fn sample_interior_points(borders: &[Interval], samples_per_dimension: usize) -> Vec<Vec<f64>> {
    InteriorPoints::new(borders, samples_per_dimension).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_dimensional_default_lattice() {
        let points = sample_interior_points(&[Interval::new(0.0, 0.6)], 5);
        let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
        let expected = [0.1, 0.2, 0.3, 0.4, 0.5];
        for (x, e) in xs.iter().zip(expected) {
            approx::assert_abs_diff_eq!(*x, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_axis_zero_varies_fastest() {
        let borders = [Interval::new(0.0, 3.0), Interval::new(0.0, 3.0)];
        let points = sample_interior_points(&borders, 2);
        assert_eq!(points.len(), 4);
        approx::assert_abs_diff_eq!(points[0][0], 1.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(points[1][0], 2.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(points[1][1], 1.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(points[2][1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_sample_is_box_center() {
        let borders = [Interval::new(-1.0, 1.0), Interval::new(2.0, 4.0)];
        let points = sample_interior_points(&borders, 1);
        assert_eq!(points, vec![vec![0.0, 3.0]]);
    }

    #[test]
    fn test_zero_samples_yields_nothing() {
        assert!(sample_interior_points(&[Interval::new(0.0, 1.0)], 0).is_empty());
    }

    #[test]
    fn test_exact_size() {
        let borders = [Interval::new(0.0, 1.0); 3];
        let iter = InteriorPoints::new(&borders, 5);
        assert_eq!(iter.len(), 125);
        assert_eq!(iter.count(), 125);
    }

    fn borders_strategy() -> impl Strategy<Value = Vec<Interval>> {
        prop::collection::vec((-100.0f64..100.0, 1e-3f64..100.0), 1..4)
            .prop_map(|axes| axes.into_iter().map(|(lo, w)| Interval::new(lo, lo + w)).collect())
    }

    proptest! {
        #[test]
        fn prop_count_interior_and_distinct(borders in borders_strategy(), n in 1usize..7) {
            let points = sample_interior_points(&borders, n);
            prop_assert_eq!(points.len(), n.pow(borders.len() as u32));
            for p in &points {
                for (x, iv) in p.iter().zip(&borders) {
                    prop_assert!(*x > iv.min && *x < iv.max, "{x} not inside {iv:?}");
                }
            }
            for (i, a) in points.iter().enumerate() {
                for b in &points[i + 1..] {
                    prop_assert_ne!(a, b);
                }
            }
        }
    }
}
