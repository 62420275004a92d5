use num::Float;

/// Evenly stepped samples over `[min, max]`, both ends included when `max` lies on the grid.
pub struct Linspace<F> {
    start: F,
    end: F,
    step: F,
    index: usize,
    len: usize,
}

impl<F: Float> Linspace<F> {
    pub fn with_step(min: F, max: F, step: F) -> Self {
        let len = if min.is_finite() && max.is_finite() && min <= max && step > F::zero() {
            // Absorb rounding so that e.g. 1.0 / 0.1 still reaches the upper end
            let tolerance = F::from(1e-9).unwrap_or_else(F::epsilon);
            ((max - min) / step + tolerance).floor().to_usize().map_or(0, |n| n + 1)
        } else {
            0
        };

        Linspace {
            start: min,
            end: max,
            step,
            index: 0,
            len,
        }
    }
}

impl<F: Float> Iterator for Linspace<F> {
    type Item = F;

    #[inline]
    fn next(&mut self) -> Option<F> {
        if self.index >= self.len {
            None
        } else {
            let i = self.index;
            self.index += 1;
            let offset = F::from(i).map_or(F::zero(), |i| self.step * i);

            Some(F::min(self.start + offset, self.end))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl<F: Float> ExactSizeIterator for Linspace<F> {}

#[test]
fn test_linspace_inclusive() {
    let xs: Vec<f64> = Linspace::with_step(-100., 100., 2.).collect();

    assert_eq!(xs.len(), 101);
    assert_eq!(xs[0], -100.);
    assert_eq!(xs[50], 0.);
    assert_eq!(xs[100], 100.);
}

#[test]
fn test_linspace_rounding() {
    let xs: Vec<f64> = Linspace::with_step(0., 1., 0.1).collect();

    assert_eq!(xs.len(), 11);
    assert!(xs.iter().all(|x| *x <= 1.));
}

#[test]
fn test_linspace_empty() {
    assert_eq!(Linspace::with_step(1., 0., 0.5).count(), 0);
    assert_eq!(Linspace::with_step(0., f64::INFINITY, 0.5).count(), 0);
    assert_eq!(Linspace::with_step(0., 1., 0.).count(), 0);
    assert_eq!(Linspace::with_step(3., 3., 1.).collect::<Vec<f64>>(), vec![3.]);
}
