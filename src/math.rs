use num::Float;

/// Similar to numpy.interp, evaluated at a single point.
///
/// Coordinates are visited in the order given. A zero-width segment yields its right-hand value.
pub(crate) fn interp<F: Float>(x: F, coords: &[(F, F)]) -> F {
    let Some(&(first_x, first_y)) = coords.first() else {
        return F::zero();
    };

    // Base case
    if x < first_x {
        return first_y;
    }

    for window in coords.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];

        if x1 <= x && x <= x2 {
            if x1 == x2 {
                return y2;
            }

            return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
        }
    }

    coords.last().map_or(first_y, |&(_, y)| y)
}

pub(crate) fn midpoint<F: Float>(min: F, max: F) -> F {
    (min + max) / (F::one() + F::one())
}

/// A universe can only be sampled when both ends are finite and it has a non-zero width.
pub(crate) fn is_sampleable<F: Float>(min: F, max: F) -> bool {
    min.is_finite() && max.is_finite() && min < max
}

#[test]
fn test_interp() {
    let xs = [(1., 3.), (2., 2.), (3., 0.)];
    let got: Vec<f64> = [0., 1., 1.5, 2.72, 3.24].iter().map(|x| interp(*x, &xs)).collect();

    assert_eq!(got, vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let xs = [(0., 0.), (1., 2.), (2., 5.), (3., 3.), (4.5, 2.)];
    let got: Vec<f64> = [2.5, -1., 7.5].iter().map(|x| interp(*x, &xs)).collect();

    assert_eq!(got, vec![4., 0., 2.]);
}

#[test]
fn test_interp_zero_width_segment() {
    // A vertical edge jumps straight to the upper value
    let step = [(5., 0.), (5., 1.)];

    assert_eq!(interp(4.9, &step), 0.);
    assert_eq!(interp(5., &step), 1.);
    assert_eq!(interp(7., &step), 1.);
}

#[test]
fn test_universe_helpers() {
    assert_eq!(midpoint(-100., 100.), 0.);
    assert_eq!(midpoint(2., 4.), 3.);
    assert!(is_sampleable(0., 1.));
    assert!(!is_sampleable(1., 1.));
    assert!(!is_sampleable(f64::NEG_INFINITY, 1.));
    assert!(!is_sampleable(0., f64::INFINITY));
}
