use std::fmt;

use crate::math::interp;

/// A membership function over the real line.
///
/// Values are not clamped: combinators report whatever their operands produce.
#[derive(Clone, Debug, PartialEq)]
pub enum Membership {
    Constant(f64),
    /// 0 below `x1`, ramps up to 1 at `x2`, 1 above.
    Linear(f64, f64),
    Triangular(f64, f64, f64),
    Trapezoid(f64, f64, f64, f64),
    Inverted(Box<Membership>),
    /// Pointwise minimum, the t-norm.
    Min(Vec<Membership>),
    /// Pointwise maximum, the t-conorm.
    Max(Vec<Membership>),
}

impl Membership {
    pub fn constant(y: f64) -> Self {
        Membership::Constant(y)
    }

    pub fn linear(x1: f64, x2: f64) -> Self {
        Membership::Linear(x1, x2)
    }

    /// 0 below `x`, 1 at and above.
    pub fn step(x: f64) -> Self {
        Membership::Linear(x, x)
    }

    pub fn triangular(x1: f64, x2: f64, x3: f64) -> Self {
        Membership::Triangular(x1, x2, x3)
    }

    pub fn trapezoid(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        Membership::Trapezoid(x1, x2, x3, x4)
    }

    pub fn inverted(self) -> Self {
        Membership::Inverted(Box::new(self))
    }

    pub fn min(memberships: impl IntoIterator<Item = Membership>) -> Self {
        Membership::Min(memberships.into_iter().collect())
    }

    pub fn max(memberships: impl IntoIterator<Item = Membership>) -> Self {
        Membership::Max(memberships.into_iter().collect())
    }

    /// Caps this membership at `degree`.
    pub fn clip(self, degree: f64) -> Self {
        Membership::Min(vec![Membership::Constant(degree), self])
    }

    pub fn value(&self, x: f64) -> f64 {
        match self {
            Membership::Constant(y) => *y,
            Membership::Linear(x1, x2) => interp(x, &[(*x1, 0.), (*x2, 1.)]),
            Membership::Triangular(x1, x2, x3) => {
                if x <= *x1 || x >= *x3 {
                    // Peak still wins when the triangle collapses onto one of its feet
                    return if x == *x2 { 1. } else { 0. };
                }

                interp(x, &[(*x1, 0.), (*x2, 1.), (*x3, 0.)])
            },
            Membership::Trapezoid(x1, x2, x3, x4) => {
                if *x2 <= x && x <= *x3 {
                    return 1.;
                }
                if x <= *x1 || x >= *x4 {
                    return 0.;
                }

                interp(x, &[(*x1, 0.), (*x2, 1.), (*x3, 1.), (*x4, 0.)])
            },
            Membership::Inverted(m) => 1. - m.value(x),
            Membership::Min(ms) => ms.iter().fold(f64::INFINITY, |acc, m| acc.min(m.value(x))),
            Membership::Max(ms) => ms.iter().fold(f64::NEG_INFINITY, |acc, m| acc.max(m.value(x))),
        }
    }

    /// The finite range this membership is defined over, as `(min, max)`.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Membership::Constant(y) => (*y, *y),
            Membership::Linear(x1, x2) => (x1.min(*x2), x1.max(*x2)),
            Membership::Triangular(x1, _, x3) => (*x1, *x3),
            Membership::Trapezoid(x1, _, _, x4) => (*x1, *x4),
            Membership::Inverted(m) => m.domain(),
            Membership::Min(ms) | Membership::Max(ms) => union_domain(ms),
        }
    }
}

pub(crate) fn union_domain<'m>(memberships: impl IntoIterator<Item = &'m Membership>) -> (f64, f64) {
    memberships
        .into_iter()
        .map(Membership::domain)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), (lo, hi)| {
            (min.min(lo), max.max(hi))
        })
}

/// Renders the DSL function syntax. `Constant`, `Min` and `Max` have no DSL keyword and are
/// printed for diagnostics only.
impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, ms: &[Membership]) -> fmt::Result {
            write!(f, "{name}(")?;
            for (i, m) in ms.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{m}")?;
            }
            f.write_str(")")
        }

        match self {
            Membership::Constant(y) => write!(f, "CONSTANT({y:?})"),
            Membership::Linear(x1, x2) => write!(f, "LINEAR({x1:?}, {x2:?})"),
            Membership::Triangular(x1, x2, x3) => write!(f, "TRIANGULAR({x1:?}, {x2:?}, {x3:?})"),
            Membership::Trapezoid(x1, x2, x3, x4) => write!(f, "TRAPEZOID({x1:?}, {x2:?}, {x3:?}, {x4:?})"),
            Membership::Inverted(m) => write!(f, "INVERTED({m})"),
            Membership::Min(ms) => list(f, "MIN", ms),
            Membership::Max(ms) => list(f, "MAX", ms),
        }
    }
}

#[test]
fn test_linear() {
    let m = Membership::linear(20., 30.);

    assert_eq!(m.value(20.), 0.);
    assert_eq!(m.value(30.), 1.);
    assert_eq!(m.value(25.), 0.5);
    assert_eq!(m.value(-5.), 0.);
    assert_eq!(m.value(45.), 1.);
    assert_eq!(m.domain(), (20., 30.));
}

#[test]
fn test_step() {
    let m = Membership::step(10.);

    assert_eq!(m.value(9.999), 0.);
    assert_eq!(m.value(10.), 1.);
    assert_eq!(m.value(11.), 1.);
    assert_eq!(m.domain(), (10., 10.));
}

#[test]
fn test_linear_reversed_bounds() {
    // Reversed bounds act as a step at x1; the domain is still reported low to high
    let m = Membership::linear(1000., 900.);

    assert_eq!(m.value(100.), 0.);
    assert_eq!(m.value(950.), 0.);
    assert_eq!(m.value(1000.), 1.);
    assert_eq!(m.domain(), (900., 1000.));
}

#[test]
fn test_triangular() {
    let m = Membership::triangular(-50., 0., 50.);

    assert_eq!(m.value(-50.), 0.);
    assert_eq!(m.value(0.), 1.);
    assert_eq!(m.value(50.), 0.);
    assert_eq!(m.value(-25.), 0.5);
    assert_eq!(m.value(25.), 0.5);
    assert_eq!(m.value(-80.), 0.);
    assert_eq!(m.value(80.), 0.);
    assert_eq!(m.domain(), (-50., 50.));

    let samples: Vec<f64> = (0..=20).map(|i| m.value(-50. + 5. * f64::from(i))).collect();

    assert!(samples[..=10].windows(2).all(|w| w[0] <= w[1]));
    assert!(samples[10..].windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_triangular_degenerate() {
    let right_angle = Membership::triangular(0., 10., 10.);

    assert_eq!(right_angle.value(10.), 1.);
    assert_eq!(right_angle.value(5.), 0.5);
    assert_eq!(right_angle.value(10.5), 0.);
}

#[test]
fn test_trapezoid() {
    let m = Membership::trapezoid(5., 18., 22., 25.);

    assert_eq!(m.value(5.), 0.);
    assert_eq!(m.value(18.), 1.);
    assert_eq!(m.value(20.), 1.);
    assert_eq!(m.value(22.), 1.);
    assert_eq!(m.value(25.), 0.);
    assert_eq!(m.value(23.5), 0.5);
    assert_eq!(m.value(30.), 0.);
    assert_eq!(m.domain(), (5., 25.));

    let shoulders = Membership::trapezoid(0., 0., 10., 10.);

    assert_eq!(shoulders.value(0.), 1.);
    assert_eq!(shoulders.value(10.), 1.);
    assert_eq!(shoulders.value(-0.1), 0.);
    assert_eq!(shoulders.value(10.1), 0.);
}

#[test]
fn test_trapezoid_collapses_to_triangle() {
    let trapezoid = Membership::trapezoid(-5., 3., 3., 11.);
    let triangle = Membership::triangular(-5., 3., 11.);

    for x in [-5., 3., 11., -1., 7., 20.] {
        assert_eq!(trapezoid.value(x), triangle.value(x), "at x = {x}");
    }
}

#[test]
fn test_inverted() {
    let m = Membership::linear(-10., 10.);
    let inv = m.clone().inverted();

    for x in [-20., -10., -3.3, 0., 7., 10., 15.] {
        assert_eq!(inv.value(x), 1. - m.value(x));
    }
    assert_eq!(inv.domain(), m.domain());
}

#[test]
fn test_min_max() {
    let a = Membership::linear(0., 10.);
    let b = Membership::triangular(5., 10., 20.);
    let min = Membership::min([a.clone(), b.clone()]);
    let max = Membership::max([a, b]);

    assert_eq!(min.value(7.5), 0.5);
    assert_eq!(max.value(7.5), 0.75);
    assert_eq!(min.value(15.), 0.5);
    assert_eq!(max.value(15.), 1.);
    assert_eq!(min.domain(), (0., 20.));
    assert_eq!(max.domain(), (0., 20.));
}

#[test]
fn test_clip() {
    let clipped = Membership::linear(0., 100.).clip(0.25);

    assert_eq!(clipped.value(10.), 0.1);
    assert_eq!(clipped.value(90.), 0.25);
    assert_eq!(clipped.domain(), (0., 100.));
}

#[test]
fn test_constant() {
    let c = Membership::constant(0.3);

    assert_eq!(c.value(-1e9), 0.3);
    assert_eq!(c.domain(), (0.3, 0.3));
}

#[test]
fn test_display() {
    let m = Membership::linear(0., 10.5).inverted();

    assert_eq!(m.to_string(), "INVERTED(LINEAR(0.0, 10.5))");
    assert_eq!(
        Membership::trapezoid(5., 18., 22., 25.).to_string(),
        "TRAPEZOID(5.0, 18.0, 22.0, 25.0)"
    );
}
