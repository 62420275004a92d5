use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::linspace::Linspace;
use crate::math::{is_sampleable, midpoint};
use crate::membership::Membership;

/// Membership values within this distance of the maximum count as maximal.
const MAX_EPSILON: f64 = 1e-9;

/// Converts an aggregated membership over `[min, max]` into one crisp value.
pub trait Defuzzifier {
    fn defuzzify(&self, membership: &Membership, min: f64, max: f64) -> f64;
}

impl<F> Defuzzifier for F
where
    F: Fn(&Membership, f64, f64) -> f64,
{
    fn defuzzify(&self, membership: &Membership, min: f64, max: f64) -> f64 {
        self(membership, min, max)
    }
}

/// Method for defuzzificating the resulting membership function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum DefuzzificationOp {
    /// Center of gravity, integrated with `steps` samples
    Centroid {
        #[serde(default = "default_steps")]
        steps: usize,
    },
    /// Mean of the sampled values for which the membership function is maximum
    #[serde(rename = "mean-max", alias = "mean-of-maximum")]
    MeanOfMaximum {
        #[serde(default = "default_steps")]
        steps: usize,
    },
}

pub(crate) fn default_steps() -> usize {
    100
}

impl DefuzzificationOp {
    pub fn centroid(steps: usize) -> Self {
        Self::Centroid { steps }
    }

    pub fn mean_of_maximum(steps: usize) -> Self {
        Self::MeanOfMaximum { steps }
    }

    pub fn call(self, membership: &Membership, min: f64, max: f64) -> f64 {
        match self {
            Self::Centroid { steps } => centroid(membership, min, max, steps),
            Self::MeanOfMaximum { steps } => mean_of_maximum(membership, min, max, steps),
        }
    }
}

impl Default for DefuzzificationOp {
    fn default() -> Self {
        Self::Centroid { steps: 1000 }
    }
}

impl Defuzzifier for DefuzzificationOp {
    fn defuzzify(&self, membership: &Membership, min: f64, max: f64) -> f64 {
        self.call(membership, min, max)
    }
}

fn samples(min: f64, max: f64, steps: usize) -> Linspace<f64> {
    let steps = steps.max(1) as f64;
    let step = f64::max(1. / steps, (max - min) / steps);

    Linspace::with_step(min, max, step)
}

fn centroid(membership: &Membership, min: f64, max: f64, steps: usize) -> f64 {
    if !is_sampleable(min, max) {
        return midpoint(min, max);
    }

    let (num, den) = samples(min, max, steps).fold((0., 0.), |(num, den), x| {
        let y = membership.value(x);
        (num + y * x, den + y)
    });

    if den == 0. {
        return midpoint(min, max);
    }

    num / den
}

fn mean_of_maximum(membership: &Membership, min: f64, max: f64, steps: usize) -> f64 {
    if !is_sampleable(min, max) {
        return midpoint(min, max);
    }

    let maximum = samples(min, max, steps)
        .map(|x| membership.value(x))
        .fold(0., f64::max);

    if maximum == 0. {
        return midpoint(min, max);
    }

    let (len, sum) = samples(min, max, steps)
        .filter(|x| (membership.value(*x) - maximum).abs() < MAX_EPSILON)
        .fold((0usize, 0.), |(len, sum), x| (len + 1, sum + x));

    if len == 0 {
        return midpoint(min, max);
    }

    sum / len as f64
}

impl fmt::Display for DefuzzificationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centroid { steps } => write!(f, "centroid:{steps}"),
            Self::MeanOfMaximum { steps } => write!(f, "mean-max:{steps}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid defuzzification '{0}', expected centroid[:steps] or mean-max[:steps]")]
pub struct InvalidDefuzzification(String);

/// Parses `centroid`, `mean-max`, optionally suffixed with `:steps`.
impl FromStr for DefuzzificationOp {
    type Err = InvalidDefuzzification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDefuzzification(s.to_owned());
        let (method, steps) = match s.split_once(':') {
            Some((method, steps)) => (method, steps.trim().parse().map_err(|_| invalid())?),
            None => (s, default_steps()),
        };

        match method.trim().to_ascii_lowercase().as_str() {
            "centroid" => Ok(Self::Centroid { steps }),
            "mean-max" | "mean-of-maximum" => Ok(Self::MeanOfMaximum { steps }),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
fn cooling() -> Membership {
    Membership::linear(-100., 0.).inverted()
}

#[test]
fn test_centroid_cooling_ramp() {
    let value = DefuzzificationOp::centroid(100).call(&cooling(), -100., 100.);

    approx::assert_abs_diff_eq!(value, -67.333, epsilon = 1e-3);
    assert_eq!(format!("{value:.2}"), "-67.33");
}

#[test]
fn test_centroid_symmetric() {
    let value = DefuzzificationOp::centroid(1000).call(&Membership::triangular(-50., 0., 50.), -100., 100.);

    approx::assert_abs_diff_eq!(value, 0., epsilon = 1e-6);
}

#[test]
fn test_centroid_fallbacks() {
    let op = DefuzzificationOp::centroid(100);

    assert_eq!(op.call(&Membership::constant(0.), -10., 30.), 10.);
    assert_eq!(op.call(&Membership::constant(1.), 5., 5.), 5.);
    assert_eq!(op.call(&Membership::constant(1.), f64::NEG_INFINITY, 3.), f64::NEG_INFINITY);
    assert_eq!(op.call(&Membership::constant(1.), 8., 2.), 5.);
}

#[test]
fn test_mean_of_maximum() {
    let op = DefuzzificationOp::mean_of_maximum(100);
    // Plateau on [18, 22]
    let value = op.call(&Membership::trapezoid(5., 18., 22., 25.), 0., 40.);

    approx::assert_abs_diff_eq!(value, 20., epsilon = 1e-9);

    let peak = op.call(&Membership::triangular(-50., 0., 50.), -100., 100.);

    approx::assert_abs_diff_eq!(peak, 0., epsilon = 1e-9);
}

#[test]
fn test_mean_of_maximum_fallbacks() {
    let op = DefuzzificationOp::mean_of_maximum(100);

    assert_eq!(op.call(&Membership::constant(0.), 0., 100.), 50.);
    assert_eq!(op.call(&Membership::constant(1.), 3., 3.), 3.);
}

#[test]
fn test_closure_defuzzifier() {
    let lower_bound = |_: &Membership, min: f64, _: f64| min;

    assert_eq!(lower_bound.defuzzify(&cooling(), -100., 100.), -100.);
}

#[test]
fn test_from_str() {
    assert_eq!("centroid".parse::<DefuzzificationOp>().ok(), Some(DefuzzificationOp::centroid(100)));
    assert_eq!(
        "mean-max:250".parse::<DefuzzificationOp>().ok(),
        Some(DefuzzificationOp::mean_of_maximum(250))
    );
    assert_eq!("Centroid:10".parse::<DefuzzificationOp>().ok(), Some(DefuzzificationOp::centroid(10)));
    assert!("bisector".parse::<DefuzzificationOp>().is_err());
    assert!("centroid:many".parse::<DefuzzificationOp>().is_err());
    assert_eq!(DefuzzificationOp::mean_of_maximum(7).to_string(), "mean-max:7");
}
