use std::collections::BTreeMap;

use crate::membership::Membership;

/// The accumulated conclusion for one term of an output variable.
#[derive(Clone, Debug, PartialEq)]
pub struct TermOutput {
    term: String,
    truth_degree: f64,
    membership: Membership,
}

impl TermOutput {
    pub fn new(term: impl Into<String>, truth_degree: f64, membership: Membership) -> Self {
        Self {
            term: term.into(),
            truth_degree,
            membership,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Highest degree among the rules concluding this term.
    pub fn truth_degree(&self) -> f64 {
        self.truth_degree
    }

    /// Union of every firing rule's clipped membership.
    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Folds another firing of the same term in: memberships by max, degrees by max.
    pub(crate) fn merge(&mut self, truth_degree: f64, clipped: Membership) {
        let previous = std::mem::replace(&mut self.membership, Membership::Constant(0.));

        self.membership = Membership::Max(vec![previous, clipped]);
        self.truth_degree = self.truth_degree.max(truth_degree);
    }
}

/// Inference results, by variable name then term name.
///
/// Both levels are ordered by name, which makes [`Outputs::best`] break ties on the
/// lexicographically smallest term.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outputs(pub(crate) BTreeMap<String, BTreeMap<String, TermOutput>>);

impl Outputs {
    pub fn new() -> Self {
        Outputs(BTreeMap::new())
    }

    /// Term outputs of a variable, `None` when no rule concluded it.
    pub fn get(&self, variable: &str) -> Option<&BTreeMap<String, TermOutput>> {
        self.0.get(variable)
    }

    pub fn term(&self, variable: &str, term: &str) -> Option<&TermOutput> {
        self.0.get(variable)?.get(term)
    }

    /// The term with the highest truth degree, or `None` when nothing fired for the variable.
    pub fn best(&self, variable: &str) -> Option<&TermOutput> {
        let best = self.0.get(variable)?.values().fold(None::<&TermOutput>, |best, out| match best {
            Some(best) if out.truth_degree <= best.truth_degree => Some(best),
            _ => Some(out),
        })?;

        if best.truth_degree == 0. {
            return None;
        }

        Some(best)
    }

    /// Variable names in sorted order.
    pub fn variables(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, TermOutput>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
fn outputs(entries: &[(&str, &str, f64)]) -> Outputs {
    let mut outputs = Outputs::new();

    for (var, term, degree) in entries {
        outputs
            .0
            .entry((*var).to_owned())
            .or_default()
            .insert((*term).to_owned(), TermOutput::new(*term, *degree, Membership::constant(*degree)));
    }

    outputs
}

#[test]
fn test_best() {
    let out = outputs(&[
        ("ac_mode", "heating", 0.2),
        ("ac_mode", "off", 0.7),
        ("ac_mode", "cooling", 0.4),
    ]);
    let best = out.best("ac_mode").expect("a term fired");

    assert_eq!(best.term(), "off");
    assert_eq!(best.truth_degree(), 0.7);
    assert!(out.best("fan").is_none());
}

#[test]
fn test_best_tie_breaks_by_name() {
    let out = outputs(&[("ac_mode", "off", 0.5), ("ac_mode", "cooling", 0.5), ("ac_mode", "heating", 0.5)]);

    assert_eq!(out.best("ac_mode").map(TermOutput::term), Some("cooling"));
}

#[test]
fn test_best_nothing_fired() {
    let out = outputs(&[("ac_mode", "heating", 0.), ("ac_mode", "off", 0.)]);

    assert!(out.best("ac_mode").is_none());
}

#[test]
fn test_variables_sorted() {
    let out = outputs(&[("valve", "open", 1.), ("ac_mode", "off", 1.), ("fan", "fast", 0.3)]);

    assert_eq!(out.variables(), ["ac_mode", "fan", "valve"]);
    assert_eq!(out.term("fan", "fast").map(TermOutput::truth_degree), Some(0.3));
}

#[test]
fn test_get_unconcluded_variable() {
    let out = outputs(&[("ac_mode", "off", 0.), ("ac_mode", "heating", 0.4)]);

    assert!(out.get("fan").is_none());
    assert_eq!(out.get("ac_mode").map(BTreeMap::len), Some(2));
}

#[test]
fn test_merge() {
    let mut out = TermOutput::new("heating", 0.3, Membership::linear(0., 100.).clip(0.3));

    out.merge(0.6, Membership::linear(0., 100.).clip(0.6));
    assert_eq!(out.truth_degree(), 0.6);
    assert_eq!(out.membership().value(100.), 0.6);
    assert_eq!(out.membership().value(20.), 0.2);

    out.merge(0.1, Membership::linear(0., 100.).clip(0.1));
    assert_eq!(out.truth_degree(), 0.6);
}
