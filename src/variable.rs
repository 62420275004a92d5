use std::collections::HashMap;
use std::fmt;

use slotmap::{new_key_type, SlotMap};

use crate::error::{FuzzyError, Result};
use crate::membership::Membership;

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// A named fuzzy set of a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    name: String,
    membership: Membership,
}

impl Term {
    pub fn new(name: impl Into<String>, membership: Membership) -> Self {
        Self {
            name: name.into(),
            membership,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn domain(&self) -> (f64, f64) {
        self.membership.domain()
    }
}

/// A linguistic variable. Its universe spans the union of its terms' domains.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    name: String,
    // Declaration order is kept for display
    terms: Vec<Term>,
    index: HashMap<String, usize>,
    universe_min: f64,
    universe_max: f64,
}

impl Variable {
    /// Fails with [`FuzzyError::TermAlreadyExists`] when two terms share a name.
    pub fn new(name: impl Into<String>, terms: impl IntoIterator<Item = Term>) -> Result<Self> {
        let name = name.into();
        let terms: Vec<Term> = terms.into_iter().collect();
        let mut index = HashMap::with_capacity(terms.len());
        let mut universe_min = f64::INFINITY;
        let mut universe_max = f64::NEG_INFINITY;

        for (i, term) in terms.iter().enumerate() {
            if index.insert(term.name.clone(), i).is_some() {
                return Err(FuzzyError::TermAlreadyExists {
                    variable: name,
                    term: term.name.clone(),
                });
            }

            let (min, max) = term.domain();
            universe_min = universe_min.min(min);
            universe_max = universe_max.max(max);
        }

        Ok(Self {
            name,
            terms,
            index,
            universe_min,
            universe_max,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn term(&self, name: &str) -> Result<&Term> {
        self.index
            .get(name)
            .map(|&i| &self.terms[i])
            .ok_or_else(|| FuzzyError::UndefinedTerm {
                variable: self.name.clone(),
                term: name.to_owned(),
            })
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    pub fn universe_min(&self) -> f64 {
        self.universe_min
    }

    pub fn universe_max(&self) -> f64 {
        self.universe_max
    }

    pub fn universe(&self) -> (f64, f64) {
        (self.universe_min, self.universe_max)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DEFINE {} (", self.name)?;
        for (i, term) in self.terms.iter().enumerate() {
            let sep = if i + 1 < self.terms.len() { "," } else { "" };
            write!(f, "\n    TERM {} {}{sep}", term.name, term.membership)?;
        }
        if !self.terms.is_empty() {
            f.write_str("\n")?;
        }
        f.write_str(");")
    }
}

/// Variable catalog with unique names, iterated in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Variables {
    slots: SlotMap<VariableKey, Variable>,
    order: Vec<VariableKey>,
    by_name: HashMap<String, VariableKey>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`FuzzyError::VariableAlreadyExists`] when the name is taken.
    pub fn add(&mut self, variable: Variable) -> Result<VariableKey> {
        if self.by_name.contains_key(variable.name()) {
            return Err(FuzzyError::VariableAlreadyExists {
                name: variable.name().to_owned(),
            });
        }

        let name = variable.name().to_owned();
        let key = self.slots.insert(variable);

        self.order.push(key);
        self.by_name.insert(name, key);

        Ok(key)
    }

    pub fn key(&self, name: &str) -> Option<VariableKey> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Result<&Variable> {
        self.key(name)
            .and_then(|key| self.slots.get(key))
            .ok_or_else(|| FuzzyError::UndefinedVariable { name: name.to_owned() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.order.iter().filter_map(|key| self.slots.get(*key))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::ops::Index<VariableKey> for Variables {
    type Output = Variable;

    fn index(&self, key: VariableKey) -> &Variable {
        &self.slots[key]
    }
}

impl TryFrom<Vec<Variable>> for Variables {
    type Error = FuzzyError;

    fn try_from(variables: Vec<Variable>) -> Result<Self> {
        let mut catalog = Variables::new();

        for variable in variables {
            catalog.add(variable)?;
        }

        Ok(catalog)
    }
}

#[cfg(test)]
fn temperature() -> Variable {
    Variable::new(
        "temperature",
        [
            Term::new("cold", Membership::linear(-10., 10.).inverted()),
            Term::new("comfortable", Membership::trapezoid(5., 18., 22., 25.)),
            Term::new("hot", Membership::linear(20., 30.)),
        ],
    )
    .expect("distinct term names")
}

#[test]
fn test_universe_from_terms() {
    let var = temperature();

    assert_eq!(var.name(), "temperature");
    assert_eq!(var.universe(), (-10., 30.));
    assert_eq!(var.terms().map(Term::name).collect::<Vec<_>>(), ["cold", "comfortable", "hot"]);
    assert_eq!(var.term("hot").map(Term::domain).ok(), Some((20., 30.)));
}

#[test]
fn test_undefined_term() {
    let var = temperature();

    assert!(matches!(
        var.term("tepid"),
        Err(FuzzyError::UndefinedTerm { variable, term }) if variable == "temperature" && term == "tepid"
    ));
}

#[test]
fn test_duplicate_term() {
    let res = Variable::new(
        "humidity",
        [
            Term::new("high", Membership::linear(50., 100.)),
            Term::new("high", Membership::linear(60., 100.)),
        ],
    );

    assert!(matches!(res, Err(FuzzyError::TermAlreadyExists { term, .. }) if term == "high"));
}

#[test]
fn test_empty_variable_universe() {
    let var = Variable::new("nothing", []).expect("no terms, no duplicates");

    assert_eq!(var.universe(), (f64::INFINITY, f64::NEG_INFINITY));
}

#[test]
fn test_catalog() {
    let mut vars = Variables::new();
    let temp = vars.add(temperature()).expect("first insert");
    let ac = vars
        .add(Variable::new("ac_mode", [Term::new("heating", Membership::linear(0., 100.))]).expect("single term"))
        .expect("second insert");

    assert_eq!(vars.len(), 2);
    assert_eq!(vars.key("temperature"), Some(temp));
    assert_eq!(vars[ac].name(), "ac_mode");
    assert_eq!(vars.iter().map(Variable::name).collect::<Vec<_>>(), ["temperature", "ac_mode"]);
    assert!(matches!(vars.get("pressure"), Err(FuzzyError::UndefinedVariable { name }) if name == "pressure"));
    assert!(matches!(
        vars.add(temperature()),
        Err(FuzzyError::VariableAlreadyExists { name }) if name == "temperature"
    ));
}

#[test]
fn test_display() {
    let var = Variable::new("pressure", [Term::new("high", Membership::linear(1020., 1100.))]).expect("single term");

    assert_eq!(var.to_string(), "DEFINE pressure (\n    TERM high LINEAR(1020.0, 1100.0)\n);");
    assert_eq!(Variable::new("empty", []).expect("no terms").to_string(), "DEFINE empty ();");
}
