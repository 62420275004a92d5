use std::fmt;

use crate::expr::{Expr, Is};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rules(pub(crate) Vec<Rule>);

impl Rules {
    pub fn new() -> Self {
        Rules(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Rules(Vec::with_capacity(capacity))
    }

    pub fn add(&mut self, premise: Expr, conclusion: Is) {
        self.0.push(Rule { premise, conclusion });
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Rules(iter.into_iter().collect())
    }
}

impl IntoIterator for Rules {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'r> IntoIterator for &'r Rules {
    type Item = &'r Rule;
    type IntoIter = std::slice::Iter<'r, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// `IF premise THEN conclusion`
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    premise: Expr,
    conclusion: Is,
}

impl Rule {
    pub fn new(premise: Expr, conclusion: Is) -> Self {
        Self { premise, conclusion }
    }

    pub fn premise(&self) -> &Expr {
        &self.premise
    }

    pub fn conclusion(&self) -> &Is {
        &self.conclusion
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN {};", self.premise, self.conclusion)
    }
}

#[test]
fn test_rule_builder() {
    let rule = Expr::is("temperature", "hot").then("ac_mode", "cooling");

    assert_eq!(rule.conclusion().variable(), "ac_mode");
    assert_eq!(rule.conclusion().term(), "cooling");
    assert_eq!(rule.premise(), &Expr::is("temperature", "hot"));
    assert_eq!(rule.to_string(), "IF temperature IS hot THEN ac_mode IS cooling;");
}

#[test]
fn test_rules_keep_order() {
    let mut rules = Rules::with_capacity(2);

    rules.add(Expr::is("temperature", "cold"), Is::new("ac_mode", "heating"));
    rules.push(Expr::is("temperature", "hot").then("ac_mode", "cooling"));

    let terms: Vec<&str> = rules.iter().map(|r| r.conclusion().term()).collect();

    assert_eq!(rules.len(), 2);
    assert_eq!(terms, ["heating", "cooling"]);
}
