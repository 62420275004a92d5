use std::fmt;

use crate::error::{FuzzyError, Result};
use crate::inference::Context;
use crate::rules::Rule;

/// A rule premise. AND and OR are n-ary and never empty.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Is(Is),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

/// A `variable IS term` proposition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Is {
    variable: String,
    term: String,
}

impl Is {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Fuzzificates the crisp input of the variable against the term.
    pub fn value(&self, ctx: &Context<'_>) -> Result<f64> {
        let variable = ctx.variable(&self.variable)?;
        let term = variable.term(&self.term)?;
        let input = ctx.input(&self.variable)?;

        Ok(term.membership().value(input))
    }
}

impl fmt::Display for Is {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.term)
    }
}

impl Expr {
    pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Expr::Is(Is::new(variable, term))
    }

    /// Fails with [`FuzzyError::MissingArguments`] on an empty list.
    pub fn all(exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<_> = exprs.into_iter().collect();

        if exprs.is_empty() {
            return Err(FuzzyError::MissingArguments);
        }

        Ok(Expr::And(exprs))
    }

    /// Fails with [`FuzzyError::MissingArguments`] on an empty list.
    pub fn any(exprs: impl IntoIterator<Item = Expr>) -> Result<Self> {
        let exprs: Vec<_> = exprs.into_iter().collect();

        if exprs.is_empty() {
            return Err(FuzzyError::MissingArguments);
        }

        Ok(Expr::Or(exprs))
    }

    /// Conjunction, merging operands that are already conjunctions into one flat node.
    pub fn and(self, rhs: Expr) -> Self {
        let mut exprs = match self {
            Expr::And(exprs) => exprs,
            lhs => vec![lhs],
        };

        match rhs {
            Expr::And(rhs) => exprs.extend(rhs),
            rhs => exprs.push(rhs),
        }

        Expr::And(exprs)
    }

    /// Disjunction, merging operands that are already disjunctions into one flat node.
    pub fn or(self, rhs: Expr) -> Self {
        let mut exprs = match self {
            Expr::Or(exprs) => exprs,
            lhs => vec![lhs],
        };

        match rhs {
            Expr::Or(rhs) => exprs.extend(rhs),
            rhs => exprs.push(rhs),
        }

        Expr::Or(exprs)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn then(self, variable: impl Into<String>, term: impl Into<String>) -> Rule {
        Rule::new(self, Is::new(variable, term))
    }

    /// Evaluates the truth degree. The first failing operand aborts the evaluation.
    pub fn value(&self, ctx: &Context<'_>) -> Result<f64> {
        match self {
            Expr::Is(is) => is.value(ctx),
            Expr::And(exprs) => exprs
                .iter()
                .try_fold(f64::INFINITY, |min, expr| Ok(min.min(expr.value(ctx)?))),
            Expr::Or(exprs) => exprs
                .iter()
                .try_fold(f64::NEG_INFINITY, |max, expr| Ok(max.max(expr.value(ctx)?))),
            Expr::Not(expr) => Ok(1. - expr.value(ctx)?),
        }
    }

    /// Every `IS` leaf, left to right.
    pub fn propositions(&self) -> Vec<&Is> {
        let mut props = Vec::new();

        fn parse<'p>(expr: &'p Expr, out: &mut Vec<&'p Is>) {
            match expr {
                Expr::Is(is) => out.push(is),
                Expr::And(exprs) | Expr::Or(exprs) => {
                    for expr in exprs {
                        parse(expr, out);
                    }
                },
                Expr::Not(expr) => parse(expr, out),
            }
        }

        parse(self, &mut props);

        props
    }
}

impl From<Is> for Expr {
    fn from(is: Is) -> Self {
        Expr::Is(is)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Compound operands are parenthesized so the printed text parses back to the same tree
        fn operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
            match expr {
                Expr::And(_) | Expr::Or(_) => write!(f, "({expr})"),
                _ => write!(f, "{expr}"),
            }
        }

        fn join(f: &mut fmt::Formatter<'_>, exprs: &[Expr], op: &str) -> fmt::Result {
            for (i, expr) in exprs.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                operand(f, expr)?;
            }
            Ok(())
        }

        match self {
            Expr::Is(is) => write!(f, "{is}"),
            Expr::And(exprs) => join(f, exprs, "AND"),
            Expr::Or(exprs) => join(f, exprs, "OR"),
            Expr::Not(expr) => {
                f.write_str("NOT ")?;
                match expr.as_ref() {
                    // A bare second NOT would negate whatever follows it
                    Expr::Not(_) => write!(f, "({expr})"),
                    _ => operand(f, expr),
                }
            },
        }
    }
}

#[test]
fn test_flattening() {
    let a = || Expr::is("temperature", "cold");
    let b = || Expr::is("humidity", "high");
    let c = || Expr::is("pressure", "low");

    assert_eq!(a().and(b()).and(c()), Expr::And(vec![a(), b(), c()]));
    assert_eq!(a().and(b().and(c())), Expr::And(vec![a(), b(), c()]));
    assert_eq!(a().or(b()).or(c().or(a())), Expr::Or(vec![a(), b(), c(), a()]));
    // Mixed operators keep their nesting
    assert_eq!(a().and(b().or(c())), Expr::And(vec![a(), Expr::Or(vec![b(), c()])]));
}

#[test]
fn test_empty_operands() {
    assert!(matches!(Expr::all([]), Err(FuzzyError::MissingArguments)));
    assert!(matches!(Expr::any(Vec::new()), Err(FuzzyError::MissingArguments)));
    assert!(Expr::all([Expr::is("a", "b")]).is_ok());
}

#[test]
fn test_propositions() {
    let expr = Expr::is("temperature", "cold")
        .or(Expr::is("humidity", "high"))
        .and(Expr::is("pressure", "low").not());
    let props: Vec<String> = expr.propositions().iter().map(|is| is.to_string()).collect();

    assert_eq!(props, ["temperature IS cold", "humidity IS high", "pressure IS low"]);
}

#[test]
fn test_display() {
    let expr = Expr::is("temperature", "cold")
        .or(Expr::is("humidity", "high"))
        .and(Expr::is("pressure", "low").not());

    assert_eq!(
        expr.to_string(),
        "(temperature IS cold OR humidity IS high) AND NOT pressure IS low"
    );
    assert_eq!(
        Expr::is("a", "x").and(Expr::is("b", "y")).not().to_string(),
        "NOT (a IS x AND b IS y)"
    );
    assert_eq!(
        Expr::is("a", "x").not().not().and(Expr::is("b", "y")).to_string(),
        "NOT (NOT a IS x) AND b IS y"
    );
}
