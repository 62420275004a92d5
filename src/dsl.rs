//! The textual rule language.
//!
//! ```text
//! DEFINE temperature (
//!     TERM cold INVERTED(LINEAR(-10, 10)),
//!     TERM hot LINEAR(20, 30)
//! );
//!
//! // Rules conclude on exactly one variable
//! IF temperature IS hot AND NOT humidity IS low THEN ac_mode IS cooling;
//! ```
//!
//! Keywords are case-insensitive, names are not.

mod error;
mod lexer;
mod membership;
mod parser;
mod position;

pub use error::{ParseError, ParseErrors};
pub use lexer::{strip_comments, tokenize, Token, TokenKind};
pub use membership::{MembershipParser, MembershipParsers};
pub use parser::{Cursor, ParseResult, Parser};
pub use position::Position;

use crate::rules::Rule;
use crate::variable::Variable;

/// Parses rules and variable definitions with the built-in membership functions.
pub fn parse_rules_and_variables(source: &str) -> Result<ParseResult, ParseErrors> {
    Parser::default().parse(source)
}

pub fn parse_rules(source: &str) -> Result<Vec<Rule>, ParseErrors> {
    parse_rules_and_variables(source).map(|result| result.rules)
}

pub fn parse_variables(source: &str) -> Result<Vec<Variable>, ParseErrors> {
    parse_rules_and_variables(source).map(|result| result.variables)
}

#[cfg(test)]
const AC_SOURCE: &str = "
    /* Air conditioning */
    DEFINE temperature (
        TERM cold INVERTED(LINEAR(-10, 10)),
        TERM comfortable TRAPEZOID(5, 18, 22, 25),
        TERM hot LINEAR(20, 30)
    );
    DEFINE humidity (
        TERM low LINEAR(60, 20),
        TERM high LINEAR(50, 80)
    );
    DEFINE ac_mode (
        TERM heating LINEAR(0, 100),
        TERM off TRIANGULAR(-50, 0, 50),
        TERM cooling INVERTED(LINEAR(-100, 0))
    );

    IF temperature IS cold AND humidity IS high THEN ac_mode IS heating; // damp and cold
    IF temperature IS comfortable OR NOT humidity IS high THEN ac_mode IS off;
    IF temperature IS hot THEN ac_mode IS cooling;
";

#[cfg(test)]
fn ac_engine(source: &str) -> crate::inference::Engine {
    let ParseResult { rules, variables } = parse_rules_and_variables(source).expect("valid source");
    let mut engine = crate::inference::Engine::new(crate::defuzzification::DefuzzificationOp::centroid(100));

    engine.variables(variables).expect("distinct variables").rules(rules);
    engine
}

#[test]
fn test_cold_and_damp() {
    use crate::inputs::Inputs;

    let engine = ac_engine(AC_SOURCE);
    let inputs: Inputs = [("temperature", 0.), ("humidity", 80.)].into_iter().collect();
    let outputs = engine.infer(&inputs).expect("all inputs given");
    let best = outputs.best("ac_mode").expect("a rule fired");

    assert_eq!(best.term(), "heating");
    assert_eq!(best.truth_degree(), 0.5);
}

#[test]
fn test_hot_day() {
    use crate::inputs::Inputs;

    let engine = ac_engine(AC_SOURCE);
    let inputs: Inputs = [("temperature", 30.), ("humidity", 80.)].into_iter().collect();
    let outputs = engine.infer(&inputs).expect("all inputs given");
    let best = outputs.best("ac_mode").expect("a rule fired");

    assert_eq!(best.term(), "cooling");
    assert_eq!(format!("{:.2}", best.truth_degree()), "1.00");

    let value = engine.defuzzify("ac_mode", &outputs).expect("ac_mode is defined");

    approx::assert_abs_diff_eq!(value, -67.333, epsilon = 1e-3);
}

#[test]
fn test_salvaged_rules_still_infer() {
    use crate::inputs::Inputs;

    let source = format!("{AC_SOURCE}\nIF temperature IS hot ac_mode IS heating;");
    let err = parse_rules_and_variables(&source).expect_err("last rule lacks THEN");
    let salvaged = err.into_salvaged();

    assert_eq!(salvaged.rules.len(), 3);
    assert_eq!(salvaged.variables.len(), 3);

    let mut engine = crate::inference::Engine::default();
    engine.variables(salvaged.variables).expect("distinct variables").rules(salvaged.rules);

    let inputs: Inputs = [("temperature", 30.), ("humidity", 40.)].into_iter().collect();

    assert!(engine.infer(&inputs).is_ok());
}

#[test]
fn test_display_round_trip() {
    use crate::inputs::Inputs;

    let original = parse_rules_and_variables(AC_SOURCE).expect("valid source");
    let printed = original
        .variables
        .iter()
        .map(ToString::to_string)
        .chain(original.rules.iter().map(ToString::to_string))
        .collect::<Vec<_>>()
        .join("\n");
    let reparsed = parse_rules_and_variables(&printed).expect("printed source parses");

    assert_eq!(reparsed, original);

    let first = ac_engine(AC_SOURCE);
    let second = ac_engine(&printed);

    for temperature in [-15., -2.5, 7., 19.3, 24., 31.] {
        for humidity in [10., 45., 55.5, 90.] {
            let inputs: Inputs = [("temperature", temperature), ("humidity", humidity)].into_iter().collect();
            let a = first.infer(&inputs).expect("inputs given");
            let b = second.infer(&inputs).expect("inputs given");

            assert_eq!(a, b);
            assert_eq!(
                first.defuzzify("ac_mode", &a).map(f64::to_bits).ok(),
                second.defuzzify("ac_mode", &b).map(f64::to_bits).ok()
            );
        }
    }
}

#[test]
fn test_idempotent() {
    assert_eq!(
        parse_rules_and_variables(AC_SOURCE).ok(),
        parse_rules_and_variables(AC_SOURCE).ok()
    );
}

#[test]
fn test_split_entry_points() {
    assert_eq!(parse_rules(AC_SOURCE).map(|rules| rules.len()).ok(), Some(3));
    assert_eq!(
        parse_variables(AC_SOURCE)
            .map(|vars| vars.iter().map(|var| var.name().to_owned()).collect::<Vec<_>>())
            .ok(),
        Some(vec!["temperature".to_owned(), "humidity".to_owned(), "ac_mode".to_owned()])
    );
}

#[test]
fn test_parse_error_converts() {
    fn load(source: &str) -> crate::error::Result<usize> {
        Ok(parse_rules(source)?.len())
    }

    let err = load("IF a IS x THEN").expect_err("no conclusion");

    assert!(matches!(err, crate::error::FuzzyError::Parse(_)));
    assert_eq!(
        err.to_string(),
        "parsing errors: expected variable name at line 1, column 11"
    );
}
