use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::ParseError;
use super::lexer::TokenKind;
use super::parser::Cursor;
use crate::membership::Membership;

/// Parses the arguments of one membership function. The cursor sits right after the function
/// name when `parse` is called.
pub trait MembershipParser: Send + Sync {
    fn parse(&self, cursor: &mut Cursor<'_>) -> Result<Membership, ParseError>;
}

impl<F> MembershipParser for F
where
    F: Fn(&mut Cursor<'_>) -> Result<Membership, ParseError> + Send + Sync,
{
    fn parse(&self, cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
        self(cursor)
    }
}

/// Membership function table of a parser, keyed by upper-case function name.
#[derive(Clone)]
pub struct MembershipParsers(HashMap<String, Arc<dyn MembershipParser>>);

impl MembershipParsers {
    /// A table without any function, not even the built-in ones.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Registers `parser` under `name`, replacing any previous entry. Names are case-insensitive.
    pub fn register(&mut self, name: impl AsRef<str>, parser: impl MembershipParser + 'static) -> &mut Self {
        self.0.insert(name.as_ref().to_ascii_uppercase(), Arc::new(parser));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn MembershipParser> {
        self.0.get(&name.to_ascii_uppercase()).map(|parser| parser.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_uppercase())
    }
}

impl Default for MembershipParsers {
    fn default() -> Self {
        let mut parsers = Self::empty();

        parsers
            .register("LINEAR", linear)
            .register("TRIANGULAR", triangular)
            .register("TRAPEZOID", trapezoid)
            .register("INVERTED", inverted);

        parsers
    }
}

impl fmt::Debug for MembershipParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.0.keys().collect();
        names.sort();
        f.debug_tuple("MembershipParsers").field(&names).finish()
    }
}

/// `LINEAR(x1, x2)`. A descending pair yields the inverted ascending ramp, equal bounds a step.
pub fn linear(cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
    let [x1, x2] = cursor.arguments::<2>("LINEAR")?;

    Ok(match x1.partial_cmp(&x2) {
        Some(Ordering::Less) => Membership::linear(x1, x2),
        Some(Ordering::Greater) => Membership::linear(x2, x1).inverted(),
        _ => Membership::step(x1),
    })
}

/// `TRIANGULAR(x1, x2, x3)`
pub fn triangular(cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
    let [x1, x2, x3] = cursor.arguments::<3>("TRIANGULAR")?;

    Ok(Membership::triangular(x1, x2, x3))
}

/// `TRAPEZOID(x1, x2, x3, x4)`
pub fn trapezoid(cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
    let [x1, x2, x3, x4] = cursor.arguments::<4>("TRAPEZOID")?;

    Ok(Membership::trapezoid(x1, x2, x3, x4))
}

/// `INVERTED(membership)`
pub fn inverted(cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
    cursor.expect(TokenKind::LParen, "expected ( after INVERTED")?;
    let inner = cursor.membership()?;
    cursor.expect(TokenKind::RParen, "expected ) after INVERTED function")?;

    Ok(inner.inverted())
}

#[cfg(test)]
fn parse_membership(src: &str, parsers: &MembershipParsers) -> Result<Membership, ParseError> {
    let tokens = super::lexer::tokenize(src)?;
    let mut cursor = Cursor::new(&tokens, parsers);

    cursor.membership()
}

#[test]
fn test_builtin_functions() {
    let parsers = MembershipParsers::default();
    let parse = |src| parse_membership(src, &parsers).expect("valid membership");

    assert_eq!(parse("LINEAR(0, 10)"), Membership::linear(0., 10.));
    assert_eq!(parse("triangular(-50, 0, 50)"), Membership::triangular(-50., 0., 50.));
    assert_eq!(parse("TRAPEZOID(5, 18, 22, 25)"), Membership::trapezoid(5., 18., 22., 25.));
    assert_eq!(
        parse("INVERTED(LINEAR(-10, 10))"),
        Membership::linear(-10., 10.).inverted()
    );
    assert_eq!(
        parse("INVERTED(INVERTED(TRIANGULAR(1, 2, 3)))"),
        Membership::triangular(1., 2., 3.).inverted().inverted()
    );
}

#[test]
fn test_linear_orientation() {
    let parsers = MembershipParsers::default();
    let parse = |src| parse_membership(src, &parsers).expect("valid membership");

    let descending = parse("LINEAR(10, 0)");

    assert_eq!(descending, Membership::linear(0., 10.).inverted());
    assert_eq!(descending.value(0.), 1.);
    assert_eq!(descending.value(10.), 0.);
    assert_eq!(parse("LINEAR(5, 5)"), Membership::step(5.));
}

#[test]
fn test_argument_errors() {
    let parsers = MembershipParsers::default();
    let message = |src| parse_membership(src, &parsers).map(|_| ()).map_err(|e| e.message().to_owned());

    assert_eq!(message("LINEAR 0, 10)"), Err("expected ( after LINEAR".to_owned()));
    assert_eq!(message("LINEAR(0 10)"), Err("expected , between parameters".to_owned()));
    assert_eq!(message("LINEAR(0, )"), Err("expected second parameter for LINEAR".to_owned()));
    assert_eq!(message("TRIANGULAR(0, 1, 2"), Err("expected ) after TRIANGULAR parameters".to_owned()));
    assert_eq!(message("INVERTED(LINEAR(0, 1)"), Err("expected ) after INVERTED function".to_owned()));
    assert_eq!(message("GAUSSIAN(0, 1)"), Err("unknown membership function type: GAUSSIAN".to_owned()));
}

#[test]
fn test_invalid_number() {
    let err = parse_membership("LINEAR(0, ten)", &MembershipParsers::default()).expect_err("not a number");

    assert_eq!(err.message(), "invalid number: ten");
    assert_eq!(err.column(), 11);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_custom_function() {
    fn step(cursor: &mut Cursor<'_>) -> Result<Membership, ParseError> {
        let [x] = cursor.arguments::<1>("STEP")?;
        Ok(Membership::step(x))
    }

    let mut parsers = MembershipParsers::default();
    parsers.register("step", step);

    assert!(parsers.contains("Step"));
    assert_eq!(parse_membership("STEP(5)", &parsers).ok(), Some(Membership::step(5.)));
    assert_eq!(
        parse_membership("INVERTED(step(5))", &parsers).ok(),
        Some(Membership::step(5.).inverted())
    );
    assert!(parse_membership("STEP(5)", &MembershipParsers::default()).is_err());
}

#[test]
fn test_empty_table() {
    let err = parse_membership("LINEAR(0, 1)", &MembershipParsers::empty()).expect_err("no functions");

    assert_eq!(err.message(), "unknown membership function type: LINEAR");
}
