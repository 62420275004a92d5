use tracing::{debug, warn};

use super::error::{ParseError, ParseErrors};
use super::lexer::{tokenize, Token, TokenKind};
use super::membership::MembershipParsers;
use super::position::Position;
use crate::expr::{Expr, Is};
use crate::membership::Membership;
use crate::rules::Rule;
use crate::variable::{Term, Variable};

const ORDINALS: [&str; 4] = ["first", "second", "third", "fourth"];

/// Read position over a token sequence. Membership parsers pull their arguments through it.
pub struct Cursor<'p> {
    tokens: &'p [Token],
    current: usize,
    memberships: &'p MembershipParsers,
}

impl<'p> Cursor<'p> {
    pub(crate) fn new(tokens: &'p [Token], memberships: &'p MembershipParsers) -> Self {
        Self {
            tokens,
            current: 0,
            memberships,
        }
    }

    pub fn peek(&self) -> Option<&'p Token> {
        self.tokens.get(self.current)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    pub fn advance(&mut self) -> Option<&'p Token> {
        let token = self.peek()?;
        self.current += 1;
        Some(token)
    }

    /// Position of the next token, or of the last one once the input is exhausted.
    pub fn position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(Position::new(1, 1), |token| token.position)
    }

    pub fn expect(&mut self, kind: TokenKind, message: impl Into<String>) -> Result<&'p Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.current += 1;
                Ok(token)
            },
            _ => Err(ParseError::new(message, self.position())),
        }
    }

    /// Consumes a numeric literal. `message` describes a missing one.
    pub fn number(&mut self, message: impl Into<String>) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Ident, message)?;

        token
            .text
            .parse()
            .map_err(|err| ParseError::new(format!("invalid number: {}", token.text), token.position).with_cause(err))
    }

    /// Consumes `( n1, n2, ... )` with exactly `N` numbers, as taken by `function`.
    pub fn arguments<const N: usize>(&mut self, function: &str) -> Result<[f64; N], ParseError> {
        self.expect(TokenKind::LParen, format!("expected ( after {function}"))?;

        let mut args = [0.; N];
        for (i, arg) in args.iter_mut().enumerate() {
            if i > 0 {
                self.expect(TokenKind::Comma, "expected , between parameters")?;
            }
            let ordinal = ORDINALS.get(i).copied().unwrap_or("next");
            *arg = self.number(format!("expected {ordinal} parameter for {function}"))?;
        }

        self.expect(TokenKind::RParen, format!("expected ) after {function} parameters"))?;

        Ok(args)
    }

    /// Consumes a function name and hands its arguments to the registered parser.
    pub fn membership(&mut self) -> Result<Membership, ParseError> {
        let position = self.position();
        let name = self
            .advance()
            .ok_or_else(|| ParseError::new("expected membership function type", position))?;
        let memberships = self.memberships;
        let parser = memberships.get(&name.text).ok_or_else(|| {
            ParseError::new(
                format!("unknown membership function type: {}", name.text),
                name.position,
            )
        })?;

        parser.parse(self)
    }
}

/// Rules and variables of one source, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseResult {
    pub rules: Vec<Rule>,
    pub variables: Vec<Variable>,
}

/// DSL parser. Holds the membership functions known to `DEFINE` blocks.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    memberships: MembershipParsers,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memberships(memberships: MembershipParsers) -> Self {
        Self { memberships }
    }

    pub fn memberships(&self) -> &MembershipParsers {
        &self.memberships
    }

    /// Parses a whole source. A malformed statement is reported and skipped; the statements
    /// around it are still parsed and returned inside the error.
    pub fn parse(&self, source: &str) -> Result<ParseResult, ParseErrors> {
        let tokens = tokenize(source).map_err(|err| ParseErrors::new(vec![err], ParseResult::default()))?;
        let mut grammar = Grammar {
            cursor: Cursor::new(&tokens, &self.memberships),
            errors: Vec::new(),
        };

        let result = grammar.program();

        debug!(
            tokens = tokens.len(),
            rules = result.rules.len(),
            variables = result.variables.len(),
            errors = grammar.errors.len(),
            "parsed source"
        );

        if grammar.errors.is_empty() {
            Ok(result)
        } else {
            Err(ParseErrors::new(grammar.errors, result))
        }
    }
}

struct Grammar<'p> {
    cursor: Cursor<'p>,
    errors: Vec<ParseError>,
}

impl Grammar<'_> {
    fn program(&mut self) -> ParseResult {
        let mut result = ParseResult::default();

        while let Some(kind) = self.cursor.peek_kind() {
            if kind == TokenKind::Define {
                match self.define() {
                    Ok(variable) => result.variables.push(variable),
                    Err(err) => self.recover(err),
                }
            } else {
                match self.rule() {
                    Ok(rule) => result.rules.push(rule),
                    Err(err) => self.recover(err),
                }
            }
        }

        result
    }

    fn record(&mut self, err: ParseError) {
        warn!(line = err.line(), column = err.column(), "{}", err.message());
        self.errors.push(err);
    }

    fn recover(&mut self, err: ParseError) {
        self.record(err);
        self.synchronize();
    }

    /// Skips past the next `;`, or up to the next `IF`/`DEFINE`.
    fn synchronize(&mut self) {
        while let Some(kind) = self.cursor.peek_kind() {
            match kind {
                TokenKind::Semi => {
                    self.cursor.advance();
                    return;
                },
                TokenKind::If | TokenKind::Define => return,
                _ => {
                    self.cursor.advance();
                },
            }
        }
    }

    fn rule(&mut self) -> Result<Rule, ParseError> {
        match self.cursor.peek() {
            Some(token) if token.kind == TokenKind::If => {
                self.cursor.advance();
            },
            found => {
                let found = found.map_or("end of input", |token| token.text.as_str());
                return Err(ParseError::new(
                    format!("expected rule to start with IF, found {found}"),
                    self.cursor.position(),
                ));
            },
        }

        let premise = self.expr()?;
        self.cursor.expect(TokenKind::Then, "expected THEN after premise")?;
        let conclusion = self.is()?;
        let rule = Rule::new(premise, conclusion);

        if self.cursor.peek_kind() == Some(TokenKind::Semi) {
            self.cursor.advance();
        } else {
            // The rule itself is complete, keep it
            let err = ParseError::new("missing semicolon at end of rule", self.cursor.position());
            self.recover(err);
        }

        Ok(rule)
    }

    /// `unary ((AND | OR) expr)?`
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.unary()?;

        match self.cursor.peek_kind() {
            Some(TokenKind::And) => {
                self.cursor.advance();
                Ok(lhs.and(self.expr()?))
            },
            Some(TokenKind::Or) => {
                self.cursor.advance();
                Ok(lhs.or(self.expr()?))
            },
            _ => Ok(lhs),
        }
    }

    /// `NOT operand | ( expr ) | variable IS term`
    ///
    /// `NOT` takes a single proposition or group as operand. Before anything else, such as a
    /// second `NOT`, it negates the whole rest of the expression.
    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.cursor.peek_kind() {
            Some(TokenKind::Not) => {
                self.cursor.advance();
                let operand = match self.cursor.peek_kind() {
                    Some(TokenKind::Ident | TokenKind::LParen) => self.unary()?,
                    _ => self.expr()?,
                };
                Ok(operand.not())
            },
            Some(TokenKind::LParen) => {
                self.cursor.advance();
                let expr = self.expr()?;
                self.cursor.expect(TokenKind::RParen, "missing closing parenthesis")?;
                Ok(expr)
            },
            _ => self.is().map(Expr::from),
        }
    }

    fn is(&mut self) -> Result<Is, ParseError> {
        let variable = self.cursor.expect(TokenKind::Ident, "expected variable name")?;

        if self.cursor.peek_kind() != Some(TokenKind::Is) {
            let Position { line, column } = variable.position;
            return Err(ParseError::new(
                "expected IS after variable",
                Position::new(line, column + variable.text.chars().count() + 1),
            ));
        }
        self.cursor.advance();

        let term = self.cursor.expect(TokenKind::Ident, "expected term name after IS")?;

        Ok(Is::new(variable.text.as_str(), term.text.as_str()))
    }

    /// `DEFINE name ( TERM name function, ... );`
    fn define(&mut self) -> Result<Variable, ParseError> {
        let define = self.cursor.expect(TokenKind::Define, "expected DEFINE")?;
        let name = self.cursor.expect(TokenKind::Ident, "expected variable name after DEFINE")?;
        self.cursor.expect(TokenKind::LParen, "expected ( after variable name")?;

        let mut terms = Vec::new();
        loop {
            match self.cursor.peek_kind() {
                Some(TokenKind::RParen) => break,
                Some(TokenKind::Term) => {},
                Some(_) => {
                    return Err(ParseError::new(
                        "expected TERM in variable definition",
                        self.cursor.position(),
                    ))
                },
                None => {
                    return Err(ParseError::new(
                        "expected ) at end of variable definition",
                        self.cursor.position(),
                    ))
                },
            }

            terms.push(self.term()?);

            match self.cursor.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.cursor.advance();
                },
                Some(TokenKind::RParen) => {},
                _ => return Err(ParseError::new("expected , or ) after term", self.cursor.position())),
            }
        }

        self.cursor
            .expect(TokenKind::RParen, "expected ) at end of variable definition")?;
        self.cursor.expect(TokenKind::Semi, "expected ; after variable definition")?;

        Variable::new(name.text.as_str(), terms).map_err(|err| {
            ParseError::new(format!("invalid definition of variable {}", name.text), define.position).with_cause(err)
        })
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        self.cursor.expect(TokenKind::Term, "expected TERM in variable definition")?;
        let name = self.cursor.expect(TokenKind::Ident, "expected term name")?;
        let membership = self.cursor.membership()?;

        Ok(Term::new(name.text.as_str(), membership))
    }
}

#[cfg(test)]
fn parse(source: &str) -> Result<ParseResult, ParseErrors> {
    Parser::new().parse(source)
}

#[test]
fn test_simple_rule() {
    let result = parse("IF temperature IS hot THEN ac_mode IS cooling;").expect("valid rule");

    assert!(result.variables.is_empty());
    assert_eq!(result.rules, [Expr::is("temperature", "hot").then("ac_mode", "cooling")]);
}

#[test]
fn test_logical_operators() {
    let result = parse(
        "IF a IS x AND b IS y AND c IS z THEN out IS one;
         IF a IS x OR b IS y THEN out IS two;
         IF a IS x AND (b IS y OR c IS z) THEN out IS three;
         IF a IS x OR b IS y AND c IS z THEN out IS four;",
    )
    .expect("valid rules");

    let a = || Expr::is("a", "x");
    let b = || Expr::is("b", "y");
    let c = || Expr::is("c", "z");
    let premises: Vec<_> = result.rules.iter().map(Rule::premise).cloned().collect();

    assert_eq!(
        premises,
        [
            Expr::And(vec![a(), b(), c()]),
            Expr::Or(vec![a(), b()]),
            Expr::And(vec![a(), Expr::Or(vec![b(), c()])]),
            Expr::Or(vec![a(), Expr::And(vec![b(), c()])]),
        ]
    );
}

#[test]
fn test_parenthesized_groups_flatten() {
    let result = parse("IF (a IS x AND b IS y) AND c IS z THEN out IS one;").expect("valid rule");

    assert_eq!(
        result.rules[0].premise(),
        &Expr::And(vec![Expr::is("a", "x"), Expr::is("b", "y"), Expr::is("c", "z")])
    );
}

#[test]
fn test_not() {
    let result = parse(
        "IF NOT pressure IS low AND wind IS calm THEN sky IS clear;
         IF NOT (pressure IS low OR wind IS strong) THEN sky IS clear;
         IF NOT NOT pressure IS low THEN sky IS clear;",
    )
    .expect("valid rules");

    let low = || Expr::is("pressure", "low");

    assert_eq!(result.rules[0].premise(), &low().not().and(Expr::is("wind", "calm")));
    assert_eq!(
        result.rules[1].premise(),
        &low().or(Expr::is("wind", "strong")).not()
    );
    assert_eq!(result.rules[2].premise(), &low().not().not());
}

#[test]
fn test_double_not_negates_the_rest() {
    let result = parse(
        "IF NOT NOT a IS x AND b IS y THEN c IS z;
         IF NOT NOT a IS x OR b IS y THEN c IS z;
         IF NOT (NOT a IS x) AND b IS y THEN c IS z;",
    )
    .expect("valid rules");

    let a = || Expr::is("a", "x");
    let b = || Expr::is("b", "y");

    assert_eq!(result.rules[0].premise(), &a().not().and(b()).not());
    assert_eq!(result.rules[1].premise(), &a().not().or(b()).not());
    assert_eq!(result.rules[2].premise(), &a().not().not().and(b()));
}

#[test]
fn test_nested_not_display_round_trip() {
    let a = || Expr::is("a", "x");
    let b = || Expr::is("b", "y");

    for premise in [a().not().not().and(b()), a().not().and(b()).not(), a().not().not().not()] {
        let rule = premise.then("c", "z");
        let reparsed = parse(&rule.to_string()).expect("printed rule parses");

        assert_eq!(reparsed.rules, [rule]);
    }
}

#[test]
fn test_variable_definition() {
    let result = parse(
        "DEFINE temperature (
            TERM cold LINEAR(10, -10),
            TERM comfortable TRAPEZOID(5, 18, 22, 25),
            TERM hot LINEAR(20, 30)
        );
        DEFINE nothing ();",
    )
    .expect("valid definitions");

    assert!(result.rules.is_empty());
    assert_eq!(result.variables.len(), 2);

    let temperature = &result.variables[0];

    assert_eq!(temperature.name(), "temperature");
    assert_eq!(
        temperature.terms().map(Term::name).collect::<Vec<_>>(),
        ["cold", "comfortable", "hot"]
    );
    assert_eq!(
        temperature.term("cold").map(Term::membership).ok(),
        Some(&Membership::linear(-10., 10.).inverted())
    );
    assert_eq!(temperature.universe(), (-10., 30.));
    assert_eq!(result.variables[1].terms().count(), 0);
}

#[test]
fn test_missing_then_salvages_other_rules() {
    let err = parse(
        "IF temperature IS hot THEN ac_mode IS cooling;
         IF temperature IS cold ac_mode IS heating;
         IF temperature IS comfortable THEN ac_mode IS off;",
    )
    .expect_err("second rule is malformed");

    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].message(), "expected THEN after premise");
    assert_eq!(err.errors()[0].position(), Position::new(2, 33));

    let conclusions: Vec<_> = err
        .salvaged()
        .rules
        .iter()
        .map(|rule| rule.conclusion().term().to_owned())
        .collect();

    assert_eq!(conclusions, ["cooling", "off"]);
}

#[test]
fn test_missing_semicolon_keeps_rule() {
    let err = parse("IF a IS x THEN b IS y\nIF c IS z THEN d IS w;").expect_err("first rule lacks ;");

    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].message(), "missing semicolon at end of rule");
    assert_eq!(err.errors()[0].position(), Position::new(2, 1));
    assert_eq!(err.salvaged().rules.len(), 2);
    assert_eq!(
        err.to_string(),
        "parsing errors: missing semicolon at end of rule at line 2, column 1"
    );
}

#[test]
fn test_missing_semicolon_at_end_of_input() {
    let err = parse("IF a IS x THEN b IS y").expect_err("no trailing ;");

    assert_eq!(err.errors()[0].position(), Position::new(1, 21));
    assert_eq!(err.into_salvaged().rules.len(), 1);
}

#[test]
fn test_rule_must_start_with_if() {
    let err = parse("WHEN a IS x THEN b IS y;\nIF c IS z THEN d IS w;").expect_err("WHEN is not a keyword");

    assert_eq!(err.errors()[0].message(), "expected rule to start with IF, found WHEN");
    assert_eq!(err.errors()[0].position(), Position::new(1, 1));
    assert_eq!(err.salvaged().rules.len(), 1);
}

#[test]
fn test_expression_errors() {
    let first = |src: &str| {
        let err = parse(src).expect_err("malformed");
        (err.errors()[0].message().to_owned(), err.errors()[0].position())
    };

    assert_eq!(
        first("IF temperature cold THEN a IS b;"),
        ("expected IS after variable".to_owned(), Position::new(1, 16))
    );
    assert_eq!(
        first("IF temperature IS THEN a IS b;"),
        ("expected term name after IS".to_owned(), Position::new(1, 19))
    );
    assert_eq!(
        first("IF (a IS x AND b IS y THEN c IS z;"),
        ("missing closing parenthesis".to_owned(), Position::new(1, 23))
    );
    assert_eq!(
        first("IF AND a IS x THEN c IS z;"),
        ("expected variable name".to_owned(), Position::new(1, 4))
    );
}

#[test]
fn test_definition_errors() {
    let messages = |src: &str| {
        parse(src)
            .expect_err("malformed")
            .errors()
            .iter()
            .map(|err| err.message().to_owned())
            .collect::<Vec<_>>()
    };

    assert_eq!(messages("DEFINE (TERM a LINEAR(0, 1));"), ["expected variable name after DEFINE"]);
    assert_eq!(messages("DEFINE v TERM a LINEAR(0, 1);"), ["expected ( after variable name"]);
    assert_eq!(messages("DEFINE v (a LINEAR(0, 1));"), ["expected TERM in variable definition"]);
    assert_eq!(
        messages("DEFINE v (TERM a LINEAR(0, 1) TERM b LINEAR(1, 2));"),
        ["expected , or ) after term"]
    );
    assert_eq!(messages("DEFINE v (TERM a LINEAR(0, 1))"), ["expected ; after variable definition"]);
    assert_eq!(messages("DEFINE v (TERM a LINEAR(0, 1),"), ["expected ) at end of variable definition"]);
}

#[test]
fn test_duplicate_term_in_definition() {
    let err = parse("DEFINE v (TERM a LINEAR(0, 1), TERM a LINEAR(1, 2));\nIF v IS a THEN w IS b;")
        .expect_err("duplicate term");

    assert_eq!(err.errors()[0].message(), "invalid definition of variable v");
    assert_eq!(
        err.errors()[0].to_string(),
        "invalid definition of variable v at line 1, column 1: term 'a' already exists in variable 'v'"
    );
    assert!(err.salvaged().variables.is_empty());
    assert_eq!(err.salvaged().rules.len(), 1);
}

#[test]
fn test_errors_are_collected() {
    let err = parse(
        "IF a IS x b IS y;
         IF a IS x THEN b IS y;
         DEFINE v (TERM a LINEAR(0, x));
         IF c x THEN d IS w;",
    )
    .expect_err("three malformed statements");

    let lines: Vec<_> = err.errors().iter().map(ParseError::line).collect();

    assert_eq!(lines, [1, 3, 4]);
    assert_eq!(err.salvaged().rules.len(), 1);
}

#[test]
fn test_empty_source() {
    assert_eq!(parse("").ok(), Some(ParseResult::default()));
    assert_eq!(parse("  // nothing\n/* at all */").ok(), Some(ParseResult::default()));
}
