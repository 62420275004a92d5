use std::fmt;

use super::error::ParseError;
use super::position::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    If,
    Is,
    Then,
    And,
    Or,
    Not,
    Define,
    Term,
    Linear,
    Triangular,
    Trapezoid,
    Inverted,
    Semi,
    LParen,
    RParen,
    Comma,
    /// Variable and term names, numbers, and any other bare word
    Ident,
}

impl TokenKind {
    fn classify(word: &str) -> Self {
        match word.to_ascii_uppercase().as_str() {
            "IF" => Self::If,
            "IS" => Self::Is,
            "THEN" => Self::Then,
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "DEFINE" => Self::Define,
            "TERM" => Self::Term,
            "LINEAR" => Self::Linear,
            "TRIANGULAR" => Self::Triangular,
            "TRAPEZOID" => Self::Trapezoid,
            "INVERTED" => Self::Inverted,
            ";" => Self::Semi,
            "(" => Self::LParen,
            ")" => Self::RParen,
            "," => Self::Comma,
            _ => Self::Ident,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::If => "IF",
            Self::Is => "IS",
            Self::Then => "THEN",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Define => "DEFINE",
            Self::Term => "TERM",
            Self::Linear => "LINEAR",
            Self::Triangular => "TRIANGULAR",
            Self::Trapezoid => "TRAPEZOID",
            Self::Inverted => "INVERTED",
            Self::Semi => ";",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
            Self::Ident => "identifier",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

/// Blanks out `//` and `/* */` comments. Every removed character becomes a space and newlines are
/// kept, so positions in the result match the original text.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_block = false;

    while let Some(c) = chars.next() {
        if in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                out.push_str("  ");
                in_block = false;
            } else if c == '\n' {
                out.push('\n');
            } else {
                out.push(' ');
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                out.push(' ');
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    out.push(' ');
                }
            },
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                in_block = true;
            },
            _ => out.push(c),
        }
    }

    out
}

/// Splits the source into tokens with 1-based positions.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let cleaned = strip_comments(input);
    let mut tokens = Vec::new();

    for (line_idx, line) in cleaned.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let padded = line
            .replace(';', " ; ")
            .replace('(', " ( ")
            .replace(')', " ) ")
            .replace(',', " , ");
        // Padding only inserts spaces, so every word is found again in the line, in order
        let mut search_from = 0;

        for word in padded.split_whitespace() {
            let at = match line[search_from..].find(word) {
                Some(offset) => search_from + offset,
                None => search_from,
            };
            search_from = (at + word.len()).min(line.len());

            tokens.push(Token {
                kind: TokenKind::classify(word),
                text: word.to_owned(),
                position: Position::new(line_idx + 1, line[..at].chars().count() + 1),
            });
        }
    }

    Ok(tokens)
}

#[cfg(test)]
fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_rule_tokens() {
    use TokenKind::*;

    let tokens = tokenize("IF temperature IS cold AND humidity IS high THEN ac_mode IS heating;").expect("lexes");

    assert_eq!(
        kinds(&tokens),
        [If, Ident, Is, Ident, And, Ident, Is, Ident, Then, Ident, Is, Ident, Semi]
    );
    assert_eq!(tokens[1].text, "temperature");
    assert_eq!(tokens[1].position, Position::new(1, 4));
    assert_eq!(tokens[12].position, Position::new(1, 68));
}

#[test]
fn test_keywords_case_insensitive() {
    use TokenKind::*;

    let tokens = tokenize("if Temp is Hot then Fan Is fast ;").expect("lexes");

    assert_eq!(kinds(&tokens), [If, Ident, Is, Ident, Then, Ident, Is, Ident, Semi]);
    // Identifiers keep their case
    assert_eq!(tokens[1].text, "Temp");
}

#[test]
fn test_punctuation_split() {
    use TokenKind::*;

    let tokens = tokenize("DEFINE t (TERM hot LINEAR(20,30));").expect("lexes");

    assert_eq!(
        kinds(&tokens),
        [Define, Ident, LParen, Term, Ident, Linear, LParen, Ident, Comma, Ident, RParen, RParen, Semi]
    );
    assert_eq!(tokens[7].text, "20");
    assert_eq!(tokens[7].position.column, 27);
    assert_eq!(tokens[9].position.column, 30);
}

#[test]
fn test_repeated_words_positions() {
    let tokens = tokenize("IF a IS x AND a IS x THEN b IS y;").expect("lexes");
    let columns: Vec<usize> = tokens.iter().map(|t| t.position.column).collect();

    assert_eq!(columns, [1, 4, 6, 9, 11, 15, 17, 20, 22, 27, 29, 32, 33]);
}

#[test]
fn test_multiline_positions() {
    let src = "IF a IS x\n  THEN b IS y;\n\n   IF c IS z THEN d IS w;";
    let tokens = tokenize(src).expect("lexes");

    assert_eq!(tokens[4].text, "THEN");
    assert_eq!(tokens[4].position, Position::new(2, 3));
    assert_eq!(tokens[9].kind, TokenKind::If);
    assert_eq!(tokens[9].position, Position::new(4, 4));
}

#[test]
fn test_strip_comments_keeps_layout() {
    let src = "IF a /* x\ny */ IS b // trailing\nTHEN";
    let stripped = strip_comments(src);

    assert_eq!(stripped.len(), src.len());
    assert_eq!(stripped.lines().count(), src.lines().count());
    assert_eq!(stripped, format!("IF a{}\n{}IS b{}\nTHEN", " ".repeat(5), " ".repeat(5), " ".repeat(12)));
}

#[test]
fn test_comment_positions() {
    let tokens = tokenize("/* header\n   block */ IF a /* c */ IS x // tail\nTHEN b IS y;").expect("lexes");

    assert_eq!(tokens[0].kind, TokenKind::If);
    assert_eq!(tokens[0].position, Position::new(2, 13));
    assert_eq!(tokens[2].position, Position::new(2, 26));
    assert_eq!(tokens[4].position, Position::new(3, 1));
}

#[test]
fn test_unterminated_block_comment() {
    let tokens = tokenize("IF a IS x /* never closed THEN b IS y;").expect("lexes");

    assert_eq!(tokens.len(), 4);
}
