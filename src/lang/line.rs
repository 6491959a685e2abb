use super::ast::Parsed;
use super::lex::{lex, lex_statement};
use super::parse::parse;
use super::token::{Literal, Token};
use super::{Error, LineNumber};

/// ## Source line
///
/// The token stream of one statement and the line number it was typed with.

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Line {
    number: Option<LineNumber>,
    tokens: Vec<Token>,
}

impl Line {
    /// Lex a line which may begin with a line number.
    pub fn new(s: &str) -> Line {
        let (number, tokens) = lex(s);
        Line { number, tokens }
    }

    /// Lex a statement body. Leading digits are not taken as a line number.
    pub fn statement(s: &str) -> Line {
        Line {
            number: None,
            tokens: lex_statement(s),
        }
    }

    pub fn number(&self) -> Option<LineNumber> {
        self.number
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn without_number(&self) -> Line {
        Line {
            number: None,
            tokens: self.tokens.clone(),
        }
    }

    pub fn with_number(&self, number: LineNumber) -> Line {
        Line {
            number: Some(number),
            tokens: self.tokens.clone(),
        }
    }

    /// Text of the statement without the line number.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|s| s.to_string()).collect()
    }

    pub fn parse(&self) -> Result<Parsed, Error> {
        parse(self.number, &self.tokens)
    }

    /// Copy of this line with the line-number literals at the given
    /// token positions replaced.
    pub fn renum(&self, changes: &[(usize, LineNumber)]) -> Line {
        let mut tokens = self.tokens.clone();
        for (index, number) in changes {
            if let Some(token) = tokens.get_mut(*index) {
                *token = Token::Literal(Literal::Integer(number.to_string()));
            }
        }
        Line {
            number: self.number,
            tokens,
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.number {
            Some(number) if self.tokens.is_empty() => write!(f, "{}", number),
            Some(number) => write!(f, "{} {}", number, self.text()),
            None => write!(f, "{}", self.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Line::new("100 goto  200").to_string(), "100 GOTO  200");
        assert_eq!(Line::statement("20 PRINT").to_string(), "20 PRINT");
        assert_eq!(Line::new("10").to_string(), "10");
    }

    #[test]
    fn test_renum() {
        let line = Line::new("200 GOTO 100");
        assert_eq!(line.renum(&[(2, 10)]).with_number(20).to_string(), "20 GOTO 10");
    }
}
