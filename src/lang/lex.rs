use super::{token::*, LineNumber, MAX_LINE_NUMBER};

/// Split a source line into an optional leading line number and tokens.
/// Whitespace is kept so joining the tokens reproduces the statement text.
pub fn lex(s: &str) -> (Option<LineNumber>, Vec<Token>) {
    BasicLexer::lex(s)
}

/// Tokens for a statement that must not be given a line number.
pub fn lex_statement(s: &str) -> Vec<Token> {
    BasicLexer::tokens(s.trim_start())
}

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_basic_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

trait Tokenizers<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>>;

    fn whitespace(&mut self) -> Option<Token> {
        let mut len = 0;
        loop {
            self.chars().next();
            len += 1;
            if let Some(pk) = self.chars().peek() {
                if is_basic_whitespace(*pk) {
                    continue;
                }
            }
            return Some(Token::Whitespace(len));
        }
    }

    fn number(&mut self) -> Option<Token> {
        let mut s = String::new();
        let mut decimal = false;
        let mut exp = false;
        loop {
            let mut ch = self.chars().next()?;
            if ch == 'e' {
                ch = 'E'
            }
            s.push(ch);
            if ch == '.' {
                decimal = true
            }
            if let Some(pk) = self.chars().peek() {
                if ch == 'E' {
                    exp = true;
                    if *pk == '+' || *pk == '-' {
                        continue;
                    }
                }
                if is_basic_digit(*pk) {
                    continue;
                }
                if !decimal && !exp && *pk == '.' {
                    continue;
                }
                if !exp && (*pk == 'E' || *pk == 'e') {
                    continue;
                }
            }
            break;
        }
        if !exp && !decimal && s.parse::<i32>().is_ok() {
            return Some(Token::Literal(Literal::Integer(s)));
        }
        Some(Token::Literal(Literal::Double(s)))
    }

    fn string(&mut self) -> Option<Token> {
        let mut s = String::new();
        self.chars().next();
        loop {
            if let Some(ch) = self.chars().next() {
                if ch != '"' {
                    s.push(ch);
                    continue;
                }
            }
            return Some(Token::Literal(Literal::String(s)));
        }
    }

    fn alphabetic(&mut self) -> Option<Token> {
        let mut s = String::new();
        loop {
            let ch = self.chars().next()?.to_ascii_uppercase();
            s.push(ch);
            if ch == '$' {
                break;
            }
            match self.chars().peek() {
                Some(pk) if is_ident_char(*pk) || *pk == '$' => continue,
                _ => break,
            }
        }
        match Token::from_string(&s) {
            Some(token) => Some(token),
            None => Some(Token::Ident(s)),
        }
    }

    fn minutia(&mut self) -> Option<Token> {
        let ch = self.chars().next()?;
        let mut s = ch.to_string();
        if let Some(pk) = self.chars().peek() {
            let mut pair = s.clone();
            pair.push(*pk);
            if let Some(t) = Token::from_string(&pair) {
                self.chars().next();
                return Some(t);
            }
        }
        if let Some(t) = Token::from_string(&s) {
            return Some(t);
        }
        while let Some(pk) = self.chars().peek() {
            if is_basic_alphabetic(*pk)
                || is_basic_digit(*pk)
                || is_basic_whitespace(*pk)
                || Token::from_string(&pk.to_string()).is_some()
            {
                break;
            }
            s.push(*pk);
            self.chars().next();
        }
        Some(Token::Unknown(s))
    }
}

struct BasicLexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    remark: bool,
}

impl<'a> Tokenizers<'a> for BasicLexer<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>> {
        &mut self.chars
    }
}

impl<'a> Iterator for BasicLexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let pk = self.chars.peek()?;
        if self.remark {
            return Some(Token::Unknown(self.chars.by_ref().collect::<String>()));
        }
        if is_basic_whitespace(*pk) {
            return self.whitespace();
        }
        if is_basic_digit(*pk) || *pk == '.' {
            return self.number();
        }
        if is_basic_alphabetic(*pk) {
            let r = self.alphabetic();
            if let Some(Token::Word(Word::Rem1)) = r {
                self.remark = true;
            }
            return r;
        }
        if *pk == '"' {
            return self.string();
        }
        let minutia = self.minutia();
        if let Some(Token::Word(Word::Rem2)) = minutia {
            self.remark = true;
        }
        minutia
    }
}

impl<'a> BasicLexer<'a> {
    fn lex(s: &str) -> (Option<LineNumber>, Vec<Token>) {
        let s = s.trim_end_matches(|c| c == '\n' || c == '\r');
        let trimmed = s.trim_start();
        let digits = trimmed
            .find(|c: char| !is_basic_digit(c))
            .unwrap_or(trimmed.len());
        if digits > 0 {
            if let Ok(n) = trimmed[..digits].parse::<LineNumber>() {
                if n <= MAX_LINE_NUMBER {
                    return (Some(n), BasicLexer::tokens(trimmed[digits..].trim_start()));
                }
            }
        }
        (None, BasicLexer::tokens(trimmed))
    }

    fn tokens(s: &str) -> Vec<Token> {
        let mut tokens: Vec<Token> = BasicLexer {
            chars: s.chars().peekable(),
            remark: false,
        }
        .collect();
        BasicLexer::trim_end(&mut tokens);
        tokens
    }

    fn trim_end(tokens: &mut Vec<Token>) {
        if let Some(Token::Whitespace(_)) = tokens.last() {
            tokens.pop();
        }
        if let Some(Token::Unknown(_)) = tokens.last() {
            if let Some(Token::Unknown(s)) = tokens.pop() {
                let s = s.trim_end();
                if !s.is_empty() {
                    tokens.push(Token::Unknown(s.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_number() {
        let (ln, tokens) = lex("100 PRINT \"A\"");
        assert_eq!(ln, Some(100));
        assert_eq!(
            tokens,
            vec![
                Token::Word(Word::Print1),
                Token::Whitespace(1),
                Token::Literal(Literal::String("A".to_string())),
            ]
        );
    }

    #[test]
    fn test_no_line_number() {
        let (ln, tokens) = lex("goto 200\r\n");
        assert_eq!(ln, None);
        assert_eq!(
            tokens,
            vec![
                Token::Word(Word::Goto),
                Token::Whitespace(1),
                Token::Literal(Literal::Integer("200".to_string())),
            ]
        );
    }

    #[test]
    fn test_line_number_out_of_range() {
        let (ln, _) = lex("99999 PRINT");
        assert_eq!(ln, None);
    }

    #[test]
    fn test_words_and_idents() {
        let (_, tokens) = lex("format$=fact.x");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("FORMAT$".to_string()),
                Token::Operator(Operator::Equal),
                Token::Ident("FACT.X".to_string()),
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let (_, tokens) = lex("a<=b<>c>=d");
        assert_eq!(tokens[1], Token::Operator(Operator::LessEqual));
        assert_eq!(tokens[3], Token::Operator(Operator::NotEqual));
        assert_eq!(tokens[5], Token::Operator(Operator::GreaterEqual));
    }

    #[test]
    fn test_numbers() {
        let (_, tokens) = lex("1 2.5 1E3 3000000000");
        assert_eq!(tokens[0], Token::Literal(Literal::Integer("1".to_string())));
        assert_eq!(tokens[2], Token::Literal(Literal::Double("2.5".to_string())));
        assert_eq!(tokens[4], Token::Literal(Literal::Double("1E3".to_string())));
        assert_eq!(
            tokens[6],
            Token::Literal(Literal::Double("3000000000".to_string()))
        );
    }

    #[test]
    fn test_remark() {
        let (_, tokens) = lex("rem  Hello: World   ");
        assert_eq!(
            tokens,
            vec![
                Token::Word(Word::Rem1),
                Token::Unknown("  Hello: World".to_string())
            ]
        );
        let (_, tokens) = lex("' it's");
        assert_eq!(
            tokens,
            vec![Token::Word(Word::Rem2), Token::Unknown(" it's".to_string())]
        );
    }

    #[test]
    fn test_text_preserved() {
        let s = "IF X >= 10 THEN 200 ELSE DONE";
        let (_, tokens) = lex(s);
        let joined: String = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(joined, s);
    }
}
