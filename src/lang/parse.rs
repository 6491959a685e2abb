use super::{ast::*, token::*, Error, LineNumber};
use crate::error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

pub fn parse(line_number: Option<LineNumber>, tokens: &[Token]) -> Result<Parsed> {
    Parser::parse(tokens).map_err(|e| e.or_in_line_number(line_number))
}

struct Parser<'a> {
    token_stream: std::iter::Enumerate<std::slice::Iter<'a, Token>>,
    peeked: Option<(usize, &'a Token)>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Token]) -> Result<Parsed> {
        let mut parse = Parser {
            token_stream: tokens.iter().enumerate(),
            peeked: None,
            index: 0,
        };
        let label = parse.label();
        if parse.peek().is_none() {
            return Ok(Parsed {
                label,
                statement: None,
            });
        }
        let statement = parse.statement()?;
        if parse.next().is_some() {
            return Err(error!(SyntaxError; "UNEXPECTED TOKEN"));
        }
        Ok(Parsed {
            label,
            statement: Some(statement),
        })
    }

    fn next(&mut self) -> Option<&'a Token> {
        if let Some((index, token)) = self.peeked.take() {
            self.index = index;
            return Some(token);
        }
        loop {
            let (index, t) = self.token_stream.next()?;
            if let Token::Whitespace(_) = t {
                continue;
            }
            self.index = index;
            return Some(t);
        }
    }

    fn peek(&mut self) -> Option<&'a Token> {
        if self.peeked.is_none() {
            let index = self.index;
            if let Some(t) = self.next() {
                self.peeked = Some((self.index, t));
            }
            self.index = index;
        }
        self.peeked.map(|(_, t)| t)
    }

    fn label(&mut self) -> Option<Rc<str>> {
        let mut look = self.token_stream.clone().filter(|(_, t)| !t.is_whitespace());
        if let (Some((_, Token::Ident(name))), Some((_, Token::Colon))) = (look.next(), look.next())
        {
            self.next();
            self.next();
            return Some(name.as_str().into());
        }
        None
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.peek() {
            Some(Token::Ident(_)) => Statement::r#let(self),
            Some(Token::Word(word)) => {
                self.next();
                Statement::for_word(self, *word)
            }
            _ => Err(error!(SyntaxError; "EXPECTED STATEMENT")),
        }
    }

    fn expression(&mut self) -> Result<Expression> {
        fn binary(
            this: &mut Parser,
            next: fn(&mut Parser) -> Result<Expression>,
            ops: &[(Operator, BinaryOp)],
        ) -> Result<Expression> {
            let mut lhs = next(this)?;
            'outer: loop {
                if let Some(Token::Operator(op)) = this.peek() {
                    for (token_op, binary_op) in ops {
                        if op == token_op {
                            this.next();
                            let rhs = next(this)?;
                            lhs = Expression::Binary(*binary_op, Box::new(lhs), Box::new(rhs));
                            continue 'outer;
                        }
                    }
                }
                return Ok(lhs);
            }
        }
        fn or(this: &mut Parser) -> Result<Expression> {
            binary(this, and, &[(Operator::Or, BinaryOp::Or)])
        }
        fn and(this: &mut Parser) -> Result<Expression> {
            binary(this, not, &[(Operator::And, BinaryOp::And)])
        }
        fn not(this: &mut Parser) -> Result<Expression> {
            if let Some(Token::Operator(Operator::Not)) = this.peek() {
                this.next();
                return Ok(Expression::Not(Box::new(not(this)?)));
            }
            comparison(this)
        }
        fn comparison(this: &mut Parser) -> Result<Expression> {
            use Operator::*;
            binary(
                this,
                additive,
                &[
                    (Equal, BinaryOp::Eq),
                    (NotEqual, BinaryOp::NotEq),
                    (Less, BinaryOp::Lt),
                    (LessEqual, BinaryOp::LtEq),
                    (Greater, BinaryOp::Gt),
                    (GreaterEqual, BinaryOp::GtEq),
                ],
            )
        }
        fn additive(this: &mut Parser) -> Result<Expression> {
            binary(
                this,
                multiplicative,
                &[(Operator::Plus, BinaryOp::Add), (Operator::Minus, BinaryOp::Sub)],
            )
        }
        fn multiplicative(this: &mut Parser) -> Result<Expression> {
            binary(
                this,
                unary,
                &[
                    (Operator::Multiply, BinaryOp::Mul),
                    (Operator::Divide, BinaryOp::Div),
                ],
            )
        }
        fn unary(this: &mut Parser) -> Result<Expression> {
            match this.peek() {
                Some(Token::Operator(Operator::Minus)) => {
                    this.next();
                    Ok(Expression::Negation(Box::new(unary(this)?)))
                }
                Some(Token::Operator(Operator::Plus)) => {
                    this.next();
                    unary(this)
                }
                _ => primary(this),
            }
        }
        fn primary(this: &mut Parser) -> Result<Expression> {
            match this.next() {
                Some(Token::LParen) => {
                    let expr = this.expression()?;
                    this.expect(Token::RParen)?;
                    Ok(expr)
                }
                Some(Token::Ident(i)) => match this.peek() {
                    Some(Token::LParen) => Ok(Expression::Call(
                        i.as_str().into(),
                        this.expression_list()?,
                    )),
                    _ => Ok(Expression::Var(i.as_str().into())),
                },
                Some(Token::Literal(l)) => Expression::for_literal(l),
                _ => Err(error!(SyntaxError; "EXPECTED EXPRESSION")),
            }
        }
        or(self)
    }

    fn expression_list(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::LParen)?;
        let mut v: Vec<Expression> = vec![];
        if let Some(Token::RParen) = self.peek() {
            self.next();
            return Ok(v);
        }
        loop {
            v.push(self.expression()?);
            match self.next() {
                Some(Token::RParen) => return Ok(v),
                Some(Token::Comma) => continue,
                _ => return Err(error!(SyntaxError; "EXPECTED END OR SEPARATOR")),
            }
        }
    }

    fn ident(&mut self) -> Result<Rc<str>> {
        match self.next() {
            Some(Token::Ident(i)) => Ok(i.as_str().into()),
            _ => Err(error!(SyntaxError; "EXPECTED IDENTIFIER")),
        }
    }

    fn ident_list(&mut self) -> Result<Vec<Rc<str>>> {
        let mut v = vec![self.ident()?];
        while let Some(Token::Comma) = self.peek() {
            self.next();
            v.push(self.ident()?);
        }
        Ok(v)
    }

    /// Optional parenthesized parameter names.
    fn params(&mut self) -> Result<Vec<Rc<str>>> {
        if let Some(Token::LParen) = self.peek() {
            self.next();
            if let Some(Token::RParen) = self.peek() {
                self.next();
                return Ok(vec![]);
            }
            let v = self.ident_list()?;
            self.expect(Token::RParen)?;
            return Ok(v);
        }
        Ok(vec![])
    }

    fn target(&mut self) -> Result<Target> {
        match self.next() {
            Some(token @ Token::Literal(Literal::Integer(_))) => {
                Ok(Target::Line(LineNumber::try_from(token)?, self.index))
            }
            Some(Token::Ident(label)) => Ok(Target::Label(label.as_str().into())),
            _ => Err(error!(SyntaxError; "EXPECTED LINE NUMBER OR LABEL")),
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if let Some(t) = self.next() {
            if *t == token {
                return Ok(());
            }
        }
        use Token::*;
        Err(error!(SyntaxError;
            match token {
                Unknown(_) | Whitespace(_) => {"UNEXPECTED TOKEN"}
                Literal(_) => {"EXPECTED LITERAL"}
                Word(_) => {"EXPECTED RESERVED WORD"}
                Operator(_) => {"EXPECTED OPERATOR"}
                Ident(_) => {"EXPECTED IDENTIFIER"}
                LParen => {"EXPECTED LEFT PARENTHESIS"}
                RParen => {"EXPECTED RIGHT PARENTHESIS"}
                Comma => {"EXPECTED COMMA"}
                Colon => {"EXPECTED COLON"}
                Semicolon => {"EXPECTED SEMICOLON"}
            }
        ))
    }
}

impl Expression {
    fn for_literal(lit: &Literal) -> Result<Expression> {
        match lit {
            Literal::Integer(s) => match s.parse() {
                Ok(n) => Ok(Expression::Integer(n)),
                Err(_) => Err(error!(Overflow)),
            },
            Literal::Double(s) => match s.parse() {
                Ok(n) => Ok(Expression::Double(n)),
                Err(_) => Err(error!(SyntaxError; "MALFORMED NUMBER")),
            },
            Literal::String(s) => Ok(Expression::String(s.as_str().into())),
        }
    }
}

impl Statement {
    fn for_word(parse: &mut Parser, word: Word) -> Result<Statement> {
        use Word::*;
        match word {
            Call => Self::r#call(parse),
            Data => Self::r#data(parse),
            Def => Self::r#def(parse),
            End => Ok(Statement::End),
            For => Self::r#for(parse),
            Function | Program | Test | Verb => Self::r#declare(parse, word),
            Gosub => Ok(Statement::Gosub(parse.target()?)),
            Goto => Ok(Statement::Goto(parse.target()?)),
            If => Self::r#if(parse),
            Let => Self::r#let(parse),
            Lock => Ok(Statement::Lock(parse.expression()?)),
            Next => Self::r#next(parse),
            On => Self::r#on(parse),
            Print1 | Print2 => Self::r#print(parse),
            Read => Ok(Statement::Read(parse.ident_list()?)),
            Rem1 | Rem2 => {
                while parse.next().is_some() {}
                Ok(Statement::Rem)
            }
            Restore => Self::r#restore(parse),
            Return => Self::r#return(parse),
            Stop => Ok(Statement::Stop),
            Unlock => Ok(Statement::Unlock(parse.expression()?)),
            Else | Word::Error | Step | Then | To => {
                Err(error!(SyntaxError; "EXPECTED STATEMENT"))
            }
        }
    }

    fn r#call(parse: &mut Parser) -> Result<Statement> {
        let name = parse.ident()?;
        let args = match parse.peek() {
            Some(Token::LParen) => parse.expression_list()?,
            _ => vec![],
        };
        Ok(Statement::Call(name, args))
    }

    fn r#data(parse: &mut Parser) -> Result<Statement> {
        let mut v = vec![parse.expression()?];
        while let Some(Token::Comma) = parse.peek() {
            parse.next();
            v.push(parse.expression()?);
        }
        Ok(Statement::Data(v))
    }

    fn r#declare(parse: &mut Parser, word: Word) -> Result<Statement> {
        let name = parse.ident()?;
        let params = parse.params()?;
        Ok(Statement::Declare(word, name, params))
    }

    fn r#def(parse: &mut Parser) -> Result<Statement> {
        let name = parse.ident()?;
        let params = parse.params()?;
        parse.expect(Token::Operator(Operator::Equal))?;
        Ok(Statement::Def(name, params, parse.expression()?))
    }

    fn r#for(parse: &mut Parser) -> Result<Statement> {
        let var = parse.ident()?;
        parse.expect(Token::Operator(Operator::Equal))?;
        let from = parse.expression()?;
        parse.expect(Token::Word(Word::To))?;
        let to = parse.expression()?;
        let step = match parse.peek() {
            Some(Token::Word(Word::Step)) => {
                parse.next();
                Some(parse.expression()?)
            }
            _ => None,
        };
        Ok(Statement::For(var, from, to, step))
    }

    fn r#if(parse: &mut Parser) -> Result<Statement> {
        let predicate = parse.expression()?;
        parse.expect(Token::Word(Word::Then))?;
        let then = parse.target()?;
        let otherwise = match parse.peek() {
            Some(Token::Word(Word::Else)) => {
                parse.next();
                Some(parse.target()?)
            }
            _ => None,
        };
        Ok(Statement::If(predicate, then, otherwise))
    }

    fn r#let(parse: &mut Parser) -> Result<Statement> {
        let ident = parse.ident()?;
        parse.expect(Token::Operator(Operator::Equal))?;
        let expr = parse.expression()?;
        Ok(Statement::Let(ident, expr))
    }

    fn r#next(parse: &mut Parser) -> Result<Statement> {
        match parse.peek() {
            None => Ok(Statement::Next(None)),
            Some(_) => Ok(Statement::Next(Some(parse.ident()?))),
        }
    }

    fn r#on(parse: &mut Parser) -> Result<Statement> {
        parse.expect(Token::Word(Word::Error))?;
        parse.expect(Token::Word(Word::Goto))?;
        match parse.target()? {
            Target::Line(0, _) => Ok(Statement::OnErrorGoto(None)),
            target => Ok(Statement::OnErrorGoto(Some(target))),
        }
    }

    fn r#print(parse: &mut Parser) -> Result<Statement> {
        let mut v: Vec<PrintItem> = vec![];
        let mut linefeed = true;
        loop {
            match parse.peek() {
                None => return Ok(Statement::Print(v, linefeed)),
                Some(Token::Semicolon) => {
                    linefeed = false;
                    parse.next();
                }
                Some(Token::Comma) => {
                    linefeed = false;
                    parse.next();
                    v.push(PrintItem::Tab);
                }
                _ => {
                    linefeed = true;
                    v.push(PrintItem::Expression(parse.expression()?));
                }
            };
        }
    }

    fn r#restore(parse: &mut Parser) -> Result<Statement> {
        match parse.peek() {
            None => Ok(Statement::Restore(None)),
            Some(_) => Ok(Statement::Restore(Some(parse.target()?))),
        }
    }

    fn r#return(parse: &mut Parser) -> Result<Statement> {
        match parse.peek() {
            None => Ok(Statement::Return(None)),
            Some(_) => Ok(Statement::Return(Some(parse.expression()?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex::*;
    use super::*;

    fn parse_str(s: &str) -> Parsed {
        let (lin, tokens) = lex(s);
        match parse(lin, &tokens) {
            Ok(p) => p,
            Err(e) => panic!("{} : {:?}", e, e),
        }
    }

    fn statement(s: &str) -> Statement {
        match parse_str(s).statement {
            Some(s) => s,
            None => panic!("no statement"),
        }
    }

    #[test]
    fn test_let() {
        assert_eq!(
            statement("letter=bar"),
            Statement::Let("LETTER".into(), Expression::Var("BAR".into()))
        );
        assert_eq!(
            statement("LET A=12"),
            Statement::Let("A".into(), Expression::Integer(12))
        );
    }

    #[test]
    fn test_precedence_and_paren() {
        use Expression::*;
        let answer = Statement::Let(
            "A".into(),
            Binary(
                BinaryOp::Sub,
                Box::new(Integer(2)),
                Box::new(Binary(
                    BinaryOp::Mul,
                    Box::new(Binary(
                        BinaryOp::Add,
                        Box::new(Integer(3)),
                        Box::new(Call("ABS".into(), vec![Double(3.5)])),
                    )),
                    Box::new(Integer(4)),
                )),
            ),
        );
        assert_eq!(statement("let A=(2-(3+abs(3.5))*4)"), answer);
    }

    #[test]
    fn test_label() {
        let p = parse_str("LOOP: PRINT");
        assert_eq!(p.label, Some("LOOP".into()));
        assert_eq!(p.statement, Some(Statement::Print(vec![], true)));
        let p = parse_str("DONE:");
        assert_eq!(p.label, Some("DONE".into()));
        assert_eq!(p.statement, None);
    }

    #[test]
    fn test_targets_carry_token_index() {
        assert_eq!(
            statement("100 GOTO 200"),
            Statement::Goto(Target::Line(200, 2))
        );
        assert_eq!(
            statement("IF X THEN 10 ELSE DONE"),
            Statement::If(
                Expression::Var("X".into()),
                Target::Line(10, 6),
                Some(Target::Label("DONE".into()))
            )
        );
    }

    #[test]
    fn test_printer_list() {
        assert_eq!(
            statement("? 1;2,"),
            Statement::Print(
                vec![
                    PrintItem::Expression(Expression::Integer(1)),
                    PrintItem::Expression(Expression::Integer(2)),
                    PrintItem::Tab,
                ],
                false
            )
        );
    }

    #[test]
    fn test_declare() {
        assert_eq!(
            statement("FUNCTION fact(n)"),
            Statement::Declare(Word::Function, "FACT".into(), vec!["N".into()])
        );
    }

    #[test]
    fn test_on_error() {
        assert_eq!(statement("ON ERROR GOTO 0"), Statement::OnErrorGoto(None));
        assert_eq!(
            statement("ON ERROR GOTO OOPS"),
            Statement::OnErrorGoto(Some(Target::Label("OOPS".into())))
        );
    }

    #[test]
    fn test_errors() {
        let (lin, tokens) = lex("10 GOTO");
        let e = parse(lin, &tokens).unwrap_err();
        assert_eq!(e.to_string(), "SYNTAX ERROR IN 10; EXPECTED LINE NUMBER OR LABEL");
        let (lin, tokens) = lex("20 PRINT 1 )");
        assert!(parse(lin, &tokens).is_err());
    }
}
