use super::{Error, LineNumber, MAX_LINE_NUMBER};
use crate::error;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Unknown(String),
    Whitespace(usize),
    Literal(Literal),
    Word(Word),
    Operator(Operator),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
}

impl Token {
    pub fn from_string(s: &str) -> Option<Token> {
        if let Some(word) = Word::from_string(s) {
            return Some(Token::Word(word));
        }
        if let Some(op) = Operator::from_string(s) {
            return Some(Token::Operator(op));
        }
        match s {
            "(" => Some(Token::LParen),
            ")" => Some(Token::RParen),
            "," => Some(Token::Comma),
            ":" => Some(Token::Colon),
            ";" => Some(Token::Semicolon),
            _ => None,
        }
    }

    pub fn is_word(&self) -> bool {
        match self {
            Token::Word(_) => true,
            Token::Operator(op) => op.is_word(),
            _ => false,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Unknown(s) => write!(f, "{}", s),
            Whitespace(u) => write!(f, "{s:>w$}", s = "", w = u),
            Literal(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            Ident(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
        }
    }
}

impl TryFrom<&Token> for LineNumber {
    type Error = Error;
    fn try_from(token: &Token) -> Result<Self, Self::Error> {
        let msg = "INVALID LINE NUMBER";
        if let Token::Literal(Literal::Integer(s)) = token {
            if let Ok(line) = s.parse::<LineNumber>() {
                if line <= MAX_LINE_NUMBER {
                    return Ok(line);
                }
            }
            return Err(error!(Overflow; msg));
        }
        Err(error!(SyntaxError; msg))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(String),
    Double(String),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Literal::*;
        match self {
            Integer(s) => write!(f, "{}", s),
            Double(s) => write!(f, "{}", s),
            String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Word {
    Call,
    Data,
    Def,
    Else,
    End,
    Error,
    For,
    Function,
    Gosub,
    Goto,
    If,
    Let,
    Lock,
    Next,
    On,
    Print1,
    Print2,
    Program,
    Read,
    Rem1,
    Rem2,
    Restore,
    Return,
    Step,
    Stop,
    Test,
    Then,
    To,
    Unlock,
    Verb,
}

impl Word {
    fn from_string(s: &str) -> Option<Word> {
        use Word::*;
        Some(match s {
            "CALL" => Call,
            "DATA" => Data,
            "DEF" => Def,
            "ELSE" => Else,
            "END" => End,
            "ERROR" => Word::Error,
            "FOR" => For,
            "FUNCTION" => Function,
            "GOSUB" => Gosub,
            "GOTO" => Goto,
            "IF" => If,
            "LET" => Let,
            "LOCK" => Lock,
            "NEXT" => Next,
            "ON" => On,
            "PRINT" => Print1,
            "?" => Print2,
            "PROGRAM" => Program,
            "READ" => Read,
            "REM" => Rem1,
            "'" => Rem2,
            "RESTORE" => Restore,
            "RETURN" => Return,
            "STEP" => Step,
            "STOP" => Stop,
            "TEST" => Test,
            "THEN" => Then,
            "TO" => To,
            "UNLOCK" => Unlock,
            "VERB" => Verb,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        let s = match self {
            Call => "CALL",
            Data => "DATA",
            Def => "DEF",
            Else => "ELSE",
            End => "END",
            Word::Error => "ERROR",
            For => "FOR",
            Function => "FUNCTION",
            Gosub => "GOSUB",
            Goto => "GOTO",
            If => "IF",
            Let => "LET",
            Lock => "LOCK",
            Next => "NEXT",
            On => "ON",
            Print1 => "PRINT",
            Print2 => "?",
            Program => "PROGRAM",
            Read => "READ",
            Rem1 => "REM",
            Rem2 => "'",
            Restore => "RESTORE",
            Return => "RETURN",
            Step => "STEP",
            Stop => "STOP",
            Test => "TEST",
            Then => "THEN",
            To => "TO",
            Unlock => "UNLOCK",
            Verb => "VERB",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
}

impl Operator {
    fn from_string(s: &str) -> Option<Operator> {
        use Operator::*;
        Some(match s {
            "+" => Plus,
            "-" => Minus,
            "*" => Multiply,
            "/" => Divide,
            "=" => Equal,
            "<>" => NotEqual,
            "<" => Less,
            "<=" => LessEqual,
            ">" => Greater,
            ">=" => GreaterEqual,
            "NOT" => Not,
            "AND" => And,
            "OR" => Or,
            _ => return None,
        })
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Operator::Not | Operator::And | Operator::Or)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        let s = match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "NOT",
            And => "AND",
            Or => "OR",
        };
        write!(f, "{}", s)
    }
}
