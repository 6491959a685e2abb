use super::{Declaration, FnTarget, Function, Opcode, ProgramKind, Target, Val};
use crate::error;
use crate::lang::ast::{self, AcceptVisitor};
use crate::lang::{Error, Line, LineNumber};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Output of compiling one statement.
#[derive(Debug, Default)]
pub struct Compiled {
    pub code: Vec<Opcode>,
    pub label: Option<Rc<str>>,
    pub declaration: Option<Declaration>,
    /// Line-number operands, for renumbering.
    pub references: Vec<Reference>,
    /// Blank, label only, or a remark.
    pub is_empty: bool,
}

/// A line number written in the source and the token that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub token: usize,
    pub line: LineNumber,
}

pub fn compile(line: &Line) -> Result<Compiled> {
    let parsed = line.parse()?;
    let mut references = References::default();
    if let Some(statement) = &parsed.statement {
        statement.accept(&mut references);
    }
    let mut compiled = Compiled {
        label: parsed.label,
        references: references.0,
        is_empty: matches!(parsed.statement, None | Some(ast::Statement::Rem)),
        ..Compiled::default()
    };
    if let Some(statement) = &parsed.statement {
        let mut compiler = Compiler {
            code: &mut compiled.code,
        };
        compiled.declaration = compiler
            .statement(statement)
            .map_err(|e| e.or_in_line_number(line.number()))?;
    }
    Ok(compiled)
}

#[derive(Default)]
struct References(Vec<Reference>);

impl ast::Visitor for References {
    fn visit_target(&mut self, target: &ast::Target) {
        if let ast::Target::Line(line, token) = target {
            self.0.push(Reference {
                token: *token,
                line: *line,
            });
        }
    }
}

struct Compiler<'a> {
    code: &'a mut Vec<Opcode>,
}

impl<'a> Compiler<'a> {
    fn push(&mut self, op: Opcode) -> Result<()> {
        if self.code.len() > u16::max_value() as usize {
            return Err(error!(OutOfMemory; "COMPILED STATEMENT TOO LARGE"));
        }
        self.code.push(op);
        Ok(())
    }

    /// Compile into a fresh buffer, for blocks that carry their length.
    fn block(f: impl FnOnce(&mut Compiler) -> Result<()>) -> Result<Vec<Opcode>> {
        let mut code = vec![];
        f(&mut Compiler { code: &mut code })?;
        Ok(code)
    }

    fn expression(&mut self, expr: &ast::Expression) -> Result<()> {
        use ast::Expression;
        match expr {
            Expression::Integer(n) => self.push(Opcode::Literal(Val::Integer(*n))),
            Expression::Double(n) => self.push(Opcode::Literal(Val::Double(*n))),
            Expression::String(s) => self.push(Opcode::Literal(Val::String(s.clone()))),
            Expression::Var(name) => self.push(Opcode::Push(name.clone())),
            Expression::Call(name, args) => {
                if let Some(function) = Function::find(name) {
                    if !function.arity().contains(&args.len()) {
                        return Err(error!(SyntaxError; "WRONG NUMBER OF ARGUMENTS"));
                    }
                }
                for arg in args {
                    self.expression(arg)?;
                }
                self.push(Opcode::Fn(FnTarget::Named(name.clone()), args.len()))
            }
            Expression::Negation(expr) => {
                self.expression(expr)?;
                self.push(Opcode::Neg)
            }
            Expression::Not(expr) => {
                self.expression(expr)?;
                self.push(Opcode::Not)
            }
            Expression::Binary(op, lhs, rhs) => {
                self.expression(lhs)?;
                self.expression(rhs)?;
                use ast::BinaryOp::*;
                self.push(match op {
                    Add => Opcode::Add,
                    Sub => Opcode::Sub,
                    Mul => Opcode::Mul,
                    Div => Opcode::Div,
                    Eq => Opcode::Eq,
                    NotEq => Opcode::NotEq,
                    Lt => Opcode::Lt,
                    LtEq => Opcode::LtEq,
                    Gt => Opcode::Gt,
                    GtEq => Opcode::GtEq,
                    And => Opcode::And,
                    Or => Opcode::Or,
                })
            }
        }
    }

    fn target(target: &ast::Target) -> Target {
        match target {
            ast::Target::Line(n, _) => Target::Line(*n),
            ast::Target::Label(s) => Target::Label(s.clone()),
        }
    }

    /// Returns the declaration when the statement is a program header.
    fn statement(&mut self, statement: &ast::Statement) -> Result<Option<Declaration>> {
        use ast::Statement;
        match statement {
            Statement::Call(name, args) => {
                for arg in args {
                    self.expression(arg)?;
                }
                self.push(Opcode::Call(name.clone(), args.len()))?;
            }
            Statement::Data(items) => self.r#data(items)?,
            Statement::Declare(word, name, params) => {
                let kind = match ProgramKind::from_word(*word) {
                    Some(kind) => kind,
                    None => return Err(error!(InternalError; "NOT A DECLARATION")),
                };
                return Ok(Some(Declaration {
                    kind,
                    name: name.clone(),
                    params: params.clone(),
                }));
            }
            Statement::Def(name, params, expr) => {
                let body = Compiler::block(|c| c.expression(expr))?;
                self.push(Opcode::DefFn(name.clone(), params.clone().into(), body.len()))?;
                for op in body {
                    self.push(op)?;
                }
            }
            Statement::End => self.push(Opcode::End)?,
            Statement::For(var, from, to, step) => {
                self.expression(from)?;
                self.expression(to)?;
                match step {
                    Some(step) => self.expression(step)?,
                    None => self.push(Opcode::Literal(Val::Integer(1)))?,
                }
                self.push(Opcode::For(var.clone()))?;
            }
            Statement::Gosub(target) => self.push(Opcode::Gosub(Compiler::target(target)))?,
            Statement::Goto(target) => self.push(Opcode::Goto(Compiler::target(target)))?,
            Statement::If(predicate, then, otherwise) => {
                self.expression(predicate)?;
                self.push(Opcode::JumpIf(Compiler::target(then)))?;
                if let Some(otherwise) = otherwise {
                    self.push(Opcode::Goto(Compiler::target(otherwise)))?;
                }
            }
            Statement::Let(name, expr) => {
                self.expression(expr)?;
                self.push(Opcode::Pop(name.clone()))?;
            }
            Statement::Lock(expr) => {
                self.expression(expr)?;
                self.push(Opcode::Lock)?;
            }
            Statement::Next(var) => self.push(Opcode::Next(var.clone()))?,
            Statement::OnErrorGoto(target) => {
                self.push(Opcode::OnError(target.as_ref().map(Compiler::target)))?
            }
            Statement::Print(items, newline) => {
                for item in items {
                    match item {
                        ast::PrintItem::Expression(expr) => self.expression(expr)?,
                        ast::PrintItem::Tab => {
                            self.push(Opcode::Literal(Val::String(" ".into())))?
                        }
                    }
                    self.push(Opcode::Print)?;
                }
                if *newline {
                    self.push(Opcode::Newline)?;
                }
            }
            Statement::Read(vars) => {
                for var in vars {
                    self.push(Opcode::Read(var.clone()))?;
                }
            }
            Statement::Rem => {}
            Statement::Restore(target) => {
                self.push(Opcode::Restore(target.as_ref().map(Compiler::target)))?
            }
            Statement::Return(None) => self.push(Opcode::Return)?,
            Statement::Return(Some(expr)) => {
                self.expression(expr)?;
                self.push(Opcode::Exit)?;
            }
            Statement::Stop => self.push(Opcode::Stop)?,
            Statement::Unlock(expr) => {
                self.expression(expr)?;
                self.push(Opcode::Unlock)?;
            }
        }
        Ok(None)
    }

    fn r#data(&mut self, items: &[ast::Expression]) -> Result<()> {
        let mut block = vec![];
        for item in items {
            if !item.is_constant() {
                return Err(error!(SyntaxError; "DATA MUST BE CONSTANT"));
            }
            let code = Compiler::block(|c| c.expression(item))?;
            block.push(Opcode::Item(code.len()));
            block.extend(code);
        }
        self.push(Opcode::Data(block.len()))?;
        for op in block {
            self.push(op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Vec<String> {
        compile(&Line::new(s))
            .unwrap()
            .code
            .iter()
            .map(|op| op.to_string())
            .collect()
    }

    #[test]
    fn test_let() {
        assert_eq!(code("LET A=3*B"), ["LIT 3", "PUSH B", "MUL", "POP A"]);
    }

    #[test]
    fn test_data_block() {
        assert_eq!(
            code("DATA 1, \"TWO\", -3"),
            ["DATA 7", "ITEM 1", "LIT 1", "ITEM 1", "LIT \"TWO\"", "ITEM 2", "LIT 3", "NEG"]
        );
        let e = compile(&Line::new("10 DATA X")).unwrap_err();
        assert_eq!(e.to_string(), "SYNTAX ERROR IN 10; DATA MUST BE CONSTANT");
    }

    #[test]
    fn test_def() {
        assert_eq!(
            code("DEF FNSQ(X)=X*X"),
            ["DEFFN FNSQ 3 X", "PUSH X", "PUSH X", "MUL"]
        );
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            code("IF A THEN 100 ELSE DONE"),
            ["PUSH A", "JUMPIF 100", "GOTO @DONE"]
        );
    }

    #[test]
    fn test_references() {
        let c = compile(&Line::new("10 IF A=1 THEN 100 ELSE 200")).unwrap();
        let lines: Vec<LineNumber> = c.references.iter().map(|r| r.line).collect();
        assert_eq!(lines, [100, 200]);
        assert!(!c.is_empty);
    }

    #[test]
    fn test_declaration_and_empty() {
        let c = compile(&Line::new("FUNCTION FACT(N)")).unwrap();
        let d = c.declaration.unwrap();
        assert_eq!(d.kind, ProgramKind::Function);
        assert_eq!(&*d.name, "FACT");
        assert!(compile(&Line::new("REM nothing")).unwrap().is_empty);
        let c = compile(&Line::new("TOP:")).unwrap();
        assert!(c.is_empty);
        assert_eq!(c.label.as_deref(), Some("TOP"));
    }

    #[test]
    fn test_builtin_arity() {
        assert!(compile(&Line::new("A=ABS(1,2)")).is_err());
        assert_eq!(code("A=FACT(1,2)"), ["LIT 1", "LIT 2", "FN FACT 2", "POP A"]);
    }
}
