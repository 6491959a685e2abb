use super::{Address, Opcode, Program, Stack, Target, Val};
use crate::error;
use crate::lang::{Error, LineNumber};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Linked executable
///
/// Every statement fragment concatenated into one stream. Branch targets
/// stay symbolic and resolve through `lines` and `labels`.

#[derive(Debug, Clone)]
pub struct Executable {
    pub(super) code: Vec<Opcode>,
    pub(super) lines: BTreeMap<LineNumber, Address>,
    pub(super) labels: HashMap<Rc<str>, Address>,
    pub(super) owner: Rc<str>,
    pub(super) pc: Address,
    pub(super) registers: Registers,
    pub(super) stack: Stack<Val>,
    pub(super) running: bool,
    pub(super) debugger: bool,
    pub(super) stripped: bool,
    pub(super) assembled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registers {
    /// Value of a `RETURN expr` from a function program.
    pub result: Option<Val>,
    /// Code of the last trapped error.
    pub error: i32,
}

impl Executable {
    pub fn new(owner: Rc<str>) -> Executable {
        Executable {
            code: vec![],
            lines: BTreeMap::new(),
            labels: HashMap::new(),
            owner,
            pc: 0,
            registers: Registers::default(),
            stack: Stack::new("EXPRESSION TOO COMPLEX"),
            running: false,
            debugger: false,
            stripped: false,
            assembled: false,
        }
    }

    pub fn code(&self) -> &[Opcode] {
        &self.code
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn stack(&self) -> &Stack<Val> {
        &self.stack
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    pub fn resolve(&self, target: &Target) -> Result<Address> {
        match target {
            Target::Line(n) => match self.lines.get(n) {
                Some(addr) => Ok(*addr),
                None => Err(error!(UndefinedLine; n.to_string())),
            },
            Target::Label(s) => match self.labels.get(s) {
                Some(addr) => Ok(*addr),
                None => Err(error!(UndefinedLabel; s)),
            },
        }
    }

    pub fn address_of_line(&self, line: LineNumber) -> Option<Address> {
        self.lines.get(&line).copied()
    }

    pub fn line_number_for(&self, op_addr: Address) -> Option<LineNumber> {
        for (line_number, symbol_addr) in self.lines.iter().rev() {
            if op_addr >= *symbol_addr {
                return Some(*line_number);
            }
        }
        None
    }

    /// One line of assembly: a `.LINE n` or `.LABEL name` directive,
    /// or an opcode.
    pub fn assemble(&mut self, asm: &str) -> Result<()> {
        let asm = asm.trim();
        if let Some(n) = asm.strip_prefix(".LINE ") {
            let n = match n.trim().parse::<LineNumber>() {
                Ok(n) => n,
                Err(_) => return Err(error!(SyntaxError; "INVALID LINE DIRECTIVE")),
            };
            self.lines.insert(n, self.code.len());
        } else if let Some(label) = asm.strip_prefix(".LABEL ") {
            self.labels.insert(label.trim().into(), self.code.len());
        } else {
            let op: Opcode = asm.parse()?;
            self.code.push(op);
        }
        Ok(())
    }

    pub fn disassemble(&self) -> Vec<String> {
        let mut labels: Vec<(&Address, &Rc<str>)> =
            self.labels.iter().map(|(k, v)| (v, k)).collect();
        labels.sort();
        let mut lines = self.lines.iter().peekable();
        let mut labels = labels.into_iter().peekable();
        let mut asm = vec![];
        for addr in 0..=self.code.len() {
            while let Some((n, _)) = lines.next_if(|(_, a)| **a == addr) {
                asm.push(format!(".LINE {}", n));
            }
            while let Some((_, s)) = labels.next_if(|(a, _)| **a == addr) {
                asm.push(format!(".LABEL {}", s));
            }
            if let Some(op) = self.code.get(addr) {
                asm.push(op.to_string());
            }
        }
        asm
    }

    fn targets(&self) -> impl Iterator<Item = (Address, &Target)> {
        self.code.iter().enumerate().filter_map(|(addr, op)| match op {
            Opcode::Goto(t) | Opcode::JumpIf(t) | Opcode::Gosub(t) => Some((addr, t)),
            Opcode::Restore(Some(t)) | Opcode::OnError(Some(t)) => Some((addr, t)),
            _ => None,
        })
    }
}

impl Program {
    /// Concatenate statement fragments into the executable. With `strip`
    /// set, line markers are left out.
    pub fn link(&mut self, strip: bool) -> Result<()> {
        if let Some(exe) = &self.executable {
            if self.protected {
                return Ok(());
            }
            if exe.running {
                return Err(error!(EditWhileRunning));
            }
        }
        self.unlink();
        let mut exe = Executable::new(self.qualified_name());
        exe.stripped = strip;
        for statement in self.statements.iter_mut() {
            let number = statement.number;
            if statement.fragment.is_none() {
                statement
                    .compile()
                    .map_err(|e| error!(LinkFailed, number).caused_by(e))?;
            }
            let fragment = statement.fragment.as_deref().unwrap_or_default();
            exe.lines.insert(number, exe.code.len());
            if let Some(label) = &statement.label {
                exe.labels.insert(label.clone(), exe.code.len());
            }
            if !strip && !statement.empty && statement.declaration.is_none() {
                exe.code.push(Opcode::Line(number));
            }
            exe.code.extend(fragment.iter().cloned());
        }
        let failure = exe
            .targets()
            .find_map(|(addr, target)| exe.resolve(target).err().map(|e| (addr, e)));
        if let Some((addr, error)) = failure {
            let line = exe.line_number_for(addr);
            let error = error.or_in_line_number(line);
            return Err(error!(LinkFailed).or_in_line_number(line).caused_by(error));
        }
        debug!(
            "linked {}: {} opcodes, {} lines",
            exe.owner,
            exe.code.len(),
            exe.lines.len()
        );
        self.executable = Some(exe);
        self.hoist();
        Ok(())
    }

    /// Discard the executable and everything derived from it. Source
    /// statements are kept. The executable of a protected or running
    /// program stays.
    pub fn unlink(&mut self) {
        if self.protected || matches!(&self.executable, Some(exe) if exe.running) {
            return;
        }
        if self.executable.take().is_some() {
            debug!("unlinked {}", self.qualified_name());
        }
        for statement in self.statements.iter_mut() {
            statement.fragment = None;
        }
        self.local_functions.clear();
        self.data = None;
        self.data_cursor = 0;
        self.data_end = false;
        self.loops.clear();
        self.gosubs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(lines: &[&str]) -> Program {
        let mut p = Program::new("LINKED");
        for line in lines {
            p.append(line).unwrap();
        }
        p
    }

    #[test]
    fn test_link_and_resolve() {
        let mut p = program(&["10 REM", "20 TOP: PRINT 1", "30 GOTO TOP"]);
        p.link(false).unwrap();
        let exe = p.executable().unwrap();
        assert_eq!(exe.resolve(&Target::Line(10)), Ok(0));
        assert_eq!(exe.resolve(&Target::Line(20)), Ok(0));
        assert_eq!(exe.resolve(&Target::Label("TOP".into())), Ok(0));
        assert_eq!(exe.line_number_for(3), Some(20));
        assert_eq!(exe.line_number_for(4), Some(30));
        assert_eq!(exe.code()[0], Opcode::Line(20));
    }

    #[test]
    fn test_strip() {
        let mut p = program(&["10 PRINT 1", "20 GOTO 10"]);
        p.link(true).unwrap();
        let exe = p.executable().unwrap();
        assert!(exe.code().iter().all(|op| !matches!(op, Opcode::Line(_))));
        assert_eq!(exe.resolve(&Target::Line(20)), Ok(3));
    }

    #[test]
    fn test_link_failure_leaves_unlinked() {
        let mut p = program(&["10 GOTO 99"]);
        let e = p.link(false).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::LinkFailed);
        assert_eq!(e.line_number(), Some(10));
        assert_eq!(
            e.cause().map(|c| c.code()),
            Some(crate::lang::ErrorCode::UndefinedLine)
        );
        assert!(!p.is_linked());
        p.insert(99, "END").unwrap();
        assert!(p.link(false).is_ok());
    }

    #[test]
    fn test_syntax_error_fails_link() {
        let mut p = program(&["10 PRINT (", "20 END"]);
        let e = p.link(false).unwrap_err();
        assert_eq!(e.code(), crate::lang::ErrorCode::LinkFailed);
        assert_eq!(
            e.cause().map(|c| c.code()),
            Some(crate::lang::ErrorCode::SyntaxError)
        );
    }

    #[test]
    fn test_assemble_round_trip() {
        let mut p = program(&["10 PRINT 1", "20 DONE: END"]);
        p.link(false).unwrap();
        let asm = p.executable().unwrap().disassemble();
        let mut exe = Executable::new("COPY".into());
        for line in &asm {
            exe.assemble(line).unwrap();
        }
        assert_eq!(exe.disassemble(), asm);
        assert_eq!(exe.resolve(&Target::Label("DONE".into())), Ok(4));
    }
}
