use super::{compile, Declaration, Executable, Opcode, Program, Reference};
use crate::error;
use crate::lang::{Error, Line, LineNumber, MAX_LINE_NUMBER};
use log::{debug, warn};
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Lines starting with this are raw assembly for a protected program.
pub const ASM_PREFIX: &str = "_ASM";

/// ## Source statement
///
/// The line number is the sparse key users see; the position in the
/// program's statement vector is the ordinal.

#[derive(Debug, Clone)]
pub struct Statement {
    pub(super) number: LineNumber,
    pub(super) line: Line,
    pub(super) fragment: Option<Vec<Opcode>>,
    pub(super) label: Option<Rc<str>>,
    pub(super) declaration: Option<Declaration>,
    pub(super) empty: bool,
}

impl Statement {
    pub fn new(number: LineNumber, text: &str) -> Statement {
        Statement::from_line(number, Line::statement(text))
    }

    /// Statements that fail to compile are still stored; the error
    /// surfaces again when the program is linked.
    fn from_line(number: LineNumber, line: Line) -> Statement {
        let mut statement = Statement {
            number,
            line: line.without_number(),
            fragment: None,
            label: None,
            declaration: None,
            empty: false,
        };
        if let Err(error) = statement.compile() {
            debug!("line {} stored uncompiled: {}", number, error);
        }
        statement
    }

    pub(super) fn compile(&mut self) -> Result<&[Opcode]> {
        let compiled = compile(&self.line.with_number(self.number))?;
        self.label = compiled.label;
        self.declaration = compiled.declaration;
        self.empty = compiled.is_empty;
        let code = self.fragment.insert(compiled.code);
        Ok(code.as_slice())
    }

    fn references(&self) -> Result<Vec<Reference>> {
        Ok(compile(&self.line.with_number(self.number))?.references)
    }

    pub fn number(&self) -> LineNumber {
        self.number
    }

    pub fn text(&self) -> String {
        self.line.text()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn declaration(&self) -> Option<&Declaration> {
        self.declaration.as_ref()
    }

    /// Blank, label only, or a remark.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_compiled(&self) -> bool {
        self.fragment.is_some()
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = self.text();
        if text.is_empty() {
            write!(f, "{}", self.number)
        } else {
            write!(f, "{} {}", self.number, text)
        }
    }
}

impl Program {
    /// Insert, replace, or with blank text delete the statement at `number`.
    pub fn insert(&mut self, number: LineNumber, text: &str) -> Result<()> {
        self.insert_line(number, Line::statement(text))
    }

    fn insert_line(&mut self, number: LineNumber, line: Line) -> Result<()> {
        self.check_editable()?;
        if number > MAX_LINE_NUMBER {
            return Err(error!(Overflow; "LINE NUMBER TOO LARGE"));
        }
        let position = self.statements.binary_search_by_key(&number, |s| s.number);
        if line.is_empty() {
            if let Ok(ordinal) = position {
                self.unlink();
                self.statements.remove(ordinal);
                self.modified = true;
            }
            return Ok(());
        }
        let statement = Statement::from_line(number, line);
        let ordinal = match position {
            Ok(ordinal) | Err(ordinal) => ordinal,
        };
        let ahead_of_declaration = position == Err(0)
            && matches!(self.statements.first(), Some(first) if first.declaration.is_some());
        if statement.declaration.is_some() && (ordinal != 0 || ahead_of_declaration) {
            return Err(error!(StructureError, number; "DECLARATION MUST BE FIRST"));
        }
        if statement.declaration.is_none() && ahead_of_declaration {
            return Err(error!(StructureError, number; "LINE BEFORE DECLARATION"));
        }
        if let Some(label) = &statement.label {
            let duplicate = self
                .statements
                .iter()
                .enumerate()
                .any(|(i, s)| s.label.as_ref() == Some(label) && position != Ok(i));
            if duplicate {
                return Err(error!(DuplicateLabel, number; label));
            }
        }
        self.unlink();
        if let Some(declaration) = statement.declaration.clone() {
            self.declare(&declaration);
        }
        match position {
            Ok(ordinal) => self.statements[ordinal] = statement,
            Err(ordinal) => self.statements.insert(ordinal, statement),
        }
        self.modified = true;
        Ok(())
    }

    /// Add a line after the last statement. A numbered line is inserted
    /// at its number; `_ASM` lines are assembled into the executable.
    pub fn append(&mut self, text: &str) -> Result<()> {
        if let Some(asm) = text.trim_start().strip_prefix(ASM_PREFIX) {
            return self.append_asm(asm);
        }
        let line = Line::new(text);
        let number = match line.number() {
            Some(number) => number,
            None => match self.statements.last() {
                Some(last) => last.number + 10,
                None => 10,
            },
        };
        self.insert_line(number, line)
    }

    fn append_asm(&mut self, asm: &str) -> Result<()> {
        if let Some(exe) = &self.executable {
            if exe.running {
                return Err(error!(EditWhileRunning));
            }
        }
        let assembled = matches!(&self.executable, Some(exe) if exe.assembled);
        if !assembled {
            if self.protected {
                return Err(error!(ProtectedProgram; self.qualified_name()));
            }
            if self.statements.iter().any(|s| s.declaration.is_none()) {
                return Err(error!(StructureError; "ASSEMBLY AFTER SOURCE"));
            }
            for statement in self.statements.iter_mut() {
                statement.fragment = None;
            }
            let mut exe = Executable::new(self.qualified_name());
            exe.assembled = true;
            exe.stripped = true;
            self.executable = Some(exe);
            self.protected = true;
            debug!("assembling {}", self.qualified_name());
        }
        self.local_functions.clear();
        self.data = None;
        self.modified = true;
        match self.executable.as_mut() {
            Some(exe) => exe.assemble(asm),
            None => Err(error!(InternalError; "NO EXECUTABLE")),
        }
    }

    pub fn remove(&mut self, ordinal: usize) -> Result<Statement> {
        self.check_editable()?;
        if ordinal >= self.statements.len() {
            return Err(error!(IllegalFunctionCall; "NO SUCH STATEMENT"));
        }
        self.unlink();
        self.modified = true;
        Ok(self.statements.remove(ordinal))
    }

    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.statements
            .iter()
            .position(|s| s.label.as_deref() == Some(label))
    }

    pub fn find_line_number(&self, number: LineNumber) -> Option<usize> {
        self.statements
            .binary_search_by_key(&number, |s| s.number)
            .ok()
    }

    /// Ordinal of the first statement at or after `number` that has code.
    pub fn find_executable_line(&self, number: LineNumber) -> Option<usize> {
        let start = match self.statements.binary_search_by_key(&number, |s| s.number) {
            Ok(ordinal) | Err(ordinal) => ordinal,
        };
        (start..self.statements.len()).find(|&i| !self.statements[i].empty)
    }

    /// Renumber every statement and rewrite line references to match.
    /// Nothing changes unless the whole operation succeeds.
    pub fn renumber(&mut self, start: LineNumber, increment: LineNumber) -> Result<()> {
        self.check_editable()?;
        if increment == 0 {
            return Err(error!(IllegalFunctionCall; "ZERO INCREMENT"));
        }
        let mut references: Vec<Vec<Reference>> = Vec::with_capacity(self.statements.len());
        for statement in &self.statements {
            references.push(statement.references()?);
        }
        let broken: Vec<String> = self
            .statements
            .iter()
            .zip(references.iter())
            .filter(|(_, refs)| {
                refs.iter()
                    .any(|r| self.find_line_number(r.line).is_none())
            })
            .map(|(s, _)| s.number.to_string())
            .collect();
        if !broken.is_empty() {
            let broken = broken.join(", ");
            warn!("renumber of {} aborted, broken references in {}", self.name, broken);
            return Err(error!(UndefinedLine; format!("REFERENCED IN {}", broken)));
        }
        let mut changes: HashMap<LineNumber, LineNumber> = HashMap::new();
        let mut number = Some(start);
        for statement in &self.statements {
            match number {
                Some(n) if n <= MAX_LINE_NUMBER => {
                    changes.insert(statement.number, n);
                    number = n.checked_add(increment);
                }
                _ => return Err(error!(Overflow; "LINE NUMBER TOO LARGE")),
            }
        }
        let mut renumbered = Vec::with_capacity(self.statements.len());
        for (statement, refs) in self.statements.iter().zip(references) {
            let patches: Vec<(usize, LineNumber)> = refs
                .iter()
                .filter_map(|r| changes.get(&r.line).map(|n| (r.token, *n)))
                .collect();
            let number = match changes.get(&statement.number) {
                Some(n) => *n,
                None => return Err(error!(InternalError; "RENUMBER")),
            };
            let mut statement = Statement {
                number,
                line: statement.line.renum(&patches),
                fragment: None,
                label: None,
                declaration: None,
                empty: false,
            };
            statement.compile()?;
            renumbered.push(statement);
        }
        self.unlink();
        self.statements = renumbered;
        self.modified = true;
        debug!("renumbered {} from {} by {}", self.name, start, increment);
        Ok(())
    }

    /// Drop trailing statements that have no code.
    pub fn trim(&mut self) -> Result<()> {
        self.check_editable()?;
        let keep = self
            .statements
            .iter()
            .rposition(|s| !s.empty || s.declaration.is_some())
            .map_or(0, |i| i + 1);
        if keep < self.statements.len() {
            self.unlink();
            self.statements.truncate(keep);
            self.modified = true;
        }
        Ok(())
    }

    /// Persisted text form. Protected programs list their declaration
    /// followed by the disassembled executable.
    pub fn listing(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        if self.protected {
            if let Some(exe) = &self.executable {
                lines.extend(
                    exe.disassemble()
                        .into_iter()
                        .map(|asm| format!("{} {}", ASM_PREFIX, asm)),
                );
            }
        }
        lines
    }

    /// Load the persisted text form. A trailing `\` joins the next line.
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let mut pending = String::new();
        for line in text.lines() {
            if let Some(part) = line.strip_suffix('\\') {
                pending.push_str(part);
                continue;
            }
            pending.push_str(line);
            if !pending.trim().is_empty() {
                self.append(&pending)?;
            }
            pending.clear();
        }
        if !pending.trim().is_empty() {
            self.append(&pending)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(lines: &[&str]) -> Program {
        let mut p = Program::new("TEST");
        for line in lines {
            p.append(line).unwrap();
        }
        p
    }

    fn numbers(p: &Program) -> Vec<LineNumber> {
        p.statements().iter().map(|s| s.number()).collect()
    }

    #[test]
    fn test_append_numbers() {
        let p = program(&["PRINT 1", "35 PRINT 2", "PRINT 3"]);
        assert_eq!(numbers(&p), [10, 35, 45]);
    }

    #[test]
    fn test_insert_replace_delete() {
        let mut p = program(&["10 PRINT 1", "20 PRINT 2", "30 PRINT 3"]);
        p.insert(15, "PRINT 15").unwrap();
        assert_eq!(numbers(&p), [10, 15, 20, 30]);
        p.insert(20, "PRINT 20").unwrap();
        assert_eq!(p.statements()[2].text(), "PRINT 20");
        p.insert(15, "").unwrap();
        assert_eq!(numbers(&p), [10, 20, 30]);
        p.insert(99, "").unwrap();
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_find_executable_line() {
        let p = program(&["10 REM", "20 REM X", "30 TOP:", "40 PRINT 1"]);
        assert_eq!(p.find_executable_line(10), Some(3));
        assert_eq!(p.find_executable_line(41), None);
        assert_eq!(p.find_label("TOP"), Some(2));
        assert_eq!(p.find_line_number(20), Some(1));
        assert_eq!(p.find_line_number(25), None);
    }

    #[test]
    fn test_trim() {
        let mut p = program(&["10 PRINT 1", "20 REM", "30 DONE:"]);
        p.trim().unwrap();
        assert_eq!(numbers(&p), [10]);
    }

    #[test]
    fn test_load_continuation() {
        let mut p = Program::new("X");
        p.load_str("PROGRAM LOADED\n20 PRINT \\\n\"A\"\n\n30 END\n")
            .unwrap();
        assert_eq!(p.name(), "LOADED");
        assert_eq!(p.statements()[1].text(), "PRINT \"A\"");
        assert_eq!(numbers(&p), [10, 20, 30]);
    }
}
