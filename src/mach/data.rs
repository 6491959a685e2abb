use super::{Opcode, Operation, Program, Stack, Target, Val};
use crate::error;
use crate::lang::{Error, LineNumber};
use log::debug;

type Result<T> = std::result::Result<T, Error>;

/// ## DATA values
///
/// One entry of a DATA statement. The value is computed on first read
/// and cached.

#[derive(Debug, Clone)]
pub struct DataFragment {
    line: LineNumber,
    code: Vec<Opcode>,
    value: Option<Val>,
}

impl DataFragment {
    pub fn line(&self) -> LineNumber {
        self.line
    }

    pub fn value(&mut self) -> Result<Val> {
        if let Some(val) = &self.value {
            return Ok(val.clone());
        }
        let mut stack: Stack<Val> = Stack::new("DATA TOO COMPLEX");
        for op in &self.code {
            if !Operation::apply(op, &mut stack)? {
                return Err(error!(InternalError, self.line; "NOT A CONSTANT"));
            }
        }
        let val = stack.pop()?;
        self.value = Some(val.clone());
        Ok(val)
    }
}

impl Program {
    /// Collect the DATA fragments of the executable. Inline function
    /// bodies are skipped.
    pub fn build_data(&mut self) -> Result<()> {
        let exe = match &self.executable {
            Some(exe) => exe,
            None => return Err(error!(InternalError; "NOT LINKED")),
        };
        let mut fragments = vec![];
        let mut addr = 0;
        while addr < exe.code.len() {
            match &exe.code[addr] {
                Opcode::Data(len) => {
                    let line = exe.line_number_for(addr).unwrap_or(0);
                    let end = (addr + 1 + len).min(exe.code.len());
                    let mut item = addr + 1;
                    while item < end {
                        let item_len = match &exe.code[item] {
                            Opcode::Item(n) => *n,
                            _ => return Err(error!(InternalError, line; "MALFORMED DATA")),
                        };
                        let item_end = (item + 1 + item_len).min(end);
                        fragments.push(DataFragment {
                            line,
                            code: exe.code[item + 1..item_end].to_vec(),
                            value: None,
                        });
                        item = item_end;
                    }
                    addr = end;
                }
                Opcode::DefFn(_, _, len) => addr += 1 + len,
                _ => addr += 1,
            }
        }
        debug!("{} has {} DATA values", exe.owner, fragments.len());
        self.data = Some(fragments);
        self.data_cursor = 0;
        self.data_end = false;
        Ok(())
    }

    pub(super) fn ensure_data(&mut self) -> Result<()> {
        if self.data.is_none() {
            self.build_data()?;
        }
        Ok(())
    }

    /// Next DATA value. After the last one the end flag is set and the
    /// following read starts over at the first.
    pub fn read_data(&mut self) -> Result<Option<Val>> {
        self.ensure_data()?;
        let data = match self.data.as_mut() {
            Some(data) => data,
            None => return Ok(None),
        };
        if data.is_empty() {
            self.data_end = true;
            return Ok(None);
        }
        if self.data_end || self.data_cursor >= data.len() {
            self.data_cursor = 0;
            self.data_end = false;
        }
        let val = data[self.data_cursor].value()?;
        self.data_cursor += 1;
        if self.data_cursor >= data.len() {
            self.data_end = true;
        }
        Ok(Some(val))
    }

    pub fn is_data_end(&self) -> bool {
        self.data_end
    }

    pub fn restore_data(&mut self) {
        self.data_cursor = 0;
        self.data_end = false;
    }

    /// Position at the first fragment on or after `line`.
    pub fn seek_data_line(&mut self, line: LineNumber) -> Result<()> {
        self.ensure_data()?;
        let found = self
            .data
            .as_ref()
            .and_then(|data| data.iter().position(|f| f.line >= line));
        match found {
            Some(cursor) => {
                self.data_cursor = cursor;
                self.data_end = false;
                Ok(())
            }
            None => {
                self.data_end = true;
                Err(error!(UndefinedLine; line.to_string()))
            }
        }
    }

    /// A linked program resolves the label through its executable, which
    /// still knows it after the source is gone.
    pub fn seek_data_label(&mut self, label: &str) -> Result<()> {
        let line = match &self.executable {
            Some(exe) => exe
                .labels
                .get(label)
                .and_then(|addr| exe.line_number_for(*addr)),
            None => self.find_label(label).map(|ordinal| self.statements[ordinal].number),
        };
        let line = match line {
            Some(line) => line,
            None => {
                self.data_end = true;
                return Err(error!(UndefinedLabel; label));
            }
        };
        self.seek_data_line(line)
    }

    pub(super) fn restore_to(&mut self, target: Option<&Target>) -> Result<()> {
        match target {
            None => {
                self.restore_data();
                Ok(())
            }
            Some(Target::Line(n)) => self.seek_data_line(*n),
            Some(Target::Label(s)) => {
                let label = s.clone();
                self.seek_data_label(&label)
            }
        }
    }
}
