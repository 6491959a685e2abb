use super::Program;
use crate::lang::{Error, LineNumber};
use log::trace;

/// ## Debugger hook
///
/// Called by the machine before each statement of the top activation.
/// Returning an error stops the program with that error.

pub trait Debugger {
    fn statement(&mut self, program: &mut Program, line: LineNumber) -> Result<(), Error>;
}

/// Records every statement executed.
#[derive(Debug, Default)]
pub struct Tracer {
    pub lines: Vec<LineNumber>,
}

impl Tracer {
    pub fn new() -> Tracer {
        Tracer::default()
    }
}

impl Debugger for Tracer {
    fn statement(&mut self, program: &mut Program, line: LineNumber) -> Result<(), Error> {
        trace!("{} {}", program.qualified_name(), line);
        self.lines.push(line);
        Ok(())
    }
}
