use super::{Catalog, Config, HandlerStack, NamedLocks, Program};
use crate::lang::Error;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_SESSION: AtomicUsize = AtomicUsize::new(1);

/// ## Session
///
/// Everything one call chain shares: settings, the error handler stack,
/// the catalog, cancellation flags and output.

pub struct Session {
    id: usize,
    pub config: Config,
    pub handlers: HandlerStack,
    pub catalog: Catalog,
    interrupt: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
    pub(super) current_program: Option<Rc<str>>,
    output: String,
    errors: Vec<Error>,
    locks: Arc<NamedLocks>,
}

impl Default for Session {
    fn default() -> Session {
        Session::new(Config::default())
    }
}

impl Session {
    pub fn new(config: Config) -> Session {
        Session::with_locks(config, Arc::new(NamedLocks::new()))
    }

    /// A session sharing a lock table with other sessions.
    pub fn with_locks(config: Config, locks: Arc<NamedLocks>) -> Session {
        Session {
            id: NEXT_SESSION.fetch_add(1, Ordering::SeqCst),
            config,
            handlers: HandlerStack::new(),
            catalog: Catalog::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            abort: Arc::new(AtomicBool::new(false)),
            current_program: None,
            output: String::new(),
            errors: vec![],
            locks,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// A program with the session's defaults.
    pub fn new_program(&self, name: &str) -> Program {
        let mut program = Program::new(name);
        program.static_types = self.config.static_types;
        program
    }

    /// Flag set from outside, for example by a Ctrl-C handler.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn set_interrupt_flag(&mut self, interrupt: Arc<AtomicBool>) {
        self.interrupt = interrupt;
    }

    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub(super) fn take_interrupt(&self) -> bool {
        self.interrupt.swap(false, Ordering::SeqCst)
    }

    pub(super) fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn locks(&self) -> &NamedLocks {
        &self.locks
    }

    pub fn current_program(&self) -> Option<&str> {
        self.current_program.as_deref()
    }

    /// Number of program activations in progress.
    pub fn depth(&self) -> usize {
        self.handlers.depth()
    }

    pub fn print(&mut self, s: &str) {
        self.output.push_str(s);
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Log a failure once. Later calls with the same error do nothing.
    pub fn report(&mut self, error: &mut Error) {
        if error.is_reported() {
            return;
        }
        log::error!("{}", error);
        error.mark_reported();
        self.errors.push(error.clone());
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(error) = self.locks.release_all(self.id) {
            log::error!("{}", error);
        }
    }
}
