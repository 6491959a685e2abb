use super::Target;
use std::rc::Rc;

/// ## Error handler stack
///
/// Shared by every activation in a session. Each activation pushes a
/// marker tagged with its program name; `ON ERROR GOTO` traps sit above
/// the marker of the activation that set them.

#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    Activation(Rc<str>),
    Trap { program: Rc<str>, target: Target },
}

#[derive(Debug, Default)]
pub struct HandlerStack {
    handlers: Vec<Handler>,
}

impl HandlerStack {
    pub fn new() -> HandlerStack {
        HandlerStack::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Push an activation marker; returns the mark to pop back to.
    pub fn push(&mut self, program: Rc<str>) -> usize {
        let mark = self.handlers.len();
        self.handlers.push(Handler::Activation(program));
        mark
    }

    /// Discard the marker at `mark` and everything above it.
    pub fn pop(&mut self, mark: usize) {
        self.handlers.truncate(mark);
    }

    /// Number of activation markers.
    pub fn depth(&self) -> usize {
        self.handlers
            .iter()
            .filter(|h| matches!(h, Handler::Activation(_)))
            .count()
    }

    /// Set the trap of the innermost activation, replacing any earlier one.
    pub fn trap(&mut self, program: Rc<str>, target: Target) {
        self.clear_trap();
        self.handlers.push(Handler::Trap { program, target });
    }

    pub fn clear_trap(&mut self) {
        if let Some(Handler::Trap { .. }) = self.handlers.last() {
            self.handlers.pop();
        }
    }

    /// Whether any activation on the stack has a trap set. A non-fatal
    /// error unwinds until the nearest one catches it.
    pub fn is_trapped(&self) -> bool {
        self.handlers
            .iter()
            .any(|h| matches!(h, Handler::Trap { .. }))
    }

    /// Remove and return the trap of the innermost activation.
    pub fn take_trap(&mut self) -> Option<Target> {
        match self.handlers.last() {
            Some(Handler::Trap { .. }) => match self.handlers.pop() {
                Some(Handler::Trap { target, .. }) => Some(target),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_and_traps() {
        let mut h = HandlerStack::new();
        let outer = h.push("MAIN".into());
        h.trap("MAIN".into(), Target::Line(100));
        let inner = h.push("FUNC$F".into());
        assert_eq!(h.depth(), 2);
        assert_eq!(h.take_trap(), None);
        assert!(h.is_trapped());
        h.trap("FUNC$F".into(), Target::Line(5));
        h.trap("FUNC$F".into(), Target::Line(6));
        assert_eq!(h.len(), 4);
        h.pop(inner);
        assert_eq!(h.depth(), 1);
        assert_eq!(h.take_trap(), Some(Target::Line(100)));
        assert_eq!(h.take_trap(), None);
        assert!(!h.is_trapped());
        h.pop(outer);
        assert!(h.is_empty());
    }
}
