use super::LineNumber;

/// ## Uniform status value
///
/// Every operation in the interpreter reports failure with one of these.
/// An error carries a BASIC error code, the line it happened in, an
/// optional message, and optionally the error that caused it.

#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    line_number: Option<LineNumber>,
    message: String,
    cause: Option<Box<Error>>,
    reported: bool,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            message: String::new(),
            cause: None,
            reported: false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line_number(&self) -> Option<LineNumber> {
        self.line_number
    }

    pub fn text(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    pub fn in_line_number(mut self, line: LineNumber) -> Error {
        self.line_number = Some(line);
        self
    }

    /// Attach a line number only if the error doesn't already have one.
    pub fn or_in_line_number(mut self, line: Option<LineNumber>) -> Error {
        if self.line_number.is_none() {
            self.line_number = line;
        }
        self
    }

    pub fn message<S: AsRef<str>>(mut self, message: S) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        self.message = message.as_ref().to_string();
        self
    }

    pub fn caused_by(mut self, cause: Error) -> Error {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_reported(&self) -> bool {
        self.reported
    }

    pub fn mark_reported(&mut self) {
        self.reported = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NextWithoutFor = 1,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    OutOfData = 4,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    DivisionByZero = 11,
    TypeMismatch = 13,
    UndefinedUserFunction = 18,
    InternalError = 51,
    UndefinedLabel = 70,
    DuplicateLabel = 71,
    StructureError = 72,
    EditWhileRunning = 73,
    CallDepthExceeded = 74,
    ProtectedProgram = 75,
    LinkFailed = 76,
    Break = 77,
    Aborted = 78,
    UndefinedProgram = 79,
    ProgramBusy = 80,
    LockNotHeld = 81,
}

impl ErrorCode {
    pub fn number(self) -> u16 {
        self as u16
    }

    /// Fatal errors unwind the whole call chain; ON ERROR can't trap them.
    pub fn is_fatal(self) -> bool {
        use ErrorCode::*;
        matches!(self, CallDepthExceeded | Break | Aborted | InternalError)
    }

    fn as_str(self) -> &'static str {
        use ErrorCode::*;
        match self {
            NextWithoutFor => "NEXT WITHOUT FOR",
            SyntaxError => "SYNTAX ERROR",
            ReturnWithoutGosub => "RETURN WITHOUT GOSUB",
            OutOfData => "OUT OF DATA",
            IllegalFunctionCall => "ILLEGAL FUNCTION CALL",
            Overflow => "OVERFLOW",
            OutOfMemory => "OUT OF MEMORY",
            UndefinedLine => "UNDEFINED LINE",
            DivisionByZero => "DIVISION BY ZERO",
            TypeMismatch => "TYPE MISMATCH",
            UndefinedUserFunction => "UNDEFINED USER FUNCTION",
            InternalError => "INTERNAL ERROR",
            UndefinedLabel => "UNDEFINED LABEL",
            DuplicateLabel => "DUPLICATE LABEL",
            StructureError => "PROGRAM STRUCTURE ERROR",
            EditWhileRunning => "CAN'T EDIT WHILE RUNNING",
            CallDepthExceeded => "CALL DEPTH EXCEEDED",
            ProtectedProgram => "PROTECTED PROGRAM",
            LinkFailed => "LINK FAILED",
            Break => "BREAK",
            Aborted => "ABORTED",
            UndefinedProgram => "UNDEFINED PROGRAM",
            ProgramBusy => "PROGRAM BUSY",
            LockNotHeld => "LOCK NOT HELD",
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "Error {{ {} }} <- {:?}", self, cause),
            None => write!(f, "Error {{ {} }}", self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.code.as_str())?;
        if let Some(line_number) = self.line_number {
            write!(f, " IN {}", line_number)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(error!(UndefinedLine).to_string(), "UNDEFINED LINE");
        assert_eq!(error!(UndefinedLine, 200).to_string(), "UNDEFINED LINE IN 200");
        assert_eq!(
            error!(SyntaxError, 10; "EXPECTED EXPRESSION").to_string(),
            "SYNTAX ERROR IN 10; EXPECTED EXPRESSION"
        );
        assert_eq!(error!(Break; "CTRL-C").to_string(), "BREAK; CTRL-C");
    }

    #[test]
    fn test_cause_chain() {
        use std::error::Error as _;
        let e = error!(LinkFailed).caused_by(error!(UndefinedLine, 20; "500"));
        assert_eq!(e.cause().map(|c| c.code()), Some(ErrorCode::UndefinedLine));
        assert_eq!(
            e.source().map(|s| s.to_string()),
            Some("UNDEFINED LINE IN 20; 500".to_string())
        );
    }

    #[test]
    fn test_line_number_kept() {
        let e = error!(Overflow, 30).or_in_line_number(Some(40));
        assert_eq!(e.line_number(), Some(30));
        let e = error!(Overflow).or_in_line_number(Some(40));
        assert_eq!(e.line_number(), Some(40));
    }
}
