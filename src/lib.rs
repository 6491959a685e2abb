//! # BASIC programs
//!
//! The program store, linker and re-entrant executor for a line-numbered
//! BASIC.
//!
//! A [`mach::Program`] is an editable list of numbered statements. It links
//! into an executable of opcodes, can be protected down to that executable
//! alone, and runs through a [`mach::Session`] that holds the catalog of
//! programs it may call by name.
//!
//! ```
//! use basic::mach::{Program, Scope, Session};
//!
//! let mut session = Session::default();
//! let mut program = Program::new("HELLO");
//! program.load_str("10 FOR I=1 TO 3\n20 PRINT I;\n30 NEXT I").unwrap();
//! program.run(&mut session, &mut Scope::new(), None, None).unwrap();
//! assert_eq!(session.take_output(), " 1 2 3");
//! ```
//!
//! Functions are programs too. Register one in the session's catalog and
//! any program in that session can call it, including itself.

pub mod lang;
pub mod mach;
