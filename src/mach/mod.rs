/*!
## Rust Machine Module

This Rust module is the program store, linker and virtual machine for BASIC.

*/

pub type Address = usize;

mod catalog;
mod compile;
mod config;
mod data;
mod debug;
mod function;
mod handler;
mod hoist;
mod link;
mod listing;
mod lock;
mod opcode;
mod operation;
mod program;
mod runtime;
mod session;
mod snapshot;
mod stack;
mod val;
mod var;

pub use catalog::{Catalog, CatalogImage};
pub use compile::{compile, Compiled, Reference};
pub use config::Config;
pub use data::DataFragment;
pub use debug::{Debugger, Tracer};
pub use function::Function;
pub use handler::{Handler, HandlerStack};
pub use hoist::LocalFunction;
pub use link::{Executable, Registers};
pub use listing::{Statement, ASM_PREFIX};
pub use lock::{LockState, NamedLocks};
pub use opcode::{FnTarget, Opcode, Target};
pub use operation::Operation;
pub use program::{Declaration, LoopFrame, Program, ProgramKind};
pub use session::Session;
pub use snapshot::{Activation, Snapshot};
pub use stack::Stack;
pub use val::Val;
pub use var::Scope;

#[cfg(test)]
mod tests;
