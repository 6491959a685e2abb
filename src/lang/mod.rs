/*!
# Rust Language Module

This Rust module provides lexical analysis and parsing of the BASIC language.

*/

#[macro_use]
mod error;
mod lex;
mod line;
mod parse;

pub mod ast;
pub mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::lex;
pub use line::Line;
pub use parse::parse;

#[cfg(test)]
mod tests;

/// User-visible statement key. Sparse, strictly ascending within a program.
pub type LineNumber = u32;

pub const MAX_LINE_NUMBER: LineNumber = 65529;
