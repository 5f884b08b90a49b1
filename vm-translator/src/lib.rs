//! VM Translator - library
//!
//! Translates Nand2Tetris VM intermediate code into Hack assembly.
//! Exposes the parser and code writer so both the `vm-translator` binary
//! and the integration tests can drive translation directly.

pub mod code_writer;
pub mod parser;

pub use code_writer::CodeWriter;
pub use parser::{CommandType, Parser};
