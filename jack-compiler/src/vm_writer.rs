//! Thin textual VM-command emitter.
//!
//! One method per VM command; no buffering logic beyond what
//! `BufWriter` already provides. Label-bearing commands uppercase their
//! label, matching the convention the rest of this toolchain's labels
//! follow.

use std::fs::File;
use std::io::{BufWriter, Write};

pub struct VmWriter {
    output: BufWriter<File>,
}

impl VmWriter {
    pub fn new(path: &str) -> Result<Self, std::io::Error> {
        let file = File::create(path)?;
        Ok(Self {
            output: BufWriter::new(file),
        })
    }

    pub fn write_push(&mut self, segment: &str, index: u16) -> Result<(), std::io::Error> {
        writeln!(self.output, "push {segment} {index}")
    }

    pub fn write_pop(&mut self, segment: &str, index: u16) -> Result<(), std::io::Error> {
        writeln!(self.output, "pop {segment} {index}")
    }

    /// Translates a Jack operator symbol into its VM arithmetic command.
    /// `unary_minus` selects `neg` instead of `sub` for a unary `-`.
    pub fn write_arithmetic(&mut self, op: char, unary_minus: bool) -> Result<(), std::io::Error> {
        let command = match (op, unary_minus) {
            ('+', _) => "add",
            ('-', true) => "neg",
            ('-', false) => "sub",
            ('&', _) => "and",
            ('|', _) => "or",
            ('<', _) => "lt",
            ('>', _) => "gt",
            ('=', _) => "eq",
            ('~', _) => "not",
            _ => panic!("unknown arithmetic operator `{op}`"),
        };
        writeln!(self.output, "{command}")
    }

    pub fn write_label(&mut self, label: &str) -> Result<(), std::io::Error> {
        writeln!(self.output, "label {}", label.to_ascii_uppercase())
    }

    pub fn write_goto(&mut self, label: &str) -> Result<(), std::io::Error> {
        writeln!(self.output, "goto {}", label.to_ascii_uppercase())
    }

    pub fn write_if(&mut self, label: &str) -> Result<(), std::io::Error> {
        writeln!(self.output, "if-goto {}", label.to_ascii_uppercase())
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> Result<(), std::io::Error> {
        writeln!(self.output, "call {name} {n_args}")
    }

    pub fn write_function(&mut self, name: &str, n_vars: u16) -> Result<(), std::io::Error> {
        writeln!(self.output, "function {name} {n_vars}")
    }

    pub fn write_return(&mut self) -> Result<(), std::io::Error> {
        writeln!(self.output, "return")
    }

    pub fn close(&mut self) -> Result<(), std::io::Error> {
        self.output.flush()
    }
}
