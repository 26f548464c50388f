//! VM command emission
//!
//! A thin textual emitter for the stack-VM instruction set. The
//! compilation engine is responsible for ordering; nothing is validated
//! here.

use std::fmt;
use std::io::Write;

/// The eight VM memory segments, by their output spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// The nine arithmetic-logical VM opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        };
        f.write_str(name)
    }
}

pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        VmWriter { out }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        writeln!(self.out, "push {segment} {index}")
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        writeln!(self.out, "pop {segment} {index}")
    }

    pub fn write_arithmetic(&mut self, op: ArithmeticOp) -> std::io::Result<()> {
        writeln!(self.out, "{op}")
    }

    pub fn write_label(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.out, "label {label}")
    }

    pub fn write_goto(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.out, "goto {label}")
    }

    pub fn write_if(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.out, "if-goto {label}")
    }

    pub fn write_call(&mut self, name: &str, args: u16) -> std::io::Result<()> {
        writeln!(self.out, "call {name} {args}")
    }

    pub fn write_function(&mut self, name: &str, locals: u16) -> std::io::Result<()> {
        writeln!(self.out, "function {name} {locals}")
    }

    pub fn write_return(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "return")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}
