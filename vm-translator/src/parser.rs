//! Parser for stack-VM source text
//!
//! Each line of a `.vm` file holds one command. The parser strips
//! comments up front and turns every command into a typed [`Command`]
//! variant, so downstream code pattern-matches instead of re-splitting
//! strings, and commands only carry the fields they actually have.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The eight virtual memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Static,
    Pointer,
    Temp,
}

impl Segment {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "constant" => Some(Segment::Constant),
            "local" => Some(Segment::Local),
            "argument" => Some(Segment::Argument),
            "this" => Some(Segment::This),
            "that" => Some(Segment::That),
            "static" => Some(Segment::Static),
            "pointer" => Some(Segment::Pointer),
            "temp" => Some(Segment::Temp),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Static => "static",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// The nine arithmetic-logical opcodes.
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

impl ArithmeticOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(ArithmeticOp::Add),
            "sub" => Some(ArithmeticOp::Sub),
            "neg" => Some(ArithmeticOp::Neg),
            "eq" => Some(ArithmeticOp::Eq),
            "gt" => Some(ArithmeticOp::Gt),
            "lt" => Some(ArithmeticOp::Lt),
            "and" => Some(ArithmeticOp::And),
            "or" => Some(ArithmeticOp::Or),
            "not" => Some(ArithmeticOp::Not),
            _ => None,
        }
    }
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

/// One VM command with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arithmetic(ArithmeticOp),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Arithmetic(op) => write!(f, "{op}"),
            Command::Push { segment, index } => write!(f, "push {segment} {index}"),
            Command::Pop { segment, index } => write!(f, "pop {segment} {index}"),
            Command::Label(name) => write!(f, "label {name}"),
            Command::Goto(name) => write!(f, "goto {name}"),
            Command::IfGoto(name) => write!(f, "if-goto {name}"),
            Command::Function { name, locals } => write!(f, "function {name} {locals}"),
            Command::Call { name, args } => write!(f, "call {name} {args}"),
            Command::Return => write!(f, "return"),
        }
    }
}

/// Errors raised while reading or parsing VM source.
#[derive(Debug)]
pub enum VmError {
    Io(std::io::Error),
    UnknownCommand { line: usize, name: String },
    UnknownSegment { line: usize, name: String },
    Malformed { line: usize, text: String },
}

impl std::error::Error for VmError {}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::UnknownCommand { line, name } => {
                write!(f, "unknown command (line {line}): `{name}`")
            }
            Self::UnknownSegment { line, name } => {
                write!(f, "unknown segment (line {line}): `{name}`")
            }
            Self::Malformed { line, text } => {
                write!(f, "malformed command (line {line}): `{text}`")
            }
        }
    }
}

impl From<std::io::Error> for VmError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

/// Parser over the commands of one `.vm` file.
pub struct Parser {
    /// (source line number, cleaned command text)
    lines: Vec<(usize, String)>,
    cursor: usize,
}

impl Parser {
    pub fn new(path: &Path) -> Result<Self, VmError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut lines = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            Self::push_cleaned(&mut lines, i + 1, &line);
        }

        Ok(Parser { lines, cursor: 0 })
    }

    /// Builds a parser over in-memory source; used by tests.
    pub fn from_source(source: &str) -> Self {
        let mut lines = Vec::new();
        for (i, line) in source.lines().enumerate() {
            Self::push_cleaned(&mut lines, i + 1, line);
        }
        Parser { lines, cursor: 0 }
    }

    fn push_cleaned(lines: &mut Vec<(usize, String)>, line_no: usize, line: &str) {
        let code = match line.find("//") {
            Some(pos) => &line[..pos],
            None => line,
        };
        let trimmed = code.trim();
        if !trimmed.is_empty() {
            lines.push((line_no, trimmed.to_string()));
        }
    }

    pub fn has_more_commands(&self) -> bool {
        self.cursor < self.lines.len()
    }

    /// Parses the next command. Call only while `has_more_commands`.
    pub fn advance(&mut self) -> Result<Command, VmError> {
        let (line, text) = &self.lines[self.cursor];
        self.cursor += 1;
        Self::parse_command(*line, text)
    }

    fn parse_command(line: usize, text: &str) -> Result<Command, VmError> {
        let malformed = || VmError::Malformed {
            line,
            text: text.to_string(),
        };

        let mut parts = text.split_whitespace();
        let head = parts.next().ok_or_else(malformed)?;

        let command = if let Some(op) = ArithmeticOp::parse(head) {
            Command::Arithmetic(op)
        } else {
            match head {
                "push" | "pop" => {
                    let segment_name = parts.next().ok_or_else(malformed)?;
                    let segment =
                        Segment::parse(segment_name).ok_or_else(|| VmError::UnknownSegment {
                            line,
                            name: segment_name.to_string(),
                        })?;
                    let index: u16 = parts
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(malformed)?;

                    if head == "push" {
                        Command::Push { segment, index }
                    } else {
                        // Popping into the constant segment is meaningless.
                        if segment == Segment::Constant {
                            return Err(malformed());
                        }
                        Command::Pop { segment, index }
                    }
                }
                "label" | "goto" | "if-goto" => {
                    let name = parts.next().ok_or_else(malformed)?.to_string();
                    match head {
                        "label" => Command::Label(name),
                        "goto" => Command::Goto(name),
                        _ => Command::IfGoto(name),
                    }
                }
                "function" | "call" => {
                    let name = parts.next().ok_or_else(malformed)?.to_string();
                    let count: u16 = parts
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(malformed)?;
                    if head == "function" {
                        Command::Function {
                            name,
                            locals: count,
                        }
                    } else {
                        Command::Call { name, args: count }
                    }
                }
                "return" => Command::Return,
                _ => {
                    return Err(VmError::UnknownCommand {
                        line,
                        name: head.to_string(),
                    })
                }
            }
        };

        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(source: &str) -> Result<Vec<Command>, VmError> {
        let mut parser = Parser::from_source(source);
        let mut commands = Vec::new();
        while parser.has_more_commands() {
            commands.push(parser.advance()?);
        }
        Ok(commands)
    }

    #[test]
    fn parses_push_pop() {
        let commands = parse_all("push constant 7\npop local 2\n").unwrap();
        assert_eq!(
            commands,
            [
                Command::Push {
                    segment: Segment::Constant,
                    index: 7
                },
                Command::Pop {
                    segment: Segment::Local,
                    index: 2
                },
            ]
        );
    }

    #[test]
    fn parses_arithmetic() {
        let commands = parse_all("add\nsub\nneg\neq\ngt\nlt\nand\nor\nnot\n").unwrap();
        assert_eq!(commands.len(), 9);
        assert_eq!(commands[0], Command::Arithmetic(ArithmeticOp::Add));
        assert_eq!(commands[8], Command::Arithmetic(ArithmeticOp::Not));
    }

    #[test]
    fn parses_flow_and_functions() {
        let commands =
            parse_all("label LOOP\ngoto LOOP\nif-goto END\nfunction Main.run 2\ncall Main.run 0\nreturn\n")
                .unwrap();
        assert_eq!(commands[0], Command::Label("LOOP".to_string()));
        assert_eq!(commands[1], Command::Goto("LOOP".to_string()));
        assert_eq!(commands[2], Command::IfGoto("END".to_string()));
        assert_eq!(
            commands[3],
            Command::Function {
                name: "Main.run".to_string(),
                locals: 2
            }
        );
        assert_eq!(
            commands[4],
            Command::Call {
                name: "Main.run".to_string(),
                args: 0
            }
        );
        assert_eq!(commands[5], Command::Return);
    }

    #[test]
    fn return_carries_no_fields() {
        // A trailing operand on `return` is an error, never silently
        // inherited state from an earlier command.
        let commands = parse_all("push constant 3\nreturn\n").unwrap();
        assert_eq!(commands[1], Command::Return);
        assert!(parse_all("return 3\n").is_err());
    }

    #[test]
    fn skips_comments_and_blanks() {
        let commands = parse_all("// header\n\n  push constant 1 // inline\n").unwrap();
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_all("frobnicate\n"),
            Err(VmError::UnknownCommand { line: 1, .. })
        ));
        assert!(matches!(
            parse_all("push heap 0\n"),
            Err(VmError::UnknownSegment { line: 1, .. })
        ));
        assert!(matches!(
            parse_all("push constant\n"),
            Err(VmError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_all("push constant x\n"),
            Err(VmError::Malformed { .. })
        ));
        assert!(matches!(
            parse_all("pop constant 0\n"),
            Err(VmError::Malformed { .. })
        ));
    }

    #[test]
    fn reports_source_lines() {
        let err = parse_all("push constant 1\n// gap\n\nbogus\n").unwrap_err();
        match err {
            VmError::UnknownCommand { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other}"),
        }
    }
}
