//! Parser module for Hack assembly language
//!
//! Splits cleaned source lines into instructions and their fields.
//! Comment stripping and whitespace removal happen here, so the rest of
//! the assembler only ever sees canonical instruction text.

use std::fmt;

#[derive(Debug, PartialEq, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // Command suffix is intentional and clear
pub enum CommandType {
    /// @Xxx where Xxx is either a symbol or a decimal number
    ACommand,
    /// dest=comp;jump
    CCommand,
    /// (Xxx) where Xxx is a symbol
    LCommand,
}

/// Errors raised while parsing or encoding an assembly program.
///
/// Every variant that originates from source text carries the 1-based
/// source line number, so drivers can report `file:line`.
#[derive(Debug)]
pub enum AsmError {
    Io(std::io::Error),
    InvalidState(&'static str),
    /// Malformed instruction text: bad symbol charset, empty comp field,
    /// an unclosed label declaration, and the like.
    Syntax { line: usize, text: String },
    /// A dest/comp/jump mnemonic outside the fixed encoding tables.
    Encoding {
        line: usize,
        field: &'static str,
        mnemonic: String,
    },
    /// A numeric A-instruction operand above the 15-bit limit.
    Range { line: usize, literal: String },
}

impl std::error::Error for AsmError {}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Syntax { line, text } => {
                write!(f, "syntax error (line {line}): `{text}`")
            }
            Self::Encoding {
                line,
                field,
                mnemonic,
            } => write!(f, "unknown {field} mnemonic (line {line}): `{mnemonic}`"),
            Self::Range { line, literal } => {
                write!(f, "address out of range (line {line}): `{literal}`")
            }
        }
    }
}

impl From<std::io::Error> for AsmError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

/// True for the characters that may open a symbol.
#[inline]
fn is_symbol_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'_' | b'.' | b'$' | b':')
}

/// True for the characters that may continue a symbol.
#[inline]
fn is_symbol_byte(byte: u8) -> bool {
    is_symbol_start(byte) || byte.is_ascii_digit()
}

/// Parser over the lines of one assembly file.
///
/// `advance` consumes lines until the next real instruction; the accessor
/// methods then expose its pieces. Both assembler passes create a fresh
/// parser over the same line buffer.
pub struct ParserLines<'a> {
    lines: std::slice::Iter<'a, String>,
    line_no: usize,
    current: String,
    current_command_type: Option<CommandType>,
}

impl<'a> ParserLines<'a> {
    #[must_use]
    pub fn from_lines(lines: &'a [String]) -> Self {
        Self {
            lines: lines.iter(),
            line_no: 0,
            current: String::new(),
            current_command_type: None,
        }
    }

    /// Advances to the next instruction, skipping comments and blanks.
    ///
    /// Strips a `//` comment suffix, then removes every space and tab in
    /// the line, so `D = M ; JGT` and `D=M;JGT` are the same instruction.
    pub fn advance(&mut self) -> bool {
        for line in self.lines.by_ref() {
            self.line_no += 1;

            let code = match line.find("//") {
                Some(pos) => &line[..pos],
                None => line.as_str(),
            };

            self.current.clear();
            self.current
                .extend(code.chars().filter(|c| *c != ' ' && *c != '\t'));

            if !self.current.is_empty() {
                self.current_command_type = Some(Self::classify_command(&self.current));
                return true;
            }
        }

        self.current_command_type = None;
        false
    }

    /// The 1-based source line of the current instruction.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line_no
    }

    fn classify_command(text: &str) -> CommandType {
        match text.as_bytes()[0] {
            b'@' => CommandType::ACommand,
            b'(' => CommandType::LCommand,
            _ => CommandType::CCommand,
        }
    }

    pub fn command_type(&self) -> Result<CommandType, AsmError> {
        self.current_command_type
            .ok_or(AsmError::InvalidState("no current instruction"))
    }

    fn syntax_error(&self) -> AsmError {
        AsmError::Syntax {
            line: self.line_no,
            text: self.current.clone(),
        }
    }

    /// The operand of an A-command or the name of an L-command.
    ///
    /// Numeric operands must be pure decimal; symbolic operands and label
    /// names must match `[A-Za-z_.$:][A-Za-z0-9_.$:]*`.
    pub fn symbol(&self) -> Result<&str, AsmError> {
        let raw = match self.current_command_type {
            Some(CommandType::ACommand) => &self.current[1..],
            Some(CommandType::LCommand) => {
                if !self.current.ends_with(')') || self.current.len() < 3 {
                    return Err(self.syntax_error());
                }
                &self.current[1..self.current.len() - 1]
            }
            Some(CommandType::CCommand) => {
                return Err(AsmError::InvalidState("symbol() called on a C-command"));
            }
            None => return Err(AsmError::InvalidState("no current instruction")),
        };

        let bytes = raw.as_bytes();
        let valid = match bytes.first() {
            None => false,
            Some(b) if b.is_ascii_digit() => {
                // Numeric operand; labels are never numeric.
                self.current_command_type == Some(CommandType::ACommand)
                    && bytes.iter().all(u8::is_ascii_digit)
            }
            Some(&b) => is_symbol_start(b) && bytes[1..].iter().copied().all(is_symbol_byte),
        };

        if valid { Ok(raw) } else { Err(self.syntax_error()) }
    }

    /// The dest field of a C-command; empty when no `=` is present.
    pub fn dest(&self) -> Result<&str, AsmError> {
        self.require_c_command()?;
        match self.current.find('=') {
            Some(pos) => Ok(&self.current[..pos]),
            None => Ok(""),
        }
    }

    /// The comp field of a C-command. An empty comp is a syntax error.
    pub fn comp(&self) -> Result<&str, AsmError> {
        self.require_c_command()?;
        let start = self.current.find('=').map_or(0, |pos| pos + 1);
        let end = self.current.find(';').unwrap_or(self.current.len());
        if start >= end {
            return Err(self.syntax_error());
        }
        Ok(&self.current[start..end])
    }

    /// The jump field of a C-command; empty when no `;` is present.
    pub fn jump(&self) -> Result<&str, AsmError> {
        self.require_c_command()?;
        match self.current.find(';') {
            Some(pos) => Ok(&self.current[pos + 1..]),
            None => Ok(""),
        }
    }

    fn require_c_command(&self) -> Result<(), AsmError> {
        match self.current_command_type {
            Some(CommandType::CCommand) => Ok(()),
            Some(_) => Err(AsmError::InvalidState(
                "field accessor called on a non-C command",
            )),
            None => Err(AsmError::InvalidState("no current instruction")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn classifies_commands() {
        let src = lines(&["@100", "(LOOP)", "D=M"]);
        let mut parser = ParserLines::from_lines(&src);

        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::ACommand);
        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::LCommand);
        parser.advance();
        assert_eq!(parser.command_type().unwrap(), CommandType::CCommand);
    }

    #[test]
    fn skips_comments_and_blanks() {
        let src = lines(&["// header", "", "   ", "@1 // trailing", "D=A"]);
        let mut parser = ParserLines::from_lines(&src);

        assert!(parser.advance());
        assert_eq!(parser.symbol().unwrap(), "1");
        assert_eq!(parser.line(), 4);

        assert!(parser.advance());
        assert_eq!(parser.comp().unwrap(), "A");

        assert!(!parser.advance());
    }

    #[test]
    fn strips_interior_whitespace() {
        let src = lines(&["D = M ; JGT", "M D = D + 1"]);
        let mut parser = ParserLines::from_lines(&src);

        parser.advance();
        assert_eq!(parser.dest().unwrap(), "D");
        assert_eq!(parser.comp().unwrap(), "M");
        assert_eq!(parser.jump().unwrap(), "JGT");

        parser.advance();
        assert_eq!(parser.dest().unwrap(), "MD");
        assert_eq!(parser.comp().unwrap(), "D+1");
        assert_eq!(parser.jump().unwrap(), "");
    }

    #[test]
    fn c_command_field_defaults() {
        let src = lines(&["D+1;JMP", "D=D+1"]);
        let mut parser = ParserLines::from_lines(&src);

        parser.advance();
        assert_eq!(parser.dest().unwrap(), "");
        assert_eq!(parser.comp().unwrap(), "D+1");
        assert_eq!(parser.jump().unwrap(), "JMP");

        parser.advance();
        assert_eq!(parser.dest().unwrap(), "D");
        assert_eq!(parser.jump().unwrap(), "");
    }

    #[test]
    fn label_symbols() {
        let src = lines(&["(LOOP$end.0:x)"]);
        let mut parser = ParserLines::from_lines(&src);
        parser.advance();
        assert_eq!(parser.symbol().unwrap(), "LOOP$end.0:x");
    }

    #[test]
    fn rejects_empty_comp() {
        let src = lines(&["D=;JMP"]);
        let mut parser = ParserLines::from_lines(&src);
        parser.advance();
        assert!(matches!(parser.comp(), Err(AsmError::Syntax { line: 1, .. })));
    }

    #[test]
    fn rejects_bad_symbols() {
        for bad in ["@", "@1x2", "@a-b", "(1LOOP)", "(LOOP"] {
            let src = lines(&[bad]);
            let mut parser = ParserLines::from_lines(&src);
            parser.advance();
            assert!(
                matches!(parser.symbol(), Err(AsmError::Syntax { .. })),
                "expected syntax error for `{bad}`"
            );
        }
    }

    #[test]
    fn numeric_operands_stay_numeric() {
        let src = lines(&["@32767"]);
        let mut parser = ParserLines::from_lines(&src);
        parser.advance();
        assert_eq!(parser.symbol().unwrap(), "32767");
    }
}
