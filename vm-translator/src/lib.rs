//! VM translator
//!
//! Translates stack-VM code into Hack assembly.
//!
//! A [`Parser`] turns each source line into a typed [`Command`]; a
//! [`CodeWriter`] turns commands into assembly. One writer serves a whole
//! run so its label counters stay unique across every input file.
//!
//! # Example
//!
//! ```rust
//! use vm_translator::{CodeWriter, Parser, translate_file};
//!
//! let mut parser = Parser::from_source("push constant 7\npush constant 8\nadd\n");
//! let mut writer = CodeWriter::new(Vec::new());
//! translate_file(&mut parser, &mut writer).unwrap();
//! ```

pub mod code_writer;
pub mod parser;

pub use code_writer::CodeWriter;
pub use parser::{ArithmeticOp, Command, Parser, Segment, VmError};

use std::io::Write;

/// Translates every command of one parsed input file.
pub fn translate_file<W: Write>(
    parser: &mut Parser,
    writer: &mut CodeWriter<W>,
) -> Result<(), VmError> {
    while parser.has_more_commands() {
        let command = parser.advance()?;
        writer.write_command(&command)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_a_full_file() {
        let mut parser = Parser::from_source(
            "push constant 7\n\
             push constant 8\n\
             add\n",
        );
        let mut writer = CodeWriter::new(Vec::new());
        translate_file(&mut parser, &mut writer).unwrap();
    }

    #[test]
    fn parse_errors_stop_translation() {
        let mut parser = Parser::from_source("push constant 1\nbogus\n");
        let mut writer = CodeWriter::new(Vec::new());
        assert!(translate_file(&mut parser, &mut writer).is_err());
    }
}
