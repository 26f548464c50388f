//! Hack assembler
//!
//! Translates Hack assembly language into 16-bit binary machine code.
//!
//! # Architecture
//!
//! Three modules cooperate across two passes over the source:
//! - [`parser`]: line classification and field extraction
//! - [`code`]: closed mnemonic tables and instruction encoding
//! - [`symbol_table`]: predefined symbols, labels, and variable allocation
//!
//! Pass 1 binds each `(LABEL)` declaration to the address of the next
//! real instruction. Pass 2 encodes every A- and C-instruction, handing
//! out RAM addresses (from 16 up) to variables on first reference.
//!
//! # Example
//!
//! ```rust
//! use hack_assembler::assemble;
//!
//! let binary = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();
//! assert_eq!(binary.lines().count(), 6);
//! assert_eq!(binary.lines().next(), Some("0000000000000010"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod code;
pub mod parser;
pub mod symbol_table;

pub use parser::{AsmError, CommandType, ParserLines};
pub use symbol_table::SymbolTable;

/// Highest value an A-instruction operand can encode (15 bits).
const MAX_ADDRESS: u16 = 32767;

/// First pass: bind every label declaration to the address of the next
/// real instruction. Labels emit nothing, so they do not advance the
/// instruction counter.
pub fn first_pass(lines: &[String], symbol_table: &mut SymbolTable) -> Result<(), AsmError> {
    let mut rom_address = 0u16;
    let mut parser = ParserLines::from_lines(lines);

    while parser.advance() {
        match parser.command_type()? {
            CommandType::LCommand => {
                symbol_table.bind(parser.symbol()?, rom_address);
            }
            CommandType::ACommand | CommandType::CCommand => {
                rom_address += 1;
            }
        }
    }

    Ok(())
}

/// Second pass: encode every instruction, resolving symbols and
/// allocating variables. Returns the complete `.hack` text, one
/// 16-character binary line per instruction.
pub fn second_pass(lines: &[String], symbol_table: &mut SymbolTable) -> Result<String, AsmError> {
    let mut output = String::new();
    let mut parser = ParserLines::from_lines(lines);

    while parser.advance() {
        match parser.command_type()? {
            CommandType::ACommand => {
                let symbol = parser.symbol()?;

                let address = if symbol.as_bytes()[0].is_ascii_digit() {
                    symbol
                        .parse::<u16>()
                        .ok()
                        .filter(|v| *v <= MAX_ADDRESS)
                        .ok_or_else(|| AsmError::Range {
                            line: parser.line(),
                            literal: symbol.to_string(),
                        })?
                } else {
                    symbol_table.resolve(symbol)
                };

                output.push_str(&code::encode_a_instruction(address));
                output.push('\n');
            }
            CommandType::CCommand => {
                let encoded = encode_c(&parser)?;
                output.push_str(&encoded);
                output.push('\n');
            }
            CommandType::LCommand => {}
        }
    }

    Ok(output)
}

fn encode_c(parser: &ParserLines) -> Result<String, AsmError> {
    let encoding_error = |field: &'static str, mnemonic: &str| AsmError::Encoding {
        line: parser.line(),
        field,
        mnemonic: mnemonic.to_string(),
    };

    let dest = parser.dest()?;
    let comp = parser.comp()?;
    let jump = parser.jump()?;

    let dest_bits = code::dest(dest).ok_or_else(|| encoding_error("dest", dest))?;
    let comp_bits = code::comp(comp).ok_or_else(|| encoding_error("comp", comp))?;
    let jump_bits = code::jump(jump).ok_or_else(|| encoding_error("jump", jump))?;

    Ok(format!("111{comp_bits}{dest_bits}{jump_bits}"))
}

/// Assembles a complete source text into `.hack` binary text.
pub fn assemble(source: &str) -> Result<String, AsmError> {
    let lines: Vec<String> = source.lines().map(str::to_string).collect();
    let mut symbol_table = SymbolTable::new();
    first_pass(&lines, &mut symbol_table)?;
    second_pass(&lines, &mut symbol_table)
}
