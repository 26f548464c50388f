//! Hack assembler - main entry point
//!
//! Two-pass assembler for the Hack assembly language.
//!
//! # Usage
//! ```bash
//! hack-assembler <input.asm> [output.hack]
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fs;
use std::io::{BufRead, BufReader};
use std::process;

use hack_assembler::{AsmError, SymbolTable, first_pass, second_pass};

/// Reads the source file into memory; both passes walk the same buffer.
fn read_lines(path: &str) -> Result<Vec<String>, AsmError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    reader
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(Into::into)
}

/// Derives the output path: `X.asm` becomes a sibling `X.hack` unless an
/// explicit output was given.
fn output_path(input: &str, explicit_output: Option<&str>) -> String {
    explicit_output.map_or_else(
        || {
            input
                .strip_suffix(".asm")
                .map_or_else(|| format!("{input}.hack"), |stem| format!("{stem}.hack"))
        },
        std::string::ToString::to_string,
    )
}

fn run(input_path: &str, explicit_output: Option<&str>) -> Result<String, AsmError> {
    let lines = read_lines(input_path)?;

    let mut symbol_table = SymbolTable::new();
    first_pass(&lines, &mut symbol_table)?;
    let binary = second_pass(&lines, &mut symbol_table)?;

    let output = output_path(input_path, explicit_output);
    fs::write(&output, binary)?;
    Ok(output)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <input.asm> [output.hack]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} Add.asm", args[0]);
        eprintln!("  {} Add.asm Add.hack", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    match run(input_path, args.get(2).map(String::as_str)) {
        Ok(output) => println!("Assembly completed. Output written to {output}"),
        Err(e) => {
            eprintln!("{input_path}: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_generation() {
        assert_eq!(output_path("test.asm", None), "test.hack");
        assert_eq!(output_path("dir/file.asm", None), "dir/file.hack");
        assert_eq!(output_path("path/to/file.asm", None), "path/to/file.hack");
        assert_eq!(output_path("noext", None), "noext.hack");
    }

    #[test]
    fn output_path_explicit() {
        assert_eq!(output_path("any.asm", Some("out.hack")), "out.hack");
        assert_eq!(
            output_path("any.asm", Some("path/to/out.hack")),
            "path/to/out.hack"
        );
    }
}
