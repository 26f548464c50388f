//! Jack compiler
//!
//! Compiles the Jack language to stack-VM code, emitting an XML rendering
//! of the parse alongside.
//!
//! # Architecture
//!
//! - [`tokenizer`]: character stream to tokens, one token of lookahead
//! - [`symbol_table`]: class and subroutine scopes with running indices
//! - [`vm_writer`]: textual VM command emission
//! - [`xml_writer`]: indented syntax-tree rendering
//! - [`engine`]: recursive-descent parser driving both writers
//!
//! # Example
//!
//! ```rust
//! use jack_compiler::compile;
//!
//! let (vm, xml) = compile("class Main { function int one() { return 1; } }").unwrap();
//! assert!(vm.starts_with("function Main.one 0\n"));
//! assert!(xml.starts_with("<class>\n"));
//! ```

pub mod engine;
pub mod error;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;
pub mod xml_writer;

pub use engine::CompilationEngine;
pub use error::JackError;
pub use symbol_table::{Kind, SymbolRecord, SymbolTable};
pub use tokenizer::{Keyword, Token, Tokenizer};
pub use vm_writer::{ArithmeticOp, Segment, VmWriter};
pub use xml_writer::XmlWriter;

/// Compiles one class from in-memory source, returning the VM code and
/// the XML rendering.
pub fn compile(source: &str) -> Result<(String, String), JackError> {
    let mut vm_out = Vec::new();
    let mut xml_out = Vec::new();
    CompilationEngine::new(source, &mut vm_out, &mut xml_out)?.compile()?;

    // Both writers only ever receive valid UTF-8.
    Ok((
        String::from_utf8(vm_out).expect("VM output is UTF-8"),
        String::from_utf8(xml_out).expect("XML output is UTF-8"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_class() {
        let (vm, xml) = compile("class Empty { }").unwrap();
        assert!(vm.is_empty());
        assert_eq!(
            xml,
            "<class>\n\
             \x20 <keyword> class </keyword>\n\
             \x20 <identifier> Empty </identifier>\n\
             \x20 <symbol> { </symbol>\n\
             \x20 <symbol> } </symbol>\n\
             </class>\n"
        );
    }

    #[test]
    fn reports_error_kinds() {
        assert!(matches!(
            compile("class Main { let }"),
            Err(JackError::Syntax { .. })
        ));
        assert!(matches!(
            compile("class Main { function void f() { return \"oops; } }"),
            Err(JackError::Lexical { .. })
        ));
    }
}
