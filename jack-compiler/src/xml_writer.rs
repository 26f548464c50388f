//! Syntax-tree XML rendering
//!
//! The compilation engine mirrors its parse into an XML document: one
//! element per grammar production, one leaf per token, two-space
//! indentation per nesting level.

use std::io::Write;

/// Replaces the XML-sensitive characters in a leaf value.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub struct XmlWriter<W: Write> {
    out: W,
    depth: usize,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        XmlWriter { out, depth: 0 }
    }

    fn indent(&mut self) -> std::io::Result<()> {
        for _ in 0..self.depth {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    /// Opens a production element and indents its children.
    pub fn open(&mut self, tag: &str) -> std::io::Result<()> {
        self.indent()?;
        writeln!(self.out, "<{tag}>")?;
        self.depth += 1;
        Ok(())
    }

    pub fn close(&mut self, tag: &str) -> std::io::Result<()> {
        self.depth -= 1;
        self.indent()?;
        writeln!(self.out, "</{tag}>")
    }

    /// Writes a single-token element: `<tag> value </tag>`.
    pub fn leaf(&mut self, tag: &str, value: &str) -> std::io::Result<()> {
        self.indent()?;
        writeln!(self.out, "<{tag}> {} </{tag}>", escape(value))
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}
