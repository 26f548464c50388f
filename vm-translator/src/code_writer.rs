//! Hack assembly emission for VM commands
//!
//! One writer instance produces one `.asm` output, across however many
//! input files a directory run covers. The two label counters live here
//! and never reset, so every synthesized label is unique in the output.

use std::io::Write;
use std::path::Path;

use crate::parser::{ArithmeticOp, Command, Segment};

// Writes a block of fixed assembly lines.
macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

/// RAM base of the temp segment.
const TEMP_BASE: u16 = 5;
/// RAM base of the pointer segment (THIS, THAT).
const POINTER_BASE: u16 = 3;

pub struct CodeWriter<W: Write> {
    out: W,
    /// Basename of the current input file; names `static` storage.
    static_prefix: String,
    /// Name of the function being translated; scopes branch labels.
    current_function: String,
    arithmetic_num: usize,
    return_address: usize,
}

impl<W: Write> CodeWriter<W> {
    pub fn new(out: W) -> Self {
        CodeWriter {
            out,
            static_prefix: String::new(),
            current_function: String::new(),
            arithmetic_num: 0,
            return_address: 0,
        }
    }

    /// Establishes the static namespace for a new input file. Label
    /// counters keep running across files.
    pub fn set_file_name(&mut self, path: &Path) {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.static_prefix.clear();
        self.static_prefix.push_str(name);
    }

    /// Emits the bootstrap prologue: SP=256, then `call Sys.init 0`.
    pub fn write_init(&mut self) -> std::io::Result<()> {
        write_asm!(self.out,
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.write_call("Sys.init", 0)
    }

    /// Translates one command, echoing it as a comment first.
    pub fn write_command(&mut self, command: &Command) -> std::io::Result<()> {
        writeln!(self.out, "// {command}")?;
        match command {
            Command::Arithmetic(op) => self.write_arithmetic(*op),
            Command::Push { segment, index } => self.write_push(*segment, *index),
            Command::Pop { segment, index } => self.write_pop(*segment, *index),
            Command::Label(name) => self.write_label(name),
            Command::Goto(name) => self.write_goto(name),
            Command::IfGoto(name) => self.write_if(name),
            Command::Function { name, locals } => self.write_function(name, *locals),
            Command::Call { name, args } => self.write_call(name, *args),
            Command::Return => self.write_return(),
        }
    }

    fn write_arithmetic(&mut self, op: ArithmeticOp) -> std::io::Result<()> {
        match op {
            ArithmeticOp::Add => self.write_binary("M=M+D"),
            ArithmeticOp::Sub => self.write_binary("M=M-D"),
            ArithmeticOp::And => self.write_binary("M=M&D"),
            ArithmeticOp::Or => self.write_binary("M=M|D"),
            ArithmeticOp::Neg => self.write_unary("M=-M"),
            ArithmeticOp::Not => self.write_unary("M=!M"),
            ArithmeticOp::Eq => self.write_comparison("JEQ"),
            ArithmeticOp::Gt => self.write_comparison("JGT"),
            ArithmeticOp::Lt => self.write_comparison("JLT"),
        }
    }

    /// Pops the right operand into D and combines it into the new top of
    /// stack in place.
    fn write_binary(&mut self, operation: &str) -> std::io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
            "A=A-1"
        )?;
        writeln!(self.out, "{operation}")
    }

    fn write_unary(&mut self, operation: &str) -> std::io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "A=M-1"
        )?;
        writeln!(self.out, "{operation}")
    }

    /// Compares the two topmost values, leaving -1 (true) or 0 (false).
    /// The branch labels come from the writer-wide counter.
    fn write_comparison(&mut self, jump: &str) -> std::io::Result<()> {
        let n = self.arithmetic_num;
        self.arithmetic_num += 1;

        write_asm!(self.out,
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
            "A=A-1"
            "D=M-D"
        )?;
        writeln!(self.out, "@$ARITHMETIC_IF_{n}$")?;
        writeln!(self.out, "D;{jump}")?;
        write_asm!(self.out,
            "@SP"
            "A=M-1"
            "M=0"
        )?;
        writeln!(self.out, "@$ARITHMETIC_ENDIF_{n}$")?;
        writeln!(self.out, "0;JMP")?;
        writeln!(self.out, "($ARITHMETIC_IF_{n}$)")?;
        write_asm!(self.out,
            "@SP"
            "A=M-1"
            "M=-1"
        )?;
        writeln!(self.out, "($ARITHMETIC_ENDIF_{n}$)")
    }

    fn write_push(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        match segment {
            Segment::Constant => {
                writeln!(self.out, "@{index}")?;
                writeln!(self.out, "D=A")?;
            }
            Segment::Local => self.load_indirect("LCL", index)?,
            Segment::Argument => self.load_indirect("ARG", index)?,
            Segment::This => self.load_indirect("THIS", index)?,
            Segment::That => self.load_indirect("THAT", index)?,
            Segment::Temp => {
                writeln!(self.out, "@{}", TEMP_BASE + index)?;
                writeln!(self.out, "D=M")?;
            }
            Segment::Pointer => {
                writeln!(self.out, "@{}", POINTER_BASE + index)?;
                writeln!(self.out, "D=M")?;
            }
            Segment::Static => {
                writeln!(self.out, "@{}.{index}", self.static_prefix)?;
                writeln!(self.out, "D=M")?;
            }
        }
        self.push_d()
    }

    /// D <- *(base + index) for the four pointer-based segments.
    fn load_indirect(&mut self, base: &str, index: u16) -> std::io::Result<()> {
        writeln!(self.out, "@{index}")?;
        writeln!(self.out, "D=A")?;
        writeln!(self.out, "@{base}")?;
        writeln!(self.out, "A=M+D")?;
        writeln!(self.out, "D=M")
    }

    fn write_pop(&mut self, segment: Segment, index: u16) -> std::io::Result<()> {
        match segment {
            Segment::Local => self.store_indirect("LCL", index),
            Segment::Argument => self.store_indirect("ARG", index),
            Segment::This => self.store_indirect("THIS", index),
            Segment::That => self.store_indirect("THAT", index),
            Segment::Temp => {
                self.pop_d()?;
                writeln!(self.out, "@{}", TEMP_BASE + index)?;
                writeln!(self.out, "M=D")
            }
            Segment::Pointer => {
                self.pop_d()?;
                writeln!(self.out, "@{}", POINTER_BASE + index)?;
                writeln!(self.out, "M=D")
            }
            Segment::Static => {
                self.pop_d()?;
                writeln!(self.out, "@{}.{index}", self.static_prefix)?;
                writeln!(self.out, "M=D")
            }
            Segment::Constant => unreachable!("the parser rejects `pop constant`"),
        }
    }

    /// *(base + index) <- popped value. The target address goes to R13
    /// once; the write goes through it.
    fn store_indirect(&mut self, base: &str, index: u16) -> std::io::Result<()> {
        writeln!(self.out, "@{index}")?;
        writeln!(self.out, "D=A")?;
        writeln!(self.out, "@{base}")?;
        writeln!(self.out, "D=M+D")?;
        write_asm!(self.out,
            "@R13"
            "M=D"
        )?;
        self.pop_d()?;
        write_asm!(self.out,
            "@R13"
            "A=M"
            "M=D"
        )
    }

    /// Branch labels are scoped to the enclosing function: `f$label`.
    fn scoped_label(&self, label: &str) -> String {
        format!("{}${label}", self.current_function)
    }

    fn write_label(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.out, "({})", self.scoped_label(label))
    }

    fn write_goto(&mut self, label: &str) -> std::io::Result<()> {
        writeln!(self.out, "@{}", self.scoped_label(label))?;
        writeln!(self.out, "0;JMP")
    }

    fn write_if(&mut self, label: &str) -> std::io::Result<()> {
        self.pop_d()?;
        writeln!(self.out, "@{}", self.scoped_label(label))?;
        writeln!(self.out, "D;JNE")
    }

    fn write_function(&mut self, name: &str, locals: u16) -> std::io::Result<()> {
        self.current_function.clear();
        self.current_function.push_str(name);

        writeln!(self.out, "({name})")?;
        if locals > 0 {
            writeln!(self.out, "D=0")?;
            for _ in 0..locals {
                self.push_d()?;
            }
        }
        Ok(())
    }

    /// The caller side of the frame contract: push the return address and
    /// the four segment pointers, reposition ARG and LCL, jump.
    fn write_call(&mut self, name: &str, args: u16) -> std::io::Result<()> {
        let r = self.return_address;
        self.return_address += 1;

        writeln!(self.out, "@$RETURN_ADDRESS_{r}$")?;
        writeln!(self.out, "D=A")?;
        self.push_d()?;
        for symbol in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.out, "@{symbol}")?;
            writeln!(self.out, "D=M")?;
            self.push_d()?;
        }
        write_asm!(self.out,
            "@SP"
            "D=M"
            "@LCL"
            "M=D"
        )?;
        writeln!(self.out, "@{args}")?;
        write_asm!(self.out,
            "D=D-A"
            "@5"
            "D=D-A"
            "@ARG"
            "M=D"
        )?;
        writeln!(self.out, "@{name}")?;
        writeln!(self.out, "0;JMP")?;
        writeln!(self.out, "($RETURN_ADDRESS_{r}$)")
    }

    /// The callee side: save the frame base and return address in
    /// R13/R14, plant the return value at `*ARG`, rewind SP, restore the
    /// caller's pointers, jump back.
    fn write_return(&mut self) -> std::io::Result<()> {
        write_asm!(self.out,
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
            "@5"
            "D=D-A"
            "A=D"
            "D=M"
            "@R14"
            "M=D"
        )?;
        self.pop_d()?;
        write_asm!(self.out,
            "@ARG"
            "A=M"
            "M=D"
            "D=A+1"
            "@SP"
            "M=D"
        )?;
        for (offset, symbol) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            write_asm!(self.out,
                "@R13"
                "D=M"
            )?;
            writeln!(self.out, "@{offset}")?;
            write_asm!(self.out,
                "D=D-A"
                "A=D"
                "D=M"
            )?;
            writeln!(self.out, "@{symbol}")?;
            writeln!(self.out, "M=D")?;
        }
        write_asm!(self.out,
            "@R14"
            "A=M"
            "0;JMP"
        )
    }

    fn push_d(&mut self) -> std::io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "M=M+1"
            "A=M-1"
            "M=D"
        )
    }

    fn pop_d(&mut self) -> std::io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "M=M-1"
            "A=M"
            "D=M"
        )
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn emit(commands: &[Command]) -> String {
        let mut writer = CodeWriter::new(Vec::new());
        writer.set_file_name(&PathBuf::from("Test.vm"));
        for command in commands {
            writer.write_command(command).unwrap();
        }
        String::from_utf8(writer.out).unwrap()
    }

    #[test]
    fn push_constant() {
        let asm = emit(&[Command::Push {
            segment: Segment::Constant,
            index: 7,
        }]);
        assert_eq!(
            asm,
            "// push constant 7\n@7\nD=A\n@SP\nM=M+1\nA=M-1\nM=D\n"
        );
    }

    #[test]
    fn push_indirect_segment() {
        let asm = emit(&[Command::Push {
            segment: Segment::Local,
            index: 3,
        }]);
        assert!(asm.contains("@3\nD=A\n@LCL\nA=M+D\nD=M\n"));
    }

    #[test]
    fn pop_writes_through_r13() {
        let asm = emit(&[Command::Pop {
            segment: Segment::Argument,
            index: 2,
        }]);
        assert!(asm.contains("@2\nD=A\n@ARG\nD=M+D\n@R13\nM=D\n"));
        assert!(asm.ends_with("@R13\nA=M\nM=D\n"));
    }

    #[test]
    fn temp_and_pointer_are_direct() {
        let asm = emit(&[
            Command::Push {
                segment: Segment::Temp,
                index: 2,
            },
            Command::Push {
                segment: Segment::Pointer,
                index: 1,
            },
        ]);
        assert!(asm.contains("@7\nD=M")); // temp 2 -> RAM[5+2]
        assert!(asm.contains("@4\nD=M")); // pointer 1 -> THAT
    }

    #[test]
    fn static_uses_file_basename() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.set_file_name(&PathBuf::from("dir/Foo.vm"));
        writer
            .write_command(&Command::Push {
                segment: Segment::Static,
                index: 3,
            })
            .unwrap();
        writer.set_file_name(&PathBuf::from("dir/Bar.vm"));
        writer
            .write_command(&Command::Pop {
                segment: Segment::Static,
                index: 3,
            })
            .unwrap();

        let asm = String::from_utf8(writer.out).unwrap();
        assert!(asm.contains("@Foo.3"));
        assert!(asm.contains("@Bar.3"));
    }

    #[test]
    fn comparison_labels_are_unique() {
        let asm = emit(&[
            Command::Arithmetic(ArithmeticOp::Eq),
            Command::Arithmetic(ArithmeticOp::Lt),
        ]);
        assert!(asm.contains("($ARITHMETIC_IF_0$)"));
        assert!(asm.contains("($ARITHMETIC_ENDIF_0$)"));
        assert!(asm.contains("($ARITHMETIC_IF_1$)"));
        assert!(asm.contains("($ARITHMETIC_ENDIF_1$)"));
        assert!(asm.contains("D;JEQ"));
        assert!(asm.contains("D;JLT"));
    }

    #[test]
    fn labels_scope_to_current_function() {
        let asm = emit(&[
            Command::Label("top".to_string()),
            Command::Function {
                name: "Main.run".to_string(),
                locals: 0,
            },
            Command::Label("top".to_string()),
            Command::Goto("top".to_string()),
            Command::IfGoto("top".to_string()),
        ]);
        assert!(asm.contains("($top)"));
        assert!(asm.contains("(Main.run$top)"));
        assert!(asm.contains("@Main.run$top\n0;JMP"));
        assert!(asm.contains("@Main.run$top\nD;JNE"));
    }

    #[test]
    fn function_initializes_locals() {
        let asm = emit(&[Command::Function {
            name: "Main.run".to_string(),
            locals: 2,
        }]);
        assert!(asm.contains("(Main.run)\nD=0\n"));
        assert_eq!(asm.matches("@SP\nM=M+1\nA=M-1\nM=D").count(), 2);

        let asm = emit(&[Command::Function {
            name: "Main.none".to_string(),
            locals: 0,
        }]);
        assert!(!asm.contains("D=0"));
    }

    #[test]
    fn call_pushes_five_frame_values() {
        let asm = emit(&[Command::Call {
            name: "Math.max".to_string(),
            args: 2,
        }]);
        // return address + LCL + ARG + THIS + THAT
        assert_eq!(asm.matches("@SP\nM=M+1\nA=M-1\nM=D").count(), 5);
        assert!(asm.contains("@$RETURN_ADDRESS_0$\nD=A"));
        assert!(asm.ends_with("($RETURN_ADDRESS_0$)\n"));
        assert!(asm.contains("@Math.max\n0;JMP"));
    }

    #[test]
    fn return_address_labels_count_across_calls() {
        let asm = emit(&[
            Command::Call {
                name: "Main.a".to_string(),
                args: 0,
            },
            Command::Call {
                name: "Main.b".to_string(),
                args: 0,
            },
        ]);
        assert!(asm.contains("($RETURN_ADDRESS_0$)"));
        assert!(asm.contains("($RETURN_ADDRESS_1$)"));
    }

    #[test]
    fn return_restores_frame() {
        let asm = emit(&[Command::Return]);
        assert!(asm.starts_with("// return\n@LCL\nD=M\n@R13\nM=D\n"));
        assert!(asm.contains("@R14\nM=D"));
        for symbol in ["@THAT\nM=D", "@THIS\nM=D", "@ARG\nM=D", "@LCL\nM=D"] {
            assert!(asm.contains(symbol), "missing restore: {symbol}");
        }
        assert!(asm.ends_with("@R14\nA=M\n0;JMP\n"));
    }

    #[test]
    fn init_sets_sp_then_calls_sys() {
        let mut writer = CodeWriter::new(Vec::new());
        writer.write_init().unwrap();
        let asm = String::from_utf8(writer.out).unwrap();
        assert!(asm.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(asm.contains("@Sys.init\n0;JMP"));
    }
}
