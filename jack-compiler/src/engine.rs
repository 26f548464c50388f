//! Compilation engine
//!
//! Recursive descent over the token stream with code generation embedded
//! in the parse: no syntax tree is built. Each grammar production is one
//! method; every consumed token is mirrored into the XML rendering, and
//! VM code is emitted the moment a construct is understood, with labels
//! providing the forward references.

use std::io::Write;

use crate::error::JackError;
use crate::symbol_table::{Kind, SymbolTable};
use crate::tokenizer::{Keyword, Token, Tokenizer};
use crate::vm_writer::{ArithmeticOp, Segment, VmWriter};
use crate::xml_writer::XmlWriter;

/// The binary operator symbols of the expression grammar.
const BINARY_OPS: &str = "+-*/&|<>=";

pub struct CompilationEngine<V: Write, X: Write> {
    tokenizer: Tokenizer,
    vm: VmWriter<V>,
    xml: XmlWriter<X>,
    table: SymbolTable,
    class_name: String,
    label_num: usize,
}

impl<V: Write, X: Write> CompilationEngine<V, X> {
    pub fn new(source: &str, vm_out: V, xml_out: X) -> Result<Self, JackError> {
        Ok(CompilationEngine {
            tokenizer: Tokenizer::new(source)?,
            vm: VmWriter::new(vm_out),
            xml: XmlWriter::new(xml_out),
            table: SymbolTable::new(),
            class_name: String::new(),
            label_num: 0,
        })
    }

    /// Compiles one class, the top-level unit of a Jack file.
    pub fn compile(mut self) -> Result<(), JackError> {
        self.compile_class()?;
        self.vm.flush()?;
        self.xml.flush()?;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Token helpers. Every consumer mirrors the token into the XML
    // stream before advancing.
    // ----------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokenizer.current()
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(c)) if *c == symbol)
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn syntax_error(&self, message: impl Into<String>) -> JackError {
        JackError::Syntax {
            line: self.tokenizer.line(),
            message: message.into(),
        }
    }

    fn semantic_error(&self, message: impl Into<String>) -> JackError {
        JackError::Semantic {
            line: self.tokenizer.line(),
            message: message.into(),
        }
    }

    fn expect_symbol(&mut self, expected: char) -> Result<(), JackError> {
        if !self.peek_symbol(expected) {
            return Err(self.syntax_error(format!("expected '{expected}'")));
        }
        self.xml.leaf("symbol", &expected.to_string())?;
        self.tokenizer.advance()
    }

    fn expect_keyword(&mut self, expected: Keyword) -> Result<(), JackError> {
        if !self.peek_keyword(expected) {
            return Err(self.syntax_error(format!("expected '{}'", expected.as_str())));
        }
        self.xml.leaf("keyword", expected.as_str())?;
        self.tokenizer.advance()
    }

    fn expect_identifier(&mut self) -> Result<String, JackError> {
        let name = match self.peek() {
            Some(Token::Identifier(name)) => name.clone(),
            _ => return Err(self.syntax_error("expected an identifier")),
        };
        self.xml.leaf("identifier", &name)?;
        self.tokenizer.advance()?;
        Ok(name)
    }

    /// A type is `int`, `char`, `boolean`, or a class name.
    fn consume_type(&mut self) -> Result<String, JackError> {
        let keyword = match self.peek() {
            Some(Token::Keyword(k @ (Keyword::Int | Keyword::Char | Keyword::Boolean))) => Some(*k),
            Some(Token::Identifier(_)) => None,
            _ => return Err(self.syntax_error("expected a type")),
        };
        match keyword {
            Some(k) => {
                self.xml.leaf("keyword", k.as_str())?;
                self.tokenizer.advance()?;
                Ok(k.as_str().to_string())
            }
            None => self.expect_identifier(),
        }
    }

    // ----------------------------------------------------------------
    // Symbol helpers
    // ----------------------------------------------------------------

    fn define(&mut self, name: &str, type_name: &str, kind: Kind) -> Result<(), JackError> {
        if self.table.define(name, type_name, kind).is_none() {
            return Err(self.semantic_error(format!("duplicate declaration of `{name}`")));
        }
        Ok(())
    }

    /// Resolves a name that must be a variable.
    fn lookup_variable(&self, name: &str) -> Result<(Segment, u16), JackError> {
        match self.table.lookup(name) {
            Some(record) => Ok((record.kind.segment(), record.index)),
            None => Err(self.semantic_error(format!("undeclared variable `{name}`"))),
        }
    }

    fn next_label(&mut self) -> String {
        self.label_num += 1;
        format!("LABEL_{}", self.label_num)
    }

    // ----------------------------------------------------------------
    // Program structure
    // ----------------------------------------------------------------

    fn compile_class(&mut self) -> Result<(), JackError> {
        self.xml.open("class")?;

        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier()?;
        self.expect_symbol('{')?;

        loop {
            let kind = match self.peek() {
                Some(Token::Keyword(Keyword::Static)) => Kind::Static,
                Some(Token::Keyword(Keyword::Field)) => Kind::Field,
                _ => break,
            };
            self.compile_class_var_dec(kind)?;
        }

        loop {
            let keyword = match self.peek() {
                Some(Token::Keyword(
                    k @ (Keyword::Constructor | Keyword::Function | Keyword::Method),
                )) => *k,
                _ => break,
            };
            self.compile_subroutine(keyword)?;
        }

        self.expect_symbol('}')?;

        self.xml.close("class")?;
        Ok(())
    }

    fn compile_class_var_dec(&mut self, kind: Kind) -> Result<(), JackError> {
        self.xml.open("classVarDec")?;

        let keyword = if kind == Kind::Static {
            Keyword::Static
        } else {
            Keyword::Field
        };
        self.expect_keyword(keyword)?;

        let type_name = self.consume_type()?;
        let name = self.expect_identifier()?;
        self.define(&name, &type_name, kind)?;

        while self.peek_symbol(',') {
            self.expect_symbol(',')?;
            let name = self.expect_identifier()?;
            self.define(&name, &type_name, kind)?;
        }
        self.expect_symbol(';')?;

        self.xml.close("classVarDec")?;
        Ok(())
    }

    fn compile_subroutine(&mut self, keyword: Keyword) -> Result<(), JackError> {
        self.xml.open("subroutineDec")?;

        self.table.start_subroutine();

        self.expect_keyword(keyword)?;
        if self.peek_keyword(Keyword::Void) {
            self.expect_keyword(Keyword::Void)?;
        } else {
            self.consume_type()?;
        }
        let subroutine_name = self.expect_identifier()?;

        // `this` is always argument 0 of a method body.
        if keyword == Keyword::Method {
            let class_name = self.class_name.clone();
            self.define("this", &class_name, Kind::Arg)?;
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.xml.open("subroutineBody")?;
        self.expect_symbol('{')?;

        let mut locals = 0u16;
        while self.peek_keyword(Keyword::Var) {
            locals += self.compile_var_dec()?;
        }

        let function_name = format!("{}.{subroutine_name}", self.class_name);
        self.vm.write_function(&function_name, locals)?;

        match keyword {
            Keyword::Method => {
                self.vm.write_push(Segment::Argument, 0)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Constructor => {
                let fields = self.table.var_count(Kind::Field);
                self.vm.write_push(Segment::Constant, fields)?;
                self.vm.write_call("Memory.alloc", 1)?;
                self.vm.write_pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.xml.close("subroutineBody")?;
        self.xml.close("subroutineDec")?;
        Ok(())
    }

    fn compile_parameter_list(&mut self) -> Result<(), JackError> {
        self.xml.open("parameterList")?;

        if !self.peek_symbol(')') {
            let type_name = self.consume_type()?;
            let name = self.expect_identifier()?;
            self.define(&name, &type_name, Kind::Arg)?;
            while self.peek_symbol(',') {
                self.expect_symbol(',')?;
                let type_name = self.consume_type()?;
                let name = self.expect_identifier()?;
                self.define(&name, &type_name, Kind::Arg)?;
            }
        }

        self.xml.close("parameterList")?;
        Ok(())
    }

    /// Returns how many variables the declaration introduced.
    fn compile_var_dec(&mut self) -> Result<u16, JackError> {
        self.xml.open("varDec")?;

        self.expect_keyword(Keyword::Var)?;
        let type_name = self.consume_type()?;
        let name = self.expect_identifier()?;
        self.define(&name, &type_name, Kind::Var)?;

        let mut count = 1u16;
        while self.peek_symbol(',') {
            self.expect_symbol(',')?;
            let name = self.expect_identifier()?;
            self.define(&name, &type_name, Kind::Var)?;
            count += 1;
        }
        self.expect_symbol(';')?;

        self.xml.close("varDec")?;
        Ok(count)
    }

    // ----------------------------------------------------------------
    // Statements
    // ----------------------------------------------------------------

    fn compile_statements(&mut self) -> Result<(), JackError> {
        self.xml.open("statements")?;

        loop {
            let keyword = match self.peek() {
                Some(Token::Keyword(k)) => *k,
                _ => break,
            };
            match keyword {
                Keyword::Let => self.compile_let()?,
                Keyword::If => self.compile_if()?,
                Keyword::While => self.compile_while()?,
                Keyword::Do => self.compile_do()?,
                Keyword::Return => self.compile_return()?,
                _ => break,
            }
        }

        self.xml.close("statements")?;
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), JackError> {
        self.xml.open("letStatement")?;

        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_identifier()?;
        let (segment, index) = self.lookup_variable(&name)?;

        if self.peek_symbol('[') {
            self.vm.write_push(segment, index)?;
            self.expect_symbol('[')?;
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.vm.write_arithmetic(ArithmeticOp::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            // The RHS may itself index an array, so it is evaluated in
            // full and parked in temp 0 before pointer 1 is touched.
            self.vm.write_pop(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::Pointer, 1)?;
            self.vm.write_push(Segment::Temp, 0)?;
            self.vm.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.vm.write_pop(segment, index)?;
        }

        self.xml.close("letStatement")?;
        Ok(())
    }

    fn compile_if(&mut self) -> Result<(), JackError> {
        self.xml.open("ifStatement")?;

        let else_label = self.next_label();
        let end_label = self.next_label();

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.vm.write_arithmetic(ArithmeticOp::Not)?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        self.vm.write_if(&else_label)?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.vm.write_goto(&end_label)?;
        self.vm.write_label(&else_label)?;

        if self.peek_keyword(Keyword::Else) {
            self.expect_keyword(Keyword::Else)?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }

        self.vm.write_label(&end_label)?;

        self.xml.close("ifStatement")?;
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), JackError> {
        self.xml.open("whileStatement")?;

        let top_label = self.next_label();
        let end_label = self.next_label();

        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;

        self.vm.write_label(&top_label)?;
        self.compile_expression()?;
        self.vm.write_arithmetic(ArithmeticOp::Not)?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        self.vm.write_if(&end_label)?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.vm.write_goto(&top_label)?;
        self.vm.write_label(&end_label)?;

        self.xml.close("whileStatement")?;
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), JackError> {
        self.xml.open("doStatement")?;

        self.expect_keyword(Keyword::Do)?;
        let name = self.expect_identifier()?;
        self.compile_call(name)?;
        self.expect_symbol(';')?;

        // The call's return value is not used.
        self.vm.write_pop(Segment::Temp, 0)?;

        self.xml.close("doStatement")?;
        Ok(())
    }

    fn compile_return(&mut self) -> Result<(), JackError> {
        self.xml.open("returnStatement")?;

        self.expect_keyword(Keyword::Return)?;
        if self.peek_symbol(';') {
            // A void return still leaves a value for the caller to drop.
            self.vm.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.vm.write_return()?;

        self.xml.close("returnStatement")?;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Expressions
    // ----------------------------------------------------------------

    fn peek_binary_op(&self) -> Option<char> {
        match self.peek() {
            Some(Token::Symbol(c)) if BINARY_OPS.contains(*c) => Some(*c),
            _ => None,
        }
    }

    /// `term (op term)*`, flattened left to right.
    fn compile_expression(&mut self) -> Result<(), JackError> {
        self.xml.open("expression")?;

        self.compile_term()?;
        while let Some(op) = self.peek_binary_op() {
            self.expect_symbol(op)?;
            self.compile_term()?;
            match op {
                '+' => self.vm.write_arithmetic(ArithmeticOp::Add)?,
                '-' => self.vm.write_arithmetic(ArithmeticOp::Sub)?,
                '*' => self.vm.write_call("Math.multiply", 2)?,
                '/' => self.vm.write_call("Math.divide", 2)?,
                '&' => self.vm.write_arithmetic(ArithmeticOp::And)?,
                '|' => self.vm.write_arithmetic(ArithmeticOp::Or)?,
                '<' => self.vm.write_arithmetic(ArithmeticOp::Lt)?,
                '>' => self.vm.write_arithmetic(ArithmeticOp::Gt)?,
                '=' => self.vm.write_arithmetic(ArithmeticOp::Eq)?,
                _ => unreachable!(),
            }
        }

        self.xml.close("expression")?;
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), JackError> {
        self.xml.open("term")?;

        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.syntax_error("unexpected end of input in term"))?;

        match token {
            Token::IntConst(value) => {
                self.xml.leaf("integerConstant", &value.to_string())?;
                self.tokenizer.advance()?;
                self.vm.write_push(Segment::Constant, value)?;
            }
            Token::StringConst(text) => {
                self.xml.leaf("stringConstant", &text)?;
                self.tokenizer.advance()?;

                let length = u16::try_from(text.chars().count())
                    .map_err(|_| self.syntax_error("string constant too long"))?;
                self.vm.write_push(Segment::Constant, length)?;
                self.vm.write_call("String.new", 1)?;
                for c in text.chars() {
                    self.vm.write_push(Segment::Constant, c as u16)?;
                    self.vm.write_call("String.appendChar", 2)?;
                }
            }
            Token::Keyword(keyword) => {
                match keyword {
                    Keyword::True => {
                        self.vm.write_push(Segment::Constant, 0)?;
                        self.vm.write_arithmetic(ArithmeticOp::Not)?;
                    }
                    Keyword::False | Keyword::Null => {
                        self.vm.write_push(Segment::Constant, 0)?;
                    }
                    Keyword::This => {
                        self.vm.write_push(Segment::Pointer, 0)?;
                    }
                    other => {
                        return Err(self.syntax_error(format!(
                            "keyword '{}' cannot start a term",
                            other.as_str()
                        )));
                    }
                }
                self.xml.leaf("keyword", keyword.as_str())?;
                self.tokenizer.advance()?;
            }
            Token::Identifier(_) => {
                let name = self.expect_identifier()?;
                if self.peek_symbol('[') {
                    let (segment, index) = self.lookup_variable(&name)?;
                    self.vm.write_push(segment, index)?;
                    self.expect_symbol('[')?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.vm.write_arithmetic(ArithmeticOp::Add)?;
                    self.vm.write_pop(Segment::Pointer, 1)?;
                    self.vm.write_push(Segment::That, 0)?;
                } else if self.peek_symbol('(') || self.peek_symbol('.') {
                    self.compile_call(name)?;
                } else {
                    let (segment, index) = self.lookup_variable(&name)?;
                    self.vm.write_push(segment, index)?;
                }
            }
            Token::Symbol('(') => {
                self.expect_symbol('(')?;
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            Token::Symbol(op @ ('-' | '~')) => {
                self.expect_symbol(op)?;
                self.compile_term()?;
                let vm_op = if op == '-' {
                    ArithmeticOp::Neg
                } else {
                    ArithmeticOp::Not
                };
                self.vm.write_arithmetic(vm_op)?;
            }
            Token::Symbol(other) => {
                return Err(self.syntax_error(format!("'{other}' cannot start a term")));
            }
        }

        self.xml.close("term")?;
        Ok(())
    }

    /// A subroutine call whose leading identifier is already consumed.
    ///
    /// `x.f(...)` with `x` a known variable is a method call on `x`;
    /// with `x` unknown it is a function call on class `x`. A bare
    /// `f(...)` is a method call on the current object.
    fn compile_call(&mut self, first: String) -> Result<(), JackError> {
        if self.peek_symbol('.') {
            self.expect_symbol('.')?;
            let subroutine = self.expect_identifier()?;

            let receiver = self
                .table
                .lookup(&first)
                .map(|record| (record.kind.segment(), record.index, record.type_name.clone()));

            self.expect_symbol('(')?;
            match receiver {
                None => {
                    let args = self.compile_expression_list()?;
                    self.expect_symbol(')')?;
                    self.vm.write_call(&format!("{first}.{subroutine}"), args)?;
                }
                Some((segment, index, type_name)) => {
                    // Receiver goes on the stack ahead of the arguments.
                    self.vm.write_push(segment, index)?;
                    let args = self.compile_expression_list()?;
                    self.expect_symbol(')')?;
                    self.vm
                        .write_call(&format!("{type_name}.{subroutine}"), args + 1)?;
                }
            }
        } else {
            self.vm.write_push(Segment::Pointer, 0)?;
            self.expect_symbol('(')?;
            let args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            let class_name = self.class_name.clone();
            self.vm
                .write_call(&format!("{class_name}.{first}"), args + 1)?;
        }
        Ok(())
    }

    /// Returns the number of argument expressions compiled.
    fn compile_expression_list(&mut self) -> Result<u16, JackError> {
        self.xml.open("expressionList")?;

        let mut args = 0u16;
        if !self.peek_symbol(')') {
            self.compile_expression()?;
            args = 1;
            while self.peek_symbol(',') {
                self.expect_symbol(',')?;
                self.compile_expression()?;
                args += 1;
            }
        }

        self.xml.close("expressionList")?;
        Ok(args)
    }
}
