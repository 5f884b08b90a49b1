//! Recursive-descent compiler: parses Jack grammar rules and emits VM
//! code directly, with no intermediate AST.
//!
//! One `compile_x` method per grammar nonterminal. Each method assumes
//! the tokenizer's current token is the first token of its rule and
//! leaves it on the first token past the rule on return, matching the
//! original engine's advance-as-you-go shape rather than building a
//! tree it does not need.

use std::fmt;

use crate::symbol_table::{SymbolKind, SymbolTable};
use crate::tokenizer::{JackTokenizer, Token, TokenizerError};
use crate::vm_writer::VmWriter;

const OP_SYMBOLS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];
const UNARY_OP_SYMBOLS: &[char] = &['-', '~'];

#[derive(Debug)]
pub enum CompilationError {
    Tokenizer(TokenizerError),
    Io(std::io::Error),
    UnexpectedToken { expected: String, found: String },
    UndeclaredIdentifier(String),
}

impl std::error::Error for CompilationError {}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tokenizer(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::UndeclaredIdentifier(name) => {
                write!(f, "`{name}` is neither a declared variable nor a known class")
            }
        }
    }
}

impl From<TokenizerError> for CompilationError {
    fn from(error: TokenizerError) -> Self {
        Self::Tokenizer(error)
    }
}

impl From<std::io::Error> for CompilationError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

type Result<T> = std::result::Result<T, CompilationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Compiles a single Jack class file, emitting VM code as it parses.
pub struct CompilationEngine {
    tokenizer: JackTokenizer,
    writer: VmWriter,
    symbols: SymbolTable,
    class_name: String,
    current_subroutine: String,
    subroutine_kind: SubroutineKind,
    label_counter: u32,
}

impl CompilationEngine {
    /// Builds a compiler over `source` (the contents of one `.jack`
    /// file) that writes VM commands to `output_path`.
    pub fn new(source: &str, output_path: &str) -> Result<Self> {
        Ok(Self {
            tokenizer: JackTokenizer::from_source(source),
            writer: VmWriter::new(output_path)?,
            symbols: SymbolTable::new(),
            class_name: String::new(),
            current_subroutine: String::new(),
            subroutine_kind: SubroutineKind::Function,
            label_counter: 0,
        })
    }

    /// Compiles the whole class and closes the output file.
    pub fn compile(mut self) -> Result<()> {
        self.compile_class()?;
        self.writer.close()?;
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        self.tokenizer.advance()?;
        Ok(())
    }

    fn current(&self) -> &Token {
        self.tokenizer.current_token()
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<()> {
        if self.tokenizer.is_symbol(symbol) {
            self.advance()
        } else {
            Err(CompilationError::UnexpectedToken {
                expected: format!("`{symbol}`"),
                found: format!("{:?}", self.current()),
            })
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.tokenizer.is_keyword(keyword) {
            self.advance()
        } else {
            Err(CompilationError::UnexpectedToken {
                expected: format!("`{keyword}`"),
                found: format!("{:?}", self.current()),
            })
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match self.current() {
            Token::Identifier(s) => {
                let name = s.clone();
                self.advance()?;
                Ok(name)
            }
            other => Err(CompilationError::UnexpectedToken {
                expected: "an identifier".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    /// Consumes a type token: `int`/`char`/`boolean`/`void` keyword or a
    /// class-name identifier.
    fn type_token(&mut self) -> Result<String> {
        let text = match self.current() {
            Token::Keyword(k) => k.clone(),
            Token::Identifier(s) => s.clone(),
            other => {
                return Err(CompilationError::UnexpectedToken {
                    expected: "a type".to_string(),
                    found: format!("{other:?}"),
                })
            }
        };
        self.advance()?;
        Ok(text)
    }

    fn fresh_label(&mut self, tag: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{tag}{n}")
    }

    /// Resolves `name` against the symbol table and pushes or pops it.
    /// Used for bare-variable terms and the left side of a non-array
    /// `let`.
    fn segment_of(&self, name: &str) -> Result<(&'static str, u16)> {
        let kind = self
            .symbols
            .kind_of(name)
            .ok_or_else(|| CompilationError::UndeclaredIdentifier(name.to_string()))?;
        let index = self.symbols.index_of(name).unwrap();
        Ok((kind.segment(), index))
    }

    // class -> 'class' className '{' classVarDec* subroutineDec* '}'
    fn compile_class(&mut self) -> Result<()> {
        self.advance()?; // prime the first token
        self.expect_keyword("class")?;
        self.class_name = self.identifier()?;
        self.expect_symbol('{')?;

        while self.tokenizer.is_keyword("static") || self.tokenizer.is_keyword("field") {
            self.compile_class_var_dec()?;
        }

        while self.tokenizer.is_keyword("constructor")
            || self.tokenizer.is_keyword("function")
            || self.tokenizer.is_keyword("method")
        {
            self.compile_subroutine()?;
        }

        self.expect_symbol('}')?;
        Ok(())
    }

    // classVarDec -> ('static'|'field') type varName (',' varName)* ';'
    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kind = if self.tokenizer.is_keyword("static") {
            SymbolKind::Static
        } else {
            SymbolKind::Field
        };
        self.advance()?;
        let var_type = self.type_token()?;

        let name = self.identifier()?;
        self.symbols.define(&name, &var_type, kind);
        while self.tokenizer.is_symbol(',') {
            self.advance()?;
            let name = self.identifier()?;
            self.symbols.define(&name, &var_type, kind);
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    // subroutineDec -> ('constructor'|'function'|'method') ('void'|type)
    //                  subroutineName '(' parameterList ')' subroutineBody
    fn compile_subroutine(&mut self) -> Result<()> {
        self.symbols.reset_subroutine_scope();

        self.subroutine_kind = match self.current() {
            Token::Keyword(k) if k == "constructor" => SubroutineKind::Constructor,
            Token::Keyword(k) if k == "method" => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };
        self.advance()?;

        if self.subroutine_kind == SubroutineKind::Method {
            self.symbols.define("this", &self.class_name, SymbolKind::Arg);
        }

        self.type_token()?; // return type: unused, since compile_return never branches on it
        let subr_name = self.identifier()?;
        self.current_subroutine = format!("{}.{}", self.class_name, subr_name);

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.compile_subroutine_body()?;
        Ok(())
    }

    // parameterList -> ((type varName) (',' type varName)*)?
    fn compile_parameter_list(&mut self) -> Result<()> {
        if self.tokenizer.is_symbol(')') {
            return Ok(());
        }
        let var_type = self.type_token()?;
        let name = self.identifier()?;
        self.symbols.define(&name, &var_type, SymbolKind::Arg);

        while self.tokenizer.is_symbol(',') {
            self.advance()?;
            let var_type = self.type_token()?;
            let name = self.identifier()?;
            self.symbols.define(&name, &var_type, SymbolKind::Arg);
        }
        Ok(())
    }

    // subroutineBody -> '{' varDec* statements '}'
    fn compile_subroutine_body(&mut self) -> Result<()> {
        self.expect_symbol('{')?;

        while self.tokenizer.is_keyword("var") {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.var_count(SymbolKind::Var);
        self.writer.write_function(&self.current_subroutine, n_locals)?;

        match self.subroutine_kind {
            SubroutineKind::Method => {
                self.writer.write_push("argument", 0)?;
                self.writer.write_pop("pointer", 0)?;
            }
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.var_count(SymbolKind::Field);
                self.writer.write_push("constant", n_fields)?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop("pointer", 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    // varDec -> 'var' type varName (',' varName)* ';'
    fn compile_var_dec(&mut self) -> Result<()> {
        self.advance()?; // 'var'
        let var_type = self.type_token()?;
        let name = self.identifier()?;
        self.symbols.define(&name, &var_type, SymbolKind::Var);

        while self.tokenizer.is_symbol(',') {
            self.advance()?;
            let name = self.identifier()?;
            self.symbols.define(&name, &var_type, SymbolKind::Var);
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    // statements -> statement*
    fn compile_statements(&mut self) -> Result<()> {
        loop {
            match self.current() {
                Token::Keyword(k) if k == "let" => self.compile_let()?,
                Token::Keyword(k) if k == "if" => self.compile_if()?,
                Token::Keyword(k) if k == "while" => self.compile_while()?,
                Token::Keyword(k) if k == "do" => self.compile_do()?,
                Token::Keyword(k) if k == "return" => self.compile_return()?,
                _ => break,
            }
        }
        Ok(())
    }

    // letStatement -> 'let' varName ('[' expression ']')? '=' expression ';'
    fn compile_let(&mut self) -> Result<()> {
        self.advance()?; // 'let'
        let name = self.identifier()?;

        if self.tokenizer.is_symbol('[') {
            let (segment, index) = self.segment_of(&name)?;
            self.writer.write_push(segment, index)?;

            self.advance()?; // '['
            self.compile_expression()?;
            self.writer.write_arithmetic('+', false)?;
            self.expect_symbol(']')?;

            self.expect_symbol('=')?;
            self.compile_expression()?;

            self.writer.write_pop("temp", 0)?;
            self.writer.write_pop("pointer", 1)?;
            self.writer.write_push("temp", 0)?;
            self.writer.write_pop("that", 0)?;
        } else {
            let (segment, index) = self.segment_of(&name)?;
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.writer.write_pop(segment, index)?;
        }

        self.expect_symbol(';')?;
        Ok(())
    }

    // ifStatement -> 'if' '(' expression ')' '{' statements '}'
    //                ('else' '{' statements '}')?
    fn compile_if(&mut self) -> Result<()> {
        self.advance()?; // 'if'
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic('~', false)?;

        let else_label = self.fresh_label("IF_ELSE");
        let end_label = self.fresh_label("IF_END");

        self.writer.write_if(&else_label)?;
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&end_label)?;

        self.writer.write_label(&else_label)?;
        if self.tokenizer.is_keyword("else") {
            self.advance()?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    // whileStatement -> 'while' '(' expression ')' '{' statements '}'
    fn compile_while(&mut self) -> Result<()> {
        self.advance()?; // 'while'
        let top_label = self.fresh_label("WHILE_TOP");
        let end_label = self.fresh_label("WHILE_END");

        self.writer.write_label(&top_label)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic('~', false)?;
        self.writer.write_if(&end_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&top_label)?;
        self.writer.write_label(&end_label)?;
        Ok(())
    }

    // doStatement -> 'do' subroutineCall ';'
    fn compile_do(&mut self) -> Result<()> {
        self.advance()?; // 'do'
        self.compile_expression()?;
        self.writer.write_pop("temp", 0)?;
        self.expect_symbol(';')?;
        Ok(())
    }

    // returnStatement -> 'return' expression? ';'
    fn compile_return(&mut self) -> Result<()> {
        self.advance()?; // 'return'

        if self.tokenizer.is_symbol(';') {
            self.writer.write_push("constant", 0)?;
        } else {
            self.compile_expression()?;
        }

        // A constructor always hands back its freshly allocated object,
        // even when the source already wrote `return this;` (the
        // preceding push is simply discarded when `return` collapses
        // the stack to `ARG + 1`).
        if self.subroutine_kind == SubroutineKind::Constructor {
            self.writer.write_push("pointer", 0)?;
        }
        self.writer.write_return()?;
        self.expect_symbol(';')?;
        Ok(())
    }

    // expression -> term (op term)*
    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;
        loop {
            let op = match self.current() {
                Token::Symbol(c) if OP_SYMBOLS.contains(c) => *c,
                _ => break,
            };
            self.advance()?;
            self.compile_term()?;
            match op {
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                _ => self.writer.write_arithmetic(op, false)?,
            }
        }
        Ok(())
    }

    // term -> integerConstant | stringConstant | keywordConstant
    //       | varName | varName '[' expression ']' | subroutineCall
    //       | '(' expression ')' | unaryOp term
    fn compile_term(&mut self) -> Result<()> {
        match self.current().clone() {
            Token::IntegerConstant(n) => {
                self.writer.write_push("constant", n)?;
                self.advance()?;
            }
            Token::StringConstant(s) => {
                self.writer.write_push("constant", s.chars().count() as u16)?;
                self.writer.write_call("String.new", 1)?;
                for ch in s.chars() {
                    self.writer.write_push("constant", ch as u16)?;
                    self.writer.write_call("String.appendChar", 2)?;
                }
                self.advance()?;
            }
            Token::Keyword(k) if k == "true" => {
                self.writer.write_push("constant", 0)?;
                self.writer.write_arithmetic('~', false)?;
                self.advance()?;
            }
            Token::Keyword(k) if k == "false" || k == "null" => {
                self.writer.write_push("constant", 0)?;
                self.advance()?;
            }
            Token::Keyword(k) if k == "this" => {
                self.writer.write_push("pointer", 0)?;
                self.advance()?;
            }
            Token::Symbol(c) if UNARY_OP_SYMBOLS.contains(&c) => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(c, c == '-')?;
            }
            Token::Symbol('(') => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            Token::Identifier(name) => {
                self.advance()?;
                self.compile_identifier_term(&name)?;
            }
            other => {
                return Err(CompilationError::UnexpectedToken {
                    expected: "a term".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }
        Ok(())
    }

    /// Continues a term after an identifier has already been consumed:
    /// an array access, a same-class method call, a qualified call on a
    /// variable or class, or a bare variable reference.
    fn compile_identifier_term(&mut self, name: &str) -> Result<()> {
        if self.tokenizer.is_symbol('[') {
            let (segment, index) = self.segment_of(name)?;
            self.writer.write_push(segment, index)?;

            self.advance()?; // '['
            self.compile_expression()?;
            self.expect_symbol(']')?;

            self.writer.write_arithmetic('+', false)?;
            self.writer.write_pop("pointer", 1)?;
            self.writer.write_push("that", 0)?;
        } else if self.tokenizer.is_symbol('(') {
            // bare subroutineName(...) is an implicit method call on `this`
            self.advance()?; // '('
            self.writer.write_push("pointer", 0)?;
            let n_args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            self.writer
                .write_call(&format!("{}.{name}", self.class_name), n_args + 1)?;
        } else if self.tokenizer.is_symbol('.') {
            self.advance()?; // '.'
            let sub_name = self.identifier()?;
            self.expect_symbol('(')?;

            if let Some(kind) = self.symbols.kind_of(name) {
                let index = self.symbols.index_of(name).unwrap();
                let type_name = self.symbols.type_of(name).unwrap().to_string();
                self.writer.write_push(kind.segment(), index)?;
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer
                    .write_call(&format!("{type_name}.{sub_name}"), n_args + 1)?;
            } else {
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer.write_call(&format!("{name}.{sub_name}"), n_args)?;
            }
        } else {
            let (segment, index) = self.segment_of(name)?;
            self.writer.write_push(segment, index)?;
        }
        Ok(())
    }

    // expressionList -> (expression (',' expression)*)?
    fn compile_expression_list(&mut self) -> Result<u16> {
        if self.tokenizer.is_symbol(')') {
            return Ok(0);
        }

        self.compile_expression()?;
        let mut count = 1u16;
        while self.tokenizer.is_symbol(',') {
            self.advance()?;
            self.compile_expression()?;
            count += 1;
        }
        Ok(count)
    }
}
