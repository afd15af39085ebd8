mod builtins;
mod expr;
pub mod stmt;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::{BufRead, Write};

use regex::Regex;
use tracing::{debug, trace};

use crate::ast::*;
use crate::error::{Error, Result, RuntimeError};
use crate::input::LineSource;
use crate::record::{FieldSeparator, MAX_FIELDS, Record};
use crate::value::{Array, Value, number_to_text, parse_number};

pub use builtins::{Builtin, Signature};
use builtins::Callable;
use stmt::StmtResult;

const DEFAULT_OFMT: &str = "%.6g";

/// Something that can be assigned to: a variable, an array element or a field.
pub(crate) enum Place {
    Var(String),
    Element(Array, String),
    Field(usize),
}

/// The AWK interpreter runtime
pub struct Interpreter<'a> {
    /// The parsed program
    program: &'a Program,

    /// Built-ins and user functions, looked up by name at each call
    functions: HashMap<String, Callable<'a>>,

    /// Global variables, created on first access
    globals: HashMap<String, Value>,

    /// One local scope per active user-function call
    frames: Vec<HashMap<String, Value>>,

    /// Current record ($0) and its fields
    record: Record,

    /// Lines for the main loop and `getline`
    input: LineSource<'a>,

    /// Compiled regex cache
    regex_cache: HashMap<String, Regex>,

    /// Record number (NR)
    nr: usize,
    /// File record number (FNR)
    fnr: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        let mut functions = HashMap::new();
        for builtin in Builtin::ALL {
            functions.insert(builtin.name().to_string(), Callable::Builtin(builtin));
        }
        // User functions shadow built-ins of the same name.
        for function in &program.functions {
            functions.insert(function.name.clone(), Callable::User(function));
        }

        let globals = [("FS", " "), ("OFS", " "), ("OFMT", DEFAULT_OFMT), ("ORS", "\n")]
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::scalar(value)))
            .collect();

        Self {
            program,
            functions,
            globals,
            frames: Vec::new(),
            record: Record::new(),
            input: LineSource::empty(),
            regex_cache: HashMap::new(),
            nr: 0,
            fnr: 0,
        }
    }

    /// Set the field separator
    pub fn set_fs(&mut self, fs: &str) {
        self.globals.insert("FS".to_string(), Value::scalar(fs));
    }

    /// Set a global variable before execution
    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.globals.insert(name.to_string(), Value::scalar(value));
    }

    /// Run BEGIN, then the main actions once per input line, then END.
    ///
    /// Returns the status given to `exit`, or 0.
    pub fn run<R: BufRead + 'a, W: Write>(&mut self, input: R, output: &mut W) -> Result<i32> {
        self.input = LineSource::new(input);
        let status = match self.run_phases(output) {
            Ok(()) => 0,
            Err(Error::Exit(status)) => {
                debug!(status, "exit");
                status
            }
            Err(e) => return Err(e),
        };
        output.flush()?;
        Ok(status)
    }

    fn run_phases<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let program = self.program;

        debug!(actions = program.begin_blocks.len(), "running BEGIN");
        for action in &program.begin_blocks {
            match self.run_action(action, output) {
                Err(Error::Next) => return Err(RuntimeError::NextInBegin.into()),
                other => other?,
            }
        }

        // Without main or END actions there is nothing to read input for.
        if !program.main_blocks.is_empty() || !program.end_blocks.is_empty() {
            debug!(actions = program.main_blocks.len(), "running main loop");
            while let Some(line) = self.input.next_line()? {
                self.nr += 1;
                self.fnr += 1;
                let separator = self.field_separator()?;
                self.record.set_whole_record(line, &separator);
                trace!(nr = self.nr, nf = self.record.nf(), "record");

                for action in &program.main_blocks {
                    match self.run_action(action, output) {
                        Err(Error::Next) => break,
                        other => other?,
                    }
                }
            }
        }

        debug!(actions = program.end_blocks.len(), nr = self.nr, "running END");
        for action in &program.end_blocks {
            match self.run_action(action, output) {
                Err(Error::Next) => return Err(RuntimeError::NextInEnd.into()),
                other => other?,
            }
        }
        Ok(())
    }

    fn run_action<W: Write>(&mut self, action: &Action, output: &mut W) -> Result<()> {
        if let Some(guard) = &action.guard {
            if !self.eval(guard, output)?.is_truthy()? {
                return Ok(());
            }
        }
        match self.execute_block(&action.body, output)? {
            StmtResult::Normal => Ok(()),
            other => Err(RuntimeError::ControlFlowEscape {
                signal: other.signal_name(),
            }
            .into()),
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.contains_key(name))
    }

    /// The storage for `name`: the current call's parameter if there is one,
    /// otherwise the global, created empty on first use.
    fn slot(&mut self, name: &str) -> &mut Value {
        if let Some(value) = self.frames.last_mut().and_then(|frame| frame.get_mut(name)) {
            return value;
        }
        self.globals.entry(name.to_string()).or_default()
    }

    pub(crate) fn read_var(&mut self, name: &str) -> Value {
        if !self.is_local(name) {
            match name {
                "NF" => return Value::scalar(self.record.nf().to_string()),
                "NR" => return Value::scalar(self.nr.to_string()),
                "FNR" => return Value::scalar(self.fnr.to_string()),
                _ => {}
            }
        }
        self.slot(name).clone()
    }

    pub(crate) fn write_var(&mut self, name: &str, text: String) -> Result<()> {
        if !self.is_local(name) {
            match name {
                "NF" => {
                    let nf = field_limit(count("NF", &text)?)?;
                    self.record.set_nf(nf);
                    return Ok(());
                }
                "NR" => {
                    self.nr = count("NR", &text)?;
                    return Ok(());
                }
                "FNR" => {
                    self.fnr = count("FNR", &text)?;
                    return Ok(());
                }
                _ => {}
            }
        }

        let slot = self.slot(name);
        if slot.is_array() {
            return Err(RuntimeError::ExpectedScalar.into());
        }
        *slot = Value::Scalar(text);
        Ok(())
    }

    /// The array stored under `name`. A name that was never assigned becomes
    /// a new empty array.
    pub(crate) fn array_for(&mut self, name: &str) -> Result<Array> {
        let slot = self.slot(name);
        match slot {
            Value::Array(array) => Ok(array.clone()),
            Value::Uninit => {
                let array = Array::new();
                *slot = Value::Array(array.clone());
                Ok(array)
            }
            Value::Scalar(contents) => Err(RuntimeError::ExpectedArray {
                name: name.to_string(),
                contents: contents.clone(),
            }
            .into()),
        }
    }

    /// Resolve an assignable expression. Subscripts and field indices are
    /// evaluated here, once.
    pub(crate) fn resolve_place<W: Write>(&mut self, expr: &Expr, output: &mut W) -> Result<Place> {
        match expr {
            Expr::Var {
                name, index: None, ..
            } => Ok(Place::Var(name.clone())),
            Expr::Var {
                name,
                index: Some(index),
                ..
            } => {
                let key = self.eval_scalar(index, output)?;
                Ok(Place::Element(self.array_for(name)?, key))
            }
            Expr::Field(index, _) => Ok(Place::Field(self.field_index(index, output)?)),
            other => Err(RuntimeError::NotAVariable {
                target: other.to_string(),
            }
            .into()),
        }
    }

    pub(crate) fn read_place(&mut self, place: &Place) -> Result<String> {
        match place {
            Place::Var(name) => self.read_var(name).into_scalar(),
            Place::Element(array, key) => Ok(array.get(key)),
            Place::Field(index) => Ok(self.record.get(*index)),
        }
    }

    pub(crate) fn write_place(&mut self, place: &Place, text: String) -> Result<()> {
        match place {
            Place::Var(name) => self.write_var(name, text),
            Place::Element(array, key) => {
                array.set(key.as_str(), text);
                Ok(())
            }
            Place::Field(index) => {
                let separator = self.field_separator()?;
                self.record.set_field(*index, text, &separator);
                Ok(())
            }
        }
    }

    pub(crate) fn field_index<W: Write>(&mut self, expr: &Expr, output: &mut W) -> Result<usize> {
        let n = parse_number(&self.eval_scalar(expr, output)?)?.trunc();
        if n < 0.0 {
            return Err(RuntimeError::NegativeFieldIndex { index: n as i64 }.into());
        }
        field_limit(n as usize)
    }

    /// Compile `pattern`, or fetch it from the cache.
    pub(crate) fn regex(&mut self, pattern: &str) -> Result<&Regex> {
        match self.regex_cache.entry(pattern.to_string()) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => Ok(&*entry.insert(Regex::new(pattern)?)),
        }
    }

    /// Text of a global that the runtime itself reads (FS, OFS, ORS, ...).
    pub(crate) fn global_text(&self, name: &str) -> Result<String> {
        match self.globals.get(name) {
            Some(value) => Ok(value.as_scalar()?.to_string()),
            None => Ok(String::new()),
        }
    }

    /// The current `FS` as a separator.
    pub(crate) fn field_separator(&mut self) -> Result<FieldSeparator> {
        let fs = self.global_text("FS")?;
        FieldSeparator::from_fs(&fs, |pattern| self.regex(pattern).cloned())
    }

    /// Render an arithmetic result using the current `OFMT`.
    pub(crate) fn number_text(&self, n: f64) -> Result<String> {
        let ofmt = match self.globals.get("OFMT") {
            Some(value) => value.as_scalar()?,
            None => DEFAULT_OFMT,
        };
        Ok(number_to_text(n, ofmt))
    }
}

/// The value assigned to `NF`, `NR` or `FNR`.
fn count(name: &'static str, text: &str) -> Result<usize> {
    let n = parse_number(text)?.trunc();
    if n < 0.0 {
        return Err(RuntimeError::NegativeCount {
            name,
            value: n as i64,
        }
        .into());
    }
    Ok(n as usize)
}

/// Field indices and `NF` are capped so a stray `$(1e13)` fails instead of
/// allocating every field up to it.
fn field_limit(index: usize) -> Result<usize> {
    if index > MAX_FIELDS {
        return Err(RuntimeError::FieldIndexTooLarge {
            index,
            max: MAX_FIELDS,
        }
        .into());
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run_program(program: &str, input: &str) -> Result<(String, i32)> {
        let mut lexer = Lexer::new(program);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        let ast = parser.parse()?;

        let mut interpreter = Interpreter::new(&ast);
        let mut output = Vec::new();
        let status = interpreter.run(input.as_bytes(), &mut output)?;
        Ok((String::from_utf8(output).unwrap(), status))
    }

    fn run_awk(program: &str, input: &str) -> String {
        run_program(program, input).unwrap().0
    }

    fn runtime_error(program: &str, input: &str) -> RuntimeError {
        match run_program(program, input) {
            Err(Error::Runtime(e)) => e,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn test_begin_print() {
        assert_eq!(run_awk("BEGIN { print \"hello\" }", ""), "hello\n");
    }

    #[test]
    fn test_print_field() {
        let output = run_awk("{ print $2 }", "a b c\nd e f");
        assert_eq!(output, "b\ne\n");
    }

    #[test]
    fn test_print_no_args_prints_record() {
        assert_eq!(run_awk("{ print }", "x  y\nz"), "x  y\nz\n");
    }

    #[test]
    fn test_arithmetic() {
        let output = run_awk("BEGIN { print 1 + 2 * 3, 7 % 3, 2 ^ 10, 10 / 4 }", "");
        assert_eq!(output, "7 1 1024 2.5\n");
    }

    #[test]
    fn test_ofmt_applies_to_arithmetic() {
        let output = run_awk("BEGIN { OFMT = \"%.2f\"; x = 1 / 3; print x }", "");
        assert_eq!(output, "0.33\n");
    }

    #[test]
    fn test_variable_defaults_empty() {
        assert_eq!(run_awk("BEGIN { print x + 1, \"[\" y \"]\" }", ""), "1 []\n");
    }

    #[test]
    fn test_if_else_chain() {
        let program = "{ if ($1 > 5) print \"big\"; else if ($1 > 2) print \"mid\"; else print \"small\" }";
        assert_eq!(run_awk(program, "9\n3\n1"), "big\nmid\nsmall\n");
    }

    #[test]
    fn test_loops() {
        let output = run_awk(
            "BEGIN { i = 0; while (i < 3) i++; for (j = 0; j < 2; j++) s = s j; do k++; while (k < 4); print i, s, k }",
            "",
        );
        assert_eq!(output, "3 01 4\n");
    }

    #[test]
    fn test_break_and_continue() {
        let output = run_awk(
            "BEGIN { for (i = 1; i <= 10; i++) { if (i == 2) continue; if (i == 5) break; s = s i }; print s }",
            "",
        );
        assert_eq!(output, "134\n");
    }

    #[test]
    fn test_compound_guard() {
        let output = run_awk("NR > 1 && $0 ~ /b/ { print NR }", "b\nb\na\nb");
        assert_eq!(output, "2\n4\n");
    }

    #[test]
    fn test_next_skips_remaining_actions() {
        let output = run_awk("/skip/ { next } { print }", "keep\nskip me\nkeep too");
        assert_eq!(output, "keep\nkeep too\n");
    }

    #[test]
    fn test_exit_skips_end() {
        let (output, status) =
            run_program("{ print; if (NR == 2) exit 3 } END { print \"end\" }", "a\nb\nc").unwrap();
        assert_eq!(output, "a\nb\n");
        assert_eq!(status, 3);
    }

    #[test]
    fn test_end_sees_record_count() {
        assert_eq!(run_awk("END { print NR }", "a\nb\nc\n"), "3\n");
    }

    #[test]
    fn test_nf_assignment() {
        assert_eq!(run_awk("{ NF = 2; print; print NF }", "a b c d"), "a b\n2\n");
        assert_eq!(run_awk("{ NF = 4; $4 = \"d\"; print }", "a b"), "a b  d\n");
    }

    #[test]
    fn test_field_assignment() {
        assert_eq!(run_awk("{ $2 = \"X\"; print; print NF }", "a b c"), "a X c\n3\n");
        assert_eq!(run_awk("{ $0 = \"p q\"; print $2, NF }", "a b c"), "q 2\n");
    }

    #[test]
    fn test_fs_and_ofs() {
        let output = run_awk("BEGIN { FS = \":\"; OFS = \"-\" } { print $1, $3 }", "a:b:c");
        assert_eq!(output, "a-c\n");
    }

    #[test]
    fn test_ors() {
        assert_eq!(run_awk("BEGIN { ORS = \";\" } { print }", "a\nb"), "a;b;");
    }

    #[test]
    fn test_set_fs_and_variable() {
        let tokens = Lexer::new("{ print $2, greeting }").tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::new(&program);
        interpreter.set_fs(",");
        interpreter.set_variable("greeting", "hi");
        let mut output = Vec::new();
        interpreter.run("a,b".as_bytes(), &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "b hi\n");
    }

    #[test]
    fn test_recursion() {
        let output = run_awk(
            "function fact(n) { if (n <= 1) return 1; return n * fact(n - 1) } BEGIN { print fact(10) }",
            "",
        );
        assert_eq!(output, "3628800\n");
    }

    #[test]
    fn test_uninit_argument_becomes_caller_array() {
        let output = run_awk(
            "function fill(a) { a[1] = \"x\"; a[2] = \"y\" } BEGIN { fill(arr); print length(arr), arr[2] }",
            "",
        );
        assert_eq!(output, "2 y\n");
    }

    #[test]
    fn test_locals_do_not_leak() {
        let output = run_awk("function f(p) { p = 7; g = p } BEGIN { f(1); print p \"|\" g }", "");
        assert_eq!(output, "|7\n");
    }

    #[test]
    fn test_user_function_shadows_builtin() {
        let output = run_awk("function length(s) { return \"mine\" } BEGIN { print length(\"abc\") }", "");
        assert_eq!(output, "mine\n");
    }

    #[test]
    fn test_next_in_begin_and_end() {
        assert_eq!(runtime_error("BEGIN { next }", ""), RuntimeError::NextInBegin);
        assert_eq!(runtime_error("END { next }", "a"), RuntimeError::NextInEnd);
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            runtime_error("BEGIN { break }", ""),
            RuntimeError::ControlFlowEscape { signal: "break" }
        );
        assert_eq!(
            runtime_error("function f() { continue } BEGIN { f() }", ""),
            RuntimeError::ControlFlowEscape { signal: "continue" }
        );
    }

    #[test]
    fn test_negative_field() {
        assert_eq!(
            runtime_error("{ print $(-1) }", "a"),
            RuntimeError::NegativeFieldIndex { index: -1 }
        );
    }

    #[test]
    fn test_flush_failure_is_returned() {
        struct Unflushable;
        impl Write for Unflushable {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::other("stdout closed"))
            }
        }

        let tokens = Lexer::new("BEGIN { print 1 }").tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let err = Interpreter::new(&program)
            .run(std::io::empty(), &mut Unflushable)
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err:?}");
    }

    #[test]
    fn test_field_index_limit() {
        let too_large = RuntimeError::FieldIndexTooLarge {
            index: 10_000_000_000_000,
            max: MAX_FIELDS,
        };
        assert_eq!(runtime_error("{ print $(1e13) }", "a b"), too_large);
        assert_eq!(runtime_error("{ $(1e13) = 1 }", "a b"), too_large);
        assert_eq!(
            runtime_error("{ NF = 1e13 }", "a b"),
            RuntimeError::FieldIndexTooLarge {
                index: 10_000_000_000_000,
                max: MAX_FIELDS,
            }
        );
        assert_eq!(run_awk("{ NF = 3; print NF }", "a"), "3\n");
    }

    #[test]
    fn test_negative_counter_names_the_variable() {
        assert_eq!(
            runtime_error("{ NR = -1 }", "a"),
            RuntimeError::NegativeCount {
                name: "NR",
                value: -1
            }
        );
        assert_eq!(
            runtime_error("{ FNR = -2 }", "a"),
            RuntimeError::NegativeCount {
                name: "FNR",
                value: -2
            }
        );
        assert_eq!(
            runtime_error("{ NF = -1 }", "a"),
            RuntimeError::NegativeCount {
                name: "NF",
                value: -1
            }
        );
    }

    #[test]
    fn test_scalar_used_as_array() {
        assert_eq!(
            runtime_error("BEGIN { x = 5; x[1] = 2 }", ""),
            RuntimeError::ExpectedArray {
                name: "x".to_string(),
                contents: "5".to_string()
            }
        );
    }

    #[test]
    fn test_array_used_as_scalar() {
        assert_eq!(
            runtime_error("BEGIN { a[1] = 1; print a }", ""),
            RuntimeError::ExpectedScalar
        );
        assert_eq!(
            runtime_error("BEGIN { a[1] = 1; a = 2 }", ""),
            RuntimeError::ExpectedScalar
        );
    }

    #[test]
    fn test_regex_is_cached() {
        let tokens = Lexer::new("/a+/ { n++ } END { print n }").tokenize().unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::new(&program);
        let mut output = Vec::new();
        interpreter.run("a\nb\naa".as_bytes(), &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "2\n");
        assert_eq!(interpreter.regex_cache.len(), 1);
    }
}
