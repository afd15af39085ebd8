use std::collections::HashMap;
use std::io::Write;

use regex::Regex;
use tracing::trace;

use crate::ast::{Expr, FunctionDef};
use crate::error::{Error, Result, RuntimeError};
use crate::format;
use crate::record::FieldSeparator;
use crate::value::Value;

use super::stmt::StmtResult;
use super::{Interpreter, Place};

/// Functions implemented by the interpreter itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Printf,
    Sprintf,
    Getline,
    Next,
    Exit,
    Sub,
    Gsub,
    Match,
    Index,
    Length,
    Split,
    Substr,
    Tolower,
    Toupper,
}

/// How many arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Fixed(usize),
    /// Trailing parameters may be left out.
    Optional { required: usize, max: usize },
    /// The last parameter collects any number of arguments.
    Variadic { required: usize },
}

impl Builtin {
    pub const ALL: [Builtin; 15] = [
        Builtin::Print,
        Builtin::Printf,
        Builtin::Sprintf,
        Builtin::Getline,
        Builtin::Next,
        Builtin::Exit,
        Builtin::Sub,
        Builtin::Gsub,
        Builtin::Match,
        Builtin::Index,
        Builtin::Length,
        Builtin::Split,
        Builtin::Substr,
        Builtin::Tolower,
        Builtin::Toupper,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Printf => "printf",
            Builtin::Sprintf => "sprintf",
            Builtin::Getline => "getline",
            Builtin::Next => "next",
            Builtin::Exit => "exit",
            Builtin::Sub => "sub",
            Builtin::Gsub => "gsub",
            Builtin::Match => "match",
            Builtin::Index => "index",
            Builtin::Length => "length",
            Builtin::Split => "split",
            Builtin::Substr => "substr",
            Builtin::Tolower => "tolower",
            Builtin::Toupper => "toupper",
        }
    }

    pub fn signature(self) -> Signature {
        match self {
            Builtin::Print => Signature::Variadic { required: 0 },
            Builtin::Printf | Builtin::Sprintf => Signature::Variadic { required: 1 },
            Builtin::Next => Signature::Fixed(0),
            Builtin::Getline | Builtin::Exit | Builtin::Length => Signature::Optional {
                required: 0,
                max: 1,
            },
            Builtin::Sub | Builtin::Gsub | Builtin::Split | Builtin::Substr => Signature::Optional {
                required: 2,
                max: 3,
            },
            Builtin::Match | Builtin::Index => Signature::Fixed(2),
            Builtin::Tolower | Builtin::Toupper => Signature::Fixed(1),
        }
    }
}

impl Signature {
    pub fn check(self, function: &str, found: usize) -> Result<()> {
        let arity = |expected: usize, variadic: bool| -> Result<()> {
            Err(RuntimeError::Arity {
                function: function.to_string(),
                expected,
                found,
                variadic,
            }
            .into())
        };

        match self {
            Signature::Fixed(expected) if found != expected => arity(expected, false),
            Signature::Optional { required, .. } if found < required => arity(required, false),
            Signature::Optional { max, .. } if found > max => Err(RuntimeError::TooManyArguments {
                function: function.to_string(),
                found,
                max,
            }
            .into()),
            Signature::Variadic { required } if found < required => arity(required, true),
            _ => Ok(()),
        }
    }
}

/// An entry in the function table.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Callable<'a> {
    Builtin(Builtin),
    User(&'a FunctionDef),
}

impl<'a> Interpreter<'a> {
    /// Call a built-in or user function by name.
    pub(crate) fn call<W: Write>(&mut self, name: &str, args: &[Expr], output: &mut W) -> Result<Value> {
        match self.functions.get(name).copied() {
            Some(Callable::Builtin(builtin)) => {
                builtin.signature().check(name, args.len())?;
                self.call_builtin(builtin, args, output)
            }
            Some(Callable::User(function)) => self.call_user_function(function, args, output),
            None => Err(RuntimeError::FunctionNotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Built-ins see their arguments unevaluated, so the ones that assign
    /// (`sub`, `gsub`, `split`, `getline var`) write straight to the caller's
    /// variable, element or field.
    fn call_builtin<W: Write>(&mut self, builtin: Builtin, args: &[Expr], output: &mut W) -> Result<Value> {
        match builtin {
            Builtin::Print => {
                let line = if args.is_empty() {
                    self.record.line().to_string()
                } else {
                    let ofs = self.global_text("OFS")?;
                    self.eval_args(args, output)?.join(&ofs)
                };
                let ors = self.global_text("ORS")?;
                write!(output, "{line}{ors}")?;
                Ok(Value::default())
            }

            Builtin::Printf => {
                let text = self.format_args(args, output)?;
                output.write_all(text.as_bytes())?;
                Ok(Value::default())
            }

            Builtin::Sprintf => Ok(Value::Scalar(self.format_args(args, output)?)),

            Builtin::Getline => self.call_getline(args.first(), output),

            Builtin::Next => Err(Error::Next),

            Builtin::Exit => {
                let status = match args.first() {
                    Some(status) => self.eval_number(status, output)? as i32,
                    None => 0,
                };
                Err(Error::Exit(status))
            }

            Builtin::Sub | Builtin::Gsub => {
                let pattern = self.eval_scalar(&args[0], output)?;
                let replacement = self.eval_scalar(&args[1], output)?;
                let place = match args.get(2) {
                    Some(target) => self.resolve_place(target, output)?,
                    None => Place::Field(0),
                };
                let target = self.read_place(&place)?;

                let regex = self.regex(&pattern)?;
                let (result, count) = substitute(regex, &target, &replacement, builtin == Builtin::Gsub);
                if count > 0 {
                    self.write_place(&place, result)?;
                }
                Ok(Value::scalar(count.to_string()))
            }

            Builtin::Match => {
                let haystack = self.eval_scalar(&args[0], output)?;
                let pattern = self.eval_scalar(&args[1], output)?;

                let (start, length) = match self.regex(&pattern)?.find(&haystack) {
                    Some(m) => (
                        haystack[..m.start()].chars().count() + 1,
                        m.as_str().chars().count() as i64,
                    ),
                    None => (0, -1),
                };
                self.write_var("RSTART", start.to_string())?;
                self.write_var("RLENGTH", length.to_string())?;
                Ok(Value::scalar(start.to_string()))
            }

            Builtin::Index => {
                let haystack = self.eval_scalar(&args[0], output)?;
                let needle = self.eval_scalar(&args[1], output)?;
                let position = match haystack.find(&needle) {
                    Some(offset) if !needle.is_empty() => haystack[..offset].chars().count() + 1,
                    _ => 0,
                };
                Ok(Value::scalar(position.to_string()))
            }

            Builtin::Length => {
                let length = match args.first() {
                    None => self.record.line().chars().count(),
                    Some(Expr::Var {
                        name, index: None, ..
                    }) => match self.read_var(name) {
                        Value::Array(array) => array.len(),
                        other => other.as_scalar()?.chars().count(),
                    },
                    Some(arg) => self.eval_scalar(arg, output)?.chars().count(),
                };
                Ok(Value::scalar(length.to_string()))
            }

            Builtin::Split => self.call_split(args, output),

            Builtin::Substr => {
                let text = self.eval_scalar(&args[0], output)?;
                let start = self.eval_number(&args[1], output)?;
                let length = match args.get(2) {
                    Some(length) => Some(self.eval_number(length, output)?),
                    None => None,
                };
                Ok(Value::Scalar(substr(&text, start, length)))
            }

            Builtin::Tolower => Ok(Value::Scalar(self.eval_scalar(&args[0], output)?.to_lowercase())),

            Builtin::Toupper => Ok(Value::Scalar(self.eval_scalar(&args[0], output)?.to_uppercase())),
        }
    }

    fn eval_args<W: Write>(&mut self, args: &[Expr], output: &mut W) -> Result<Vec<String>> {
        args.iter().map(|arg| self.eval_scalar(arg, output)).collect()
    }

    fn format_args<W: Write>(&mut self, args: &[Expr], output: &mut W) -> Result<String> {
        let texts = self.eval_args(args, output)?;
        match texts.split_first() {
            Some((format, rest)) => format::sprintf(format, rest),
            None => Ok(String::new()),
        }
    }

    /// `getline` replaces the record and bumps NR/FNR; `getline var` only
    /// assigns the line.
    fn call_getline<W: Write>(&mut self, target: Option<&Expr>, output: &mut W) -> Result<Value> {
        let place = match target {
            Some(target) => Some(self.resolve_place(target, output)?),
            None => None,
        };
        let Some(line) = self.input.next_line()? else {
            return Ok(Value::from_bool(false));
        };

        match place {
            Some(place) => self.write_place(&place, line)?,
            None => {
                self.nr += 1;
                self.fnr += 1;
                let separator = self.field_separator()?;
                self.record.set_whole_record(line, &separator);
            }
        }
        Ok(Value::from_bool(true))
    }

    fn call_split<W: Write>(&mut self, args: &[Expr], output: &mut W) -> Result<Value> {
        let text = self.eval_scalar(&args[0], output)?;
        let array = match &args[1] {
            Expr::Var {
                name, index: None, ..
            } => self.array_for(name)?,
            other => {
                let contents = self.eval_scalar(other, output)?;
                return Err(RuntimeError::ExpectedArray {
                    name: other.to_string(),
                    contents,
                }
                .into());
            }
        };
        let separator = match args.get(2) {
            Some(separator) => {
                let fs = self.eval_scalar(separator, output)?;
                FieldSeparator::from_fs(&fs, |pattern| self.regex(pattern).cloned())?
            }
            None => self.field_separator()?,
        };

        array.clear();
        let fields = separator.split(&text);
        let count = fields.len();
        for (i, field) in fields.into_iter().enumerate() {
            array.set((i + 1).to_string(), field);
        }
        Ok(Value::scalar(count.to_string()))
    }

    /// Scalars are copied into the callee's frame and arrays are shared. A
    /// name the caller never used is passed empty; if the callee turns it
    /// into an array, the caller's name is bound to that array afterwards.
    fn call_user_function<W: Write>(
        &mut self,
        function: &'a FunctionDef,
        args: &[Expr],
        output: &mut W,
    ) -> Result<Value> {
        if args.len() != function.params.len() {
            return Err(RuntimeError::Arity {
                function: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
                variadic: false,
            }
            .into());
        }

        let mut frame = HashMap::with_capacity(args.len());
        let mut unbound = Vec::new();
        for (param, arg) in function.params.iter().zip(args) {
            let value = match arg {
                Expr::Var {
                    name, index: None, ..
                } => {
                    let value = self.read_var(name);
                    if matches!(value, Value::Uninit) {
                        unbound.push((param, name));
                    }
                    value
                }
                other => Value::Scalar(self.eval_scalar(other, output)?),
            };
            frame.insert(param.clone(), value);
        }

        trace!(function = %function.name, depth = self.frames.len() + 1, "call");
        self.frames.push(frame);
        let result = self.execute_block(&function.body, output);
        let frame = self.frames.pop().unwrap_or_default();

        for (param, name) in unbound {
            if let Some(Value::Array(array)) = frame.get(param) {
                let slot = self.slot(name);
                if matches!(slot, Value::Uninit) {
                    *slot = Value::Array(array.clone());
                }
            }
        }

        match result? {
            StmtResult::Normal => Ok(Value::scalar("")),
            StmtResult::Return(value) => Ok(Value::Scalar(value.unwrap_or_default())),
            other => Err(RuntimeError::ControlFlowEscape {
                signal: other.signal_name(),
            }
            .into()),
        }
    }
}

/// Replace the first (or every) match of `regex` in `target`. In the
/// replacement `&` stands for the matched text and `\&` for a literal `&`.
fn substitute(regex: &Regex, target: &str, replacement: &str, global: bool) -> (String, usize) {
    let mut result = String::with_capacity(target.len());
    let mut last = 0;
    let mut count = 0;

    for m in regex.find_iter(target) {
        result.push_str(&target[last..m.start()]);
        expand_replacement(replacement, m.as_str(), &mut result);
        last = m.end();
        count += 1;
        if !global {
            break;
        }
    }
    result.push_str(&target[last..]);
    (result, count)
}

fn expand_replacement(replacement: &str, matched: &str, out: &mut String) {
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'&') => {
                chars.next();
                out.push('&');
            }
            '&' => out.push_str(matched),
            c => out.push(c),
        }
    }
}

/// Characters `start..start+length` (1-based, rounded), clamped to the text.
fn substr(text: &str, start: f64, length: Option<f64>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let start = start.round();
    let end = match length {
        Some(length) => start + length.round(),
        None => f64::INFINITY,
    };

    let first = start.max(1.0);
    let last = end.min(chars.len() as f64 + 1.0);
    if last <= first {
        return String::new();
    }
    chars[first as usize - 1..last as usize - 1].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run_program(program: &str, input: &str) -> Result<String> {
        let tokens = Lexer::new(program).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        let mut interpreter = Interpreter::new(&program);
        let mut output = Vec::new();
        interpreter.run(input.as_bytes(), &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    fn run_awk(program: &str, input: &str) -> String {
        run_program(program, input).unwrap()
    }

    fn runtime_error(program: &str) -> RuntimeError {
        match run_program(program, "") {
            Err(Error::Runtime(e)) => e,
            other => panic!("expected a runtime error, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::ALL.iter().filter(|b| b.name() == builtin.name()).count(), 1);
        }
    }

    #[test]
    fn test_signature_check() {
        assert!(Signature::Fixed(2).check("index", 2).is_ok());
        assert!(Signature::Optional { required: 2, max: 3 }.check("sub", 3).is_ok());
        assert!(matches!(
            Signature::Optional { required: 2, max: 3 }.check("sub", 4),
            Err(Error::Runtime(RuntimeError::TooManyArguments { found: 4, max: 3, .. }))
        ));
        assert!(matches!(
            Signature::Variadic { required: 1 }.check("printf", 0),
            Err(Error::Runtime(RuntimeError::Arity { variadic: true, .. }))
        ));
    }

    #[test]
    fn test_printf_and_sprintf() {
        let output = run_awk("BEGIN { printf \"%d %s\\n\", 42, \"hello\"; print sprintf(\"%05.1f|%-3s|\", 3.14159, \"x\") }", "");
        assert_eq!(output, "42 hello\n003.1|x  |\n");
    }

    #[test]
    fn test_printf_needs_format() {
        assert_eq!(
            runtime_error("BEGIN { x = sprintf() }"),
            RuntimeError::Arity {
                function: "sprintf".to_string(),
                expected: 1,
                found: 0,
                variadic: true,
            }
        );
    }

    #[test]
    fn test_getline_plain_and_into_variable() {
        let output = run_awk(
            "NR == 1 { getline; print \"now\", $0, NR; getline line; print \"line\", line, NR, $0 }",
            "one\ntwo\nthree",
        );
        assert_eq!(output, "now two 2\nline three 2 two\n");
    }

    #[test]
    fn test_getline_at_end_of_input() {
        let output = run_awk("BEGIN { while ((getline line) > 0) n++; print n, (getline) }", "a\nb");
        assert_eq!(output, "2 0\n");
    }

    #[test]
    fn test_sub_and_gsub() {
        let output = run_awk(
            "BEGIN { x = \"hello\"; n = sub(/l/, \"L\", x); m = gsub(/l/, \"[&]\", x); print n, m, x }",
            "",
        );
        assert_eq!(output, "1 1 heL[l]o\n");
    }

    #[test]
    fn test_gsub_literal_ampersand() {
        let output = run_awk("BEGIN { s = \"a.b\"; gsub(/\\./, \"\\\\&\", s); print s }", "");
        assert_eq!(output, "a&b\n");
    }

    #[test]
    fn test_gsub_defaults_to_record() {
        let output = run_awk("{ gsub(/a/, \"b\"); print; print $1 }", "aa ca");
        assert_eq!(output, "bb cb\nbb\n");
    }

    #[test]
    fn test_sub_into_field_and_element() {
        let output = run_awk("{ sub(/x/, \"y\", $2); a[1] = \"xx\"; gsub(/x/, \"z\", a[1]); print $0, a[1] }", "x x x");
        assert_eq!(output, "x y x zz\n");
    }

    #[test]
    fn test_sub_without_match_leaves_target() {
        let output = run_awk("{ n = sub(/q/, \"r\"); print n, $0, NF }", "a   b");
        assert_eq!(output, "0 a   b 2\n");
    }

    #[test]
    fn test_match_sets_rstart_rlength() {
        let output = run_awk(
            "BEGIN { print match(\"foobar\", /o+/), RSTART, RLENGTH; print match(\"abc\", /z/), RSTART, RLENGTH }",
            "",
        );
        assert_eq!(output, "2 2 2\n0 0 -1\n");
    }

    #[test]
    fn test_index_and_length() {
        let output = run_awk("{ print index($0, \"lo\"), index($0, \"z\"), length($1), length(), length }", "hello world");
        assert_eq!(output, "4 0 5 11 11\n");
    }

    #[test]
    fn test_length_of_array() {
        assert_eq!(run_awk("BEGIN { a[1]; a[2]; print length(a) }", ""), "2\n");
    }

    #[test]
    fn test_split() {
        let output = run_awk(
            "BEGIN { n = split(\"1,2,,4\", arr, \",\"); print n, arr[1], arr[2], \"[\" arr[3] \"]\", arr[4] }",
            "",
        );
        assert_eq!(output, "4 1 2 [] 4\n");
    }

    #[test]
    fn test_split_clears_and_uses_fs() {
        let output = run_awk(
            "BEGIN { FS = \":\"; a[9] = 1; n = split(\"x:y\", a); print n, length(a), (9 in a) }",
            "",
        );
        assert_eq!(output, "2 2 0\n");
    }

    #[test]
    fn test_split_into_scalar_fails() {
        assert_eq!(
            runtime_error("BEGIN { s = \"v\"; split(\"a b\", s) }"),
            RuntimeError::ExpectedArray {
                name: "s".to_string(),
                contents: "v".to_string()
            }
        );
    }

    #[test]
    fn test_substr_clamps() {
        assert_eq!(substr("hello", 2.0, Some(3.0)), "ell");
        assert_eq!(substr("hello", 0.0, None), "hello");
        assert_eq!(substr("hello", -1.0, Some(3.0)), "h");
        assert_eq!(substr("hello", 4.0, Some(10.0)), "lo");
        assert_eq!(substr("hello", 9.0, None), "");
        assert_eq!(substr("hello", 2.0, Some(-1.0)), "");
        assert_eq!(substr("héllo", 2.0, Some(1.0)), "é");
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(run_awk("BEGIN { print tolower(\"MiXeD\"), toupper(\"MiXeD\") }", ""), "mixed MIXED\n");
    }

    #[test]
    fn test_too_many_arguments() {
        assert_eq!(
            runtime_error("BEGIN { substr(\"a\", 1, 1, 1) }"),
            RuntimeError::TooManyArguments {
                function: "substr".to_string(),
                found: 4,
                max: 3
            }
        );
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            runtime_error("BEGIN { nope(1) }"),
            RuntimeError::FunctionNotFound {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_user_function_arity() {
        assert_eq!(
            runtime_error("function f(a, b) { return a + b } BEGIN { f(1, 2, 3) }"),
            RuntimeError::Arity {
                function: "f".to_string(),
                expected: 2,
                found: 3,
                variadic: false
            }
        );
    }

    #[test]
    fn test_scalar_arguments_are_copied() {
        let output = run_awk("function f(a) { a = a + 1; return a } BEGIN { x = 5; print f(x), x }", "");
        assert_eq!(output, "6 5\n");
    }

    #[test]
    fn test_array_arguments_are_shared() {
        let output = run_awk(
            "function g(a) { a[\"k\"] = \"v\" } BEGIN { arr[\"seed\"]; g(arr); print arr[\"k\"] }",
            "",
        );
        assert_eq!(output, "v\n");
    }

    #[test]
    fn test_function_without_return_yields_empty() {
        assert_eq!(run_awk("function f() { x = 1 } BEGIN { print \"[\" f() \"]\" }", ""), "[]\n");
    }

    #[test]
    fn test_frame_popped_after_error() {
        let tokens = Lexer::new("function f(a) { return a + \"bad\" } BEGIN { f(1) }")
            .tokenize()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::new(&program);
        let mut output = Vec::new();
        assert!(interpreter.run(std::io::empty(), &mut output).is_err());
        assert!(interpreter.frames.is_empty());
    }
}
