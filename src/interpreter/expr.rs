use std::io::Write;

use crate::ast::*;
use crate::error::{Result, RuntimeError};
use crate::value::{Value, compare_scalars, parse_number};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    /// Evaluate an expression. `output` is threaded through for calls such as
    /// `printf` that write.
    pub(crate) fn eval<W: Write>(&mut self, expr: &Expr, output: &mut W) -> Result<Value> {
        match expr {
            // A pattern literal used as a value is just its source text.
            Expr::Number(text, _) | Expr::String(text, _) | Expr::Regex(text, _) => {
                Ok(Value::scalar(text.as_str()))
            }

            Expr::Var {
                name, index: None, ..
            } => Ok(self.read_var(name)),

            Expr::Var {
                name,
                index: Some(index),
                ..
            } => {
                let key = self.eval_scalar(index, output)?;
                Ok(Value::Scalar(self.array_for(name)?.get(&key)))
            }

            Expr::Field(index, _) => {
                let index = self.field_index(index, output)?;
                Ok(Value::Scalar(self.record.get(index)))
            }

            Expr::Binary {
                left, op, right, ..
            } => self.eval_binary(left, *op, right, output),

            Expr::Unary { op, operand, .. } => self.eval_unary(*op, operand, output),

            Expr::Assign {
                target, op, value, ..
            } => self.eval_assignment(target, *op, value, output),

            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if self.eval(condition, output)?.is_truthy()? {
                    self.eval(then_expr, output)
                } else {
                    self.eval(else_expr, output)
                }
            }

            Expr::Call { name, args, .. } => self.call(name, args, output),
        }
    }

    pub(crate) fn eval_scalar<W: Write>(&mut self, expr: &Expr, output: &mut W) -> Result<String> {
        self.eval(expr, output)?.into_scalar()
    }

    pub(crate) fn eval_number<W: Write>(&mut self, expr: &Expr, output: &mut W) -> Result<f64> {
        self.eval(expr, output)?.to_number()
    }

    fn eval_binary<W: Write>(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        output: &mut W,
    ) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let result =
                    self.eval(left, output)?.is_truthy()? && self.eval(right, output)?.is_truthy()?;
                Ok(Value::from_bool(result))
            }
            BinaryOp::Or => {
                let result =
                    self.eval(left, output)?.is_truthy()? || self.eval(right, output)?.is_truthy()?;
                Ok(Value::from_bool(result))
            }

            BinaryOp::Match | BinaryOp::NotMatch => {
                let text = self.eval_scalar(left, output)?;
                let pattern = self.eval_scalar(right, output)?;
                let matched = self.regex(&pattern)?.is_match(&text);
                Ok(Value::from_bool(matched == (op == BinaryOp::Match)))
            }

            BinaryOp::In => self.eval_in(left, right, output),

            BinaryOp::Concat => {
                let mut text = self.eval_scalar(left, output)?;
                text.push_str(&self.eval_scalar(right, output)?);
                Ok(Value::Scalar(text))
            }

            BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => {
                let l = self.eval_scalar(left, output)?;
                let r = self.eval_scalar(right, output)?;
                let ordering = compare_scalars(&l, &r);
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    BinaryOp::Ge => ordering.is_ge(),
                    BinaryOp::Eq => ordering.is_eq(),
                    _ => ordering.is_ne(),
                };
                Ok(Value::from_bool(result))
            }

            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Mod
            | BinaryOp::Pow => {
                let l = self.eval_number(left, output)?;
                let r = self.eval_number(right, output)?;
                Ok(Value::Scalar(self.number_text(arithmetic(op, l, r)?)?))
            }
        }
    }

    /// `key in array`. The right side has to name an array (or a variable
    /// never used before, which becomes one).
    fn eval_in<W: Write>(&mut self, key: &Expr, array: &Expr, output: &mut W) -> Result<Value> {
        let key = self.eval_scalar(key, output)?;
        match array {
            Expr::Var {
                name, index: None, ..
            } => Ok(Value::from_bool(self.array_for(name)?.contains(&key))),
            other => {
                let contents = self.eval_scalar(other, output)?;
                Err(RuntimeError::ExpectedArray {
                    name: other.to_string(),
                    contents,
                }
                .into())
            }
        }
    }

    fn eval_unary<W: Write>(&mut self, op: UnaryOp, operand: &Expr, output: &mut W) -> Result<Value> {
        match op {
            UnaryOp::Not => Ok(Value::from_bool(!self.eval(operand, output)?.is_truthy()?)),
            UnaryOp::Neg => {
                let n = self.eval_number(operand, output)?;
                Ok(Value::Scalar(self.number_text(-n)?))
            }
            UnaryOp::Pos => {
                let n = self.eval_number(operand, output)?;
                Ok(Value::Scalar(self.number_text(n)?))
            }
            UnaryOp::PreIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostIncrement
            | UnaryOp::PostDecrement => {
                let place = self.resolve_place(operand, output)?;
                let old = parse_number(&self.read_place(&place)?)?;
                let delta = match op {
                    UnaryOp::PreIncrement | UnaryOp::PostIncrement => 1.0,
                    _ => -1.0,
                };
                let new = self.number_text(old + delta)?;
                self.write_place(&place, new.clone())?;

                if matches!(op, UnaryOp::PreIncrement | UnaryOp::PreDecrement) {
                    Ok(Value::Scalar(new))
                } else {
                    Ok(Value::Scalar(self.number_text(old)?))
                }
            }
        }
    }

    fn eval_assignment<W: Write>(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
        output: &mut W,
    ) -> Result<Value> {
        let rhs = self.eval_scalar(value, output)?;
        let place = self.resolve_place(target, output)?;

        let text = match op.binary_op() {
            None => rhs,
            Some(bin) => {
                let current = parse_number(&self.read_place(&place)?)?;
                let n = arithmetic(bin, current, parse_number(&rhs)?)?;
                self.number_text(n)?
            }
        };

        self.write_place(&place, text.clone())?;
        Ok(Value::Scalar(text))
    }
}

fn arithmetic(op: BinaryOp, l: f64, r: f64) -> Result<f64> {
    Ok(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div | BinaryOp::Mod if r == 0.0 => {
            return Err(RuntimeError::DivisionByZero.into());
        }
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
        BinaryOp::Pow => l.powf(r),
        _ => unreachable!("{op:?} is not arithmetic"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval_str(source: &str) -> Result<String> {
        let tokens = Lexer::new(&format!("BEGIN {{ print {source} }}")).tokenize()?;
        let program = Parser::new(tokens).parse()?;
        let mut interpreter = Interpreter::new(&program);
        let mut output = Vec::new();
        interpreter.run(std::io::empty(), &mut output)?;
        let mut text = String::from_utf8(output).unwrap();
        text.pop();
        Ok(text)
    }

    fn eval(source: &str) -> String {
        eval_str(source).unwrap()
    }

    #[test]
    fn test_comparison_numeric_and_string() {
        assert_eq!(eval("(10 < 9), (\"10\" < \"9\"), (\"abc\" < \"abd\")"), "0 0 1");
        assert_eq!(eval("(\"1.0\" == 1), (\"x\" != \"y\")"), "1 1");
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(eval("\"a\" \"b\" 1 + 2"), "ab3");
        assert_eq!(eval("1 \" \" 2"), "1 2");
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(eval("(0 && (x = 1)), x"), "0 ");
        assert_eq!(eval("(1 || (y = 1)), y"), "1 ");
        assert_eq!(eval("(\"word\" || 0)"), "0");
    }

    #[test]
    fn test_match_operator_is_unanchored() {
        assert_eq!(eval("(\"foobar\" ~ /oba/), (\"foobar\" !~ \"^bar\")"), "1 1");
        assert_eq!(eval("(\"abc\" ~ \"x\")"), "0");
    }

    #[test]
    fn test_regex_literal_as_value() {
        assert_eq!(eval("/a+b/"), "a+b");
    }

    #[test]
    fn test_in_operator() {
        assert_eq!(eval("(\"k\" in fresh)"), "0");
        let err = eval_str("(\"k\" in $1)").unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::ExpectedArray { ref name, .. }) if name == "$1"
        ));
    }

    #[test]
    fn test_increments() {
        assert_eq!(eval("x++, x, ++x, x--, --x"), "0 1 2 2 0");
        assert_eq!(eval("a[\"k\"]++ a[\"k\"]++, a[\"k\"]"), "01 2");
    }

    #[test]
    fn test_increment_needs_variable() {
        let err = eval_str("++(1 + 2)").unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::NotAVariable { ref target }) if target == "(1 + 2)"
        ));
    }

    #[test]
    fn test_assignment_value_and_chain() {
        assert_eq!(eval("(a = b = 3), a, b"), "3 3 3");
        assert_eq!(eval("(n = 5) (n += 2) (n *= 2) (n -= 4) (n /= 2) (n %= 4) (n ^= 3)"), "571410511");
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        assert_eq!(eval("1 ? 2 : 3"), "2");
        assert_eq!(eval("(0 ? a = 1 : (b = 2)), a, b"), "2  2");
    }

    #[test]
    fn test_unary_minus_and_not() {
        assert_eq!(eval("-\"3\", +\" 4 \", !0, !\"1\""), "-3 4 1 0");
    }

    #[test]
    fn test_non_numeric_arithmetic_fails() {
        let err = eval_str("\"abc\" + 1").unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::ExpectedNumber { ref value }) if value == "abc"
        ));
    }

    #[test]
    fn test_division_by_zero() {
        for source in ["1 / 0", "1 % 0", "x /= 0"] {
            let err = eval_str(source).unwrap_err();
            assert!(
                matches!(err, Error::Runtime(RuntimeError::DivisionByZero)),
                "{source}: {err:?}"
            );
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        assert_eq!(eval("2 ^ 3 ^ 2"), "512");
        assert_eq!(eval("-2 ^ 2"), "-4");
        assert_eq!(eval("!2 ^ 0"), "0");
        assert_eq!(eval("2 ^ -1"), "0.5");
    }
}
