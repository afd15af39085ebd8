use std::collections::HashSet;

use tracing::debug;

use crate::ast::*;
use crate::error::{Error, Result, SourceLocation};
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser over a token vector
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// While parsing unparenthesized `print` arguments a bare `>` would be an
    /// output redirection, which is not supported, so it is left unconsumed.
    in_print_args: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            in_print_args: false,
        }
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> Result<Program> {
        let mut program = Program::new();
        let mut seen_functions = HashSet::new();

        self.skip_terminators();
        while !self.is_at_end() {
            if self.check(&TokenKind::Function) {
                let function = self.parse_function()?;
                if !seen_functions.insert(function.name.clone()) {
                    let loc = function.location;
                    return Err(Error::parser(
                        format!("function {} is defined more than once", function.name),
                        loc.line,
                        loc.column,
                    ));
                }
                program.functions.push(function);
            } else {
                self.parse_action(&mut program)?;
            }
            self.skip_terminators();
        }

        debug!(
            begin = program.begin_blocks.len(),
            main = program.main_blocks.len(),
            end = program.end_blocks.len(),
            functions = program.functions.len(),
            "parsed program"
        );
        Ok(program)
    }

    /// `function name(a, b, ...) { ... }`
    fn parse_function(&mut self) -> Result<FunctionDef> {
        let location = self.current_location();
        self.expect(&TokenKind::Function)?;

        let name = self.expect_identifier()?;
        let params = self.parse_params(&name)?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            body,
            location,
        })
    }

    fn parse_params(&mut self, function: &str) -> Result<Vec<String>> {
        self.expect(&TokenKind::LeftParen)?;

        let mut params = Vec::new();
        if self.match_token(&TokenKind::RightParen) {
            return Ok(params);
        }

        loop {
            match self.peek_kind() {
                Some(TokenKind::Identifier(param)) => {
                    params.push(param.clone());
                    self.advance();
                }
                Some(TokenKind::Comma) => {
                    return Err(self.error_here(format!(
                        "empty parameter in definition of {function}"
                    )));
                }
                Some(TokenKind::RightParen) => {
                    return Err(self.error_here(format!(
                        "trailing comma in parameter list of {function}"
                    )));
                }
                _ => {
                    return Err(self.error_here(format!(
                        "expected parameter name in definition of {function}, found {}",
                        self.describe_current()
                    )));
                }
            }

            if self.match_token(&TokenKind::Comma) {
                self.skip_newlines();
            } else if self.match_token(&TokenKind::RightParen) {
                return Ok(params);
            } else {
                return Err(self.error_here(format!(
                    "missing ')' after parameters of {function}, found {}",
                    self.describe_current()
                )));
            }
        }
    }

    /// `BEGIN block`, `END block` or `[guard] block`
    fn parse_action(&mut self, program: &mut Program) -> Result<()> {
        if self.match_token(&TokenKind::Begin) {
            self.skip_newlines();
            let body = self.parse_block()?;
            program.begin_blocks.push(Action { guard: None, body });
            return Ok(());
        }

        if self.match_token(&TokenKind::End) {
            self.skip_newlines();
            let body = self.parse_block()?;
            program.end_blocks.push(Action { guard: None, body });
            return Ok(());
        }

        let guard = if self.check(&TokenKind::LeftBrace) {
            None
        } else {
            Some(self.parse_guard()?)
        };
        self.skip_newlines();
        if !self.check(&TokenKind::LeftBrace) {
            return Err(self.error_here(format!(
                "expected '{{' to start an action, found {}",
                self.describe_current()
            )));
        }
        let body = self.parse_block()?;
        program.main_blocks.push(Action { guard, body });
        Ok(())
    }

    /// A guard that is a lone pattern literal means `$0 ~ pattern`.
    fn parse_guard(&mut self) -> Result<Expr> {
        let guard = self.parse_expression()?;
        Ok(match guard {
            Expr::Regex(_, location) => Expr::Binary {
                left: Box::new(Expr::Field(
                    Box::new(Expr::Number("0".to_string(), location)),
                    location,
                )),
                op: BinaryOp::Match,
                right: Box::new(guard),
                location,
            },
            other => other,
        })
    }

    /// Parse a block { ... }
    fn parse_block(&mut self) -> Result<Block> {
        let location = self.current_location();
        self.expect(&TokenKind::LeftBrace)?;

        let mut statements = Vec::new();
        self.skip_terminators();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.skip_terminators();
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(Block::new(statements, location))
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        self.skip_newlines();
        let location = self.current_location();

        let Some(kind) = self.peek_kind().cloned() else {
            return Err(self.error_here("expected a statement"));
        };

        match kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => {
                self.advance();
                self.parse_if_statement(location)
            }
            TokenKind::While => {
                self.advance();
                self.parse_while_statement(location)
            }
            TokenKind::For => {
                self.advance();
                self.parse_for_statement(location)
            }
            TokenKind::Do => {
                self.advance();
                self.parse_do_while_statement(location)
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt::Continue { location })
            }
            TokenKind::Return => {
                self.advance();
                let value = self.parse_optional_expression()?;
                Ok(Stmt::Return { value, location })
            }
            TokenKind::Delete => {
                self.advance();
                let target = self.parse_lvalue("delete")?;
                Ok(Stmt::Delete { target, location })
            }
            TokenKind::Next => {
                self.advance();
                Ok(Stmt::Expr(call("next", Vec::new(), location)))
            }
            TokenKind::Exit => {
                self.advance();
                let args = self.parse_optional_expression()?.into_iter().collect();
                Ok(Stmt::Expr(call("exit", args, location)))
            }
            TokenKind::Print | TokenKind::Printf => {
                let name = if matches!(kind, TokenKind::Print) {
                    "print"
                } else {
                    "printf"
                };
                self.advance();
                let args = self.parse_print_args()?;
                if self.check(&TokenKind::Greater) {
                    return Err(self.error_here("output redirection is not supported"));
                }
                Ok(Stmt::Expr(call(name, args, location)))
            }
            _ => Ok(Stmt::Expr(self.parse_expression()?)),
        }
    }

    fn parse_if_statement(&mut self, location: SourceLocation) -> Result<Stmt> {
        let condition = self.parse_condition()?;
        self.skip_newlines();
        let then_branch = Box::new(self.parse_statement()?);

        // `else` may follow on a later line or after a semicolon.
        let saved_pos = self.current;
        self.skip_terminators();
        let else_branch = if self.match_token(&TokenKind::Else) {
            self.skip_newlines();
            Some(Box::new(self.parse_statement()?))
        } else {
            self.current = saved_pos;
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_while_statement(&mut self, location: SourceLocation) -> Result<Stmt> {
        let condition = self.parse_condition()?;
        self.skip_newlines();
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    fn parse_for_statement(&mut self, location: SourceLocation) -> Result<Stmt> {
        self.expect(&TokenKind::LeftParen)?;

        // for (var in array)
        if let Some(TokenKind::Identifier(name)) = self.peek_kind() {
            let name = name.clone();
            let saved_pos = self.current;
            self.advance();

            if self.match_token(&TokenKind::In) {
                let iterable = self.parse_lvalue("in")?;
                self.expect(&TokenKind::RightParen)?;
                self.skip_newlines();
                let body = Box::new(self.parse_statement()?);

                return Ok(Stmt::ForIn {
                    var: name,
                    iterable,
                    body,
                    location,
                });
            }

            self.current = saved_pos;
        }

        let init = self.parse_for_clause(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon)?;
        self.skip_newlines();
        let condition = self.parse_for_clause(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon)?;
        self.skip_newlines();
        let update = self.parse_for_clause(&TokenKind::RightParen)?;
        self.expect(&TokenKind::RightParen)?;
        self.skip_newlines();

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
            location,
        })
    }

    fn parse_for_clause(&mut self, terminator: &TokenKind) -> Result<Option<Expr>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            self.parse_expression().map(Some)
        }
    }

    fn parse_do_while_statement(&mut self, location: SourceLocation) -> Result<Stmt> {
        self.skip_newlines();
        let body = Box::new(self.parse_statement()?);
        self.skip_terminators();
        self.expect(&TokenKind::While)?;
        let condition = self.parse_condition()?;

        Ok(Stmt::DoWhile {
            body,
            condition,
            location,
        })
    }

    /// `( expr )` after `if`, `while` and `do ... while`
    fn parse_condition(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LeftParen)?;
        let condition = self.with_print_args(false, Self::parse_expression)?;
        self.expect(&TokenKind::RightParen)?;
        Ok(condition)
    }

    fn parse_optional_expression(&mut self) -> Result<Option<Expr>> {
        if self.can_start_expression() {
            self.parse_expression().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Arguments of `print`/`printf`. A parenthesized list is the whole
    /// argument list only when the statement ends right after it.
    fn parse_print_args(&mut self) -> Result<Vec<Expr>> {
        if self.check(&TokenKind::LeftParen) {
            let saved_pos = self.current;
            if let Ok(args) = self.parse_parenthesized_list() {
                if self.at_statement_end() {
                    return Ok(args);
                }
            }
            self.current = saved_pos;
        }

        if !self.can_start_expression() {
            return Ok(Vec::new());
        }
        self.with_print_args(true, Self::parse_expression_list)
    }

    fn parse_parenthesized_list(&mut self) -> Result<Vec<Expr>> {
        self.expect(&TokenKind::LeftParen)?;
        let args = self.with_print_args(false, Self::parse_expression_list)?;
        self.expect(&TokenKind::RightParen)?;
        Ok(args)
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expr>> {
        let mut items = vec![self.parse_expression()?];
        while self.match_token(&TokenKind::Comma) {
            self.skip_newlines();
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    /// A variable, array element or `$` field; used after `delete`, `in` and `getline`.
    fn parse_lvalue(&mut self, context: &str) -> Result<Expr> {
        match self.peek_kind() {
            Some(TokenKind::Dollar) => self.parse_field(),
            Some(TokenKind::Identifier(_)) => {
                let location = self.current_location();
                let name = self.expect_identifier()?;
                let index = self.parse_subscript()?;
                Ok(Expr::Var {
                    name,
                    index,
                    location,
                })
            }
            _ => Err(self.error_here(format!(
                "expected a variable after '{context}', found {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_subscript(&mut self) -> Result<Option<Box<Expr>>> {
        if !self.match_token(&TokenKind::LeftBracket) {
            return Ok(None);
        }
        let index = self.with_print_args(false, Self::parse_expression)?;
        self.expect(&TokenKind::RightBracket)?;
        Ok(Some(Box::new(index)))
    }

    /// Parse an expression
    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        let expr = self.parse_ternary()?;

        let location = self.current_location();
        let op = match self.peek_kind() {
            Some(TokenKind::Assign) => AssignOp::Assign,
            Some(TokenKind::PlusAssign) => AssignOp::AddAssign,
            Some(TokenKind::MinusAssign) => AssignOp::SubAssign,
            Some(TokenKind::StarAssign) => AssignOp::MulAssign,
            Some(TokenKind::SlashAssign) => AssignOp::DivAssign,
            Some(TokenKind::PercentAssign) => AssignOp::ModAssign,
            Some(TokenKind::CaretAssign) => AssignOp::PowAssign,
            _ => return Ok(expr),
        };
        self.advance();
        self.skip_newlines();

        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            target: Box::new(expr),
            op,
            value: Box::new(value),
            location,
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let condition = self.parse_or()?;

        let location = self.current_location();
        if !self.match_token(&TokenKind::Question) {
            return Ok(condition);
        }
        self.skip_newlines();
        let then_expr = self.parse_expression()?;
        self.skip_newlines();
        self.expect(&TokenKind::Colon)?;
        self.skip_newlines();
        let else_expr = self.parse_ternary()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            location,
        })
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let left = self.parse_and()?;
        let location = self.current_location();
        if !self.match_token(&TokenKind::Or) {
            return Ok(left);
        }
        self.skip_newlines();
        let right = self.parse_or()?;
        Ok(binary(left, BinaryOp::Or, right, location))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let left = self.parse_in()?;
        let location = self.current_location();
        if !self.match_token(&TokenKind::And) {
            return Ok(left);
        }
        self.skip_newlines();
        let right = self.parse_and()?;
        Ok(binary(left, BinaryOp::And, right, location))
    }

    fn parse_in(&mut self) -> Result<Expr> {
        let mut expr = self.parse_match()?;

        loop {
            let location = self.current_location();
            if !self.match_token(&TokenKind::In) {
                return Ok(expr);
            }
            let array = self.parse_lvalue("in")?;
            expr = binary(expr, BinaryOp::In, array, location);
        }
    }

    /// At most one `~`/`!~` per level.
    fn parse_match(&mut self) -> Result<Expr> {
        let left = self.parse_comparison()?;

        let location = self.current_location();
        let op = match self.peek_kind() {
            Some(TokenKind::Match) => BinaryOp::Match,
            Some(TokenKind::NotMatch) => BinaryOp::NotMatch,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_comparison()?;
        Ok(binary(left, op, right, location))
    }

    /// At most one relational operator per level.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_concat()?;

        let location = self.current_location();
        let op = match self.peek_kind() {
            Some(TokenKind::Less) => BinaryOp::Lt,
            Some(TokenKind::LessEqual) => BinaryOp::Le,
            Some(TokenKind::Greater) if !self.in_print_args => BinaryOp::Gt,
            Some(TokenKind::GreaterEqual) => BinaryOp::Ge,
            Some(TokenKind::Equal) => BinaryOp::Eq,
            Some(TokenKind::NotEqual) => BinaryOp::Ne,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_concat()?;
        Ok(binary(left, op, right, location))
    }

    fn parse_concat(&mut self) -> Result<Expr> {
        let mut expr = self.parse_additive()?;

        while self.can_start_concat_operand() {
            let location = expr.location();
            let right = self.parse_additive()?;
            expr = binary(expr, BinaryOp::Concat, right, location);
        }

        Ok(expr)
    }

    /// `+` and `-` are never the start of a concatenated operand.
    fn can_start_concat_operand(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Number(_)
                    | TokenKind::String(_)
                    | TokenKind::Identifier(_)
                    | TokenKind::Dollar
                    | TokenKind::LeftParen
                    | TokenKind::Not
                    | TokenKind::Increment
                    | TokenKind::Decrement
            )
        )
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut expr = self.parse_multiplicative()?;

        loop {
            let location = self.current_location();
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.advance();

            let right = self.parse_multiplicative()?;
            expr = binary(expr, op, right, location);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut expr = self.parse_power()?;

        loop {
            let location = self.current_location();
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => return Ok(expr),
            };
            self.advance();

            let right = self.parse_power()?;
            expr = binary(expr, op, right, location);
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;

        // Exponentiation is right-associative
        let location = self.current_location();
        if self.match_token(&TokenKind::Caret) {
            let exponent = self.parse_power()?;
            return Ok(binary(base, BinaryOp::Pow, exponent, location));
        }

        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let location = self.current_location();

        let op = match self.peek_kind() {
            Some(TokenKind::Not) => UnaryOp::Not,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Pos,
            Some(TokenKind::Increment) => UnaryOp::PreIncrement,
            Some(TokenKind::Decrement) => UnaryOp::PreDecrement,
            _ => return self.parse_postfix(),
        };
        self.advance();

        // `-2 ^ 2` is `-(2 ^ 2)`; `++` and `--` stay on their lvalue.
        let operand = match op {
            UnaryOp::PreIncrement | UnaryOp::PreDecrement => self.parse_unary()?,
            _ => self.parse_power()?,
        };
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let expr = self.parse_field()?;
        if !expr.is_lvalue() {
            return Ok(expr);
        }

        let location = self.current_location();
        let op = match self.peek_kind() {
            Some(TokenKind::Increment) => UnaryOp::PostIncrement,
            Some(TokenKind::Decrement) => UnaryOp::PostDecrement,
            _ => return Ok(expr),
        };
        self.advance();

        Ok(Expr::Unary {
            op,
            operand: Box::new(expr),
            location,
        })
    }

    /// `$` binds to the primary that follows, so `$i++` is `($i)++` and
    /// `$NF-1` is `($NF)-1`. A prefix operator after `$` is part of the index.
    fn parse_field(&mut self) -> Result<Expr> {
        let location = self.current_location();
        if !self.match_token(&TokenKind::Dollar) {
            return self.parse_primary();
        }

        let index = match self.peek_kind() {
            Some(
                TokenKind::Increment
                | TokenKind::Decrement
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Not,
            ) => self.parse_unary()?,
            _ => self.parse_field()?,
        };
        Ok(Expr::Field(Box::new(index), location))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let location = self.current_location();

        let Some(kind) = self.peek_kind().cloned() else {
            return Err(self.error_here("unexpected end of input"));
        };

        match kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n, location))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s, location))
            }
            TokenKind::Regex(r) => {
                self.advance();
                Ok(Expr::Regex(r, location))
            }
            TokenKind::Identifier(name) => {
                self.advance();

                if self.match_token(&TokenKind::LeftParen) {
                    let args = if self.check(&TokenKind::RightParen) {
                        Vec::new()
                    } else {
                        self.with_print_args(false, Self::parse_expression_list)?
                    };
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(call(&name, args, location));
                }

                // `length` without parentheses means length($0)
                if name == "length" {
                    return Ok(call("length", Vec::new(), location));
                }

                let index = self.parse_subscript()?;
                Ok(Expr::Var {
                    name,
                    index,
                    location,
                })
            }
            TokenKind::Getline => {
                self.advance();
                let args = match self.peek_kind() {
                    Some(TokenKind::Identifier(_) | TokenKind::Dollar) => {
                        vec![self.parse_lvalue("getline")?]
                    }
                    _ => Vec::new(),
                };
                Ok(call("getline", args, location))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.with_print_args(false, Self::parse_expression)?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            other => Err(Error::parser(
                format!("unexpected {}", other.describe()),
                location.line,
                location.column,
            )),
        }
    }

    // ===== Helper methods =====

    fn with_print_args<T>(
        &mut self,
        in_print_args: bool,
        parse: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.in_print_args, in_print_args);
        let result = parse(self);
        self.in_print_args = saved;
        result
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.current).map(|t| &t.kind)
    }

    fn current_location(&self) -> SourceLocation {
        self.tokens
            .get(self.current)
            .or(self.tokens.last())
            .map_or(SourceLocation::new(1, 1), |t| t.location)
    }

    fn describe_current(&self) -> String {
        self.peek_kind()
            .map_or_else(|| "end of input".to_string(), TokenKind::describe)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let loc = self.current_location();
        Error::parser(message, loc.line, loc.column)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), None | Some(TokenKind::Eof))
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
            )
        )
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind()
            .is_some_and(|k| std::mem::discriminant(k) == std::mem::discriminant(kind))
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected {}, found {}",
                kind.describe(),
                self.describe_current()
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if let Some(TokenKind::Identifier(name)) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(format!(
                "expected identifier, found {}",
                self.describe_current()
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    fn skip_terminators(&mut self) {
        while self.match_token(&TokenKind::Newline) || self.match_token(&TokenKind::Semicolon) {}
    }

    fn can_start_expression(&self) -> bool {
        self.peek_kind()
            .is_some_and(TokenKind::can_start_expression)
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr, location: SourceLocation) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        location,
    }
}

fn call(name: &str, args: Vec<Expr>, location: SourceLocation) -> Expr {
    Expr::Call {
        name: name.to_string(),
        args,
        location,
    }
}
