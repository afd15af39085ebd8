use std::io::Write;

use crate::ast::*;
use crate::error::{Result, RuntimeError};
use crate::value::Value;

use super::Interpreter;

/// Result of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum StmtResult {
    Normal,
    Break,
    Continue,
    Return(Option<String>),
}

impl StmtResult {
    /// Keyword that produced this signal, for escape errors.
    pub fn signal_name(&self) -> &'static str {
        match self {
            StmtResult::Normal => "normal",
            StmtResult::Break => "break",
            StmtResult::Continue => "continue",
            StmtResult::Return(_) => "return",
        }
    }
}

/// What a loop does after its body ran.
enum LoopStep {
    Next,
    Stop,
    Propagate(StmtResult),
}

impl From<StmtResult> for LoopStep {
    fn from(result: StmtResult) -> Self {
        match result {
            StmtResult::Normal | StmtResult::Continue => LoopStep::Next,
            StmtResult::Break => LoopStep::Stop,
            ret @ StmtResult::Return(_) => LoopStep::Propagate(ret),
        }
    }
}

impl<'a> Interpreter<'a> {
    pub fn execute_block<W: Write>(&mut self, block: &Block, output: &mut W) -> Result<StmtResult> {
        for stmt in &block.statements {
            match self.execute_stmt(stmt, output)? {
                StmtResult::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(StmtResult::Normal)
    }

    pub fn execute_stmt<W: Write>(&mut self, stmt: &Stmt, output: &mut W) -> Result<StmtResult> {
        match stmt {
            Stmt::Empty => Ok(StmtResult::Normal),

            Stmt::Expr(expr) => {
                self.eval(expr, output)?;
                Ok(StmtResult::Normal)
            }

            Stmt::Block(block) => self.execute_block(block, output),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.eval(condition, output)?.is_truthy()? {
                    self.execute_stmt(then_branch, output)
                } else if let Some(else_stmt) = else_branch {
                    self.execute_stmt(else_stmt, output)
                } else {
                    Ok(StmtResult::Normal)
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                while self.eval(condition, output)?.is_truthy()? {
                    match LoopStep::from(self.execute_stmt(body, output)?) {
                        LoopStep::Next => {}
                        LoopStep::Stop => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                }
                Ok(StmtResult::Normal)
            }

            Stmt::DoWhile {
                body, condition, ..
            } => {
                loop {
                    match LoopStep::from(self.execute_stmt(body, output)?) {
                        LoopStep::Next => {}
                        LoopStep::Stop => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                    if !self.eval(condition, output)?.is_truthy()? {
                        break;
                    }
                }
                Ok(StmtResult::Normal)
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.eval(init, output)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !self.eval(condition, output)?.is_truthy()? {
                            break;
                        }
                    }
                    match LoopStep::from(self.execute_stmt(body, output)?) {
                        LoopStep::Next => {}
                        LoopStep::Stop => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                    if let Some(update) = update {
                        self.eval(update, output)?;
                    }
                }
                Ok(StmtResult::Normal)
            }

            Stmt::ForIn {
                var,
                iterable,
                body,
                ..
            } => {
                let array = match iterable {
                    Expr::Var {
                        name, index: None, ..
                    } if !matches!(self.read_var(name), Value::Scalar(_)) => self.array_for(name)?,
                    other => {
                        return Err(RuntimeError::ExpectedIterable {
                            target: other.to_string(),
                        }
                        .into());
                    }
                };

                // Keys are snapshotted; the body may add or delete elements.
                for key in array.keys() {
                    self.bind_loop_var(var, key)?;
                    match LoopStep::from(self.execute_stmt(body, output)?) {
                        LoopStep::Next => {}
                        LoopStep::Stop => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                }
                Ok(StmtResult::Normal)
            }

            Stmt::Break { .. } => Ok(StmtResult::Break),

            Stmt::Continue { .. } => Ok(StmtResult::Continue),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.eval_scalar(expr, output)?),
                    None => None,
                };
                Ok(StmtResult::Return(value))
            }

            Stmt::Delete { target, .. } => {
                self.execute_delete(target, output)?;
                Ok(StmtResult::Normal)
            }
        }
    }

    /// The loop variable of `for (k in a)` is bound through the global table.
    /// A parameter of the same name shadows that global, so it is set too.
    fn bind_loop_var(&mut self, name: &str, key: String) -> Result<()> {
        if let Some(slot) = self.frames.last_mut().and_then(|frame| frame.get_mut(name)) {
            if slot.is_array() {
                return Err(RuntimeError::ExpectedScalar.into());
            }
            *slot = Value::Scalar(key.clone());
        }

        let slot = self.globals.entry(name.to_string()).or_default();
        if slot.is_array() {
            return Err(RuntimeError::ExpectedScalar.into());
        }
        *slot = Value::Scalar(key);
        Ok(())
    }

    /// `delete a[k]` blanks one element; `delete a` empties the array.
    fn execute_delete<W: Write>(&mut self, target: &Expr, output: &mut W) -> Result<()> {
        let Expr::Var { name, index, .. } = target else {
            return Err(RuntimeError::ExpectedDeleteArray {
                target: target.to_string(),
            }
            .into());
        };
        if let Value::Scalar(_) = self.read_var(name) {
            return Err(RuntimeError::ExpectedDeleteArray {
                target: name.clone(),
            }
            .into());
        }

        let array = self.array_for(name)?;
        match index {
            Some(index) => {
                let key = self.eval_scalar(index, output)?;
                array.set(key, "");
            }
            None => array.clear(),
        }
        Ok(())
    }
}
