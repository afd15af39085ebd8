use std::fmt;
use thiserror::Error;

/// Location in source code for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Fatal errors raised while evaluating a program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(
        "Expected {} argument(s) but found {found} argument(s) in call to {function}",
        arity_bound(.expected, .variadic)
    )]
    Arity {
        function: String,
        expected: usize,
        found: usize,
        variadic: bool,
    },

    #[error("Expected a scalar but found an array")]
    ExpectedScalar,

    #[error("Expected {name} to be an array but it contains \"{contents}\"")]
    ExpectedArray { name: String, contents: String },

    #[error("Expected a number but found \"{value}\"")]
    ExpectedNumber { value: String },

    #[error("Cannot iterate over {target}: not an array")]
    ExpectedIterable { target: String },

    #[error("Cannot delete {target}: not an array")]
    ExpectedDeleteArray { target: String },

    #[error("{target} is not a variable")]
    NotAVariable { target: String },

    #[error("Negative field index {index}")]
    NegativeFieldIndex { index: i64 },

    #[error("Field index {index} exceeds the limit of {max} fields")]
    FieldIndexTooLarge { index: usize, max: usize },

    #[error("Cannot set {name} to the negative value {value}")]
    NegativeCount { name: &'static str, value: i64 },

    #[error("printf width or precision {value} exceeds the limit of {max}")]
    FormatWidthTooLarge { value: usize, max: usize },

    #[error("Function {name} not found")]
    FunctionNotFound { name: String },

    #[error("next used in a BEGIN block")]
    NextInBegin,

    #[error("next used in an END block")]
    NextInEnd,

    #[error("{signal} used outside of its enclosing loop or function")]
    ControlFlowEscape { signal: &'static str },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Too many arguments in call to {function}: {found} given, at most {max} accepted")]
    TooManyArguments {
        function: String,
        found: usize,
        max: usize,
    },
}

fn arity_bound(expected: &usize, variadic: &bool) -> String {
    if *variadic {
        format!("at least {expected}")
    } else {
        expected.to_string()
    }
}

/// All error types for minawk
#[derive(Error, Debug)]
pub enum Error {
    #[error("lexical error at {location}: {message}")]
    Lexer {
        message: String,
        location: SourceLocation,
    },

    #[error("parse error at {location}: {message}")]
    Parser {
        message: String,
        location: SourceLocation,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Unwinds to the record loop; never escapes `Interpreter::run`.
    #[error("next")]
    Next,

    /// Unwinds out of the whole run with a status code.
    #[error("exit {0}")]
    Exit(i32),
}

impl Error {
    pub fn lexer(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Lexer {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    pub fn parser(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Parser {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Whether this error comes from lexing or parsing rather than execution.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Lexer { .. } | Error::Parser { .. })
    }

    /// Render a syntax error as `file:line:col: Kind: message`, followed by the
    /// offending source line and a caret under the column. Other errors render
    /// as their plain message.
    pub fn render(&self, file: &str, source: &str) -> String {
        let (kind, message, location) = match self {
            Error::Lexer { message, location } => ("LexicalError", message, location),
            Error::Parser { message, location } => ("ParseError", message, location),
            other => return other.to_string(),
        };

        let text = source
            .lines()
            .nth(location.line.saturating_sub(1))
            .unwrap_or("");
        // Tabs are copied so the caret lines up however the terminal expands them.
        let mut caret: String = text
            .chars()
            .take(location.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        caret.push('^');

        format!(
            "{}:{}:{}: {}: {}\n{}\n{}",
            file, location.line, location.column, kind, message, text, caret
        )
    }
}

/// Result type alias for minawk operations
pub type Result<T> = std::result::Result<T, Error>;
