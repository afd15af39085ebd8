//! minawk - a small AWK interpreter
//!
//! Source text is tokenized by [`Lexer`], turned into a [`Program`](ast::Program)
//! by [`Parser`], and run by [`Interpreter`] against a stream of input lines.
//! The supported language is a subset of AWK: pattern/action blocks, `BEGIN`
//! and `END`, user functions, associative arrays and the common string
//! built-ins. Output goes to a single writer; there is no redirection.
//!
//! # Example
//!
//! ```
//! use minawk::{Interpreter, Lexer, Parser};
//!
//! let source = r#"BEGIN { print "Hello, World!" }"#;
//! let tokens = Lexer::new(source).tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let mut interpreter = Interpreter::new(&program);
//! let mut output = Vec::new();
//! interpreter.run(std::io::empty(), &mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "Hello, World!\n");
//! ```
//!
//! # Field Processing Example
//!
//! ```
//! use minawk::{Interpreter, Lexer, Parser};
//!
//! let source = r#"{ sum += $2 } END { print "total", sum }"#;
//! let tokens = Lexer::new(source).tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let mut interpreter = Interpreter::new(&program);
//! interpreter.set_fs(",");
//!
//! let input = b"apples,3\npears,4\n";
//! let mut output = Vec::new();
//! interpreter.run(&input[..], &mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "total 7\n");
//! ```
//!
//! # Runtime Errors
//!
//! ```
//! use minawk::{Error, Interpreter, Lexer, Parser, RuntimeError};
//!
//! let tokens = Lexer::new("BEGIN { next }").tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let mut interpreter = Interpreter::new(&program);
//! let err = interpreter.run(std::io::empty(), &mut Vec::new()).unwrap_err();
//! assert!(matches!(err, Error::Runtime(RuntimeError::NextInBegin)));
//! ```

pub mod ast;
pub mod error;
pub mod format;
pub mod input;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod record;
pub mod value;

pub use error::{Error, Result, RuntimeError, SourceLocation};
pub use interpreter::Interpreter;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use value::Value;
