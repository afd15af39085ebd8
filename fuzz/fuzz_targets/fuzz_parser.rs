#![no_main]

use libfuzzer_sys::fuzz_target;
use minawk::{Lexer, Parser};

fuzz_target!(|data: &str| {
    if let Ok(tokens) = Lexer::new(data).tokenize() {
        let _ = Parser::new(tokens).parse();
    }
});
