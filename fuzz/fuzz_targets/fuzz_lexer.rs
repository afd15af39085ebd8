#![no_main]

use libfuzzer_sys::fuzz_target;
use minawk::Lexer;

fuzz_target!(|data: &str| {
    // Errors are fine; panics and hangs are not.
    let _ = Lexer::new(data).tokenize();
});
