#![no_main]

use libfuzzer_sys::fuzz_target;
use minawk::{Interpreter, Lexer, Parser};

fuzz_target!(|data: &[u8]| {
    // First third is the program, the rest is input
    let split_point = data.len() / 3;
    let (program_bytes, input_bytes) = data.split_at(split_point);

    let Ok(program) = std::str::from_utf8(program_bytes) else {
        return;
    };

    // `while (1)` and unbounded recursion never finish; skip loops and functions.
    if program.len() > 2000
        || ["while", "for", "do", "function"]
            .iter()
            .any(|word| program.contains(word))
    {
        return;
    }

    let Ok(tokens) = Lexer::new(program).tokenize() else {
        return;
    };
    let Ok(ast) = Parser::new(tokens).parse() else {
        return;
    };

    let mut interpreter = Interpreter::new(&ast);
    let mut output = Vec::new();
    let _ = interpreter.run(input_bytes, &mut output);
});
