use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use minawk::ast::Program;
use minawk::{Interpreter, Lexer, Parser};

fn compile(source: &str) -> Program {
    let tokens = Lexer::new(source).tokenize().unwrap();
    Parser::new(tokens).parse().unwrap()
}

/// Run an already parsed program so the measurement covers execution only.
fn execute(program: &Program, input: &str) -> Vec<u8> {
    let mut interpreter = Interpreter::new(program);
    let mut output = Vec::new();
    interpreter.run(input.as_bytes(), &mut output).unwrap();
    output
}

const REPORT: &str = r#"
    function max(a, b) { return a > b ? a : b }
    BEGIN { FS = ":" }
    $3 ~ /^[0-9]+$/ {
        total[$1] += $3
        widest = max(widest, length($2))
        n++
    }
    /^#/ { next }
    END {
        for (user in total)
            printf "%-12s %8.2f\n", user, total[user] / n
        print "widest", widest
    }
"#;

/// `name`, program, whether it reads input
const SCRIPTS: &[(&str, &str, bool)] = &[
    (
        "arithmetic",
        "BEGIN { x = 0; for (i = 1; i <= 1000; i++) x += i * 2 - 1; print x }",
        false,
    ),
    (
        "string_concat",
        r#"BEGIN { s = ""; for (i = 1; i <= 200; i++) s = s "x"; print length(s) }"#,
        false,
    ),
    (
        "array_fill_and_walk",
        "BEGIN { for (i = 1; i <= 200; i++) a[i] = i * 2; for (k in a) t += a[k]; print t }",
        false,
    ),
    (
        "recursion",
        "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2) } BEGIN { print fib(15) }",
        false,
    ),
    (
        "sprintf",
        r#"BEGIN { for (i = 1; i <= 500; i++) s = sprintf("%05d|%-8s|%.3e", i, "col", i / 7) }"#,
        false,
    ),
    (
        "substr_index",
        r#"BEGIN { s = "the quick brown fox"; for (i = 1; i <= 500; i++) n += index(substr(s, 5), "fox") }"#,
        false,
    ),
    (
        "gsub_records",
        r#"{ gsub(/[aeiou]/, "<&>"); out = out $0 } END { print length(out) }"#,
        true,
    ),
    (
        "split_records",
        r#"{ n += split($0, parts, /[:,]/) } END { print n }"#,
        true,
    ),
    ("report", REPORT, true),
];

fn sample_input(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 7 {
            0 => format!("# comment {}", i),
            3 => format!("user{}:skip:n/a,{}", i % 13, i),
            _ => format!("user{}:{}:{}:{},{}", i % 13, "x".repeat(i % 9), i, i * 3, i % 5),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============ Front End ============

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_end");

    group.bench_function("tokenize_report", |b| {
        b.iter(|| Lexer::new(black_box(REPORT)).tokenize().unwrap())
    });

    let tokens = Lexer::new(REPORT).tokenize().unwrap();
    group.bench_function("parse_report", |b| {
        b.iter(|| Parser::new(black_box(tokens.clone())).parse().unwrap())
    });

    group.finish();
}

// ============ Scripts ============

fn bench_scripts(c: &mut Criterion) {
    let mut group = c.benchmark_group("scripts");
    let input = sample_input(200);

    for &(name, source, reads_input) in SCRIPTS {
        let program = compile(source);
        let input = if reads_input { input.as_str() } else { "" };
        group.bench_function(name, |b| b.iter(|| execute(&program, black_box(input))));
    }

    group.finish();
}

// ============ Throughput ============

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    let sum = compile("{ sum += $2 } END { print sum }");
    let fields = compile("{ $3 = toupper($3); print }");

    for lines in [100, 1000, 10000] {
        let input: String = (0..lines)
            .map(|i| format!("{} {} row{} {}", i, i * 2, i, i % 100))
            .collect::<Vec<_>>()
            .join("\n");

        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("sum_column", lines), &input, |b, input| {
            b.iter(|| execute(&sum, black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("rewrite_field", lines), &input, |b, input| {
            b.iter(|| execute(&fields, black_box(input)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_front_end, bench_scripts, bench_throughput);

criterion_main!(benches);
