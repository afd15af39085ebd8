use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process;

use minawk::{Interpreter, Lexer, Parser};

const USAGE: &str = "Usage: minawk [-F fs] [-v var=value]... <awk-source-file> [input-file]";

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    process::exit(run(&args));
}

/// Logging is off unless RUST_LOG is set; it goes to stderr so stdout only
/// carries program output.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(false))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

struct Options {
    field_separator: Option<String>,
    variables: Vec<(String, String)>,
    source_file: String,
    input_file: Option<String>,
}

enum Command {
    Help,
    Version,
    Run(Options),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut field_separator = None;
    let mut variables = Vec::new();
    let mut operands = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if arg == "--help" || arg == "-h" {
            return Ok(Command::Help);
        }

        if arg == "--version" {
            return Ok(Command::Version);
        }

        if arg == "-F" {
            i += 1;
            let fs = args.get(i).ok_or("option -F requires an argument")?;
            field_separator = Some(fs.clone());
        } else if let Some(fs) = arg.strip_prefix("-F") {
            field_separator = Some(fs.to_string());
        } else if arg == "-v" {
            i += 1;
            let assignment = args.get(i).ok_or("option -v requires an argument")?;
            let (name, value) = assignment
                .split_once('=')
                .ok_or_else(|| format!("invalid variable assignment: {}", assignment))?;
            variables.push((name.to_string(), value.to_string()));
        } else if arg == "--" {
            // End of options
            operands.extend(args[i + 1..].iter().cloned());
            break;
        } else if arg.starts_with('-') && arg != "-" {
            return Err(format!("unknown option: {}", arg));
        } else {
            operands.push(arg.clone());
        }

        i += 1;
    }

    let mut operands = operands.into_iter();
    let source_file = operands.next().ok_or("no awk source file given")?;
    let input_file = operands.next();
    if let Some(extra) = operands.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    Ok(Command::Run(Options {
        field_separator,
        variables,
        source_file,
        input_file,
    }))
}

/// Exit status: 0 (or the program's `exit` status), 1 for usage and syntax
/// errors, 2 for runtime and I/O errors.
fn run(args: &[String]) -> i32 {
    let options = match parse_args(args) {
        Ok(Command::Help) => {
            print_help();
            return 0;
        }
        Ok(Command::Version) => {
            println!("minawk {}", env!("CARGO_PKG_VERSION"));
            return 0;
        }
        Ok(Command::Run(options)) => options,
        Err(message) => {
            eprintln!("minawk: {}", message);
            eprintln!("{}", USAGE);
            return 1;
        }
    };

    let source = match fs::read_to_string(&options.source_file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("minawk: cannot read {}: {}", options.source_file, e);
            return 2;
        }
    };

    let program = match Lexer::new(&source)
        .tokenize()
        .and_then(|tokens| Parser::new(tokens).parse())
    {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e.render(&options.source_file, &source));
            return 1;
        }
    };

    let input: Box<dyn BufRead> = match options.input_file.as_deref() {
        None => Box::new(io::empty()),
        Some("-") => Box::new(io::stdin().lock()),
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("minawk: cannot open {}: {}", path, e);
                return 2;
            }
        },
    };

    let mut interpreter = Interpreter::new(&program);
    if let Some(fs) = &options.field_separator {
        interpreter.set_fs(fs);
    }
    for (name, value) in &options.variables {
        interpreter.set_variable(name, value);
    }

    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());
    // `run` flushes (and reports flush errors) on success. After a runtime
    // error, keep whatever was printed before it; that error is the one shown.
    let result = interpreter.run(input, &mut output);
    if result.is_err() {
        let _ = output.flush();
    }

    match result {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Awk runtime error:\n{}", e);
            2
        }
    }
}

fn print_help() {
    println!(
        r#"{USAGE}

Run an AWK program read from <awk-source-file> over the lines of [input-file].
Without an input file only BEGIN and END actions see meaningful data; use -
to read standard input.

Options:
  -F fs          Set the field separator to fs
  -v var=val     Assign value to variable before execution
  --version      Print version information
  --help         Print this help message

Examples:
  minawk sum.awk numbers.txt
  minawk -F: users.awk /etc/passwd
  minawk -v limit=10 top.awk - < data.txt

Set RUST_LOG=minawk=debug to trace execution on stderr."#
    );
}
