//! printf-style formatting shared by `printf`, `sprintf` and `OFMT`.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Result, RuntimeError};
use crate::value::parse_number;

/// Largest width or precision a conversion may ask for.
pub const MAX_WIDTH: usize = 1_000_000;

/// One formatting argument: scalar text from a script, or a raw number
/// when rendering through `OFMT`.
#[derive(Debug, Clone, Copy)]
enum Arg<'a> {
    Text(&'a str),
    Number(f64),
}

impl Arg<'_> {
    fn number(self) -> Result<f64> {
        match self {
            Arg::Text(text) => parse_number(text),
            Arg::Number(n) => Ok(n),
        }
    }

    fn text(self) -> String {
        match self {
            Arg::Text(text) => text.to_string(),
            Arg::Number(n) if n.fract() == 0.0 && n.abs() < 1e16 => format!("{}", n as i64),
            Arg::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format `format` against scalar arguments. Missing arguments read as the
/// empty string; extra arguments are ignored.
pub fn sprintf(format: &str, args: &[String]) -> Result<String> {
    format_with(format, args.iter().map(|a| Arg::Text(a)))
}

/// Render a single number through an output format such as `"%.6g"`.
pub fn format_number(format: &str, n: f64) -> String {
    format_with(format, std::iter::once(Arg::Number(n))).unwrap_or_else(|_| n.to_string())
}

fn format_with<'a>(format: &str, args: impl Iterator<Item = Arg<'a>>) -> Result<String> {
    let mut result = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut args = args.fuse();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }

        if chars.peek() == Some(&'%') {
            chars.next();
            result.push('%');
            continue;
        }

        let mut spec = Spec::default();
        let mut raw = String::from("%");

        while let Some(&c) = chars.peek() {
            match c {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '#' => spec.alt = true,
                '0' => spec.zero = true,
                _ => break,
            }
            raw.push(c);
            chars.next();
        }

        if chars.peek() == Some(&'*') {
            chars.next();
            raw.push('*');
            let width = next_count(&mut args)?;
            if width < 0 {
                spec.left = true;
            }
            spec.width = width.unsigned_abs() as usize;
        } else {
            spec.width = read_digits(&mut chars, &mut raw).unwrap_or(0);
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            raw.push('.');
            if chars.peek() == Some(&'*') {
                chars.next();
                raw.push('*');
                spec.precision = usize::try_from(next_count(&mut args)?).ok();
            } else {
                spec.precision = Some(read_digits(&mut chars, &mut raw).unwrap_or(0));
            }
        }

        for value in [Some(spec.width), spec.precision].into_iter().flatten() {
            if value > MAX_WIDTH {
                return Err(RuntimeError::FormatWidthTooLarge {
                    value,
                    max: MAX_WIDTH,
                }
                .into());
            }
        }

        let Some(conversion) = chars.next() else {
            result.push_str(&raw);
            break;
        };
        if !"diouxXcseEfFgG".contains(conversion) {
            // Not a conversion; emit it as written.
            result.push_str(&raw);
            result.push(conversion);
            continue;
        }

        let arg = args.next().unwrap_or(Arg::Text(""));
        result.push_str(&render(&spec, conversion, arg)?);
    }

    Ok(result)
}

fn next_count<'a>(args: &mut impl Iterator<Item = Arg<'a>>) -> Result<i64> {
    match args.next() {
        Some(arg) => Ok(arg.number()? as i64),
        None => Ok(0),
    }
}

fn read_digits(chars: &mut Peekable<Chars<'_>>, raw: &mut String) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    raw.push_str(&digits);
    digits.parse().ok()
}

fn render(spec: &Spec, conversion: char, arg: Arg<'_>) -> Result<String> {
    let formatted = match conversion {
        's' => {
            let text = arg.text();
            let text = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            };
            pad(spec, "", &text, false)
        }
        'c' => {
            // A numeric argument is a character code, anything else prints its first char.
            let text = match arg {
                Arg::Text(t) if parse_number(t).is_err() || t.trim().is_empty() => {
                    t.chars().next().map(String::from).unwrap_or_default()
                }
                _ => char::from_u32(arg.number()? as u32)
                    .map(String::from)
                    .unwrap_or_default(),
            };
            pad(spec, "", &text, false)
        }
        'd' | 'i' => {
            let n = arg.number()?;
            if !n.is_finite() {
                return Ok(pad(spec, sign_of(spec, n), &non_finite(n, false), false));
            }
            let n = n.trunc();
            let digits = with_min_digits(format!("{}", n.abs() as u64), spec.precision);
            pad(spec, sign_of(spec, n), &digits, spec.precision.is_none())
        }
        'o' | 'u' | 'x' | 'X' => {
            let n = arg.number()?;
            let bits = if n < 0.0 { n as i64 as u64 } else { n as u64 };
            let digits = match conversion {
                'o' => format!("{:o}", bits),
                'x' => format!("{:x}", bits),
                'X' => format!("{:X}", bits),
                _ => format!("{}", bits),
            };
            let prefix = match conversion {
                'x' if spec.alt && bits != 0 => "0x",
                'X' if spec.alt && bits != 0 => "0X",
                'o' if spec.alt && !digits.starts_with('0') => "0",
                _ => "",
            };
            let digits = with_min_digits(digits, spec.precision);
            pad(spec, prefix, &digits, spec.precision.is_none())
        }
        // e, E, f, F, g, G
        _ => {
            let n = arg.number()?;
            let upper = conversion.is_ascii_uppercase();
            let precision = spec.precision.unwrap_or(6);
            let body = if !n.is_finite() {
                non_finite(n, upper)
            } else {
                match conversion.to_ascii_lowercase() {
                    'e' => format_exponent(n.abs(), precision, upper),
                    'f' => format!("{:.*}", precision, n.abs()),
                    _ => format_general(n.abs(), precision, upper, spec.alt),
                }
            };
            pad(spec, sign_of(spec, n), &body, n.is_finite())
        }
    };
    Ok(formatted)
}

fn sign_of(spec: &Spec, n: f64) -> &'static str {
    if n.is_sign_negative() && n != 0.0 {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

fn non_finite(n: f64, upper: bool) -> String {
    let text = if n.is_nan() { "nan" } else { "inf" };
    if upper {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

fn with_min_digits(digits: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) if digits.len() < p => format!("{}{}", "0".repeat(p - digits.len()), digits),
        // `%.0d` of zero prints nothing
        Some(0) if digits == "0" => String::new(),
        _ => digits,
    }
}

/// `%e`: `d.ddde+XX` with at least two exponent digits.
fn format_exponent(n: f64, precision: usize, upper: bool) -> String {
    let formatted = format!("{:.*e}", precision, n);
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exponent.abs())
}

/// `%g`: `%e` or `%f` depending on the exponent, trailing zeros removed unless `#`.
fn format_general(n: f64, precision: usize, upper: bool, alt: bool) -> String {
    let precision = precision.max(1);
    let exponent = if n == 0.0 {
        0
    } else {
        let probe = format!("{:.*e}", precision - 1, n);
        probe
            .split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let body = if exponent < -4 || exponent >= precision as i32 {
        format_exponent(n, precision - 1, upper)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, n)
    };

    if alt {
        return body;
    }
    match body.find(['e', 'E']) {
        Some(pos) => {
            let (mantissa, exp) = body.split_at(pos);
            format!("{}{}", trim_fraction(mantissa), exp)
        }
        None => trim_fraction(&body).to_string(),
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Apply width with `-` (left) and `0` (zero fill after the sign) flags.
fn pad(spec: &Spec, sign: &str, body: &str, zero_fill_allowed: bool) -> String {
    let len = sign.chars().count() + body.chars().count();
    if len >= spec.width {
        return format!("{sign}{body}");
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{sign}{body}{}", " ".repeat(fill))
    } else if spec.zero && zero_fill_allowed {
        format!("{sign}{}{body}", "0".repeat(fill))
    } else {
        format!("{}{sign}{body}", " ".repeat(fill))
    }
}
