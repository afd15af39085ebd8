use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, RuntimeError};
use crate::format;

/// Runtime value: a string-backed scalar or an array of scalars.
///
/// A name that has never been assigned holds `Uninit`, which reads as the
/// empty scalar and turns into an array the first time it is used as one.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Uninit,
    Scalar(String),
    Array(Array),
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(text.into())
    }

    /// `"1"` or `"0"`
    pub fn from_bool(b: bool) -> Self {
        Value::Scalar(if b { "1" } else { "0" }.to_string())
    }

    /// Scalar text, failing on arrays.
    pub fn as_scalar(&self) -> Result<&str> {
        match self {
            Value::Uninit => Ok(""),
            Value::Scalar(s) => Ok(s),
            Value::Array(_) => Err(RuntimeError::ExpectedScalar.into()),
        }
    }

    pub fn into_scalar(self) -> Result<String> {
        match self {
            Value::Uninit => Ok(String::new()),
            Value::Scalar(s) => Ok(s),
            Value::Array(_) => Err(RuntimeError::ExpectedScalar.into()),
        }
    }

    pub fn to_number(&self) -> Result<f64> {
        parse_number(self.as_scalar()?)
    }

    /// True iff the scalar parses as a nonzero number. Non-numeric text,
    /// including non-empty words, is false.
    pub fn is_truthy(&self) -> Result<bool> {
        Ok(is_truthy(self.as_scalar()?))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }
}

/// Shared handle to an array. Clones alias the same storage, which is how
/// arrays are passed by reference.
#[derive(Debug, Clone, Default)]
pub struct Array(Rc<RefCell<HashMap<String, String>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an element, creating it as the empty string if missing.
    pub fn get(&self, key: &str) -> String {
        self.0
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.0.borrow_mut().insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Snapshot of the keys, so the array may be mutated while iterating.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Parse a whole scalar as a number. Surrounding whitespace is ignored and
/// blank text is 0; anything else that is not entirely a number is an error.
pub fn parse_number(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    if numeric_prefix_len(trimmed) != trimmed.len() {
        return Err(RuntimeError::ExpectedNumber {
            value: text.to_string(),
        }
        .into());
    }
    trimmed.parse().map_err(|_| {
        RuntimeError::ExpectedNumber {
            value: text.to_string(),
        }
        .into()
    })
}

pub fn is_truthy(text: &str) -> bool {
    parse_number(text).is_ok_and(|n| n != 0.0)
}

/// Length in bytes of the leading `[+-]digits[.digits][e[+-]digits]` run,
/// or 0 if there are no digits.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let mut has_digits = false;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        has_digits = true;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            has_digits = true;
        }
    }
    if !has_digits {
        return 0;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let exp_start = i;
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        if i < bytes.len() && bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        } else {
            i = exp_start;
        }
    }

    i
}

/// Compare numerically when both sides are numbers, otherwise as strings.
pub fn compare_scalars(left: &str, right: &str) -> Ordering {
    match (parse_number(left), parse_number(right)) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

/// Render a number as scalar text: integral values print as integers,
/// everything else goes through the output format (normally `OFMT`).
pub fn number_to_text(n: f64, ofmt: &str) -> String {
    if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format::format_number(ofmt, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42").unwrap(), 42.0);
        assert_eq!(parse_number("  3.5 ").unwrap(), 3.5);
        assert_eq!(parse_number("-1e3").unwrap(), -1000.0);
        assert_eq!(parse_number(".5").unwrap(), 0.5);
        assert_eq!(parse_number("").unwrap(), 0.0);
        assert_eq!(parse_number("   ").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_number_rejects_words() {
        for text in ["abc", "12abc", "inf", "nan", "1e", "-", "."] {
            let err = parse_number(text).unwrap_err();
            assert!(
                matches!(err, Error::Runtime(RuntimeError::ExpectedNumber { ref value }) if value == text),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy("1"));
        assert!(is_truthy("-0.5"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("0.0"));
        assert!(!is_truthy(""));
        // Non-numeric words are false.
        assert!(!is_truthy("yes"));
        assert!(!Value::Uninit.is_truthy().unwrap());
    }

    #[test]
    fn test_compare_scalars() {
        assert_eq!(compare_scalars("10", "9"), Ordering::Greater);
        assert_eq!(compare_scalars("1.0", "1"), Ordering::Equal);
        assert_eq!(compare_scalars("", "0"), Ordering::Equal);
        // Falls back to string comparison if either side is not a number.
        assert_eq!(compare_scalars("10", "9x"), Ordering::Less);
        assert_eq!(compare_scalars("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn test_number_to_text() {
        assert_eq!(number_to_text(3.0, "%.6g"), "3");
        assert_eq!(number_to_text(-0.0, "%.6g"), "0");
        assert_eq!(number_to_text(0.1 + 0.2, "%.6g"), "0.3");
        assert_eq!(number_to_text(1.0 / 3.0, "%.2f"), "0.33");
        assert_eq!(number_to_text(1e20, "%.6g"), "1e+20");
    }

    #[test]
    fn test_array_is_shared() {
        let a = Array::new();
        let b = a.clone();
        b.set("k", "v");
        assert_eq!(a.get("k"), "v");
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_array_get_vivifies() {
        let a = Array::new();
        assert!(!a.contains("missing"));
        assert_eq!(a.get("missing"), "");
        assert!(a.contains("missing"));
        assert_eq!(a.len(), 1);
        a.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_array_is_not_a_scalar() {
        let v = Value::Array(Array::new());
        assert!(v.is_array());
        assert!(matches!(
            v.as_scalar(),
            Err(Error::Runtime(RuntimeError::ExpectedScalar))
        ));
        assert_eq!(Value::Uninit.as_scalar().unwrap(), "");
    }
}
