use regex::Regex;

/// Highest field index (and `NF`) a program may ask for. Reads and writes
/// past `NF` allocate every field in between.
pub const MAX_FIELDS: usize = 1_000_000;

/// How `FS` (or the separator given to `split`) breaks text into fields.
#[derive(Debug, Clone)]
pub enum FieldSeparator {
    /// `" "`: runs of blanks, ignoring leading and trailing ones
    Whitespace,
    /// `""`: every character is its own field
    Chars,
    /// Any other single character, taken literally
    Char(char),
    /// Anything longer is a regular expression
    Regex(Regex),
}

impl FieldSeparator {
    /// Classify a separator string. `compile` is only called for the regex case.
    pub fn from_fs<E>(
        fs: &str,
        compile: impl FnOnce(&str) -> Result<Regex, E>,
    ) -> Result<Self, E> {
        let mut chars = fs.chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(' '), None) => FieldSeparator::Whitespace,
            (None, _) => FieldSeparator::Chars,
            (Some(c), None) => FieldSeparator::Char(c),
            _ => FieldSeparator::Regex(compile(fs)?),
        })
    }

    /// Split `text`. Empty text always yields no fields.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        match self {
            FieldSeparator::Whitespace => text.split_whitespace().map(String::from).collect(),
            FieldSeparator::Chars => text.chars().map(String::from).collect(),
            FieldSeparator::Char(c) => text.split(*c).map(String::from).collect(),
            FieldSeparator::Regex(re) => re.split(text).map(String::from).collect(),
        }
    }
}

/// The current input line and its fields.
///
/// Field writes rebuild `$0` by joining with a single space; writing `$0`
/// re-splits it. Both keep `line` and `fields` consistent.
#[derive(Debug, Clone, Default)]
pub struct Record {
    line: String,
    fields: Vec<String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn nf(&self) -> usize {
        self.fields.len()
    }

    /// Replace `$0` and rebuild the field list.
    pub fn set_whole_record(&mut self, text: String, separator: &FieldSeparator) {
        self.fields = separator.split(&text);
        self.line = text;
    }

    /// Read `$index`. Reading past `NF` extends the record with empty fields.
    pub fn get(&mut self, index: usize) -> String {
        if index == 0 {
            return self.line.clone();
        }
        if index > self.fields.len() {
            self.set_nf(index);
        }
        self.fields[index - 1].clone()
    }

    /// Write `$index`. `$0` is re-split with `separator`; any other field
    /// rebuilds `$0`, extending the record first if needed.
    pub fn set_field(&mut self, index: usize, text: String, separator: &FieldSeparator) {
        if index == 0 {
            self.set_whole_record(text, separator);
            return;
        }
        if index > self.fields.len() {
            self.fields.resize(index, String::new());
        }
        self.fields[index - 1] = text;
        self.rebuild();
    }

    /// Truncate or pad the field list to `nf` fields.
    pub fn set_nf(&mut self, nf: usize) {
        self.fields.resize(nf, String::new());
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.line = self.fields.join(" ");
    }
}
