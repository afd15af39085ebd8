mod tokens;

pub use tokens::{Token, TokenKind, keyword_to_token};

use crate::error::{Error, Result};

/// Longest-match scanner producing a flat token stream
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
    last_token_produces_value: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            last_token_produces_value: false,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::with_capacity((self.source.len() / 4 + 1).min(1024));
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let (line, col) = (self.line, self.column);

        let Some((_, ch)) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, line, col));
        };

        let kind = match ch {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '"' => self.scan_string()?,
            '`' => self.scan_pattern('`')?,
            '/' if !self.last_token_produces_value => self.scan_pattern('/')?,
            '/' => self.operator(&[('=', TokenKind::SlashAssign)], TokenKind::Slash),
            '.' if self.peek_next_is_digit() => self.scan_number()?,
            '0'..='9' => self.scan_number()?,
            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(),
            '+' => self.operator(
                &[('+', TokenKind::Increment), ('=', TokenKind::PlusAssign)],
                TokenKind::Plus,
            ),
            '-' => self.operator(
                &[('-', TokenKind::Decrement), ('=', TokenKind::MinusAssign)],
                TokenKind::Minus,
            ),
            '*' => self.operator(&[('=', TokenKind::StarAssign)], TokenKind::Star),
            '%' => self.operator(&[('=', TokenKind::PercentAssign)], TokenKind::Percent),
            '^' => self.operator(&[('=', TokenKind::CaretAssign)], TokenKind::Caret),
            '<' => self.operator(&[('=', TokenKind::LessEqual)], TokenKind::Less),
            '>' => self.operator(&[('=', TokenKind::GreaterEqual)], TokenKind::Greater),
            '=' => self.operator(&[('=', TokenKind::Equal)], TokenKind::Assign),
            '!' => self.operator(
                &[('=', TokenKind::NotEqual), ('~', TokenKind::NotMatch)],
                TokenKind::Not,
            ),
            '&' => {
                self.advance();
                if !self.consume_if('&') {
                    return Err(Error::lexer("unexpected '&', did you mean '&&'?", line, col));
                }
                TokenKind::And
            }
            '|' => {
                self.advance();
                if !self.consume_if('|') {
                    return Err(Error::lexer(
                        "unexpected '|', pipes are not supported (did you mean '||'?)",
                        line,
                        col,
                    ));
                }
                TokenKind::Or
            }
            _ => match single_char_token(ch) {
                Some(kind) => {
                    self.advance();
                    kind
                }
                None => {
                    return Err(Error::lexer(
                        format!("unexpected character '{}'", ch),
                        line,
                        col,
                    ));
                }
            },
        };

        self.last_token_produces_value = kind.produces_value();
        Ok(Token::new(kind, line, col))
    }

    /// Consume the current character, then the longest listed follower if present.
    fn operator(&mut self, followers: &[(char, TokenKind)], single: TokenKind) -> TokenKind {
        self.advance();
        for (next, kind) in followers {
            if self.consume_if(*next) {
                return kind.clone();
            }
        }
        single
    }

    fn peek_char(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek_char_is(&mut self, expected: char) -> bool {
        self.chars.peek().is_some_and(|(_, c)| *c == expected)
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek_char_is(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_next_is_digit(&self) -> bool {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().is_some_and(|(_, c)| c.is_ascii_digit())
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, ch)) = result {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some((_, ' ' | '\t' | '\r')) => {
                    self.advance();
                }
                Some((_, '\\')) => {
                    // Line continuation
                    let mut chars = self.chars.clone();
                    chars.next();
                    if chars.peek().is_some_and(|(_, c)| *c == '\n') {
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some((_, '#')) => {
                    while let Some((_, ch)) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_string(&mut self) -> Result<TokenKind> {
        let (line, col) = (self.line, self.column);
        self.advance();

        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, '"')) => return Ok(TokenKind::String(value)),
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 'b')) => value.push('\x08'),
                    Some((_, 'f')) => value.push('\x0C'),
                    Some((_, 'a')) => value.push('\x07'),
                    Some((_, 'v')) => value.push('\x0B'),
                    Some((_, c @ ('\\' | '"' | '/'))) => value.push(c),
                    // Unknown escapes keep their backslash so "\&" reaches sub/gsub intact.
                    Some((_, c)) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(Error::lexer("unterminated string", line, col)),
                },
                Some((_, '\n')) | None => {
                    return Err(Error::lexer("unterminated string", line, col));
                }
                Some((_, ch)) => value.push(ch),
            }
        }
    }

    /// Scan a pattern literal delimited by `/.../` or by backticks.
    fn scan_pattern(&mut self, delimiter: char) -> Result<TokenKind> {
        let (line, col) = (self.line, self.column);
        self.advance();

        let mut pattern = String::new();
        loop {
            match self.advance() {
                Some((_, ch)) if ch == delimiter => return Ok(TokenKind::Regex(pattern)),
                Some((_, '\\')) => match self.advance() {
                    // An escaped delimiter is just the delimiter character.
                    Some((_, ch)) if ch == delimiter => pattern.push(ch),
                    Some((_, '\n')) | None => {
                        return Err(Error::lexer("unterminated pattern", line, col));
                    }
                    Some((_, ch)) => {
                        pattern.push('\\');
                        pattern.push(ch);
                    }
                },
                Some((_, '\n')) | None => {
                    return Err(Error::lexer("unterminated pattern", line, col));
                }
                Some((_, ch)) => pattern.push(ch),
            }
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let (line, col) = (self.line, self.column);
        let start_pos = self.chars.peek().map_or(0, |(pos, _)| *pos);

        self.skip_digits();
        if self.consume_if('.') {
            self.skip_digits();
        }
        if let Some((_, 'e' | 'E')) = self.peek_char() {
            self.advance();
            if let Some((_, '+' | '-')) = self.peek_char() {
                self.advance();
            }
            if !self.peek_char().is_some_and(|(_, c)| c.is_ascii_digit()) {
                return Err(Error::lexer("malformed number: missing exponent digits", line, col));
            }
            self.skip_digits();
        }

        let end_pos = self.chars.peek().map_or(self.source.len(), |(pos, _)| *pos);
        let text = &self.source[start_pos..end_pos];
        let value: f64 = text
            .parse()
            .map_err(|_| Error::lexer(format!("malformed number '{}'", text), line, col))?;

        // `1.0` and `1e3` are stored as plain integers; other numbers keep their spelling.
        let text = if value.fract() == 0.0 && value.abs() < 1e16 {
            format!("{}", value as i64)
        } else {
            text.to_string()
        };
        Ok(TokenKind::Number(text))
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|(_, c)| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start_pos = self.chars.peek().map_or(0, |(pos, _)| *pos);
        while self
            .peek_char()
            .is_some_and(|(_, c)| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let end_pos = self.chars.peek().map_or(self.source.len(), |(pos, _)| *pos);
        let ident = &self.source[start_pos..end_pos];

        keyword_to_token(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }
}

fn single_char_token(ch: char) -> Option<TokenKind> {
    Some(match ch {
        '~' => TokenKind::Match,
        '$' => TokenKind::Dollar,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("x + y - z * w / v % u");
        assert_eq!(tokens[1], TokenKind::Plus);
        assert_eq!(tokens[3], TokenKind::Minus);
        assert_eq!(tokens[5], TokenKind::Star);
        assert_eq!(tokens[7], TokenKind::Slash);
        assert_eq!(tokens[9], TokenKind::Percent);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_longest_match_operators() {
        let tokens = kinds("a += b-- != c !~ d ^= e");
        assert_eq!(tokens[1], TokenKind::PlusAssign);
        assert_eq!(tokens[3], TokenKind::Decrement);
        assert_eq!(tokens[4], TokenKind::NotEqual);
        assert_eq!(tokens[6], TokenKind::NotMatch);
        assert_eq!(tokens[8], TokenKind::CaretAssign);
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("BEGIN END if else while for print next getline foo");
        assert_eq!(tokens[0], TokenKind::Begin);
        assert_eq!(tokens[1], TokenKind::End);
        assert_eq!(tokens[2], TokenKind::If);
        assert_eq!(tokens[3], TokenKind::Else);
        assert_eq!(tokens[4], TokenKind::While);
        assert_eq!(tokens[5], TokenKind::For);
        assert_eq!(tokens[6], TokenKind::Print);
        assert_eq!(tokens[7], TokenKind::Next);
        assert_eq!(tokens[8], TokenKind::Getline);
        assert_eq!(tokens[9], TokenKind::Identifier("foo".into()));
    }

    #[test]
    fn test_numbers_keep_text() {
        let tokens = kinds("42 3.14 1.0 1e3 2.5e-3 .5");
        assert_eq!(tokens[0], TokenKind::Number("42".into()));
        assert_eq!(tokens[1], TokenKind::Number("3.14".into()));
        assert_eq!(tokens[2], TokenKind::Number("1".into()));
        assert_eq!(tokens[3], TokenKind::Number("1000".into()));
        assert_eq!(tokens[4], TokenKind::Number("2.5e-3".into()));
        assert_eq!(tokens[5], TokenKind::Number(".5".into()));
    }

    #[test]
    fn test_malformed_exponent() {
        let err = Lexer::new("x = 1e+").tokenize().unwrap_err();
        assert!(matches!(err, Error::Lexer { .. }));
    }

    #[test]
    fn test_strings() {
        let tokens = kinds(r#""hello" "world\n" "a\&b""#);
        assert_eq!(tokens[0], TokenKind::String("hello".into()));
        assert_eq!(tokens[1], TokenKind::String("world\n".into()));
        assert_eq!(tokens[2], TokenKind::String("a\\&b".into()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"abc\nprint").tokenize().unwrap_err();
        match err {
            Error::Lexer { location, .. } => assert_eq!((location.line, location.column), (1, 1)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_regex_vs_division() {
        let tokens = kinds("x / 2");
        assert_eq!(tokens[1], TokenKind::Slash);

        let tokens = kinds("/pat\\/tern/");
        assert_eq!(tokens[0], TokenKind::Regex("pat/tern".into()));

        let tokens = kinds("(a) / b");
        assert_eq!(tokens[3], TokenKind::Slash);
    }

    #[test]
    fn test_backtick_pattern() {
        let tokens = kinds("$1 ~ `^a+$`");
        assert_eq!(tokens[3], TokenKind::Regex("^a+$".into()));
    }

    #[test]
    fn test_pipe_is_rejected() {
        let err = Lexer::new("print | \"cat\"").tokenize().unwrap_err();
        assert!(err.to_string().contains("pipes are not supported"));
        assert!(Lexer::new("a || b").tokenize().is_ok());
    }

    #[test]
    fn test_unknown_character() {
        let err = Lexer::new("x @ y").tokenize().unwrap_err();
        match err {
            Error::Lexer { message, location } => {
                assert!(message.contains('@'));
                assert_eq!(location.column, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_comments_and_continuation() {
        let tokens = kinds("a # comment\nb \\\n c");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Newline,
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let tokens = Lexer::new("a\nb\nc").tokenize().unwrap();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[2].location.line, 2);
        assert_eq!(tokens[4].location.line, 3);
    }
}
