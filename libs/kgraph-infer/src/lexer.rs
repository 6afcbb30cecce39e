//! KGraph DSL lexer - tokenizes query strings
//!
//! Converts query text into a stream of tokens. Handles the three string
//! forms (single-quoted, double-quoted, triple-double-quoted), typed scalar
//! literals with `^Tag` suffixes, comments, and all operators.

use crate::token::{Token, TokenType};

/// The KGraph DSL lexer
pub struct Lexer {
    position: usize,
    line: usize,
    column: usize,
    chars: Vec<char>,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            position: 0,
            line: 1,
            column: 1,
            chars,
            current_char,
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    /// Peek two characters ahead
    fn peek2(&self) -> Option<char> {
        self.chars.get(self.position + 2).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip comments (both // and /* */)
    fn skip_comment(&mut self) -> Result<(), String> {
        if self.current_char == Some('/') && self.peek() == Some('/') {
            // Line comment
            while let Some(c) = self.current_char {
                if c == '\n' {
                    self.advance();
                    break;
                }
                self.advance();
            }
            Ok(())
        } else if self.current_char == Some('/') && self.peek() == Some('*') {
            // Block comment
            self.advance();
            self.advance();

            while let Some(c) = self.current_char {
                if c == '*' && self.peek() == Some('/') {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                self.advance();
            }

            Err("unterminated block comment".into())
        } else {
            Ok(())
        }
    }

    /// Read an identifier: [a-zA-Z0-9_]+
    fn read_identifier(&mut self) -> String {
        let start = self.position;

        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        self.chars[start..self.position].iter().collect()
    }

    /// Read a quoted string, decoding backslash escapes.
    ///
    /// `quote` is the delimiter character (`'` or `"`).
    fn read_quoted_string(&mut self, quote: char) -> Result<String, String> {
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(c) = self.current_char {
            if c == quote {
                self.advance(); // Skip closing quote
                return Ok(value);
            } else if c == '\\' {
                self.advance(); // Skip backslash
                let Some(escaped) = self.current_char else {
                    return Err("incomplete escape sequence in string".into());
                };

                match escaped {
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    '/' => value.push('/'),
                    'f' => value.push('\x0C'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'u' => {
                        // Unicode escape: \uXXXX
                        self.advance(); // Skip 'u'
                        let mut hex = String::new();
                        for _ in 0..4 {
                            match self.current_char {
                                Some(h) if h.is_ascii_hexdigit() => {
                                    hex.push(h);
                                    self.advance();
                                }
                                Some(_) => {
                                    return Err("invalid unicode escape sequence".into());
                                }
                                None => {
                                    return Err("incomplete unicode escape sequence".into());
                                }
                            }
                        }
                        let code = u32::from_str_radix(&hex, 16)
                            .map_err(|_| "invalid unicode code point".to_string())?;
                        value
                            .push(char::from_u32(code).ok_or("invalid unicode character")?);
                        continue; // Don't advance again after unicode sequence
                    }
                    other => value.push(other),
                }

                self.advance();
            } else {
                value.push(c);
                self.advance();
            }
        }

        Err("unterminated string literal".into())
    }

    /// Read a triple-double-quoted string: verbatim content, no escapes.
    fn read_triple_string(&mut self) -> Result<String, String> {
        self.advance(); // Skip the three opening quotes
        self.advance();
        self.advance();

        let mut value = String::new();

        while let Some(c) = self.current_char {
            if c == '"' && self.peek() == Some('"') && self.peek2() == Some('"') {
                self.advance();
                self.advance();
                self.advance();
                return Ok(value);
            }
            value.push(c);
            self.advance();
        }

        Err("unterminated triple-quoted string".into())
    }

    /// Read a number: digits with an optional decimal part.
    ///
    /// The decimal point is only consumed when followed by a digit, so the
    /// query terminator after a trailing integer (`42.`) lexes as
    /// `NumberLiteral("42")` then `Dot`.
    fn read_number(&mut self) -> String {
        let start = self.position;

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char == Some('.') && self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            self.advance(); // Skip '.'
            while let Some(c) = self.current_char {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.chars[start..self.position].iter().collect()
    }

    /// Read the `^Tag` / `^Tag(param)` suffix of a typed scalar literal.
    ///
    /// Called with the lexer positioned on `^`; `inner` is the already-read
    /// quoted content. Returns the finished token.
    fn read_typed_suffix(
        &mut self,
        inner: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Token {
        self.advance(); // Skip '^'
        let tag = self.read_identifier();

        let token_type = match tag.as_str() {
            "Date" => TokenType::DateLiteral,
            "DateTime" => TokenType::DateTimeLiteral,
            "Time" => TokenType::TimeLiteral,
            "Duration" => TokenType::DurationLiteral,
            "URI" => TokenType::UriLiteral,
            "GeoLocation" => TokenType::GeoLocationLiteral,
            "Currency" => {
                return match self.read_currency_code() {
                    Ok(code) => Token::typed(
                        TokenType::CurrencyLiteral,
                        inner,
                        Some(code),
                        position,
                        line,
                        column,
                    ),
                    Err(e) => Token::error(e, position, line, column),
                };
            }
            "Unit" => {
                return match self.read_unit_uri() {
                    Ok(uri) => Token::typed(
                        TokenType::UnitLiteral,
                        inner,
                        Some(uri),
                        position,
                        line,
                        column,
                    ),
                    Err(e) => Token::error(e, position, line, column),
                };
            }
            other => {
                return Token::error(
                    format!("unknown type tag: ^{}", other),
                    position,
                    line,
                    column,
                );
            }
        };

        Token::new(token_type, inner, position, line, column)
    }

    /// Read `(XXX)` after `^Currency`; the code must be exactly three
    /// uppercase letters.
    fn read_currency_code(&mut self) -> Result<String, String> {
        if self.current_char != Some('(') {
            return Err("expected '(' after ^Currency".into());
        }
        self.advance();

        let mut code = String::new();
        while let Some(c) = self.current_char {
            if c.is_ascii_uppercase() {
                code.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char != Some(')') {
            return Err("expected ')' after currency code".into());
        }
        self.advance();

        if code.len() != 3 {
            return Err(format!(
                "invalid currency code: '{}'. Expected a 3-letter currency code",
                code
            ));
        }

        Ok(code)
    }

    /// Read `('<uri>')` after `^Unit`.
    fn read_unit_uri(&mut self) -> Result<String, String> {
        if self.current_char != Some('(') {
            return Err("expected '(' after ^Unit".into());
        }
        self.advance();

        if self.current_char != Some('\'') {
            return Err("expected quoted unit id after ^Unit(".into());
        }
        self.advance();

        let mut uri = String::new();
        loop {
            match self.current_char {
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    uri.push(c);
                    self.advance();
                }
                None => return Err("unterminated unit id".into()),
            }
        }

        if self.current_char != Some(')') {
            return Err("expected ')' after unit id".into());
        }
        self.advance();

        Ok(uri)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        // Skip whitespace and comments
        loop {
            self.skip_whitespace();
            if self.current_char == Some('/')
                && (self.peek() == Some('/') || self.peek() == Some('*'))
            {
                if let Err(e) = self.skip_comment() {
                    return Token::error(e, self.position, self.line, self.column);
                }
            } else {
                break;
            }
        }

        let position = self.position;
        let line = self.line;
        let column = self.column;

        let Some(c) = self.current_char else {
            return Token::eof(position, line, column);
        };

        match c {
            '.' => {
                self.advance();
                Token::new(TokenType::Dot, ".".into(), position, line, column)
            }
            ',' => {
                self.advance();
                Token::new(TokenType::Comma, ",".into(), position, line, column)
            }
            ';' => {
                self.advance();
                Token::new(TokenType::Semicolon, ";".into(), position, line, column)
            }
            '(' => {
                self.advance();
                Token::new(TokenType::OpenParen, "(".into(), position, line, column)
            }
            ')' => {
                self.advance();
                Token::new(TokenType::CloseParen, ")".into(), position, line, column)
            }
            '[' => {
                self.advance();
                Token::new(TokenType::OpenBracket, "[".into(), position, line, column)
            }
            ']' => {
                self.advance();
                Token::new(TokenType::CloseBracket, "]".into(), position, line, column)
            }
            '{' => {
                self.advance();
                Token::new(TokenType::OpenBrace, "{".into(), position, line, column)
            }
            '}' => {
                self.advance();
                Token::new(TokenType::CloseBrace, "}".into(), position, line, column)
            }
            '|' => {
                self.advance();
                Token::new(TokenType::Pipe, "|".into(), position, line, column)
            }
            '+' => {
                self.advance();
                Token::new(TokenType::Plus, "+".into(), position, line, column)
            }
            '-' => {
                self.advance();
                Token::new(TokenType::Minus, "-".into(), position, line, column)
            }
            '*' => {
                self.advance();
                Token::new(TokenType::Multiply, "*".into(), position, line, column)
            }
            '/' => {
                self.advance();
                Token::new(TokenType::Divide, "/".into(), position, line, column)
            }
            '=' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenType::EqualEqual, "==".into(), position, line, column)
                } else {
                    Token::new(TokenType::Equal, "=".into(), position, line, column)
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenType::NotEqual, "!=".into(), position, line, column)
                } else {
                    Token::error("unexpected '!' character".into(), position, line, column)
                }
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(
                        TokenType::LessThanOrEqual,
                        "<=".into(),
                        position,
                        line,
                        column,
                    )
                } else {
                    Token::new(TokenType::LessThan, "<".into(), position, line, column)
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(
                        TokenType::GreaterThanOrEqual,
                        ">=".into(),
                        position,
                        line,
                        column,
                    )
                } else {
                    Token::new(TokenType::GreaterThan, ">".into(), position, line, column)
                }
            }
            '?' => {
                self.advance();
                let ident = self.read_identifier();
                if ident.is_empty() {
                    Token::error(
                        "expected identifier after '?'".into(),
                        position,
                        line,
                        column,
                    )
                } else {
                    Token::new(TokenType::Var, format!("?{}", ident), position, line, column)
                }
            }
            '\'' => {
                // Single-quoted string, possibly with a typed-scalar suffix
                match self.read_quoted_string('\'') {
                    Ok(value) => {
                        if self.current_char == Some('^') {
                            self.read_typed_suffix(value, position, line, column)
                        } else {
                            Token::new(TokenType::StringLiteral, value, position, line, column)
                        }
                    }
                    Err(e) => Token::error(e, position, line, column),
                }
            }
            '"' => {
                if self.peek() == Some('"') && self.peek2() == Some('"') {
                    match self.read_triple_string() {
                        Ok(value) => {
                            Token::new(TokenType::StringLiteral, value, position, line, column)
                        }
                        Err(e) => Token::error(e, position, line, column),
                    }
                } else {
                    match self.read_quoted_string('"') {
                        Ok(value) => {
                            Token::new(TokenType::StringLiteral, value, position, line, column)
                        }
                        Err(e) => Token::error(e, position, line, column),
                    }
                }
            }
            _ => {
                if c.is_ascii_digit() {
                    let value = self.read_number();
                    Token::new(TokenType::NumberLiteral, value, position, line, column)
                } else if c.is_alphabetic() || c == '_' {
                    let ident = self.read_identifier();
                    let token_type = match ident.as_str() {
                        "is" => TokenType::Is,
                        "in" => TokenType::In,
                        "subset" => TokenType::Subset,
                        "not" => TokenType::Not,
                        "true" => TokenType::True,
                        "false" => TokenType::False,
                        "collection" => TokenType::Collection,
                        "set" => TokenType::Set,
                        "count" => TokenType::Count,
                        "sum" => TokenType::Sum,
                        "average" => TokenType::Average,
                        "min" => TokenType::Min,
                        "max" => TokenType::Max,
                        _ => TokenType::Name,
                    };
                    Token::new(token_type, ident, position, line, column)
                } else {
                    Token::error(
                        format!("unexpected character: {}", c),
                        position,
                        line,
                        column,
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_vars_and_names() {
        let tokens = tokenize("?x person _private ?long_name42");
        assert_eq!(tokens[0].token_type, TokenType::Var);
        assert_eq!(tokens[0].value, "?x");
        assert_eq!(tokens[1].token_type, TokenType::Name);
        assert_eq!(tokens[1].value, "person");
        assert_eq!(tokens[2].token_type, TokenType::Name);
        assert_eq!(tokens[3].token_type, TokenType::Var);
        assert_eq!(tokens[3].value, "?long_name42");
    }

    #[test]
    fn test_string_forms() {
        let tokens = tokenize(r#"'single' "double" """triple
line""""#);
        assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[0].value, "single");
        assert_eq!(tokens[1].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[1].value, "double");
        assert_eq!(tokens[2].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[2].value, "triple\nline");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r"'it\'s' 'a\nb' 'A'");
        assert_eq!(tokens[0].value, "it's");
        assert_eq!(tokens[1].value, "a\nb");
        assert_eq!(tokens[2].value, "A");
    }

    #[test]
    fn test_numbers_and_terminator() {
        let tokens = tokenize("42 3.14 7.");
        assert_eq!(tokens[0].token_type, TokenType::NumberLiteral);
        assert_eq!(tokens[0].value, "42");
        assert_eq!(tokens[1].token_type, TokenType::NumberLiteral);
        assert_eq!(tokens[1].value, "3.14");
        // Trailing dot is the query terminator, not a decimal point
        assert_eq!(tokens[2].token_type, TokenType::NumberLiteral);
        assert_eq!(tokens[2].value, "7");
        assert_eq!(tokens[3].token_type, TokenType::Dot);
    }

    #[test]
    fn test_typed_literals() {
        let tokens = tokenize("'2023-02-18'^Date '10.00'^Currency(USD)");
        assert_eq!(tokens[0].token_type, TokenType::DateLiteral);
        assert_eq!(tokens[0].value, "2023-02-18");
        assert_eq!(tokens[1].token_type, TokenType::CurrencyLiteral);
        assert_eq!(tokens[1].value, "10.00");
        assert_eq!(tokens[1].param.as_deref(), Some("USD"));
    }

    #[test]
    fn test_unit_literal() {
        let tokens = tokenize("'100.0'^Unit('http://qudt.org/vocab/unit/kg')");
        assert_eq!(tokens[0].token_type, TokenType::UnitLiteral);
        assert_eq!(tokens[0].value, "100.0");
        assert_eq!(
            tokens[0].param.as_deref(),
            Some("http://qudt.org/vocab/unit/kg")
        );
    }

    #[test]
    fn test_bad_currency_code() {
        let tokens = tokenize("'10.00'^Currency(ALPHA)");
        assert_eq!(tokens[0].token_type, TokenType::Error);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("= == != < <= > >= + - * / , ; |");
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            &kinds[..14],
            &[
                TokenType::Equal,
                TokenType::EqualEqual,
                TokenType::NotEqual,
                TokenType::LessThan,
                TokenType::LessThanOrEqual,
                TokenType::GreaterThan,
                TokenType::GreaterThanOrEqual,
                TokenType::Plus,
                TokenType::Minus,
                TokenType::Multiply,
                TokenType::Divide,
                TokenType::Comma,
                TokenType::Semicolon,
                TokenType::Pipe,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("is in subset not true false sum count");
        assert_eq!(tokens[0].token_type, TokenType::Is);
        assert_eq!(tokens[1].token_type, TokenType::In);
        assert_eq!(tokens[2].token_type, TokenType::Subset);
        assert_eq!(tokens[3].token_type, TokenType::Not);
        assert_eq!(tokens[4].token_type, TokenType::True);
        assert_eq!(tokens[5].token_type, TokenType::False);
        assert_eq!(tokens[6].token_type, TokenType::Sum);
        assert_eq!(tokens[7].token_type, TokenType::Count);
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("person // trailing\n/* block\ncomment */ ?x");
        assert_eq!(tokens[0].token_type, TokenType::Name);
        assert_eq!(tokens[1].token_type, TokenType::Var);
        assert_eq!(tokens[2].token_type, TokenType::Eof);
    }
}
