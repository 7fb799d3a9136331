// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from module source text.

use super::{Span, Substitution, Token, TokenKind};
use unicode_xid::UnicodeXID;

/// A scanner that tokenizes configuration module source code.
///
/// Cloning a scanner is cheap and is how the parser peeks ahead.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = match self.skip_whitespace_and_comments() {
            Ok(newline) => newline,
            Err(message) => {
                let end = self.source.len();
                return Token::new(
                    TokenKind::Invalid(message.to_string()),
                    Span::new(self.current_pos, end),
                    false,
                );
            }
        };

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), newline_before);
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '<' => self.scan_pair('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.scan_pair('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '%' => self.scan_pair('=', TokenKind::PercentEqual, TokenKind::Percent),
            // a regex literal is only recognized on request, see `scan_regex`
            '/' => self.scan_pair('=', TokenKind::SlashEqual, TokenKind::Slash),
            '-' => self.scan_arithmetic('-', TokenKind::MinusMinus, TokenKind::MinusEqual, TokenKind::Minus),
            '+' => self.scan_arithmetic('+', TokenKind::PlusPlus, TokenKind::PlusEqual, TokenKind::Plus),
            '*' => self.scan_arithmetic('*', TokenKind::StarStar, TokenKind::StarEqual, TokenKind::Star),
            '@' => TokenKind::At,

            '.' => self.scan_dot(),
            '?' => self.scan_question(),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '|' => self.scan_logical('|', TokenKind::PipePipeEqual, TokenKind::PipePipe, TokenKind::Pipe),
            '&' => self.scan_logical('&', TokenKind::AmpAmpEqual, TokenKind::AmpAmp, TokenKind::Ampersand),

            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(ch),

            _ if is_id_start(ch) => self.scan_identifier(start),

            _ => TokenKind::Invalid(format!("Invalid or unexpected token '{}'", ch)),
        };

        Token::new(kind, Span::new(start, self.current_pos), newline_before)
    }

    /// Rescans a `/` or `/=` token that the parser found in operand position
    /// as a regular expression literal.
    ///
    /// `start` is the offset of the slash and `prefix` the text the scanner
    /// already consumed after it (`"="` for `/=`).
    pub fn scan_regex(&mut self, start: usize, prefix: &str, newline_before: bool) -> Token {
        let mut pattern = prefix.to_string();
        let mut in_class = false;
        loop {
            match self.advance() {
                Some((_, '\\')) => {
                    pattern.push('\\');
                    match self.advance() {
                        Some((_, '\n' | '\r')) | None => {
                            return self.unterminated_regex(start, newline_before);
                        }
                        Some((_, ch)) => pattern.push(ch),
                    }
                }
                Some((_, '/')) if !in_class => break,
                Some((_, ch @ ('[' | ']'))) => {
                    in_class = ch == '[';
                    pattern.push(ch);
                }
                Some((_, '\n' | '\r')) | None => {
                    return self.unterminated_regex(start, newline_before);
                }
                Some((_, ch)) => pattern.push(ch),
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.peek() {
            if !is_id_continue(ch) {
                break;
            }
            flags.push(ch);
            self.advance();
        }

        Token::new(
            TokenKind::RegExp { pattern, flags },
            Span::new(start, self.current_pos),
            newline_before,
        )
    }

    fn unterminated_regex(&self, start: usize, newline_before: bool) -> Token {
        Token::new(
            TokenKind::Invalid("Invalid regular expression: missing /".into()),
            Span::new(start, self.current_pos),
            newline_before,
        )
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips trivia, reporting whether a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, &'static str> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if ch == '\n' || ch == '\r' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        let mut closed = false;
                        while let Some((_, ch)) = self.advance() {
                            if ch == '\n' || ch == '\r' {
                                newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                closed = true;
                                break;
                            }
                            prev = ch;
                        }
                        if !closed {
                            return Err("Unterminated comment");
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(newline)
    }

    fn scan_dot(&mut self) -> TokenKind {
        match self.peek() {
            Some('0'..='9') => self.scan_number('.'),
            Some('.') if self.peek_next() == Some('.') => {
                self.advance();
                self.advance();
                TokenKind::Ellipsis
            }
            _ => TokenKind::Dot,
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        match self.peek() {
            Some('?') => {
                self.advance();
                if self.eat('=') {
                    TokenKind::QuestionQuestionEqual
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            // `a?.5:1` is a conditional, not optional chaining
            Some('.') if !matches!(self.peek_next(), Some('0'..='9')) => {
                self.advance();
                TokenKind::QuestionDot
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.eat('>') {
            TokenKind::Arrow
        } else if self.eat('=') {
            if self.eat('=') {
                TokenKind::EqualEqualEqual
            } else {
                TokenKind::EqualEqual
            }
        } else {
            TokenKind::Equal
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.eat('=') {
            if self.eat('=') {
                TokenKind::BangEqualEqual
            } else {
                TokenKind::BangEqual
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.eat(second) { double } else { single }
    }

    /// `++`, `+=` or `+` (and the same shapes for `-` and `*`).
    fn scan_arithmetic(
        &mut self,
        ch: char,
        doubled: TokenKind,
        assign: TokenKind,
        single: TokenKind,
    ) -> TokenKind {
        if self.eat(ch) {
            doubled
        } else if self.eat('=') {
            assign
        } else {
            single
        }
    }

    /// `||=`, `||` or `|` (and `&&=`, `&&`, `&`).
    fn scan_logical(
        &mut self,
        ch: char,
        assign: TokenKind,
        doubled: TokenKind,
        single: TokenKind,
    ) -> TokenKind {
        if self.eat(ch) {
            if self.eat('=') { assign } else { doubled }
        } else {
            single
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, ch)) if ch == quote => return TokenKind::String(value),
                Some((_, '\\')) => {
                    if let Err(message) = self.scan_escape(&mut value) {
                        return TokenKind::Invalid(message);
                    }
                }
                Some((_, '\n' | '\r')) | None => {
                    return TokenKind::Invalid("Unterminated string literal".into());
                }
                Some((_, ch)) => value.push(ch),
            }
        }
    }

    /// Processes an escape sequence; the backslash is already consumed.
    fn scan_escape(&mut self, out: &mut String) -> Result<(), String> {
        let Some((_, ch)) = self.advance() else {
            return Err("Unterminated escape sequence".into());
        };
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !matches!(self.peek(), Some('0'..='9')) => out.push('\0'),
            'x' => {
                let code = self.scan_hex_digits(2)?;
                out.push(char::from_u32(code).ok_or("Invalid hexadecimal escape sequence")?);
            }
            'u' => {
                let code = if self.eat('{') {
                    let mut code = 0u32;
                    let mut digits = 0;
                    loop {
                        match self.advance() {
                            Some((_, '}')) if digits > 0 => break,
                            Some((_, d)) if d.is_ascii_hexdigit() && code <= 0x10FFFF => {
                                code = code * 16 + d.to_digit(16).unwrap_or(0);
                                digits += 1;
                            }
                            _ => return Err("Invalid Unicode escape sequence".into()),
                        }
                    }
                    code
                } else {
                    self.scan_hex_digits(4)?
                };
                out.push(char::from_u32(code).ok_or("Undefined Unicode code-point")?);
            }
            // Line continuation
            '\r' => {
                self.eat('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
        Ok(())
    }

    fn scan_hex_digits(&mut self, count: usize) -> Result<u32, String> {
        let mut code = 0u32;
        for _ in 0..count {
            match self.advance() {
                Some((_, d)) if d.is_ascii_hexdigit() => {
                    code = code * 16 + d.to_digit(16).unwrap_or(0);
                }
                _ => return Err("Invalid hexadecimal escape sequence".into()),
            }
        }
        Ok(code)
    }

    fn scan_template(&mut self) -> TokenKind {
        let mut quasis = Vec::new();
        let mut substitutions = Vec::new();
        let mut chunk = String::new();

        loop {
            match self.advance() {
                Some((_, '`')) => break,
                Some((_, '\\')) => {
                    if let Err(message) = self.scan_escape(&mut chunk) {
                        return TokenKind::Invalid(message);
                    }
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    quasis.push(std::mem::take(&mut chunk));
                    match self.scan_substitution() {
                        Ok(sub) => substitutions.push(sub),
                        Err(message) => return TokenKind::Invalid(message.into()),
                    }
                }
                Some((_, '\r')) => {
                    // Template text normalizes CRLF to LF
                    self.eat('\n');
                    chunk.push('\n');
                }
                Some((_, ch)) => chunk.push(ch),
                None => return TokenKind::Invalid("Unterminated template literal".into()),
            }
        }
        quasis.push(chunk);

        TokenKind::Template {
            quasis,
            substitutions,
        }
    }

    /// Captures the raw source of a `${...}` substitution; `${` is consumed.
    fn scan_substitution(&mut self) -> Result<Substitution, &'static str> {
        let offset = self.current_pos;
        let mut depth = 1usize;

        while let Some((pos, ch)) = self.advance() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Substitution {
                            offset,
                            source: self.source[offset..pos].to_string(),
                        });
                    }
                }
                '"' | '\'' | '`' => {
                    // Skip nested literals so their braces don't count
                    while let Some((_, inner)) = self.advance() {
                        if inner == '\\' {
                            self.advance();
                        } else if inner == ch {
                            break;
                        }
                    }
                }
                _ => {}
            }
        }

        Err("Unterminated template literal")
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch == '_' {
                        self.advance();
                    } else if ch.is_digit(radix) {
                        digits.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
                return match u64::from_str_radix(&digits, radix) {
                    Ok(n) => self.finish_number(n as f64),
                    Err(_) => TokenKind::Invalid("Invalid or unexpected token".into()),
                };
            }
        }

        let mut text = String::new();
        text.push(first);
        let mut seen_dot = first == '.';
        let mut seen_exponent = false;

        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => text.push(ch),
                '_' => {}
                '.' if !seen_dot && !seen_exponent => {
                    seen_dot = true;
                    text.push(ch);
                }
                'e' | 'E' if !seen_exponent => {
                    seen_exponent = true;
                    text.push(ch);
                    self.advance();
                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        text.push(sign);
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        match text.parse::<f64>() {
            Ok(n) => self.finish_number(n),
            Err(_) => TokenKind::Invalid(format!("Invalid number literal '{}'", text)),
        }
    }

    fn finish_number(&mut self, value: f64) -> TokenKind {
        match self.peek() {
            Some('n') => TokenKind::Invalid("BigInt literals are not supported".into()),
            Some(ch) if is_id_start(ch) => {
                TokenKind::Invalid("Identifier directly after number".into())
            }
            _ => TokenKind::Number(value),
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }
        let word = &self.source[start..self.current_pos];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
    }
}

fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_xid_start()
}

fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '\u{200c}' || ch == '\u{200d}' || ch.is_xid_continue()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut out = Vec::new();
        loop {
            let token = scanner.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_punctuators() {
        assert_eq!(
            kinds("a?.b ?? c === d !== e => ..."),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::QuestionDot,
                TokenKind::Identifier("b".into()),
                TokenKind::QuestionQuestion,
                TokenKind::Identifier("c".into()),
                TokenKind::EqualEqualEqual,
                TokenKind::Identifier("d".into()),
                TokenKind::BangEqualEqual,
                TokenKind::Identifier("e".into()),
                TokenKind::Arrow,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_arithmetic_and_assignment_operators() {
        assert_eq!(
            kinds("a + b++ - c-- * d ** e / f % g += h ||= i ??= j <= k >= l"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Plus,
                TokenKind::Identifier("b".into()),
                TokenKind::PlusPlus,
                TokenKind::Minus,
                TokenKind::Identifier("c".into()),
                TokenKind::MinusMinus,
                TokenKind::Star,
                TokenKind::Identifier("d".into()),
                TokenKind::StarStar,
                TokenKind::Identifier("e".into()),
                TokenKind::Slash,
                TokenKind::Identifier("f".into()),
                TokenKind::Percent,
                TokenKind::Identifier("g".into()),
                TokenKind::PlusEqual,
                TokenKind::Identifier("h".into()),
                TokenKind::PipePipeEqual,
                TokenKind::Identifier("i".into()),
                TokenKind::QuestionQuestionEqual,
                TokenKind::Identifier("j".into()),
                TokenKind::LessEqual,
                TokenKind::Identifier("k".into()),
                TokenKind::GreaterEqual,
                TokenKind::Identifier("l".into()),
            ]
        );
    }

    #[test]
    fn test_regex_rescan() {
        let source = "/\\.(md|mdx)$/i, x";
        let mut scanner = Scanner::new(source);
        let slash = scanner.next_token();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regex = scanner.scan_regex(slash.span.start, "", false);
        assert_eq!(
            regex.kind,
            TokenKind::RegExp {
                pattern: "\\.(md|mdx)$".into(),
                flags: "i".into()
            }
        );
        assert_eq!(scanner.next_token().kind, TokenKind::Comma);
    }

    #[test]
    fn test_regex_class_may_contain_slash() {
        let mut scanner = Scanner::new("/=[/]+/g");
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::SlashEqual);
        let regex = scanner.scan_regex(token.span.start, "=", false);
        assert_eq!(
            regex.kind,
            TokenKind::RegExp {
                pattern: "=[/]+".into(),
                flags: "g".into()
            }
        );
        let mut open = Scanner::new("/abc\n/");
        open.next_token();
        assert!(matches!(open.scan_regex(0, "", false).kind, TokenKind::Invalid(_)));
    }

    #[test]
    fn test_conditional_with_fraction_is_not_optional_chain() {
        assert_eq!(
            kinds("a?.5:1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Question,
                TokenKind::Number(0.5),
                TokenKind::Colon,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb" "\u{1F680}" "\x41""#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("a\nb".into()),
                TokenKind::String("🚀".into()),
                TokenKind::String("A".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(kinds("'abc")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.5 .25 1e3 0xff 0b101 1_000"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(0.25),
                TokenKind::Number(1000.0),
                TokenKind::Number(255.0),
                TokenKind::Number(5.0),
                TokenKind::Number(1000.0),
            ]
        );
        assert!(matches!(kinds("10n")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_template_with_substitutions() {
        let tokens = kinds("`https://${host}:${ports[0]}/`");
        let TokenKind::Template {
            quasis,
            substitutions,
        } = &tokens[0]
        else {
            panic!("expected template, got {:?}", tokens[0]);
        };
        assert_eq!(quasis, &vec!["https://".to_string(), ":".into(), "/".into()]);
        assert_eq!(substitutions[0].source, "host");
        assert_eq!(substitutions[1].source, "ports[0]");
        assert_eq!(substitutions[0].offset, 11);
    }

    #[test]
    fn test_keywords_and_contextual_identifiers() {
        assert_eq!(
            kinds("export default from as"),
            vec![
                TokenKind::Export,
                TokenKind::Default,
                TokenKind::Identifier("from".into()),
                TokenKind::Identifier("as".into()),
            ]
        );
    }

    #[test]
    fn test_newline_tracking() {
        let mut scanner = Scanner::new("a /* x\n */ b\nc");
        assert!(!scanner.next_token().newline_before);
        assert!(scanner.next_token().newline_before);
        assert!(scanner.next_token().newline_before);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// line\n/* block */ x"),
            vec![TokenKind::Identifier("x".into())]
        );
        assert!(matches!(kinds("/* open")[0], TokenKind::Invalid(_)));
    }
}
