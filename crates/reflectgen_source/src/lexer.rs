//! Lexer for C++ headers.
//!
//! The lexer converts header text into a stream of tokens. Preprocessor
//! directives become a single [`TokenKind::Directive`] token each; everything
//! else is tokenized closely enough for declaration-level parsing.

use crate::token::{PUNCTUATORS, Span, Token, TokenKind, is_keyword};

/// Lexer for C++ header text.
pub struct Lexer<'src> {
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// True until a non-whitespace character is seen on the current line.
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let line_start = self.at_line_start;
        self.at_line_start = false;

        let kind = match c {
            '#' if line_start => self.scan_directive(),
            '/' if self.peek_char_n(1) == Some('/') => self.scan_line_comment(),
            '/' if self.peek_char_n(1) == Some('*') => self.scan_block_comment(),
            '"' => self.scan_quoted('"', String::new()),
            '\'' => self.scan_quoted('\'', String::new()),
            c if c.is_ascii_digit() => self.scan_number(),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if is_ident_start(c) => self.scan_word(),
            _ => self.scan_punct(),
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// Comments and directives are included in the output; the final token is
    /// always [`TokenKind::Eof`].
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks at the character `n` positions ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
                self.at_line_start = true;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace, including escaped newlines.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '\\' && matches!(self.peek_char_n(1), Some('\n' | '\r')) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scans a directive line starting with `#`, joining `\` continuations.
    fn scan_directive(&mut self) -> TokenKind {
        self.advance(); // consume '#'
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            match c {
                '\n' => break,
                '\\' if matches!(self.peek_char_n(1), Some('\n' | '\r')) => {
                    self.advance();
                    if self.peek_char() == Some('\r') {
                        self.advance();
                    }
                    self.advance();
                    text.push(' ');
                }
                '/' if self.peek_char_n(1) == Some('/') => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                '/' if self.peek_char_n(1) == Some('*') => {
                    if let TokenKind::Error(message) = self.scan_block_comment() {
                        return TokenKind::Error(message);
                    }
                    text.push(' ');
                }
                c => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        TokenKind::Directive(text.trim().to_string())
    }

    /// Scans a `//` comment.
    fn scan_line_comment(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        TokenKind::Comment(text)
    }

    /// Scans a `/* */` comment.
    fn scan_block_comment(&mut self) -> TokenKind {
        let mut text = String::from("/*");
        self.advance();
        self.advance();
        loop {
            match self.peek_char() {
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    text.push_str("*/");
                    return TokenKind::Comment(text);
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
                None => return TokenKind::Error("unterminated block comment".into()),
            }
        }
    }

    /// Scans a string or character literal, keeping quotes and escapes verbatim.
    fn scan_quoted(&mut self, quote: char, prefix: String) -> TokenKind {
        let mut text = prefix;
        text.push(quote);
        self.advance(); // opening quote
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    text.push(c);
                    self.advance();
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(c) = self.peek_char() {
                        text.push(c);
                        self.advance();
                    }
                }
                Some('\n') | None => {
                    return TokenKind::Error(if quote == '"' {
                        "unterminated string literal".into()
                    } else {
                        "unterminated character literal".into()
                    });
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        if quote == '"' {
            TokenKind::Str(text)
        } else {
            TokenKind::Char(text)
        }
    }

    /// Scans a raw string literal body after `R"`.
    fn scan_raw_string(&mut self, prefix: String) -> TokenKind {
        let mut text = prefix;
        text.push('"');
        self.advance(); // opening quote
        let mut delimiter = String::new();
        while let Some(c) = self.peek_char() {
            self.advance();
            text.push(c);
            if c == '(' {
                break;
            }
            delimiter.push(c);
        }
        let terminator = format!("){delimiter}\"");
        loop {
            if self.rest.starts_with(&terminator) {
                for _ in 0..terminator.chars().count() {
                    self.advance();
                }
                text.push_str(&terminator);
                return TokenKind::Str(text);
            }
            match self.peek_char() {
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
                None => return TokenKind::Error("unterminated raw string literal".into()),
            }
        }
    }

    /// Scans a numeric literal including suffixes, exponents and digit separators.
    fn scan_number(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            let exponent_sign = matches!(c, '+' | '-')
                && text
                    .chars()
                    .last()
                    .is_some_and(|p| matches!(p, 'e' | 'E' | 'p' | 'P'))
                && !text.starts_with("0x")
                && !text.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                text.push(c);
                self.advance();
            } else if c == '\'' && self.peek_char_n(1).is_some_and(|n| n.is_ascii_alphanumeric()) {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Number(text)
    }

    /// Scans an identifier or keyword, diverting to literals for encoding prefixes.
    fn scan_word(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        match (text.as_str(), self.peek_char()) {
            ("R" | "u8R" | "uR" | "UR" | "LR", Some('"')) => self.scan_raw_string(text),
            ("u8" | "u" | "U" | "L", Some(q @ ('"' | '\''))) => self.scan_quoted(q, text),
            _ if is_keyword(&text) => TokenKind::Keyword(text),
            _ => TokenKind::Ident(text),
        }
    }

    /// Scans the longest matching punctuator.
    fn scan_punct(&mut self) -> TokenKind {
        for punct in PUNCTUATORS {
            if self.rest.starts_with(punct) {
                for _ in 0..punct.len() {
                    self.advance();
                }
                return TokenKind::Punct(punct);
            }
        }
        let c = self.peek_char().unwrap_or_default();
        self.advance();
        TokenKind::Error(format!("unexpected character: {c}"))
    }
}

/// Returns true if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Returns true if `c` can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize_all(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn lex_empty() {
        assert!(lex("").is_empty());
        assert!(lex("  \n\t ").is_empty());
    }

    #[test]
    fn lex_class_head() {
        assert_eq!(
            lex("class Foo : public ns::Bar {"),
            vec![
                TokenKind::Keyword("class".into()),
                TokenKind::Ident("Foo".into()),
                TokenKind::Punct(":"),
                TokenKind::Keyword("public".into()),
                TokenKind::Ident("ns".into()),
                TokenKind::Punct("::"),
                TokenKind::Ident("Bar".into()),
                TokenKind::Punct("{"),
            ]
        );
    }

    #[test]
    fn lex_nested_template_closers_stay_split() {
        let kinds = lex("A<B<int>>");
        assert_eq!(kinds[kinds.len() - 1], TokenKind::Punct(">"));
        assert_eq!(kinds[kinds.len() - 2], TokenKind::Punct(">"));
    }

    #[test]
    fn lex_directive_only_at_line_start() {
        let kinds = lex("#include \"a.h\"\nint x; // #not\n  #define X \\\n 1\n");
        assert_eq!(kinds[0], TokenKind::Directive("include \"a.h\"".into()));
        assert!(kinds.contains(&TokenKind::Comment("// #not".into())));
        assert!(kinds.contains(&TokenKind::Directive("define X   1".into())));
    }

    #[test]
    fn lex_literals() {
        assert_eq!(
            lex(r#"0x1Fu 1'000 1.5e-3f "a\"b" 'c' u8"x" R"(raw)""#),
            vec![
                TokenKind::Number("0x1Fu".into()),
                TokenKind::Number("1000".into()),
                TokenKind::Number("1.5e-3f".into()),
                TokenKind::Str(r#""a\"b""#.into()),
                TokenKind::Char("'c'".into()),
                TokenKind::Str("u8\"x\"".into()),
                TokenKind::Str("R\"(raw)\"".into()),
            ]
        );
    }

    #[test]
    fn lex_comments() {
        assert_eq!(
            lex("/* a */ b"),
            vec![
                TokenKind::Comment("/* a */".into()),
                TokenKind::Ident("b".into())
            ]
        );
    }

    #[test]
    fn lex_unterminated_comment() {
        assert!(matches!(lex("/* open")[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_unterminated_string() {
        assert!(matches!(lex("\"open\n")[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_span_tracking() {
        let tokens = Lexer::tokenize_all("int\n  x;");
        assert_eq!(tokens[0].span, Span::new(0, 3, 1, 1));
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }

    #[test]
    fn lex_longest_punct() {
        assert_eq!(
            lex("a->b ... <=>"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("->"),
                TokenKind::Ident("b".into()),
                TokenKind::Punct("..."),
                TokenKind::Punct("<=>"),
            ]
        );
    }
}
