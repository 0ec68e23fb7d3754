//! Hand-built lexer for the statement dialect.
//!
//! Scans raw bytes with a maximal-munch rule: at every position the
//! longest token that can match does match, which is why `<=` never
//! splits into `<` `=` and why a word is read to its end before keyword
//! classification. Uses memchr to find closing quotes. Tokenization is
//! strict: any text outside the vocabulary aborts with a
//! [`ParserError`] naming the first offending character.

use memchr::memchr;
use slens_ast::{Extent, Span};
use slens_error::ParserError;
use tracing::trace;

use crate::token::{Token, TokenKind};

/// Start-of-token snapshot used to build spans and lexeme text.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    col: usize,
}

/// Lexer over the source bytes, tracking byte offset, 1-based line, and
/// 1-based column as it goes.
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a [u8],
    /// Byte offset of the next unread character.
    pos: usize,
    /// Line of the next unread character.
    line: usize,
    /// Column of the next unread character.
    col: usize,
    /// Line of the most recently consumed character.
    last_line: usize,
    /// Column of the most recently consumed character.
    last_col: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            last_line: 1,
            last_col: 1,
        }
    }

    /// Tokenize the entire input, appending a final [`TokenKind::Eof`].
    ///
    /// The returned tokens own their text, so they are free of the
    /// source borrow. Fails on the first character that cannot start a
    /// token; nothing lexed before the failure is returned.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, ParserError> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        trace!(tokens = tokens.len(), "tokenized input");
        Ok(tokens)
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Token, ParserError> {
        self.skip_trivia()?;

        if self.pos >= self.src.len() {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: self.end_of_input_span(),
            });
        }

        let mark = self.mark();
        let kind = match self.src[self.pos] {
            // String literal (single-quoted)
            b'\'' => {
                let value = self.lex_delimited(b'\'', "string literal")?;
                TokenKind::String(value)
            }

            // Double-quoted identifier
            b'"' => {
                let value = self.lex_delimited(b'"', "quoted identifier")?;
                TokenKind::QuotedId(value)
            }

            // Numbers
            b'0'..=b'9' => self.lex_number(&mark)?,

            // Identifiers, keywords, boolean literals
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_word(&mark),

            // Single-character operators and punctuation
            b'*' => {
                self.advance();
                TokenKind::Star
            }
            b'.' => {
                self.advance();
                TokenKind::Dot
            }
            b',' => {
                self.advance();
                TokenKind::Comma
            }
            b';' => {
                self.advance();
                TokenKind::Semicolon
            }
            b'=' => {
                self.advance();
                TokenKind::Eq
            }

            // Operators with a longer form: take the longest match
            b'<' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'!' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    return Err(ParserError::lexing(
                        "expected `=` after `!`",
                        self.span_from(&mark),
                    ));
                }
            }

            _ => {
                self.advance();
                let text = String::from_utf8_lossy(&self.src[mark.pos..self.pos]).into_owned();
                return Err(ParserError::lexing(
                    format!("unexpected character `{text}`"),
                    self.span_from(&mark),
                ));
            }
        };

        Ok(Token {
            kind,
            text: self.text_from(&mark),
            span: self.span_from(&mark),
        })
    }

    // -----------------------------------------------------------------------
    // Cursor helpers
    // -----------------------------------------------------------------------

    fn advance(&mut self) -> u8 {
        let ch = self.src[self.pos];
        self.pos += 1;
        self.last_line = self.line;
        self.last_col = self.col;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    /// Inclusive span from a mark through the last consumed character.
    fn span_from(&self, mark: &Mark) -> Span {
        Span::new(
            Extent::new(mark.pos, self.pos - 1),
            Extent::new(mark.line, self.last_line),
            Extent::new(mark.col, self.last_col),
        )
    }

    /// Single-point span at a mark, for errors about unconsumed text.
    fn point_span(mark: &Mark) -> Span {
        Span::new(
            Extent::new(mark.pos, mark.pos),
            Extent::new(mark.line, mark.line),
            Extent::new(mark.col, mark.col),
        )
    }

    fn end_of_input_span(&self) -> Span {
        Span::new(
            Extent::new(self.pos, self.pos),
            Extent::new(self.line, self.line),
            Extent::new(self.col, self.col),
        )
    }

    fn text_from(&self, mark: &Mark) -> String {
        String::from_utf8_lossy(&self.src[mark.pos..self.pos]).into_owned()
    }

    /// Skip whitespace, line comments (`-- ...`), and block comments
    /// (`/* ... */`). An unclosed block comment is a lexing error at its
    /// opening.
    fn skip_trivia(&mut self) -> Result<(), ParserError> {
        loop {
            while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
                self.advance();
            }

            if self.pos >= self.src.len() {
                return Ok(());
            }

            if self.src[self.pos] == b'-' && self.peek_at(1) == Some(b'-') {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.advance();
                }
                continue;
            }

            if self.src[self.pos] == b'/' && self.peek_at(1) == Some(b'*') {
                let open = self.mark();
                self.advance_by(2);
                loop {
                    if self.pos >= self.src.len() {
                        return Err(ParserError::lexing(
                            "unterminated block comment",
                            Self::point_span(&open),
                        ));
                    }
                    if self.src[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                        self.advance_by(2);
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            return Ok(());
        }
    }

    // -----------------------------------------------------------------------
    // Token classes
    // -----------------------------------------------------------------------

    /// Scan a delimited value (string literal or quoted identifier),
    /// consuming both delimiters. The returned value is unescaped: a
    /// backslash-escaped or doubled delimiter becomes one literal
    /// delimiter character.
    fn lex_delimited(&mut self, delimiter: u8, what: &str) -> Result<String, ParserError> {
        let open = self.mark();
        self.advance(); // opening delimiter

        let mut value = String::new();
        loop {
            let Some(found) = memchr(delimiter, &self.src[self.pos..]) else {
                return Err(ParserError::lexing(
                    format!("unterminated {what}"),
                    Self::point_span(&open),
                ));
            };

            // Backslash escape: the delimiter stays in the value, the
            // backslash does not.
            if found > 0 && self.src[self.pos + found - 1] == b'\\' {
                value.push_str(&String::from_utf8_lossy(
                    &self.src[self.pos..self.pos + found - 1],
                ));
                value.push(char::from(delimiter));
                self.advance_by(found + 1);
                continue;
            }

            value.push_str(&String::from_utf8_lossy(&self.src[self.pos..self.pos + found]));
            self.advance_by(found + 1); // through the candidate closer

            // Doubled delimiter escape: keep one, stay inside the value.
            if self.peek() == Some(delimiter) {
                value.push(char::from(delimiter));
                self.advance();
                continue;
            }

            return Ok(value);
        }
    }

    /// Lex an integer or float. A float needs digits on both sides of the
    /// dot; `12.` and `.5` are an integer or a dot token plus an integer.
    fn lex_number(&mut self, mark: &Mark) -> Result<TokenKind, ParserError> {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // the dot
            while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
                self.advance();
            }
        }

        let text = String::from_utf8_lossy(&self.src[mark.pos..self.pos]);
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Ok(TokenKind::Float(value)),
                Err(_) => Err(ParserError::lexing(
                    format!("invalid float literal `{text}`"),
                    self.span_from(mark),
                )),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(TokenKind::Integer(value)),
                Err(_) => Err(ParserError::lexing(
                    format!("integer literal out of range `{text}`"),
                    self.span_from(mark),
                )),
            }
        }
    }

    /// Lex a word, then classify it. The whole run of word characters is
    /// consumed before the keyword check, so `SELECTED` stays one
    /// identifier instead of `SELECT` plus `ED`.
    fn lex_word(&mut self, mark: &Mark) -> TokenKind {
        self.advance(); // first character already validated

        while self.pos < self.src.len() {
            let ch = self.src[self.pos];
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = String::from_utf8_lossy(&self.src[mark.pos..self.pos]).into_owned();
        if let Some(kw) = TokenKind::lookup_keyword(&text) {
            kw
        } else if text.eq_ignore_ascii_case("true") {
            TokenKind::Boolean(true)
        } else if text.eq_ignore_ascii_case("false") {
            TokenKind::Boolean(false)
        } else {
            TokenKind::Id(text)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
