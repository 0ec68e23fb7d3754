//! Token vocabulary of the statement dialect.
//!
//! Every token carries its discriminant, the raw matched text (delimiters
//! included for quoted forms), and an inclusive [`Span`]. Keywords are
//! their own variants so the parser can dispatch without string
//! comparisons.

use slens_ast::Span;
use std::fmt;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token discriminant, with literal values already decoded.
    pub kind: TokenKind,
    /// Exactly the source text this token matched.
    pub text: String,
    /// Where the matched text sits in the input.
    pub span: Span,
}

impl Token {
    /// Short description for diagnostics, e.g. ``identifier `users` ``.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of input".to_owned(),
            TokenKind::Id(_) | TokenKind::QuotedId(_) => format!("identifier `{}`", self.text),
            TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::Boolean(_) => format!("literal `{}`", self.text),
            _ => format!("`{}`", self.text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Token discriminant.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    /// Integer literal: `42`.
    Integer(i64),
    /// Float literal with digits on both sides of the dot: `4.5`.
    Float(f64),
    /// Single-quoted string literal, stored unescaped.
    String(String),
    /// Boolean literal `true` / `false` (any casing).
    Boolean(bool),

    // === Identifiers ===
    /// Bare identifier.
    Id(String),
    /// Double-quoted identifier, stored unescaped.
    QuotedId(String),

    // === Keywords ===
    KwSelect,
    KwFrom,
    KwWhere,
    KwAs,

    // === Operators ===
    Eq, // `=`
    Ne, // `!=`
    Lt, // `<`
    Le, // `<=`
    Gt, // `>`
    Ge, // `>=`
    Star,

    // === Punctuation ===
    Dot,
    Comma,
    Semicolon,

    // === Special ===
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a word to see if it is a keyword. Keywords match
    /// case-insensitively; anything else stays an identifier.
    #[must_use]
    pub fn lookup_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::KwSelect),
            "FROM" => Some(Self::KwFrom),
            "WHERE" => Some(Self::KwWhere),
            "AS" => Some(Self::KwAs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slens_ast::Extent;

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        assert_eq!(TokenKind::lookup_keyword("select"), Some(TokenKind::KwSelect));
        assert_eq!(TokenKind::lookup_keyword("From"), Some(TokenKind::KwFrom));
        assert_eq!(TokenKind::lookup_keyword("WHERE"), Some(TokenKind::KwWhere));
        assert_eq!(TokenKind::lookup_keyword("aS"), Some(TokenKind::KwAs));
    }

    #[test]
    fn keyword_lookup_rejects_longer_words() {
        // A word that merely starts with a keyword is not a keyword.
        assert_eq!(TokenKind::lookup_keyword("SELECTED"), None);
        assert_eq!(TokenKind::lookup_keyword("fromage"), None);
        assert_eq!(TokenKind::lookup_keyword("wherever"), None);
    }

    #[test]
    fn describe_names_the_token_class() {
        let span = Span::new(Extent::new(0, 4), Extent::new(1, 1), Extent::new(1, 5));
        let token = Token {
            kind: TokenKind::Id("users".into()),
            text: "users".into(),
            span,
        };
        assert_eq!(token.describe(), "identifier `users`");
        assert_eq!(token.to_string(), "identifier `users`");

        let token = Token {
            kind: TokenKind::Integer(42),
            text: "42".into(),
            span,
        };
        assert_eq!(token.describe(), "literal `42`");

        let token = Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span,
        };
        assert_eq!(token.describe(), "end of input");
    }
}
