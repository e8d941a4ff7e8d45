use std::{fmt, ops::Range};

use serde::{ser::SerializeStruct, Serialize, Serializer};

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Token {
        Token {
            kind,
            value: value.into(),
            span,
        }
    }

    /// An end-of-file token placed right after `span`.
    pub fn eof_after(span: Span) -> Token {
        Token::new(TokenKind::Eof, "", span.end_point())
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    /// Byte offset of the first byte of the token.
    pub fn start(&self) -> usize {
        self.span.lo
    }

    /// Byte offset one past the last byte of the token.
    pub fn end(&self) -> usize {
        self.span.hi()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Checks both the kind and the literal value.
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::YggKeyword, keyword)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, {})", self.kind, self.value, self.span)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Token", 6)?;
        s.serialize_field("type", &self.kind)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("line", &self.line())?;
        s.serialize_field("column", &self.column())?;
        s.serialize_field("start", &self.start())?;
        s.serialize_field("end", &self.end())?;
        s.end()
    }
}

/// A byte range in the source, together with the line and column (both
/// 1-based, columns counted in characters) of its first character.
#[derive(Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub lo: usize,
    pub len: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>, line: u32, column: u32) -> Span {
        debug_assert!(hi >= lo);
        Span {
            lo,
            len: u32::try_from(hi - lo).unwrap(),
            line,
            column,
        }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span that starts at `self` and ends where `other` ends.
    pub fn to(self, other: Span) -> Span {
        let hi = self.hi().max(other.hi());
        Span::new_of_bounds(self.lo..hi, self.line, self.column)
    }

    /// An empty span located at the start of `self`.
    pub fn start_point(self) -> Span {
        Span::new_of_bounds(self.lo..self.lo, self.line, self.column)
    }

    /// An empty span located at the end of `self`.
    ///
    /// The column is `column + len`, which is only exact for single-line
    /// ASCII spans. See [`crate::parser::Parser::new`].
    pub fn end_point(self) -> Span {
        let column = self.column + self.len;
        Span::new_of_bounds(self.hi()..self.hi(), self.line, column)
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, at {}:{})", self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

impl<T> Spanned<T> {
    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Generic keyword. Reserved; every reserved word of the language is
    /// lexed as [`TokenKind::YggKeyword`].
    Keyword,
    Identifier,
    Operator,
    Number,
    String,
    Boolean,
    Punctuation,
    /// Reserved; comments are discarded by the lexer.
    Comment,
    Eof,
    AxiomOperator,
    DimensionTag,
    YggKeyword,
    /// `~>`
    QuantumFlow,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Punctuation => "PUNCTUATION",
            TokenKind::Comment => "COMMENT",
            TokenKind::Eof => "EOF",
            TokenKind::AxiomOperator => "AXIOM_OPERATOR",
            TokenKind::DimensionTag => "DIMENSION_TAG",
            TokenKind::YggKeyword => "YGG_KEYWORD",
            TokenKind::QuantumFlow => "QUANTUM_FLOW",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

pub static KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "YGG_MODULE",
    "YGG_FUNCTION",
    "IMPORT",
    "CONSTANT",
    "VAR",
    "IF",
    "ELSE",
    "FOR",
    "WHILE",
    "RETURN",
    "APPLY",
    "CALCULATE",
    "VALIDATE_AXIOMATICALLY",
    "INITIATE_Q_QUBIT_OPERATION",
    "MONITOR_YGGDRASIL_NETWORK_FLOW",
    "TRIGGER",
    "READ",
    "WRITE",
    "END_IF",
    "END_FOR",
    "END_WHILE",
    "END_YGG_CODE_BLOCK",
    "END_YGG_MODULE",
    "ASYNC",
    "RETURNS",
    "IS",
};

/// Operators spelled as words. Words that are also keywords (`FOR`, `ELSE`,
/// `END_IF`, ...) are lexed as keywords and therefore left out.
pub static WORD_OPERATORS: phf::Set<&'static str> = phf::phf_set! {
    "AS",
    "VIA",
    "USING",
    "FROM",
    "TO",
    "THEN",
};

pub static AXIOM_OPERATORS: phf::Set<&'static str> = phf::phf_set! {
    "AX_FUSION_PATTERN",
    "AX_LINEAR_OPTIMIZATION",
    "AX_SUB_LINEAR_NEUTRALIZATION",
    "PZQQET_AXIOM",
};

pub static BOOLEANS: phf::Set<&'static str> = phf::phf_set! {
    "TRUE",
    "FALSE",
    "true",
    "false",
};

pub const PUNCTUATION: &[char] = &['(', ')', '{', '}', '[', ']', ',', ';', '.', ':'];

/// Checks for the dimension tags `42`, `420`, `0` and `E` (case-insensitive).
pub fn is_dimension_tag(value: &str) -> bool {
    matches!(value, "42" | "420" | "0") || value.eq_ignore_ascii_case("e")
}
