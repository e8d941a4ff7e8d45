use std::{
    iter::{FusedIterator, Peekable},
    str::Chars,
};

use crate::{
    observer::Observer,
    token::{
        is_dimension_tag, Span, Spanned, Token, TokenKind, AXIOM_OPERATORS, BOOLEANS, KEYWORDS,
        PUNCTUATION, WORD_OPERATORS,
    },
};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

pub type LexResult<T> = Result<T, Spanned<Error>>;

/// Tokenizes the provided string.
pub fn tokenize(src: &str) -> LexResult<Vec<Token>> {
    Lexer::new(src).tokenize()
}

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> LexResult<()> {
    assert_eq!(tokens.len(), 0, "must pass clean tokens buffer");
    for token in Lexer::new(src) {
        tokens.push(token?);
    }
    Ok(())
}

/// The Yggdrasil lexer.
///
/// A lexer is bound to a single source string and is consumed by
/// [`Lexer::tokenize`]. It may also be driven as an iterator, which yields
/// every token up to (and including) [`TokenKind::Eof`], or stops right
/// after the first error.
pub struct Lexer<'src, 'obs> {
    src: &'src str,
    iter: Peekable<Chars<'src>>,
    cursor: usize,
    line: u32,
    column: u32,
    current_lo: usize,
    current_line: u32,
    current_column: u32,
    observer: Option<&'obs mut dyn Observer>,
    finished: bool,
}

impl<'src, 'obs> Lexer<'src, 'obs> {
    /// Constructs a new lexer with the default state.
    pub fn new(src: &'src str) -> Lexer<'src, 'obs> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            line: 1,
            column: 1,
            current_lo: 0,
            current_line: 1,
            current_column: 1,
            observer: None,
            finished: false,
        }
    }

    /// Constructs a lexer which reports every produced token to `observer`.
    pub fn with_observer(src: &'src str, observer: &'obs mut dyn Observer) -> Lexer<'src, 'obs> {
        let mut lexer = Lexer::new(src);
        lexer.observer = Some(observer);
        lexer
    }
}

impl Lexer<'_, '_> {
    /// Scans the whole source. The returned sequence always ends with a
    /// single [`TokenKind::Eof`] token.
    pub fn tokenize(self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.src.len() / 4 + 1);
        for token in self {
            tokens.push(token?);
        }
        log::debug!("tokenization completed with {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Scans the next token, skipping whitespace and comments.
    fn scan(&mut self) -> LexResult<Token> {
        loop {
            let Some(c) = self.mark_advance() else {
                return Ok(self.produce_value(TokenKind::Eof, String::new()));
            };
            let kind = match c {
                c if c.is_whitespace() => continue,
                '/' if self.peek() == Some('/') => {
                    self.line_comment();
                    continue;
                }
                c if PUNCTUATION.contains(&c) => TokenKind::Punctuation,
                '=' | '!' | '<' | '>' => {
                    self.take('=');
                    self.operator()
                }
                '&' | '|' => {
                    if !self.take(c) {
                        return Err(self.span().wrap(Error::UnexpectedChar(c)));
                    }
                    self.operator()
                }
                '+' | '-' | '*' | '/' => self.operator(),
                '~' => {
                    if !self.take('>') {
                        return Err(self.span().wrap(Error::UnexpectedChar(c)));
                    }
                    TokenKind::QuantumFlow
                }
                c if c.is_ascii_digit() => self.number()?,
                c if c.is_ascii_alphabetic() || c == '_' || c == '#' => self.word(),
                quote @ ('"' | '\'') => return self.string(quote),
                c => return Err(self.span().wrap(Error::UnexpectedChar(c))),
            };
            return Ok(self.produce(kind));
        }
    }

    fn operator(&self) -> TokenKind {
        if AXIOM_OPERATORS.contains(self.substr()) {
            TokenKind::AxiomOperator
        } else {
            TokenKind::Operator
        }
    }

    /// Digits with at most one fractional part. The dot only belongs to the
    /// number if a digit follows it, so `1.foo` still lexes as three tokens.
    fn number(&mut self) -> LexResult<TokenKind> {
        self.digits();
        if self.at_fraction() {
            self.advance();
            self.digits();
            if self.at_fraction() {
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
                    self.advance();
                }
                return Err(self.span().wrap(Error::MalformedNumber));
            }
        }
        if is_dimension_tag(self.substr()) {
            Ok(TokenKind::DimensionTag)
        } else {
            Ok(TokenKind::Number)
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn at_fraction(&self) -> bool {
        let mut rest = self.src[self.cursor..].chars();
        rest.next() == Some('.') && rest.next().is_some_and(|c| c.is_ascii_digit())
    }

    fn word(&mut self) -> TokenKind {
        let valid_word_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '#';

        while self.peek().is_some_and(valid_word_suffix) {
            self.advance();
        }
        let substr = self.substr();
        if KEYWORDS.contains(substr) {
            TokenKind::YggKeyword
        } else if AXIOM_OPERATORS.contains(substr) {
            TokenKind::AxiomOperator
        } else if WORD_OPERATORS.contains(substr) {
            TokenKind::Operator
        } else if BOOLEANS.contains(substr) {
            TokenKind::Boolean
        } else if is_dimension_tag(substr) {
            TokenKind::DimensionTag
        } else {
            TokenKind::Identifier
        }
    }

    /// Lexes a string delimited by `quote`. Escapes are only resolved once
    /// the whole token has been scanned, and only if there were any.
    fn string(&mut self, quote: char) -> LexResult<Token> {
        let mut has_escaped = false;
        let mut is_escaping = false;
        loop {
            match (is_escaping, self.advance()) {
                (_, None) => return Err(self.span().wrap(Error::UnclosedString)),
                (false, Some(c)) if c == quote => break,
                (false, Some('\\')) => {
                    has_escaped = true;
                    is_escaping = true;
                }
                (_, Some(_)) => is_escaping = false,
            }
        }
        // Both quotes are one byte long.
        let raw = &self.src[self.current_lo + 1..self.cursor - 1];
        let value = if has_escaped {
            perform_escape(raw)
        } else {
            raw.to_string()
        };
        Ok(self.produce_value(TokenKind::String, value))
    }

    fn line_comment(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }
}

impl Lexer<'_, '_> {
    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> Option<char> {
        self.current_lo = self.cursor;
        self.current_line = self.line;
        self.current_column = self.column;
        self.advance()
    }

    /// Returns the next character and advances the iterator, keeping track
    /// of the line and column.
    fn advance(&mut self) -> Option<char> {
        let c = self.iter.next()?;
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Advances if the next character is `expected`.
    fn take(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(
            self.current_lo..self.cursor,
            self.current_line,
            self.current_column,
        )
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds as its value.
    fn produce(&self, kind: TokenKind) -> Token {
        self.produce_value(kind, self.substr().to_string())
    }

    fn produce_value(&self, kind: TokenKind, value: String) -> Token {
        Token::new(kind, value, self.span())
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let scanned = self.scan();
        match &scanned {
            Ok(token) => {
                self.finished = token.is_eof();
                if let Some(observer) = self.observer.as_deref_mut() {
                    observer.token(token);
                }
            }
            Err(_) => self.finished = true,
        }
        Some(scanned)
    }
}

impl FusedIterator for Lexer<'_, '_> {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedChar(char),
    UnclosedString,
    /// A number with more than one decimal point, such as `1.2.3`.
    MalformedNumber,
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, 'r') => '\r',
            (true, '0') => '\0',
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf.shrink_to_fit();
    // This function is only called if the string token contains at least one
    // escape sequence
    debug_assert!(buf.len() < raw.len(), "original string MUST be greater");
    buf
}
