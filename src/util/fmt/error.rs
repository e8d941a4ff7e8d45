use std::fmt;

use crate::{lexer, parser, token::Spanned, CompileError};

/// The alternate form (`{:#}`) prefixes the message with `line:column: `.
impl<E: fmt::Display> fmt::Display for Spanned<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}:{}: ", self.span.line, self.span.column)?;
        }
        write!(f, "{}", self.inner)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Spanned<E> {}

impl fmt::Display for lexer::Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use lexer::Error::*;
        match self {
            UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            UnclosedString => write!(f, "unclosed string"),
            MalformedNumber => write!(f, "malformed number literal"),
        }
    }
}

impl fmt::Display for parser::Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use parser::Error::*;
        match self {
            Unexpected {
                expected,
                expected_value,
                actual,
                actual_value,
            } => {
                write!(f, "expected {expected}")?;
                if let Some(value) = expected_value {
                    write!(f, " with value '{value}'")?;
                }
                write!(f, ", but got {actual} ('{actual_value}')")
            }
            UnexpectedToken { value } => write!(f, "unexpected token: {value}"),
            UnexpectedTokenInExpr { kind, value } => {
                write!(f, "unexpected token in expression: {kind} ('{value}')")
            }
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            MismatchedEndName { expected, actual } => {
                write!(f, "module {expected} is closed as {actual}")
            }
            NestingTooDeep => write!(f, "nesting exceeds {} levels", parser::MAX_NESTING_DEPTH),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.alternate()) {
            (CompileError::Lex(e), false) => write!(f, "{e}"),
            (CompileError::Lex(e), true) => write!(f, "{e:#}"),
            (CompileError::Parse(e), false) => write!(f, "{e}"),
            (CompileError::Parse(e), true) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Lex(e) => Some(e),
            CompileError::Parse(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{compile, lexer, token::Span};

    #[test]
    fn alternate_form_prefixes_position() {
        let error = Span::new_of_bounds(4..5, 1, 5).wrap(lexer::Error::UnexpectedChar('`'));
        assert_eq!(error.to_string(), "unexpected character '`'");
        assert_eq!(format!("{error:#}"), "1:5: unexpected character '`'");
    }

    #[test]
    fn compile_error_keeps_position() {
        let error = compile("YGG_MODULE\n  123").unwrap_err();
        assert_eq!(
            format!("{error:#}"),
            "2:3: expected IDENTIFIER, but got NUMBER ('123')"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
