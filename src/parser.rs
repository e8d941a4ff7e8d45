use crate::{
    ast::{Node, NodeKind},
    observer::Observer,
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = ()> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T, Spanned<Error>>;

/// Keywords that close a statement list. The enclosing rule decides which
/// one it actually accepts.
const BLOCK_END: &[&str] = &[
    "ELSE",
    "END_IF",
    "END_FOR",
    "END_WHILE",
    "END_YGG_CODE_BLOCK",
    "END_YGG_MODULE",
    "YGG_MODULE",
    "YGG_FUNCTION",
    "ASYNC",
];

const DIRECTIVES: &[&str] = &[
    "APPLY",
    "CALCULATE",
    "VALIDATE_AXIOMATICALLY",
    "INITIATE_Q_QUBIT_OPERATION",
    "MONITOR_YGGDRASIL_NETWORK_FLOW",
    "TRIGGER",
    "READ",
    "WRITE",
];

const QUALIFIERS: &[&str] = &["TO", "VIA", "USING", "FROM"];

/// Maximum number of nested blocks and expressions.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses a whole program.
pub fn parse(tokens: &[Token]) -> ParseResult<Node> {
    Parser::new(tokens).parse()
}

/// Parses a single expression, which must span the whole token sequence.
pub fn parse_expr(tokens: &[Token]) -> ParseResult<Node> {
    Parser::new(tokens).parse_expression()
}

pub struct Parser<'tok, 'obs> {
    tokens: &'tok [Token],
    /// Returned once the cursor runs past the end of `tokens`.
    eof: Token,
    cursor: usize,
    /// Span of the last consumed token.
    last_span: Span,
    errors: Vec<Spanned<Error>>,
    /// Current number of nested blocks and expressions.
    depth: usize,
    observer: Option<&'obs mut dyn Observer>,
}

impl<'tok, 'obs> Parser<'tok, 'obs> {
    /// If `tokens` doesn't end with [`TokenKind::Eof`], one is synthesized
    /// right after the last token. Its column is `column + len` of that
    /// token, so it is only exact when the last token is a single-line ASCII
    /// token.
    pub fn new(tokens: &'tok [Token]) -> Parser<'tok, 'obs> {
        let eof = match tokens.last() {
            Some(last) if last.is_eof() => last.clone(),
            Some(last) => Token::eof_after(last.span()),
            None => Token::eof_after(Span::new_of_bounds(0..0, 1, 1)),
        };
        Parser {
            tokens,
            last_span: eof.span().start_point(),
            eof,
            cursor: 0,
            errors: Vec::with_capacity(8),
            depth: 0,
            observer: None,
        }
    }

    /// Constructs a parser which reports every completed node to `observer`.
    pub fn with_observer(tokens: &'tok [Token], observer: &'obs mut dyn Observer) -> Parser<'tok, 'obs> {
        let mut parser = Parser::new(tokens);
        parser.observer = Some(observer);
        parser
    }
}

impl Parser<'_, '_> {
    /// Parses the token sequence into a tree rooted at a
    /// [`NodeKind::Program`] node. Stops at the first error.
    pub fn parse(mut self) -> ParseResult<Node> {
        let result = self.parse_program();
        self.finish_with(result)
    }

    pub fn parse_expression(mut self) -> ParseResult<Node> {
        let result = self.parse_expr().and_then(|expr| {
            self.consume(TokenKind::Eof, None)?;
            Ok(expr)
        });
        self.finish_with(result)
    }

    /// Turns the error sentinel into the first recorded error.
    fn finish_with(self, result: Result<Node>) -> ParseResult<Node> {
        let mut errors = self.errors.into_iter();
        match (result, errors.next()) {
            (Ok(node), None) => {
                log::debug!("parsing completed with root {}", node.kind);
                Ok(node)
            }
            (_, Some(error)) => Err(error),
            (Err(()), None) => unreachable!("error sentinel without a recorded error"),
        }
    }

    fn parse_program(&mut self) -> Result<Node> {
        let start = self.peek().span();
        let mut program = Node::new(NodeKind::Program, start);
        loop {
            let c = self.peek();
            if c.is_keyword("YGG_MODULE") {
                let module = self.parse_module()?;
                program.add_child(module);
            } else if c.is_keyword("YGG_FUNCTION") || c.is_keyword("ASYNC") {
                let function = self.parse_function()?;
                program.add_child(function);
            } else if c.is_eof() {
                break;
            } else {
                let span = c.span();
                let error = Error::UnexpectedToken {
                    value: c.value.clone(),
                };
                self.error(span.wrap(error));
                return Err(());
            }
        }
        let eof = self.consume(TokenKind::Eof, None)?;
        program.span = start.to(eof.span());
        Ok(self.finish(program))
    }

    fn parse_module(&mut self) -> Result<Node> {
        let start = self.consume_keyword("YGG_MODULE")?;
        let name = self.consume(TokenKind::Identifier, None)?;
        log::trace!("parsing module {}", name.value);

        let mut module = Node::with_value(NodeKind::Module, name.value.clone(), start.span());
        while !self.at_module_end() {
            if self.take_punct(";") {
                continue;
            }
            let item = if self.at_function() {
                self.parse_function()?
            } else {
                self.parse_statement()?
            };
            module.add_child(item);
        }

        if self.take_keyword("END_YGG_MODULE") && self.peek().kind == TokenKind::Identifier {
            let closing = self.advance();
            if closing.value != name.value {
                let span = closing.span();
                let error = Error::MismatchedEndName {
                    expected: name.value,
                    actual: closing.value,
                };
                self.error(span.wrap(error));
                return Err(());
            }
        }
        module.span = start.span().to(self.last_span);
        Ok(self.finish(module))
    }

    fn parse_function(&mut self) -> Result<Node> {
        let start = self.peek().span();
        let modifier = if self.is_keyword("ASYNC") {
            Some(leaf(NodeKind::Modifier, self.advance()))
        } else {
            None
        };
        self.consume_keyword("YGG_FUNCTION")?;
        let name = self.consume(TokenKind::Identifier, None)?;
        log::trace!("parsing function {}", name.value);

        let mut function = Node::with_value(NodeKind::Function, name.value, start);
        if let Some(modifier) = modifier {
            let modifier = self.finish(modifier);
            function.add_child(modifier);
        }
        if self.is_punct("(") {
            let params = self.parse_params()?;
            function.add_child(params);
        }
        if self.take_keyword("RETURNS") {
            let ty = self.parse_type()?;
            function.add_child(ty);
        }
        let body = self.parse_block()?;
        function.add_child(body);
        self.take_keyword("END_YGG_CODE_BLOCK");

        function.span = start.to(self.last_span);
        Ok(self.finish(function))
    }

    fn parse_params(&mut self) -> Result<Node> {
        let open = self.consume_punct("(")?;
        let params = self.parse_list(")", ",", Self::parse_param)?;
        let close = self.consume_punct(")")?;

        let mut node = Node::new(NodeKind::Params, open.span().to(close.span()));
        node.children = params;
        Ok(self.finish(node))
    }

    fn parse_param(&mut self) -> Result<Node> {
        let name = self.consume(TokenKind::Identifier, None)?;
        let mut param = leaf(NodeKind::Param, name);
        if self.take_punct(":") {
            let ty = self.parse_type()?;
            param.span = param.span.to(ty.span);
            param.add_child(ty);
        }
        Ok(self.finish(param))
    }

    fn parse_type(&mut self) -> Result<Node> {
        let ty = self.consume(TokenKind::Identifier, None)?;
        let node = leaf(NodeKind::Type, ty);
        Ok(self.finish(node))
    }

    /// Parses statements up to (but not including) the next block end.
    fn parse_block(&mut self) -> Result<Node> {
        self.nested(Self::parse_block_unguarded)
    }

    fn parse_block_unguarded(&mut self) -> Result<Node> {
        let mut block = Node::new(NodeKind::Block, self.peek().span().start_point());
        while !self.at_block_end() {
            if self.take_punct(";") {
                continue;
            }
            let statement = self.parse_statement()?;
            block.add_child(statement);
        }
        if let (Some(first), Some(last)) = (block.children.first(), block.children.last()) {
            block.span = first.span.to(last.span);
        } else {
            block.span = self.peek().span().start_point();
        }
        Ok(self.finish(block))
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let c = self.peek();
        let keyword = (c.kind == TokenKind::YggKeyword).then(|| c.value.clone());
        let statement = match keyword.as_deref() {
            Some("IMPORT") => self.parse_import()?,
            Some("CONSTANT") => self.parse_constant()?,
            Some("VAR") => self.parse_var()?,
            Some("IF") => self.parse_if()?,
            Some("WHILE") => self.parse_while()?,
            Some("FOR") => self.parse_for()?,
            Some("RETURN") => self.parse_return()?,
            Some(keyword) if DIRECTIVES.contains(&keyword) => self.parse_directive()?,
            _ => self.parse_expr()?,
        };
        self.take_punct(";");
        Ok(statement)
    }

    fn parse_import(&mut self) -> Result<Node> {
        let start = self.consume_keyword("IMPORT")?;
        let mut path = self.consume(TokenKind::Identifier, None)?.value;
        while self.take_punct(".") {
            let segment = self.consume(TokenKind::Identifier, None)?;
            path.push('.');
            path.push_str(&segment.value);
        }

        let mut import = Node::with_value(NodeKind::Import, path, start.span());
        if self.take(TokenKind::Operator, "AS") {
            let alias = self.consume(TokenKind::Identifier, None)?;
            let alias = self.finish(leaf(NodeKind::Alias, alias));
            import.add_child(alias);
        }
        import.span = start.span().to(self.last_span);
        Ok(self.finish(import))
    }

    fn parse_constant(&mut self) -> Result<Node> {
        let start = self.consume_keyword("CONSTANT")?;
        let name = self.consume(TokenKind::Identifier, None)?;
        self.consume(TokenKind::Operator, Some("="))?;
        let value = self.parse_expr()?;

        let mut constant = Node::with_value(NodeKind::Constant, name.value, start.span());
        constant.span = start.span().to(value.span);
        constant.add_child(value);
        Ok(self.finish(constant))
    }

    fn parse_var(&mut self) -> Result<Node> {
        let start = self.consume_keyword("VAR")?;
        let name = self.consume(TokenKind::Identifier, None)?;

        let span = start.span().to(name.span());
        let mut var = Node::with_value(NodeKind::Var, name.value, span);
        if self.take(TokenKind::Operator, "=") {
            let value = self.parse_expr()?;
            var.span = var.span.to(value.span);
            var.add_child(value);
        }
        Ok(self.finish(var))
    }

    // IF expr [THEN] stmt* [ELSE stmt*] END_IF
    fn parse_if(&mut self) -> Result<Node> {
        let start = self.consume_keyword("IF")?;
        let predicate = self.parse_expr()?;
        self.take(TokenKind::Operator, "THEN");
        let then_arm = self.parse_block()?;

        let mut node = Node::new(NodeKind::If, start.span());
        node.add_child(predicate);
        node.add_child(then_arm);
        if self.take_keyword("ELSE") {
            let else_arm = self.parse_block()?;
            node.add_child(else_arm);
        }
        let end = self.consume_keyword("END_IF")?;
        node.span = start.span().to(end.span());
        Ok(self.finish(node))
    }

    // WHILE expr stmt* END_WHILE
    fn parse_while(&mut self) -> Result<Node> {
        let start = self.consume_keyword("WHILE")?;
        let predicate = self.parse_expr()?;
        let body = self.parse_block()?;
        let end = self.consume_keyword("END_WHILE")?;

        let mut node = Node::new(NodeKind::While, start.span().to(end.span()));
        node.add_child(predicate);
        node.add_child(body);
        Ok(self.finish(node))
    }

    // FOR ID FROM expr TO expr stmt* END_FOR
    fn parse_for(&mut self) -> Result<Node> {
        let start = self.consume_keyword("FOR")?;
        let variable = self.consume(TokenKind::Identifier, None)?;
        self.consume(TokenKind::Operator, Some("FROM"))?;
        let from = self.parse_expr()?;
        self.consume(TokenKind::Operator, Some("TO"))?;
        let to = self.parse_expr()?;
        let body = self.parse_block()?;
        let end = self.consume_keyword("END_FOR")?;

        let span = start.span().to(end.span());
        let mut node = Node::with_value(NodeKind::For, variable.value, span);
        node.add_child(from);
        node.add_child(to);
        node.add_child(body);
        Ok(self.finish(node))
    }

    fn parse_return(&mut self) -> Result<Node> {
        let start = self.consume_keyword("RETURN")?;
        let mut node = Node::new(NodeKind::Return, start.span());
        if !self.at_block_end() && !self.is_punct(";") {
            let value = self.parse_expr()?;
            node.span = node.span.to(value.span);
            node.add_child(value);
        }
        Ok(self.finish(node))
    }

    fn parse_directive(&mut self) -> Result<Node> {
        let keyword = self.advance();
        let target = self.parse_expr()?;

        let start = keyword.span();
        let mut node = leaf(NodeKind::Directive, keyword);
        node.add_child(target);

        let c = self.peek();
        if c.kind == TokenKind::Operator && QUALIFIERS.contains(&c.value.as_str()) {
            let qualifier = self.advance();
            let operand = self.parse_expr()?;
            let span = qualifier.span().to(operand.span);
            let mut qualifier = Node::with_value(NodeKind::Qualifier, qualifier.value, span);
            qualifier.add_child(operand);
            let qualifier = self.finish(qualifier);
            node.add_child(qualifier);
        }
        node.span = start.to(self.last_span);
        Ok(self.finish(node))
    }

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Node> {
        self.nested(|this| this.parse_expr_bp_unguarded(min_bp))
    }

    fn parse_expr_bp_unguarded(&mut self, min_bp: u8) -> Result<Node> {
        let lhs_token = self.advance();
        let mut lhs = self.parse_nud(lhs_token)?;

        loop {
            let Some((lbp, rbp)) = Self::infix_binding_power(self.peek()) else {
                // Not an infix operator
                break;
            };
            if lbp < min_bp {
                // Operator binds less tightly than the minimum required
                break;
            }
            let op_token = self.advance();
            lhs = self.parse_led(op_token, lhs, rbp)?;
        }

        Ok(lhs)
    }

    /// nud: Parses tokens that start an expression
    /// (prefix operators, literals, grouping)
    fn parse_nud(&mut self, token: Token) -> Result<Node> {
        let node = match (token.kind, token.value.as_str()) {
            (TokenKind::Identifier, _) => leaf(NodeKind::Identifier, token),
            (TokenKind::Number, _) => leaf(NodeKind::Number, token),
            (TokenKind::String, _) => leaf(NodeKind::String, token),
            (TokenKind::Boolean, _) => leaf(NodeKind::Boolean, token),
            (TokenKind::DimensionTag, _) => leaf(NodeKind::DimensionTag, token),
            (TokenKind::AxiomOperator, _) => leaf(NodeKind::AxiomOperator, token),

            // Grouping: ( expr )
            (TokenKind::Punctuation, "(") => {
                let expr = self.parse_expr()?;
                let end = self.consume_punct(")")?;
                let mut paren = Node::new(NodeKind::Paren, token.span().to(end.span()));
                paren.add_child(expr);
                paren
            }

            // Array: [ expr, ... ]
            (TokenKind::Punctuation, "[") => {
                let items = self.parse_list("]", ",", Self::parse_expr)?;
                let end = self.consume_punct("]")?;
                let mut array = Node::new(NodeKind::Array, token.span().to(end.span()));
                array.children = items;
                array
            }

            // Prefix operators: !, -
            (TokenKind::Operator, "!" | "-") => {
                let expr = self.parse_expr_bp(Self::PREFIX_BINDING_POWER)?;
                let span = token.span().to(expr.span);
                let mut unary = Node::with_value(NodeKind::Unary, token.value, span);
                unary.add_child(expr);
                unary
            }

            _ => {
                let span = token.span();
                let error = Error::UnexpectedTokenInExpr {
                    kind: token.kind,
                    value: token.value,
                };
                self.error(span.wrap(error));
                return Err(());
            }
        };
        Ok(self.finish(node))
    }

    /// led: Parses tokens that follow a left-hand-side expression
    /// (infix/postfix operators)
    fn parse_led(&mut self, op_token: Token, lhs: Node, rbp: u8) -> Result<Node> {
        let node = match (op_token.kind, op_token.value.as_str()) {
            // Assignment: target = expr
            (TokenKind::Operator, "=") => {
                if !lhs.kind.is_assignable() {
                    self.error(lhs.span.wrap(Error::InvalidAssignmentTarget));
                    return Err(());
                }
                let value = self.parse_expr_bp(rbp)?;
                Self::binary(NodeKind::Assign, None, lhs, value)
            }

            // Cast: expr AS TYPE
            (TokenKind::Operator, "AS") => {
                let ty = self.consume(TokenKind::Identifier, None)?;
                let mut cast = leaf(NodeKind::Cast, ty);
                cast.span = lhs.span.to(cast.span);
                cast.add_child(lhs);
                cast
            }

            (TokenKind::Operator, _) => {
                let rhs = self.parse_expr_bp(rbp)?;
                Self::binary(NodeKind::Binary, Some(op_token.value), lhs, rhs)
            }

            // Flow: expr ~> expr
            (TokenKind::QuantumFlow, _) => {
                let rhs = self.parse_expr_bp(rbp)?;
                Self::binary(NodeKind::Flow, Some(op_token.value), lhs, rhs)
            }

            // Member access: expr . ID
            (TokenKind::Punctuation, ".") => {
                let name = self.consume(TokenKind::Identifier, None)?;
                let span = lhs.span.to(name.span());
                let mut member = Node::with_value(NodeKind::Member, name.value, span);
                member.add_child(lhs);
                member
            }

            // Call: expr ( [expr [, expr]*] )
            (TokenKind::Punctuation, "(") => {
                let args = self.parse_list(")", ",", Self::parse_expr)?;
                let end = self.consume_punct(")")?;
                let mut call = Node::new(NodeKind::Call, lhs.span.to(end.span()));
                call.add_child(lhs);
                call.children.extend(args);
                call
            }

            // Index: expr [ expr ]
            (TokenKind::Punctuation, "[") => {
                let index = self.parse_expr()?;
                let end = self.consume_punct("]")?;
                let mut node = Node::new(NodeKind::Index, lhs.span.to(end.span()));
                node.add_child(lhs);
                node.add_child(index);
                node
            }

            _ => unreachable!("{op_token:?} has no infix binding power"),
        };
        Ok(self.finish(node))
    }

    fn binary(kind: NodeKind, value: Option<String>, lhs: Node, rhs: Node) -> Node {
        let mut node = Node::new(kind, lhs.span.to(rhs.span));
        node.value = value;
        node.add_child(lhs);
        node.add_child(rhs);
        node
    }

    /// Parses `item (separator item)*` until `end_delim` is found. Does
    /// **NOT** consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: &'static str,
        separator: &'static str,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while !self.is_punct(end_delim) && !self.peek().is_eof() {
            items.push(parse_item(self)?);
            // Without a separator the list must end here; the caller reports
            // anything else when consuming the end delimiter.
            if !self.take_punct(separator) {
                break;
            }
        }
        Ok(items)
    }

    const PREFIX_BINDING_POWER: u8 = 19;

    fn infix_binding_power(token: &Token) -> Option<(u8, u8)> {
        let bp = match (token.kind, token.value.as_str()) {
            // Assignment (right-associative)
            (TokenKind::Operator, "=") => (2, 1),

            // Flow (left-associative)
            (TokenKind::QuantumFlow, _) => (3, 4),

            // Logical
            (TokenKind::Operator, "||") => (5, 6),
            (TokenKind::Operator, "&&") => (7, 8),

            // Comparisons
            (TokenKind::Operator, "==" | "!=") => (9, 10),
            (TokenKind::Operator, "<" | ">" | "<=" | ">=") => (11, 12),

            // Arithmetic
            (TokenKind::Operator, "+" | "-") => (13, 14),
            (TokenKind::Operator, "*" | "/") => (15, 16),

            // Cast
            (TokenKind::Operator, "AS") => (17, 18),

            // Member access, call and index
            (TokenKind::Punctuation, "." | "(" | "[") => (21, 22),

            _ => return None,
        };
        Some(bp)
    }
}

impl Parser<'_, '_> {
    /// Records an error. Callers return the `Err(())` sentinel right after.
    fn error(&mut self, error: Spanned<Error>) {
        self.errors.push(error);
    }

    /// Runs `f` one nesting level deeper, failing past
    /// [`MAX_NESTING_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            let span = self.peek().span();
            self.error(span.wrap(Error::NestingTooDeep));
            return Err(());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Reports a completed node to the observer, if any.
    fn finish(&mut self, node: Node) -> Node {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.node(&node);
        }
        node
    }

    /// Returns the current token.
    fn peek(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.eof)
    }

    /// Returns the current token and advances. Never moves past the end.
    fn advance(&mut self) -> Token {
        let c = self.peek().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        self.last_span = c.span();
        c
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn is_punct(&self, punct: &str) -> bool {
        self.peek().is(TokenKind::Punctuation, punct)
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, kind: TokenKind, value: &str) -> bool {
        if self.peek().is(kind, value) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn take_keyword(&mut self, keyword: &str) -> bool {
        self.take(TokenKind::YggKeyword, keyword)
    }

    fn take_punct(&mut self, punct: &str) -> bool {
        self.take(TokenKind::Punctuation, punct)
    }

    /// Advances if the current token has the expected kind (and value, if
    /// provided). If not, records an error.
    fn consume(&mut self, kind: TokenKind, value: Option<&'static str>) -> Result<Token> {
        let c = self.peek();
        if c.kind == kind && value.map_or(true, |value| c.value == value) {
            return Ok(self.advance());
        }
        let span = c.span();
        let error = Error::Unexpected {
            expected: kind,
            expected_value: value,
            actual: c.kind,
            actual_value: c.value.clone(),
        };
        self.error(span.wrap(error));
        Err(())
    }

    fn consume_keyword(&mut self, keyword: &'static str) -> Result<Token> {
        self.consume(TokenKind::YggKeyword, Some(keyword))
    }

    fn consume_punct(&mut self, punct: &'static str) -> Result<Token> {
        self.consume(TokenKind::Punctuation, Some(punct))
    }

    fn at_function(&self) -> bool {
        self.is_keyword("YGG_FUNCTION") || self.is_keyword("ASYNC")
    }

    fn at_module_end(&self) -> bool {
        let c = self.peek();
        c.is_eof() || c.is_keyword("YGG_MODULE") || c.is_keyword("END_YGG_MODULE")
    }

    fn at_block_end(&self) -> bool {
        let c = self.peek();
        c.is_eof() || (c.kind == TokenKind::YggKeyword && BLOCK_END.contains(&c.value.as_str()))
    }
}

/// A leaf node carrying the token's value and span.
fn leaf(kind: NodeKind, token: Token) -> Node {
    let span = token.span();
    Node::with_value(kind, token.value, span)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        expected: TokenKind,
        expected_value: Option<&'static str>,
        actual: TokenKind,
        actual_value: String,
    },
    /// A token which can't start a top-level declaration.
    UnexpectedToken {
        value: String,
    },
    UnexpectedTokenInExpr {
        kind: TokenKind,
        value: String,
    },
    InvalidAssignmentTarget,
    /// `END_YGG_MODULE` followed by a name other than the module's.
    MismatchedEndName {
        expected: String,
        actual: String,
    },
    /// More than [`MAX_NESTING_DEPTH`] nested blocks or expressions.
    NestingTooDeep,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lexer::tokenize,
        observer::test_utils::Recorder,
        util::test_utils::tree_tests,
    };

    tree_tests!(
        use parser;

        fn test_module_declaration() {
            let program = "YGG_MODULE MyModule";
            let tree_ok = "
                Program (0..19)
                  Module MyModule (0..19)
            ";
        }

        fn test_module_with_terminator() {
            let program = "YGG_MODULE M END_YGG_MODULE M";
            let tree_ok = "
                Program (0..29)
                  Module M (0..29)
            ";
        }

        fn test_module_terminator_without_name() {
            let program = "YGG_MODULE A END_YGG_MODULE YGG_MODULE B";
            let tree_ok = "
                Program (0..40)
                  Module A (0..27)
                  Module B (28..40)
            ";
        }

        fn test_function_declaration() {
            let program = "YGG_FUNCTION main";
            let tree_ok = "
                Program (0..17)
                  Function main (0..17)
                    Block (17..17)
            ";
        }

        fn test_async_function() {
            let program = "ASYNC YGG_FUNCTION tick";
            let tree_ok = "
                Program (0..23)
                  Function tick (0..23)
                    Modifier ASYNC (0..5)
                    Block (23..23)
            ";
        }

        fn test_function_params_returns() {
            let program = "YGG_FUNCTION calc(input: Number, scale) RETURNS Result RETURN input * scale END_YGG_CODE_BLOCK";
            let tree_ok = "
                Program (0..94)
                  Function calc (0..94)
                    Params (17..39)
                      Param input (18..31)
                        Type Number (25..31)
                      Param scale (33..38)
                    Type Result (48..54)
                    Block (55..75)
                      Return (55..75)
                        Binary * (62..75)
                          Identifier input (62..67)
                          Identifier scale (70..75)
            ";
        }

        fn test_module_items() {
            let program = "YGG_MODULE Net IMPORT core.net AS n; CONSTANT LIMIT = 420; VAR count = 0.5 END_YGG_MODULE";
            let tree_ok = "
                Program (0..89)
                  Module Net (0..89)
                    Import core.net (15..35)
                      Alias n (34..35)
                    Constant LIMIT (37..57)
                      DimensionTag 420 (54..57)
                    Var count (59..74)
                      Number 0.5 (71..74)
            ";
        }

        fn test_if_else() {
            let program = "YGG_FUNCTION f IF x >= 42 THEN RETURN E ELSE y = -1 END_IF";
            let tree_ok = "
                Program (0..58)
                  Function f (0..58)
                    Block (15..58)
                      If (15..58)
                        Binary >= (18..25)
                          Identifier x (18..19)
                          DimensionTag 42 (23..25)
                        Block (31..39)
                          Return (31..39)
                            DimensionTag E (38..39)
                        Block (45..51)
                          Assign (45..51)
                            Identifier y (45..46)
                            Unary - (49..51)
                              Number 1 (50..51)
            ";
        }

        fn test_while_and_for() {
            let program = "YGG_FUNCTION loop WHILE running CALCULATE step(1, 2) END_WHILE FOR i FROM 0 TO n WRITE i END_FOR END_YGG_CODE_BLOCK";
            let tree_ok = "
                Program (0..115)
                  Function loop (0..115)
                    Block (18..96)
                      While (18..62)
                        Identifier running (24..31)
                        Block (32..52)
                          Directive CALCULATE (32..52)
                            Call (42..52)
                              Identifier step (42..46)
                              Number 1 (47..48)
                              Number 2 (50..51)
                      For i (63..96)
                        DimensionTag 0 (74..75)
                        Identifier n (79..80)
                        Block (81..88)
                          Directive WRITE (81..88)
                            Identifier i (87..88)
            ";
        }

        fn test_directives() {
            let program = "YGG_FUNCTION deploy TRIGGER PRAI_ESSENCE.deploy_model(\"EthicalModel\") APPLY AX_FUSION_PATTERN TO data";
            let tree_ok = r#"
                Program (0..101)
                  Function deploy (0..101)
                    Block (20..101)
                      Directive TRIGGER (20..69)
                        Call (28..69)
                          Member deploy_model (28..53)
                            Identifier PRAI_ESSENCE (28..40)
                          String "EthicalModel" (54..68)
                      Directive APPLY (70..101)
                        AxiomOperator AX_FUSION_PATTERN (76..93)
                        Qualifier TO (94..101)
                          Identifier data (97..101)
            "#;
        }

        fn test_precedence_logical_arith() {
            let expr = "a + b * c == d || g && h";
            let tree_ok = "
                Binary || (0..24)
                  Binary == (0..14)
                    Binary + (0..9)
                      Identifier a (0..1)
                      Binary * (4..9)
                        Identifier b (4..5)
                        Identifier c (8..9)
                    Identifier d (13..14)
                  Binary && (18..24)
                    Identifier g (18..19)
                    Identifier h (23..24)
            ";
        }

        fn test_precedence_assign_flow() {
            let expr = "a = b = c ~> f";
            let tree_ok = "
                Assign (0..14)
                  Identifier a (0..1)
                  Assign (4..14)
                    Identifier b (4..5)
                    Flow ~> (8..14)
                      Identifier c (8..9)
                      Identifier f (13..14)
            ";
        }

        fn test_flow_is_left_associative() {
            let expr = "x ~> f ~> g";
            let tree_ok = "
                Flow ~> (0..11)
                  Flow ~> (0..6)
                    Identifier x (0..1)
                    Identifier f (5..6)
                  Identifier g (10..11)
            ";
        }

        fn test_unary_and_cast() {
            let expr = "!ready AS Boolean";
            let tree_ok = "
                Cast Boolean (0..17)
                  Unary ! (0..6)
                    Identifier ready (1..6)
            ";
        }

        fn test_array_index_paren() {
            let expr = "[1, 2][0] * (x - 1)";
            let tree_ok = "
                Binary * (0..19)
                  Index (0..9)
                    Array (0..6)
                      Number 1 (1..2)
                      Number 2 (4..5)
                    DimensionTag 0 (7..8)
                  Paren (12..19)
                    Binary - (13..18)
                      Identifier x (13..14)
                      Number 1 (17..18)
            ";
        }

        fn test_member_call_chain() {
            let expr = "a.b(c).d";
            let tree_ok = "
                Member d (0..8)
                  Call (0..6)
                    Member b (0..3)
                      Identifier a (0..1)
                    Identifier c (4..5)
            ";
        }

        fn test_string_literal() {
            let expr = "'hello world'";
            let tree_ok = r#"String "hello world" (0..13)"#;
        }

        fn test_boolean_literal() {
            let expr = "TRUE";
            let tree_ok = "Boolean TRUE (0..4)";
        }

        fn test_error_bare_number() {
            let program = "123";
            let expected_errors = &["1:1: unexpected token: 123"];
        }

        fn test_error_stops_at_first() {
            let program = "x 2";
            let expected_errors = &["1:1: unexpected token: x"];
        }

        fn test_error_module_missing_name() {
            let program = "YGG_MODULE";
            let expected_errors = &["1:11: expected IDENTIFIER, but got EOF ('')"];
        }

        fn test_error_module_name_is_tag() {
            let program = "YGG_MODULE 42";
            let expected_errors = &["1:12: expected IDENTIFIER, but got DIMENSION_TAG ('42')"];
        }

        fn test_error_missing_end_if() {
            let program = "YGG_FUNCTION f IF x THEN y";
            let expected_errors =
                &["1:27: expected YGG_KEYWORD with value 'END_IF', but got EOF ('')"];
        }

        fn test_error_mismatched_block_end() {
            let program = "YGG_FUNCTION f WHILE x END_IF";
            let expected_errors = &[
                "1:24: expected YGG_KEYWORD with value 'END_WHILE', but got YGG_KEYWORD ('END_IF')",
            ];
        }

        fn test_error_mismatched_module_name() {
            let program = "YGG_MODULE A END_YGG_MODULE B";
            let expected_errors = &["1:29: module A is closed as B"];
        }

        fn test_error_stray_block_end_in_module() {
            let program = "YGG_MODULE A END_IF";
            let expected_errors =
                &["1:14: unexpected token in expression: YGG_KEYWORD ('END_IF')"];
        }

        fn test_error_lexer() {
            let program = "YGG_MODULE `";
            let expected_errors = &["1:12: unexpected character '`'"];
        }

        fn test_error_incomplete_expr() {
            let expr = "1 +";
            let expected_errors = &["1:4: unexpected token in expression: EOF ('')"];
        }

        fn test_error_invalid_assignment_target() {
            let expr = "1 = 2";
            let expected_errors = &["1:1: invalid assignment target"];
        }

        fn test_error_missing_separator() {
            let expr = "f(a b)";
            let expected_errors =
                &["1:5: expected PUNCTUATION with value ')', but got IDENTIFIER ('b')"];
        }

        fn test_error_trailing_tokens_in_expr() {
            let expr = "a b";
            let expected_errors = &["1:3: expected EOF, but got IDENTIFIER ('b')"];
        }
    );

    #[test]
    fn parses_hand_built_tokens() {
        let tokens = [
            Token::new(TokenKind::YggKeyword, "YGG_MODULE", Span::new_of_bounds(0..10, 1, 1)),
            Token::new(TokenKind::Identifier, "TestModule", Span::new_of_bounds(11..21, 1, 12)),
            Token::new(TokenKind::Eof, "", Span::new_of_bounds(22..22, 1, 23)),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(program.kind, NodeKind::Program);
        assert_eq!(program.children.len(), 1);
        assert_eq!(program.children[0].kind, NodeKind::Module);
        assert_eq!(program.children[0].value(), Some("TestModule"));
    }

    #[test]
    fn reports_unexpected_top_level_token() {
        let tokens = [
            Token::new(TokenKind::Number, "123", Span::new_of_bounds(0..3, 1, 1)),
            Token::new(TokenKind::Eof, "", Span::new_of_bounds(4..4, 1, 5)),
        ];
        let error = parse(&tokens).unwrap_err();
        assert_eq!(
            error.inner,
            Error::UnexpectedToken {
                value: "123".to_string()
            }
        );
        assert_eq!((error.line(), error.column()), (1, 1));
        assert!(error.to_string().contains("unexpected token: 123"));
    }

    #[test]
    fn synthesizes_missing_eof() {
        let mut tokens = tokenize("YGG_MODULE M").unwrap();
        tokens.pop();
        let program = parse(&tokens).unwrap();
        assert_eq!(program.children[0].value(), Some("M"));

        let empty = parse(&[]).unwrap();
        assert!(empty.children.is_empty());
    }

    #[test]
    fn synthesized_eof_follows_last_token() {
        let mut tokens = tokenize("x = 1\nYGG_MODULE").unwrap();
        tokens.pop();
        let expr = parse_expr(&tokens[..3]).unwrap();
        assert_eq!(expr.kind, NodeKind::Assign);

        let error = parse(&tokens[3..]).unwrap_err();
        assert_eq!((error.line(), error.column()), (2, 11));
        assert_eq!(error.span.lo, 16);
    }

    #[test]
    fn observer_sees_nodes_bottom_up() {
        let tokens = tokenize("YGG_MODULE M VAR x = 1").unwrap();
        let mut recorder = Recorder::default();
        Parser::with_observer(&tokens, &mut recorder).parse().unwrap();
        assert_eq!(
            recorder.nodes,
            [
                NodeKind::Number,
                NodeKind::Var,
                NodeKind::Module,
                NodeKind::Program
            ]
        );
    }

    #[test]
    fn demo_programs_parse() {
        let tokens = tokenize(include_str!("../demos/hello_world.ygg")).unwrap();
        let program = parse(&tokens).unwrap();
        let modules: Vec<_> = program.children_of(NodeKind::Module).collect();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].value(), Some("HelloWorld"));

        let tokens = tokenize(include_str!("../demos/network_monitor.ygg")).unwrap();
        let program = parse(&tokens).unwrap();
        let mut functions = Vec::new();
        program.walk(&mut |node| {
            if node.kind == NodeKind::Function {
                functions.push(node.value().unwrap_or_default());
            }
        });
        assert_eq!(functions, ["monitor", "report", "main"]);
    }

    #[test]
    fn rejects_deeply_nested_expressions() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        let tokens = tokenize(&nested(100)).unwrap();
        let expr = parse_expr(&tokens).unwrap();
        assert_eq!(expr.kind, NodeKind::Paren);

        let src = format!("YGG_FUNCTION f x = {}", nested(10_000));
        let tokens = tokenize(&src).unwrap();
        let error = parse(&tokens).unwrap_err();
        assert_eq!(error.inner, Error::NestingTooDeep);
        assert_eq!(
            error.to_string(),
            format!("nesting exceeds {MAX_NESTING_DEPTH} levels")
        );

        let tokens = tokenize(&"-".repeat(10_000)).unwrap();
        assert_eq!(parse_expr(&tokens).unwrap_err().inner, Error::NestingTooDeep);
    }

    #[test]
    fn rejects_deeply_nested_blocks() {
        let src = format!(
            "YGG_FUNCTION f {} x {}",
            "IF x THEN ".repeat(1_000),
            "END_IF ".repeat(1_000)
        );
        let tokens = tokenize(&src).unwrap();
        assert_eq!(parse(&tokens).unwrap_err().inner, Error::NestingTooDeep);

        let src = format!(
            "YGG_FUNCTION f {} x {}",
            "WHILE x ".repeat(50),
            "END_WHILE ".repeat(50)
        );
        let tokens = tokenize(&src).unwrap();
        assert!(parse(&tokens).is_ok());
    }

    #[test]
    fn tree_serializes_to_json() {
        let tokens = tokenize("YGG_MODULE M").unwrap();
        let program = parse(&tokens).unwrap();
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["type"], "Program");
        assert_eq!(json["value"], serde_json::Value::Null);
        assert_eq!(json["children"][0]["type"], "Module");
        assert_eq!(json["children"][0]["value"], "M");
        assert_eq!(json["children"][0]["span"]["lo"], 0);
    }
}
