// program   ::= (module | function)* EOF
// module    ::= YGG_MODULE ID item* [END_YGG_MODULE [ID]]
// item      ::= function | stmt
// function  ::= [ASYNC] YGG_FUNCTION ID ['(' [param (',' param)*] ')'] [RETURNS ID]
//               stmt* [END_YGG_CODE_BLOCK]
// param     ::= ID [':' ID]
// stmt      ::= (import | constant | var | if | while | for | return
//               | directive | expr) [';']
// import    ::= IMPORT ID ('.' ID)* [AS ID]
// constant  ::= CONSTANT ID '=' expr
// var       ::= VAR ID ['=' expr]
// if        ::= IF expr [THEN] stmt* [ELSE stmt*] END_IF
// while     ::= WHILE expr stmt* END_WHILE
// for       ::= FOR ID FROM expr TO expr stmt* END_FOR
// return    ::= RETURN [expr]
// directive ::= (APPLY | CALCULATE | VALIDATE_AXIOMATICALLY | TRIGGER | READ | WRITE
//               | INITIATE_Q_QUBIT_OPERATION | MONITOR_YGGDRASIL_NETWORK_FLOW)
//               expr [(TO | VIA | USING | FROM) expr]
// expr      ::= expr '=' expr
//             | expr '~>' expr
//             | expr ('||' | '&&' | '==' | '!=' | '<' | '>' | '<=' | '>=') expr
//             | expr ('+' | '-' | '*' | '/') expr
//             | expr AS ID
//             | ('!' | '-') expr
//             | expr '.' ID
//             | expr '(' [expr (',' expr)*] ')'
//             | expr '[' expr ']'
//             | '(' expr ')'
//             | '[' [expr (',' expr)*] ']'
//             | ID | NUMBER | STRING | BOOLEAN | DIMENSION_TAG | AXIOM_OPERATOR

// Precedence
//
// . () []
// ! - (prefix)
// AS
// * /
// + -
// < > <= >=
// == !=
// &&
// ||
// ~>
// =

use std::fmt;

use serde::Serialize;

use crate::token::Span;

/// A node of the syntax tree.
///
/// Every node owns its children; there are no shared or back references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub value: Option<String>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Node {
        Node {
            kind,
            value: None,
            children: Vec::new(),
            span,
        }
    }

    pub fn with_value(kind: NodeKind, value: impl Into<String>, span: Span) -> Node {
        Node {
            value: Some(value.into()),
            ..Node::new(kind, span)
        }
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Children of the given kind, in source order.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    /// Visits the node and all of its descendants in pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Program,
    Module,
    Function,
    /// `ASYNC` marker on a function.
    Modifier,
    Params,
    Param,
    /// Type annotation of a parameter, or the `RETURNS` clause of a function.
    Type,
    Block,
    Import,
    Alias,
    Constant,
    Var,
    If,
    While,
    For,
    Return,
    Directive,
    /// Trailing `TO`/`VIA`/`USING`/`FROM` clause of a directive.
    Qualifier,
    Assign,
    Flow,
    Binary,
    Unary,
    Cast,
    Member,
    Call,
    Index,
    Paren,
    Array,
    Identifier,
    Number,
    String,
    Boolean,
    DimensionTag,
    AxiomOperator,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Program => "Program",
            NodeKind::Module => "Module",
            NodeKind::Function => "Function",
            NodeKind::Modifier => "Modifier",
            NodeKind::Params => "Params",
            NodeKind::Param => "Param",
            NodeKind::Type => "Type",
            NodeKind::Block => "Block",
            NodeKind::Import => "Import",
            NodeKind::Alias => "Alias",
            NodeKind::Constant => "Constant",
            NodeKind::Var => "Var",
            NodeKind::If => "If",
            NodeKind::While => "While",
            NodeKind::For => "For",
            NodeKind::Return => "Return",
            NodeKind::Directive => "Directive",
            NodeKind::Qualifier => "Qualifier",
            NodeKind::Assign => "Assign",
            NodeKind::Flow => "Flow",
            NodeKind::Binary => "Binary",
            NodeKind::Unary => "Unary",
            NodeKind::Cast => "Cast",
            NodeKind::Member => "Member",
            NodeKind::Call => "Call",
            NodeKind::Index => "Index",
            NodeKind::Paren => "Paren",
            NodeKind::Array => "Array",
            NodeKind::Identifier => "Identifier",
            NodeKind::Number => "Number",
            NodeKind::String => "String",
            NodeKind::Boolean => "Boolean",
            NodeKind::DimensionTag => "DimensionTag",
            NodeKind::AxiomOperator => "AxiomOperator",
        }
    }

    /// Whether a node of this kind may appear on the left of `=`.
    pub fn is_assignable(self) -> bool {
        matches!(self, NodeKind::Identifier | NodeKind::Member | NodeKind::Index)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
