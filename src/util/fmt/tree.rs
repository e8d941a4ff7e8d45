use std::io::Write;

use crate::{
    ast::{Node, NodeKind},
    token::{Token, TokenKind},
};

const INDENT_WIDTH: usize = 2;

pub fn print_node_string(node: &Node) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_node(&mut buf, 0, node).unwrap();
    String::from_utf8(buf).unwrap()
}

/// Prints one node per line as `Kind [value] (lo..hi)`, children indented
/// below their parent.
pub fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "{}", node.kind)?;
    match (node.kind, node.value()) {
        (NodeKind::String, Some(value)) => write!(w, " {value:?}")?,
        (_, Some(value)) => write!(w, " {value}")?,
        (_, None) => {}
    }
    writeln!(w, " ({})", node.span)?;
    for child in &node.children {
        print_node(w, i + 1, child)?;
    }
    Ok(())
}

/// Prints one token per line as `line:column KIND value`.
pub fn print_tokens(w: &mut impl Write, tokens: &[Token]) -> std::io::Result<()> {
    for token in tokens {
        let position = format!("{}:{}", token.line(), token.column());
        write!(w, "{position:<8}{:<16}", token.kind)?;
        if token.kind == TokenKind::String {
            writeln!(w, "{:?}", token.value)?;
        } else {
            writeln!(w, "{}", token.value)?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
