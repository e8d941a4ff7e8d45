use crate::{ast::Node, token::Token};

/// Hook into the front-end stages.
///
/// The lexer calls [`Observer::token`] once per emitted token and the parser
/// calls [`Observer::node`] once per completed node. Neither call can change
/// the outcome of lexing or parsing.
pub trait Observer {
    fn token(&mut self, token: &Token) {
        _ = token;
    }

    fn node(&mut self, node: &Node) {
        _ = node;
    }
}

impl Observer for () {}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::ast::NodeKind;

    /// Records everything it observes.
    #[derive(Default)]
    pub struct Recorder {
        pub tokens: Vec<String>,
        pub nodes: Vec<NodeKind>,
    }

    impl Observer for Recorder {
        fn token(&mut self, token: &Token) {
            self.tokens.push(token.value.clone());
        }

        fn node(&mut self, node: &Node) {
            self.nodes.push(node.kind);
        }
    }
}
