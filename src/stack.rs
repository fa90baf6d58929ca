use crate::error::ErrorKind;
use crate::ir::{Attr, Node};

/// Node that owns an open block; built when the block closes.
#[derive(Debug)]
pub(crate) enum Container {
    Root,
    Tag { name: String, attrs: Vec<Attr> },
    TagOutput { name: String, attrs: Vec<Attr>, escape: bool, code: String },
    Control { code: String },
    Output { escape: bool, code: String },
    Comment,
    CondComment { condition: String },
    Embedded { engine: String },
}

impl Container {
    fn close(self, nodes: Vec<Node>) -> Node {
        let content = Box::new(Node::Multi(nodes));
        match self {
            Container::Root => *content,
            Container::Tag { name, attrs } => Node::HtmlTag {
                name,
                attrs,
                content: Some(content),
            },
            Container::TagOutput { name, attrs, escape, code } => Node::HtmlTag {
                name,
                attrs,
                content: Some(Box::new(Node::Output { escape, code, content })),
            },
            Container::Control { code } => Node::Control { code, content },
            Container::Output { escape, code } => Node::Output { escape, code, content },
            Container::Comment => Node::HtmlComment(content),
            Container::CondComment { condition } => Node::CondComment { condition, content },
            Container::Embedded { engine } => Node::Embedded { engine, content },
        }
    }
}

#[derive(Debug)]
struct Block {
    owner: Container,
    nodes: Vec<Node>,
}

/// `blocks` holds one entry per recorded indentation level, plus at most one
/// block opened by the previous line whose indentation is not known yet.
#[derive(Debug)]
pub(crate) struct BlockStack {
    indents: Vec<usize>,
    blocks: Vec<Block>,
}

impl BlockStack {
    pub(crate) fn new() -> Self {
        BlockStack {
            indents: vec![0],
            blocks: vec![Block {
                owner: Container::Root,
                nodes: Vec::new(),
            }],
        }
    }

    pub(crate) fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    pub(crate) fn expecting(&self) -> bool {
        self.blocks.len() > self.indents.len()
    }

    pub(crate) fn push(&mut self, node: Node) {
        if let Some(block) = self.blocks.last_mut() {
            block.nodes.push(node);
        }
    }

    pub(crate) fn open(&mut self, owner: Container) {
        debug_assert!(!self.expecting(), "block opened twice on one line");
        self.blocks.push(Block {
            owner,
            nodes: Vec::new(),
        });
        tracing::trace!(depth = self.blocks.len(), "opened block");
    }

    fn close(&mut self) {
        debug_assert!(self.blocks.len() > 1, "root block cannot be closed");
        if self.blocks.len() < 2 {
            return;
        }
        if let Some(block) = self.blocks.pop() {
            let node = block.owner.close(block.nodes);
            self.push(node);
        }
        tracing::trace!(depth = self.blocks.len(), "closed block");
        debug_assert!(self.blocks.len() >= self.indents.len());
    }

    /// Returns whether the innermost block changed.
    pub(crate) fn align(&mut self, indent: usize) -> Result<bool, ErrorKind> {
        let expecting = self.expecting();
        if indent > self.current_indent() {
            if !expecting {
                return Err(ErrorKind::UnexpectedIndentation);
            }
            self.indents.push(indent);
            return Ok(true);
        }

        // The previous line's block stays empty.
        if expecting {
            self.close();
        }
        let mut changed = false;
        while indent < self.current_indent() {
            self.indents.pop();
            self.close();
            changed = true;
        }
        if indent != self.current_indent() {
            return Err(ErrorKind::MalformedIndentation);
        }
        debug_assert_eq!(self.blocks.len(), self.indents.len());
        Ok(changed)
    }

    pub(crate) fn finish(mut self) -> Node {
        while self.blocks.len() > 1 {
            if !self.expecting() {
                self.indents.pop();
            }
            self.close();
        }
        match self.blocks.pop() {
            Some(root) => root.owner.close(root.nodes),
            None => Node::Multi(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(code: &str) -> Container {
        Container::Control {
            code: code.to_string(),
        }
    }

    #[test]
    fn test_unconfirmed_block_collapses_empty() {
        let mut stack = BlockStack::new();
        stack.open(control("x"));
        assert!(stack.expecting());
        assert_eq!(stack.align(0), Ok(false));
        assert!(!stack.expecting());
        let root = stack.finish();
        assert_eq!(
            root,
            Node::Multi(vec![Node::Control {
                code: "x".to_string(),
                content: Box::new(Node::Multi(vec![])),
            }])
        );
    }

    #[test]
    fn test_indent_without_block() {
        let mut stack = BlockStack::new();
        assert_eq!(stack.align(2), Err(ErrorKind::UnexpectedIndentation));
    }

    #[test]
    fn test_dedent_between_levels() {
        let mut stack = BlockStack::new();
        stack.open(control("a"));
        assert_eq!(stack.align(4), Ok(true));
        assert_eq!(stack.align(2), Err(ErrorKind::MalformedIndentation));
    }

    #[test]
    fn test_nested_blocks_close_in_order() {
        let mut stack = BlockStack::new();
        stack.open(control("a"));
        stack.align(2).unwrap();
        stack.open(control("b"));
        stack.align(4).unwrap();
        stack.push(Node::interpolate("deep"));
        assert_eq!(stack.current_indent(), 4);
        assert_eq!(stack.align(0), Ok(true));
        stack.push(Node::interpolate("top"));
        let root = stack.finish();
        let children = root.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].depth(), 2);
        assert_eq!(children[1], Node::interpolate("top"));
    }

    #[test]
    fn test_finish_three_levels_deep() {
        let mut stack = BlockStack::new();
        stack.open(control("a"));
        stack.align(2).unwrap();
        stack.open(control("b"));
        stack.align(4).unwrap();
        stack.open(control("c"));
        stack.align(6).unwrap();
        stack.push(Node::interpolate("deep"));
        let root = stack.finish();
        assert_eq!(root.depth(), 3);
        assert_eq!(root.text(), "deep");
    }

    #[test]
    fn test_finish_with_unconfirmed_block() {
        let mut stack = BlockStack::new();
        stack.open(control("a"));
        stack.align(2).unwrap();
        stack.open(control("b"));
        let root = stack.finish();
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_finish_closes_open_blocks() {
        let mut stack = BlockStack::new();
        stack.open(Container::Tag {
            name: "p".to_string(),
            attrs: Vec::new(),
        });
        stack.push(Node::Newline);
        let root = stack.finish();
        assert_eq!(root.depth(), 1);
    }
}
