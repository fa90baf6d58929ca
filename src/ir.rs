use serde::Serialize;

/// Template IR handed to the code generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Multi(Vec<Node>),
    /// One source line ended here.
    Newline,
    Doctype(String),
    HtmlTag {
        name: String,
        attrs: Vec<Attr>,
        /// `None` for self-closing tags.
        content: Option<Box<Node>>,
    },
    HtmlComment(Box<Node>),
    CondComment {
        condition: String,
        content: Box<Node>,
    },
    Embedded {
        engine: String,
        content: Box<Node>,
    },
    Control {
        code: String,
        content: Box<Node>,
    },
    Output {
        escape: bool,
        code: String,
        content: Box<Node>,
    },
    /// Text that may contain `#{...}` splices.
    Interpolate(String),
    Static(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr {
    /// `#id` / `.class` shortcut; never interpolated.
    Static(String, String),
    Dynamic(String, AttrValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    True,
    Node(Node),
}

impl Node {
    pub fn multi(children: Vec<Node>) -> Node {
        Node::Multi(children)
    }

    pub fn interpolate(text: impl Into<String>) -> Node {
        Node::Interpolate(text.into())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Multi(children) => children,
            _ => &[],
        }
    }

    pub fn content(&self) -> Option<&Node> {
        match self {
            Node::HtmlTag { content, .. } => content.as_deref(),
            Node::HtmlComment(content)
            | Node::CondComment { content, .. }
            | Node::Embedded { content, .. }
            | Node::Control { content, .. }
            | Node::Output { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Number of container nodes on the deepest path below this node.
    pub fn depth(&self) -> usize {
        let below = |node: &Node| node.children().iter().map(Node::depth).max().unwrap_or(0);
        match self {
            Node::Multi(_) => below(self),
            _ => match self.content() {
                Some(content) => 1 + content.depth(),
                None => 0,
            },
        }
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Interpolate(text) | Node::Static(text) => out.push_str(text),
            Node::Multi(children) => children.iter().for_each(|c| c.collect_text(out)),
            _ => {
                if let Some(content) = self.content() {
                    content.collect_text(out);
                }
            }
        }
    }
}

impl Attr {
    pub fn name(&self) -> &str {
        match self {
            Attr::Static(name, _) | Attr::Dynamic(name, _) => name,
        }
    }
}
