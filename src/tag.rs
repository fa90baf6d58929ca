use crate::error::{ErrorKind, SyntaxError};
use crate::ir::{Attr, AttrValue, Node};
use crate::lines::indentation;
use crate::parse::Parser;
use crate::stack::Container;
use crate::text::{is_trailing_comment, strip_comment, TextMode};
use regex::Regex;
use std::sync::LazyLock;

static RE_SHORTCUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([#.])([\w\x{00C0}-\x{FFFF}][\w:\x{00C0}-\x{FFFF}-]*)").unwrap()
});
static RE_ATTR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w[:\w-]*)\s*(=\s*)?").unwrap());

fn closing_delimiter(open: Option<char>) -> Option<char> {
    match open {
        Some('(') => Some(')'),
        Some('[') => Some(']'),
        Some('{') => Some('}'),
        _ => None,
    }
}

fn shortcut_name(marker: &str) -> &'static str {
    if marker == "#" {
        "id"
    } else {
        "class"
    }
}

/// Scans a quoted value up to the closing `quote`, skipping over `#{...}`
/// splices. Returns the value and the bytes consumed, closing quote included.
fn quoted_value(text: &str, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if depth == 0 && c == quote {
            return Some((value, i + c.len_utf8()));
        }
        if depth > 0 {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        } else if c == '#' && chars.peek().is_some_and(|&(_, next)| next == '{') {
            value.push('#');
            chars.next();
            value.push('{');
            depth = 1;
            continue;
        }
        value.push(c);
    }
    None
}

impl Parser<'_> {
    pub(crate) fn parse_tag(&mut self, tag: &str) -> Result<(), SyntaxError> {
        if self.needs_space {
            self.stack.push(Node::Static(" ".to_string()));
        }
        let name = if tag == "#" || tag == "." {
            self.lines.advance(1);
            self.options.default_tag.clone()
        } else {
            self.lines.advance(1 + tag.len());
            tag.to_string()
        };
        let attrs = self.parse_attributes()?;
        let closed = self.lines.consumed().ends_with('>');

        let rest = self.lines.rest();
        let trimmed = rest.trim_start();
        if trimmed.starts_with('=') {
            self.lines.advance(rest.len() - trimmed.len());
            let (escape, trailing_space) = self.parse_output_marker();
            let code = self.parse_broken_line()?;
            self.needs_space = trailing_space;
            self.stack.open(Container::TagOutput {
                name,
                attrs,
                escape,
                code,
            });
        } else if let Some(after) = trimmed.strip_prefix("/>") {
            if !is_trailing_comment(after) {
                let line = self.lines.line();
                return Err(self.error_at(
                    ErrorKind::UnexpectedContentAfterSelfClosingTag,
                    line,
                    self.lines.lineno(),
                    line.chars().count(),
                ));
            }
            self.close_self_closing(name, attrs);
        } else if !closed && trimmed.trim_end() == "/" {
            self.close_self_closing(name, attrs);
        } else if trimmed.is_empty() {
            self.needs_space = false;
            self.stack.open(Container::Tag { name, attrs });
        } else {
            self.lines.advance(usize::from(rest.starts_with(' ')));
            let baseline = self.text_column();
            let text = strip_comment(self.lines.rest()).to_string();
            self.lines.advance(self.lines.rest().len());
            self.stack.open(Container::Tag { name, attrs });
            self.collect_text(text, Some(baseline), TextMode::Plain)?;
            self.needs_space = true;
        }
        Ok(())
    }

    fn close_self_closing(&mut self, name: String, attrs: Vec<Attr>) {
        self.lines.advance(self.lines.rest().len());
        self.needs_space = false;
        self.stack.push(Node::HtmlTag {
            name,
            attrs,
            content: None,
        });
    }

    // Tabs in the indentation count as `tab_size` columns.
    fn text_column(&self) -> usize {
        let consumed = self.lines.consumed();
        let (indent, ws) = indentation(consumed, self.options.tab_size);
        indent + consumed[ws..].chars().count()
    }

    /// A delimited list may continue over following lines.
    fn parse_attributes(&mut self) -> Result<Vec<Attr>, SyntaxError> {
        let mut attrs = Vec::new();
        while let Some(caps) = RE_SHORTCUT.captures(self.lines.rest()) {
            attrs.push(Attr::Static(shortcut_name(&caps[1]).to_string(), caps[2].to_string()));
            self.lines.advance(caps[0].len());
        }

        let delimiter = closing_delimiter(self.lines.rest().chars().next());
        if delimiter.is_some() {
            self.lines.advance(1);
        }
        let tag_line = self.lines.line();
        let tag_lineno = self.lines.lineno();

        loop {
            self.parse_attribute_list(delimiter, &mut attrs)?;
            self.lines.skip_whitespace();
            let rest = self.lines.rest();
            match delimiter {
                Some(close) => {
                    if rest.starts_with(close) {
                        self.lines.advance(1);
                        if self.lines.rest().starts_with('>') {
                            self.lines.advance(1);
                        }
                        break;
                    }
                    if !rest.is_empty() {
                        return Err(self.error(ErrorKind::ExpectedAttribute));
                    }
                    self.stack.push(Node::Newline);
                    if !self.lines.next_line() {
                        return Err(self.error_at(
                            ErrorKind::ExpectedClosingDelimiter(close),
                            tag_line,
                            tag_lineno,
                            tag_line.chars().count(),
                        ));
                    }
                }
                None => {
                    if rest.starts_with('>') {
                        self.lines.advance(1);
                        break;
                    }
                    if rest.is_empty()
                        || rest.starts_with('=')
                        || rest.starts_with("/>")
                        || rest.trim_end() == "/"
                    {
                        break;
                    }
                    return Err(self.error(ErrorKind::ExpectedAttribute));
                }
            }
        }
        Ok(attrs)
    }

    fn parse_attribute_list(
        &mut self,
        delimiter: Option<char>,
        attrs: &mut Vec<Attr>,
    ) -> Result<(), SyntaxError> {
        while let Some(caps) = RE_ATTR_NAME.captures(self.lines.rest()) {
            let name = caps[1].to_string();
            let has_value = caps.get(2).is_some();
            self.lines.advance(caps[0].len());
            if !has_value {
                attrs.push(Attr::Dynamic(name, AttrValue::True));
                continue;
            }

            let rest = self.lines.rest();
            let value = match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => match quoted_value(&rest[1..], quote) {
                    Some((value, len)) => {
                        self.lines.advance(1 + len);
                        value
                    }
                    None => {
                        self.lines.advance(rest.len());
                        return Err(self.error(ErrorKind::ExpectedClosingQuote(quote)));
                    }
                },
                _ => {
                    let len = rest
                        .find(|c: char| {
                            c.is_whitespace()
                                || Some(c) == delimiter
                                || (delimiter.is_none() && c == '>')
                        })
                        .unwrap_or(rest.len());
                    if len == 0 {
                        return Err(self.error(ErrorKind::InvalidEmptyAttribute));
                    }
                    self.lines.advance(len);
                    rest[..len].to_string()
                }
            };
            attrs.push(Attr::Dynamic(name, AttrValue::Node(Node::Interpolate(value))));
        }
        Ok(())
    }
}
