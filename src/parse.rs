use crate::config::Options;
use crate::error::{ErrorKind, SyntaxError};
use crate::ir::Node;
use crate::lines::{indentation, is_blank, LineStore};
use crate::stack::{BlockStack, Container};
use crate::text::{is_trailing_comment, strip_comment, TextMode};
use regex::Regex;
use std::sync::LazyLock;

static RE_DOCTYPE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<doctype\s+([^>]*)>?").unwrap());
static RE_OUTPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^=(=?)('?)").unwrap());
static RE_EMBEDDED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<(\w+):\s*$").unwrap());
static RE_HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--( ?)(.*)$").unwrap());
static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([#.]|\w[:\w-]*)").unwrap());
static RE_COND_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\[\s*(.*?)\s*\]\s*$").unwrap());
static RE_DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^doctype\s+(.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Indicator {
    Dash,
    Equals,
    LeftAngle,
    Hash,
    GreaterThan,
    Other,
}

impl Indicator {
    pub(crate) fn of(rest: &str) -> Indicator {
        match rest.chars().next() {
            Some('-') => Indicator::Dash,
            Some('=') => Indicator::Equals,
            Some('<') => Indicator::LeftAngle,
            Some('#') => Indicator::Hash,
            Some('>') => Indicator::GreaterThan,
            _ => Indicator::Other,
        }
    }
}

/// Whether the dispatcher still owes the line its `Newline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineEnd {
    Newline,
    Done,
}

pub(crate) struct Parser<'a> {
    pub(crate) options: &'a Options,
    pub(crate) lines: LineStore<'a>,
    pub(crate) stack: BlockStack,
    /// Inline content was just emitted; a following text line gets a space.
    pub(crate) needs_space: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, options: &'a Options) -> Self {
        Parser {
            options,
            lines: LineStore::new(source),
            stack: BlockStack::new(),
            needs_space: false,
        }
    }

    pub(crate) fn run(mut self) -> Result<Node, SyntaxError> {
        while self.lines.peek().is_some_and(is_blank) {
            self.lines.next_line();
            self.stack.push(Node::Newline);
        }
        if self.lines.peek().is_some_and(|l| RE_DOCTYPE_HEADER.is_match(l)) {
            self.lines.next_line();
            self.parse_doctype_header()?;
        }
        while self.lines.next_line() {
            self.parse_line()?;
        }
        Ok(self.stack.finish())
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> SyntaxError {
        self.error_at(kind, self.lines.line(), self.lines.lineno(), self.lines.column())
    }

    pub(crate) fn error_at(
        &self,
        kind: ErrorKind,
        line: &str,
        lineno: usize,
        column: usize,
    ) -> SyntaxError {
        SyntaxError::new(kind, self.options.file_name.as_deref(), line, lineno, column)
    }

    fn parse_doctype_header(&mut self) -> Result<(), SyntaxError> {
        let line = self.lines.line();
        let Some(caps) = RE_DOCTYPE_HEADER.captures(line) else {
            return Ok(());
        };
        let end = caps.get(0).map_or(0, |m| m.end());
        let trailing = &line[end..];
        if !is_trailing_comment(trailing) {
            self.lines.advance(end + (trailing.len() - trailing.trim_start().len()));
            return Err(self.error(ErrorKind::ContentAfterDoctype));
        }
        self.stack.push(Node::Doctype(caps[1].trim().to_string()));
        self.stack.push(Node::Newline);
        Ok(())
    }

    fn parse_line(&mut self) -> Result<(), SyntaxError> {
        if is_blank(self.lines.line()) {
            self.stack.push(Node::Newline);
            return Ok(());
        }

        let (indent, _) = indentation(self.lines.line(), self.options.tab_size);
        self.lines.skip_whitespace();
        match self.stack.align(indent) {
            Ok(true) => self.needs_space = false,
            Ok(false) => {}
            Err(kind) => return Err(self.error(kind)),
        }

        let indicator = Indicator::of(self.lines.rest());
        tracing::trace!(lineno = self.lines.lineno(), ?indicator, "dispatching line");
        let end = match indicator {
            Indicator::Dash => self.parse_control()?,
            Indicator::Equals => self.parse_output()?,
            Indicator::LeftAngle => self.parse_angle()?,
            Indicator::Hash => self.parse_hash()?,
            Indicator::GreaterThan => self.parse_text_line()?,
            Indicator::Other => {
                if let Some(caps) = RE_DOCTYPE.captures(self.lines.rest()) {
                    self.needs_space = false;
                    self.stack.push(Node::Doctype(caps[1].trim().to_string()));
                    LineEnd::Newline
                } else {
                    self.parse_text_line()?
                }
            }
        };
        if end == LineEnd::Newline {
            self.stack.push(Node::Newline);
        }
        Ok(())
    }

    fn parse_control(&mut self) -> Result<LineEnd, SyntaxError> {
        self.lines.advance(1);
        let code = self.parse_broken_line()?;
        self.needs_space = false;
        self.stack.open(Container::Control { code });
        Ok(LineEnd::Newline)
    }

    fn parse_output(&mut self) -> Result<LineEnd, SyntaxError> {
        let (escape, trailing_space) = self.parse_output_marker();
        let code = self.parse_broken_line()?;
        self.needs_space = trailing_space;
        self.stack.open(Container::Output { escape, code });
        Ok(LineEnd::Newline)
    }

    /// Consumes `=`, `==` and an optional `'`; returns `(escape, trailing_space)`.
    pub(crate) fn parse_output_marker(&mut self) -> (bool, bool) {
        let Some(caps) = RE_OUTPUT.captures(self.lines.rest()) else {
            return (true, true);
        };
        let escape = caps[1].is_empty();
        let trailing_space = caps[2].is_empty();
        self.lines.advance(caps[0].len());
        (escape, trailing_space)
    }

    pub(crate) fn parse_broken_line(&mut self) -> Result<String, SyntaxError> {
        let mut code = self.lines.rest().trim().to_string();
        while code.ends_with('\\') {
            self.lines.advance(self.lines.rest().len());
            if !self.lines.next_line() {
                return Err(self.error(ErrorKind::UnexpectedEndOfFile));
            }
            code.push('\n');
            code.push_str(self.lines.line().trim());
        }
        self.lines.advance(self.lines.rest().len());
        Ok(code)
    }

    fn parse_angle(&mut self) -> Result<LineEnd, SyntaxError> {
        let rest = self.lines.rest();
        if let Some(caps) = RE_EMBEDDED.captures(rest) {
            let engine = caps[1].to_string();
            self.needs_space = false;
            self.stack.push(Node::Newline);
            self.stack.open(Container::Embedded { engine });
            self.collect_text(String::new(), None, TextMode::Embedded)?;
            return Ok(LineEnd::Done);
        }
        if let Some(caps) = RE_HTML_COMMENT.captures(rest) {
            let space = caps[1].len();
            let text = strip_comment(&caps[2]).to_string();
            let baseline = if caps[2].is_empty() {
                None
            } else {
                Some(self.stack.current_indent() + space + 2)
            };
            self.needs_space = false;
            self.stack.open(Container::Comment);
            self.collect_text(text, baseline, TextMode::Plain)?;
            return Ok(LineEnd::Newline);
        }
        if let Some(caps) = RE_TAG.captures(rest) {
            let name = caps[1].to_string();
            self.parse_tag(&name)?;
            return Ok(LineEnd::Newline);
        }
        self.lines.advance(1);
        Err(self.error(ErrorKind::UnknownLineIndicator))
    }

    fn parse_hash(&mut self) -> Result<LineEnd, SyntaxError> {
        let rest = self.lines.rest();
        if rest.starts_with("#{") {
            return self.parse_text_line();
        }
        if let Some(caps) = RE_COND_COMMENT.captures(rest) {
            let condition = caps[1].to_string();
            self.needs_space = false;
            self.stack.open(Container::CondComment { condition });
            return Ok(LineEnd::Newline);
        }
        self.needs_space = false;
        self.skip_comment_block();
        Ok(LineEnd::Newline)
    }

    // Blank or deeper lines go too; each leaves its Newline.
    fn skip_comment_block(&mut self) {
        let tab_size = self.options.tab_size;
        while let Some(next) = self.lines.peek() {
            if !is_blank(next) && indentation(next, tab_size).0 <= self.stack.current_indent() {
                break;
            }
            self.lines.next_line();
            self.stack.push(Node::Newline);
        }
    }

    fn parse_text_line(&mut self) -> Result<LineEnd, SyntaxError> {
        let glued = self.lines.rest().starts_with('>');
        if glued {
            self.lines.advance(1);
        }
        let start = self.stack.current_indent() + usize::from(glued);
        let text = strip_comment(self.lines.rest()).to_string();
        self.lines.advance(self.lines.rest().len());

        if self.needs_space && !glued {
            self.stack.push(Node::Static(" ".to_string()));
        }
        let baseline = if text.is_empty() { None } else { Some(start) };
        self.collect_text(text, baseline, TextMode::Plain)?;
        self.needs_space = true;
        Ok(LineEnd::Newline)
    }
}
