use crate::error::{ErrorKind, SyntaxError};
use crate::ir::Node;
use crate::lines::{indentation, strip_columns};
use crate::parse::Parser;
use fancy_regex::Regex as FancyRegex;
use regex::Regex;
use std::sync::LazyLock;

static RE_COMMENT_START: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\\)#(?!\{)").unwrap());
static RE_TRAILING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#.*)?$").unwrap());
static RE_BLANK_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*>?\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextMode {
    Plain,
    // Verbatim: no `>` markers and no comments.
    Embedded,
}

/// Cuts `text` at the first `#` that is neither escaped nor a `#{` splice.
pub(crate) fn strip_comment(text: &str) -> &str {
    match RE_COMMENT_START.find(text) {
        Ok(Some(m)) => &text[..m.start()],
        _ => text,
    }
}

pub(crate) fn is_trailing_comment(text: &str) -> bool {
    RE_TRAILING_COMMENT.is_match(text)
}

impl Parser<'_> {
    /// Consumes following lines indented deeper than the open level as one
    /// text block. `text` is what the current line already contributed; a
    /// missing `baseline` is set by the first collected line.
    pub(crate) fn collect_text(
        &mut self,
        mut text: String,
        mut baseline: Option<usize>,
        mode: TextMode,
    ) -> Result<(), SyntaxError> {
        let tab_size = self.options.tab_size;
        let embedded = mode == TextMode::Embedded;
        let mut newlines = 0;
        let mut blank_run = 0;
        let mut first_line = true;

        while let Some(next) = self.lines.peek() {
            let blank = if embedded {
                next.trim().is_empty()
            } else {
                RE_BLANK_TEXT.is_match(next)
            };
            if blank {
                self.lines.next_line();
                newlines += 1;
                if baseline.is_some() {
                    blank_run += 1;
                }
                continue;
            }

            let (mut indent, ws) = indentation(next, tab_size);
            if indent <= self.stack.current_indent() {
                break;
            }
            let marker = !embedded && next[ws..].starts_with('>');
            if marker {
                indent += 1;
            }
            self.lines.next_line();
            newlines += 1;

            if let Some(base) = baseline {
                // A leading '>' may sit one column left of the text.
                let tolerated = first_line && marker && base.checked_sub(indent) == Some(1);
                if indent < base && !tolerated {
                    self.lines.skip_whitespace();
                    return Err(self.error(ErrorKind::UnexpectedTextIndentation));
                }
            }

            let mut body = strip_columns(self.lines.line(), baseline.unwrap_or(indent), tab_size);
            if !embedded {
                body = body.strip_prefix('>').unwrap_or(body);
                body = strip_comment(body);
            }
            text.extend(std::iter::repeat('\n').take(blank_run));
            blank_run = 0;
            if baseline.is_some() {
                text.push('\n');
            }
            text.push_str(body);
            self.lines.advance(self.lines.rest().len());

            baseline.get_or_insert(indent);
            first_line = false;
        }

        if !text.is_empty() {
            self.stack.push(Node::Interpolate(text));
        }
        for _ in 0..newlines {
            self.stack.push(Node::Newline);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;

    fn parse(source: &str) -> Result<Node, SyntaxError> {
        Parser::new(source, &Options::default()).run()
    }

    fn tag_text(source: &str) -> Vec<Node> {
        let root = parse(source).unwrap();
        root.children()[0].content().unwrap().children().to_vec()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("Hello # note"), "Hello ");
        assert_eq!(strip_comment("# note"), "");
        assert_eq!(strip_comment("Hi #{name}!"), "Hi #{name}!");
        assert_eq!(strip_comment("Issue \\#12"), "Issue \\#12");
        assert_eq!(strip_comment("a ##{x}"), "a ");
    }

    #[test]
    fn test_trailing_comment() {
        assert!(is_trailing_comment(""));
        assert!(is_trailing_comment("  # why"));
        assert!(!is_trailing_comment(" extra"));
    }

    #[test]
    fn test_tag_text_continuation() {
        assert_eq!(
            tag_text("<p>Hello\n   World"),
            vec![Node::interpolate("Hello\nWorld"), Node::Newline, Node::Newline]
        );
    }

    #[test]
    fn test_deeper_continuation_keeps_relative_indent() {
        let nodes = tag_text("<p>Hello\n     World");
        assert_eq!(nodes[0], Node::interpolate("Hello\n  World"));
    }

    #[test]
    fn test_blank_lines_inside_text() {
        let nodes = tag_text("<p>one\n   two\n\n\n   three\n\n<p>next");
        assert_eq!(nodes[0], Node::interpolate("one\ntwo\n\n\nthree"));
        // "<p>one" line plus four consumed lines, plus the trailing blank.
        assert_eq!(nodes.iter().filter(|n| **n == Node::Newline).count(), 6);
    }

    #[test]
    fn test_unexpected_text_indentation() {
        let err = parse("<p>Hello\n  World").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedTextIndentation);
        assert_eq!(err.lineno, 2);
        assert_eq!(err.column, 2);
    }

    #[test]
    fn test_marker_one_column_short_is_tolerated() {
        let nodes = tag_text("<p> Hello\n  >World");
        assert_eq!(nodes[0], Node::interpolate("Hello\nWorld"));
    }

    #[test]
    fn test_marker_tolerance_only_on_first_line() {
        let err = parse("<p> Hello\n    there\n  >World").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedTextIndentation);
        assert_eq!(err.lineno, 3);
    }

    #[test]
    fn test_marker_preserves_following_spaces() {
        let nodes = tag_text("<p>Hello\n  >  World");
        assert_eq!(nodes[0], Node::interpolate("Hello\n  World"));
    }

    #[test]
    fn test_comment_inside_text_block() {
        let nodes = tag_text("<p>Hello\n   World # not shown\n   #{name}");
        assert_eq!(nodes[0], Node::interpolate("Hello\nWorld \n#{name}"));
    }

    #[test]
    fn test_embedded_text_is_verbatim() {
        let root = parse("<javascript:\n  if (a > b) { x = '#y'; }\n  > not a marker").unwrap();
        let embedded = &root.children()[1];
        assert_eq!(
            embedded.content().unwrap().children()[0],
            Node::interpolate("if (a > b) { x = '#y'; }\n> not a marker")
        );
    }

    #[test]
    fn test_first_line_sets_baseline() {
        let root = parse("<!--\n    first\n      second").unwrap();
        let comment = &root.children()[0];
        assert_eq!(
            comment.content().unwrap().children()[0],
            Node::interpolate("first\n  second")
        );
    }

    #[test]
    fn test_text_stops_at_open_level() {
        let root = parse("<div\n  <p>Hello\n     World\n  <p>Next").unwrap();
        let div = &root.children()[0];
        let tags: Vec<_> = div
            .content()
            .unwrap()
            .children()
            .iter()
            .filter(|n| matches!(n, Node::HtmlTag { .. }))
            .collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].text(), "Hello\nWorld");
        assert_eq!(tags[1].text(), "Next");
    }
}
