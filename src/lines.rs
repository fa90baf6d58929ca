use std::iter::Peekable;
use std::str::Lines;

/// The current line is kept untouched; parsing advances a cursor into it, so
/// the consumed prefix is always `line()[..pos]`.
pub(crate) struct LineStore<'a> {
    pending: Peekable<Lines<'a>>,
    line: &'a str,
    pos: usize,
    lineno: usize,
}

impl<'a> LineStore<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        LineStore {
            pending: source.lines().peekable(),
            line: "",
            pos: 0,
            lineno: 0,
        }
    }

    // False at end of input.
    pub(crate) fn next_line(&mut self) -> bool {
        match self.pending.next() {
            Some(line) => {
                self.line = line;
                self.pos = 0;
                self.lineno += 1;
                true
            }
            None => false,
        }
    }

    pub(crate) fn peek(&mut self) -> Option<&'a str> {
        self.pending.peek().copied()
    }

    pub(crate) fn line(&self) -> &'a str {
        self.line
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    pub(crate) fn consumed(&self) -> &'a str {
        &self.line[..self.pos]
    }

    pub(crate) fn lineno(&self) -> usize {
        self.lineno
    }

    /// Consumes `len` bytes of the current line.
    pub(crate) fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.line.len());
    }

    pub(crate) fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.advance(rest.len() - rest.trim_start().len());
    }

    pub(crate) fn column(&self) -> usize {
        self.line[..self.pos].chars().count()
    }
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Width in columns and byte length of the leading spaces and tabs.
pub(crate) fn indentation(line: &str, tab_size: usize) -> (usize, usize) {
    let mut width = 0;
    let mut len = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += tab_size,
            _ => break,
        }
        len += 1;
    }
    (width, len)
}

pub(crate) fn strip_columns(line: &str, columns: usize, tab_size: usize) -> &str {
    let mut width = 0;
    let mut len = 0;
    for c in line.chars() {
        if width >= columns {
            break;
        }
        match c {
            ' ' => width += 1,
            '\t' => width += tab_size,
            _ => break,
        }
        len += 1;
    }
    &line[len..]
}
