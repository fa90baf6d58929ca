use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("Unexpected indentation")]
    UnexpectedIndentation,

    #[error("Malformed indentation")]
    MalformedIndentation,

    #[error("Unknown line indicator")]
    UnknownLineIndicator,

    #[error("Unexpected text indentation")]
    UnexpectedTextIndentation,

    #[error("Expected attribute")]
    ExpectedAttribute,

    #[error("Expected closing delimiter {0}")]
    ExpectedClosingDelimiter(char),

    #[error("Expected closing quote {0}")]
    ExpectedClosingQuote(char),

    #[error("Invalid empty attribute")]
    InvalidEmptyAttribute,

    #[error("Did not expect content after doctype")]
    ContentAfterDoctype,

    #[error("Did not expect any content after self closing tag")]
    UnexpectedContentAfterSelfClosingTag,

    #[error("Unexpected end of file")]
    UnexpectedEndOfFile,
}

pub const DEFAULT_FILE_NAME: &str = "(__TEMPLATE__)";

/// Parse failure positioned in the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub file: String,
    pub source_line: String,
    pub lineno: usize,
    // In characters, 0-based.
    pub column: usize,
}

impl SyntaxError {
    pub fn new(
        kind: ErrorKind,
        file: Option<&str>,
        source_line: &str,
        lineno: usize,
        column: usize,
    ) -> Self {
        SyntaxError {
            kind,
            file: file.unwrap_or(DEFAULT_FILE_NAME).to_string(),
            source_line: source_line.to_string(),
            lineno,
            column,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stripped = self.source_line.trim();
        let leading = self.source_line.chars().count() - self.source_line.trim_start().chars().count();
        let column = self.column.saturating_sub(leading);
        writeln!(f, "{}", self.kind)?;
        writeln!(f, "  {}, Line {}", self.file, self.lineno)?;
        writeln!(f, "    {}", stripped)?;
        writeln!(f, "    {}^", " ".repeat(column))
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("template is not valid {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    #[error("unsupported text encoding: {0}")]
    UnsupportedEncoding(String),
}

pub type Result<T> = std::result::Result<T, Error>;
