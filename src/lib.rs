pub mod config;
pub mod error;
pub mod ir;
mod lines;
mod parse;
mod stack;
mod tag;
mod text;

pub use config::Options;
pub use error::{Error, ErrorKind, Result, SyntaxError};
pub use ir::{Attr, AttrValue, Node};

use regex::Regex;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

static RE_TEMPLATE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.hamlet$").unwrap());

pub fn parse(source: &str, options: &Options) -> std::result::Result<Node, SyntaxError> {
    let file = options.file_name.as_deref().unwrap_or(error::DEFAULT_FILE_NAME);
    tracing::debug!(file, lines = source.lines().count(), "parsing template");
    let result = parse::Parser::new(source, options).run();
    if let Err(ref err) = result {
        tracing::debug!(file, lineno = err.lineno, kind = %err.kind, "parse failed");
    }
    result
}

pub fn parse_bytes(bytes: &[u8], options: &Options) -> Result<Node> {
    let source = decode(bytes, options.text_encoding.as_deref())?;
    Ok(parse(source, options)?)
}

fn decode<'b>(bytes: &'b [u8], encoding: Option<&str>) -> Result<&'b str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let name = encoding.unwrap_or("utf-8");
    let invalid = |message: String| Error::Encoding {
        encoding: name.to_string(),
        message,
    };
    match name.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string())),
        "ascii" | "us-ascii" => {
            if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
                return Err(invalid(format!("non-ASCII byte at offset {}", offset)));
            }
            std::str::from_utf8(bytes).map_err(|e| invalid(e.to_string()))
        }
        _ => Err(Error::UnsupportedEncoding(name.to_string())),
    }
}

pub fn list_files(inputs: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in inputs {
        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                entries.push(entry?.path());
            }
            out.extend(list_files(&entries)?);
        } else if path.is_file() && path.to_str().is_some_and(|p| RE_TEMPLATE_FILE.is_match(p)) {
            out.push(path.clone());
        }
    }
    out.sort();
    Ok(out)
}
