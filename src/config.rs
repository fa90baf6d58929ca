use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Options {
    #[serde(default = "default_tag")]
    pub default_tag: String,

    /// Columns a tab counts for in leading whitespace.
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,

    // Only read by `parse_bytes`.
    #[serde(default)]
    pub text_encoding: Option<String>,

    #[serde(default)]
    pub file_name: Option<String>,
}

fn default_tag() -> String {
    "div".to_string()
}
fn default_tab_size() -> usize {
    4
}

impl Default for Options {
    fn default() -> Self {
        Options {
            default_tag: default_tag(),
            tab_size: default_tab_size(),
            text_encoding: None,
            file_name: None,
        }
    }
}

impl Options {
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.default_tag, "div");
        assert_eq!(options.tab_size, 4);
        assert!(options.text_encoding.is_none());
        assert!(options.file_name.is_none());
    }

    #[test]
    fn test_deserialize_full_options() {
        let json = r#"{
            "default_tag": "span",
            "tab_size": 2,
            "text_encoding": "utf-8",
            "file_name": "views/index.hamlet"
        }"#;
        let options: Options = serde_json::from_str(json).unwrap();
        assert_eq!(options.default_tag, "span");
        assert_eq!(options.tab_size, 2);
        assert_eq!(options.text_encoding.as_deref(), Some("utf-8"));
        assert_eq!(options.file_name.as_deref(), Some("views/index.hamlet"));
    }

    #[test]
    fn test_deserialize_partial_options() {
        let options: Options = serde_json::from_str(r#"{"tab_size": 8}"#).unwrap();
        assert_eq!(options.tab_size, 8);
        assert_eq!(options.default_tag, "div");
        assert!(options.file_name.is_none());
    }

    #[test]
    fn test_with_file_name() {
        let options = Options::default().with_file_name("a.hamlet");
        assert_eq!(options.file_name.as_deref(), Some("a.hamlet"));
    }
}
