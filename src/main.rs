use clap::Parser;
use hamlet::config::Options;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hamlet", about = "Parse Hamlet templates and print their IR as JSON")]
struct Cli {
    /// Input file(s) or directory
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tag used for `<#id` and `<.class` shortcuts (default: div)
    #[arg(long)]
    default_tag: Option<String>,

    /// Columns per tab in indentation (default: 4)
    #[arg(long)]
    tab_size: Option<usize>,

    /// Source encoding: utf-8 or ascii (default: utf-8)
    #[arg(long)]
    encoding: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn die(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn load_config(path: &PathBuf) -> Options {
    let text = fs::read_to_string(path).unwrap_or_else(|e| die(&format!("cannot read config: {}", e)));
    serde_json::from_str(&text).unwrap_or_else(|e| die(&format!("invalid config JSON: {}", e)))
}

fn main() {
    let cli = Cli::parse();

    let mut options = match cli.config {
        Some(ref path) => load_config(path),
        None => {
            let path = PathBuf::from("hamlet.config.json");
            if path.is_file() {
                load_config(&path)
            } else {
                Options::default()
            }
        }
    };

    if let Some(tag) = cli.default_tag {
        options.default_tag = tag;
    }
    if let Some(n) = cli.tab_size {
        options.tab_size = n;
    }
    if cli.encoding.is_some() {
        options.text_encoding = cli.encoding;
    }

    let files = hamlet::list_files(&cli.inputs).unwrap_or_else(|e| die(&format!("{}", e)));
    if files.is_empty() {
        die("no input files found");
    }

    let mut trees = Map::new();
    for fp in &files {
        let bytes = fs::read(fp).unwrap_or_else(|e| die(&format!("cannot read {}: {}", fp.display(), e)));
        let name = fp.display().to_string();
        let file_options = options.clone().with_file_name(name.clone());
        match hamlet::parse_bytes(&bytes, &file_options) {
            Ok(node) => {
                let value = serde_json::to_value(&node)
                    .unwrap_or_else(|e| die(&format!("cannot serialize {}: {}", name, e)));
                trees.insert(name, value);
            }
            Err(hamlet::Error::Syntax(err)) => {
                eprint!("{}", err);
                process::exit(1);
            }
            Err(e) => die(&format!("{}: {}", name, e)),
        }
    }

    let result = serde_json::to_string_pretty(&Value::Object(trees))
        .unwrap_or_else(|e| die(&format!("cannot serialize output: {}", e)));

    if let Some(ref output_path) = cli.output {
        fs::write(output_path, format!("{}\n", result))
            .unwrap_or_else(|e| die(&format!("cannot write {}: {}", output_path.display(), e)));
        eprintln!("parsed {} file(s) -> {}", files.len(), output_path.display());
    } else {
        println!("{}", result);
    }
}
