//! Command-line argument parsing.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use template_compiler_core::{CodegenMode, WhitespaceStrategy};

/// Compile HTML templates into render functions
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tcc")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Template files or directories to compile (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Write compiled files into this directory instead of next to the input
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Print compiled code instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Shape of the generated script
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Resolve identifiers through `with (_ctx)` instead of prefixing them
    #[arg(long)]
    pub no_prefix: bool,

    /// Do not hoist static subtrees
    #[arg(long)]
    pub no_hoist: bool,

    /// Whitespace handling between elements
    #[arg(long)]
    pub whitespace: Option<Whitespace>,

    /// Drop template comments from the output
    #[arg(long)]
    pub no_comments: bool,

    /// Path to tcc.config.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format for diagnostics
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Ignore patterns (glob)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Verbose output, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Annotated source snippets
    #[default]
    Human,
    /// One JSON object per file, then a summary
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `return function render` reading helpers from the `Vue` global
    Function,
    /// An ES module importing helpers from `vue`
    Module,
}

impl From<Mode> for CodegenMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Function => CodegenMode::Function,
            Mode::Module => CodegenMode::Module,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Whitespace {
    Condense,
    Preserve,
}

impl From<Whitespace> for WhitespaceStrategy {
    fn from(whitespace: Whitespace) -> Self {
        match whitespace {
            Whitespace::Condense => WhitespaceStrategy::Condense,
            Whitespace::Preserve => WhitespaceStrategy::Preserve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "tcc",
            "templates",
            "a.html",
            "--mode",
            "module",
            "--whitespace",
            "preserve",
            "--ignore",
            "**/vendor/**",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.paths, vec![PathBuf::from("templates"), PathBuf::from("a.html")]);
        assert_eq!(args.mode, Some(Mode::Module));
        assert_eq!(args.whitespace, Some(Whitespace::Preserve));
        assert_eq!(args.ignore, vec!["**/vendor/**".to_string()]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.output, OutputFormat::Human);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Args::try_parse_from(["tcc", "--mode", "iife"]).is_err());
    }
}
