//! Configuration loading and management.
//!
//! Settings come from `tcc.config.json`, found by walking up from the
//! working directory, with command-line flags taking precedence.

use crate::cli::{Args, Mode, Whitespace};
use crate::error::CliError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use template_compiler_core::CompilerOptions;

pub const CONFIG_FILE: &str = "tcc.config.json";

const DEFAULT_IGNORE: &[&str] = &["**/node_modules/**", "**/.git/**"];

/// Contents of `tcc.config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerConfig {
    pub mode: Option<Mode>,
    pub prefix_identifiers: Option<bool>,
    pub hoist_static: Option<bool>,
    pub whitespace: Option<Whitespace>,
    pub comments: Option<bool>,
    pub delimiters: Option<(String, String)>,
    /// Relative to the config file.
    pub out_dir: Option<PathBuf>,
    /// File extensions compiled when walking directories, without the dot.
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl CompilerConfig {
    /// Find the nearest config file at or above `start`.
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.is_file())
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved settings for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Config file in use, if any.
    pub config_path: Option<PathBuf>,
    /// Compiler options including the DOM layer.
    pub options: CompilerOptions,
    pub out_dir: Option<PathBuf>,
    pub extensions: Vec<String>,
    ignore: GlobSet,
}

impl Config {
    /// Load configuration from CLI arguments and the working directory.
    pub fn load(cwd: &Path, args: &Args) -> Result<Self, CliError> {
        let config_path = args.config.clone().or_else(|| CompilerConfig::find(cwd));
        let file = match &config_path {
            Some(path) => CompilerConfig::load(path)?,
            None => CompilerConfig::default(),
        };
        let base_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(cwd)
            .to_path_buf();
        let mut config = Self::resolve(file, &base_dir, args)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Merge file settings with flags. Flags win.
    pub fn resolve(file: CompilerConfig, base_dir: &Path, args: &Args) -> Result<Self, CliError> {
        let mut options = CompilerOptions::default();
        if let Some(mode) = args.mode.or(file.mode) {
            options.mode = mode.into();
        }
        if let Some(whitespace) = args.whitespace.or(file.whitespace) {
            options.whitespace = whitespace.into();
        }
        options.prefix_identifiers = !args.no_prefix && file.prefix_identifiers.unwrap_or(true);
        options.hoist_static = !args.no_hoist && file.hoist_static.unwrap_or(true);
        options.comments = !args.no_comments && file.comments.unwrap_or(true);
        if let Some(delimiters) = file.delimiters {
            options.delimiters = delimiters;
        }

        let out_dir = args.out_dir.clone().or_else(|| file.out_dir.map(|dir| base_dir.join(dir)));
        let extensions = file
            .extensions
            .unwrap_or_else(|| vec!["html".to_string(), "tpl".to_string()])
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();

        let mut builder = GlobSetBuilder::new();
        let patterns = DEFAULT_IGNORE
            .iter()
            .map(|p| p.to_string())
            .chain(file.ignore)
            .chain(args.ignore.iter().cloned());
        for pattern in patterns {
            let glob = Glob::new(&pattern).map_err(|source| CliError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|source| CliError::Glob {
            pattern: String::new(),
            source,
        })?;

        Ok(Self {
            config_path: None,
            options: template_compiler_dom::with_dom(options),
            out_dir,
            extensions,
            ignore,
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_match(path)
    }

    /// Check if a file found while walking should be compiled.
    pub fn should_process(&self, path: &Path) -> bool {
        let matches_extension = path
            .extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext));
        matches_extension && !self.is_ignored(path)
    }
}
