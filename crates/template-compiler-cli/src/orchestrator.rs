//! File discovery, parallel compilation and output.

use crate::cli::Args;
use crate::config::Config;
use crate::error::CliError;
use crate::output::OutputFormatter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use template_compiler_core::CompileOutput;
use walkdir::WalkDir;

/// Result of a run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Number of templates compiled.
    pub file_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub duration_ms: u64,
}

/// A template found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path below the input it was found in, used to mirror directories
    /// under `--out-dir`.
    pub relative: PathBuf,
}

/// One compiled template.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub source: String,
    pub output: CompileOutput,
    /// Where the code was written.
    pub written: Option<PathBuf>,
}

pub struct Orchestrator {
    cwd: PathBuf,
    config: Config,
    args: Args,
    formatter: OutputFormatter,
}

impl Orchestrator {
    pub fn new(cwd: PathBuf, args: Args) -> Result<Self, CliError> {
        let config = Config::load(&cwd, &args)?;
        if let Some(path) = &config.config_path {
            tracing::info!(config = %path.display(), "loaded config");
        }
        let formatter = OutputFormatter::new(args.output);
        Ok(Self {
            cwd,
            config,
            args,
            formatter,
        })
    }

    pub fn run(&self) -> Result<RunResult, CliError> {
        let start = Instant::now();
        let files = self.find_templates()?;
        tracing::info!(files = files.len(), "found templates");

        let reports = files
            .par_iter()
            .map(|file| self.compile_file(file))
            .collect::<Vec<_>>();

        let mut result = RunResult {
            file_count: files.len(),
            ..Default::default()
        };
        for report in reports {
            let report = report?;
            result.error_count += report.output.errors.len();
            result.warning_count += report.output.warnings.len();
            self.formatter.print_file(&report, self.args.stdout);
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        self.formatter.print_summary(&result);
        Ok(result)
    }

    /// Explicit files are always compiled. Directories are walked for
    /// files with a configured extension that are not ignored.
    pub fn find_templates(&self) -> Result<Vec<SourceFile>, CliError> {
        let inputs = if self.args.paths.is_empty() {
            vec![self.cwd.clone()]
        } else {
            self.args.paths.iter().map(|p| self.cwd.join(p)).collect()
        };

        let mut files = Vec::new();
        for input in inputs {
            if input.is_file() {
                let relative = input.file_name().map(PathBuf::from).unwrap_or_else(|| input.clone());
                files.push(SourceFile { path: input, relative });
                continue;
            }
            if !input.is_dir() {
                return Err(CliError::MissingInput { path: input });
            }
            let walker = WalkDir::new(&input)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !self.config.is_ignored(entry.path()))
                .filter_map(|e| e.ok());
            for entry in walker {
                if !entry.file_type().is_file() || !self.config.should_process(entry.path()) {
                    continue;
                }
                let relative = entry.path().strip_prefix(&input).unwrap_or(entry.path()).to_path_buf();
                files.push(SourceFile {
                    path: entry.path().to_path_buf(),
                    relative,
                });
            }
        }
        Ok(files)
    }

    fn compile_file(&self, file: &SourceFile) -> Result<FileReport, CliError> {
        let source = std::fs::read_to_string(&file.path).map_err(|source| CliError::Read {
            path: file.path.clone(),
            source,
        })?;
        let output = template_compiler_dom::compile(&source, &self.config.options);
        tracing::debug!(
            file = %file.path.display(),
            errors = output.errors.len(),
            hoists = output.hoists.len(),
            "compiled"
        );

        // Failed templates are reported but never overwrite earlier output.
        let written = if self.args.stdout || output.has_errors() {
            None
        } else {
            let target = self.output_path(file);
            write_output(&target, &output.code)?;
            Some(target)
        };

        Ok(FileReport {
            path: file.path.clone(),
            source,
            output,
            written,
        })
    }

    fn output_path(&self, file: &SourceFile) -> PathBuf {
        match &self.config.out_dir {
            Some(dir) => self.cwd.join(dir).join(&file.relative).with_extension("js"),
            None => file.path.with_extension("js"),
        }
    }
}

fn write_output(path: &Path, code: &str) -> Result<(), CliError> {
    let write_error = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(path, code).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("views/partials")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("views/home.html"), "<h1>{{ title }}</h1>").unwrap();
        fs::write(root.join("views/partials/row.tpl"), "<li v-for=\"i in items\">{{ i }}</li>").unwrap();
        fs::write(root.join("views/notes.txt"), "not a template").unwrap();
        fs::write(root.join("node_modules/pkg/skip.html"), "<p></p>").unwrap();
        dir
    }

    fn orchestrator(root: &Path, args: Args) -> Orchestrator {
        Orchestrator::new(
            root.to_path_buf(),
            Args {
                output: OutputFormat::Json,
                ..args
            },
        )
        .unwrap()
    }

    #[test]
    fn test_discovery() {
        let dir = project();
        let files = orchestrator(dir.path(), Args::default()).find_templates().unwrap();
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("views/home.html"), PathBuf::from("views/partials/row.tpl")]
        );
    }

    #[test]
    fn test_writes_next_to_input() {
        let dir = project();
        let result = orchestrator(dir.path(), Args::default()).run().unwrap();
        assert_eq!(result.file_count, 2);
        assert_eq!(result.error_count, 0);
        let code = fs::read_to_string(dir.path().join("views/home.js")).unwrap();
        assert!(code.contains("return function render(_ctx, _cache) {"));
        assert!(dir.path().join("views/partials/row.js").is_file());
    }

    #[test]
    fn test_out_dir_mirrors_layout() {
        let dir = project();
        let args = Args {
            paths: vec![PathBuf::from("views")],
            out_dir: Some(PathBuf::from("dist")),
            ..Default::default()
        };
        orchestrator(dir.path(), args).run().unwrap();
        assert!(dir.path().join("dist/home.js").is_file());
        assert!(dir.path().join("dist/partials/row.js").is_file());
        assert!(!dir.path().join("views/home.js").exists());
    }

    #[test]
    fn test_config_file_is_applied() {
        let dir = project();
        fs::write(dir.path().join("tcc.config.json"), r#"{ "mode": "module" }"#).unwrap();
        orchestrator(dir.path(), Args::default()).run().unwrap();
        let code = fs::read_to_string(dir.path().join("views/home.js")).unwrap();
        assert!(code.starts_with("import {"));
        assert!(code.contains("export function render"));
    }

    #[test]
    fn test_errors_are_counted_and_not_written() {
        let dir = project();
        fs::write(dir.path().join("views/broken.html"), "<div v-if></div>").unwrap();
        let result = orchestrator(dir.path(), Args::default()).run().unwrap();
        assert_eq!(result.error_count, 1);
        assert!(!dir.path().join("views/broken.js").exists());
        assert!(dir.path().join("views/home.js").is_file());
    }

    #[test]
    fn test_explicit_file_and_missing_input() {
        let dir = project();
        let args = Args {
            paths: vec![PathBuf::from("views/notes.txt")],
            ..Default::default()
        };
        let files = orchestrator(dir.path(), args).find_templates().unwrap();
        assert_eq!(files.len(), 1);

        let args = Args {
            paths: vec![PathBuf::from("missing")],
            ..Default::default()
        };
        let err = orchestrator(dir.path(), args).find_templates().unwrap_err();
        assert!(matches!(err, CliError::MissingInput { .. }));
    }
}
