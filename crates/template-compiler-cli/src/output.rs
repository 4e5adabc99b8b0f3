//! Output formatting for diagnostics.

use crate::cli::OutputFormat;
use crate::error::TemplateDiagnostic;
use crate::orchestrator::{FileReport, RunResult};
use std::path::Path;
use template_compiler_core::CompileError;
use template_span::LineIndex;

/// Formatter for diagnostic output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the diagnostics of a compiled file, and its code when
    /// `print_code` is set.
    pub fn print_file(&self, report: &FileReport, print_code: bool) {
        match self.format {
            OutputFormat::Human => {
                for error in report.output.errors.iter().chain(&report.output.warnings) {
                    let diagnostic = TemplateDiagnostic::new(&report.path, &report.source, error);
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
                if print_code {
                    println!("// {}", report.path.display());
                    println!("{}", report.output.code);
                }
            }
            OutputFormat::Json => {
                println!("{}", file_json(report, print_code));
            }
        }
    }

    /// Print the summary.
    pub fn print_summary(&self, result: &RunResult) {
        match self.format {
            OutputFormat::Human => print_summary_human(result),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "type": "summary",
                    "files": result.file_count,
                    "errors": result.error_count,
                    "warnings": result.warning_count,
                    "duration_ms": result.duration_ms
                });
                println!("{}", json);
            }
        }
    }
}

fn print_summary_human(result: &RunResult) {
    eprintln!();
    if result.error_count == 0 && result.warning_count == 0 {
        eprintln!(
            "\x1b[32m✓\x1b[0m Compiled {} file{} ({}ms)",
            result.file_count,
            plural(result.file_count),
            result.duration_ms
        );
        return;
    }
    if result.error_count > 0 {
        eprintln!(
            "\x1b[31m✗\x1b[0m Found {} error{} in {} file{}",
            result.error_count,
            plural(result.error_count),
            result.file_count,
            plural(result.file_count)
        );
    }
    if result.warning_count > 0 {
        eprintln!(
            "\x1b[33m⚠\x1b[0m Found {} warning{}",
            result.warning_count,
            plural(result.warning_count)
        );
    }
    eprintln!("Time: {}ms", result.duration_ms);
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn file_json(report: &FileReport, include_code: bool) -> serde_json::Value {
    let index = LineIndex::new(&report.source);
    let diagnostics: Vec<_> = report
        .output
        .errors
        .iter()
        .chain(&report.output.warnings)
        .map(|error| diagnostic_json(&report.path, &index, error))
        .collect();
    let mut json = serde_json::json!({
        "type": "file",
        "file": report.path.to_string_lossy(),
        "output": report.written.as_ref().map(|p| p.to_string_lossy().to_string()),
        "helpers": report.output.helpers.iter().map(|h| h.name()).collect::<Vec<_>>(),
        "hoists": report.output.hoists.len(),
        "diagnostics": diagnostics
    });
    if include_code {
        json["code"] = serde_json::Value::String(report.output.code.clone());
    }
    json
}

fn diagnostic_json(file: &Path, index: &LineIndex, error: &CompileError) -> serde_json::Value {
    let (line, column) = index.line_col(error.span.start).to_display();
    serde_json::json!({
        "file": file.to_string_lossy(),
        "severity": error.severity.as_str(),
        "code": error.code.as_str(),
        "message": error.message,
        "line": line,
        "column": column,
        "span": {
            "start": error.span.start,
            "end": error.span.end
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use template_compiler_core::ErrorCode;
    use template_span::Span;

    #[test]
    fn test_diagnostic_json_positions() {
        let source = "<div>\n  <p v-if></p>\n</div>";
        let index = LineIndex::new(source);
        let start = source.find("v-if").unwrap();
        let error = CompileError::new(ErrorCode::VIfNoExpression, Span::from_range(start..start + 4));
        let json = diagnostic_json(Path::new("a.html"), &index, &error);
        assert_eq!(json["line"], 2);
        assert_eq!(json["column"], 6);
        assert_eq!(json["code"], "v-if-no-expression");
        assert_eq!(json["severity"], "error");
    }

    #[test]
    fn test_file_json() {
        let source = "<p>{{ msg }}</p>".to_string();
        let report = FileReport {
            path: PathBuf::from("a.html"),
            output: template_compiler_dom::compile(&source, &template_compiler_dom::dom_options()),
            source,
            written: Some(PathBuf::from("a.js")),
        };
        let json = file_json(&report, false);
        assert_eq!(json["output"], "a.js");
        assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));
        assert!(json.get("code").is_none());
        assert!(json["helpers"].as_array().is_some_and(|h| h.iter().any(|v| v == "toDisplayString")));
        assert!(file_json(&report, true)["code"].as_str().is_some_and(|c| c.contains("render")));
    }
}
