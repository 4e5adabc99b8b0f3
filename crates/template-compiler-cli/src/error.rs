//! Errors of the command-line front end, and template diagnostics rendered
//! through miette.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use template_compiler_core::{CompileError, ErrorCode, Severity};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(tcc::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    #[diagnostic(code(tcc::write))]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(code(tcc::config), help("keys are camelCase, e.g. `prefixIdentifiers`"))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid ignore pattern `{pattern}`")]
    #[diagnostic(code(tcc::ignore))]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{} does not exist", path.display())]
    #[diagnostic(code(tcc::missing_input))]
    MissingInput { path: PathBuf },
}

/// A compile diagnostic with its template source attached.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TemplateDiagnostic {
    message: String,
    code: ErrorCode,
    severity: Severity,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl TemplateDiagnostic {
    pub fn new(path: &Path, source: &str, error: &CompileError) -> Self {
        Self {
            message: error.message.clone(),
            code: error.code,
            severity: error.severity,
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            span: SourceSpan::from(error.span.to_range()),
        }
    }
}

impl Diagnostic for TemplateDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(None, self.span))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_span::Span;

    #[test]
    fn test_template_diagnostic_carries_code_and_span() {
        let error = CompileError::new(ErrorCode::VIfNoExpression, Span::from_range(5..10));
        let diagnostic = TemplateDiagnostic::new(Path::new("a.html"), "<div v-if></div>", &error);
        assert_eq!(diagnostic.code().map(|c| c.to_string()), Some("v-if-no-expression".to_string()));
        assert_eq!(diagnostic.severity(), Some(miette::Severity::Error));
        let label = diagnostic.labels().and_then(|mut labels| labels.next()).unwrap();
        assert_eq!(label.offset(), 5);
        assert_eq!(label.len(), 5);
    }
}
