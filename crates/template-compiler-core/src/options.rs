//! Compiler configuration.

use crate::error::CompileError;
use crate::transform::{DirectiveTransform, NodeTransform};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

/// Callback receiving diagnostics as they are reported.
pub type ErrorHandler = Arc<dyn Fn(&CompileError) + Send + Sync>;

/// Whitespace handling for text nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WhitespaceStrategy {
    #[default]
    Condense,
    Preserve,
}

/// Shape of the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CodegenMode {
    /// A script body returning the render function, with helpers taken from
    /// a runtime global.
    #[default]
    Function,
    /// An ES module importing helpers and exporting `render`.
    Module,
}

/// Options for a single compile.
#[derive(Clone)]
pub struct CompilerOptions {
    /// Interpolation delimiters.
    pub delimiters: (String, String),
    pub whitespace: WhitespaceStrategy,
    /// Keep comments in the output.
    pub comments: bool,
    /// Platform tag check. Tags for which this returns `false` are
    /// components. Without it only capitalized tags and `component` are.
    pub is_native_tag: Option<fn(&str) -> bool>,
    pub is_void_tag: fn(&str) -> bool,
    pub is_pre_tag: fn(&str) -> bool,
    /// Rewrite free identifiers in expressions to `_ctx.` accesses. When
    /// off, the render body runs inside `with (_ctx)`.
    pub prefix_identifiers: bool,
    pub hoist_static: bool,
    pub mode: CodegenMode,
    /// Global the helpers are read from in function mode.
    pub runtime_global_name: String,
    /// Module the helpers are imported from in module mode.
    pub runtime_module_name: String,
    /// Extra node transforms, run after the built-in ones.
    pub node_transforms: Vec<NodeTransform>,
    /// Directive transforms by directive name. These take precedence over
    /// the built-in `bind`, `on` and `model` transforms.
    pub directive_transforms: IndexMap<SmolStr, DirectiveTransform>,
    pub on_error: Option<ErrorHandler>,
    pub on_warn: Option<ErrorHandler>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            delimiters: ("{{".to_string(), "}}".to_string()),
            whitespace: WhitespaceStrategy::Condense,
            comments: true,
            is_native_tag: None,
            is_void_tag: |_| false,
            is_pre_tag: |_| false,
            prefix_identifiers: true,
            hoist_static: true,
            mode: CodegenMode::Function,
            runtime_global_name: "Vue".to_string(),
            runtime_module_name: "vue".to_string(),
            node_transforms: Vec::new(),
            directive_transforms: IndexMap::new(),
            on_error: None,
            on_warn: None,
        }
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("delimiters", &self.delimiters)
            .field("whitespace", &self.whitespace)
            .field("comments", &self.comments)
            .field("prefix_identifiers", &self.prefix_identifiers)
            .field("hoist_static", &self.hoist_static)
            .field("mode", &self.mode)
            .field("node_transforms", &self.node_transforms.len())
            .field(
                "directive_transforms",
                &self.directive_transforms.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl CompilerOptions {
    /// Report a diagnostic to the matching callback.
    pub(crate) fn report(&self, error: &CompileError) {
        let handler = if error.is_error() {
            &self.on_error
        } else {
            &self.on_warn
        };
        if let Some(handler) = handler {
            handler(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use template_span::Span;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.delimiters.0, "{{");
        assert_eq!(options.whitespace, WhitespaceStrategy::Condense);
        assert!(options.prefix_identifiers);
        assert!(!(options.is_void_tag)("br"));
    }

    #[test]
    fn test_report_routes_by_severity() {
        let errors = Arc::new(AtomicUsize::new(0));
        let warnings = Arc::new(AtomicUsize::new(0));
        let (e, w) = (errors.clone(), warnings.clone());
        let options = CompilerOptions {
            on_error: Some(Arc::new(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            })),
            on_warn: Some(Arc::new(move |_| {
                w.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let error = CompileError::new(ErrorCode::InvalidEndTag, Span::default());
        options.report(&error);
        options.report(&error.into_warning());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}
