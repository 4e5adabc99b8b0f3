//! Template to render-function compiler.
//!
//! A template goes through five stages:
//!
//! 1. [`parser`] builds the content AST.
//! 2. [`transform`] lowers directives, elements and slots into a codegen
//!    tree, rewriting expressions against the render context with [`expr`].
//! 3. [`hoist`] moves constant subtrees out of the render function.
//! 4. [`block`] records the dynamic descendants of every block.
//! 5. [`codegen`] prints the render function.
//!
//! ```
//! use template_compiler_core::{compile, CompilerOptions};
//!
//! let output = compile("<p>{{ msg }}</p>", &CompilerOptions::default());
//! assert!(output.errors.is_empty());
//! assert!(output.code.contains("_toDisplayString(_ctx.msg)"));
//! ```

pub mod ast;
pub mod block;
pub mod codegen;
pub mod error;
pub mod expr;
pub mod helpers;
pub mod hoist;
pub mod js;
pub mod options;
pub mod parser;
pub mod transform;
pub mod utils;

pub use block::BlockSummary;
pub use error::{CompileError, ErrorCode, Severity};
pub use helpers::RuntimeHelper;
pub use options::{CodegenMode, CompilerOptions, ErrorHandler, WhitespaceStrategy};
pub use parser::parse;
pub use transform::{
    Cursor, DirectiveTransform, DirectiveTransformResult, ExitFn, NeedRuntime, NodeTransform, TransformContext,
};

use smol_str::SmolStr;

/// Everything a compile produces.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// The complete generated script.
    pub code: String,
    /// Helper imports and hoisted constants, also included in `code`.
    pub preamble: String,
    /// Runtime helpers referenced by the code.
    pub helpers: Vec<RuntimeHelper>,
    /// Source of each hoisted constant.
    pub hoists: Vec<String>,
    /// Components resolved at runtime, in order of first use.
    pub components: Vec<SmolStr>,
    /// Custom directives resolved at runtime, in order of first use.
    pub directives: Vec<SmolStr>,
    pub blocks: Vec<BlockSummary>,
    pub errors: Vec<CompileError>,
    pub warnings: Vec<CompileError>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Compile a template into a render function.
///
/// Never fails: diagnostics are returned with the output and passed to the
/// callbacks in `options` as they are found.
pub fn compile(source: &str, options: &CompilerOptions) -> CompileOutput {
    let span = tracing::debug_span!("compile", bytes = source.len());
    let _enter = span.enter();

    // Module output cannot use `with`, so identifiers are always prefixed.
    let module_options;
    let options = if options.mode == CodegenMode::Module && !options.prefix_identifiers {
        module_options = CompilerOptions {
            prefix_identifiers: true,
            ..options.clone()
        };
        &module_options
    } else {
        options
    };

    let (mut root, mut diagnostics) = parser::parse(source, options);
    tracing::trace!(children = root.children.len(), "parsed template");
    diagnostics.extend(transform::transform(&mut root, options));
    if options.hoist_static {
        hoist::hoist_static(&mut root);
    }
    let blocks = block::flatten_blocks(&mut root);
    let generated = codegen::generate(&root, options);

    let (errors, warnings): (Vec<_>, Vec<_>) = diagnostics.into_iter().partition(CompileError::is_error);
    tracing::debug!(
        errors = errors.len(),
        warnings = warnings.len(),
        hoists = generated.hoists.len(),
        "compiled template"
    );

    CompileOutput {
        code: generated.code,
        preamble: generated.preamble,
        helpers: generated.helpers,
        hoists: generated.hoists,
        components: root.components,
        directives: root.directives,
        blocks,
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_reports_without_failing() {
        let output = compile("<div v-else>x</div>", &CompilerOptions::default());
        assert!(output.has_errors());
        assert!(output.code.starts_with("const {"));
    }

    #[test]
    fn test_module_mode_forces_prefixing() {
        let options = CompilerOptions {
            mode: CodegenMode::Module,
            prefix_identifiers: false,
            ..Default::default()
        };
        let output = compile("<p>{{ msg }}</p>", &options);
        assert!(output.code.contains("_ctx.msg"));
        assert!(!output.code.contains("with (_ctx)"));
        assert!(output.code.contains("export function render(_ctx, _cache) {"));
    }
}
