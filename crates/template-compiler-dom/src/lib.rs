//! DOM platform layer.
//!
//! Plugs HTML and SVG knowledge into the core compiler through its options:
//! tag tables decide what is a component, and DOM-only directives
//! (`v-show`, `v-html`, `v-text`, `v-cloak`) plus DOM flavors of `v-on`
//! and `v-model` are installed as directive transforms.
//!
//! ```
//! use template_compiler_dom::{compile, dom_options};
//!
//! let output = compile(r#"<button @click.stop="save">Save</button>"#, &dom_options());
//! assert!(output.code.contains("_withModifiers(_ctx.save"));
//! ```

pub mod helpers;
pub mod tags;
pub mod transforms;

use template_compiler_core::{CompileOutput, CompilerOptions, DirectiveTransform, NodeTransform};

/// Add the DOM layer to `options`.
///
/// Directive transforms already present in `options` are kept, so callers
/// can still override any of the DOM ones. DOM node transforms run before
/// the caller's.
pub fn with_dom(mut options: CompilerOptions) -> CompilerOptions {
    options.is_native_tag = Some(tags::is_native_tag);
    options.is_void_tag = tags::is_void_tag;
    options.is_pre_tag = tags::is_pre_tag;

    let mut node_transforms: Vec<NodeTransform> = vec![
        transforms::ignore_side_effect_tags,
        transforms::transform_style,
        transforms::strip_overridden_children,
    ];
    node_transforms.append(&mut options.node_transforms);
    options.node_transforms = node_transforms;

    let directive_transforms: [(&str, DirectiveTransform); 6] = [
        ("cloak", transforms::transform_cloak),
        ("html", transforms::transform_html),
        ("text", transforms::transform_text),
        ("model", transforms::transform_model),
        ("on", transforms::transform_on),
        ("show", transforms::transform_show),
    ];
    for (name, transform) in directive_transforms {
        options.directive_transforms.entry(name.into()).or_insert(transform);
    }
    options
}

/// Default options with the DOM layer.
pub fn dom_options() -> CompilerOptions {
    with_dom(CompilerOptions::default())
}

/// Compile a template for the DOM runtime.
///
/// The DOM layer is added with [`with_dom`] unless `options` already has a
/// native tag check, as [`dom_options`] does.
pub fn compile(source: &str, options: &CompilerOptions) -> CompileOutput {
    let options = if options.is_native_tag.is_some() {
        options.clone()
    } else {
        with_dom(options.clone())
    };
    template_compiler_core::compile(source, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_dom_installs_platform_hooks() {
        let options = dom_options();
        assert!(options.is_native_tag.is_some_and(|native| native("div")));
        assert!((options.is_void_tag)("br"));
        for name in ["show", "html", "text", "cloak", "on", "model"] {
            assert!(options.directive_transforms.contains_key(name), "missing {name}");
        }
        assert_eq!(options.node_transforms.len(), 3);
    }

    #[test]
    fn test_caller_directive_transforms_win() {
        fn custom(
            _dir: &template_compiler_core::ast::DirectiveNode,
            _el: &template_compiler_core::ast::ElementNode,
            _ctx: &mut template_compiler_core::TransformContext<'_>,
        ) -> template_compiler_core::DirectiveTransformResult {
            template_compiler_core::DirectiveTransformResult::default()
        }
        let mut base = CompilerOptions::default();
        base.directive_transforms.insert("show".into(), custom);
        let output = compile(r#"<div v-show="x"></div>"#, &base);
        assert!(!output.code.contains("vShow"));
    }
}
