//! `v-bind` with an argument. Argument-less `v-bind="obj"` is merged by
//! [`build_props`](super::build_props).

use super::{compound_around, DirectiveTransformResult, TransformContext};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::helpers::RuntimeHelper;
use crate::js::{JsChildNode, Property};
use crate::utils::camelize;

pub fn transform_bind(dir: &DirectiveNode, _el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let Some(arg) = &dir.arg else {
        return DirectiveTransformResult::default();
    };

    let mut key = if arg.is_static() {
        arg.clone()
    } else {
        compound_around(
            vec![CompoundChild::raw("("), arg.clone().into(), CompoundChild::raw(") || \"\"")],
            arg,
        )
    };

    if dir.has_modifier("camel") {
        key = match key {
            ExpressionNode::Simple(s) if s.is_static => {
                ExpressionNode::simple(camelize(&s.content), true, s.span)
            }
            dynamic => compound_around(
                vec![
                    CompoundChild::Helper(RuntimeHelper::CAMELIZE),
                    CompoundChild::raw("("),
                    dynamic.clone().into(),
                    CompoundChild::raw(")"),
                ],
                &dynamic,
            ),
        };
    }
    if dir.has_modifier("prop") {
        key = inject_prefix(key, ".");
    } else if dir.has_modifier("attr") {
        key = inject_prefix(key, "^");
    }

    let value = match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => JsChildNode::from(exp.clone()),
        _ => {
            ctx.error(ErrorCode::VBindNoExpression, dir.span);
            JsChildNode::string("")
        }
    };

    DirectiveTransformResult::props(vec![Property { key, value }])
}

/// Prefix a key, either statically or with a runtime string concatenation.
fn inject_prefix(key: ExpressionNode, prefix: &str) -> ExpressionNode {
    match key {
        ExpressionNode::Simple(s) if s.is_static => ExpressionNode::simple(format!("{prefix}{}", s.content), true, s.span),
        dynamic => compound_around(
            vec![
                CompoundChild::raw(format!("\"{prefix}\" + (")),
                dynamic.clone().into(),
                CompoundChild::raw(")"),
            ],
            &dynamic,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::process_element_expressions as prepare;
    use pretty_assertions::assert_eq;

    fn bind(source: &str) -> (Vec<Property>, Vec<ErrorCode>) {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(source, &options);
        let mut ctx = TransformContext::new(&options);
        let Some(TemplateChildNode::Element(el)) = root.children.first_mut() else {
            panic!("expected element");
        };
        prepare(el, &mut ctx);
        let Some(PropNode::Directive(dir)) = el.props.first() else {
            panic!("expected directive");
        };
        let result = transform_bind(dir, el, &mut ctx);
        (result.props, ctx.errors.iter().map(|e| e.code).collect())
    }

    fn key_code(prop: &Property) -> String {
        match &prop.key {
            ExpressionNode::Simple(s) if s.is_static => s.content.clone(),
            other => other.code(),
        }
    }

    #[test]
    fn test_static_arg() {
        let (props, errors) = bind(r#"<div :id="uid"/>"#);
        assert!(errors.is_empty());
        assert_eq!(key_code(&props[0]), "id");
        assert!(matches!(&props[0].value, JsChildNode::Simple(s) if s.content == "_ctx.uid"));
    }

    #[test]
    fn test_dynamic_arg_falls_back_to_empty_string() {
        let (props, _) = bind(r#"<div :[key]="value"/>"#);
        assert_eq!(key_code(&props[0]), r#"(_ctx.key) || """#);
    }

    #[test]
    fn test_modifiers() {
        let (props, _) = bind(r#"<div :view-box.camel="box"/>"#);
        assert_eq!(key_code(&props[0]), "viewBox");

        let (props, _) = bind(r#"<div :text-content.prop="text"/>"#);
        assert_eq!(key_code(&props[0]), ".text-content");

        let (props, _) = bind(r#"<div .value="text"/>"#);
        assert_eq!(key_code(&props[0]), ".value");

        let (props, _) = bind(r#"<div :[name].camel="value"/>"#);
        assert_eq!(key_code(&props[0]), r#"_camelize((_ctx.name) || "")"#);

        let (props, _) = bind(r#"<div :label.attr="x"/>"#);
        assert_eq!(key_code(&props[0]), "^label");
    }

    #[test]
    fn test_missing_expression() {
        let (props, errors) = bind(r#"<div :id/>"#);
        assert_eq!(errors, vec![ErrorCode::VBindNoExpression]);
        assert!(matches!(&props[0].value, JsChildNode::Simple(s) if s.is_static && s.content.is_empty()));
    }
}
