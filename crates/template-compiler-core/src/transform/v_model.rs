//! `v-model` lowering to a value prop and an update handler.

use super::{compound_around, DirectiveTransformResult, TransformContext, VarSource};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::expr;
use crate::js::{JsChildNode, Property};

pub fn transform_model(dir: &DirectiveNode, el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let exp = match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => exp,
        _ => {
            ctx.error(ErrorCode::VModelNoExpression, dir.span);
            return DirectiveTransformResult::default();
        }
    };

    let raw = exp.source().trim();
    // Assigning to a loop alias or slot prop would only change a local.
    if ctx.options.prefix_identifiers
        && expr::is_simple_identifier(raw)
        && matches!(ctx.var_source(raw), Some(VarSource::VFor | VarSource::SlotProps))
    {
        ctx.error(ErrorCode::VModelOnScopeVariable, exp.span());
        return DirectiveTransformResult::default();
    }
    if !expr::is_member_expression(raw) {
        ctx.error(ErrorCode::VModelMalformedExpression, exp.span());
        return DirectiveTransformResult::default();
    }

    let (prop_name, event_name) = match &dir.arg {
        Some(ExpressionNode::Simple(arg)) if arg.is_static => (
            ExpressionNode::simple(arg.content.clone(), true, arg.span),
            ExpressionNode::simple(format!("onUpdate:{}", arg.content), true, arg.span),
        ),
        Some(dynamic) => (
            dynamic.clone(),
            compound_around(
                vec![CompoundChild::raw("\"onUpdate:\" + "), dynamic.clone().into()],
                dynamic,
            ),
        ),
        None => (
            ExpressionNode::simple("modelValue", true, dir.span),
            ExpressionNode::simple("onUpdate:modelValue", true, dir.span),
        ),
    };

    let assignment = compound_around(
        vec![
            CompoundChild::raw("$event => (("),
            exp.clone().into(),
            CompoundChild::raw(") = $event)"),
        ],
        exp,
    );

    let mut props = vec![
        Property {
            key: prop_name,
            value: exp.clone().into(),
        },
        Property {
            key: event_name,
            value: assignment.into(),
        },
    ];

    if !dir.modifiers.is_empty() && el.tag_type == ElementType::Component {
        let modifiers = dir
            .modifiers
            .iter()
            .map(|m| {
                let key = if expr::is_simple_identifier(m) {
                    m.to_string()
                } else {
                    json_string(m)
                };
                format!("{key}: true")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let key = match &dir.arg {
            Some(ExpressionNode::Simple(arg)) if arg.is_static => {
                ExpressionNode::simple(format!("{}Modifiers", arg.content), true, arg.span)
            }
            Some(dynamic) => compound_around(
                vec![dynamic.clone().into(), CompoundChild::raw(" + \"Modifiers\"")],
                dynamic,
            ),
            None => ExpressionNode::simple("modelModifiers", true, dir.span),
        };
        let value = SimpleExpression::new(format!("{{ {modifiers} }}"), false, dir.span)
            .with_const_type(ConstantType::CanHoist);
        props.push(Property {
            key,
            value: JsChildNode::Simple(value),
        });
    }

    DirectiveTransformResult::props(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::process_element_expressions as prepare;
    use pretty_assertions::assert_eq;

    fn model(source: &str) -> (Vec<Property>, Vec<CompileError>) {
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
        let result = transform_model(dir, el, &mut ctx);
        (result.props, ctx.errors)
    }

    fn summary(props: &[Property]) -> Vec<(String, String)> {
        props.iter().map(|p| (p.key.code(), value_code(&p.value))).collect()
    }

    fn value_code(value: &JsChildNode) -> String {
        match value {
            JsChildNode::Simple(s) => s.code(),
            JsChildNode::Compound(c) => c.code(),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_default_model() {
        let (props, errors) = model(r#"<input v-model="form.name">"#);
        assert!(errors.is_empty());
        assert_eq!(
            summary(&props),
            vec![
                (r#""modelValue""#.to_string(), "_ctx.form.name".to_string()),
                (r#""onUpdate:modelValue""#.to_string(), "$event => ((_ctx.form.name) = $event)".to_string()),
            ]
        );
    }

    #[test]
    fn test_component_arg_and_modifiers() {
        let (props, _) = model(r#"<Comp v-model:title.trim="title"/>"#);
        assert_eq!(
            summary(&props),
            vec![
                (r#""title""#.to_string(), "_ctx.title".to_string()),
                (r#""onUpdate:title""#.to_string(), "$event => ((_ctx.title) = $event)".to_string()),
                (r#""titleModifiers""#.to_string(), "{ trim: true }".to_string()),
            ]
        );
    }

    #[test]
    fn test_modifiers_ignored_on_elements() {
        let (props, _) = model(r#"<input v-model.lazy="text">"#);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_errors() {
        let (_, errors) = model(r#"<input v-model>"#);
        assert_eq!(errors[0].code, ErrorCode::VModelNoExpression);

        let (_, errors) = model(r#"<input v-model="a + b">"#);
        assert_eq!(errors[0].code, ErrorCode::VModelMalformedExpression);
    }

    #[test]
    fn test_scope_variable_target() {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(r#"<input v-model="item">"#, &options);
        let mut ctx = TransformContext::new(&options);
        ctx.add_var("item", VarSource::VFor);
        let Some(TemplateChildNode::Element(el)) = root.children.first_mut() else {
            panic!("expected element");
        };
        let Some(PropNode::Directive(dir)) = el.props.first() else {
            panic!("expected directive");
        };
        let result = transform_model(dir, el, &mut ctx);
        assert!(result.props.is_empty());
        assert_eq!(ctx.errors[0].code, ErrorCode::VModelOnScopeVariable);
    }
}
