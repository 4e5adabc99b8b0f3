//! `<slot>` outlets lowered to `renderSlot` calls.

use super::{build_props, children_codegen, Cursor, ExitFn, TransformContext};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::helpers::RuntimeHelper;
use crate::js::{ArrayExpression, FunctionExpression, JsChildNode};
use crate::utils::camelize;

pub(super) fn transform_slot_outlet(cursor: &mut Cursor<'_>, _ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    match cursor.node() {
        TemplateChildNode::Element(el) if el.tag_type == ElementType::Slot => {}
        _ => return None,
    }
    Some(Box::new(|cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        if let TemplateChildNode::Element(el) = cursor.node_mut() {
            let call = lower_slot_outlet(el, ctx);
            el.codegen_node = Some(call);
        }
    }))
}

/// `renderSlot($slots, name, props, fallback)` with trailing defaults
/// dropped.
fn lower_slot_outlet(el: &ElementNode, ctx: &mut TransformContext<'_>) -> JsChildNode {
    let mut name = JsChildNode::string("default");
    let mut other_props = Vec::new();

    for prop in &el.props {
        match prop {
            PropNode::Attribute(attr) if attr.name == "name" && attr.value.is_some() => {
                let value = attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default();
                name = JsChildNode::string(value);
            }
            PropNode::Attribute(attr) => {
                let mut attr = attr.clone();
                attr.name = camelize(&attr.name).into();
                other_props.push(PropNode::Attribute(attr));
            }
            PropNode::Directive(dir) if dir.name == "bind" && dir.static_arg() == Some("name") => {
                if let Some(exp) = &dir.exp {
                    name = exp.clone().into();
                }
            }
            PropNode::Directive(dir) => {
                let mut dir = dir.clone();
                if dir.name == "bind" {
                    if let Some(ExpressionNode::Simple(arg)) = &mut dir.arg {
                        if arg.is_static {
                            arg.content = camelize(&arg.content);
                        }
                    }
                }
                other_props.push(PropNode::Directive(dir));
            }
        }
    }

    let slots = if ctx.options.prefix_identifiers {
        "_ctx.$slots"
    } else {
        "$slots"
    };
    let mut args = vec![JsChildNode::simple(slots), name];

    let props = if other_props.is_empty() {
        None
    } else {
        let result = build_props(el, &other_props, ctx);
        if let Some(directive) = result.directives.first() {
            ctx.error(ErrorCode::VSlotUnexpectedDirectiveOnSlotOutlet, directive.dir.span);
        }
        result.props
    };

    let fallback = (!el.children.is_empty()).then(|| {
        let elements = children_codegen(el.children.clone(), ctx);
        JsChildNode::Function(Box::new(FunctionExpression {
            params: Vec::new(),
            returns: Some(JsChildNode::Array(ArrayExpression { elements })),
            newline: false,
            is_slot: false,
        }))
    });

    match (props, fallback) {
        (Some(props), fallback) => {
            args.push(props);
            args.extend(fallback);
        }
        (None, Some(fallback)) => {
            args.push(JsChildNode::simple("{}"));
            args.push(fallback);
        }
        (None, None) => {}
    }

    JsChildNode::call(RuntimeHelper::RENDER_SLOT, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::js::{CallExpression, ObjectExpression};
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::transform;
    use pretty_assertions::assert_eq;

    fn outlet_with(source: &str, options: &CompilerOptions) -> (CallExpression, Vec<CompileError>) {
        let (mut root, _) = parse(source, options);
        let errors = transform(&mut root, options);
        match root.codegen_node {
            Some(JsChildNode::Call(call)) => (call, errors),
            other => panic!("expected renderSlot, got {:?}", other),
        }
    }

    fn outlet(source: &str) -> (CallExpression, Vec<CompileError>) {
        outlet_with(source, &CompilerOptions::default())
    }

    fn code(node: &JsChildNode) -> String {
        match node {
            JsChildNode::Simple(s) => s.code(),
            other => panic!("expected simple expression, got {:?}", other),
        }
    }

    #[test]
    fn test_default_slot() {
        let (call, errors) = outlet("<slot/>");
        assert!(errors.is_empty());
        assert_eq!(call.callee, RuntimeHelper::RENDER_SLOT);
        assert_eq!(call.args.iter().map(code).collect::<Vec<_>>(), vec!["_ctx.$slots", r#""default""#]);
    }

    #[test]
    fn test_named_slot_with_props() {
        let (call, _) = outlet(r#"<slot name="header" :item="x" foo-bar="1"/>"#);
        assert_eq!(call.args.len(), 3);
        assert_eq!(code(&call.args[1]), r#""header""#);
        match &call.args[2] {
            JsChildNode::Object(ObjectExpression { properties }) => {
                let keys: Vec<_> = properties.iter().filter_map(|p| p.static_key()).collect();
                assert_eq!(keys, vec!["item", "fooBar"]);
            }
            other => panic!("expected props object, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_name_and_fallback() {
        let (call, _) = outlet(r#"<slot :name="n">fallback</slot>"#);
        assert_eq!(call.args.len(), 4);
        assert_eq!(code(&call.args[1]), "_ctx.n");
        assert_eq!(code(&call.args[2]), "{}");
        assert!(matches!(&call.args[3], JsChildNode::Function(f) if f.params.is_empty() && !f.is_slot));
    }

    #[test]
    fn test_directive_on_outlet() {
        let (_, errors) = outlet(r#"<slot v-focus/>"#);
        assert_eq!(
            errors.iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![ErrorCode::VSlotUnexpectedDirectiveOnSlotOutlet]
        );
    }

    #[test]
    fn test_unprefixed_slots() {
        let options = CompilerOptions {
            prefix_identifiers: false,
            ..Default::default()
        };
        let (call, _) = outlet_with("<slot/>", &options);
        assert_eq!(code(&call.args[0]), "$slots");
    }
}
