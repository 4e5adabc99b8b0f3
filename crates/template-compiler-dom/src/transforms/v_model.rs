//! `v-model` on native form elements.
//!
//! The core transform produces the value and update-handler props. On a
//! native element the value is applied by a runtime directive picked from
//! the element and its `type`, so the `modelValue` prop is dropped.

use crate::helpers::{V_MODEL_CHECKBOX, V_MODEL_DYNAMIC, V_MODEL_RADIO, V_MODEL_SELECT, V_MODEL_TEXT};
use template_compiler_core::ast::{DirectiveNode, ElementNode, ElementType, PropNode};
use template_compiler_core::transform::transform_model as transform_model_base;
use template_compiler_core::{DirectiveTransformResult, ErrorCode, NeedRuntime, RuntimeHelper, TransformContext};

pub fn transform_model(dir: &DirectiveNode, el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let mut result = transform_model_base(dir, el, ctx);
    if result.props.is_empty() || el.tag_type == ElementType::Component {
        return result;
    }

    if let Some(arg) = &dir.arg {
        ctx.error(ErrorCode::VModelArgOnElement, arg.span());
    }

    let runtime = match el.tag.as_str() {
        "input" => input_directive(dir, el, ctx),
        "select" => Some(V_MODEL_SELECT),
        "textarea" => {
            check_duplicated_value(el, ctx);
            Some(V_MODEL_TEXT)
        }
        _ => {
            ctx.error(ErrorCode::VModelOnInvalidElement, dir.span);
            None
        }
    };
    result.need_runtime = runtime.map(NeedRuntime::Helper);
    result.props.retain(|prop| prop.static_key() != Some("modelValue"));
    result
}

fn input_directive(dir: &DirectiveNode, el: &ElementNode, ctx: &mut TransformContext<'_>) -> Option<RuntimeHelper> {
    match el.find_prop("type", true) {
        Some(PropNode::Directive(_)) => Some(V_MODEL_DYNAMIC),
        Some(PropNode::Attribute(attr)) => match attr.value.as_ref().map(|v| v.content.as_str()) {
            Some("radio") => Some(V_MODEL_RADIO),
            Some("checkbox") => Some(V_MODEL_CHECKBOX),
            Some("file") => {
                ctx.error(ErrorCode::VModelOnFileInputElement, dir.span);
                None
            }
            _ => {
                check_duplicated_value(el, ctx);
                Some(V_MODEL_TEXT)
            }
        },
        // `v-bind="obj"` may carry a type.
        None if has_dynamic_key_bind(el) => Some(V_MODEL_DYNAMIC),
        None => {
            check_duplicated_value(el, ctx);
            Some(V_MODEL_TEXT)
        }
    }
}

fn has_dynamic_key_bind(el: &ElementNode) -> bool {
    el.props.iter().any(|prop| match prop {
        PropNode::Directive(dir) => dir.name == "bind" && dir.arg.as_ref().map_or(true, |arg| !arg.is_static()),
        PropNode::Attribute(_) => false,
    })
}

/// A bound `value` is overwritten by the model.
fn check_duplicated_value(el: &ElementNode, ctx: &mut TransformContext<'_>) {
    let bound = el.props.iter().find_map(|prop| match prop {
        PropNode::Directive(dir) if dir.name == "bind" && dir.static_arg() == Some("value") => Some(dir.span),
        _ => None,
    });
    if let Some(span) = bound {
        ctx.error(ErrorCode::VModelUnnecessaryValue, span);
    }
}
