//! `v-on` with an event argument. Argument-less `v-on="handlers"` becomes
//! `toHandlers` in [`build_props`](super::build_props).

use super::{compound_around, DirectiveTransformResult, TransformContext, VarSource};
use crate::ast::*;
use crate::expr::{self, ProcessMode};
use crate::helpers::RuntimeHelper;
use crate::js::{JsChildNode, Property};
use crate::utils::{camelize, to_handler_key};

pub fn transform_on(dir: &DirectiveNode, el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let Some(arg) = &dir.arg else {
        return DirectiveTransformResult::default();
    };

    let key = match arg {
        ExpressionNode::Simple(s) if s.is_static => {
            let raw = match s.content.strip_prefix("vue:") {
                Some(hook) => format!("vnode-{hook}"),
                None => s.content.clone(),
            };
            // Elements keep case-sensitive custom event names as `on:Name`.
            let name = if el.tag_type != ElementType::Element
                || raw.starts_with("vnode")
                || !raw.chars().any(|c| c.is_ascii_uppercase())
            {
                to_handler_key(&camelize(&raw))
            } else {
                format!("on:{raw}")
            };
            let mut key = SimpleExpression::new(name, true, s.span);
            key.source = s.source.clone();
            ExpressionNode::Simple(key)
        }
        dynamic => compound_around(
            vec![
                CompoundChild::Helper(RuntimeHelper::TO_HANDLER_KEY),
                CompoundChild::raw("("),
                dynamic.clone().into(),
                CompoundChild::raw(")"),
            ],
            dynamic,
        ),
    };

    let value = match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => handler(exp, ctx),
        _ => JsChildNode::simple("() => {}"),
    };

    DirectiveTransformResult::props(vec![Property { key, value }])
}

/// Member paths and function expressions are passed through; anything else
/// is an inline statement wrapped in an arrow function receiving `$event`.
fn handler(exp: &ExpressionNode, ctx: &mut TransformContext<'_>) -> JsChildNode {
    let source = exp.source();
    if expr::is_member_expression(source) || expr::is_function_expression(source) {
        return ctx.process_expression(exp, ProcessMode::Expression).into();
    }

    let multiple = expr::has_multiple_statements(source);
    let marker = ctx.enter_scope();
    ctx.add_var("$event", VarSource::Handler);
    let body = ctx.process_expression(exp, ProcessMode::Statements);
    ctx.exit_scope(marker);

    let (open, close) = if multiple { ("{", "}") } else { ("(", ")") };
    compound_around(
        vec![
            CompoundChild::raw(format!("$event => {open}")),
            body.into(),
            CompoundChild::raw(close),
        ],
        exp,
    )
    .into()
}
