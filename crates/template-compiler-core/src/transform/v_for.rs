//! `v-for` lowering.

use super::{children_codegen, inject_prop, into_codegen, Cursor, ExitFn, TransformContext, VarSource};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::expr::ProcessMode;
use crate::helpers::RuntimeHelper;
use crate::js::{
    FunctionExpression, JsChildNode, ObjectExpression, PatchFlags, Property, VNodeCall, VNodeChildren, VNodeTag,
};
use once_cell::sync::Lazy;
use regex::Regex;
use template_span::Span;

static FOR_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\s\S]*?)\s+(?:in|of)\s+(\S[\s\S]*)$").expect("valid regex"));
static FOR_ITERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",([^,\}\]]*)(?:,([^,\}\]]*))?$").expect("valid regex"));

pub(super) fn transform_for(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return None;
    };
    // `<template v-for v-slot>` is a dynamic slot, built by the slot builder.
    if !el.has_dir("for") || (el.tag_type == ElementType::Template && el.has_dir("slot")) {
        return None;
    }
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return None;
    };
    let dir = el.remove_dir("for")?;

    let Some(exp) = dir.exp.as_ref().filter(|exp| !exp.source().trim().is_empty()) else {
        ctx.error(ErrorCode::VForNoExpression, dir.span);
        return None;
    };
    let Some(mut parsed) = parse_for_expression(exp) else {
        ctx.error(ErrorCode::VForMalformedExpression, exp.span());
        return None;
    };

    // The source is evaluated outside the loop scope.
    let source = ctx.process_expression(&parsed.source, ProcessMode::Expression);
    let marker = ctx.enter_scope();
    enter_aliases(&mut parsed, ctx);
    ctx.v_for_depth += 1;

    let is_template = el.tag_type == ElementType::Template;
    let has_key = el.find_prop("key", true).is_some();
    let key_prop = if is_template { template_key(el, ctx) } else { None };
    if is_template {
        check_key_placement(el, ctx);
    }

    let is_stable = matches!(&source, ExpressionNode::Simple(s) if s.const_type > ConstantType::NotConstant);
    let fragment_flag = if is_stable {
        PatchFlags::STABLE_FRAGMENT
    } else if has_key {
        PatchFlags::KEYED_FRAGMENT
    } else {
        PatchFlags::UNKEYED_FRAGMENT
    };
    let params = loop_params(&parsed);
    let span = el.span;

    let el = match cursor.replace(TemplateChildNode::Comment(CommentNode::default())) {
        TemplateChildNode::Element(el) => el,
        other => {
            cursor.replace(other);
            return None;
        }
    };
    let children = if is_template {
        el.children
    } else {
        vec![TemplateChildNode::Element(el)]
    };
    cursor.replace(TemplateChildNode::For(ForNode {
        source: source.clone(),
        value_alias: parsed.value,
        key_alias: parsed.key,
        index_alias: parsed.index,
        children,
        codegen_node: None,
        span,
    }));

    Some(Box::new(move |cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        if let TemplateChildNode::For(for_node) = cursor.node_mut() {
            let child = item_codegen(&for_node.children, key_prop, is_template, is_stable, ctx);
            let render_list = JsChildNode::call(
                RuntimeHelper::RENDER_LIST,
                vec![
                    source.into(),
                    JsChildNode::Function(Box::new(FunctionExpression {
                        params,
                        returns: Some(child),
                        newline: true,
                        is_slot: false,
                    })),
                ],
            );
            let mut call = VNodeCall::new(ctx.next_id(), VNodeTag::Helper(RuntimeHelper::FRAGMENT));
            call.children = Some(VNodeChildren::RenderList(Box::new(render_list)));
            call.patch_flag = fragment_flag;
            call.is_block = true;
            call.disable_tracking = !is_stable;
            call.span = span;
            for_node.codegen_node = Some(JsChildNode::VNodeCall(Box::new(call)));
        }
        ctx.exit_scope(marker);
        ctx.v_for_depth -= 1;
    }))
}

/// The node rendered for one item of the list.
fn item_codegen(
    children: &[TemplateChildNode],
    key_prop: Option<Property>,
    is_template: bool,
    is_stable: bool,
    ctx: &mut TransformContext<'_>,
) -> JsChildNode {
    match children {
        [child @ TemplateChildNode::Element(el)] => {
            let mut codegen = into_codegen(child.clone(), ctx);
            if let Some(key) = key_prop.filter(|_| is_template) {
                inject_prop(&mut codegen, key);
            }
            if el.tag_type != ElementType::Slot {
                if let JsChildNode::VNodeCall(call) = &mut codegen {
                    // Items of an unstable list each open their own block.
                    call.is_block = call.is_component || !is_stable;
                }
            }
            codegen
        }
        _ => {
            let mut call = VNodeCall::new(ctx.next_id(), VNodeTag::Helper(RuntimeHelper::FRAGMENT));
            call.props = key_prop.map(|key| JsChildNode::Object(ObjectExpression::new(vec![key])));
            call.children = Some(VNodeChildren::Nodes(children_codegen(children.to_vec(), ctx)));
            call.patch_flag = PatchFlags::STABLE_FRAGMENT;
            call.is_block = true;
            JsChildNode::VNodeCall(Box::new(call))
        }
    }
}

/// The `key` of a `<template v-for>`, evaluated inside the loop scope.
fn template_key(el: &ElementNode, ctx: &mut TransformContext<'_>) -> Option<Property> {
    let value = match el.find_prop("key", true)? {
        PropNode::Attribute(attr) => {
            JsChildNode::string(attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default())
        }
        PropNode::Directive(dir) => ctx.process_expression(dir.exp.as_ref()?, ProcessMode::Expression).into(),
    };
    Some(Property::new("key", value))
}

fn check_key_placement(el: &ElementNode, ctx: &mut TransformContext<'_>) {
    for child in &el.children {
        if let Some(prop) = child.as_element().and_then(|c| c.find_prop("key", true)) {
            ctx.error(ErrorCode::VForTemplateKeyPlacement, prop.span());
        }
    }
}

/// Bring the loop aliases into scope and rewrite the default values inside
/// them.
pub(super) fn enter_aliases(parsed: &mut ForParseResult, ctx: &mut TransformContext<'_>) {
    for alias in [&parsed.value, &parsed.key, &parsed.index].into_iter().flatten() {
        for name in ctx.binding_names(alias) {
            ctx.add_var(name, VarSource::VFor);
        }
    }
    for alias in [&mut parsed.value, &mut parsed.key, &mut parsed.index].into_iter().flatten() {
        *alias = ctx.process_params(alias);
    }
}

/// Callback parameters, with unused leading positions filled by `_`, `__`.
pub(super) fn loop_params(parsed: &ForParseResult) -> Vec<String> {
    let aliases = [&parsed.value, &parsed.key, &parsed.index];
    let used = aliases.iter().rposition(|alias| alias.is_some()).map_or(0, |i| i + 1);
    aliases[..used]
        .iter()
        .enumerate()
        .map(|(i, alias)| match alias {
            Some(alias) => alias.code(),
            None => "_".repeat(i + 1),
        })
        .collect()
}

/// Split `value, key, index in source` into its parts. Returns `None` when
/// the expression has no `in` / `of`.
pub(crate) fn parse_for_expression(exp: &ExpressionNode) -> Option<ForParseResult> {
    let content = exp.source();
    let base = exp.span().start;
    let make = |text: &str, offset: usize| {
        let start = base + offset as u32;
        ExpressionNode::simple(text, false, Span::new(start, start + text.len() as u32))
    };

    let captures = FOR_ALIAS.captures(content)?;
    let lhs = captures.get(1)?;
    let rhs = captures.get(2)?;
    let source = make(rhs.as_str().trim_end(), rhs.start());

    let (mut alias, mut offset) = trimmed(lhs.as_str(), lhs.start());
    if let Some(rest) = alias.strip_prefix('(') {
        alias = rest;
        offset += 1;
    }
    if let Some(rest) = alias.strip_suffix(')') {
        alias = rest;
    }

    let mut value_text = alias;
    let mut key = None;
    let mut index = None;
    if let Some(iterator) = FOR_ITERATOR.captures(alias) {
        value_text = &alias[..iterator.get(0)?.start()];
        let part = |m: Option<regex::Match<'_>>| {
            let m = m?;
            let (text, at) = trimmed(m.as_str(), offset + m.start());
            (!text.is_empty()).then(|| make(text, at))
        };
        key = part(iterator.get(1));
        index = part(iterator.get(2));
    }
    let (value_text, value_offset) = trimmed(value_text, offset);
    let value = (!value_text.is_empty()).then(|| make(value_text, value_offset));

    Some(ForParseResult {
        source,
        value,
        key,
        index,
    })
}

fn trimmed(text: &str, offset: usize) -> (&str, usize) {
    let start = text.trim_start();
    (start.trim_end(), offset + text.len() - start.len())
}
