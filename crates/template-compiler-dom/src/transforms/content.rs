//! `v-html`, `v-text` and elements the DOM layer drops.

use template_compiler_core::ast::{ConstantType, DirectiveNode, ElementNode, ElementType, TemplateChildNode};
use template_compiler_core::js::{JsChildNode, Property};
use template_compiler_core::{Cursor, DirectiveTransformResult, ErrorCode, ExitFn, RuntimeHelper, TransformContext};

pub fn transform_html(dir: &DirectiveNode, _el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let value = match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => JsChildNode::from(exp.clone()),
        _ => {
            ctx.error(ErrorCode::VHtmlNoExpression, dir.span);
            JsChildNode::string("")
        }
    };
    DirectiveTransformResult::props(vec![Property::new("innerHTML", value)])
}

pub fn transform_text(dir: &DirectiveNode, _el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let value = match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => {
            if exp.const_type() > ConstantType::NotConstant {
                JsChildNode::from(exp.clone())
            } else {
                JsChildNode::call(RuntimeHelper::TO_DISPLAY_STRING, vec![exp.clone().into()])
            }
        }
        _ => {
            ctx.error(ErrorCode::VTextNoExpression, dir.span);
            JsChildNode::string("")
        }
    };
    DirectiveTransformResult::props(vec![Property::new("textContent", value)])
}

/// Children of a `v-html` or `v-text` element would be overwritten at
/// runtime, so they are dropped.
pub fn strip_overridden_children(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return None;
    };
    if el.children.is_empty() {
        return None;
    }
    let (code, span) = if let Some(dir) = el.find_dir("html") {
        (ErrorCode::VHtmlWithChildren, dir.span)
    } else if let Some(dir) = el.find_dir("text") {
        (ErrorCode::VTextWithChildren, dir.span)
    } else {
        return None;
    };
    el.children.clear();
    ctx.error(code, span);
    None
}

/// `<script>` and `<style>` in a template never run; remove them.
pub fn ignore_side_effect_tags(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let span = match cursor.node() {
        TemplateChildNode::Element(el)
            if el.tag_type == ElementType::Element && matches!(el.tag.as_str(), "script" | "style") =>
        {
            tracing::debug!(tag = %el.tag, "dropping side-effect tag");
            el.span
        }
        _ => return None,
    };
    ctx.error(ErrorCode::IgnoredSideEffectTag, span);
    cursor.take();
    None
}
