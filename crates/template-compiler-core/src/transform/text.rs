//! Merging of adjacent text and interpolations.

use super::{Cursor, ExitFn, TransformContext};
use crate::ast::*;
use crate::js::{JsChildNode, PatchFlags, TextCallExpression};
use crate::utils::is_builtin_directive;

/// The kind of node owning a children list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Root,
    /// `plain` when the element has no runtime directives and is not a
    /// component, so a lone text child can be passed as its content.
    Element { plain: bool },
    For,
    Branch,
}

pub(super) fn transform_text(cursor: &mut Cursor<'_>, _ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    if !matches!(cursor.node(), TemplateChildNode::Element(_) | TemplateChildNode::For(_)) {
        return None;
    }
    Some(Box::new(|cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| match cursor.node_mut() {
        TemplateChildNode::Element(el) => {
            let plain = el.tag_type == ElementType::Element
                && !el.props.iter().any(|p| match p {
                    PropNode::Directive(d) => !is_builtin_directive(&d.name) && ctx.directive_transform(&d.name).is_none(),
                    PropNode::Attribute(_) => false,
                });
            merge_text(&mut el.children, ContainerKind::Element { plain }, ctx);
        }
        TemplateChildNode::For(for_node) => merge_text(&mut for_node.children, ContainerKind::For, ctx),
        _ => {}
    }))
}

/// Join runs of text and interpolations into compound expressions, then
/// wrap text in `createTextVNode` calls unless it can be passed directly as
/// the container's content.
pub(crate) fn merge_text(children: &mut Vec<TemplateChildNode>, kind: ContainerKind, ctx: &mut TransformContext<'_>) {
    let mut has_text = false;
    let mut merged: Vec<TemplateChildNode> = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        if !child.is_text() {
            merged.push(child);
            continue;
        }
        has_text = true;
        match merged.last_mut() {
            Some(last) if last.is_text() || matches!(last, TemplateChildNode::Compound(_)) => {
                let previous = std::mem::replace(last, TemplateChildNode::Comment(CommentNode::default()));
                *last = TemplateChildNode::Compound(join(previous, child));
            }
            _ => merged.push(child),
        }
    }
    *children = merged;

    if !has_text {
        return;
    }
    // A lone text child of the root or a plain element is emitted as is.
    if children.len() == 1 && matches!(kind, ContainerKind::Root | ContainerKind::Element { plain: true }) {
        return;
    }

    for child in children.iter_mut() {
        if !matches!(
            child,
            TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_) | TemplateChildNode::Compound(_)
        ) {
            continue;
        }
        let span = child.span();
        let (content, const_type) = match std::mem::replace(child, TemplateChildNode::Comment(CommentNode::default())) {
            TemplateChildNode::Text(text) if text.content == " " => (None, ConstantType::CanStringify),
            TemplateChildNode::Text(text) => (Some(JsChildNode::Text(text)), ConstantType::CanStringify),
            TemplateChildNode::Interpolation(node) => {
                (Some(JsChildNode::Interpolation(node)), ConstantType::NotConstant)
            }
            TemplateChildNode::Compound(compound) => {
                let const_type = compound.const_type;
                (Some(JsChildNode::Compound(compound)), const_type)
            }
            other => {
                *child = other;
                continue;
            }
        };
        let patch_flag = if const_type == ConstantType::NotConstant {
            PatchFlags::TEXT
        } else {
            PatchFlags::NONE
        };
        *child = TemplateChildNode::TextCall(TextCallExpression {
            id: ctx.next_id(),
            content,
            patch_flag,
            span,
        });
    }
}

fn join(previous: TemplateChildNode, next: TemplateChildNode) -> CompoundExpression {
    let mut compound = match previous {
        TemplateChildNode::Compound(compound) => compound,
        other => {
            let span = other.span();
            let mut compound = CompoundExpression::new(Vec::new(), span);
            compound.const_type = text_const_type(&other);
            push_part(&mut compound, other);
            compound
        }
    };
    compound.children.push(CompoundChild::raw(" + "));
    compound.const_type = compound.const_type.min(text_const_type(&next));
    compound.span = compound.span.merge(next.span());
    push_part(&mut compound, next);
    compound
}

fn push_part(compound: &mut CompoundExpression, node: TemplateChildNode) {
    match node {
        TemplateChildNode::Text(text) => {
            compound.source.push_str(&text.content);
            compound.children.push(CompoundChild::Text(text));
        }
        TemplateChildNode::Interpolation(node) => {
            compound.source.push_str(node.content.source());
            compound.children.push(CompoundChild::Interpolation(node));
        }
        _ => {}
    }
}

/// Interpolated values are re-read on every render.
fn text_const_type(node: &TemplateChildNode) -> ConstantType {
    match node {
        TemplateChildNode::Interpolation(_) => ConstantType::NotConstant,
        _ => ConstantType::CanStringify,
    }
}
