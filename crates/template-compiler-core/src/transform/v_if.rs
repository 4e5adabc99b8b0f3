//! `v-if` / `v-else-if` / `v-else` lowering.

use super::{
    children_codegen, comment_placeholder, inject_prop, into_codegen, is_ignorable, key_property, traverse_branch,
    Cursor, ExitFn, TransformContext,
};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::expr::ProcessMode;
use crate::helpers::RuntimeHelper;
use crate::js::{ConditionalExpression, JsChildNode, ObjectExpression, PatchFlags, VNodeCall, VNodeChildren, VNodeTag};

pub(super) fn transform_if(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return None;
    };
    // Conditional slots are handled by the slot builder.
    if el.tag_type == ElementType::Template && el.has_dir("slot") {
        return None;
    }
    if el.has_dir("if") {
        process_if(cursor, ctx)
    } else if el.has_dir("else-if") {
        process_else(cursor, ctx, "else-if")
    } else if el.has_dir("else") {
        process_else(cursor, ctx, "else")
    } else {
        None
    }
}

fn placeholder() -> TemplateChildNode {
    TemplateChildNode::Comment(CommentNode::default())
}

/// Wrap the element in a new conditional node.
fn process_if(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let mut el = match cursor.replace(placeholder()) {
        TemplateChildNode::Element(el) => el,
        other => {
            cursor.replace(other);
            return None;
        }
    };
    let Some(dir) = el.remove_dir("if") else {
        cursor.replace(TemplateChildNode::Element(el));
        return None;
    };

    let condition = branch_condition(&dir, ctx);
    let span = el.span;
    let key = preceding_branch_count(cursor.siblings(), cursor.index());
    cursor.replace(TemplateChildNode::If(IfNode {
        branches: vec![create_branch(el, Some(condition))],
        codegen_node: None,
        span,
    }));

    Some(Box::new(move |cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        if let TemplateChildNode::If(if_node) = cursor.node_mut() {
            let codegen = create_branch_codegen(&if_node.branches[0], key, ctx);
            if_node.codegen_node = Some(codegen);
        }
    }))
}

/// Attach the element as a further branch of the preceding conditional.
fn process_else(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>, name: &str) -> Option<ExitFn> {
    let mut target = None;
    let mut j = cursor.index();
    while j > 0 {
        j -= 1;
        let sibling = &cursor.siblings()[j];
        if is_ignorable(sibling) {
            continue;
        }
        if let TemplateChildNode::If(if_node) = sibling {
            // A chain that already ended in `v-else` takes no more branches.
            if if_node.branches.last().is_some_and(|b| b.condition.is_some()) {
                target = Some(j);
            }
        }
        break;
    }

    let Some(if_index) = target else {
        let span = cursor
            .node()
            .as_element()
            .and_then(|el| el.find_dir(name))
            .map_or_else(|| cursor.node().span(), |dir| dir.span);
        ctx.error(ErrorCode::VElseNoAdjacentIf, span);
        return recover_orphan(cursor, ctx, name);
    };

    for index in (if_index + 1..cursor.index()).rev() {
        cursor.remove_sibling(index);
    }
    let TemplateChildNode::Element(mut el) = cursor.take() else {
        return None;
    };
    let condition = match el.remove_dir(name) {
        Some(dir) if name == "else-if" => Some(branch_condition(&dir, ctx)),
        _ => None,
    };
    let mut branch = create_branch(el, condition);
    let preceding = preceding_branch_count(cursor.siblings(), if_index);
    traverse_branch(&mut branch, ctx);

    if let Some(TemplateChildNode::If(if_node)) = cursor.sibling_mut(if_index) {
        let key = preceding + if_node.branches.len();
        let codegen = create_branch_codegen(&branch, key, ctx);
        if_node.branches.push(branch);
        if let Some(root) = &mut if_node.codegen_node {
            attach_alternate(root, codegen);
        }
    }
    None
}

/// An else-family directive without a conditional to attach to. `v-else-if`
/// starts a new conditional; `v-else` is dropped and the element renders
/// unconditionally.
fn recover_orphan(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>, name: &str) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return None;
    };
    if name == "else-if" {
        for prop in &mut el.props {
            if let PropNode::Directive(dir) = prop {
                if dir.name == "else-if" {
                    dir.name = "if".into();
                }
            }
        }
        process_if(cursor, ctx)
    } else {
        el.remove_dir(name);
        None
    }
}

fn branch_condition(dir: &DirectiveNode, ctx: &mut TransformContext<'_>) -> ExpressionNode {
    match &dir.exp {
        Some(exp) if !exp.source().trim().is_empty() => ctx.process_expression(exp, ProcessMode::Expression),
        _ => {
            ctx.error(ErrorCode::VIfNoExpression, dir.span);
            ExpressionNode::simple("true", false, dir.span)
        }
    }
}

fn create_branch(el: ElementNode, condition: Option<ExpressionNode>) -> IfBranchNode {
    let span = el.span;
    let is_template_if = el.tag_type == ElementType::Template && !el.has_dir("for");
    let children = if is_template_if {
        el.children
    } else {
        vec![TemplateChildNode::Element(el)]
    };
    IfBranchNode {
        condition,
        children,
        is_template_if,
        span,
    }
}

/// Branch keys are unique among the conditionals of a sibling list.
fn preceding_branch_count(siblings: &[TemplateChildNode], index: usize) -> usize {
    siblings[..index]
        .iter()
        .filter_map(|node| match node {
            TemplateChildNode::If(if_node) => Some(if_node.branches.len()),
            _ => None,
        })
        .sum()
}

fn create_branch_codegen(branch: &IfBranchNode, key: usize, ctx: &mut TransformContext<'_>) -> JsChildNode {
    let consequent = create_children_codegen(branch, key, ctx);
    match &branch.condition {
        Some(condition) => JsChildNode::Conditional(Box::new(ConditionalExpression {
            test: condition.clone().into(),
            consequent,
            alternate: comment_placeholder(),
            newline: true,
        })),
        None => consequent,
    }
}

fn create_children_codegen(branch: &IfBranchNode, key: usize, ctx: &mut TransformContext<'_>) -> JsChildNode {
    match branch.children.as_slice() {
        [child @ TemplateChildNode::Element(_)] => {
            let mut codegen = into_codegen(child.clone(), ctx);
            if let JsChildNode::VNodeCall(call) = &mut codegen {
                call.is_block = true;
            }
            inject_prop(&mut codegen, key_property(key));
            codegen
        }
        [child @ TemplateChildNode::For(_)] => {
            let mut codegen = into_codegen(child.clone(), ctx);
            inject_prop(&mut codegen, key_property(key));
            codegen
        }
        children => {
            let mut call = VNodeCall::new(ctx.next_id(), VNodeTag::Helper(RuntimeHelper::FRAGMENT));
            call.props = Some(JsChildNode::Object(ObjectExpression::new(vec![key_property(key)])));
            call.children = Some(VNodeChildren::Nodes(children_codegen(children.to_vec(), ctx)));
            call.patch_flag = PatchFlags::STABLE_FRAGMENT;
            call.is_block = true;
            call.span = branch.span;
            JsChildNode::VNodeCall(Box::new(call))
        }
    }
}

/// Replace the trailing placeholder of a conditional chain.
pub(super) fn attach_alternate(node: &mut JsChildNode, alternate: JsChildNode) {
    if let JsChildNode::Conditional(conditional) = node {
        if matches!(conditional.alternate, JsChildNode::Conditional(_)) {
            attach_alternate(&mut conditional.alternate, alternate);
        } else {
            conditional.alternate = alternate;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{RootNode, TemplateChildNode};
    use crate::error::{CompileError, ErrorCode};
    use crate::js::{ConditionalExpression, JsChildNode};
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::transform;
    use pretty_assertions::assert_eq;

    fn transformed(source: &str) -> (RootNode, Vec<CompileError>) {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(source, &options);
        let errors = transform(&mut root, &options);
        (root, errors)
    }

    fn conditional(node: &JsChildNode) -> &ConditionalExpression {
        match node {
            JsChildNode::Conditional(c) => c,
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    fn simple(node: &JsChildNode) -> &str {
        match node {
            JsChildNode::Simple(s) => &s.content,
            other => panic!("expected simple expression, got {:?}", other),
        }
    }

    fn key_of(node: &JsChildNode) -> String {
        let props = node.as_vnode_call().and_then(|c| c.props.as_ref());
        match props {
            Some(JsChildNode::Object(o)) => match o.get("key").map(|p| &p.value) {
                Some(JsChildNode::Simple(s)) => s.content.clone(),
                other => panic!("unexpected key {:?}", other),
            },
            other => panic!("unexpected props {:?}", other),
        }
    }

    #[test]
    fn test_chain_absorbs_branches() {
        let (root, errors) = transformed(r#"<div v-if="a"/> <!-- x --> <p v-else-if="b"/><span v-else/>"#);
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
        match &root.children[0] {
            TemplateChildNode::If(if_node) => assert_eq!(if_node.branches.len(), 3),
            other => panic!("expected if, got {:?}", other),
        }

        let first = conditional(root.codegen_node.as_ref().expect("codegen"));
        assert_eq!(simple(&first.test), "_ctx.a");
        assert_eq!(key_of(&first.consequent), "0");
        assert!(first.consequent.as_vnode_call().is_some_and(|c| c.is_block));

        let second = conditional(&first.alternate);
        assert_eq!(simple(&second.test), "_ctx.b");
        assert_eq!(key_of(&second.consequent), "1");
        assert_eq!(key_of(&second.alternate), "2");
    }

    #[test]
    fn test_missing_else_renders_comment() {
        let (root, _) = transformed(r#"<div v-if="ok">yes</div>"#);
        let cond = conditional(root.codegen_node.as_ref().expect("codegen"));
        assert!(matches!(&cond.alternate, JsChildNode::Call(call) if call.callee.name() == "createCommentVNode"));
    }

    #[test]
    fn test_keys_unique_across_chains() {
        let (root, _) = transformed(r#"<div><i v-if="a"/><i v-else/><b v-if="c"/></div>"#);
        let div = root.codegen_node.as_ref().and_then(JsChildNode::as_vnode_call).expect("div");
        match &div.children {
            Some(crate::js::VNodeChildren::Nodes(nodes)) => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(key_of(&conditional(&nodes[1]).consequent), "2");
            }
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_template_branch_becomes_keyed_fragment() {
        let (root, _) = transformed(r#"<template v-if="a"><i/><b/></template>"#);
        let cond = conditional(root.codegen_node.as_ref().expect("codegen"));
        let fragment = cond.consequent.as_vnode_call().expect("fragment");
        assert!(fragment.is_fragment());
        assert!(fragment.is_block);
        assert_eq!(key_of(&cond.consequent), "0");
    }

    #[test]
    fn test_user_key_is_kept() {
        let (root, _) = transformed(r#"<div v-if="a" key="mine"/>"#);
        let cond = conditional(root.codegen_node.as_ref().expect("codegen"));
        let props = cond.consequent.as_vnode_call().and_then(|c| c.props.as_ref());
        match props {
            Some(JsChildNode::Object(o)) => {
                assert_eq!(o.properties.len(), 1);
                assert!(matches!(&o.properties[0].value, JsChildNode::Simple(s) if s.content == "mine"));
            }
            other => panic!("unexpected props {:?}", other),
        }
    }

    #[test]
    fn test_orphan_else() {
        let (root, errors) = transformed(r#"<p v-else>x</p>"#);
        assert_eq!(errors.iter().map(|e| e.code).collect::<Vec<_>>(), vec![ErrorCode::VElseNoAdjacentIf]);
        assert!(root.codegen_node.as_ref().and_then(JsChildNode::as_vnode_call).is_some());
    }

    #[test]
    fn test_else_after_completed_chain_starts_fresh() {
        let (root, errors) = transformed(r#"<i v-if="a"/><i v-else/><b v-else-if="c"/>"#);
        assert_eq!(errors.iter().map(|e| e.code).collect::<Vec<_>>(), vec![ErrorCode::VElseNoAdjacentIf]);
        assert_eq!(root.children.len(), 2);
        assert!(matches!(&root.children[1], TemplateChildNode::If(i) if i.branches.len() == 1));
    }

    #[test]
    fn test_missing_condition() {
        let (root, errors) = transformed(r#"<div v-if></div>"#);
        assert_eq!(errors[0].code, ErrorCode::VIfNoExpression);
        let cond = conditional(root.codegen_node.as_ref().expect("codegen"));
        assert_eq!(simple(&cond.test), "true");
    }
}
