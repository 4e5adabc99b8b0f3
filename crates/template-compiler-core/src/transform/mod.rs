//! Node transform pipeline.
//!
//! Transforms are plain functions run pre-order over the content AST. Each
//! may return an exit callback; exits run post-order, in reverse order of
//! registration, once the node's children have been transformed.

mod element;
mod expression;
mod slot_outlet;
mod slots;
mod text;
mod v_bind;
mod v_for;
mod v_if;
mod v_model;
mod v_on;

pub use element::{build_props, PropsResult, RuntimeDirective};
pub use v_bind::transform_bind;
pub use v_model::transform_model;
pub use v_on::transform_on;

use crate::ast::*;
use crate::error::{CompileError, ErrorCode};
use crate::expr::{self, ProcessMode};
use crate::helpers::RuntimeHelper;
use crate::js::{JsChildNode, NodeId, ObjectExpression, PatchFlags, Property, VNodeCall, VNodeChildren, VNodeTag};
use crate::options::CompilerOptions;
use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;
use std::rc::Rc;
use template_span::Span;
use text::ContainerKind;

/// A node transform. Runs when a node is entered.
pub type NodeTransform = fn(&mut Cursor<'_>, &mut TransformContext<'_>) -> Option<ExitFn>;

/// Deferred work run when a node is exited.
pub type ExitFn = Box<dyn FnOnce(&mut Cursor<'_>, &mut TransformContext<'_>)>;

/// Lowers one directive of an element into props.
pub type DirectiveTransform =
    fn(&DirectiveNode, &ElementNode, &mut TransformContext<'_>) -> DirectiveTransformResult;

/// Output of a [`DirectiveTransform`].
#[derive(Debug, Clone, Default)]
pub struct DirectiveTransformResult {
    pub props: Vec<Property>,
    /// Keep the directive at runtime through `withDirectives`.
    pub need_runtime: Option<NeedRuntime>,
}

impl DirectiveTransformResult {
    pub fn props(props: Vec<Property>) -> Self {
        Self {
            props,
            need_runtime: None,
        }
    }
}

/// How a runtime directive is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedRuntime {
    /// `resolveDirective(name)` in the render function.
    Resolve,
    /// A directive exported by the runtime, such as `vShow`.
    Helper(RuntimeHelper),
}

/// Position of the node being transformed within its sibling list.
pub struct Cursor<'n> {
    siblings: &'n mut Vec<TemplateChildNode>,
    index: usize,
    removed: bool,
}

impl<'n> Cursor<'n> {
    pub fn new(siblings: &'n mut Vec<TemplateChildNode>, index: usize) -> Self {
        Self {
            siblings,
            index,
            removed: false,
        }
    }

    pub fn node(&self) -> &TemplateChildNode {
        &self.siblings[self.index]
    }

    pub fn node_mut(&mut self) -> &mut TemplateChildNode {
        &mut self.siblings[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn siblings(&self) -> &[TemplateChildNode] {
        self.siblings
    }

    pub fn sibling_mut(&mut self, index: usize) -> Option<&mut TemplateChildNode> {
        self.siblings.get_mut(index)
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Replace the current node, returning the old one.
    pub fn replace(&mut self, node: TemplateChildNode) -> TemplateChildNode {
        std::mem::replace(&mut self.siblings[self.index], node)
    }

    /// Remove the current node. No further transforms or exits run for it.
    pub fn take(&mut self) -> TemplateChildNode {
        self.removed = true;
        self.siblings.remove(self.index)
    }

    /// Remove a sibling other than the current node.
    pub fn remove_sibling(&mut self, index: usize) -> TemplateChildNode {
        debug_assert_ne!(index, self.index);
        if index < self.index {
            self.index -= 1;
        }
        self.siblings.remove(index)
    }

    fn next_index(&self) -> usize {
        if self.removed {
            self.index
        } else {
            self.index + 1
        }
    }
}

/// Where a scope variable was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarSource {
    VFor,
    SlotProps,
    /// `$event` inside an inline handler.
    Handler,
}

/// A name bound by an enclosing template construct.
#[derive(Debug, Clone)]
pub struct ScopeVar {
    pub name: SmolStr,
    pub source: VarSource,
}

/// State shared by all transforms of one compile.
pub struct TransformContext<'a> {
    pub options: &'a CompilerOptions,
    node_transforms: Rc<[NodeTransform]>,
    directive_transforms: IndexMap<SmolStr, DirectiveTransform>,
    /// Names in scope, innermost last.
    pub scope_vars: Vec<ScopeVar>,
    /// Components resolved at runtime.
    pub components: IndexSet<SmolStr>,
    /// Custom directives resolved at runtime.
    pub directives: IndexSet<SmolStr>,
    pub errors: Vec<CompileError>,
    next_id: u32,
    pub(crate) v_for_depth: usize,
    pub(crate) v_slot_depth: usize,
}

impl<'a> TransformContext<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        let mut node_transforms: Vec<NodeTransform> = vec![
            v_if::transform_if,
            v_for::transform_for,
            expression::transform_expression,
            slot_outlet::transform_slot_outlet,
            element::transform_element,
            slots::track_slot_scopes,
            slots::track_v_for_slot_scopes,
            text::transform_text,
        ];
        node_transforms.extend(options.node_transforms.iter().copied());

        let mut directive_transforms: IndexMap<SmolStr, DirectiveTransform> = IndexMap::new();
        directive_transforms.insert("bind".into(), transform_bind);
        directive_transforms.insert("on".into(), transform_on);
        directive_transforms.insert("model".into(), transform_model);
        for (name, transform) in &options.directive_transforms {
            directive_transforms.insert(name.clone(), *transform);
        }

        Self {
            options,
            node_transforms: node_transforms.into(),
            directive_transforms,
            scope_vars: Vec::new(),
            components: IndexSet::new(),
            directives: IndexSet::new(),
            errors: Vec::new(),
            next_id: 0,
            v_for_depth: 0,
            v_slot_depth: 0,
        }
    }

    /// Allocate an id for a vnode or text call.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn directive_transform(&self, name: &str) -> Option<DirectiveTransform> {
        self.directive_transforms.get(name).copied()
    }

    /// Add a scope variable.
    pub fn add_var(&mut self, name: impl Into<SmolStr>, source: VarSource) {
        self.scope_vars.push(ScopeVar {
            name: name.into(),
            source,
        });
    }

    /// Check if a variable is in scope.
    pub fn has_var(&self, name: &str) -> bool {
        self.scope_vars.iter().any(|v| v.name == name)
    }

    /// Get a variable's source.
    pub fn var_source(&self, name: &str) -> Option<VarSource> {
        self.scope_vars
            .iter()
            .rev()
            .find(|v| v.name == name)
            .map(|v| v.source)
    }

    /// Enter a new scope, returning a marker.
    pub fn enter_scope(&mut self) -> usize {
        self.scope_vars.len()
    }

    /// Exit a scope, removing variables added since the marker.
    pub fn exit_scope(&mut self, marker: usize) {
        self.scope_vars.truncate(marker);
    }

    /// Record a component usage.
    pub fn use_component(&mut self, name: impl Into<SmolStr>) {
        self.components.insert(name.into());
    }

    /// Record a directive usage.
    pub fn use_directive(&mut self, name: impl Into<SmolStr>) {
        self.directives.insert(name.into());
    }

    pub fn report(&mut self, error: CompileError) {
        self.options.report(&error);
        self.errors.push(error);
    }

    pub fn error(&mut self, code: ErrorCode, span: Span) {
        self.report(CompileError::new(code, span));
    }

    /// Rewrite an expression against the current scope. Syntax errors are
    /// reported and the expression is returned unrewritten.
    pub fn process_expression(&mut self, exp: &ExpressionNode, mode: ProcessMode) -> ExpressionNode {
        let ExpressionNode::Simple(simple) = exp else {
            return exp.clone();
        };
        let scope_vars = &self.scope_vars;
        let is_known = |name: &str| scope_vars.iter().any(|v| v.name == name);
        match expr::process_expression(simple, &is_known, self.options.prefix_identifiers, mode) {
            Ok(processed) => processed,
            Err(err) => {
                let start = (simple.span.start + err.offset as u32).min(simple.span.end);
                self.report(CompileError::with_message(
                    ErrorCode::InvalidExpression,
                    format!("Error parsing JavaScript expression: {}", err.message),
                    Span::new(start, simple.span.end),
                ));
                ExpressionNode::Simple(simple.clone().with_const_type(ConstantType::NotConstant))
            }
        }
    }

    /// Rewrite the default values of a parameter pattern. Syntax errors are
    /// left to [`binding_names`](Self::binding_names), which reports them.
    pub fn process_params(&self, exp: &ExpressionNode) -> ExpressionNode {
        let ExpressionNode::Simple(simple) = exp else {
            return exp.clone();
        };
        let scope_vars = &self.scope_vars;
        let is_known = |name: &str| scope_vars.iter().any(|v| v.name == name);
        expr::process_expression(simple, &is_known, self.options.prefix_identifiers, ProcessMode::Params)
            .unwrap_or_else(|_| exp.clone())
    }

    /// Names bound by a parameter pattern. Syntax errors are reported.
    pub fn binding_names(&mut self, exp: &ExpressionNode) -> Vec<String> {
        match expr::binding_names(exp.source()) {
            Ok(names) => names,
            Err(err) => {
                let span = exp.span();
                self.report(CompileError::with_message(
                    ErrorCode::InvalidExpression,
                    format!("Error parsing JavaScript expression: {}", err.message),
                    span,
                ));
                Vec::new()
            }
        }
    }
}

/// Run the pipeline over a parsed template, attaching codegen descriptors.
pub fn transform(root: &mut RootNode, options: &CompilerOptions) -> Vec<CompileError> {
    let mut ctx = TransformContext::new(options);

    traverse_children(&mut root.children, &mut ctx);
    text::merge_text(&mut root.children, ContainerKind::Root, &mut ctx);
    root.codegen_node = create_root_codegen(&root.children, &mut ctx);

    root.components = ctx.components.into_iter().collect();
    root.directives = ctx.directives.into_iter().collect();
    tracing::debug!(
        components = root.components.len(),
        directives = root.directives.len(),
        errors = ctx.errors.len(),
        "transformed template"
    );
    ctx.errors
}

pub(crate) fn traverse_children(children: &mut Vec<TemplateChildNode>, ctx: &mut TransformContext<'_>) {
    let mut index = 0;
    while index < children.len() {
        let mut cursor = Cursor::new(children, index);
        traverse_node(&mut cursor, ctx);
        index = cursor.next_index();
    }
}

pub(crate) fn traverse_node(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) {
    let transforms = Rc::clone(&ctx.node_transforms);
    let mut exits = Vec::new();
    for transform in transforms.iter() {
        if let Some(exit) = transform(cursor, ctx) {
            exits.push(exit);
        }
        if cursor.is_removed() {
            return;
        }
    }

    match cursor.node_mut() {
        TemplateChildNode::Element(el) => traverse_children(&mut el.children, ctx),
        TemplateChildNode::For(for_node) => traverse_children(&mut for_node.children, ctx),
        TemplateChildNode::If(if_node) => {
            for branch in &mut if_node.branches {
                traverse_branch(branch, ctx);
            }
        }
        _ => {}
    }

    for exit in exits.into_iter().rev() {
        exit(cursor, ctx);
    }
}

/// Branches are traversed like nodes: children first, then text merging.
pub(crate) fn traverse_branch(branch: &mut IfBranchNode, ctx: &mut TransformContext<'_>) {
    traverse_children(&mut branch.children, ctx);
    text::merge_text(&mut branch.children, ContainerKind::Branch, ctx);
}

fn create_root_codegen(children: &[TemplateChildNode], ctx: &mut TransformContext<'_>) -> Option<JsChildNode> {
    match children {
        [] => None,
        [child] => Some(into_codegen(child.clone(), ctx)),
        _ => {
            let mut call = VNodeCall::new(ctx.next_id(), VNodeTag::Helper(RuntimeHelper::FRAGMENT));
            call.children = Some(VNodeChildren::Nodes(children_codegen(children.to_vec(), ctx)));
            call.patch_flag = PatchFlags::STABLE_FRAGMENT;
            call.is_block = true;
            Some(JsChildNode::VNodeCall(Box::new(call)))
        }
    }
}

/// The descriptor emitted for a child node.
pub(crate) fn into_codegen(node: TemplateChildNode, ctx: &mut TransformContext<'_>) -> JsChildNode {
    match node {
        TemplateChildNode::Element(el) => match el.codegen_node {
            Some(codegen) => codegen,
            None => {
                // Elements the element transform skips, such as a misplaced
                // `<template v-slot>`, render their children in a fragment.
                let mut call = VNodeCall::new(ctx.next_id(), VNodeTag::Helper(RuntimeHelper::FRAGMENT));
                call.children = Some(VNodeChildren::Nodes(children_codegen(el.children, ctx)));
                call.patch_flag = PatchFlags::STABLE_FRAGMENT;
                call.span = el.span;
                JsChildNode::VNodeCall(Box::new(call))
            }
        },
        TemplateChildNode::Text(text) => JsChildNode::Text(text),
        TemplateChildNode::Interpolation(node) => JsChildNode::Interpolation(node),
        TemplateChildNode::Comment(comment) => JsChildNode::Comment(comment),
        TemplateChildNode::If(if_node) => if_node.codegen_node.unwrap_or_else(comment_placeholder),
        TemplateChildNode::For(for_node) => for_node
            .codegen_node
            .unwrap_or_else(|| JsChildNode::simple("null")),
        TemplateChildNode::TextCall(call) => JsChildNode::TextCall(Box::new(call)),
        TemplateChildNode::Compound(compound) => JsChildNode::Compound(compound),
    }
}

pub(crate) fn children_codegen(children: Vec<TemplateChildNode>, ctx: &mut TransformContext<'_>) -> Vec<JsChildNode> {
    children.into_iter().map(|child| into_codegen(child, ctx)).collect()
}

/// `createCommentVNode("v-if", true)`, rendered for a failed condition.
pub(crate) fn comment_placeholder() -> JsChildNode {
    JsChildNode::call(
        RuntimeHelper::CREATE_COMMENT,
        vec![JsChildNode::string("v-if"), JsChildNode::simple("true")],
    )
}

/// Add a property to a vnode or `renderSlot` call, unless a property with
/// the same static key is already present.
pub(crate) fn inject_prop(node: &mut JsChildNode, prop: Property) {
    match node {
        JsChildNode::VNodeCall(call) => {
            call.props = Some(inject_into(call.props.take(), prop));
        }
        JsChildNode::Call(call) if call.callee == RuntimeHelper::RENDER_SLOT => {
            while call.args.len() < 3 {
                call.args.push(JsChildNode::simple("{}"));
            }
            let existing = std::mem::replace(&mut call.args[2], JsChildNode::simple("{}"));
            let existing = match existing {
                JsChildNode::Simple(s) if s.content == "{}" => None,
                other => Some(other),
            };
            call.args[2] = inject_into(existing, prop);
        }
        _ => {}
    }
}

fn inject_into(existing: Option<JsChildNode>, prop: Property) -> JsChildNode {
    let has_key = |object: &ObjectExpression, prop: &Property| match prop.static_key() {
        Some(key) => object.get(key).is_some(),
        None => false,
    };
    let Some(props) = existing else {
        return JsChildNode::Object(ObjectExpression::new(vec![prop]));
    };
    match props {
        JsChildNode::Call(mut call) if call.callee == RuntimeHelper::NORMALIZE_PROPS && !call.args.is_empty() => {
            let inner = match call.args.remove(0) {
                JsChildNode::Call(guard) if guard.callee == RuntimeHelper::GUARD_REACTIVE_PROPS => {
                    guard.args.into_iter().next()
                }
                other => Some(other),
            };
            call.args.insert(0, inject_into(inner, prop));
            JsChildNode::Call(call)
        }
        JsChildNode::Object(mut object) => {
            if !has_key(&object, &prop) {
                object.properties.insert(0, prop);
            }
            JsChildNode::Object(object)
        }
        JsChildNode::Call(mut call) if call.callee == RuntimeHelper::MERGE_PROPS => {
            if let Some(JsChildNode::Object(first)) = call.args.first_mut() {
                if !has_key(first, &prop) {
                    first.properties.insert(0, prop);
                }
            } else {
                call.args.insert(0, JsChildNode::Object(ObjectExpression::new(vec![prop])));
            }
            JsChildNode::Call(call)
        }
        other => JsChildNode::call(
            RuntimeHelper::MERGE_PROPS,
            vec![JsChildNode::Object(ObjectExpression::new(vec![prop])), other],
        ),
    }
}

/// The `key` property injected into conditional branches and fragments.
pub(crate) fn key_property(key: usize) -> Property {
    Property::new(
        "key",
        JsChildNode::Simple(
            SimpleExpression::new(key.to_string(), false, Span::default()).with_const_type(ConstantType::CanHoist),
        ),
    )
}

/// A compound expression wrapping `exp`, keeping its source and span.
pub(crate) fn compound_around(children: Vec<CompoundChild>, exp: &ExpressionNode) -> ExpressionNode {
    let mut compound = CompoundExpression::new(children, exp.span());
    compound.source = exp.source().to_string();
    ExpressionNode::Compound(compound)
}

/// `<template>` carrying a structural or slot directive.
pub(crate) fn is_template_node(node: &TemplateChildNode) -> bool {
    matches!(node, TemplateChildNode::Element(el) if el.tag_type == ElementType::Template)
}

/// Whitespace text and comments, which do not separate structural siblings.
pub(crate) fn is_ignorable(node: &TemplateChildNode) -> bool {
    match node {
        TemplateChildNode::Comment(_) => true,
        TemplateChildNode::Text(text) => text.content.trim().is_empty(),
        _ => false,
    }
}

/// Run the expression transform over a detached element.
#[cfg(test)]
pub(crate) fn process_element_expressions(el: &mut ElementNode, ctx: &mut TransformContext<'_>) {
    let mut siblings = vec![TemplateChildNode::Element(el.clone())];
    let mut cursor = Cursor::new(&mut siblings, 0);
    expression::transform_expression(&mut cursor, ctx);
    if let Some(TemplateChildNode::Element(processed)) = siblings.pop() {
        *el = processed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn transformed(source: &str) -> (RootNode, Vec<CompileError>) {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(source, &options);
        let errors = transform(&mut root, &options);
        (root, errors)
    }

    #[test]
    fn test_cursor_removal_adjusts_index() {
        let mut siblings = vec![
            TemplateChildNode::Text(TextNode::new("a", Span::default())),
            TemplateChildNode::Text(TextNode::new("b", Span::default())),
            TemplateChildNode::Text(TextNode::new("c", Span::default())),
        ];
        let mut cursor = Cursor::new(&mut siblings, 2);
        cursor.remove_sibling(0);
        assert_eq!(cursor.index(), 1);
        assert!(matches!(cursor.node(), TemplateChildNode::Text(t) if t.content == "c"));
        cursor.take();
        assert_eq!(cursor.next_index(), 1);
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn test_scope_markers() {
        let options = CompilerOptions::default();
        let mut ctx = TransformContext::new(&options);
        let marker = ctx.enter_scope();
        ctx.add_var("item", VarSource::VFor);
        assert!(ctx.has_var("item"));
        assert_eq!(ctx.var_source("item"), Some(VarSource::VFor));
        ctx.exit_scope(marker);
        assert!(!ctx.has_var("item"));
    }

    #[test]
    fn test_inject_prop_shapes() {
        let key = || key_property(0);

        let mut empty = JsChildNode::VNodeCall(Box::new(VNodeCall::new(NodeId(0), VNodeTag::Literal("div".into()))));
        inject_prop(&mut empty, key());
        let props = empty.as_vnode_call().and_then(|c| c.props.as_ref());
        assert!(matches!(props, Some(JsChildNode::Object(o)) if o.get("key").is_some()));

        let guarded = JsChildNode::call(
            RuntimeHelper::NORMALIZE_PROPS,
            vec![JsChildNode::call(RuntimeHelper::GUARD_REACTIVE_PROPS, vec![JsChildNode::simple("_ctx.attrs")])],
        );
        let injected = inject_into(Some(guarded), key());
        match injected {
            JsChildNode::Call(normalize) => {
                assert_eq!(normalize.callee, RuntimeHelper::NORMALIZE_PROPS);
                assert!(matches!(&normalize.args[0], JsChildNode::Call(m) if m.callee == RuntimeHelper::MERGE_PROPS));
            }
            other => panic!("expected call, got {:?}", other),
        }

        let existing = JsChildNode::Object(ObjectExpression::new(vec![Property::new("key", JsChildNode::simple("id"))]));
        match inject_into(Some(existing), key()) {
            JsChildNode::Object(object) => assert_eq!(object.properties.len(), 1),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_root_codegen_shapes() {
        let (root, errors) = transformed("");
        assert!(errors.is_empty());
        assert!(root.codegen_node.is_none());

        let (root, _) = transformed("<div/><span/>");
        let call = root.codegen_node.as_ref().and_then(JsChildNode::as_vnode_call).expect("fragment");
        assert!(call.is_fragment());
        assert!(call.is_block);
        assert_eq!(call.patch_flag, PatchFlags::STABLE_FRAGMENT);

        let (root, _) = transformed("<div/>");
        let call = root.codegen_node.as_ref().and_then(JsChildNode::as_vnode_call).expect("element");
        assert_eq!(call.tag_name(), "div");
    }

    #[test]
    fn test_components_recorded_in_order() {
        let (root, _) = transformed("<Foo/><bar-baz/><Foo/>");
        assert_eq!(root.components, vec![SmolStr::new("Foo")]);
    }
}
