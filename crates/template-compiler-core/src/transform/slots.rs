//! Component slots: scope tracking for slot props and the slots object
//! passed as a component's children.

use super::v_for::{enter_aliases, loop_params, parse_for_expression};
use super::v_if::attach_alternate;
use super::{children_codegen, is_template_node, Cursor, ExitFn, TransformContext, VarSource};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::expr::ProcessMode;
use crate::helpers::RuntimeHelper;
use crate::js::{
    ArrayExpression, ConditionalExpression, FunctionExpression, JsChildNode, ObjectExpression, Property, SlotFlags,
};
use rustc_hash::FxHashSet;
use template_span::Span;

/// Bring the slot props of `<Comp v-slot="props">` or
/// `<template #name="props">` into scope for the slot content.
pub(super) fn track_slot_scopes(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return None;
    };
    if !matches!(el.tag_type, ElementType::Component | ElementType::Template) {
        return None;
    }
    let dir = el.find_dir("slot")?;

    let marker = ctx.enter_scope();
    if let Some(exp) = &dir.exp {
        for name in ctx.binding_names(exp) {
            ctx.add_var(name, VarSource::SlotProps);
        }
    }
    ctx.v_slot_depth += 1;

    Some(Box::new(move |_cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        ctx.exit_scope(marker);
        ctx.v_slot_depth -= 1;
    }))
}

/// `<template v-for="item in list" #[item.name]>`: the loop aliases are in
/// scope for the slot name and content. The parsed loop is kept on the
/// directive for the slot builder.
pub(super) fn track_v_for_slot_scopes(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return None;
    };
    if el.tag_type != ElementType::Template || !el.has_dir("slot") {
        return None;
    }

    let mut parsed = None;
    for prop in &mut el.props {
        let PropNode::Directive(dir) = prop else {
            continue;
        };
        if dir.name != "for" {
            continue;
        }
        let Some(exp) = dir.exp.as_ref().filter(|exp| !exp.source().trim().is_empty()) else {
            ctx.error(ErrorCode::VForNoExpression, dir.span);
            return None;
        };
        let Some(mut result) = parse_for_expression(exp) else {
            ctx.error(ErrorCode::VForMalformedExpression, exp.span());
            return None;
        };
        result.source = ctx.process_expression(&result.source, ProcessMode::Expression);
        parsed = Some(result);
    }
    let mut parsed = parsed?;

    let marker = ctx.enter_scope();
    enter_aliases(&mut parsed, ctx);
    for prop in &mut el.props {
        let PropNode::Directive(dir) = prop else {
            continue;
        };
        match dir.name.as_str() {
            "for" => dir.for_parse_result = Some(parsed.clone()),
            "slot" => {
                if let Some(arg) = dir.arg.as_ref().filter(|arg| !arg.is_static()) {
                    dir.arg = Some(ctx.process_expression(arg, ProcessMode::Expression));
                }
            }
            _ => {}
        }
    }

    Some(Box::new(move |_cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        ctx.exit_scope(marker);
    }))
}

/// The slots object of a component and whether it changes between renders.
pub(crate) struct BuiltSlots {
    pub slots: JsChildNode,
    pub has_dynamic_slots: bool,
}

pub(crate) fn build_slots(el: &ElementNode, ctx: &mut TransformContext<'_>) -> BuiltSlots {
    let mut properties: Vec<Property> = Vec::new();
    let mut dynamic_slots: Vec<JsChildNode> = Vec::new();
    // Slots nested in a loop or another slot likely close over its scope.
    let mut has_dynamic_slots = ctx.v_for_depth > 0 || ctx.v_slot_depth > 0;

    let on_component = el.find_dir("slot");
    if let Some(dir) = on_component {
        let name = slot_name(dir);
        if !name.is_static() {
            has_dynamic_slots = true;
        }
        properties.push(Property {
            key: name,
            value: slot_function(dir.exp.as_ref(), &el.children, ctx),
        });
    }

    let mut has_template_slots = false;
    let mut has_named_default_slot = false;
    let mut implicit_default: Vec<TemplateChildNode> = Vec::new();
    let mut seen_names: FxHashSet<String> = FxHashSet::default();
    let mut branch_index = 0usize;

    for (i, child) in el.children.iter().enumerate() {
        let template = child.as_element().filter(|_| is_template_node(child));
        let Some((template, dir)) = template.and_then(|t| t.find_dir("slot").map(|d| (t, d))) else {
            if !matches!(child, TemplateChildNode::Comment(_)) {
                implicit_default.push(child.clone());
            }
            continue;
        };

        if on_component.is_some() {
            ctx.error(ErrorCode::VSlotMixedSlotUsage, dir.span);
            break;
        }
        has_template_slots = true;

        let name = slot_name(dir);
        let function = slot_function(dir.exp.as_ref(), &template.children, ctx);

        if let Some(v_if) = template.find_dir("if") {
            has_dynamic_slots = true;
            dynamic_slots.push(JsChildNode::Conditional(Box::new(ConditionalExpression {
                test: condition(v_if),
                consequent: dynamic_slot(name, function, Some(branch_index)),
                alternate: JsChildNode::simple("undefined"),
                newline: true,
            })));
            branch_index += 1;
        } else if let Some(v_else) = template.find_dir("else-if").or_else(|| template.find_dir("else")) {
            let previous = el.children[..i]
                .iter()
                .rev()
                .find(|node| !matches!(node, TemplateChildNode::Comment(_)) && is_non_whitespace_content(node));
            let follows_conditional = previous
                .and_then(TemplateChildNode::as_element)
                .is_some_and(|prev| prev.tag_type == ElementType::Template && (prev.has_dir("if") || prev.has_dir("else-if")));
            match dynamic_slots.last_mut() {
                Some(conditional @ JsChildNode::Conditional(_)) if follows_conditional => {
                    let slot = dynamic_slot(name, function, Some(branch_index));
                    let alternate = if v_else.name == "else-if" {
                        JsChildNode::Conditional(Box::new(ConditionalExpression {
                            test: condition(v_else),
                            consequent: slot,
                            alternate: JsChildNode::simple("undefined"),
                            newline: true,
                        }))
                    } else {
                        slot
                    };
                    attach_alternate(conditional, alternate);
                    branch_index += 1;
                }
                _ => ctx.error(ErrorCode::VElseNoAdjacentIf, v_else.span),
            }
        } else if let Some(v_for) = template.find_dir("for") {
            has_dynamic_slots = true;
            if let Some(parsed) = &v_for.for_parse_result {
                let render = JsChildNode::Function(Box::new(FunctionExpression {
                    params: loop_params(parsed),
                    returns: Some(dynamic_slot(name, function, None)),
                    newline: true,
                    is_slot: false,
                }));
                dynamic_slots.push(JsChildNode::call(
                    RuntimeHelper::RENDER_LIST,
                    vec![parsed.source.clone().into(), render],
                ));
            }
        } else {
            if let ExpressionNode::Simple(s) = &name {
                if s.is_static {
                    if !seen_names.insert(s.content.clone()) {
                        ctx.error(ErrorCode::VSlotDuplicateSlotNames, dir.span);
                        continue;
                    }
                    if s.content == "default" {
                        has_named_default_slot = true;
                    }
                }
            }
            if !name.is_static() {
                has_dynamic_slots = true;
            }
            properties.push(Property { key: name, value: function });
        }
    }

    if on_component.is_none() {
        if !has_template_slots {
            properties.push(Property::new("default", slot_function(None, &el.children, ctx)));
        } else if implicit_default.iter().any(is_non_whitespace_content) {
            if has_named_default_slot {
                let span = implicit_default
                    .iter()
                    .find(|node| is_non_whitespace_content(node))
                    .map_or(el.span, TemplateChildNode::span);
                ctx.error(ErrorCode::VSlotExtraneousDefaultSlotChildren, span);
            } else {
                properties.push(Property::new("default", slot_function(None, &implicit_default, ctx)));
            }
        }
    }

    let flag = if has_dynamic_slots {
        SlotFlags::Dynamic
    } else {
        SlotFlags::Stable
    };
    properties.push(Property::new(
        "_",
        JsChildNode::Simple(
            SimpleExpression::new(flag.to_string(), false, Span::default()).with_const_type(ConstantType::CanHoist),
        ),
    ));

    let mut slots = JsChildNode::Object(ObjectExpression::new(properties));
    if !dynamic_slots.is_empty() {
        slots = JsChildNode::call(
            RuntimeHelper::CREATE_SLOTS,
            vec![slots, JsChildNode::Array(ArrayExpression { elements: dynamic_slots })],
        );
    }
    BuiltSlots {
        slots,
        has_dynamic_slots,
    }
}

fn slot_name(dir: &DirectiveNode) -> ExpressionNode {
    dir.arg
        .clone()
        .unwrap_or_else(|| ExpressionNode::simple("default", true, dir.span))
}

fn condition(dir: &DirectiveNode) -> JsChildNode {
    dir.exp
        .clone()
        .map_or_else(|| JsChildNode::simple("true"), JsChildNode::from)
}

/// `(props) => [children]`, wrapped in `withCtx` when emitted.
fn slot_function(
    props: Option<&ExpressionNode>,
    children: &[TemplateChildNode],
    ctx: &mut TransformContext<'_>,
) -> JsChildNode {
    let params = props
        .map(|p| ctx.process_params(p).code().trim().to_string())
        .filter(|p| !p.is_empty())
        .into_iter()
        .collect();
    let elements = children_codegen(children.to_vec(), ctx);
    JsChildNode::Function(Box::new(FunctionExpression {
        params,
        returns: Some(JsChildNode::Array(ArrayExpression { elements })),
        newline: false,
        is_slot: true,
    }))
}

/// `{ name, fn, key }` entry for `createSlots`.
fn dynamic_slot(name: ExpressionNode, function: JsChildNode, key: Option<usize>) -> JsChildNode {
    let mut properties = vec![Property::new("name", name.into()), Property::new("fn", function)];
    if let Some(key) = key {
        properties.push(Property::new("key", JsChildNode::string(key.to_string())));
    }
    JsChildNode::Object(ObjectExpression::new(properties))
}

fn is_non_whitespace_content(node: &TemplateChildNode) -> bool {
    match node {
        TemplateChildNode::Comment(_) => false,
        TemplateChildNode::Text(text) => !text.is_whitespace(),
        TemplateChildNode::TextCall(call) => match &call.content {
            None => false,
            Some(JsChildNode::Text(text)) => !text.is_whitespace(),
            Some(_) => true,
        },
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::js::{VNodeCall, VNodeChildren};
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::transform;
    use pretty_assertions::assert_eq;

    fn component(source: &str) -> (VNodeCall, Vec<CompileError>) {
        let options = CompilerOptions::default();
        let (mut root, _) = parse(source, &options);
        let errors = transform(&mut root, &options);
        let call = root
            .codegen_node
            .as_ref()
            .and_then(JsChildNode::as_vnode_call)
            .cloned()
            .expect("vnode call");
        (call, errors)
    }

    fn slots(call: &VNodeCall) -> &JsChildNode {
        match &call.children {
            Some(VNodeChildren::Slots(slots)) => slots,
            other => panic!("expected slots, got {:?}", other),
        }
    }

    fn object(node: &JsChildNode) -> &ObjectExpression {
        match node {
            JsChildNode::Object(object) => object,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn keys(object: &ObjectExpression) -> Vec<String> {
        object.properties.iter().map(|p| p.key.source().to_string()).collect()
    }

    fn flag(object: &ObjectExpression) -> String {
        match object.get("_").map(|p| &p.value) {
            Some(JsChildNode::Simple(s)) => s.content.clone(),
            other => panic!("missing slot flag: {:?}", other),
        }
    }

    fn params(node: &JsChildNode) -> Vec<String> {
        match node {
            JsChildNode::Function(f) => f.params.clone(),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_implicit_default_slot() {
        let (call, errors) = component("<Comp><span>{{ a }}</span></Comp>");
        assert!(errors.is_empty());
        let slots = object(slots(&call));
        assert_eq!(keys(slots), vec!["default", "_"]);
        assert_eq!(flag(slots), "1 /* STABLE */");
    }

    #[test]
    fn test_slot_on_component() {
        let (call, _) = component(r#"<Comp v-slot="{ item }">{{ item }}</Comp>"#);
        let slots = object(slots(&call));
        assert_eq!(keys(slots), vec!["default", "_"]);
        assert_eq!(params(&slots.properties[0].value), vec!["{ item }"]);
    }

    #[test]
    fn test_named_templates() {
        let (call, errors) = component(
            r#"<Comp><template #header="{ title }">{{ title }}</template><template #footer>f</template></Comp>"#,
        );
        assert!(errors.is_empty());
        let slots = object(slots(&call));
        assert_eq!(keys(slots), vec!["header", "footer", "_"]);
    }

    #[test]
    fn test_slot_props_not_prefixed() {
        let (call, _) = component(r#"<Comp v-slot="{ item }"><i>{{ item }}{{ other }}</i></Comp>"#);
        let slots = object(slots(&call));
        let JsChildNode::Function(function) = &slots.properties[0].value else {
            panic!("expected function");
        };
        let Some(JsChildNode::Array(children)) = &function.returns else {
            panic!("expected array");
        };
        let i = children.elements[0].as_vnode_call().expect("element");
        match &i.children {
            Some(VNodeChildren::Single(text)) => match text.as_ref() {
                JsChildNode::Compound(c) => {
                    assert_eq!(c.code(), "_toDisplayString(item) + _toDisplayString(_ctx.other)")
                }
                other => panic!("unexpected text {:?}", other),
            },
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn test_implicit_default_beside_templates() {
        let (call, _) = component(r#"<Comp><template #a>x</template><p/></Comp>"#);
        assert_eq!(keys(object(slots(&call))), vec!["a", "default", "_"]);

        let (_, errors) = component(r#"<Comp><template #default>x</template><p/></Comp>"#);
        assert_eq!(
            errors.iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![ErrorCode::VSlotExtraneousDefaultSlotChildren]
        );
    }

    #[test]
    fn test_mixed_and_duplicate_usage() {
        let (_, errors) = component(r#"<Comp v-slot="p"><template #a>x</template></Comp>"#);
        assert_eq!(errors.iter().map(|e| e.code).collect::<Vec<_>>(), vec![ErrorCode::VSlotMixedSlotUsage]);

        let (_, errors) = component(r#"<Comp><template #a>x</template><template #a>y</template></Comp>"#);
        assert_eq!(errors.iter().map(|e| e.code).collect::<Vec<_>>(), vec![ErrorCode::VSlotDuplicateSlotNames]);
    }

    #[test]
    fn test_dynamic_slot_name() {
        let (call, _) = component(r#"<Comp><template #[name]>x</template></Comp>"#);
        let slots = object(slots(&call));
        assert_eq!(flag(slots), "2 /* DYNAMIC */");
        assert_eq!(call.patch_flag, crate::js::PatchFlags::DYNAMIC_SLOTS);
    }

    #[test]
    fn test_conditional_slots() {
        let (call, errors) = component(r#"<Comp><template v-if="ok" #a>x</template><template v-else #b>y</template></Comp>"#);
        assert!(errors.is_empty());
        match slots(&call) {
            JsChildNode::Call(create) => {
                assert_eq!(create.callee, RuntimeHelper::CREATE_SLOTS);
                let JsChildNode::Array(dynamic) = &create.args[1] else {
                    panic!("expected array");
                };
                assert_eq!(dynamic.elements.len(), 1);
                match &dynamic.elements[0] {
                    JsChildNode::Conditional(c) => {
                        assert!(matches!(&c.test, JsChildNode::Simple(s) if s.content == "_ctx.ok"));
                        assert!(object(&c.alternate).get("name").is_some());
                    }
                    other => panic!("expected conditional, got {:?}", other),
                }
            }
            other => panic!("expected createSlots, got {:?}", other),
        }
    }

    #[test]
    fn test_v_for_slots() {
        let (call, errors) = component(r#"<Comp><template v-for="item in list" #[item.name]="p">{{ item.label }}</template></Comp>"#);
        assert!(errors.is_empty(), "{:?}", errors);
        match slots(&call) {
            JsChildNode::Call(create) => match &create.args[1] {
                JsChildNode::Array(dynamic) => match &dynamic.elements[0] {
                    JsChildNode::Call(list) => {
                        assert_eq!(list.callee, RuntimeHelper::RENDER_LIST);
                        assert!(matches!(&list.args[0], JsChildNode::Simple(s) if s.content == "_ctx.list"));
                        let JsChildNode::Function(render) = &list.args[1] else {
                            panic!("expected function");
                        };
                        let entry = object(render.returns.as_ref().expect("slot entry"));
                        assert!(matches!(&entry.get("name").map(|p| &p.value), Some(JsChildNode::Simple(s)) if s.content == "item.name"));
                    }
                    other => panic!("expected renderList, got {:?}", other),
                },
                other => panic!("expected array, got {:?}", other),
            },
            other => panic!("expected createSlots, got {:?}", other),
        }
    }
}
