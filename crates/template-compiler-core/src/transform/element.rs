//! Element and component lowering to vnode calls.

use super::{children_codegen, into_codegen, slots, Cursor, ExitFn, NeedRuntime, TransformContext};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::helpers::RuntimeHelper;
use crate::js::{ArrayExpression, JsChildNode, ObjectExpression, PatchFlags, Property, VNodeCall, VNodeChildren, VNodeTag};
use crate::utils::{is_builtin_directive, is_on, to_valid_asset_id};
use indexmap::IndexMap;
use smol_str::SmolStr;

pub(super) fn transform_element(cursor: &mut Cursor<'_>, _ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return None;
    };
    if !matches!(el.tag_type, ElementType::Element | ElementType::Component) {
        return None;
    }
    Some(Box::new(|cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>| {
        if let TemplateChildNode::Element(el) = cursor.node_mut() {
            let codegen = lower_element(el, ctx);
            el.codegen_node = Some(codegen);
        }
    }))
}

fn lower_element(el: &ElementNode, ctx: &mut TransformContext<'_>) -> JsChildNode {
    let is_component = el.tag_type == ElementType::Component;
    let (tag, is_dynamic_component) = resolve_tag(el, ctx);
    // Components are always blocks so their slot content is tracked
    // separately from the parent.
    let mut should_use_block =
        is_component || is_dynamic_component || matches!(el.tag.as_str(), "svg" | "foreignObject" | "math");

    let mut call = VNodeCall::new(ctx.next_id(), tag);
    call.is_component = is_component;
    call.span = el.span;

    if !el.props.is_empty() {
        let result = build_props(el, &el.props, ctx);
        call.props = result.props;
        call.patch_flag = result.patch_flag;
        call.dynamic_props = result.dynamic_props;
        if result.directives.iter().any(|d| d.runtime == NeedRuntime::Resolve) && !el.children.is_empty() {
            // Custom directive hooks must run after the children update.
            should_use_block = true;
        }
        if !result.directives.is_empty() {
            let elements = result.directives.iter().map(|d| directive_args(d, ctx)).collect();
            call.directives = Some(ArrayExpression { elements });
        }
    }

    if !el.children.is_empty() {
        if is_component {
            let built = slots::build_slots(el, ctx);
            if built.has_dynamic_slots {
                call.patch_flag.insert(PatchFlags::DYNAMIC_SLOTS);
            }
            call.children = Some(VNodeChildren::Slots(Box::new(built.slots)));
        } else if let [child] = el.children.as_slice() {
            let dynamic_text = match child {
                TemplateChildNode::Interpolation(_) => Some(ConstantType::NotConstant),
                TemplateChildNode::Compound(compound) => Some(compound.const_type),
                _ => None,
            };
            if dynamic_text == Some(ConstantType::NotConstant) {
                call.patch_flag.insert(PatchFlags::TEXT);
            }
            let codegen = into_codegen(child.clone(), ctx);
            call.children = Some(if child.is_text() || matches!(child, TemplateChildNode::Compound(_)) {
                VNodeChildren::Single(Box::new(codegen))
            } else {
                VNodeChildren::Nodes(vec![codegen])
            });
        } else {
            call.children = Some(VNodeChildren::Nodes(children_codegen(el.children.clone(), ctx)));
        }
    }

    call.is_block = should_use_block;
    JsChildNode::VNodeCall(Box::new(call))
}

/// The vnode tag, and whether it is resolved dynamically.
fn resolve_tag(el: &ElementNode, ctx: &mut TransformContext<'_>) -> (VNodeTag, bool) {
    if el.tag_type != ElementType::Component {
        return (VNodeTag::Literal(el.tag.clone()), false);
    }
    if el.tag == "component" {
        let is = match el.find_prop("is", true) {
            Some(PropNode::Attribute(attr)) => {
                Some(JsChildNode::string(attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default()))
            }
            Some(PropNode::Directive(dir)) => dir.exp.clone().map(JsChildNode::from),
            None => None,
        };
        if let Some(is) = is {
            let resolved = JsChildNode::call(RuntimeHelper::RESOLVE_DYNAMIC_COMPONENT, vec![is]);
            return (VNodeTag::Dynamic(Box::new(resolved)), true);
        }
    }
    ctx.use_component(el.tag.clone());
    (VNodeTag::Component(to_valid_asset_id(&el.tag, "component")), false)
}

/// A directive kept until runtime.
#[derive(Debug, Clone)]
pub struct RuntimeDirective {
    pub dir: DirectiveNode,
    pub runtime: NeedRuntime,
}

/// Props of an element or slot outlet.
#[derive(Debug, Clone, Default)]
pub struct PropsResult {
    pub props: Option<JsChildNode>,
    pub patch_flag: PatchFlags,
    pub dynamic_props: Vec<SmolStr>,
    pub directives: Vec<RuntimeDirective>,
}

#[derive(Default)]
struct PropsAnalysis {
    has_ref: bool,
    has_class_binding: bool,
    has_style_binding: bool,
    has_dynamic_keys: bool,
    dynamic_prop_names: Vec<SmolStr>,
}

impl PropsAnalysis {
    fn analyze(&mut self, prop: &Property, is_component: bool) {
        let Some(name) = prop.static_key() else {
            self.has_dynamic_keys = true;
            return;
        };
        let constant = match &prop.value {
            JsChildNode::Simple(s) => s.const_type > ConstantType::NotConstant,
            JsChildNode::Compound(c) => c.const_type > ConstantType::NotConstant,
            _ => false,
        };
        if constant {
            return;
        }
        match name {
            "ref" => self.has_ref = true,
            "class" => self.has_class_binding = true,
            "style" => self.has_style_binding = true,
            "key" => {}
            _ => self.add_dynamic(name),
        }
        // Components receive class and style as ordinary props.
        if is_component && matches!(name, "class" | "style") {
            self.add_dynamic(name);
        }
    }

    fn add_dynamic(&mut self, name: &str) {
        if !self.dynamic_prop_names.iter().any(|n| n == name) {
            self.dynamic_prop_names.push(name.into());
        }
    }
}

/// Lower attributes and directives into a props expression, patch flags and
/// runtime directives.
pub fn build_props(el: &ElementNode, props: &[PropNode], ctx: &mut TransformContext<'_>) -> PropsResult {
    let is_component = el.tag_type == ElementType::Component;
    let mut properties: Vec<Property> = Vec::new();
    let mut merge_args: Vec<JsChildNode> = Vec::new();
    let mut directives = Vec::new();
    let mut analysis = PropsAnalysis::default();

    let flush = |properties: &mut Vec<Property>, merge_args: &mut Vec<JsChildNode>| {
        if !properties.is_empty() {
            let object = ObjectExpression::new(dedupe_properties(std::mem::take(properties)));
            merge_args.push(JsChildNode::Object(object));
        }
    };

    for prop in props {
        match prop {
            PropNode::Attribute(attr) => {
                if attr.name == "ref" {
                    analysis.has_ref = true;
                    if ctx.v_for_depth > 0 {
                        properties.push(Property::new("ref_for", JsChildNode::simple("true")));
                    }
                }
                if attr.name == "is" && el.tag == "component" {
                    continue;
                }
                let value = attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default();
                properties.push(Property::new(attr.name.as_str(), JsChildNode::string(value)));
            }
            PropNode::Directive(dir) => {
                let name = dir.name.as_str();
                match name {
                    "slot" => {
                        if !is_component {
                            ctx.error(ErrorCode::VSlotMisplaced, dir.span);
                        }
                        continue;
                    }
                    "once" | "memo" => continue,
                    "bind" if dir.static_arg() == Some("is") && el.tag == "component" => continue,
                    _ => {}
                }

                if matches!(name, "bind" | "on") && dir.arg.is_none() {
                    analysis.has_dynamic_keys = true;
                    match &dir.exp {
                        Some(exp) if !exp.source().trim().is_empty() => {
                            flush(&mut properties, &mut merge_args);
                            if name == "bind" {
                                merge_args.push(exp.clone().into());
                            } else {
                                let mut args = vec![JsChildNode::from(exp.clone())];
                                if !is_component {
                                    args.push(JsChildNode::simple("true"));
                                }
                                merge_args.push(JsChildNode::call(RuntimeHelper::TO_HANDLERS, args));
                            }
                        }
                        _ => {
                            let code = if name == "bind" {
                                ErrorCode::VBindNoExpression
                            } else {
                                ErrorCode::VOnNoExpression
                            };
                            ctx.error(code, dir.span);
                        }
                    }
                    continue;
                }

                if let Some(transform) = ctx.directive_transform(name) {
                    let result = transform(dir, el, ctx);
                    for prop in &result.props {
                        analysis.analyze(prop, is_component);
                    }
                    let dynamic_event = name == "on" && dir.arg.as_ref().is_some_and(|arg| !arg.is_static());
                    if dynamic_event {
                        flush(&mut properties, &mut merge_args);
                        merge_args.push(JsChildNode::Object(ObjectExpression::new(result.props)));
                    } else {
                        properties.extend(result.props);
                    }
                    if let Some(runtime) = result.need_runtime {
                        directives.push(RuntimeDirective {
                            dir: dir.clone(),
                            runtime,
                        });
                    }
                } else if !is_builtin_directive(name) {
                    directives.push(RuntimeDirective {
                        dir: dir.clone(),
                        runtime: NeedRuntime::Resolve,
                    });
                }
            }
        }
    }

    let props_expression = if !merge_args.is_empty() {
        flush(&mut properties, &mut merge_args);
        if merge_args.len() > 1 {
            Some(JsChildNode::call(RuntimeHelper::MERGE_PROPS, merge_args))
        } else {
            merge_args.pop()
        }
    } else if !properties.is_empty() {
        Some(JsChildNode::Object(ObjectExpression::new(dedupe_properties(properties))))
    } else {
        None
    };

    let mut patch_flag = PatchFlags::NONE;
    if analysis.has_dynamic_keys {
        patch_flag.insert(PatchFlags::FULL_PROPS);
    } else {
        if analysis.has_class_binding && !is_component {
            patch_flag.insert(PatchFlags::CLASS);
        }
        if analysis.has_style_binding && !is_component {
            patch_flag.insert(PatchFlags::STYLE);
        }
        if !analysis.dynamic_prop_names.is_empty() {
            patch_flag.insert(PatchFlags::PROPS);
        }
    }
    if patch_flag.is_empty() && (analysis.has_ref || !directives.is_empty()) {
        patch_flag.insert(PatchFlags::NEED_PATCH);
    }

    PropsResult {
        props: props_expression.map(|props| normalize_props(props, analysis.has_style_binding)),
        patch_flag,
        dynamic_props: analysis.dynamic_prop_names,
        directives,
    }
}

/// Wrap class and style values in their runtime normalizers, or the whole
/// object when its keys are only known at runtime.
fn normalize_props(props: JsChildNode, has_style_binding: bool) -> JsChildNode {
    match props {
        JsChildNode::Object(mut object) => {
            if object.properties.iter().any(|p| p.static_key().is_none()) {
                return JsChildNode::call(RuntimeHelper::NORMALIZE_PROPS, vec![JsChildNode::Object(object)]);
            }
            for prop in &mut object.properties {
                match prop.static_key() {
                    Some("class") if !matches!(&prop.value, JsChildNode::Simple(s) if s.is_static) => {
                        let value = std::mem::replace(&mut prop.value, JsChildNode::simple(""));
                        prop.value = JsChildNode::call(RuntimeHelper::NORMALIZE_CLASS, vec![value]);
                    }
                    Some("style") if has_style_binding || matches!(&prop.value, JsChildNode::Array(_)) => {
                        let value = std::mem::replace(&mut prop.value, JsChildNode::simple(""));
                        prop.value = JsChildNode::call(RuntimeHelper::NORMALIZE_STYLE, vec![value]);
                    }
                    _ => {}
                }
            }
            JsChildNode::Object(object)
        }
        merged @ JsChildNode::Call(_) => merged,
        other => JsChildNode::call(
            RuntimeHelper::NORMALIZE_PROPS,
            vec![JsChildNode::call(RuntimeHelper::GUARD_REACTIVE_PROPS, vec![other])],
        ),
    }
}

/// Merge repeated `class`, `style` and handler keys into arrays. Other
/// duplicates keep the first value.
fn dedupe_properties(properties: Vec<Property>) -> Vec<Property> {
    let mut known: IndexMap<String, usize> = IndexMap::new();
    let mut deduped: Vec<Property> = Vec::with_capacity(properties.len());
    for prop in properties {
        let Some(name) = prop.static_key().map(str::to_string) else {
            deduped.push(prop);
            continue;
        };
        match known.get(&name) {
            Some(&index) => {
                if name == "class" || name == "style" || is_on(&name) {
                    merge_as_array(&mut deduped[index], prop.value);
                }
            }
            None => {
                known.insert(name, deduped.len());
                deduped.push(prop);
            }
        }
    }
    deduped
}

fn merge_as_array(existing: &mut Property, incoming: JsChildNode) {
    match &mut existing.value {
        JsChildNode::Array(array) => array.elements.push(incoming),
        value => {
            let first = std::mem::replace(value, JsChildNode::simple(""));
            *value = JsChildNode::Array(ArrayExpression {
                elements: vec![first, incoming],
            });
        }
    }
}

/// `[directive, value, arg, modifiers]` for `withDirectives`, trimmed of
/// trailing absent parts.
fn directive_args(directive: &RuntimeDirective, ctx: &mut TransformContext<'_>) -> JsChildNode {
    let dir = &directive.dir;
    let mut elements = vec![match directive.runtime {
        NeedRuntime::Helper(helper) => JsChildNode::Helper(helper),
        NeedRuntime::Resolve => {
            ctx.use_directive(dir.name.clone());
            JsChildNode::simple(to_valid_asset_id(&dir.name, "directive"))
        }
    }];
    if let Some(exp) = &dir.exp {
        elements.push(exp.clone().into());
    }
    if let Some(arg) = &dir.arg {
        if dir.exp.is_none() {
            elements.push(JsChildNode::simple("void 0"));
        }
        elements.push(arg.clone().into());
    }
    if !dir.modifiers.is_empty() {
        if dir.arg.is_none() {
            if dir.exp.is_none() {
                elements.push(JsChildNode::simple("void 0"));
            }
            elements.push(JsChildNode::simple("void 0"));
        }
        let modifiers = dir
            .modifiers
            .iter()
            .map(|m| {
                Property::new(
                    m.as_str(),
                    JsChildNode::Simple(SimpleExpression::new("true", false, dir.span).with_const_type(ConstantType::CanStringify)),
                )
            })
            .collect();
        elements.push(JsChildNode::Object(ObjectExpression::new(modifiers)));
    }
    JsChildNode::Array(ArrayExpression { elements })
}
