//! DOM event modifiers on top of the core `v-on` transform.
//!
//! Guard modifiers (`.stop`, `.prevent`, `.self`, system keys, ...) wrap the
//! handler in `withModifiers`, key names wrap it in `withKeys`, and the
//! listener options `.once`, `.capture` and `.passive` are appended to the
//! prop key where the runtime reads them back.

use crate::helpers::{WITH_KEYS, WITH_MODIFIERS};
use smol_str::SmolStr;
use template_compiler_core::ast::{json_string, CompoundChild, CompoundExpression, DirectiveNode, ElementNode, ExpressionNode};
use template_compiler_core::js::JsChildNode;
use template_compiler_core::transform::transform_on as transform_on_base;
use template_compiler_core::utils::capitalize;
use template_compiler_core::{DirectiveTransformResult, TransformContext};

#[derive(Debug, Default, PartialEq)]
struct Modifiers {
    keys: Vec<SmolStr>,
    guards: Vec<SmolStr>,
    event_options: Vec<SmolStr>,
}

pub fn transform_on(dir: &DirectiveNode, el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    let mut result = transform_on_base(dir, el, ctx);
    if dir.modifiers.is_empty() {
        return result;
    }
    let Some(prop) = result.props.first_mut() else {
        return result;
    };

    let modifiers = resolve_modifiers(&prop.key, &dir.modifiers);
    let mut key = prop.key.clone();
    let mut value = std::mem::replace(&mut prop.value, JsChildNode::simple(""));

    if modifiers.guards.iter().any(|m| m == "right") {
        key = rename_click(key, "onContextmenu");
    }
    if modifiers.guards.iter().any(|m| m == "middle") {
        key = rename_click(key, "onMouseup");
    }
    if !modifiers.guards.is_empty() {
        value = JsChildNode::call(WITH_MODIFIERS, vec![value, modifier_list(&modifiers.guards)]);
    }
    if !modifiers.keys.is_empty() && static_key(&key).map_or(true, is_keyboard_event) {
        value = JsChildNode::call(WITH_KEYS, vec![value, modifier_list(&modifiers.keys)]);
    }
    if !modifiers.event_options.is_empty() {
        let suffix: String = modifiers.event_options.iter().map(|m| capitalize(m)).collect();
        key = match static_key(&key) {
            Some(name) => ExpressionNode::simple(format!("{name}{suffix}"), true, key.span()),
            None => compound(&key, vec![key.clone().into(), CompoundChild::raw(format!(" + \"{suffix}\""))]),
        };
    }

    prop.key = key;
    prop.value = value;
    result
}

fn resolve_modifiers(key: &ExpressionNode, modifiers: &[SmolStr]) -> Modifiers {
    let mut resolved = Modifiers::default();
    for modifier in modifiers {
        match modifier.as_str() {
            "passive" | "once" | "capture" => resolved.event_options.push(modifier.clone()),
            // Mouse buttons or arrow keys, depending on the event.
            "left" | "right" => match static_key(key) {
                Some(name) if is_keyboard_event(name) => resolved.keys.push(modifier.clone()),
                Some(_) => resolved.guards.push(modifier.clone()),
                None => {
                    resolved.keys.push(modifier.clone());
                    resolved.guards.push(modifier.clone());
                }
            },
            "stop" | "prevent" | "self" | "ctrl" | "shift" | "alt" | "meta" | "exact" | "middle" => {
                resolved.guards.push(modifier.clone())
            }
            _ => resolved.keys.push(modifier.clone()),
        }
    }
    resolved
}

fn static_key(key: &ExpressionNode) -> Option<&str> {
    match key {
        ExpressionNode::Simple(s) if s.is_static => Some(&s.content),
        _ => None,
    }
}

fn is_keyboard_event(key: &str) -> bool {
    matches!(key.to_ascii_lowercase().as_str(), "onkeyup" | "onkeydown" | "onkeypress")
}

/// Mouse buttons other than the primary one do not fire `click`.
fn rename_click(key: ExpressionNode, event: &str) -> ExpressionNode {
    match static_key(&key) {
        Some(name) if name.eq_ignore_ascii_case("onclick") => ExpressionNode::simple(event, true, key.span()),
        Some(_) => key,
        None => compound(
            &key,
            vec![
                CompoundChild::raw("("),
                key.clone().into(),
                CompoundChild::raw(format!(") === \"onClick\" ? {} : (", json_string(event))),
                key.clone().into(),
                CompoundChild::raw(")"),
            ],
        ),
    }
}

fn compound(around: &ExpressionNode, children: Vec<CompoundChild>) -> ExpressionNode {
    let mut compound = CompoundExpression::new(children, around.span());
    compound.source = around.source().to_string();
    ExpressionNode::Compound(compound)
}

/// `["stop","prevent"]`
fn modifier_list(modifiers: &[SmolStr]) -> JsChildNode {
    let items = modifiers.iter().map(|m| json_string(m)).collect::<Vec<_>>();
    JsChildNode::simple(format!("[{}]", items.join(",")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, dom_options};
    use pretty_assertions::assert_eq;
    use template_span::Span;

    fn code(source: &str) -> String {
        let output = compile(source, &dom_options());
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        output.code
    }

    #[test]
    fn test_guard_modifiers() {
        let code = code(r#"<button @click.stop.prevent="save">x</button>"#);
        assert!(code.contains(r#"onClick: _withModifiers(_ctx.save, ["stop","prevent"])"#));
        assert!(code.contains("withModifiers: _withModifiers"));
    }

    #[test]
    fn test_key_modifiers() {
        let code = code(r#"<input @keyup.enter="submit">"#);
        assert!(code.contains(r#"onKeyup: _withKeys(_ctx.submit, ["enter"])"#));
    }

    #[test]
    fn test_key_modifiers_ignored_on_mouse_events() {
        let code = code(r#"<div @click.enter="go"></div>"#);
        assert!(code.contains("onClick: _ctx.go"));
        assert!(!code.contains("withKeys"));
    }

    #[test]
    fn test_event_options_become_key_suffix() {
        let code = code(r#"<div @scroll.passive.once="onScroll"></div>"#);
        assert!(code.contains("onScrollPassiveOnce: _ctx.onScroll"));
    }

    #[test]
    fn test_mouse_buttons() {
        let right = code(r#"<div @click.right="menu"></div>"#);
        assert!(right.contains(r#"onContextmenu: _withModifiers(_ctx.menu, ["right"])"#));

        let code = code(r#"<div @click.middle="paste"></div>"#);
        assert!(code.contains(r#"onMouseup: _withModifiers(_ctx.paste, ["middle"])"#));
    }

    #[test]
    fn test_arrow_keys_on_keyboard_events() {
        let key = ExpressionNode::simple("onKeydown", true, Span::default());
        let resolved = resolve_modifiers(&key, &["left".into(), "ctrl".into()]);
        assert_eq!(resolved.keys, vec![SmolStr::new("left")]);
        assert_eq!(resolved.guards, vec![SmolStr::new("ctrl")]);
    }

    #[test]
    fn test_dynamic_event_gets_both_interpretations() {
        let code = code(r#"<div @[evt].left="go"></div>"#);
        assert!(code.contains(r#"_withKeys(_withModifiers(_ctx.go, ["left"]), ["left"])"#));
    }
}
