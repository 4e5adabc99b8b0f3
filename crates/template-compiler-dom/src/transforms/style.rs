//! Static `style` attributes become constant style objects, so they merge
//! with `:style` bindings at runtime.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use template_compiler_core::ast::{
    json_string, ConstantType, DirectiveNode, ExpressionNode, PropNode, SimpleExpression, TemplateChildNode,
};
use template_compiler_core::{Cursor, ExitFn, TransformContext};

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

pub fn transform_style(cursor: &mut Cursor<'_>, _ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return None;
    };
    for prop in &mut el.props {
        let PropNode::Attribute(attr) = prop else {
            continue;
        };
        if attr.name != "style" {
            continue;
        }
        let Some(value) = &attr.value else {
            continue;
        };
        let span = attr.span;
        let exp = SimpleExpression::new(style_object_code(&value.content), false, span)
            .with_const_type(ConstantType::CanStringify);
        *prop = PropNode::Directive(DirectiveNode {
            name: "bind".into(),
            raw_name: ":style".into(),
            arg: Some(ExpressionNode::simple("style", true, span)),
            modifiers: Vec::new(),
            exp: Some(ExpressionNode::Simple(exp)),
            span,
            for_parse_result: None,
        });
    }
    None
}

/// Parse inline CSS into declarations. Later duplicates replace the value
/// but keep the first position.
pub fn parse_inline_style(css: &str) -> IndexMap<String, String> {
    let css = COMMENT.replace_all(css, "");
    let mut declarations = IndexMap::new();
    for item in split_declarations(&css) {
        if let Some((name, value)) = item.split_once(':') {
            declarations.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    declarations
}

/// Split on `;` outside parentheses, so `url(data:a;b)` stays whole.
fn split_declarations(css: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in css.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                items.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&css[start..]);
    items
}

fn style_object_code(css: &str) -> String {
    let entries = parse_inline_style(css)
        .iter()
        .map(|(name, value)| format!("{}:{}", json_string(name), json_string(value)))
        .collect::<Vec<_>>();
    format!("{{{}}}", entries.join(","))
}
