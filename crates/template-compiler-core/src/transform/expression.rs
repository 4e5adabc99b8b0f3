//! Rewriting of interpolation and directive expressions against the scope.

use super::{Cursor, ExitFn, TransformContext};
use crate::ast::*;
use crate::expr::ProcessMode;

pub(super) fn transform_expression(cursor: &mut Cursor<'_>, ctx: &mut TransformContext<'_>) -> Option<ExitFn> {
    match cursor.node_mut() {
        TemplateChildNode::Interpolation(node) => {
            node.content = ctx.process_expression(&node.content, ProcessMode::Expression);
        }
        TemplateChildNode::Element(el) => {
            let has_for = el.has_dir("for");
            for prop in &mut el.props {
                let PropNode::Directive(dir) = prop else {
                    continue;
                };
                match dir.name.as_str() {
                    // Parsed by the iteration transform.
                    "for" => continue,
                    // Slot props are parameters, handled with the slot scope.
                    "slot" => {
                        if !has_for {
                            process_arg(dir, ctx);
                        }
                        continue;
                    }
                    // Handlers with an event name are processed by the `on`
                    // transform, which needs the raw source.
                    "on" if dir.arg.is_some() => {
                        process_arg(dir, ctx);
                        continue;
                    }
                    _ => {}
                }
                if let Some(exp) = &dir.exp {
                    dir.exp = Some(ctx.process_expression(exp, ProcessMode::Expression));
                }
                process_arg(dir, ctx);
            }
        }
        _ => {}
    }
    None
}

fn process_arg(dir: &mut DirectiveNode, ctx: &mut TransformContext<'_>) {
    if let Some(arg) = &dir.arg {
        if !arg.is_static() {
            dir.arg = Some(ctx.process_expression(arg, ProcessMode::Expression));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompilerOptions;
    use crate::parser::parse;
    use crate::transform::transform;
    use pretty_assertions::assert_eq;

    fn first_element(source: &str, options: &CompilerOptions) -> ElementNode {
        let (mut root, _) = parse(source, options);
        transform(&mut root, options);
        match root.children.into_iter().next() {
            Some(TemplateChildNode::Element(el)) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn test_interpolation_is_prefixed() {
        let options = CompilerOptions::default();
        let el = first_element("<p>{{ count + 1 }}</p>", &options);
        match &el.children[0] {
            TemplateChildNode::Interpolation(node) => assert_eq!(node.content.code(), "_ctx.count + 1"),
            other => panic!("expected interpolation, got {:?}", other),
        }
    }

    #[test]
    fn test_directive_expression_and_dynamic_arg() {
        let options = CompilerOptions::default();
        let el = first_element(r#"<p :[name]="value"/>"#, &options);
        let Some(PropNode::Directive(dir)) = el.props.first() else {
            panic!("expected directive");
        };
        assert_eq!(dir.exp.as_ref().map(ExpressionNode::code).as_deref(), Some("_ctx.value"));
        assert_eq!(dir.arg.as_ref().map(ExpressionNode::code).as_deref(), Some("_ctx.name"));
    }

    #[test]
    fn test_handler_left_raw() {
        let options = CompilerOptions::default();
        let el = first_element(r#"<p @click="count++"/>"#, &options);
        let Some(PropNode::Directive(dir)) = el.props.first() else {
            panic!("expected directive");
        };
        assert_eq!(dir.exp.as_ref().map(ExpressionNode::code).as_deref(), Some("count++"));
    }

    #[test]
    fn test_without_prefixing() {
        let options = CompilerOptions {
            prefix_identifiers: false,
            ..Default::default()
        };
        let el = first_element("<p>{{ count }}</p>", &options);
        match &el.children[0] {
            TemplateChildNode::Interpolation(node) => assert_eq!(node.content.code(), "count"),
            other => panic!("expected interpolation, got {:?}", other),
        }
    }
}
