use crate::helpers::V_SHOW;
use template_compiler_core::ast::{DirectiveNode, ElementNode};
use template_compiler_core::{DirectiveTransformResult, ErrorCode, NeedRuntime, TransformContext};

/// `v-show` produces no props. The runtime `vShow` directive toggles
/// `display`.
pub fn transform_show(dir: &DirectiveNode, _el: &ElementNode, ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    if dir.exp.as_ref().map_or(true, |exp| exp.source().trim().is_empty()) {
        ctx.error(ErrorCode::VShowNoExpression, dir.span);
    }
    DirectiveTransformResult {
        props: Vec::new(),
        need_runtime: Some(NeedRuntime::Helper(V_SHOW)),
    }
}
