//! DOM directive and node transforms, installed through the core
//! extension points by [`with_dom`](crate::with_dom).

mod content;
mod style;
mod v_model;
mod v_on;
mod v_show;

pub use content::{ignore_side_effect_tags, strip_overridden_children, transform_html, transform_text};
pub use style::{parse_inline_style, transform_style};
pub use v_model::transform_model;
pub use v_on::transform_on;
pub use v_show::transform_show;

use template_compiler_core::ast::{DirectiveNode, ElementNode};
use template_compiler_core::{DirectiveTransformResult, TransformContext};

/// `v-cloak` only matters before the app mounts.
pub fn transform_cloak(_dir: &DirectiveNode, _el: &ElementNode, _ctx: &mut TransformContext<'_>) -> DirectiveTransformResult {
    DirectiveTransformResult::default()
}
