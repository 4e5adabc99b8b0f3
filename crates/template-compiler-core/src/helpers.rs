//! Runtime helper names referenced by generated code.
//!
//! The compiler only knows helpers by name. Generated code imports each
//! referenced helper once and calls it through an underscore-prefixed alias
//! (`toDisplayString` becomes `_toDisplayString`).

use std::fmt;

/// A runtime helper the generated render function may call.
///
/// Helpers are plain names so that platform layers can declare their own
/// (the DOM layer adds `vShow`, `withModifiers`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuntimeHelper(pub &'static str);

impl RuntimeHelper {
    pub const FRAGMENT: Self = Self("Fragment");
    pub const OPEN_BLOCK: Self = Self("openBlock");
    pub const CREATE_BLOCK: Self = Self("createBlock");
    pub const CREATE_ELEMENT_BLOCK: Self = Self("createElementBlock");
    pub const CREATE_VNODE: Self = Self("createVNode");
    pub const CREATE_ELEMENT_VNODE: Self = Self("createElementVNode");
    pub const CREATE_COMMENT: Self = Self("createCommentVNode");
    pub const CREATE_TEXT: Self = Self("createTextVNode");
    pub const RESOLVE_COMPONENT: Self = Self("resolveComponent");
    pub const RESOLVE_DYNAMIC_COMPONENT: Self = Self("resolveDynamicComponent");
    pub const RESOLVE_DIRECTIVE: Self = Self("resolveDirective");
    pub const WITH_DIRECTIVES: Self = Self("withDirectives");
    pub const RENDER_LIST: Self = Self("renderList");
    pub const RENDER_SLOT: Self = Self("renderSlot");
    pub const CREATE_SLOTS: Self = Self("createSlots");
    pub const TO_DISPLAY_STRING: Self = Self("toDisplayString");
    pub const MERGE_PROPS: Self = Self("mergeProps");
    pub const NORMALIZE_CLASS: Self = Self("normalizeClass");
    pub const NORMALIZE_STYLE: Self = Self("normalizeStyle");
    pub const NORMALIZE_PROPS: Self = Self("normalizeProps");
    pub const GUARD_REACTIVE_PROPS: Self = Self("guardReactiveProps");
    pub const TO_HANDLERS: Self = Self("toHandlers");
    pub const TO_HANDLER_KEY: Self = Self("toHandlerKey");
    pub const CAMELIZE: Self = Self("camelize");
    pub const WITH_CTX: Self = Self("withCtx");

    /// The exported name in the runtime module.
    pub fn name(&self) -> &'static str {
        self.0
    }

    /// The local alias used inside generated code.
    pub fn alias(&self) -> String {
        format!("_{}", self.0)
    }

    /// The element-creation helper for a vnode call.
    pub fn vnode_helper(is_block: bool, is_component: bool) -> Self {
        match (is_block, is_component) {
            (true, true) => Self::CREATE_BLOCK,
            (true, false) => Self::CREATE_ELEMENT_BLOCK,
            (false, true) => Self::CREATE_VNODE,
            (false, false) => Self::CREATE_ELEMENT_VNODE,
        }
    }
}

impl fmt::Display for RuntimeHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias() {
        assert_eq!(RuntimeHelper::TO_DISPLAY_STRING.alias(), "_toDisplayString");
        assert_eq!(RuntimeHelper("vShow").name(), "vShow");
    }

    #[test]
    fn test_vnode_helper() {
        assert_eq!(RuntimeHelper::vnode_helper(true, false), RuntimeHelper::CREATE_ELEMENT_BLOCK);
        assert_eq!(RuntimeHelper::vnode_helper(false, true), RuntimeHelper::CREATE_VNODE);
    }
}
