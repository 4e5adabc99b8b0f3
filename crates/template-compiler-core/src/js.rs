//! Codegen descriptors.
//!
//! The transform pipeline lowers the content AST into this tree. Static
//! analysis rewrites it (hoisting, block flattening) and the code generator
//! prints it.

use crate::ast::{CommentNode, CompoundExpression, ExpressionNode, InterpolationNode, SimpleExpression, TextNode};
use crate::helpers::RuntimeHelper;
use smol_str::SmolStr;
use std::fmt;
use template_span::Span;

/// Stable identity for vnode-producing descriptors, allocated per compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// A node of the codegen tree.
#[derive(Debug, Clone, PartialEq)]
pub enum JsChildNode {
    VNodeCall(Box<VNodeCall>),
    Call(CallExpression),
    Object(ObjectExpression),
    Array(ArrayExpression),
    Function(Box<FunctionExpression>),
    Conditional(Box<ConditionalExpression>),
    Simple(SimpleExpression),
    Compound(CompoundExpression),
    /// Static text, emitted as a string literal.
    Text(TextNode),
    /// Emitted as `_toDisplayString(content)`.
    Interpolation(InterpolationNode),
    /// Emitted as `_createCommentVNode(content)`.
    Comment(CommentNode),
    TextCall(Box<TextCallExpression>),
    /// Reference to `_hoisted_{index + 1}`.
    Hoisted(usize),
    /// A runtime symbol used as a value, such as the `vShow` directive.
    Helper(RuntimeHelper),
}

impl JsChildNode {
    pub fn simple(content: impl Into<String>) -> Self {
        Self::Simple(SimpleExpression::new(content, false, Span::default()))
    }

    /// A quoted string literal.
    pub fn string(content: impl Into<String>) -> Self {
        Self::Simple(SimpleExpression::new(content, true, Span::default()))
    }

    pub fn call(callee: RuntimeHelper, args: Vec<JsChildNode>) -> Self {
        Self::Call(CallExpression { callee, args })
    }

    pub fn as_vnode_call(&self) -> Option<&VNodeCall> {
        match self {
            Self::VNodeCall(call) => Some(call),
            _ => None,
        }
    }
}

impl From<ExpressionNode> for JsChildNode {
    fn from(exp: ExpressionNode) -> Self {
        match exp {
            ExpressionNode::Simple(s) => Self::Simple(s),
            ExpressionNode::Compound(c) => Self::Compound(c),
        }
    }
}

/// The first argument of a vnode call.
#[derive(Debug, Clone, PartialEq)]
pub enum VNodeTag {
    /// Platform tag name, emitted quoted.
    Literal(SmolStr),
    /// A resolved component variable such as `_component_my_button`.
    Component(String),
    /// A runtime symbol such as `Fragment`.
    Helper(RuntimeHelper),
    /// `resolveDynamicComponent(...)`.
    Dynamic(Box<JsChildNode>),
}

/// Children argument of a vnode call.
#[derive(Debug, Clone, PartialEq)]
pub enum VNodeChildren {
    /// Emitted as an array.
    Nodes(Vec<JsChildNode>),
    /// A single text-like child emitted directly.
    Single(Box<JsChildNode>),
    /// A component's slots object.
    Slots(Box<JsChildNode>),
    /// `renderList(...)` for an iteration fragment.
    RenderList(Box<JsChildNode>),
    Hoisted(usize),
}

/// A vnode creation: element, component or fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct VNodeCall {
    pub id: NodeId,
    pub tag: VNodeTag,
    pub props: Option<JsChildNode>,
    pub children: Option<VNodeChildren>,
    pub patch_flag: PatchFlags,
    pub dynamic_props: Vec<SmolStr>,
    /// Runtime directives applied through `withDirectives`.
    pub directives: Option<ArrayExpression>,
    pub is_block: bool,
    pub disable_tracking: bool,
    pub is_component: bool,
    /// Dynamic descendants tracked by this block, filled by block flattening.
    pub dynamic_children: Vec<NodeId>,
    pub span: Span,
}

impl VNodeCall {
    pub fn new(id: NodeId, tag: VNodeTag) -> Self {
        Self {
            id,
            tag,
            props: None,
            children: None,
            patch_flag: PatchFlags::NONE,
            dynamic_props: Vec::new(),
            directives: None,
            is_block: false,
            disable_tracking: false,
            is_component: false,
            dynamic_children: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.tag, VNodeTag::Helper(RuntimeHelper::FRAGMENT))
    }

    /// A human-readable tag, used for diagnostics and block summaries.
    pub fn tag_name(&self) -> String {
        match &self.tag {
            VNodeTag::Literal(tag) => tag.to_string(),
            VNodeTag::Component(var) => var.clone(),
            VNodeTag::Helper(helper) => helper.name().to_string(),
            VNodeTag::Dynamic(_) => "component".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: RuntimeHelper,
    pub args: Vec<JsChildNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
}

impl ObjectExpression {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Find a property by static key.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.static_key() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: ExpressionNode,
    pub value: JsChildNode,
}

impl Property {
    /// A property with a static key.
    pub fn new(key: impl Into<String>, value: JsChildNode) -> Self {
        Self {
            key: ExpressionNode::simple(key, true, Span::default()),
            value,
        }
    }

    pub fn static_key(&self) -> Option<&str> {
        match &self.key {
            ExpressionNode::Simple(s) if s.is_static => Some(&s.content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayExpression {
    pub elements: Vec<JsChildNode>,
}

/// An arrow function. Slot functions are wrapped in `withCtx` on emission.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub params: Vec<String>,
    pub returns: Option<JsChildNode>,
    /// Emit `{ return ... }` instead of an expression body.
    pub newline: bool,
    pub is_slot: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub test: JsChildNode,
    pub consequent: JsChildNode,
    pub alternate: JsChildNode,
    pub newline: bool,
}

/// `createTextVNode(content, flag)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCallExpression {
    pub id: NodeId,
    /// `None` for a lone space, which is the runtime default.
    pub content: Option<JsChildNode>,
    pub patch_flag: PatchFlags,
    pub span: Span,
}

/// Dynamic-update hints passed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatchFlags(pub i32);

impl PatchFlags {
    pub const NONE: Self = Self(0);
    pub const TEXT: Self = Self(1);
    pub const CLASS: Self = Self(1 << 1);
    pub const STYLE: Self = Self(1 << 2);
    pub const PROPS: Self = Self(1 << 3);
    pub const FULL_PROPS: Self = Self(1 << 4);
    pub const STABLE_FRAGMENT: Self = Self(1 << 6);
    pub const KEYED_FRAGMENT: Self = Self(1 << 7);
    pub const UNKEYED_FRAGMENT: Self = Self(1 << 8);
    pub const NEED_PATCH: Self = Self(1 << 9);
    pub const DYNAMIC_SLOTS: Self = Self(1 << 10);
    pub const HOISTED: Self = Self(-1);
    pub const BAIL: Self = Self(-2);

    const NAMES: &'static [(i32, &'static str)] = &[
        (1, "TEXT"),
        (1 << 1, "CLASS"),
        (1 << 2, "STYLE"),
        (1 << 3, "PROPS"),
        (1 << 4, "FULL_PROPS"),
        (1 << 6, "STABLE_FRAGMENT"),
        (1 << 7, "KEYED_FRAGMENT"),
        (1 << 8, "UNKEYED_FRAGMENT"),
        (1 << 9, "NEED_PATCH"),
        (1 << 10, "DYNAMIC_SLOTS"),
    ];

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the renderer has to look at this node on update.
    pub fn is_dynamic(self) -> bool {
        self.0 > 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 > 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Names of the set flags, e.g. `TEXT, PROPS`.
    pub fn describe(self) -> String {
        match self {
            Self::HOISTED => "HOISTED".to_string(),
            Self::BAIL => "BAIL".to_string(),
            _ => Self::NAMES
                .iter()
                .filter(|(bit, _)| self.0 & bit != 0)
                .map(|(_, name)| *name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl fmt::Display for PatchFlags {
    /// Formats as code with the flag names in a trailing comment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /* {} */", self.0, self.describe())
    }
}

/// Slot object stability marker, the `_` key of a slots object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFlags {
    Stable = 1,
    Dynamic = 2,
}

impl fmt::Display for SlotFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "1 /* STABLE */"),
            Self::Dynamic => write!(f, "2 /* DYNAMIC */"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_flag_display() {
        let mut flag = PatchFlags::TEXT;
        flag.insert(PatchFlags::PROPS);
        assert_eq!(flag.to_string(), "9 /* TEXT, PROPS */");
        assert_eq!(PatchFlags::HOISTED.to_string(), "-1 /* HOISTED */");
    }

    #[test]
    fn test_patch_flag_dynamic() {
        assert!(PatchFlags::TEXT.is_dynamic());
        assert!(!PatchFlags::HOISTED.is_dynamic());
        assert!(!PatchFlags::NONE.is_dynamic());
        assert!(!PatchFlags::HOISTED.contains(PatchFlags::TEXT));
    }

    #[test]
    fn test_object_get() {
        let object = ObjectExpression::new(vec![Property::new("id", JsChildNode::string("app"))]);
        assert!(object.get("id").is_some());
        assert!(object.get("class").is_none());
    }
}
