//! Content AST for templates.
//!
//! The parser builds this tree, the transform pipeline rewrites it in place
//! and attaches codegen descriptors ([`JsChildNode`]) to element,
//! conditional and iteration nodes.

use crate::helpers::RuntimeHelper;
use crate::js::{JsChildNode, TextCallExpression};
use smol_str::SmolStr;
use template_span::Span;

/// Root of a parsed template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RootNode {
    /// Top-level children.
    pub children: Vec<TemplateChildNode>,
    /// Component names resolved at runtime, in first-use order.
    pub components: Vec<SmolStr>,
    /// Custom directive names resolved at runtime, in first-use order.
    pub directives: Vec<SmolStr>,
    /// Hoisted constant descriptors, referenced as `_hoisted_{index + 1}`.
    pub hoists: Vec<JsChildNode>,
    /// The expression returned by the render function.
    pub codegen_node: Option<JsChildNode>,
    pub span: Span,
}

/// A node that can appear in a children list.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChildNode {
    Element(ElementNode),
    Text(TextNode),
    Interpolation(InterpolationNode),
    Comment(CommentNode),
    If(IfNode),
    For(ForNode),
    /// A text run lowered to a `createTextVNode` call.
    TextCall(TextCallExpression),
    /// Adjacent text and interpolations merged into one `+`-joined expression.
    Compound(CompoundExpression),
}

impl TemplateChildNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Element(n) => n.span,
            Self::Text(n) => n.span,
            Self::Interpolation(n) => n.span,
            Self::Comment(n) => n.span,
            Self::If(n) => n.span,
            Self::For(n) => n.span,
            Self::TextCall(n) => n.span,
            Self::Compound(n) => n.span,
        }
    }

    /// Text or interpolation, the nodes merged by the text pass.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Interpolation(_))
    }

    /// Whitespace-only text.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Text(t) if t.is_whitespace())
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// Element classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementType {
    /// Plain platform element.
    Element,
    /// User component.
    Component,
    /// `<slot>` outlet.
    Slot,
    /// `<template>` carrying a structural or slot directive.
    Template,
}

/// An element node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: SmolStr,
    pub tag_type: ElementType,
    pub props: Vec<PropNode>,
    pub children: Vec<TemplateChildNode>,
    pub is_self_closing: bool,
    /// Set by the element and slot-outlet transforms.
    pub codegen_node: Option<JsChildNode>,
    pub span: Span,
}

impl ElementNode {
    /// Find a directive by name.
    pub fn find_dir(&self, name: &str) -> Option<&DirectiveNode> {
        self.props.iter().find_map(|p| match p {
            PropNode::Directive(d) if d.name == name => Some(d),
            _ => None,
        })
    }

    pub fn has_dir(&self, name: &str) -> bool {
        self.find_dir(name).is_some()
    }

    /// Remove and return the first directive with the given name.
    pub fn remove_dir(&mut self, name: &str) -> Option<DirectiveNode> {
        let index = self
            .props
            .iter()
            .position(|p| matches!(p, PropNode::Directive(d) if d.name == name))?;
        match self.props.remove(index) {
            PropNode::Directive(d) => Some(d),
            PropNode::Attribute(_) => None,
        }
    }

    /// Find a static attribute, or with `dynamic` also a `v-bind` with the
    /// same static argument.
    pub fn find_prop(&self, name: &str, dynamic: bool) -> Option<&PropNode> {
        self.props.iter().find(|p| match p {
            PropNode::Attribute(a) => a.name == name,
            PropNode::Directive(d) => {
                dynamic && d.name == "bind" && d.static_arg().is_some_and(|arg| arg == name)
            }
        })
    }
}

/// An attribute or directive on an element.
#[derive(Debug, Clone, PartialEq)]
pub enum PropNode {
    Attribute(AttributeNode),
    Directive(DirectiveNode),
}

impl PropNode {
    pub fn span(&self) -> Span {
        match self {
            Self::Attribute(a) => a.span,
            Self::Directive(d) => d.span,
        }
    }
}

/// A static attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNode {
    pub name: SmolStr,
    pub value: Option<TextNode>,
    pub span: Span,
}

/// A directive: `v-name:arg.modifiers="exp"` or one of its shorthands.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveNode {
    /// Normalized name without the `v-` prefix (`:` becomes `bind`).
    pub name: SmolStr,
    /// The attribute name as written.
    pub raw_name: SmolStr,
    pub arg: Option<ExpressionNode>,
    pub modifiers: Vec<SmolStr>,
    pub exp: Option<ExpressionNode>,
    pub span: Span,
    /// Parsed `v-for` expression, filled in for `<template v-for v-slot>`.
    pub for_parse_result: Option<ForParseResult>,
}

impl DirectiveNode {
    /// The argument when it is static.
    pub fn static_arg(&self) -> Option<&str> {
        match &self.arg {
            Some(ExpressionNode::Simple(s)) if s.is_static => Some(s.content.as_str()),
            _ => None,
        }
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m == name)
    }
}

/// A text node. `content` has character references decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextNode {
    pub content: String,
    pub span: Span,
}

impl TextNode {
    pub fn new(content: impl Into<String>, span: Span) -> Self {
        Self {
            content: content.into(),
            span,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.content.chars().all(is_template_whitespace)
    }
}

/// `{{ expression }}`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationNode {
    pub content: ExpressionNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentNode {
    pub content: String,
    pub span: Span,
}

/// A conditional chain built from `v-if` / `v-else-if` / `v-else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    /// At least one branch; only the last may lack a condition.
    pub branches: Vec<IfBranchNode>,
    pub codegen_node: Option<JsChildNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBranchNode {
    /// `None` for `v-else`.
    pub condition: Option<ExpressionNode>,
    pub children: Vec<TemplateChildNode>,
    /// Whether the branch came from a `<template>`.
    pub is_template_if: bool,
    pub span: Span,
}

/// An iteration built from `v-for`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub source: ExpressionNode,
    pub value_alias: Option<ExpressionNode>,
    pub key_alias: Option<ExpressionNode>,
    pub index_alias: Option<ExpressionNode>,
    pub children: Vec<TemplateChildNode>,
    pub codegen_node: Option<JsChildNode>,
    pub span: Span,
}

/// The pieces of `value, key, index in source`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForParseResult {
    pub source: ExpressionNode,
    pub value: Option<ExpressionNode>,
    pub key: Option<ExpressionNode>,
    pub index: Option<ExpressionNode>,
}

/// How constant an expression or subtree is, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstantType {
    #[default]
    NotConstant,
    /// Never changes once created, but still has to be created per render.
    CanSkipPatch,
    /// Can be created once and reused.
    CanHoist,
    /// Can be serialized to a static string.
    CanStringify,
}

/// A JavaScript expression, either a single snippet or a sequence of
/// literal fragments interleaved with rewritten identifiers.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    Simple(SimpleExpression),
    Compound(CompoundExpression),
}

impl ExpressionNode {
    pub fn simple(content: impl Into<String>, is_static: bool, span: Span) -> Self {
        Self::Simple(SimpleExpression::new(content, is_static, span))
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Simple(s) => s.span,
            Self::Compound(c) => c.span,
        }
    }

    /// The expression as written in the template.
    pub fn source(&self) -> &str {
        match self {
            Self::Simple(s) => &s.source,
            Self::Compound(c) => &c.source,
        }
    }

    pub fn const_type(&self) -> ConstantType {
        match self {
            Self::Simple(s) => s.const_type,
            Self::Compound(c) => c.const_type,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Simple(s) if s.is_static)
    }

    /// Render the expression as code. Interpolation children are wrapped in
    /// `_toDisplayString`.
    pub fn code(&self) -> String {
        match self {
            Self::Simple(s) => s.code(),
            Self::Compound(c) => c.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleExpression {
    /// Code to emit. Rewritten identifiers carry their `_ctx.` prefix here.
    pub content: String,
    /// A static string literal, emitted quoted.
    pub is_static: bool,
    pub const_type: ConstantType,
    /// The expression as written in the template.
    pub source: String,
    pub span: Span,
}

impl SimpleExpression {
    pub fn new(content: impl Into<String>, is_static: bool, span: Span) -> Self {
        let content = content.into();
        Self {
            source: content.clone(),
            const_type: if is_static {
                ConstantType::CanStringify
            } else {
                ConstantType::NotConstant
            },
            content,
            is_static,
            span,
        }
    }

    pub fn with_const_type(mut self, const_type: ConstantType) -> Self {
        self.const_type = const_type;
        self
    }

    pub fn code(&self) -> String {
        if self.is_static {
            json_string(&self.content)
        } else {
            self.content.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundExpression {
    pub children: Vec<CompoundChild>,
    pub const_type: ConstantType,
    pub source: String,
    pub span: Span,
}

impl CompoundExpression {
    pub fn new(children: Vec<CompoundChild>, span: Span) -> Self {
        Self {
            children,
            const_type: ConstantType::NotConstant,
            source: String::new(),
            span,
        }
    }

    pub fn code(&self) -> String {
        self.children.iter().map(CompoundChild::code).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompoundChild {
    /// Literal code emitted verbatim.
    Raw(String),
    Simple(SimpleExpression),
    Compound(CompoundExpression),
    Text(TextNode),
    Interpolation(InterpolationNode),
    /// A runtime helper, emitted as its alias.
    Helper(RuntimeHelper),
}

impl CompoundChild {
    pub fn raw(code: impl Into<String>) -> Self {
        Self::Raw(code.into())
    }

    pub fn code(&self) -> String {
        match self {
            Self::Raw(s) => s.clone(),
            Self::Simple(s) => s.code(),
            Self::Compound(c) => c.code(),
            Self::Text(t) => json_string(&t.content),
            Self::Interpolation(i) => format!("_toDisplayString({})", i.content.code()),
            Self::Helper(helper) => helper.alias(),
        }
    }
}

impl From<ExpressionNode> for CompoundChild {
    fn from(exp: ExpressionNode) -> Self {
        match exp {
            ExpressionNode::Simple(s) => Self::Simple(s),
            ExpressionNode::Compound(c) => Self::Compound(c),
        }
    }
}

/// Whitespace as defined for template text.
pub fn is_template_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

/// Quote a string as a JavaScript string literal.
pub fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
