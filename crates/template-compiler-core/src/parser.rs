//! Template parser.
//!
//! Produces the content AST. Malformed input is reported through the
//! options' callbacks and parsing continues; the parser never fails.

use crate::ast::*;
use crate::error::{CompileError, ErrorCode};
use crate::options::{CompilerOptions, WhitespaceStrategy};
use once_cell::sync::Lazy;
use regex::Regex;
use smol_str::SmolStr;
use std::borrow::Cow;
use template_span::Span;

/// Attribute names that are parsed as directives.
static DIRECTIVE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(v-[A-Za-z0-9-]|:|\.|@|#)").expect("valid regex"));

/// `v-name:arg.mod`, `:arg`, `.arg`, `@arg`, `#arg`.
static DIRECTIVE_PARTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:v-([a-z0-9-]+))?(?:(?::|^\.|^@|^#)(\[[^\]]+\]|[^\.]+))?(.+)?$")
        .expect("valid regex")
});

/// Parse a template into a root node.
pub fn parse(source: &str, options: &CompilerOptions) -> (RootNode, Vec<CompileError>) {
    let mut parser = TemplateParser::new(source, options);
    let mut ancestors = Vec::new();
    let children = parser.parse_children(&mut ancestors);
    let root = RootNode {
        children,
        span: Span::new(0, source.len() as u32),
        ..Default::default()
    };
    tracing::trace!(children = root.children.len(), errors = parser.errors.len(), "parsed template");
    (root, parser.errors)
}

struct TemplateParser<'a> {
    source: &'a str,
    pos: usize,
    options: &'a CompilerOptions,
    errors: Vec<CompileError>,
    /// Depth of pre tags around the current position.
    in_pre: usize,
    in_v_pre: bool,
}

impl<'a> TemplateParser<'a> {
    fn new(source: &'a str, options: &'a CompilerOptions) -> Self {
        Self {
            source,
            pos: 0,
            options,
            errors: Vec::new(),
            in_pre: 0,
            in_v_pre: false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.read_while(char::is_whitespace);
    }

    fn read_while<F: Fn(char) -> bool>(&mut self, pred: F) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn error(&mut self, code: ErrorCode, span: Span) {
        let error = CompileError::new(code, span);
        self.options.report(&error);
        self.errors.push(error);
    }

    /// Parse nodes until EOF or an end tag closing one of `ancestors`.
    fn parse_children(&mut self, ancestors: &mut Vec<SmolStr>) -> Vec<TemplateChildNode> {
        let mut children = Vec::new();

        while !self.is_eof() {
            if self.starts_with("</") {
                let next = self.peek_nth(2);
                if next == Some('>') {
                    let start = self.pos;
                    self.pos += 3;
                    self.error(ErrorCode::MissingEndTagName, self.span_from(start));
                    continue;
                }
                if next.is_some_and(|c| c.is_ascii_alphabetic()) {
                    let name = self.peek_end_tag_name();
                    if ancestors.iter().any(|tag| tag.eq_ignore_ascii_case(name)) {
                        break;
                    }
                    let start = self.pos;
                    self.skip_end_tag();
                    self.error(ErrorCode::InvalidEndTag, self.span_from(start));
                    continue;
                }
            } else if self.starts_with("<!--") {
                children.push(TemplateChildNode::Comment(self.parse_comment()));
                continue;
            } else if self.starts_with("<!") {
                children.push(TemplateChildNode::Comment(self.parse_bogus_comment()));
                continue;
            } else if self.starts_with("<") && self.peek_nth(1).is_some_and(|c| c.is_ascii_alphabetic()) {
                children.push(self.parse_element(ancestors));
                continue;
            } else if !self.in_v_pre && self.starts_with(&self.options.delimiters.0) {
                match self.parse_interpolation() {
                    Some(node) => children.push(TemplateChildNode::Interpolation(node)),
                    None => {
                        let start = self.pos;
                        self.pos += self.options.delimiters.0.len();
                        push_text(&mut children, &self.source[start..self.pos], self.span_from(start));
                    }
                }
                continue;
            }
            let start = self.pos;
            let raw = self.read_text();
            push_text(&mut children, &decode_entities(raw), self.span_from(start));
        }

        if self.in_pre == 0 && self.options.whitespace == WhitespaceStrategy::Condense {
            condense_whitespace(&mut children, self.options.comments);
        } else if !self.options.comments {
            children.retain(|node| !matches!(node, TemplateChildNode::Comment(_)));
        }
        children
    }

    /// Read text up to the next tag, comment or interpolation. Always
    /// consumes at least one character.
    fn read_text(&mut self) -> &'a str {
        let start = self.pos;
        self.advance();
        while let Some(c) = self.peek() {
            if c == '<' {
                match self.peek_nth(1) {
                    Some(n) if n.is_ascii_alphabetic() || n == '/' || n == '!' => break,
                    _ => {}
                }
            }
            if !self.in_v_pre && self.starts_with(&self.options.delimiters.0) {
                break;
            }
            self.advance();
        }
        &self.source[start..self.pos]
    }

    fn parse_comment(&mut self) -> CommentNode {
        let start = self.pos;
        self.consume("<!--");
        let content = match self.remaining().find("-->") {
            Some(end) => {
                let content = &self.remaining()[..end];
                self.pos += end + 3;
                content
            }
            None => {
                let content = self.remaining();
                self.pos = self.source.len();
                self.error(ErrorCode::EofInComment, self.span_from(start));
                content
            }
        };
        CommentNode {
            content: content.to_string(),
            span: self.span_from(start),
        }
    }

    /// `<!DOCTYPE ...>` and similar markup declarations become comments.
    fn parse_bogus_comment(&mut self) -> CommentNode {
        let start = self.pos;
        self.consume("<!");
        let content = self.read_while(|c| c != '>');
        self.consume(">");
        CommentNode {
            content: content.to_string(),
            span: self.span_from(start),
        }
    }

    /// Returns `None` when the closing delimiter is missing.
    fn parse_interpolation(&mut self) -> Option<InterpolationNode> {
        let options = self.options;
        let (open, close) = (&options.delimiters.0, &options.delimiters.1);
        let start = self.pos;
        let inner_start = start + open.len();
        let Some(end) = self.source[inner_start..].find(close.as_str()) else {
            self.error(ErrorCode::MissingInterpolationEnd, Span::new(start as u32, inner_start as u32));
            return None;
        };
        let raw = &self.source[inner_start..inner_start + end];
        let leading = raw.len() - raw.trim_start().len();
        let content = raw.trim();
        let content_start = (inner_start + leading) as u32;
        self.pos = inner_start + end + close.len();
        let exp_span = Span::new(content_start, content_start + content.len() as u32);
        Some(InterpolationNode {
            content: ExpressionNode::simple(decode_entities(content), false, exp_span),
            span: self.span_from(start),
        })
    }

    fn peek_end_tag_name(&self) -> &'a str {
        let rest = &self.remaining()[2..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Skip `</name ...>`, reporting EOF inside it.
    fn skip_end_tag(&mut self) {
        let start = self.pos;
        self.read_while(|c| c != '>');
        if !self.consume(">") {
            self.error(ErrorCode::EofInTag, self.span_from(start));
        }
    }

    fn parse_element(&mut self, ancestors: &mut Vec<SmolStr>) -> TemplateChildNode {
        let start = self.pos;
        self.consume("<");
        let tag = SmolStr::new(self.read_while(|c| !c.is_whitespace() && c != '/' && c != '>'));

        let raw_attrs = self.parse_attributes();
        let (closed, is_self_closing) = if self.consume("/>") {
            (true, true)
        } else if self.consume(">") {
            (true, false)
        } else {
            self.error(ErrorCode::EofInTag, self.span_from(start));
            (false, false)
        };

        let has_v_pre = !self.in_v_pre && raw_attrs.iter().any(|a| a.name == "v-pre");
        let props = self.build_props(raw_attrs, self.in_v_pre || has_v_pre);
        let tag_type = self.classify(&tag, &props);

        let mut el = ElementNode {
            tag,
            tag_type,
            props,
            children: Vec::new(),
            is_self_closing,
            codegen_node: None,
            span: self.span_from(start),
        };

        if !closed || is_self_closing || (self.options.is_void_tag)(&el.tag) {
            return TemplateChildNode::Element(el);
        }

        let is_pre = (self.options.is_pre_tag)(&el.tag);
        let was_v_pre = self.in_v_pre;
        if is_pre {
            self.in_pre += 1;
        }
        if has_v_pre {
            self.in_v_pre = true;
        }
        ancestors.push(el.tag.clone());
        el.children = self.parse_children(ancestors);
        ancestors.pop();
        self.in_v_pre = was_v_pre;
        if is_pre {
            self.in_pre -= 1;
            strip_leading_newline(&mut el.children);
        }

        if self.starts_with("</") && self.peek_end_tag_name().eq_ignore_ascii_case(&el.tag) {
            self.skip_end_tag();
        } else {
            self.error(ErrorCode::MissingEndTag, el.span);
        }
        el.span = self.span_from(start);
        TemplateChildNode::Element(el)
    }

    fn parse_attributes(&mut self) -> Vec<RawAttribute<'a>> {
        let mut attrs: Vec<RawAttribute<'a>> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.is_eof() || self.starts_with(">") || self.starts_with("/>") {
                return attrs;
            }
            if self.consume("/") {
                continue;
            }
            let attr = self.parse_attribute();
            if attrs.iter().any(|a| a.name == attr.name) {
                self.error(ErrorCode::DuplicateAttribute, attr.span);
            } else {
                attrs.push(attr);
            }
        }
    }

    fn parse_attribute(&mut self) -> RawAttribute<'a> {
        let start = self.pos;
        // The first character may be `=` and still belong to the name.
        self.advance();
        loop {
            match self.peek() {
                Some('[') => {
                    self.read_while(|c| c != ']' && c != '>');
                    self.consume("]");
                }
                Some(c) if !c.is_whitespace() && c != '/' && c != '>' && c != '=' => {
                    self.advance();
                }
                _ => break,
            }
        }
        let name = &self.source[start..self.pos];

        let mut value = None;
        let before_eq = self.pos;
        self.skip_whitespace();
        if self.consume("=") {
            self.skip_whitespace();
            value = self.parse_attribute_value();
            if value.is_none() {
                self.error(ErrorCode::MissingAttributeValue, self.span_from(start));
            }
        } else {
            self.pos = before_eq;
        }

        RawAttribute {
            name,
            value,
            span: self.span_from(start),
        }
    }

    fn parse_attribute_value(&mut self) -> Option<(Cow<'a, str>, Span)> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let value_start = self.pos;
                let raw = self.read_while(|c| c != quote);
                let span = self.span_from(value_start);
                if !self.consume(&quote.to_string()) {
                    self.error(ErrorCode::EofInTag, span);
                }
                Some((decode_entities(raw), span))
            }
            Some('>') | None => None,
            Some(_) => {
                let value_start = self.pos;
                let raw = self.read_while(|c| !c.is_whitespace() && c != '>');
                Some((decode_entities(raw), self.span_from(value_start)))
            }
        }
    }

    fn build_props(&mut self, attrs: Vec<RawAttribute<'a>>, raw_only: bool) -> Vec<PropNode> {
        let mut props = Vec::with_capacity(attrs.len());
        for attr in attrs {
            if raw_only || !DIRECTIVE_START.is_match(attr.name) {
                if raw_only && attr.name == "v-pre" {
                    continue;
                }
                props.push(PropNode::Attribute(AttributeNode {
                    name: attr.name.into(),
                    value: attr.value.map(|(v, span)| TextNode::new(v, span)),
                    span: attr.span,
                }));
            } else if let Some(dir) = self.parse_directive(&attr) {
                props.push(PropNode::Directive(dir));
            }
        }
        props
    }

    fn parse_directive(&mut self, attr: &RawAttribute<'a>) -> Option<DirectiveNode> {
        let name = attr.name;
        let caps = DIRECTIVE_PARTS.captures(name)?;

        let dir_name = match caps.get(1) {
            Some(m) => m.as_str(),
            None if name.starts_with(':') || name.starts_with('.') => "bind",
            None if name.starts_with('@') => "on",
            None => "slot",
        };

        let mut modifiers: Vec<SmolStr> = Vec::new();
        if let Some(m) = caps.get(3) {
            match m.as_str().strip_prefix('.') {
                Some(rest) => modifiers.extend(rest.split('.').map(SmolStr::from)),
                None => {
                    self.error(ErrorCode::MissingDirectiveName, attr.span);
                    return None;
                }
            }
        }

        let mut arg = None;
        if let Some(m) = caps.get(2) {
            let raw = m.as_str();
            let offset = attr.span.start + m.start() as u32;
            arg = Some(if let Some(inner) = raw.strip_prefix('[') {
                let content = match inner.strip_suffix(']') {
                    Some(content) => content,
                    None => {
                        self.error(ErrorCode::MissingDynamicDirectiveArgumentEnd, attr.span);
                        inner
                    }
                };
                let span = Span::new(offset + 1, offset + 1 + content.len() as u32);
                ExpressionNode::simple(content, false, span)
            } else {
                let mut content = raw.to_string();
                // Slot names may contain dots.
                if dir_name == "slot" && !modifiers.is_empty() {
                    for modifier in modifiers.drain(..) {
                        content.push('.');
                        content.push_str(&modifier);
                    }
                }
                let span = Span::new(offset, offset + content.len() as u32);
                ExpressionNode::simple(content, true, span)
            });
        } else if caps.get(1).is_none() {
            // A bare `:`, `@` or `#`.
            self.error(ErrorCode::MissingDirectiveName, attr.span);
            return None;
        }

        if name.starts_with('.') {
            modifiers.push("prop".into());
        }

        let exp = attr
            .value
            .as_ref()
            .filter(|(value, _)| !value.trim().is_empty())
            .map(|(value, span)| ExpressionNode::simple(value.to_string(), false, *span));

        Some(DirectiveNode {
            name: SmolStr::new(dir_name),
            raw_name: SmolStr::new(name),
            arg,
            modifiers,
            exp,
            span: attr.span,
            for_parse_result: None,
        })
    }

    fn classify(&self, tag: &str, props: &[PropNode]) -> ElementType {
        if self.in_v_pre {
            return ElementType::Element;
        }
        let has_dir = |names: &[&str]| {
            props
                .iter()
                .any(|p| matches!(p, PropNode::Directive(d) if names.contains(&d.name.as_str())))
        };
        if tag == "slot" {
            ElementType::Slot
        } else if tag == "template" && has_dir(&["if", "else", "else-if", "for", "slot"]) {
            ElementType::Template
        } else if tag == "component"
            || tag.starts_with(|c: char| c.is_ascii_uppercase())
            || self.options.is_native_tag.is_some_and(|is_native| !is_native(tag) && tag != "template")
        {
            ElementType::Component
        } else {
            ElementType::Element
        }
    }
}

/// An attribute as written, before directive decomposition.
struct RawAttribute<'a> {
    name: &'a str,
    value: Option<(Cow<'a, str>, Span)>,
    span: Span,
}

/// Append text, merging with a preceding text node.
fn push_text(children: &mut Vec<TemplateChildNode>, content: &str, span: Span) {
    if let Some(TemplateChildNode::Text(prev)) = children.last_mut() {
        prev.content.push_str(content);
        prev.span = prev.span.merge(span);
        return;
    }
    children.push(TemplateChildNode::Text(TextNode::new(content, span)));
}

/// A newline right after a pre tag's opening tag is not content.
fn strip_leading_newline(children: &mut Vec<TemplateChildNode>) {
    if let Some(TemplateChildNode::Text(text)) = children.first_mut() {
        if let Some(rest) = text.content.strip_prefix('\n') {
            text.content = rest.to_string();
            if text.content.is_empty() {
                children.remove(0);
            }
        }
    }
}

enum Condense {
    Keep,
    Remove,
    Replace(String),
}

/// Condense whitespace in a sibling list.
///
/// Whitespace-only text is removed at the list boundaries, between comments
/// and elements, and between two elements when it contains a newline.
/// Otherwise it becomes a single space. Whitespace runs inside other text
/// collapse to one space. Comments are dropped unless `keep_comments` is set.
pub fn condense_whitespace(nodes: &mut Vec<TemplateChildNode>, keep_comments: bool) {
    let mut removed = vec![false; nodes.len()];
    let mut replacements = Vec::new();

    for i in 0..nodes.len() {
        let action = match &nodes[i] {
            TemplateChildNode::Comment(_) if !keep_comments => Condense::Remove,
            TemplateChildNode::Text(text) if text.is_whitespace() => {
                let prev = i.checked_sub(1).filter(|&j| !removed[j]).map(|j| &nodes[j]);
                let next = nodes.get(i + 1);
                match (prev, next) {
                    (Some(prev), Some(next)) => {
                        let is_comment = |n: &TemplateChildNode| matches!(n, TemplateChildNode::Comment(_));
                        let is_element = |n: &TemplateChildNode| matches!(n, TemplateChildNode::Element(_));
                        if (is_comment(prev) && (is_comment(next) || is_element(next)))
                            || (is_element(prev)
                                && (is_comment(next)
                                    || (is_element(next) && text.content.contains(['\n', '\r']))))
                        {
                            Condense::Remove
                        } else if text.content == " " {
                            Condense::Keep
                        } else {
                            Condense::Replace(" ".to_string())
                        }
                    }
                    _ => Condense::Remove,
                }
            }
            TemplateChildNode::Text(text) => {
                let condensed = collapse_whitespace(&text.content);
                if condensed == text.content {
                    Condense::Keep
                } else {
                    Condense::Replace(condensed)
                }
            }
            _ => Condense::Keep,
        };
        match action {
            Condense::Keep => {}
            Condense::Remove => removed[i] = true,
            Condense::Replace(content) => replacements.push((i, content)),
        }
    }

    for (i, content) in replacements {
        if let TemplateChildNode::Text(text) = &mut nodes[i] {
            text.content = content;
        }
    }
    let mut index = 0;
    nodes.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
}

fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_run = false;
    for c in content.chars() {
        if is_template_whitespace(c) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Decode the basic named and numeric character references.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> RootNode {
        let (root, errors) = parse(source, &CompilerOptions::default());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        root
    }

    fn error_codes(source: &str) -> Vec<ErrorCode> {
        parse(source, &CompilerOptions::default())
            .1
            .into_iter()
            .map(|e| e.code)
            .collect()
    }

    fn element(node: &TemplateChildNode) -> &ElementNode {
        node.as_element().expect("element")
    }

    fn directive(prop: &PropNode) -> &DirectiveNode {
        match prop {
            PropNode::Directive(dir) => dir,
            other => panic!("expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_element() {
        let root = parse_ok("<div>Hello</div>");
        assert_eq!(root.children.len(), 1);
        let div = element(&root.children[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.tag_type, ElementType::Element);
        assert!(matches!(&div.children[0], TemplateChildNode::Text(t) if t.content == "Hello"));
        assert_eq!(div.span, Span::new(0, 16));
    }

    #[test]
    fn test_parse_interpolation() {
        let root = parse_ok("{{ message }}");
        match &root.children[0] {
            TemplateChildNode::Interpolation(node) => {
                assert_eq!(node.content.source(), "message");
                assert_eq!(node.content.span(), Span::new(3, 10));
            }
            other => panic!("expected interpolation, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_delimiters() {
        let options = CompilerOptions {
            delimiters: ("${".to_string(), "}".to_string()),
            ..Default::default()
        };
        let (root, _) = parse("a ${ b } {{ c }}", &options);
        assert_eq!(root.children.len(), 3);
        assert!(matches!(&root.children[2], TemplateChildNode::Text(t) if t.content == " {{ c }}"));
    }

    #[test]
    fn test_directive_shorthands() {
        let root = parse_ok(r#"<div :id="a" .text-content="b" @click.stop="c" v-on:[evt]="d" #header></div>"#);
        let props = &element(&root.children[0]).props;

        let bind = directive(&props[0]);
        assert_eq!(bind.name, "bind");
        assert_eq!(bind.static_arg(), Some("id"));
        assert_eq!(bind.exp.as_ref().map(|e| e.source()), Some("a"));

        let prop = directive(&props[1]);
        assert_eq!(prop.name, "bind");
        assert!(prop.has_modifier("prop"));

        let on = directive(&props[2]);
        assert_eq!(on.name, "on");
        assert_eq!(on.modifiers, vec![SmolStr::new("stop")]);

        let dynamic = directive(&props[3]);
        assert!(matches!(&dynamic.arg, Some(arg) if !arg.is_static() && arg.source() == "evt"));

        let slot = directive(&props[4]);
        assert_eq!(slot.name, "slot");
        assert!(slot.exp.is_none());
    }

    #[test]
    fn test_slot_name_keeps_dots() {
        let root = parse_ok(r#"<Comp><template #item.name="{ x }">{{ x }}</template></Comp>"#);
        let template = element(&element(&root.children[0]).children[0]);
        let slot = directive(&template.props[0]);
        assert_eq!(slot.static_arg(), Some("item.name"));
        assert!(slot.modifiers.is_empty());
        assert_eq!(template.tag_type, ElementType::Template);
    }

    #[test]
    fn test_classification() {
        let options = CompilerOptions {
            is_native_tag: Some(|tag| matches!(tag, "div" | "span")),
            ..Default::default()
        };
        let (root, _) = parse("<div/><my-comp/><Foo/><component/><slot/><template>x</template>", &options);
        let types: Vec<_> = root.children.iter().map(|n| element(n).tag_type).collect();
        assert_eq!(
            types,
            vec![
                ElementType::Element,
                ElementType::Component,
                ElementType::Component,
                ElementType::Component,
                ElementType::Slot,
                ElementType::Element,
            ]
        );
    }

    #[test]
    fn test_v_pre() {
        let root = parse_ok(r#"<div v-pre :id="x"><span v-if="y">{{ z }}</span></div>"#);
        let div = element(&root.children[0]);
        assert_eq!(div.props.len(), 1);
        assert!(matches!(&div.props[0], PropNode::Attribute(a) if a.name == ":id"));
        let span = element(&div.children[0]);
        assert!(matches!(&span.props[0], PropNode::Attribute(a) if a.name == "v-if"));
        assert!(matches!(&span.children[0], TemplateChildNode::Text(t) if t.content == "{{ z }}"));
    }

    #[test]
    fn test_void_and_self_closing() {
        let options = CompilerOptions {
            is_void_tag: |tag| tag == "br",
            ..Default::default()
        };
        let (root, errors) = parse("<p>a<br>b<img/>c</p>", &options);
        assert!(errors.is_empty());
        assert_eq!(element(&root.children[0]).children.len(), 5);
    }

    #[test]
    fn test_entities() {
        let root = parse_ok(r#"<a title="&quot;x&quot;">&lt;b&gt; &amp; &#65;&#x42; &bogus;</a>"#);
        let a = element(&root.children[0]);
        match &a.props[0] {
            PropNode::Attribute(attr) => {
                assert_eq!(attr.value.as_ref().map(|v| v.content.as_str()), Some("\"x\""))
            }
            other => panic!("expected attribute, got {:?}", other),
        }
        assert!(matches!(&a.children[0], TemplateChildNode::Text(t) if t.content == "<b> & AB &bogus;"));
    }

    #[test]
    fn test_error_recovery() {
        assert_eq!(error_codes("<div><span></div>"), vec![ErrorCode::MissingEndTag]);
        assert_eq!(error_codes("<div></span></div>"), vec![ErrorCode::InvalidEndTag]);
        assert_eq!(error_codes("<div></>x</div>"), vec![ErrorCode::MissingEndTagName]);
        assert_eq!(error_codes("{{ a"), vec![ErrorCode::MissingInterpolationEnd]);
        assert_eq!(error_codes("<!-- a"), vec![ErrorCode::EofInComment]);
        assert_eq!(error_codes("<div id"), vec![ErrorCode::EofInTag]);
        assert_eq!(error_codes(r#"<div a="1" a="2"></div>"#), vec![ErrorCode::DuplicateAttribute]);
        assert_eq!(error_codes("<div a=></div>"), vec![ErrorCode::MissingAttributeValue]);
        assert_eq!(error_codes(r#"<div :[foo="x"></div>"#), vec![ErrorCode::MissingDynamicDirectiveArgumentEnd]);
        assert_eq!(error_codes(r#"<div v-bind:="x"></div>"#), vec![ErrorCode::MissingDirectiveName]);
    }

    #[test]
    fn test_unterminated_interpolation_kept_as_text() {
        let (root, _) = parse("a {{ b", &CompilerOptions::default());
        assert_eq!(root.children.len(), 1);
        assert!(matches!(&root.children[0], TemplateChildNode::Text(t) if t.content == "a {{ b"));
    }

    #[test]
    fn test_condense_whitespace() {
        let root = parse_ok("  <div>\n  <span>a   b</span>\n  <span>c</span> <b/>\n</div>  ");
        assert_eq!(root.children.len(), 1);
        let div = element(&root.children[0]);
        assert_eq!(div.children.len(), 4);
        assert!(matches!(&div.children[2], TemplateChildNode::Text(t) if t.content == " "));
        let span = element(&div.children[0]);
        assert!(matches!(&span.children[0], TemplateChildNode::Text(t) if t.content == "a b"));
    }

    #[test]
    fn test_condense_is_idempotent() {
        let source = "<div>\n <!-- c -->\n <p> x  {{ y }}  z </p> <p/>\n text \n</div>";
        let mut root = parse_ok(source);
        let once = root.clone();
        condense_whitespace(&mut root.children, true);
        if let Some(TemplateChildNode::Element(div)) = root.children.first_mut() {
            condense_whitespace(&mut div.children, true);
        }
        assert_eq!(root, once);
    }

    #[test]
    fn test_preserve_whitespace_and_drop_comments() {
        let options = CompilerOptions {
            whitespace: WhitespaceStrategy::Preserve,
            comments: false,
            ..Default::default()
        };
        let (root, _) = parse("<div>\n  <!-- x -->  a  \n</div>", &options);
        let div = element(&root.children[0]);
        assert_eq!(div.children.len(), 2);
    }

    #[test]
    fn test_pre_tag() {
        let options = CompilerOptions {
            is_pre_tag: |tag| tag == "pre",
            ..Default::default()
        };
        let (root, _) = parse("<pre>\n  a   b\n</pre>", &options);
        let pre = element(&root.children[0]);
        assert!(matches!(&pre.children[0], TemplateChildNode::Text(t) if t.content == "  a   b\n"));
    }
}
