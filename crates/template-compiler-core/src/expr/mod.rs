//! Expression scope analysis.
//!
//! Template expressions are parsed with a small JavaScript parser and walked
//! to find identifier references. References that are not bound inside the
//! expression, not known locals (`v-for` aliases, slot props) and not allowed
//! globals are rewritten to render-context accesses (`foo` to `_ctx.foo`).
//! The walk also decides how constant the expression is.

mod lexer;
mod parser;

use crate::ast::{CompoundChild, CompoundExpression, ConstantType, ExpressionNode, SimpleExpression};
use parser::{Expr, Function, FunctionBody, Ident, MemberProp, ObjectProp, Pattern, PatternProp, PropKey, Stmt};
use rustc_hash::FxHashSet;
use std::fmt;
use template_span::Span;

/// Prefix for identifiers resolved against the render context.
pub const CONTEXT_PREFIX: &str = "_ctx.";

/// A syntax error inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
    /// Byte offset relative to the expression text.
    pub offset: usize,
}

impl ExprError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ExprError {}

/// How an expression is analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// A single expression, rewritten.
    Expression,
    /// A statement list (inline event handlers), rewritten.
    Statements,
    /// A parameter list (`v-for` aliases, slot props). Its names are bound
    /// and only default values are rewritten.
    Params,
}

/// Globals that expressions may reference without the context prefix.
pub fn is_globally_allowed(name: &str) -> bool {
    matches!(
        name,
        "Infinity" | "undefined" | "NaN" | "isFinite" | "isNaN" | "parseFloat" | "parseInt"
            | "decodeURI" | "decodeURIComponent" | "encodeURI" | "encodeURIComponent" | "Math"
            | "Number" | "Date" | "Array" | "Object" | "Boolean" | "String" | "RegExp" | "Map"
            | "Set" | "JSON" | "Intl" | "BigInt" | "console" | "Error" | "Symbol"
    )
}

/// Whether `name` is a plain identifier.
pub fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(lexer::is_ident_start)
        && chars.all(lexer::is_ident_part)
        && !parser::is_reserved_word(name)
}

/// Whether `source` is an assignable member path such as `a.b[c]`.
pub fn is_member_expression(source: &str) -> bool {
    fn is_member(expr: &Expr) -> bool {
        match expr {
            Expr::Ident(_) => true,
            Expr::Member { .. } => true,
            Expr::Paren(inner) => is_member(inner),
            _ => false,
        }
    }
    parser::parse_expression(source).is_ok_and(|expr| is_member(&expr))
}

/// Whether `source` is an arrow function or `function` expression.
pub fn is_function_expression(source: &str) -> bool {
    matches!(parser::parse_expression(source), Ok(Expr::Function(_)))
}

/// Whether `source` holds more than one statement.
pub fn has_multiple_statements(source: &str) -> bool {
    parser::parse_statements(source).is_ok_and(|stmts| stmts.len() > 1)
}

/// Names bound by a parameter list or destructuring pattern, such as slot
/// props or a `v-for` alias.
pub fn binding_names(source: &str) -> Result<Vec<String>, ExprError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let params = parser::parse_params(source)?;
    let mut idents = Vec::new();
    for param in &params {
        param.bound_names(&mut idents);
    }
    Ok(idents.into_iter().map(|id| id.name).collect())
}

/// Analyze `exp` and, when `prefix` is set, rewrite its free identifiers.
///
/// `is_known` reports identifiers bound by enclosing template scopes. The
/// input is returned unchanged on syntax errors.
pub fn process_expression(
    exp: &SimpleExpression,
    is_known: &dyn Fn(&str) -> bool,
    prefix: bool,
    mode: ProcessMode,
) -> Result<ExpressionNode, ExprError> {
    let source = exp.content.as_str();
    if exp.is_static || source.trim().is_empty() {
        return Ok(ExpressionNode::Simple(exp.clone()));
    }

    let mut walker = Walker::new(is_known);
    match mode {
        ProcessMode::Expression => {
            let expr = parser::parse_expression(source)?;
            walker.expr(&expr);
        }
        ProcessMode::Statements => {
            let stmts = parser::parse_statements(source)?;
            walker.with_scope(Vec::new(), |w| w.block(&stmts));
        }
        ProcessMode::Params => {
            let params = parser::parse_params(source)?;
            let mut bound = Vec::new();
            for param in &params {
                param.bound_names(&mut bound);
            }
            walker.with_scope(bound.into_iter().map(|id| id.name).collect(), |w| {
                for param in &params {
                    w.pattern_defaults(param);
                }
            });
        }
    }

    let const_type = walker.const_type();
    let mut sites = walker.sites;
    sites.sort_by_key(|site| site.start);
    sites.dedup_by_key(|site| site.start);

    if !prefix || sites.is_empty() {
        return Ok(ExpressionNode::Simple(SimpleExpression {
            const_type,
            ..exp.clone()
        }));
    }

    let trimmed_start = source.len() - source.trim_start().len();
    let trimmed_end = source.trim_end().len();
    if let [site] = sites.as_slice() {
        if !site.shorthand && site.start == trimmed_start && site.end == trimmed_end {
            return Ok(ExpressionNode::Simple(SimpleExpression {
                content: format!("{}{}", CONTEXT_PREFIX, site.name),
                is_static: false,
                const_type,
                source: exp.source.clone(),
                span: exp.span,
            }));
        }
    }

    let mut children = Vec::with_capacity(sites.len() * 2 + 1);
    let mut last = 0;
    for site in &sites {
        if site.start > last {
            children.push(CompoundChild::raw(&source[last..site.start]));
        }
        if site.shorthand {
            children.push(CompoundChild::raw(format!("{}: ", site.name)));
        }
        let span = Span::new(
            exp.span.start + site.start as u32,
            exp.span.start + site.end as u32,
        );
        let mut id = SimpleExpression::new(format!("{}{}", CONTEXT_PREFIX, site.name), false, span);
        id.source = site.name.clone();
        children.push(CompoundChild::Simple(id));
        last = site.end;
    }
    if last < source.len() {
        children.push(CompoundChild::raw(&source[last..]));
    }

    Ok(ExpressionNode::Compound(CompoundExpression {
        children,
        const_type,
        source: exp.source.clone(),
        span: exp.span,
    }))
}

/// An identifier reference that resolves against the render context.
#[derive(Debug)]
struct Site {
    name: String,
    start: usize,
    end: usize,
    /// Written as `{ name }` and expanded to `{ name: _ctx.name }`.
    shorthand: bool,
}

struct Walker<'a> {
    is_known: &'a dyn Fn(&str) -> bool,
    scopes: Vec<FxHashSet<String>>,
    sites: Vec<Site>,
    has_local: bool,
    has_global: bool,
    has_call_or_member: bool,
}

impl<'a> Walker<'a> {
    fn new(is_known: &'a dyn Fn(&str) -> bool) -> Self {
        Self {
            is_known,
            scopes: Vec::new(),
            sites: Vec::new(),
            has_local: false,
            has_global: false,
            has_call_or_member: false,
        }
    }

    fn const_type(&self) -> ConstantType {
        // Calls and member reads can produce a new value on every render.
        if !self.sites.is_empty() || self.has_local || self.has_call_or_member {
            ConstantType::NotConstant
        } else if self.has_global {
            ConstantType::CanHoist
        } else {
            ConstantType::CanStringify
        }
    }

    fn with_scope(&mut self, names: Vec<String>, f: impl FnOnce(&mut Self)) {
        self.scopes.push(names.into_iter().collect());
        f(self);
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn reference(&mut self, id: &Ident, shorthand: bool) {
        if self.is_local(&id.name) || (self.is_known)(&id.name) {
            self.has_local = true;
        } else if is_globally_allowed(&id.name) {
            self.has_global = true;
        } else {
            self.sites.push(Site {
                name: id.name.clone(),
                start: id.start,
                end: id.end,
                shorthand,
            });
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.reference(id, false),
            Expr::Literal => {}
            Expr::This => self.has_call_or_member = true,
            Expr::Template { tag, parts } => {
                if let Some(tag) = tag {
                    self.has_call_or_member = true;
                    self.expr(tag);
                }
                for part in parts {
                    self.expr(part);
                }
            }
            Expr::Array(items) | Expr::Sequence(items) => {
                for item in items {
                    self.expr(item);
                }
            }
            Expr::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.expr(value);
                        }
                        ObjectProp::Shorthand(id) => self.reference(id, true),
                        ObjectProp::Method { key, function } => {
                            self.prop_key(key);
                            self.function(function);
                        }
                        ObjectProp::Spread(e) => self.expr(e),
                    }
                }
            }
            Expr::Function(function) => self.function(function),
            Expr::Unary(e) | Expr::Spread(e) | Expr::Paren(e) => self.expr(e),
            Expr::Binary(a, b) | Expr::Assign(a, b) => {
                self.expr(a);
                self.expr(b);
            }
            Expr::Conditional(a, b, c) => {
                self.expr(a);
                self.expr(b);
                self.expr(c);
            }
            Expr::Member { object, property } => {
                self.has_call_or_member = true;
                self.expr(object);
                if let MemberProp::Computed(property) = property {
                    self.expr(property);
                }
            }
            Expr::Call { callee, args } | Expr::New { callee, args } => {
                self.has_call_or_member = true;
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
        }
    }

    fn prop_key(&mut self, key: &PropKey) {
        if let PropKey::Computed(e) = key {
            self.expr(e);
        }
    }

    fn function(&mut self, function: &Function) {
        let mut bound = Vec::new();
        for param in &function.params {
            param.bound_names(&mut bound);
        }
        let mut names: Vec<String> = bound.into_iter().map(|id| id.name).collect();
        names.extend(function.name.clone());
        self.with_scope(names, |w| {
            for param in &function.params {
                w.pattern_defaults(param);
            }
            match &function.body {
                FunctionBody::Expr(e) => w.expr(e),
                FunctionBody::Block(stmts) => w.block(stmts),
            }
        });
    }

    /// Default values inside a binding pattern are evaluated as references.
    fn pattern_defaults(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Ident(_) => {}
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        PatternProp::KeyValue { key, value } => {
                            self.prop_key(key);
                            self.pattern_defaults(value);
                        }
                        PatternProp::Shorthand(_, default) => {
                            if let Some(default) = default {
                                self.expr(default);
                            }
                        }
                        PatternProp::Rest(p) => self.pattern_defaults(p),
                    }
                }
            }
            Pattern::Array(items) => {
                for item in items.iter().flatten() {
                    self.pattern_defaults(item);
                }
            }
            Pattern::Default(p, default) => {
                self.pattern_defaults(p);
                self.expr(default);
            }
            Pattern::Rest(p) => self.pattern_defaults(p),
        }
    }

    /// Declarations are visible to the whole block.
    fn block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Decl(decls) = stmt {
                let mut bound = Vec::new();
                for (pattern, _) in decls {
                    pattern.bound_names(&mut bound);
                }
                for id in bound {
                    self.declare(&id.name);
                }
            }
        }
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => self.expr(e),
            Stmt::Return(e) => {
                if let Some(e) = e {
                    self.expr(e);
                }
            }
            Stmt::Decl(decls) => {
                for (pattern, init) in decls {
                    self.pattern_defaults(pattern);
                    if let Some(init) = init {
                        self.expr(init);
                    }
                }
            }
            Stmt::If(test, consequent, alternate) => {
                self.expr(test);
                self.stmt(consequent);
                if let Some(alternate) = alternate {
                    self.stmt(alternate);
                }
            }
            Stmt::Block(stmts) => self.with_scope(Vec::new(), |w| w.block(stmts)),
            Stmt::Empty => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rewrite_with(source: &str, known: &[&str]) -> ExpressionNode {
        let exp = SimpleExpression::new(source, false, Span::new(0, source.len() as u32));
        let is_known = |name: &str| known.contains(&name);
        process_expression(&exp, &is_known, true, ProcessMode::Expression).unwrap()
    }

    fn rewrite(source: &str) -> String {
        rewrite_with(source, &[]).code()
    }

    #[test]
    fn test_single_identifier() {
        match rewrite_with("foo", &[]) {
            ExpressionNode::Simple(s) => {
                assert_eq!(s.content, "_ctx.foo");
                assert_eq!(s.source, "foo");
                assert_eq!(s.const_type, ConstantType::NotConstant);
            }
            other => panic!("expected simple, got {:?}", other),
        }
    }

    #[test]
    fn test_member_and_call() {
        assert_eq!(rewrite("foo.bar(baz)"), "_ctx.foo.bar(_ctx.baz)");
        assert_eq!(rewrite("a[b].c"), "_ctx.a[_ctx.b].c");
        assert_eq!(rewrite("a?.b ?? c"), "_ctx.a?.b ?? _ctx.c");
    }

    #[test]
    fn test_object_keys_and_shorthand() {
        assert_eq!(rewrite("{ a: b, [c]: d, e }"), "{ a: _ctx.b, [_ctx.c]: _ctx.d, e: _ctx.e }");
    }

    #[test]
    fn test_known_locals_and_globals() {
        assert_eq!(rewrite_with("item.name + suffix", &["item"]).code(), "item.name + _ctx.suffix");
        assert_eq!(rewrite("Math.max(a, 1)"), "Math.max(_ctx.a, 1)");
    }

    #[test]
    fn test_function_params_are_local() {
        assert_eq!(rewrite("list.map(x => x * factor)"), "_ctx.list.map(x => x * _ctx.factor)");
        assert_eq!(
            rewrite("({ id }, i = start) => ids[i] === id"),
            "({ id }, i = _ctx.start) => _ctx.ids[i] === id"
        );
        assert_eq!(
            rewrite("function f(a) { const b = a; return b + c }"),
            "function f(a) { const b = a; return b + _ctx.c }"
        );
    }

    #[test]
    fn test_literals_untouched() {
        assert_eq!(rewrite("'foo' + `x${y}z` + /a/.test(b)"), "'foo' + `x${_ctx.y}z` + /a/.test(_ctx.b)");
        assert_eq!(rewrite("true ? null : this"), "true ? null : this");
    }

    #[test]
    fn test_constant_levels() {
        let level = |s: &str| rewrite_with(s, &["local"]).const_type();
        assert_eq!(level("1 + 2"), ConstantType::CanStringify);
        assert_eq!(level("'a' + \"b\""), ConstantType::CanStringify);
        assert_eq!(level("Infinity"), ConstantType::CanHoist);
        assert_eq!(level("Math.PI"), ConstantType::NotConstant);
        assert_eq!(level("Date.now()"), ConstantType::NotConstant);
        assert_eq!(level("this.x"), ConstantType::NotConstant);
        assert_eq!(level("String(1)"), ConstantType::NotConstant);
        assert_eq!(level("local + 1"), ConstantType::NotConstant);
        assert_eq!(level("free"), ConstantType::NotConstant);
    }

    #[test]
    fn test_statements_mode() {
        let exp = SimpleExpression::new("count++; log($event)", false, Span::default());
        let is_known = |name: &str| name == "$event";
        let out = process_expression(&exp, &is_known, true, ProcessMode::Statements).unwrap();
        assert_eq!(out.code(), "_ctx.count++; _ctx.log($event)");
    }

    #[test]
    fn test_params_mode_rewrites_defaults_only() {
        let params = |source: &str, known: &[&str]| {
            let exp = SimpleExpression::new(source, false, Span::new(0, source.len() as u32));
            let is_known = |name: &str| known.contains(&name);
            process_expression(&exp, &is_known, true, ProcessMode::Params).unwrap().code()
        };
        assert_eq!(params("{ a = def }", &[]), "{ a = _ctx.def }");
        assert_eq!(params("{ item = fallback, index }", &["fallback"]), "{ item = fallback, index }");
        assert_eq!(params("[x, y = x]", &[]), "[x, y = x]");
        assert_eq!(params("{ [key]: v = { d } }", &[]), "{ [_ctx.key]: v = { d: _ctx.d } }");
        assert_eq!(params("item", &[]), "item");
    }

    #[test]
    fn test_syntax_error() {
        let exp = SimpleExpression::new("a +", false, Span::default());
        assert!(process_expression(&exp, &|_| false, true, ProcessMode::Expression).is_err());
    }

    #[test]
    fn test_no_prefix_keeps_content() {
        let exp = SimpleExpression::new("a + 1", false, Span::default());
        let out = process_expression(&exp, &|_| false, false, ProcessMode::Expression).unwrap();
        assert_eq!(out.code(), "a + 1");
        assert_eq!(out.const_type(), ConstantType::NotConstant);
    }

    #[test]
    fn test_helpers() {
        assert!(is_member_expression("a.b[c]"));
        assert!(!is_member_expression("a()"));
        assert!(is_function_expression("() => foo"));
        assert!(!is_function_expression("foo"));
        assert!(has_multiple_statements("a(); b()"));
        assert!(is_simple_identifier("$foo_1"));
        assert!(!is_simple_identifier("foo-bar"));
        assert_eq!(binding_names("{ item, index }, [k]").unwrap(), vec!["item", "index", "k"]);
    }
}
