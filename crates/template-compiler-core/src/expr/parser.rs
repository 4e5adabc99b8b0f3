//! Recursive-descent parser for the JavaScript subset used in templates.
//!
//! The tree only keeps what identifier analysis needs: identifier sites,
//! binding patterns and the nesting of function scopes.

use super::lexer::{tokenize, Token, TokenKind};
use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Ident {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Ident(Ident),
    /// Number, string, regex, `true`, `false`, `null`.
    Literal,
    This,
    /// Template literal or tagged template.
    Template { tag: Option<Box<Expr>>, parts: Vec<Expr> },
    Array(Vec<Expr>),
    Object(Vec<ObjectProp>),
    Function(Box<Function>),
    Unary(Box<Expr>),
    Binary(Box<Expr>, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Sequence(Vec<Expr>),
    Member { object: Box<Expr>, property: MemberProp },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { callee: Box<Expr>, args: Vec<Expr> },
    Spread(Box<Expr>),
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemberProp {
    Named,
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ObjectProp {
    KeyValue { key: PropKey, value: Expr },
    Shorthand(Ident),
    Method { key: PropKey, function: Function },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PropKey {
    Named,
    Computed(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pattern {
    Ident(Ident),
    Object(Vec<PatternProp>),
    Array(Vec<Option<Pattern>>),
    Default(Box<Pattern>, Expr),
    Rest(Box<Pattern>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PatternProp {
    KeyValue { key: PropKey, value: Pattern },
    Shorthand(Ident, Option<Expr>),
    Rest(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Function {
    /// Name of a named `function` expression, visible inside its body.
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FunctionBody {
    Expr(Expr),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Expr(Expr),
    Return(Option<Expr>),
    Decl(Vec<(Pattern, Option<Expr>)>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    Block(Vec<Stmt>),
    Empty,
}

impl Pattern {
    /// Names bound by this pattern, in source order.
    pub fn bound_names(&self, out: &mut Vec<Ident>) {
        match self {
            Pattern::Ident(id) => out.push(id.clone()),
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        PatternProp::KeyValue { value, .. } => value.bound_names(out),
                        PatternProp::Shorthand(id, _) => out.push(id.clone()),
                        PatternProp::Rest(p) => p.bound_names(out),
                    }
                }
            }
            Pattern::Array(items) => {
                for item in items.iter().flatten() {
                    item.bound_names(out);
                }
            }
            Pattern::Default(p, _) | Pattern::Rest(p) => p.bound_names(out),
        }
    }
}

/// Parse a single expression.
pub(crate) fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse a statement list, as written in inline event handlers.
pub(crate) fn parse_statements(source: &str) -> Result<Vec<Stmt>, ExprError> {
    let mut parser = Parser::new(source)?;
    let mut stmts = Vec::new();
    while !parser.at_eof() {
        stmts.push(parser.statement()?);
    }
    Ok(stmts)
}

/// Parse a comma-separated parameter list without parentheses.
pub(crate) fn parse_params(source: &str) -> Result<Vec<Pattern>, ExprError> {
    let mut parser = Parser::new(source)?;
    let mut params = Vec::new();
    while !parser.at_eof() {
        params.push(parser.param()?);
        if !parser.eat(",") {
            break;
        }
    }
    parser.expect_eof()?;
    Ok(params)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Self, ExprError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn text(&self, token: &Token) -> &'a str {
        &self.source[token.start..token.end]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn is(&self, punct: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(p) if p == punct)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.peek().kind == TokenKind::Ident && self.text(self.peek()) == keyword
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.is(punct) {
            self.next();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn expect_eof(&self) -> Result<(), ExprError> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", self.text(token))
        };
        ExprError::new(format!("Expected {}, found {}", expected, found), token.start)
    }

    fn ident(&mut self) -> Result<Ident, ExprError> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Ident || is_reserved_word(self.text(&token)) {
            return Err(self.unexpected("identifier"));
        }
        self.next();
        Ok(Ident {
            name: self.text(&token).to_string(),
            start: token.start,
            end: token.end,
        })
    }

    // statements

    fn statement(&mut self) -> Result<Stmt, ExprError> {
        if self.eat(";") {
            return Ok(Stmt::Empty);
        }
        if self.eat("{") {
            let mut body = Vec::new();
            while !self.eat("}") {
                if self.at_eof() {
                    return Err(self.unexpected("'}'"));
                }
                body.push(self.statement()?);
            }
            return Ok(Stmt::Block(body));
        }
        if self.eat_keyword("return") {
            let value = if self.is(";") || self.is("}") || self.at_eof() || self.peek().newline_before {
                None
            } else {
                Some(self.expression()?)
            };
            self.eat(";");
            return Ok(Stmt::Return(value));
        }
        if self.is_keyword("const") || self.is_keyword("let") || self.is_keyword("var") {
            self.next();
            let mut decls = Vec::new();
            loop {
                let pattern = self.binding_target()?;
                let init = if self.eat("=") {
                    Some(self.assignment()?)
                } else {
                    None
                };
                decls.push((pattern, init));
                if !self.eat(",") {
                    break;
                }
            }
            self.eat(";");
            return Ok(Stmt::Decl(decls));
        }
        if self.eat_keyword("if") {
            self.expect("(")?;
            let test = self.expression()?;
            self.expect(")")?;
            let consequent = Box::new(self.statement()?);
            let alternate = if self.eat_keyword("else") {
                Some(Box::new(self.statement()?))
            } else {
                None
            };
            return Ok(Stmt::If(test, consequent, alternate));
        }
        let expr = self.expression()?;
        self.eat(";");
        Ok(Stmt::Expr(expr))
    }

    // expressions

    fn expression(&mut self) -> Result<Expr, ExprError> {
        let first = self.assignment()?;
        if !self.is(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(",") {
            items.push(self.assignment()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn assignment(&mut self) -> Result<Expr, ExprError> {
        if let Some(function) = self.try_arrow()? {
            return Ok(Expr::Function(Box::new(function)));
        }
        let target = self.conditional()?;
        if let TokenKind::Punct(p) = self.peek().kind {
            if is_assignment_operator(p) {
                self.next();
                let value = self.assignment()?;
                return Ok(Expr::Assign(Box::new(target), Box::new(value)));
            }
        }
        Ok(target)
    }

    /// Parse an arrow function if one starts here.
    fn try_arrow(&mut self) -> Result<Option<Function>, ExprError> {
        let start = self.pos;
        let is_async = self.is_keyword("async")
            && !self.peek_at(1).newline_before
            && (matches!(self.peek_at(1).kind, TokenKind::Ident)
                || matches!(self.peek_at(1).kind, TokenKind::Punct("(")));
        let offset = usize::from(is_async);

        let token = self.peek_at(offset).clone();
        let arrow_params = match token.kind {
            TokenKind::Ident if matches!(self.peek_at(offset + 1).kind, TokenKind::Punct("=>")) => {
                self.pos += offset;
                let id = self.ident()?;
                vec![Pattern::Ident(id)]
            }
            TokenKind::Punct("(") => {
                let Some(close) = self.matching_paren(self.pos + offset) else {
                    return Ok(None);
                };
                if !matches!(self.tokens.get(close + 1).map(|t| &t.kind), Some(TokenKind::Punct("=>"))) {
                    return Ok(None);
                }
                self.pos += offset + 1;
                let mut params = Vec::new();
                while !self.eat(")") {
                    params.push(self.param()?);
                    if !self.is(")") {
                        self.expect(",")?;
                    }
                }
                params
            }
            _ => return Ok(None),
        };
        if !self.eat("=>") {
            self.pos = start;
            return Ok(None);
        }
        let body = if self.is("{") {
            self.next();
            FunctionBody::Block(self.block_body()?)
        } else {
            FunctionBody::Expr(self.assignment()?)
        };
        Ok(Some(Function {
            name: None,
            params: arrow_params,
            body,
        }))
    }

    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::Punct("(") | TokenKind::Punct("[") | TokenKind::Punct("{") => depth += 1,
                TokenKind::Punct(")") | TokenKind::Punct("]") | TokenKind::Punct("}") => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Statements up to and including the closing `}`.
    fn block_body(&mut self) -> Result<Vec<Stmt>, ExprError> {
        let mut body = Vec::new();
        while !self.eat("}") {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.binary(0)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.assignment()?;
        self.expect(":")?;
        let alternate = self.assignment()?;
        Ok(Expr::Conditional(
            Box::new(test),
            Box::new(consequent),
            Box::new(alternate),
        ))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let token = self.peek();
            let operator = match token.kind {
                TokenKind::Punct(p) => p,
                TokenKind::Ident => match self.text(token) {
                    "in" => "in",
                    "instanceof" => "instanceof",
                    _ => break,
                },
                _ => break,
            };
            let Some(precedence) = binary_precedence(operator) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.next();
            // `**` is right-associative
            let next_min = if operator == "**" { precedence } else { precedence + 1 };
            let right = self.binary(next_min)?;
            left = Expr::Binary(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let token = self.peek().clone();
        let is_prefix = match token.kind {
            TokenKind::Punct(p) => matches!(p, "!" | "~" | "+" | "-" | "++" | "--"),
            TokenKind::Ident => matches!(self.text(&token), "typeof" | "void" | "delete" | "await"),
            _ => false,
        };
        if is_prefix {
            self.next();
            return Ok(Expr::Unary(Box::new(self.unary()?)));
        }
        let expr = self.postfix()?;
        if (self.is("++") || self.is("--")) && !self.peek().newline_before {
            self.next();
            return Ok(Expr::Unary(Box::new(expr)));
        }
        Ok(expr)
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = if self.eat_keyword("new") {
            if self.eat(".") {
                // new.target
                self.ident()?;
                Expr::Literal
            } else {
                let callee = self.member_only()?;
                let args = if self.is("(") { self.arguments()? } else { Vec::new() };
                Expr::New {
                    callee: Box::new(callee),
                    args,
                }
            }
        } else {
            self.primary()?
        };
        loop {
            if self.eat(".") || self.eat("?.") {
                if self.is("(") {
                    let args = self.arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                } else if self.eat("[") {
                    let property = self.expression()?;
                    self.expect("]")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(property)),
                    };
                } else {
                    self.property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Named,
                    };
                }
            } else if self.eat("[") {
                let property = self.expression()?;
                self.expect("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: MemberProp::Computed(Box::new(property)),
                };
            } else if self.is("(") {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if matches!(self.peek().kind, TokenKind::Template(_)) {
                let parts = self.template_parts()?;
                expr = Expr::Template {
                    tag: Some(Box::new(expr)),
                    parts,
                };
            } else if self.is("!") && !self.peek().newline_before && self.ends_non_null_assertion() {
                self.next();
            } else {
                return Ok(expr);
            }
        }
    }

    /// `a!.b` style assertions only when the `!` is followed by a member access.
    fn ends_non_null_assertion(&self) -> bool {
        matches!(self.peek_at(1).kind, TokenKind::Punct(".") | TokenKind::Punct("["))
    }

    /// Member chain without calls, the callee of `new`.
    fn member_only(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                self.property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: MemberProp::Named,
                };
            } else if self.eat("[") {
                let property = self.expression()?;
                self.expect("]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: MemberProp::Computed(Box::new(property)),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn property_name(&mut self) -> Result<(), ExprError> {
        // private names such as `#x`
        self.eat("#");
        if self.peek().kind == TokenKind::Ident {
            self.next();
            Ok(())
        } else {
            Err(self.unexpected("property name"))
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        self.expect("(")?;
        let mut args = Vec::new();
        while !self.eat(")") {
            if self.eat("...") {
                args.push(Expr::Spread(Box::new(self.assignment()?)));
            } else {
                args.push(self.assignment()?);
            }
            if !self.is(")") {
                self.expect(",")?;
            }
        }
        Ok(args)
    }

    fn template_parts(&mut self) -> Result<Vec<Expr>, ExprError> {
        let token = self.next();
        let TokenKind::Template(ranges) = token.kind else {
            return Err(self.unexpected("template literal"));
        };
        let mut parts = Vec::new();
        for (start, end) in ranges {
            let expr = parse_expression(&self.source[start..end])
                .map_err(|e| ExprError::new(e.message, e.offset + start))?;
            parts.push(shift_expr(expr, start));
        }
        Ok(parts)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Number | TokenKind::String | TokenKind::Regex => {
                self.next();
                Ok(Expr::Literal)
            }
            TokenKind::Template(_) => Ok(Expr::Template {
                tag: None,
                parts: self.template_parts()?,
            }),
            TokenKind::Punct("(") => {
                self.next();
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenKind::Punct("[") => {
                self.next();
                let mut items = Vec::new();
                while !self.eat("]") {
                    if self.is(",") {
                        self.next();
                        continue;
                    }
                    if self.eat("...") {
                        items.push(Expr::Spread(Box::new(self.assignment()?)));
                    } else {
                        items.push(self.assignment()?);
                    }
                    if !self.is("]") {
                        self.expect(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            TokenKind::Punct("{") => {
                self.next();
                self.object_literal()
            }
            TokenKind::Ident => match self.text(&token) {
                "true" | "false" | "null" => {
                    self.next();
                    Ok(Expr::Literal)
                }
                "this" => {
                    self.next();
                    Ok(Expr::This)
                }
                "function" => {
                    self.next();
                    Ok(Expr::Function(Box::new(self.function_rest()?)))
                }
                "async" if self.peek_at(1).kind == TokenKind::Ident
                    && self.text(self.peek_at(1)) == "function" =>
                {
                    self.next();
                    self.next();
                    Ok(Expr::Function(Box::new(self.function_rest()?)))
                }
                _ => Ok(Expr::Ident(self.ident()?)),
            },
            _ => Err(self.unexpected("expression")),
        }
    }

    /// After the `function` keyword.
    fn function_rest(&mut self) -> Result<Function, ExprError> {
        self.eat("*");
        let name = if self.peek().kind == TokenKind::Ident {
            Some(self.ident()?.name)
        } else {
            None
        };
        self.expect("(")?;
        let mut params = Vec::new();
        while !self.eat(")") {
            params.push(self.param()?);
            if !self.is(")") {
                self.expect(",")?;
            }
        }
        self.expect("{")?;
        Ok(Function {
            name,
            params,
            body: FunctionBody::Block(self.block_body()?),
        })
    }

    /// After the opening `{`.
    fn object_literal(&mut self) -> Result<Expr, ExprError> {
        let mut props = Vec::new();
        while !self.eat("}") {
            if self.eat("...") {
                props.push(ObjectProp::Spread(self.assignment()?));
            } else {
                // getters, setters and async methods
                let modifier = self.peek().kind == TokenKind::Ident
                    && matches!(self.text(self.peek()), "get" | "set" | "async")
                    && !matches!(
                        self.peek_at(1).kind,
                        TokenKind::Punct(",") | TokenKind::Punct(":") | TokenKind::Punct("(") | TokenKind::Punct("}")
                    );
                if modifier {
                    self.next();
                }
                self.eat("*");
                let key_token = self.peek().clone();
                let key = self.prop_key()?;
                if self.eat(":") {
                    props.push(ObjectProp::KeyValue {
                        key,
                        value: self.assignment()?,
                    });
                } else if self.eat("(") {
                    let mut params = Vec::new();
                    while !self.eat(")") {
                        params.push(self.param()?);
                        if !self.is(")") {
                            self.expect(",")?;
                        }
                    }
                    self.expect("{")?;
                    props.push(ObjectProp::Method {
                        key,
                        function: Function {
                            name: None,
                            params,
                            body: FunctionBody::Block(self.block_body()?),
                        },
                    });
                } else if key_token.kind == TokenKind::Ident && key == PropKey::Named {
                    let name = self.text(&key_token);
                    if is_reserved_word(name) {
                        return Err(ExprError::new(format!("Unexpected keyword '{}'", name), key_token.start));
                    }
                    props.push(ObjectProp::Shorthand(Ident {
                        name: name.to_string(),
                        start: key_token.start,
                        end: key_token.end,
                    }));
                } else {
                    return Err(self.unexpected("':'"));
                }
            }
            if !self.is("}") {
                self.expect(",")?;
            }
        }
        Ok(Expr::Object(props))
    }

    fn prop_key(&mut self) -> Result<PropKey, ExprError> {
        match self.peek().kind {
            TokenKind::Ident | TokenKind::String | TokenKind::Number => {
                self.next();
                Ok(PropKey::Named)
            }
            TokenKind::Punct("[") => {
                self.next();
                let key = self.assignment()?;
                self.expect("]")?;
                Ok(PropKey::Computed(key))
            }
            _ => Err(self.unexpected("property key")),
        }
    }

    // patterns

    fn param(&mut self) -> Result<Pattern, ExprError> {
        if self.eat("...") {
            return Ok(Pattern::Rest(Box::new(self.binding_target()?)));
        }
        self.binding_pattern()
    }

    /// A binding target with an optional default.
    fn binding_pattern(&mut self) -> Result<Pattern, ExprError> {
        let target = self.binding_target()?;
        if self.eat("=") {
            let default = self.assignment()?;
            return Ok(Pattern::Default(Box::new(target), default));
        }
        Ok(target)
    }

    fn binding_target(&mut self) -> Result<Pattern, ExprError> {
        if self.eat("{") {
            let mut props = Vec::new();
            while !self.eat("}") {
                if self.eat("...") {
                    props.push(PatternProp::Rest(self.binding_target()?));
                } else {
                    let key_token = self.peek().clone();
                    let key = self.prop_key()?;
                    if self.eat(":") {
                        props.push(PatternProp::KeyValue {
                            key,
                            value: self.binding_pattern()?,
                        });
                    } else if key_token.kind == TokenKind::Ident && key == PropKey::Named {
                        let id = Ident {
                            name: self.text(&key_token).to_string(),
                            start: key_token.start,
                            end: key_token.end,
                        };
                        let default = if self.eat("=") {
                            Some(self.assignment()?)
                        } else {
                            None
                        };
                        props.push(PatternProp::Shorthand(id, default));
                    } else {
                        return Err(self.unexpected("':'"));
                    }
                }
                if !self.is("}") {
                    self.expect(",")?;
                }
            }
            return Ok(Pattern::Object(props));
        }
        if self.eat("[") {
            let mut items = Vec::new();
            while !self.eat("]") {
                if self.eat(",") {
                    items.push(None);
                    continue;
                }
                let item = if self.eat("...") {
                    Pattern::Rest(Box::new(self.binding_target()?))
                } else {
                    self.binding_pattern()?
                };
                items.push(Some(item));
                if !self.is("]") {
                    self.expect(",")?;
                }
            }
            return Ok(Pattern::Array(items));
        }
        Ok(Pattern::Ident(self.ident()?))
    }
}

fn is_assignment_operator(p: &str) -> bool {
    matches!(
        p,
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "**=" | "<<=" | ">>=" | ">>>=" | "&=" | "|=" | "^="
            | "&&=" | "||=" | "??="
    )
}

fn binary_precedence(operator: &str) -> Option<u8> {
    Some(match operator {
        "??" => 1,
        "||" => 2,
        "&&" => 3,
        "|" => 4,
        "^" => 5,
        "&" => 6,
        "==" | "!=" | "===" | "!==" => 7,
        "<" | ">" | "<=" | ">=" | "in" | "instanceof" => 8,
        "<<" | ">>" | ">>>" => 9,
        "+" | "-" => 10,
        "*" | "/" | "%" => 11,
        "**" => 12,
        _ => return None,
    })
}

/// Words that can never be identifier references.
pub(crate) fn is_reserved_word(word: &str) -> bool {
    matches!(
        word,
        "break" | "case" | "catch" | "class" | "const" | "continue" | "debugger" | "default"
            | "delete" | "do" | "else" | "export" | "extends" | "finally" | "for" | "function"
            | "if" | "import" | "in" | "instanceof" | "new" | "return" | "super" | "switch"
            | "this" | "throw" | "try" | "typeof" | "var" | "void" | "while" | "with" | "true"
            | "false" | "null"
    )
}

/// Rebase identifier offsets of a sub-expression parsed from a slice.
fn shift_expr(expr: Expr, offset: usize) -> Expr {
    let shift_ident = |id: Ident| Ident {
        name: id.name,
        start: id.start + offset,
        end: id.end + offset,
    };
    let shift_box = |e: Box<Expr>| Box::new(shift_expr(*e, offset));
    let shift_vec = |v: Vec<Expr>| -> Vec<Expr> { v.into_iter().map(|e| shift_expr(e, offset)).collect() };
    match expr {
        Expr::Ident(id) => Expr::Ident(shift_ident(id)),
        Expr::Literal => Expr::Literal,
        Expr::This => Expr::This,
        Expr::Template { tag, parts } => Expr::Template {
            tag: tag.map(shift_box),
            parts: shift_vec(parts),
        },
        Expr::Array(items) => Expr::Array(shift_vec(items)),
        Expr::Object(props) => Expr::Object(
            props
                .into_iter()
                .map(|p| shift_object_prop(p, offset))
                .collect(),
        ),
        Expr::Function(f) => Expr::Function(Box::new(shift_function(*f, offset))),
        Expr::Unary(e) => Expr::Unary(shift_box(e)),
        Expr::Binary(a, b) => Expr::Binary(shift_box(a), shift_box(b)),
        Expr::Assign(a, b) => Expr::Assign(shift_box(a), shift_box(b)),
        Expr::Conditional(a, b, c) => Expr::Conditional(shift_box(a), shift_box(b), shift_box(c)),
        Expr::Sequence(items) => Expr::Sequence(shift_vec(items)),
        Expr::Member { object, property } => Expr::Member {
            object: shift_box(object),
            property: match property {
                MemberProp::Named => MemberProp::Named,
                MemberProp::Computed(e) => MemberProp::Computed(shift_box(e)),
            },
        },
        Expr::Call { callee, args } => Expr::Call {
            callee: shift_box(callee),
            args: shift_vec(args),
        },
        Expr::New { callee, args } => Expr::New {
            callee: shift_box(callee),
            args: shift_vec(args),
        },
        Expr::Spread(e) => Expr::Spread(shift_box(e)),
        Expr::Paren(e) => Expr::Paren(shift_box(e)),
    }
}

fn shift_key(key: PropKey, offset: usize) -> PropKey {
    match key {
        PropKey::Named => PropKey::Named,
        PropKey::Computed(e) => PropKey::Computed(shift_expr(e, offset)),
    }
}

fn shift_object_prop(prop: ObjectProp, offset: usize) -> ObjectProp {
    match prop {
        ObjectProp::KeyValue { key, value } => ObjectProp::KeyValue {
            key: shift_key(key, offset),
            value: shift_expr(value, offset),
        },
        ObjectProp::Shorthand(id) => ObjectProp::Shorthand(Ident {
            name: id.name,
            start: id.start + offset,
            end: id.end + offset,
        }),
        ObjectProp::Method { key, function } => ObjectProp::Method {
            key: shift_key(key, offset),
            function: shift_function(function, offset),
        },
        ObjectProp::Spread(e) => ObjectProp::Spread(shift_expr(e, offset)),
    }
}

fn shift_pattern(pattern: Pattern, offset: usize) -> Pattern {
    let shift_ident = |id: Ident| Ident {
        name: id.name,
        start: id.start + offset,
        end: id.end + offset,
    };
    match pattern {
        Pattern::Ident(id) => Pattern::Ident(shift_ident(id)),
        Pattern::Object(props) => Pattern::Object(
            props
                .into_iter()
                .map(|p| match p {
                    PatternProp::KeyValue { key, value } => PatternProp::KeyValue {
                        key: shift_key(key, offset),
                        value: shift_pattern(value, offset),
                    },
                    PatternProp::Shorthand(id, default) => PatternProp::Shorthand(
                        shift_ident(id),
                        default.map(|d| shift_expr(d, offset)),
                    ),
                    PatternProp::Rest(p) => PatternProp::Rest(shift_pattern(p, offset)),
                })
                .collect(),
        ),
        Pattern::Array(items) => Pattern::Array(
            items
                .into_iter()
                .map(|item| item.map(|p| shift_pattern(p, offset)))
                .collect(),
        ),
        Pattern::Default(p, d) => {
            Pattern::Default(Box::new(shift_pattern(*p, offset)), shift_expr(d, offset))
        }
        Pattern::Rest(p) => Pattern::Rest(Box::new(shift_pattern(*p, offset))),
    }
}

fn shift_stmt(stmt: Stmt, offset: usize) -> Stmt {
    match stmt {
        Stmt::Expr(e) => Stmt::Expr(shift_expr(e, offset)),
        Stmt::Return(e) => Stmt::Return(e.map(|e| shift_expr(e, offset))),
        Stmt::Decl(decls) => Stmt::Decl(
            decls
                .into_iter()
                .map(|(p, init)| (shift_pattern(p, offset), init.map(|e| shift_expr(e, offset))))
                .collect(),
        ),
        Stmt::If(test, consequent, alternate) => Stmt::If(
            shift_expr(test, offset),
            Box::new(shift_stmt(*consequent, offset)),
            alternate.map(|s| Box::new(shift_stmt(*s, offset))),
        ),
        Stmt::Block(body) => Stmt::Block(body.into_iter().map(|s| shift_stmt(s, offset)).collect()),
        Stmt::Empty => Stmt::Empty,
    }
}

fn shift_function(function: Function, offset: usize) -> Function {
    Function {
        name: function.name,
        params: function
            .params
            .into_iter()
            .map(|p| shift_pattern(p, offset))
            .collect(),
        body: match function.body {
            FunctionBody::Expr(e) => FunctionBody::Expr(shift_expr(e, offset)),
            FunctionBody::Block(body) => {
                FunctionBody::Block(body.into_iter().map(|s| shift_stmt(s, offset)).collect())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_call_chain() {
        let expr = parse_expression("a.b?.c(d)[e]").unwrap();
        assert!(matches!(expr, Expr::Member { property: MemberProp::Computed(_), .. }));
    }

    #[test]
    fn test_parse_arrow_functions() {
        assert!(matches!(parse_expression("x => x + 1").unwrap(), Expr::Function(_)));
        assert!(matches!(
            parse_expression("({ a, b = 1 }, ...rest) => { return a }").unwrap(),
            Expr::Function(_)
        ));
        assert!(matches!(parse_expression("async (e) => await e").unwrap(), Expr::Function(_)));
        // parenthesized expression is not an arrow
        assert!(matches!(parse_expression("(a, b)").unwrap(), Expr::Paren(_)));
    }

    #[test]
    fn test_parse_object_literal_forms() {
        let expr = parse_expression("{ a, 'b': 1, [c]: d, ...e, f() { return 1 } }").unwrap();
        match expr {
            Expr::Object(props) => assert_eq!(props.len(), 5),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_statements() {
        let stmts = parse_statements("foo($event); bar = 1\nbaz()").unwrap();
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_template_literal_offsets() {
        let expr = parse_expression("`${abc}`").unwrap();
        match expr {
            Expr::Template { parts, .. } => {
                assert_eq!(parts, vec![Expr::Ident(Ident { name: "abc".into(), start: 3, end: 6 })]);
            }
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_bound_names() {
        let params = parse_params("{ a, b: [c, , d = 1], ...e }, f = a").unwrap();
        let mut names = Vec::new();
        for param in &params {
            param.bound_names(&mut names);
        }
        let names: Vec<_> = names.into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expression("a +").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("{ if }").is_err());
    }
}
