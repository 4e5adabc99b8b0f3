//! Tokenizer for template expressions.

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident,
    Number,
    String,
    Regex,
    /// A template literal. Holds the byte ranges of each `${...}` body.
    Template(Vec<(usize, usize)>),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// A line break precedes this token.
    pub newline_before: bool,
}

/// Longest punctuators first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=",
    "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-", "*",
    "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

/// Keywords after which a `/` starts a regex rather than a division.
const KEYWORDS_BEFORE_EXPRESSION: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Token>, ExprError> {
        loop {
            let newline_before = self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek() else {
                self.tokens.push(Token {
                    kind: TokenKind::Eof,
                    start,
                    end: start,
                    newline_before,
                });
                return Ok(self.tokens);
            };
            let kind = if is_ident_start(c) {
                self.read_ident();
                TokenKind::Ident
            } else if c.is_ascii_digit()
                || (c == '.' && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit))
            {
                self.read_number();
                TokenKind::Number
            } else if c == '"' || c == '\'' {
                self.read_string(c)?;
                TokenKind::String
            } else if c == '`' {
                TokenKind::Template(self.read_template()?)
            } else if c == '/' && self.regex_allowed() {
                self.read_regex()?;
                TokenKind::Regex
            } else {
                let rest = &self.source[self.pos..];
                let punct = PUNCTUATORS
                    .iter()
                    .find(|p| rest.starts_with(**p))
                    .ok_or_else(|| ExprError::new(format!("Unexpected character '{}'", c), start))?;
                // `?.` followed by a digit is a conditional, not optional chaining
                if *punct == "?." && self.bytes.get(self.pos + 2).is_some_and(u8::is_ascii_digit) {
                    self.pos += 1;
                    TokenKind::Punct("?")
                } else {
                    self.pos += punct.len();
                    TokenKind::Punct(punct)
                }
            };
            self.tokens.push(Token {
                kind,
                start,
                end: self.pos,
                newline_before,
            });
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and comments, returning whether a newline was seen.
    fn skip_trivia(&mut self) -> Result<bool, ExprError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    newline |= c == '\n';
                    self.advance();
                }
                Some('/') if self.source[self.pos..].starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.source[self.pos..].starts_with("/*") => {
                    let start = self.pos;
                    let end = self.source[self.pos + 2..]
                        .find("*/")
                        .ok_or_else(|| ExprError::new("Unterminated comment", start))?;
                    newline |= self.source[self.pos..self.pos + 2 + end].contains('\n');
                    self.pos += end + 4;
                }
                _ => return Ok(newline),
            }
        }
    }

    fn read_ident(&mut self) {
        while let Some(c) = self.peek() {
            if is_ident_part(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) {
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && matches!(self.bytes.get(self.pos.wrapping_sub(1)), Some(b'e' | b'E'))
                && !self.source[..self.pos].starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<(), ExprError> {
        let start = self.pos;
        self.advance();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
        Err(ExprError::new("Unterminated string literal", start))
    }

    fn read_template(&mut self) -> Result<Vec<(usize, usize)>, ExprError> {
        let start = self.pos;
        let mut parts = Vec::new();
        self.advance();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '`' => return Ok(parts),
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    let body_start = self.pos;
                    let body_end = self.skip_template_body(body_start)?;
                    parts.push((body_start, body_end));
                    self.pos = body_end + 1;
                }
                _ => {}
            }
        }
        Err(ExprError::new("Unterminated template literal", start))
    }

    /// Find the `}` closing a `${` body, honoring nested braces and strings.
    fn skip_template_body(&mut self, start: usize) -> Result<usize, ExprError> {
        let mut depth = 0usize;
        self.pos = start;
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(self.pos),
                '}' => depth -= 1,
                '"' | '\'' => {
                    self.read_string(c)?;
                    continue;
                }
                '`' => {
                    self.read_template()?;
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
        Err(ExprError::new("Unterminated template expression", start))
    }

    fn read_regex(&mut self) -> Result<(), ExprError> {
        let start = self.pos;
        self.advance();
        let mut in_class = false;
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some('\n') | None => {
                    return Err(ExprError::new("Unterminated regular expression", start))
                }
                _ => {}
            }
        }
        self.read_ident();
        Ok(())
    }

    /// A `/` starts a regex unless the previous token ends a value.
    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(token) => match &token.kind {
                TokenKind::Ident => {
                    KEYWORDS_BEFORE_EXPRESSION.contains(&&self.source[token.start..token.end])
                }
                TokenKind::Number | TokenKind::String | TokenKind::Regex | TokenKind::Template(_) => {
                    false
                }
                TokenKind::Punct(p) => !matches!(*p, ")" | "]" | "}" | "++" | "--"),
                TokenKind::Eof => true,
            },
        }
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
