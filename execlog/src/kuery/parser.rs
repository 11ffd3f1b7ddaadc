// Recursive descent parser. Precedence, loosest first: or, and, not.

use super::lexer::{push_escaped, tokenize, Spanned, Token, Word};
use super::{KueryNode, Literal};
use crate::errors::KueryError;

/// Parse a filter expression. Blank input yields `None`.
pub fn parse(input: &str) -> Result<Option<KueryNode>, KueryError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let node = parser.or_expr()?;
    if let Some(spanned) = parser.tokens.get(parser.pos) {
        return Err(unexpected(spanned));
    }
    Ok(Some(node))
}

/// Deepest allowed nesting of groups and `not`
pub const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

fn unexpected(spanned: &Spanned) -> KueryError {
    let found = match &spanned.token {
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::Colon => ":".to_string(),
        Token::Range(op) => op.to_string(),
        Token::And => "and".to_string(),
        Token::Or => "or".to_string(),
        Token::Not => "not".to_string(),
        Token::Quoted(text) => format!("\"{}\"", text),
        Token::Word(word) => word.text.clone(),
    };
    KueryError::UnexpectedToken {
        found,
        position: spanned.position,
    }
}

fn collapse(mut children: Vec<KueryNode>, join: fn(Vec<KueryNode>) -> KueryNode) -> KueryNode {
    if children.len() == 1 {
        children.remove(0)
    } else {
        join(children)
    }
}

fn join_and(children: Vec<KueryNode>) -> KueryNode {
    KueryNode::And { children }
}

fn join_or(children: Vec<KueryNode>) -> KueryNode {
    KueryNode::Or { children }
}

fn escape_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut pattern, c);
    }
    pattern
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &str) -> KueryError {
        match self.tokens.get(self.pos) {
            Some(spanned) => unexpected(spanned),
            None => KueryError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }

    fn expect_close(&mut self) -> Result<(), KueryError> {
        if self.eat(&Token::RParen) {
            Ok(())
        } else {
            Err(self.error_here("')'"))
        }
    }

    /// Run `f` one nesting level deeper, failing past `MAX_DEPTH`
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, KueryError>,
    ) -> Result<T, KueryError> {
        if self.depth >= MAX_DEPTH {
            let position = self
                .tokens
                .get(self.pos.saturating_sub(1))
                .map_or(0, |s| s.position);
            return Err(KueryError::TooDeep { position });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn or_expr(&mut self) -> Result<KueryNode, KueryError> {
        let mut children = vec![self.and_expr()?];
        while self.eat(&Token::Or) {
            children.push(self.and_expr()?);
        }
        Ok(collapse(children, join_or))
    }

    fn and_expr(&mut self) -> Result<KueryNode, KueryError> {
        let mut children = vec![self.not_expr()?];
        while self.eat(&Token::And) {
            children.push(self.not_expr()?);
        }
        Ok(collapse(children, join_and))
    }

    fn not_expr(&mut self) -> Result<KueryNode, KueryError> {
        if self.eat(&Token::Not) {
            let child = self.nested(Self::not_expr)?;
            return Ok(KueryNode::not(child));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<KueryNode, KueryError> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Token::LParen), _) => {
                self.pos += 1;
                let node = self.nested(Self::or_expr)?;
                self.expect_close()?;
                Ok(node)
            }
            (Some(Token::Word(_)), Some(Token::Colon)) => {
                let field = self.field_name()?;
                self.pos += 1;
                self.field_value(&field)
            }
            (Some(Token::Word(_)), Some(Token::Range(op))) => {
                let op = *op;
                let field = self.field_name()?;
                self.pos += 1;
                let value = match self.tokens.get(self.pos).map(|s| &s.token) {
                    Some(Token::Word(word)) => word.text.clone(),
                    Some(Token::Quoted(text)) => text.clone(),
                    _ => return Err(self.error_here("a range value")),
                };
                self.pos += 1;
                Ok(KueryNode::Range { field, op, value })
            }
            (Some(Token::Word(_)), _) | (Some(Token::Quoted(_)), _) => {
                let value = self.literal()?;
                Ok(KueryNode::Is { field: None, value })
            }
            _ => Err(self.error_here("a field, value or '('")),
        }
    }

    fn field_name(&mut self) -> Result<String, KueryError> {
        match self.tokens.get(self.pos).map(|s| &s.token) {
            Some(Token::Word(word)) => {
                let field = word.text.clone();
                self.pos += 1;
                Ok(field)
            }
            _ => Err(self.error_here("a field name")),
        }
    }

    fn field_value(&mut self, field: &str) -> Result<KueryNode, KueryError> {
        if self.eat(&Token::LParen) {
            let node = self.nested(|p| p.value_or(field))?;
            self.expect_close()?;
            return Ok(node);
        }
        self.field_literal(field)
    }

    fn value_or(&mut self, field: &str) -> Result<KueryNode, KueryError> {
        let mut children = vec![self.value_and(field)?];
        while self.eat(&Token::Or) {
            children.push(self.value_and(field)?);
        }
        Ok(collapse(children, join_or))
    }

    fn value_and(&mut self, field: &str) -> Result<KueryNode, KueryError> {
        let mut children = vec![self.value_not(field)?];
        while self.eat(&Token::And) {
            children.push(self.value_not(field)?);
        }
        Ok(collapse(children, join_and))
    }

    fn value_not(&mut self, field: &str) -> Result<KueryNode, KueryError> {
        if self.eat(&Token::Not) {
            let child = self.nested(|p| p.value_not(field))?;
            return Ok(KueryNode::not(child));
        }
        if self.eat(&Token::LParen) {
            let node = self.nested(|p| p.value_or(field))?;
            self.expect_close()?;
            return Ok(node);
        }
        self.field_literal(field)
    }

    fn field_literal(&mut self, field: &str) -> Result<KueryNode, KueryError> {
        let value = self.literal()?;
        if value == Literal::Wildcard("*".to_string()) {
            return Ok(KueryNode::Exists {
                field: field.to_string(),
            });
        }
        Ok(KueryNode::is(field, value))
    }

    /// A quoted phrase, or a run of adjacent unquoted words joined by single spaces
    fn literal(&mut self) -> Result<Literal, KueryError> {
        if let Some(Token::Quoted(text)) = self.peek() {
            let text = text.clone();
            self.pos += 1;
            return Ok(Literal::Phrase(text));
        }

        let mut words: Vec<Word> = Vec::new();
        while let Some(Token::Word(word)) = self.peek() {
            words.push(word.clone());
            self.pos += 1;
        }
        if words.is_empty() {
            return Err(self.error_here("a value"));
        }

        if words.iter().any(|w| w.pattern.is_some()) {
            let pattern = words
                .iter()
                .map(|w| w.pattern.clone().unwrap_or_else(|| escape_pattern(&w.text)))
                .collect::<Vec<_>>()
                .join("\\ ");
            Ok(Literal::Wildcard(pattern))
        } else {
            let text = words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(Literal::Text(text))
        }
    }
}
