//! Conditional Expressions (when / must)
//!
//! A small path-based boolean expression language over the instance tree,
//! covering the conditional constraints the validators evaluate: value
//! comparison, existence tests, `not(..)` and `and`/`or` combinations.
//!
//! ```text
//! expr       := or-expr
//! or-expr    := and-expr ( 'or' and-expr )*
//! and-expr   := unary ( 'and' unary )*
//! unary      := 'not' '(' expr ')' | '(' expr ')' | comparison
//! comparison := path ( ('=' | '!=') literal )?
//! path       := step ( '/' step )*          step := [prefix ':'] name
//! literal    := "'" chars "'"
//! ```
//!
//! Paths are resolved relative to the node the expression is attached to.
//! Intermediate steps traverse child containers; the final step reads a
//! leaf value or tests a leaf-list / container for presence.

use crate::models::{ModelNode, QName, SchemaNodeKind};
use crate::services::validation::ValidationContext;
use crate::services::SchemaRegistry;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Expression errors
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// Malformed expression source
    #[error("Cannot parse expression '{source_text}': {reason}")]
    Parse {
        /// The offending expression
        source_text: String,
        /// What went wrong
        reason: String,
    },

    /// Failure while resolving a path during evaluation
    #[error("Cannot evaluate expression: {reason}")]
    Eval {
        /// What went wrong
        reason: String,
    },
}

/// One step of a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Optional namespace prefix
    pub prefix: Option<String>,
    /// Local name
    pub name: String,
}

/// Relative path of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprPath {
    /// Steps from the context node downward
    pub steps: Vec<PathStep>,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Both operands hold
    And(Box<Expression>, Box<Expression>),
    /// Either operand holds
    Or(Box<Expression>, Box<Expression>),
    /// Operand does not hold
    Not(Box<Expression>),
    /// Path resolves to exactly the literal
    Equals(ExprPath, String),
    /// Path resolves to a value different from the literal
    NotEquals(ExprPath, String),
    /// Path resolves to any value or existing node
    Exists(ExprPath),
}

impl Expression {
    /// Parse an expression from its source text
    ///
    /// # Errors
    ///
    /// `ExpressionError::Parse` on malformed input.
    pub fn parse(source_text: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source_text).map_err(|reason| ExpressionError::Parse {
            source_text: source_text.to_owned(),
            reason,
        })?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or().map_err(|reason| ExpressionError::Parse {
            source_text: source_text.to_owned(),
            reason,
        })?;
        if parser.pos != parser.tokens.len() {
            return Err(ExpressionError::Parse {
                source_text: source_text.to_owned(),
                reason: format!("unexpected trailing input at token {}", parser.pos),
            });
        }
        Ok(expr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Eq,
    NotEq,
    And,
    Or,
    Not,
    Literal(String),
    Path(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err("expected '=' after '!'".to_owned());
                }
                tokens.push(Token::NotEq);
            }
            '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => literal.push(ch),
                        None => return Err("unterminated string literal".to_owned()),
                    }
                }
                tokens.push(Token::Literal(literal));
            }
            _ if c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | ':' | '/') => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | ':' | '/') {
                        word.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Path(word),
                });
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: &Token) -> Result<(), String> {
        match self.next() {
            Some(t) if &t == token => Ok(()),
            other => Err(format!("expected {token:?}, found {other:?}")),
        }
    }

    fn parse_or(&mut self) -> Result<Expression, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, String> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.parse_unary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, String> {
        match self.peek() {
            Some(Token::Not) => {
                self.next();
                self.expect(&Token::Open)?;
                let inner = self.parse_or()?;
                self.expect(&Token::Close)?;
                Ok(Expression::Not(Box::new(inner)))
            }
            Some(Token::Open) => {
                self.next();
                let inner = self.parse_or()?;
                self.expect(&Token::Close)?;
                Ok(inner)
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression, String> {
        let path = match self.next() {
            Some(Token::Path(p)) => parse_path(&p)?,
            other => return Err(format!("expected path, found {other:?}")),
        };
        match self.peek() {
            Some(Token::Eq) => {
                self.next();
                let literal = self.parse_literal()?;
                Ok(Expression::Equals(path, literal))
            }
            Some(Token::NotEq) => {
                self.next();
                let literal = self.parse_literal()?;
                Ok(Expression::NotEquals(path, literal))
            }
            _ => Ok(Expression::Exists(path)),
        }
    }

    fn parse_literal(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Token::Literal(l)) => Ok(l),
            other => Err(format!("expected string literal, found {other:?}")),
        }
    }
}

fn parse_path(raw: &str) -> Result<ExprPath, String> {
    if raw.starts_with('/') || raw.contains("..") {
        return Err(format!("only descendant-relative paths are supported: '{raw}'"));
    }
    let mut steps = Vec::new();
    for part in raw.split('/') {
        if part.is_empty() {
            return Err(format!("empty path step in '{raw}'"));
        }
        let (prefix, name) = match part.split_once(':') {
            Some((prefix, name)) => (Some(prefix.to_owned()), name.to_owned()),
            None => (None, part.to_owned()),
        };
        if name.is_empty() {
            return Err(format!("empty local name in '{raw}'"));
        }
        steps.push(PathStep { prefix, name });
    }
    Ok(ExprPath { steps })
}

/// Evaluates parsed expressions against the instance tree.
pub struct ExpressionEvaluator<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> ExpressionEvaluator<'r> {
    /// Evaluator over the given registry
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate `expr` relative to `ctx_node`, resolving child containers
    /// through the per-request context cache.
    ///
    /// # Errors
    ///
    /// `ExpressionError::Eval` when a path step names a schema node the
    /// registry does not know.
    pub fn evaluate<'e>(
        &'e self,
        expr: &'e Expression,
        ctx_node: &'e ModelNode,
        vctx: &'e mut ValidationContext<'_>,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ExpressionError>> + Send + 'e>> {
        Box::pin(async move {
            match expr {
                Expression::And(left, right) => {
                    Ok(self.evaluate(left, ctx_node, vctx).await?
                        && self.evaluate(right, ctx_node, vctx).await?)
                }
                Expression::Or(left, right) => {
                    Ok(self.evaluate(left, ctx_node, vctx).await?
                        || self.evaluate(right, ctx_node, vctx).await?)
                }
                Expression::Not(inner) => Ok(!self.evaluate(inner, ctx_node, vctx).await?),
                Expression::Equals(path, literal) => {
                    Ok(self.resolve_value(path, ctx_node, vctx).await? == Some(literal.clone()))
                }
                Expression::NotEquals(path, literal) => Ok(self
                    .resolve_value(path, ctx_node, vctx)
                    .await?
                    .is_some_and(|v| &v != literal)),
                Expression::Exists(path) => self.resolve_exists(path, ctx_node, vctx).await,
            }
        })
    }

    fn step_qname(&self, step: &PathStep, context: &ModelNode) -> Result<QName, ExpressionError> {
        let namespace = match &step.prefix {
            Some(prefix) => self
                .registry
                .namespace_for_prefix(prefix)
                .ok_or_else(|| ExpressionError::Eval {
                    reason: format!("unknown prefix '{prefix}'"),
                })?
                .to_owned(),
            None => context
                .qname()
                .map(|q| q.namespace.clone())
                .unwrap_or_default(),
        };
        Ok(QName::new(namespace, step.name.clone()))
    }

    /// Walk all but the last step through child containers; returns the
    /// node owning the final step, or `None` when the chain breaks.
    async fn resolve_context(
        &self,
        path: &ExprPath,
        ctx_node: &ModelNode,
        vctx: &mut ValidationContext<'_>,
    ) -> Result<Option<(ModelNode, QName)>, ExpressionError> {
        let mut current = ctx_node.clone();
        for (i, step) in path.steps.iter().enumerate() {
            let qname = self.step_qname(step, &current)?;
            if i + 1 == path.steps.len() {
                return Ok(Some((current, qname)));
            }
            let Some(child_schema) = self
                .registry
                .data_child_by_name(&current.schema_path, &qname)
                .cloned()
            else {
                return Err(ExpressionError::Eval {
                    reason: format!("unknown path step '{}'", step.name),
                });
            };
            if !matches!(child_schema.kind, SchemaNodeKind::Container { .. }) {
                return Err(ExpressionError::Eval {
                    reason: format!("path step '{}' is not a container", step.name),
                });
            }
            match vctx.child_container(&current, &child_schema).await {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    async fn resolve_value(
        &self,
        path: &ExprPath,
        ctx_node: &ModelNode,
        vctx: &mut ValidationContext<'_>,
    ) -> Result<Option<String>, ExpressionError> {
        let Some((owner, qname)) = self.resolve_context(path, ctx_node, vctx).await? else {
            return Ok(None);
        };
        Ok(owner.attribute(&qname).map(|v| v.value.clone()))
    }

    async fn resolve_exists(
        &self,
        path: &ExprPath,
        ctx_node: &ModelNode,
        vctx: &mut ValidationContext<'_>,
    ) -> Result<bool, ExpressionError> {
        let Some((owner, qname)) = self.resolve_context(path, ctx_node, vctx).await? else {
            return Ok(false);
        };
        if owner.attribute(&qname).is_some() {
            return Ok(true);
        }
        if owner.leaf_list(&qname).is_some_and(|v| !v.is_empty()) {
            return Ok(true);
        }
        let Some(child_schema) = self
            .registry
            .data_child_by_name(&owner.schema_path, &qname)
            .cloned()
        else {
            return Ok(false);
        };
        match child_schema.kind {
            SchemaNodeKind::Container { .. } => {
                Ok(vctx.child_container(&owner, &child_schema).await.is_some())
            }
            SchemaNodeKind::List(_) => {
                Ok(!vctx.child_list(&owner, &child_schema).await.is_empty())
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equality() {
        let expr = Expression::parse("mode = 'static'").unwrap();
        assert_eq!(
            expr,
            Expression::Equals(
                ExprPath {
                    steps: vec![PathStep {
                        prefix: None,
                        name: "mode".into()
                    }]
                },
                "static".into()
            )
        );
    }

    #[test]
    fn test_parse_boolean_combination() {
        let expr = Expression::parse("not(mode = 'dhcp') and enabled = 'true'").unwrap();
        assert!(matches!(expr, Expression::And(_, _)));
    }

    #[test]
    fn test_parse_nested_path_with_prefix() {
        let expr = Expression::parse("routing/if:mode != 'off'").unwrap();
        let Expression::NotEquals(path, literal) = expr else {
            panic!("expected not-equals");
        };
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[1].prefix.as_deref(), Some("if"));
        assert_eq!(literal, "off");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Expression::parse("mode = ").is_err());
        assert!(Expression::parse("= 'x'").is_err());
        assert!(Expression::parse("not(mode").is_err());
        assert!(Expression::parse("../mode = 'x'").is_err());
        assert!(Expression::parse("mode = 'unterminated").is_err());
    }
}
