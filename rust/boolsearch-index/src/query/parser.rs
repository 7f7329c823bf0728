//! Shunting-yard conversion of query tokens into an evaluation plan.

use std::fmt;

use boolsearch_common::{Result, error::Error};

use crate::query::lexer::QueryToken;

/// One step of a postfix (RPN) evaluation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOp {
    Term(String),
    And,
    Or,
    Not,
}

impl QueryOp {
    pub fn name(&self) -> &str {
        match self {
            QueryOp::Term(term) => term,
            QueryOp::And => "AND",
            QueryOp::Or => "OR",
            QueryOp::Not => "NOT",
        }
    }
}

/// A parsed query in postfix order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub ops: Vec<QueryOp>,
}

impl QueryPlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            QueryOp::Term(term) => Some(term.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(op.name())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackItem {
    And,
    Or,
    Not,
    LParen,
}

impl StackItem {
    fn precedence(self) -> u8 {
        match self {
            StackItem::Not => 3,
            StackItem::And => 2,
            StackItem::Or => 1,
            StackItem::LParen => 0,
        }
    }

    fn is_right_assoc(self) -> bool {
        self == StackItem::Not
    }

    fn into_op(self) -> Option<QueryOp> {
        match self {
            StackItem::And => Some(QueryOp::And),
            StackItem::Or => Some(QueryOp::Or),
            StackItem::Not => Some(QueryOp::Not),
            StackItem::LParen => None,
        }
    }
}

/// Converts infix tokens into a postfix plan.
///
/// `NOT` binds tightest and associates to the right, then `AND`, then `OR`;
/// both binary operators are left-associative. Unbalanced parentheses fail
/// with `MismatchedParen`. Operand counts are checked by the evaluator.
pub fn parse(tokens: &[QueryToken]) -> Result<QueryPlan> {
    let mut ops = Vec::with_capacity(tokens.len());
    let mut stack: Vec<StackItem> = Vec::new();

    for (position, token) in tokens.iter().enumerate() {
        let incoming = match token {
            QueryToken::Term(term) => {
                ops.push(QueryOp::Term(term.clone()));
                continue;
            }
            QueryToken::LParen => {
                stack.push(StackItem::LParen);
                continue;
            }
            QueryToken::RParen => {
                loop {
                    match stack.pop() {
                        Some(StackItem::LParen) => break,
                        Some(item) => ops.extend(item.into_op()),
                        None => return Err(Error::mismatched_paren(position)),
                    }
                }
                continue;
            }
            QueryToken::And => StackItem::And,
            QueryToken::Or => StackItem::Or,
            QueryToken::Not => StackItem::Not,
        };

        while let Some(&top) = stack.last() {
            let pops = top != StackItem::LParen
                && (top.precedence() > incoming.precedence()
                    || (top.precedence() == incoming.precedence()
                        && !incoming.is_right_assoc()));
            if !pops {
                break;
            }
            stack.pop();
            ops.extend(top.into_op());
        }
        stack.push(incoming);
    }

    while let Some(item) = stack.pop() {
        if item == StackItem::LParen {
            return Err(Error::mismatched_paren(tokens.len()));
        }
        ops.extend(item.into_op());
    }
    Ok(QueryPlan { ops })
}
