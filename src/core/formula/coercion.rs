//! Type-coercion rules for `+`
//!
//! `+` between two column references means different things depending on the
//! columns' current types. For every ordered pair of the table's columns
//! (table order, left operand in the outer loop), each occurrence of the
//! token pattern `[A] + [B]` is replaced by a coerced term carrying the rule
//! that applies. Pairs are visited in a fixed order, so when patterns overlap
//! (`[a] + [b] + [c]`) the first pair visited claims the shared operand.
//!
//! The scan is quadratic in the number of columns, which is fine for the
//! tens of columns an interactive dataset has.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::resolver::reference;
use super::tokenizer::Token;
use crate::core::dates::is_date_like;
use crate::types::{Column, ColumnType, Table};

/// Meaning chosen for `A + B`, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionRule {
    /// Date-like text plus a number: parse A as dates, add B days
    ParsedDatePlusDays,
    /// Date column plus a number: add B days
    DatePlusDays,
    /// Text plus a number: A concatenated with B's text form
    TextPlusNumber,
    /// Number plus text: A's text form concatenated with B
    NumberPlusText,
}

/// A `[left] + [right]` pair rewritten under a coercion rule
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedAdd {
    pub rule: CoercionRule,
    pub left: String,
    pub right: String,
}

impl fmt::Display for CoercedAdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (l, r) = (reference(&self.left), reference(&self.right));
        match self.rule {
            CoercionRule::ParsedDatePlusDays => write!(f, "to_date({}) + days({})", l, r),
            CoercionRule::DatePlusDays => write!(f, "{} + days({})", l, r),
            CoercionRule::TextPlusNumber => write!(f, "concat({}, to_text({}))", l, r),
            CoercionRule::NumberPlusText => write!(f, "concat(to_text({}), {})", l, r),
        }
    }
}

/// Pick the rule for `left + right`, or `None` for plain addition
pub fn select_rule(left: &Column, right: &Column) -> Option<CoercionRule> {
    let (lt, rt) = (left.column_type(), right.column_type());

    if lt == ColumnType::Text && rt.is_numeric() && is_date_like(left) {
        return Some(CoercionRule::ParsedDatePlusDays);
    }
    if lt == ColumnType::Date && rt.is_numeric() {
        return Some(CoercionRule::DatePlusDays);
    }
    if lt == ColumnType::Text && rt.is_numeric() {
        return Some(CoercionRule::TextPlusNumber);
    }
    if lt.is_numeric() && rt == ColumnType::Text {
        return Some(CoercionRule::NumberPlusText);
    }
    None
}

/// Rewrite every `[A] + [B]` pattern whose pair has a coercion rule
pub fn apply_coercion_rules(mut tokens: Vec<Token>, table: &Table) -> Vec<Token> {
    for left in table.columns() {
        for right in table.columns() {
            if !contains_pair(&tokens, &left.name, &right.name) {
                continue;
            }
            if let Some(rule) = select_rule(left, right) {
                debug!(left = %left.name, right = %right.name, ?rule, "coercing addition");
                let coerced = CoercedAdd {
                    rule,
                    left: left.name.clone(),
                    right: right.name.clone(),
                };
                tokens = replace_pair(tokens, &coerced);
            }
        }
    }
    tokens
}

fn is_pair(window: &[Token], left: &str, right: &str) -> bool {
    matches!(
        window,
        [Token::Column(a), Token::Plus, Token::Column(b)] if a == left && b == right
    )
}

fn contains_pair(tokens: &[Token], left: &str, right: &str) -> bool {
    tokens.windows(3).any(|w| is_pair(w, left, right))
}

/// Replace all non-overlapping occurrences, scanning left to right
fn replace_pair(tokens: Vec<Token>, coerced: &CoercedAdd) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 3 <= tokens.len() && is_pair(&tokens[i..i + 3], &coerced.left, &coerced.right) {
            out.push(Token::Coerced(coerced.clone()));
            i += 3;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}
