//! Column reference resolution
//!
//! Rewrites the column names a user typed into explicit `[name]` references
//! before tokenizing. Two strategies are available:
//!
//! - `WordBoundary` matches whole names only, longest name first, in a single
//!   left-to-right pass. Quoted literals and already bracketed references are
//!   left alone.
//! - `Substring` replays the dashboard's historical behaviour: a plain
//!   substring replace per column, in table column order. When one name is a
//!   substring of another (`date` inside `date_posted`) the later replacement
//!   corrupts the earlier one, and the formula then fails to evaluate.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{FormulaError, FormulaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveStrategy {
    #[default]
    WordBoundary,
    Substring,
}

impl FromStr for ResolveStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "word-boundary" | "word_boundary" | "boundary" => Ok(ResolveStrategy::WordBoundary),
            "substring" => Ok(ResolveStrategy::Substring),
            other => Err(format!(
                "unknown resolve strategy '{}' (expected 'word-boundary' or 'substring')",
                other
            )),
        }
    }
}

impl fmt::Display for ResolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStrategy::WordBoundary => f.write_str("word-boundary"),
            ResolveStrategy::Substring => f.write_str("substring"),
        }
    }
}

/// Render a column name as an explicit reference
pub fn reference(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Rewrite the known column names in `formula` into `[name]` references
pub fn resolve_references<S: AsRef<str>>(
    formula: &str,
    column_names: &[S],
    strategy: ResolveStrategy,
) -> FormulaResult<String> {
    let resolved = match strategy {
        ResolveStrategy::Substring => resolve_substring(formula, column_names),
        ResolveStrategy::WordBoundary => resolve_word_boundary(formula, column_names)?,
    };
    debug!(%strategy, formula, resolved = %resolved, "resolved column references");
    Ok(resolved)
}

fn resolve_substring<S: AsRef<str>>(formula: &str, column_names: &[S]) -> String {
    let mut text = formula.to_string();
    for name in column_names.iter().map(AsRef::as_ref) {
        if name.is_empty() {
            continue;
        }
        text = text.replace(name, &reference(name));
    }
    text
}

fn resolve_word_boundary<S: AsRef<str>>(
    formula: &str,
    column_names: &[S],
) -> FormulaResult<String> {
    let mut names: Vec<&str> = column_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(formula.to_string());
    }
    // Stable sort keeps table order among equal lengths
    names.sort_by(|a, b| b.len().cmp(&a.len()));

    let alternatives: Vec<String> = names.iter().map(|name| bounded_pattern(name)).collect();
    let pattern = format!(
        r#"(?P<skip>"(?:[^"]|"")*"|'(?:[^']|'')*'|\[(?:[^\]]|\]\])*\])|(?P<col>{})"#,
        alternatives.join("|")
    );
    let re = Regex::new(&pattern)
        .map_err(|e| FormulaError::Evaluation(format!("Cannot match column names: {}", e)))?;

    let resolved = re.replace_all(formula, |caps: &Captures| match caps.name("col") {
        Some(m) if !extends_identifier(formula, m.start(), m.end()) => reference(m.as_str()),
        _ => caps[0].to_string(),
    });
    Ok(resolved.into_owned())
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether a match is glued to a `.` on a word-character edge, making it
/// part of a longer bare identifier such as `price.2`
fn extends_identifier(formula: &str, start: usize, end: usize) -> bool {
    let matched = &formula[start..end];
    let before = formula[..start].chars().next_back();
    let after = formula[end..].chars().next();
    (before == Some('.') && matched.chars().next().is_some_and(is_word))
        || (after == Some('.') && matched.chars().next_back().is_some_and(is_word))
}

/// Escaped name, with `\b` on each side that starts or ends with a word
/// character so it cannot match inside a longer identifier
fn bounded_pattern(name: &str) -> String {
    let mut pattern = String::new();
    if name.chars().next().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(name));
    if name.chars().last().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary(formula: &str, names: &[&str]) -> String {
        resolve_references(formula, names, ResolveStrategy::WordBoundary).unwrap()
    }

    fn substring(formula: &str, names: &[&str]) -> String {
        resolve_references(formula, names, ResolveStrategy::Substring).unwrap()
    }

    #[test]
    fn test_reference_escapes_brackets() {
        assert_eq!(reference("price"), "[price]");
        assert_eq!(reference("a]b"), "[a]]b]");
    }

    #[test]
    fn test_boundary_simple() {
        assert_eq!(
            boundary("price + odometer", &["price", "odometer"]),
            "[price] + [odometer]"
        );
    }

    #[test]
    fn test_boundary_prefers_longer_name() {
        assert_eq!(
            boundary("date_posted + date", &["date", "date_posted"]),
            "[date_posted] + [date]"
        );
    }

    #[test]
    fn test_boundary_ignores_partial_words() {
        assert_eq!(boundary("nonexistent_col + 1", &["col"]), "nonexistent_col + 1");
    }

    #[test]
    fn test_boundary_ignores_dotted_identifiers() {
        assert_eq!(boundary("price.2 + 1", &["price"]), "price.2 + 1");
        assert_eq!(boundary("x.price + price", &["price"]), "x.price + [price]");
        assert_eq!(boundary("price.2 + price", &["price", "price.2"]), "[price.2] + [price]");
        assert_eq!(boundary("price + 1.5", &["price"]), "[price] + 1.5");
    }

    #[test]
    fn test_boundary_names_with_spaces_and_symbols() {
        assert_eq!(
            boundary("model year + price ($)", &["model year", "price ($)", "year"]),
            "[model year] + [price ($)]"
        );
    }

    #[test]
    fn test_boundary_skips_literals_and_references() {
        assert_eq!(
            boundary("model + ' model' + [model]", &["model"]),
            "[model] + ' model' + [model]"
        );
    }

    #[test]
    fn test_substring_replaces_in_table_order() {
        assert_eq!(substring("price + 1", &["price"]), "[price] + 1");
    }

    #[test]
    fn test_substring_corrupts_overlapping_names() {
        assert_eq!(
            substring("date_posted + 5", &["date_posted", "date"]),
            "[[date]_posted] + 5"
        );
        assert_eq!(
            substring("nonexistent_col + 1", &["col"]),
            "nonexistent_[col] + 1"
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "substring".parse::<ResolveStrategy>().unwrap(),
            ResolveStrategy::Substring
        );
        assert_eq!(
            "word-boundary".parse::<ResolveStrategy>().unwrap(),
            ResolveStrategy::WordBoundary
        );
        assert!("fuzzy".parse::<ResolveStrategy>().is_err());
    }
}
