//! Ad-hoc column formulas
//!
//! A user names a new column and types a formula such as
//! `date_posted + days_listed` or `model + model_year`. The formula goes
//! through four stages:
//!
//! 1. `resolver` turns column names into `[name]` references
//! 2. `tokenizer` splits the resolved text
//! 3. `coercion` decides what each `[A] + [B]` means for the columns' types
//! 4. `parser` + `evaluator` compute the new column row by row
//!
//! Nothing is evaluated dynamically: the only operations are numeric
//! addition, date-plus-days and text concatenation.

pub mod coercion;
pub mod evaluator;
pub mod parser;
pub mod resolver;
pub mod tokenizer;

use serde::Serialize;
use tracing::{info, warn};

pub use coercion::{apply_coercion_rules, CoercedAdd, CoercionRule};
pub use parser::Expr;
pub use resolver::{resolve_references, ResolveStrategy};

use crate::error::{FormulaError, FormulaResult};
use crate::types::{Column, ColumnType, Table};
use tokenizer::Token;

/// Outcome of a successful new-column request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Materialized {
    pub name: String,
    pub column_type: ColumnType,
    pub rows: usize,
    /// Rewritten expression that was evaluated
    pub expression: String,
}

/// Turns formulas into columns of a table
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEngine {
    strategy: ResolveStrategy,
}

impl FormulaEngine {
    pub fn new(strategy: ResolveStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Resolve, tokenize, coerce and parse `formula` against `table`
    pub fn compile(&self, table: &Table, formula: &str) -> FormulaResult<Expr> {
        let names = table.column_names();
        let resolved = resolve_references(formula, &names, self.strategy)?;

        let tokens = tokenizer::tokenize(&resolved)
            .map_err(|e| FormulaError::Evaluation(format!("Invalid formula '{}': {}", formula, e)))?;

        if let Some(unresolved) = first_unresolved(&tokens, table) {
            return Err(FormulaError::UnresolvedReference(unresolved));
        }

        let tokens = apply_coercion_rules(tokens, table);
        parser::parse(tokens)
            .map_err(|e| FormulaError::Evaluation(format!("Invalid formula '{}': {}", formula, e)))
    }

    /// Evaluate `formula` and store the result as column `name`.
    ///
    /// An existing column with the same name is overwritten in place. On any
    /// error the table is left exactly as it was.
    pub fn materialize(
        &self,
        table: &mut Table,
        name: &str,
        formula: &str,
    ) -> FormulaResult<Materialized> {
        let result = self.try_materialize(table, name, formula);
        if let Err(e) = &result {
            warn!(column = name, formula, error = %e, "new column rejected");
        }
        result
    }

    fn try_materialize(
        &self,
        table: &mut Table,
        name: &str,
        formula: &str,
    ) -> FormulaResult<Materialized> {
        if name.trim().is_empty() {
            return Err(FormulaError::MissingInput(
                "the new column needs a name".to_string(),
            ));
        }
        if formula.trim().is_empty() {
            return Err(FormulaError::MissingInput(
                "the formula is empty".to_string(),
            ));
        }

        let expr = self.compile(table, formula)?;
        let values = evaluator::evaluate(&expr, table)?;

        let materialized = Materialized {
            name: name.to_string(),
            column_type: values.column_type(),
            rows: values.len(),
            expression: expr.to_string(),
        };
        table
            .add_column(Column::new(name, values))
            .map_err(|e| FormulaError::Evaluation(e.to_string()))?;

        info!(
            column = name,
            expression = %materialized.expression,
            column_type = %materialized.column_type,
            "column materialized"
        );
        Ok(materialized)
    }
}

/// First name the resolver left bare, or a bracketed name the table lacks
fn first_unresolved(tokens: &[Token], table: &Table) -> Option<String> {
    tokens.iter().find_map(|token| match token {
        Token::Identifier(name) => Some(name.clone()),
        Token::Column(name) if table.column(name).is_none() => Some(name.clone()),
        _ => None,
    })
}

/// Materialize a column with the default resolve strategy
pub fn materialize_column(
    table: &mut Table,
    name: &str,
    formula: &str,
) -> FormulaResult<Materialized> {
    FormulaEngine::default().materialize(table, name, formula)
}
