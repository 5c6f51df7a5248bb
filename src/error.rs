use thiserror::Error;

pub type AutolensResult<T> = Result<T, AutolensError>;

#[derive(Error, Debug)]
pub enum AutolensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type FormulaResult<T> = Result<T, FormulaError>;

/// Failure of a new-column request. The table is never modified when one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Unresolved reference: '{0}' is not a column of this table")]
    UnresolvedReference(String),

    #[error("Incompatible operands: cannot add {left} and {right}")]
    IncompatibleOperands { left: String, right: String },

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl FormulaError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            FormulaError::MissingInput(_) => "missing_input",
            FormulaError::UnresolvedReference(_) => "unresolved_reference",
            FormulaError::IncompatibleOperands { .. } => "incompatible_operands",
            FormulaError::ParseFailure(_) => "parse_failure",
            FormulaError::Evaluation(_) => "evaluation_error",
        }
    }
}
