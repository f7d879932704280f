use thiserror::Error;

use crate::model::ModelKind;

/// Unified error type for `choicers` operations.
#[derive(Debug, Error)]
pub enum ChoiceError {
    /// Raised when a required key is absent from a declarative model document.
    #[error("required key `{0}` missing from model definition")]
    MissingKey(String),

    /// Raised when a scalar key is present in a model document but null.
    #[error("key `{0}` in model definition has no value")]
    NullKey(String),

    /// Raised when a model declares fewer than two alternatives.
    #[error("a choice model needs at least two alternatives, found {found}")]
    TooFewAlternatives { found: usize },

    /// Raised when the same alternative label is declared twice.
    #[error("alternative `{0}` is declared more than once")]
    DuplicateAlternative(String),

    /// Raised when an alternative has no availability column.
    #[error("availability variable for alternative `{0}` not defined")]
    UndefinedAvailability(String),

    /// Raised when the number of intercepts is not one fewer than the number of alternatives.
    #[error("number of intercepts defined ({found}) != number required ({required})")]
    IncorrectNumberOfIntercepts {
        /// Number of intercepts declared.
        found: usize,
        /// Number of intercepts the identification constraint requires.
        required: usize,
    },

    /// Raised when a mapping is keyed by a label that is not a declared alternative.
    #[error("`{alternative}` in {context} is not a declared alternative")]
    UnknownAlternative {
        context: &'static str,
        alternative: String,
    },

    /// Raised when an alternative-dependent variable has no column for an alternative.
    #[error("alternative-dependent variable `{variable}` has no column for alternative `{alternative}`")]
    IncompleteVariableMapping {
        variable: String,
        alternative: String,
    },

    /// Raised when a multinomial logit model has no utility for an alternative.
    #[error("no utility specification given for alternative `{0}`")]
    MissingSpecification(String),

    /// Raised when the first term of a utility is not the declared intercept.
    #[error("first term of the utility definition `{found}` is not the specified intercept `{expected}`")]
    InterceptMismatch { found: String, expected: String },

    /// Raised when a non-intercept term is not a product of exactly two labels.
    #[error("each non-intercept utility term must be a product of two labels, offending term is `{0}`")]
    MalformedTerm(String),

    /// Raised when a term is not the product of one variable and one parameter.
    #[error("each non-intercept utility term must multiply a parameter and a variable, offending labels are `{0}` and `{1}`")]
    InvalidTermContents(String, String),

    /// Raised when a variable appears in more than one term of a utility.
    #[error("variable `{0}` used more than once in a utility definition")]
    DuplicateVariable(String),

    /// Raised when a parameter appears in more than one term of a utility.
    #[error("parameter `{0}` used more than once in a utility definition")]
    DuplicateParameter(String),

    /// Raised when digit-suffix collision resolution runs out of room.
    #[error("{count} labels truncate to `{abbreviation}`, more than the digit suffix can resolve")]
    AbbreviationOverflow { abbreviation: String, count: usize },

    /// Raised when two distinct labels end up with the same abbreviation.
    #[error("labels `{first}` and `{second}` both abbreviate to `{abbreviation}`")]
    AbbreviationCollision {
        abbreviation: String,
        first: String,
        second: String,
    },

    /// Raised when a data table does not contain a column the model needs.
    #[error("field `{0}` not present in data")]
    MissingField(String),

    /// Raised when a data row has a different width than the header.
    #[error("row {row} has {found} cells but the header declares {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Raised when a cell that must be numeric cannot be parsed.
    #[error("value `{value}` in column `{column}` (row {row}) is not numeric")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Raised when an observed choice is not one of the model's alternatives.
    #[error("choice `{value}` in row {row} is not a declared alternative")]
    UnknownChoice { row: usize, value: String },

    /// Raised when a result query is made before a successful estimation.
    #[error("the model parameters must have been estimated to call this method")]
    NotEstimated,

    /// Raised when `estimate` is called on an adapter that already holds results.
    #[error("the model has already been estimated; construct a new interface to re-estimate")]
    AlreadyEstimated,

    /// Raised when an interface is given a model variant it does not accept.
    #[error("interface {interface} does not accept {kind} models, expected one of {accepted:?}")]
    UnsupportedModel {
        interface: &'static str,
        kind: ModelKind,
        accepted: &'static [ModelKind],
    },

    /// Raised when an interface is built from a model with no bound data.
    #[error("the model must be loaded with data before creating a {0} interface")]
    NoDataLoaded(&'static str),

    /// Raised when the external estimation program cannot be started at all.
    #[error("failed to launch estimation engine `{program}`: {source}")]
    EngineUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Raised when a synthetic data generator is given unusable distribution parameters.
    #[error("invalid sampling distribution: {0}")]
    Sampling(String),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChoiceError {
    /// Helper to raise when a mapping references an undeclared alternative.
    pub fn unknown_alternative(context: &'static str, alternative: impl Into<String>) -> Self {
        Self::UnknownAlternative {
            context,
            alternative: alternative.into(),
        }
    }

    /// Helper to format an [`InterceptMismatch`](ChoiceError::InterceptMismatch) error.
    pub fn intercept_mismatch(found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InterceptMismatch {
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Helper for non-numeric cells found while reading data columns.
    pub fn invalid_value(column: impl Into<String>, row: usize, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            column: column.into(),
            row,
            value: value.into(),
        }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, ChoiceError>;
