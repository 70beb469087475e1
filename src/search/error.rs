use thiserror::Error;

/// Message shown to clients for any failed search compile.
pub const INVALID_SEARCH_EXPRESSION: &str = "invalid search expression";

/// Errors that abort compilation of a whole search query.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Neither the entity's overrides nor the registry know the literal.
    #[error("unknown search operator `{literal}`")]
    UnknownOperator { literal: String },

    /// A criterion failed during conversion, field resolution, or
    /// inside its operator.
    #[error("failed to compile criterion `{key}{operator}`")]
    Compile {
        key: String,
        operator: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown search entity `{name}`")]
    UnknownEntity { name: String },
}

impl SearchError {
    pub(crate) fn compile(key: &str, operator: &str, source: anyhow::Error) -> Self {
        SearchError::Compile {
            key: key.to_string(),
            operator: operator.to_string(),
            source,
        }
    }
}
