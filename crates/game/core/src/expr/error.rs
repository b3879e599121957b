//! Error types for formula parsing and evaluation.

/// A formula failed to parse or evaluate.
///
/// Formulas come from configuration, so every failure is a configuration
/// defect. The offending source text travels with the error so it can be
/// located without re-running the battle.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("formula `{expression}`: {kind}")]
pub struct EvalError {
    /// Source text of the formula as written in configuration.
    pub expression: String,

    /// What went wrong.
    pub kind: EvalErrorKind,
}

impl EvalError {
    pub fn new(expression: impl Into<String>, kind: EvalErrorKind) -> Self {
        Self {
            expression: expression.into(),
            kind,
        }
    }

    /// Returns the unresolved variable name, if that is what failed.
    pub fn unknown_variable(&self) -> Option<&str> {
        match &self.kind {
            EvalErrorKind::UnknownVariable { name } => Some(name),
            _ => None,
        }
    }
}

/// Classification of formula failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    /// Token or construct outside the grammar.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Identifier not present in the binding table.
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// Call to a name that is not a built-in function.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Call to a built-in that the configuration did not whitelist.
    #[error("function '{name}' is not whitelisted")]
    FunctionNotAllowed { name: String },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

impl EvalErrorKind {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
