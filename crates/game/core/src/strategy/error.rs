/// A strategy rule that cannot be compiled.
///
/// Raised once by setup; selection never produces one.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("rule #{index}: unknown card attribute '{attribute}'")]
    UnknownAttribute { index: usize, attribute: String },

    #[error("rule #{index}: no card declares tag '{tag}'")]
    UnknownTag { index: usize, tag: String },
}

impl RuleError {
    /// Position of the offending rule in the configured list.
    pub fn index(&self) -> usize {
        match self {
            RuleError::UnknownAttribute { index, .. } | RuleError::UnknownTag { index, .. } => {
                *index
            }
        }
    }
}
