//! Common error infrastructure for tinydeck-core.
//!
//! Domain errors live beside the code that raises them: [`crate::EvalError`]
//! in the formula module, [`crate::RuleError`] with the strategy selector and
//! [`crate::BattleError`] with the engine. This module holds what they share
//! plus [`ConfigError`], which setup raises while validating values.
//!
//! Every error in this crate is fatal. Severity only says where the defect was
//! found, which decides how it is reported.

use crate::expr::EvalErrorKind;
use crate::state::Side;

/// Where a fatal error was detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Configuration rejected during setup, before any turn ran.
    Validation,

    /// A configured formula failed while the battle was running.
    Runtime,

    /// The API was used out of order (e.g. stepping a finished battle).
    Usage,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Runtime => "runtime",
            Self::Usage => "usage",
        }
    }
}

/// Common trait for tinydeck-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, used as a log field.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Invalid configuration values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("turn_limit must be at least 1")]
    ZeroTurnLimit,

    #[error("{side}: hp must be at least 1")]
    ZeroHp { side: Side },

    #[error("{side}: max_hp {max_hp} is below starting hp {hp}")]
    MaxHpBelowHp { side: Side, hp: u32, max_hp: u32 },

    #[error("card #{index} has an empty id")]
    EmptyCardId { index: usize },

    #[error("duplicate card id '{id}'")]
    DuplicateCard { id: String },

    #[error("{side}: deck slot #{slot} names unknown card '{card}'")]
    UnknownCard {
        side: Side,
        slot: usize,
        card: String,
    },

    #[error("{owner}: buff effect #{effect} names no modifier")]
    MissingModifier { owner: String, effect: usize },

    #[error("{owner}: effect #{effect} is not a buff but names a modifier")]
    UnexpectedModifier { owner: String, effect: usize },

    #[error("{owner}: effect #{effect} amount {amount} is negative")]
    NegativeAmount {
        owner: String,
        effect: usize,
        amount: i64,
    },

    #[error("{owner}: effect #{effect} amount {amount} is too large")]
    AmountTooLarge {
        owner: String,
        effect: usize,
        amount: i64,
    },

    #[error("{side}: plays_per_turn must be at least 1")]
    ZeroPlaysPerTurn { side: Side },

    #[error("{side}: pattern controller has no intents")]
    EmptyPattern { side: Side },

    #[error("modifiers.{field} is {value}, above the maximum of {max}")]
    PercentOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("expressions.functions names unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("expressions.functions is invalid: {error}")]
    Functions {
        #[source]
        error: EvalErrorKind,
    },
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "config"
    }
}
