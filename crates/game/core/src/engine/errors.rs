//! Error types for battle setup and execution.

use std::fmt;

use crate::card::CardId;
use crate::error::{ConfigError, ErrorSeverity, GameError};
use crate::expr::EvalError;
use crate::state::Side;
use crate::strategy::RuleError;

/// Identifies which configured formula failed to parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaOwner {
    /// Amount or condition of a card effect.
    Card { card: CardId, effect: usize },
    /// Guard of a strategy rule.
    Rule { side: Side, index: usize },
    /// Damage formula of a formula controller.
    Controller { side: Side },
    /// Amount or condition of a pattern intent effect.
    Intent {
        side: Side,
        intent: String,
        effect: usize,
    },
}

impl fmt::Display for FormulaOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaOwner::Card { card, effect } => write!(f, "card '{card}' effect #{effect}"),
            FormulaOwner::Rule { side, index } => write!(f, "{side} strategy rule #{index}"),
            FormulaOwner::Controller { side } => write!(f, "{side} controller"),
            FormulaOwner::Intent {
                side,
                intent,
                effect,
            } => write!(f, "{side} intent '{intent}' effect #{effect}"),
        }
    }
}

/// Errors surfaced while setting up or running a battle.
///
/// Every variant is fatal. Those raised after setup carry the side and the
/// card, intent or controller whose formula failed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BattleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid {side} strategy: {error}")]
    Rule { side: Side, error: RuleError },

    #[error("invalid formula in {owner}: {error}")]
    Formula { owner: FormulaOwner, error: EvalError },

    #[error("card '{card}' played by {side} failed: {error}")]
    CardEffect {
        side: Side,
        card: CardId,
        error: EvalError,
    },

    #[error("{side} intent '{intent}' failed: {error}")]
    Intent {
        side: Side,
        intent: String,
        error: EvalError,
    },

    #[error("{side} controller formula failed: {error}")]
    Controller { side: Side, error: EvalError },

    #[error("{side} strategy failed: {error}")]
    Strategy { side: Side, error: EvalError },

    #[error("battle already finished")]
    AlreadyFinished,
}

impl BattleError {
    /// Stable identifier for logging.
    pub const fn code(&self) -> &'static str {
        match self {
            BattleError::Config(_) => "config",
            BattleError::Rule { .. } => "rule",
            BattleError::Formula { .. } => "formula",
            BattleError::CardEffect { .. } => "card_effect",
            BattleError::Intent { .. } => "intent",
            BattleError::Controller { .. } => "controller",
            BattleError::Strategy { .. } => "strategy",
            BattleError::AlreadyFinished => "already_finished",
        }
    }

    /// The formula error underneath, if any.
    pub fn eval_error(&self) -> Option<&EvalError> {
        match self {
            BattleError::Formula { error, .. }
            | BattleError::CardEffect { error, .. }
            | BattleError::Intent { error, .. }
            | BattleError::Controller { error, .. }
            | BattleError::Strategy { error, .. } => Some(error),
            BattleError::Config(_) | BattleError::Rule { .. } | BattleError::AlreadyFinished => {
                None
            }
        }
    }
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            BattleError::Config(_) | BattleError::Rule { .. } | BattleError::Formula { .. } => {
                ErrorSeverity::Validation
            }
            BattleError::CardEffect { .. }
            | BattleError::Intent { .. }
            | BattleError::Controller { .. }
            | BattleError::Strategy { .. } => ErrorSeverity::Runtime,
            BattleError::AlreadyFinished => ErrorSeverity::Usage,
        }
    }

    fn error_code(&self) -> &'static str {
        self.code()
    }
}
