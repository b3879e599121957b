//! Deterministic card-battle rules shared by every frontend.
//!
//! `tinydeck-core` defines the canonical battle model (cards, piles,
//! modifiers, controllers) and exposes pure APIs with no I/O, clocks or
//! randomness. A [`BattleConfig`] is validated once into a [`BattleSetup`];
//! all state mutation then flows through [`engine::BattleEngine`], which
//! records every change as a [`BattleEvent`].
//!
//! Formulas used by cards, controllers and strategy rules are handled by the
//! [`expr`] module, a small arithmetic language evaluated against named
//! numeric bindings.
pub mod card;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod setup;
pub mod state;
pub mod strategy;

pub use card::{
    Amount, Card, CardId, CardLibrary, CardRef, DrawReport, Effect, EffectKind, EffectOutcome,
    PileKind, Piles, Target,
};
pub use config::{
    AmountConfig, BattleConfig, CardConfig, CombatantConfig, ControllerConfig, DrawConfig,
    EffectConfig, ExpressionConfig, IntentConfig, ModifierConfig, RuleConfig,
};
pub use engine::{
    BattleEngine, BattleError, BattleEvent, BattleReport, Controller, DrawReason, EffectSource,
    FormulaOwner, Intent, Outcome, Phase, run_battle,
};
pub use error::{ConfigError, ErrorSeverity, GameError};
pub use expr::{Bindings, EvalError, EvalErrorKind, Expr, FunctionWhitelist};
pub use setup::{BattleSetup, CombatantSetup};
pub use state::{BattleSnapshot, BattleState, Combatant, ModifierKind, Modifiers, Side, SideView};
pub use strategy::{Choice, Rule, RuleError, RuleKind, StrategySelector, TieBreak};
