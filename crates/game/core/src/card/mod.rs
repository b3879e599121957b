//! Card definitions, piles and effect resolution.
//!
//! Cards are immutable once built by [`crate::BattleSetup`]. Piles hold
//! shared references ([`CardRef`]) so every copy of a card in a deck points at
//! the same definition.

pub mod effect;
pub mod pile;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::expr::{Bindings, EvalError, Expr};
use crate::state::ModifierKind;

pub use effect::{DamageDealt, EffectContext, EffectOutcome, apply_effect, to_amount};
pub use pile::{DrawReport, DrawRules, DrawStop, PileKind, Piles};

/// Shared handle to an immutable card definition.
pub type CardRef = Arc<Card>;

// ============================================================================
// Identifiers
// ============================================================================

/// Card identifier, unique within a configuration.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ============================================================================
// Effects
// ============================================================================

/// What an effect does.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    Damage,
    Heal,
    Block,
    Draw,
    Energy,
    Buff,
}

/// Which combatant an effect lands on, relative to the one playing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    #[serde(rename = "self")]
    Caster,
    #[serde(rename = "opponent")]
    Opponent,
}

impl Target {
    /// Target used when an effect does not name one.
    pub fn default_for(kind: EffectKind, modifier: Option<ModifierKind>) -> Self {
        match kind {
            EffectKind::Damage => Target::Opponent,
            EffectKind::Buff if modifier.is_some_and(ModifierKind::is_debuff) => Target::Opponent,
            _ => Target::Caster,
        }
    }
}

/// Effect magnitude: a literal or a formula evaluated at resolution time.
#[derive(Clone, Debug, PartialEq)]
pub enum Amount {
    Fixed(u32),
    Formula(Expr),
}

impl Amount {
    /// Resolves the magnitude against `bindings`.
    ///
    /// Formula values truncate toward zero and negative values become 0.
    pub fn resolve(&self, bindings: &Bindings) -> Result<u32, EvalError> {
        match self {
            Amount::Fixed(value) => Ok(*value),
            Amount::Formula(expr) => expr.evaluate(bindings).map(to_amount),
        }
    }
}

/// A compiled effect.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub amount: Amount,
    pub target: Target,
    /// Set exactly when `kind` is [`EffectKind::Buff`].
    pub modifier: Option<ModifierKind>,
    /// Buff duration in turns; `None` is permanent.
    pub duration: Option<u32>,
    /// The effect is skipped when this evaluates to 0.
    pub condition: Option<Expr>,
}

impl Effect {
    /// Evaluates the condition; effects without one always apply.
    pub fn is_active(&self, bindings: &Bindings) -> Result<bool, EvalError> {
        match &self.condition {
            Some(condition) => condition.evaluate(bindings).map(crate::expr::truthy),
            None => Ok(true),
        }
    }
}

// ============================================================================
// Cards
// ============================================================================

/// Immutable card definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub cost: u32,
    pub tags: BTreeSet<String>,
    pub effects: Vec<Effect>,
    pub exhaust: bool,
    pub retain: bool,
    pub innate: bool,
}

impl Card {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// All card definitions of a battle, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct CardLibrary {
    cards: BTreeMap<CardId, CardRef>,
}

impl CardLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a card. Returns `false` and leaves the library unchanged when the
    /// id is already taken.
    pub fn insert(&mut self, card: Card) -> bool {
        if self.cards.contains_key(&card.id) {
            return false;
        }
        self.cards.insert(card.id.clone(), Arc::new(card));
        true
    }

    pub fn get(&self, id: &str) -> Option<&CardRef> {
        self.cards.get(&CardId::new(id))
    }

    /// Whether any card declares `tag`.
    pub fn declares_tag(&self, tag: &str) -> bool {
        self.cards.values().any(|card| card.has_tag(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardRef> {
        self.cards.values()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
