//! Authoritative battle state.
//!
//! The engine owns a single [`BattleState`] and is the only code that mutates
//! it. Everything else (strategy rules, formulas) observes it through a
//! [`BattleSnapshot`].

pub mod modifiers;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::card::Piles;
use crate::engine::{Outcome, Phase};

pub use modifiers::{Modifier, ModifierKind, Modifiers};
pub use snapshot::{BattleSnapshot, SideView};

// ============================================================================
// Sides
// ============================================================================

/// One of the two combatants.
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
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    /// Both sides in resolution order.
    pub const BOTH: [Side; 2] = [Side::Player, Side::Enemy];

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    /// Prefix of this side's formula variables.
    pub fn prefix(self) -> &'static str {
        self.into()
    }
}

// ============================================================================
// Combatants
// ============================================================================

/// Mutable state of one combatant.
#[derive(Clone, Debug)]
pub struct Combatant {
    pub side: Side,
    pub hp: u32,
    /// Heal cap; `None` leaves healing uncapped.
    pub max_hp: Option<u32>,
    /// HP at the start of the battle, reported as `max_hp` when uncapped.
    pub starting_hp: u32,
    pub block: u32,
    pub energy: u32,
    pub modifiers: Modifiers,
    pub piles: Piles,
    /// Cards played during the current turn.
    pub cards_played: u32,
    /// Actions taken over the whole battle; drives pattern controllers.
    pub actions_taken: u32,
}

impl Combatant {
    pub fn new(side: Side, hp: u32, max_hp: Option<u32>, piles: Piles) -> Self {
        Self {
            side,
            hp,
            max_hp,
            starting_hp: hp,
            block: 0,
            energy: 0,
            modifiers: Modifiers::new(),
            piles,
            cards_played: 0,
            actions_taken: 0,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Max HP as seen by formulas and strategy rules.
    pub fn effective_max_hp(&self) -> u32 {
        self.max_hp.unwrap_or(self.starting_hp)
    }

    /// Adds HP up to the cap and returns the amount actually gained.
    ///
    /// A defeated combatant stays at 0.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_defeated() {
            return 0;
        }
        let healed = self.hp.saturating_add(amount);
        let capped = match self.max_hp {
            Some(max) => healed.min(max.max(self.hp)),
            None => healed,
        };
        let gained = capped - self.hp;
        self.hp = capped;
        gained
    }

    /// Removes HP directly, ignoring block, and returns the amount lost.
    pub fn lose_hp(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }
}

// ============================================================================
// Battle State
// ============================================================================

/// Full state of a battle in progress.
#[derive(Clone, Debug)]
pub struct BattleState {
    /// 0 before the first turn starts, 1 during the first turn.
    pub turn: u32,
    pub turn_limit: u32,
    pub phase: Phase,
    pub player: Combatant,
    pub enemy: Combatant,
    /// Set once the battle reaches [`Phase::Terminal`].
    pub outcome: Option<Outcome>,
}

impl BattleState {
    pub fn new(turn_limit: u32, player: Combatant, enemy: Combatant) -> Self {
        Self {
            turn: 0,
            turn_limit,
            phase: Phase::Init,
            player,
            enemy,
            outcome: None,
        }
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Borrows `side` and its opponent mutably at the same time.
    pub fn pair_mut(&mut self, side: Side) -> (&mut Combatant, &mut Combatant) {
        match side {
            Side::Player => (&mut self.player, &mut self.enemy),
            Side::Enemy => (&mut self.enemy, &mut self.player),
        }
    }

    /// Read-only view for decisions made by `acting`.
    pub fn snapshot(&self, acting: Side) -> BattleSnapshot {
        BattleSnapshot::capture(self, acting)
    }
}
