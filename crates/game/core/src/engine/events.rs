//! Battle trace events.
//!
//! The engine records one event per state change, in the order the changes
//! happen. Two runs of the same configuration produce identical traces.

use crate::card::{CardId, DrawReport, EffectOutcome, PileKind};
use crate::engine::Outcome;
use crate::state::{ModifierKind, Side};

/// What caused an effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectSource {
    Card(CardId),
    Intent(String),
    /// Formula controller damage.
    Controller,
}

/// A single entry in the battle trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattleEvent {
    TurnStarted {
        turn: u32,
    },
    EnergyRefilled {
        side: Side,
        energy: u32,
    },
    BlockExpired {
        side: Side,
        block: u32,
    },
    CardsDrawn {
        side: Side,
        report: DrawReport,
    },
    CardPlayed {
        side: Side,
        card: CardId,
        hand_index: usize,
        energy_left: u32,
    },
    IntentUsed {
        side: Side,
        intent: String,
    },
    Passed {
        side: Side,
    },
    /// One effect of a card, intent or controller.
    Effect {
        side: Side,
        source: EffectSource,
        outcome: EffectOutcome,
    },
    CardMoved {
        side: Side,
        card: CardId,
        to: PileKind,
    },
    PoisonTicked {
        side: Side,
        hp_lost: u32,
        hp: u32,
    },
    Regenerated {
        side: Side,
        healed: u32,
        hp: u32,
    },
    ModifierExpired {
        side: Side,
        kind: ModifierKind,
    },
    HandDiscarded {
        side: Side,
        cards: Vec<CardId>,
    },
    BattleEnded {
        turn: u32,
        outcome: Outcome,
    },
}
