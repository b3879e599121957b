//! Read-only battle views handed to formulas and strategy rules.

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use crate::card::PileKind;
use crate::expr::Bindings;
use crate::state::{BattleState, Combatant, ModifierKind, Side};

/// Copy of one combatant's observable numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideView {
    pub hp: u32,
    pub max_hp: u32,
    pub block: u32,
    pub energy: u32,
    pub hand: usize,
    pub deck: usize,
    pub discard: usize,
    pub exhaust: usize,
    /// Intensity per active modifier.
    pub modifiers: BTreeMap<ModifierKind, u32>,
}

impl SideView {
    fn capture(combatant: &Combatant) -> Self {
        Self {
            hp: combatant.hp,
            max_hp: combatant.effective_max_hp(),
            block: combatant.block,
            energy: combatant.energy,
            hand: combatant.piles.len(PileKind::Hand),
            deck: combatant.piles.len(PileKind::Deck),
            discard: combatant.piles.len(PileKind::Discard),
            exhaust: combatant.piles.len(PileKind::Exhaust),
            modifiers: combatant
                .modifiers
                .iter()
                .map(|(kind, modifier)| (kind, modifier.intensity))
                .collect(),
        }
    }

    pub fn modifier(&self, kind: ModifierKind) -> u32 {
        self.modifiers.get(&kind).copied().unwrap_or(0)
    }

    pub fn has(&self, kind: ModifierKind) -> bool {
        self.modifiers.contains_key(&kind)
    }

    fn bind(&self, prefix: &str, bindings: &mut Bindings) {
        let fields = [
            ("hp", self.hp as f64),
            ("max_hp", self.max_hp as f64),
            ("block", self.block as f64),
            ("energy", self.energy as f64),
            ("hand", self.hand as f64),
            ("deck", self.deck as f64),
            ("discard", self.discard as f64),
        ];
        for (name, value) in fields {
            bindings.insert(format!("{prefix}_{name}"), value);
        }
        for kind in ModifierKind::iter() {
            bindings.insert(format!("{prefix}_{kind}"), self.modifier(kind) as f64);
        }
    }
}

/// Immutable picture of the battle from one side's point of view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleSnapshot {
    pub turn: u32,
    pub turn_limit: u32,
    /// Side whose decision or effect is being evaluated.
    pub acting: Side,
    /// Cards `acting` has played so far this turn.
    pub cards_played: u32,
    pub player: SideView,
    pub enemy: SideView,
}

impl BattleSnapshot {
    pub(crate) fn capture(state: &BattleState, acting: Side) -> Self {
        Self {
            turn: state.turn,
            turn_limit: state.turn_limit,
            acting,
            cards_played: state.combatant(acting).cards_played,
            player: SideView::capture(&state.player),
            enemy: SideView::capture(&state.enemy),
        }
    }

    pub fn side(&self, side: Side) -> &SideView {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    /// View of the acting side.
    pub fn actor(&self) -> &SideView {
        self.side(self.acting)
    }

    pub fn opponent(&self) -> &SideView {
        self.side(self.acting.opponent())
    }

    /// Builds the formula variable table.
    ///
    /// Every side is bound under its own prefix (`player_hp`, `enemy_block`)
    /// and again under `self_` and `opponent_` relative to the acting side.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new()
            .with("turn", self.turn as f64)
            .with("turn_limit", self.turn_limit as f64)
            .with("cards_played", self.cards_played as f64);

        for side in Side::BOTH {
            self.side(side).bind(side.prefix(), &mut bindings);
        }
        self.actor().bind("self", &mut bindings);
        self.opponent().bind("opponent", &mut bindings);

        bindings
    }
}
