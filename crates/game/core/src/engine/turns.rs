//! Phase handlers for [`BattleEngine`].

use super::controller::TurnContext;
use super::{BattleEngine, BattleEvent, DrawReason, Outcome};
use crate::state::{ModifierKind, Side};

impl BattleEngine {
    fn context(&mut self) -> TurnContext<'_> {
        TurnContext {
            state: &mut self.state,
            modifiers: &self.setup.modifiers,
            events: &mut self.events,
        }
    }

    /// Draws each side's starting hand.
    pub(super) fn init(&mut self) {
        tracing::debug!(
            turn_limit = self.state.turn_limit,
            player_hp = self.state.player.hp,
            enemy_hp = self.state.enemy.hp,
            "battle starting"
        );

        for side in Side::BOTH {
            let count = self.setup.combatant(side).draw.starting_hand;
            let mut ctx = self.context();
            let report = ctx.state.combatant_mut(side).piles.draw(count);
            ctx.record(BattleEvent::CardsDrawn { side, report });
        }
    }

    /// Advances the turn counter and refills energy.
    pub(super) fn start_turn(&mut self) {
        self.state.turn += 1;
        tracing::debug!(turn = self.state.turn, "turn started");
        let turn = self.state.turn;
        self.context().record(BattleEvent::TurnStarted { turn });

        for side in Side::BOTH {
            let energy = self.setup.combatant(side).energy_per_turn;
            let mut ctx = self.context();
            let combatant = ctx.state.combatant_mut(side);
            combatant.energy = energy;
            combatant.cards_played = 0;
            ctx.record(BattleEvent::EnergyRefilled { side, energy });
        }
    }

    /// Clears `side`'s block and lets its controller act.
    ///
    /// The acting side acts even at 0 HP so that both sides can fall in the
    /// same turn.
    pub(super) fn take_action(&mut self, side: Side) -> Result<(), super::BattleError> {
        let controller = &self.setup.combatant(side).controller;
        let mut ctx = TurnContext {
            state: &mut self.state,
            modifiers: &self.setup.modifiers,
            events: &mut self.events,
        };

        let combatant = ctx.state.combatant_mut(side);
        let block = std::mem::take(&mut combatant.block);
        if block > 0 {
            ctx.record(BattleEvent::BlockExpired { side, block });
        }

        tracing::debug!(%side, controller = controller.kind(), "taking action");
        controller.act(side, &mut ctx)?;
        ctx.state.combatant_mut(side).actions_taken += 1;
        Ok(())
    }

    /// End-of-turn bookkeeping for both sides: poison, regeneration, modifier
    /// decay, hand discard and draw.
    pub(super) fn resolve(&mut self) {
        for side in Side::BOTH {
            let draw = self.setup.combatant(side).draw;
            let mut ctx = self.context();
            let combatant = ctx.state.combatant_mut(side);

            let poison = combatant.modifiers.intensity(ModifierKind::Poison);
            if poison > 0 {
                let hp_lost = combatant.lose_hp(poison);
                let hp = combatant.hp;
                ctx.record(BattleEvent::PoisonTicked { side, hp_lost, hp });
            }

            let combatant = ctx.state.combatant_mut(side);
            let regeneration = combatant.modifiers.intensity(ModifierKind::Regeneration);
            if regeneration > 0 {
                let healed = combatant.heal(regeneration);
                let hp = combatant.hp;
                ctx.record(BattleEvent::Regenerated { side, healed, hp });
            }

            let expired = ctx.state.combatant_mut(side).modifiers.decay();
            for kind in expired {
                ctx.record(BattleEvent::ModifierExpired { side, kind });
            }

            if draw.discard_hand {
                let cards = ctx.state.combatant_mut(side).piles.discard_hand();
                if !cards.is_empty() {
                    ctx.record(BattleEvent::HandDiscarded { side, cards });
                }
            }

            let report = ctx.state.combatant_mut(side).piles.draw(draw.draw_per_turn);
            if !report.drawn.is_empty() || report.reshuffles > 0 {
                ctx.record(BattleEvent::CardsDrawn { side, report });
            }
        }
    }

    /// Decides the battle, checking in fixed order: double knock-out, player
    /// down, enemy down, turn limit.
    pub(super) fn check_termination(&self) -> Option<Outcome> {
        let player = &self.state.player;
        let enemy = &self.state.enemy;

        match (player.is_defeated(), enemy.is_defeated()) {
            (true, true) => Some(Outcome::Draw {
                reason: DrawReason::DoubleKnockout,
            }),
            (true, false) => Some(Outcome::EnemyWins { hp: enemy.hp }),
            (false, true) => Some(Outcome::PlayerWins { hp: player.hp }),
            (false, false) if self.state.turn >= self.state.turn_limit => Some(Outcome::Draw {
                reason: DrawReason::TurnLimit,
            }),
            (false, false) => None,
        }
    }

    pub(super) fn finish(&mut self, outcome: Outcome) {
        let turn = self.state.turn;
        self.state.outcome = Some(outcome);
        tracing::info!(turn, %outcome, points = outcome.points(), "battle finished");
        self.context().record(BattleEvent::BattleEnded { turn, outcome });
    }
}
