//! How a combatant acts on its turn.
//!
//! The engine does not care which side uses which controller: both sides hold
//! a [`Controller`] and the action phase simply dispatches on it.

use crate::card::effect::{outgoing_damage, take_damage};
use crate::card::{CardRef, Effect, EffectContext, EffectOutcome, apply_effect, to_amount};
use crate::config::ModifierConfig;
use crate::engine::{BattleError, BattleEvent, EffectSource};
use crate::expr::{Bindings, EvalError, Expr};
use crate::state::{BattleState, Side};
use crate::strategy::{Choice, StrategySelector};

/// A named step of a pattern controller.
#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    pub name: String,
    pub effects: Vec<Effect>,
}

/// Compiled decision surface of one combatant.
#[derive(Clone, Debug, PartialEq)]
pub enum Controller {
    /// Plays cards chosen by the selector, up to `plays_per_turn` per turn.
    Strategy {
        selector: StrategySelector,
        plays_per_turn: u32,
    },

    /// Deals `damage` to the opponent through the normal damage pipeline.
    Formula { damage: Expr },

    /// Applies intent `actions_taken % intents.len()`. Setup rejects an
    /// empty list; one built by hand makes the side pass.
    Pattern { intents: Vec<Intent> },
}

/// Mutable battle pieces an action needs, borrowed apart from the setup.
pub(crate) struct TurnContext<'a> {
    pub state: &'a mut BattleState,
    pub modifiers: &'a ModifierConfig,
    pub events: &'a mut Vec<BattleEvent>,
}

impl TurnContext<'_> {
    /// Appends `event` to the trace and mirrors it to the log.
    pub fn record(&mut self, event: BattleEvent) {
        tracing::debug!(turn = self.state.turn, ?event, "battle event");
        self.events.push(event);
    }
}

impl Controller {
    pub fn kind(&self) -> &'static str {
        match self {
            Controller::Strategy { .. } => "strategy",
            Controller::Formula { .. } => "formula",
            Controller::Pattern { .. } => "pattern",
        }
    }

    /// Runs one action for `side`.
    pub(crate) fn act(&self, side: Side, ctx: &mut TurnContext<'_>) -> Result<(), BattleError> {
        match self {
            Controller::Strategy {
                selector,
                plays_per_turn,
            } => play_strategy(side, selector, *plays_per_turn, ctx),
            Controller::Formula { damage } => deal_formula_damage(side, damage, ctx),
            Controller::Pattern { intents } => run_intent(side, intents, ctx),
        }
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Plays cards until the selector passes, the play budget runs out or the
/// opponent is down.
fn play_strategy(
    side: Side,
    selector: &StrategySelector,
    plays_per_turn: u32,
    ctx: &mut TurnContext<'_>,
) -> Result<(), BattleError> {
    let mut plays = 0;

    while plays < plays_per_turn {
        if ctx.state.combatant(side.opponent()).is_defeated() {
            break;
        }

        let snapshot = ctx.state.snapshot(side);
        let choice = selector.select(ctx.state.combatant(side).piles.hand(), &snapshot)?;

        match choice {
            Choice::Pass => {
                ctx.record(BattleEvent::Passed { side });
                break;
            }
            Choice::Play { hand_index, card } => {
                play_card(side, hand_index, card, ctx)?;
                plays += 1;
            }
        }
    }

    Ok(())
}

/// Pays for and resolves one card, then moves it out of the hand.
fn play_card(
    side: Side,
    hand_index: usize,
    card: CardRef,
    ctx: &mut TurnContext<'_>,
) -> Result<(), BattleError> {
    let actor = ctx.state.combatant_mut(side);
    actor.energy = actor.energy.saturating_sub(card.cost);
    let energy_left = actor.energy;

    tracing::debug!(%side, card = %card.id, cost = card.cost, energy_left, "playing card");
    ctx.record(BattleEvent::CardPlayed {
        side,
        card: card.id.clone(),
        hand_index,
        energy_left,
    });

    let bindings = ctx.state.snapshot(side).bindings();
    apply_effects(
        side,
        EffectSource::Card(card.id.clone()),
        &card.effects,
        &bindings,
        ctx,
    )
    .map_err(|error| BattleError::CardEffect {
        side,
        card: card.id.clone(),
        error,
    })?;

    let actor = ctx.state.combatant_mut(side);
    actor.cards_played += 1;
    if let Some((played, to)) = actor.piles.finish_play(hand_index) {
        ctx.record(BattleEvent::CardMoved {
            side,
            card: played.id.clone(),
            to,
        });
    }

    Ok(())
}

// ============================================================================
// Formula
// ============================================================================

fn deal_formula_damage(
    side: Side,
    damage: &Expr,
    ctx: &mut TurnContext<'_>,
) -> Result<(), BattleError> {
    let bindings = ctx.state.snapshot(side).bindings();
    let value = damage
        .evaluate(&bindings)
        .map_err(|error| BattleError::Controller { side, error })?;
    let amount = to_amount(value);

    let (actor, opponent) = ctx.state.pair_mut(side);
    let outgoing = outgoing_damage(amount, actor, ctx.modifiers);
    let dealt = take_damage(opponent, outgoing, ctx.modifiers.vulnerable_percent);
    let outcome = EffectOutcome::Damage {
        target: opponent.side,
        dealt,
        hp: opponent.hp,
    };

    tracing::debug!(%side, formula = %damage, value, damage = dealt.amount, "formula damage");
    ctx.record(BattleEvent::Effect {
        side,
        source: EffectSource::Controller,
        outcome,
    });

    Ok(())
}

// ============================================================================
// Pattern
// ============================================================================

fn run_intent(side: Side, intents: &[Intent], ctx: &mut TurnContext<'_>) -> Result<(), BattleError> {
    if intents.is_empty() {
        ctx.record(BattleEvent::Passed { side });
        return Ok(());
    }

    let step = ctx.state.combatant(side).actions_taken as usize % intents.len();
    let intent = &intents[step];
    ctx.record(BattleEvent::IntentUsed {
        side,
        intent: intent.name.clone(),
    });

    let bindings = ctx.state.snapshot(side).bindings();
    apply_effects(
        side,
        EffectSource::Intent(intent.name.clone()),
        &intent.effects,
        &bindings,
        ctx,
    )
    .map_err(|error| BattleError::Intent {
        side,
        intent: intent.name.clone(),
        error,
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Applies `effects` in order against one shared binding table.
fn apply_effects(
    side: Side,
    source: EffectSource,
    effects: &[Effect],
    bindings: &Bindings,
    ctx: &mut TurnContext<'_>,
) -> Result<(), EvalError> {
    for effect in effects {
        let (actor, opponent) = ctx.state.pair_mut(side);
        let mut effect_ctx = EffectContext {
            actor,
            opponent,
            modifiers: ctx.modifiers,
            bindings,
        };
        let outcome = apply_effect(effect, &mut effect_ctx)?;
        ctx.record(BattleEvent::Effect {
            side,
            source: source.clone(),
            outcome,
        });
    }
    Ok(())
}
