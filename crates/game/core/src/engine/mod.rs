//! Battle state machine.
//!
//! The [`BattleEngine`] is the only writer of [`BattleState`]. A battle moves
//! through a fixed cycle of phases:
//!
//! ```text
//! Init → TurnStart → PlayerAction → EnemyAction → Resolve → CheckTermination
//!            ↑                                                    │
//!            └──────────────────── not finished ─────────────────┘
//!                                                                 ↓
//!                                                             Terminal
//! ```
//!
//! [`BattleEngine::step`] runs exactly one phase, [`BattleEngine::run`] steps
//! until the battle is decided. Every state change is appended to an ordered
//! event trace.

mod controller;
mod errors;
mod events;
mod outcome;
mod turns;

pub use controller::{Controller, Intent};
pub use errors::{BattleError, FormulaOwner};
pub use events::{BattleEvent, EffectSource};
pub use outcome::{DrawReason, Outcome};

use crate::card::{DrawRules, Piles};
use crate::config::BattleConfig;
use crate::setup::{BattleSetup, CombatantSetup};
use crate::state::{BattleState, Combatant, Side};

/// Position in the turn cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Decks built, nothing drawn yet.
    Init,
    TurnStart,
    PlayerAction,
    EnemyAction,
    Resolve,
    CheckTermination,
    Terminal,
}

impl Phase {
    /// Action phase of `side`.
    pub fn action(side: Side) -> Phase {
        match side {
            Side::Player => Phase::PlayerAction,
            Side::Enemy => Phase::EnemyAction,
        }
    }
}

/// Deterministic battle runner.
#[derive(Clone, Debug)]
pub struct BattleEngine {
    setup: BattleSetup,
    state: BattleState,
    events: Vec<BattleEvent>,
}

impl BattleEngine {
    /// Creates an engine in [`Phase::Init`] from a validated setup.
    pub fn new(setup: BattleSetup) -> Self {
        let player = build_combatant(&setup.player);
        let enemy = build_combatant(&setup.enemy);
        let state = BattleState::new(setup.turn_limit, player, enemy);
        Self {
            setup,
            state,
            events: Vec::new(),
        }
    }

    /// Validates `config` and creates an engine for it.
    pub fn from_config(config: &BattleConfig) -> Result<Self, BattleError> {
        Ok(Self::new(BattleSetup::from_config(config)?))
    }

    /// Runs the current phase and moves to the next one.
    ///
    /// Returns the phase the engine is in afterwards. Stepping a finished
    /// battle fails with [`BattleError::AlreadyFinished`]. After any other
    /// error the engine stays in the failed phase.
    pub fn step(&mut self) -> Result<Phase, BattleError> {
        let next = match self.state.phase {
            Phase::Init => {
                self.init();
                Phase::TurnStart
            }
            Phase::TurnStart => {
                self.start_turn();
                Phase::PlayerAction
            }
            Phase::PlayerAction => {
                self.take_action(Side::Player)?;
                Phase::EnemyAction
            }
            Phase::EnemyAction => {
                self.take_action(Side::Enemy)?;
                Phase::Resolve
            }
            Phase::Resolve => {
                self.resolve();
                Phase::CheckTermination
            }
            Phase::CheckTermination => match self.check_termination() {
                Some(outcome) => {
                    self.finish(outcome);
                    Phase::Terminal
                }
                None => Phase::TurnStart,
            },
            Phase::Terminal => return Err(BattleError::AlreadyFinished),
        };

        self.state.phase = next;
        Ok(next)
    }

    /// Steps until the battle is decided.
    pub fn run(&mut self) -> Result<Outcome, BattleError> {
        loop {
            if let Some(outcome) = self.state.outcome {
                return Ok(outcome);
            }
            self.step()?;
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn setup(&self) -> &BattleSetup {
        &self.setup
    }

    /// Trace of every state change so far.
    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Terminal
    }
}

/// Summary of a completed battle.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleReport {
    pub outcome: Outcome,
    /// Turn during which the battle ended.
    pub turns: u32,
    pub events: Vec<BattleEvent>,
}

/// Sets up and runs a battle to completion.
pub fn run_battle(config: &BattleConfig) -> Result<BattleReport, BattleError> {
    let mut engine = BattleEngine::from_config(config)?;
    let outcome = engine.run()?;
    Ok(BattleReport {
        outcome,
        turns: engine.state.turn,
        events: engine.events,
    })
}

fn build_combatant(setup: &CombatantSetup) -> Combatant {
    let piles = Piles::new(setup.deck.clone(), DrawRules::from(&setup.draw));
    Combatant::new(setup.side, setup.hp, setup.max_hp, piles)
}
