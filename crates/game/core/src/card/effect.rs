//! Effect application.
//!
//! Effects are applied one at a time against a binding table captured before
//! the first effect of the card (or intent) ran. Later effects therefore see
//! the same formula inputs as earlier ones even though the live state has
//! moved on.

use crate::card::{DrawReport, Effect, EffectKind, Target};
use crate::config::ModifierConfig;
use crate::expr::{Bindings, EvalError};
use crate::state::{Combatant, ModifierKind, Side};

// ============================================================================
// Context and Outcome
// ============================================================================

/// Everything an effect may read or change.
pub struct EffectContext<'a> {
    /// Combatant playing the card.
    pub actor: &'a mut Combatant,
    pub opponent: &'a mut Combatant,
    pub modifiers: &'a ModifierConfig,
    /// Snapshot bindings shared by every effect of one card.
    pub bindings: &'a Bindings,
}

impl EffectContext<'_> {
    fn target_mut(&mut self, target: Target) -> &mut Combatant {
        match target {
            Target::Caster => &mut *self.actor,
            Target::Opponent => &mut *self.opponent,
        }
    }
}

/// Damage after modifiers, split into what block absorbed and what hit HP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageDealt {
    pub amount: u32,
    pub blocked: u32,
    pub hp_lost: u32,
}

/// What applying one effect did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    /// Condition evaluated to 0.
    Skipped,
    Damage {
        target: Side,
        dealt: DamageDealt,
        hp: u32,
    },
    Heal {
        target: Side,
        amount: u32,
        hp: u32,
    },
    Block {
        target: Side,
        amount: u32,
        block: u32,
    },
    Draw {
        target: Side,
        report: DrawReport,
    },
    Energy {
        target: Side,
        amount: u32,
        energy: u32,
    },
    Modifier {
        target: Side,
        kind: ModifierKind,
        intensity: u32,
        duration: Option<u32>,
    },
}

// ============================================================================
// Application
// ============================================================================

/// Applies `effect` and reports what changed.
///
/// Only formula evaluation can fail; the state is left untouched when it does.
pub fn apply_effect(
    effect: &Effect,
    ctx: &mut EffectContext<'_>,
) -> Result<EffectOutcome, EvalError> {
    if !effect.is_active(ctx.bindings)? {
        return Ok(EffectOutcome::Skipped);
    }
    let amount = effect.amount.resolve(ctx.bindings)?;

    let outcome = match effect.kind {
        EffectKind::Damage => {
            let outgoing = outgoing_damage(amount, ctx.actor, ctx.modifiers);
            let vulnerable_percent = ctx.modifiers.vulnerable_percent;
            let target = ctx.target_mut(effect.target);
            let dealt = take_damage(target, outgoing, vulnerable_percent);
            EffectOutcome::Damage {
                target: target.side,
                dealt,
                hp: target.hp,
            }
        }

        EffectKind::Heal => {
            let target = ctx.target_mut(effect.target);
            let amount = target.heal(amount);
            EffectOutcome::Heal {
                target: target.side,
                amount,
                hp: target.hp,
            }
        }

        EffectKind::Block => {
            let dexterity = ctx.actor.modifiers.intensity(ModifierKind::Dexterity);
            let amount = amount.saturating_add(dexterity);
            let target = ctx.target_mut(effect.target);
            target.block = target.block.saturating_add(amount);
            EffectOutcome::Block {
                target: target.side,
                amount,
                block: target.block,
            }
        }

        EffectKind::Draw => {
            let target = ctx.target_mut(effect.target);
            EffectOutcome::Draw {
                target: target.side,
                report: target.piles.draw(amount),
            }
        }

        EffectKind::Energy => {
            let target = ctx.target_mut(effect.target);
            target.energy = target.energy.saturating_add(amount);
            EffectOutcome::Energy {
                target: target.side,
                amount,
                energy: target.energy,
            }
        }

        EffectKind::Buff => {
            let Some(kind) = effect.modifier else {
                // Setup rejects buff effects without a modifier.
                return Ok(EffectOutcome::Skipped);
            };
            let target = ctx.target_mut(effect.target);
            target.modifiers.apply(kind, amount, effect.duration);
            EffectOutcome::Modifier {
                target: target.side,
                kind,
                intensity: amount,
                duration: effect.duration,
            }
        }
    };

    Ok(outcome)
}

/// Damage `attacker` deals before the defender's modifiers and block.
pub fn outgoing_damage(base: u32, attacker: &Combatant, config: &ModifierConfig) -> u32 {
    scale_outgoing(
        base,
        attacker.modifiers.intensity(ModifierKind::Strength),
        attacker.modifiers.has(ModifierKind::Weak),
        config,
    )
}

/// Strength adds to the base, then weak scales the sum down.
pub fn scale_outgoing(base: u32, strength: u32, weak: bool, config: &ModifierConfig) -> u32 {
    let mut damage = base as u64 + strength as u64;
    if weak {
        damage = damage * config.weak_percent as u64 / 100;
    }
    saturate(damage)
}

/// Damage that reaches the defender's block after vulnerable.
pub fn scale_incoming(damage: u32, vulnerable: bool, vulnerable_percent: u32) -> u32 {
    if !vulnerable {
        return damage;
    }
    saturate(damage as u64 * vulnerable_percent as u64 / 100)
}

/// Applies incoming damage: vulnerable scales it, block absorbs first, HP
/// clamps at zero.
pub fn take_damage(defender: &mut Combatant, damage: u32, vulnerable_percent: u32) -> DamageDealt {
    let amount = scale_incoming(
        damage,
        defender.modifiers.has(ModifierKind::Vulnerable),
        vulnerable_percent,
    );

    let blocked = amount.min(defender.block);
    defender.block -= blocked;
    let hp_lost = defender.lose_hp(amount - blocked);

    DamageDealt {
        amount,
        blocked,
        hp_lost,
    }
}

/// Converts a formula value to an effect amount.
///
/// Truncates toward zero; negative values become 0 and values beyond `u32`
/// saturate.
pub fn to_amount(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.trunc() as u32
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
