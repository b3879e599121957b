//! Deterministic card selection.
//!
//! A [`StrategySelector`] holds an ordered list of [`Rule`]s and a total
//! [`TieBreak`]. Selection starts from every affordable card in hand; each
//! rule whose guard holds narrows the candidates, and a rule that would leave
//! nothing is ignored. Whatever survives all rules is reduced to one card by
//! the tie-break.
//!
//! # Determinism
//!
//! Selection is a pure function of the hand (including its order) and the
//! snapshot. There is no randomness and no hidden state.

mod error;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use error::RuleError;

use crate::card::effect::{scale_incoming, scale_outgoing};
use crate::card::{CardLibrary, CardRef, EffectKind, Target};
use crate::config::{ModifierConfig, RuleConfig};
use crate::engine::{BattleError, FormulaOwner};
use crate::expr::{Bindings, EvalError, Expr, FunctionWhitelist, truthy};
use crate::state::{BattleSnapshot, ModifierKind, Side};

// ============================================================================
// Rules
// ============================================================================

/// Numeric card property a rule can rank by.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum CardAttribute {
    /// Sum of damage amounts aimed at the opponent.
    Damage,
    Heal,
    Block,
    Draw,
    Energy,
    /// Sum of buff intensities.
    Buff,
    Cost,
    /// Number of effects on the card.
    Effects,
    /// Sum of every effect amount.
    Total,
}

/// What a rule keeps.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleKind {
    PreferHighest(CardAttribute),
    PreferLowest(CardAttribute),
    PreferTag(String),
    AvoidTag(String),
    /// Cards whose damage, after strength, weak and vulnerable, covers the
    /// opponent's HP plus block.
    Lethal,
    /// Healing cards, while the acting side is at or below `percent` of max HP.
    HealBelow { percent: u32 },
}

/// A compiled rule with its optional guard.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    pub when: Option<Expr>,
}

/// Final ordering among equally ranked cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Leftmost card in hand.
    #[default]
    HandPosition,
    /// Lexically smallest card id, then leftmost.
    CardId,
}

/// Result of a selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Choice {
    Play { hand_index: usize, card: CardRef },
    Pass,
}

// ============================================================================
// Candidates
// ============================================================================

/// Modifiers in play between the acting side and its opponent.
#[derive(Clone, Copy, Debug)]
struct DamageScale<'a> {
    strength: u32,
    weak: bool,
    vulnerable: bool,
    config: &'a ModifierConfig,
}

impl<'a> DamageScale<'a> {
    fn capture(snapshot: &BattleSnapshot, config: &'a ModifierConfig) -> Self {
        let actor = snapshot.actor();
        Self {
            strength: actor.modifier(ModifierKind::Strength),
            weak: actor.has(ModifierKind::Weak),
            vulnerable: snapshot.opponent().has(ModifierKind::Vulnerable),
            config,
        }
    }

    /// Damage one effect of `base` would put into the opponent's block and HP.
    fn landed(&self, base: u32) -> u32 {
        let outgoing = scale_outgoing(base, self.strength, self.weak, self.config);
        scale_incoming(outgoing, self.vulnerable, self.config.vulnerable_percent)
    }
}

/// Per-card attribute totals, evaluated against one snapshot.
///
/// `damage` is the printed amount; `landed` is what play would deal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct CardProfile {
    damage: u64,
    landed: u64,
    heal: u64,
    block: u64,
    draw: u64,
    energy: u64,
    buff: u64,
    cost: u64,
    effects: u64,
    total: u64,
}

impl CardProfile {
    /// Sums amounts of every effect whose condition holds.
    fn measure(
        card: &CardRef,
        bindings: &Bindings,
        scale: &DamageScale<'_>,
    ) -> Result<Self, EvalError> {
        let mut profile = CardProfile {
            cost: card.cost as u64,
            effects: card.effects.len() as u64,
            ..Self::default()
        };

        for effect in &card.effects {
            if !effect.is_active(bindings)? {
                continue;
            }
            let resolved = effect.amount.resolve(bindings)?;
            let amount = resolved as u64;
            profile.total += amount;
            match effect.kind {
                EffectKind::Damage if effect.target == Target::Opponent => {
                    profile.damage += amount;
                    profile.landed += scale.landed(resolved) as u64;
                }
                EffectKind::Damage => {}
                EffectKind::Heal => profile.heal += amount,
                EffectKind::Block => profile.block += amount,
                EffectKind::Draw => profile.draw += amount,
                EffectKind::Energy => profile.energy += amount,
                EffectKind::Buff => profile.buff += amount,
            }
        }

        Ok(profile)
    }

    fn get(&self, attribute: CardAttribute) -> u64 {
        match attribute {
            CardAttribute::Damage => self.damage,
            CardAttribute::Heal => self.heal,
            CardAttribute::Block => self.block,
            CardAttribute::Draw => self.draw,
            CardAttribute::Energy => self.energy,
            CardAttribute::Buff => self.buff,
            CardAttribute::Cost => self.cost,
            CardAttribute::Effects => self.effects,
            CardAttribute::Total => self.total,
        }
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    hand_index: usize,
    card: CardRef,
    profile: CardProfile,
}

// ============================================================================
// Selector
// ============================================================================

/// Ordered rule list plus tie-break.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategySelector {
    rules: Vec<Rule>,
    tie_break: TieBreak,
    modifiers: ModifierConfig,
}

impl StrategySelector {
    /// Selector using the default modifier percentages.
    pub fn new(rules: Vec<Rule>, tie_break: TieBreak) -> Self {
        Self {
            rules,
            tie_break,
            modifiers: ModifierConfig::default(),
        }
    }

    /// Percentages the lethal check scales damage by.
    pub fn with_modifiers(mut self, modifiers: ModifierConfig) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Compiles configured rules for `side`.
    ///
    /// Unknown attributes and tags no card declares are rejected here so that
    /// selection itself can only fail on formula evaluation.
    pub fn from_config(
        side: Side,
        rules: &[RuleConfig],
        tie_break: TieBreak,
        library: &CardLibrary,
        whitelist: &FunctionWhitelist,
        modifiers: &ModifierConfig,
    ) -> Result<Self, BattleError> {
        let mut compiled = Vec::with_capacity(rules.len());

        for (index, config) in rules.iter().enumerate() {
            let rule_error = |error| BattleError::Rule { side, error };
            let attribute = |name: &str| {
                CardAttribute::from_str(name).map_err(|_| {
                    rule_error(RuleError::UnknownAttribute {
                        index,
                        attribute: name.to_string(),
                    })
                })
            };
            let tag = |name: &str| {
                if library.declares_tag(name) {
                    Ok(name.to_string())
                } else {
                    Err(rule_error(RuleError::UnknownTag {
                        index,
                        tag: name.to_string(),
                    }))
                }
            };

            let kind = match config {
                RuleConfig::PreferHighest { attribute: name, .. } => {
                    RuleKind::PreferHighest(attribute(name)?)
                }
                RuleConfig::PreferLowest { attribute: name, .. } => {
                    RuleKind::PreferLowest(attribute(name)?)
                }
                RuleConfig::PreferTag { tag: name, .. } => RuleKind::PreferTag(tag(name)?),
                RuleConfig::AvoidTag { tag: name, .. } => RuleKind::AvoidTag(tag(name)?),
                RuleConfig::Lethal { .. } => RuleKind::Lethal,
                RuleConfig::HealBelow { percent, .. } => RuleKind::HealBelow { percent: *percent },
            };

            let when = config
                .when()
                .map(|source| Expr::parse(source, whitelist))
                .transpose()
                .map_err(|error| BattleError::Formula {
                    owner: FormulaOwner::Rule { side, index },
                    error,
                })?;

            compiled.push(Rule { kind, when });
        }

        Ok(Self::new(compiled, tie_break).with_modifiers(*modifiers))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Chooses one card from `hand`, or passes.
    ///
    /// Only cards the acting side can afford are considered. Fails only when a
    /// rule guard or a card's formula amount cannot be evaluated.
    pub fn select(
        &self,
        hand: &[CardRef],
        snapshot: &BattleSnapshot,
    ) -> Result<Choice, BattleError> {
        let side = snapshot.acting;
        let strategy_error = |error| BattleError::Strategy { side, error };
        let bindings = snapshot.bindings();
        let scale = DamageScale::capture(snapshot, &self.modifiers);
        let energy = snapshot.actor().energy;

        let mut candidates = hand
            .iter()
            .enumerate()
            .filter(|(_, card)| card.cost <= energy)
            .map(|(hand_index, card)| {
                Ok(Candidate {
                    hand_index,
                    card: card.clone(),
                    profile: CardProfile::measure(card, &bindings, &scale)?,
                })
            })
            .collect::<Result<Vec<_>, EvalError>>()
            .map_err(strategy_error)?;

        if candidates.is_empty() {
            tracing::debug!(%side, hand = hand.len(), energy, "no playable card, passing");
            return Ok(Choice::Pass);
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if !rule_applies(rule, snapshot, &bindings).map_err(strategy_error)? {
                continue;
            }
            let kept = narrow(&rule.kind, &candidates, snapshot);
            tracing::trace!(%side, rule = index, before = candidates.len(), after = kept.len(), "rule applied");
            if !kept.is_empty() {
                candidates = kept;
            }
        }

        let Some(chosen) = self.break_tie(candidates) else {
            return Ok(Choice::Pass);
        };

        tracing::debug!(
            %side,
            card = %chosen.card.id,
            hand_index = chosen.hand_index,
            "strategy selected card"
        );

        Ok(Choice::Play {
            hand_index: chosen.hand_index,
            card: chosen.card,
        })
    }

    fn break_tie(&self, candidates: Vec<Candidate>) -> Option<Candidate> {
        match self.tie_break {
            TieBreak::HandPosition => candidates.into_iter().min_by_key(|c| c.hand_index),
            TieBreak::CardId => candidates
                .into_iter()
                .min_by(|a, b| (&a.card.id, a.hand_index).cmp(&(&b.card.id, b.hand_index))),
        }
    }
}

/// Evaluates the rule's guard and any built-in precondition.
fn rule_applies(
    rule: &Rule,
    snapshot: &BattleSnapshot,
    bindings: &Bindings,
) -> Result<bool, EvalError> {
    if let Some(when) = &rule.when {
        if !truthy(when.evaluate(bindings)?) {
            return Ok(false);
        }
    }

    if let RuleKind::HealBelow { percent } = rule.kind {
        let actor = snapshot.actor();
        return Ok(actor.hp as u64 * 100 <= percent as u64 * actor.max_hp as u64);
    }

    Ok(true)
}

/// Subset of `candidates` a rule keeps, in hand order.
fn narrow(kind: &RuleKind, candidates: &[Candidate], snapshot: &BattleSnapshot) -> Vec<Candidate> {
    let keep = |predicate: &dyn Fn(&Candidate) -> bool| {
        candidates
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect::<Vec<_>>()
    };

    match kind {
        RuleKind::PreferHighest(attribute) => {
            let best = candidates.iter().map(|c| c.profile.get(*attribute)).max();
            keep(&|c| Some(c.profile.get(*attribute)) == best)
        }
        RuleKind::PreferLowest(attribute) => {
            let best = candidates.iter().map(|c| c.profile.get(*attribute)).min();
            keep(&|c| Some(c.profile.get(*attribute)) == best)
        }
        RuleKind::PreferTag(tag) => keep(&|c| c.card.has_tag(tag)),
        RuleKind::AvoidTag(tag) => keep(&|c| !c.card.has_tag(tag)),
        RuleKind::Lethal => {
            let opponent = snapshot.opponent();
            let needed = opponent.hp as u64 + opponent.block as u64;
            keep(&|c| c.profile.landed >= needed)
        }
        RuleKind::HealBelow { .. } => keep(&|c| c.profile.heal > 0),
    }
}
