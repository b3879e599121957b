//! Declarative battle configuration.
//!
//! These types mirror the configuration document one-to-one and carry no
//! validation beyond what serde enforces structurally. [`crate::BattleSetup`]
//! checks values, resolves card references and parses formulas exactly once
//! before any turn runs.

use serde::{Deserialize, Serialize};

use crate::card::{EffectKind, Target};
use crate::state::ModifierKind;
use crate::strategy::TieBreak;

/// Complete description of one battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Number of turns after which the battle ends in a draw.
    pub turn_limit: u32,

    #[serde(default)]
    pub expressions: ExpressionConfig,

    #[serde(default)]
    pub modifiers: ModifierConfig,

    pub player: CombatantConfig,

    pub enemy: CombatantConfig,

    /// Card library shared by both combatants.
    #[serde(default)]
    pub cards: Vec<CardConfig>,
}

// ============================================================================
// Global Settings
// ============================================================================

/// Formula settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionConfig {
    /// Built-in functions formulas may call. Empty means none.
    #[serde(default)]
    pub functions: Vec<String>,
}

/// Damage multipliers applied by the `weak` and `vulnerable` modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierConfig {
    #[serde(default = "ModifierConfig::default_weak_percent")]
    pub weak_percent: u32,

    #[serde(default = "ModifierConfig::default_vulnerable_percent")]
    pub vulnerable_percent: u32,
}

impl ModifierConfig {
    pub const DEFAULT_WEAK_PERCENT: u32 = 75;
    pub const DEFAULT_VULNERABLE_PERCENT: u32 = 150;
    /// Upper bound accepted for either percentage.
    pub const MAX_PERCENT: u32 = 1000;

    fn default_weak_percent() -> u32 {
        Self::DEFAULT_WEAK_PERCENT
    }

    fn default_vulnerable_percent() -> u32 {
        Self::DEFAULT_VULNERABLE_PERCENT
    }
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            weak_percent: Self::DEFAULT_WEAK_PERCENT,
            vulnerable_percent: Self::DEFAULT_VULNERABLE_PERCENT,
        }
    }
}

// ============================================================================
// Combatants
// ============================================================================

/// Starting state and behaviour of one side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantConfig {
    pub hp: u32,

    /// Heal cap. Healing is uncapped when absent.
    #[serde(default)]
    pub max_hp: Option<u32>,

    #[serde(default = "CombatantConfig::default_energy_per_turn")]
    pub energy_per_turn: u32,

    /// Card ids in draw order.
    #[serde(default)]
    pub deck: Vec<String>,

    #[serde(default)]
    pub draw: DrawConfig,

    pub controller: ControllerConfig,
}

impl CombatantConfig {
    pub const DEFAULT_ENERGY_PER_TURN: u32 = 3;

    fn default_energy_per_turn() -> u32 {
        Self::DEFAULT_ENERGY_PER_TURN
    }
}

/// Hand management rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(default = "DrawConfig::default_starting_hand")]
    pub starting_hand: u32,

    #[serde(default = "DrawConfig::default_draw_per_turn")]
    pub draw_per_turn: u32,

    /// Drawing stops while the hand holds this many cards.
    #[serde(default = "DrawConfig::default_hand_limit")]
    pub hand_limit: u32,

    /// Discard non-retained cards at the end of each turn.
    #[serde(default = "default_true")]
    pub discard_hand: bool,

    /// Turn the discard pile into the deck when drawing from an empty deck.
    #[serde(default = "default_true")]
    pub reshuffle: bool,
}

impl DrawConfig {
    pub const DEFAULT_STARTING_HAND: u32 = 5;
    pub const DEFAULT_DRAW_PER_TURN: u32 = 5;
    pub const DEFAULT_HAND_LIMIT: u32 = 10;

    fn default_starting_hand() -> u32 {
        Self::DEFAULT_STARTING_HAND
    }

    fn default_draw_per_turn() -> u32 {
        Self::DEFAULT_DRAW_PER_TURN
    }

    fn default_hand_limit() -> u32 {
        Self::DEFAULT_HAND_LIMIT
    }
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            starting_hand: Self::DEFAULT_STARTING_HAND,
            draw_per_turn: Self::DEFAULT_DRAW_PER_TURN,
            hand_limit: Self::DEFAULT_HAND_LIMIT,
            discard_hand: true,
            reshuffle: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// How a combatant chooses its action each turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerConfig {
    /// Play cards from hand, chosen by ordered rules.
    Strategy {
        #[serde(default = "default_plays_per_turn")]
        plays_per_turn: u32,

        #[serde(default)]
        tie_break: TieBreak,

        #[serde(default)]
        rules: Vec<RuleConfig>,
    },

    /// Deal formula-computed damage to the opponent.
    Formula { damage: String },

    /// Cycle through a fixed list of intents.
    Pattern { intents: Vec<IntentConfig> },
}

fn default_plays_per_turn() -> u32 {
    1
}

/// One step of a pattern controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    pub name: String,

    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

/// A strategy rule as written in configuration.
///
/// Attribute names stay strings here so an unknown name surfaces as a rule
/// error during setup rather than a parse failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleConfig {
    PreferHighest {
        attribute: String,
        #[serde(default)]
        when: Option<String>,
    },
    PreferLowest {
        attribute: String,
        #[serde(default)]
        when: Option<String>,
    },
    PreferTag {
        tag: String,
        #[serde(default)]
        when: Option<String>,
    },
    AvoidTag {
        tag: String,
        #[serde(default)]
        when: Option<String>,
    },
    Lethal {
        #[serde(default)]
        when: Option<String>,
    },
    HealBelow {
        percent: u32,
        #[serde(default)]
        when: Option<String>,
    },
}

impl RuleConfig {
    /// Guard formula, if any.
    pub fn when(&self) -> Option<&str> {
        match self {
            RuleConfig::PreferHighest { when, .. }
            | RuleConfig::PreferLowest { when, .. }
            | RuleConfig::PreferTag { when, .. }
            | RuleConfig::AvoidTag { when, .. }
            | RuleConfig::Lethal { when }
            | RuleConfig::HealBelow { when, .. } => when.as_deref(),
        }
    }
}

// ============================================================================
// Cards
// ============================================================================

/// Card definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub cost: u32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub effects: Vec<EffectConfig>,

    /// Played card leaves play instead of going to discard.
    #[serde(default)]
    pub exhaust: bool,

    /// Stays in hand at end of turn.
    #[serde(default)]
    pub retain: bool,

    /// Placed at the top of the starting deck.
    #[serde(default)]
    pub innate: bool,
}

/// One effect of a card or intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub kind: EffectKind,

    #[serde(default)]
    pub amount: AmountConfig,

    /// Defaults per kind when absent.
    #[serde(default)]
    pub target: Option<Target>,

    /// Required for `buff`, rejected otherwise.
    #[serde(default)]
    pub modifier: Option<ModifierKind>,

    /// Turns a `buff` lasts; permanent when absent.
    #[serde(default)]
    pub duration: Option<u32>,

    /// Formula; the effect is skipped when it evaluates to 0.
    #[serde(default)]
    pub condition: Option<String>,
}

/// Literal or formula magnitude.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountConfig {
    Value(i64),
    Formula(String),
}

impl Default for AmountConfig {
    fn default() -> Self {
        AmountConfig::Value(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        turn_limit = 10

        [player]
        hp = 30
        deck = ["strike"]
        [player.controller]
        kind = "strategy"

        [enemy]
        hp = 30
        [enemy.controller]
        kind = "formula"
        damage = "turn * 2"

        [[cards]]
        id = "strike"
        effects = [{ kind = "damage", amount = 5 }]
    "#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: BattleConfig = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.turn_limit, 10);
        assert_eq!(config.modifiers, ModifierConfig::default());
        assert!(config.expressions.functions.is_empty());
        assert_eq!(config.player.energy_per_turn, 3);
        assert_eq!(config.player.draw, DrawConfig::default());
        assert_eq!(
            config.player.controller,
            ControllerConfig::Strategy {
                plays_per_turn: 1,
                tie_break: TieBreak::HandPosition,
                rules: Vec::new(),
            }
        );
        assert_eq!(
            config.enemy.controller,
            ControllerConfig::Formula {
                damage: "turn * 2".into()
            }
        );

        let strike = &config.cards[0];
        assert_eq!(strike.id, "strike");
        assert_eq!(strike.cost, 0);
        assert_eq!(strike.effects[0].kind, EffectKind::Damage);
        assert_eq!(strike.effects[0].amount, AmountConfig::Value(5));
    }

    #[test]
    fn parses_rules_and_formula_amounts() {
        let source = r#"
            kind = "strategy"
            plays_per_turn = 3
            tie_break = "card_id"
            rules = [
                { rule = "heal_below", percent = 30 },
                { rule = "prefer_highest", attribute = "damage", when = "turn > 1" },
                { rule = "avoid_tag", tag = "slow" },
                { rule = "lethal" },
            ]
        "#;
        let controller: ControllerConfig = toml::from_str(source).unwrap();
        let ControllerConfig::Strategy {
            plays_per_turn,
            tie_break,
            rules,
        } = controller
        else {
            panic!("expected strategy controller");
        };

        assert_eq!(plays_per_turn, 3);
        assert_eq!(tie_break, TieBreak::CardId);
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[1].when(), Some("turn > 1"));
        assert_eq!(rules[3], RuleConfig::Lethal { when: None });

        let effect: EffectConfig = toml::from_str(
            r#"
            kind = "heal"
            amount = "player_max_hp - player_hp"
            "#,
        )
        .unwrap();
        assert_eq!(
            effect.amount,
            AmountConfig::Formula("player_max_hp - player_hp".into())
        );
    }

    #[test]
    fn parses_buff_effects() {
        let effect: EffectConfig = toml::from_str(
            r#"
            kind = "buff"
            modifier = "vulnerable"
            amount = 1
            duration = 2
            target = "opponent"
            "#,
        )
        .unwrap();

        assert_eq!(effect.modifier, Some(ModifierKind::Vulnerable));
        assert_eq!(effect.duration, Some(2));
        assert_eq!(effect.target, Some(Target::Opponent));
    }

    #[test]
    fn rejects_unknown_controller_kind() {
        assert!(toml::from_str::<ControllerConfig>(r#"kind = "random""#).is_err());
    }
}
