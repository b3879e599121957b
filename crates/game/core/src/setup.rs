//! One-shot validation and compilation of a [`BattleConfig`].
//!
//! [`BattleSetup::from_config`] is the only place configuration values are
//! checked. It resolves deck entries to shared card definitions, parses every
//! formula against the configured whitelist and compiles strategy rules.
//! Once it succeeds the engine can only fail on formula evaluation.

use std::collections::BTreeSet;

use crate::card::{Amount, Card, CardId, CardLibrary, CardRef, Effect, EffectKind, Target};
use crate::config::{
    AmountConfig, BattleConfig, CardConfig, CombatantConfig, ControllerConfig, DrawConfig,
    EffectConfig, ModifierConfig,
};
use crate::engine::{BattleError, Controller, FormulaOwner, Intent};
use crate::error::ConfigError;
use crate::expr::{EvalErrorKind, Expr, FunctionWhitelist};
use crate::state::Side;
use crate::strategy::StrategySelector;

/// Validated, immutable battle parameters.
#[derive(Clone, Debug)]
pub struct BattleSetup {
    pub turn_limit: u32,
    pub modifiers: ModifierConfig,
    pub whitelist: FunctionWhitelist,
    pub library: CardLibrary,
    pub player: CombatantSetup,
    pub enemy: CombatantSetup,
}

/// Validated parameters of one side.
#[derive(Clone, Debug)]
pub struct CombatantSetup {
    pub side: Side,
    pub hp: u32,
    pub max_hp: Option<u32>,
    pub energy_per_turn: u32,
    /// Starting deck in configured order; innate cards are moved up when the
    /// piles are built.
    pub deck: Vec<CardRef>,
    pub draw: DrawConfig,
    pub controller: Controller,
}

impl BattleSetup {
    /// Validates `config` and compiles it.
    pub fn from_config(config: &BattleConfig) -> Result<Self, BattleError> {
        if config.turn_limit == 0 {
            return Err(ConfigError::ZeroTurnLimit.into());
        }
        validate_percent("weak_percent", config.modifiers.weak_percent)?;
        validate_percent("vulnerable_percent", config.modifiers.vulnerable_percent)?;

        let whitelist =
            FunctionWhitelist::from_names(&config.expressions.functions).map_err(whitelist_error)?;

        let library = build_library(&config.cards, &whitelist)?;
        let player = build_combatant(
            Side::Player,
            &config.player,
            &library,
            &whitelist,
            &config.modifiers,
        )?;
        let enemy = build_combatant(
            Side::Enemy,
            &config.enemy,
            &library,
            &whitelist,
            &config.modifiers,
        )?;

        tracing::debug!(
            cards = library.len(),
            player_deck = player.deck.len(),
            enemy_deck = enemy.deck.len(),
            player_controller = player.controller.kind(),
            enemy_controller = enemy.controller.kind(),
            "battle setup compiled"
        );

        Ok(Self {
            turn_limit: config.turn_limit,
            modifiers: config.modifiers,
            whitelist,
            library,
            player,
            enemy,
        })
    }

    pub fn combatant(&self, side: Side) -> &CombatantSetup {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }
}

// ============================================================================
// Cards
// ============================================================================

fn build_library(
    cards: &[CardConfig],
    whitelist: &FunctionWhitelist,
) -> Result<CardLibrary, BattleError> {
    let mut library = CardLibrary::new();

    for (index, config) in cards.iter().enumerate() {
        if config.id.trim().is_empty() {
            return Err(ConfigError::EmptyCardId { index }.into());
        }

        let id = CardId::new(config.id.clone());
        let owner = format!("card '{id}'");
        let effects = config
            .effects
            .iter()
            .enumerate()
            .map(|(effect, definition)| {
                compile_effect(definition, effect, &owner, whitelist, |effect| {
                    FormulaOwner::Card {
                        card: id.clone(),
                        effect,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let card = Card {
            id: id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            cost: config.cost,
            tags: config.tags.iter().cloned().collect::<BTreeSet<_>>(),
            effects,
            exhaust: config.exhaust,
            retain: config.retain,
            innate: config.innate,
        };

        if !library.insert(card) {
            return Err(ConfigError::DuplicateCard { id: config.id.clone() }.into());
        }
    }

    Ok(library)
}

/// Compiles one effect. `owner` names the card or intent in config errors;
/// `formula_owner` builds the owner of a formula error from the effect index.
fn compile_effect(
    definition: &EffectConfig,
    effect: usize,
    owner: &str,
    whitelist: &FunctionWhitelist,
    formula_owner: impl Fn(usize) -> FormulaOwner,
) -> Result<Effect, BattleError> {
    match (definition.kind, definition.modifier) {
        (EffectKind::Buff, None) => {
            return Err(ConfigError::MissingModifier {
                owner: owner.to_string(),
                effect,
            }
            .into());
        }
        (kind, Some(_)) if kind != EffectKind::Buff => {
            return Err(ConfigError::UnexpectedModifier {
                owner: owner.to_string(),
                effect,
            }
            .into());
        }
        _ => {}
    }

    let parse = |source: &str| {
        Expr::parse(source, whitelist).map_err(|error| BattleError::Formula {
            owner: formula_owner(effect),
            error,
        })
    };

    let amount = match &definition.amount {
        AmountConfig::Value(value) if *value < 0 => {
            return Err(ConfigError::NegativeAmount {
                owner: owner.to_string(),
                effect,
                amount: *value,
            }
            .into());
        }
        AmountConfig::Value(value) => match u32::try_from(*value) {
            Ok(value) => Amount::Fixed(value),
            Err(_) => {
                return Err(ConfigError::AmountTooLarge {
                    owner: owner.to_string(),
                    effect,
                    amount: *value,
                }
                .into());
            }
        },
        AmountConfig::Formula(source) => Amount::Formula(parse(source)?),
    };

    let condition = definition.condition.as_deref().map(parse).transpose()?;

    Ok(Effect {
        kind: definition.kind,
        amount,
        target: definition
            .target
            .unwrap_or_else(|| Target::default_for(definition.kind, definition.modifier)),
        modifier: definition.modifier,
        duration: definition.duration,
        condition,
    })
}

// ============================================================================
// Combatants
// ============================================================================

fn whitelist_error(kind: EvalErrorKind) -> ConfigError {
    match kind {
        EvalErrorKind::UnknownFunction { name } => ConfigError::UnknownFunction { name },
        error => ConfigError::Functions { error },
    }
}

fn build_combatant(
    side: Side,
    config: &CombatantConfig,
    library: &CardLibrary,
    whitelist: &FunctionWhitelist,
    modifiers: &ModifierConfig,
) -> Result<CombatantSetup, BattleError> {
    if config.hp == 0 {
        return Err(ConfigError::ZeroHp { side }.into());
    }
    if let Some(max_hp) = config.max_hp {
        if max_hp < config.hp {
            return Err(ConfigError::MaxHpBelowHp {
                side,
                hp: config.hp,
                max_hp,
            }
            .into());
        }
    }

    let deck = config
        .deck
        .iter()
        .enumerate()
        .map(|(slot, id)| {
            library.get(id).cloned().ok_or_else(|| ConfigError::UnknownCard {
                side,
                slot,
                card: id.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let controller = build_controller(side, &config.controller, library, whitelist, modifiers)?;

    Ok(CombatantSetup {
        side,
        hp: config.hp,
        max_hp: config.max_hp,
        energy_per_turn: config.energy_per_turn,
        deck,
        draw: config.draw,
        controller,
    })
}

fn build_controller(
    side: Side,
    config: &ControllerConfig,
    library: &CardLibrary,
    whitelist: &FunctionWhitelist,
    modifiers: &ModifierConfig,
) -> Result<Controller, BattleError> {
    match config {
        ControllerConfig::Strategy {
            plays_per_turn,
            tie_break,
            rules,
        } => {
            if *plays_per_turn == 0 {
                return Err(ConfigError::ZeroPlaysPerTurn { side }.into());
            }
            let selector = StrategySelector::from_config(
                side, rules, *tie_break, library, whitelist, modifiers,
            )?;
            Ok(Controller::Strategy {
                selector,
                plays_per_turn: *plays_per_turn,
            })
        }

        ControllerConfig::Formula { damage } => {
            let damage = Expr::parse(damage, whitelist).map_err(|error| BattleError::Formula {
                owner: FormulaOwner::Controller { side },
                error,
            })?;
            Ok(Controller::Formula { damage })
        }

        ControllerConfig::Pattern { intents } => {
            if intents.is_empty() {
                return Err(ConfigError::EmptyPattern { side }.into());
            }
            let intents = intents
                .iter()
                .map(|intent| {
                    let owner = format!("{side} intent '{}'", intent.name);
                    let effects = intent
                        .effects
                        .iter()
                        .enumerate()
                        .map(|(effect, definition)| {
                            compile_effect(definition, effect, &owner, whitelist, |effect| {
                                FormulaOwner::Intent {
                                    side,
                                    intent: intent.name.clone(),
                                    effect,
                                }
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Intent {
                        name: intent.name.clone(),
                        effects,
                    })
                })
                .collect::<Result<Vec<_>, BattleError>>()?;
            Ok(Controller::Pattern { intents })
        }
    }
}

fn validate_percent(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > ModifierConfig::MAX_PERCENT {
        return Err(ConfigError::PercentOutOfRange {
            field,
            value,
            max: ModifierConfig::MAX_PERCENT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::strategy::RuleError;

    fn config() -> BattleConfig {
        toml::from_str(
            r#"
            turn_limit = 10

            [player]
            hp = 30
            max_hp = 40
            deck = ["strike", "opener", "strike"]
            [player.controller]
            kind = "strategy"
            rules = [{ rule = "prefer_tag", tag = "attack" }]

            [enemy]
            hp = 30
            [enemy.controller]
            kind = "formula"
            damage = "turn * 2"

            [[cards]]
            id = "strike"
            cost = 1
            tags = ["attack"]
            effects = [{ kind = "damage", amount = 5 }]

            [[cards]]
            id = "opener"
            name = "Opening Move"
            innate = true
            effects = [
                { kind = "buff", modifier = "weak", amount = 1, duration = 2 },
                { kind = "draw", amount = "1 + turn // 3" },
            ]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn compiles_valid_config() {
        let setup = BattleSetup::from_config(&config()).unwrap();

        assert_eq!(setup.turn_limit, 10);
        assert_eq!(setup.library.len(), 2);
        assert_eq!(setup.player.deck.len(), 3);
        assert_eq!(setup.player.max_hp, Some(40));
        assert!(matches!(setup.enemy.controller, Controller::Formula { .. }));

        let opener = setup.library.get("opener").unwrap();
        assert_eq!(opener.name, "Opening Move");
        assert_eq!(opener.effects[0].target, Target::Opponent);
        assert!(matches!(opener.effects[1].amount, Amount::Formula(_)));
    }

    #[test]
    fn deck_entries_share_definitions() {
        let setup = BattleSetup::from_config(&config()).unwrap();
        assert!(std::sync::Arc::ptr_eq(
            &setup.player.deck[0],
            &setup.player.deck[2]
        ));
    }

    #[test]
    fn rejects_zero_turn_limit_and_hp() {
        let mut config = config();
        config.turn_limit = 0;
        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::ZeroTurnLimit)
        );

        let mut config = self::config();
        config.enemy.hp = 0;
        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::ZeroHp { side: Side::Enemy })
        );
    }

    #[test]
    fn rejects_unknown_deck_card() {
        let mut config = config();
        config.player.deck.push("fireball".into());

        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::UnknownCard {
                side: Side::Player,
                slot: 3,
                card: "fireball".into(),
            })
        );
    }

    #[test]
    fn rejects_duplicate_cards() {
        let mut config = config();
        let copy = config.cards[0].clone();
        config.cards.push(copy);

        assert!(matches!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::DuplicateCard { .. })
        ));
    }

    #[test]
    fn rejects_buff_without_modifier() {
        let mut config = config();
        config.cards[1].effects[0].modifier = None;

        assert!(matches!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::MissingModifier { effect: 0, .. })
        ));
    }

    #[test]
    fn rejects_negative_amounts_and_low_max_hp() {
        let mut config = config();
        config.cards[0].effects[0].amount = AmountConfig::Value(-3);
        assert!(matches!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::NegativeAmount { amount: -3, .. })
        ));

        let mut config = self::config();
        config.player.max_hp = Some(10);
        assert!(matches!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::MaxHpBelowHp { .. })
        ));
    }

    #[test]
    fn formula_syntax_errors_name_their_owner() {
        let mut config = config();
        config.enemy.controller = ControllerConfig::Formula {
            damage: "turn *".into(),
        };

        let err = BattleSetup::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            BattleError::Formula {
                owner: FormulaOwner::Controller { side: Side::Enemy },
                ..
            }
        ));
    }

    #[test]
    fn function_whitelist_is_enforced() {
        let mut config = config();
        config.enemy.controller = ControllerConfig::Formula {
            damage: "max(turn, 3)".into(),
        };
        let err = BattleSetup::from_config(&config).unwrap_err();
        assert_eq!(
            err.eval_error().map(|e| &e.kind),
            Some(&EvalErrorKind::FunctionNotAllowed { name: "max".into() })
        );

        config.expressions.functions = vec!["max".into()];
        assert!(BattleSetup::from_config(&config).is_ok());

        config.expressions.functions = vec!["eval".into()];
        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::UnknownFunction {
                name: "eval".into()
            })
        );
    }

    #[test]
    fn whitelist_errors_keep_their_kind() {
        assert_eq!(
            whitelist_error(EvalErrorKind::UnknownFunction {
                name: "eval".into()
            }),
            ConfigError::UnknownFunction {
                name: "eval".into()
            }
        );

        let err = whitelist_error(EvalErrorKind::FunctionNotAllowed { name: "max".into() });
        assert_eq!(
            err,
            ConfigError::Functions {
                error: EvalErrorKind::FunctionNotAllowed { name: "max".into() }
            }
        );
        assert_eq!(
            err.to_string(),
            "expressions.functions is invalid: function 'max' is not whitelisted"
        );
    }

    #[test]
    fn unknown_variables_are_not_checked_at_setup() {
        let mut config = config();
        config.enemy.controller = ControllerConfig::Formula {
            damage: "turn * rage".into(),
        };
        assert!(BattleSetup::from_config(&config).is_ok());
    }

    #[test]
    fn rule_errors_surface_at_setup() {
        let mut config = config();
        config.player.controller = ControllerConfig::Strategy {
            plays_per_turn: 1,
            tie_break: Default::default(),
            rules: vec![RuleConfig::PreferHighest {
                attribute: "speed".into(),
                when: None,
            }],
        };

        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Rule {
                side: Side::Player,
                error: RuleError::UnknownAttribute {
                    index: 0,
                    attribute: "speed".into()
                },
            }
        );
    }

    #[test]
    fn rejects_empty_pattern_and_zero_plays() {
        let mut config = config();
        config.enemy.controller = ControllerConfig::Pattern {
            intents: Vec::new(),
        };
        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::EmptyPattern { side: Side::Enemy })
        );

        let mut config = self::config();
        config.player.controller = ControllerConfig::Strategy {
            plays_per_turn: 0,
            tie_break: Default::default(),
            rules: Vec::new(),
        };
        assert_eq!(
            BattleSetup::from_config(&config).unwrap_err(),
            BattleError::Config(ConfigError::ZeroPlaysPerTurn { side: Side::Player })
        );
    }
}
