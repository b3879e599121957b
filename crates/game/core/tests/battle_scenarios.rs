use tinydeck_core::{
    BattleConfig, BattleEngine, BattleError, BattleEvent, DrawReason, EffectSource, ModifierKind,
    Outcome, PileKind, Side, run_battle,
};

fn config(source: &str) -> BattleConfig {
    toml::from_str(source).expect("scenario config parses")
}

const RACE: &str = r#"
    turn_limit = 10

    [player]
    hp = 30
    deck = ["strike"]
    controller = { kind = "strategy" }

    [enemy]
    hp = 30
    controller = { kind = "formula", damage = "turn * 2" }

    [[cards]]
    id = "strike"
    cost = 1
    effects = [{ kind = "damage", amount = 5 }]
"#;

#[test]
fn race_trace_matches_turn_by_turn() {
    let mut engine = BattleEngine::from_config(&config(RACE)).unwrap();
    let mut per_turn = Vec::new();

    while !engine.is_finished() {
        let phase = engine.step().unwrap();
        if phase == tinydeck_core::Phase::CheckTermination {
            let state = engine.state();
            per_turn.push((state.player.hp, state.enemy.hp));
        }
    }

    assert_eq!(
        per_turn,
        vec![(28, 25), (24, 20), (18, 15), (10, 10), (0, 5)]
    );
    assert_eq!(engine.outcome(), Some(Outcome::EnemyWins { hp: 5 }));
}

#[test]
fn identical_configs_produce_identical_traces() {
    let first = run_battle(&config(RACE)).unwrap();
    let second = run_battle(&config(RACE)).unwrap();

    assert_eq!(first, second);
    assert!(!first.events.is_empty());
}

#[test]
fn cards_are_conserved_and_hp_stays_in_bounds() {
    let config = config(
        r#"
        turn_limit = 8

        [player]
        hp = 40
        max_hp = 45
        deck = ["strike", "strike", "guard", "mend", "purge", "strike"]
        draw = { starting_hand = 3, draw_per_turn = 3, hand_limit = 4 }

        [player.controller]
        kind = "strategy"
        plays_per_turn = 2
        rules = [
            { rule = "heal_below", percent = 50 },
            { rule = "prefer_highest", attribute = "damage" },
        ]

        [enemy]
        hp = 60
        controller = { kind = "formula", damage = "3 + turn" }

        [[cards]]
        id = "strike"
        cost = 1
        effects = [{ kind = "damage", amount = 6 }]

        [[cards]]
        id = "guard"
        cost = 1
        retain = true
        effects = [{ kind = "block", amount = 5 }]

        [[cards]]
        id = "mend"
        cost = 1
        effects = [{ kind = "heal", amount = 8 }]

        [[cards]]
        id = "purge"
        cost = 0
        exhaust = true
        effects = [{ kind = "draw", amount = 1 }]
        "#,
    );
    let mut engine = BattleEngine::from_config(&config).unwrap();

    while !engine.is_finished() {
        engine.step().unwrap();
        let state = engine.state();
        assert_eq!(state.player.piles.total(), 6);
        assert_eq!(state.enemy.piles.total(), 0);
        assert!(state.player.hp <= 45);
        assert!(state.player.piles.hand().len() <= 4);
    }
}

#[test]
fn pattern_controller_cycles_intents() {
    let config = config(
        r#"
        turn_limit = 4

        [player]
        hp = 30
        controller = { kind = "strategy" }

        [enemy]
        hp = 30

        [enemy.controller]
        kind = "pattern"

        [[enemy.controller.intents]]
        name = "charge"
        effects = [{ kind = "buff", modifier = "strength", amount = 3 }]

        [[enemy.controller.intents]]
        name = "hit"
        effects = [{ kind = "damage", amount = 4 }]
        "#,
    );
    let mut engine = BattleEngine::from_config(&config).unwrap();
    let outcome = engine.run().unwrap();

    let intents: Vec<_> = engine
        .events()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::IntentUsed { intent, .. } => Some(intent.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(intents, ["charge", "hit", "charge", "hit"]);
    assert_eq!(engine.state().player.hp, 16);
    assert_eq!(engine.state().enemy.modifiers.intensity(ModifierKind::Strength), 3);
    assert_eq!(
        outcome,
        Outcome::Draw {
            reason: DrawReason::TurnLimit
        }
    );
}

#[test]
fn poison_ticks_and_exhausted_card_stays_out() {
    let config = config(
        r#"
        turn_limit = 10

        [player]
        hp = 20
        deck = ["toxin"]
        controller = { kind = "strategy" }

        [enemy]
        hp = 12
        controller = { kind = "pattern", intents = [{ name = "wait" }] }

        [[cards]]
        id = "toxin"
        cost = 1
        exhaust = true
        effects = [{ kind = "buff", modifier = "poison", amount = 4 }]
        "#,
    );
    let mut engine = BattleEngine::from_config(&config).unwrap();
    let outcome = engine.run().unwrap();

    assert_eq!(outcome, Outcome::PlayerWins { hp: 20 });
    assert_eq!(outcome.to_string(), "Player wins by 20 points");
    assert_eq!(engine.state().turn, 3);
    assert_eq!(engine.state().player.piles.len(PileKind::Exhaust), 1);

    let played = engine
        .events()
        .iter()
        .filter(|event| matches!(event, BattleEvent::CardPlayed { .. }))
        .count();
    assert_eq!(played, 1);

    let ticks: Vec<_> = engine
        .events()
        .iter()
        .filter_map(|event| match event {
            BattleEvent::PoisonTicked {
                side: Side::Enemy,
                hp,
                ..
            } => Some(*hp),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, [8, 4, 0]);
}

#[test]
fn vulnerable_amplifies_following_damage() {
    let config = config(
        r#"
        turn_limit = 1

        [player]
        hp = 30
        deck = ["bash"]
        controller = { kind = "strategy" }

        [enemy]
        hp = 50
        controller = { kind = "formula", damage = "0" }

        [[cards]]
        id = "bash"
        cost = 2
        effects = [
            { kind = "buff", modifier = "vulnerable", amount = 1, duration = 2 },
            { kind = "damage", amount = 10 },
        ]
        "#,
    );
    let mut engine = BattleEngine::from_config(&config).unwrap();
    engine.run().unwrap();

    let state = engine.state();
    assert_eq!(state.enemy.hp, 35);
    // One turn of the two has elapsed.
    assert_eq!(
        state
            .enemy
            .modifiers
            .get(ModifierKind::Vulnerable)
            .and_then(|m| m.remaining),
        Some(1)
    );
}

#[test]
fn card_formulas_see_live_state() {
    let config = config(
        r#"
        turn_limit = 1

        [expressions]
        functions = ["max"]

        [player]
        hp = 30
        deck = ["finisher"]
        controller = { kind = "strategy" }

        [enemy]
        hp = 40
        controller = { kind = "formula", damage = "0" }

        [[cards]]
        id = "finisher"
        cost = 0
        effects = [
            { kind = "damage", amount = "max(opponent_hp // 4, 3)" },
            { kind = "block", amount = 7, condition = "self_hp < 10" },
        ]
        "#,
    );
    let report = run_battle(&config).unwrap();

    let effects: Vec<_> = report
        .events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::Effect {
                source: EffectSource::Card(card),
                outcome,
                ..
            } => Some((card.as_str(), outcome.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(effects.len(), 2);
    assert!(matches!(
        effects[0].1,
        tinydeck_core::EffectOutcome::Damage { hp: 30, .. }
    ));
    assert_eq!(effects[1].1, tinydeck_core::EffectOutcome::Skipped);
}

#[test]
fn runtime_variable_error_names_the_enemy() {
    let config = config(&RACE.replace("turn * 2", "turn * fury"));
    let err = run_battle(&config).unwrap_err();

    match &err {
        BattleError::Controller { side, error } => {
            assert_eq!(*side, Side::Enemy);
            assert_eq!(error.unknown_variable(), Some("fury"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
