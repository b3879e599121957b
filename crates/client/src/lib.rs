//! Battle runner behind the `tinydeck` binary.
//!
//! Resolves the battle file from [`ClientConfig`], validates it and runs it
//! to completion. Presentation is left to the caller.

pub mod config;
pub mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tinydeck_content::{ConfigLoader, ContentFactory};
use tinydeck_core::{BattleEngine, BattleReport};

pub use config::ClientConfig;

/// Picks the battle file: the explicit path if set, else a search of the
/// data directory.
pub fn resolve_config_path(config: &ClientConfig) -> Result<PathBuf> {
    match &config.config_path {
        Some(path) => Ok(path.clone()),
        None => ContentFactory::new(&config.data_dir).locate(),
    }
}

/// Loads, validates and runs one battle.
pub fn run(config: &ClientConfig) -> Result<BattleReport> {
    let path = resolve_config_path(config)?;
    tracing::info!(path = %path.display(), "loading battle");

    let setup = ConfigLoader::load_setup(&path)?;
    let mut engine = BattleEngine::new(setup);
    let outcome = engine
        .run()
        .with_context(|| format!("Battle {} failed", path.display()))?;

    let state = engine.state();
    tracing::info!(
        turns = state.turn,
        player_hp = state.player.hp,
        enemy_hp = state.enemy.hp,
        events = engine.events().len(),
        "battle complete"
    );

    Ok(BattleReport {
        outcome,
        turns: state.turn,
        events: engine.events().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinydeck_core::Outcome;

    const BATTLE: &str = r#"
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
    fn runs_battle_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("battle.toml"), BATTLE).unwrap();

        let config = ClientConfig {
            config_path: None,
            data_dir: dir.path().to_path_buf(),
        };
        let report = run(&config).unwrap();

        assert_eq!(report.outcome, Outcome::EnemyWins { hp: 5 });
        assert_eq!(report.outcome.to_string(), "Enemy wins by 5 points");
        assert_eq!(report.turns, 5);
    }

    #[test]
    fn explicit_path_wins_over_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, BATTLE).unwrap();

        let config = ClientConfig {
            config_path: Some(path.clone()),
            data_dir: PathBuf::from("/nonexistent"),
        };
        assert_eq!(resolve_config_path(&config).unwrap(), path);
        assert!(run(&config).is_ok());
    }

    #[test]
    fn runtime_failure_reports_the_variable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("battle.toml"),
            BATTLE.replace("turn * 2", "turn * fury"),
        )
        .unwrap();

        let config = ClientConfig {
            config_path: None,
            data_dir: dir.path().to_path_buf(),
        };
        let err = run(&config).unwrap_err();
        assert!(format!("{err:#}").contains("fury"));
    }
}
