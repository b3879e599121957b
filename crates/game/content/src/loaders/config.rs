//! Battle configuration loader.

use std::path::Path;

use anyhow::Context;
use tinydeck_core::{BattleConfig, BattleSetup};

use crate::loaders::{LoadResult, read_file};

/// Loader for battle configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a battle configuration from a TOML file.
    ///
    /// Only the document structure is checked here. Use
    /// [`ConfigLoader::load_setup`] to also validate values and formulas.
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load battle config {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            cards = config.cards.len(),
            turn_limit = config.turn_limit,
            "loaded battle config"
        );
        Ok(config)
    }

    /// Parse a battle configuration from TOML text.
    pub fn from_toml_str(content: &str) -> LoadResult<BattleConfig> {
        toml::from_str(content).context("Failed to parse battle config TOML")
    }

    /// Load and validate a battle configuration.
    pub fn load_setup(path: &Path) -> LoadResult<BattleSetup> {
        let config = Self::load(path)?;
        BattleSetup::from_config(&config)
            .with_context(|| format!("Invalid battle config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const BATTLE: &str = r#"
        turn_limit = 5

        [player]
        hp = 20
        deck = ["jab"]
        controller = { kind = "strategy" }

        [enemy]
        hp = 15
        controller = { kind = "formula", damage = "turn" }

        [[cards]]
        id = "jab"
        cost = 1
        effects = [{ kind = "damage", amount = 3 }]
    "#;

    #[test]
    fn loads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BATTLE.as_bytes()).unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.turn_limit, 5);
        assert_eq!(config.player.deck, vec!["jab".to_string()]);

        let setup = ConfigLoader::load_setup(file.path()).unwrap();
        assert_eq!(setup.library.len(), 1);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ConfigLoader::from_toml_str("turn_limit = [").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse battle config TOML"));
    }

    #[test]
    fn validation_errors_keep_their_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BATTLE.replace("turn_limit = 5", "turn_limit = 0").as_bytes())
            .unwrap();

        let err = ConfigLoader::load_setup(file.path()).unwrap_err();
        let battle = err
            .downcast_ref::<tinydeck_core::BattleError>()
            .expect("battle error in chain");
        assert_eq!(battle.code(), "config");
    }

    #[test]
    fn bundled_sample_is_valid() {
        let config = ConfigLoader::from_toml_str(include_str!("../../../../../battle.toml")).unwrap();
        let setup = BattleSetup::from_config(&config).unwrap();
        assert_eq!(setup.library.len(), 5);
        assert_eq!(setup.player.deck.len(), 8);
    }
}
