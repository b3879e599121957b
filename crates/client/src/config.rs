//! Client configuration read from the environment.
use std::env;
use std::path::PathBuf;

/// Where the client looks for its battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Explicit battle file; takes precedence over `data_dir`.
    pub config_path: Option<PathBuf>,
    /// Directory searched for `battle.toml` / `config.toml`.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            data_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Construct client configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TINYDECK_CONFIG` - Battle file to run
    /// - `TINYDECK_DATA_DIR` - Directory searched when no file is given (default: `.`)
    pub fn from_env() -> Self {
        Self::from_lookup(read_env)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("TINYDECK_CONFIG") {
            config.config_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("TINYDECK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_current_directory() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn reads_both_variables() {
        let config = ClientConfig::from_lookup(|key| match key {
            "TINYDECK_CONFIG" => Some("fights/boss.toml".into()),
            "TINYDECK_DATA_DIR" => Some("/srv/tinydeck".into()),
            _ => None,
        });
        assert_eq!(config.config_path, Some(PathBuf::from("fights/boss.toml")));
        assert_eq!(config.data_dir, PathBuf::from("/srv/tinydeck"));
    }
}
