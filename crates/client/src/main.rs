//! Tinydeck battle simulator binary.
//!
//! Runs the battle described by `TINYDECK_CONFIG` (or the first of
//! `battle.toml` / `config.toml` found in `TINYDECK_DATA_DIR`) and prints
//! the outcome line.
//!
//! # Examples
//!
//! ```bash
//! TINYDECK_CONFIG=battle.toml cargo run -p tinydeck-client
//!
//! # With engine traces on stderr
//! RUST_LOG=tinydeck_core=debug cargo run -p tinydeck-client
//! ```

use anyhow::Result;
use tinydeck_client::{ClientConfig, logging};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    logging::setup_logging()?;

    let config = ClientConfig::from_env();
    tracing::debug!(?config, "client configuration");

    let report = tinydeck_client::run(&config)?;
    println!("{}", report.outcome);

    Ok(())
}
