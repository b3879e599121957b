//! Battle content on disk.
//!
//! This crate turns TOML battle descriptions into the typed
//! [`tinydeck_core::BattleConfig`] consumed by the engine:
//! - Battle configuration (cards, combatants, controllers) via TOML
//! - Data directory discovery for frontends
//!
//! Content never reaches battle state directly; it always passes through
//! [`tinydeck_core::BattleSetup`] validation first.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult};
