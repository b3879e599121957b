//! Modifier system for combatants.
//!
//! Modifiers are buffs and debuffs installed by `buff` effects. Each kind is
//! present at most once; applying it again refreshes it.
//!
//! # Turn-based Duration
//!
//! A modifier stores the number of end-of-turn decays it survives. Decay runs
//! during the resolve phase, so a modifier applied with duration 1 is active
//! for the rest of the turn it was applied in. Modifiers without a duration
//! never decay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kinds of modifiers.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModifierKind {
    // ========================================================================
    // Buffs
    // ========================================================================
    /// Adds intensity to every outgoing damage effect.
    Strength,

    /// Adds intensity to every block effect.
    Dexterity,

    /// Heals intensity HP at end of turn.
    Regeneration,

    // ========================================================================
    // Debuffs
    // ========================================================================
    /// Outgoing damage scaled by the configured weak percentage.
    Weak,

    /// Incoming damage scaled by the configured vulnerable percentage.
    Vulnerable,

    /// Loses intensity HP at end of turn, ignoring block.
    Poison,
}

impl ModifierKind {
    /// Whether a `buff` effect of this kind lands on the opponent by default.
    pub fn is_debuff(self) -> bool {
        matches!(
            self,
            ModifierKind::Weak | ModifierKind::Vulnerable | ModifierKind::Poison
        )
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A single active modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub intensity: u32,
    /// Remaining end-of-turn decays; `None` is permanent.
    pub remaining: Option<u32>,
}

/// Active modifiers on a combatant, ordered by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    active: BTreeMap<ModifierKind, Modifier>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or refreshes a modifier.
    ///
    /// Refreshing replaces both intensity and duration with the new values.
    /// A zero duration installs nothing and removes any existing entry.
    pub fn apply(&mut self, kind: ModifierKind, intensity: u32, duration: Option<u32>) {
        if duration == Some(0) {
            self.active.remove(&kind);
            return;
        }
        self.active.insert(
            kind,
            Modifier {
                intensity,
                remaining: duration,
            },
        );
    }

    pub fn get(&self, kind: ModifierKind) -> Option<&Modifier> {
        self.active.get(&kind)
    }

    /// Intensity of `kind`, 0 when absent.
    pub fn intensity(&self, kind: ModifierKind) -> u32 {
        self.active.get(&kind).map_or(0, |m| m.intensity)
    }

    pub fn has(&self, kind: ModifierKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn remove(&mut self, kind: ModifierKind) {
        self.active.remove(&kind);
    }

    /// Decrements every timed modifier and removes those that reach zero.
    ///
    /// Returns the kinds that expired, in kind order.
    pub fn decay(&mut self) -> Vec<ModifierKind> {
        let mut expired = Vec::new();
        for (kind, modifier) in self.active.iter_mut() {
            if let Some(remaining) = modifier.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    expired.push(*kind);
                }
            }
        }
        for kind in &expired {
            self.active.remove(kind);
        }
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModifierKind, &Modifier)> {
        self.active.iter().map(|(kind, modifier)| (*kind, modifier))
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
