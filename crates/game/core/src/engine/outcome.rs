//! Terminal battle results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a battle ended without a winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    /// Both sides reached 0 HP in the same turn.
    DoubleKnockout,
    /// The configured turn limit was reached.
    TurnLimit,
}

/// How a battle ended.
///
/// `Display` renders the single outcome line printed by the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    PlayerWins { hp: u32 },
    EnemyWins { hp: u32 },
    Draw { reason: DrawReason },
}

impl Outcome {
    /// Winner's remaining HP; draws always score 0.
    pub fn points(&self) -> u32 {
        match self {
            Outcome::PlayerWins { hp } | Outcome::EnemyWins { hp } => *hp,
            Outcome::Draw { .. } => 0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::PlayerWins { hp } => write!(f, "Player wins by {hp} points"),
            Outcome::EnemyWins { hp } => write!(f, "Enemy wins by {hp} points"),
            Outcome::Draw { .. } => f.write_str("Draw with 0 points"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_lines() {
        assert_eq!(
            Outcome::PlayerWins { hp: 12 }.to_string(),
            "Player wins by 12 points"
        );
        assert_eq!(
            Outcome::EnemyWins { hp: 5 }.to_string(),
            "Enemy wins by 5 points"
        );
        assert_eq!(
            Outcome::Draw {
                reason: DrawReason::TurnLimit
            }
            .to_string(),
            "Draw with 0 points"
        );
        assert_eq!(
            Outcome::Draw {
                reason: DrawReason::DoubleKnockout
            }
            .points(),
            0
        );
    }
}
