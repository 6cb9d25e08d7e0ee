//! Combat configuration with documented constants
//!
//! Every tunable number used by combat resolution and settlement lives here,
//! so the simulator, loot allocator and escape router can be tested against
//! values other than the shipped ones.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::SectorId;

/// Tuning for ship-to-ship combat and its settlement
///
/// Defaults are the values the live game shipped with. Loot fraction and turn
/// cost were later rebalanced in some deployments (0.75 and 1); load those from
/// a config file rather than editing the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === ECONOMY ===
    /// Share of the destroyed ship's credits (and, when the defender dies,
    /// of each commodity) handed to the winner
    pub loot_fraction: f64,

    /// Turns deducted from the attacker for every attack, win or lose
    pub turn_cost: u32,

    /// Share of on-hand credits each side keeps after mutual destruction
    pub mutual_destruction_credit_keep: f64,

    // === ROUNDS ===
    /// Hard cap on rounds per battle
    pub max_rounds: u32,

    /// Probability a side doubles its damage this round
    pub critical_chance: f64,

    /// Probability a side halves the damage it receives this round
    pub dodge_chance: f64,

    /// Lower bound of the per-round luck multiplier
    pub luck_min: f64,

    /// Upper bound of the per-round luck multiplier
    pub luck_max: f64,

    /// Damage absorbed by one shield point
    pub shield_absorption: u32,

    // === ESCAPE ===
    pub escape_min_jumps: u32,
    pub escape_max_jumps: u32,

    /// Where escape pods go when the battle sector has no warps at all
    pub home_sector: SectorId,

    /// Cargo holds left on an escape pod
    pub escape_pod_cargo_capacity: u32,

    // === PERSISTENCE ===
    /// Debris expiry stamp, seconds after creation
    pub debris_lifetime_secs: u64,

    /// Bounded wait for both participants' row locks
    pub lock_timeout_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            loot_fraction: 0.5,
            turn_cost: 3,
            mutual_destruction_credit_keep: 0.5,

            max_rounds: 10,
            critical_chance: 0.10,
            dodge_chance: 0.15,
            luck_min: 0.5,
            luck_max: 1.5,
            shield_absorption: 2,

            escape_min_jumps: 1,
            escape_max_jumps: 3,
            home_sector: SectorId(1),
            escape_pod_cargo_capacity: 5,

            debris_lifetime_secs: 24 * 60 * 60,
            lock_timeout_ms: 500,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing fields fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn debris_lifetime(&self) -> Duration {
        Duration::from_secs(self.debris_lifetime_secs)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("loot_fraction", self.loot_fraction),
            ("mutual_destruction_credit_keep", self.mutual_destruction_credit_keep),
            ("critical_chance", self.critical_chance),
            ("dodge_chance", self.dodge_chance),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(GameError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }

        if !self.luck_min.is_finite() || !self.luck_max.is_finite() {
            return Err(GameError::InvalidConfig(format!(
                "luck range [{}, {}] must be finite",
                self.luck_min, self.luck_max
            )));
        }
        if self.luck_min < 0.0 || self.luck_min > self.luck_max {
            return Err(GameError::InvalidConfig(format!(
                "luck range [{}, {}] is empty or negative",
                self.luck_min, self.luck_max
            )));
        }

        if self.max_rounds == 0 {
            return Err(GameError::InvalidConfig("max_rounds must be positive".into()));
        }

        if self.shield_absorption == 0 {
            return Err(GameError::InvalidConfig(
                "shield_absorption must be positive".into(),
            ));
        }

        if self.escape_min_jumps == 0 || self.escape_min_jumps > self.escape_max_jumps {
            return Err(GameError::InvalidConfig(format!(
                "escape jump range [{}, {}] is invalid",
                self.escape_min_jumps, self.escape_max_jumps
            )));
        }

        Ok(())
    }
}
