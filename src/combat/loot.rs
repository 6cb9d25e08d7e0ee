//! Spoils and penalties after a ship is destroyed
//!
//! The split is deliberately lopsided. A winning attacker takes only
//! `loot_fraction` of the defender's hold, while a winning defender strips the
//! attacker's hold completely. Credits use `loot_fraction` both ways.

use serde::{Deserialize, Serialize};

use super::simulation::CombatOutcome;
use crate::core::config::CombatConfig;
use crate::core::types::{Cargo, Commodity};
use crate::ship::Ship;

/// Which participant a result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

/// What the winner takes from the single destroyed ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootResult {
    pub loser: Side,
    pub credits_transferred: u64,
    pub cargo_transferred: Cargo,
    /// Looted cargo that did not fit in the winner's hold
    pub cargo_overflow: Cargo,
    pub colonists_lost: u32,
}

/// One ship's share of a mutual destruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wreck {
    pub credits_lost: u64,
    /// The whole hold, left floating in the sector
    pub debris: Cargo,
    pub colonists_lost: u32,
}

/// Penalties when both ships die in the same battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutualWreckage {
    pub attacker: Wreck,
    pub defender: Wreck,
}

/// Pack `offered` into `free` holds, most valuable commodity first
///
/// Returns what fits and what is left over.
pub fn fit_cargo(offered: Cargo, free: u32) -> (Cargo, Cargo) {
    let mut taken = Cargo::default();
    let mut room = free;
    for commodity in Commodity::LOOT_PRIORITY {
        let amount = offered.get(commodity).min(room);
        taken.set(commodity, amount);
        room -= amount;
    }
    (taken, offered.saturating_sub(&taken))
}

fn fraction_of(amount: u64, fraction: f64) -> u64 {
    ((amount as f64 * fraction).floor() as u64).min(amount)
}

/// Loot from the one destroyed ship, or `None` unless exactly one side died
pub fn allocate(
    outcome: &CombatOutcome,
    loser: &Ship,
    winner_free_capacity: u32,
    config: &CombatConfig,
) -> Option<LootResult> {
    if !outcome.is_decisive() {
        return None;
    }

    let (side, offered) = if outcome.defender_destroyed {
        (Side::Defender, loser.cargo.scaled(config.loot_fraction))
    } else {
        (Side::Attacker, loser.cargo)
    };
    let (cargo_transferred, cargo_overflow) = fit_cargo(offered, winner_free_capacity);

    Some(LootResult {
        loser: side,
        credits_transferred: fraction_of(loser.credits, config.loot_fraction),
        cargo_transferred,
        cargo_overflow,
        colonists_lost: loser.colonists,
    })
}

/// Credit penalties and debris when both ships died, or `None` otherwise
///
/// Nothing changes hands: each side keeps its own reduced credits and its
/// whole hold becomes debris.
pub fn mutual_destruction(
    outcome: &CombatOutcome,
    attacker: &Ship,
    defender: &Ship,
    config: &CombatConfig,
) -> Option<MutualWreckage> {
    if !outcome.is_mutual_destruction() {
        return None;
    }

    let wreck = |ship: &Ship| Wreck {
        credits_lost: ship.credits
            - fraction_of(ship.credits, config.mutual_destruction_credit_keep),
        debris: ship.cargo,
        colonists_lost: ship.colonists,
    };

    Some(MutualWreckage {
        attacker: wreck(attacker),
        defender: wreck(defender),
    })
}
