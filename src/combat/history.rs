//! Append-only records a settlement leaves behind

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::loot::{LootResult, MutualWreckage};
use super::simulation::{CombatOutcome, Losses, Victor};
use crate::core::types::{Cargo, DebrisId, HistoryId, SectorId, ShipId};

/// Ownerless cargo left drifting in a sector after a battle
///
/// Pickup and expiry are handled elsewhere; combat only creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingDebris {
    pub id: DebrisId,
    pub sector: SectorId,
    pub cargo: Cargo,
    /// Ship whose hold it came from
    pub source: ShipId,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl FloatingDebris {
    pub fn new(
        sector: SectorId,
        cargo: Cargo,
        source: ShipId,
        created_at: SystemTime,
        lifetime: Duration,
    ) -> Self {
        Self {
            id: DebrisId::new(),
            sector,
            cargo,
            source,
            created_at,
            expires_at: created_at + lifetime,
        }
    }
}

/// One row per settled battle, never updated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatHistoryRecord {
    pub id: HistoryId,
    pub attacker: ShipId,
    pub defender: ShipId,
    pub sector: SectorId,
    pub winner: Victor,
    pub attacker_destroyed: bool,
    pub defender_destroyed: bool,
    pub attacker_losses: Losses,
    pub defender_losses: Losses,
    pub credits_looted: u64,
    pub cargo_looted: Cargo,
    pub cargo_overflow: Cargo,
    /// Credits both sides forfeited in a mutual destruction
    pub credits_destroyed: u64,
    /// Both holds, left floating after a mutual destruction
    pub cargo_wrecked: Cargo,
    pub rounds: u32,
    pub fought_at: SystemTime,
}

impl CombatHistoryRecord {
    pub fn new(
        attacker: ShipId,
        defender: ShipId,
        sector: SectorId,
        outcome: &CombatOutcome,
        loot: Option<&LootResult>,
        wreckage: Option<&MutualWreckage>,
        fought_at: SystemTime,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            attacker,
            defender,
            sector,
            winner: outcome.winner,
            attacker_destroyed: outcome.attacker_destroyed,
            defender_destroyed: outcome.defender_destroyed,
            attacker_losses: outcome.attacker_losses,
            defender_losses: outcome.defender_losses,
            credits_looted: loot.map_or(0, |l| l.credits_transferred),
            cargo_looted: loot.map_or_else(Cargo::default, |l| l.cargo_transferred),
            cargo_overflow: loot.map_or_else(Cargo::default, |l| l.cargo_overflow),
            credits_destroyed: wreckage.map_or(0, |w| {
                w.attacker.credits_lost + w.defender.credits_lost
            }),
            cargo_wrecked: wreckage.map_or_else(Cargo::default, |w| {
                w.attacker.debris.saturating_add(&w.defender.debris)
            }),
            rounds: outcome.rounds_fought(),
            fought_at,
        }
    }
}

/// Debris created by a mutual destruction: one pile per non-empty hold
pub fn wreckage_debris(
    wreckage: &MutualWreckage,
    attacker: ShipId,
    defender: ShipId,
    sector: SectorId,
    now: SystemTime,
    lifetime: Duration,
) -> Vec<FloatingDebris> {
    [
        (attacker, wreckage.attacker.debris),
        (defender, wreckage.defender.debris),
    ]
    .into_iter()
    .filter(|(_, cargo)| !cargo.is_empty())
    .map(|(source, cargo)| FloatingDebris::new(sector, cargo, source, now, lifetime))
    .collect()
}
