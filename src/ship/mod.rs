//! Ships: the persistent records combat reads and settles

pub mod registry;

pub use registry::{LockedPair, ShipRegistry};

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::combat::simulation::ShipStrength;
use crate::core::types::{Cargo, SectorId, ShipId, UniverseId};

/// A player's ship, the mutable record a settlement locks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub name: String,
    /// Corporation label, used in messages only
    pub faction: Option<String>,
    pub universe: UniverseId,

    pub fighters: u32,
    pub shields: u32,
    pub credits: u64,
    pub cargo: Cargo,
    pub cargo_capacity: u32,
    pub colonists: u32,

    pub sector: SectorId,
    pub alive: bool,
    pub in_escape_pod: bool,
    pub turns_remaining: u32,

    pub deaths: u32,
    pub kills: u32,
    pub last_combat_at: Option<SystemTime>,
}

impl Ship {
    pub fn new(name: impl Into<String>, sector: SectorId) -> Self {
        Self {
            id: ShipId::new(),
            name: name.into(),
            faction: None,
            universe: UniverseId::default(),
            fighters: 20,
            shields: 10,
            credits: 1_000,
            cargo: Cargo::default(),
            cargo_capacity: 50,
            colonists: 0,
            sector,
            alive: true,
            in_escape_pod: false,
            turns_remaining: 100,
            deaths: 0,
            kills: 0,
            last_combat_at: None,
        }
    }

    pub fn with_fighters(mut self, fighters: u32) -> Self {
        self.fighters = fighters;
        self
    }

    pub fn with_shields(mut self, shields: u32) -> Self {
        self.shields = shields;
        self
    }

    pub fn with_credits(mut self, credits: u64) -> Self {
        self.credits = credits;
        self
    }

    /// Panics if `cargo` does not fit in `capacity`
    pub fn with_hold(mut self, cargo: Cargo, capacity: u32) -> Self {
        assert!(
            cargo.total() <= capacity as u64,
            "cargo {:?} exceeds capacity {}",
            cargo,
            capacity
        );
        self.cargo = cargo;
        self.cargo_capacity = capacity;
        self
    }

    pub fn with_colonists(mut self, colonists: u32) -> Self {
        self.colonists = colonists;
        self
    }

    pub fn with_turns(mut self, turns: u32) -> Self {
        self.turns_remaining = turns;
        self
    }

    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    pub fn with_universe(mut self, universe: UniverseId) -> Self {
        self.universe = universe;
        self
    }

    /// Combat stats fed to the simulator
    pub fn strength(&self) -> ShipStrength {
        ShipStrength {
            fighters: self.fighters,
            shields: self.shields,
        }
    }

    /// Holds still available for incoming cargo
    pub fn free_capacity(&self) -> u32 {
        (self.cargo_capacity as u64).saturating_sub(self.cargo.total()) as u32
    }

    /// Display name with corporation tag when present
    pub fn label(&self) -> String {
        match &self.faction {
            Some(faction) => format!("{} [{}]", self.name, faction),
            None => self.name.clone(),
        }
    }

    /// Reduce to a defenceless escape pod at `destination`
    ///
    /// Credits are left alone; the caller debits them according to how the
    /// ship died.
    pub fn into_escape_pod(&mut self, destination: SectorId, pod_capacity: u32) {
        self.fighters = 0;
        self.shields = 0;
        self.cargo = Cargo::default();
        self.colonists = 0;
        self.cargo_capacity = pod_capacity;
        self.in_escape_pod = true;
        self.sector = destination;
        self.deaths += 1;
    }

    /// Record invariants; settlement panics rather than commit a violation
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.cargo.total() > self.cargo_capacity as u64 {
            return Err(format!(
                "ship {} carries {} cargo in {} holds",
                self.id,
                self.cargo.total(),
                self.cargo_capacity
            ));
        }
        if self.in_escape_pod && (self.fighters > 0 || self.shields > 0) {
            return Err(format!("escape pod {} still armed", self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_capacity() {
        let ship = Ship::new("Kestrel", SectorId(1)).with_hold(Cargo::new(5, 5, 5), 20);
        assert_eq!(ship.free_capacity(), 5);
    }

    #[test]
    #[should_panic]
    fn test_overfull_hold_rejected() {
        let _ = Ship::new("Kestrel", SectorId(1)).with_hold(Cargo::new(10, 10, 10), 20);
    }

    #[test]
    fn test_escape_pod_conversion() {
        let mut ship = Ship::new("Kestrel", SectorId(4))
            .with_hold(Cargo::new(5, 5, 5), 20)
            .with_colonists(30)
            .with_credits(900);
        ship.into_escape_pod(SectorId(9), 5);

        assert_eq!(ship.fighters, 0);
        assert_eq!(ship.shields, 0);
        assert!(ship.cargo.is_empty());
        assert_eq!(ship.colonists, 0);
        assert_eq!(ship.cargo_capacity, 5);
        assert!(ship.in_escape_pod);
        assert!(ship.alive);
        assert_eq!(ship.sector, SectorId(9));
        assert_eq!(ship.deaths, 1);
        assert_eq!(ship.credits, 900);
        assert!(ship.check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_detects_overfull_hold() {
        let mut ship = Ship::new("Kestrel", SectorId(1)).with_hold(Cargo::default(), 10);
        ship.cargo = Cargo::new(0, 0, 11);
        assert!(ship.check_invariants().is_err());
    }

    #[test]
    fn test_label_includes_faction() {
        let ship = Ship::new("Kestrel", SectorId(1)).with_faction("Red Moon");
        assert_eq!(ship.label(), "Kestrel [Red Moon]");
    }
}
