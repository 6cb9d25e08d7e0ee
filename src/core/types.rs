//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for ships (combat participants)
///
/// `Ord` is load-bearing: row locks are always taken in ascending `ShipId` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShipId(pub Uuid);

impl ShipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sector (node of the galaxy graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SectorId(pub i32);

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sector {}", self.0)
    }
}

/// Galaxy instance a ship belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UniverseId(pub u32);

/// Floating debris identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebrisId(pub Uuid);

impl DebrisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DebrisId {
    fn default() -> Self {
        Self::new()
    }
}

/// Combat history row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(pub Uuid);

impl HistoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Tradeable commodity carried in a cargo hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Commodity {
    Fuel,
    Organics,
    Equipment,
}

impl Commodity {
    /// Loot intake order, most valuable first
    pub const LOOT_PRIORITY: [Commodity; 3] =
        [Commodity::Equipment, Commodity::Organics, Commodity::Fuel];
}

/// Cargo hold contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cargo {
    pub fuel: u32,
    pub organics: u32,
    pub equipment: u32,
}

impl Cargo {
    pub fn new(fuel: u32, organics: u32, equipment: u32) -> Self {
        Self {
            fuel,
            organics,
            equipment,
        }
    }

    /// Total holds used; u64 so three full u32 fields cannot overflow
    pub fn total(&self) -> u64 {
        self.fuel as u64 + self.organics as u64 + self.equipment as u64
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, commodity: Commodity) -> u32 {
        match commodity {
            Commodity::Fuel => self.fuel,
            Commodity::Organics => self.organics,
            Commodity::Equipment => self.equipment,
        }
    }

    pub fn set(&mut self, commodity: Commodity, amount: u32) {
        match commodity {
            Commodity::Fuel => self.fuel = amount,
            Commodity::Organics => self.organics = amount,
            Commodity::Equipment => self.equipment = amount,
        }
    }

    /// Each field multiplied by `fraction` and floored independently
    pub fn scaled(&self, fraction: f64) -> Self {
        let scale = |v: u32| (v as f64 * fraction).floor() as u32;
        Self {
            fuel: scale(self.fuel),
            organics: scale(self.organics),
            equipment: scale(self.equipment),
        }
    }

    pub fn saturating_add(&self, other: &Cargo) -> Self {
        Self {
            fuel: self.fuel.saturating_add(other.fuel),
            organics: self.organics.saturating_add(other.organics),
            equipment: self.equipment.saturating_add(other.equipment),
        }
    }

    pub fn saturating_sub(&self, other: &Cargo) -> Self {
        Self {
            fuel: self.fuel.saturating_sub(other.fuel),
            organics: self.organics.saturating_sub(other.organics),
            equipment: self.equipment.saturating_sub(other.equipment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_id_ordering_is_total() {
        let a = ShipId::new();
        let b = ShipId::new();
        assert_ne!(a, b);
        assert!(a < b || b < a);
    }

    #[test]
    fn test_cargo_scaled_floors_each_field() {
        let cargo = Cargo::new(7, 3, 1);
        assert_eq!(cargo.scaled(0.5), Cargo::new(3, 1, 0));
        assert_eq!(cargo.scaled(1.0), cargo);
    }

    #[test]
    fn test_cargo_total_does_not_overflow() {
        let cargo = Cargo::new(u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(cargo.total(), 3 * u32::MAX as u64);
    }

    #[test]
    fn test_loot_priority_order() {
        assert_eq!(
            Commodity::LOOT_PRIORITY,
            [Commodity::Equipment, Commodity::Organics, Commodity::Fuel]
        );
    }

    #[test]
    fn test_cargo_get_set() {
        let mut cargo = Cargo::default();
        cargo.set(Commodity::Organics, 12);
        assert_eq!(cargo.get(Commodity::Organics), 12);
        assert_eq!(cargo.total(), 12);
    }
}
