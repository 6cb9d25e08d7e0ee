//! Galaxy topology as seen by combat
//!
//! The procedural generator owns the real warp graph. Combat only needs two
//! read-only queries, so it depends on the [`WarpGraph`] trait and never on the
//! generator's storage.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::SectorId;

/// Read-only warp adjacency and safe-zone lookup
pub trait WarpGraph: Send + Sync {
    /// Sectors reachable in one jump from `sector`
    fn neighbors(&self, sector: SectorId) -> Vec<SectorId>;

    /// Whether fighting is forbidden in `sector`
    fn is_protected(&self, sector: SectorId) -> bool;
}

/// Small in-memory galaxy, built by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGalaxy {
    warps: AHashMap<SectorId, Vec<SectorId>>,
    protected: AHashSet<SectorId>,
}

impl StaticGalaxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warp usable in both directions
    pub fn add_warp(&mut self, a: SectorId, b: SectorId) -> &mut Self {
        self.add_one_way_warp(a, b);
        self.add_one_way_warp(b, a);
        self
    }

    pub fn add_one_way_warp(&mut self, from: SectorId, to: SectorId) -> &mut Self {
        let exits = self.warps.entry(from).or_default();
        if from != to && !exits.contains(&to) {
            exits.push(to);
        }
        self
    }

    /// Mark a sector as a safe zone
    pub fn protect(&mut self, sector: SectorId) -> &mut Self {
        self.protected.insert(sector);
        self
    }

    /// Straight corridor 1 - 2 - ... - n
    pub fn corridor(length: i32) -> Self {
        let mut galaxy = Self::new();
        for s in 1..length {
            galaxy.add_warp(SectorId(s), SectorId(s + 1));
        }
        galaxy
    }

    pub fn sector_count(&self) -> usize {
        self.warps.len()
    }
}

impl WarpGraph for StaticGalaxy {
    fn neighbors(&self, sector: SectorId) -> Vec<SectorId> {
        self.warps.get(&sector).cloned().unwrap_or_default()
    }

    fn is_protected(&self, sector: SectorId) -> bool {
        self.protected.contains(&sector)
    }
}
