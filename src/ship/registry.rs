//! In-process ship store with row-level locking
//!
//! Each ship row sits behind its own async mutex. A settlement takes both rows
//! in ascending `ShipId` order under one deadline, works on copies, and writes
//! everything back in [`ShipRegistry::commit`] without yielding, so no other
//! task ever observes half a settlement.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::{timeout_at, Instant};

use super::Ship;
use crate::combat::history::{CombatHistoryRecord, FloatingDebris};
use crate::core::error::{GameError, Result};
use crate::core::types::{SectorId, ShipId};

type Row = Arc<Mutex<Ship>>;

#[derive(Default)]
pub struct ShipRegistry {
    rows: RwLock<AHashMap<ShipId, Row>>,
    debris: Mutex<Vec<FloatingDebris>>,
    history: Mutex<Vec<CombatHistoryRecord>>,
}

/// Exclusive hold on two distinct ship rows
pub struct LockedPair {
    first: OwnedMutexGuard<Ship>,
    second: OwnedMutexGuard<Ship>,
}

impl LockedPair {
    /// Live copy of a locked row
    pub fn get(&self, id: ShipId) -> Option<&Ship> {
        if self.first.id == id {
            Some(&self.first)
        } else if self.second.id == id {
            Some(&self.second)
        } else {
            None
        }
    }

    fn slot(&mut self, id: ShipId) -> Option<&mut Ship> {
        if self.first.id == id {
            Some(&mut self.first)
        } else if self.second.id == id {
            Some(&mut self.second)
        } else {
            None
        }
    }
}

impl ShipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ship; replaces any row with the same id
    pub async fn insert(&self, ship: Ship) -> ShipId {
        let id = ship.id;
        self.rows.write().await.insert(id, Arc::new(Mutex::new(ship)));
        id
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn row(&self, id: ShipId) -> Option<Row> {
        self.rows.read().await.get(&id).cloned()
    }

    /// Consistent copy of one row, waiting at most `wait` for its lock
    pub async fn snapshot(&self, id: ShipId, wait: Duration) -> Result<Option<Ship>> {
        let Some(row) = self.row(id).await else {
            return Ok(None);
        };
        let guard = timeout_at(Instant::now() + wait, row.lock_owned())
            .await
            .map_err(|_| GameError::Busy(id))?;
        Ok(Some(guard.clone()))
    }

    /// Mutate one row under its lock (movement, trading and other non-combat writers)
    pub async fn update<T>(
        &self,
        id: ShipId,
        wait: Duration,
        change: impl FnOnce(&mut Ship) -> T,
    ) -> Result<T> {
        let row = self.row(id).await.ok_or(GameError::ShipNotFound(id))?;
        let mut guard = timeout_at(Instant::now() + wait, row.lock_owned())
            .await
            .map_err(|_| GameError::Busy(id))?;
        Ok(change(&mut *guard))
    }

    /// Copies of every ship, locking one row at a time
    pub async fn ships(&self) -> Vec<Ship> {
        let rows: Vec<Row> = self.rows.read().await.values().cloned().collect();
        let mut ships = Vec::with_capacity(rows.len());
        for row in rows {
            ships.push(row.lock().await.clone());
        }
        ships
    }

    /// Lock two rows in canonical order, failing with `Busy` after `wait`
    ///
    /// The order depends only on the ids, never on which side is attacking,
    /// so A-attacks-B and B-attacks-A cannot hold one row each and wait forever.
    pub async fn lock_pair(&self, a: ShipId, b: ShipId, wait: Duration) -> Result<LockedPair> {
        if a == b {
            return Err(GameError::Refused(
                crate::combat::eligibility::Refusal::SelfAttack,
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let low_row = self.row(low).await.ok_or(GameError::ShipNotFound(low))?;
        let high_row = self.row(high).await.ok_or(GameError::ShipNotFound(high))?;

        let deadline = Instant::now() + wait;
        let first = timeout_at(deadline, low_row.lock_owned()).await.map_err(|_| {
            tracing::warn!("Row lock timed out for {}", low);
            GameError::Busy(low)
        })?;
        let second = timeout_at(deadline, high_row.lock_owned()).await.map_err(|_| {
            tracing::warn!("Row lock timed out for {}", high);
            GameError::Busy(high)
        })?;

        Ok(LockedPair { first, second })
    }

    /// Write a settled pair, its debris and its history row, then release the locks
    ///
    /// Panics if either ship violates its record invariants; nothing is
    /// written in that case.
    pub async fn commit(
        &self,
        mut pair: LockedPair,
        ships: [Ship; 2],
        debris: Vec<FloatingDebris>,
        record: CombatHistoryRecord,
    ) {
        for ship in &ships {
            if let Err(violation) = ship.check_invariants() {
                panic!("refusing to commit settlement: {}", violation);
            }
            assert!(pair.get(ship.id).is_some(), "ship {} is not locked", ship.id);
        }

        let mut debris_table = self.debris.lock().await;
        let mut history_table = self.history.lock().await;

        // No awaits past this point: the commit is all or nothing
        for ship in ships {
            if let Some(slot) = pair.slot(ship.id) {
                *slot = ship;
            }
        }
        debris_table.extend(debris);
        history_table.push(record);
    }

    /// Debris currently floating in `sector`
    pub async fn debris_in(&self, sector: SectorId) -> Vec<FloatingDebris> {
        self.debris
            .lock()
            .await
            .iter()
            .filter(|d| d.sector == sector)
            .cloned()
            .collect()
    }

    pub async fn all_debris(&self) -> Vec<FloatingDebris> {
        self.debris.lock().await.clone()
    }

    pub async fn history(&self) -> Vec<CombatHistoryRecord> {
        self.history.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait() -> Duration {
        Duration::from_millis(50)
    }

    #[tokio::test]
    async fn test_insert_and_snapshot() {
        let registry = ShipRegistry::new();
        let id = registry.insert(Ship::new("Kestrel", SectorId(1))).await;

        let ship = registry.snapshot(id, wait()).await.unwrap().unwrap();
        assert_eq!(ship.name, "Kestrel");
        assert!(registry.snapshot(ShipId::new(), wait()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lock_pair_missing_ship() {
        let registry = ShipRegistry::new();
        let id = registry.insert(Ship::new("Kestrel", SectorId(1))).await;
        let ghost = ShipId::new();

        let err = registry.lock_pair(id, ghost, wait()).await.err().unwrap();
        assert!(matches!(err, GameError::ShipNotFound(missing) if missing == ghost));
    }

    #[tokio::test]
    async fn test_lock_pair_same_ship_refused() {
        let registry = ShipRegistry::new();
        let id = registry.insert(Ship::new("Kestrel", SectorId(1))).await;
        let err = registry.lock_pair(id, id, wait()).await.err().unwrap();
        assert!(matches!(err, GameError::Refused(_)));
    }

    #[tokio::test]
    async fn test_held_row_reports_busy() {
        let registry = ShipRegistry::new();
        let a = registry.insert(Ship::new("A", SectorId(1))).await;
        let b = registry.insert(Ship::new("B", SectorId(1))).await;

        let _held = registry.lock_pair(a, b, wait()).await.unwrap();
        let err = registry.lock_pair(b, a, wait()).await.err().unwrap();
        assert!(err.is_retryable());

        let err = registry.snapshot(a, wait()).await.err().unwrap();
        assert!(matches!(err, GameError::Busy(_)));
    }

    #[tokio::test]
    async fn test_locks_released_on_drop() {
        let registry = ShipRegistry::new();
        let a = registry.insert(Ship::new("A", SectorId(1))).await;
        let b = registry.insert(Ship::new("B", SectorId(1))).await;

        drop(registry.lock_pair(a, b, wait()).await.unwrap());
        assert!(registry.lock_pair(b, a, wait()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_writes_through() {
        let registry = ShipRegistry::new();
        let id = registry.insert(Ship::new("Kestrel", SectorId(1))).await;

        let sector = registry
            .update(id, wait(), |ship| {
                ship.sector = SectorId(8);
                ship.sector
            })
            .await
            .unwrap();
        assert_eq!(sector, SectorId(8));
        assert_eq!(registry.snapshot(id, wait()).await.unwrap().unwrap().sector, SectorId(8));
        assert_eq!(registry.ships().await.len(), 1);
    }

    #[tokio::test]
    async fn test_locked_pair_lookup_by_id() {
        let registry = ShipRegistry::new();
        let a = registry.insert(Ship::new("A", SectorId(1))).await;
        let b = registry.insert(Ship::new("B", SectorId(1))).await;

        let pair = registry.lock_pair(b, a, wait()).await.unwrap();
        assert_eq!(pair.get(a).unwrap().name, "A");
        assert_eq!(pair.get(b).unwrap().name, "B");
        assert!(pair.get(ShipId::new()).is_none());
    }
}
