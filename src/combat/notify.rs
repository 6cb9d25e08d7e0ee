//! Post-commit battle announcements
//!
//! Delivery is best effort. A settled battle stays settled whether or not
//! anyone hears about it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use super::simulation::Victor;
use crate::core::types::{SectorId, ShipId};

/// What onlookers and escape destinations are told
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub sector: SectorId,
    pub attacker: ShipId,
    pub defender: ShipId,
    pub attacker_name: String,
    pub defender_name: String,
    pub winner: Victor,
    pub attacker_destroyed: bool,
    pub defender_destroyed: bool,
    pub attacker_escape: Option<SectorId>,
    pub defender_escape: Option<SectorId>,
    pub summary: String,
}

impl BattleReport {
    /// Sectors whose occupants should hear about this battle
    pub fn audience(&self) -> Vec<SectorId> {
        let mut sectors = vec![self.sector];
        for escape in [self.attacker_escape, self.defender_escape].into_iter().flatten() {
            if !sectors.contains(&escape) {
                sectors.push(escape);
            }
        }
        sectors
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("No listeners for battle reports")]
    NoListeners,

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Outbound channel for battle reports; must not block
pub trait CombatNotifier: Send + Sync {
    fn publish(&self, report: &BattleReport) -> Result<(), NotifyError>;
}

/// Fan-out over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<BattleReport>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BattleReport> {
        self.sender.subscribe()
    }
}

impl CombatNotifier for BroadcastNotifier {
    fn publish(&self, report: &BattleReport) -> Result<(), NotifyError> {
        self.sender
            .send(report.clone())
            .map(|_| ())
            .map_err(|_| NotifyError::NoListeners)
    }
}
