//! Atomic settlement of ship-to-ship combat
//!
//! A settlement locks both ship rows, re-checks eligibility against the live
//! rows, simulates, allocates loot or wreckage, routes escape pods and commits
//! every change plus one history row in a single step. Anything that fails
//! before the commit leaves the rows exactly as they were.

use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::dice::{Dice, DiceSource, SeededDiceSource};
use super::eligibility::{check_attack, Eligibility, Refusal};
use super::escape::{find_escape_sector, EscapeRoute};
use super::history::{wreckage_debris, CombatHistoryRecord, FloatingDebris};
use super::loot::{allocate, mutual_destruction, LootResult, MutualWreckage, Side};
use super::notify::{BattleReport, CombatNotifier};
use super::simulation::{simulate, CombatOutcome, Victor};
use crate::core::config::CombatConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::{HistoryId, SectorId, ShipId};
use crate::galaxy::WarpGraph;
use crate::ship::{Ship, ShipRegistry};

/// Everything a caller needs to show the battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: ShipId,
    pub defender: ShipId,
    pub sector: SectorId,
    pub outcome: CombatOutcome,
    pub loot: Option<LootResult>,
    pub wreckage: Option<MutualWreckage>,
    pub attacker_escape: Option<EscapeRoute>,
    pub defender_escape: Option<EscapeRoute>,
    pub debris: Vec<FloatingDebris>,
    pub history_id: HistoryId,
    pub summary: String,
}

/// Entry point for attacks between player ships
pub struct CombatService {
    registry: Arc<ShipRegistry>,
    galaxy: Arc<dyn WarpGraph>,
    config: CombatConfig,
    dice: Arc<dyn DiceSource>,
    notifier: Option<Arc<dyn CombatNotifier>>,
}

impl CombatService {
    /// Service with entropy-seeded dice and no notifier
    ///
    /// Fails with `GameError::InvalidConfig` if `config` does not validate;
    /// the simulator assumes finite luck bounds and non-zero shield absorption.
    pub fn new(
        registry: Arc<ShipRegistry>,
        galaxy: Arc<dyn WarpGraph>,
        config: CombatConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            galaxy,
            config,
            dice: Arc::new(SeededDiceSource::from_entropy()),
            notifier: None,
        })
    }

    pub fn with_dice(mut self, dice: Arc<dyn DiceSource>) -> Self {
        self.dice = dice;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CombatNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ShipRegistry> {
        &self.registry
    }

    /// Advisory pre-check; `settle` repeats it under lock
    pub async fn can_attack(
        &self,
        attacker_id: ShipId,
        defender_id: ShipId,
    ) -> Result<Eligibility> {
        let wait = self.config.lock_timeout();
        let attacker = self.registry.snapshot(attacker_id, wait).await?;
        let defender = if attacker_id == defender_id {
            attacker.clone()
        } else {
            self.registry.snapshot(defender_id, wait).await?
        };
        Ok(check_attack(
            attacker.as_ref(),
            defender.as_ref(),
            self.galaxy.as_ref(),
            &self.config,
        ))
    }

    /// Fight and durably apply the result
    ///
    /// Returns `GameError::Refused` when the attack is not allowed and
    /// `GameError::Busy` when either row stays locked past the configured
    /// wait; both leave every record untouched and the latter is safe to retry.
    #[tracing::instrument(skip_all, fields(attacker = %attacker_id, defender = %defender_id))]
    pub async fn settle(&self, attacker_id: ShipId, defender_id: ShipId) -> Result<CombatResult> {
        if attacker_id == defender_id {
            return Err(GameError::Refused(Refusal::SelfAttack));
        }

        let pair = match self
            .registry
            .lock_pair(attacker_id, defender_id, self.config.lock_timeout())
            .await
        {
            Ok(pair) => pair,
            Err(GameError::ShipNotFound(missing)) => {
                let reason = if missing == attacker_id {
                    Refusal::AttackerNotFound
                } else {
                    Refusal::DefenderNotFound
                };
                return Err(GameError::Refused(reason));
            }
            Err(err) => return Err(err),
        };

        let mut attacker = pair
            .get(attacker_id)
            .cloned()
            .ok_or(GameError::ShipNotFound(attacker_id))?;
        let mut defender = pair
            .get(defender_id)
            .cloned()
            .ok_or(GameError::ShipNotFound(defender_id))?;

        // The rows may have changed since the advisory check
        if let Eligibility::Denied(reason) =
            check_attack(Some(&attacker), Some(&defender), self.galaxy.as_ref(), &self.config)
        {
            tracing::info!("Attack refused under lock: {}", reason.message());
            return Err(GameError::Refused(reason));
        }

        let now = SystemTime::now();
        let sector = attacker.sector;
        let credits_before = attacker.credits + defender.credits;

        attacker.turns_remaining = attacker.turns_remaining.saturating_sub(self.config.turn_cost);
        attacker.last_combat_at = Some(now);
        defender.last_combat_at = Some(now);

        let mut dice = self.dice.dice();
        let outcome = simulate(
            attacker.strength(),
            defender.strength(),
            &self.config,
            dice.as_mut(),
        );
        tracing::debug!(
            "Simulated {} rounds, winner {:?}",
            outcome.rounds_fought(),
            outcome.winner
        );

        attacker.fighters = outcome.attacker_final.fighters;
        attacker.shields = outcome.attacker_final.shields;
        defender.fighters = outcome.defender_final.fighters;
        defender.shields = outcome.defender_final.shields;

        let mut loot = None;
        let mut wreckage = None;
        let mut attacker_escape = None;
        let mut defender_escape = None;
        let mut debris = Vec::new();
        let mut credits_destroyed = 0;

        if outcome.is_decisive() {
            let (winner, loser) = if outcome.defender_destroyed {
                (&mut attacker, &mut defender)
            } else {
                (&mut defender, &mut attacker)
            };

            if let Some(spoils) = allocate(&outcome, loser, winner.free_capacity(), &self.config) {
                winner.credits = winner.credits.saturating_add(spoils.credits_transferred);
                winner.cargo = winner.cargo.saturating_add(&spoils.cargo_transferred);
                winner.kills += 1;
                loser.credits -= spoils.credits_transferred;

                if !spoils.cargo_overflow.is_empty() {
                    debris.push(FloatingDebris::new(
                        sector,
                        spoils.cargo_overflow,
                        loser.id,
                        now,
                        self.config.debris_lifetime(),
                    ));
                }

                let route = self.escape_route(sector, dice.as_mut());
                loser.into_escape_pod(route.destination, self.config.escape_pod_cargo_capacity);
                match spoils.loser {
                    Side::Attacker => attacker_escape = Some(route),
                    Side::Defender => defender_escape = Some(route),
                }
                loot = Some(spoils);
            }
        } else if let Some(wrecks) = mutual_destruction(&outcome, &attacker, &defender, &self.config) {
            attacker.credits -= wrecks.attacker.credits_lost;
            defender.credits -= wrecks.defender.credits_lost;
            credits_destroyed = wrecks.attacker.credits_lost + wrecks.defender.credits_lost;

            debris.extend(wreckage_debris(
                &wrecks,
                attacker.id,
                defender.id,
                sector,
                now,
                self.config.debris_lifetime(),
            ));

            let attacker_route = self.escape_route(sector, dice.as_mut());
            let defender_route = self.escape_route(sector, dice.as_mut());
            let pod_capacity = self.config.escape_pod_cargo_capacity;
            attacker.into_escape_pod(attacker_route.destination, pod_capacity);
            defender.into_escape_pod(defender_route.destination, pod_capacity);
            attacker_escape = Some(attacker_route);
            defender_escape = Some(defender_route);
            wreckage = Some(wrecks);
        }

        assert_eq!(
            attacker.credits + defender.credits + credits_destroyed,
            credits_before,
            "settlement created or lost credits"
        );

        let record = CombatHistoryRecord::new(
            attacker_id,
            defender_id,
            sector,
            &outcome,
            loot.as_ref(),
            wreckage.as_ref(),
            now,
        );
        let history_id = record.id;
        let summary = summarize(&attacker, &defender, &outcome, loot.as_ref(), &debris);

        self.registry
            .commit(pair, [attacker.clone(), defender.clone()], debris.clone(), record)
            .await;

        tracing::info!(
            "Settled battle in {}: {} ({} rounds)",
            sector,
            summary,
            outcome.rounds_fought()
        );

        let result = CombatResult {
            attacker: attacker_id,
            defender: defender_id,
            sector,
            outcome,
            loot,
            wreckage,
            attacker_escape,
            defender_escape,
            debris,
            history_id,
            summary,
        };
        self.announce(&result, &attacker, &defender);
        Ok(result)
    }

    fn escape_route(&self, sector: SectorId, dice: &mut dyn Dice) -> EscapeRoute {
        find_escape_sector(
            self.galaxy.as_ref(),
            sector,
            self.config.escape_min_jumps,
            self.config.escape_max_jumps,
            self.config.home_sector,
            dice,
        )
    }

    /// Best-effort broadcast after commit; failures are only logged
    fn announce(&self, result: &CombatResult, attacker: &Ship, defender: &Ship) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let report = BattleReport {
            sector: result.sector,
            attacker: result.attacker,
            defender: result.defender,
            attacker_name: attacker.label(),
            defender_name: defender.label(),
            winner: result.outcome.winner,
            attacker_destroyed: result.outcome.attacker_destroyed,
            defender_destroyed: result.outcome.defender_destroyed,
            attacker_escape: result.attacker_escape.map(|r| r.destination),
            defender_escape: result.defender_escape.map(|r| r.destination),
            summary: result.summary.clone(),
        };
        if let Err(err) = notifier.publish(&report) {
            tracing::warn!("Battle report for {} not delivered: {}", result.sector, err);
        }
    }
}

/// One-line description of a settled battle
fn summarize(
    attacker: &Ship,
    defender: &Ship,
    outcome: &CombatOutcome,
    loot: Option<&LootResult>,
    debris: &[FloatingDebris],
) -> String {
    let rounds = outcome.rounds_fought();
    let a = attacker.label();
    let d = defender.label();

    let mut text = if outcome.is_mutual_destruction() {
        format!("{} and {} destroyed each other after {} rounds.", a, d, rounds)
    } else if outcome.defender_destroyed {
        format!("{} destroyed {} in {} rounds.", a, d, rounds)
    } else if outcome.attacker_destroyed {
        format!("{} repelled {} and destroyed the attacker in {} rounds.", d, a, rounds)
    } else {
        match outcome.winner {
            Victor::Attacker => format!("{} broke off after {} rounds with {} ahead.", d, rounds, a),
            Victor::Defender => format!("{} broke off after {} rounds with {} ahead.", a, rounds, d),
            Victor::Draw => format!("{} and {} fought {} rounds to a standstill.", a, d, rounds),
        }
    };

    if let Some(spoils) = loot {
        text.push_str(&format!(
            " Looted {} credits and {} holds of cargo.",
            spoils.credits_transferred,
            spoils.cargo_transferred.total()
        ));
    }
    let floating: u64 = debris.iter().map(|d| d.cargo.total()).sum();
    if floating > 0 {
        text.push_str(&format!(" {} holds of cargo left floating.", floating));
    }
    text
}
