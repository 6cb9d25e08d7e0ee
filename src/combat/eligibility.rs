//! Whether an attack may start
//!
//! Checks run in a fixed order and stop at the first failure, so a given pair
//! of ship states always yields the same reason.

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::galaxy::WarpGraph;
use crate::ship::Ship;

/// Why an attack was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Refusal {
    AttackerNotFound,
    DefenderNotFound,
    SelfAttack,
    AttackerDestroyed,
    AttackerInEscapePod,
    DefenderDestroyed,
    DifferentUniverse,
    DifferentSector,
    ProtectedSector,
    NoFighters,
    InsufficientTurns { have: u32, need: u32 },
}

/// Coarse grouping of refusals for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefusalCategory {
    Identity,
    ShipState,
    Location,
    Resources,
}

impl Refusal {
    pub fn category(&self) -> RefusalCategory {
        match self {
            Refusal::AttackerNotFound | Refusal::DefenderNotFound | Refusal::SelfAttack => {
                RefusalCategory::Identity
            }
            Refusal::AttackerDestroyed
            | Refusal::AttackerInEscapePod
            | Refusal::DefenderDestroyed => RefusalCategory::ShipState,
            Refusal::DifferentUniverse | Refusal::DifferentSector | Refusal::ProtectedSector => {
                RefusalCategory::Location
            }
            Refusal::NoFighters | Refusal::InsufficientTurns { .. } => RefusalCategory::Resources,
        }
    }

    /// Player-facing explanation
    pub fn message(&self) -> String {
        match self {
            Refusal::AttackerNotFound => "Your ship could not be found.".into(),
            Refusal::DefenderNotFound => "That ship could not be found.".into(),
            Refusal::SelfAttack => "You cannot attack your own ship.".into(),
            Refusal::AttackerDestroyed => "Your ship has been destroyed.".into(),
            Refusal::AttackerInEscapePod => "You cannot attack from an escape pod.".into(),
            Refusal::DefenderDestroyed => "That ship has already been destroyed.".into(),
            Refusal::DifferentUniverse => "That ship is in another galaxy.".into(),
            Refusal::DifferentSector => "That ship is not in your sector.".into(),
            Refusal::ProtectedSector => "Combat is not allowed in this protected sector.".into(),
            Refusal::NoFighters => "You have no fighters to attack with.".into(),
            Refusal::InsufficientTurns { have, need } => {
                format!("Attacking costs {} turns; you have {}.", need, have)
            }
        }
    }
}

/// Verdict of the eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    Allowed,
    Denied(Refusal),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Eligibility::Allowed)
    }

    pub fn reason(&self) -> Option<Refusal> {
        match self {
            Eligibility::Allowed => None,
            Eligibility::Denied(reason) => Some(*reason),
        }
    }
}

/// Decide whether `attacker` may attack `defender` right now
pub fn check_attack(
    attacker: Option<&Ship>,
    defender: Option<&Ship>,
    galaxy: &dyn WarpGraph,
    config: &CombatConfig,
) -> Eligibility {
    match evaluate(attacker, defender, galaxy, config) {
        Ok(()) => Eligibility::Allowed,
        Err(reason) => Eligibility::Denied(reason),
    }
}

fn evaluate(
    attacker: Option<&Ship>,
    defender: Option<&Ship>,
    galaxy: &dyn WarpGraph,
    config: &CombatConfig,
) -> Result<(), Refusal> {
    let attacker = attacker.ok_or(Refusal::AttackerNotFound)?;
    let defender = defender.ok_or(Refusal::DefenderNotFound)?;
    if attacker.id == defender.id {
        return Err(Refusal::SelfAttack);
    }

    if !attacker.alive {
        return Err(Refusal::AttackerDestroyed);
    }
    if attacker.in_escape_pod {
        return Err(Refusal::AttackerInEscapePod);
    }
    if !defender.alive {
        return Err(Refusal::DefenderDestroyed);
    }

    if attacker.universe != defender.universe {
        return Err(Refusal::DifferentUniverse);
    }
    if attacker.sector != defender.sector {
        return Err(Refusal::DifferentSector);
    }
    if galaxy.is_protected(attacker.sector) {
        return Err(Refusal::ProtectedSector);
    }

    if attacker.fighters == 0 {
        return Err(Refusal::NoFighters);
    }
    if attacker.turns_remaining < config.turn_cost {
        return Err(Refusal::InsufficientTurns {
            have: attacker.turns_remaining,
            need: config.turn_cost,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SectorId, UniverseId};
    use crate::galaxy::StaticGalaxy;

    fn setup() -> (Ship, Ship, StaticGalaxy, CombatConfig) {
        let attacker = Ship::new("Raider", SectorId(3)).with_fighters(20);
        let defender = Ship::new("Hauler", SectorId(3));
        let mut galaxy = StaticGalaxy::corridor(5);
        galaxy.protect(SectorId(1));
        (attacker, defender, galaxy, CombatConfig::default())
    }

    fn verdict(attacker: &Ship, defender: &Ship, galaxy: &StaticGalaxy, config: &CombatConfig) -> Eligibility {
        check_attack(Some(attacker), Some(defender), galaxy, config)
    }

    #[test]
    fn test_repeated_checks_agree() {
        let (a, d, galaxy, config) = setup();
        let mut pod = a.clone();
        pod.in_escape_pod = true;
        let mut away = d.clone();
        away.sector = SectorId(4);
        let mut unarmed = a.clone();
        unarmed.fighters = 0;

        let cases = [
            (&a, &d, None),
            (&a, &a, Some(RefusalCategory::Identity)),
            (&pod, &d, Some(RefusalCategory::ShipState)),
            (&a, &away, Some(RefusalCategory::Location)),
            (&unarmed, &d, Some(RefusalCategory::Resources)),
        ];
        for (attacker, defender, category) in cases {
            let first = verdict(attacker, defender, &galaxy, &config);
            for _ in 0..3 {
                assert_eq!(verdict(attacker, defender, &galaxy, &config), first);
            }
            assert_eq!(first.reason().map(|r| r.category()), category);
        }
    }

    #[test]
    fn test_allowed() {
        let (a, d, galaxy, config) = setup();
        assert!(verdict(&a, &d, &galaxy, &config).is_allowed());
    }

    #[test]
    fn test_missing_ships() {
        let (a, d, galaxy, config) = setup();
        assert_eq!(
            check_attack(None, Some(&d), &galaxy, &config).reason(),
            Some(Refusal::AttackerNotFound)
        );
        assert_eq!(
            check_attack(Some(&a), None, &galaxy, &config).reason(),
            Some(Refusal::DefenderNotFound)
        );
    }

    #[test]
    fn test_self_attack() {
        let (a, _, galaxy, config) = setup();
        assert_eq!(verdict(&a, &a, &galaxy, &config).reason(), Some(Refusal::SelfAttack));
    }

    #[test]
    fn test_escape_pod_cannot_attack() {
        let (mut a, d, galaxy, config) = setup();
        a.in_escape_pod = true;
        let reason = verdict(&a, &d, &galaxy, &config).reason().unwrap();
        assert_eq!(reason, Refusal::AttackerInEscapePod);
        assert_eq!(reason.category(), RefusalCategory::ShipState);
    }

    #[test]
    fn test_dead_ships() {
        let (mut a, mut d, galaxy, config) = setup();
        d.alive = false;
        assert_eq!(verdict(&a, &d, &galaxy, &config).reason(), Some(Refusal::DefenderDestroyed));
        a.alive = false;
        assert_eq!(verdict(&a, &d, &galaxy, &config).reason(), Some(Refusal::AttackerDestroyed));
    }

    #[test]
    fn test_location_checks() {
        let (a, mut d, galaxy, config) = setup();
        d.universe = UniverseId(9);
        assert_eq!(verdict(&a, &d, &galaxy, &config).reason(), Some(Refusal::DifferentUniverse));

        d.universe = a.universe;
        d.sector = SectorId(4);
        assert_eq!(verdict(&a, &d, &galaxy, &config).reason(), Some(Refusal::DifferentSector));
    }

    #[test]
    fn test_protected_sector() {
        let (mut a, mut d, galaxy, config) = setup();
        a.sector = SectorId(1);
        d.sector = SectorId(1);
        let reason = verdict(&a, &d, &galaxy, &config).reason().unwrap();
        assert_eq!(reason, Refusal::ProtectedSector);
        assert_eq!(reason.category(), RefusalCategory::Location);
    }

    #[test]
    fn test_resource_checks() {
        let (mut a, d, galaxy, config) = setup();
        a.turns_remaining = config.turn_cost - 1;
        assert_eq!(
            verdict(&a, &d, &galaxy, &config).reason(),
            Some(Refusal::InsufficientTurns {
                have: config.turn_cost - 1,
                need: config.turn_cost
            })
        );

        // Fighters are checked before turns
        a.fighters = 0;
        assert_eq!(verdict(&a, &d, &galaxy, &config).reason(), Some(Refusal::NoFighters));
    }

    #[test]
    fn test_exact_turn_cost_is_enough() {
        let (mut a, d, galaxy, config) = setup();
        a.turns_remaining = config.turn_cost;
        assert!(verdict(&a, &d, &galaxy, &config).is_allowed());
    }

    #[test]
    fn test_check_is_repeatable() {
        let (mut a, d, galaxy, config) = setup();
        a.fighters = 0;
        let first = verdict(&a, &d, &galaxy, &config);
        for _ in 0..5 {
            assert_eq!(verdict(&a, &d, &galaxy, &config), first);
        }
    }

    #[test]
    fn test_messages_are_distinct() {
        let reasons = [
            Refusal::AttackerNotFound,
            Refusal::DefenderNotFound,
            Refusal::SelfAttack,
            Refusal::AttackerDestroyed,
            Refusal::AttackerInEscapePod,
            Refusal::DefenderDestroyed,
            Refusal::DifferentUniverse,
            Refusal::DifferentSector,
            Refusal::ProtectedSector,
            Refusal::NoFighters,
            Refusal::InsufficientTurns { have: 0, need: 3 },
        ];
        let messages: std::collections::HashSet<String> =
            reasons.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), reasons.len());
    }
}
