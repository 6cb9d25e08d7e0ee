//! Ship-versus-ship battle simulation
//!
//! Pure stat-versus-stat rounds: no positioning, no I/O. Both sides strike
//! simultaneously from their fighter count at the start of the round; shields
//! soak damage before fighters die.

use serde::{Deserialize, Serialize};

use super::dice::Dice;
use crate::core::config::CombatConfig;

/// The two numbers combat cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipStrength {
    pub fighters: u32,
    pub shields: u32,
}

impl ShipStrength {
    pub fn new(fighters: u32, shields: u32) -> Self {
        Self { fighters, shields }
    }
}

/// Fighters and shields a side lost over the whole battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Losses {
    pub fighters: u32,
    pub shields: u32,
}

/// Who came out ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Victor {
    Attacker,
    Defender,
    Draw,
}

/// State after one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub attacker: ShipStrength,
    pub defender: ShipStrength,
    /// Damage the attacker dealt after the defender's dodge
    pub attacker_damage: u32,
    /// Damage the defender dealt after the attacker's dodge
    pub defender_damage: u32,
    pub attacker_critical: bool,
    pub defender_critical: bool,
    pub attacker_dodged: bool,
    pub defender_dodged: bool,
    pub narrative: String,
}

/// Everything the simulator decided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatOutcome {
    pub rounds: Vec<RoundRecord>,
    pub winner: Victor,
    pub attacker_destroyed: bool,
    pub defender_destroyed: bool,
    pub attacker_final: ShipStrength,
    pub defender_final: ShipStrength,
    pub attacker_losses: Losses,
    pub defender_losses: Losses,
}

impl CombatOutcome {
    pub fn rounds_fought(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Exactly one side destroyed
    pub fn is_decisive(&self) -> bool {
        self.attacker_destroyed != self.defender_destroyed
    }

    pub fn is_mutual_destruction(&self) -> bool {
        self.attacker_destroyed && self.defender_destroyed
    }
}

/// Result of one side's volley against the other
struct Volley {
    damage: u32,
    critical: bool,
}

/// Base damage for one side: fighters × luck, floored, doubled on a crit
fn roll_volley(fighters: u32, config: &CombatConfig, dice: &mut dyn Dice) -> Volley {
    let luck = dice.uniform(config.luck_min, config.luck_max);
    let critical = dice.critical(config.critical_chance);
    let base = (fighters as f64 * luck).floor() as u32;
    let damage = if critical { base.saturating_mul(2) } else { base };
    Volley { damage, critical }
}

/// Apply incoming damage: shields soak first, the rest kills fighters 1:1
pub fn absorb(side: ShipStrength, damage: u32, shield_absorption: u32) -> ShipStrength {
    let capacity = side.shields as u64 * shield_absorption as u64;
    let absorbed = (damage as u64).min(capacity);
    let shields_lost = absorbed.div_ceil(shield_absorption as u64) as u32;
    let remaining = damage as u64 - absorbed;
    let fighters_lost = remaining.min(side.fighters as u64) as u32;

    ShipStrength {
        fighters: side.fighters - fighters_lost,
        shields: side.shields.saturating_sub(shields_lost),
    }
}

fn losses(initial: ShipStrength, last: ShipStrength) -> Losses {
    Losses {
        fighters: initial.fighters - last.fighters,
        shields: initial.shields - last.shields,
    }
}

fn narrate(
    round: u32,
    attacker: &Volley,
    defender: &Volley,
    attacker_dodged: bool,
    defender_dodged: bool,
    attacker_damage: u32,
    defender_damage: u32,
) -> String {
    let mut line = format!(
        "Round {}: attacker deals {} damage, defender deals {}.",
        round, attacker_damage, defender_damage
    );
    if attacker.critical {
        line.push_str(" Attacker lands a critical hit!");
    }
    if defender.critical {
        line.push_str(" Defender lands a critical hit!");
    }
    if defender_dodged {
        line.push_str(" Defender evades part of the barrage.");
    }
    if attacker_dodged {
        line.push_str(" Attacker evades part of the barrage.");
    }
    line
}

/// Fight until one side has no fighters or the round cap is hit
///
/// A side that starts with zero fighters fights no rounds and is destroyed.
pub fn simulate(
    attacker: ShipStrength,
    defender: ShipStrength,
    config: &CombatConfig,
    dice: &mut dyn Dice,
) -> CombatOutcome {
    let mut att = attacker;
    let mut def = defender;
    let mut rounds = Vec::new();

    let mut round = 1;
    while round <= config.max_rounds && att.fighters > 0 && def.fighters > 0 {
        let att_volley = roll_volley(att.fighters, config, dice);
        let def_volley = roll_volley(def.fighters, config, dice);
        let attacker_dodged = dice.dodge(config.dodge_chance);
        let defender_dodged = dice.dodge(config.dodge_chance);

        // A dodge halves what the dodger receives, not what it deals
        let attacker_damage = if defender_dodged {
            att_volley.damage / 2
        } else {
            att_volley.damage
        };
        let defender_damage = if attacker_dodged {
            def_volley.damage / 2
        } else {
            def_volley.damage
        };

        att = absorb(att, defender_damage, config.shield_absorption);
        def = absorb(def, attacker_damage, config.shield_absorption);

        let narrative = narrate(
            round,
            &att_volley,
            &def_volley,
            attacker_dodged,
            defender_dodged,
            attacker_damage,
            defender_damage,
        );
        tracing::trace!("{}", narrative);

        rounds.push(RoundRecord {
            round,
            attacker: att,
            defender: def,
            attacker_damage,
            defender_damage,
            attacker_critical: att_volley.critical,
            defender_critical: def_volley.critical,
            attacker_dodged,
            defender_dodged,
            narrative,
        });
        round += 1;
    }

    let (winner, attacker_destroyed, defender_destroyed) = match (att.fighters, def.fighters) {
        (0, 0) => (Victor::Draw, true, true),
        (_, 0) => (Victor::Attacker, false, true),
        (0, _) => (Victor::Defender, true, false),
        (a, d) if a > d => (Victor::Attacker, false, false),
        (a, d) if d > a => (Victor::Defender, false, false),
        _ => (Victor::Draw, false, false),
    };

    CombatOutcome {
        rounds,
        winner,
        attacker_destroyed,
        defender_destroyed,
        attacker_final: att,
        defender_final: def,
        attacker_losses: losses(attacker, att),
        defender_losses: losses(defender, def),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::dice::{FixedDice, RngDice};

    #[test]
    fn test_absorb_shields_first() {
        // 10 damage, 3 shields soak 6, 4 fighters die
        let after = absorb(ShipStrength::new(10, 3), 10, 2);
        assert_eq!(after, ShipStrength::new(6, 0));
    }

    #[test]
    fn test_absorb_odd_damage_rounds_shield_loss_up() {
        let after = absorb(ShipStrength::new(10, 10), 5, 2);
        assert_eq!(after, ShipStrength::new(10, 7));
    }

    #[test]
    fn test_absorb_never_below_zero() {
        let after = absorb(ShipStrength::new(3, 0), 1000, 2);
        assert_eq!(after, ShipStrength::new(0, 0));
    }

    #[test]
    fn test_overwhelming_attacker_wins_in_one_round() {
        let config = CombatConfig::default();
        for seed in 0..50 {
            let mut dice = RngDice::seeded(seed);
            let outcome = simulate(
                ShipStrength::new(50, 50),
                ShipStrength::new(1, 0),
                &config,
                &mut dice,
            );
            assert_eq!(outcome.rounds_fought(), 1);
            assert_eq!(outcome.winner, Victor::Attacker);
            assert!(outcome.defender_destroyed);
            assert!(!outcome.attacker_destroyed);
            assert_eq!(outcome.defender_losses.fighters, 1);
        }
    }

    #[test]
    fn test_equal_ships_reach_round_cap_as_draw() {
        let config = CombatConfig::default();
        let mut dice = FixedDice::with_luck(0.5);
        let outcome = simulate(
            ShipStrength::new(100, 100),
            ShipStrength::new(100, 100),
            &config,
            &mut dice,
        );

        assert_eq!(outcome.rounds_fought(), config.max_rounds);
        assert_eq!(outcome.winner, Victor::Draw);
        assert!(!outcome.attacker_destroyed);
        assert!(!outcome.defender_destroyed);
        assert_eq!(outcome.attacker_final, outcome.defender_final);
        assert!(outcome.attacker_final.fighters > 0);
    }

    #[test]
    fn test_mutual_destruction() {
        let config = CombatConfig::default();
        let mut dice = FixedDice::even();
        let outcome = simulate(
            ShipStrength::new(5, 0),
            ShipStrength::new(5, 0),
            &config,
            &mut dice,
        );
        assert_eq!(outcome.winner, Victor::Draw);
        assert!(outcome.is_mutual_destruction());
        assert!(!outcome.is_decisive());
    }

    #[test]
    fn test_critical_doubles_damage() {
        let config = CombatConfig::default();
        let mut dice = FixedDice {
            critical: true,
            ..FixedDice::even()
        };
        let outcome = simulate(
            ShipStrength::new(10, 0),
            ShipStrength::new(100, 100),
            &config,
            &mut dice,
        );
        assert_eq!(outcome.rounds[0].attacker_damage, 20);
        assert!(outcome.rounds[0].attacker_critical);
    }

    #[test]
    fn test_dodge_halves_incoming_damage() {
        let config = CombatConfig::default();
        let mut dice = FixedDice {
            dodge: true,
            ..FixedDice::even()
        };
        let outcome = simulate(
            ShipStrength::new(11, 0),
            ShipStrength::new(100, 100),
            &config,
            &mut dice,
        );
        // Both dodge, so each deals half of its base damage
        assert_eq!(outcome.rounds[0].attacker_damage, 5);
        assert_eq!(outcome.rounds[0].defender_damage, 50);
    }

    #[test]
    fn test_zero_fighter_defender_destroyed_without_rounds() {
        let config = CombatConfig::default();
        let mut dice = FixedDice::even();
        let outcome = simulate(
            ShipStrength::new(10, 0),
            ShipStrength::new(0, 40),
            &config,
            &mut dice,
        );
        assert!(outcome.rounds.is_empty());
        assert_eq!(outcome.winner, Victor::Attacker);
        assert!(outcome.defender_destroyed);
        assert_eq!(outcome.defender_losses, Losses::default());
    }

    #[test]
    fn test_round_cap_survivor_with_more_fighters_wins() {
        let config = CombatConfig {
            max_rounds: 1,
            ..CombatConfig::default()
        };
        let mut dice = FixedDice::even();
        let outcome = simulate(
            ShipStrength::new(30, 0),
            ShipStrength::new(40, 0),
            &config,
            &mut dice,
        );
        // 30 fighters take 40 damage and die; defender keeps 10
        assert!(outcome.attacker_destroyed);
        assert_eq!(outcome.winner, Victor::Defender);

        let mut dice = FixedDice::with_luck(0.5);
        let outcome = simulate(
            ShipStrength::new(30, 0),
            ShipStrength::new(40, 0),
            &config,
            &mut dice,
        );
        // 30 takes 20 -> 10 left, 40 takes 15 -> 25 left
        assert_eq!(outcome.winner, Victor::Defender);
        assert!(!outcome.attacker_destroyed);
        assert!(!outcome.defender_destroyed);
    }

    #[test]
    fn test_losses_are_initial_minus_final() {
        let config = CombatConfig::default();
        let mut dice = RngDice::seeded(99);
        let attacker = ShipStrength::new(40, 15);
        let defender = ShipStrength::new(35, 25);
        let outcome = simulate(attacker, defender, &config, &mut dice);

        assert_eq!(
            outcome.attacker_losses.fighters,
            attacker.fighters - outcome.attacker_final.fighters
        );
        assert_eq!(
            outcome.defender_losses.shields,
            defender.shields - outcome.defender_final.shields
        );
        assert!(outcome.rounds_fought() <= config.max_rounds);
    }
}
