//! Ship-to-ship combat: eligibility, simulation, loot, escape and settlement

pub mod dice;
pub mod eligibility;
pub mod escape;
pub mod history;
pub mod loot;
pub mod notify;
pub mod settlement;
pub mod simulation;

pub use dice::{Dice, DiceSource, FixedDice, RngDice, SeededDiceSource};
pub use eligibility::{check_attack, Eligibility, Refusal, RefusalCategory};
pub use escape::{find_escape_sector, EscapeRoute, RouteKind};
pub use history::{CombatHistoryRecord, FloatingDebris};
pub use loot::{allocate, fit_cargo, mutual_destruction, LootResult, MutualWreckage, Side, Wreck};
pub use notify::{BattleReport, BroadcastNotifier, CombatNotifier, NotifyError};
pub use settlement::{CombatResult, CombatService};
pub use simulation::{simulate, CombatOutcome, Losses, RoundRecord, ShipStrength, Victor};
