//! Void Trader - ship combat and settlement for a persistent space trading game

pub mod combat;
pub mod core;
pub mod galaxy;
pub mod ship;
