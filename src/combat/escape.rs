//! Escape routing for destroyed ships
//!
//! A pod is flung a random number of jumps away from the battle. The search is
//! a plain BFS over the warp graph; nothing here is cached or owned.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use super::dice::Dice;
use crate::core::types::SectorId;
use crate::galaxy::WarpGraph;

/// How the destination was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// Picked from the sectors exactly `distance` jumps away
    Sampled { distance: u32 },
    /// Nothing at the sampled distance; a direct neighbour was used
    Neighbor,
    /// Origin has no exits; the home sector was used
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeRoute {
    pub destination: SectorId,
    pub kind: RouteKind,
}

/// Sectors whose shortest distance from `origin` is exactly `distance`, sorted
pub fn frontier_at(graph: &dyn WarpGraph, origin: SectorId, distance: u32) -> Vec<SectorId> {
    let mut visited = AHashSet::new();
    visited.insert(origin);
    let mut queue = VecDeque::from([(origin, 0u32)]);
    let mut frontier = Vec::new();

    while let Some((sector, depth)) = queue.pop_front() {
        if depth == distance {
            frontier.push(sector);
            continue;
        }
        for next in graph.neighbors(sector) {
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    frontier.sort();
    frontier
}

/// Pick where a destroyed ship's escape pod ends up
///
/// Samples a distance in `[min_jumps, max_jumps]` and picks uniformly among
/// the sectors exactly that far away. Falls back to a direct neighbour, then
/// to `home`.
pub fn find_escape_sector(
    graph: &dyn WarpGraph,
    origin: SectorId,
    min_jumps: u32,
    max_jumps: u32,
    home: SectorId,
    dice: &mut dyn Dice,
) -> EscapeRoute {
    let distance = dice.between(min_jumps, max_jumps.max(min_jumps));
    let frontier = frontier_at(graph, origin, distance);
    if !frontier.is_empty() {
        let destination = frontier[dice.below(frontier.len())];
        tracing::debug!(
            "Escape from {} lands in {} ({} jumps)",
            origin,
            destination,
            distance
        );
        return EscapeRoute {
            destination,
            kind: RouteKind::Sampled { distance },
        };
    }

    let mut neighbors = graph.neighbors(origin);
    neighbors.retain(|s| *s != origin);
    if !neighbors.is_empty() {
        neighbors.sort();
        let destination = neighbors[dice.below(neighbors.len())];
        tracing::debug!(
            "No sector {} jumps from {}, escaping to neighbour {}",
            distance,
            origin,
            destination
        );
        return EscapeRoute {
            destination,
            kind: RouteKind::Neighbor,
        };
    }

    tracing::debug!("{} has no warps, escaping to home {}", origin, home);
    EscapeRoute {
        destination: home,
        kind: RouteKind::Home,
    }
}
