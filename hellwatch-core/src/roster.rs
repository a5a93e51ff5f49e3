//! Role-based display ordering of a reconstructed team.
//!
//! The ordering is purely cosmetic but must be deterministic: scorecards for
//! the same battle have to come out identical on every run.

use crate::battle::Player;
use std::collections::BTreeSet;

/// Display role buckets, in scorecard order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unknown,
    Tank,
    Melee,
    Leather,
    Cloth,
    Healer,
}

impl Role {
    fn display_rank(self) -> u8 {
        match self {
            Role::Unknown => 0,
            Role::Tank => 1,
            Role::Melee => 2,
            Role::Leather => 3,
            Role::Cloth => 4,
            Role::Healer => 5,
        }
    }
}

/// Bucket a player by first-matching rule: healing main-hand beats
/// everything, then the armor family decides. Royal and heavy-melee plate
/// sets read as melee rather than tank; anything that is neither plate nor
/// leather lands in the cloth bucket.
pub fn role_of(player: &Player) -> Role {
    if let Some(main_hand) = &player.equipment.main_hand {
        if main_hand.is_healing_weapon() {
            return Role::Healer;
        }
    }
    let Some(armor) = &player.equipment.armor else {
        return Role::Unknown;
    };
    if armor.archetype.contains("PLATE_ROYAL") || armor.archetype.contains("PLATE_SET1") {
        return Role::Melee;
    }
    if armor.is_plate() {
        return Role::Tank;
    }
    if armor.is_leather() {
        return Role::Leather;
    }
    Role::Cloth
}

/// Order one team's ids for display: bucket by role, sort each bucket
/// ascending by main-hand archetype with weaponless players last, and
/// concatenate buckets in display order.
pub fn order_team(players: &[Player], team_ids: &BTreeSet<String>) -> Vec<String> {
    let mut team: Vec<&Player> = players
        .iter()
        .filter(|p| team_ids.contains(&p.id))
        .collect();
    team.sort_by_key(|p| sort_key(p));
    team.into_iter().map(|p| p.id.clone()).collect()
}

fn sort_key(player: &Player) -> (u8, bool, String) {
    let rank = role_of(player).display_rank();
    match &player.equipment.main_hand {
        Some(main_hand) => (rank, false, main_hand.archetype.clone()),
        None => (rank, true, String::new()),
    }
}
