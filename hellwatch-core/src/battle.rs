//! Battle reconstruction: the player registry and the team partitioner.
//!
//! The feed never labels sides. The only evidence per event is that killer
//! and victim stood on opposite sides while the killer's group members stood
//! on the killer's side. Team assignment therefore runs as iterated
//! constraint propagation over a two-coloring seeded with the first killer,
//! with deterministic fallbacks for players the event graph never reaches.

use crate::equipment::Equipment;
use crate::models::{BattleSummary, KillEvent, PlayerRecord};
use crate::roster;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// One player's reconstructed identity within a battle.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub guild: String,
    pub alliance: String,
    pub equipment: Equipment,
    /// Reported by the feed; validated against the ceiling, never trusted.
    pub average_item_power: f64,
}

impl Player {
    pub fn from_record(record: &PlayerRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            guild: record.guild_name.clone(),
            alliance: record.alliance_name.clone(),
            equipment: Equipment::from_record(&record.equipment),
            average_item_power: record.average_item_power.unwrap_or(0.0),
        }
    }

    /// Fold a later snapshot of the same player into this record: fill empty
    /// equipment slots and backfill a missing power figure. Earlier
    /// observations always win.
    fn absorb(&mut self, record: &PlayerRecord) {
        self.equipment.merge(&Equipment::from_record(&record.equipment));
        if self.average_item_power == 0.0 {
            if let Some(power) = record.average_item_power {
                if power > 0.0 {
                    self.average_item_power = power;
                }
            }
        }
    }

    pub fn max_average_item_power(&self, ip_cap: f64, softcap_percent: i32) -> i32 {
        self.equipment.max_average_item_power(ip_cap, softcap_percent)
    }
}

/// One fight instance: the closed event timeline, the reconstructed player
/// registry, and the two team-id lists that partition it.
#[derive(Debug, Clone)]
pub struct Battle {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub events: Vec<KillEvent>,
    /// One entry per unique player id, in first-sighting order.
    pub players: Vec<Player>,
    pub victim_ids: BTreeSet<String>,
    /// Display-ordered ids, disjoint, together covering the registry.
    pub team_a_ids: Vec<String>,
    pub team_b_ids: Vec<String>,
}

impl Battle {
    pub fn new(summary: &BattleSummary, events: Vec<KillEvent>) -> Self {
        let players = collect_players(&events);
        let victim_ids = events.iter().map(|e| e.victim.id.clone()).collect();
        let (side_a, side_b) = split_teams(&players, &events);

        Self {
            id: summary.id,
            start_time: summary.start_time,
            end_time: summary.end_time,
            team_a_ids: roster::order_team(&players, &side_a),
            team_b_ids: roster::order_team(&players, &side_b),
            events,
            players,
            victim_ids,
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

/// Build the registry: one `Player` per unique id, equipment assembled
/// opportunistically from whichever event role exposed it. Roles are visited
/// as killer, victim, participants, group members, in that order, so
/// earlier roles fill slots first.
fn collect_players(events: &[KillEvent]) -> Vec<Player> {
    let mut players: Vec<Player> = Vec::new();
    {
        let mut observe = |record: &PlayerRecord| {
            if record.id.is_empty() {
                return;
            }
            match players.iter_mut().find(|p| p.id == record.id) {
                Some(existing) => existing.absorb(record),
                None => players.push(Player::from_record(record)),
            }
        };
        for event in events {
            observe(&event.killer);
            observe(&event.victim);
            for participant in &event.participants {
                observe(participant);
            }
            for member in &event.group_members {
                observe(member);
            }
        }
    }
    players
}

/// Add `id` to `side` unless it already belongs to either side. Keeping
/// assignments first-write-wins makes the two sets disjoint even under
/// contradictory evidence.
fn assign(side: &mut BTreeSet<String>, other: &BTreeSet<String>, id: &str) -> bool {
    if side.contains(id) || other.contains(id) {
        return false;
    }
    side.insert(id.to_string());
    true
}

/// Two-color the registry from kill adjacency. Returns disjoint id sets
/// whose union is the full registry.
///
/// Propagation is bounded by `|players| + 1` passes and stops early on a
/// pass that assigns nobody. Players in event-graph components the seed
/// never reaches are resolved afterwards: once one side holds at least half
/// the roster the remainder is swept to the other side, and anything still
/// unassigned is balanced onto the smaller side in registry order. The
/// fallbacks are best-effort on degenerate graphs, but deterministic.
fn split_teams(
    players: &[Player],
    events: &[KillEvent],
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut side_a: BTreeSet<String> = BTreeSet::new();
    let mut side_b: BTreeSet<String> = BTreeSet::new();

    if let Some(first) = events.first() {
        side_a.insert(first.killer.id.clone());
    }

    for _pass in 0..=players.len() {
        let mut changed = false;
        for event in events {
            let killer_id = event.killer.id.as_str();
            let victim_id = event.victim.id.as_str();
            let group_ids: Vec<&str> =
                event.group_members.iter().map(|m| m.id.as_str()).collect();

            if side_a.contains(killer_id) {
                for id in &group_ids {
                    changed |= assign(&mut side_a, &side_b, id);
                }
                changed |= assign(&mut side_b, &side_a, victim_id);
            } else if side_b.contains(killer_id) {
                for id in &group_ids {
                    changed |= assign(&mut side_b, &side_a, id);
                }
                changed |= assign(&mut side_a, &side_b, victim_id);
            }

            if side_a.contains(victim_id) {
                changed |= assign(&mut side_b, &side_a, killer_id);
                for id in &group_ids {
                    changed |= assign(&mut side_b, &side_a, id);
                }
            } else if side_b.contains(victim_id) {
                changed |= assign(&mut side_a, &side_b, killer_id);
                for id in &group_ids {
                    changed |= assign(&mut side_a, &side_b, id);
                }
            }
        }
        if !changed {
            break;
        }
    }

    // A side at target strength means everyone still floating belongs to the
    // other one.
    let target = players.len() / 2;
    if target > 0 {
        if side_a.len() >= target {
            for player in players {
                if !side_a.contains(&player.id) {
                    side_b.insert(player.id.clone());
                }
            }
        } else if side_b.len() >= target {
            for player in players {
                if !side_b.contains(&player.id) {
                    side_a.insert(player.id.clone());
                }
            }
        }
    }

    // Whatever propagation and the sweep never touched is balanced onto the
    // smaller side, in registry order.
    for player in players {
        if !side_a.contains(&player.id) && !side_b.contains(&player.id) {
            if side_a.len() <= side_b.len() {
                side_a.insert(player.id.clone());
            } else {
                side_b.insert(player.id.clone());
            }
        }
    }

    (side_a, side_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquipmentRecord, ItemRecord};
    use std::collections::HashMap;

    fn record(id: &str) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            guild_name: String::new(),
            alliance_name: String::new(),
            average_item_power: Some(1000.0),
            equipment: EquipmentRecord::default(),
        }
    }

    fn record_with_gear(id: &str, main_hand: &str, power: f64) -> PlayerRecord {
        PlayerRecord {
            average_item_power: Some(power),
            equipment: EquipmentRecord {
                main_hand: Some(ItemRecord {
                    type_id: main_hand.to_string(),
                    quality: 1,
                }),
                ..Default::default()
            },
            ..record(id)
        }
    }

    fn event(killer: PlayerRecord, victim: PlayerRecord, group: Vec<PlayerRecord>) -> KillEvent {
        KillEvent {
            event_id: 1,
            timestamp: "2026-08-01T18:15:00Z".parse().unwrap(),
            killer,
            victim,
            participants: Vec::new(),
            group_members: group,
        }
    }

    fn summary() -> BattleSummary {
        BattleSummary {
            id: 42,
            start_time: "2026-08-01T18:14:00Z".parse().unwrap(),
            end_time: "2026-08-01T18:21:30Z".parse().unwrap(),
            players: HashMap::new(),
        }
    }

    /// A clean 5v5: every kill lists the killer's full group.
    fn five_v_five_events() -> Vec<KillEvent> {
        let reds = ["r1", "r2", "r3", "r4", "r5"];
        let blues = ["b1", "b2", "b3", "b4", "b5"];
        let red_group = || reds.iter().map(|id| record(id)).collect::<Vec<_>>();
        let blue_group = || blues.iter().map(|id| record(id)).collect::<Vec<_>>();

        vec![
            event(record("r1"), record("b1"), red_group()),
            event(record("b2"), record("r3"), blue_group()),
            event(record("r2"), record("b4"), red_group()),
        ]
    }

    #[test]
    fn test_teams_partition_registry() {
        let battle = Battle::new(&summary(), five_v_five_events());
        assert_eq!(battle.players.len(), 10);
        assert_eq!(battle.team_a_ids.len() + battle.team_b_ids.len(), 10);

        let a: BTreeSet<_> = battle.team_a_ids.iter().collect();
        let b: BTreeSet<_> = battle.team_b_ids.iter().collect();
        assert!(a.is_disjoint(&b));
    }

    #[test]
    fn test_first_killer_seeds_side_a() {
        let battle = Battle::new(&summary(), five_v_five_events());
        assert!(battle.team_a_ids.iter().any(|id| id == "r1"));
        for red in ["r1", "r2", "r3", "r4", "r5"] {
            assert!(battle.team_a_ids.iter().any(|id| id == red));
        }
        for blue in ["b1", "b2", "b3", "b4", "b5"] {
            assert!(battle.team_b_ids.iter().any(|id| id == blue));
        }
    }

    #[test]
    fn test_propagation_through_victim_side() {
        // Second event's killer is only linked through its victim being a
        // known side-A member.
        let events = vec![
            event(record("a1"), record("x1"), vec![record("a1"), record("a2")]),
            event(record("x2"), record("a2"), vec![record("x2"), record("x3")]),
        ];
        let battle = Battle::new(&summary(), events);

        let on_a = |id: &str| battle.team_a_ids.iter().any(|i| i == id);
        let on_b = |id: &str| battle.team_b_ids.iter().any(|i| i == id);
        assert!(on_a("a1") && on_a("a2"));
        assert!(on_b("x1") && on_b("x2") && on_b("x3"));
    }

    #[test]
    fn test_single_event_without_group_members() {
        let events = vec![event(record("k"), record("v"), Vec::new())];
        let battle = Battle::new(&summary(), events);

        assert_eq!(battle.players.len(), 2);
        assert_eq!(battle.team_a_ids, vec!["k".to_string()]);
        assert_eq!(battle.team_b_ids, vec!["v".to_string()]);
    }

    #[test]
    fn test_disconnected_component_falls_back_to_balance() {
        // Two kill components that never share a player: propagation reaches
        // only the first, the rest is resolved deterministically.
        let events = vec![
            event(record("k1"), record("v1"), Vec::new()),
            event(record("k2"), record("v2"), Vec::new()),
        ];
        let battle = Battle::new(&summary(), events);

        assert_eq!(battle.team_a_ids.len() + battle.team_b_ids.len(), 4);
        let a: BTreeSet<_> = battle.team_a_ids.iter().collect();
        let b: BTreeSet<_> = battle.team_b_ids.iter().collect();
        assert!(a.is_disjoint(&b));

        // Same input, same split.
        let events2 = vec![
            event(record("k1"), record("v1"), Vec::new()),
            event(record("k2"), record("v2"), Vec::new()),
        ];
        let battle2 = Battle::new(&summary(), events2);
        assert_eq!(battle.team_a_ids, battle2.team_a_ids);
        assert_eq!(battle.team_b_ids, battle2.team_b_ids);
    }

    #[test]
    fn test_sweep_when_one_side_reaches_target() {
        // Propagation fills side A to strength; the stragglers never appear
        // in any kill relation with A and get swept to side B.
        let reds = ["r1", "r2", "r3", "r4", "r5"];
        let red_group = || reds.iter().map(|id| record(id)).collect::<Vec<_>>();
        let events = vec![
            event(record("r1"), record("b1"), red_group()),
            // b2..b5 only ever appear as group members of an unseeded kill
            // among themselves, in a second component.
            event(
                record("b2"),
                record("b5"),
                vec![record("b2"), record("b3"), record("b4")],
            ),
        ];
        let battle = Battle::new(&summary(), events);

        assert_eq!(battle.players.len(), 10);
        for red in reds {
            assert!(battle.team_a_ids.iter().any(|id| id == red));
        }
        for blue in ["b1", "b2", "b3", "b4", "b5"] {
            assert!(battle.team_b_ids.iter().any(|id| id == blue));
        }
    }

    #[test]
    fn test_registry_merges_equipment_and_backfills_power() {
        let mut bare = record("p1");
        bare.average_item_power = None;
        let geared = record_with_gear("p1", "T8_MAIN_SWORD", 1234.0);

        let events = vec![
            event(bare, record("v1"), Vec::new()),
            event(record("k2"), record("v2"), vec![geared]),
        ];
        let battle = Battle::new(&summary(), events);

        let p1 = battle.player("p1").unwrap();
        assert_eq!(
            p1.equipment.main_hand.as_ref().unwrap().archetype,
            "MAIN_SWORD"
        );
        assert_eq!(p1.average_item_power, 1234.0);
    }

    #[test]
    fn test_registry_keeps_first_seen_equipment() {
        let first = record_with_gear("p1", "T4_MAIN_SWORD", 900.0);
        let second = record_with_gear("p1", "T8_MAIN_SWORD", 1400.0);

        let events = vec![
            event(first, record("v1"), Vec::new()),
            event(second, record("v2"), Vec::new()),
        ];
        let battle = Battle::new(&summary(), events);

        let p1 = battle.player("p1").unwrap();
        assert_eq!(p1.equipment.main_hand.as_ref().unwrap().tier, 4);
        assert_eq!(p1.average_item_power, 900.0);
    }

    #[test]
    fn test_victim_ids_collected() {
        let battle = Battle::new(&summary(), five_v_five_events());
        assert!(battle.victim_ids.contains("b1"));
        assert!(battle.victim_ids.contains("r3"));
        assert!(battle.victim_ids.contains("b4"));
        assert_eq!(battle.victim_ids.len(), 3);
    }

    #[test]
    fn test_duration() {
        let battle = Battle::new(&summary(), Vec::new());
        assert_eq!(battle.duration().num_seconds(), 450);
    }
}
