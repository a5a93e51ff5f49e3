//! Supported competitive formats and the classification predicate.

use crate::battle::Battle;
use std::fmt;

/// Parameter set of one supported fixed-team-size, power-capped format.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    pub name: &'static str,
    pub team_size: usize,
    pub ip_cap: f64,
    pub softcap_percent: i32,
    /// Slack added to the computed ceiling before rejecting, absorbing bonus
    /// sources the ceiling formula does not model.
    pub power_tolerance: f64,
}

impl FormatSpec {
    pub fn lethal_5v5() -> Self {
        Self {
            name: "5v5",
            team_size: 5,
            ip_cap: 1100.0,
            softcap_percent: 35,
            power_tolerance: 100.0,
        }
    }

    pub fn lethal_2v2() -> Self {
        Self {
            name: "2v2",
            team_size: 2,
            ip_cap: 1100.0,
            softcap_percent: 35,
            power_tolerance: 100.0,
        }
    }

    pub fn roster_size(&self) -> usize {
        self.team_size * 2
    }
}

/// Classification result: accepted, or the first check that failed with
/// enough detail to diagnose the rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    WrongRosterSize {
        expected: usize,
        actual: usize,
    },
    OversizedGroup {
        event_id: i64,
        count: usize,
    },
    NeverAtFullStrength,
    PowerOverCeiling {
        player: String,
        reported: f64,
        ceiling: f64,
    },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::WrongRosterSize { expected, actual } => {
                write!(f, "roster has {actual} players, expected {expected}")
            }
            Verdict::OversizedGroup { event_id, count } => {
                write!(f, "event {event_id} shows a group of {count}")
            }
            Verdict::NeverAtFullStrength => {
                write!(f, "no event shows a full-strength group")
            }
            Verdict::PowerOverCeiling {
                player,
                reported,
                ceiling,
            } => write!(
                f,
                "{player} reports {reported:.0} item power, ceiling is {ceiling:.0}"
            ),
        }
    }
}

/// Decide whether a reconstructed battle was fought under the given format:
/// the roster must be exactly two teams of `team_size`, at least one kill
/// must show a full-strength group (a partial skirmish never does), no group
/// may exceed the team size, and every player's reported average item power
/// must stay within the analytically possible ceiling plus tolerance.
pub fn classify(battle: &Battle, format: &FormatSpec) -> Verdict {
    if battle.players.len() != format.roster_size() {
        return Verdict::WrongRosterSize {
            expected: format.roster_size(),
            actual: battle.players.len(),
        };
    }

    let mut full_strength = false;
    for event in &battle.events {
        let count = event.group_members.len();
        if count > format.team_size {
            return Verdict::OversizedGroup {
                event_id: event.event_id,
                count,
            };
        }
        if count == format.team_size {
            full_strength = true;
        }
    }
    if !full_strength {
        return Verdict::NeverAtFullStrength;
    }

    for player in &battle.players {
        let ceiling = player.max_average_item_power(format.ip_cap, format.softcap_percent) as f64
            + format.power_tolerance;
        if player.average_item_power > ceiling {
            return Verdict::PowerOverCeiling {
                player: player.name.clone(),
                reported: player.average_item_power,
                ceiling,
            };
        }
    }

    Verdict::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BattleSummary, EquipmentRecord, ItemRecord, KillEvent, PlayerRecord};
    use std::collections::HashMap;

    fn record(id: &str, power: f64) -> PlayerRecord {
        let item = |type_id: &str| {
            Some(ItemRecord {
                type_id: type_id.to_string(),
                quality: 1,
            })
        };
        PlayerRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            guild_name: String::new(),
            alliance_name: String::new(),
            average_item_power: Some(power),
            equipment: EquipmentRecord {
                main_hand: item("T8_MAIN_SWORD"),
                off_hand: item("T8_OFF_SHIELD"),
                armor: item("T8_ARMOR_PLATE_SET2"),
                head: item("T8_HEAD_PLATE_SET2"),
                shoes: item("T8_SHOES_PLATE_SET2"),
                cape: item("T8_CAPE"),
                ..Default::default()
            },
        }
    }

    fn event(
        killer: PlayerRecord,
        victim: PlayerRecord,
        group: Vec<PlayerRecord>,
    ) -> KillEvent {
        KillEvent {
            event_id: 7,
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

    /// Ten unique ids, one kill where the killer brings a full group of five
    /// and the victim's four teammates show up in a second kill.
    fn ten_player_battle(overpowered: Option<&str>) -> Battle {
        let power = |id: &str| {
            if overpowered == Some(id) {
                // Far above any tier-8 ceiling plus tolerance.
                2000.0
            } else {
                1100.0
            }
        };
        let reds: Vec<&str> = vec!["r1", "r2", "r3", "r4", "r5"];
        let blues: Vec<&str> = vec!["b1", "b2", "b3", "b4", "b5"];
        let red_group: Vec<PlayerRecord> = reds.iter().map(|id| record(id, power(id))).collect();
        let blue_group: Vec<PlayerRecord> = blues.iter().map(|id| record(id, power(id))).collect();

        let events = vec![
            event(record("r1", power("r1")), record("b1", power("b1")), red_group),
            event(record("b2", power("b2")), record("r2", power("r2")), blue_group),
        ];
        Battle::new(&summary(), events)
    }

    #[test]
    fn test_accepts_capped_full_strength_battle() {
        let battle = ten_player_battle(None);
        let verdict = classify(&battle, &FormatSpec::lethal_5v5());
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn test_rejects_single_overpowered_player() {
        let battle = ten_player_battle(Some("b3"));
        match classify(&battle, &FormatSpec::lethal_5v5()) {
            Verdict::PowerOverCeiling {
                player,
                reported,
                ceiling,
            } => {
                assert_eq!(player, "B3");
                assert_eq!(reported, 2000.0);
                assert!(reported > ceiling);
            }
            other => panic!("expected power rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_roster_size() {
        let battle = ten_player_battle(None);
        let verdict = classify(&battle, &FormatSpec::lethal_2v2());
        assert_eq!(
            verdict,
            Verdict::WrongRosterSize {
                expected: 4,
                actual: 10
            }
        );
    }

    #[test]
    fn test_rejects_oversized_group() {
        let six = vec![
            record("r1", 1000.0),
            record("r2", 1000.0),
            record("r3", 1000.0),
            record("r4", 1000.0),
            record("r5", 1000.0),
            record("r6", 1000.0),
        ];
        let mut events = vec![event(record("r1", 1000.0), record("b1", 1000.0), six)];
        // Pad the roster to ten so the group check is what trips.
        events[0].participants = ["b2", "b3", "b4"]
            .iter()
            .map(|id| record(id, 1000.0))
            .collect();
        let battle = Battle::new(&summary(), events);
        assert_eq!(battle.players.len(), 10);
        match classify(&battle, &FormatSpec::lethal_5v5()) {
            Verdict::OversizedGroup { count, .. } => assert_eq!(count, 6),
            other => panic!("expected group rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_partial_skirmish() {
        // Ten players but nobody ever shows a full group of five.
        let reds: Vec<PlayerRecord> = ["r1", "r2", "r3"]
            .iter()
            .map(|id| record(id, 1000.0))
            .collect();
        let mut events = vec![event(
            record("r1", 1000.0),
            record("b1", 1000.0),
            reds,
        )];
        // Bring the roster up to ten through assists.
        events[0].participants = ["r4", "r5", "b2", "b3", "b4", "b5"]
            .iter()
            .map(|id| record(id, 1000.0))
            .collect();
        let battle = Battle::new(&summary(), events);
        assert_eq!(battle.players.len(), 10);
        assert_eq!(
            classify(&battle, &FormatSpec::lethal_5v5()),
            Verdict::NeverAtFullStrength
        );
    }

    #[test]
    fn test_full_strength_check_uses_format_team_size() {
        // A 2v2: groups of two must satisfy the full-strength requirement.
        let pair = vec![record("a1", 1000.0), record("a2", 1000.0)];
        let events = vec![
            event(record("a1", 1000.0), record("x1", 1000.0), pair),
            event(
                record("x2", 1000.0),
                record("a2", 1000.0),
                vec![record("x2", 1000.0), record("x1", 1000.0)],
            ),
        ];
        let battle = Battle::new(&summary(), events);
        assert_eq!(battle.players.len(), 4);
        assert_eq!(classify(&battle, &FormatSpec::lethal_2v2()), Verdict::Accepted);
    }

    #[test]
    fn test_verdict_display_carries_diagnostics() {
        let verdict = Verdict::PowerOverCeiling {
            player: "B3".to_string(),
            reported: 1544.0,
            ceiling: 1266.0,
        };
        let text = verdict.to_string();
        assert!(text.contains("B3"));
        assert!(text.contains("1544"));
        assert!(text.contains("1266"));
    }
}
