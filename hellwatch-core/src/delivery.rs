//! Webhook delivery of finished scorecards.
//!
//! One multipart POST per battle: the rendered PNG plus a text body carrying
//! the format, both rosters in display order with reported power figures,
//! start time, and duration. No webhook configured means reports only land
//! on disk.

use crate::battle::Battle;
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Human-readable summary that rides along with the scorecard image.
pub fn summary_text(battle: &Battle, format_name: &str) -> String {
    let duration = battle.duration();
    let minutes = duration.num_seconds().max(0) / 60;
    let seconds = duration.num_seconds().max(0) % 60;

    let roster_line = |ids: &[String]| {
        ids.iter()
            .map(|id| match battle.player(id) {
                Some(player) => {
                    format!("{} ({:.0})", player.name, player.average_item_power)
                }
                None => id.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{} hellgate {}\nStart: {} UTC, duration {:02}m {:02}s\nTeam A: {}\nTeam B: {}",
        format_name,
        battle.id,
        battle.start_time.format("%H:%M:%S"),
        minutes,
        seconds,
        roster_line(&battle.team_a_ids),
        roster_line(&battle.team_b_ids),
    )
}

/// Post one scorecard to the webhook.
pub async fn post_scorecard(
    http: &reqwest::Client,
    webhook_url: &str,
    battle: &Battle,
    format_name: &str,
    image_path: &Path,
) -> Result<()> {
    let bytes = std::fs::read(image_path)?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("battle_report_{}.png", battle.id));

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/png")?;
    let form = reqwest::multipart::Form::new()
        .text("content", summary_text(battle, format_name))
        .part("file", part);

    http.post(webhook_url)
        .multipart(form)
        .send()
        .await?
        .error_for_status()?;

    info!("delivered scorecard for battle {}", battle.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BattleSummary, EquipmentRecord, KillEvent, PlayerRecord};
    use std::collections::HashMap;

    fn record(id: &str, name: &str, power: f64) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            name: name.to_string(),
            guild_name: String::new(),
            alliance_name: String::new(),
            average_item_power: Some(power),
            equipment: EquipmentRecord::default(),
        }
    }

    #[test]
    fn test_summary_text_lists_both_rosters() {
        let summary = BattleSummary {
            id: 555,
            start_time: "2026-08-01T18:14:00Z".parse().unwrap(),
            end_time: "2026-08-01T18:21:30Z".parse().unwrap(),
            players: HashMap::new(),
        };
        let events = vec![KillEvent {
            event_id: 1,
            timestamp: "2026-08-01T18:15:00Z".parse().unwrap(),
            killer: record("k", "Alice", 1193.4),
            victim: record("v", "Bob", 1187.0),
            participants: Vec::new(),
            group_members: Vec::new(),
        }];
        let battle = Battle::new(&summary, events);

        let text = summary_text(&battle, "5v5");
        assert!(text.contains("5v5 hellgate 555"));
        assert!(text.contains("Start: 18:14:00 UTC, duration 07m 30s"));
        assert!(text.contains("Team A: Alice (1193)"));
        assert!(text.contains("Team B: Bob (1187)"));
    }
}
