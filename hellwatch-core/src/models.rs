//! Raw records from the match-history feed.
//!
//! These mirror the public API JSON one-to-one. Fields the watcher does not
//! consume (mounts, kill fame, damage breakdowns) are ignored on
//! deserialization. Absent fields mean "no contribution", never an error:
//! the feed is known to omit equipment and power data for some event roles.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the `/battles` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct BattleSummary {
    pub id: i64,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    /// Participating players keyed by id. Only the count matters here.
    #[serde(default)]
    pub players: HashMap<String, serde_json::Value>,
}

impl BattleSummary {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// One kill from `/events/battle/{id}`. Read-only evidence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KillEvent {
    pub event_id: i64,
    #[serde(rename = "TimeStamp")]
    pub timestamp: DateTime<Utc>,
    pub killer: PlayerRecord,
    pub victim: PlayerRecord,
    /// Assists credited on the kill.
    #[serde(default)]
    pub participants: Vec<PlayerRecord>,
    /// The killer's party members present at the kill.
    #[serde(default)]
    pub group_members: Vec<PlayerRecord>,
}

/// One player snapshot as embedded in an event role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub guild_name: String,
    #[serde(default)]
    pub alliance_name: String,
    #[serde(default)]
    pub average_item_power: Option<f64>,
    #[serde(default)]
    pub equipment: EquipmentRecord,
}

/// The nine equipment slots as the feed reports them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EquipmentRecord {
    pub main_hand: Option<ItemRecord>,
    pub off_hand: Option<ItemRecord>,
    pub armor: Option<ItemRecord>,
    pub head: Option<ItemRecord>,
    pub shoes: Option<ItemRecord>,
    pub cape: Option<ItemRecord>,
    pub bag: Option<ItemRecord>,
    pub potion: Option<ItemRecord>,
    pub food: Option<ItemRecord>,
}

/// One equipped item: the compound type identifier plus a quality tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemRecord {
    #[serde(rename = "Type")]
    pub type_id: String,
    #[serde(default)]
    pub quality: i32,
}
