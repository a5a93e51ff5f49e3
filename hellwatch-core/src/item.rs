//! Item model: compound identifier parsing and maximum attainable item power.
//!
//! Item type identifiers follow the grammar `[T<tier>_]<archetype>[@<enchant>]`,
//! e.g. `T8_ARMOR_PLATE_SET1@3` or the tier-less `CAPE`. Parsing is tolerant:
//! anything that does not match the grammar keeps the raw string as the
//! archetype with tier and enchantment zero, since the feed carries tier-less
//! accessories and the occasional oddball identifier.

use crate::models::ItemRecord;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Slot category of an item. Selects which mastery spec bonuses apply to the
/// power ceiling: weapons and armor pieces scale with destiny-board masteries,
/// accessories and consumables do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Weapon,
    Armor,
    Accessory,
}

pub const BASE_ITEM_POWER: f64 = 300.0;
const POWER_PER_TIER: f64 = 100.0;
const POWER_PER_ENCHANTMENT: f64 = 100.0;

const OVERCHARGE_BONUS: f64 = 100.0;
const MAX_ITEM_LEVEL: f64 = 120.0;
const POWER_PER_LEVEL: f64 = 2.0;
const NON_ARTIFACT_ITEMS: f64 = 3.0;
const POWER_PER_LEVEL_NON_ARTIFACT: f64 = 0.2;
const ARTIFACT_ITEMS: f64 = 4.0;
const POWER_PER_LEVEL_ARTIFACT: f64 = 0.1;
const CRYSTAL_ITEMS: f64 = 5.0;
const POWER_PER_LEVEL_CRYSTAL: f64 = 0.025;

/// The accumulated spec contribution scales by `(tier - 20)` percent: a
/// discount at low tiers, a premium above.
const MASTERY_PIVOT: f64 = 20.0;

lazy_static! {
    static ref ITEM_TYPE_RE: Regex = Regex::new(r"^(?:T(\d)_)?(.+?)(?:@(\d))?$").unwrap();

    /// Main-hand archetypes whose carrier is displayed as a healer.
    static ref HEALING_WEAPONS: HashSet<&'static str> = [
        "MAIN_HOLYSTAFF",
        "2H_HOLYSTAFF",
        "2H_DIVINESTAFF",
        "MAIN_HOLYSTAFF_MORGANA",
        "2H_HOLYSTAFF_HELL",
        "2H_HOLYSTAFF_UNDEAD",
        "MAIN_HOLYSTAFF_AVALON",
        "2H_HOLYSTAFF_CRYSTAL",
        "MAIN_NATURESTAFF",
        "2H_NATURESTAFF",
        "2H_WILDSTAFF",
        "MAIN_NATURESTAFF_KEEPER",
        "2H_NATURESTAFF_HELL",
        "2H_NATURESTAFF_KEEPER",
        "MAIN_NATURESTAFF_AVALON",
        "MAIN_NATURESTAFF_CRYSTAL",
    ]
    .into_iter()
    .collect();
}

/// Compress `power` above `ip_cap` to `ip_cap + excess * softcap_percent/100`.
/// Values at or below the cap pass through unchanged. Applied exactly once
/// per item, at the end of the ceiling computation.
pub fn apply_soft_cap(power: f64, ip_cap: f64, softcap_percent: i32) -> f64 {
    if power <= ip_cap {
        power
    } else {
        ip_cap + (power - ip_cap) * (softcap_percent as f64 / 100.0)
    }
}

/// One equipped item, immutable once constructed from a feed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// The raw compound identifier as the feed reported it.
    pub type_id: String,
    /// Archetype with tier prefix and enchantment suffix stripped.
    pub archetype: String,
    pub tier: i32,
    pub enchantment: i32,
    pub quality: i32,
    pub category: ItemCategory,
}

impl Item {
    pub fn from_record(category: ItemCategory, record: &ItemRecord) -> Self {
        let (tier, archetype, enchantment) = parse_type_id(&record.type_id);
        Self {
            type_id: record.type_id.clone(),
            archetype,
            tier,
            enchantment,
            quality: record.quality,
            category,
        }
    }

    /// Fixed power bonus per quality tier. Unknown values contribute nothing.
    fn quality_bonus(&self) -> f64 {
        match self.quality {
            2 => 20.0,
            3 => 40.0,
            4 => 60.0,
            5 => 100.0,
            _ => 0.0,
        }
    }

    /// The analytically maximum item power this item could reach with every
    /// mastery and overcharge bonus taken, soft-capped for the given format.
    pub fn max_item_power(&self, ip_cap: f64, softcap_percent: i32) -> f64 {
        let mut power = BASE_ITEM_POWER
            + self.tier as f64 * POWER_PER_TIER
            + self.enchantment as f64 * POWER_PER_ENCHANTMENT
            + self.quality_bonus();

        match self.category {
            ItemCategory::Weapon | ItemCategory::Armor => {
                power += OVERCHARGE_BONUS;
                power += MAX_ITEM_LEVEL * POWER_PER_LEVEL;
                power += NON_ARTIFACT_ITEMS * POWER_PER_LEVEL_NON_ARTIFACT * MAX_ITEM_LEVEL;
                power += ARTIFACT_ITEMS * POWER_PER_LEVEL_ARTIFACT * MAX_ITEM_LEVEL;
                if self.category == ItemCategory::Weapon {
                    power += CRYSTAL_ITEMS * POWER_PER_LEVEL_CRYSTAL * MAX_ITEM_LEVEL;
                }
                let mastery_percent = self.tier as f64 - MASTERY_PIVOT;
                power += power * mastery_percent / 100.0;
            }
            ItemCategory::Accessory => {}
        }

        apply_soft_cap(power, ip_cap, softcap_percent)
    }

    pub fn is_healing_weapon(&self) -> bool {
        HEALING_WEAPONS.contains(self.archetype.as_str())
    }

    pub fn is_plate(&self) -> bool {
        self.archetype.contains("PLATE")
    }

    pub fn is_leather(&self) -> bool {
        self.archetype.contains("LEATHER")
    }

    pub fn is_cloth(&self) -> bool {
        self.archetype.contains("CLOTH")
    }
}

/// Tolerant parse of a compound type identifier into (tier, archetype,
/// enchantment). No match means tier 0, enchantment 0, raw archetype.
fn parse_type_id(type_id: &str) -> (i32, String, i32) {
    let Some(caps) = ITEM_TYPE_RE.captures(type_id) else {
        return (0, type_id.to_string(), 0);
    };
    let tier = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let enchantment = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let archetype = caps.get(2).map(|m| m.as_str()).unwrap_or(type_id);
    (tier, archetype.to_string(), enchantment)
}
