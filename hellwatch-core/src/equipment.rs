//! The nine-slot loadout of one combatant and its aggregated power ceiling.

use crate::item::{Item, ItemCategory};
use crate::models::EquipmentRecord;

/// The nine named equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    MainHand,
    OffHand,
    Armor,
    Head,
    Shoes,
    Cape,
    Bag,
    Potion,
    Food,
}

/// Number of slot terms in the average: head, armor, shoes, main-hand,
/// off-hand, cape. Consumables never count.
const SCORED_SLOTS: f64 = 6.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    pub main_hand: Option<Item>,
    pub off_hand: Option<Item>,
    pub armor: Option<Item>,
    pub head: Option<Item>,
    pub shoes: Option<Item>,
    pub cape: Option<Item>,
    pub bag: Option<Item>,
    pub potion: Option<Item>,
    pub food: Option<Item>,
}

impl Equipment {
    pub fn from_record(record: &EquipmentRecord) -> Self {
        let parse = |slot: &Option<crate::models::ItemRecord>, category: ItemCategory| {
            slot.as_ref().map(|r| Item::from_record(category, r))
        };
        Self {
            main_hand: parse(&record.main_hand, ItemCategory::Weapon),
            off_hand: parse(&record.off_hand, ItemCategory::Weapon),
            armor: parse(&record.armor, ItemCategory::Armor),
            head: parse(&record.head, ItemCategory::Armor),
            shoes: parse(&record.shoes, ItemCategory::Armor),
            cape: parse(&record.cape, ItemCategory::Accessory),
            bag: parse(&record.bag, ItemCategory::Accessory),
            potion: parse(&record.potion, ItemCategory::Accessory),
            food: parse(&record.food, ItemCategory::Accessory),
        }
    }

    /// All nine slots with whatever they hold, in fixed slot order.
    pub fn slots(&self) -> [(Slot, Option<&Item>); 9] {
        [
            (Slot::MainHand, self.main_hand.as_ref()),
            (Slot::OffHand, self.off_hand.as_ref()),
            (Slot::Armor, self.armor.as_ref()),
            (Slot::Head, self.head.as_ref()),
            (Slot::Shoes, self.shoes.as_ref()),
            (Slot::Cape, self.cape.as_ref()),
            (Slot::Bag, self.bag.as_ref()),
            (Slot::Potion, self.potion.as_ref()),
            (Slot::Food, self.food.as_ref()),
        ]
    }

    /// Fill empty slots from a later-observed snapshot of the same combatant.
    /// A slot that already holds an item is never overwritten.
    pub fn merge(&mut self, other: &Equipment) {
        fn fill(slot: &mut Option<Item>, other: &Option<Item>) {
            if slot.is_none() {
                if let Some(item) = other {
                    *slot = Some(item.clone());
                }
            }
        }
        fill(&mut self.main_hand, &other.main_hand);
        fill(&mut self.off_hand, &other.off_hand);
        fill(&mut self.armor, &other.armor);
        fill(&mut self.head, &other.head);
        fill(&mut self.shoes, &other.shoes);
        fill(&mut self.cape, &other.cape);
        fill(&mut self.bag, &other.bag);
        fill(&mut self.potion, &other.potion);
        fill(&mut self.food, &other.food);
    }

    /// Maximum average item power this loadout could reach. A two-handed
    /// main-hand with an empty off-hand counts its ceiling twice; the total
    /// is divided over the six scored slots and truncated toward zero.
    pub fn max_average_item_power(&self, ip_cap: f64, softcap_percent: i32) -> i32 {
        let contributing = [
            &self.head,
            &self.armor,
            &self.shoes,
            &self.main_hand,
            &self.off_hand,
            &self.cape,
        ];
        let mut total: f64 = contributing
            .iter()
            .filter_map(|slot| slot.as_ref())
            .map(|item| item.max_item_power(ip_cap, softcap_percent))
            .sum();

        if self.off_hand.is_none() {
            if let Some(main_hand) = &self.main_hand {
                total += main_hand.max_item_power(ip_cap, softcap_percent);
            }
        }

        (total / SCORED_SLOTS) as i32
    }
}
