//! Scorecard rendering: equipment panels and battle report composition.
//!
//! Everything is image composition from cached item icons. Player names and
//! power figures travel in the delivery message next to the image, so the
//! canvas carries no text.

use crate::battle::Battle;
use crate::config::WatcherConfig;
use crate::equipment::{Equipment, Slot};
use crate::error::Result;
use crate::feed::icon_cache_path;
use image::{imageops, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Item icons come out of the renderer at this edge length.
const CELL_SIZE: u32 = 217;
/// A 3x3 grid of icon cells per player.
const PANEL_SIZE: u32 = CELL_SIZE * 3;

const SIDE_PADDING: u32 = 100;
const TOP_BOTTOM_PADDING: u32 = 50;
const SPACING: u32 = 30;
const MIDDLE_GAP: u32 = 200;

const BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);
/// Victims keep this fraction of their color.
const DEAD_PLAYER_SATURATION: f32 = 0.2;

/// Grid cell of each slot inside the 3x3 panel.
fn slot_cell(slot: Slot) -> (u32, u32) {
    match slot {
        Slot::Bag => (0, 0),
        Slot::Head => (1, 0),
        Slot::Cape => (2, 0),
        Slot::MainHand => (0, 1),
        Slot::Armor => (1, 1),
        Slot::OffHand => (2, 1),
        Slot::Potion => (0, 2),
        Slot::Shoes => (1, 2),
        Slot::Food => (2, 2),
    }
}

pub struct Renderer {
    item_image_dir: PathBuf,
    report_dir: PathBuf,
}

impl Renderer {
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        let item_image_dir = config.item_image_folder();
        let report_dir = config.battle_report_folder();
        std::fs::create_dir_all(&item_image_dir)?;
        std::fs::create_dir_all(&report_dir)?;
        Ok(Self {
            item_image_dir,
            report_dir,
        })
    }

    /// Compose one player's 3x3 equipment panel from cached icons. Missing
    /// icons leave their cell on the background.
    pub fn equipment_panel(&self, equipment: &Equipment) -> RgbaImage {
        let mut panel = RgbaImage::from_pixel(PANEL_SIZE, PANEL_SIZE, BACKGROUND);

        for (slot, item) in equipment.slots() {
            let Some(item) = item else { continue };
            let icon_path = icon_cache_path(&self.item_image_dir, item);
            let icon = match image::open(&icon_path) {
                Ok(icon) => icon.to_rgba8(),
                Err(e) => {
                    warn!("no icon for {} ({}), leaving cell blank", item.type_id, e);
                    continue;
                }
            };
            let (col, row) = slot_cell(slot);
            imageops::overlay(
                &mut panel,
                &icon,
                (col * CELL_SIZE) as i64,
                (row * CELL_SIZE) as i64,
            );
        }

        panel
    }

    /// Compose the battle scorecard: the two display-ordered teams as two
    /// rows of equipment panels, victims desaturated, and save it as one PNG.
    pub fn battle_report(&self, battle: &Battle) -> Result<PathBuf> {
        let columns = battle.team_a_ids.len().max(battle.team_b_ids.len()).max(1) as u32;
        let width = 2 * SIDE_PADDING + columns * PANEL_SIZE + (columns - 1) * SPACING;
        let height = 2 * TOP_BOTTOM_PADDING + 2 * PANEL_SIZE + MIDDLE_GAP;
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

        let team_rows = [
            (TOP_BOTTOM_PADDING, &battle.team_a_ids),
            (TOP_BOTTOM_PADDING + PANEL_SIZE + MIDDLE_GAP, &battle.team_b_ids),
        ];
        for (y, team_ids) in team_rows {
            for (i, player_id) in team_ids.iter().enumerate() {
                let Some(player) = battle.player(player_id) else {
                    continue;
                };
                let mut panel = self.equipment_panel(&player.equipment);
                if battle.victim_ids.contains(player_id) {
                    desaturate(&mut panel, DEAD_PLAYER_SATURATION);
                }
                let x = SIDE_PADDING + i as u32 * (PANEL_SIZE + SPACING);
                imageops::overlay(&mut canvas, &panel, x as i64, y as i64);
            }
        }

        let path = self.report_dir.join(format!("battle_report_{}.png", battle.id));
        canvas.save(&path)?;
        debug!("rendered scorecard {:?}", path);
        Ok(path)
    }
}

/// Blend every pixel toward its luma, keeping `saturation` of the original
/// color. 1.0 leaves the image untouched, 0.0 is full grayscale.
fn desaturate(image: &mut RgbaImage, saturation: f32) {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let blend = |c: u8| (luma + (c as f32 - luma) * saturation).round() as u8;
        *pixel = Rgba([blend(r), blend(g), blend(b), a]);
    }
}

/// Delete every PNG directly inside `dir`. Returns how many were removed.
pub fn clear_directory(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "png") && path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
