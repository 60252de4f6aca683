use log::info;

use crate::atlas::{ColorKey, Rgba, SpriteSheet};
use crate::constants::SHIP_D_ANGLE;

// --- Built-in sheet layout, mirrored by assets/sprites.json ---
pub const SHEET_WIDTH: u32 = 512;
pub const SHEET_HEIGHT: u32 = 198;
pub const SHIP_CELL: u32 = 32;
pub const SHIP_FRAMES: u32 = 16;
pub const ROCK_ROW_TOP: u32 = 64;
pub const ROCK_SIZES: [u32; 10] = [64, 48, 48, 32, 32, 32, 16, 16, 16, 16];
pub const BACKGROUND_TOP: u32 = 128;
pub const BACKGROUND_WIDTH: u32 = 120;
pub const BACKGROUND_HEIGHT: u32 = 70;

const KEY: Rgba = [0, 0, 0, 255];
const HULL: Rgba = [220, 220, 255, 255];
const FLAME: Rgba = [255, 160, 40, 255];
const ROCK: Rgba = [150, 130, 110, 255];
const STAR: Rgba = [255, 255, 255, 255];

/// Paints the ship, rock and background frames into one black-keyed sheet.
pub fn paint_sheet() -> SpriteSheet {
    let mut sheet = SpriteSheet::filled(SHEET_WIDTH, SHEET_HEIGHT, KEY, ColorKey::Rgb(0, 0, 0));
    for i in 0..SHIP_FRAMES {
        let heading = i as f64 * SHIP_D_ANGLE;
        paint_ship(&mut sheet, i * SHIP_CELL, 0, heading, false);
        paint_ship(&mut sheet, i * SHIP_CELL, SHIP_CELL, heading, true);
    }
    let mut left = 0;
    for (i, size) in ROCK_SIZES.iter().enumerate() {
        paint_rock(&mut sheet, left, ROCK_ROW_TOP, *size, i as u32);
        left += size;
    }
    for i in 0..2 {
        paint_stars(&mut sheet, i * BACKGROUND_WIDTH, BACKGROUND_TOP, i);
    }
    info!("Painted {}x{} sprite sheet", SHEET_WIDTH, SHEET_HEIGHT);
    sheet
}

/// Nose points along the heading, counter-clockwise from straight up.
fn paint_ship(sheet: &mut SpriteSheet, left: u32, top: u32, heading: f64, thrusting: bool) {
    let rad = heading.to_radians();
    let forward = (-rad.sin(), -rad.cos());
    let side = (rad.cos(), -rad.sin());
    let half = SHIP_CELL as f64 / 2.0;
    for y in 0..SHIP_CELL {
        for x in 0..SHIP_CELL {
            let px = x as f64 + 0.5 - half;
            let py = y as f64 + 0.5 - half;
            let f = px * forward.0 + py * forward.1;
            let s = (px * side.0 + py * side.1).abs();
            let color = if (-12.0..=14.0).contains(&f) && s <= 10.0 * (14.0 - f) / 26.0 {
                HULL
            } else if thrusting && (-18.0..-12.0).contains(&f) && s <= (f + 18.0) * 2.0 / 3.0 {
                FLAME
            } else {
                continue;
            };
            sheet.set_pixel(left + x, top + y, color);
        }
    }
}

fn paint_rock(sheet: &mut SpriteSheet, left: u32, top: u32, size: u32, seed: u32) {
    let half = size as f64 / 2.0;
    let radius = half - 1.0;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - half;
            let dy = y as f64 + 0.5 - half;
            // Lumpy outline
            let angle = dy.atan2(dx);
            let bump = 1.0 - 0.12 * ((angle * 5.0 + seed as f64).sin()).abs();
            if dx.hypot(dy) <= radius * bump {
                sheet.set_pixel(left + x, top + y, ROCK);
            }
        }
    }
}

fn paint_stars(sheet: &mut SpriteSheet, left: u32, top: u32, phase: u32) {
    for y in 0..BACKGROUND_HEIGHT {
        for x in 0..BACKGROUND_WIDTH {
            let hash = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)) % 97;
            // Half the stars swap between the two frames
            if hash == 0 || (hash == 1 + phase) {
                sheet.set_pixel(left + x, top + y, STAR);
            }
        }
    }
}
