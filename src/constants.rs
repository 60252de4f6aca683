// --- Game Constants ---
pub const WINDOW_WIDTH: u32 = 1200;
pub const WINDOW_HEIGHT: u32 = 700;
pub const HUD_MARGIN: u32 = 50; // Bottom strip reserved for the HUD, outside the playground
pub const FPS: u32 = 60;

pub const SHIP_D_ANGLE: f64 = 22.5; // Degrees per heading step
pub const SHIP_THRUST_INTERVAL_MS: u64 = 100;
pub const SHIP_MAX_AXIS_SPEED: f64 = 10.0; // Exclusive bound on |vx| and |vy|
pub const SHIP_FLYING_SEQUENCE: &str = "ships_flying";
pub const SHIP_ACCELERATING_SEQUENCE: &str = "ships_acc";

pub const ROCK_SEQUENCE: &str = "rocks";
pub const MAX_BIG_ROCKS: usize = 5;
pub const ROCK_SPAWN_INTERVAL_MS: u64 = 300;
pub const ROCK_SPAWN_MARGIN: f64 = 5.0;
pub const MAX_SPAWN_ATTEMPTS: u32 = 100;

pub const SCORE_TINY_ROCK: u32 = 20;

pub const BACKGROUND_SEQUENCE: &str = "background";
pub const BACKGROUND_FRAME_MS: u64 = 500;

// Alpha above this counts as opaque when the sheet has no colorkey
pub const MASK_ALPHA_THRESHOLD: u8 = 127;
