use std::ops::RangeInclusive;
use std::rc::Rc;

use log::{debug, info};
use rand::Rng;

use crate::atlas::{Mask, Sequence, Sprite, SpriteAtlas};
use crate::constants::*;
use crate::error::LookupError;
use crate::settings::Settings;
use crate::timer::{SharedClock, Timer};
use crate::types::{Rect, Vector2D, wrap_coordinate, wrap_degrees};

// --- Motion model shared by the ship and the rocks ---
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vector2D, // Centre
    pub velocity: Vector2D,
    pub width: i32,
    pub height: i32,
}

impl Body {
    pub fn new(position: Vector2D, width: i32, height: i32) -> Self {
        Body { position, velocity: Vector2D::ZERO, width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::centered_at(self.position, self.width, self.height)
    }

    /// Moves by one tick of velocity, then wraps around the playground.
    pub fn update(&mut self, playground: &Rect) {
        self.position = self.position.add(self.velocity);
        self.wrap(playground);
    }

    // Each axis wraps on its own; leaving one edge re-enters at the opposite one.
    // The centre is what wraps, not the trailing edge, so a sprite crossing a
    // border jumps over while still half visible and the position never
    // leaves the playground.
    fn wrap(&mut self, playground: &Rect) {
        let left = playground.left as f64;
        let top = playground.top as f64;
        self.position.x = left + wrap_coordinate(self.position.x - left, playground.width as f64);
        self.position.y = top + wrap_coordinate(self.position.y - top, playground.height as f64);
    }
}

/// Shape-mask test between two placed sprites.
pub fn masks_collide(a_rect: &Rect, a_mask: &Mask, b_rect: &Rect, b_mask: &Mask) -> bool {
    a_rect.intersects(b_rect) && a_mask.overlaps(b_mask, (b_rect.left - a_rect.left, b_rect.top - a_rect.top))
}

// --- Ship controller ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShipMode {
    Flying,
    Accelerating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Left,  // Counter-clockwise, +1 step
    Right, // Clockwise, -1 step
}

impl Turn {
    pub fn sign(self) -> i32 {
        match self {
            Turn::Left => 1,
            Turn::Right => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShipCommand {
    Rotate(Turn),
    SetMode(ShipMode),
    Advance,
}

pub struct Ship {
    pub body: Body,
    heading: f64, // Degrees in [0, 360), 0 = nose up
    frame_index: usize,
    mode: ShipMode,
    d_angle: f64,
    flying: Rc<Sequence>,
    accelerating: Rc<Sequence>,
    thrust_timer: Timer,
}

impl Ship {
    pub fn new(atlas: &SpriteAtlas, settings: &Settings, clock: SharedClock) -> Result<Self, LookupError> {
        let flying = atlas.non_empty_sequence(SHIP_FLYING_SEQUENCE)?;
        let accelerating = atlas.non_empty_sequence(SHIP_ACCELERATING_SEQUENCE)?;
        let (width, height) = match flying.nth(0) {
            Some(frame) => (frame.width(), frame.height()),
            None => return Err(LookupError::EmptySequence(SHIP_FLYING_SEQUENCE.to_string())),
        };
        let playground = settings.playground();
        let body = Body::new(playground.center(), width, height);
        info!("Ship created at ({}, {}), {}x{}", body.position.x, body.position.y, width, height);

        Ok(Ship {
            body,
            heading: 0.0,
            frame_index: 0,
            mode: ShipMode::Flying,
            d_angle: settings.d_angle,
            flying,
            accelerating,
            thrust_timer: Timer::new(settings.ship_thrust_interval_ms, true, clock),
        })
    }

    pub fn apply(&mut self, command: ShipCommand, playground: &Rect) {
        match command {
            ShipCommand::Rotate(turn) => self.rotate(turn),
            ShipCommand::SetMode(mode) => self.set_mode(mode),
            ShipCommand::Advance => self.update(playground),
        }
    }

    fn set_mode(&mut self, mode: ShipMode) {
        if self.mode != mode {
            debug!("Ship mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    fn rotate(&mut self, turn: Turn) {
        let step = turn.sign();
        self.heading = wrap_degrees(self.heading + self.d_angle * step as f64);
        let len = self.sequence().len() as i64;
        self.frame_index = (self.frame_index as i64 + step as i64).rem_euclid(len) as usize;
    }

    fn update(&mut self, playground: &Rect) {
        if self.mode == ShipMode::Accelerating && self.thrust_timer.is_elapsed() {
            let candidate = self.body.velocity.add(Vector2D::from_heading(self.heading));
            // Over the cap the thrust is simply dropped
            if candidate.x.abs() < SHIP_MAX_AXIS_SPEED && candidate.y.abs() < SHIP_MAX_AXIS_SPEED {
                self.body.velocity = candidate;
            }
        }
        self.body.update(playground);
    }

    fn sequence(&self) -> &Sequence {
        match self.mode {
            ShipMode::Flying => &*self.flying,
            ShipMode::Accelerating => &*self.accelerating,
        }
    }

    /// Frame for the current mode and heading step.
    pub fn sprite(&self) -> &Sprite {
        let sequence = self.sequence();
        // Both sequences are non-empty, checked in `new`
        match sequence.nth(self.frame_index % sequence.len()) {
            Some(sprite) => sprite,
            None => unreachable!("ship sequence {:?} lost its frames", sequence.name()),
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn mode(&self) -> ShipMode {
        self.mode
    }

    pub fn velocity(&self) -> Vector2D {
        self.body.velocity
    }

    pub fn position(&self) -> Vector2D {
        self.body.position
    }
}

// --- Rocks ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RockSize {
    Big,
    Medium,
    Small,
    Tiny,
}

impl RockSize {
    pub fn speed(self) -> f64 {
        match self {
            RockSize::Big => -3.0,
            RockSize::Medium => -4.0,
            RockSize::Small => -4.0,
            RockSize::Tiny => -5.0,
        }
    }

    /// Frame indices of the rock sequence this tier draws from.
    pub fn frames(self) -> RangeInclusive<u32> {
        match self {
            RockSize::Big => 0..=0,
            RockSize::Medium => 1..=2,
            RockSize::Small => 3..=5,
            RockSize::Tiny => 6..=9,
        }
    }

    pub fn points(self) -> Option<u32> {
        match self {
            RockSize::Tiny => Some(SCORE_TINY_ROCK),
            _ => None,
        }
    }
}

pub struct Rock {
    pub body: Body,
    pub size: RockSize,
    heading: f64,
    frame_index: u32,
    sprite: Sprite,
}

impl Rock {
    /// Rock of the given tier with a random frame and heading, parked at the
    /// origin until placed.
    pub fn new(size: RockSize, rocks: &Sequence, rng: &mut impl Rng) -> Result<Self, LookupError> {
        let frame_index = rng.gen_range(size.frames());
        let sprite = rocks.frame(frame_index)?.clone();
        let heading: f64 = rng.gen_range(0.0..360.0);
        let radians = heading.to_radians();
        let mut body = Body::new(Vector2D::ZERO, sprite.width(), sprite.height());
        body.velocity = Vector2D::new(size.speed() * radians.sin(), size.speed() * radians.cos());
        Ok(Rock { body, size, heading, frame_index, sprite })
    }

    /// Moves the rock to a random spot at least `margin` pixels inside the playground.
    pub fn place_randomly(&mut self, playground: &Rect, margin: f64, rng: &mut impl Rng) {
        let x = random_inset(rng, playground.left as f64, playground.width as f64, self.body.width as f64 / 2.0 + margin);
        let y = random_inset(rng, playground.top as f64, playground.height as f64, self.body.height as f64 / 2.0 + margin);
        self.body.position = Vector2D::new(x, y);
    }

    pub fn update(&mut self, playground: &Rect) {
        self.body.update(playground);
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn points(&self) -> Option<u32> {
        self.size.points()
    }
}

// Uniform in [start + inset, start + extent - inset]; the midpoint if the
// sprite is too large for the playground.
fn random_inset(rng: &mut impl Rng, start: f64, extent: f64, inset: f64) -> f64 {
    let low = start + inset;
    let high = start + extent - inset;
    if low < high { rng.gen_range(low..=high) } else { start + extent / 2.0 }
}
