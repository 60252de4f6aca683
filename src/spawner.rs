use std::rc::Rc;

use log::{debug, info};
use rand::Rng;

use crate::atlas::{Sequence, SpriteAtlas};
use crate::constants::ROCK_SEQUENCE;
use crate::entities::{Rock, RockSize, Ship, masks_collide};
use crate::error::{LookupError, SpawnPlacementFailed};
use crate::settings::Settings;
use crate::timer::{SharedClock, Timer};
use crate::types::Rect;

/// The live rocks plus the timer that feeds new big rocks in.
pub struct RockField {
    rocks: Vec<Rock>,
    frames: Rc<Sequence>,
    spawn_timer: Timer,
    playground: Rect,
    max_big_rocks: usize,
    spawn_margin: f64,
    max_spawn_attempts: u32,
}

impl RockField {
    pub fn new(atlas: &SpriteAtlas, settings: &Settings, clock: SharedClock) -> Result<Self, LookupError> {
        let frames = atlas.sequence(ROCK_SEQUENCE)?;
        // Big rocks are the only tier spawned here
        frames.frame(*RockSize::Big.frames().start())?;
        Ok(RockField {
            rocks: Vec::with_capacity(settings.max_big_rocks),
            frames,
            spawn_timer: Timer::new(settings.rock_spawn_interval_ms, true, clock),
            playground: settings.playground(),
            max_big_rocks: settings.max_big_rocks,
            spawn_margin: settings.spawn_margin,
            max_spawn_attempts: settings.max_spawn_attempts,
        })
    }

    /// Adds one big rock if the spawn period has run out and the field is
    /// below its cap. The rock starts clear of the ship's rectangle.
    ///
    /// Returns whether a rock was added. If no clear spot turns up within the
    /// attempt limit nothing is added and the next period tries again.
    pub fn maybe_spawn(&mut self, ship: &Ship, rng: &mut impl Rng) -> Result<bool, SpawnPlacementFailed> {
        if !self.spawn_timer.is_elapsed() || self.rocks.len() >= self.max_big_rocks {
            return Ok(false);
        }

        let mut rock = match Rock::new(RockSize::Big, &self.frames, rng) {
            Ok(rock) => rock,
            // Checked in `new`
            Err(err) => unreachable!("{err}"),
        };
        let ship_rect = ship.rect();
        for attempt in 1..=self.max_spawn_attempts {
            rock.place_randomly(&self.playground, self.spawn_margin, rng);
            if !rock.rect().intersects(&ship_rect) {
                debug!(
                    "Spawned rock #{} at ({:.1}, {:.1}) heading {:.1} after {} attempt(s)",
                    self.rocks.len() + 1,
                    rock.body.position.x,
                    rock.body.position.y,
                    rock.heading(),
                    attempt
                );
                self.rocks.push(rock);
                return Ok(true);
            }
        }
        Err(SpawnPlacementFailed { attempts: self.max_spawn_attempts, ship: ship_rect })
    }

    pub fn advance_all(&mut self) {
        for rock in &mut self.rocks {
            rock.update(&self.playground);
        }
    }

    /// Indices of rocks whose shape touches the ship's current frame.
    pub fn collisions_with(&self, ship: &Ship) -> Vec<usize> {
        let ship_rect = ship.rect();
        let ship_mask = ship.sprite().mask();
        self.rocks
            .iter()
            .enumerate()
            .filter(|(_, rock)| masks_collide(&ship_rect, ship_mask, &rock.rect(), rock.sprite().mask()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn clear(&mut self) {
        info!("Clearing {} rocks", self.rocks.len());
        self.rocks.clear();
    }

    pub fn rocks(&self) -> &[Rock] {
        &self.rocks
    }

    pub fn len(&self) -> usize {
        self.rocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::tests::game_atlas;
    use crate::entities::{ShipCommand, ShipMode};
    use crate::timer::ManualClock;
    use crate::types::Vector2D;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn field(settings: &Settings) -> (RockField, Ship, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(0));
        let atlas = game_atlas();
        let field = RockField::new(&atlas, settings, clock.clone()).unwrap();
        let ship = Ship::new(&atlas, settings, clock.clone()).unwrap();
        (field, ship, clock)
    }

    #[test]
    fn test_spawn_waits_for_timer() {
        let settings = Settings::default();
        let (mut field, ship, clock) = field(&settings);
        let mut rng = StdRng::seed_from_u64(1);
        clock.set(300);
        assert!(!field.maybe_spawn(&ship, &mut rng).unwrap());
        clock.set(301);
        assert!(field.maybe_spawn(&ship, &mut rng).unwrap());
        assert!(!field.maybe_spawn(&ship, &mut rng).unwrap());
        assert_eq!(field.len(), 1);
        assert_eq!(field.rocks()[0].size, RockSize::Big);
        assert_eq!(field.rocks()[0].frame_index(), 0);
    }

    #[test]
    fn test_population_is_capped() {
        let settings = Settings { max_big_rocks: 5, ..Settings::default() };
        let (mut field, ship, clock) = field(&settings);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            clock.advance(301);
            field.maybe_spawn(&ship, &mut rng).unwrap();
            assert!(field.len() <= 5);
        }
        assert_eq!(field.len(), 5);
    }

    #[test]
    fn test_spawned_rocks_clear_the_ship() {
        // A small playground makes overlap with the ship likely on the first draw
        let settings = Settings {
            window_width: 160,
            window_height: 170,
            max_big_rocks: 1,
            ..Settings::default()
        };
        for seed in 0..200 {
            let (mut field, ship, clock) = field(&settings);
            let mut rng = StdRng::seed_from_u64(seed);
            clock.advance(301);
            assert!(field.maybe_spawn(&ship, &mut rng).unwrap());
            assert!(!field.rocks()[0].rect().intersects(&ship.rect()), "seed {seed}");
        }
    }

    #[test]
    fn test_placement_failure_is_bounded() {
        // Playground so small every candidate spot overlaps the ship
        let settings = Settings {
            window_width: 60,
            window_height: 110,
            max_spawn_attempts: 25,
            ..Settings::default()
        };
        let (mut field, ship, clock) = field(&settings);
        let mut rng = StdRng::seed_from_u64(4);
        clock.advance(301);
        let err = field.maybe_spawn(&ship, &mut rng).unwrap_err();
        assert_eq!(err.attempts, 25);
        assert_eq!(err.ship, ship.rect());
        assert!(field.is_empty());
    }

    #[test]
    fn test_advance_all_moves_every_rock() {
        let settings = Settings::default();
        let (mut field, ship, clock) = field(&settings);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..3 {
            clock.advance(301);
            field.maybe_spawn(&ship, &mut rng).unwrap();
        }
        let before: Vec<Vector2D> = field.rocks().iter().map(|r| r.body.position).collect();
        field.advance_all();
        for (rock, old) in field.rocks().iter().zip(before) {
            let moved = old.add(rock.body.velocity);
            let p = rock.body.position;
            assert!((p.x - moved.x.rem_euclid(1200.0)).abs() < 1e-9);
            assert!((p.y - moved.y.rem_euclid(650.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_collisions_with_ship() {
        let settings = Settings::default();
        let (mut field, mut ship, clock) = field(&settings);
        let mut rng = StdRng::seed_from_u64(9);
        clock.advance(301);
        field.maybe_spawn(&ship, &mut rng).unwrap();
        assert!(field.collisions_with(&ship).is_empty());

        ship.body.position = field.rocks()[0].body.position;
        ship.apply(ShipCommand::SetMode(ShipMode::Accelerating), &settings.playground());
        assert_eq!(field.collisions_with(&ship), vec![0]);

        field.clear();
        assert!(field.collisions_with(&ship).is_empty());
    }
}
