use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;

use crate::animation::Animation;
use crate::atlas::SpriteAtlas;
use crate::constants::BACKGROUND_SEQUENCE;
use crate::entities::{Ship, ShipCommand};
use crate::error::GameError;
use crate::input::{Control, InputEvent, InputSource};
use crate::rendering::{DrawItem, Frame, Hud, Layer, Renderer};
use crate::settings::Settings;
use crate::spawner::RockField;
use crate::timer::{ManualClock, SharedClock};
use crate::types::Rect;

/// Waits out the remainder of a tick.
pub trait FramePacer {
    fn wait(&mut self);
}

/// Sleeps so that consecutive `wait` calls are one tick apart.
pub struct FixedRate {
    tick: Duration,
    last: Instant,
}

impl FixedRate {
    pub fn new(fps: u32) -> Self {
        FixedRate {
            tick: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            last: Instant::now(),
        }
    }
}

impl FramePacer for FixedRate {
    fn wait(&mut self) {
        let elapsed = self.last.elapsed();
        if elapsed < self.tick {
            thread::sleep(self.tick - elapsed);
        }
        self.last = Instant::now();
    }
}

/// Runs ticks back to back.
pub struct Unpaced;

impl FramePacer for Unpaced {
    fn wait(&mut self) {}
}

/// Advances a manual clock by a fixed step per tick instead of sleeping, so
/// headless runs replay identically.
pub struct SimulatedTime {
    clock: Rc<ManualClock>,
    step_ms: u64,
}

impl SimulatedTime {
    pub fn new(clock: Rc<ManualClock>, fps: u32) -> Self {
        SimulatedTime { clock, step_ms: (1000 / fps.max(1)) as u64 }
    }
}

impl FramePacer for SimulatedTime {
    fn wait(&mut self) {
        self.clock.advance(self.step_ms);
    }
}

pub struct Game {
    settings: Settings,
    playground: Rect,
    ship: Ship,
    rocks: RockField,
    background: Option<Animation>,
    rng: StdRng,
    running: bool,
    tick_count: u64,
    max_ticks: Option<u64>,
}

impl Game {
    pub fn new(settings: Settings, atlas: Rc<SpriteAtlas>, clock: SharedClock, rng: StdRng) -> Result<Self, GameError> {
        settings.validate()?;
        let ship = Ship::new(&atlas, &settings, clock.clone())?;
        let rocks = RockField::new(&atlas, &settings, clock.clone())?;
        let background = if atlas.contains(BACKGROUND_SEQUENCE) {
            let frames = atlas.sequence(BACKGROUND_SEQUENCE)?;
            Some(Animation::new(frames, true, settings.background_frame_ms, clock)?)
        } else {
            info!("No {:?} sequence, drawing without a background", BACKGROUND_SEQUENCE);
            None
        };
        info!(
            "Game ready: playground {:?}, {} fps, up to {} rocks every {} ms",
            settings.playground(),
            settings.fps,
            settings.max_big_rocks,
            settings.rock_spawn_interval_ms
        );

        Ok(Game {
            playground: settings.playground(),
            settings,
            ship,
            rocks,
            background,
            rng,
            running: true,
            tick_count: 0,
            max_ticks: None,
        })
    }

    /// Stops the loop after this many ticks even without a quit event.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Runs until quit and returns the number of ticks executed.
    pub fn run(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn Renderer,
        pacer: &mut dyn FramePacer,
    ) -> Result<u64, GameError> {
        info!("Game loop started");
        while self.running && self.max_ticks.is_none_or(|max| self.tick_count < max) {
            let events = input.poll(self.tick_count)?;
            self.tick(&events);
            renderer.draw(&self.frame())?;
            pacer.wait();
        }
        info!("Game loop ended after {} ticks", self.tick_count);
        Ok(self.tick_count)
    }

    /// One tick: apply the events, then move everything if still running.
    pub fn tick(&mut self, events: &[InputEvent]) {
        self.tick_count += 1;
        for event in events {
            self.handle_event(*event);
        }
        if !self.running {
            return;
        }

        match self.rocks.maybe_spawn(&self.ship, &mut self.rng) {
            Ok(true) => debug!("Tick {}: {} rocks", self.tick_count, self.rocks.len()),
            Ok(false) => {}
            Err(err) => warn!("Tick {}: skipping rock spawn: {}", self.tick_count, err),
        }
        self.ship.apply(ShipCommand::Advance, &self.playground);
        self.rocks.advance_all();
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event.to_control() {
            Some(Control::Quit) => {
                info!("Quit requested at tick {}", self.tick_count);
                self.running = false;
            }
            Some(Control::Ship(command)) if self.running => self.ship.apply(command, &self.playground),
            Some(Control::Ship(_)) | None => {}
        }
    }

    /// Draw list for the current state.
    pub fn frame(&mut self) -> Frame<'_> {
        let window = self.settings.window();
        let background = self.background.as_mut().map(|animation| DrawItem {
            sprite: animation.next(),
            dest: window,
            layer: Layer::Background,
        });
        let ship = DrawItem {
            sprite: self.ship.sprite(),
            dest: self.ship.rect(),
            layer: Layer::Ship { heading: self.ship.heading(), mode: self.ship.mode() },
        };
        let rocks = self
            .rocks
            .rocks()
            .iter()
            .map(|rock| DrawItem { sprite: rock.sprite(), dest: rock.rect(), layer: Layer::Rock(rock.size) })
            .collect();
        let velocity = self.ship.velocity();
        Frame {
            background,
            ship,
            rocks,
            hud: Hud {
                tick: self.tick_count,
                rocks: self.rocks.len(),
                heading: self.ship.heading(),
                speed: (velocity.x, velocity.y),
            },
        }
    }

    /// Rocks currently touching the ship, by index into [`Game::rocks`].
    pub fn ship_collisions(&self) -> Vec<usize> {
        self.rocks.collisions_with(&self.ship)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn rocks(&self) -> &RockField {
        &self.rocks
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{ColorKey, SpriteSheet};
    use crate::entities::ShipMode;
    use crate::entities::tests::game_atlas;
    use crate::input::{Key, ScriptedInput};
    use crate::rendering::{NullRenderer, OutputTarget, ScreenBuffer, TerminalRenderer};
    use crate::timer::Clock;
    use crate::types::Vector2D;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder {
        ships: Vec<Rect>,
        rock_counts: Vec<usize>,
        backgrounds: usize,
    }

    impl Renderer for Recorder {
        fn draw(&mut self, frame: &Frame) -> std::io::Result<()> {
            self.ships.push(frame.ship.dest);
            self.rock_counts.push(frame.rocks.len());
            self.backgrounds += frame.background.is_some() as usize;
            Ok(())
        }
    }

    fn new_game(settings: Settings) -> (Game, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(0));
        let game = Game::new(settings, game_atlas(), clock.clone(), StdRng::seed_from_u64(42)).unwrap();
        (game, clock)
    }

    #[test]
    fn test_quit_on_first_tick_stops_after_one_tick() {
        let (mut game, clock) = new_game(Settings::default());
        clock.set(10_000);
        let start = game.ship().position();
        let mut input = ScriptedInput::from_pairs([(0, InputEvent::Quit), (1, InputEvent::KeyDown(Key::Up))]);
        let mut renderer = NullRenderer::default();

        let ticks = game.run(&mut input, &mut renderer, &mut Unpaced).unwrap();

        assert_eq!(ticks, 1);
        assert_eq!(renderer.frames, 1);
        assert!(!game.is_running());
        assert_eq!(game.ship().position(), start);
        assert!(game.rocks().is_empty());
        assert_eq!(input.remaining(), 1);
    }

    #[test]
    fn test_escape_quits_and_later_events_are_ignored() {
        let (mut game, _) = new_game(Settings::default());
        game.tick(&[InputEvent::KeyDown(Key::Escape), InputEvent::KeyDown(Key::Left)]);
        assert!(!game.is_running());
        assert_eq!(game.ship().heading(), 0.0);
        let position = game.ship().position();
        game.tick(&[]);
        assert_eq!(game.ship().position(), position);
    }

    #[test]
    fn test_scripted_session() {
        let (mut game, clock) = new_game(Settings::default());
        let mut input = ScriptedInput::from_pairs([
            (2, InputEvent::KeyDown(Key::Left)),
            (3, InputEvent::KeyDown(Key::Up)),
            (40, InputEvent::KeyUp(Key::Up)),
            (100, InputEvent::Quit),
        ]);
        let mut recorder = Recorder::default();
        let ticks = game.run(&mut input, &mut recorder, &mut SimulatedTime::new(clock.clone(), 60)).unwrap();

        assert_eq!(ticks, 101);
        assert_eq!(recorder.ships.len(), 101);
        assert_eq!(recorder.backgrounds, 0);
        assert_eq!(game.ship().heading(), 22.5);
        assert_eq!(game.ship().mode(), ShipMode::Flying);
        // Heading 22.5 thrusts up and to the left
        let v = game.ship().velocity();
        assert!(v.x < 0.0 && v.y < 0.0, "{v:?}");
        // 101 ticks of 16 ms leave room for five spawns at 300 ms
        assert_eq!(game.rocks().len(), 5);
        assert!(recorder.rock_counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(clock.now_ms(), 101 * 16);
    }

    #[test]
    fn test_max_ticks_bounds_the_loop() {
        let (game, _) = new_game(Settings::default());
        let mut game = game.with_max_ticks(Some(12));
        let mut input = ScriptedInput::new(HashMap::new());
        let ticks = game.run(&mut input, &mut NullRenderer::default(), &mut Unpaced).unwrap();
        assert_eq!(ticks, 12);
        assert!(game.is_running());
    }

    #[test]
    fn test_rocks_and_ship_stay_in_playground() {
        let (mut game, clock) = new_game(Settings::default());
        game.tick(&[InputEvent::KeyDown(Key::Right), InputEvent::KeyDown(Key::Up)]);
        for _ in 0..3_000 {
            clock.advance(17);
            game.tick(&[]);
            let p = game.ship().position();
            assert!((0.0..1200.0).contains(&p.x) && (0.0..650.0).contains(&p.y), "{p:?}");
            for rock in game.rocks().rocks() {
                let r = rock.body.position;
                assert!((0.0..1200.0).contains(&r.x) && (0.0..650.0).contains(&r.y), "{r:?}");
            }
            let v = game.ship().velocity();
            assert!(v.x.abs() < 10.0 && v.y.abs() < 10.0);
        }
        assert!(game.rocks().len() <= game.settings().max_big_rocks);
    }

    #[test]
    fn test_frame_lists_ship_then_rocks() {
        let (mut game, clock) = new_game(Settings::default());
        clock.advance(301);
        game.tick(&[]);
        let ship_rect = game.ship().rect();
        let frame = game.frame();
        assert!(frame.background.is_none());
        assert_eq!(frame.ship.dest, ship_rect);
        assert_eq!(frame.rocks.len(), 1);
        assert_eq!(frame.hud.rocks, 1);
        assert_eq!(frame.hud.tick, 1);
    }

    #[test]
    fn test_ship_collisions_query() {
        let (mut game, clock) = new_game(Settings::default());
        clock.advance(301);
        game.tick(&[]);
        assert!(game.ship_collisions().is_empty());
        let rock_at = game.rocks().rocks()[0].body.position;
        game.ship.body.position = rock_at;
        game.ship.body.velocity = Vector2D::ZERO;
        assert_eq!(game.ship_collisions(), vec![0]);
    }

    #[test]
    fn test_background_animation_is_drawn_when_present() {
        let sheet = SpriteSheet::filled(200, 100, [90, 90, 90, 255], ColorKey::None);
        let json = r#"{
            "ships_flying": {"0": [0, 0, 20, 20]},
            "ships_acc": {"0": [20, 0, 20, 20]},
            "rocks": {"0": [40, 0, 40, 40]},
            "background": {"0": [0, 50, 100, 50], "1": [100, 50, 100, 50]}
        }"#;
        let atlas = Rc::new(SpriteAtlas::from_manifest_str(json, sheet).unwrap());
        let clock = Rc::new(ManualClock::new(0));
        let mut game = Game::new(Settings::default(), atlas, clock.clone(), StdRng::seed_from_u64(1)).unwrap();

        let first = game.frame().background.unwrap().sprite.rect();
        clock.advance(501);
        game.frame();
        clock.advance(501);
        let third = game.frame().background.unwrap();
        assert_eq!(first.left, 0);
        assert_eq!(third.sprite.rect().left, 100);
        assert_eq!(third.dest, Rect::new(0, 0, 1200, 700));
    }

    #[test]
    fn test_invalid_settings_fail_startup() {
        let clock = Rc::new(ManualClock::new(0));
        let settings = Settings { fps: 0, ..Settings::default() };
        let err = Game::new(settings, game_atlas(), clock, StdRng::seed_from_u64(0)).err().unwrap();
        assert!(matches!(err, GameError::Settings(_)));
    }

    #[test]
    fn test_missing_rocks_fail_startup() {
        let sheet = SpriteSheet::filled(40, 20, [1, 1, 1, 255], ColorKey::None);
        let json = r#"{"ships_flying": {"0": [0, 0, 20, 20]}, "ships_acc": {"0": [20, 0, 20, 20]}}"#;
        let atlas = Rc::new(SpriteAtlas::from_manifest_str(json, sheet).unwrap());
        let clock = Rc::new(ManualClock::new(0));
        let err = Game::new(Settings::default(), atlas, clock, StdRng::seed_from_u64(0)).err().unwrap();
        assert!(matches!(err, GameError::Lookup(_)));
    }

    #[test]
    fn test_end_to_end_through_terminal_renderer() {
        let (mut game, clock) = new_game(Settings::default());
        // 10x10 px per cell
        let target = OutputTarget::ScreenBuffer(ScreenBuffer::new(120, 71));
        let mut renderer = TerminalRenderer::new(target, 120, 71, game.settings().window());
        let mut input = ScriptedInput::from_pairs([(30, InputEvent::KeyDown(Key::Escape))]);
        let ticks = game.run(&mut input, &mut renderer, &mut SimulatedTime::new(clock, 60)).unwrap();
        assert_eq!(ticks, 31);

        let OutputTarget::ScreenBuffer(sb) = &renderer.target else {
            panic!("expected a screen buffer");
        };
        assert!(sb.row(70).starts_with("Tick: 31"));
        assert!(sb.count('@') >= 1);
        let ship = game.ship().rect();
        let covered = game.rocks().rocks().iter().any(|rock| rock.rect().intersects(&ship));
        assert!(sb.count('^') >= 1 || covered);
    }
}
