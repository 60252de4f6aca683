use std::env;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size, supports_keyboard_enhancement};
use log::{error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use rockfield::artwork::paint_sheet;
use rockfield::error::GameError;
use rockfield::game::{FixedRate, Game, SimulatedTime};
use rockfield::input::{InputEvent, Key, ScriptedInput};
use rockfield::rendering::{OutputTarget, ScreenBuffer, TerminalRenderer};
use rockfield::settings::Settings;
use rockfield::terminal_io::CrosstermInput;
use rockfield::timer::{ManualClock, MonotonicClock, SharedClock};
use rockfield::SpriteAtlas;

const DEFAULT_MANIFEST: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sprites.json");

struct DebugRun {
    width: u16,
    height: u16,
    max_ticks: Option<u64>,
}

struct Options {
    debug: Option<DebugRun>,
    settings_path: Option<String>,
    manifest_path: String,
    paced: bool,
}

// rockfield [--settings <file>] [--manifest <file>] [--debug [cols rows [max_ticks]]] [--realtime]
fn parse_args(args: &[String]) -> Options {
    let mut options = Options { debug: None, settings_path: None, manifest_path: DEFAULT_MANIFEST.to_string(), paced: false };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" if i + 1 < args.len() => {
                options.settings_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--manifest" if i + 1 < args.len() => {
                options.manifest_path = args[i + 1].clone();
                i += 2;
            }
            "--realtime" => {
                options.paced = true;
                i += 1;
            }
            "--debug" => {
                let mut run = DebugRun { width: 80, height: 24, max_ticks: None };
                let numbers: Vec<u64> = args[i + 1..].iter().map_while(|a| a.parse::<u64>().ok()).take(3).collect();
                if numbers.len() >= 2 {
                    run.width = u16::try_from(numbers[0]).unwrap_or(80);
                    run.height = u16::try_from(numbers[1]).unwrap_or(24);
                }
                run.max_ticks = numbers.get(2).copied();
                i += 1 + numbers.len();
                options.debug = Some(run);
            }
            other => {
                warn!("Ignoring unknown argument {:?}", other);
                i += 1;
            }
        }
    }
    options
}

/// Keys pressed on a fixed schedule in debug runs.
fn debug_script() -> ScriptedInput {
    ScriptedInput::from_pairs([
        (1, InputEvent::KeyDown(Key::Up)),
        (2, InputEvent::KeyDown(Key::Right)),
        (4, InputEvent::KeyDown(Key::Left)),
        (5, InputEvent::KeyDown(Key::Left)),
        (40, InputEvent::KeyUp(Key::Up)),
        (90, InputEvent::KeyDown(Key::Escape)),
    ])
}

fn run_debug(settings: Settings, atlas: Rc<SpriteAtlas>, run: DebugRun, paced: bool) -> Result<(), GameError> {
    info!("Debug resolution set to {}x{}", run.width, run.height);
    let window = settings.window();
    let fps = settings.fps;
    let target = OutputTarget::ScreenBuffer(ScreenBuffer::new(run.width, run.height));
    let mut renderer = TerminalRenderer::new(target, run.width, run.height, window);
    let mut input = debug_script();

    let ticks = if paced {
        let clock: SharedClock = Rc::new(MonotonicClock::new());
        let mut game = Game::new(settings, atlas, clock, StdRng::from_entropy())?.with_max_ticks(run.max_ticks);
        game.run(&mut input, &mut renderer, &mut FixedRate::new(fps))?
    } else {
        // Simulated time keeps debug runs reproducible
        let clock = Rc::new(ManualClock::new(0));
        let mut game = Game::new(settings, atlas, clock.clone(), StdRng::seed_from_u64(0))?.with_max_ticks(run.max_ticks);
        let ticks = game.run(&mut input, &mut renderer, &mut SimulatedTime::new(clock, fps))?;
        if game.ship_collisions().is_empty() {
            info!("Ship ended the run untouched");
        }
        ticks
    };
    info!("Debug run finished after {} ticks", ticks);
    Ok(())
}

fn run_terminal(settings: Settings, atlas: Rc<SpriteAtlas>) -> Result<(), GameError> {
    info!("Attempting to enable raw mode.");
    enable_raw_mode().map_err(|e| { error!("Failed to enable raw mode: {}", e); e })?;
    let result = play_in_raw_mode(settings, atlas);
    disable_raw_mode().map_err(|e| { error!("Failed to disable raw mode on exit: {}", e); e })?;
    info!("Raw mode disabled.");
    result
}

fn play_in_raw_mode(settings: Settings, atlas: Rc<SpriteAtlas>) -> Result<(), GameError> {
    let (width, height) = size().map_err(|e| { error!("Failed to get terminal size: {}", e); e })?;
    info!("Terminal size: {}x{}", width, height);

    let mut target = OutputTarget::Stdout(io::stdout());
    let reports_release = supports_keyboard_enhancement().unwrap_or(false);
    if reports_release {
        target
            .execute_other_command(PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))
            .map_err(|e| { error!("Failed to enable key release events: {}", e); e })?;
    }
    target.execute_other_command(Hide).map_err(|e| { error!("Failed to hide cursor: {}", e); e })?;

    let fps = settings.fps;
    let window = settings.window();
    let mut renderer = TerminalRenderer::new(target, width, height, window);
    renderer.clear_screen().map_err(|e| { error!("Failed to clear screen manually: {}", e); e })?;

    let clock: SharedClock = Rc::new(MonotonicClock::new());
    let result = Game::new(settings, atlas, clock, StdRng::from_entropy()).and_then(|mut game| {
        let mut input = CrosstermInput::new(reports_release);
        game.run(&mut input, &mut renderer, &mut FixedRate::new(fps))
    });

    renderer.clear_screen().map_err(|e| { error!("Failed to clear screen on exit: {}", e); e })?;
    if reports_release {
        renderer
            .target
            .execute_other_command(PopKeyboardEnhancementFlags)
            .map_err(|e| { error!("Failed to restore keyboard flags: {}", e); e })?;
    }
    renderer.target.execute_other_command(Show).map_err(|e| { error!("Failed to show cursor on exit: {}", e); e })?;
    renderer.target.flush().map_err(|e| { error!("Failed to flush stdout on exit: {}", e); e })?;

    let ticks = result?;
    info!("Played {} ticks", ticks);
    Ok(())
}

fn main() -> Result<(), GameError> {
    simple_logging::log_to_file("rockfield.log", log::LevelFilter::Info)?;
    info!("Starting Rockfield application.");

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    let settings = match &options.settings_path {
        Some(path) => Settings::load(path).map_err(|e| { error!("Failed to load settings: {}", e); e })?,
        None => Settings::default(),
    };
    let atlas = SpriteAtlas::load(&options.manifest_path, paint_sheet())
        .map_err(|e| { error!("Failed to load sprite atlas: {}", e); e })?;
    let atlas = Rc::new(atlas);

    match options.debug {
        Some(run) => {
            info!("Debug mode enabled.");
            run_debug(settings, atlas, run, options.paced)?;
        }
        None => run_terminal(settings, atlas)?,
    }

    info!("Exiting application.");
    Ok(())
}
