use std::io::{self, Write};

use crossterm::{cursor::MoveTo, execute};
use log::info;

use crate::atlas::Sprite;
use crate::entities::{RockSize, ShipMode};
use crate::types::Rect;

/// What a draw item is, for renderers that do not paint pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Layer {
    Background,
    Ship { heading: f64, mode: ShipMode },
    Rock(RockSize),
}

/// One sprite placed on screen. `dest` may differ in size from the sprite,
/// in which case the sprite is scaled to fit.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem<'a> {
    pub sprite: &'a Sprite,
    pub dest: Rect,
    pub layer: Layer,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hud {
    pub tick: u64,
    pub rocks: usize,
    pub heading: f64,
    pub speed: (f64, f64),
}

/// Everything visible in one tick, back to front.
#[derive(Debug)]
pub struct Frame<'a> {
    pub background: Option<DrawItem<'a>>,
    pub ship: DrawItem<'a>,
    pub rocks: Vec<DrawItem<'a>>,
    pub hud: Hud,
}

impl<'a> Frame<'a> {
    /// Background, then ship, then rocks.
    pub fn items(&self) -> impl Iterator<Item = &DrawItem<'a>> {
        self.background.iter().chain(std::iter::once(&self.ship)).chain(self.rocks.iter())
    }
}

pub trait Renderer {
    fn draw(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Discards every frame.
#[derive(Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &Frame) -> io::Result<()> {
        self.frames += 1;
        Ok(())
    }
}

// --- ScreenBuffer for simulated rendering ---
pub struct ScreenBuffer {
    pub buffer: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
    pub cursor_x: u16,
    pub cursor_y: u16,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer {
            buffer: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    pub fn write_char(&mut self, c: char) {
        if self.cursor_y < self.height && self.cursor_x < self.width {
            self.buffer[self.cursor_y as usize][self.cursor_x as usize] = c;
        }
    }

    pub fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
            self.cursor_x = self.cursor_x.saturating_add(1);
        }
    }

    pub fn clear(&mut self) {
        self.buffer = vec![vec![' '; self.width as usize]; self.height as usize];
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    pub fn row(&self, y: u16) -> String {
        self.buffer.get(y as usize).map(|row| row.iter().collect()).unwrap_or_default()
    }

    pub fn count(&self, c: char) -> usize {
        self.buffer.iter().flatten().filter(|cell| **cell == c).count()
    }

    pub fn print_to_log(&self) {
        info!("--- Screen Buffer ---");
        for row in &self.buffer {
            info!("{}", row.iter().collect::<String>());
        }
        info!("---------------------");
    }
}

impl Write for ScreenBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.write_str(&s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// --- OutputTarget enum to handle stdout or ScreenBuffer ---
pub enum OutputTarget {
    Stdout(io::Stdout),
    ScreenBuffer(ScreenBuffer),
}

impl OutputTarget {
    pub fn execute_move_to(&mut self, command: MoveTo) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => execute!(s, command),
            OutputTarget::ScreenBuffer(sb) => {
                sb.move_to(command.0, command.1);
                Ok(())
            },
        }
    }

    pub fn execute_other_command(&mut self, command: impl crossterm::Command) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => execute!(s, command),
            OutputTarget::ScreenBuffer(_) => Ok(()), // Ignore in debug mode
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Stdout(s) => s.write(buf),
            OutputTarget::ScreenBuffer(sb) => sb.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => s.flush(),
            OutputTarget::ScreenBuffer(sb) => sb.flush(),
        }
    }
}

// --- GameGrid: the window sampled down to terminal cells ---
pub struct GameGrid {
    pub grid: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
    window: Rect,
}

impl GameGrid {
    pub fn new(width: u16, height: u16, window: Rect) -> Self {
        GameGrid {
            grid: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
            window,
        }
    }

    pub fn set_char(&mut self, x: u16, y: u16, c: char) {
        if y < self.height && x < self.width {
            self.grid[y as usize][x as usize] = c;
        }
    }

    pub fn clear(&mut self) {
        self.grid = vec![vec![' '; self.width as usize]; self.height as usize];
    }

    /// Marks every cell whose centre falls on an opaque pixel of the item.
    pub fn draw_item(&mut self, item: &DrawItem) {
        let glyph = glyph_for(&item.layer);
        let dest = item.dest;
        if dest.width <= 0 || dest.height <= 0 || self.window.width <= 0 || self.window.height <= 0 {
            return;
        }
        let cell_w = self.window.width as f64 / self.width as f64;
        let cell_h = self.window.height as f64 / self.height as f64;
        let mask = item.sprite.mask();

        let first_col = ((dest.left as f64 / cell_w).floor() as i64).max(0);
        let last_col = ((dest.right() as f64 / cell_w).ceil() as i64).min(self.width as i64);
        let first_row = ((dest.top as f64 / cell_h).floor() as i64).max(0);
        let last_row = ((dest.bottom() as f64 / cell_h).ceil() as i64).min(self.height as i64);

        for row in first_row..last_row {
            for col in first_col..last_col {
                let wx = (col as f64 + 0.5) * cell_w;
                let wy = (row as f64 + 0.5) * cell_h;
                let lx = (wx - dest.left as f64) * mask.width() as f64 / dest.width as f64;
                let ly = (wy - dest.top as f64) * mask.height() as f64 / dest.height as f64;
                if lx < 0.0 || ly < 0.0 {
                    continue;
                }
                if mask.get(lx as i32, ly as i32) {
                    self.set_char(col as u16, row as u16, glyph);
                }
            }
        }
    }

    pub fn render(&self, stdout: &mut OutputTarget) -> io::Result<()> {
        for y in 0..self.height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", self.grid[y as usize].iter().collect::<String>())?;
        }
        Ok(())
    }

    pub fn clear_screen_manual(&self, stdout: &mut OutputTarget, terminal_width: u16, terminal_height: u16) -> io::Result<()> {
        for y in 0..terminal_height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", " ".repeat(terminal_width as usize))?;
        }
        stdout.execute_move_to(MoveTo(0, 0))?;
        Ok(())
    }
}

fn glyph_for(layer: &Layer) -> char {
    match layer {
        Layer::Background => '.',
        Layer::Ship { heading, mode } => ship_char(*heading, *mode),
        Layer::Rock(RockSize::Big) => '@',
        Layer::Rock(RockSize::Medium) => 'O',
        Layer::Rock(RockSize::Small) => 'o',
        Layer::Rock(RockSize::Tiny) => '*',
    }
}

/// Arrow closest to the ship's nose; heading 0 is up, increasing counter-clockwise.
pub fn ship_char(heading: f64, mode: ShipMode) -> char {
    let octant = ((heading.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    match mode {
        ShipMode::Flying => ['^', '\\', '<', '/', 'v', '\\', '>', '/'][octant],
        ShipMode::Accelerating => ['A', '\\', '<', '/', 'V', '\\', '>', '/'][octant],
    }
}

// --- Terminal renderer ---
pub struct TerminalRenderer {
    pub target: OutputTarget,
    grid: GameGrid,
    terminal_height: u16,
}

impl TerminalRenderer {
    /// The bottom terminal row is kept for the HUD line.
    pub fn new(target: OutputTarget, terminal_width: u16, terminal_height: u16, window: Rect) -> Self {
        let grid = GameGrid::new(terminal_width, terminal_height.saturating_sub(1), window);
        TerminalRenderer { target, grid, terminal_height }
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.grid.clear_screen_manual(&mut self.target, self.grid.width, self.terminal_height)
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, frame: &Frame) -> io::Result<()> {
        self.grid.clear();
        for item in frame.items() {
            self.grid.draw_item(item);
        }
        if let OutputTarget::ScreenBuffer(ref mut sb) = self.target {
            sb.clear();
        }
        self.grid.render(&mut self.target)?;

        let hud = frame.hud;
        self.target.execute_move_to(MoveTo(0, self.terminal_height.saturating_sub(1)))?;
        write!(
            self.target,
            "Tick: {}  Rocks: {}  Heading: {:5.1}  Speed: ({:+.1}, {:+.1})  [Arrows: steer/thrust, Esc/q: quit]",
            hud.tick, hud.rocks, hud.heading, hud.speed.0, hud.speed.1
        )?;
        self.target.flush()?;

        if let OutputTarget::ScreenBuffer(ref sb) = self.target {
            sb.print_to_log();
        }
        Ok(())
    }
}
