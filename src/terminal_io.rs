use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, error};

use crate::input::{InputEvent, InputSource, Key};

// --- Keyboard input from the terminal ---
pub struct CrosstermInput {
    // Terminals without the keyboard enhancement protocol never send key
    // releases; there a second Up press stands in for letting go.
    reports_release: bool,
    up_held: bool,
}

impl CrosstermInput {
    pub fn new(reports_release: bool) -> Self {
        debug!("Terminal input, key releases reported: {}", reports_release);
        CrosstermInput { reports_release, up_held: false }
    }

    pub fn translate(&mut self, key_event: KeyEvent) -> Option<InputEvent> {
        if key_event.kind == KeyEventKind::Repeat {
            return None;
        }
        let released = key_event.kind == KeyEventKind::Release;
        let key = match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => Key::Escape,
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => return Some(InputEvent::Quit),
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            _ => return None,
        };

        if key == Key::Up && !self.reports_release {
            if released {
                return None;
            }
            self.up_held = !self.up_held;
            return Some(if self.up_held { InputEvent::KeyDown(Key::Up) } else { InputEvent::KeyUp(Key::Up) });
        }

        Some(if released { InputEvent::KeyUp(key) } else { InputEvent::KeyDown(key) })
    }
}

impl InputSource for CrosstermInput {
    fn poll(&mut self, _tick: u64) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO).map_err(|e| { error!("Failed to poll event: {}", e); e })? {
            let event = event::read().map_err(|e| { error!("Failed to read event: {}", e); e })?;
            if let Event::Key(key_event) = event {
                if let Some(input) = self.translate(key_event) {
                    events.push(input);
                }
            }
        }
        Ok(events)
    }
}
