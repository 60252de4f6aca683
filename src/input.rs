use std::collections::HashMap;
use std::io;

use crate::entities::{ShipCommand, ShipMode, Turn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Left,
    Right,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    KeyDown(Key),
    KeyUp(Key),
}

/// What one input event asks the game to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Quit,
    Ship(ShipCommand),
}

impl InputEvent {
    pub fn to_control(self) -> Option<Control> {
        match self {
            InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => Some(Control::Quit),
            InputEvent::KeyDown(Key::Left) => Some(Control::Ship(ShipCommand::Rotate(Turn::Left))),
            InputEvent::KeyDown(Key::Right) => Some(Control::Ship(ShipCommand::Rotate(Turn::Right))),
            InputEvent::KeyDown(Key::Up) => Some(Control::Ship(ShipCommand::SetMode(ShipMode::Accelerating))),
            InputEvent::KeyUp(Key::Up) => Some(Control::Ship(ShipCommand::SetMode(ShipMode::Flying))),
            InputEvent::KeyUp(_) => None,
        }
    }
}

/// Anything that can hand over the events gathered since the last tick.
pub trait InputSource {
    fn poll(&mut self, tick: u64) -> io::Result<Vec<InputEvent>>;
}

// --- ScriptedInput for debugging and tests ---
pub struct ScriptedInput {
    events: HashMap<u64, Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new(events: HashMap<u64, Vec<InputEvent>>) -> Self {
        ScriptedInput { events }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, InputEvent)>) -> Self {
        let mut events: HashMap<u64, Vec<InputEvent>> = HashMap::new();
        for (tick, event) in pairs {
            events.entry(tick).or_default().push(event);
        }
        ScriptedInput { events }
    }

    pub fn remaining(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, tick: u64) -> io::Result<Vec<InputEvent>> {
        Ok(self.events.remove(&tick).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_mapping() {
        assert_eq!(InputEvent::Quit.to_control(), Some(Control::Quit));
        assert_eq!(InputEvent::KeyDown(Key::Escape).to_control(), Some(Control::Quit));
        assert_eq!(
            InputEvent::KeyDown(Key::Left).to_control(),
            Some(Control::Ship(ShipCommand::Rotate(Turn::Left)))
        );
        assert_eq!(
            InputEvent::KeyDown(Key::Right).to_control(),
            Some(Control::Ship(ShipCommand::Rotate(Turn::Right)))
        );
        assert_eq!(
            InputEvent::KeyDown(Key::Up).to_control(),
            Some(Control::Ship(ShipCommand::SetMode(ShipMode::Accelerating)))
        );
        assert_eq!(
            InputEvent::KeyUp(Key::Up).to_control(),
            Some(Control::Ship(ShipCommand::SetMode(ShipMode::Flying)))
        );
        assert_eq!(InputEvent::KeyUp(Key::Left).to_control(), None);
        assert_eq!(InputEvent::KeyUp(Key::Escape).to_control(), None);
    }

    #[test]
    fn test_left_rotates_counter_clockwise() {
        let Some(Control::Ship(ShipCommand::Rotate(turn))) = InputEvent::KeyDown(Key::Left).to_control() else {
            panic!("left did not rotate");
        };
        assert_eq!(turn.sign(), 1);
    }

    #[test]
    fn test_scripted_input_drains_by_tick() {
        let mut input = ScriptedInput::from_pairs([
            (1, InputEvent::KeyDown(Key::Up)),
            (1, InputEvent::KeyDown(Key::Left)),
            (3, InputEvent::Quit),
        ]);
        assert_eq!(input.remaining(), 3);
        assert!(input.poll(0).unwrap().is_empty());
        assert_eq!(
            input.poll(1).unwrap(),
            vec![InputEvent::KeyDown(Key::Up), InputEvent::KeyDown(Key::Left)]
        );
        assert!(input.poll(1).unwrap().is_empty());
        assert_eq!(input.poll(3).unwrap(), vec![InputEvent::Quit]);
        assert_eq!(input.remaining(), 0);
    }
}
