pub mod animation;
pub mod artwork;
pub mod atlas;
pub mod constants;
pub mod entities;
pub mod error;
pub mod game;
pub mod input;
pub mod rendering;
pub mod settings;
pub mod spawner;
pub mod terminal_io;
pub mod timer;
pub mod types;

pub use atlas::{ColorKey, Sequence, Sprite, SpriteAtlas, SpriteSheet};
pub use entities::{Rock, RockSize, Ship, ShipCommand, ShipMode, Turn};
pub use error::{AssetLoadError, GameError, LookupError, SettingsError, SpawnPlacementFailed};
pub use game::{FixedRate, FramePacer, Game, SimulatedTime, Unpaced};
pub use input::{InputEvent, InputSource, Key, ScriptedInput};
pub use rendering::{Frame, NullRenderer, Renderer, TerminalRenderer};
pub use settings::Settings;
pub use timer::{Clock, ManualClock, MonotonicClock, SharedClock, Timer};
